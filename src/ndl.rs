//! No-decompression limit: whole minutes that can still be spent at a depth
//! before the ceiling leaves the surface.

use crate::model::Model;
use crate::tank::Gas;
use crate::DecoError;

pub const NDL_MAX_MINUTES: u32 = 999;

fn in_deco_after(
    model: &Model,
    pressure: f64,
    gas: &Gas,
    setpoint: f64,
    minutes: u32,
) -> Result<bool, DecoError> {
    let mut probe = *model;
    probe.const_depth(pressure, minutes as f64 * 60.0, gas.f_he, gas.f_n2, setpoint)?;
    Ok(probe.ceiling() > 0.0)
}

/// Minute-by-minute search.
pub fn ndl(model: &Model, depth: f64, gas: &Gas, setpoint: f64) -> Result<u32, DecoError> {
    gas.check_range(depth, depth)?;
    let pressure = model.params().depth_to_pressure(depth);
    for bottom_time in 0..NDL_MAX_MINUTES {
        if in_deco_after(model, pressure, gas, setpoint, bottom_time + 1)? {
            defmt::debug!("ndl at {=f64}m: {=u32}min", depth, bottom_time);
            return Ok(bottom_time);
        }
    }
    Ok(NDL_MAX_MINUTES)
}

/// Bisection over the same predicate as [`ndl`]; agrees with it whenever
/// the ceiling only grows with bottom time.
pub fn binary_ndl(model: &Model, depth: f64, gas: &Gas, setpoint: f64) -> Result<u32, DecoError> {
    gas.check_range(depth, depth)?;
    let pressure = model.params().depth_to_pressure(depth);
    if in_deco_after(model, pressure, gas, setpoint, 0)? {
        return Ok(0);
    }
    if !in_deco_after(model, pressure, gas, setpoint, NDL_MAX_MINUTES)? {
        return Ok(NDL_MAX_MINUTES);
    }
    let (mut lo, mut hi) = (0, NDL_MAX_MINUTES);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if in_deco_after(model, pressure, gas, setpoint, mid)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(lo)
}
