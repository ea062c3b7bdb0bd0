use defmt::Format;
use libm::{fabs, round};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::tank::{Gas, TankId, TankSet};
use crate::{DecoError, DiveParameters};

/// What the model looked like when a deco stop was cleared.
#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StopInfo {
    /// 1-based controlling compartment.
    pub control_compartment: usize,
    pub gf: f64,
    pub mv_max: f64,
}

#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SegmentKind {
    Const {
        depth: f64,
    },
    AscDesc {
        start_depth: f64,
        end_depth: f64,
        rate: f64, // m/min
    },
    Deco {
        depth: f64,
        stop: StopInfo,
    },
}

/// One leg of a dive. Depths in metres, durations in seconds.
#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    pub kind: SegmentKind,
    pub duration: f64,
    pub tank: TankId,
    pub gas: Gas,
    /// Constant ppO2 of a closed circuit loop; 0 on open circuit.
    pub setpoint: f64,
    /// Dive run time at the end of the segment, set once emitted.
    pub run_time: f64,
}

fn gas_of(tanks: &TankSet, tank: TankId) -> Result<Gas, DecoError> {
    tanks
        .get(tank)
        .map(|t| t.gas())
        .ok_or(DecoError::UnknownTank { index: tank.0 })
}

impl Segment {
    fn build(
        kind: SegmentKind,
        duration: f64,
        tanks: &TankSet,
        tank: TankId,
        setpoint: f64,
    ) -> Result<Self, DecoError> {
        if !(duration >= 0.0) {
            return Err(DecoError::InvalidParameter {
                name: "duration",
                value: duration,
            });
        }
        if setpoint < 0.0 {
            return Err(DecoError::InvalidParameter {
                name: "setpoint",
                value: setpoint,
            });
        }
        let segment = Segment {
            kind,
            duration,
            tank,
            gas: gas_of(tanks, tank)?,
            setpoint,
            run_time: 0.0,
        };
        segment.check_mod()?;
        Ok(segment)
    }

    pub fn constant(
        tanks: &TankSet,
        tank: TankId,
        depth: f64,
        duration: f64,
        setpoint: f64,
    ) -> Result<Self, DecoError> {
        Self::build(SegmentKind::Const { depth }, duration, tanks, tank, setpoint)
    }

    /// Linear travel; the duration follows from the rate.
    pub fn asc_desc(
        tanks: &TankSet,
        tank: TankId,
        start_depth: f64,
        end_depth: f64,
        rate: f64,
        setpoint: f64,
    ) -> Result<Self, DecoError> {
        if !(rate > 0.0) {
            return Err(DecoError::InvalidParameter { name: "rate", value: rate });
        }
        let duration = fabs(end_depth - start_depth) / rate * 60.0;
        let kind = SegmentKind::AscDesc {
            start_depth,
            end_depth,
            rate,
        };
        Self::build(kind, duration, tanks, tank, setpoint)
    }

    pub fn deco(
        tanks: &TankSet,
        tank: TankId,
        depth: f64,
        duration: f64,
        setpoint: f64,
        stop: StopInfo,
    ) -> Result<Self, DecoError> {
        Self::build(SegmentKind::Deco { depth, stop }, duration, tanks, tank, setpoint)
    }

    /// Depth at the end of the segment.
    pub fn depth(&self) -> f64 {
        match self.kind {
            SegmentKind::Const { depth } | SegmentKind::Deco { depth, .. } => depth,
            SegmentKind::AscDesc { end_depth, .. } => end_depth,
        }
    }

    /// (shallowest, deepest) depth covered.
    pub fn depth_range(&self) -> (f64, f64) {
        match self.kind {
            SegmentKind::Const { depth } | SegmentKind::Deco { depth, .. } => (depth, depth),
            SegmentKind::AscDesc {
                start_depth,
                end_depth,
                ..
            } => (
                f64::min(start_depth, end_depth),
                f64::max(start_depth, end_depth),
            ),
        }
    }

    pub fn max_depth(&self) -> f64 {
        self.depth_range().1
    }

    pub fn is_ccr(&self) -> bool {
        self.setpoint > 0.0
    }

    pub fn stop(&self) -> Option<StopInfo> {
        match self.kind {
            SegmentKind::Deco { stop, .. } => Some(stop),
            _ => None,
        }
    }

    pub fn check_mod(&self) -> Result<(), DecoError> {
        let (shallow, deep) = self.depth_range();
        self.gas.check_range(shallow, deep)
    }

    /// Litres of gas breathed, measured at the surface.
    pub fn gas_used(&self, params: &DiveParameters) -> f64 {
        if self.is_ccr() {
            return 0.0;
        }
        let (pressure, rate) = match self.kind {
            SegmentKind::Const { depth } => {
                (params.depth_to_pressure(depth), params.dive_consumption_rate)
            }
            SegmentKind::Deco { depth, .. } => {
                (params.depth_to_pressure(depth), params.deco_consumption_rate)
            }
            SegmentKind::AscDesc {
                start_depth,
                end_depth,
                ..
            } => (
                params.depth_to_pressure((start_depth + end_depth) / 2.0),
                params.dive_consumption_rate,
            ),
        };
        pressure * self.duration * rate / 60.0
    }

    /// Equivalent narcotic depth (m) at the deepest point of the segment.
    pub fn end(&self, params: &DiveParameters) -> f64 {
        let pressure = params.depth_to_pressure(self.max_depth());
        let inert = self.gas.f_n2 + self.gas.f_he;
        let (pp_o2, pp_n2, pp_he) = if self.is_ccr() && inert > 0.0 {
            let pp_o2 = f64::min(self.setpoint, pressure);
            let pp_inert = pressure - pp_o2;
            (
                pp_o2,
                pp_inert * self.gas.f_n2 / inert,
                pp_inert * self.gas.f_he / inert,
            )
        } else {
            (
                pressure * self.gas.f_o2,
                pressure * self.gas.f_n2,
                pressure * self.gas.f_he,
            )
        };
        let narcotic = &params.narcotic;
        let index = pp_o2 * narcotic.o2 + pp_n2 * narcotic.n2 + pp_he * narcotic.he;
        f64::max(0.0, round(10.0 * (index / narcotic.air_index() - 1.0)))
    }
}
