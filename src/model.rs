//! 16-compartment Bühlmann state with gradient factors and oxygen exposure.

use defmt::Format;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gradient::Gradient;
use crate::oxtox::OxTox;
use crate::segment::{Segment, SegmentKind};
use crate::tissue::Compartment;
use crate::zh16c::COMPARTMENTS;
use crate::{DecoError, DiveParameters, ModelError};

pub const AIR_FN2: f64 = 0.79;

#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    compartments: [Compartment; COMPARTMENTS],
    pub gradient: Gradient,
    pub ox_tox: OxTox,
    params: DiveParameters,
}

impl Model {
    /// Fresh model at surface equilibrium on air.
    pub fn new(params: &DiveParameters) -> Result<Self, DecoError> {
        let load_n2 = AIR_FN2 * (params.surface_pressure - params.water_vapor_pressure);
        let mut compartments = [Compartment::default(); COMPARTMENTS];
        for (i, compartment) in compartments.iter_mut().enumerate() {
            *compartment = Compartment::zh_l16c(i);
            compartment.set_pp(0.0, load_n2);
        }
        Ok(Model {
            compartments,
            gradient: Gradient::new(params.gf_low, params.gf_high)?,
            ox_tox: OxTox::new(),
            params: *params,
        })
    }

    pub fn params(&self) -> &DiveParameters {
        &self.params
    }

    /// Adopt `params` for every later update and query. Loadings are absolute
    /// pressures and carry over unchanged; the gradient restarts unanchored.
    pub fn set_params(&mut self, params: &DiveParameters) -> Result<(), DecoError> {
        params.validate()?;
        self.gradient = Gradient::new(params.gf_low, params.gf_high)?;
        self.params = *params;
        Ok(())
    }

    pub fn compartments(&self) -> &[Compartment; COMPARTMENTS] {
        &self.compartments
    }

    /// Raw access for restoring a stored model; run [`Model::validate`] after.
    pub fn compartments_mut(&mut self) -> &mut [Compartment; COMPARTMENTS] {
        &mut self.compartments
    }

    /// Rebuild every compartment's constants from the table, keeping its loading.
    pub fn reset_time_constants(&mut self) {
        for (i, compartment) in self.compartments.iter_mut().enumerate() {
            let (pp_he, pp_n2) = (compartment.pp_he, compartment.pp_n2);
            *compartment = Compartment::zh_l16c(i);
            compartment.set_pp(pp_he, pp_n2);
        }
    }

    /// Check every compartment. Any failure resets the time constants, so a
    /// model whose only damage was its constants passes on the next call.
    pub fn validate(&mut self) -> Result<(), DecoError> {
        let failure = self.compartments.iter().enumerate().find_map(|(i, c)| {
            let compartment = i + 1;
            if !(c.pp_n2 > 0.0) || !(c.pp_he >= 0.0) {
                Some(ModelError::CorruptedTissue { compartment })
            } else if !c.has_time_constants() {
                Some(ModelError::ZeroTimeConstant { compartment })
            } else {
                None
            }
        });
        match failure {
            None => Ok(()),
            Some(err) => {
                defmt::warn!("model validation failed: {}", err);
                self.reset_time_constants();
                Err(err.into())
            }
        }
    }

    /// Inspired (he, n2) partial pressures at ambient `pressure`.
    fn inspired(&self, pressure: f64, f_he: f64, f_n2: f64, pp_o2: f64) -> (f64, f64) {
        let alveolar = pressure - self.params.water_vapor_pressure;
        if pp_o2 > 0.0 {
            let inert = f_he + f_n2;
            if inert <= 0.0 {
                return (0.0, 0.0);
            }
            let p_inert = f64::max(0.0, alveolar - pp_o2);
            (p_inert * f_he / inert, p_inert * f_n2 / inert)
        } else {
            (alveolar * f_he, alveolar * f_n2)
        }
    }

    fn breathed_ppo2(pressure: f64, f_he: f64, f_n2: f64, pp_o2: f64) -> f64 {
        if pp_o2 > 0.0 {
            f64::min(pp_o2, pressure)
        } else {
            pressure * (1.0 - f_he - f_n2)
        }
    }

    fn load(&mut self, p_he: f64, p_n2: f64, minutes: f64) -> Result<(), ModelError> {
        for compartment in self.compartments.iter_mut() {
            compartment.const_depth(p_he, p_n2, minutes)?;
        }
        Ok(())
    }

    /// Stay at `pressure` (bar) for `seconds`. A non-zero `pp_o2` means a
    /// closed circuit loop holding that setpoint.
    pub fn const_depth(
        &mut self,
        pressure: f64,
        seconds: f64,
        f_he: f64,
        f_n2: f64,
        pp_o2: f64,
    ) -> Result<(), DecoError> {
        if seconds < 0.0 {
            return Err(ModelError::NegativeDuration.into());
        }
        let (p_he, p_n2) = self.inspired(pressure, f_he, f_n2, pp_o2);
        self.load(p_he, p_n2, seconds / 60.0)?;
        self.ox_tox
            .add_o2(seconds, Self::breathed_ppo2(pressure, f_he, f_n2, pp_o2));
        Ok(())
    }

    /// Travel linearly from `start_pressure` to `end_pressure` in `seconds`.
    pub fn asc_desc(
        &mut self,
        start_pressure: f64,
        end_pressure: f64,
        seconds: f64,
        f_he: f64,
        f_n2: f64,
        pp_o2: f64,
    ) -> Result<(), DecoError> {
        if seconds < 0.0 {
            return Err(ModelError::NegativeDuration.into());
        }
        if seconds == 0.0 {
            return Ok(());
        }
        let minutes = seconds / 60.0;
        let (he_start, n2_start) = self.inspired(start_pressure, f_he, f_n2, pp_o2);
        let (he_end, n2_end) = self.inspired(end_pressure, f_he, f_n2, pp_o2);
        let rate_he = (he_end - he_start) / minutes;
        let rate_n2 = (n2_end - n2_start) / minutes;
        for compartment in self.compartments.iter_mut() {
            compartment.asc_desc(he_start, n2_start, rate_he, rate_n2, minutes)?;
        }
        let mean_pressure = (start_pressure + end_pressure) / 2.0;
        self.ox_tox
            .add_o2(seconds, Self::breathed_ppo2(mean_pressure, f_he, f_n2, pp_o2));
        Ok(())
    }

    /// Replay one segment through the model.
    pub fn apply(&mut self, segment: &Segment) -> Result<(), DecoError> {
        let gas = segment.gas;
        match segment.kind {
            SegmentKind::Const { depth } | SegmentKind::Deco { depth, .. } => self.const_depth(
                self.params.depth_to_pressure(depth),
                segment.duration,
                gas.f_he,
                gas.f_n2,
                segment.setpoint,
            ),
            SegmentKind::AscDesc {
                start_depth,
                end_depth,
                ..
            } => self.asc_desc(
                self.params.depth_to_pressure(start_depth),
                self.params.depth_to_pressure(end_depth),
                segment.duration,
                gas.f_he,
                gas.f_n2,
                segment.setpoint,
            ),
        }
    }

    /// Breathe air at the surface for `seconds` between dives.
    pub fn surface_interval(&mut self, seconds: f64) -> Result<(), DecoError> {
        if seconds < 0.0 {
            return Err(ModelError::NegativeDuration.into());
        }
        let (p_he, p_n2) = self.inspired(self.params.surface_pressure, 0.0, AIR_FN2, 0.0);
        self.load(p_he, p_n2, seconds / 60.0)?;
        self.ox_tox.remove_o2(seconds);
        defmt::debug!("surface interval {=f64}s, cns {=f64}", seconds, self.ox_tox.cns);
        Ok(())
    }

    /// 1-based compartment with the highest tolerated ambient pressure at the
    /// current gradient factor; the fastest one wins ties.
    pub fn control_compartment(&self) -> usize {
        self.leading().0
    }

    fn leading(&self) -> (usize, f64) {
        let gf = self.gradient.gf();
        let mut number = 1;
        let mut max_pressure = self.compartments[0].max_tolerated_pressure(gf);
        for (i, compartment) in self.compartments.iter().enumerate().skip(1) {
            let pressure = compartment.max_tolerated_pressure(gf);
            if pressure > max_pressure {
                max_pressure = pressure;
                number = i + 1;
            }
        }
        (number, max_pressure)
    }

    /// Current ceiling in metres, 0 when the surface is reachable.
    pub fn ceiling(&self) -> f64 {
        let (number, pressure) = self.leading();
        if pressure <= self.params.surface_pressure {
            return 0.0;
        }
        let ceiling = self.params.pressure_to_depth(pressure);
        defmt::trace!("ceiling {=f64}m held by compartment {=usize}", ceiling, number);
        ceiling
    }

    /// Highest loading / M-value ratio across compartments at `pressure`.
    pub fn m_value(&self, pressure: f64) -> f64 {
        self.compartments
            .iter()
            .map(|c| c.mv_ratio(pressure))
            .fold(0.0, f64::max)
    }
}

#[test]
fn test_surface_equilibrium_has_no_ceiling() {
    let model = Model::new(&DiveParameters::default()).unwrap();
    assert_eq!(model.ceiling(), 0.0);
    assert!(model.m_value(1.01325) < 1.0);
}

#[test]
fn test_ccr_setpoint_above_ambient_breathes_no_inert_gas() {
    let model = Model::new(&DiveParameters::default()).unwrap();
    assert_eq!(model.inspired(1.2, 0.0, 0.79, 1.3), (0.0, 0.0));
}
