use core::f64::consts::LN_2;

use defmt::Format;
use libm::exp;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::zh16c::ZhL16cGf;
use crate::ModelError;

/// One Bühlmann tissue compartment.
#[derive(Debug, Format, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Compartment {
    pub pp_he: f64,
    pub pp_n2: f64,
    number: usize,
    k_he: f64,
    k_n2: f64,
    a_he: f64,
    b_he: f64,
    a_n2: f64,
    b_n2: f64,
}

impl Compartment {
    /// Compartment `index` (0-based) of the ZH-L16C table, unloaded.
    pub fn zh_l16c(index: usize) -> Self {
        let mut compartment = Compartment {
            number: index + 1,
            ..Default::default()
        };
        compartment.set_time_constants(
            ZhL16cGf::HE_HALF_LIFE[index],
            ZhL16cGf::N2_HALF_LIFE[index],
            ZhL16cGf::HE_A[index],
            ZhL16cGf::HE_B[index],
            ZhL16cGf::N2_A[index],
            ZhL16cGf::N2_B[index],
        );
        compartment
    }

    /// 1-based position in the model, fastest first.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn set_pp(&mut self, pp_he: f64, pp_n2: f64) {
        self.pp_he = pp_he;
        self.pp_n2 = pp_n2;
    }

    /// Half-times are in minutes.
    pub fn set_time_constants(
        &mut self,
        h_he: f64,
        h_n2: f64,
        a_he: f64,
        b_he: f64,
        a_n2: f64,
        b_n2: f64,
    ) {
        self.k_he = LN_2 / h_he;
        self.k_n2 = LN_2 / h_n2;
        self.a_he = a_he;
        self.b_he = b_he;
        self.a_n2 = a_n2;
        self.b_n2 = b_n2;
    }

    pub fn k_he(&self) -> f64 {
        self.k_he
    }

    pub fn k_n2(&self) -> f64 {
        self.k_n2
    }

    pub fn has_time_constants(&self) -> bool {
        [self.k_he, self.k_n2, self.a_he, self.b_he, self.a_n2, self.b_n2]
            .iter()
            .all(|c| c.is_finite() && *c != 0.0)
    }

    // pt(t) = pi + (p0 - pi) * e^(-kt)
    pub fn const_depth(
        &mut self,
        p_he_inspired: f64,
        p_n2_inspired: f64,
        minutes: f64,
    ) -> Result<(), ModelError> {
        if minutes < 0.0 {
            return Err(ModelError::NegativeDuration);
        }
        let pp_he = p_he_inspired + (self.pp_he - p_he_inspired) * exp(-self.k_he * minutes);
        let pp_n2 = p_n2_inspired + (self.pp_n2 - p_n2_inspired) * exp(-self.k_n2 * minutes);
        self.commit(pp_he, pp_n2)
    }

    // pt(t) = palv0 + R(t - 1/k) - [palv0 - pt0 - R/k] * e^(-kt)
    // palv0 -> inspired partial pressure at the start of the segment
    // R -> rate of change of the inspired partial pressure (bar/min)
    pub fn asc_desc(
        &mut self,
        p_he_start: f64,
        p_n2_start: f64,
        rate_he: f64,
        rate_n2: f64,
        minutes: f64,
    ) -> Result<(), ModelError> {
        if minutes < 0.0 {
            return Err(ModelError::NegativeDuration);
        }
        let pp_he = schreiner(p_he_start, rate_he, self.pp_he, self.k_he, minutes);
        let pp_n2 = schreiner(p_n2_start, rate_n2, self.pp_n2, self.k_n2, minutes);
        self.commit(pp_he, pp_n2)
    }

    fn commit(&mut self, pp_he: f64, pp_n2: f64) -> Result<(), ModelError> {
        if pp_he < 0.0 || pp_n2 < 0.0 {
            return Err(ModelError::NegativePressure {
                compartment: self.number,
            });
        }
        self.pp_he = pp_he;
        self.pp_n2 = pp_n2;
        Ok(())
    }

    /// Bühlmann a/b weighted by the current inert gas loading.
    pub fn coefficients(&self) -> (f64, f64) {
        let p_total = self.pp_he + self.pp_n2;
        if p_total <= 0.0 || self.pp_he == 0.0 {
            return (self.a_n2, self.b_n2);
        }
        if self.pp_n2 == 0.0 {
            return (self.a_he, self.b_he);
        }
        let a = (self.a_he * self.pp_he + self.a_n2 * self.pp_n2) / p_total;
        let b = (self.b_he * self.pp_he + self.b_n2 * self.pp_n2) / p_total;
        (a, b)
    }

    /// M-value (bar) at an ambient pressure.
    pub fn m_value(&self, amb_pressure: f64) -> f64 {
        let (a, b) = self.coefficients();
        a + amb_pressure / b
    }

    /// Lowest ambient pressure this compartment tolerates at gradient factor `gf`.
    pub fn max_tolerated_pressure(&self, gf: f64) -> f64 {
        let (a, b) = self.coefficients();
        let p_total = self.pp_he + self.pp_n2;
        (b * p_total - gf * a * b) / ((1.0 - b) * gf + b)
    }

    /// Loading as a fraction of the M-value at `amb_pressure`.
    pub fn mv_ratio(&self, amb_pressure: f64) -> f64 {
        (self.pp_he + self.pp_n2) / self.m_value(amb_pressure)
    }
}

fn schreiner(p_start: f64, rate: f64, p0: f64, k: f64, minutes: f64) -> f64 {
    p_start + rate * (minutes - 1.0 / k) - (p_start - p0 - rate / k) * exp(-k * minutes)
}

#[test]
fn test_zero_rate_matches_constant_depth() {
    let mut moving = Compartment::zh_l16c(4);
    moving.set_pp(0.0, 0.75);
    let mut constant = moving;

    moving.asc_desc(0.0, 3.1, 0.0, 0.0, 12.0).unwrap();
    constant.const_depth(0.0, 3.1, 12.0).unwrap();

    assert!(libm::fabs(moving.pp_n2 - constant.pp_n2) < 1e-12);
}

#[test]
fn test_max_tolerated_pressure_at_gf_one() {
    let mut compartment = Compartment::zh_l16c(1);
    compartment.set_pp(0.0, 3.11);
    let expected = (3.11 - ZhL16cGf::N2_A[1]) * ZhL16cGf::N2_B[1];
    assert!(libm::fabs(compartment.max_tolerated_pressure(1.0) - expected) < 1e-12);
}
