use defmt::Format;
use libm::{exp, pow};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const OTU_EXPONENT: f64 = -0.833333;
const CNS_HALF_TIME: f64 = 90.0; // minutes
const LN_2: f64 = 0.693147;
const OTU_RESET_SECONDS: f64 = 86_400.0;

/// NOAA single exposure limits as (upper ppO2 bound, minutes).
const NOAA_CNS_LIMITS: [(f64, f64); 8] = [
    (0.6, 720.0),
    (0.7, 570.0),
    (0.8, 450.0),
    (0.9, 360.0),
    (1.1, 240.0),
    (1.3, 180.0),
    (1.5, 120.0),
    (1.6, 45.0),
];
const NOAA_CNS_LIMIT_ABOVE: f64 = 15.0;

/// Exposure limit in minutes at `pp_o2`, `None` when no CNS accrues.
pub fn cns_exposure_limit(pp_o2: f64) -> Option<f64> {
    if pp_o2 <= 0.5 {
        return None;
    }
    let limit = NOAA_CNS_LIMITS
        .iter()
        .find(|(bound, _)| pp_o2 <= *bound)
        .map(|(_, minutes)| *minutes)
        .unwrap_or(NOAA_CNS_LIMIT_ABOVE);
    Some(limit)
}

/// Oxygen exposure accumulated over a dive or a series of dives.
#[derive(Debug, Format, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OxTox {
    pub cns: f64,
    pub otu: f64,
    pub max_ppo2: f64,
}

impl OxTox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `seconds` of breathing at `pp_o2` bar.
    pub fn add_o2(&mut self, seconds: f64, pp_o2: f64) {
        let minutes = seconds / 60.0;
        if pp_o2 > 0.5 {
            self.otu += minutes * pow(0.5 / (pp_o2 - 0.5), OTU_EXPONENT);
        }
        if let Some(limit) = cns_exposure_limit(pp_o2) {
            self.cns += minutes / limit;
        }
        if pp_o2 > self.max_ppo2 {
            self.max_ppo2 = pp_o2;
        }
    }

    /// Off-gas oxygen exposure during `seconds` at surface or low ppO2.
    pub fn remove_o2(&mut self, seconds: f64) {
        if seconds >= OTU_RESET_SECONDS {
            self.otu = 0.0;
        }
        let minutes = seconds / 60.0;
        self.cns *= exp(-minutes * LN_2 / CNS_HALF_TIME);
    }
}

#[test]
fn test_no_cns_below_half_bar() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(3600.0, 0.45);
    assert_eq!(ox_tox.cns, 0.0);
    assert_eq!(ox_tox.otu, 0.0);
    assert_eq!(ox_tox.max_ppo2, 0.45);
}

#[test]
fn test_band_edges() {
    assert_eq!(cns_exposure_limit(0.5), None);
    assert_eq!(cns_exposure_limit(0.55), Some(720.0));
    assert_eq!(cns_exposure_limit(1.3), Some(180.0));
    assert_eq!(cns_exposure_limit(1.6), Some(45.0));
    assert_eq!(cns_exposure_limit(1.75), Some(NOAA_CNS_LIMIT_ABOVE));
}
