use defmt::Format;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::DecoError;

/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.81;

/// How depth is turned into hydrostatic pressure.
#[derive(Debug, Format, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DepthPressureMethod {
    /// 10 m of water = 1 bar.
    Simple,
    /// Water density × g.
    Complex,
}

#[derive(Debug, Format, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WaterType {
    Sea,
    Fresh,
}

/// Relative narcotic potency of each gas (N2 = 1.0).
#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NarcoticValues {
    pub o2: f64,
    pub n2: f64,
    pub he: f64,
    pub ar: f64,
}

impl Default for NarcoticValues {
    fn default() -> Self {
        NarcoticValues {
            o2: 1.0,
            n2: 1.0,
            he: 0.23,
            ar: 2.33,
        }
    }
}

impl NarcoticValues {
    /// Narcotic index of air, the reference every END is measured against.
    pub fn air_index(&self) -> f64 {
        0.79 * self.n2 + 0.21 * self.o2
    }
}

#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiveParameters {
    pub surface_pressure: f64,            // bar
    pub water_vapor_pressure: f64,        // bar, alveolar at 37°C
    pub depth_pressure_method: DepthPressureMethod,
    pub water: WaterType,
    pub sea_water_density: f64,           // kg/m³
    pub fresh_water_density: f64,         // kg/m³
    pub absolute_max_ppo2: f64,           // bar
    pub absolute_min_ppo2: f64,           // bar
    pub default_max_ppo2: f64,            // bar
    pub absolute_max_tank_pressure: f64,  // bar
    pub absolute_max_tank_size: f64,      // litres
    pub narcotic: NarcoticValues,
    pub stop_depth_increment: f64,        // m
    pub last_stop_depth: f64,             // m
    pub stop_time_increment: f64,         // s
    pub ascent_rate: f64,                 // m/min
    pub descent_rate: f64,                // m/min
    pub dive_consumption_rate: f64,       // litres per minute
    pub deco_consumption_rate: f64,       // litres per minute
    pub gf_low: f64,                      // 0 <= x <= 1
    pub gf_high: f64,                     // 0 <= x <= 1
    pub max_deco_iterations: u32,
}

impl DiveParameters {
    pub fn new(gf_low: f64, gf_high: f64) -> Self {
        DiveParameters {
            gf_low,
            gf_high,
            ..Default::default()
        }
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<(), DecoError> {
        if !(0.0..=1.0).contains(&self.gf_low) || !(0.0..=1.0).contains(&self.gf_high) {
            return Err(DecoError::InvalidGradientFactor {
                gf_low: self.gf_low,
                gf_high: self.gf_high,
            });
        }

        let positive = [
            ("surface_pressure", self.surface_pressure),
            ("sea_water_density", self.sea_water_density),
            ("fresh_water_density", self.fresh_water_density),
            ("absolute_max_ppo2", self.absolute_max_ppo2),
            ("absolute_min_ppo2", self.absolute_min_ppo2),
            ("default_max_ppo2", self.default_max_ppo2),
            ("absolute_max_tank_pressure", self.absolute_max_tank_pressure),
            ("absolute_max_tank_size", self.absolute_max_tank_size),
            ("stop_depth_increment", self.stop_depth_increment),
            ("last_stop_depth", self.last_stop_depth),
            ("stop_time_increment", self.stop_time_increment),
            ("ascent_rate", self.ascent_rate),
            ("descent_rate", self.descent_rate),
            ("dive_consumption_rate", self.dive_consumption_rate),
            ("deco_consumption_rate", self.deco_consumption_rate),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(DecoError::InvalidParameter { name, value });
            }
        }

        if self.water_vapor_pressure < 0.0 || self.water_vapor_pressure >= self.surface_pressure {
            return Err(DecoError::InvalidParameter {
                name: "water_vapor_pressure",
                value: self.water_vapor_pressure,
            });
        }
        if self.default_max_ppo2 > self.absolute_max_ppo2 {
            return Err(DecoError::InvalidParameter {
                name: "default_max_ppo2",
                value: self.default_max_ppo2,
            });
        }
        if self.absolute_min_ppo2 >= self.absolute_max_ppo2 {
            return Err(DecoError::InvalidParameter {
                name: "absolute_min_ppo2",
                value: self.absolute_min_ppo2,
            });
        }
        if self.max_deco_iterations == 0 {
            return Err(DecoError::InvalidParameter {
                name: "max_deco_iterations",
                value: 0.0,
            });
        }

        Ok(())
    }

    pub fn water_density(&self) -> f64 {
        match self.water {
            WaterType::Sea => self.sea_water_density,
            WaterType::Fresh => self.fresh_water_density,
        }
    }

    /// Absolute ambient pressure (bar) at `depth` metres.
    pub fn depth_to_pressure(&self, depth: f64) -> f64 {
        match self.depth_pressure_method {
            DepthPressureMethod::Simple => self.surface_pressure + depth / 10.0,
            DepthPressureMethod::Complex => {
                self.surface_pressure + depth * self.water_density() * GRAVITY / 100_000.0
            }
        }
    }

    /// Depth (m) matching an absolute ambient pressure in bar.
    pub fn pressure_to_depth(&self, pressure: f64) -> f64 {
        let hydrostatic = pressure - self.surface_pressure;
        match self.depth_pressure_method {
            DepthPressureMethod::Simple => hydrostatic * 10.0,
            DepthPressureMethod::Complex => {
                hydrostatic * 100_000.0 / (self.water_density() * GRAVITY)
            }
        }
    }
}

impl Default for DiveParameters {
    fn default() -> Self {
        DiveParameters {
            surface_pressure: 1.01325,
            water_vapor_pressure: 0.0627,
            depth_pressure_method: DepthPressureMethod::Simple,
            water: WaterType::Sea,
            sea_water_density: 1030.0,
            fresh_water_density: 1000.0,
            absolute_max_ppo2: 2.0,
            absolute_min_ppo2: 0.16,
            default_max_ppo2: 1.6,
            absolute_max_tank_pressure: 300.0,
            absolute_max_tank_size: 40.0,
            narcotic: NarcoticValues::default(),
            stop_depth_increment: 3.0,
            last_stop_depth: 3.0,
            stop_time_increment: 60.0,
            ascent_rate: 10.0,
            descent_rate: 20.0,
            dive_consumption_rate: 17.0,
            deco_consumption_rate: 12.0,
            gf_low: 0.30,
            gf_high: 0.80,
            max_deco_iterations: 10_000,
        }
    }
}

#[test]
fn test_simple_pressure_round_trip() {
    let params = DiveParameters::default();
    let pressure = params.depth_to_pressure(30.0);
    assert!(libm::fabs(pressure - 4.01325) < 1e-12);
    assert!(libm::fabs(params.pressure_to_depth(pressure) - 30.0) < 1e-9);
}

#[test]
fn test_complex_pressure_is_denser_in_sea_water() {
    let mut params = DiveParameters::default();
    params.depth_pressure_method = DepthPressureMethod::Complex;
    let sea = params.depth_to_pressure(10.0);
    params.water = WaterType::Fresh;
    let fresh = params.depth_to_pressure(10.0);
    assert!(sea > fresh);
    assert!(libm::fabs(params.pressure_to_depth(fresh) - 10.0) < 1e-9);
}

#[test]
fn test_validate_rejects_bad_gradient_factors() {
    let params = DiveParameters::new(-0.1, 0.8);
    assert!(matches!(
        params.validate(),
        Err(DecoError::InvalidGradientFactor { .. })
    ));
    assert_eq!(DiveParameters::default().validate(), Ok(()));
}
