use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use defmt::Format;
use libm::{ceil, floor, round};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{DecoError, DiveParameters};

/// Maximum operating depth (m) of a mix with `f_o2` oxygen at `pp_o2` bar.
pub fn mod_at(f_o2: f64, pp_o2: f64) -> f64 {
    floor(10.0 * (pp_o2 / f_o2) - 10.0)
}

/// Gas fractions plus the depth envelope they may be breathed in.
#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gas {
    pub f_o2: f64,
    pub f_he: f64,
    pub f_n2: f64,
    pub mod_depth: f64,
    pub min_od: f64,
}

impl Gas {
    pub fn allows(&self, depth: f64) -> bool {
        depth >= self.min_od && depth <= self.mod_depth
    }

    /// Fails unless `[shallow, deep]` lies within the envelope.
    pub fn check_range(&self, shallow: f64, deep: f64) -> Result<(), DecoError> {
        if self.allows(shallow) && self.allows(deep) {
            return Ok(());
        }
        let depth = if self.allows(shallow) { deep } else { shallow };
        Err(DecoError::UnauthorizedMod {
            depth,
            min_depth: self.min_od,
            max_depth: self.mod_depth,
        })
    }

    /// Air, Nitrox 32, Oxygen, Trimix 18/45, Heliox 10/90.
    pub fn name(&self) -> String {
        let o2 = round(self.f_o2 * 100.0) as u32;
        let he = round(self.f_he * 100.0) as u32;
        let n2 = round(self.f_n2 * 100.0) as u32;
        if o2 == 100 {
            String::from("Oxygen")
        } else if he == 0 && o2 == 21 {
            String::from("Air")
        } else if he == 0 {
            format!("Nitrox {}", o2)
        } else if n2 == 0 {
            format!("Heliox {}/{}", o2, he)
        } else {
            format!("Trimix {}/{}", o2, he)
        }
    }
}

/// Gas kept back from planning, evaluated against the full cylinder.
#[derive(Debug, Format, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReserveRule {
    /// Keep this many bar in the cylinder.
    Bar(f64),
    /// Keep a third of the fill.
    Thirds,
}

impl Default for ReserveRule {
    fn default() -> Self {
        ReserveRule::Bar(30.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tank {
    gas: Gas,
    max_ppo2: f64,
    volume: f64,   // litres
    pressure: f64, // bar
    remaining_gas: f64,
    used_gas: f64,
    reserve: ReserveRule,
}

impl Tank {
    /// Tank whose MOD follows the configured default max ppO2.
    pub fn new(
        params: &DiveParameters,
        f_o2: f64,
        f_he: f64,
        volume: f64,
        pressure: f64,
    ) -> Result<Self, DecoError> {
        Self::with_limits(params, f_o2, f_he, None, None, volume, pressure)
    }

    pub fn air(params: &DiveParameters, volume: f64, pressure: f64) -> Result<Self, DecoError> {
        Self::new(params, 0.21, 0.0, volume, pressure)
    }

    /// Full constructor. `max_ppo2` defaults to the configured default, and
    /// `mod_depth` to the MOD it implies; an explicit MOD may only be
    /// shallower.
    pub fn with_limits(
        params: &DiveParameters,
        f_o2: f64,
        f_he: f64,
        max_ppo2: Option<f64>,
        mod_depth: Option<f64>,
        volume: f64,
        pressure: f64,
    ) -> Result<Self, DecoError> {
        if !(f_o2 > 0.0 && f_o2 <= 1.0) || !(0.0..=1.0).contains(&f_he) || f_o2 + f_he > 1.0 {
            return Err(DecoError::InvalidGas { f_o2, f_he });
        }
        if !(volume > 0.0 && volume <= params.absolute_max_tank_size)
            || !(pressure > 0.0 && pressure <= params.absolute_max_tank_pressure)
        {
            return Err(DecoError::InvalidTank { volume, pressure });
        }

        let max_ppo2 = max_ppo2.unwrap_or(params.default_max_ppo2);
        let max_mod = f64::min(
            mod_at(f_o2, max_ppo2),
            mod_at(f_o2, params.absolute_max_ppo2),
        );
        let mod_depth = mod_depth.unwrap_or(max_mod);
        if mod_depth <= 0.0 || mod_depth > max_mod {
            return Err(DecoError::InvalidMod { mod_depth, max_mod });
        }

        let min_od = f64::max(0.0, ceil(10.0 * (params.absolute_min_ppo2 / f_o2) - 10.0));
        if min_od > mod_depth {
            return Err(DecoError::InvalidGas { f_o2, f_he });
        }

        let gas = Gas {
            f_o2,
            f_he,
            f_n2: f64::max(0.0, 1.0 - f_o2 - f_he),
            mod_depth,
            min_od,
        };
        defmt::debug!("tank {} mod {=f64}m min {=f64}m", gas, mod_depth, min_od);

        Ok(Tank {
            gas,
            max_ppo2,
            volume,
            pressure,
            remaining_gas: volume * pressure,
            used_gas: 0.0,
            reserve: ReserveRule::default(),
        })
    }

    pub fn with_reserve(mut self, reserve: ReserveRule) -> Self {
        self.reserve = reserve;
        self
    }

    pub fn gas(&self) -> Gas {
        self.gas
    }

    pub fn name(&self) -> String {
        self.gas.name()
    }

    pub fn max_ppo2(&self) -> f64 {
        self.max_ppo2
    }

    pub fn mod_depth(&self) -> f64 {
        self.gas.mod_depth
    }

    pub fn min_od(&self) -> f64 {
        self.gas.min_od
    }

    pub fn mod_for(&self, pp_o2: f64) -> f64 {
        mod_at(self.gas.f_o2, pp_o2)
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn total_gas(&self) -> f64 {
        self.volume * self.pressure
    }

    pub fn remaining_gas(&self) -> f64 {
        self.remaining_gas
    }

    pub fn used_gas(&self) -> f64 {
        self.used_gas
    }

    pub fn reserve_gas(&self) -> f64 {
        match self.reserve {
            ReserveRule::Bar(bar) => self.volume * bar,
            ReserveRule::Thirds => self.total_gas() / 3.0,
        }
    }

    pub fn is_in_reserve(&self) -> bool {
        self.remaining_gas < self.reserve_gas()
    }

    /// Take `litres` out of the cylinder. Nothing changes on failure.
    pub fn consume_gas(&mut self, litres: f64) -> Result<(), DecoError> {
        if litres > self.remaining_gas {
            return Err(DecoError::EmptyTank {
                requested: litres,
                remaining: self.remaining_gas,
            });
        }
        self.remaining_gas -= litres;
        self.used_gas += litres;
        Ok(())
    }
}

impl fmt::Display for Tank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}l-{}b (rem: {:.0}l)",
            self.name(),
            self.volume,
            self.pressure,
            self.remaining_gas
        )
    }
}

/// Index of a tank inside a [`TankSet`].
#[derive(Debug, Format, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TankId(pub usize);

/// Named tanks available to a plan.
#[derive(Debug, Clone, Default)]
pub struct TankSet {
    tanks: Vec<(String, Tank)>,
}

impl TankSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, tank: Tank) -> TankId {
        self.tanks.push((String::from(name), tank));
        TankId(self.tanks.len() - 1)
    }

    pub fn get(&self, id: TankId) -> Option<&Tank> {
        self.tanks.get(id.0).map(|(_, tank)| tank)
    }

    pub fn get_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.tanks.get_mut(id.0).map(|(_, tank)| tank)
    }

    pub fn name(&self, id: TankId) -> Option<&str> {
        self.tanks.get(id.0).map(|(name, _)| name.as_str())
    }

    pub fn by_name(&self, name: &str) -> Option<TankId> {
        self.tanks.iter().position(|(n, _)| n == name).map(TankId)
    }

    pub fn len(&self) -> usize {
        self.tanks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tanks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TankId, &str, &Tank)> {
        self.tanks
            .iter()
            .enumerate()
            .map(|(i, (name, tank))| (TankId(i), name.as_str(), tank))
    }
}

#[test]
fn test_min_od_of_hypoxic_trimix() {
    let params = DiveParameters::default();
    let tank = Tank::new(&params, 0.10, 0.70, 12.0, 200.0).unwrap();
    assert_eq!(tank.min_od(), 6.0);
    assert_eq!(tank.name(), "Trimix 10/70");
}

#[test]
fn test_explicit_mod_must_be_shallower() {
    let params = DiveParameters::default();
    assert!(Tank::with_limits(&params, 0.32, 0.0, None, Some(30.0), 12.0, 200.0).is_ok());
    assert_eq!(
        Tank::with_limits(&params, 0.32, 0.0, None, Some(45.0), 12.0, 200.0),
        Err(DecoError::InvalidMod {
            mod_depth: 45.0,
            max_mod: 40.0
        })
    );
}
