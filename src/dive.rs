//! Replays a planned dive through the model and builds the ascent.

use alloc::string::String;
use alloc::vec::Vec;

use defmt::Format;
use libm::ceil;

use crate::gradient::Gradient;
use crate::model::Model;
use crate::segment::{Segment, SegmentKind, StopInfo};
use crate::tank::{TankId, TankSet};
use crate::{DecoError, DiveParameters};

/// Picks the tank to breathe at a stop depth.
pub trait GasSwitch {
    fn select(&self, tanks: &TankSet, depth: f64, current: TankId) -> TankId;
}

/// Stay on whatever the last planned segment breathed.
#[derive(Debug, Default, Copy, Clone)]
pub struct KeepGas;

impl GasSwitch for KeepGas {
    fn select(&self, _tanks: &TankSet, _depth: f64, current: TankId) -> TankId {
        current
    }
}

/// Richest tank that is legal at the depth and still holds gas.
#[derive(Debug, Default, Copy, Clone)]
pub struct BestDecoGas;

impl GasSwitch for BestDecoGas {
    fn select(&self, tanks: &TankSet, depth: f64, current: TankId) -> TankId {
        let mut best = current;
        let mut best_o2 = match tanks.get(current) {
            Some(tank) if tank.gas().allows(depth) && tank.remaining_gas() > 0.0 => tank.gas().f_o2,
            _ => 0.0,
        };
        for (id, _, tank) in tanks.iter() {
            let gas = tank.gas();
            if gas.allows(depth) && tank.remaining_gas() > 0.0 && gas.f_o2 > best_o2 {
                best = id;
                best_o2 = gas.f_o2;
            }
        }
        best
    }
}

#[derive(Debug, Format, Copy, Clone, PartialEq, Eq)]
pub enum DiveState {
    Ready,
    Descending,
    AtDepth,
    SearchingCeiling,
    Stopping,
    Surfaced,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TankUsage {
    pub name: String,
    pub gas: String,
    pub used_gas: f64,
    pub remaining_gas: f64,
    pub in_reserve: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiveSummary {
    pub run_time: f64, // s
    pub max_depth: f64,
    pub cns: f64,
    pub otu: f64,
    pub max_ppo2: f64,
    pub deco_stops: usize,
    pub deco_time: f64, // s
    pub tanks: Vec<TankUsage>,
}

pub struct Dive<S: GasSwitch = BestDecoGas> {
    params: DiveParameters,
    model: Model,
    tanks: TankSet,
    input: Vec<Segment>,
    output: Vec<Segment>,
    state: DiveState,
    switch: S,
    depth: f64,
    run_time: f64,
}

impl Dive<BestDecoGas> {
    pub fn new(
        params: DiveParameters,
        tanks: TankSet,
        input: Vec<Segment>,
    ) -> Result<Self, DecoError> {
        params.validate()?;
        Ok(Dive {
            model: Model::new(&params)?,
            params,
            tanks,
            input,
            output: Vec::new(),
            state: DiveState::Ready,
            switch: BestDecoGas,
            depth: 0.0,
            run_time: 0.0,
        })
    }
}

impl<S: GasSwitch> Dive<S> {
    pub fn with_switch<T: GasSwitch>(self, switch: T) -> Dive<T> {
        Dive {
            params: self.params,
            model: self.model,
            tanks: self.tanks,
            input: self.input,
            output: self.output,
            state: self.state,
            switch,
            depth: self.depth,
            run_time: self.run_time,
        }
    }

    /// Continue from a model carried over from an earlier dive. A model that
    /// fails validation gets one repair attempt. The model adopts this dive's
    /// parameters.
    pub fn with_model(mut self, mut model: Model) -> Result<Self, DecoError> {
        if model.validate().is_err() {
            model.validate()?;
        }
        model.set_params(&self.params)?;
        self.model = model;
        Ok(self)
    }

    pub fn state(&self) -> DiveState {
        self.state
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn tanks(&self) -> &TankSet {
        &self.tanks
    }

    pub fn input(&self) -> &[Segment] {
        &self.input
    }

    /// Emitted segments; on failure, everything up to the failing leg.
    pub fn output(&self) -> &[Segment] {
        &self.output
    }

    pub fn run(&mut self) -> Result<(), DecoError> {
        let result = self.execute();
        if let Err(err) = &result {
            defmt::warn!("dive failed after {=usize} segments: {}", self.output.len(), err);
            self.state = DiveState::Failed;
        }
        result
    }

    fn execute(&mut self) -> Result<(), DecoError> {
        if self.input.is_empty() {
            return Err(DecoError::NothingToProcess);
        }
        // a carried-over model still holds the previous ascent's slope
        self.model.gradient = Gradient::new(self.params.gf_low, self.params.gf_high)?;

        for segment in self.input.clone() {
            self.replay(segment)?;
        }

        let (last_tank, setpoint) = match self.output.last() {
            Some(last) => (last.tank, last.setpoint),
            None => return Err(DecoError::NothingToProcess),
        };
        self.ascend(last_tank, setpoint)
    }

    fn replay(&mut self, segment: Segment) -> Result<(), DecoError> {
        let start = match segment.kind {
            SegmentKind::Const { depth } | SegmentKind::Deco { depth, .. } => depth,
            SegmentKind::AscDesc { start_depth, .. } => start_depth,
        };
        if start != self.depth {
            self.state = DiveState::Descending;
            self.travel(start, segment.tank, segment.setpoint)?;
        }
        self.state = DiveState::AtDepth;
        self.leg(&segment)?;
        self.emit(segment);
        Ok(())
    }

    /// Apply one leg to the model and its tank without emitting it.
    fn leg(&mut self, segment: &Segment) -> Result<(), DecoError> {
        let litres = segment.gas_used(&self.params);
        self.tanks
            .get_mut(segment.tank)
            .ok_or(DecoError::UnknownTank {
                index: segment.tank.0,
            })?
            .consume_gas(litres)?;
        self.model.apply(segment)?;
        self.run_time += segment.duration;
        self.depth = segment.depth();
        Ok(())
    }

    fn emit(&mut self, mut segment: Segment) {
        segment.run_time = self.run_time;
        defmt::debug!("segment {}", segment);
        self.output.push(segment);
    }

    fn travel(&mut self, target: f64, tank: TankId, setpoint: f64) -> Result<(), DecoError> {
        let rate = if target > self.depth {
            self.params.descent_rate
        } else {
            self.params.ascent_rate
        };
        let segment = Segment::asc_desc(&self.tanks, tank, self.depth, target, rate, setpoint)?;
        self.leg(&segment)?;
        self.emit(segment);
        Ok(())
    }

    fn ascend(&mut self, mut tank: TankId, setpoint: f64) -> Result<(), DecoError> {
        self.state = DiveState::SearchingCeiling;
        let increment = self.params.stop_depth_increment;
        let last_stop = self.params.last_stop_depth;

        let ceiling = self.model.ceiling();
        if ceiling <= 0.0 {
            return self.surface(tank, setpoint);
        }

        let first_stop = f64::min(
            f64::max(ceil(ceiling / increment) * increment, last_stop),
            self.depth,
        );
        defmt::info!("ceiling {=f64}m, first stop {=f64}m", ceiling, first_stop);
        self.model.gradient.set_gf_slope_at_depth(first_stop);
        if first_stop < self.depth {
            tank = self.ascent_tank(first_stop, tank);
            self.travel(first_stop, tank, setpoint)?;
        }

        self.state = DiveState::Stopping;
        let mut iterations: u32 = 0;
        let mut stop_depth = first_stop;
        loop {
            let next_stop = if stop_depth - increment < last_stop {
                0.0
            } else {
                stop_depth - increment
            };
            tank = self.switch.select(&self.tanks, stop_depth, tank);
            self.model.gradient.set_gf_at_depth(next_stop);

            let mut info = self.stop_info(stop_depth);
            let mut stop_time = 0.0;
            let soaked = self.soak(
                tank,
                stop_depth,
                next_stop,
                setpoint,
                &mut iterations,
                &mut stop_time,
                &mut info,
            );

            // completed increments are emitted even when the stop fails part way
            if stop_time > 0.0 {
                let stop =
                    Segment::deco(&self.tanks, tank, stop_depth, stop_time, setpoint, info)?;
                defmt::info!("deco stop {=f64}m for {=f64}s", stop_depth, stop_time);
                self.emit(stop);
            }
            soaked?;

            if next_stop <= 0.0 {
                return self.surface(tank, setpoint);
            }
            self.travel(next_stop, tank, setpoint)?;
            stop_depth = next_stop;
        }
    }

    /// Stay at `depth` in stop-time increments until the ceiling clears
    /// `next_stop`. `info.mv_max` keeps the highest ratio reached.
    #[allow(clippy::too_many_arguments)]
    fn soak(
        &mut self,
        tank: TankId,
        depth: f64,
        next_stop: f64,
        setpoint: f64,
        iterations: &mut u32,
        stop_time: &mut f64,
        info: &mut StopInfo,
    ) -> Result<(), DecoError> {
        let pressure = self.params.depth_to_pressure(depth);
        while self.model.ceiling() > next_stop {
            *iterations += 1;
            if *iterations > self.params.max_deco_iterations {
                return Err(DecoError::InfiniteDeco {
                    iterations: self.params.max_deco_iterations,
                    depth,
                });
            }
            let step = Segment::deco(
                &self.tanks,
                tank,
                depth,
                self.params.stop_time_increment,
                setpoint,
                *info,
            )?;
            self.leg(&step)?;
            *stop_time += step.duration;
            info.mv_max = f64::max(info.mv_max, self.model.m_value(pressure));
        }
        Ok(())
    }

    /// Tank the switch policy picks for travelling from here to `target`,
    /// kept only when it covers the whole leg.
    fn ascent_tank(&self, target: f64, current: TankId) -> TankId {
        let candidate = self.switch.select(&self.tanks, self.depth, current);
        match self.tanks.get(candidate) {
            Some(tank) if tank.gas().check_range(target, self.depth).is_ok() => candidate,
            _ => current,
        }
    }

    fn stop_info(&self, depth: f64) -> StopInfo {
        StopInfo {
            control_compartment: self.model.control_compartment(),
            gf: self.model.gradient.gf(),
            mv_max: self.model.m_value(self.params.depth_to_pressure(depth)),
        }
    }

    fn surface(&mut self, tank: TankId, setpoint: f64) -> Result<(), DecoError> {
        if self.depth > 0.0 {
            let tank = self.ascent_tank(0.0, tank);
            self.travel(0.0, tank, setpoint)?;
        }
        self.state = DiveState::Surfaced;
        Ok(())
    }

    pub fn summary(&self) -> DiveSummary {
        let stops = self.output.iter().filter(|s| s.stop().is_some());
        DiveSummary {
            run_time: self.run_time,
            max_depth: self.output.iter().map(Segment::max_depth).fold(0.0, f64::max),
            cns: self.model.ox_tox.cns,
            otu: self.model.ox_tox.otu,
            max_ppo2: self.model.ox_tox.max_ppo2,
            deco_stops: stops.clone().count(),
            deco_time: stops.map(|s| s.duration).sum(),
            tanks: self
                .tanks
                .iter()
                .map(|(_, name, tank)| TankUsage {
                    name: String::from(name),
                    gas: tank.name(),
                    used_gas: tank.used_gas(),
                    remaining_gas: tank.remaining_gas(),
                    in_reserve: tank.is_in_reserve(),
                })
                .collect(),
        }
    }
}
