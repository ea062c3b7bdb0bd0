#![no_std]

extern crate alloc;

pub mod dive;
pub mod error;
pub mod gradient;
pub mod model;
pub mod ndl;
pub mod oxtox;
pub mod params;
pub mod segment;
pub mod tank;
pub mod tissue;
pub mod zh16c;

pub use dive::{BestDecoGas, Dive, DiveState, DiveSummary, GasSwitch, KeepGas, TankUsage};
pub use error::{DecoError, ModelError};
pub use gradient::Gradient;
pub use model::Model;
pub use oxtox::OxTox;
pub use params::{DepthPressureMethod, DiveParameters, NarcoticValues, WaterType};
pub use segment::{Segment, SegmentKind, StopInfo};
pub use tank::{Gas, ReserveRule, Tank, TankId, TankSet};
pub use tissue::Compartment;
