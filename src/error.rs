use defmt::Format;
use thiserror::Error;

/// Tissue-state defects. These never come from user input: they mean the
/// model was fed a bad duration or was restored from corrupted data.
#[derive(Debug, Format, Clone, Copy, PartialEq, Error)]
pub enum ModelError {
    #[error("negative duration supplied to a tissue update")]
    NegativeDuration,
    #[error("compartment {compartment} would reach a negative partial pressure")]
    NegativePressure { compartment: usize },
    #[error("compartment {compartment} holds a corrupted gas loading")]
    CorruptedTissue { compartment: usize },
    #[error("compartment {compartment} has a zero time constant")]
    ZeroTimeConstant { compartment: usize },
}

#[derive(Debug, Format, Clone, Copy, PartialEq, Error)]
pub enum DecoError {
    #[error("invalid gas mixture: O2 {f_o2}, He {f_he}")]
    InvalidGas { f_o2: f64, f_he: f64 },
    #[error("invalid MOD {mod_depth}m (gas allows at most {max_mod}m)")]
    InvalidMod { mod_depth: f64, max_mod: f64 },
    #[error("invalid tank: {volume}L at {pressure}bar")]
    InvalidTank { volume: f64, pressure: f64 },
    #[error("invalid gradient factors: low {gf_low}, high {gf_high}")]
    InvalidGradientFactor { gf_low: f64, gf_high: f64 },
    #[error("no tank at index {index}")]
    UnknownTank { index: usize },
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("depth {depth}m is outside the tank envelope [{min_depth}m, {max_depth}m]")]
    UnauthorizedMod {
        depth: f64,
        min_depth: f64,
        max_depth: f64,
    },
    #[error("tank empty: {requested}L requested, {remaining}L remaining")]
    EmptyTank { requested: f64, remaining: f64 },
    #[error("decompression did not converge after {iterations} iterations at {depth}m")]
    InfiniteDeco { iterations: u32, depth: f64 },
    #[error("no input segments to process")]
    NothingToProcess,
    #[error("model defect: {0}")]
    Model(#[from] ModelError),
}
