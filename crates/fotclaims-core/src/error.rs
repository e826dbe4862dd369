//! Pipeline error surface.
//!
//! Every failure is explicit and attributable to a stage: encoding,
//! evolution, measurement, or claim-store misuse. There is no silent
//! fallback to defaults anywhere in the pipeline. Collapse-criteria
//! failure is deliberately not here — a near-miss is a valid, reportable
//! outcome, not an error.

use thiserror::Error;

/// Bad or insufficient case input shape. Not retried; the caller corrects
/// the case and resubmits.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EncodingError {
    #[error("case {case_id}: {count} {kind} descriptors exceed region capacity {capacity}")]
    CapacityExceeded {
        case_id: String,
        kind: &'static str,
        count: usize,
        capacity: usize,
    },
    #[error("case {case_id}: all descriptor weights are zero, no amplitude to assign")]
    AllWeightsZero { case_id: String },
}

/// Total decoherence: the state magnitude underflowed with no surviving
/// amplitude. Reported with the case id for manual review, never retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvolutionError {
    #[error("case {case_id}: total decoherence at step {step} ({stage}), no surviving amplitude")]
    TotalDecoherence {
        case_id: String,
        step: u32,
        stage: &'static str,
    },
}

/// Degenerate observable. The caller may retry with a different or
/// narrower observable set.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MeasurementError {
    #[error("case {case_id}: observable '{observable}' has zero probability mass")]
    ZeroMass { case_id: String, observable: String },
    #[error("observable '{observable}' candidate index {index} outside state dimension {dimension}")]
    IndexOutOfRange {
        observable: String,
        index: usize,
        dimension: usize,
    },
    #[error("observable '{observable}' has no candidates")]
    NoCandidates { observable: String },
}

/// Claim arena misuse.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClaimStoreError {
    #[error("unknown claim '{0}'")]
    UnknownClaim(String),
    #[error("claim '{0}' is collapsed and frozen; appends are rejected")]
    Frozen(String),
    #[error("invalid collapse policy: {0}")]
    InvalidPolicy(String),
}

/// Umbrella for the one-shot analyze pipeline.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Evolution(#[from] EvolutionError),
    #[error(transparent)]
    Measurement(#[from] MeasurementError),
    #[error(transparent)]
    Claims(#[from] ClaimStoreError),
}
