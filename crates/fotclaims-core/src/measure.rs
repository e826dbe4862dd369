//! Projective measurement against named clinical observables.
//!
//! The one place randomness enters the pipeline. The random source is an
//! injected `Rng` so runs are reproducible under a seeded generator; the
//! reported uncertainty is the standard deviation of the observable's
//! operator under the pre-measurement state, not sampling noise.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::claim::Measurement;
use crate::error::MeasurementError;
use crate::state::{RegionMap, StateVector};

/// One eigen-outcome an observable can resolve to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservableCandidate {
    /// Absolute state-vector index.
    pub index: usize,
    /// Clinical label of the outcome.
    pub label: String,
    /// Eigenvalue on the observable's clinical scale.
    pub eigenvalue: f64,
}

/// Named observable: a set of candidate indices with clinical eigenvalues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observable {
    pub name: String,
    pub candidates: Vec<ObservableCandidate>,
}

impl Observable {
    /// Observable over explicit candidates.
    pub fn new(name: impl Into<String>, candidates: Vec<ObservableCandidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    /// Diagnostic confidence over the differential region: each outcome's
    /// eigenvalue is its squared-amplitude share at construction time, so
    /// the sampled value reads as a confidence score in [0,1].
    pub fn diagnostic_confidence(regions: &RegionMap, state: &StateVector) -> Self {
        let indices: Vec<usize> = regions.differential_indices().collect();
        let mass: f64 = indices.iter().map(|&i| state.probability(i)).sum();
        let candidates = indices
            .iter()
            .zip(&regions.differential_labels)
            .map(|(&index, label)| ObservableCandidate {
                index,
                label: label.clone(),
                eigenvalue: if mass > 0.0 {
                    state.probability(index) / mass
                } else {
                    0.0
                },
            })
            .collect();
        Self::new("diagnostic_confidence", candidates)
    }

    /// Symptom severity over the symptom region: eigenvalue is the
    /// amplitude magnitude, read as a severity score.
    pub fn symptom_severity(regions: &RegionMap, state: &StateVector) -> Self {
        let candidates = regions
            .symptom_indices()
            .zip(&regions.symptom_labels)
            .map(|(index, label)| ObservableCandidate {
                index,
                label: label.clone(),
                eigenvalue: state.amp(index).norm(),
            })
            .collect();
        Self::new("symptom_severity", candidates)
    }
}

/// Result of one projective measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementOutcome {
    /// Observable name.
    pub observable: String,
    /// Label of the sampled eigen-outcome.
    pub outcome: String,
    /// Eigenvalue of the sampled outcome on its clinical scale.
    pub value: f64,
    /// Sampling probability of the outcome among the candidates.
    pub probability: f64,
    /// Std-dev of the observable operator under the pre-measurement state.
    pub uncertainty: f64,
}

impl MeasurementOutcome {
    /// Convert into a claim measurement record.
    pub fn to_measurement(&self, unit: impl Into<String>) -> Measurement {
        Measurement {
            has_metric: self.observable.clone(),
            value: self.value,
            unit: unit.into(),
            uncertainty: self.uncertainty,
        }
    }
}

/// Sample one eigen-outcome of `observable` from `state`.
///
/// Candidate probabilities are squared-amplitude shares renormalized over
/// the candidate set. Fails when the observable has no surviving
/// probability mass (degenerate state after evolution).
pub fn measure(
    case_id: &str,
    state: &StateVector,
    observable: &Observable,
    rng: &mut impl Rng,
) -> Result<MeasurementOutcome, MeasurementError> {
    if observable.candidates.is_empty() {
        return Err(MeasurementError::NoCandidates {
            observable: observable.name.clone(),
        });
    }
    for c in &observable.candidates {
        if c.index >= state.dim() {
            return Err(MeasurementError::IndexOutOfRange {
                observable: observable.name.clone(),
                index: c.index,
                dimension: state.dim(),
            });
        }
    }

    let weights: Vec<f64> = observable
        .candidates
        .iter()
        .map(|c| state.probability(c.index))
        .collect();
    let mass: f64 = weights.iter().sum();
    if mass < crate::state::NORM_EPS {
        return Err(MeasurementError::ZeroMass {
            case_id: case_id.to_string(),
            observable: observable.name.clone(),
        });
    }

    // Conditional distribution over the candidate set.
    let probs: Vec<f64> = weights.iter().map(|w| w / mass).collect();

    let mean: f64 = probs
        .iter()
        .zip(&observable.candidates)
        .map(|(p, c)| p * c.eigenvalue)
        .sum();
    let second_moment: f64 = probs
        .iter()
        .zip(&observable.candidates)
        .map(|(p, c)| p * c.eigenvalue * c.eigenvalue)
        .sum();
    let uncertainty = (second_moment - mean * mean).max(0.0).sqrt();

    // Inverse-CDF sampling; the tail candidate absorbs rounding residue.
    let draw = rng.random::<f64>();
    let mut acc = 0.0;
    let mut sampled = observable.candidates.len() - 1;
    for (i, p) in probs.iter().enumerate() {
        acc += p;
        if draw < acc {
            sampled = i;
            break;
        }
    }

    let candidate = &observable.candidates[sampled];
    Ok(MeasurementOutcome {
        observable: observable.name.clone(),
        outcome: candidate.label.clone(),
        value: candidate.eigenvalue,
        probability: probs[sampled],
        uncertainty,
    })
}

/// Count of differentials whose probability exceeds `threshold`. A
/// diagnostic accessor, not a projective measurement.
pub fn active_differential_count(regions: &RegionMap, state: &StateVector, threshold: f64) -> usize {
    regions
        .differential_indices()
        .filter(|&i| state.probability(i) > threshold)
        .count()
}
