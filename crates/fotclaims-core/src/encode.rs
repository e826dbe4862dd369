//! Clinical case encoding.
//!
//! Maps a structured clinical case (symptoms, vital signs, differential
//! hypotheses) onto disjoint regions of a state vector, builds the
//! entanglement matrix from domain correlation heuristics, and derives the
//! case's decoherence rate from its descriptor count. Pure function of its
//! input: phases come from a hash of the descriptor name, so the same case
//! always encodes to the same state.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::f64::consts::TAU;

use crate::config::EngineConfig;
use crate::error::EncodingError;
use crate::state::{EntanglementMatrix, Region, RegionMap, StateVector};

/// One symptom descriptor. Weight is a severity/confidence in [0,1];
/// zero-weight descriptors occupy an index but contribute no amplitude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomInput {
    pub name: String,
    pub weight: f64,
}

/// One vital-sign descriptor carrying its raw measured value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalInput {
    pub name: String,
    pub value: f64,
}

/// One differential-hypothesis descriptor with a prior weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialInput {
    pub name: String,
    pub weight: f64,
}

/// Clinical case submission, as produced by the (external) front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalCase {
    /// Caller-supplied id. Derived from the case content when absent.
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<SymptomInput>,
    #[serde(default)]
    pub vitals: Vec<VitalInput>,
    #[serde(default)]
    pub differentials: Vec<DifferentialInput>,
}

impl ClinicalCase {
    /// Supplied id, or the first 16 hex chars of a SHA-256 over the case
    /// content.
    pub fn resolved_id(&self) -> String {
        if let Some(id) = &self.case_id {
            return id.clone();
        }
        let mut h = Sha256::new();
        for s in &self.symptoms {
            h.update(s.name.as_bytes());
            h.update(s.weight.to_le_bytes());
        }
        for v in &self.vitals {
            h.update(v.name.as_bytes());
            h.update(v.value.to_le_bytes());
        }
        for d in &self.differentials {
            h.update(d.name.as_bytes());
            h.update(d.weight.to_le_bytes());
        }
        let digest = h.finalize();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("case:{}", &hex[..16])
    }

    pub fn descriptor_count(&self) -> usize {
        self.symptoms.len() + self.vitals.len() + self.differentials.len()
    }
}

/// Encoded case: state vector, entanglement matrix, region map, and the
/// complexity-derived decoherence rate. Owned by one analysis run.
#[derive(Debug, Clone)]
pub struct EncodedCase {
    pub case_id: String,
    pub state: StateVector,
    pub entanglement: EntanglementMatrix,
    pub regions: RegionMap,
    pub decoherence_rate: f64,
}

/// Maps clinical cases into state vectors. Holds only configuration.
#[derive(Debug, Clone)]
pub struct ClinicalEncoder {
    config: EngineConfig,
}

/// Deterministic phase in [0, τ) from a descriptor name. Keeps amplitudes
/// genuinely complex without hidden randomness.
fn phase_of(name: &str) -> f64 {
    let digest = Sha256::digest(name.as_bytes());
    let raw = u64::from_le_bytes(digest[..8].try_into().expect("8-byte slice"));
    (raw as f64 / u64::MAX as f64) * TAU
}

impl ClinicalEncoder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Encode one case. Fails when a descriptor list overflows its region
    /// capacity or when no descriptor carries any weight.
    pub fn encode(&self, case: &ClinicalCase) -> Result<EncodedCase, EncodingError> {
        let case_id = case.resolved_id();
        let cfg = &self.config;

        let check = |kind: &'static str, count: usize, capacity: usize| {
            if count > capacity {
                log::warn!("case {case_id}: {count} {kind} descriptors exceed capacity {capacity}");
                Err(EncodingError::CapacityExceeded {
                    case_id: case_id.clone(),
                    kind,
                    count,
                    capacity,
                })
            } else {
                Ok(())
            }
        };
        check("symptom", case.symptoms.len(), cfg.symptom_capacity)?;
        check("vital", case.vitals.len(), cfg.vital_capacity)?;
        check(
            "differential",
            case.differentials.len(),
            cfg.differential_capacity,
        )?;

        let symptoms = Region {
            start: 0,
            len: cfg.symptom_capacity,
        };
        let vitals = Region {
            start: cfg.symptom_capacity,
            len: cfg.vital_capacity,
        };
        let differentials = Region {
            start: cfg.symptom_capacity + cfg.vital_capacity,
            len: cfg.differential_capacity,
        };

        let mut state = StateVector::zeros(cfg.dimension);

        for (i, s) in case.symptoms.iter().enumerate() {
            let w = s.weight.max(0.0);
            state.set_amp(symptoms.start + i, Complex64::from_polar(w, phase_of(&s.name)));
        }
        for (i, v) in case.vitals.iter().enumerate() {
            let w = cfg.normalize_vital(v.value);
            state.set_amp(vitals.start + i, Complex64::from_polar(w, phase_of(&v.name)));
        }
        for (i, d) in case.differentials.iter().enumerate() {
            let w = d.weight.max(0.0);
            state.set_amp(
                differentials.start + i,
                Complex64::from_polar(w, phase_of(&d.name)),
            );
        }

        if !state.renormalize() {
            log::warn!("case {case_id}: no descriptor carries any weight");
            return Err(EncodingError::AllWeightsZero { case_id });
        }

        // Symptom-differential correlations scaled by symptom severity.
        let mut entanglement = EntanglementMatrix::zeros(cfg.dimension);
        for (i, s) in case.symptoms.iter().enumerate() {
            let strength = cfg.entanglement_strength * s.weight.clamp(0.0, 1.0);
            for j in 0..case.differentials.len() {
                entanglement.set_pair(symptoms.start + i, differentials.start + j, strength);
            }
        }

        let regions = RegionMap {
            symptoms,
            vitals,
            differentials,
            symptom_labels: case.symptoms.iter().map(|s| s.name.clone()).collect(),
            vital_labels: case.vitals.iter().map(|v| v.name.clone()).collect(),
            differential_labels: case.differentials.iter().map(|d| d.name.clone()).collect(),
        };

        let decoherence_rate = cfg.decoherence_rate(case.descriptor_count());

        log::debug!(
            "encoded case {case_id}: {} symptoms, {} vitals, {} differentials, decoherence {decoherence_rate:.3}",
            case.symptoms.len(),
            case.vitals.len(),
            case.differentials.len(),
        );

        Ok(EncodedCase {
            case_id,
            state,
            entanglement,
            regions,
            decoherence_rate,
        })
    }
}
