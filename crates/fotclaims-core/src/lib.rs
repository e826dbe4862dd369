//! # fotclaims-core
//!
//! **Every clinical conclusion is a claim with provenance, uncertainty,
//! and an explicit collapse policy.**
//!
//! `fotclaims-core` is the decision-support core of a clinical-trial
//! workflow tool. A clinical case (symptoms, vital signs, differential
//! hypotheses) is encoded into a normalized complex state vector, evolved
//! under a composite operator mixing diagnostic, treatment, safety, and
//! virtue terms, and collapsed via projective measurement into concrete
//! claims about clinical endpoints.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fotclaims_core::{ClaimStore, ClinicalCase, EngineConfig, QuantumClinicalEngine};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let engine = QuantumClinicalEngine::new(EngineConfig::default()).unwrap();
//! let store = ClaimStore::new();
//! let case: ClinicalCase = serde_json::from_str(r#"{
//!     "case_id": "case:demo",
//!     "symptoms": [{"name": "chest_pain", "weight": 0.8}],
//!     "vitals": [{"name": "heart_rate", "value": 110.0}],
//!     "differentials": [{"name": "myocardial_infarction", "weight": 0.3},
//!                       {"name": "angina", "weight": 0.2}]
//! }"#).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let report = engine
//!     .analyze_case(&case, "clinical_diagnosis", &store, &mut rng)
//!     .unwrap();
//! println!("claim {} -> {:?}", report.claim_id, report.outcome);
//! ```
//!
//! ## Architecture
//!
//! Encoder → State Vector (+ Entanglement Matrix) → Evolution (operators +
//! virtue supervision + decoherence) → Measurement → Claim store →
//! Collapsed / NearMiss / Superposed.
//!
//! The "quantum" vocabulary is a linear-algebra analogy — normalized
//! complex state, deterministic operators, probability as squared
//! magnitude — not a model of physical hardware, and the output is never
//! a diagnosis: it is a structured, auditable hypothesis with quantified
//! uncertainty, subject to human and regulatory review.
//!
//! Randomness enters in exactly one place (measurement sampling) through
//! an injected generator, so every run is reproducible under a seed.

pub mod claim;
pub mod config;
pub mod encode;
pub mod engine;
pub mod error;
pub mod evolve;
pub mod measure;
pub mod operators;
pub mod readiness;
pub mod state;
pub mod store;
pub mod virtue;

pub use claim::{Claim, CollapseOutcome, CollapsePolicy, Evidence, Measurement};
pub use config::{EngineConfig, VirtueConfig};
pub use encode::{
    ClinicalCase, ClinicalEncoder, DifferentialInput, EncodedCase, SymptomInput, VitalInput,
};
pub use engine::{toolchain_hash, AnalysisReport, QuantumClinicalEngine};
pub use error::{
    ClaimStoreError, EncodingError, EvolutionError, MeasurementError, PipelineError,
};
pub use evolve::{EvolutionEngine, EvolutionSummary};
pub use measure::{
    active_differential_count, measure, MeasurementOutcome, Observable, ObservableCandidate,
};
pub use readiness::ReadinessReport;
pub use state::{EntanglementMatrix, Region, RegionMap, StateVector, NORM_EPS};
pub use store::ClaimStore;
pub use virtue::{VirtueReport, VirtueSupervisor, VirtueUnderflow};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
