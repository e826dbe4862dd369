//! Pipeline facade: encode → evolve → measure → claim.
//!
//! One engine instance holds the immutable configuration and runs whole
//! cases synchronously — no suspension points, strictly ordered stages.
//! Separate cases share no mutable state and can run on independent
//! threads; only claim appends funnel through the store's per-claim locks.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::claim::CollapseOutcome;
use crate::config::EngineConfig;
use crate::encode::{ClinicalCase, ClinicalEncoder, EncodedCase};
use crate::error::{EncodingError, EvolutionError, MeasurementError, PipelineError};
use crate::evolve::{EvolutionEngine, EvolutionSummary};
use crate::measure::{measure, MeasurementOutcome, Observable};
use crate::store::ClaimStore;

/// Result of a full analyze run: the claim id plus the evaluation outcome
/// of the first collapse pass.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub case_id: String,
    pub claim_id: String,
    pub outcome: CollapseOutcome,
    pub summary: EvolutionSummary,
}

/// The quantum-analog clinical engine.
pub struct QuantumClinicalEngine {
    encoder: ClinicalEncoder,
    evolver: EvolutionEngine,
}

impl QuantumClinicalEngine {
    /// Build an engine. The configuration is validated once here and
    /// immutable afterwards.
    pub fn new(config: EngineConfig) -> Result<Self, String> {
        config.validate()?;
        log::info!(
            "clinical engine initialized: dimension {}, {} evolution steps, virtue tables v{}",
            config.dimension,
            config.evolution_steps,
            config.virtue.table_version,
        );
        Ok(Self {
            encoder: ClinicalEncoder::new(config.clone()),
            evolver: EvolutionEngine::new(config),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        self.encoder.config()
    }

    /// Encode a clinical case into its state vector and entanglement
    /// matrix.
    pub fn encode_case(&self, case: &ClinicalCase) -> Result<EncodedCase, EncodingError> {
        self.encoder.encode(case)
    }

    /// Evolve an encoded case over the configured step count.
    pub fn evolve(&self, case: &mut EncodedCase) -> Result<EvolutionSummary, EvolutionError> {
        self.evolver.evolve(case)
    }

    /// Measure one observable against an evolved case.
    pub fn measure(
        &self,
        case: &EncodedCase,
        observable: &Observable,
        rng: &mut impl Rng,
    ) -> Result<MeasurementOutcome, MeasurementError> {
        measure(&case.case_id, &case.state, observable, rng)
    }

    /// Run the whole pipeline for one case: encode, evolve, measure the
    /// diagnostic-confidence and symptom-severity observables, register a
    /// claim addressing `problem`, and run one collapse evaluation. The
    /// claim stays in the store for further evidence regardless of the
    /// outcome.
    pub fn analyze_case(
        &self,
        case: &ClinicalCase,
        problem: &str,
        store: &ClaimStore,
        rng: &mut impl Rng,
    ) -> Result<AnalysisReport, PipelineError> {
        let mut encoded = self.encode_case(case)?;
        let summary = self.evolve(&mut encoded)?;

        let confidence_obs = Observable::diagnostic_confidence(&encoded.regions, &encoded.state);
        let confidence = self.measure(&encoded, &confidence_obs, rng)?;

        let severity = if encoded.regions.symptom_labels.is_empty() {
            None
        } else {
            let severity_obs = Observable::symptom_severity(&encoded.regions, &encoded.state);
            Some(self.measure(&encoded, &severity_obs, rng)?)
        };

        let claim_id = store.create(
            problem,
            self.config().default_collapse.clone(),
            Some(encoded.case_id.clone()),
        )?;
        let toolchain = format!(
            "fotclaims-engine:{}:{}",
            crate::VERSION,
            toolchain_hash(&encoded.case_id, &summary)
        );
        store.append_tool(&claim_id, toolchain)?;
        store.append_entity(&claim_id, encoded.case_id.clone())?;
        store.set_generated_by(&claim_id, format!("analysis:{}", encoded.case_id))?;
        store.append_measurement(&claim_id, confidence.to_measurement("confidence"))?;
        if let Some(severity) = &severity {
            store.append_measurement(&claim_id, severity.to_measurement("severity"))?;
        }

        let outcome = store.evaluate(&claim_id)?;
        log::info!(
            "case {} analyzed: claim {claim_id}, outcome {:?}",
            encoded.case_id,
            std::mem::discriminant(&outcome),
        );
        Ok(AnalysisReport {
            case_id: encoded.case_id,
            claim_id,
            outcome,
            summary,
        })
    }
}

/// Short reproducibility hash over the case id and evolution diagnostics.
pub fn toolchain_hash(case_id: &str, summary: &EvolutionSummary) -> String {
    let mut h = Sha256::new();
    h.update(case_id.as_bytes());
    h.update(summary.steps.to_le_bytes());
    h.update(summary.decoherence_rate.to_le_bytes());
    h.update(summary.coherence.to_le_bytes());
    h.update(summary.entropy.to_le_bytes());
    let digest = h.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}
