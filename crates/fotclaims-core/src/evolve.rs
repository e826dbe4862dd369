//! Discrete-step state evolution with complexity-driven decoherence.
//!
//! Each step: (1) one linear update under the weighted sum of the
//! Diagnostic, Treatment, and Safety generators, (2) amplitude damping of
//! non-dominant cross-region components scaled by the case's decoherence
//! rate, (3) the virtue constraint sequence, (4) renormalize. The step
//! count is fixed and bounded — no early-convergence detection — so every
//! run over the same case is reproducible and guaranteed to terminate.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::encode::EncodedCase;
use crate::error::EvolutionError;
use crate::operators::{apply_generator, ClinicalOperator};
use crate::virtue::{VirtueReport, VirtueSupervisor};

/// Post-evolution diagnostics attached to claim evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub steps: u32,
    pub decoherence_rate: f64,
    /// L1 coherence of the final state.
    pub coherence: f64,
    /// Von Neumann entropy of the final squared-magnitude distribution.
    pub entropy: f64,
    /// Virtue compliance of the final state.
    pub virtue: VirtueReport,
}

/// Advances encoded cases under the combined generator.
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    config: EngineConfig,
    supervisor: VirtueSupervisor,
}

impl EvolutionEngine {
    pub fn new(config: EngineConfig) -> Self {
        let supervisor = VirtueSupervisor::new(config.virtue.clone());
        Self { config, supervisor }
    }

    pub fn supervisor(&self) -> &VirtueSupervisor {
        &self.supervisor
    }

    /// Evolve the case state in place over the configured step count.
    pub fn evolve(&self, case: &mut EncodedCase) -> Result<EvolutionSummary, EvolutionError> {
        let cfg = &self.config;
        for step in 0..cfg.evolution_steps {
            let case_id = case.case_id.clone();
            let fail = |stage: &'static str| {
                log::warn!("case {case_id} fully decohered at step {step} ({stage})");
                EvolutionError::TotalDecoherence {
                    case_id: case_id.clone(),
                    step,
                    stage,
                }
            };

            // Combined generator: weighted Diagnostic + Treatment + Safety.
            let g_diag = ClinicalOperator::Diagnostic.generator(cfg, case);
            let g_treat = ClinicalOperator::Treatment.generator(cfg, case);
            let g_safe = ClinicalOperator::Safety.generator(cfg, case);
            let combined: Vec<f64> = g_diag
                .iter()
                .zip(&g_treat)
                .zip(&g_safe)
                .map(|((d, t), s)| {
                    cfg.diagnostic_weight * d + cfg.treatment_weight * t + cfg.safety_weight * s
                })
                .collect();
            apply_generator(&mut case.state, &combined, cfg.step_size);
            if !case.state.renormalize() {
                return Err(fail("generator"));
            }

            self.apply_decoherence(case);
            if !case.state.renormalize() {
                return Err(fail("decoherence"));
            }

            self.supervisor
                .apply_all(&case.regions, &case.entanglement, &mut case.state)
                .map_err(|e| fail(e.constraint))?;

            if !case.state.renormalize() {
                return Err(fail("renormalize"));
            }
        }

        let virtue = self.supervisor.compliance(&case.regions, &case.state);
        let summary = EvolutionSummary {
            steps: cfg.evolution_steps,
            decoherence_rate: case.decoherence_rate,
            coherence: case.state.coherence(),
            entropy: case.state.entanglement_entropy(),
            virtue,
        };
        log::debug!(
            "evolved case {}: {} steps, coherence {:.4}, entropy {:.4}, virtue mean {:.3}",
            case.case_id,
            summary.steps,
            summary.coherence,
            summary.entropy,
            summary.virtue.mean(),
        );
        Ok(summary)
    }

    /// Damp everything except each region's dominant component. Models the
    /// loss of cross-variable coherence as case complexity grows.
    fn apply_decoherence(&self, case: &mut EncodedCase) {
        let damp = (-case.decoherence_rate * self.config.step_size).exp();
        let regions = [
            case.regions.symptoms,
            case.regions.vitals,
            case.regions.differentials,
        ];
        for region in regions {
            let mut dominant = None;
            let mut best = 0.0;
            for i in region.range() {
                let p = case.state.probability(i);
                if p > best {
                    best = p;
                    dominant = Some(i);
                }
            }
            for i in region.range() {
                if Some(i) != dominant {
                    let a = case.state.amp(i);
                    case.state.set_amp(i, a * damp);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VirtueConfig;
    use crate::encode::{ClinicalCase, ClinicalEncoder, DifferentialInput, SymptomInput, VitalInput};

    fn demo_case() -> ClinicalCase {
        ClinicalCase {
            case_id: Some("case:evolve".into()),
            symptoms: vec![
                SymptomInput {
                    name: "chest_pain".into(),
                    weight: 0.8,
                },
                SymptomInput {
                    name: "diaphoresis".into(),
                    weight: 0.7,
                },
            ],
            vitals: vec![VitalInput {
                name: "heart_rate".into(),
                value: 110.0,
            }],
            differentials: vec![
                DifferentialInput {
                    name: "myocardial_infarction".into(),
                    weight: 0.3,
                },
                DifferentialInput {
                    name: "angina".into(),
                    weight: 0.2,
                },
                DifferentialInput {
                    name: "anxiety".into(),
                    weight: 0.1,
                },
            ],
        }
    }

    #[test]
    fn evolution_preserves_unit_norm() {
        let config = EngineConfig::default();
        let encoder = ClinicalEncoder::new(config.clone());
        let engine = EvolutionEngine::new(config);
        let mut case = encoder.encode(&demo_case()).unwrap();
        let summary = engine.evolve(&mut case).unwrap();
        assert_eq!(summary.steps, 10);
        assert!((case.state.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn evolution_is_reproducible() {
        let config = EngineConfig::default();
        let encoder = ClinicalEncoder::new(config.clone());
        let engine = EvolutionEngine::new(config);
        let mut a = encoder.encode(&demo_case()).unwrap();
        let mut b = encoder.encode(&demo_case()).unwrap();
        engine.evolve(&mut a).unwrap();
        engine.evolve(&mut b).unwrap();
        assert_eq!(a.state, b.state);
    }

    #[test]
    fn decoherence_concentrates_amplitude() {
        let config = EngineConfig {
            evolution_steps: 40,
            ..EngineConfig::default()
        };
        let encoder = ClinicalEncoder::new(config.clone());
        let engine = EvolutionEngine::new(config);
        let mut case = encoder.encode(&demo_case()).unwrap();
        let entropy_before = case.state.entanglement_entropy();
        engine.evolve(&mut case).unwrap();
        assert!(case.state.entanglement_entropy() < entropy_before);
    }

    #[test]
    fn total_decoherence_is_reported_with_case_id() {
        // Every differential harmful and all other weight zeroed out by
        // hard clamping leaves nothing to renormalize.
        let config = EngineConfig {
            virtue: VirtueConfig {
                harmful_outcomes: vec!["only".into()],
                ..VirtueConfig::default()
            },
            ..EngineConfig::default()
        };
        let encoder = ClinicalEncoder::new(config.clone());
        let engine = EvolutionEngine::new(config);
        let case_input = ClinicalCase {
            case_id: Some("case:doomed".into()),
            symptoms: vec![],
            vitals: vec![],
            differentials: vec![DifferentialInput {
                name: "only".into(),
                weight: 1.0,
            }],
        };
        let mut case = encoder.encode(&case_input).unwrap();
        let err = engine.evolve(&mut case).unwrap_err();
        match err {
            EvolutionError::TotalDecoherence { case_id, stage, .. } => {
                assert_eq!(case_id, "case:doomed");
                assert_eq!(stage, "non_maleficence");
            }
        }
    }
}
