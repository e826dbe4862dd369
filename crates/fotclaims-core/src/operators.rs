//! The clinical operator set.
//!
//! Four composable operators — Diagnostic, Treatment, Safety, Virtue — as a
//! closed tagged-variant set with a uniform apply capability. The set is
//! fixed and enumerable, not extensible at runtime. The first three are
//! diagonal against the encoder's region map and expose their generator
//! coefficients so the evolution engine can apply their weighted sum as a
//! single linear update; Virtue runs the supervisor's constraint sequence.

use crate::config::EngineConfig;
use crate::encode::EncodedCase;
use crate::state::StateVector;
use crate::virtue::{VirtueSupervisor, VirtueUnderflow};

/// The closed operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClinicalOperator {
    /// Boosts differentials by their symptom correlation mass.
    Diagnostic,
    /// Damps differentials by configured treatment response.
    Treatment,
    /// Damps safety-watched outcomes.
    Safety,
    /// Constraint sequence (honesty, prudence, justice, non-maleficence).
    Virtue,
}

impl std::fmt::Display for ClinicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diagnostic => write!(f, "diagnostic"),
            Self::Treatment => write!(f, "treatment"),
            Self::Safety => write!(f, "safety"),
            Self::Virtue => write!(f, "virtue"),
        }
    }
}

impl ClinicalOperator {
    /// Diagonal generator coefficients for the linear operators. Zero
    /// everywhere except the indices the operator acts on. Panics if
    /// called on `Virtue`, which has no linear generator.
    pub fn generator(&self, config: &EngineConfig, case: &EncodedCase) -> Vec<f64> {
        let dim = case.state.dim();
        let mut g = vec![0.0; dim];
        match self {
            Self::Diagnostic => {
                let symptom_indices: Vec<usize> = case.regions.symptom_indices().collect();
                for j in case.regions.differential_indices() {
                    let gain: f64 = symptom_indices
                        .iter()
                        .map(|&i| case.entanglement.get(i, j) * case.state.amp(i).norm())
                        .sum();
                    g[j] = gain;
                }
            }
            Self::Treatment => {
                for j in case.regions.differential_indices() {
                    if let Some(label) = case.regions.label_at(j) {
                        g[j] = -config.treatment_response_for(label);
                    }
                }
            }
            Self::Safety => {
                for j in case.regions.differential_indices() {
                    let watched = case
                        .regions
                        .label_at(j)
                        .is_some_and(|l| config.safety_watch.iter().any(|w| w == l));
                    if watched {
                        g[j] = -config.safety_damping;
                    }
                }
            }
            Self::Virtue => panic!("virtue operator has no linear generator"),
        }
        g
    }

    /// Uniform apply: run this operator alone against the state and
    /// renormalize. The linear operators apply `a_i *= 1 + dt * g_i`;
    /// Virtue runs the full constraint sequence.
    pub fn apply(
        &self,
        config: &EngineConfig,
        supervisor: &VirtueSupervisor,
        case: &EncodedCase,
        state: &mut StateVector,
    ) -> Result<(), VirtueUnderflow> {
        match self {
            Self::Virtue => supervisor.apply_all(&case.regions, &case.entanglement, state),
            linear => {
                let g = linear.generator(config, case);
                apply_generator(state, &g, config.step_size);
                if state.renormalize() {
                    Ok(())
                } else {
                    Err(VirtueUnderflow {
                        constraint: "generator",
                    })
                }
            }
        }
    }
}

/// Short-time linear update `a_i *= 1 + dt * g_i`. Caller renormalizes.
pub fn apply_generator(state: &mut StateVector, g: &[f64], dt: f64) {
    for (a, &gi) in state.amplitudes_mut().iter_mut().zip(g) {
        *a *= 1.0 + dt * gi;
    }
}
