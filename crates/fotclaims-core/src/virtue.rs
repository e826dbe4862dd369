//! Virtue supervision: four constraint passes over the state vector.
//!
//! Applied in fixed order Honesty → Prudence → Justice → Non-maleficence,
//! renormalizing after each step. Every pass is deterministic given its
//! configuration; re-applying the sequence to the same pre-state always
//! yields the same post-state.
//!
//! - Honesty: no outcome may present more than the confidence ceiling
//!   while unmeasured alternatives survive.
//! - Prudence: between two clinically indistinguishable outcomes, the
//!   lower-risk one wins.
//! - Justice: demographic-proxy correlations cannot dominate the final
//!   distribution.
//! - Non-maleficence: actively harmful outcomes are clamped to zero,
//!   whatever their computed weight.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::VirtueConfig;
use crate::state::{EntanglementMatrix, RegionMap, StateVector};

/// Norm underflow inside a constraint pass. The evolution engine maps this
/// to a case-attributed `EvolutionError`.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("state norm underflowed after {constraint} constraint")]
pub struct VirtueUnderflow {
    pub constraint: &'static str,
}

/// Per-virtue compliance scores for the post-supervision state, each in
/// [0,1]. Heuristic audit quantities, not physically validated ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VirtueReport {
    pub honesty: f64,
    pub prudence: f64,
    pub justice: f64,
    pub non_maleficence: f64,
}

impl VirtueReport {
    pub fn mean(&self) -> f64 {
        (self.honesty + self.prudence + self.justice + self.non_maleficence) / 4.0
    }
}

/// Applies the four named constraints to a state vector.
#[derive(Debug, Clone)]
pub struct VirtueSupervisor {
    config: VirtueConfig,
}

impl VirtueSupervisor {
    pub fn new(config: VirtueConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VirtueConfig {
        &self.config
    }

    /// Run the full constraint sequence in order, renormalizing after each
    /// pass.
    pub fn apply_all(
        &self,
        regions: &RegionMap,
        entanglement: &EntanglementMatrix,
        state: &mut StateVector,
    ) -> Result<(), VirtueUnderflow> {
        self.honesty(state)?;
        self.prudence(regions, state)?;
        self.justice(regions, entanglement, state)?;
        self.non_maleficence(regions, state)?;
        Ok(())
    }

    /// Honesty: cap the dominant outcome at the confidence ceiling and
    /// redistribute the excess proportionally across the alternatives,
    /// preserving their relative ordering. Each lifted alternative ends at
    /// most `1 - ceiling`, which config validation keeps at or below the
    /// ceiling itself, so one pass suffices.
    pub fn honesty(&self, state: &mut StateVector) -> Result<(), VirtueUnderflow> {
        let ceiling = self.config.honesty_ceiling;
        let (dominant, p_max) = state.dominant();
        let rest = 1.0 - p_max;
        if p_max > ceiling && rest > 0.0 {
            let cap_scale = (ceiling / p_max).sqrt();
            let lift_scale = ((1.0 - ceiling) / rest).sqrt();
            for (i, a) in state.amplitudes_mut().iter_mut().enumerate() {
                *a *= if i == dominant { cap_scale } else { lift_scale };
            }
        }
        renorm(state, "honesty")
    }

    /// Prudence: when the top two differential outcomes are within the
    /// closeness threshold, the lower-risk one takes the larger amplitude
    /// (magnitudes exchanged, phases kept).
    pub fn prudence(
        &self,
        regions: &RegionMap,
        state: &mut StateVector,
    ) -> Result<(), VirtueUnderflow> {
        let mut ranked: Vec<(usize, f64)> = regions
            .differential_indices()
            .map(|i| (i, state.probability(i)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if let [(top, p_top), (second, p_second), ..] = ranked[..] {
            let close = (p_top - p_second) <= self.config.prudence_closeness;
            if close {
                let risk_top = self.risk_at(regions, top);
                let risk_second = self.risk_at(regions, second);
                if risk_top > risk_second {
                    let (a_top, a_second) = (state.amp(top), state.amp(second));
                    let swap = |keep_phase: num_complex::Complex64, take_mag: f64| {
                        if keep_phase.norm() > 0.0 {
                            keep_phase / keep_phase.norm() * take_mag
                        } else {
                            num_complex::Complex64::new(take_mag, 0.0)
                        }
                    };
                    state.set_amp(top, swap(a_top, a_second.norm()));
                    state.set_amp(second, swap(a_second, a_top.norm()));
                }
            }
        }
        renorm(state, "prudence")
    }

    /// Justice: damp bias-proxy descriptor amplitude, and damp each
    /// differential in proportion to its correlation mass against the
    /// bias-proxy indices in the entanglement matrix.
    pub fn justice(
        &self,
        regions: &RegionMap,
        entanglement: &EntanglementMatrix,
        state: &mut StateVector,
    ) -> Result<(), VirtueUnderflow> {
        let damping = self.config.justice_damping;
        if damping == 0.0 {
            return renorm(state, "justice");
        }
        let bias_indices: Vec<usize> = regions
            .symptom_indices()
            .chain(regions.vital_indices())
            .filter(|&i| {
                regions
                    .label_at(i)
                    .is_some_and(|l| self.config.is_bias_input(l))
            })
            .collect();
        if bias_indices.is_empty() {
            return renorm(state, "justice");
        }
        for &i in &bias_indices {
            let a = state.amp(i);
            state.set_amp(i, a * (1.0 - damping));
        }
        for j in regions.differential_indices() {
            let mass = entanglement.correlation_mass(j, bias_indices.iter().copied());
            if mass > 0.0 {
                let a = state.amp(j);
                state.set_amp(j, a / (1.0 + damping * mass));
            }
        }
        renorm(state, "justice")
    }

    /// Non-maleficence: hard-clamp harm-table outcomes to zero, then
    /// renormalize. A state left with no amplitude is an underflow, not a
    /// silent pass.
    pub fn non_maleficence(
        &self,
        regions: &RegionMap,
        state: &mut StateVector,
    ) -> Result<(), VirtueUnderflow> {
        for i in regions.differential_indices() {
            if regions
                .label_at(i)
                .is_some_and(|l| self.config.is_harmful(l))
            {
                state.set_amp(i, num_complex::Complex64::new(0.0, 0.0));
            }
        }
        renorm(state, "non_maleficence")
    }

    /// Compliance scoring for audit trails: spread of magnitudes for
    /// honesty, low-risk mass share for prudence, normalized entropy for
    /// justice, and an all-or-nothing harm check for non-maleficence.
    pub fn compliance(&self, regions: &RegionMap, state: &StateVector) -> VirtueReport {
        let mags: Vec<f64> = state.amplitudes().iter().map(|a| a.norm()).collect();
        let mean = mags.iter().sum::<f64>() / mags.len().max(1) as f64;
        let var = mags.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / mags.len().max(1) as f64;
        let honesty = (var.sqrt() / 0.5).min(1.0);

        let mut diff_mass = 0.0;
        let mut low_risk_mass = 0.0;
        let mut harm_mass = 0.0;
        for i in regions.differential_indices() {
            let p = state.probability(i);
            diff_mass += p;
            if self.risk_at(regions, i) <= 0.5 {
                low_risk_mass += p;
            }
            if regions
                .label_at(i)
                .is_some_and(|l| self.config.is_harmful(l))
            {
                harm_mass += p;
            }
        }
        let prudence = if diff_mass > 0.0 {
            (low_risk_mass / diff_mass).min(1.0)
        } else {
            0.0
        };

        let probs = state.probabilities();
        let entropy: f64 = probs
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.ln())
            .sum();
        let max_entropy = (state.dim() as f64).ln();
        let justice = if max_entropy > 0.0 {
            (entropy / max_entropy).min(1.0)
        } else {
            0.0
        };

        let non_maleficence = if harm_mass > 0.0 { 0.0 } else { 1.0 };

        VirtueReport {
            honesty,
            prudence,
            justice,
            non_maleficence,
        }
    }

    fn risk_at(&self, regions: &RegionMap, index: usize) -> f64 {
        regions
            .label_at(index)
            .map(|l| self.config.risk_for(l))
            .unwrap_or(self.config.default_risk)
    }
}

fn renorm(state: &mut StateVector, constraint: &'static str) -> Result<(), VirtueUnderflow> {
    if state.renormalize() {
        Ok(())
    } else {
        Err(VirtueUnderflow { constraint })
    }
}
