//! Engine-wide configuration.
//!
//! Everything that used to be a tunable constant lives here as an explicit,
//! immutable configuration object handed to the encoder, evolution engine,
//! and virtue supervisor at construction. Nothing reads module-level globals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::claim::CollapsePolicy;

/// Top-level engine configuration.
///
/// The state vector is split into three disjoint contiguous regions
/// (symptoms, vital signs, differentials); region capacities must fit the
/// configured dimension. All rate/weight fields are dimensionless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// State vector dimension.
    pub dimension: usize,
    /// Index capacity reserved for symptom descriptors.
    pub symptom_capacity: usize,
    /// Index capacity reserved for vital-sign descriptors.
    pub vital_capacity: usize,
    /// Index capacity reserved for differential hypotheses.
    pub differential_capacity: usize,

    /// Descriptor count divided by this gives the raw decoherence rate.
    pub decoherence_scale: f64,
    /// Hard ceiling on the decoherence rate.
    pub decoherence_ceiling: f64,

    /// Discrete evolution steps per case. Fixed and bounded; no early exit.
    pub evolution_steps: u32,
    /// Short-time step size for the combined generator update.
    pub step_size: f64,

    /// Weight of the diagnostic operator in the combined generator.
    pub diagnostic_weight: f64,
    /// Weight of the treatment operator in the combined generator.
    pub treatment_weight: f64,
    /// Weight of the safety operator in the combined generator.
    pub safety_weight: f64,

    /// Offset subtracted from raw vital-sign values before scaling.
    pub vital_offset: f64,
    /// Span dividing offset vital-sign values into a [0,1] weight.
    pub vital_span: f64,

    /// Base symptom-differential correlation strength for the
    /// entanglement matrix.
    pub entanglement_strength: f64,

    /// Per-differential treatment response factors (damping). Labels not
    /// listed fall back to `default_treatment_response`.
    pub treatment_response: HashMap<String, f64>,
    /// Response factor for differentials without an explicit entry.
    pub default_treatment_response: f64,
    /// Outcome labels under safety watch (soft damping, distinct from the
    /// non-maleficence hard clamp).
    pub safety_watch: Vec<String>,
    /// Damping factor applied to safety-watched outcomes per step.
    pub safety_damping: f64,

    /// Virtue supervisor constraint configuration.
    pub virtue: VirtueConfig,

    /// Collapse policy applied to claims created by the pipeline facade.
    pub default_collapse: CollapsePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension: 256,
            symptom_capacity: 64,
            vital_capacity: 64,
            differential_capacity: 128,
            decoherence_scale: 20.0,
            decoherence_ceiling: 0.5,
            evolution_steps: 10,
            step_size: 0.1,
            diagnostic_weight: 1.0,
            treatment_weight: 0.6,
            safety_weight: 0.8,
            vital_offset: 50.0,
            vital_span: 100.0,
            entanglement_strength: 0.3,
            treatment_response: HashMap::new(),
            default_treatment_response: 0.3,
            safety_watch: Vec::new(),
            safety_damping: 0.8,
            virtue: VirtueConfig::default(),
            default_collapse: CollapsePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Region capacities must partition (at most) the configured dimension.
    pub fn validate(&self) -> Result<(), String> {
        let needed = self.symptom_capacity + self.vital_capacity + self.differential_capacity;
        if needed > self.dimension {
            return Err(format!(
                "region capacities ({needed}) exceed dimension ({})",
                self.dimension
            ));
        }
        if self.dimension == 0 {
            return Err("dimension must be non-zero".into());
        }
        if !(self.step_size > 0.0) {
            return Err("step_size must be positive".into());
        }
        self.virtue.validate()?;
        self.default_collapse
            .validate()
            .map_err(|e| format!("default collapse policy: {e}"))?;
        Ok(())
    }

    /// Monotonic decoherence rate from case descriptor count, capped at the
    /// configured ceiling. More descriptors mean faster decoherence and
    /// earlier convergence toward a dominant outcome.
    pub fn decoherence_rate(&self, descriptor_count: usize) -> f64 {
        (descriptor_count as f64 / self.decoherence_scale).min(self.decoherence_ceiling)
    }

    /// Map a raw vital-sign value to a [0,1] amplitude weight.
    pub fn normalize_vital(&self, value: f64) -> f64 {
        ((value - self.vital_offset) / self.vital_span).clamp(0.0, 1.0)
    }

    /// Treatment response factor for a differential label.
    pub fn treatment_response_for(&self, label: &str) -> f64 {
        self.treatment_response
            .get(label)
            .copied()
            .unwrap_or(self.default_treatment_response)
    }
}

/// Virtue supervisor constraint configuration.
///
/// The bias-input list and harmful-outcome table are domain data supplied by
/// the deployment, not code; `table_version` identifies which revision of
/// that data produced a given run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtueConfig {
    /// Version of the externally supplied bias/harm tables.
    pub table_version: u32,
    /// Honesty: no single outcome may present more than this probability
    /// while unmeasured alternatives survive. Must be at least one half:
    /// the lifted alternatives are bounded by `1 - ceiling`, so a ceiling
    /// below that lets an alternative overshoot the cap. Validation
    /// rejects smaller values.
    pub honesty_ceiling: f64,
    /// Prudence: two outcomes whose probabilities differ by at most this
    /// are treated as clinically indistinguishable.
    pub prudence_closeness: f64,
    /// Externally supplied risk ranking per outcome label, in [0,1].
    /// Unlisted outcomes default to `default_risk`.
    pub risk_ranking: HashMap<String, f64>,
    /// Risk assumed for outcomes without an explicit ranking.
    pub default_risk: f64,
    /// Descriptor labels treated as bias-sensitive demographic proxies.
    pub bias_inputs: Vec<String>,
    /// Damping strength for bias-correlated amplitude, in [0,1].
    pub justice_damping: f64,
    /// Outcome labels flagged as actively harmful; hard-clamped to zero.
    pub harmful_outcomes: Vec<String>,
}

impl Default for VirtueConfig {
    fn default() -> Self {
        Self {
            table_version: 1,
            honesty_ceiling: 0.99,
            prudence_closeness: 0.05,
            risk_ranking: HashMap::new(),
            default_risk: 0.5,
            bias_inputs: Vec::new(),
            justice_damping: 0.5,
            harmful_outcomes: Vec::new(),
        }
    }
}

impl VirtueConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.5..=1.0).contains(&self.honesty_ceiling) {
            return Err("honesty_ceiling must be in [0.5, 1]".into());
        }
        if self.prudence_closeness < 0.0 {
            return Err("prudence_closeness must be non-negative".into());
        }
        if !(0.0..=1.0).contains(&self.justice_damping) {
            return Err("justice_damping must be in [0, 1]".into());
        }
        Ok(())
    }

    /// Risk ranking for an outcome label.
    pub fn risk_for(&self, label: &str) -> f64 {
        self.risk_ranking
            .get(label)
            .copied()
            .unwrap_or(self.default_risk)
    }

    pub fn is_bias_input(&self, label: &str) -> bool {
        self.bias_inputs.iter().any(|b| b == label)
    }

    pub fn is_harmful(&self, label: &str) -> bool {
        self.harmful_outcomes.iter().any(|h| h == label)
    }
}
