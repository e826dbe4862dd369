//! FoT claim records and collapse-policy evaluation.
//!
//! Every conclusion the engine asserts is a claim carrying provenance,
//! uncertainty, and an explicit collapse policy. A claim starts Superposed,
//! accumulates measurements and evidence monotonically, and either
//! Collapses (all policy criteria hold, verdict assigned, record frozen) or
//! lands on NearMiss with the specific failed criteria named. Collapsed
//! claims never un-collapse, and nothing is ever deleted — both collapsed
//! and un-collapsed claims are retained for audit.
//!
//! The serialized field names (`addressesProblem`, `hasMetric`, ...) are
//! the one externally depended-upon contract and must stay stable.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named metric value with unit and non-negative uncertainty. Immutable
/// once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(rename = "hasMetric")]
    pub has_metric: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub uncertainty: f64,
}

/// Collapse policy, set at claim creation and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapsePolicy {
    /// Independent measurements required on the same metric.
    pub replications: u32,
    /// Statistical significance budget, in (0,1) when present.
    #[serde(rename = "alphaSpent", skip_serializing_if = "Option::is_none", default)]
    pub alpha_spent: Option<f64>,
    /// Minimum evidence completeness fraction, inclusive bound.
    #[serde(rename = "minCompleteness")]
    pub min_completeness: f64,
    /// Maximum pairwise delta among replicated measurement values.
    #[serde(
        rename = "agreementDeltaMax",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub agreement_delta_max: Option<f64>,
}

impl Default for CollapsePolicy {
    fn default() -> Self {
        Self {
            replications: 2,
            alpha_spent: None,
            min_completeness: 0.9,
            agreement_delta_max: Some(0.05),
        }
    }
}

impl CollapsePolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.replications < 1 {
            return Err("replications must be >= 1".into());
        }
        if let Some(a) = self.alpha_spent {
            if !(0.0 < a && a < 1.0) {
                return Err(format!("alphaSpent {a} outside (0, 1)"));
            }
        }
        if !(0.0..=1.0).contains(&self.min_completeness) {
            return Err(format!(
                "minCompleteness {} outside [0, 1]",
                self.min_completeness
            ));
        }
        if let Some(d) = self.agreement_delta_max {
            if d < 0.0 {
                return Err(format!("agreementDeltaMax {d} negative"));
            }
        }
        Ok(())
    }
}

/// Provenance record: tools used, source entities consulted, generator,
/// and generation timestamp. Append-only before collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub used: Vec<String>,
    #[serde(rename = "usedEntity", default)]
    pub used_entity: Vec<String>,
    #[serde(
        rename = "wasGeneratedBy",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub was_generated_by: Option<String>,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
}

impl Evidence {
    pub fn new() -> Self {
        Self {
            used: Vec::new(),
            used_entity: Vec::new(),
            was_generated_by: None,
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Populated required fields over required field count.
    pub fn completeness(&self) -> f64 {
        let populated = [
            !self.used.is_empty(),
            !self.used_entity.is_empty(),
            self.was_generated_by.is_some(),
        ]
        .iter()
        .filter(|&&p| p)
        .count();
        populated as f64 / 3.0
    }
}

impl Default for Evidence {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state")]
pub enum CollapseOutcome {
    /// Criteria 1-2 (replications, completeness) not yet met; the claim
    /// keeps accumulating evidence.
    Superposed,
    /// All criteria hold; the claim is frozen with this verdict.
    Collapsed { verdict: String, reason: String },
    /// Replications and completeness hold but agreement or alpha failed.
    /// Terminal for this pass; re-entered on new evidence.
    NearMiss { reason: String },
}

/// One auditable clinical conclusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    #[serde(rename = "addressesProblem")]
    pub addresses_problem: String,
    /// Weak back-reference to the producing case; the case may be retired
    /// independently of the claim.
    #[serde(rename = "caseId", skip_serializing_if = "Option::is_none", default)]
    pub case_id: Option<String>,
    pub measurements: Vec<Measurement>,
    pub collapse: CollapsePolicy,
    pub evidence: Evidence,
    pub collapsed: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub verdict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
    /// Observed alpha from the externally chosen statistical test; this
    /// component only enforces the budget comparison.
    #[serde(
        rename = "alphaObserved",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub alpha_observed: Option<f64>,
    /// Completeness reported by the external data-readiness gate, when a
    /// readiness report was attached.
    #[serde(
        rename = "readinessCompleteness",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub readiness_completeness: Option<f64>,
}

impl Claim {
    pub fn new(
        addresses_problem: impl Into<String>,
        collapse: CollapsePolicy,
        case_id: Option<String>,
    ) -> Self {
        Self {
            id: format!("clm:{}", Uuid::new_v4()),
            addresses_problem: addresses_problem.into(),
            case_id,
            measurements: Vec::new(),
            collapse,
            evidence: Evidence::new(),
            collapsed: false,
            verdict: None,
            reason: None,
            alpha_observed: None,
            readiness_completeness: None,
        }
    }

    /// Effective completeness: the evidence-field fraction, further gated
    /// by the readiness report when one was attached.
    pub fn completeness(&self) -> f64 {
        let base = self.evidence.completeness();
        match self.readiness_completeness {
            Some(r) => base.min(r),
            None => base,
        }
    }

    /// The largest group of measurements sharing one metric — the
    /// replication set the collapse criteria are judged against.
    fn replication_group(&self) -> Vec<&Measurement> {
        let mut best: Vec<&Measurement> = Vec::new();
        for m in &self.measurements {
            let group: Vec<&Measurement> = self
                .measurements
                .iter()
                .filter(|o| o.has_metric == m.has_metric)
                .collect();
            if group.len() > best.len() {
                best = group;
            }
        }
        best
    }

    /// Evaluate the collapse criteria against the current accumulated
    /// state. Pure: does not transition the claim.
    pub fn evaluate(&self) -> CollapseOutcome {
        if self.collapsed {
            return CollapseOutcome::Collapsed {
                verdict: self.verdict.clone().unwrap_or_default(),
                reason: self.reason.clone().unwrap_or_default(),
            };
        }

        let group = self.replication_group();
        let completeness = self.completeness();

        // Criteria 1-2: gate for any terminal outcome.
        if (group.len() as u32) < self.collapse.replications
            || completeness < self.collapse.min_completeness
        {
            return CollapseOutcome::Superposed;
        }

        let mut failed: Vec<String> = Vec::new();

        // Criterion 3: pairwise agreement among the replication set.
        if let Some(delta_max) = self.collapse.agreement_delta_max {
            let mut worst = 0.0f64;
            for (i, a) in group.iter().enumerate() {
                for b in &group[i + 1..] {
                    worst = worst.max((a.value - b.value).abs());
                }
            }
            if worst > delta_max {
                failed.push(format!(
                    "agreement delta {worst:.4} exceeds maximum {delta_max:.4}"
                ));
            }
        }

        // Criterion 4: alpha budget. A set budget with no recorded test
        // result fails — never silently passes.
        if let Some(budget) = self.collapse.alpha_spent {
            match self.alpha_observed {
                Some(observed) if observed <= budget => {}
                Some(observed) => failed.push(format!(
                    "observed alpha {observed:.4} exceeds budget {budget:.4}"
                )),
                None => failed.push(format!(
                    "alpha budget {budget:.4} set but no test result recorded"
                )),
            }
        }

        if !failed.is_empty() {
            return CollapseOutcome::NearMiss {
                reason: failed.join("; "),
            };
        }

        let metric = group
            .first()
            .map(|m| m.has_metric.as_str())
            .unwrap_or("metric");
        let n = group.len();
        let mean = group.iter().map(|m| m.value).sum::<f64>() / n as f64;
        let spread = group
            .iter()
            .map(|m| (m.value - mean).abs())
            .fold(0.0f64, f64::max);
        CollapseOutcome::Collapsed {
            verdict: format!("{metric} replicated: mean {mean:.4} (n={n}, spread {spread:.4})"),
            reason: "all collapse criteria satisfied".into(),
        }
    }

    /// Evaluate and apply the transition. The single collapse transition
    /// is one-way; on an already collapsed claim this is a no-op returning
    /// the recorded verdict.
    pub fn try_collapse(&mut self) -> CollapseOutcome {
        let outcome = self.evaluate();
        if let CollapseOutcome::Collapsed { verdict, reason } = &outcome {
            if !self.collapsed {
                self.collapsed = true;
                self.verdict = Some(verdict.clone());
                self.reason = Some(reason.clone());
            }
        }
        outcome
    }
}
