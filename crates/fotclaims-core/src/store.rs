//! Claim arena with single-writer append discipline.
//!
//! Claims are keyed by id, each behind its own mutex: appends to one claim
//! are serialized, appends to different claims proceed independently, and
//! collapse evaluation can run at any time against the current accumulated
//! state. Claims are never removed — collapsed and un-collapsed claims are
//! both retained for audit.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::claim::{Claim, CollapseOutcome, CollapsePolicy, Measurement};
use crate::error::ClaimStoreError;
use crate::readiness::ReadinessReport;

/// Thread-safe claim arena.
#[derive(Debug, Default)]
pub struct ClaimStore {
    claims: RwLock<HashMap<String, Mutex<Claim>>>,
}

impl ClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a claim and return its id. The policy is validated here;
    /// it is immutable for the claim's whole life.
    pub fn create(
        &self,
        addresses_problem: impl Into<String>,
        policy: CollapsePolicy,
        case_id: Option<String>,
    ) -> Result<String, ClaimStoreError> {
        policy
            .validate()
            .map_err(ClaimStoreError::InvalidPolicy)?;
        let claim = Claim::new(addresses_problem, policy, case_id);
        let id = claim.id.clone();
        self.claims
            .write()
            .expect("claim registry poisoned")
            .insert(id.clone(), Mutex::new(claim));
        log::debug!("created claim {id}");
        Ok(id)
    }

    /// Insert an externally constructed claim (e.g. deserialized from an
    /// audit export).
    pub fn insert(&self, claim: Claim) -> Result<String, ClaimStoreError> {
        claim
            .collapse
            .validate()
            .map_err(ClaimStoreError::InvalidPolicy)?;
        let id = claim.id.clone();
        self.claims
            .write()
            .expect("claim registry poisoned")
            .insert(id.clone(), Mutex::new(claim));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.claims.read().expect("claim registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_claim<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Claim) -> Result<T, ClaimStoreError>,
    ) -> Result<T, ClaimStoreError> {
        let registry = self.claims.read().expect("claim registry poisoned");
        let slot = registry
            .get(id)
            .ok_or_else(|| ClaimStoreError::UnknownClaim(id.to_string()))?;
        let mut claim = slot.lock().expect("claim mutex poisoned");
        f(&mut claim)
    }

    fn append(
        &self,
        id: &str,
        f: impl FnOnce(&mut Claim),
    ) -> Result<(), ClaimStoreError> {
        self.with_claim(id, |claim| {
            if claim.collapsed {
                return Err(ClaimStoreError::Frozen(claim.id.clone()));
            }
            f(claim);
            Ok(())
        })
    }

    /// Append one measurement. Rejected once the claim is frozen.
    pub fn append_measurement(&self, id: &str, m: Measurement) -> Result<(), ClaimStoreError> {
        self.append(id, |claim| claim.measurements.push(m))
    }

    /// Append a tool identifier to the evidence record.
    pub fn append_tool(&self, id: &str, tool: impl Into<String>) -> Result<(), ClaimStoreError> {
        let tool = tool.into();
        self.append(id, |claim| {
            if !claim.evidence.used.contains(&tool) {
                claim.evidence.used.push(tool);
            }
        })
    }

    /// Append a source-entity identifier to the evidence record.
    pub fn append_entity(&self, id: &str, entity: impl Into<String>) -> Result<(), ClaimStoreError> {
        let entity = entity.into();
        self.append(id, |claim| {
            if !claim.evidence.used_entity.contains(&entity) {
                claim.evidence.used_entity.push(entity);
            }
        })
    }

    /// Record the generating activity on the evidence record.
    pub fn set_generated_by(
        &self,
        id: &str,
        activity: impl Into<String>,
    ) -> Result<(), ClaimStoreError> {
        let activity = activity.into();
        self.append(id, |claim| {
            claim.evidence.was_generated_by = Some(activity);
        })
    }

    /// Record the observed alpha from the external statistical test.
    pub fn record_alpha(&self, id: &str, observed: f64) -> Result<(), ClaimStoreError> {
        self.append(id, |claim| claim.alpha_observed = Some(observed))
    }

    /// Attach an external readiness report: its entities join the
    /// evidence record and its completeness gates the claim's.
    pub fn attach_readiness(
        &self,
        id: &str,
        report: &ReadinessReport,
    ) -> Result<(), ClaimStoreError> {
        self.append(id, |claim| {
            for entity in report.evidence_entities() {
                if !claim.evidence.used_entity.contains(&entity) {
                    claim.evidence.used_entity.push(entity);
                }
            }
            let completeness = report.completeness();
            claim.readiness_completeness = Some(match claim.readiness_completeness {
                Some(existing) => existing.min(completeness),
                None => completeness,
            });
        })
    }

    /// Evaluate the collapse criteria and apply the (one-way) transition.
    /// A no-op returning the recorded verdict once collapsed.
    pub fn evaluate(&self, id: &str) -> Result<CollapseOutcome, ClaimStoreError> {
        self.with_claim(id, |claim| {
            let outcome = claim.try_collapse();
            match &outcome {
                CollapseOutcome::Collapsed { verdict, .. } => {
                    log::info!("claim {} collapsed: {verdict}", claim.id)
                }
                CollapseOutcome::NearMiss { reason } => {
                    log::info!("claim {} near miss: {reason}", claim.id)
                }
                CollapseOutcome::Superposed => {
                    log::debug!("claim {} still superposed", claim.id)
                }
            }
            Ok(outcome)
        })
    }

    /// Snapshot one claim.
    pub fn get(&self, id: &str) -> Result<Claim, ClaimStoreError> {
        self.with_claim(id, |claim| Ok(claim.clone()))
    }

    /// Export one claim as the stable JSON contract.
    pub fn export(&self, id: &str) -> Result<serde_json::Value, ClaimStoreError> {
        let claim = self.get(id)?;
        Ok(serde_json::to_value(claim).expect("claim serialization is infallible"))
    }

    /// Export every claim, ordered by id for stable output.
    pub fn export_all(&self) -> Vec<serde_json::Value> {
        let registry = self.claims.read().expect("claim registry poisoned");
        let mut claims: Vec<Claim> = registry
            .values()
            .map(|slot| slot.lock().expect("claim mutex poisoned").clone())
            .collect();
        claims.sort_by(|a, b| a.id.cmp(&b.id));
        claims
            .into_iter()
            .map(|c| serde_json::to_value(c).expect("claim serialization is infallible"))
            .collect()
    }
}
