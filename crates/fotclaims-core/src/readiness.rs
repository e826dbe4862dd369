//! Inbound data-readiness evidence.
//!
//! The quality-gate checker itself is an external collaborator; this is
//! the consumed shape — per-track pass/fail plus missing-field
//! descriptors — and its conversion into claim evidence for imaging,
//! audio, and lab endpoints.

use serde::{Deserialize, Serialize};

/// Result of one external readiness gate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    /// Track identifier, e.g. "imaging", "audio", "lab".
    pub track: String,
    pub ready: bool,
    /// Required fields the gate found absent.
    #[serde(default)]
    pub missing: Vec<String>,
    /// Non-blocking quality warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Total required fields the gate checked.
    pub checked: usize,
}

impl ReadinessReport {
    /// Fraction of required fields present. A gate that checked nothing
    /// contributes only its pass/fail verdict.
    pub fn completeness(&self) -> f64 {
        if self.checked == 0 {
            return if self.ready { 1.0 } else { 0.0 };
        }
        let missing = self.missing.len().min(self.checked);
        1.0 - missing as f64 / self.checked as f64
    }

    /// Source-entity identifiers this report contributes to claim
    /// evidence.
    pub fn evidence_entities(&self) -> Vec<String> {
        let mut entities = vec![format!(
            "gate:{}:{}",
            self.track,
            if self.ready { "ready" } else { "blocked" }
        )];
        entities.extend(self.missing.iter().map(|m| format!("gate:{}:missing:{m}", self.track)));
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_counts_missing_fields() {
        let r = ReadinessReport {
            track: "imaging".into(),
            ready: false,
            missing: vec!["pixelSpacingMm".into(), "deviceModel".into()],
            warnings: vec!["focus < 0.6".into()],
            checked: 8,
        };
        assert!((r.completeness() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn empty_gate_falls_back_to_verdict() {
        let pass = ReadinessReport {
            track: "audio".into(),
            ready: true,
            missing: vec![],
            warnings: vec![],
            checked: 0,
        };
        assert_eq!(pass.completeness(), 1.0);
    }

    #[test]
    fn evidence_entities_name_track_and_missing() {
        let r = ReadinessReport {
            track: "audio".into(),
            ready: false,
            missing: vec!["sampleRateHz".into()],
            warnings: vec![],
            checked: 7,
        };
        let entities = r.evidence_entities();
        assert!(entities.contains(&"gate:audio:blocked".to_string()));
        assert!(entities.contains(&"gate:audio:missing:sampleRateHz".to_string()));
    }
}
