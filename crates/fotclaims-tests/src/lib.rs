//! Statistical verification battery for the fotclaims engine.
//!
//! Distribution checks used to validate the measurement probability law
//! and related pipeline properties. Each check returns a [`CheckResult`]
//! carrying the raw statistic and, where the check is a hypothesis test,
//! a p-value banded into a letter grade for report scanning.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Outcome of one distribution check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl CheckResult {
    /// Build a graded hypothesis-test result. The check passes when the
    /// p-value clears `threshold`; the grade bands the p-value above it
    /// (A at 0.05 or better, B at 0.01, C down to the threshold, F below).
    fn graded(name: &str, statistic: f64, p: f64, threshold: f64, details: String) -> Self {
        let grade = if p >= 0.05 {
            'A'
        } else if p >= 0.01 {
            'B'
        } else if p >= threshold {
            'C'
        } else {
            'F'
        };
        Self {
            name: name.to_string(),
            passed: p >= threshold,
            p_value: Some(p),
            statistic,
            details,
            grade,
        }
    }
}

fn insufficient(name: &str, details: String) -> CheckResult {
    CheckResult {
        name: name.to_string(),
        passed: false,
        p_value: None,
        statistic: 0.0,
        details,
        grade: 'F',
    }
}

/// Chi-squared goodness of fit of observed outcome counts against an
/// expected probability distribution.
///
/// Used to verify the measurement probability law: across many repeated
/// measurements of the same evolved state under different seeds, sampled
/// outcome frequencies must converge to the squared-amplitude
/// distribution. Bins with negligible expected mass are pooled into their
/// neighbors to keep the chi-squared approximation honest.
pub fn frequency_goodness_of_fit(counts: &[u64], expected_probs: &[f64]) -> CheckResult {
    let name = "Measurement Frequency vs Squared Amplitude";
    if counts.len() != expected_probs.len() || counts.is_empty() {
        return insufficient(
            name,
            format!(
                "bin mismatch: {} counts vs {} probabilities",
                counts.len(),
                expected_probs.len()
            ),
        );
    }
    let n: u64 = counts.iter().sum();
    if n < 1000 {
        return insufficient(name, format!("need >= 1000 samples, got {n}"));
    }

    // Pool bins whose expected count is below 5.
    let mut pooled: Vec<(f64, f64)> = Vec::new();
    let mut carry_obs = 0.0;
    let mut carry_exp = 0.0;
    for (&c, &p) in counts.iter().zip(expected_probs) {
        carry_obs += c as f64;
        carry_exp += p * n as f64;
        if carry_exp >= 5.0 {
            pooled.push((carry_obs, carry_exp));
            carry_obs = 0.0;
            carry_exp = 0.0;
        }
    }
    if carry_exp > 0.0 {
        match pooled.last_mut() {
            Some(last) => {
                last.0 += carry_obs;
                last.1 += carry_exp;
            }
            None => pooled.push((carry_obs, carry_exp)),
        }
    }
    if pooled.len() < 2 {
        return insufficient(name, "fewer than 2 usable bins after pooling".into());
    }

    let chi2: f64 = pooled
        .iter()
        .map(|(obs, exp)| (obs - exp) * (obs - exp) / exp)
        .sum();
    let dof = (pooled.len() - 1) as f64;
    let dist = ChiSquared::new(dof).unwrap();
    let p = dist.sf(chi2);
    CheckResult::graded(
        name,
        chi2,
        p,
        0.001,
        format!("n={n}, bins={}, dof={dof}", pooled.len()),
    )
}

/// Check that a sequence of norms stays within tolerance of 1.
pub fn normalization_invariant(norms: &[f64], tolerance: f64) -> CheckResult {
    let name = "Normalization Invariant";
    if norms.is_empty() {
        return insufficient(name, "no norms recorded".into());
    }
    let worst = norms
        .iter()
        .map(|n| (n - 1.0).abs())
        .fold(0.0f64, f64::max);
    CheckResult {
        name: name.to_string(),
        passed: worst <= tolerance,
        p_value: None,
        statistic: worst,
        details: format!("checked {} norms, worst deviation {worst:.3e}", norms.len()),
        grade: if worst <= tolerance { 'A' } else { 'F' },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_counts_fit_uniform_distribution() {
        let counts = vec![2500u64, 2480, 2520, 2500];
        let probs = vec![0.25; 4];
        let r = frequency_goodness_of_fit(&counts, &probs);
        assert!(r.passed, "{}", r.details);
        assert_eq!(r.grade, 'A');
    }

    #[test]
    fn skewed_counts_fail_uniform_distribution() {
        let counts = vec![9000u64, 400, 300, 300];
        let probs = vec![0.25; 4];
        let r = frequency_goodness_of_fit(&counts, &probs);
        assert!(!r.passed);
    }

    #[test]
    fn small_samples_rejected() {
        let r = frequency_goodness_of_fit(&[10, 10], &[0.5, 0.5]);
        assert!(!r.passed);
        assert!(r.p_value.is_none());
    }

    #[test]
    fn tiny_expected_bins_are_pooled() {
        let counts = vec![5000u64, 4990, 7, 3];
        let probs = vec![0.4995, 0.4995, 0.0005, 0.0005];
        let r = frequency_goodness_of_fit(&counts, &probs);
        assert!(r.passed, "{}", r.details);
    }

    #[test]
    fn normalization_check_flags_drift() {
        let good = normalization_invariant(&[1.0, 1.0 + 1e-10], 1e-9);
        assert!(good.passed);
        let bad = normalization_invariant(&[1.0, 1.01], 1e-9);
        assert!(!bad.passed);
    }
}
