//! Complex state vector, entanglement matrix, and region bookkeeping.
//!
//! The "quantum" terminology is a mathematical analogy: a normalized
//! complex vector plus deterministic linear operators, not a model of
//! physical hardware. The unit-norm invariant is the load-bearing part —
//! squared magnitudes are read as probabilities everywhere downstream.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Norm below this is treated as total amplitude loss.
pub const NORM_EPS: f64 = 1e-12;

/// Normalized complex-valued state over clinical sub-hypotheses.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    amps: Vec<Complex64>,
}

impl StateVector {
    /// All-zero state of the given dimension. Not normalized; the encoder
    /// assigns amplitude and renormalizes before the state escapes.
    pub fn zeros(dim: usize) -> Self {
        Self {
            amps: vec![Complex64::new(0.0, 0.0); dim],
        }
    }

    /// Build from raw amplitudes without normalizing.
    pub fn from_amplitudes(amps: Vec<Complex64>) -> Self {
        Self { amps }
    }

    pub fn dim(&self) -> usize {
        self.amps.len()
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    pub fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        &mut self.amps
    }

    pub fn amp(&self, i: usize) -> Complex64 {
        self.amps[i]
    }

    pub fn set_amp(&mut self, i: usize, a: Complex64) {
        self.amps[i] = a;
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.amps.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Squared magnitude of one component.
    pub fn probability(&self, i: usize) -> f64 {
        self.amps[i].norm_sqr()
    }

    /// Squared magnitudes of every component.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amps.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Index and probability of the highest-probability component.
    pub fn dominant(&self) -> (usize, f64) {
        let mut best = (0, 0.0);
        for (i, a) in self.amps.iter().enumerate() {
            let p = a.norm_sqr();
            if p > best.1 {
                best = (i, p);
            }
        }
        best
    }

    /// Rescale to unit norm. Returns `false` on underflow (no surviving
    /// amplitude); the state is left untouched in that case so the caller
    /// can report it.
    #[must_use]
    pub fn renormalize(&mut self) -> bool {
        let n = self.norm();
        if n < NORM_EPS {
            return false;
        }
        for a in &mut self.amps {
            *a /= n;
        }
        true
    }

    /// L1 coherence: mean absolute amplitude. 0 for a fully concentrated
    /// state approached from a large dimension, higher for spread states.
    pub fn coherence(&self) -> f64 {
        if self.amps.is_empty() {
            return 0.0;
        }
        self.amps.iter().map(|a| a.norm()).sum::<f64>() / self.amps.len() as f64
    }

    /// Von Neumann entropy of the squared-magnitude distribution.
    pub fn entanglement_entropy(&self) -> f64 {
        -self
            .amps
            .iter()
            .map(|a| a.norm_sqr())
            .filter(|&p| p > 0.0)
            .map(|p| p * p.ln())
            .sum::<f64>()
    }
}

/// Symmetric matrix of real correlation strengths between clinical
/// variables. Zero diagonal. Written once at encode time, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntanglementMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl EntanglementMatrix {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Set a pairwise correlation, maintaining symmetry. Diagonal writes
    /// are ignored (self-correlation is not a thing here).
    pub fn set_pair(&mut self, i: usize, j: usize, strength: f64) {
        if i == j {
            return;
        }
        self.data[i * self.dim + j] = strength;
        self.data[j * self.dim + i] = strength;
    }

    /// Total absolute correlation between one index and a set of indices.
    pub fn correlation_mass(&self, index: usize, against: impl Iterator<Item = usize>) -> f64 {
        against.map(|j| self.get(index, j).abs()).sum()
    }
}

/// Contiguous index sub-range of the state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: usize,
    pub len: usize,
}

impl Region {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.len
    }
}

/// Disjoint regions assigned by the encoder, with the descriptor label
/// backing each occupied index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionMap {
    pub symptoms: Region,
    pub vitals: Region,
    pub differentials: Region,
    pub symptom_labels: Vec<String>,
    pub vital_labels: Vec<String>,
    pub differential_labels: Vec<String>,
}

impl RegionMap {
    /// Absolute index of a named differential, if encoded.
    pub fn differential_index(&self, label: &str) -> Option<usize> {
        self.differential_labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.differentials.start + i)
    }

    /// Occupied symptom indices (those with a backing descriptor).
    pub fn symptom_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.symptom_labels.len()).map(|i| self.symptoms.start + i)
    }

    pub fn vital_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.vital_labels.len()).map(|i| self.vitals.start + i)
    }

    pub fn differential_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.differential_labels.len()).map(|i| self.differentials.start + i)
    }

    /// Label backing an absolute index, if any region covers it.
    pub fn label_at(&self, index: usize) -> Option<&str> {
        if self.symptoms.contains(index) {
            self.symptom_labels.get(index - self.symptoms.start)
        } else if self.vitals.contains(index) {
            self.vital_labels.get(index - self.vitals.start)
        } else if self.differentials.contains(index) {
            self.differential_labels.get(index - self.differentials.start)
        } else {
            None
        }
        .map(String::as_str)
    }

    /// The region covering an index, if any.
    pub fn region_of(&self, index: usize) -> Option<Region> {
        [self.symptoms, self.vitals, self.differentials]
            .into_iter()
            .find(|r| r.contains(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(mags: &[f64]) -> StateVector {
        StateVector::from_amplitudes(mags.iter().map(|&m| Complex64::new(m, 0.0)).collect())
    }

    #[test]
    fn renormalize_produces_unit_norm() {
        let mut s = state(&[3.0, 4.0]);
        assert!(s.renormalize());
        assert!((s.norm() - 1.0).abs() < 1e-12);
        assert!((s.probability(0) - 0.36).abs() < 1e-12);
        assert!((s.probability(1) - 0.64).abs() < 1e-12);
    }

    #[test]
    fn renormalize_reports_underflow() {
        let mut s = state(&[0.0, 0.0, 0.0]);
        assert!(!s.renormalize());
    }

    #[test]
    fn dominant_finds_largest_component() {
        let s = state(&[0.1, 0.9, 0.3]);
        assert_eq!(s.dominant().0, 1);
    }

    #[test]
    fn entanglement_matrix_is_symmetric_with_zero_diagonal() {
        let mut m = EntanglementMatrix::zeros(4);
        m.set_pair(0, 3, 0.3);
        m.set_pair(1, 1, 0.9);
        assert_eq!(m.get(0, 3), 0.3);
        assert_eq!(m.get(3, 0), 0.3);
        assert_eq!(m.get(1, 1), 0.0);
    }

    #[test]
    fn entropy_of_pure_state_is_zero() {
        let s = state(&[1.0, 0.0, 0.0]);
        assert!(s.entanglement_entropy().abs() < 1e-12);
    }

    #[test]
    fn region_map_lookups() {
        let map = RegionMap {
            symptoms: Region { start: 0, len: 4 },
            vitals: Region { start: 4, len: 4 },
            differentials: Region { start: 8, len: 8 },
            symptom_labels: vec!["chest_pain".into()],
            vital_labels: vec!["heart_rate".into()],
            differential_labels: vec!["angina".into(), "anxiety".into()],
        };
        assert_eq!(map.differential_index("anxiety"), Some(9));
        assert_eq!(map.label_at(4), Some("heart_rate"));
        assert_eq!(map.label_at(3), None);
        assert_eq!(map.region_of(9), Some(map.differentials));
    }
}
