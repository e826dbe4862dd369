//! Measurement probability law: sampled outcome frequencies over many
//! seeded runs must converge to the squared-amplitude distribution of the
//! evolved state.

use fotclaims_core::{
    ClinicalCase, DifferentialInput, EngineConfig, Observable, QuantumClinicalEngine, SymptomInput,
    VitalInput,
};
use fotclaims_tests::{frequency_goodness_of_fit, normalization_invariant};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn broad_case() -> ClinicalCase {
    ClinicalCase {
        case_id: Some("case:lawcheck".into()),
        symptoms: vec![
            SymptomInput {
                name: "fatigue".into(),
                weight: 0.6,
            },
            SymptomInput {
                name: "polyuria".into(),
                weight: 0.7,
            },
        ],
        vitals: vec![VitalInput {
            name: "heart_rate".into(),
            value: 88.0,
        }],
        differentials: vec![
            DifferentialInput {
                name: "diabetes_type2".into(),
                weight: 0.5,
            },
            DifferentialInput {
                name: "diabetes_type1".into(),
                weight: 0.3,
            },
            DifferentialInput {
                name: "hyperthyroidism".into(),
                weight: 0.25,
            },
            DifferentialInput {
                name: "anxiety".into(),
                weight: 0.2,
            },
        ],
    }
}

#[test]
fn frequencies_converge_to_squared_amplitudes() {
    init_logging();
    let engine = QuantumClinicalEngine::new(EngineConfig::default()).unwrap();
    let mut encoded = engine.encode_case(&broad_case()).unwrap();
    engine.evolve(&mut encoded).unwrap();

    let observable = Observable::diagnostic_confidence(&encoded.regions, &encoded.state);
    let mass: f64 = observable
        .candidates
        .iter()
        .map(|c| encoded.state.probability(c.index))
        .sum();
    assert!(mass > 0.0);
    let expected: Vec<f64> = observable
        .candidates
        .iter()
        .map(|c| encoded.state.probability(c.index) / mass)
        .collect();

    let n = 10_000u64;
    let mut counts = vec![0u64; observable.candidates.len()];
    for seed in 0..n {
        let mut rng = StdRng::seed_from_u64(seed);
        let outcome = engine.measure(&encoded, &observable, &mut rng).unwrap();
        let bin = observable
            .candidates
            .iter()
            .position(|c| c.label == outcome.outcome)
            .unwrap();
        counts[bin] += 1;
    }

    let result = frequency_goodness_of_fit(&counts, &expected);
    assert!(
        result.passed,
        "{}: chi2={:.3}, p={:?} ({})",
        result.name, result.statistic, result.p_value, result.details
    );
}

#[test]
fn norm_is_preserved_through_the_pipeline() {
    init_logging();
    let engine = QuantumClinicalEngine::new(EngineConfig::default()).unwrap();
    let mut norms = Vec::new();

    let encoded = engine.encode_case(&broad_case()).unwrap();
    norms.push(encoded.state.norm());

    let mut evolved = engine.encode_case(&broad_case()).unwrap();
    engine.evolve(&mut evolved).unwrap();
    norms.push(evolved.state.norm());

    let result = normalization_invariant(&norms, 1e-9);
    assert!(result.passed, "{}", result.details);
}

#[test]
fn deterministic_evolution_gives_identical_distributions() {
    init_logging();
    let engine = QuantumClinicalEngine::new(EngineConfig::default()).unwrap();
    let mut a = engine.encode_case(&broad_case()).unwrap();
    let mut b = engine.encode_case(&broad_case()).unwrap();
    engine.evolve(&mut a).unwrap();
    engine.evolve(&mut b).unwrap();
    assert_eq!(a.state.probabilities(), b.state.probabilities());
}
