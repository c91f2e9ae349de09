//! Property tests for generation and assembly over the reference roster.

use feedback_synth_core::{
    assemble, assemble_specs, generate, GeneratorConfig, ObservationType, Polarity, RequestSpec,
    Roster, SeededRandom,
};
use proptest::prelude::*;

fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("expected Ok(..), got error: {err}"),
    }
}

fn reference_roster() -> Roster {
    must_ok(Roster::reference())
}

fn polarity_strategy() -> impl Strategy<Value = Polarity> {
    prop_oneof![Just(Polarity::Positive), Just(Polarity::Negative)]
}

/// Person ids "1".."5" of the reference roster.
fn person_id_strategy() -> impl Strategy<Value = String> {
    (1..=5u8).prop_map(|id| id.to_string())
}

fn request_strategy() -> impl Strategy<Value = RequestSpec> {
    (
        person_id_strategy(),
        person_id_strategy(),
        polarity_strategy(),
        0..20usize,
    )
        .prop_map(|(author, subject, polarity, count)| {
            RequestSpec::new(&author, &subject, polarity, Some(count))
        })
}

proptest! {
    // Attribute always comes from the subject's strengths or weaknesses.
    #[test]
    fn attribute_belongs_to_subject(
        seed in any::<u64>(),
        author in person_id_strategy(),
        subject in person_id_strategy(),
        polarity in polarity_strategy(),
        count in 1..64usize,
    ) {
        let roster = reference_roster();
        let config = GeneratorConfig::v1();
        let (Some(author), Some(subject)) = (roster.person(&author), roster.person(&subject)) else {
            panic!("reference ids must resolve");
        };
        let mut rng = SeededRandom::new(seed);
        let observations = must_ok(generate(author, subject, polarity, count, &config, &mut rng));

        prop_assert_eq!(observations.len(), count);
        for obs in &observations {
            prop_assert!(
                subject.strengths.contains(&obs.attribute) || subject.weaknesses.contains(&obs.attribute),
                "attribute {} not in subject {}", obs.attribute, subject.id
            );
            prop_assert!(config.value_range(polarity).contains(obs.value));
            prop_assert_eq!(&obs.author, &author.id);
            prop_assert_eq!(&obs.subject, &subject.id);
        }
    }

    // Identical seed and requests give byte-identical JSON.
    #[test]
    fn assembly_is_deterministic(
        seed in any::<u64>(),
        specs in prop::collection::vec(request_strategy(), 0..6),
    ) {
        let roster = reference_roster();
        let config = GeneratorConfig::v1();

        let mut first_rng = SeededRandom::new(seed);
        let mut second_rng = SeededRandom::new(seed);
        let first = must_ok(assemble_specs(&specs, &roster, &config, &mut first_rng));
        let second = must_ok(assemble_specs(&specs, &roster, &config, &mut second_rng));

        prop_assert_eq!(
            must_ok(serde_json::to_string(&first)),
            must_ok(serde_json::to_string(&second))
        );
    }

    // assemble([a, b]) == assemble([a]) ++ assemble([b]) on a continuing stream.
    #[test]
    fn concatenation_preserves_request_order(
        seed in any::<u64>(),
        first in request_strategy(),
        second in request_strategy(),
    ) {
        let roster = reference_roster();
        let config = GeneratorConfig::v1();

        let mut joint_rng = SeededRandom::new(seed);
        let joint = must_ok(assemble_specs(
            &[first.clone(), second.clone()],
            &roster,
            &config,
            &mut joint_rng,
        ));

        let mut split_rng = SeededRandom::new(seed);
        let head = must_ok(assemble_specs(&[first], &roster, &config, &mut split_rng));
        let tail = must_ok(assemble_specs(&[second], &roster, &config, &mut split_rng));

        let mut expected = head.rows().to_vec();
        expected.extend_from_slice(tail.rows());
        prop_assert_eq!(joint.rows(), expected.as_slice());
    }
}

#[test]
fn ranking_fraction_tracks_ratio() {
    let roster = reference_roster();
    let Some(author) = roster.person("1") else {
        panic!("reference author missing");
    };
    let Some(subject) = roster.person("2") else {
        panic!("reference subject missing");
    };

    for ratio in [0.1, 0.35] {
        let mut config = GeneratorConfig::v1();
        config.ranking_ratio = ratio;
        let mut rng = SeededRandom::new(42);
        let observations = must_ok(generate(
            author,
            subject,
            Polarity::Positive,
            100_000,
            &config,
            &mut rng,
        ));

        let rankings = observations
            .iter()
            .filter(|obs| obs.observation_type == ObservationType::Ranking)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let fraction = rankings as f64 / observations.len() as f64;
        assert!(
            (fraction - ratio).abs() < 0.01,
            "ranking fraction {fraction} too far from {ratio}"
        );
    }
}

#[test]
fn reference_scenario_rows_follow_request_blocks() {
    let roster = reference_roster();
    let config = GeneratorConfig::v1();
    let requests = must_ok(
        roster.resolve_requests(&feedback_synth_core::reference_requests(), &config),
    );
    let mut rng = SeededRandom::new(config.seed);
    let scenario = must_ok(assemble(&requests, &roster, &config, &mut rng));

    assert_eq!(scenario.len(), 22);
    let negatives = scenario.rows()[..12]
        .iter()
        .all(|row| row.author == "1" && row.subject == "2" && (2..=4).contains(&row.value));
    assert!(negatives);
    let positives = scenario.rows()[12..15]
        .iter()
        .all(|row| row.author == "1" && row.subject == "2" && (7..=9).contains(&row.value));
    assert!(positives);
    let alex_negative = scenario.rows()[15..21]
        .iter()
        .all(|row| row.author_name.as_deref() == Some("Alex Chavez") && row.value <= 4);
    assert!(alex_negative);
    assert_eq!(scenario.rows()[21].subject_name.as_deref(), Some("Will Haffner"));
    assert!(scenario.rows()[21].value >= 7);
}

#[test]
fn empty_weaknesses_surface_on_negative_request() {
    use feedback_synth_core::{AttributeCatalog, Person, SynthError};

    // A critic who is never wrong always needs a weakness for a negative view.
    let critic = Person::new("1", "Critic", "", 0.5, 0.5, vec![1], vec![2])
        .with_likelihood_of_being_wrong(0.0);
    let flawless = Person::new("2", "Flawless", "", 0.5, 0.5, Vec::new(), vec![3]);
    let roster = must_ok(Roster::new(
        AttributeCatalog::reference(),
        vec![critic, flawless],
    ));

    let specs = vec![RequestSpec::new("1", "2", Polarity::Negative, Some(3))];
    let mut rng = SeededRandom::new(42);
    let result = assemble_specs(&specs, &roster, &GeneratorConfig::v1(), &mut rng);
    assert!(matches!(
        result,
        Err(SynthError::EmptyAttributeSet { ref person_id, .. }) if person_id == "2"
    ));
}
