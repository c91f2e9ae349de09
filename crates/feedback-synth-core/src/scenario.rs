//! Concatenation of batch output and name resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::generator::BatchRequest;
use crate::random::RandomSource;
use crate::roster::{AttributeId, RequestSpec, Roster};
use crate::{GeneratorConfig, Observation, ObservationType, SynthError};

/// Output column order.
pub const COLUMNS: [&str; 9] = [
    "random_value",
    "author",
    "subject",
    "observation_type",
    "attribute",
    "value",
    "attribute_name",
    "subject_name",
    "author_name",
];

/// An observation plus its resolved display names. A name is `None` when its
/// id is missing from the roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioRow {
    pub random_value: f64,
    pub author: String,
    pub subject: String,
    pub observation_type: ObservationType,
    pub attribute: AttributeId,
    pub value: i64,
    pub attribute_name: Option<String>,
    pub subject_name: Option<String>,
    pub author_name: Option<String>,
}

impl ScenarioRow {
    #[must_use]
    pub fn observation(&self) -> Observation {
        Observation {
            random_value: self.random_value,
            author: self.author.clone(),
            subject: self.subject.clone(),
            observation_type: self.observation_type,
            attribute: self.attribute,
            value: self.value,
        }
    }
}

/// Ordered rows of one run. Holds no state beyond its rows; rebuild it with
/// [`Scenario::from_observations`] whenever the roster changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Scenario {
    rows: Vec<ScenarioRow>,
}

impl Scenario {
    #[must_use]
    pub fn from_observations(observations: Vec<Observation>, roster: &Roster) -> Self {
        let rows = observations
            .into_iter()
            .enumerate()
            .map(|(index, observation)| decorate(index, observation, roster))
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[ScenarioRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn observations(&self) -> Vec<Observation> {
        self.rows.iter().map(ScenarioRow::observation).collect()
    }

    /// Per (author, subject) pair counts, in first-appearance order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> ScenarioSummary {
        let mut pairs: Vec<PairSummary> = Vec::new();
        let mut positions: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        let mut totals: Vec<i64> = Vec::new();

        for row in &self.rows {
            let key = (row.author.as_str(), row.subject.as_str());
            let position = *positions.entry(key).or_insert_with(|| {
                pairs.push(PairSummary {
                    author: row.author.clone(),
                    subject: row.subject.clone(),
                    author_name: row.author_name.clone(),
                    subject_name: row.subject_name.clone(),
                    rows: 0,
                    dots: 0,
                    rankings: 0,
                    min_value: row.value,
                    max_value: row.value,
                    mean_value: 0.0,
                });
                totals.push(0);
                pairs.len() - 1
            });

            let pair = &mut pairs[position];
            pair.rows += 1;
            match row.observation_type {
                ObservationType::Dot => pair.dots += 1,
                ObservationType::Ranking => pair.rankings += 1,
            }
            pair.min_value = pair.min_value.min(row.value);
            pair.max_value = pair.max_value.max(row.value);
            totals[position] += row.value;
        }

        for (pair, total) in pairs.iter_mut().zip(&totals) {
            pair.mean_value = *total as f64 / pair.rows as f64;
        }

        ScenarioSummary {
            total_rows: self.rows.len(),
            pairs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairSummary {
    pub author: String,
    pub subject: String,
    pub author_name: Option<String>,
    pub subject_name: Option<String>,
    pub rows: usize,
    pub dots: usize,
    pub rankings: usize,
    pub min_value: i64,
    pub max_value: i64,
    pub mean_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSummary {
    pub total_rows: usize,
    pub pairs: Vec<PairSummary>,
}

/// Runs every request in order against one draw sequence and decorates the
/// concatenated output.
///
/// # Errors
/// Returns [`SynthError::Request`] when the summed request counts cannot be
/// held in memory, otherwise the first generation error. No partial scenario
/// is produced.
pub fn assemble(
    requests: &[BatchRequest<'_>],
    roster: &Roster,
    config: &GeneratorConfig,
    rng: &mut dyn RandomSource,
) -> Result<Scenario, SynthError> {
    let total = requests
        .iter()
        .try_fold(0_usize, |total, request| total.checked_add(request.count))
        .ok_or_else(|| SynthError::Request("total observation count overflows".to_string()))?;
    let mut observations: Vec<Observation> = Vec::new();
    observations.try_reserve_exact(total).map_err(|err| {
        SynthError::Request(format!("cannot hold {total} observations: {err}"))
    })?;

    for request in requests {
        tracing::debug!(
            author = %request.author.id,
            subject = %request.subject.id,
            polarity = request.polarity.as_str(),
            count = request.count,
            "generating batch"
        );
        observations.extend(request.generate(config, rng)?);
    }

    let scenario = Scenario::from_observations(observations, roster);
    tracing::info!(
        requests = requests.len(),
        rows = scenario.len(),
        "scenario assembled"
    );
    Ok(scenario)
}

/// Resolves `specs` against `roster`, then [`assemble`]s them.
///
/// # Errors
/// Returns [`SynthError::Request`] for unknown person ids and any error
/// [`assemble`] returns.
pub fn assemble_specs(
    specs: &[RequestSpec],
    roster: &Roster,
    config: &GeneratorConfig,
    rng: &mut dyn RandomSource,
) -> Result<Scenario, SynthError> {
    let requests = roster.resolve_requests(specs, config)?;
    assemble(&requests, roster, config, rng)
}

fn decorate(index: usize, observation: Observation, roster: &Roster) -> ScenarioRow {
    let attribute_name = roster
        .attribute_name(observation.attribute)
        .map(str::to_string);
    if attribute_name.is_none() {
        tracing::warn!(
            row = index,
            attribute = observation.attribute,
            "attribute lookup miss"
        );
    }
    let subject_name = resolve_person(index, "subject", &observation.subject, roster);
    let author_name = resolve_person(index, "author", &observation.author, roster);

    ScenarioRow {
        random_value: observation.random_value,
        author: observation.author,
        subject: observation.subject,
        observation_type: observation.observation_type,
        attribute: observation.attribute,
        value: observation.value,
        attribute_name,
        subject_name,
        author_name,
    }
}

fn resolve_person(index: usize, column: &str, id: &str, roster: &Roster) -> Option<String> {
    let name = roster.person_name(id).map(str::to_string);
    if name.is_none() {
        tracing::warn!(row = index, column, person_id = id, "person lookup miss");
    }
    name
}
