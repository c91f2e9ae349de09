//! Synthetic peer-feedback observations for a fixed roster of people.
//!
//! The crate is split along the three stages of a run:
//! - [`roster`] holds the static attribute catalog and the people who give and
//!   receive feedback.
//! - [`generator`] turns one `(author, subject, polarity, count)` request into
//!   raw [`Observation`] records.
//! - [`scenario`] concatenates the observations of many requests and decorates
//!   them with display names.
//!
//! All randomness flows through an explicitly passed [`RandomSource`].

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod generator;
pub mod random;
pub mod roster;
pub mod scenario;

pub use generator::{generate, BatchRequest};
pub use random::{RandomSource, SeededRandom};
pub use roster::{
    reference_requests, AttributeCatalog, AttributeEntry, AttributeId, Person, RequestSpec,
    Roster, RosterDocument,
};
pub use scenario::{
    assemble, assemble_specs, PairSummary, Scenario, ScenarioRow, ScenarioSummary, COLUMNS,
};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum SynthError {
    #[error("roster configuration error: {0}")]
    RosterConfiguration(String),
    #[error("roster configuration error: person {person_id} has no {pool} to draw from")]
    EmptyAttributeSet {
        person_id: String,
        pool: AttributePool,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("request error: {0}")]
    Request(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }

    /// Pool an accurate author draws from for this polarity.
    #[must_use]
    pub fn expected_pool(self) -> AttributePool {
        match self {
            Self::Positive => AttributePool::Strengths,
            Self::Negative => AttributePool::Weaknesses,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ObservationType {
    Dot,
    Ranking,
}

impl ObservationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dot => "Dot",
            Self::Ranking => "Ranking",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttributePool {
    Strengths,
    Weaknesses,
}

impl AttributePool {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strengths => "strengths",
            Self::Weaknesses => "weaknesses",
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Strengths => Self::Weaknesses,
            Self::Weaknesses => Self::Strengths,
        }
    }
}

impl Display for AttributePool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The atomic output record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub random_value: f64,
    pub author: String,
    pub subject: String,
    pub observation_type: ObservationType,
    pub attribute: AttributeId,
    pub value: i64,
}

/// How the Dot/Ranking decision threshold is chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeDraw {
    /// Every author uses `ranking_ratio`.
    #[default]
    Global,
    /// The author's `ranking_factor / (dot_factor + ranking_factor)` replaces
    /// `ranking_ratio` when the factors are not both zero.
    AuthorWeighted,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct ValueRange {
    pub low: i64,
    pub high: i64,
}

impl ValueRange {
    #[must_use]
    pub fn contains(self, value: i64) -> bool {
        (self.low..=self.high).contains(&value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub config_version: u32,
    pub seed: u64,
    pub ranking_ratio: f64,
    pub likelihood_of_being_wrong: f64,
    pub negative_value_range: ValueRange,
    pub positive_value_range: ValueRange,
    pub default_count: usize,
    pub type_draw: TypeDraw,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::v1()
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn v1() -> Self {
        Self {
            config_version: 1,
            seed: 42,
            ranking_ratio: 0.1,
            likelihood_of_being_wrong: 0.15,
            negative_value_range: ValueRange { low: 2, high: 4 },
            positive_value_range: ValueRange { low: 7, high: 9 },
            default_count: 10,
            type_draw: TypeDraw::Global,
        }
    }

    #[must_use]
    pub fn value_range(&self, polarity: Polarity) -> ValueRange {
        match polarity {
            Polarity::Positive => self.positive_value_range,
            Polarity::Negative => self.negative_value_range,
        }
    }

    /// Validates probability bounds and the value bands.
    ///
    /// # Errors
    /// Returns [`SynthError::Configuration`] when a field is outside its
    /// allowed bounds or the negative and positive bands overlap.
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.config_version == 0 {
            return Err(SynthError::Configuration(
                "config_version MUST be >= 1".to_string(),
            ));
        }

        for (name, value) in [
            ("ranking_ratio", self.ranking_ratio),
            ("likelihood_of_being_wrong", self.likelihood_of_being_wrong),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SynthError::Configuration(format!(
                    "{name} MUST be in [0.0, 1.0]"
                )));
            }
        }

        for (name, range) in [
            ("negative_value_range", self.negative_value_range),
            ("positive_value_range", self.positive_value_range),
        ] {
            if range.low > range.high {
                return Err(SynthError::Configuration(format!(
                    "{name} low cannot exceed high"
                )));
            }
        }

        if self.negative_value_range.high >= self.positive_value_range.low {
            return Err(SynthError::Configuration(
                "negative_value_range MUST lie strictly below positive_value_range".to_string(),
            ));
        }

        if self.default_count == 0 {
            return Err(SynthError::Configuration(
                "default_count MUST be >= 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Decodes and validates a config from JSON. Missing fields keep their
    /// [`GeneratorConfig::v1`] values.
    ///
    /// # Errors
    /// Returns [`SynthError::Configuration`] when JSON decoding fails
    /// or decoded values violate config constraints.
    pub fn from_json(value: &Value) -> Result<Self, SynthError> {
        let config: Self = serde_json::from_value(value.clone()).map_err(|err| {
            SynthError::Configuration(format!("invalid generator config JSON payload: {err}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("expected Ok(..), got error: {err}"),
        }
    }

    #[test]
    fn v1_defaults_match_reference_constants() {
        let config = GeneratorConfig::v1();
        assert!((config.ranking_ratio - 0.1).abs() < f64::EPSILON);
        assert!((config.likelihood_of_being_wrong - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.negative_value_range, ValueRange { low: 2, high: 4 });
        assert_eq!(config.positive_value_range, ValueRange { low: 7, high: 9 });
        assert_eq!(config.default_count, 10);
        assert_eq!(config.seed, 42);
        assert_eq!(config.type_draw, TypeDraw::Global);
        must_ok(config.validate());
    }

    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let config = must_ok(GeneratorConfig::from_json(&json!({
            "ranking_ratio": 0.5,
            "type_draw": "author_weighted"
        })));
        assert!((config.ranking_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.type_draw, TypeDraw::AuthorWeighted);
        assert_eq!(config.default_count, 10);
    }

    #[test]
    fn rejects_out_of_bounds_probabilities() {
        let mut config = GeneratorConfig::v1();
        config.likelihood_of_being_wrong = 1.5;
        assert_eq!(
            config.validate(),
            Err(SynthError::Configuration(
                "likelihood_of_being_wrong MUST be in [0.0, 1.0]".to_string()
            ))
        );
    }

    #[test]
    fn rejects_overlapping_value_bands() {
        let mut config = GeneratorConfig::v1();
        config.negative_value_range = ValueRange { low: 2, high: 7 };
        assert!(matches!(
            config.validate(),
            Err(SynthError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_inverted_range_and_zero_count() {
        let mut config = GeneratorConfig::v1();
        config.positive_value_range = ValueRange { low: 9, high: 7 };
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::v1();
        config.default_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_json_rejects_unknown_type_draw() {
        let result = GeneratorConfig::from_json(&json!({ "type_draw": "sometimes" }));
        assert!(matches!(result, Err(SynthError::Configuration(_))));
    }

    #[test]
    fn polarity_round_trips_through_str() {
        for polarity in [Polarity::Positive, Polarity::Negative] {
            assert_eq!(Polarity::parse(polarity.as_str()), Some(polarity));
        }
        assert_eq!(Polarity::parse("neutral"), None);
        assert_eq!(Polarity::Negative.expected_pool(), AttributePool::Weaknesses);
        assert_eq!(
            Polarity::Positive.expected_pool().opposite(),
            AttributePool::Weaknesses
        );
    }
}
