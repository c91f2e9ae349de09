//! Static attribute catalog, people, and request descriptions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generator::BatchRequest;
use crate::{AttributePool, GeneratorConfig, Polarity, SynthError};

pub type AttributeId = u32;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct AttributeEntry {
    pub id: AttributeId,
    pub name: String,
}

/// Bidirectional attribute id <-> name mapping, unique in both directions.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AttributeCatalog {
    by_id: BTreeMap<AttributeId, String>,
    by_name: BTreeMap<String, AttributeId>,
}

impl AttributeCatalog {
    /// Builds a catalog from `(id, name)` entries.
    ///
    /// # Errors
    /// Returns [`SynthError::RosterConfiguration`] on an empty name or when an
    /// id or a name appears twice.
    pub fn from_entries(entries: &[AttributeEntry]) -> Result<Self, SynthError> {
        let mut by_id = BTreeMap::new();
        let mut by_name = BTreeMap::new();

        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(SynthError::RosterConfiguration(format!(
                    "attribute {} has an empty name",
                    entry.id
                )));
            }
            if by_id.insert(entry.id, entry.name.clone()).is_some() {
                return Err(SynthError::RosterConfiguration(format!(
                    "duplicate attribute id {}",
                    entry.id
                )));
            }
            if by_name.insert(entry.name.clone(), entry.id).is_some() {
                return Err(SynthError::RosterConfiguration(format!(
                    "duplicate attribute name {:?}",
                    entry.name
                )));
            }
        }

        Ok(Self { by_id, by_name })
    }

    /// The 20-attribute reference catalog.
    #[must_use]
    pub fn reference() -> Self {
        let mut by_id = BTreeMap::new();
        let mut by_name = BTreeMap::new();
        for (id, name) in REFERENCE_ATTRIBUTES {
            by_id.insert(*id, (*name).to_string());
            by_name.insert((*name).to_string(), *id);
        }
        Self { by_id, by_name }
    }

    #[must_use]
    pub fn name(&self, id: AttributeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn id(&self, name: &str) -> Option<AttributeId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, id: AttributeId) -> bool {
        self.by_id.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Entries in ascending id order.
    #[must_use]
    pub fn entries(&self) -> Vec<AttributeEntry> {
        self.by_id
            .iter()
            .map(|(id, name)| AttributeEntry {
                id: *id,
                name: name.clone(),
            })
            .collect()
    }
}

const REFERENCE_ATTRIBUTES: &[(AttributeId, &str)] = &[
    (1, "Analytical Thinking"),
    (2, "Assertive and Open-Minded"),
    (3, "Cuts Through It"),
    (4, "Designing the Movie Script"),
    (5, "Determination"),
    (6, "Empathy"),
    (7, "Fighting to get in Synch"),
    (8, "Linear Thinking"),
    (9, "Listens Well"),
    (10, "Maintaining High Standards"),
    (11, "Manages Conflict to get at Truth"),
    (12, "Motivating Others"),
    (13, "Perceiving Problems"),
    (14, "Precise and Meticulous Problem Solving"),
    (15, "Principled and Higher Level Thinking"),
    (16, "Pushing through to Results"),
    (17, "Sizing People up"),
    (18, "Synthesizing the Situation"),
    (19, "Thinking Strategically"),
    (20, "Willing to Touch the Nerve"),
];

/// Someone who gives and receives feedback.
///
/// `dot_factor` and `ranking_factor` only influence generation under
/// [`crate::TypeDraw::AuthorWeighted`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub description: String,
    pub dot_factor: f64,
    pub ranking_factor: f64,
    pub weaknesses: Vec<AttributeId>,
    pub strengths: Vec<AttributeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood_of_being_wrong: Option<f64>,
}

impl Person {
    #[must_use]
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        dot_factor: f64,
        ranking_factor: f64,
        weaknesses: Vec<AttributeId>,
        strengths: Vec<AttributeId>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            dot_factor,
            ranking_factor,
            weaknesses,
            strengths,
            likelihood_of_being_wrong: None,
        }
    }

    #[must_use]
    pub fn with_likelihood_of_being_wrong(mut self, likelihood: f64) -> Self {
        self.likelihood_of_being_wrong = Some(likelihood);
        self
    }

    /// The person's own likelihood, or the configured default.
    #[must_use]
    pub fn likelihood_of_being_wrong(&self, config: &GeneratorConfig) -> f64 {
        self.likelihood_of_being_wrong
            .unwrap_or(config.likelihood_of_being_wrong)
    }

    #[must_use]
    pub fn pool(&self, pool: AttributePool) -> &[AttributeId] {
        match pool {
            AttributePool::Strengths => &self.strengths,
            AttributePool::Weaknesses => &self.weaknesses,
        }
    }

    fn validate(&self, catalog: &AttributeCatalog) -> Result<(), SynthError> {
        if self.id.trim().is_empty() {
            return Err(SynthError::RosterConfiguration(format!(
                "person {:?} has an empty id",
                self.name
            )));
        }
        if self.name.trim().is_empty() {
            return Err(SynthError::RosterConfiguration(format!(
                "person {} has an empty name",
                self.id
            )));
        }

        for (field, value) in [
            ("dot_factor", Some(self.dot_factor)),
            ("ranking_factor", Some(self.ranking_factor)),
            ("likelihood_of_being_wrong", self.likelihood_of_being_wrong),
        ] {
            if let Some(value) = value {
                if !(0.0..=1.0).contains(&value) {
                    return Err(SynthError::RosterConfiguration(format!(
                        "person {}: {field} MUST be in [0.0, 1.0]",
                        self.id
                    )));
                }
            }
        }

        let mut seen = BTreeSet::new();
        for pool in [AttributePool::Weaknesses, AttributePool::Strengths] {
            let mut in_pool = BTreeSet::new();
            for attribute in self.pool(pool) {
                if !catalog.contains(*attribute) {
                    return Err(SynthError::RosterConfiguration(format!(
                        "person {}: {pool} references unknown attribute {attribute}",
                        self.id
                    )));
                }
                if !in_pool.insert(*attribute) {
                    return Err(SynthError::RosterConfiguration(format!(
                        "person {}: attribute {attribute} listed twice in {pool}",
                        self.id
                    )));
                }
                if !seen.insert(*attribute) {
                    return Err(SynthError::RosterConfiguration(format!(
                        "person {}: attribute {attribute} is both a strength and a weakness",
                        self.id
                    )));
                }
            }
            if in_pool.is_empty() {
                tracing::warn!(
                    person_id = %self.id,
                    pool = %pool,
                    "person has an empty attribute pool"
                );
            }
        }

        Ok(())
    }
}

/// Serialized form of a [`Roster`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterDocument {
    pub attributes: Vec<AttributeEntry>,
    pub people: Vec<Person>,
}

/// Attribute catalog plus the people drawing from it. Immutable once built.
#[derive(Debug, Clone)]
pub struct Roster {
    attributes: AttributeCatalog,
    people: Vec<Person>,
    names_by_id: BTreeMap<String, String>,
    ids_by_name: BTreeMap<String, String>,
}

impl Roster {
    /// Validates and indexes a roster.
    ///
    /// # Errors
    /// Returns [`SynthError::RosterConfiguration`] for duplicate person ids or
    /// names and for any person whose traits fail validation.
    pub fn new(attributes: AttributeCatalog, people: Vec<Person>) -> Result<Self, SynthError> {
        let mut names_by_id = BTreeMap::new();
        let mut ids_by_name = BTreeMap::new();

        for person in &people {
            person.validate(&attributes)?;
            if names_by_id
                .insert(person.id.clone(), person.name.clone())
                .is_some()
            {
                return Err(SynthError::RosterConfiguration(format!(
                    "duplicate person id {}",
                    person.id
                )));
            }
            if ids_by_name
                .insert(person.name.clone(), person.id.clone())
                .is_some()
            {
                return Err(SynthError::RosterConfiguration(format!(
                    "duplicate person name {:?}",
                    person.name
                )));
            }
        }

        Ok(Self {
            attributes,
            people,
            names_by_id,
            ids_by_name,
        })
    }

    /// The five-person reference roster over [`AttributeCatalog::reference`].
    ///
    /// # Errors
    /// Never fails for the built-in data; the signature matches [`Roster::new`].
    pub fn reference() -> Result<Self, SynthError> {
        Self::new(AttributeCatalog::reference(), reference_people())
    }

    /// Builds a roster from its document form.
    ///
    /// # Errors
    /// Returns [`SynthError::RosterConfiguration`] when the catalog or any
    /// person fails validation.
    pub fn from_document(document: &RosterDocument) -> Result<Self, SynthError> {
        let attributes = AttributeCatalog::from_entries(&document.attributes)?;
        Self::new(attributes, document.people.clone())
    }

    /// Decodes and validates a roster document from JSON.
    ///
    /// # Errors
    /// Returns [`SynthError::RosterConfiguration`] when decoding fails or the
    /// decoded roster is misconfigured.
    pub fn from_json(value: &Value) -> Result<Self, SynthError> {
        let document: RosterDocument = serde_json::from_value(value.clone()).map_err(|err| {
            SynthError::RosterConfiguration(format!("invalid roster JSON payload: {err}"))
        })?;
        Self::from_document(&document)
    }

    #[must_use]
    pub fn to_document(&self) -> RosterDocument {
        RosterDocument {
            attributes: self.attributes.entries(),
            people: self.people.clone(),
        }
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeCatalog {
        &self.attributes
    }

    #[must_use]
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    #[must_use]
    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    #[must_use]
    pub fn person_by_name(&self, name: &str) -> Option<&Person> {
        let id = self.ids_by_name.get(name)?;
        self.person(id)
    }

    #[must_use]
    pub fn person_name(&self, id: &str) -> Option<&str> {
        self.names_by_id.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn attribute_name(&self, id: AttributeId) -> Option<&str> {
        self.attributes.name(id)
    }

    #[must_use]
    pub fn attribute_id(&self, name: &str) -> Option<AttributeId> {
        self.attributes.id(name)
    }

    /// Binds request specs to roster people, filling absent counts with
    /// `config.default_count`.
    ///
    /// # Errors
    /// Returns [`SynthError::Request`] when a request names an unknown person id.
    pub fn resolve_requests(
        &self,
        specs: &[RequestSpec],
        config: &GeneratorConfig,
    ) -> Result<Vec<BatchRequest<'_>>, SynthError> {
        specs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let lookup = |role: &str, id: &str| {
                    self.person(id).ok_or_else(|| {
                        SynthError::Request(format!("request {index}: unknown {role} id {id:?}"))
                    })
                };
                Ok(BatchRequest {
                    author: lookup("author", &spec.author)?,
                    subject: lookup("subject", &spec.subject)?,
                    polarity: spec.polarity,
                    count: spec.count.unwrap_or(config.default_count),
                })
            })
            .collect()
    }
}

/// A generation request addressed by person id.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct RequestSpec {
    pub author: String,
    pub subject: String,
    pub polarity: Polarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct RequestDocument {
    requests: Vec<RequestSpec>,
}

impl RequestSpec {
    #[must_use]
    pub fn new(author: &str, subject: &str, polarity: Polarity, count: Option<usize>) -> Self {
        Self {
            author: author.to_string(),
            subject: subject.to_string(),
            polarity,
            count,
        }
    }

    /// Decodes a `{ "requests": [...] }` document.
    ///
    /// # Errors
    /// Returns [`SynthError::Request`] when the document does not decode.
    pub fn list_from_json(value: &Value) -> Result<Vec<Self>, SynthError> {
        let document: RequestDocument = serde_json::from_value(value.clone())
            .map_err(|err| SynthError::Request(format!("invalid requests JSON payload: {err}")))?;
        Ok(document.requests)
    }

    #[must_use]
    pub fn list_to_json(specs: &[Self]) -> Value {
        serde_json::json!({ "requests": specs })
    }
}

/// Will and Alex trading views: 12 negative and 3 positive one way, 6
/// negative and 1 positive the other.
#[must_use]
pub fn reference_requests() -> Vec<RequestSpec> {
    vec![
        RequestSpec::new("1", "2", Polarity::Negative, Some(12)),
        RequestSpec::new("1", "2", Polarity::Positive, Some(3)),
        RequestSpec::new("2", "1", Polarity::Negative, Some(6)),
        RequestSpec::new("2", "1", Polarity::Positive, Some(1)),
    ]
}

fn reference_people() -> Vec<Person> {
    vec![
        Person::new(
            "1",
            "Will Haffner",
            "high threshold for conflict, low empathy, high standards.",
            1.0,
            0.25,
            vec![2, 6, 9],
            vec![1, 10, 13, 20],
        ),
        Person::new(
            "2",
            "Alex Chavez",
            "highly principled, calls out badness.",
            0.25,
            1.0,
            vec![6, 10, 12],
            vec![3, 13, 15],
        ),
        Person::new(
            "3",
            "Sophia Porrino",
            "highly principled, calls out badness.",
            0.5,
            0.5,
            vec![2, 7],
            vec![13, 15],
        ),
        Person::new(
            "4",
            "Chintan Mehta",
            "less likely to give negative feedback.",
            0.75,
            0.0,
            vec![3, 18, 20],
            vec![1, 8, 14, 16],
        ),
        Person::new(
            "5",
            "Vin Marshall",
            "less likely to give negative feedback.",
            0.25,
            0.5,
            vec![11, 17, 20],
            vec![4, 5, 19],
        ),
    ]
}
