//! Per-request observation generation.
//!
//! One draw of `random_value` decides both the observation type and whether
//! the author is mistaken about the subject. The two decisions are coupled on
//! purpose: a seeded run reproduces only if both read the same draw.

use crate::random::RandomSource;
use crate::roster::{AttributeId, Person};
use crate::{
    AttributePool, GeneratorConfig, Observation, ObservationType, Polarity, SynthError, TypeDraw,
};

/// One `(author, subject, polarity, count)` batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchRequest<'a> {
    pub author: &'a Person,
    pub subject: &'a Person,
    pub polarity: Polarity,
    pub count: usize,
}

/// Generates `count` independent observations of `subject` by `author`.
///
/// Draw order per observation is fixed: the unit draw, then the value, then
/// the attribute index.
///
/// # Errors
/// Returns [`SynthError::EmptyAttributeSet`] when the pool selected for an
/// observation is empty. Observations generated before the failure are
/// discarded.
pub fn generate(
    author: &Person,
    subject: &Person,
    polarity: Polarity,
    count: usize,
    config: &GeneratorConfig,
    rng: &mut dyn RandomSource,
) -> Result<Vec<Observation>, SynthError> {
    let ranking_ratio = ranking_threshold(author, config);
    let wrongness = author.likelihood_of_being_wrong(config);
    let range = config.value_range(polarity);

    (0..count)
        .map(|_| -> Result<Observation, SynthError> {
            let random_value = rng.next_unit();
            let observation_type = observation_type(random_value, ranking_ratio);
            let value = rng.next_in_range(range.low, range.high);
            let pool = target_pool(polarity, random_value, wrongness);
            let attribute = choose_attribute(subject, pool, rng)?;

            Ok(Observation {
                random_value,
                author: author.id.clone(),
                subject: subject.id.clone(),
                observation_type,
                attribute,
                value,
            })
        })
        .collect()
}

impl BatchRequest<'_> {
    /// Runs [`generate`] for this batch.
    ///
    /// # Errors
    /// See [`generate`].
    pub fn generate(
        &self,
        config: &GeneratorConfig,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<Observation>, SynthError> {
        generate(
            self.author,
            self.subject,
            self.polarity,
            self.count,
            config,
            rng,
        )
    }
}

/// `Ranking` when `random_value <= ranking_ratio`, otherwise `Dot`.
#[must_use]
pub fn observation_type(random_value: f64, ranking_ratio: f64) -> ObservationType {
    if random_value <= ranking_ratio {
        ObservationType::Ranking
    } else {
        ObservationType::Dot
    }
}

/// Pool the attribute is drawn from. A draw at or under the author's
/// likelihood of being wrong flips to the opposite pool.
#[must_use]
pub fn target_pool(
    polarity: Polarity,
    random_value: f64,
    likelihood_of_being_wrong: f64,
) -> AttributePool {
    let expected = polarity.expected_pool();
    if random_value <= likelihood_of_being_wrong {
        expected.opposite()
    } else {
        expected
    }
}

fn ranking_threshold(author: &Person, config: &GeneratorConfig) -> f64 {
    match config.type_draw {
        TypeDraw::Global => config.ranking_ratio,
        TypeDraw::AuthorWeighted => {
            let total = author.dot_factor + author.ranking_factor;
            if total > 0.0 {
                author.ranking_factor / total
            } else {
                config.ranking_ratio
            }
        }
    }
}

fn choose_attribute(
    subject: &Person,
    pool: AttributePool,
    rng: &mut dyn RandomSource,
) -> Result<AttributeId, SynthError> {
    let candidates = subject.pool(pool);
    if candidates.is_empty() {
        return Err(SynthError::EmptyAttributeSet {
            person_id: subject.id.clone(),
            pool,
        });
    }
    Ok(candidates[rng.next_index(candidates.len())])
}
