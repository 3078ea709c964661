//! Trait inference: derive a full lifestyle profile from the sleep answer.
//!
//! Each rule is its own function and each rule's output feeds the next
//! one's weights: sleep -> eating -> cleanliness, sleep -> sociability ->
//! sharing.

use nestmatch_schema::{Diet, SharingComfort, Sociability, SurveyAnswerMap, TraitVector};
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::{Map, Value};

use crate::error::{EnrichError, SamplerError};
use crate::sampler::WeightedSampler;

pub const CLEANLINESS_SCORES: [u8; 5] = [1, 2, 3, 4, 5];

/// Sleep answer bucket. Anything that is not `"Early"` or `"On-time"`
/// counts as a night owl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SleepSchedule {
    Early,
    OnTime,
    NightOwl,
}

impl SleepSchedule {
    pub fn from_answer(raw: &str) -> Self {
        match raw {
            "Early" => Self::Early,
            "On-time" => Self::OnTime,
            _ => Self::NightOwl,
        }
    }
}

pub fn eating_weights(sleep: SleepSchedule) -> [u32; 4] {
    match sleep {
        SleepSchedule::Early => [40, 30, 20, 10],
        SleepSchedule::OnTime => [30, 25, 25, 20],
        SleepSchedule::NightOwl => [10, 15, 25, 50],
    }
}

pub fn cleanliness_weights(eating: Diet) -> [u32; 5] {
    if eating.is_plant_based() {
        [5, 10, 20, 35, 30]
    } else {
        [15, 25, 30, 20, 10]
    }
}

pub fn sociability_weights(sleep: SleepSchedule) -> [u32; 3] {
    match sleep {
        SleepSchedule::Early => [40, 40, 20],
        SleepSchedule::OnTime => [20, 50, 30],
        SleepSchedule::NightOwl => [10, 30, 60],
    }
}

pub fn sharing_weights(sociability: Sociability) -> [u32; 3] {
    match sociability {
        Sociability::Quiet => [50, 40, 10],
        Sociability::Balanced => [20, 60, 20],
        Sociability::Outgoing => [5, 30, 65],
    }
}

pub fn infer_eating<R: Rng>(
    sampler: &mut WeightedSampler<R>,
    sleep: SleepSchedule,
) -> Result<Diet, SamplerError> {
    sampler.sample_weighted(&Diet::ALL, &eating_weights(sleep))
}

pub fn infer_cleanliness<R: Rng>(
    sampler: &mut WeightedSampler<R>,
    eating: Diet,
) -> Result<u8, SamplerError> {
    sampler.sample_weighted(&CLEANLINESS_SCORES, &cleanliness_weights(eating))
}

pub fn infer_sociability<R: Rng>(
    sampler: &mut WeightedSampler<R>,
    sleep: SleepSchedule,
) -> Result<Sociability, SamplerError> {
    sampler.sample_weighted(&Sociability::ALL, &sociability_weights(sleep))
}

pub fn infer_sharing<R: Rng>(
    sampler: &mut WeightedSampler<R>,
    sociability: Sociability,
) -> Result<SharingComfort, SamplerError> {
    sampler.sample_weighted(&SharingComfort::ALL, &sharing_weights(sociability))
}

/// Runs the inference rules over one sampler. Results legitimately vary
/// between calls unless the sampler was seeded.
#[derive(Debug, Clone)]
pub struct TraitInferenceEngine<R = StdRng> {
    sampler: WeightedSampler<R>,
}

impl TraitInferenceEngine<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(WeightedSampler::seeded(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(WeightedSampler::from_entropy())
    }

    /// Seeded when `seed` is set, otherwise from OS entropy.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> TraitInferenceEngine<R> {
    pub fn new(sampler: WeightedSampler<R>) -> Self {
        Self { sampler }
    }

    pub fn infer(&mut self, sleep: &str) -> Result<TraitVector, SamplerError> {
        let schedule = SleepSchedule::from_answer(sleep);
        let eating = infer_eating(&mut self.sampler, schedule)?;
        let cleanliness = infer_cleanliness(&mut self.sampler, eating)?;
        let sociability = infer_sociability(&mut self.sampler, schedule)?;
        let sharing = infer_sharing(&mut self.sampler, sociability)?;

        tracing::debug!(
            sleep,
            eating = eating.as_str(),
            cleanliness,
            sociability = sociability.as_str(),
            sharing = sharing.as_str(),
            "inferred traits"
        );

        Ok(TraitVector {
            sleep: sleep.to_string(),
            eating,
            cleanliness,
            sociability,
            sharing,
        })
    }

    /// Infer traits for a finished survey's answers.
    pub fn infer_from_answers(
        &mut self,
        answers: &SurveyAnswerMap,
    ) -> Result<TraitVector, EnrichError> {
        let sleep = answers
            .get("sleep")
            .and_then(|v| v.as_text())
            .ok_or_else(|| EnrichError::InvalidProfile {
                reason: "answers do not contain a text `sleep` value".to_string(),
            })?;
        Ok(self.infer(sleep)?)
    }

    /// Fill `eating`, `cleanliness`, `sociability` and `sharing` into a
    /// profile object that carries `sleep`. Every other field passes
    /// through untouched; client-supplied values for the derived keys are
    /// overwritten.
    pub fn enrich_profile(&mut self, profile: Value) -> Result<Value, EnrichError> {
        let Value::Object(mut fields) = profile else {
            return Err(EnrichError::InvalidProfile {
                reason: "profile must be a JSON object".to_string(),
            });
        };
        let sleep = match fields.get("sleep") {
            Some(Value::String(sleep)) => sleep.clone(),
            Some(_) => {
                return Err(EnrichError::InvalidProfile {
                    reason: "`sleep` must be a string".to_string(),
                })
            }
            None => {
                return Err(EnrichError::InvalidProfile {
                    reason: "missing `sleep`".to_string(),
                })
            }
        };

        let traits = self.infer(&sleep)?;
        insert_traits(&mut fields, &traits);
        Ok(Value::Object(fields))
    }
}

fn insert_traits(fields: &mut Map<String, Value>, traits: &TraitVector) {
    // Same order as `TraitVector::DERIVED_FIELDS`.
    let values = [
        Value::from(traits.eating.as_str()),
        Value::from(traits.cleanliness),
        Value::from(traits.sociability.as_str()),
        Value::from(traits.sharing.as_str()),
    ];
    for (key, value) in TraitVector::DERIVED_FIELDS.into_iter().zip(values) {
        fields.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Upper-tail chi-square critical value at p = 0.001, indexed by degrees
    /// of freedom. Fixed seeds make these deterministic.
    fn chi_square_critical(df: usize) -> f64 {
        match df {
            2 => 13.816,
            3 => 16.266,
            4 => 18.467,
            _ => panic!("no table entry for df={df}"),
        }
    }

    fn chi_square(counts: &[usize], weights: &[u32]) -> f64 {
        let n: usize = counts.iter().sum();
        let total: u32 = weights.iter().sum();
        counts
            .iter()
            .zip(weights)
            .map(|(&observed, &w)| {
                let expected = n as f64 * f64::from(w) / f64::from(total);
                (observed as f64 - expected).powi(2) / expected
            })
            .sum()
    }

    #[test]
    fn sleep_buckets() {
        assert_eq!(SleepSchedule::from_answer("Early"), SleepSchedule::Early);
        assert_eq!(SleepSchedule::from_answer("On-time"), SleepSchedule::OnTime);
        assert_eq!(SleepSchedule::from_answer("Night owl"), SleepSchedule::NightOwl);
        assert_eq!(SleepSchedule::from_answer("early"), SleepSchedule::NightOwl);
        assert_eq!(SleepSchedule::from_answer(""), SleepSchedule::NightOwl);
    }

    #[test]
    fn eating_frequencies_match_weights_per_sleep_bucket() {
        for (i, sleep) in ["Early", "On-time", "Night owl"].into_iter().enumerate() {
            let schedule = SleepSchedule::from_answer(sleep);
            let mut sampler = WeightedSampler::seeded(1000 + i as u64);
            let mut counts = [0usize; 4];
            for _ in 0..10_000 {
                let diet = infer_eating(&mut sampler, schedule).unwrap();
                let idx = Diet::ALL.iter().position(|d| *d == diet).unwrap();
                counts[idx] += 1;
            }
            let stat = chi_square(&counts, &eating_weights(schedule));
            assert!(
                stat < chi_square_critical(3),
                "{sleep}: chi-square {stat} with counts {counts:?}"
            );
        }
    }

    #[test]
    fn sociability_frequencies_match_weights_per_sleep_bucket() {
        let order = [Sociability::Quiet, Sociability::Balanced, Sociability::Outgoing];
        let buckets = [
            (SleepSchedule::Early, [40, 40, 20]),
            (SleepSchedule::OnTime, [20, 50, 30]),
            (SleepSchedule::NightOwl, [10, 30, 60]),
        ];
        for (i, (schedule, weights)) in buckets.into_iter().enumerate() {
            let mut sampler = WeightedSampler::seeded(77 + i as u64);
            let mut counts = [0usize; 3];
            for _ in 0..10_000 {
                let s = infer_sociability(&mut sampler, schedule).unwrap();
                counts[order.iter().position(|x| *x == s).unwrap()] += 1;
            }
            let stat = chi_square(&counts, &weights);
            assert!(
                stat < chi_square_critical(2),
                "{schedule:?}: chi-square {stat} with counts {counts:?}"
            );
        }
    }

    #[test]
    fn sharing_frequencies_match_weights_per_sociability_bucket() {
        let order = [SharingComfort::Low, SharingComfort::Medium, SharingComfort::High];
        let buckets = [
            (Sociability::Quiet, [50, 40, 10]),
            (Sociability::Balanced, [20, 60, 20]),
            (Sociability::Outgoing, [5, 30, 65]),
        ];
        for (i, (sociability, weights)) in buckets.into_iter().enumerate() {
            let mut sampler = WeightedSampler::seeded(300 + i as u64);
            let mut counts = [0usize; 3];
            for _ in 0..10_000 {
                let sharing = infer_sharing(&mut sampler, sociability).unwrap();
                counts[order.iter().position(|x| *x == sharing).unwrap()] += 1;
            }
            let stat = chi_square(&counts, &weights);
            assert!(
                stat < chi_square_critical(2),
                "{sociability:?}: chi-square {stat} with counts {counts:?}"
            );
        }
    }

    #[test]
    fn cleanliness_branch_depends_on_diet() {
        let mean = |diet: Diet, seed: u64| {
            let mut sampler = WeightedSampler::seeded(seed);
            let total: u64 = (0..10_000)
                .map(|_| u64::from(infer_cleanliness(&mut sampler, diet).unwrap()))
                .sum();
            total as f64 / 10_000.0
        };

        let vegetarian = mean(Diet::Vegetarian, 5);
        let omnivore = mean(Diet::Omnivore, 6);
        // Expected means are 3.75 and 2.85.
        assert!((vegetarian - 3.75).abs() < 0.1, "vegetarian mean {vegetarian}");
        assert!((omnivore - 2.85).abs() < 0.1, "omnivore mean {omnivore}");
        assert!(vegetarian - omnivore > 0.6);
    }

    #[test]
    fn cleanliness_weights_by_diet() {
        assert_eq!(cleanliness_weights(Diet::Vegan), [5, 10, 20, 35, 30]);
        assert_eq!(cleanliness_weights(Diet::Vegetarian), [5, 10, 20, 35, 30]);
        assert_eq!(cleanliness_weights(Diet::Pescatarian), [15, 25, 30, 20, 10]);
        assert_eq!(cleanliness_weights(Diet::Omnivore), [15, 25, 30, 20, 10]);
    }

    #[test]
    fn sharing_weights_by_sociability() {
        assert_eq!(sharing_weights(Sociability::Quiet), [50, 40, 10]);
        assert_eq!(sharing_weights(Sociability::Balanced), [20, 60, 20]);
        assert_eq!(sharing_weights(Sociability::Outgoing), [5, 30, 65]);
    }

    #[test]
    fn same_seed_reproduces_vector() {
        let a = TraitInferenceEngine::seeded(42).infer("Early").unwrap();
        let b = TraitInferenceEngine::seeded(42).infer("Early").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.sleep, "Early");
    }

    #[test]
    fn engine_follows_conditional_chain() {
        // Replaying the same seed through the individual rules must give the
        // same vector, so each draw used the weights its predecessor selected.
        for seed in 0..200 {
            let traits = TraitInferenceEngine::seeded(seed).infer("Night owl").unwrap();

            let mut sampler = WeightedSampler::seeded(seed);
            let schedule = SleepSchedule::NightOwl;
            let eating = infer_eating(&mut sampler, schedule).unwrap();
            let cleanliness = infer_cleanliness(&mut sampler, eating).unwrap();
            let sociability = infer_sociability(&mut sampler, schedule).unwrap();
            let sharing = infer_sharing(&mut sampler, sociability).unwrap();

            assert_eq!(traits.eating, eating);
            assert_eq!(traits.cleanliness, cleanliness);
            assert_eq!(traits.sociability, sociability);
            assert_eq!(traits.sharing, sharing);
            assert_eq!(sampler.draws(), 4);
        }
    }

    #[test]
    fn unrecognized_sleep_uses_night_owl_weights() {
        for seed in 0..50 {
            let odd = TraitInferenceEngine::seeded(seed).infer("whenever").unwrap();
            let owl = TraitInferenceEngine::seeded(seed).infer("Night owl").unwrap();
            assert_eq!(odd.eating, owl.eating);
            assert_eq!(odd.sociability, owl.sociability);
            assert_eq!(odd.sleep, "whenever");
        }
    }

    #[test]
    fn enrich_profile_passes_extra_fields_through() {
        let mut engine = TraitInferenceEngine::seeded(9);
        let enriched = engine
            .enrich_profile(json!({
                "name": "Mudita",
                "sleep": "Early",
                "roomPreference": "single",
                "eating": "client guess"
            }))
            .unwrap();

        assert_eq!(enriched["name"], "Mudita");
        assert_eq!(enriched["roomPreference"], "single");
        assert_eq!(enriched["sleep"], "Early");
        let eating = enriched["eating"].as_str().unwrap();
        assert!(Diet::ALL.iter().any(|d| d.as_str() == eating));
        let cleanliness = enriched["cleanliness"].as_u64().unwrap();
        assert!((1..=5).contains(&cleanliness));
        assert!(enriched["sociability"].is_string());
        assert!(enriched["sharing"].is_string());
    }

    #[test]
    fn enrich_profile_matches_infer_for_same_seed() {
        let traits = TraitInferenceEngine::seeded(11).infer("On-time").unwrap();
        let enriched = TraitInferenceEngine::seeded(11)
            .enrich_profile(json!({"sleep": "On-time"}))
            .unwrap();
        assert_eq!(enriched["eating"], traits.eating.as_str());
        assert_eq!(enriched["cleanliness"], traits.cleanliness);
        assert_eq!(enriched["sociability"], traits.sociability.as_str());
        assert_eq!(enriched["sharing"], traits.sharing.as_str());
    }

    #[test]
    fn enrich_profile_writes_every_derived_field() {
        let enriched = TraitInferenceEngine::seeded(21)
            .enrich_profile(json!({"sleep": "Early", "name": "Ravi"}))
            .unwrap();
        let fields = enriched.as_object().unwrap();
        for key in TraitVector::DERIVED_FIELDS {
            assert!(fields.contains_key(key), "missing {key}");
        }
        assert_eq!(fields.len(), TraitVector::DERIVED_FIELDS.len() + 2);
    }

    #[test]
    fn enrich_profile_rejects_bad_input() {
        let mut engine = TraitInferenceEngine::seeded(1);
        let err = engine.enrich_profile(json!({"name": "x"})).unwrap_err();
        assert!(err.to_string().contains("missing `sleep`"));

        let err = engine.enrich_profile(json!({"sleep": 3})).unwrap_err();
        assert!(err.to_string().contains("must be a string"));

        let err = engine.enrich_profile(json!(["Early"])).unwrap_err();
        assert!(matches!(err, EnrichError::InvalidProfile { .. }));
    }

    #[test]
    fn infer_from_answers_reads_sleep() {
        let mut answers = SurveyAnswerMap::new();
        answers.insert("sleep".into(), "Early".into());
        answers.insert("cleanliness".into(), 4.into());
        let traits = TraitInferenceEngine::seeded(3).infer_from_answers(&answers).unwrap();
        assert_eq!(traits, TraitInferenceEngine::seeded(3).infer("Early").unwrap());

        answers.insert("sleep".into(), 1.into());
        assert!(TraitInferenceEngine::seeded(3).infer_from_answers(&answers).is_err());
    }
}
