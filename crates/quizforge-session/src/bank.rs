//! The question bank: a static pool that games sample from.

use std::collections::HashSet;
use std::path::Path;

use quizforge_protocol::{AgeGroup, Category};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::error::BankError;
use crate::question::Question;

/// Seed questions compiled into the binary.
const BUILTIN_QUESTIONS: &str = include_str!("../data/questions.json");

/// An immutable set of validated questions.
///
/// Shared read-only between all rooms (wrap it in an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Builds a bank, validating every record and rejecting duplicate ids.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            q.validate().map_err(|reason| BankError::InvalidQuestion {
                id: q.id.clone(),
                reason,
            })?;
            if !seen.insert(q.id.as_str()) {
                return Err(BankError::InvalidQuestion {
                    id: q.id.clone(),
                    reason: "duplicate id".into(),
                });
            }
        }
        Ok(Self { questions })
    }

    /// Parses a JSON array of question records.
    pub fn from_json_str(json: &str) -> Result<Self, BankError> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    /// Reads a JSON question file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let bank = Self::from_json_str(&json)?;
        info!(path = %path.display(), questions = bank.len(), "question bank loaded");
        Ok(bank)
    }

    /// The seed set shipped with the server.
    pub fn builtin() -> Result<Self, BankError> {
        Self::from_json_str(BUILTIN_QUESTIONS)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// All records, in file order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// How many records match a category / age filter.
    pub fn count_matching(&self, category: Category, age_group: Option<AgeGroup>) -> usize {
        self.matching(category, age_group).count()
    }

    /// Draws up to `count` random questions matching the filter, using the
    /// thread-local RNG. See [`sample_with`](Self::sample_with).
    pub fn sample(
        &self,
        category: Category,
        count: usize,
        age_group: Option<AgeGroup>,
    ) -> Vec<Question> {
        self.sample_with(&mut rand::rng(), category, count, age_group)
    }

    /// Draws up to `count` random questions matching the filter.
    ///
    /// `Category::Mixed` passes every topic. When fewer than `count`
    /// records match, all of them are returned (shuffled); asking for more
    /// than the pool holds is not an error.
    pub fn sample_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        category: Category,
        count: usize,
        age_group: Option<AgeGroup>,
    ) -> Vec<Question> {
        let mut pool: Vec<Question> = self.matching(category, age_group).cloned().collect();
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }

    fn matching(
        &self,
        category: Category,
        age_group: Option<AgeGroup>,
    ) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| {
            category.includes(q.category) && age_group.is_none_or(|age| q.age_group == Some(age))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn q(id: &str, category: Category, age: Option<AgeGroup>) -> Question {
        Question {
            id: id.into(),
            category,
            prompt: format!("question {id}"),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            explanation: None,
            age_group: age,
        }
    }

    fn small_bank() -> QuestionBank {
        QuestionBank::new(vec![
            q("m1", Category::Math, Some(AgeGroup::Grade1)),
            q("m2", Category::Math, Some(AgeGroup::Grade2)),
            q("m3", Category::Math, None),
            q("e1", Category::English, Some(AgeGroup::Grade1)),
            q("g1", Category::General, Some(AgeGroup::Preschool)),
        ])
        .unwrap()
    }

    #[test]
    fn test_sample_filters_by_category() {
        let bank = small_bank();
        let mut rng = StdRng::seed_from_u64(1);
        let got = bank.sample_with(&mut rng, Category::Math, 10, None);
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|q| q.category == Category::Math));
    }

    #[test]
    fn test_sample_mixed_passes_every_topic() {
        let bank = small_bank();
        assert_eq!(bank.sample(Category::Mixed, 10, None).len(), 5);
    }

    #[test]
    fn test_sample_filters_by_age_group() {
        let bank = small_bank();
        let got = bank.sample(Category::Mixed, 10, Some(AgeGroup::Grade1));
        let mut ids: Vec<_> = got.iter().map(|q| q.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["e1", "m1"]);
    }

    #[test]
    fn test_sample_truncates_to_count() {
        let bank = small_bank();
        let got = bank.sample(Category::Mixed, 2, None);
        assert_eq!(got.len(), 2);
        assert_ne!(got[0].id, got[1].id);
    }

    #[test]
    fn test_sample_with_no_matches_is_empty() {
        let bank = small_bank();
        assert!(bank.sample(Category::Chinese, 5, None).is_empty());
        assert_eq!(bank.count_matching(Category::Chinese, None), 0);
    }

    #[test]
    fn test_sample_is_deterministic_under_seeded_rng() {
        let bank = small_bank();
        let a = bank.sample_with(&mut StdRng::seed_from_u64(9), Category::Mixed, 5, None);
        let b = bank.sample_with(&mut StdRng::seed_from_u64(9), Category::Mixed, 5, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let err = QuestionBank::new(vec![
            q("x", Category::Math, None),
            q("x", Category::English, None),
        ])
        .unwrap_err();
        assert!(matches!(err, BankError::InvalidQuestion { ref id, .. } if id == "x"));
    }

    #[test]
    fn test_from_json_str_reports_parse_errors() {
        let err = QuestionBank::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, BankError::Parse(_)));
    }

    #[test]
    fn test_builtin_bank_is_valid_and_covers_every_topic() {
        let bank = QuestionBank::builtin().unwrap();
        assert!(!bank.is_empty());
        for topic in [
            Category::Chinese,
            Category::English,
            Category::Math,
            Category::General,
        ] {
            assert!(bank.count_matching(topic, None) > 0, "no {topic} questions");
        }
    }
}
