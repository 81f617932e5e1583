//! MCQ question generation for vocabulary entries

use crate::entry::{Entry, Field};
use crate::error::GenerateError;
use crate::pools::Pools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Default number of options per question (1 correct + 3 distractors).
pub const DEFAULT_MIN_OPTIONS: usize = 4;

/// A (source field -> target field) question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[serde(rename = "kanji_to_hiragana")]
    KanjiToKana,
    KanjiToMeaning,
    KanaToMeaning,
    KanaToKanji,
    MeaningToKanji,
    MeaningToKana,
}

impl Direction {
    /// All directions, in the order they are attempted for each entry.
    pub const ALL: [Direction; 6] = [
        Direction::KanjiToKana,
        Direction::KanjiToMeaning,
        Direction::KanaToMeaning,
        Direction::KanaToKanji,
        Direction::MeaningToKanji,
        Direction::MeaningToKana,
    ];

    pub fn source(&self) -> Field {
        match self {
            Direction::KanjiToKana | Direction::KanjiToMeaning => Field::Kanji,
            Direction::KanaToMeaning | Direction::KanaToKanji => Field::Kana,
            Direction::MeaningToKanji | Direction::MeaningToKana => Field::Meaning,
        }
    }

    pub fn target(&self) -> Field {
        match self {
            Direction::KanaToKanji | Direction::MeaningToKanji => Field::Kanji,
            Direction::KanjiToKana | Direction::MeaningToKana => Field::Kana,
            Direction::KanjiToMeaning | Direction::KanaToMeaning => Field::Meaning,
        }
    }

    /// Type tag stored in the `q_type` column.
    pub fn tag(&self) -> &'static str {
        match self {
            Direction::KanjiToKana => "kanji_to_hiragana",
            Direction::KanjiToMeaning => "kanji_to_meaning",
            Direction::KanaToMeaning => "kana_to_meaning",
            Direction::KanaToKanji => "kana_to_kanji",
            Direction::MeaningToKanji => "meaning_to_kanji",
            Direction::MeaningToKana => "meaning_to_kana",
        }
    }

    pub fn question_text(&self, prompt: &str) -> String {
        match self {
            Direction::KanjiToKana => format!("What is the hiragana reading of '{}'?", prompt),
            Direction::KanjiToMeaning | Direction::KanaToMeaning => {
                format!("What does '{}' mean?", prompt)
            }
            Direction::KanaToKanji => format!("Which kanji corresponds to '{}'?", prompt),
            Direction::MeaningToKanji => format!("Which kanji represents '{}'?", prompt),
            Direction::MeaningToKana => format!("What is the hiragana for '{}'?", prompt),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Direction {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.tag() == s)
            .ok_or_else(|| GenerateError::UnknownDirection(s.to_string()))
    }
}

/// Generated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based position of the source entry.
    pub entry_index: usize,
    pub direction: Direction,
    pub prompt: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub correct_index: usize,
}

impl Question {
    /// Correct answer sits at `correct_index` and no option repeats.
    pub fn is_consistent(&self) -> bool {
        let unique: HashSet<&str> = self.options.iter().map(String::as_str).collect();
        self.options.get(self.correct_index) == Some(&self.correct_answer)
            && unique.len() == self.options.len()
    }
}

/// Settings for question generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationConfig {
    min_options: usize,
}

impl GenerationConfig {
    pub fn new(min_options: usize) -> Result<Self, GenerateError> {
        if min_options < 2 {
            return Err(GenerateError::TooFewOptions(min_options));
        }
        Ok(Self { min_options })
    }

    pub fn min_options(&self) -> usize {
        self.min_options
    }

    fn distractors_needed(&self) -> usize {
        self.min_options - 1
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_options: DEFAULT_MIN_OPTIONS,
        }
    }
}

/// Result of a generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub questions: Vec<Question>,
    /// Directions dropped for lack of distractors.
    pub skipped: usize,
}

/// Sample `need` distinct values from `pool`, never `correct`.
fn sample_distractors<R: Rng + ?Sized>(
    pool: &[String],
    correct: &str,
    need: usize,
    rng: &mut R,
) -> Option<Vec<String>> {
    let mut candidates: Vec<String> = pool.iter().filter(|p| p.as_str() != correct).cloned().collect();
    if candidates.len() < need {
        return None;
    }
    candidates.shuffle(rng);
    candidates.truncate(need);
    Some(candidates)
}

/// Drop empty values and repeats, keeping first-seen order.
fn unique_pool(pool: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    pool.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Generate up to six questions per entry.
///
/// A direction is silently passed over when the entry lacks its source or
/// target value, and counted in `skipped` when the target pool cannot
/// provide enough distractors.
pub fn generate_all_questions<R: Rng + ?Sized>(
    entries: &[Entry],
    pools: &Pools,
    config: &GenerationConfig,
    rng: &mut R,
) -> GenerationOutcome {
    let unique = Pools {
        kanji: unique_pool(&pools.kanji),
        kana: unique_pool(&pools.kana),
        meaning: unique_pool(&pools.meaning),
    };
    let need = config.distractors_needed();

    let mut outcome = GenerationOutcome::default();

    for (idx, entry) in entries.iter().enumerate() {
        let entry_index = idx + 1;

        for direction in Direction::ALL {
            let prompt = entry.get(direction.source()).trim();
            let correct = entry.get(direction.target()).trim();
            if prompt.is_empty() || correct.is_empty() {
                continue;
            }

            let Some(mut options) =
                sample_distractors(unique.for_field(direction.target()), correct, need, rng)
            else {
                debug!(entry = entry_index, %direction, field = %direction.target(), "not enough distractors");
                outcome.skipped += 1;
                continue;
            };

            // Shuffled distractors plus a uniformly placed answer is a uniform shuffle.
            options.shuffle(rng);
            let correct_index = rng.gen_range(0..=options.len());
            options.insert(correct_index, correct.to_string());

            outcome.questions.push(Question {
                entry_index,
                direction,
                prompt: prompt.to_string(),
                text: direction.question_text(prompt),
                options,
                correct_answer: correct.to_string(),
                correct_index,
            });
        }
    }

    info!(
        entries = entries.len(),
        generated = outcome.questions.len(),
        skipped = outcome.skipped,
        min_options = config.min_options(),
        "question generation finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pools::build_pools;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn elements() -> Vec<Entry> {
        vec![
            Entry::new("火", "ひ", "fire"),
            Entry::new("水", "みず", "water"),
            Entry::new("木", "き", "tree"),
            Entry::new("金", "きん", "money"),
        ]
    }

    fn generate(entries: &[Entry], seed: u64) -> GenerationOutcome {
        let pools = build_pools(entries);
        let mut rng = StdRng::seed_from_u64(seed);
        generate_all_questions(entries, &pools, &GenerationConfig::default(), &mut rng)
    }

    #[test]
    fn direction_tags_round_trip() {
        for d in Direction::ALL {
            assert_eq!(d.tag().parse::<Direction>().unwrap(), d);
            assert_ne!(d.source(), d.target());
        }
        assert!("kanji_to_kanji".parse::<Direction>().is_err());
    }

    #[test]
    fn serde_uses_stored_tags() {
        let json = serde_json::to_string(&Direction::KanjiToKana).unwrap();
        assert_eq!(json, "\"kanji_to_hiragana\"");
        let json = serde_json::to_string(&Direction::MeaningToKana).unwrap();
        assert_eq!(json, "\"meaning_to_kana\"");
    }

    #[test]
    fn config_rejects_single_option() {
        assert_eq!(GenerationConfig::new(1), Err(GenerateError::TooFewOptions(1)));
        assert_eq!(GenerationConfig::new(3).unwrap().min_options(), 3);
    }

    #[test]
    fn four_full_entries_give_all_directions() {
        let outcome = generate(&elements(), 7);
        assert_eq!(outcome.questions.len(), 24);
        assert_eq!(outcome.skipped, 0);
        assert!(outcome.questions.iter().all(Question::is_consistent));
        assert!(outcome.questions.iter().all(|q| q.options.len() == 4));
    }

    #[test]
    fn kanji_to_meaning_uses_other_meanings() {
        let entries = elements();
        let outcome = generate(&entries, 11);
        let questions: Vec<&Question> = outcome
            .questions
            .iter()
            .filter(|q| q.direction == Direction::KanjiToMeaning)
            .collect();
        assert_eq!(questions.len(), 4);

        for q in questions {
            let entry = &entries[q.entry_index - 1];
            assert_eq!(q.prompt, entry.kanji);
            assert_eq!(q.correct_answer, entry.meaning);
            assert_eq!(q.text, format!("What does '{}' mean?", entry.kanji));
            let mut sorted = q.options.clone();
            sorted.sort();
            assert_eq!(sorted, vec!["fire", "money", "tree", "water"]);
        }
    }

    #[test]
    fn directions_follow_fixed_order_per_entry() {
        let outcome = generate(&elements(), 3);
        let first: Vec<Direction> = outcome
            .questions
            .iter()
            .filter(|q| q.entry_index == 1)
            .map(|q| q.direction)
            .collect();
        assert_eq!(first, Direction::ALL.to_vec());
    }

    #[test]
    fn small_pool_is_counted_as_skipped() {
        let entries = vec![
            Entry::new("火", "ひ", "fire"),
            Entry::new("水", "みず", "water"),
            Entry::new("木", "き", "tree"),
        ];
        let outcome = generate(&entries, 1);
        assert!(outcome.questions.is_empty());
        assert_eq!(outcome.skipped, 18);
    }

    #[test]
    fn missing_fields_are_not_counted() {
        let mut entries = elements();
        entries.push(Entry::new("", "", "sky"));
        let outcome = generate(&entries, 5);
        assert_eq!(outcome.skipped, 0);
        assert!(outcome.questions.iter().all(|q| q.entry_index <= 4));
    }

    #[test]
    fn missing_kanji_only_drops_kanji_directions() {
        let mut entries = elements();
        entries.push(Entry::new("", "そら", "sky"));
        let outcome = generate(&entries, 5);
        let fifth: Vec<Direction> = outcome
            .questions
            .iter()
            .filter(|q| q.entry_index == 5)
            .map(|q| q.direction)
            .collect();
        assert_eq!(fifth, vec![Direction::KanaToMeaning, Direction::MeaningToKana]);
    }

    #[test]
    fn correct_value_repeated_in_pool_is_excluded() {
        // Two entries share "water", leaving three distinct meanings.
        let entries = vec![
            Entry::new("水", "みず", "water"),
            Entry::new("お冷", "おひや", "water"),
            Entry::new("火", "ひ", "fire"),
            Entry::new("木", "き", "tree"),
        ];
        let outcome = generate(&entries, 9);
        let water_meaning: Vec<&Question> = outcome
            .questions
            .iter()
            .filter(|q| q.correct_answer == "water")
            .collect();
        assert!(water_meaning.is_empty());
        assert!(outcome.skipped >= 4);
        assert!(outcome.questions.iter().all(Question::is_consistent));
    }

    #[test]
    fn min_options_controls_option_count() {
        let entries = elements();
        let pools = build_pools(&entries);
        let mut rng = StdRng::seed_from_u64(2);
        let config = GenerationConfig::new(3).unwrap();
        let outcome = generate_all_questions(&entries, &pools, &config, &mut rng);
        assert_eq!(outcome.questions.len(), 24);
        assert!(outcome.questions.iter().all(|q| q.options.len() == 3));
    }

    #[test]
    fn same_seed_same_questions() {
        let entries = elements();
        assert_eq!(generate(&entries, 42), generate(&entries, 42));
    }

    #[test]
    fn sampler_never_returns_correct_or_repeats() {
        let pool: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let picked = sample_distractors(&pool, "c", 3, &mut rng).unwrap();
            let unique: HashSet<&String> = picked.iter().collect();
            assert_eq!(unique.len(), 3);
            assert!(!picked.iter().any(|p| p == "c"));
        }
        assert!(sample_distractors(&pool, "c", 5, &mut rng).is_none());
    }
}
