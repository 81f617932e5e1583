//! Distractor pools

use crate::entry::{Entry, Field};
use std::collections::HashSet;

/// Deduplicated non-empty values per field, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pools {
    pub kanji: Vec<String>,
    pub kana: Vec<String>,
    pub meaning: Vec<String>,
}

impl Pools {
    pub fn for_field(&self, field: Field) -> &[String] {
        match field {
            Field::Kanji => &self.kanji,
            Field::Kana => &self.kana,
            Field::Meaning => &self.meaning,
        }
    }
}

/// Build the three distractor pools from `entries`.
pub fn build_pools(entries: &[Entry]) -> Pools {
    fn unique(entries: &[Entry], field: Field) -> Vec<String> {
        let mut seen = HashSet::new();
        entries
            .iter()
            .map(|e| e.get(field))
            .filter(|v| !v.is_empty() && seen.insert(*v))
            .map(str::to_string)
            .collect()
    }

    Pools {
        kanji: unique(entries, Field::Kanji),
        kana: unique(entries, Field::Kana),
        meaning: unique(entries, Field::Meaning),
    }
}
