//! Vocabulary entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three textual fields of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Primary written form.
    Kanji,
    /// Phonetic reading.
    Kana,
    Meaning,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Kanji => "kanji",
            Field::Kana => "kana",
            Field::Meaning => "meaning",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vocabulary entry. An empty string marks an absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub kanji: String,
    pub kana: String,
    pub meaning: String,
}

impl Entry {
    pub fn new(kanji: impl AsRef<str>, kana: impl AsRef<str>, meaning: impl AsRef<str>) -> Self {
        Self {
            kanji: kanji.as_ref().trim().to_string(),
            kana: kana.as_ref().trim().to_string(),
            meaning: meaning.as_ref().trim().to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Kanji => &self.kanji,
            Field::Kana => &self.kana,
            Field::Meaning => &self.meaning,
        }
    }
}
