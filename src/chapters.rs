//! Level and chapter tagging from annotated numbered files
//!
//! # Format
//! ```text
//! n3
//! {
//! 1.   火, ひ, fire
//! 2.   水, みず, water
//! }
//! {
//! 3.   木, き, tree
//! }
//! ```
//! The optional first line names the level. Each `{ ... }` block is one
//! chapter, numbered from 1.

use crate::db;
use crate::error::{ChapterError, ParseError};
use regex::Regex;
use rusqlite::{params, Connection};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::info;

static CHAPTER_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{([^}]*)\}").unwrap());

static ENTRY_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.").unwrap());

/// JLPT proficiency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::N5, Level::N4, Level::N3, Level::N2, Level::N1];

    /// Row id in `n_level`: n5 is 1, n1 is 5.
    pub fn id(&self) -> i64 {
        match self {
            Level::N5 => 1,
            Level::N4 => 2,
            Level::N3 => 3,
            Level::N2 => 4,
            Level::N1 => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::N5 => "n5",
            Level::N4 => "n4",
            Level::N3 => "n3",
            Level::N2 => "n2",
            Level::N1 => "n1",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ChapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Level::ALL
            .into_iter()
            .find(|l| l.as_str() == key)
            .ok_or_else(|| ChapterError::UnknownLevel(s.to_string()))
    }
}

/// Level named on the first non-empty line, if any.
pub fn read_level_header(text: &str) -> Option<Level> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse().ok())
}

/// Map entry number -> chapter number.
///
/// Without any `{ ... }` block the whole text counts as chapter 1.
pub fn parse_chapters(text: &str) -> BTreeMap<usize, usize> {
    let mut blocks: Vec<&str> = CHAPTER_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    if blocks.is_empty() {
        blocks.push(text);
    }

    let mut mapping = BTreeMap::new();
    for (chapter_idx, block) in blocks.iter().enumerate() {
        for line in block.lines().map(str::trim) {
            let Some(caps) = ENTRY_NUMBER.captures(line) else {
                continue;
            };
            if let Ok(entry_num) = caps[1].parse::<usize>() {
                mapping.insert(entry_num, chapter_idx + 1);
            }
        }
    }
    mapping
}

/// Parsed chapter-annotated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterFile {
    pub level: Option<Level>,
    pub chapters: BTreeMap<usize, usize>,
}

impl ChapterFile {
    pub fn parse(text: &str) -> Self {
        Self {
            level: read_level_header(text),
            chapters: parse_chapters(text),
        }
    }

    /// Header level, falling back to `fallback`.
    pub fn resolve_level(&self, fallback: Option<Level>) -> Result<Level, ChapterError> {
        self.level.or(fallback).ok_or(ChapterError::MissingLevel)
    }
}

pub fn load_chapter_file(path: impl AsRef<Path>) -> Result<ChapterFile, ParseError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    Ok(ChapterFile::parse(&text))
}

/// Row counts touched by [`apply_level_and_chapters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub level: Option<Level>,
    /// Distinct chapter numbers in the applied mapping.
    pub chapters: usize,
    pub entries_level_updated: usize,
    pub questions_level_updated: usize,
    pub entries_chapter_updated: usize,
    pub questions_chapter_updated: usize,
}

/// Tag every entry and question with `level` and each entry with its chapter,
/// then copy entry chapters onto their questions. Runs in one transaction.
pub fn apply_level_and_chapters(
    conn: &mut Connection,
    level: Level,
    chapters: &BTreeMap<usize, usize>,
) -> Result<ApplySummary, ChapterError> {
    let tx = conn.transaction()?;
    db::seed_levels(&tx)?;

    let mut summary = ApplySummary {
        level: Some(level),
        chapters: chapters.values().collect::<BTreeSet<_>>().len(),
        ..Default::default()
    };
    summary.entries_level_updated = tx.execute("UPDATE entries SET level = ?1", params![level.id()])?;
    summary.questions_level_updated = tx.execute("UPDATE questions SET level = ?1", params![level.id()])?;

    if !chapters.is_empty() {
        let mut stmt = tx.prepare("UPDATE entries SET chapter = ?1 WHERE list_index = ?2")?;
        for (&entry_num, &chapter) in chapters {
            summary.entries_chapter_updated += stmt.execute(params![chapter as i64, entry_num as i64])?;
        }
        drop(stmt);

        summary.questions_chapter_updated = tx.execute(
            "UPDATE questions SET chapter = (SELECT chapter FROM entries WHERE entries.id = questions.entry_id)",
            [],
        )?;
    }
    tx.commit()?;

    info!(
        level = %level,
        chapters = summary.chapters,
        entries_level_updated = summary.entries_level_updated,
        questions_level_updated = summary.questions_level_updated,
        entries_chapter_updated = summary.entries_chapter_updated,
        questions_chapter_updated = summary.questions_chapter_updated,
        "applied level and chapters"
    );
    Ok(summary)
}

/// Open the store at `db_path` and apply the chapter file to it.
pub fn apply_from_file(
    db_path: impl AsRef<Path>,
    chapter_path: impl AsRef<Path>,
    fallback_level: Option<Level>,
) -> Result<ApplySummary, ChapterError> {
    let db_path = db_path.as_ref();
    if !db_path.exists() {
        return Err(ChapterError::MissingDatabase(db_path.to_path_buf()));
    }

    let file = load_chapter_file(chapter_path)?;
    let level = file.resolve_level(fallback_level)?;
    let mut conn = db::create_db(db_path, false)?;
    apply_level_and_chapters(&mut conn, level, &file.chapters)
}
