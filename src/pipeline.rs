//! End-to-end run: raw list -> fixed file -> questions -> database

use crate::chapters::{self, ApplySummary, Level};
use crate::db::{self, SaveSummary, StoredQuestion};
use crate::error::{ChapterError, ParseError, PipelineError};
use crate::parser;
use crate::pools::build_pools;
use crate::questions::{generate_all_questions, GenerationConfig, DEFAULT_MIN_OPTIONS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Inputs for one generation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub fixed: PathBuf,
    pub db: PathBuf,
    pub min_options: usize,
    pub force: bool,
    /// Read back this many stored questions after saving.
    pub sample_limit: Option<usize>,
    /// Chapter-annotated file applied after saving, if present.
    pub chapter_file: Option<PathBuf>,
    pub level: Option<Level>,
}

impl RunOptions {
    pub fn new(input: impl Into<PathBuf>, fixed: impl Into<PathBuf>, db: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            fixed: fixed.into(),
            db: db.into(),
            min_options: DEFAULT_MIN_OPTIONS,
            force: false,
            sample_limit: None,
            chapter_file: None,
            level: None,
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub entries: usize,
    pub kanji_pool: usize,
    pub kana_pool: usize,
    pub meaning_pool: usize,
    pub generated: usize,
    pub skipped: usize,
    pub saved: SaveSummary,
    /// Rows held by the store after saving, including earlier runs.
    pub stored_entries: i64,
    pub stored_questions: i64,
    pub samples: Vec<StoredQuestion>,
    pub applied: Option<ApplySummary>,
}

/// Seeded generator when `seed` is given, otherwise one seeded from OS entropy.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Parse the raw list, write the fixed file, then generate and store questions.
pub fn run_generation<R: Rng + ?Sized>(options: &RunOptions, rng: &mut R) -> Result<RunReport, PipelineError> {
    let config = GenerationConfig::new(options.min_options)?;

    let raw = parser::parse_raw_file(&options.input).map_err(PipelineError::Parse)?;
    if raw.is_empty() {
        return Err(PipelineError::EmptyInput(options.input.clone()));
    }

    parser::write_fixed_file(&raw, &options.fixed).map_err(PipelineError::Write)?;
    info!(entries = raw.len(), path = %options.fixed.display(), "wrote fixed file");

    // Generation reads the fixed file back so both stay in step.
    let entries = parser::parse_fixed_file(&options.fixed).map_err(|e| PipelineError::Generate(e.to_string()))?;
    if entries.is_empty() {
        return Err(PipelineError::EmptyInput(options.fixed.clone()));
    }

    let pools = build_pools(&entries);
    info!(
        entries = entries.len(),
        kanji = pools.kanji.len(),
        kana = pools.kana.len(),
        meaning = pools.meaning.len(),
        "built distractor pools"
    );

    let outcome = generate_all_questions(&entries, &pools, &config, rng);

    let mut conn = db::create_db(&options.db, options.force)?;
    let saved = db::save_run(&mut conn, &entries, &outcome.questions)?;
    let stored_entries = db::count_rows(&conn, "entries")?;
    let stored_questions = db::count_rows(&conn, "questions")?;
    let samples = match options.sample_limit {
        Some(limit) => db::sample_questions(&conn, limit)?,
        None => Vec::new(),
    };
    drop(conn);

    let applied = options.chapter_file.as_ref().and_then(|path| {
        match chapters::apply_from_file(&options.db, path, options.level) {
            Ok(summary) => Some(summary),
            Err(ChapterError::Read(ParseError::NotFound(_))) => {
                debug!(path = %path.display(), "no chapter file, skipping level/chapter apply");
                None
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping level/chapter apply");
                None
            }
        }
    });

    Ok(RunReport {
        entries: entries.len(),
        kanji_pool: pools.kanji.len(),
        kana_pool: pools.kana.len(),
        meaning_pool: pools.meaning.len(),
        generated: outcome.questions.len(),
        skipped: outcome.skipped,
        saved,
        stored_entries,
        stored_questions,
        samples,
        applied,
    })
}

/// Apply level/chapter tags from `chapter_file` to an existing store.
pub fn apply_chapters_only(
    db_path: impl Into<PathBuf>,
    chapter_file: impl Into<PathBuf>,
    level: Option<Level>,
) -> Result<ApplySummary, PipelineError> {
    chapters::apply_from_file(db_path.into(), chapter_file.into(), level).map_err(PipelineError::Apply)
}
