//! Kotoba Core - Japanese vocabulary quiz generation
//!
//! Parses kanji/kana/meaning lists, normalizes them into a numbered fixed
//! format, generates multiple-choice questions, and stores everything in SQLite.

pub mod chapters;
pub mod cli;
pub mod db;
pub mod entry;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod pools;
pub mod questions;

pub use chapters::{apply_level_and_chapters, parse_chapters, read_level_header, ApplySummary, ChapterFile, Level};
pub use db::{create_db, insert_entries, insert_questions, sample_questions, save_run, SaveSummary, StoredQuestion};
pub use entry::{Entry, Field};
pub use error::{ChapterError, DbError, GenerateError, ParseError, PipelineError};
pub use parser::{parse_fixed, parse_fixed_file, parse_raw, parse_raw_file, write_fixed_file};
pub use pipeline::{run_generation, RunOptions, RunReport};
pub use pools::{build_pools, Pools};
pub use questions::{generate_all_questions, Direction, GenerationConfig, GenerationOutcome, Question};
