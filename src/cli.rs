//! CLI argument definitions

use crate::chapters::Level;
use crate::pipeline::RunOptions;
use crate::questions::DEFAULT_MIN_OPTIONS;
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for kotoba
#[derive(Parser, Debug)]
#[command(name = "kotoba")]
#[command(author, version, about = "Normalize a Japanese vocabulary list and generate multiple-choice questions")]
#[command(long_about = r#"
Kotoba reads a loosely formatted kanji/kana/meaning list, writes it back as a
numbered fixed file, and stores entries plus up to six multiple-choice
questions per entry in an SQLite database.

Question types:
  kanji -> hiragana, kanji -> meaning, kana -> meaning,
  kana -> kanji, meaning -> kanji, meaning -> kana

After generation, level and chapter tags are applied from --fixed-chapters
when that file exists. Its first line may name the level (n5..n1) and each
{ ... } block is one chapter.

Exit codes: 1 empty input, 2 parse failure, 3 write failure,
4 generation failure, 5 chapter apply failure.

Example:
  kotoba -i n3.txt -f n3_fixed.txt -d n3.db --seed 7 --force --show-sample
  kotoba --apply-chapters -d n3.db --fixed-chapters n3_numbered.txt --level n3
"#)]
pub struct Cli {
    /// Raw input file
    #[arg(short, long, value_name = "PATH", default_value = "vocab.txt")]
    pub input: PathBuf,

    /// Fixed numbered output file
    #[arg(short, long, value_name = "PATH", default_value = "vocab_fixed.txt")]
    pub fixed: PathBuf,

    /// SQLite database path
    #[arg(short, long, value_name = "PATH", default_value = "vocab_questions.db")]
    pub db: PathBuf,

    /// Random seed for reproducible distractor sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Options per question (one correct answer plus distractors)
    #[arg(long, default_value_t = DEFAULT_MIN_OPTIONS)]
    pub min_options: usize,

    /// Remove an existing database before writing
    #[arg(long)]
    pub force: bool,

    /// Print sample questions after generation
    #[arg(long)]
    pub show_sample: bool,

    /// Number of questions printed by --show-sample
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub sample_limit: usize,

    /// Only apply level/chapter tags from --fixed-chapters to --db
    #[arg(long)]
    pub apply_chapters: bool,

    /// Level used when the chapter file has no header (n5..n1)
    #[arg(long, value_parser = parse_level)]
    pub level: Option<Level>,

    /// Chapter-annotated numbered file
    #[arg(long, value_name = "PATH", default_value = "vocab_numbered_fixed.txt")]
    pub fixed_chapters: PathBuf,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|e: crate::error::ChapterError| e.to_string())
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            input: self.input.clone(),
            fixed: self.fixed.clone(),
            db: self.db.clone(),
            min_options: self.min_options,
            force: self.force,
            sample_limit: self.show_sample.then_some(self.sample_limit),
            chapter_file: Some(self.fixed_chapters.clone()),
            level: self.level,
        }
    }

    /// Default log filter for the `-v` count.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
