//! Error types for each pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing vocabulary text files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ParseError::NotFound(path)
        } else {
            ParseError::Io { path, source }
        }
    }
}

/// Database error types.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid options json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown table: {0}")]
    UnknownTable(String),
}

/// Invalid generation settings or question data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("a question needs at least 2 options, got {0}")]
    TooFewOptions(usize),

    #[error("unknown question type: {0}")]
    UnknownDirection(String),
}

/// Errors while resolving or applying level/chapter metadata.
#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("level header (n5..n1) not found at top of chapter file and no level given")]
    MissingLevel,

    #[error("invalid level '{0}'; expected one of n5, n4, n3, n2, n1")]
    UnknownLevel(String),

    #[error("database file not found: {}", .0.display())]
    MissingDatabase(PathBuf),

    #[error(transparent)]
    Read(#[from] ParseError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rusqlite::Error> for ChapterError {
    fn from(err: rusqlite::Error) -> Self {
        ChapterError::Db(DbError::Sqlite(err))
    }
}

/// Top-level failure of a command run, one variant per stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to parse input file: {0}")]
    Parse(#[source] ParseError),

    #[error("no entries were parsed from {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("failed to write fixed file: {0}")]
    Write(#[source] ParseError),

    #[error("generation failed: {0}")]
    Generate(String),

    #[error("applying chapters failed: {0}")]
    Apply(#[source] ChapterError),
}

impl PipelineError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::EmptyInput(_) => 1,
            PipelineError::Parse(_) => 2,
            PipelineError::Write(_) => 3,
            PipelineError::Generate(_) => 4,
            PipelineError::Apply(_) => 5,
        }
    }
}

impl From<GenerateError> for PipelineError {
    fn from(err: GenerateError) -> Self {
        PipelineError::Generate(err.to_string())
    }
}

impl From<DbError> for PipelineError {
    fn from(err: DbError) -> Self {
        PipelineError::Generate(err.to_string())
    }
}
