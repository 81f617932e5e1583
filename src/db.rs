//! Database operations for entry and question storage

use crate::chapters::Level;
use crate::entry::Entry;
use crate::error::DbError;
use crate::questions::{Direction, Question};
use chrono::Utc;
use rusqlite::{params, Connection, Transaction};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, DbError>;

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema, including level/chapter tagging columns.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS n_level (
    id INTEGER PRIMARY KEY,
    level TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list_index INTEGER,
    kanji TEXT,
    kana TEXT,
    meaning TEXT,
    level INTEGER REFERENCES n_level(id),
    chapter INTEGER
);

CREATE TABLE IF NOT EXISTS quizzes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id INTEGER REFERENCES entries(id) ON DELETE CASCADE,
    quiz_id INTEGER REFERENCES quizzes(id) ON DELETE SET NULL,
    q_type TEXT,
    prompt TEXT,
    text TEXT,
    options TEXT,
    correct_answer TEXT,
    correct_index INTEGER,
    level INTEGER REFERENCES n_level(id),
    chapter INTEGER,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_entries_list_index ON entries(list_index);
CREATE INDEX IF NOT EXISTS idx_questions_entry_id ON questions(entry_id);
"#;

/// Created after migration, since older stores may lack `questions.level`.
const LEVEL_CHAPTER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_questions_level_chapter ON questions(level, chapter)";

/// Tables that may be counted by name.
const COUNTABLE_TABLES: &[&str] = &["entries", "questions", "quizzes", "n_level"];

/// Question row read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredQuestion {
    pub id: i64,
    pub entry_id: Option<i64>,
    pub q_type: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub correct_index: Option<usize>,
}

impl StoredQuestion {
    pub fn direction(&self) -> Option<Direction> {
        self.q_type.parse().ok()
    }
}

/// Row counts written by [`save_run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub entries: usize,
    pub questions: usize,
}

/// Create (or open) the store at `db_path` and bring its schema up to date.
///
/// With `force`, an existing file is removed first.
pub fn create_db(db_path: impl AsRef<Path>, force: bool) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if force && db_path.exists() {
        info!(path = %db_path.display(), "removing existing database");
        fs::remove_file(db_path)?;
    }
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory store with the full schema (for testing).
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the schema and run pending migrations.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    seed_levels(conn)?;
    migrate(conn)?;
    conn.execute_batch(LEVEL_CHAPTER_INDEX)?;
    Ok(())
}

/// Insert the canonical level rows (1 -> n5 .. 5 -> n1).
pub fn seed_levels(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("INSERT OR REPLACE INTO n_level (id, level) VALUES (?1, ?2)")?;
    for level in Level::ALL {
        stmt.execute(params![level.id(), level.as_str()])?;
    }
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}

/// One-time migration for stores created before level/chapter tagging existed.
fn migrate(conn: &Connection) -> Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    for table in ["entries", "questions"] {
        for column in ["level", "chapter"] {
            if !column_exists(conn, table, column)? {
                debug!(table, column, "adding missing column");
                conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} INTEGER", table, column))?;
            }
        }
    }

    conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
    Ok(())
}

// ============= Inserts =============

/// Insert entries in order. Returns the assigned row ids.
pub fn insert_entries(tx: &Transaction<'_>, entries: &[Entry]) -> Result<Vec<i64>> {
    let mut stmt =
        tx.prepare("INSERT INTO entries (list_index, kanji, kana, meaning) VALUES (?1, ?2, ?3, ?4)")?;

    let mut ids = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        stmt.execute(params![
            (i + 1) as i64,
            non_empty(&entry.kanji),
            non_empty(&entry.kana),
            non_empty(&entry.meaning),
        ])?;
        ids.push(tx.last_insert_rowid());
    }
    Ok(ids)
}

/// Insert questions, mapping each 1-based `entry_index` onto `entry_ids`.
pub fn insert_questions(tx: &Transaction<'_>, questions: &[Question], entry_ids: &[i64]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO questions
         (entry_id, quiz_id, q_type, prompt, text, options, correct_answer, correct_index, level, chapter, created_at)
         VALUES (?1, NULL, ?2, ?3, ?4, ?5, ?6, ?7, NULL, NULL, ?8)",
    )?;
    let created_at = Utc::now().to_rfc3339();

    let mut count = 0;
    for q in questions {
        let entry_id = q
            .entry_index
            .checked_sub(1)
            .and_then(|i| entry_ids.get(i))
            .copied();
        let options_json = serde_json::to_string(&q.options)?;

        stmt.execute(params![
            entry_id,
            q.direction.tag(),
            q.prompt,
            q.text,
            options_json,
            q.correct_answer,
            q.correct_index as i64,
            created_at,
        ])?;
        count += 1;
    }
    Ok(count)
}

/// Store entries and their questions in a single transaction.
pub fn save_run(conn: &mut Connection, entries: &[Entry], questions: &[Question]) -> Result<SaveSummary> {
    let tx = conn.transaction()?;
    let ids = insert_entries(&tx, entries)?;
    let saved = insert_questions(&tx, questions, &ids)?;
    tx.commit()?;

    info!(entries = ids.len(), questions = saved, "saved run");
    Ok(SaveSummary {
        entries: ids.len(),
        questions: saved,
    })
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

// ============= Queries =============

/// First `limit` questions by id.
pub fn sample_questions(conn: &Connection, limit: usize) -> Result<Vec<StoredQuestion>> {
    let mut stmt = conn.prepare(
        "SELECT id, entry_id, q_type, prompt, options, correct_answer, correct_index
         FROM questions ORDER BY id LIMIT ?1",
    )?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                row.get::<_, Option<i64>>(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, entry_id, q_type, prompt, options, correct_answer, correct_index)| -> Result<StoredQuestion> {
            let options = match options {
                Some(json) => serde_json::from_str(&json)?,
                None => Vec::new(),
            };
            Ok(StoredQuestion {
                id,
                entry_id,
                q_type,
                prompt,
                options,
                correct_answer,
                correct_index: correct_index.and_then(|i| usize::try_from(i).ok()),
            })
        })
        .collect()
}

/// Row count of one of the known tables.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    if !COUNTABLE_TABLES.contains(&table) {
        return Err(DbError::UnknownTable(table.to_string()));
    }
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count)
}
