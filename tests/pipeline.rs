use kotoba_core::pipeline::{apply_chapters_only, rng_from_seed};
use kotoba_core::{db, parse_fixed_file, run_generation, Level, PipelineError, RunOptions};
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RAW: &str = "\
Chapter 1
火, ひ, fire
水, みず, water,
木, き, tree, wood
金, きん, money
nan, つち, soil
そら, sky
山, やま
";

const ANNOTATED: &str = "\
n4
{
1.   火, ひ, fire
2.   水, みず, water
3.   木, き, tree, wood
}
{
4.   金, きん, money
5.   , つち, soil
6.   , そら, sky
7.   山, やま,
}
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("raw.txt"), RAW).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn options(&self) -> RunOptions {
        RunOptions::new(self.path("raw.txt"), self.path("fixed.txt"), self.path("q.db"))
    }
}

fn query_i64(db: &Path, sql: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

#[test]
fn full_run_writes_fixed_file_and_database() {
    let ws = Workspace::new();
    let mut options = ws.options();
    options.sample_limit = Some(5);

    let report = run_generation(&options, &mut rng_from_seed(Some(7))).unwrap();

    let fixed = fs::read_to_string(ws.path("fixed.txt")).unwrap();
    assert_eq!(
        fixed,
        "1.   火, ひ, fire\n2.   水, みず, water\n3.   木, き, tree, wood\n4.   金, きん, money\n\
         5.   , つち, soil\n6.   , そら, sky\n7.   山, やま, \n"
    );
    assert_eq!(parse_fixed_file(ws.path("fixed.txt")).unwrap().len(), 7);

    assert_eq!(report.entries, 7);
    assert_eq!(report.saved.entries, 7);
    assert_eq!(report.saved.questions, report.generated);
    assert_eq!(report.samples.len(), 5);
    assert!(report.applied.is_none());

    let db = ws.path("q.db");
    assert_eq!(query_i64(&db, "SELECT COUNT(*) FROM entries"), 7);
    assert_eq!(query_i64(&db, "SELECT COUNT(*) FROM questions"), report.generated as i64);
    assert_eq!(query_i64(&db, "SELECT COUNT(*) FROM entries WHERE kanji IS NULL"), 2);
    assert_eq!(
        query_i64(&db, "SELECT COUNT(*) FROM questions WHERE entry_id NOT IN (SELECT id FROM entries)"),
        0
    );
}

#[test]
fn stored_questions_keep_their_invariants() {
    let ws = Workspace::new();
    let mut options = ws.options();
    options.sample_limit = Some(1000);

    let report = run_generation(&options, &mut rng_from_seed(Some(3))).unwrap();
    assert_eq!(report.samples.len(), report.generated);
    for q in &report.samples {
        let idx = q.correct_index.unwrap();
        assert_eq!(q.options.len(), 4);
        assert_eq!(q.options[idx], q.correct_answer);
        assert!(q.direction().is_some());
    }
}

#[test]
fn same_seed_same_database_contents() {
    let first = Workspace::new();
    let second = Workspace::new();
    run_generation(&first.options(), &mut rng_from_seed(Some(42))).unwrap();
    run_generation(&second.options(), &mut rng_from_seed(Some(42))).unwrap();

    let dump = |ws: &Workspace| {
        let conn = db::create_db(ws.path("q.db"), false).unwrap();
        db::sample_questions(&conn, 1000).unwrap()
    };
    assert_eq!(dump(&first), dump(&second));
}

#[test]
fn rerun_without_force_appends_and_force_resets() {
    let ws = Workspace::new();
    let mut options = ws.options();
    let first = run_generation(&options, &mut rng_from_seed(Some(1))).unwrap();
    let second = run_generation(&options, &mut rng_from_seed(Some(1))).unwrap();
    assert_eq!(query_i64(&ws.path("q.db"), "SELECT COUNT(*) FROM entries"), 14);
    assert_eq!(second.saved.entries, 7);
    assert_eq!(second.stored_entries, 14);
    assert_eq!(second.stored_questions, first.stored_questions * 2);

    options.force = true;
    let reset = run_generation(&options, &mut rng_from_seed(Some(1))).unwrap();
    assert_eq!(query_i64(&ws.path("q.db"), "SELECT COUNT(*) FROM entries"), 7);
    assert_eq!(reset.stored_entries, 7);
}

#[test]
fn chapters_are_applied_after_generation() {
    let ws = Workspace::new();
    fs::write(ws.path("chapters.txt"), ANNOTATED).unwrap();
    let mut options = ws.options();
    options.chapter_file = Some(ws.path("chapters.txt"));

    let report = run_generation(&options, &mut rng_from_seed(Some(5))).unwrap();
    let applied = report.applied.unwrap();
    assert_eq!(applied.level, Some(Level::N4));
    assert_eq!(applied.chapters, 2);
    assert_eq!(applied.entries_chapter_updated, 7);

    let db = ws.path("q.db");
    assert_eq!(query_i64(&db, "SELECT COUNT(*) FROM entries WHERE level = 2"), 7);
    assert_eq!(query_i64(&db, "SELECT chapter FROM entries WHERE list_index = 4"), 2);
    assert_eq!(
        query_i64(
            &db,
            "SELECT COUNT(*) FROM questions q JOIN entries e ON e.id = q.entry_id WHERE q.chapter IS NOT e.chapter"
        ),
        0
    );
}

#[test]
fn missing_chapter_file_does_not_fail_generation() {
    let ws = Workspace::new();
    let mut options = ws.options();
    options.chapter_file = Some(ws.path("absent.txt"));
    let report = run_generation(&options, &mut rng_from_seed(Some(5))).unwrap();
    assert!(report.applied.is_none());
}

#[test]
fn unusable_chapter_file_does_not_fail_generation() {
    let ws = Workspace::new();
    fs::write(ws.path("chapters.txt"), "{\n1. 火\n}\n").unwrap();
    let mut options = ws.options();
    options.chapter_file = Some(ws.path("chapters.txt"));

    let report = run_generation(&options, &mut rng_from_seed(Some(5))).unwrap();
    assert!(report.applied.is_none());
    assert_eq!(query_i64(&ws.path("q.db"), "SELECT COUNT(*) FROM entries WHERE level IS NOT NULL"), 0);
}

#[test]
fn apply_only_uses_flag_when_header_missing() {
    let ws = Workspace::new();
    run_generation(&ws.options(), &mut rng_from_seed(Some(2))).unwrap();
    fs::write(ws.path("chapters.txt"), "{\n1. 火\n}\n{\n2. 水\n}\n").unwrap();

    let err = apply_chapters_only(ws.path("q.db"), ws.path("chapters.txt"), None).unwrap_err();
    assert!(matches!(err, PipelineError::Apply(_)));
    assert_eq!(err.exit_code(), 5);

    let summary = apply_chapters_only(ws.path("q.db"), ws.path("chapters.txt"), Some(Level::N1)).unwrap();
    assert_eq!(summary.entries_level_updated, 7);
    assert_eq!(summary.entries_chapter_updated, 2);
    assert_eq!(query_i64(&ws.path("q.db"), "SELECT chapter FROM entries WHERE list_index = 2"), 2);
    assert_eq!(query_i64(&ws.path("q.db"), "SELECT MAX(level) FROM questions"), 5);
}
