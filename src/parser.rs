//! Parsing of raw vocabulary lists and the numbered fixed format
//!
//! # Raw format
//! ```text
//! 火, ひ, fire
//! みず, water
//! 12. 木, き, tree, wood
//! ```
//!
//! # Fixed format
//! ```text
//! 1.   火, ひ, fire
//! 2.   , みず, water
//! ```

use crate::entry::Entry;
use crate::error::ParseError;
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static KANA_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{31F0}-\x{31FF}\x{30FC}\x{30FB}\x{309D}\x{309E}\s]+$")
        .unwrap()
});

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s*(.*)$").unwrap());

// A list number needs whitespace after the dot; "1.5倍" is data.
static LIST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s+").unwrap());

/// True if the string is non-empty and contains only kana (plus whitespace).
pub fn is_kana_only(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && KANA_ONLY.is_match(s)
}

/// Split into at most three comma-separated, trimmed parts.
fn split_fields(s: &str) -> Vec<&str> {
    s.splitn(3, ',').map(str::trim).collect()
}

/// Parse one raw line. Returns `None` for headers and lines with nothing usable.
fn parse_raw_line(raw: &str) -> Option<Entry> {
    let mut line = raw.trim();
    if line.is_empty() || !line.contains(',') {
        return None;
    }
    if let Some(m) = LIST_NUMBER.find(line) {
        line = &line[m.end()..];
    }
    let line = line.trim_end_matches(',');

    let parts: Vec<&str> = split_fields(line)
        .into_iter()
        .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("nan"))
        .collect();

    let entry = match parts.as_slice() {
        [kanji, kana, meaning, ..] => Entry::new(kanji, kana, meaning),
        [a, b] if is_kana_only(a) => Entry::new("", a, b),
        [a, b] => Entry::new(a, b, ""),
        [a] if is_kana_only(a) => Entry::new("", a, ""),
        [a] => Entry::new("", "", a),
        [] => return None,
    };
    Some(entry)
}

/// Parse a raw, loosely structured vocabulary list.
pub fn parse_raw(text: &str) -> Vec<Entry> {
    text.lines().filter_map(parse_raw_line).collect()
}

/// Read and parse a raw vocabulary file.
pub fn parse_raw_file(path: impl AsRef<Path>) -> Result<Vec<Entry>, ParseError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    Ok(parse_raw(&text))
}

/// Parse the numbered fixed format. Lines without a leading `N.` are skipped.
pub fn parse_fixed(text: &str) -> Vec<Entry> {
    text.lines()
        .filter_map(|line| NUMBERED_LINE.captures(line.trim()))
        .map(|caps| {
            let rest = caps.get(2).map_or("", |m| m.as_str().trim());
            let mut parts = split_fields(rest);
            parts.resize(3, "");
            Entry::new(parts[0], parts[1], parts[2])
        })
        .collect()
}

/// Read and parse a fixed file.
pub fn parse_fixed_file(path: impl AsRef<Path>) -> Result<Vec<Entry>, ParseError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    Ok(parse_fixed(&text))
}

/// Render entries in the fixed format, numbered from 1.
pub fn render_fixed(entries: &[Entry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}.   {}, {}, {}",
            i + 1,
            entry.kanji.trim(),
            entry.kana.trim(),
            entry.meaning.trim()
        );
    }
    out
}

/// Write entries to `path` in the fixed format.
pub fn write_fixed_file(entries: &[Entry], path: impl AsRef<Path>) -> Result<(), ParseError> {
    let path = path.as_ref();
    fs::write(path, render_fixed(entries)).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
