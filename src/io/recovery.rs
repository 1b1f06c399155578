use std::fmt::{self, Write as _};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Maximum size of the recovery log before old entries are pruned (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Entries older than this are dropped when the log outgrows MAX_LOG_SIZE.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- tasklist recovery log: append-only record of recoverable failures
     (discarded storage records, render errors, failed writes).
     Safe to delete. -->

---
";

/// Separator between timestamp and category in an entry header.
const HEADER_SEP: &str = " - ";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Stored data could not be parsed or had to be repaired
    Parser,
    /// The markdown renderer failed for a task's details
    Render,
    /// A persistence write was rejected
    Write,
    /// A selection pointed at a task that no longer exists
    Selection,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Parser => write!(f, "parser"),
            RecoveryCategory::Render => write!(f, "render"),
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Selection => write!(f, "selection"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "parser" => Some(RecoveryCategory::Parser),
            "render" => Some(RecoveryCategory::Render),
            "write" => Some(RecoveryCategory::Write),
            "selection" => Some(RecoveryCategory::Selection),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    /// Entry stamped with the current time, no fields and no body.
    pub fn now(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// Return the path to the recovery log file.
pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Markdown block as it appears in the log: a `##` header line, the fields,
/// an optional fenced body, and a `---` terminator.
impl fmt::Display for RecoveryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stamp = self
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        writeln!(f, "## {}{}{}: {}", stamp, HEADER_SEP, self.category, self.description)?;
        writeln!(f)?;
        for (key, value) in &self.fields {
            writeln!(f, "{}: {}", key, value)?;
        }
        if !self.body.is_empty() {
            writeln!(f)?;
            writeln!(f, "```text")?;
            writeln!(f, "{}", self.body.strip_suffix('\n').unwrap_or(&self.body))?;
            writeln!(f, "```")?;
        }
        writeln!(f)?;
        writeln!(f, "---")
    }
}

/// Append a recovery entry to the log. Errors are swallowed and printed to stderr.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(&recovery_log_path(data_dir), &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(path: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let size = std::fs::metadata(path).map_or(0, |m| m.len());
    let size = if size > MAX_LOG_SIZE {
        prune_file(path)?
    } else {
        size
    };

    let mut block = String::new();
    if size == 0 {
        block.push_str(FILE_HEADER);
    }
    // Formatting into a String cannot fail
    let _ = write!(block, "{}", entry);

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(block.as_bytes())
}

/// Rewrite the log without entries older than PRUNE_AGE_DAYS. Returns the new size.
fn prune_file(path: &Path) -> io::Result<u64> {
    let content = std::fs::read_to_string(path)?;
    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let kept = prune_entries_before(&content, &cutoff);
    if kept.len() < content.len() {
        atomic_write(path, kept.as_bytes())?;
    }
    Ok(kept.len() as u64)
}

/// Read recovery entries from the log file, most recent first.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(data_dir)) else {
        return Vec::new();
    };
    let (_, blocks) = split_log(&content);
    blocks
        .into_iter()
        .rev()
        .filter_map(parse_entry)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Split log content into the file header and one raw block per entry.
/// A `## ` line inside a fenced body does not start a new block.
fn split_log(content: &str) -> (&str, Vec<&str>) {
    let mut starts = Vec::new();
    let mut offset = 0;
    let mut fenced = false;
    for line in content.split_inclusive('\n') {
        if line.starts_with("```") {
            fenced = !fenced;
        } else if !fenced && line.starts_with("## ") {
            starts.push(offset);
        }
        offset += line.len();
    }

    let Some(&first) = starts.first() else {
        return (content, Vec::new());
    };
    let blocks = starts
        .iter()
        .zip(starts.iter().skip(1).chain([&content.len()]))
        .map(|(&from, &to)| &content[from..to])
        .collect();
    (&content[..first], blocks)
}

/// Parse one raw entry block. Blocks with an unreadable header are skipped.
fn parse_entry(block: &str) -> Option<RecoveryEntry> {
    let mut lines = block.lines();
    let header = lines.next()?.strip_prefix("## ")?;
    let (timestamp, category, description) = parse_entry_header(header)?;

    let mut entry = RecoveryEntry {
        timestamp,
        category,
        description,
        fields: Vec::new(),
        body: String::new(),
    };
    let mut body: Option<Vec<&str>> = None;
    for line in lines {
        match body.as_mut() {
            Some(body_lines) if line == "```" => {
                entry.body = body_lines.join("\n");
                body = None;
            }
            Some(body_lines) => body_lines.push(line),
            None if line.starts_with("```") => body = Some(Vec::new()),
            None if line == "---" => break,
            None => {
                if let Some((key, value)) = line.trim().split_once(": ") {
                    entry.fields.push((key.to_string(), value.to_string()));
                }
            }
        }
    }
    Some(entry)
}

/// Parse an entry header: `<timestamp> - <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (stamp, rest) = header.split_once(HEADER_SEP)?;
    let timestamp = DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc);
    let (category, description) = rest.split_once(": ")?;
    Some((
        timestamp,
        RecoveryCategory::parse_category(category)?,
        description.to_string(),
    ))
}

/// Drop entries stamped before `cutoff` (and unreadable ones), keeping the
/// file header.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> String {
    let (header, blocks) = split_log(content);
    let mut kept = header.to_string();
    for block in blocks {
        let fresh = block
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("## "))
            .and_then(parse_entry_header)
            .is_some_and(|(ts, _, _)| ts >= *cutoff);
        if fresh {
            kept.push_str(block);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use tempfile::TempDir;

    fn discard(raw: &str) -> RecoveryEntry {
        RecoveryEntry::now(RecoveryCategory::Parser, "discarded unparsable task collection")
            .field("Key", "todoTasks")
            .body(raw)
    }

    #[test]
    fn entry_renders_as_markdown_block() {
        let md = discard("[{").to_string();
        assert!(md.starts_with("## "));
        assert!(md.contains(" - parser: discarded unparsable task collection\n"));
        assert!(md.contains("\nKey: todoTasks\n"));
        assert!(md.contains("```text\n[{\n```\n"));
        assert!(md.ends_with("\n---\n"));

        let bare = RecoveryEntry::now(RecoveryCategory::Selection, "selected task no longer exists")
            .field("Task", "abc")
            .to_string();
        assert!(!bare.contains("```"));
    }

    #[test]
    fn logged_entries_read_back_newest_first() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), discard("not json"));
        log_recovery(
            tmp.path(),
            RecoveryEntry::now(RecoveryCategory::Write, "task collection not saved")
                .field("Key", "todoTasks")
                .field("Error", "quota exceeded")
                .body("[{\"id\":\"1\"}]\nsecond line\n"),
        );

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert_eq!(
            entries[0].fields,
            vec![
                ("Key".to_string(), "todoTasks".to_string()),
                ("Error".to_string(), "quota exceeded".to_string()),
            ]
        );
        assert_eq!(entries[0].body, "[{\"id\":\"1\"}]\nsecond line");
        assert_eq!(entries[1].body, "not json");
        // Second precision survives the round trip
        assert_eq!(entries[1].timestamp.nanosecond(), 0);
    }

    #[test]
    fn limit_keeps_the_newest() {
        let tmp = TempDir::new().unwrap();
        for id in ["a", "b", "c", "d"] {
            log_recovery(
                tmp.path(),
                RecoveryEntry::now(RecoveryCategory::Render, "details could not be rendered")
                    .field("Task", id),
            );
        }
        let tasks: Vec<String> = read_recovery_entries(tmp.path(), Some(2))
            .into_iter()
            .map(|e| e.fields[0].1.clone())
            .collect();
        assert_eq!(tasks, vec!["d", "c"]);
    }

    #[test]
    fn markdown_headings_in_body_stay_in_the_entry() {
        let tmp = TempDir::new().unwrap();
        log_recovery(
            tmp.path(),
            RecoveryEntry::now(RecoveryCategory::Render, "details could not be rendered")
                .body("## Shopping\n\n- eggs\n---\nmore"),
        );
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, "## Shopping\n\n- eggs\n---\nmore");
    }

    #[test]
    fn header_written_once() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), discard("x"));
        log_recovery(tmp.path(), discard("y"));
        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- tasklist recovery log"));
        assert_eq!(content.matches("<!--").count(), 1);
    }

    #[test]
    fn missing_log_reads_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("storage.json");
        atomic_write(&path, b"{\"a\":\"1\"}").unwrap();
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn header_parsing() {
        let (_, category, description) =
            parse_entry_header("2026-02-10T14:32:05Z - write: setting not saved").unwrap();
        assert_eq!(category, RecoveryCategory::Write);
        assert_eq!(description, "setting not saved");
        assert!(parse_entry_header("no separator here").is_none());
        assert!(parse_entry_header("2026-02-10T14:32:05Z - conflict: old category").is_none());
    }

    #[test]
    fn prune_drops_old_entries_only() {
        let old = RecoveryEntry {
            timestamp: Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS + 5),
            ..discard("old")
        };
        let content = format!("{}{}{}", FILE_HEADER, old, discard("new"));

        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        let pruned = prune_entries_before(&content, &cutoff);
        let (header, blocks) = split_log(&pruned);
        assert_eq!(header, FILE_HEADER);
        assert_eq!(blocks.len(), 1);
        assert_eq!(parse_entry(blocks[0]).unwrap().body, "new");
    }

    #[test]
    fn categories_round_trip() {
        for cat in [
            RecoveryCategory::Parser,
            RecoveryCategory::Render,
            RecoveryCategory::Write,
            RecoveryCategory::Selection,
        ] {
            assert_eq!(RecoveryCategory::parse_category(&cat.to_string()), Some(cat));
        }
    }
}
