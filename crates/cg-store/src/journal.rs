//! Streaming JSONL journal reader.
//!
//! The file is read line by line and only the trailing `window` entries are
//! retained, so memory tracks the window rather than the file. Every line is
//! still parsed: a malformed line anywhere aborts the read.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cg_core::Entry;
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Read the last `window` entries of a JSONL journal in file order.
/// `window == 0` keeps every entry. Blank lines are skipped but still count
/// toward line numbers.
pub fn read_window(path: &Path, window: usize) -> Result<Vec<Entry>> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut kept: VecDeque<Entry> = VecDeque::with_capacity(window.min(4096));
    let mut total = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => StoreError::Parse {
                path: path.to_path_buf(),
                line: Some(line_no),
                message: "line is not valid UTF-8".to_string(),
            },
            _ => StoreError::io(path, e),
        })?;
        let payload = line.trim();
        if payload.is_empty() {
            continue;
        }
        let entry = parse_line(path, line_no, payload)?;
        total += 1;
        if window > 0 && kept.len() == window {
            kept.pop_front();
        }
        kept.push_back(entry);
    }

    tracing::debug!(
        "read {} of {total} entries from {}",
        kept.len(),
        path.display()
    );
    Ok(kept.into())
}

/// Read every entry of a JSONL journal.
pub fn read_all(path: &Path) -> Result<Vec<Entry>> {
    read_window(path, 0)
}

fn parse_line(path: &Path, line_no: usize, payload: &str) -> Result<Entry> {
    let value: Value = serde_json::from_str(payload).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        line: Some(line_no),
        message: e.to_string(),
    })?;
    match value {
        Value::Object(fields) => Ok(Entry::new(line_no, fields)),
        other => Err(StoreError::Parse {
            path: path.to_path_buf(),
            line: Some(line_no),
            message: format!("expected a JSON object, got {}", kind_of(&other)),
        }),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn journal(lines: &[&str]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        f
    }

    #[test]
    fn test_read_all_skips_blank_lines() {
        let f = journal(&[r#"{"facet":"a"}"#, "", "   ", r#"{"facet":"b"}"#]);
        let entries = read_all(f.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line, 1);
        assert_eq!(entries[1].line, 4);
        assert_eq!(entries[1].facet(), Some("b"));
    }

    #[test]
    fn test_window_keeps_tail_in_order() {
        let lines: Vec<String> = (1..=6).map(|i| format!(r#"{{"n":{i}}}"#)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let f = journal(&refs);
        let entries = read_window(f.path(), 3).unwrap();
        let lines: Vec<usize> = entries.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![4, 5, 6]);
    }

    #[test]
    fn test_window_larger_than_file() {
        let f = journal(&[r#"{"n":1}"#]);
        assert_eq!(read_window(f.path(), 50).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_line_aborts_with_line_number() {
        let f = journal(&[r#"{"n":1}"#, "{not json", r#"{"n":3}"#]);
        let err = read_window(f.path(), 1).unwrap_err();
        match &err {
            StoreError::Parse { line, .. } => assert_eq!(*line, Some(2)),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(err.to_string().contains(":2 invalid JSON"));
    }

    #[test]
    fn test_non_object_line_is_parse_error() {
        let f = journal(&[r#"[1, 2]"#]);
        let err = read_all(f.path()).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, got an array"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_all(Path::new("/definitely/not/here.jsonl")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let f = journal(&[r#"{"mirror":"m","marks":[{"k":1}],"∆":-1}"#]);
        let entries = read_all(f.path()).unwrap();
        assert_eq!(entries[0].fields["marks"][0]["k"], 1);
        assert_eq!(entries[0].metric_value(cg_core::Metric::Delta), Some(-1.0));
    }
}
