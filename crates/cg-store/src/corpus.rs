//! Corpus loading for cohesion audits.
//!
//! Accepts a `.jsonl` file (one document per line), a `.json` file (an array
//! of documents or a single document), or a directory searched recursively
//! for both. Any malformed payload is fatal: a corpus that cannot be read in
//! full is not audited at all.

use std::fs;
use std::path::{Path, PathBuf};

use cg_core::{Document, is_truthy};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::journal::kind_of;

/// Load every document under `source`.
pub fn load_documents(source: &Path) -> Result<Vec<Document>> {
    if source.is_file() {
        return load_file(source);
    }
    if !source.is_dir() {
        return Err(StoreError::NotFound(source.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_files(source, &mut files)?;
    // .json before .jsonl, each group in path order
    files.sort_by(|a, b| (is_jsonl(a), a).cmp(&(is_jsonl(b), b)));

    let mut documents = Vec::new();
    for path in &files {
        let loaded = load_file(path)?;
        if loaded.is_empty() {
            tracing::warn!("{} contains no documents", path.display());
        }
        documents.extend(loaded);
    }
    if documents.is_empty() {
        return Err(StoreError::EmptySource(source.to_path_buf()));
    }
    tracing::debug!(
        "loaded {} documents from {} files under {}",
        documents.len(),
        files.len(),
        source.display()
    );
    Ok(documents)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let path = entry.path();
        // DirEntry::file_type does not follow symlinks
        let file_type = entry.file_type().map_err(|e| StoreError::io(&path, e))?;
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_symlink() && path.is_dir() {
            tracing::debug!("skipping directory symlink {}", path.display());
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json" | "jsonl")
        ) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("jsonl")
}

fn load_file(path: &Path) -> Result<Vec<Document>> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => StoreError::Parse {
            path: path.to_path_buf(),
            line: None,
            message: "file is not valid UTF-8".to_string(),
        },
        _ => StoreError::io(path, e),
    })?;
    let documents = parse_documents(path, &text)?;
    tracing::debug!("{}: {} documents", path.display(), documents.len());
    Ok(documents)
}

/// Parse corpus text as if read from `path`. The extension picks the
/// format: `.jsonl` is line-delimited, anything else is a single JSON value.
pub fn parse_documents(path: &Path, text: &str) -> Result<Vec<Document>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if is_jsonl(path) {
        let mut documents = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let payload = line.trim();
            if payload.is_empty() {
                continue;
            }
            let value: Value =
                serde_json::from_str(payload).map_err(|e| StoreError::Parse {
                    path: path.to_path_buf(),
                    line: Some(line_no),
                    message: e.to_string(),
                })?;
            documents.push(document_from_payload(
                value,
                format!("{file_name}:{line_no}"),
            )?);
        }
        return Ok(documents);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        line: None,
        message: e.to_string(),
    })?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| document_from_payload(item, format!("{file_name}:{idx}")))
            .collect(),
        other => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(file_name);
            Ok(vec![document_from_payload(other, stem)?])
        }
    }
}

/// Build a document from one payload. `fallback_id` names the payload's
/// position and is used when it carries no usable `doc_id` or `id`.
fn document_from_payload(payload: Value, fallback_id: String) -> Result<Document> {
    let invalid = |message: String| StoreError::InvalidDocument {
        origin: fallback_id.clone(),
        message,
    };

    let mut fields = match payload {
        Value::Object(fields) => fields,
        other => {
            return Err(invalid(format!(
                "document payload must be an object, got {}",
                kind_of(&other)
            )));
        }
    };

    let chunks = match fields.remove("chunks") {
        None => return Err(invalid("document payload missing 'chunks' field".to_string())),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(invalid(format!(
                    "'chunks' must be a list of strings, found {}",
                    kind_of(&other)
                ))),
            })
            .collect::<Result<Vec<String>>>()?,
        Some(other) => {
            return Err(invalid(format!(
                "'chunks' must be a list of strings, got {}",
                kind_of(&other)
            )));
        }
    };

    let doc_id = ["doc_id", "id"]
        .iter()
        .filter_map(|key| fields.get(*key))
        .find(|v| is_truthy(v))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| fallback_id.clone());

    Ok(Document::new(doc_id, chunks))
}
