use crate::{Result, StoreError};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

/// A JSON object document. Keys keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the raw file contents of `file`. Anything other than a JSON
    /// object is rejected.
    pub fn parse(file: &str, bytes: &[u8]) -> Result<Document> {
        let value: Value = serde_json::from_slice(bytes).map_err(|source| StoreError::Parse {
            file: file.to_string(),
            source,
        })?;
        match value {
            Value::Object(entries) => Ok(Document { entries }),
            _ => Err(StoreError::NotAnObject {
                file: file.to_string(),
            }),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.entries)?)
    }

    /// Presence is decided by existence, so `null`, `false`, `0` and `""`
    /// are all returned.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: String, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        // shift_remove keeps the order of the remaining keys
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }
}

/// A document name checked against the store root. `name` is the canonical
/// spelling (`./a.json` and `a.json` both become `a.json`) and is what the
/// catalog and the lock table key on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    pub name: String,
    pub path: PathBuf,
}

/// Resolves a document name against the store root, refusing names that
/// would escape it. Dot-prefixed components are refused too; they are kept
/// for the store's temporary files.
pub fn resolve(root: &Path, file: &str) -> Result<DocumentPath> {
    let invalid = || StoreError::InvalidName {
        file: file.to_string(),
    };

    let mut parts = Vec::new();
    for component in Path::new(file).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(invalid)?;
                if part.starts_with('.') {
                    return Err(invalid());
                }
                parts.push(part);
            }
            _ => return Err(invalid()),
        }
    }
    if parts.is_empty() {
        return Err(invalid());
    }

    let name = parts.join("/");
    let path = root.join(&name);
    Ok(DocumentPath { name, path })
}

/// `user.json` -> `user`, `a.b.json` -> `a`.
pub fn base_name(file: &str) -> &str {
    let name = Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file);
    name.split('.').next().unwrap_or(name)
}

/// Renders a value the way it appears in log lines: strings bare, anything
/// else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
