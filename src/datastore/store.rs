use super::document::{base_name, display_value, resolve, Document, DocumentPath};
use super::keyset;
use super::locks::PathLocks;
use crate::audit::AuditLog;
use crate::{Result, StoreError};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MANIFEST: &str = "package.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub root: PathBuf,
    /// Never treated as a document, even if it sits in the root.
    pub manifest: String,
    /// Documents known to the store before any `create_file` call.
    pub documents: Vec<String>,
}

impl StoreOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StoreOptions {
            root: root.into(),
            manifest: DEFAULT_MANIFEST.to_string(),
            documents: Vec::new(),
        }
    }

    pub fn manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    pub fn documents<I, S>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents = documents.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The document already existed and was left untouched.
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Absent,
}

/// JSON documents stored as files under one root directory.
///
/// Every public operation appends exactly one entry to the audit log, whether
/// it succeeds or fails, and returns its outcome to the caller. A failed
/// audit append is reported through `tracing` and never fails the operation.
#[derive(Clone)]
pub struct DocumentStore {
    root: Arc<PathBuf>,
    /// Canonical names that are never documents: the manifest and the audit
    /// log when it lives under the root.
    reserved: Arc<Vec<String>>,
    audit: Arc<AuditLog>,
    locks: Arc<PathLocks>,
    catalog: Arc<Mutex<Vec<String>>>,
}

impl DocumentStore {
    pub async fn open(options: StoreOptions, audit: Arc<AuditLog>) -> Result<DocumentStore> {
        fs::create_dir_all(&options.root).await?;
        let reserved = reserved_names(&options.root, &options.manifest, &audit).await?;

        let store = DocumentStore {
            root: Arc::new(options.root),
            reserved: Arc::new(reserved),
            audit,
            locks: Arc::new(PathLocks::new()),
            catalog: Arc::new(Mutex::new(Vec::new())),
        };
        for file in &options.documents {
            store.register(file).await?;
        }
        debug!(root = %store.root.display(), "document store opened");

        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub async fn get(&self, file: &str, key: &str) -> Result<Value> {
        let result = self.read_document(file).await.and_then(|doc| {
            doc.get(key).cloned().ok_or_else(|| StoreError::KeyNotFound {
                file: file.to_string(),
                key: key.to_string(),
            })
        });
        self.record("Get", result, |value| {
            format!("Get {} on {} -> {}", key, file, display_value(value))
        })
        .await
    }

    pub async fn set(&self, file: &str, key: &str, value: Value) -> Result<()> {
        let result: Result<()> = async {
            let located = self.locate(file)?;
            let _guard = self.locks.lock(&located.name).await;
            let mut doc = read_at(file, &located.path).await?;
            doc.set(key.to_string(), value.clone());
            write_document(file, &located.path, &doc).await
        }
        .await;
        self.record("Set", result, |_| {
            format!("Set {} on {} -> {}", key, file, display_value(&value))
        })
        .await
    }

    /// Deletes `key` from the document and returns its previous value.
    /// Removing a key that is not there succeeds without rewriting the file.
    pub async fn remove(&self, file: &str, key: &str) -> Result<Option<Value>> {
        let result: Result<Option<Value>> = async {
            let located = self.locate(file)?;
            let _guard = self.locks.lock(&located.name).await;
            let mut doc = read_at(file, &located.path).await?;
            let previous = doc.remove(key);
            if previous.is_some() {
                write_document(file, &located.path, &doc).await?;
            }
            Ok(previous)
        }
        .await;
        self.record("Remove", result, |_| format!("Remove {} on {}", key, file))
            .await
    }

    /// Creates the document holding `{}`. A document that already has content
    /// is left alone; an existing empty file is initialised.
    pub async fn create_file(&self, file: &str) -> Result<CreateOutcome> {
        let result: Result<CreateOutcome> = async {
            let located = self.locate(file)?;
            let _guard = self.locks.lock(&located.name).await;
            match fs::read(&located.path).await {
                Ok(bytes) if !bytes.is_empty() => return Ok(CreateOutcome::Denied),
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(StoreError::IO(err)),
            }
            if let Some(parent) = located.path.parent() {
                fs::create_dir_all(parent).await?;
            }
            write_document(file, &located.path, &Document::new()).await?;
            self.register(&located.name).await?;
            Ok(CreateOutcome::Created)
        }
        .await;
        self.record("CreateFile", result, |outcome| match outcome {
            CreateOutcome::Created => format!("CreateFile {}", file),
            CreateOutcome::Denied => format!("CreateFile DENIED: {} already exists", file),
        })
        .await
    }

    pub async fn delete_file(&self, file: &str) -> Result<DeleteOutcome> {
        let result: Result<DeleteOutcome> = async {
            let located = self.locate(file)?;
            let _guard = self.locks.lock(&located.name).await;
            let outcome = match fs::remove_file(&located.path).await {
                Ok(()) => DeleteOutcome::Deleted,
                Err(err) if err.kind() == ErrorKind::NotFound => DeleteOutcome::Absent,
                Err(err) => return Err(StoreError::IO(err)),
            };
            self.unregister(&located.name).await;
            Ok(outcome)
        }
        .await;
        self.record("DeleteFile", result, |outcome| match outcome {
            DeleteOutcome::Deleted => format!("DeleteFile {}", file),
            DeleteOutcome::Absent => format!("DeleteFile {} does not exist", file),
        })
        .await
    }

    /// Every catalogued document, keyed by its base name, in registration
    /// order. One unreadable document fails the whole merge.
    pub async fn merge_data(&self) -> Result<Map<String, Value>> {
        let result: Result<Map<String, Value>> = async {
            let mut merged = Map::new();
            for file in self.documents().await {
                let doc = self.read_document(&file).await?;
                merged.insert(base_name(&file).to_string(), doc.into_value());
            }
            Ok(merged)
        }
        .await;
        self.record("MergeData", result, |merged| {
            format!(
                "MergeData Performed -> {}",
                serde_json::to_string(merged).unwrap_or_default()
            )
        })
        .await
    }

    pub async fn union(&self, file_a: &str, file_b: &str) -> Result<Vec<String>> {
        self.compare("Union", "Union", file_a, file_b, |a, b| keyset::union(a, b))
            .await
    }

    pub async fn intersect(&self, file_a: &str, file_b: &str) -> Result<Vec<String>> {
        self.compare("Intersect", "Intersection", file_a, file_b, |a, b| {
            keyset::intersect(a, b)
        })
        .await
    }

    /// Keys held by exactly one of the two documents.
    pub async fn difference(&self, file_a: &str, file_b: &str) -> Result<Vec<String>> {
        self.compare("Difference", "Difference", file_a, file_b, |a, b| {
            keyset::difference(a, b)
        })
        .await
    }

    pub async fn documents(&self) -> Vec<String> {
        self.catalog.lock().await.clone()
    }

    /// Adds `file` to the catalog under its canonical name. Returns `false`
    /// if it was already known or names the manifest or the audit log.
    pub async fn register(&self, file: &str) -> Result<bool> {
        let located = resolve(&self.root, file)?;
        if self.reserved.contains(&located.name) {
            return Ok(false);
        }
        let mut catalog = self.catalog.lock().await;
        if catalog.contains(&located.name) {
            return Ok(false);
        }
        catalog.push(located.name);
        Ok(true)
    }

    /// Registers every `*.json` file directly under the root, except the
    /// manifest, in name order. Returns how many were new.
    pub async fn discover(&self) -> Result<usize> {
        let mut found = Vec::new();
        let mut dir = fs::read_dir(self.root.as_path()).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                if name.ends_with(".json") && !name.starts_with('.') {
                    found.push(name);
                }
            }
        }
        found.sort();

        let mut added = 0;
        for name in found {
            if self.register(&name).await? {
                added += 1;
            }
        }
        info!(added, root = %self.root.display(), "discovered documents");
        Ok(added)
    }

    async fn unregister(&self, name: &str) {
        self.catalog.lock().await.retain(|known| known != name);
    }

    /// Resolves `file` and refuses the names the store keeps for itself.
    fn locate(&self, file: &str) -> Result<DocumentPath> {
        let located = resolve(&self.root, file)?;
        if self.reserved.contains(&located.name) {
            return Err(StoreError::InvalidName {
                file: file.to_string(),
            });
        }
        Ok(located)
    }

    async fn read_document(&self, file: &str) -> Result<Document> {
        let located = self.locate(file)?;
        read_at(file, &located.path).await
    }

    async fn compare(
        &self,
        op: &str,
        label: &str,
        file_a: &str,
        file_b: &str,
        combine: impl FnOnce(&[&str], &[&str]) -> Vec<String>,
    ) -> Result<Vec<String>> {
        let result: Result<Vec<String>> = async {
            let left = self.read_document(file_a).await?;
            let right = self.read_document(file_b).await?;
            let left_keys: Vec<&str> = left.keys().collect();
            let right_keys: Vec<&str> = right.keys().collect();
            Ok(combine(&left_keys, &right_keys))
        }
        .await;
        self.record(op, result, |keys| {
            format!("{} Performed {}", label, keys.join(","))
        })
        .await
    }

    /// Writes the audit entry for an operation and hands its result back.
    async fn record<T>(
        &self,
        op: &str,
        result: Result<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> Result<T> {
        let message = match &result {
            Ok(value) => describe(value),
            Err(err) => {
                warn!(op, error = %err, "store operation failed");
                format!("Error {}: {}", op, err)
            }
        };
        if let Err(err) = self.audit.log(&message).await {
            error!(op, error = %err, "failed to append audit entry");
        }
        result
    }
}

async fn reserved_names(root: &Path, manifest: &str, audit: &AuditLog) -> Result<Vec<String>> {
    let mut reserved: Vec<String> = resolve(root, manifest).map(|m| m.name).into_iter().collect();

    let root = fs::canonicalize(root).await?;
    let log = fs::canonicalize(audit.path()).await?;
    if let Some(relative) = log.strip_prefix(&root).ok().and_then(Path::to_str) {
        if let Ok(located) = resolve(&root, relative) {
            reserved.push(located.name);
        }
    }
    Ok(reserved)
}

async fn read_at(file: &str, path: &Path) -> Result<Document> {
    let bytes = fs::read(path)
        .await
        .map_err(|err| StoreError::from_io(file, err))?;
    Document::parse(file, &bytes)
}

/// Writes to a dot-prefixed sibling and renames it over `path`, so readers
/// see either the old or the new document. Dot-prefixed names never resolve
/// to documents.
async fn write_document(file: &str, path: &Path, doc: &Document) -> Result<()> {
    let bytes = doc.to_bytes()?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&tmp, bytes)
        .await
        .map_err(|err| StoreError::from_io(file, err))?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(StoreError::IO(err));
    }
    Ok(())
}
