mod audit;
mod config;
mod datastore;
mod error;
mod routes;

pub use audit::{AuditLog, LogEntry, MalformedEntry};
pub use config::Config;
pub use datastore::{
    keyset, CreateOutcome, DeleteOutcome, Document, DocumentStore, PathGuard, PathLocks, StoreOptions,
    DEFAULT_MANIFEST,
};
pub use error::{Result, StoreError};
pub use routes::{configure, StatusPayload};
