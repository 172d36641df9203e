mod document;
pub mod keyset;
mod locks;
mod store;

pub use self::document::Document;
pub use self::locks::{PathGuard, PathLocks};
pub use self::store::{
    CreateOutcome, DeleteOutcome, DocumentStore, StoreOptions, DEFAULT_MANIFEST,
};
