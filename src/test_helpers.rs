//! Shared test utilities for the cloudphoto test suite.
//!
//! Builds repositories over a seeded [`MemoryStore`] and scratch photo
//! directories, plus a few assertions on recorded store calls.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let repo = repo_with(&["vacation/img1", "vacation/img2"]);
//! assert_eq!(repo.list_photos("vacation").unwrap(), set(&["img1", "img2"]));
//! assert_eq!(deletes(repo.store()), 0);
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use crate::repository::Repository;
use crate::store::{MemoryStore, StoreCall};

/// Bucket used by every helper-built repository.
pub const BUCKET: &str = "photos";

// =========================================================================
// Fixture setup
// =========================================================================

/// A repository whose bucket holds `keys`, each with a small body.
///
/// Seeding does not count as store calls.
pub fn repo_with(keys: &[&str]) -> Repository<MemoryStore> {
    let store = MemoryStore::with_bucket(BUCKET);
    for key in keys {
        store.insert(BUCKET, key, format!("body of {key}"));
    }
    Repository::new(store, BUCKET)
}

/// Write `(relative path, contents)` pairs under `dir`, creating parents.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
    }
}

// =========================================================================
// Assertions
// =========================================================================

/// Owned sorted set from string literals.
pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Number of delete calls the store has seen.
pub fn deletes(store: &MemoryStore) -> usize {
    store
        .calls()
        .iter()
        .filter(|call| matches!(call, StoreCall::Delete(_)))
        .count()
}
