//! # cloudphoto
//!
//! Photo albums stored in an S3-compatible bucket, published as a static
//! gallery served straight from that bucket.
//!
//! # Architecture: Flat Keys, Derived Site
//!
//! Object storage only has flat keys. cloudphoto reads the first path segment
//! of a key as the album name and the rest as the photo name:
//!
//! ```text
//! vacation/beach   → album "vacation", photo "beach"
//! index.html       → not an album (generated site page)
//! ```
//!
//! Albums are never stored on their own. They exist as long as at least one
//! key carries their prefix, which leaves the bucket contents as the only
//! source of truth.
//!
//! The website is derived data. `mksite` lists the bucket, renders one page
//! per album plus an index, and uploads them to the bucket root. Running it
//! again rebuilds everything from the current contents.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`keys`] | Album/photo ⇄ object key convention and URL encoding |
//! | [`repository`] | List, upload, download and delete albums and photos |
//! | [`site`] | Render and publish `index.html`, `album<N>.html`, `error.html` |
//! | [`template`] | `#{token}` substitution and the bundled HTML templates |
//! | [`store`] | [`ObjectStore`](store::ObjectStore) trait with S3 and in-memory backends |
//! | [`config`] | `cloudphotorc` loading, validation and writing |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Synchronous, One Request at a Time
//!
//! Uploads, downloads, deletions and page publishing all walk their objects
//! sequentially. The S3 backend runs the async SDK on its own current-thread
//! runtime and blocks on each request, so the library API is plain
//! synchronous Rust and its order of side effects is easy to reason about.
//!
//! ## Best-Effort Batches
//!
//! Batch operations stop at the first failure and keep whatever they already
//! did. There is no rollback and no retry. The error says what failed; the
//! user re-runs the command.
//!
//! ## Templates Compiled In
//!
//! The default `index.html`, `album.html` and `error.html` templates are
//! embedded with `include_str!`, so the binary works from any directory.
//! `--templates <DIR>` swaps in a custom set.

pub mod config;
pub mod keys;
pub mod output;
pub mod repository;
pub mod site;
pub mod store;
pub mod template;

#[cfg(test)]
pub(crate) mod test_helpers;
