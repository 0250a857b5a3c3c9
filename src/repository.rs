//! Albums and photos on top of a flat bucket.
//!
//! [`Repository`] turns album operations into object-store calls using the
//! key convention from [`crate::keys`]. It holds no state besides the store
//! handle and the bucket name: every listing goes back to the store, so two
//! calls in a row may see different contents if someone else writes to the
//! bucket in between.
//!
//! ## Batch operations are not transactional
//!
//! `upload`, `download` and `delete_album` work one object at a time and stop
//! at the first failure. Whatever was already written or deleted stays that
//! way. Nothing is retried.
//!
//! ## Validation before deletion
//!
//! `delete_photo` and `delete_album` list the bucket first and refuse to
//! issue any delete when the album or photo does not exist.

use crate::keys::{self, KeyError};
use crate::store::{ObjectStore, StoreError};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions accepted by `upload`, compared case-sensitively.
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Extension given to downloaded files.
pub const DOWNLOAD_EXTENSION: &str = "jpg";

const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("album '{0}' not found")]
    AlbumNotFound(String),
    #[error("photo '{photo}' not found in album '{album}'")]
    PhotoNotFound { album: String, photo: String },
    #[error("photo name '{0}' cannot be used as a file name")]
    UnsafePhotoName(String),
}

/// What `upload` did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Object keys written, in upload order.
    pub uploaded: Vec<String>,
    /// Files left out because of their extension.
    pub skipped: Vec<PathBuf>,
}

/// What `download` did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Files written, in download order.
    pub downloaded: Vec<PathBuf>,
}

pub struct Repository<S> {
    store: S,
    bucket: String,
}

impl<S: ObjectStore> Repository<S> {
    pub fn new(store: S, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the bucket if the credentials cannot see it yet.
    ///
    /// Returns `true` when the bucket was created.
    pub fn ensure_bucket(&self, region: &str) -> Result<bool, RepositoryError> {
        let buckets = self.store.list_buckets()?;
        if buckets.iter().any(|name| *name == self.bucket) {
            debug!(bucket = %self.bucket, "Bucket exists");
            return Ok(false);
        }
        self.store.create_bucket(&self.bucket, region)?;
        Ok(true)
    }

    /// Distinct album names, sorted.
    pub fn list_albums(&self) -> Result<BTreeSet<String>, RepositoryError> {
        let objects = self.store.list_objects(&self.bucket)?;
        Ok(objects
            .iter()
            .filter_map(|key| keys::album_of(key))
            .map(str::to_string)
            .collect())
    }

    /// Photo names in `album`, sorted. Empty for an unknown album.
    pub fn list_photos(&self, album: &str) -> Result<BTreeSet<String>, RepositoryError> {
        let objects = self.store.list_objects(&self.bucket)?;
        Ok(objects
            .iter()
            .filter_map(|key| keys::decode(key, album))
            .map(str::to_string)
            .collect())
    }

    /// Upload every `.jpg`/`.jpeg` file directly inside `dir` into `album`.
    ///
    /// Files go up in file-name order, each under `album/<file stem>`.
    /// Stops at the first failure without undoing earlier uploads.
    pub fn upload(&self, album: &str, dir: &Path) -> Result<UploadReport, RepositoryError> {
        keys::validate_album(album)?;
        require_dir(dir)?;

        let mut report = UploadReport::default();
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                // A broken link or unreadable entry only matters if it would be uploaded.
                Err(err) => match err.path() {
                    Some(path) if !is_photo(path) => {
                        warn!(path = %path.display(), error = %err, "Skipping unreadable entry");
                        report.skipped.push(path.to_path_buf());
                        continue;
                    }
                    _ => return Err(err.into()),
                },
            };
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if !is_photo(path) {
                debug!(path = %path.display(), "Skipping non-JPEG file");
                report.skipped.push(path.to_path_buf());
                continue;
            }

            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let key = keys::encode(album, &stem)?;
            let body = fs::read(path).map_err(|source| RepositoryError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            self.store
                .put_object(&self.bucket, &key, body, PHOTO_CONTENT_TYPE)?;
            info!(key = %key, "Uploaded photo");
            report.uploaded.push(key);
        }

        Ok(report)
    }

    /// Download every photo of `album` into `dir` as `<photo>.jpg`.
    ///
    /// Stops at the first failure; files already written are kept.
    pub fn download(&self, album: &str, dir: &Path) -> Result<DownloadReport, RepositoryError> {
        keys::validate_album(album)?;
        require_dir(dir)?;

        let photos: Vec<String> = self
            .list_photos(album)?
            .into_iter()
            .filter(|photo| !photo.is_empty())
            .collect();
        if let Some(unsafe_name) = photos.iter().find(|photo| !is_plain_file_name(photo)) {
            return Err(RepositoryError::UnsafePhotoName(unsafe_name.clone()));
        }

        let mut report = DownloadReport::default();
        for photo in &photos {
            let key = keys::encode(album, photo)?;
            let body = self.store.get_object(&self.bucket, &key)?;
            let path = dir.join(format!("{photo}.{DOWNLOAD_EXTENSION}"));
            fs::write(&path, body).map_err(|source| RepositoryError::Io {
                path: path.clone(),
                source,
            })?;
            info!(key = %key, path = %path.display(), "Downloaded photo");
            report.downloaded.push(path);
        }

        Ok(report)
    }

    /// Delete one photo after checking that both the album and the photo exist.
    pub fn delete_photo(&self, album: &str, photo: &str) -> Result<(), RepositoryError> {
        self.require_album(album)?;
        if !self.list_photos(album)?.contains(photo) {
            return Err(RepositoryError::PhotoNotFound {
                album: album.to_string(),
                photo: photo.to_string(),
            });
        }

        let key = keys::encode(album, photo)?;
        self.store.delete_object(&self.bucket, &key)?;
        info!(key = %key, "Deleted photo");
        Ok(())
    }

    /// Delete every object in `album`, one at a time.
    ///
    /// Returns the number of objects deleted. A failure part-way leaves the
    /// earlier deletions in place.
    pub fn delete_album(&self, album: &str) -> Result<usize, RepositoryError> {
        self.require_album(album)?;

        let photos = self.list_photos(album)?;
        for photo in &photos {
            let key = keys::encode(album, photo)?;
            self.store.delete_object(&self.bucket, &key)?;
            debug!(key = %key, "Deleted object");
        }

        info!(album, count = photos.len(), "Deleted album");
        Ok(photos.len())
    }

    /// Put a generated document at the bucket root.
    pub fn put_document(
        &self,
        key: &str,
        body: String,
        content_type: &str,
    ) -> Result<(), RepositoryError> {
        self.store
            .put_object(&self.bucket, key, body.into_bytes(), content_type)?;
        Ok(())
    }

    fn require_album(&self, album: &str) -> Result<(), RepositoryError> {
        keys::validate_album(album)?;
        if !self.list_albums()?.contains(album) {
            return Err(RepositoryError::AlbumNotFound(album.to_string()));
        }
        Ok(())
    }
}

fn require_dir(dir: &Path) -> Result<(), RepositoryError> {
    if !dir.is_dir() {
        return Err(RepositoryError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext))
}

/// A photo name that maps to a single file inside the target directory.
fn is_plain_file_name(photo: &str) -> bool {
    !photo.contains(['/', '\\']) && photo != "." && photo != ".."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreCall};
    use crate::test_helpers::*;
    use tempfile::TempDir;

    #[test]
    fn lists_albums_and_photos() {
        let repo = repo_with(&["vacation/img1", "vacation/img2", "work/doc1"]);

        assert_eq!(repo.list_albums().unwrap(), set(&["vacation", "work"]));
        assert_eq!(repo.list_photos("vacation").unwrap(), set(&["img1", "img2"]));
        assert_eq!(repo.list_photos("work").unwrap(), set(&["doc1"]));
    }

    #[test]
    fn root_objects_belong_to_no_album() {
        let repo = repo_with(&["index.html", "album1.html", "error.html", "trip/a"]);
        assert_eq!(repo.list_albums().unwrap(), set(&["trip"]));
    }

    #[test]
    fn unknown_album_has_no_photos() {
        let repo = repo_with(&["trip/a"]);
        assert!(repo.list_photos("missing").unwrap().is_empty());
    }

    #[test]
    fn album_prefix_must_match_exactly() {
        let repo = repo_with(&["trip/a", "trips/b", "tri/c"]);
        assert_eq!(repo.list_photos("trip").unwrap(), set(&["a"]));
    }

    #[test]
    fn nested_keys_keep_the_rest_as_photo_name() {
        let repo = repo_with(&["A/B/C"]);
        assert_eq!(repo.list_albums().unwrap(), set(&["A"]));
        assert_eq!(repo.list_photos("A").unwrap(), set(&["B/C"]));
    }

    #[test]
    fn listing_failure_propagates() {
        let repo = repo_with(&["trip/a"]);
        repo.store().fail_on(StoreCall::ListObjects);
        assert!(matches!(
            repo.list_albums(),
            Err(RepositoryError::Store(StoreError::Transport { .. }))
        ));
    }

    // =========================================================================
    // upload
    // =========================================================================

    #[test]
    fn upload_only_takes_jpeg_files() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", "A"), ("b.png", "B"), ("c.jpeg", "C")]);
        let repo = repo_with(&[]);

        let report = repo.upload("album", tmp.path()).unwrap();

        assert_eq!(report.uploaded, vec!["album/a", "album/c"]);
        assert_eq!(report.skipped, vec![tmp.path().join("b.png")]);
        assert_eq!(repo.store().keys(BUCKET), vec!["album/a", "album/c"]);
        let object = repo.store().object(BUCKET, "album/c").unwrap();
        assert_eq!(object.body, b"C");
        assert_eq!(object.content_type, "image/jpeg");
    }

    #[test]
    fn upload_extension_is_case_sensitive() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("LOUD.JPG", "x"), ("quiet.jpg", "y")]);
        let repo = repo_with(&[]);

        let report = repo.upload("album", tmp.path()).unwrap();
        assert_eq!(report.uploaded, vec!["album/quiet"]);
    }

    #[test]
    fn upload_ignores_subdirectories() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("top.jpg", "x"), ("nested/deep.jpg", "y")]);
        fs::create_dir(tmp.path().join("folder.jpg")).unwrap();
        let repo = repo_with(&[]);

        let report = repo.upload("album", tmp.path()).unwrap();
        assert_eq!(report.uploaded, vec!["album/top"]);
    }

    #[cfg(unix)]
    #[test]
    fn upload_skips_broken_link_that_is_not_a_photo() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", "A"), ("c.jpg", "C")]);
        let notes = tmp.path().join("b-notes.txt");
        std::os::unix::fs::symlink(tmp.path().join("gone.txt"), &notes).unwrap();
        let repo = repo_with(&[]);

        let report = repo.upload("album", tmp.path()).unwrap();

        assert_eq!(report.uploaded, vec!["album/a", "album/c"]);
        assert_eq!(report.skipped, vec![notes]);
        assert_eq!(repo.store().keys(BUCKET), vec!["album/a", "album/c"]);
    }

    #[cfg(unix)]
    #[test]
    fn upload_fails_on_broken_photo_link() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", "A")]);
        std::os::unix::fs::symlink(tmp.path().join("gone.jpg"), tmp.path().join("b.jpg")).unwrap();
        let repo = repo_with(&[]);

        let err = repo.upload("album", tmp.path()).unwrap_err();

        assert!(matches!(err, RepositoryError::Walk(_)));
        assert_eq!(repo.store().keys(BUCKET), vec!["album/a"]);
    }

    #[test]
    fn upload_overwrites_existing_photo() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", "new")]);
        let repo = repo_with(&["album/a"]);

        repo.upload("album", tmp.path()).unwrap();
        assert_eq!(repo.store().object(BUCKET, "album/a").unwrap().body, b"new");
    }

    #[test]
    fn upload_stops_at_first_failed_put() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", "A"), ("b.jpg", "B"), ("c.jpg", "C")]);
        let repo = repo_with(&[]);
        repo.store().fail_on(StoreCall::Put("album/b".into()));

        let err = repo.upload("album", tmp.path()).unwrap_err();

        assert!(matches!(err, RepositoryError::Store(_)));
        // a stays uploaded, c is never attempted
        assert_eq!(repo.store().keys(BUCKET), vec!["album/a"]);
        assert!(!repo.store().calls().contains(&StoreCall::Put("album/c".into())));
    }

    #[test]
    fn upload_rejects_bad_album_before_touching_store() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("a.jpg", "A")]);
        let repo = repo_with(&[]);

        assert!(matches!(
            repo.upload("", tmp.path()),
            Err(RepositoryError::Key(KeyError::InvalidAlbum(_)))
        ));
        assert!(repo.upload("a/b", tmp.path()).is_err());
        assert!(repo.store().calls().is_empty());
    }

    #[test]
    fn upload_requires_directory() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with(&[]);
        let err = repo.upload("album", &tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, RepositoryError::NotADirectory(_)));
    }

    // =========================================================================
    // download
    // =========================================================================

    #[test]
    fn download_writes_jpg_files() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with(&[]);
        repo.store().insert(BUCKET, "trip/sea", "SEA");
        repo.store().insert(BUCKET, "trip/sky", "SKY");
        repo.store().insert(BUCKET, "other/x", "X");

        let report = repo.download("trip", tmp.path()).unwrap();

        assert_eq!(
            report.downloaded,
            vec![tmp.path().join("sea.jpg"), tmp.path().join("sky.jpg")]
        );
        assert_eq!(fs::read(tmp.path().join("sea.jpg")).unwrap(), b"SEA");
        assert_eq!(fs::read(tmp.path().join("sky.jpg")).unwrap(), b"SKY");
        assert!(!tmp.path().join("x.jpg").exists());
    }

    #[test]
    fn download_skips_empty_photo_name() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with(&["trip/", "trip/a"]);

        let report = repo.download("trip", tmp.path()).unwrap();
        assert_eq!(report.downloaded, vec![tmp.path().join("a.jpg")]);
        assert!(!repo.store().calls().contains(&StoreCall::Get("trip/".into())));
    }

    #[test]
    fn download_keeps_files_written_before_failure() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with(&["trip/a", "trip/b", "trip/c"]);
        repo.store().fail_on(StoreCall::Get("trip/b".into()));

        assert!(repo.download("trip", tmp.path()).is_err());
        assert!(tmp.path().join("a.jpg").exists());
        assert!(!tmp.path().join("b.jpg").exists());
        assert!(!tmp.path().join("c.jpg").exists());
    }

    #[test]
    fn download_refuses_nested_photo_names() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with(&["trip/a", "trip/../../escape"]);

        let err = repo.download("trip", tmp.path()).unwrap_err();
        assert!(matches!(err, RepositoryError::UnsafePhotoName(_)));
        assert!(!repo.store().calls().iter().any(|c| matches!(c, StoreCall::Get(_))));
    }

    #[test]
    fn download_of_unknown_album_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with(&["trip/a"]);

        let report = repo.download("missing", tmp.path()).unwrap();
        assert!(report.downloaded.is_empty());
    }

    // =========================================================================
    // delete
    // =========================================================================

    #[test]
    fn delete_photo_removes_one_object() {
        let repo = repo_with(&["vacation/img1", "vacation/img2", "work/doc1"]);

        repo.delete_photo("vacation", "img1").unwrap();

        assert_eq!(repo.list_photos("vacation").unwrap(), set(&["img2"]));
        assert_eq!(repo.list_photos("work").unwrap(), set(&["doc1"]));
    }

    #[test]
    fn delete_photo_validates_with_two_listings() {
        let repo = repo_with(&["vacation/img1"]);

        repo.delete_photo("vacation", "img1").unwrap();

        assert_eq!(
            repo.store().calls(),
            vec![
                StoreCall::ListObjects,
                StoreCall::ListObjects,
                StoreCall::Delete("vacation/img1".into()),
            ]
        );
    }

    #[test]
    fn delete_photo_in_missing_album_issues_no_delete() {
        let repo = repo_with(&["vacation/img1"]);

        let err = repo.delete_photo("missing", "x").unwrap_err();

        assert!(matches!(err, RepositoryError::AlbumNotFound(a) if a == "missing"));
        assert_eq!(deletes(repo.store()), 0);
    }

    #[test]
    fn delete_missing_photo_issues_no_delete() {
        let repo = repo_with(&["vacation/img1"]);

        let err = repo.delete_photo("vacation", "img9").unwrap_err();

        assert!(matches!(err, RepositoryError::PhotoNotFound { .. }));
        assert_eq!(deletes(repo.store()), 0);
    }

    #[test]
    fn delete_album_removes_only_its_objects() {
        let repo = repo_with(&["trip/a", "trip/b", "trip/c/d", "tripx/e", "index.html"]);

        assert_eq!(repo.delete_album("trip").unwrap(), 3);
        assert_eq!(repo.store().keys(BUCKET), vec!["index.html", "tripx/e"]);
    }

    #[test]
    fn delete_missing_album_fails() {
        let repo = repo_with(&["trip/a"]);
        assert!(matches!(
            repo.delete_album("missing"),
            Err(RepositoryError::AlbumNotFound(_))
        ));
        assert_eq!(deletes(repo.store()), 0);
    }

    #[test]
    fn delete_album_is_not_atomic() {
        let repo = repo_with(&["trip/a", "trip/b", "trip/c"]);
        repo.store().fail_on(StoreCall::Delete("trip/b".into()));

        assert!(repo.delete_album("trip").is_err());
        // a is gone for good, c was never attempted
        assert_eq!(repo.store().keys(BUCKET), vec!["trip/b", "trip/c"]);
    }

    // =========================================================================
    // bucket bootstrap
    // =========================================================================

    #[test]
    fn ensure_bucket_creates_missing_bucket() {
        let repo = Repository::new(MemoryStore::new(), "fresh");

        assert!(repo.ensure_bucket("ru-central1").unwrap());
        assert!(!repo.ensure_bucket("ru-central1").unwrap());
        assert_eq!(
            repo.store().calls(),
            vec![
                StoreCall::ListBuckets,
                StoreCall::CreateBucket("fresh".into()),
                StoreCall::ListBuckets,
            ]
        );
    }
}
