//! Object key convention for albums and photos.
//!
//! The bucket is a flat namespace. An album is nothing more than the first
//! `/`-separated segment of a key, and a photo is whatever follows it:
//!
//! ```text
//! vacation/beach      → album "vacation", photo "beach"
//! vacation/2023/beach → album "vacation", photo "2023/beach"
//! index.html          → no album (site pages live at the bucket root)
//! ```
//!
//! Every other module goes through these functions instead of splitting keys
//! itself, so the convention lives in exactly one place and there is no album
//! index to keep in sync with the objects.
//!
//! [`url_encode`] is only for `src`/`href` attributes in generated HTML.
//! Storage keys are never escaped.

use thiserror::Error;

/// Separator between the album and photo parts of a key.
pub const DELIMITER: char = '/';

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid album name {0:?}: must be non-empty and contain no '/'")]
    InvalidAlbum(String),
}

/// An album name must be non-empty and must not contain the delimiter.
pub fn validate_album(album: &str) -> Result<(), KeyError> {
    if album.is_empty() || album.contains(DELIMITER) {
        return Err(KeyError::InvalidAlbum(album.to_string()));
    }
    Ok(())
}

/// Build the object key for a photo: `album/stem`.
pub fn encode(album: &str, stem: &str) -> Result<String, KeyError> {
    validate_album(album)?;
    Ok(format!("{album}{DELIMITER}{stem}"))
}

/// Extract the photo stem from `key` if it lives under `album`.
///
/// This is a plain prefix test: `decode("a/b/c", "a")` is `Some("b/c")`.
pub fn decode<'a>(key: &'a str, album: &str) -> Option<&'a str> {
    key.strip_prefix(album)?.strip_prefix(DELIMITER)
}

/// The album a key belongs to, or `None` for keys without a `/`.
pub fn album_of(key: &str) -> Option<&str> {
    key.split_once(DELIMITER).map(|(album, _)| album)
}

/// Percent-encode a value for use inside an HTML attribute URL.
///
/// ASCII alphanumerics and `-_.~` pass through; every other byte becomes
/// `%XX` with uppercase hex digits.
pub fn url_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
