//! HTML templates and `#{token}` substitution.
//!
//! The site is built from three documents:
//!
//! | File | Placeholders |
//! |------|--------------|
//! | `index.html` | `#{linksToAlbums}` |
//! | `album.html` | `#{linksToPhotos}` |
//! | `error.html` | none, uploaded verbatim |
//!
//! Copies of all three are compiled into the binary from `resources/`. A
//! directory with replacements can be given on the command line; it must
//! contain all three files.
//!
//! Substitution is a single left-to-right pass: every occurrence of a known
//! token is replaced, inserted values are never scanned again, and unknown
//! tokens are left as they are.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const INDEX_HTML: &str = include_str!("../resources/index.html");
const ALBUM_HTML: &str = include_str!("../resources/album.html");
const ERROR_HTML: &str = include_str!("../resources/error.html");

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The three documents the site is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub index: String,
    pub album: String,
    pub error: String,
}

impl Templates {
    /// Templates shipped inside the binary.
    pub fn embedded() -> Self {
        Self {
            index: INDEX_HTML.to_string(),
            album: ALBUM_HTML.to_string(),
            error: ERROR_HTML.to_string(),
        }
    }

    /// Read `index.html`, `album.html` and `error.html` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|source| TemplateError::Io { path, source })
        };
        Ok(Self {
            index: read("index.html")?,
            album: read("album.html")?,
            error: read("error.html")?,
        })
    }

    /// `load(dir)` when a directory is given, the embedded set otherwise.
    pub fn resolve(dir: Option<&Path>) -> Result<Self, TemplateError> {
        match dir {
            Some(dir) => Self::load(dir),
            None => Ok(Self::embedded()),
        }
    }
}

/// Replace every `#{name}` in `template` whose name appears in `vars`.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("#{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let value = after_open.find('}').and_then(|end| {
            let name = &after_open[..end];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after_open[end + 1..];
            }
            None => {
                out.push_str("#{");
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}
