//! Static gallery site generation.
//!
//! `cloudphoto mksite` turns the bucket itself into a website. The pages are
//! written next to the photos, at the bucket root:
//!
//! ```text
//! index.html     # one link per album
//! album1.html    # photos of the first album (sorted by name)
//! album2.html
//! ...
//! error.html     # served for unknown paths
//! ```
//!
//! ## Determinism
//!
//! The site is a pure function of the album/photo listing and the templates.
//! Albums are numbered `1..=N` in sorted name order on every run; the numbers
//! are never stored anywhere. [`render_site`] does all of the HTML work
//! without touching the store, and [`publish`] only lists and uploads.
//!
//! ## Escaping
//!
//! `#{url}` values are percent-encoded with [`keys::url_encode`]. `#{name}`
//! values are inserted as-is, without HTML escaping, so an album called
//! `<b>` renders as markup.
//!
//! ## Partial failure
//!
//! Publishing stops at the first failed call. Pages uploaded before that
//! point are left in place, so the bucket may mix pages from this run and
//! the previous one until `mksite` succeeds again.

use crate::keys;
use crate::repository::{Repository, RepositoryError};
use crate::store::{CannedAcl, ObjectStore, StoreError};
use crate::template::{self, Templates};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

pub const INDEX_PAGE: &str = "index.html";
pub const ERROR_PAGE: &str = "error.html";

/// One `<img>` tile per photo on an album page.
pub const PHOTO_TILE: &str = r##"<img src="#{url}" data-title="#{name}">"##;
/// One list entry per album on the index page.
pub const ALBUM_LINK: &str = r##"<li><a href="album#{id}.html">#{name}</a></li>"##;

/// Joins tiles and links: a newline plus the templates' 12-space indent.
const ITEM_SEPARATOR: &str = "\n            ";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[derive(Error, Debug)]
pub enum SiteError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Album name → photo names. Both levels are sorted by construction.
pub type Listing = BTreeMap<String, BTreeSet<String>>;

/// A rendered document and the key it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePage {
    pub key: String,
    pub body: String,
}

/// Result of a successful `publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub url: String,
    /// Keys of the uploaded pages, in upload order.
    pub pages: Vec<String>,
}

/// Key of the page for the album with ordinal `id` (1-based).
pub fn album_page_key(id: usize) -> String {
    format!("album{id}.html")
}

/// Public address of the website served from `bucket`.
pub fn site_url(bucket: &str) -> String {
    format!("https://{bucket}.website.yandexcloud.net/")
}

/// Render every page of the site.
///
/// Pages come back in publishing order: `album1.html`..`albumN.html`, then
/// `index.html`, then `error.html`.
pub fn render_site(listing: &Listing, templates: &Templates) -> Vec<SitePage> {
    let mut pages: Vec<SitePage> = listing
        .iter()
        .enumerate()
        .map(|(idx, (album, photos))| SitePage {
            key: album_page_key(idx + 1),
            body: render_album_page(album, photos, &templates.album),
        })
        .collect();

    pages.push(SitePage {
        key: INDEX_PAGE.to_string(),
        body: render_index(listing.keys().map(String::as_str), &templates.index),
    });
    pages.push(SitePage {
        key: ERROR_PAGE.to_string(),
        body: templates.error.clone(),
    });
    pages
}

/// Render one album page from the album template.
pub fn render_album_page<'a>(
    album: &str,
    photos: impl IntoIterator<Item = &'a String>,
    album_template: &str,
) -> String {
    let tiles: String = photos
        .into_iter()
        .map(|photo| {
            let url = keys::url_encode(&format!("{album}{}{photo}", keys::DELIMITER));
            let tile = template::fill(
                PHOTO_TILE,
                &[("url", url.as_str()), ("name", photo.as_str())],
            );
            tile + ITEM_SEPARATOR
        })
        .collect();
    template::fill(album_template, &[("linksToPhotos", tiles.as_str())])
}

/// Render the index page, numbering albums from 1 in iteration order.
pub fn render_index<'a>(albums: impl Iterator<Item = &'a str>, index_template: &str) -> String {
    let links: String = albums
        .enumerate()
        .map(|(idx, album)| {
            let id = (idx + 1).to_string();
            let link = template::fill(ALBUM_LINK, &[("id", id.as_str()), ("name", album)]);
            link + ITEM_SEPARATOR
        })
        .collect();
    template::fill(index_template, &[("linksToAlbums", links.as_str())])
}

/// Fetch the current album/photo listing from the bucket.
pub fn collect_listing<S: ObjectStore>(repo: &Repository<S>) -> Result<Listing, RepositoryError> {
    let mut listing = Listing::new();
    for album in repo.list_albums()? {
        let photos = repo.list_photos(&album)?;
        debug!(album = %album, photos = photos.len(), "Listed album");
        listing.insert(album, photos);
    }
    Ok(listing)
}

/// Make the bucket a public website and upload a freshly rendered site.
pub fn publish<S: ObjectStore>(
    repo: &Repository<S>,
    templates: &Templates,
) -> Result<PublishReport, SiteError> {
    let store = repo.store();
    store.put_bucket_acl(repo.bucket(), CannedAcl::PublicRead)?;
    store.put_bucket_website(repo.bucket(), INDEX_PAGE, ERROR_PAGE)?;

    let listing = collect_listing(repo)?;
    let mut report = PublishReport {
        url: site_url(repo.bucket()),
        pages: Vec::new(),
    };

    for page in render_site(&listing, templates) {
        repo.put_document(&page.key, page.body, HTML_CONTENT_TYPE)?;
        debug!(key = %page.key, "Uploaded page");
        report.pages.push(page.key);
    }

    info!(url = %report.url, albums = listing.len(), "Site published");
    Ok(report)
}
