//! CLI output formatting for every command.
//!
//! Each command has a `format_*` function returning `Vec<String>` for
//! testability, and `main` prints the lines. Format functions are pure: no
//! I/O, no side effects.
//!
//! # Output Format
//!
//! ## list
//!
//! ```text
//! vacation
//! work
//! ```
//!
//! or `empty list` when there is nothing to show.
//!
//! ## upload / download
//!
//! ```text
//! vacation/beach
//! vacation/sunset
//!     Skipped: notes.txt
//! Uploaded 2 photos to vacation
//! ```
//!
//! ## mksite
//!
//! The site URL alone on stdout, so it can be piped.

use crate::repository::{DownloadReport, UploadReport};
use crate::site::PublishReport;
use std::collections::BTreeSet;
use std::path::Path;

const EMPTY_LIST: &str = "empty list";

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn photos(n: usize) -> String {
    match n {
        1 => "1 photo".to_string(),
        n => format!("{n} photos"),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One album or photo name per line.
pub fn format_list(names: &BTreeSet<String>) -> Vec<String> {
    if names.is_empty() {
        return vec![EMPTY_LIST.to_string()];
    }
    names.iter().cloned().collect()
}

/// Uploaded keys, skipped files, then a summary line.
pub fn format_upload(album: &str, report: &UploadReport) -> Vec<String> {
    let mut lines: Vec<String> = report.uploaded.clone();
    for skipped in &report.skipped {
        lines.push(format!("{}Skipped: {}", indent(1), file_name(skipped)));
    }
    lines.push(format!(
        "Uploaded {} to {album}",
        photos(report.uploaded.len())
    ));
    lines
}

/// Written files, then a summary line.
pub fn format_download(album: &str, dir: &Path, report: &DownloadReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .downloaded
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    lines.push(format!(
        "Downloaded {} from {album} to {}",
        photos(report.downloaded.len()),
        dir.display()
    ));
    lines
}

pub fn format_delete_photo(album: &str, photo: &str) -> Vec<String> {
    vec![format!("Deleted {photo} from {album}")]
}

pub fn format_delete_album(album: &str, deleted: usize) -> Vec<String> {
    vec![format!("Deleted album {album} ({})", photos(deleted))]
}

/// Just the site URL.
pub fn format_site(report: &PublishReport) -> Vec<String> {
    vec![report.url.clone()]
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
