//! The event content collection: one data file per event, named by slug.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::schema::{parse_event_json, parse_event_yaml, Event, SchemaError};

const EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Leaves room for the extension under the usual 255-byte file name limit.
const MAX_SLUG_LEN: usize = 200;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventEntry {
    pub slug: String,
    pub event: Event,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ContentError + '_ {
    move |source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn is_event_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| EXTENSIONS.contains(&extension))
        .unwrap_or(false)
}

pub async fn load_event_file(path: &Path) -> Result<Event, ContentError> {
    let text = tokio::fs::read_to_string(path).await.map_err(io_error(path))?;
    let parsed = match path.extension().and_then(|extension| extension.to_str()) {
        Some("json") => parse_event_json(&text),
        _ => parse_event_yaml(&text),
    };
    parsed.map_err(|source| ContentError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

async fn event_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(io_error(dir))?;
    let mut files = vec![];
    while let Some(entry) = read_dir.next_entry().await.map_err(io_error(dir))? {
        let path = entry.path();
        if !is_event_file(&path) {
            debug!("skipping {}", path.display());
        } else if !is_valid_slug(&slug_of(&path)) {
            warn!("skipping {}: file name is not a usable slug", path.display());
        } else {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn slug_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Every event in `dir`, newest first. Fails on the first invalid file.
pub async fn load_events(dir: &Path) -> Result<Vec<EventEntry>, ContentError> {
    let mut entries = vec![];
    for path in event_files(dir).await? {
        let event = load_event_file(&path).await?;
        entries.push(EventEntry {
            slug: slug_of(&path),
            event,
        });
    }
    entries.sort_by(|a, b| {
        b.event
            .meta
            .start_at
            .cmp(&a.event.meta.start_at)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    Ok(entries)
}

/// Letters, digits, `-`, `_` and single dots. Anything else could not be
/// linked without escaping or is refused by the filesystem.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.contains("..")
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub async fn load_event(dir: &Path, slug: &str) -> Result<Option<EventEntry>, ContentError> {
    if !is_valid_slug(slug) {
        return Ok(None);
    }
    for extension in EXTENSIONS {
        let path = dir.join(format!("{slug}.{extension}"));
        if !tokio::fs::try_exists(&path).await.map_err(io_error(&path))? {
            continue;
        }
        let event = load_event_file(&path).await?;
        return Ok(Some(EventEntry {
            slug: slug.to_string(),
            event,
        }));
    }
    Ok(None)
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub valid: Vec<String>,
    pub failures: Vec<ContentError>,
}

/// Validates every event file instead of stopping at the first failure.
pub async fn check_collection(dir: &Path) -> Result<CheckReport, ContentError> {
    let mut report = CheckReport::default();
    for path in event_files(dir).await? {
        match load_event_file(&path).await {
            Ok(_) => report.valid.push(slug_of(&path)),
            Err(e) => {
                warn!("{e}");
                report.failures.push(e);
            }
        }
    }
    Ok(report)
}
