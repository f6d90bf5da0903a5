//! CSV cache of fetched stargazers.
//!
//! `query-github` writes one row per stargazer; every analytics command
//! reads the file back. The file has no header row. Columns:
//!
//! ```text
//! login, id, company, name, location, bio, starred_at
//! ```
//!
//! Empty cells mean the profile field was blank. A row that cannot be
//! turned into a [`StarEvent`] aborts the read: silently skipping it would
//! skew every count derived from the file.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use stargazer_geo_core::models::parse_starred_at;
use stargazer_geo_core::{GeoError, StarEvent};

/// Number of columns in a cache row.
pub const FIELD_COUNT: usize = 7;

/// Read every cached star event, in file order.
pub fn read_events(path: &Path) -> Result<Vec<StarEvent>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open star cache: {}", path.display()))?;
    read_events_from(file).with_context(|| format!("Invalid star cache: {}", path.display()))
}

/// Read star events from any CSV source.
pub fn read_events_from<R: Read>(source: R) -> Result<Vec<StarEvent>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut events = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row #{}", index))?;
        events.push(record_to_event(index, &record)?);
    }
    tracing::debug!(records = events.len(), "read star cache");
    Ok(events)
}

/// Convert one CSV row into a [`StarEvent`].
pub fn record_to_event(
    index: usize,
    record: &StringRecord,
) -> stargazer_geo_core::Result<StarEvent> {
    if record.len() < FIELD_COUNT {
        return Err(GeoError::malformed(
            index,
            format!("expected {} fields, found {}", FIELD_COUNT, record.len()),
        ));
    }

    let login = record[0].trim();
    if login.is_empty() {
        return Err(GeoError::malformed(index, "empty login"));
    }

    let user_id = record[1]
        .trim()
        .parse::<u64>()
        .map_err(|e| GeoError::malformed(index, format!("bad id '{}': {}", &record[1], e)))?;

    Ok(StarEvent {
        login: login.to_string(),
        user_id,
        company: optional(&record[2]),
        name: optional(&record[3]),
        location: optional(&record[4]),
        bio: optional(&record[5]),
        starred_at: parse_starred_at(index, &record[6])?,
    })
}

fn optional(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Appends star events to the cache, flushing after every row so an
/// interrupted fetch keeps what it already wrote. File-backed writers also
/// sync each row to disk.
pub struct CacheWriter<W: Write> {
    inner: Writer<W>,
    sync: fn(&W) -> std::io::Result<()>,
    written: u64,
}

impl CacheWriter<File> {
    /// Create (or truncate) the cache file.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create star cache: {}", path.display()))?;
        let mut writer = Self::from_writer(file);
        writer.sync = File::sync_data;
        Ok(writer)
    }
}

impl<W: Write> CacheWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            inner: WriterBuilder::new().has_headers(false).from_writer(writer),
            sync: |_| Ok(()),
            written: 0,
        }
    }

    pub fn write(&mut self, event: &StarEvent) -> Result<()> {
        let id = event.user_id.to_string();
        let starred_at = event.starred_at_str();
        self.inner.write_record([
            event.login.as_str(),
            id.as_str(),
            event.company.as_deref().unwrap_or(""),
            event.name.as_deref().unwrap_or(""),
            event.location.as_deref().unwrap_or(""),
            event.bio.as_deref().unwrap_or(""),
            starred_at.as_str(),
        ])?;
        self.inner.flush()?;
        (self.sync)(self.inner.get_ref())?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}
