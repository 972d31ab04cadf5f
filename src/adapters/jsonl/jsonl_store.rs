//! JSON-lines snapshot files as a metadata store.
//!
//! Layout: `<root>/<source_id>.jsonl`, one wire-format [`MetadataRecord`] per
//! line. Later lines supersede earlier lines for the same path, so the
//! extraction pipeline can append re-extracted records. A missing file is an
//! empty source.

use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::models::{MetadataRecord, SyncOperation};
use crate::domain::ports::{MetadataSynchronizer, RecordStream};

const FILE_EXTENSION: &str = "jsonl";

/// [`MetadataSynchronizer`] over a directory of JSON-lines files.
///
/// Point lookups scan the whole file. Deletions cannot be detected from a
/// snapshot, so incremental syncs only ever report upserts.
#[derive(Debug, Clone)]
pub struct JsonLinesMetadataStore {
    root: PathBuf,
}

impl JsonLinesMetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append `record` to the file of `source_id`, creating it if needed.
    pub fn append(&self, source_id: &str, record: &MetadataRecord) -> SyncResult<()> {
        let path = self.source_file(source_id)?;
        fs::create_dir_all(&self.root)?;

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn source_file(&self, source_id: &str) -> SyncResult<PathBuf> {
        let valid = !source_id.is_empty()
            && source_id != "."
            && source_id != ".."
            && !source_id.contains(['/', '\\']);
        if !valid {
            return Err(SyncError::InvalidSource(source_id.to_string()));
        }
        Ok(self.root.join(format!("{source_id}.{FILE_EXTENSION}")))
    }

    fn records(&self, source_id: &str) -> SyncResult<RecordStream<'static>> {
        let path = self.source_file(source_id)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no snapshot file for source");
                return Ok(Box::new(std::iter::empty()));
            }
            Err(e) => return Err(e.into()),
        };

        let lines = BufReader::new(file).lines().enumerate();
        Ok(Box::new(lines.filter_map(|(idx, line)| match line {
            Err(e) => Some(Err(SyncError::Io(e))),
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_line(idx + 1, &line)),
        })))
    }
}

fn parse_line(line_number: usize, line: &str) -> SyncResult<MetadataRecord> {
    serde_json::from_str(line).map_err(|e| SyncError::Malformed {
        line: line_number,
        message: e.to_string(),
    })
}

impl MetadataSynchronizer for JsonLinesMetadataStore {
    fn get_by_path(&self, path: &str, source_id: &str) -> SyncResult<Option<MetadataRecord>> {
        let mut found = None;
        for record in self.records(source_id)? {
            let record = record?;
            if record.path == path {
                found = Some(record);
            }
        }
        Ok(found)
    }

    fn full_reload(&self, source_id: &str) -> SyncResult<RecordStream<'_>> {
        self.records(source_id)
    }

    /// Upserts for records fresher than `since`. Records without an
    /// extraction or modification time are always included.
    fn changes_since(
        &self,
        source_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> SyncResult<Vec<SyncOperation>> {
        let mut operations = Vec::new();
        for record in self.records(source_id)? {
            let record = record?;
            let changed = match (since, record.freshness()) {
                (Some(since), Some(at)) => at >= since,
                _ => true,
            };
            if changed {
                operations.push(SyncOperation::upsert(record));
            }
        }
        Ok(operations)
    }
}
