//! CSV output. Files are written to a temporary sibling and renamed into
//! place only after the last record is flushed, so an aborted run never
//! leaves a truncated file behind.

use std::path::{Path, PathBuf};

use alloy::primitives::{B256, U256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hash::node_hex;
use crate::renewal::RenewalEntry;

fn create_temp(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}

/// A fully written CSV waiting in a temporary file beside its destination.
///
/// [`StagedCsv::commit`] renames it into place. Dropping it uncommitted
/// removes the temporary file and leaves the destination untouched.
pub struct StagedCsv {
    tmp: NamedTempFile,
    path: PathBuf,
}

impl StagedCsv {
    fn finish(writer: csv::Writer<NamedTempFile>, path: &Path) -> Result<Self> {
        let tmp = writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        tmp.as_file().sync_all()?;
        Ok(Self {
            tmp,
            path: path.to_path_buf(),
        })
    }

    /// Destination the file will be renamed to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commit(self) -> Result<()> {
        self.tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        debug!("Persisted {}", self.path.display());
        Ok(())
    }
}

/// Write a single-column `node` CSV of `0x`-prefixed namehashes.
pub fn write_nodes(path: &Path, nodes: &[B256]) -> Result<()> {
    stage_nodes(path, nodes)?.commit()
}

/// Like [`write_nodes`], but stop short of renaming into place.
pub fn stage_nodes(path: &Path, nodes: &[B256]) -> Result<StagedCsv> {
    let mut writer = csv::Writer::from_writer(create_temp(path)?);
    writer.write_record(["node"])?;
    for node in nodes {
        writer.write_record([node_hex(node)])?;
    }
    StagedCsv::finish(writer, path)
}

/// Write an `id,duration` CSV, one row per entry, in order.
pub fn write_renewals(path: &Path, entries: &[RenewalEntry]) -> Result<()> {
    stage_renewals(path, entries)?.commit()
}

/// Like [`write_renewals`], but stop short of renaming into place.
pub fn stage_renewals(path: &Path, entries: &[RenewalEntry]) -> Result<StagedCsv> {
    let mut writer = csv::Writer::from_writer(create_temp(path)?);
    writer.write_record(["id", "duration"])?;
    for entry in entries {
        writer.write_record([entry.id.to_string(), entry.duration.to_string()])?;
    }
    StagedCsv::finish(writer, path)
}

/// Read back an `id,duration` CSV produced by [`write_renewals`].
pub fn read_renewals(path: &Path) -> Result<Vec<RenewalEntry>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let malformed = |reason: String| Error::Record { line, reason };

        let id = record
            .get(0)
            .ok_or_else(|| malformed("missing id".into()))?;
        let duration = record
            .get(1)
            .ok_or_else(|| malformed("missing duration".into()))?;

        entries.push(RenewalEntry {
            id: U256::from_str_radix(id, 10).map_err(|e| malformed(e.to_string()))?,
            duration: duration
                .parse()
                .map_err(|e: std::num::ParseIntError| malformed(e.to_string()))?,
        });
    }
    Ok(entries)
}
