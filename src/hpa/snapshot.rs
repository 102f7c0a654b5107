//! Machine-readable JSON snapshot of a document, optionally gzipped.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::export::DocumentModel;
use crate::util::Result;

use super::writer::DocumentHeader;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    name: &'a str,
    date: &'a str,
    software: &'a str,
    grid: &'a str,
    document: &'a DocumentModel,
}

/// A snapshot read back from disk.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub name: String,
    pub date: String,
    pub software: String,
    pub grid: String,
    pub document: DocumentModel,
}

/// Serialize `doc`; gzip when `compress` is set.
pub fn snapshot_bytes(header: &DocumentHeader, doc: &DocumentModel, compress: bool) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        name: &header.name,
        date: &header.date,
        software: &header.software,
        grid: &header.grid,
        document: doc,
    };
    let json = serde_json::to_vec_pretty(&snapshot)?;
    if !compress {
        return Ok(json);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Parse a snapshot, plain or gzipped.
pub fn read_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    let mut snapshot: Snapshot = if bytes.starts_with(&GZIP_MAGIC) {
        let mut json = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut json)?;
        serde_json::from_slice(&json)?
    } else {
        serde_json::from_slice(bytes)?
    };
    snapshot.document.reindex();
    Ok(snapshot)
}
