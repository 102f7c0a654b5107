//! Output documents.
//!
//! - [`writer`] - the hierarchical project document (XML)
//! - [`snapshot`] - JSON snapshot of the same model, optionally gzipped
//! - [`xml`] - element tree and renderer used by the writer

pub mod snapshot;
pub mod writer;
pub mod xml;

pub use snapshot::{read_snapshot, snapshot_bytes, Snapshot, SNAPSHOT_VERSION};
pub use writer::{build_document, prim_element, render_document, DocumentHeader, SCHEMA_VERSION};
pub use xml::{XmlElement, XmlNode};
