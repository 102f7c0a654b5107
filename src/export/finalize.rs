//! Document output.

use tracing::{error, info, info_span, warn};

use crate::hpa::{render_document, snapshot_bytes, DocumentHeader};
use crate::host::OutputFs;
use crate::util::{Error, Result};

use super::job::ExportJob;
use super::progress::JobState;

/// Header timestamp, UTC.
fn timestamp() -> String {
    let format = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    time::OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default()
}

impl ExportJob {
    pub(super) fn header(&self) -> DocumentHeader {
        let (name, grid) = match &self.request {
            Some(r) => (r.document_name(), r.environment.clone()),
            None => ("export".to_string(), String::new()),
        };
        DocumentHeader {
            name,
            date: timestamp(),
            software: self.settings.generator.clone(),
            platform: self.settings.platform.clone(),
            grid,
            bounds: self.document.bounds,
        }
    }

    /// Write the document. Runs at most once per job.
    pub(super) fn finalize(&mut self, fs: &dyn OutputFs) -> Result<()> {
        if !self.state.is_running() {
            return Ok(());
        }
        let _span = info_span!("finalize", job = self.id).entered();
        self.finalize_count += 1;

        let Some(destination) = self.request.as_ref().map(|r| r.destination.clone()) else {
            self.state = JobState::Failed;
            return Err(Error::NotRunning);
        };
        let header = self.header();
        let text = render_document(&header, &self.document, self.settings.image_extension());

        if let Err(e) = fs.write_file(&destination, text.as_bytes()) {
            let err = Error::output(&destination, e);
            error!("{}", err);
            self.state = JobState::Failed;
            self.stats.last_error = Some(err.to_string());
            return Err(err);
        }
        self.state = JobState::Finalized;
        info!(
            "wrote {} ({} linksets, {} prims, {} issue(s))",
            destination.display(),
            self.document.linksets().len(),
            self.document.node_count(),
            self.stats.issues.len()
        );

        if self.settings.write_snapshot {
            let ext = if self.settings.compress_snapshot { "json.gz" } else { "json" };
            let path = destination.with_extension(ext);
            let written = snapshot_bytes(&header, &self.document, self.settings.compress_snapshot)
                .and_then(|bytes| fs.write_file(&path, &bytes).map_err(Error::from));
            match written {
                Ok(()) => info!("wrote snapshot {}", path.display()),
                Err(e) => warn!("snapshot {} not written: {}", path.display(), e),
            }
        }
        Ok(())
    }
}
