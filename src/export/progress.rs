//! Job progress counters shared with observers.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::scene::{LocalId, ObjectId};
use crate::util::Vec3;

/// Lifecycle of an export job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum JobState {
    #[default]
    Idle,
    SubmittingLinksets,
    DrainingQueries,
    Finalized,
    Failed,
}

impl JobState {
    /// Ticking has an effect in these states.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Self::SubmittingLinksets | Self::DrainingQueries)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::SubmittingLinksets => "submitting",
            Self::DrainingQueries => "waiting for replies",
            Self::Finalized => "finished",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// `current` out of `total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counter {
    pub current: u32,
    pub total: u32,
}

impl Counter {
    #[inline]
    pub fn advance(&mut self) {
        self.current += 1;
    }

    #[inline]
    pub fn grow(&mut self) {
        self.total += 1;
    }

    #[inline]
    pub fn shrink(&mut self, n: u32) {
        self.total = self.total.saturating_sub(n);
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

/// A node or asset that could not be exported, kept for the final report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportIssue {
    pub object: Option<ObjectId>,
    pub local_id: Option<LocalId>,
    pub position: Option<Vec3>,
    pub message: String,
}

impl ExportIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self { object: None, local_id: None, position: None, message: message.into() }
    }

    pub fn object(mut self, id: ObjectId) -> Self {
        self.object = Some(id);
        self
    }

    pub fn local_id(mut self, local_id: LocalId) -> Self {
        self.local_id = Some(local_id);
        self
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for ExportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(id) = self.object {
            write!(f, " [{}]", id)?;
        }
        if let Some(local_id) = self.local_id {
            write!(f, " local {}", local_id)?;
        }
        if let Some(p) = self.position {
            write!(f, " at <{:.2}, {:.2}, {:.2}>", p.x, p.y, p.z)?;
        }
        Ok(())
    }
}

/// Snapshot of a job's progress.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Progress {
    pub state: JobState,
    pub linksets: Counter,
    pub prims: Counter,
    pub properties: Counter,
    pub inventories: Counter,
    pub assets: Counter,
    pub textures: Counter,
    pub pending_properties: u32,
    pub pending_inventory: u32,
    pub textures_failed: u32,
    pub assets_failed: u32,
    pub issues: Vec<ExportIssue>,
    pub last_error: Option<String>,
}

impl Progress {
    /// Human readable status, one counter per line.
    pub fn status_text(&self) -> String {
        let mut lines = vec![
            format!("Status: {}", self.state),
            format!("Linksets: {}", self.linksets),
            format!("Primitives: {}", self.prims),
            format!("Properties: {} ({} pending)", self.properties, self.pending_properties),
            format!("Inventories: {} ({} pending)", self.inventories, self.pending_inventory),
            format!("Inventory items: {}", self.assets),
            format!("Textures: {}", self.textures),
        ];
        if self.textures_failed + self.assets_failed > 0 {
            lines.push(format!(
                "Failed: {} textures, {} inventory items",
                self.textures_failed, self.assets_failed
            ));
        }
        if !self.issues.is_empty() {
            lines.push(format!("Issues: {}", self.issues.len()));
        }
        if let Some(err) = &self.last_error {
            lines.push(format!("Error: {}", err));
        }
        lines.join("\n")
    }

    /// Fraction of prims submitted, 0..=1.
    pub fn fraction(&self) -> f32 {
        if self.prims.total == 0 {
            return if self.state == JobState::Finalized { 1.0 } else { 0.0 };
        }
        (self.prims.current as f32 / self.prims.total as f32).min(1.0)
    }
}

/// Shared read access to a job's progress.
pub type ProgressHandle = Arc<RwLock<Progress>>;
