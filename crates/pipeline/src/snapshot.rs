//! Read-only view of the orchestrator state.

use hyde_core::generation::GenerationMode;
use hyde_core::playlist::Playlist;
use hyde_core::status::GenerationStatus;
use hyde_core::types::Timestamp;
use serde::Serialize;

/// The active (or most recent) generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationData {
    pub playlist: Playlist,
    pub mode: GenerationMode,
    pub status: GenerationStatus,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl GenerationData {
    /// `(ready tracks, total tracks)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.playlist.ready_count(), self.playlist.tracks.len())
    }
}

/// Everything a presenter needs, published as one value per step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationSnapshot {
    pub generation: Option<GenerationData>,
    pub is_expanded: bool,
    pub is_dismissed: bool,
    /// Message of the last failed playlist creation.
    pub last_error: Option<String>,
}

impl GenerationSnapshot {
    /// Lifecycle status. A creation failure with nothing to show is `Error`.
    pub fn status(&self) -> GenerationStatus {
        match (&self.generation, &self.last_error) {
            (Some(generation), _) => generation.status,
            (None, Some(_)) => GenerationStatus::Error,
            (None, None) => GenerationStatus::Idle,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.status() == GenerationStatus::Generating
    }

    /// Whether the floating status indicator should be shown.
    pub fn is_visible(&self) -> bool {
        self.generation.is_some() && !self.is_dismissed
    }
}
