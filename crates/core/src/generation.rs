//! Generation requests, track layout and per-track prompt construction.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::playlist::playlist_name;
use crate::status::{PlaylistStatus, TrackStatus};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of tracks generated in playlist mode.
pub const PLAYLIST_TRACK_COUNT: usize = 3;

/// Requested length of every generated track, in seconds.
pub const TRACK_DURATION_SECS: i32 = 60;

/// Shortest track the music service accepts.
pub const MIN_TRACK_DURATION_SECS: i32 = 10;

/// Longest track the music service accepts.
pub const MAX_TRACK_DURATION_SECS: i32 = 300;

/// Suffixes rotated across playlist tracks so they do not all sound alike.
pub const TRACK_VARIATIONS: [&str; 3] = [
    "",
    " With an intro buildup.",
    " With dynamic changes and energy shifts.",
];

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Whether a run produces one track or a multi-track playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    Single,
    Playlist,
}

/// User input for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GenerationRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(length(max = 100))]
    pub genre: Option<String>,
    #[validate(length(max = 100))]
    pub mood: Option<String>,
    pub mode: GenerationMode,
}

/// Fields for a new playlist row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistDraft {
    pub owner_id: Option<DbId>,
    pub name: String,
    pub prompt: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub status: PlaylistStatus,
}

/// Fields for a new track row. `track_order` is the index in the draft list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDraft {
    pub title: String,
    pub prompt: String,
    pub genre: Option<String>,
    pub mood: Option<String>,
    pub duration: i32,
    pub track_order: i32,
    pub status: TrackStatus,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, mode: GenerationMode) -> Self {
        Self {
            prompt: prompt.into(),
            genre: None,
            mood: None,
            mode,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }

    /// Trim the prompt and drop empty genre/mood values.
    pub fn normalized(mut self) -> Self {
        self.prompt = self.prompt.trim().to_string();
        self.genre = non_empty(self.genre);
        self.mood = non_empty(self.mood);
        self
    }

    /// Validate field lengths and reject blank prompts.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_blank() {
            return Err(CoreError::Validation("Prompt is required".into()));
        }
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))
    }

    pub fn track_count(&self) -> usize {
        match self.mode {
            GenerationMode::Single => 1,
            GenerationMode::Playlist => PLAYLIST_TRACK_COUNT,
        }
    }

    /// Prompt sent to the music service for the track at `index`.
    pub fn track_prompt(&self, index: usize) -> String {
        build_track_prompt(
            &self.prompt,
            self.genre.as_deref(),
            self.mood.as_deref(),
            self.mode,
            index,
        )
    }

    pub fn playlist_draft(&self, owner_id: Option<DbId>) -> PlaylistDraft {
        PlaylistDraft {
            owner_id,
            name: playlist_name(&self.prompt),
            prompt: self.prompt.clone(),
            genre: self.genre.clone(),
            mood: self.mood.clone(),
            status: PlaylistStatus::Generating,
        }
    }

    /// One pending draft per track, in order.
    pub fn track_drafts(&self) -> Vec<TrackDraft> {
        (0..self.track_count())
            .map(|i| TrackDraft {
                title: track_title(&self.prompt, self.mode, i),
                prompt: self.prompt.clone(),
                genre: self.genre.clone(),
                mood: self.mood.clone(),
                duration: TRACK_DURATION_SECS,
                track_order: i as i32,
                status: TrackStatus::Pending,
            })
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Single tracks are named after the prompt, playlist tracks are numbered.
pub fn track_title(prompt: &str, mode: GenerationMode, index: usize) -> String {
    match mode {
        GenerationMode::Single => playlist_name(prompt),
        GenerationMode::Playlist => format!("Track {}", index + 1),
    }
}

/// Build the effective prompt for one track.
///
/// Order: `"{genre} genre. "`, then `"{mood} mood. "`, then the base prompt,
/// then (playlist mode only) the variation suffix for `index`.
pub fn build_track_prompt(
    base: &str,
    genre: Option<&str>,
    mood: Option<&str>,
    mode: GenerationMode,
    index: usize,
) -> String {
    let mut prompt = String::new();
    if let Some(genre) = genre {
        prompt.push_str(&format!("{genre} genre. "));
    }
    if let Some(mood) = mood {
        prompt.push_str(&format!("{mood} mood. "));
    }
    prompt.push_str(base);
    if mode == GenerationMode::Playlist {
        prompt.push_str(TRACK_VARIATIONS[index % TRACK_VARIATIONS.len()]);
    }
    prompt
}

/// Clamp a requested duration into the range the music service accepts.
pub fn clamp_duration(secs: i32) -> i32 {
    secs.clamp(MIN_TRACK_DURATION_SECS, MAX_TRACK_DURATION_SECS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
