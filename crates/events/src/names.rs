//! Dot-separated event names published during a generation run.

pub const GENERATION_STARTED: &str = "generation.started";
pub const GENERATION_COVER_READY: &str = "generation.cover_ready";
pub const GENERATION_COMPLETED: &str = "generation.completed";
pub const GENERATION_FAILED: &str = "generation.failed";
pub const GENERATION_CANCELLED: &str = "generation.cancelled";

pub const TRACK_GENERATING: &str = "track.generating";
pub const TRACK_READY: &str = "track.ready";
pub const TRACK_FAILED: &str = "track.failed";
