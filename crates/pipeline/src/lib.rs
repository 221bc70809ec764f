//! Generation orchestration.
//!
//! [`Orchestrator`] runs one generation at a time for a single owner:
//! it creates the playlist, generates each track's audio and thumbnail,
//! persists progress and exposes the result as a [`GenerationSnapshot`]
//! over a `watch` channel. [`OrchestratorRegistry`] keeps one orchestrator
//! per session owner.

pub mod adapters;
pub mod collaborators;
pub mod orchestrator;
pub mod registry;
pub mod snapshot;

pub use collaborators::{
    AudioGenerator, AudioRequest, Collaborators, ImageGenerator, ImageRequest, PlaylistStore,
};
pub use orchestrator::{Orchestrator, RetryPolicies};
pub use registry::OrchestratorRegistry;
pub use snapshot::{GenerationData, GenerationSnapshot};
