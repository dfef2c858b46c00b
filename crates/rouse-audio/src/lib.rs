//! `rouse-audio` — single-session alarm sound playback.
//!
//! The [`playback::SoundPlaybackController`] enforces two invariants over
//! any [`backend::AudioBackend`]:
//!
//! - never more than one concurrently playing alarm sound;
//! - no leaked backend handle on replace, stop, or error.

pub mod backend;
pub mod error;
pub mod playback;

pub use backend::{AudioBackend, PlaybackHandle};
pub use error::{AudioError, Result};
pub use playback::SoundPlaybackController;
