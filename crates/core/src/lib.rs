//! Core library for the Greeting Show presentation.
//!
//! A scripted, single-viewer sequence of scenes (countdown, title card,
//! balloons, fireworks with a photo reveal, a curtained theater showing a
//! clip, and a closing message). Everything runs on a virtual clock so the
//! application crate decides how fast time passes and tests stay
//! deterministic.

pub mod assets;
pub mod audio;
pub mod config;
pub mod content;
pub mod emitters;
pub mod error;
pub mod render;
pub mod scene;
pub mod sequencer;
pub mod theater;
pub mod timeline;
pub mod viewport;

#[cfg(test)]
pub(crate) mod testing;

pub use assets::{AssetKind, AssetStore};
pub use audio::{AudioEngine, Cue, CueBackend, LoopedCue, SilentBackend};
pub use config::{AssetConfig, CueSet, CueSpec, ShowConfig, Texts, Timings};
pub use content::{ContentEvent, ContentPlayer, StartOrigin};
pub use emitters::{Balloon, Firework};
pub use error::{Result, ShowError};
pub use render::FrameComposer;
pub use scene::{Feature, Scene, SceneKind};
pub use sequencer::{Phase, PhaseChange, PhaseSequencer, SessionState};
pub use theater::{CurtainState, Theater, TheaterView};
pub use timeline::{PlaybackClock, Scheduler, TimerId};
pub use viewport::{ScrollMode, Viewport};
