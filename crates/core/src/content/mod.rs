use serde::{Deserialize, Serialize};

use crate::Result;

/// Who asked for playback to start. Platforms commonly refuse automatic
/// starts while accepting ones the viewer initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartOrigin {
    Automatic,
    Viewer,
}

/// Events raised by the content resource while it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentEvent {
    Play,
    Pause,
    Ended,
}

/// Video (or any other timed content) presented inside the theater.
pub trait ContentPlayer {
    /// Path of the underlying media.
    fn source(&self) -> &str;

    fn start(&mut self, origin: StartOrigin) -> Result<()>;

    fn pause(&mut self) -> Result<()>;
}
