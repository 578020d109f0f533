//! Stand-ins for the audio and video hardware a browser would provide.

use std::path::PathBuf;

use greeting_show_core::{
    ContentEvent, ContentPlayer, CueBackend, CueSpec, PhaseSequencer, ShowError, StartOrigin,
};

/// Announces cues in the log, optionally ringing the terminal bell.
/// Cues whose file is missing under the asset root are rejected.
#[derive(Debug)]
pub struct TerminalCues {
    root: PathBuf,
    bell: bool,
}

impl TerminalCues {
    pub fn new(root: PathBuf, bell: bool) -> Self {
        Self { root, bell }
    }
}

impl CueBackend for TerminalCues {
    fn start(&mut self, cue: &CueSpec) -> greeting_show_core::Result<()> {
        let path = self.root.join(&cue.path);
        if !path.is_file() {
            return Err(ShowError::rejected(
                path.display().to_string(),
                "file not found",
            ));
        }
        tracing::info!(path = %path.display(), volume = cue.volume, "playing cue");
        if self.bell {
            eprint!("\x07");
        }
        Ok(())
    }

    fn stop(&mut self, cue: &CueSpec) {
        tracing::debug!(path = %cue.path, "cue rewound");
    }
}

/// Video player that only keeps track of whether it may start.
#[derive(Debug)]
pub struct SimulatedClip {
    source: String,
    block_autoplay: bool,
}

impl SimulatedClip {
    pub fn new(source: impl Into<String>, block_autoplay: bool) -> Self {
        Self {
            source: source.into(),
            block_autoplay,
        }
    }
}

impl ContentPlayer for SimulatedClip {
    fn source(&self) -> &str {
        &self.source
    }

    fn start(&mut self, origin: StartOrigin) -> greeting_show_core::Result<()> {
        if self.block_autoplay && origin == StartOrigin::Automatic {
            return Err(ShowError::rejected(&self.source, "autoplay is blocked"));
        }
        tracing::debug!(source = %self.source, ?origin, "clip started");
        Ok(())
    }

    fn pause(&mut self) -> greeting_show_core::Result<()> {
        Ok(())
    }
}

/// Measures how long the clip has actually played and raises
/// [`ContentEvent::Ended`] once its duration is used up.
#[derive(Debug)]
pub struct ClipTracker {
    duration_ms: u64,
    played_ms: u64,
    playing_since: Option<u64>,
    ended: bool,
}

impl ClipTracker {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            played_ms: 0,
            playing_since: None,
            ended: false,
        }
    }

    /// Virtual time at which the clip will end if it keeps playing.
    pub fn end_at(&self) -> Option<u64> {
        if self.ended {
            return None;
        }
        self.playing_since
            .map(|since| since + self.duration_ms.saturating_sub(self.played_ms))
    }

    /// Advances the show to `target_ms`, stopping early at the clip's end so
    /// the ended event lands on the exact millisecond.
    pub fn advance(&mut self, show: &mut PhaseSequencer, target_ms: u64) {
        let target = self.end_at().map_or(target_ms, |end| end.min(target_ms));
        show.advance_to(target);
        self.observe(show);

        if let Some(end) = self.end_at() {
            if show.now_ms() >= end {
                self.ended = true;
                show.handle_content(ContentEvent::Ended);
            }
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Picks up playback started outside [`ClipTracker::advance`], e.g. by
    /// the viewer.
    pub fn observe(&mut self, show: &PhaseSequencer) {
        let playing = show.theater().is_some_and(|theater| theater.is_playing());
        let now = show.now_ms();
        match (self.playing_since, playing) {
            (None, true) => self.playing_since = Some(now),
            (Some(since), false) => {
                self.played_ms += now.saturating_sub(since);
                self.playing_since = None;
            }
            _ => {}
        }
    }
}
