use std::{collections::BTreeSet, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    config::{CueSet, CueSpec, Timings},
    timeline::{Scheduler, TimerId},
    Result,
};

/// Named audio cues used by the show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cue {
    Countdown,
    BalloonPop,
    Firework,
    Celebration,
    FinalCelebration,
}

impl Cue {
    pub fn spec(self, cues: &CueSet) -> &CueSpec {
        match self {
            Cue::Countdown => &cues.countdown,
            Cue::BalloonPop => &cues.balloon_pop,
            Cue::Firework => &cues.firework,
            Cue::Celebration => &cues.celebration,
            Cue::FinalCelebration => &cues.final_celebration,
        }
    }
}

/// Output device for cues.
pub trait CueBackend {
    /// Starts the cue from its first sample. May be rejected, e.g. when the
    /// platform refuses unattended playback.
    fn start(&mut self, cue: &CueSpec) -> Result<()>;

    /// Pauses the cue and rewinds it to the start.
    fn stop(&mut self, cue: &CueSpec);
}

/// Backend that accepts every request and produces no sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

impl CueBackend for SilentBackend {
    fn start(&mut self, _cue: &CueSpec) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self, _cue: &CueSpec) {}
}

/// Fire-and-forget façade over a [`CueBackend`].
///
/// Backend failures are logged and swallowed; nothing in the show waits on
/// audio.
pub struct AudioEngine {
    backend: Box<dyn CueBackend>,
    cues: CueSet,
    playing: BTreeSet<Cue>,
}

impl AudioEngine {
    pub fn new(backend: Box<dyn CueBackend>, cues: CueSet) -> Self {
        Self {
            backend,
            cues,
            playing: BTreeSet::new(),
        }
    }

    pub fn silent(cues: CueSet) -> Self {
        Self::new(Box::new(SilentBackend), cues)
    }

    pub fn cues(&self) -> &CueSet {
        &self.cues
    }

    /// Starts `cue` from the beginning, rewinding it first if it is already
    /// running. Returns whether the backend accepted the request.
    pub fn play(&mut self, cue: Cue) -> bool {
        let spec = cue.spec(&self.cues);
        if self.playing.remove(&cue) {
            self.backend.stop(spec);
        }

        match self.backend.start(spec) {
            Ok(()) => {
                tracing::debug!(?cue, path = %spec.path, volume = spec.volume, "cue started");
                self.playing.insert(cue);
                true
            }
            Err(err) => {
                tracing::warn!(?cue, %err, "cue playback failed, continuing without it");
                false
            }
        }
    }

    /// Stops and rewinds `cue`. No-op if it is not playing.
    pub fn stop(&mut self, cue: Cue) {
        if self.playing.remove(&cue) {
            self.backend.stop(cue.spec(&self.cues));
            tracing::debug!(?cue, "cue stopped");
        }
    }

    pub fn is_playing(&self, cue: Cue) -> bool {
        self.playing.contains(&cue)
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("playing", &self.playing)
            .finish()
    }
}

/// A cue that restarts at a fixed interval while its flag is set.
#[derive(Debug, Clone)]
pub struct LoopedCue {
    cue: Cue,
    interval: Duration,
    timer: Option<TimerId>,
}

impl LoopedCue {
    pub fn new(cue: Cue, interval: Duration) -> Self {
        Self {
            cue,
            interval,
            timer: None,
        }
    }

    /// Loop restarting on the configured `cue_loop_interval_ms`.
    pub fn from_timings(cue: Cue, timings: &Timings) -> Self {
        Self::new(cue, Duration::from_millis(timings.cue_loop_interval_ms))
    }

    pub fn cue(&self) -> Cue {
        self.cue
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Turns the loop on or off. Switching on plays immediately and arms a
    /// repeating timer carrying `action`; the owner calls
    /// [`LoopedCue::on_interval`] whenever it fires. Switching off cancels
    /// the timer and rewinds the cue.
    pub fn set_playing<A: Clone>(
        &mut self,
        playing: bool,
        audio: &mut AudioEngine,
        timers: &mut Scheduler<A>,
        action: A,
    ) {
        if playing {
            if self.timer.is_none() {
                audio.play(self.cue);
                self.timer = Some(timers.schedule_repeating(self.interval, action));
            }
        } else {
            self.stop(audio, timers);
        }
    }

    pub fn on_interval(&mut self, audio: &mut AudioEngine) {
        if self.timer.is_some() {
            audio.play(self.cue);
        }
    }

    pub fn stop<A: Clone>(&mut self, audio: &mut AudioEngine, timers: &mut Scheduler<A>) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
        audio.stop(self.cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CueCall, RecordingBackend};

    #[test]
    fn failed_cues_are_swallowed() {
        let backend = RecordingBackend::rejecting(&["sounds/countdown.mp3"]);
        let log = backend.log();
        let mut audio = AudioEngine::new(Box::new(backend), CueSet::default());

        assert!(!audio.play(Cue::Countdown));
        assert!(!audio.is_playing(Cue::Countdown));
        assert!(audio.play(Cue::Firework));

        audio.stop(Cue::Countdown);
        assert_eq!(
            log.borrow().as_slice(),
            &[
                CueCall::Start("sounds/countdown.mp3".into()),
                CueCall::Start("sounds/firework.mp3".into()),
            ]
        );
    }

    #[test]
    fn replaying_rewinds_first() {
        let backend = RecordingBackend::default();
        let log = backend.log();
        let mut audio = AudioEngine::new(Box::new(backend), CueSet::default());

        audio.play(Cue::Celebration);
        audio.play(Cue::Celebration);
        audio.stop(Cue::Celebration);
        audio.stop(Cue::Celebration);

        assert_eq!(
            log.borrow().as_slice(),
            &[
                CueCall::Start("sounds/celebration.mp3".into()),
                CueCall::Stop("sounds/celebration.mp3".into()),
                CueCall::Start("sounds/celebration.mp3".into()),
                CueCall::Stop("sounds/celebration.mp3".into()),
            ]
        );
    }

    #[test]
    fn looped_cue_restarts_every_interval_until_switched_off() {
        let backend = RecordingBackend::default();
        let log = backend.log();
        let mut audio = AudioEngine::new(Box::new(backend), CueSet::default());
        let mut timers = Scheduler::new();
        let mut looped = LoopedCue::from_timings(Cue::Countdown, &Timings::default());

        looped.set_playing(true, &mut audio, &mut timers, ());
        looped.set_playing(true, &mut audio, &mut timers, ());
        assert_eq!(timers.len(), 1);

        while timers.pop_due(2_500).is_some() {
            looped.on_interval(&mut audio);
        }
        looped.set_playing(false, &mut audio, &mut timers, ());

        assert!(!looped.is_active());
        assert!(timers.is_empty());
        assert!(!audio.is_playing(Cue::Countdown));

        let starts = log
            .borrow()
            .iter()
            .filter(|call| matches!(call, CueCall::Start(_)))
            .count();
        assert_eq!(starts, 3);
        assert_eq!(
            log.borrow().last(),
            Some(&CueCall::Stop("sounds/countdown.mp3".into()))
        );
    }

    #[test]
    fn looped_cue_follows_the_configured_interval() {
        let mut audio = AudioEngine::silent(CueSet::default());
        let mut timers = Scheduler::new();
        let timings = Timings {
            cue_loop_interval_ms: 250,
            ..Timings::default()
        };
        let mut looped = LoopedCue::from_timings(Cue::Firework, &timings);

        looped.set_playing(true, &mut audio, &mut timers, ());
        assert_eq!(timers.next_deadline(), Some(250));

        let mut fired = 0;
        while timers.pop_due(1_000).is_some() {
            looped.on_interval(&mut audio);
            fired += 1;
        }
        assert_eq!(fired, 4);
        assert!(audio.is_playing(Cue::Firework));
    }
}
