//! Root state machine of the show.
//!
//! The sequencer owns the whole session state and a virtual-time
//! [`Scheduler`]. Every state change goes through [`PhaseSequencer::sync_entry`],
//! which runs the entry action for the current `(phase, countdown)` pair at
//! most once and tears the previous entry down first: its timers are
//! cancelled and its scoped cue is stopped. Rendering is read-only.

use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    audio::{AudioEngine, Cue},
    config::ShowConfig,
    content::{ContentEvent, ContentPlayer},
    emitters::{Balloon, Firework},
    scene::{Feature, Scene, BALLOON_COUNT, CLOSING_FIREWORKS, GREETING_FIREWORKS},
    theater::{CurtainState, Theater, TheaterSignal, TheaterView, AUDIENCE_SIZE},
    timeline::{duration_ms, Scheduler, TimerId},
    viewport::Viewport,
    Result, ShowError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Countdown = 1,
    Title = 2,
    Balloons = 3,
    Greeting = 4,
    Blackout = 5,
    Theater = 6,
    Closing = 7,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Countdown,
        Phase::Title,
        Phase::Balloons,
        Phase::Greeting,
        Phase::Blackout,
        Phase::Theater,
        Phase::Closing,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Closing
    }
}

/// Session state owned by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub countdown: u32,
    pub video_ended: bool,
    pub show_video: bool,
    pub show_quote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub at_ms: u64,
    pub phase: Phase,
}

/// Payload of every timer the sequencer arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    CountdownTick,
    Advance(Phase),
    RevealVideo,
    RevealQuote,
    Finish,
    OpenCurtains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryKey {
    phase: Phase,
    countdown: u32,
}

/// Resources acquired by the current entry action.
#[derive(Debug, Default)]
struct EntryScope {
    key: Option<EntryKey>,
    timers: Vec<TimerId>,
    cue: Option<Cue>,
}

/// Emitters mounted for the current phase.
#[derive(Debug, Default)]
struct Cast {
    balloons: Vec<Balloon>,
    fireworks: Vec<Firework>,
}

pub struct PhaseSequencer {
    config: ShowConfig,
    state: SessionState,
    timers: Scheduler<TimerAction>,
    audio: AudioEngine,
    viewport: Viewport,
    content: Option<Box<dyn ContentPlayer>>,
    theater: Option<Theater>,
    entry: EntryScope,
    cast: Cast,
    rng: StdRng,
    history: Vec<PhaseChange>,
    mounted: bool,
}

impl PhaseSequencer {
    /// Starts a session in Phase 1 and runs its entry action.
    pub fn new(
        config: ShowConfig,
        audio: AudioEngine,
        content: Box<dyn ContentPlayer>,
        viewport: Viewport,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = SessionState {
            phase: Phase::Countdown,
            countdown: config.countdown_from,
            video_ended: false,
            show_video: false,
            show_quote: false,
        };
        tracing::info!(countdown = state.countdown, "show starting");

        let mut sequencer = Self {
            config,
            state,
            timers: Scheduler::new(),
            audio,
            viewport,
            content: Some(content),
            theater: None,
            entry: EntryScope::default(),
            cast: Cast::default(),
            rng,
            history: vec![PhaseChange {
                at_ms: 0,
                phase: Phase::Countdown,
            }],
            mounted: true,
        };
        sequencer.sync_entry();
        sequencer
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn history(&self) -> &[PhaseChange] {
        &self.history
    }

    pub fn theater(&self) -> Option<&Theater> {
        self.theater.as_ref()
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn config(&self) -> &ShowConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Time spent in the current phase.
    pub fn phase_elapsed_ms(&self) -> u64 {
        let entered = self.history.last().map_or(0, |change| change.at_ms);
        self.now_ms().saturating_sub(entered)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        if self.mounted {
            self.timers.next_deadline()
        } else {
            None
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase.is_terminal()
    }

    pub fn advance(&mut self, delta: Duration) {
        let target = self.now_ms().saturating_add(duration_ms(delta));
        self.advance_to(target);
    }

    /// Fires every timer due up to `target_ms` in deadline order.
    pub fn advance_to(&mut self, target_ms: u64) {
        if !self.mounted {
            return;
        }
        while let Some(fired) = self.timers.pop_due(target_ms) {
            self.entry.timers.retain(|id| *id != fired.id);
            tracing::debug!(action = ?fired.action, at_ms = fired.due_ms, "timer fired");
            self.dispatch(fired.action, fired.due_ms);
        }
        self.timers.advance_clock_to(target_ms);
    }

    /// Routes an event from the content resource to the theater.
    pub fn handle_content(&mut self, event: ContentEvent) {
        if !self.mounted {
            return;
        }
        let signal = match self.theater.as_mut() {
            Some(theater) => theater.handle_content(event),
            None => {
                tracing::debug!(?event, "content event without a mounted theater");
                None
            }
        };
        if signal == Some(TheaterSignal::Completed) {
            self.on_content_finished();
        }
    }

    /// Viewer-initiated playback, used after an automatic start was refused.
    pub fn request_playback(&mut self) -> Result<()> {
        if !self.mounted {
            return Err(ShowError::NotMounted("sequencer"));
        }
        self.theater
            .as_mut()
            .ok_or(ShowError::NotMounted("theater"))?
            .request_playback()
    }

    pub fn scene(&self) -> Option<Scene> {
        self.scene_for(self.state.phase.number())
    }

    /// Renders the given phase number against the current session state.
    /// Numbers outside 1–7 render nothing.
    pub fn scene_for(&self, number: u8) -> Option<Scene> {
        if !self.mounted {
            return None;
        }
        let phase = Phase::from_number(number)?;
        let texts = &self.config.texts;

        let scene = match phase {
            Phase::Countdown => Scene::Countdown {
                remaining: self.state.countdown,
            },
            Phase::Title => Scene::Title {
                text: texts.title.clone(),
            },
            Phase::Balloons => Scene::Balloons {
                balloons: self.cast.balloons.clone(),
            },
            Phase::Greeting => Scene::Greeting {
                headline: texts.headline.clone(),
                photo: self.config.assets.photo.clone(),
                fireworks: self.cast.fireworks.clone(),
            },
            Phase::Blackout => Scene::Blackout,
            Phase::Theater => self.theater_scene(),
            Phase::Closing => Scene::Closing {
                text: texts.closing.clone(),
                fireworks: self.cast.fireworks.clone(),
            },
        };
        Some(scene)
    }

    /// Cancels all timers, stops the scoped cue and unmounts the theater.
    /// Every later call becomes a no-op.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.teardown_entry();
        if let Some(mut theater) = self.theater.take() {
            theater.unmount(&mut self.timers);
        }
        self.timers.clear();
        self.cast = Cast::default();
        self.mounted = false;
        tracing::info!(phase = self.state.phase.number(), "show unmounted");
    }

    fn theater_scene(&self) -> Scene {
        let stage = match &self.theater {
            Some(theater) => theater.view(self.now_ms()),
            None => TheaterView {
                curtains: CurtainState::Closed,
                show_children: false,
                playing: false,
                ended: false,
                audience: AUDIENCE_SIZE,
            },
        };

        let state = &self.state;
        let feature = if !stage.show_children {
            None
        } else if state.show_video && !state.show_quote {
            let source = self
                .theater
                .as_ref()
                .map_or_else(|| self.config.assets.video.clone(), |t| t.source().to_string());
            Some(Feature::Video { source })
        } else if state.video_ended && state.show_quote {
            Some(Feature::Quote {
                text: self.config.texts.quote.clone(),
            })
        } else {
            None
        };

        Scene::Theater { stage, feature }
    }

    fn dispatch(&mut self, action: TimerAction, due_ms: u64) {
        match action {
            TimerAction::CountdownTick => {
                if self.state.phase == Phase::Countdown && self.state.countdown > 0 {
                    self.state.countdown -= 1;
                    tracing::debug!(remaining = self.state.countdown, "countdown tick");
                    self.sync_entry();
                }
            }
            TimerAction::Advance(next) => {
                self.set_phase(next);
            }
            TimerAction::RevealVideo => self.state.show_video = true,
            TimerAction::RevealQuote => {
                self.state.show_quote = true;
                tracing::info!("quote revealed");
                self.arm(self.config.timings.quote_hold_ms, TimerAction::Finish);
            }
            TimerAction::Finish => {
                if self.set_phase(Phase::Closing) {
                    self.audio.play(Cue::FinalCelebration);
                }
            }
            TimerAction::OpenCurtains => {
                if let Some(theater) = self.theater.as_mut() {
                    theater.open_curtains(due_ms);
                }
            }
        }
    }

    fn on_content_finished(&mut self) {
        if self.state.video_ended {
            return;
        }
        self.state.video_ended = true;
        tracing::info!(at_ms = self.now_ms(), "feature finished");
        self.arm(self.config.timings.quote_delay_ms, TimerAction::RevealQuote);
    }

    /// Moves to `next` if it directly follows the current phase.
    fn set_phase(&mut self, next: Phase) -> bool {
        if self.state.phase.next() != Some(next) {
            tracing::warn!(
                current = self.state.phase.number(),
                requested = next.number(),
                "ignoring out-of-order phase change"
            );
            return false;
        }

        if self.state.phase == Phase::Theater {
            if let Some(mut theater) = self.theater.take() {
                theater.unmount(&mut self.timers);
            }
        }

        self.state.phase = next;
        let at_ms = self.now_ms();
        self.history.push(PhaseChange { at_ms, phase: next });
        tracing::info!(phase = next.number(), at_ms, "phase entered");
        self.sync_entry();
        true
    }

    /// Runs the entry action for the current `(phase, countdown)` pair unless
    /// it already ran for that pair.
    fn sync_entry(&mut self) {
        let key = EntryKey {
            phase: self.state.phase,
            countdown: self.state.countdown,
        };
        if self.entry.key == Some(key) {
            return;
        }

        self.teardown_entry();
        self.entry.key = Some(key);
        self.run_entry(key);
    }

    fn teardown_entry(&mut self) {
        self.timers.cancel_all(self.entry.timers.drain(..));
        if let Some(cue) = self.entry.cue.take() {
            self.audio.stop(cue);
        }
    }

    fn run_entry(&mut self, key: EntryKey) {
        let timings = self.config.timings.clone();
        match key.phase {
            Phase::Countdown if key.countdown > 0 => {
                self.audio.play(Cue::Countdown);
                self.entry.cue = Some(Cue::Countdown);
                self.arm(timings.countdown_tick_ms, TimerAction::CountdownTick);
            }
            Phase::Countdown => {
                self.audio.play(Cue::Celebration);
                self.arm(timings.celebration_hold_ms, TimerAction::Advance(Phase::Title));
            }
            Phase::Title => {
                self.arm(timings.title_ms, TimerAction::Advance(Phase::Balloons));
            }
            Phase::Balloons => {
                self.audio.play(Cue::BalloonPop);
                self.cast = Cast {
                    balloons: (0..BALLOON_COUNT)
                        .map(|_| Balloon::random(&mut self.rng))
                        .collect(),
                    fireworks: Vec::new(),
                };
                self.arm(timings.balloons_ms, TimerAction::Advance(Phase::Greeting));
            }
            Phase::Greeting => {
                self.audio.play(Cue::Firework);
                self.mount_fireworks(GREETING_FIREWORKS);
                self.arm(timings.greeting_ms, TimerAction::Advance(Phase::Blackout));
            }
            Phase::Blackout => {
                self.cast = Cast::default();
                self.arm(timings.blackout_ms, TimerAction::Advance(Phase::Theater));
            }
            Phase::Theater => {
                self.arm(timings.video_reveal_ms, TimerAction::RevealVideo);
                self.mount_theater();
            }
            Phase::Closing => self.mount_fireworks(CLOSING_FIREWORKS),
        }
    }

    fn mount_fireworks(&mut self, count: usize) {
        self.cast = Cast {
            balloons: Vec::new(),
            fireworks: (0..count).map(|_| Firework::random(&mut self.rng)).collect(),
        };
    }

    fn mount_theater(&mut self) {
        match self.content.take() {
            Some(player) => {
                self.theater = Some(Theater::mount(
                    player,
                    &self.viewport,
                    &mut self.timers,
                    &self.config.timings,
                    TimerAction::OpenCurtains,
                ));
            }
            None => tracing::warn!("no content player left, theater stays empty"),
        }
    }

    fn arm(&mut self, delay_ms: u64, action: TimerAction) {
        let id = self.timers.schedule(Duration::from_millis(delay_ms), action);
        self.entry.timers.push(id);
    }
}

impl Drop for PhaseSequencer {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for PhaseSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseSequencer")
            .field("state", &self.state)
            .field("now_ms", &self.now_ms())
            .field("theater", &self.theater)
            .field("mounted", &self.mounted)
            .finish()
    }
}
