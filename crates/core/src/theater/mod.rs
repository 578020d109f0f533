//! Curtained stage that presents the feature clip during Phase 6.
//!
//! Lifecycle: curtains closed on mount (scrolling locked) → curtains open
//! after the configured delay, with an automatic playback attempt → clip
//! ended, reported to the owner exactly once.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    config::Timings,
    content::{ContentEvent, ContentPlayer, StartOrigin},
    timeline::{Scheduler, TimerId},
    viewport::{ScrollLock, Viewport},
    Result, ShowError,
};

/// Number of audience silhouettes drawn below the screen.
pub const AUDIENCE_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CurtainState {
    Closed,
    /// Curtains are sliding apart; `progress` runs from 0 to 1.
    Opening { progress: f32 },
    Open,
}

/// Upward signal from the theater to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TheaterSignal {
    Completed,
}

/// Snapshot used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TheaterView {
    pub curtains: CurtainState,
    pub show_children: bool,
    pub playing: bool,
    pub ended: bool,
    pub audience: usize,
}

pub struct Theater {
    show_screen: bool,
    is_playing: bool,
    is_video_ended: bool,
    completion_sent: bool,
    mounted: bool,
    curtain_timer: Option<TimerId>,
    opened_at_ms: Option<u64>,
    transition_ms: u64,
    scroll_lock: Option<ScrollLock>,
    player: Box<dyn ContentPlayer>,
}

impl Theater {
    /// Locks scrolling and arms the curtain timer. The owner routes the
    /// timer's `open_action` back to [`Theater::open_curtains`].
    pub fn mount<A: Clone>(
        player: Box<dyn ContentPlayer>,
        viewport: &Viewport,
        timers: &mut Scheduler<A>,
        timings: &Timings,
        open_action: A,
    ) -> Self {
        let scroll_lock = viewport.lock_scroll();
        let curtain_timer = timers.schedule(
            Duration::from_millis(timings.curtain_delay_ms),
            open_action,
        );
        tracing::info!(source = player.source(), "theater mounted, curtains closed");

        Self {
            show_screen: false,
            is_playing: false,
            is_video_ended: false,
            completion_sent: false,
            mounted: true,
            curtain_timer: Some(curtain_timer),
            opened_at_ms: None,
            transition_ms: timings.curtain_transition_ms,
            scroll_lock: Some(scroll_lock),
            player,
        }
    }

    /// Opens the curtains and tries to start the clip unless it already
    /// ended. A rejected start is not retried; the viewer has to call
    /// [`Theater::request_playback`].
    pub fn open_curtains(&mut self, now_ms: u64) {
        self.curtain_timer = None;
        if !self.mounted || self.show_screen {
            return;
        }

        self.show_screen = true;
        self.opened_at_ms = Some(now_ms);
        tracing::info!(at_ms = now_ms, "curtains opening");
        if self.is_video_ended {
            return;
        }

        match self.player.start(StartOrigin::Automatic) {
            Ok(()) => self.is_playing = true,
            Err(err) => {
                tracing::warn!(%err, "auto-play prevented, waiting for the viewer to start playback")
            }
        }
    }

    /// Viewer-initiated start. No-op once the clip has ended.
    pub fn request_playback(&mut self) -> Result<()> {
        if !self.mounted {
            return Err(ShowError::NotMounted("theater"));
        }
        if !self.children_visible() {
            return Err(ShowError::msg("the curtains are still closed"));
        }
        if self.is_playing || self.is_video_ended {
            return Ok(());
        }

        self.player.start(StartOrigin::Viewer)?;
        self.is_playing = true;
        Ok(())
    }

    /// Applies an event from the content resource. Returns
    /// [`TheaterSignal::Completed`] for the first `Ended` only.
    pub fn handle_content(&mut self, event: ContentEvent) -> Option<TheaterSignal> {
        if !self.mounted {
            return None;
        }

        match event {
            ContentEvent::Play => self.is_playing = true,
            ContentEvent::Pause => self.is_playing = false,
            ContentEvent::Ended => {
                self.is_playing = false;
                self.is_video_ended = true;
                if self.completion_sent {
                    tracing::debug!("duplicate end of content ignored");
                    return None;
                }
                self.completion_sent = true;
                tracing::info!("content ended");
                return Some(TheaterSignal::Completed);
            }
        }
        None
    }

    /// Cancels the curtain timer, pauses a running clip and releases the
    /// scroll lock.
    pub fn unmount<A: Clone>(&mut self, timers: &mut Scheduler<A>) {
        if let Some(id) = self.curtain_timer.take() {
            timers.cancel(id);
        }
        if self.is_playing {
            if let Err(err) = self.player.pause() {
                tracing::warn!(%err, "could not pause content on unmount");
            }
            self.is_playing = false;
        }
        self.scroll_lock = None;
        if self.mounted {
            self.mounted = false;
            tracing::debug!("theater unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn show_screen(&self) -> bool {
        self.show_screen
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_video_ended(&self) -> bool {
        self.is_video_ended
    }

    pub fn source(&self) -> &str {
        self.player.source()
    }

    pub fn children_visible(&self) -> bool {
        self.show_screen || self.is_video_ended
    }

    pub fn curtain_state(&self, now_ms: u64) -> CurtainState {
        let Some(opened_at) = self.opened_at_ms else {
            return if self.is_video_ended {
                CurtainState::Open
            } else {
                CurtainState::Closed
            };
        };

        let elapsed = now_ms.saturating_sub(opened_at);
        if self.transition_ms == 0 || elapsed >= self.transition_ms {
            CurtainState::Open
        } else {
            let t = Duration::from_millis(elapsed).as_secs_f32()
                / Duration::from_millis(self.transition_ms).as_secs_f32();
            CurtainState::Opening { progress: t }
        }
    }

    pub fn view(&self, now_ms: u64) -> TheaterView {
        TheaterView {
            curtains: self.curtain_state(now_ms),
            show_children: self.children_visible(),
            playing: self.is_playing,
            ended: self.is_video_ended,
            audience: AUDIENCE_SIZE,
        }
    }
}

impl std::fmt::Debug for Theater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Theater")
            .field("source", &self.player.source())
            .field("show_screen", &self.show_screen)
            .field("is_playing", &self.is_playing)
            .field("is_video_ended", &self.is_video_ended)
            .field("mounted", &self.mounted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{testing::ScriptedPlayer, viewport::ScrollMode};

    const OPEN: &str = "open-curtains";

    type Starts = Rc<RefCell<Vec<StartOrigin>>>;

    fn mount(block_autoplay: bool) -> (Theater, Scheduler<&'static str>, Viewport, Starts) {
        let player = ScriptedPlayer::new(block_autoplay);
        let starts = player.starts();
        let viewport = Viewport::new();
        let mut timers = Scheduler::new();
        let theater = Theater::mount(
            Box::new(player),
            &viewport,
            &mut timers,
            &Timings::default(),
            OPEN,
        );
        (theater, timers, viewport, starts)
    }

    fn run_until(theater: &mut Theater, timers: &mut Scheduler<&'static str>, until: u64) {
        while let Some(fired) = timers.pop_due(until) {
            assert_eq!(fired.action, OPEN);
            theater.open_curtains(fired.due_ms);
        }
        timers.advance_clock_to(until);
    }

    #[test]
    fn curtains_open_exactly_after_delay() {
        let (mut theater, mut timers, viewport, starts) = mount(false);

        assert_eq!(viewport.scroll_mode(), ScrollMode::Hidden);
        assert!(!theater.children_visible());
        assert_eq!(theater.curtain_state(0), CurtainState::Closed);

        run_until(&mut theater, &mut timers, 1_999);
        assert!(!theater.show_screen());

        run_until(&mut theater, &mut timers, 2_000);
        assert!(theater.show_screen());
        assert!(theater.is_playing());
        assert!(theater.children_visible());
        assert_eq!(starts.borrow().as_slice(), &[StartOrigin::Automatic]);
    }

    #[test]
    fn curtain_transition_takes_configured_time() {
        let (mut theater, mut timers, _viewport, _player) = mount(false);
        run_until(&mut theater, &mut timers, 2_000);

        assert_eq!(
            theater.curtain_state(3_000),
            CurtainState::Opening { progress: 0.5 }
        );
        assert_eq!(theater.curtain_state(4_000), CurtainState::Open);
    }

    #[test]
    fn rejected_autoplay_waits_for_the_viewer() {
        let (mut theater, mut timers, _viewport, starts) = mount(true);

        run_until(&mut theater, &mut timers, 10_000);
        assert!(theater.show_screen());
        assert!(!theater.is_playing());
        assert_eq!(starts.borrow().len(), 1);

        theater.request_playback().unwrap();
        assert!(theater.is_playing());
        assert_eq!(
            starts.borrow().as_slice(),
            &[StartOrigin::Automatic, StartOrigin::Viewer]
        );
    }

    #[test]
    fn playback_cannot_be_requested_behind_closed_curtains() {
        let (mut theater, _timers, _viewport, starts) = mount(false);

        assert!(theater.request_playback().is_err());
        assert!(starts.borrow().is_empty());
    }

    #[test]
    fn play_and_pause_toggle_playing() {
        let (mut theater, mut timers, _viewport, _player) = mount(true);
        run_until(&mut theater, &mut timers, 2_000);

        assert_eq!(theater.handle_content(ContentEvent::Play), None);
        assert!(theater.is_playing());
        assert_eq!(theater.handle_content(ContentEvent::Pause), None);
        assert!(!theater.is_playing());
    }

    #[test]
    fn completion_is_signalled_once() {
        let (mut theater, mut timers, _viewport, _player) = mount(false);
        run_until(&mut theater, &mut timers, 2_000);

        assert_eq!(
            theater.handle_content(ContentEvent::Ended),
            Some(TheaterSignal::Completed)
        );
        assert_eq!(theater.handle_content(ContentEvent::Ended), None);
        assert!(theater.is_video_ended());
        assert!(!theater.is_playing());
        assert!(theater.children_visible());
    }

    #[test]
    fn ended_content_is_never_restarted() {
        let (mut theater, mut timers, _viewport, starts) = mount(false);

        assert_eq!(
            theater.handle_content(ContentEvent::Ended),
            Some(TheaterSignal::Completed)
        );
        run_until(&mut theater, &mut timers, 2_000);
        assert!(theater.show_screen());
        assert!(!theater.is_playing());

        theater.request_playback().unwrap();
        assert!(!theater.is_playing());
        assert!(starts.borrow().is_empty());
    }

    #[test]
    fn unmounting_pauses_running_content() {
        let player = ScriptedPlayer::new(false);
        let pauses = player.pauses();
        let viewport = Viewport::new();
        let mut timers = Scheduler::new();
        let mut theater = Theater::mount(
            Box::new(player),
            &viewport,
            &mut timers,
            &Timings::default(),
            OPEN,
        );
        run_until(&mut theater, &mut timers, 2_000);
        assert!(theater.is_playing());

        theater.unmount(&mut timers);
        theater.unmount(&mut timers);
        assert!(!theater.is_playing());
        assert_eq!(pauses.get(), 1);
    }

    #[test]
    fn unmount_cancels_timer_and_restores_scroll() {
        let (mut theater, mut timers, viewport, _player) = mount(false);

        theater.unmount(&mut timers);
        assert!(timers.is_empty());
        assert_eq!(viewport.scroll_mode(), ScrollMode::Auto);

        run_until(&mut theater, &mut timers, 10_000);
        assert!(!theater.show_screen());
        assert_eq!(theater.handle_content(ContentEvent::Ended), None);
    }

    #[test]
    fn dropping_a_mounted_theater_releases_scroll() {
        let (theater, _timers, viewport, _player) = mount(false);
        drop(theater);
        assert_eq!(viewport.scroll_mode(), ScrollMode::Auto);
    }
}
