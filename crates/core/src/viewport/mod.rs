//! Page-level scroll state shared between the sequencer and the theater.

use std::{cell::Cell, rc::Rc};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScrollMode {
    #[default]
    Auto,
    Hidden,
}

/// Cloneable handle to the viewport. The show is single threaded, so the
/// handle is `Rc` based.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    scroll: Rc<Cell<ScrollMode>>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_mode(&self) -> ScrollMode {
        self.scroll.get()
    }

    /// Hides scrolling until the returned guard is dropped, which restores
    /// whatever mode was active before.
    pub fn lock_scroll(&self) -> ScrollLock {
        let previous = self.scroll.replace(ScrollMode::Hidden);
        tracing::debug!(?previous, "scroll locked");
        ScrollLock {
            scroll: Rc::clone(&self.scroll),
            previous,
        }
    }
}

#[derive(Debug)]
#[must_use = "scrolling is restored as soon as the lock is dropped"]
pub struct ScrollLock {
    scroll: Rc<Cell<ScrollMode>>,
    previous: ScrollMode,
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.scroll.set(self.previous);
        tracing::debug!(restored = ?self.previous, "scroll released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_restores_previous_mode() {
        let viewport = Viewport::new();
        assert_eq!(viewport.scroll_mode(), ScrollMode::Auto);

        let lock = viewport.lock_scroll();
        assert_eq!(viewport.clone().scroll_mode(), ScrollMode::Hidden);

        drop(lock);
        assert_eq!(viewport.scroll_mode(), ScrollMode::Auto);
    }

    #[test]
    fn nested_locks_unwind_in_order() {
        let viewport = Viewport::new();
        let outer = viewport.lock_scroll();
        let inner = viewport.lock_scroll();

        drop(inner);
        assert_eq!(viewport.scroll_mode(), ScrollMode::Hidden);
        drop(outer);
        assert_eq!(viewport.scroll_mode(), ScrollMode::Auto);
    }
}
