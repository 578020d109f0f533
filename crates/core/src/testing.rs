//! Recording doubles shared by the unit tests.

use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    rc::Rc,
};

use crate::{
    audio::CueBackend,
    config::CueSpec,
    content::{ContentPlayer, StartOrigin},
    Result, ShowError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueCall {
    Start(String),
    Stop(String),
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    log: Rc<RefCell<Vec<CueCall>>>,
    rejected: HashSet<String>,
}

impl RecordingBackend {
    pub fn rejecting(paths: &[&str]) -> Self {
        Self {
            log: Rc::default(),
            rejected: paths.iter().map(|path| path.to_string()).collect(),
        }
    }

    pub fn log(&self) -> Rc<RefCell<Vec<CueCall>>> {
        Rc::clone(&self.log)
    }
}

impl CueBackend for RecordingBackend {
    fn start(&mut self, cue: &CueSpec) -> Result<()> {
        self.log.borrow_mut().push(CueCall::Start(cue.path.clone()));
        if self.rejected.contains(&cue.path) {
            return Err(ShowError::rejected(&cue.path, "blocked by test"));
        }
        Ok(())
    }

    fn stop(&mut self, cue: &CueSpec) {
        self.log.borrow_mut().push(CueCall::Stop(cue.path.clone()));
    }
}

/// Content player whose automatic starts can be made to fail.
#[derive(Debug)]
pub struct ScriptedPlayer {
    starts: Rc<RefCell<Vec<StartOrigin>>>,
    pauses: Rc<Cell<usize>>,
    block_autoplay: bool,
}

impl ScriptedPlayer {
    pub fn new(block_autoplay: bool) -> Self {
        Self {
            starts: Rc::default(),
            pauses: Rc::default(),
            block_autoplay,
        }
    }

    pub fn starts(&self) -> Rc<RefCell<Vec<StartOrigin>>> {
        Rc::clone(&self.starts)
    }

    pub fn pauses(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.pauses)
    }
}

impl ContentPlayer for ScriptedPlayer {
    fn source(&self) -> &str {
        "video/feature.mp4"
    }

    fn start(&mut self, origin: StartOrigin) -> Result<()> {
        self.starts.borrow_mut().push(origin);
        if self.block_autoplay && origin == StartOrigin::Automatic {
            return Err(ShowError::rejected(self.source(), "autoplay blocked"));
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.pauses.set(self.pauses.get() + 1);
        Ok(())
    }
}
