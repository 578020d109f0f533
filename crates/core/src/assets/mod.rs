use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{audio::Cue, config::ShowConfig, Result, ShowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Image,
    Video,
    Audio,
}

/// Registry of every file the show references, resolved against one root.
#[derive(Debug, Default)]
pub struct AssetStore {
    root: PathBuf,
    assets: BTreeMap<String, AssetKind>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            assets: BTreeMap::new(),
        }
    }

    /// Registers the photo, the feature clip and every cue of `config`.
    pub fn for_show(root: impl Into<PathBuf>, config: &ShowConfig) -> Self {
        let mut store = Self::new(root);
        store.register(&config.assets.photo, AssetKind::Image);
        store.register(&config.assets.video, AssetKind::Video);
        for cue in [
            Cue::Countdown,
            Cue::BalloonPop,
            Cue::Firework,
            Cue::Celebration,
            Cue::FinalCelebration,
        ] {
            store.register(&cue.spec(&config.cues).path, AssetKind::Audio);
        }
        store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn register(&mut self, id: &str, kind: AssetKind) {
        self.assets.insert(id.to_string(), kind);
    }

    pub fn kind(&self, id: &str) -> Option<AssetKind> {
        self.assets.get(id).copied()
    }

    pub fn resolve(&self, id: &str) -> Result<PathBuf> {
        if self.assets.contains_key(id) {
            Ok(self.root.join(id))
        } else {
            Err(ShowError::UnknownAsset(id.to_string()))
        }
    }

    /// Registered assets with no file on disk.
    pub fn missing(&self) -> Vec<PathBuf> {
        self.assets
            .keys()
            .map(|id| self.root.join(id))
            .filter(|path| !path.is_file())
            .collect()
    }
}
