use serde::{Deserialize, Serialize};

use crate::{
    emitters::{Balloon, Firework},
    theater::TheaterView,
};

pub const BALLOON_COUNT: usize = 30;
pub const GREETING_FIREWORKS: usize = 4;
pub const CLOSING_FIREWORKS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneKind {
    Countdown,
    Title,
    Balloons,
    Greeting,
    Blackout,
    Theater,
    Closing,
}

/// Content shown on the theater screen once the curtains are open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    Video { source: String },
    Quote { text: String },
}

/// Everything a renderer needs to draw one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scene {
    Countdown {
        remaining: u32,
    },
    Title {
        text: String,
    },
    Balloons {
        balloons: Vec<Balloon>,
    },
    Greeting {
        headline: String,
        photo: String,
        fireworks: Vec<Firework>,
    },
    Blackout,
    Theater {
        stage: TheaterView,
        feature: Option<Feature>,
    },
    Closing {
        text: String,
        fireworks: Vec<Firework>,
    },
}

impl Scene {
    pub fn kind(&self) -> SceneKind {
        match self {
            Scene::Countdown { .. } => SceneKind::Countdown,
            Scene::Title { .. } => SceneKind::Title,
            Scene::Balloons { .. } => SceneKind::Balloons,
            Scene::Greeting { .. } => SceneKind::Greeting,
            Scene::Blackout => SceneKind::Blackout,
            Scene::Theater { .. } => SceneKind::Theater,
            Scene::Closing { .. } => SceneKind::Closing,
        }
    }

    pub fn balloons(&self) -> &[Balloon] {
        match self {
            Scene::Balloons { balloons } => balloons,
            _ => &[],
        }
    }

    pub fn fireworks(&self) -> &[Firework] {
        match self {
            Scene::Greeting { fireworks, .. } | Scene::Closing { fireworks, .. } => fireworks,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn emitter_accessors_follow_the_variant() {
        let mut rng = StdRng::seed_from_u64(5);
        let closing = Scene::Closing {
            text: "bye".to_string(),
            fireworks: vec![Firework::random(&mut rng)],
        };

        assert_eq!(closing.kind(), SceneKind::Closing);
        assert_eq!(closing.fireworks().len(), 1);
        assert!(closing.balloons().is_empty());
        assert!(Scene::Blackout.fireworks().is_empty());
    }
}
