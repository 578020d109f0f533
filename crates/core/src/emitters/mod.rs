//! Decorative emitters: balloons and fireworks.
//!
//! Each instance draws its parameters once from the supplied RNG and then
//! loops forever. Sampling is a pure function of elapsed time since mount.

use std::f32::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalloonColor {
    Red,
    Blue,
    Yellow,
    Green,
    Purple,
    Pink,
    Orange,
    Indigo,
    Teal,
}

pub const BALLOON_COLORS: [BalloonColor; 9] = [
    BalloonColor::Red,
    BalloonColor::Blue,
    BalloonColor::Yellow,
    BalloonColor::Green,
    BalloonColor::Purple,
    BalloonColor::Pink,
    BalloonColor::Orange,
    BalloonColor::Indigo,
    BalloonColor::Teal,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balloon {
    pub color: BalloonColor,
    /// Horizontal launch position, 0–100 % of the viewport width.
    pub x_percent: f32,
    pub delay_s: f32,
    /// Time for one rise across the viewport.
    pub duration_s: f32,
    pub size_px: u32,
    /// Maximum sideways drift, negative to the left.
    pub swing_px: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalloonPosition {
    pub x_percent: f32,
    pub sway_px: f32,
    /// 0 at the bottom edge, 1 once the balloon has left the top.
    pub rise: f32,
    pub opacity: f32,
}

impl Balloon {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            color: BALLOON_COLORS[rng.gen_range(0..BALLOON_COLORS.len())],
            x_percent: rng.gen_range(0.0..100.0),
            delay_s: rng.gen_range(0.0..2.0),
            duration_s: rng.gen_range(2.0..4.0),
            size_px: 50 + rng.gen_range(0..8),
            swing_px: rng.gen_range(-50.0..=50.0),
        }
    }

    pub fn height_px(&self) -> f32 {
        self.size_px as f32 * 1.2
    }

    /// Position `t_s` seconds after mount, `None` while still waiting for
    /// its launch delay.
    pub fn position_at(&self, t_s: f32) -> Option<BalloonPosition> {
        let local = t_s - self.delay_s;
        if local < 0.0 {
            return None;
        }

        let cycles = local / self.duration_s;
        let p = cycles.fract();
        let rise = ease_out(p);
        let opacity = if p < 1.0 / 3.0 {
            p * 3.0
        } else if p < 2.0 / 3.0 {
            1.0
        } else {
            (1.0 - p) * 3.0
        };

        // sway runs back and forth on the same period
        let forward = (cycles.floor() as u64) % 2 == 0;
        let s = if forward { p } else { 1.0 - p };

        Some(BalloonPosition {
            x_percent: self.x_percent,
            sway_px: self.swing_px * ease_in_out(s),
            rise,
            opacity,
        })
    }
}

pub const FIREWORK_COLORS: [Rgb; 6] = [
    Rgb(0xFF, 0xD7, 0x00),
    Rgb(0xFF, 0x6B, 0x6B),
    Rgb(0x4E, 0xCD, 0xC4),
    Rgb(0x45, 0xB7, 0xD1),
    Rgb(0x96, 0xCE, 0xB4),
    Rgb(0xFF, 0xEE, 0xAD),
];

pub const PRIMARY_PARTICLES: usize = 24;
pub const SECONDARY_PARTICLES: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub angle_deg: f32,
    pub radius: f32,
    pub color: Rgb,
    pub delay_s: f32,
    pub period_s: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spark {
    pub dx: f32,
    pub dy: f32,
    pub color: Rgb,
    /// 1 at the burst centre, fading to 0 at full radius.
    pub intensity: f32,
}

impl Particle {
    fn sample(&self, t_s: f32) -> Option<Spark> {
        let local = t_s - self.delay_s;
        if local < 0.0 {
            return None;
        }

        let p = (local / self.period_s).fract();
        let reach = self.radius * ease_out(p);
        let angle = self.angle_deg * PI / 180.0;
        Some(Spark {
            dx: angle.cos() * reach,
            dy: angle.sin() * reach,
            color: self.color,
            intensity: 1.0 - p,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firework {
    pub primary: Vec<Particle>,
    pub secondary: Vec<Particle>,
}

impl Firework {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let primary = (0..PRIMARY_PARTICLES)
            .map(|i| Particle {
                angle_deg: i as f32 / PRIMARY_PARTICLES as f32 * 360.0,
                radius: rng.gen_range(60.0..80.0),
                color: random_color(rng),
                delay_s: rng.gen_range(0.0..0.5),
                period_s: 1.5,
            })
            .collect();
        let secondary = (0..SECONDARY_PARTICLES)
            .map(|i| Particle {
                angle_deg: i as f32 / SECONDARY_PARTICLES as f32 * 360.0,
                radius: 30.0,
                color: random_color(rng),
                delay_s: rng.gen_range(0.5..1.0),
                period_s: 1.0,
            })
            .collect();

        Self { primary, secondary }
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.primary.iter().chain(&self.secondary)
    }

    /// Every particle visible `t_s` seconds after mount.
    pub fn sparks_at(&self, t_s: f32) -> Vec<Spark> {
        self.particles()
            .filter_map(|particle| particle.sample(t_s))
            .collect()
    }

    /// Scale of the pulsing centre glow, 1.0 → 1.5 → 1.0 every second.
    pub fn glow_at(&self, t_s: f32) -> f32 {
        let p = t_s.max(0.0).fract();
        let s = if p < 0.5 { p * 2.0 } else { (1.0 - p) * 2.0 };
        1.0 + 0.5 * ease_in_out(s)
    }
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    FIREWORK_COLORS[rng.gen_range(0..FIREWORK_COLORS.len())]
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

fn ease_in_out(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn seeded_rng_reproduces_parameters() {
        let a = Balloon::random(&mut StdRng::seed_from_u64(7));
        let b = Balloon::random(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let a = Firework::random(&mut StdRng::seed_from_u64(7));
        let b = Firework::random(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn balloon_parameters_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let balloon = Balloon::random(&mut rng);
            assert!((0.0..100.0).contains(&balloon.x_percent));
            assert!((0.0..2.0).contains(&balloon.delay_s));
            assert!((2.0..4.0).contains(&balloon.duration_s));
            assert!((50..58).contains(&balloon.size_px));
            assert!((-50.0..=50.0).contains(&balloon.swing_px));
        }
    }

    #[test]
    fn balloon_waits_for_its_delay_then_loops() {
        let balloon = Balloon {
            color: BalloonColor::Red,
            x_percent: 10.0,
            delay_s: 1.0,
            duration_s: 2.0,
            size_px: 50,
            swing_px: 40.0,
        };

        assert!(balloon.position_at(0.5).is_none());

        let start = balloon.position_at(1.0).unwrap();
        assert_eq!(start.rise, 0.0);
        assert_eq!(start.opacity, 0.0);

        let mid = balloon.position_at(2.0).unwrap();
        assert_eq!(mid.rise, 0.75);
        assert_eq!(mid.opacity, 1.0);
        assert_eq!(mid.sway_px, 20.0);

        let again = balloon.position_at(5.0).unwrap();
        assert_eq!(again.rise, 0.0);
        assert!((balloon.height_px() - 60.0).abs() < 1e-4);
    }

    #[test]
    fn firework_particles_are_evenly_spread() {
        let firework = Firework::random(&mut StdRng::seed_from_u64(3));

        assert_eq!(firework.primary.len(), PRIMARY_PARTICLES);
        assert_eq!(firework.secondary.len(), SECONDARY_PARTICLES);
        assert_eq!(firework.primary[6].angle_deg, 90.0);
        assert_eq!(firework.secondary[3].angle_deg, 90.0);
        assert!(firework
            .primary
            .iter()
            .all(|p| (60.0..80.0).contains(&p.radius) && p.delay_s < 0.5));
        assert!(firework
            .secondary
            .iter()
            .all(|p| p.radius == 30.0 && (0.5..1.0).contains(&p.delay_s)));
    }

    #[test]
    fn every_particle_is_lit_after_the_longest_delay() {
        let firework = Firework::random(&mut StdRng::seed_from_u64(11));

        assert!(firework.sparks_at(0.0).len() < PRIMARY_PARTICLES + SECONDARY_PARTICLES);
        let sparks = firework.sparks_at(1.0);
        assert_eq!(sparks.len(), PRIMARY_PARTICLES + SECONDARY_PARTICLES);
        assert!(sparks.iter().all(|s| (0.0..=1.0).contains(&s.intensity)));
    }

    #[test]
    fn glow_pulses_between_one_and_one_and_a_half() {
        let firework = Firework::random(&mut StdRng::seed_from_u64(1));
        assert_eq!(firework.glow_at(0.0), 1.0);
        assert_eq!(firework.glow_at(0.5), 1.5);
    }
}
