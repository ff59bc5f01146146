// Deterministic spawn scheduling. Each source owns an accumulator that fires
// once per elapsed interval, so a long frame can fire more than once.

use rand::Rng;

use super::entity::{Entity, EntityKind};

/// Fixed-interval accumulator driven by tick time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnTimer {
    interval: f64,
    elapsed: f64,
}

impl SpawnTimer {
    pub fn new(interval: f64) -> Self {
        Self { interval, elapsed: 0.0 }
    }

    /// Advance by `dt` seconds; returns how many times the timer fired.
    pub fn advance(&mut self, dt: f64) -> u32 {
        if self.interval <= 0.0 {
            return 0;
        }
        self.elapsed += dt;
        let mut fired = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            fired += 1;
        }
        fired
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnSource {
    Obstacle,
    GroundItem,
    FallingItem,
    Bomb,
}

impl SpawnSource {
    pub const ALL: [SpawnSource; 4] = [
        SpawnSource::Obstacle,
        SpawnSource::GroundItem,
        SpawnSource::FallingItem,
        SpawnSource::Bomb,
    ];

    /// Build one entity with position/velocity drawn from this source's ranges.
    pub fn spawn<R: Rng + ?Sized>(self, rng: &mut R) -> Entity {
        match self {
            SpawnSource::Obstacle => {
                Entity::new(EntityKind::Obstacle, rng.gen_range(800.0..1000.0), 0.0, -200.0, 0.0)
            }
            SpawnSource::GroundItem => Entity::new(
                EntityKind::Item,
                rng.gen_range(800.0..900.0),
                rng.gen_range(40.0..160.0),
                -200.0,
                0.0,
            ),
            SpawnSource::FallingItem => Entity::new(
                EntityKind::Item,
                rng.gen_range(100.0..700.0),
                600.0,
                rng.gen_range(-60.0..60.0),
                rng.gen_range(-160.0..-100.0),
            ),
            SpawnSource::Bomb => Entity::new(
                EntityKind::Bomb,
                rng.gen_range(150.0..750.0),
                600.0,
                rng.gen_range(-80.0..-20.0),
                rng.gen_range(-300.0..-180.0),
            ),
        }
    }
}

/// The golden item enters from the right edge at jump height.
pub fn golden_item() -> Entity {
    Entity::new(EntityKind::GoldenItem, 800.0, 100.0, -200.0, 0.0)
}
