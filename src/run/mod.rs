//! Endless-runner simulation.
//!
//! A [`RunState`] is one 30 second play session: `Ready` until the run screen
//! starts it, `Running` while ticks advance the countdown, `Ended` once time is
//! up. It is renderer-agnostic; the browser layer feeds it frame deltas and
//! input, and draws whatever it exposes.
//!
//! All per-frame constants (decay factors, points per tick) assume 60 Hz and are
//! rescaled by `dt * 60` so a slower or faster display plays the same.
//!
//! Persistent side effects (distance unlocks, coin totals) are not applied here;
//! they come back as [`RunEvent`]s and a [`RunSummary`] for the screen layer.

use rand::rngs::SmallRng;

use crate::characters::{Character, GOLDEN_CHARACTER_ID, SpecialAbility};

pub mod config;
pub mod entity;
pub mod spawn;

pub use config::RunConfig;
pub use entity::{Entity, EntityKind, PLAYER_SIZE, Rect};
pub use spawn::{SpawnSource, SpawnTimer};

/// Longest frame we simulate in one step (tab switches, debugger pauses).
pub const MAX_TICK_SECS: f64 = 0.1;

/// Characters earned by covering a distance inside a single run.
pub static DISTANCE_UNLOCKS: [(f64, &str); 2] = [(5000.0, GOLDEN_CHARACTER_ID), (10000.0, "shadow_subaru")];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Ready,
    Running,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunInput {
    Tap,  // accelerate
    Jump,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RunEvent {
    Tapped,
    Jumped { double: bool },
    Wrapped,
    ItemCollected { points: u64, coins: u64 },
    GoldenCollected { points: u64, coins: u64 },
    ObstacleHit,
    BombHit { coins_lost: u64 },
    GoldenSpawned,
    CharacterUnlocked(&'static str),
    TimeUp,
}

/// What the result screen receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub score: u64,
    pub distance: u64,
    pub taps: u32,
    pub coins: u64,
}

pub struct RunState {
    config: RunConfig,
    character: &'static Character,
    phase: RunPhase,

    score: u64,
    distance: f64,
    combo: f64,
    taps: u32,
    remaining: f64,
    coins: u64,

    // horizontal
    x: f64,
    velocity: f64,
    acceleration: f64,
    fresh_tap: bool,

    // vertical
    y: f64,
    vy: f64,
    grounded: bool,
    double_jump_used: bool,

    invulnerable: f64,
    golden_spawned: bool,
    unlocks_sent: usize,

    entities: Vec<Entity>,
    timers: [(SpawnSource, SpawnTimer); 4],
    rng: SmallRng,
}

impl RunState {
    pub fn new(config: RunConfig, character: &'static Character, rng: SmallRng) -> Self {
        let timers = SpawnSource::ALL.map(|src| {
            let interval = match src {
                SpawnSource::Obstacle => config.obstacle_interval,
                SpawnSource::GroundItem => config.item_interval,
                SpawnSource::FallingItem => config.falling_item_interval,
                SpawnSource::Bomb => config.bomb_interval,
            };
            (src, SpawnTimer::new(interval))
        });
        Self {
            remaining: config.duration_secs,
            x: 100.0,
            config,
            character,
            phase: RunPhase::Ready,
            score: 0,
            distance: 0.0,
            combo: 1.0,
            taps: 0,
            coins: 0,
            velocity: 0.0,
            acceleration: 0.0,
            fresh_tap: false,
            y: 0.0,
            vy: 0.0,
            grounded: true,
            double_jump_used: false,
            invulnerable: 0.0,
            golden_spawned: false,
            unlocks_sent: 0,
            entities: Vec::new(),
            timers,
            rng,
        }
    }

    pub fn start(&mut self) {
        if self.phase == RunPhase::Ready {
            log::info!("run started as {}", self.character.id);
            self.phase = RunPhase::Running;
        }
    }

    // --- Accessors ---

    pub fn phase(&self) -> RunPhase { self.phase }
    pub fn character(&self) -> &'static Character { self.character }
    pub fn config(&self) -> &RunConfig { &self.config }
    pub fn score(&self) -> u64 { self.score }
    pub fn distance(&self) -> f64 { self.distance }
    pub fn combo(&self) -> f64 { self.combo }
    pub fn taps(&self) -> u32 { self.taps }
    pub fn coins(&self) -> u64 { self.coins }
    pub fn x(&self) -> f64 { self.x }
    pub fn y(&self) -> f64 { self.y }
    pub fn velocity(&self) -> f64 { self.velocity }
    pub fn acceleration(&self) -> f64 { self.acceleration }
    pub fn is_grounded(&self) -> bool { self.grounded }
    pub fn is_invulnerable(&self) -> bool { self.invulnerable > 0.0 }
    pub fn golden_spawned(&self) -> bool { self.golden_spawned }
    pub fn entities(&self) -> &[Entity] { &self.entities }

    /// Whole seconds left, as shown on the HUD.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining.max(0.0).ceil() as u32
    }

    pub fn max_speed(&self) -> f64 {
        self.config.max_speed * self.character.speed
    }

    pub fn player_bounds(&self) -> Rect {
        Rect::new(self.x, self.y, PLAYER_SIZE)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            score: self.score,
            distance: self.distance.max(0.0).floor() as u64,
            taps: self.taps,
            coins: self.coins,
        }
    }

    /// Place an entity directly (golden item, scripted demos).
    pub fn push_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    // --- Input ---

    pub fn input(&mut self, input: RunInput) -> Option<RunEvent> {
        if self.phase != RunPhase::Running {
            return None;
        }
        match input {
            RunInput::Tap => {
                self.taps += 1;
                self.acceleration += self.config.tap_acceleration;
                self.fresh_tap = true;
                Some(RunEvent::Tapped)
            }
            RunInput::Jump => self.jump(),
        }
    }

    fn jump(&mut self) -> Option<RunEvent> {
        let impulse = self.config.jump_velocity * self.character.jump;
        if self.grounded {
            self.vy = impulse;
            self.grounded = false;
            self.double_jump_used = false;
            return Some(RunEvent::Jumped { double: false });
        }
        let can_double = self.character.has_ability(SpecialAbility::DoubleJump)
            && !self.double_jump_used
            && self.vy < self.config.double_jump_max_rise;
        if can_double {
            self.vy = impulse;
            self.double_jump_used = true;
            return Some(RunEvent::Jumped { double: true });
        }
        None
    }

    // --- Simulation ---

    /// Advance by `dt` seconds of real time. Returns what happened this tick.
    pub fn tick(&mut self, dt: f64) -> Vec<RunEvent> {
        let mut events = Vec::new();
        if self.phase != RunPhase::Running || dt <= 0.0 {
            return events;
        }
        let dt = dt.min(MAX_TICK_SECS);
        let frames = dt * 60.0;

        self.remaining -= dt;
        self.update_horizontal(frames);
        self.update_position(dt, frames, &mut events);
        self.update_vertical(dt);
        self.check_distance_milestones(&mut events);
        self.spawn(dt);
        for e in &mut self.entities {
            e.step(dt);
        }
        self.invulnerable = (self.invulnerable - dt).max(0.0);
        self.resolve_collisions(&mut events);
        self.entities.retain(|e| !e.is_gone());

        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.phase = RunPhase::Ended;
            self.velocity = 0.0;
            self.acceleration = 0.0;
            log::info!(
                "run ended: score {} distance {:.0} taps {}",
                self.score,
                self.distance,
                self.taps
            );
            events.push(RunEvent::TimeUp);
        }
        events
    }

    fn update_horizontal(&mut self, frames: f64) {
        let cfg = &self.config;
        self.velocity += self.acceleration * frames;
        self.velocity = self.velocity.min(cfg.max_speed * self.character.speed);
        if !self.fresh_tap {
            self.velocity *= cfg.velocity_decay.powf(frames);
        }
        self.fresh_tap = false;
        self.acceleration *= cfg.acceleration_decay.powf(frames);
        if self.acceleration < cfg.acceleration_epsilon {
            self.acceleration = 0.0;
        }
        if self.velocity < cfg.velocity_epsilon {
            self.velocity = 0.0;
        }
    }

    fn update_position(&mut self, dt: f64, frames: f64, events: &mut Vec<RunEvent>) {
        self.x += self.velocity * dt;
        if self.x > self.config.right_boundary {
            self.x = self.config.left_offset;
            self.distance += self.config.wrap_bonus;
            events.push(RunEvent::Wrapped);
        }
        if self.velocity > 0.0 {
            self.distance += self.velocity * self.config.distance_per_speed * frames;
            self.add_score(self.config.tick_points);
        }
    }

    fn update_vertical(&mut self, dt: f64) {
        if self.grounded {
            return;
        }
        self.vy -= self.config.gravity * dt;
        self.y += self.vy * dt;
        if self.y <= 0.0 {
            self.y = 0.0;
            self.vy = 0.0;
            self.grounded = true;
            self.double_jump_used = false;
        }
    }

    fn check_distance_milestones(&mut self, events: &mut Vec<RunEvent>) {
        if !self.golden_spawned && self.distance >= self.config.golden_distance {
            self.golden_spawned = true;
            self.entities.push(spawn::golden_item());
            log::info!("golden item spawned at {:.0}", self.distance);
            events.push(RunEvent::GoldenSpawned);
        }
        while let Some(&(threshold, id)) = DISTANCE_UNLOCKS.get(self.unlocks_sent) {
            if self.distance < threshold {
                break;
            }
            self.unlocks_sent += 1;
            events.push(RunEvent::CharacterUnlocked(id));
        }
    }

    fn spawn(&mut self, dt: f64) {
        for (src, timer) in self.timers.iter_mut() {
            for _ in 0..timer.advance(dt) {
                let e = src.spawn(&mut self.rng);
                log::debug!("spawn {:?} at ({:.0}, {:.0})", e.kind, e.x, e.y);
                self.entities.push(e);
            }
        }
    }

    fn resolve_collisions(&mut self, events: &mut Vec<RunEvent>) {
        let mut i = 0;
        while i < self.entities.len() {
            let entity = self.entities[i];
            let consumed = self.collide(entity, events);
            if consumed {
                self.entities.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Returns whether the entity was used up.
    fn collide(&mut self, entity: Entity, events: &mut Vec<RunEvent>) -> bool {
        let player = self.player_bounds();
        let reach = if entity.kind.is_pickup() && self.character.has_ability(SpecialAbility::ItemMagnet) {
            player.scaled(self.config.magnet_factor)
        } else {
            player
        };
        if !reach.overlaps(&entity.bounds()) {
            return false;
        }
        if entity.kind.is_hazard() && self.is_invulnerable() {
            return false;
        }
        match entity.kind {
            EntityKind::Item => {
                let step = if self.character.has_ability(SpecialAbility::ComboBoost) {
                    self.config.combo_step * self.config.combo_boost
                } else {
                    self.config.combo_step
                };
                self.combo = (self.combo + step).min(self.config.combo_max);
                let points = self.add_score(self.config.item_points);
                let coins = self.coin_reward(self.config.item_coins);
                self.coins += coins;
                events.push(RunEvent::ItemCollected { points, coins });
            }
            EntityKind::GoldenItem => {
                let points = self.add_score(self.config.golden_points);
                let coins = self.coin_reward(self.config.golden_coins);
                self.coins += coins;
                events.push(RunEvent::GoldenCollected { points, coins });
            }
            EntityKind::Obstacle => {
                self.combo = 1.0;
                self.velocity = (self.velocity - self.config.obstacle_slowdown).max(0.0);
                self.acceleration = 0.0;
                self.x = (self.x - self.config.knockback).max(self.config.min_x);
                self.start_invulnerability();
                events.push(RunEvent::ObstacleHit);
            }
            EntityKind::Bomb => {
                self.combo = 1.0;
                self.velocity *= self.config.bomb_speed_factor;
                self.acceleration = 0.0;
                let coins_lost = self.coins.min(self.config.bomb_coin_loss);
                self.coins -= coins_lost;
                self.x = (self.x - self.config.bomb_knockback).max(self.config.min_x);
                self.vy = self.config.bomb_lift;
                self.grounded = false;
                self.start_invulnerability();
                events.push(RunEvent::BombHit { coins_lost });
            }
        }
        true
    }

    fn start_invulnerability(&mut self) {
        let factor = if self.character.has_ability(SpecialAbility::LongInvincibility) { 2.0 } else { 1.0 };
        self.invulnerable = self.config.invulnerable_secs * factor;
    }

    fn coin_reward(&self, base: u64) -> u64 {
        if self.character.has_ability(SpecialAbility::CoinDouble) { base * 2 } else { base }
    }

    /// Score `floor(points * combo)`; returns the amount added.
    fn add_score(&mut self, points: u64) -> u64 {
        let gained = (points as f64 * self.combo).floor() as u64;
        self.score += gained;
        gained
    }
}
