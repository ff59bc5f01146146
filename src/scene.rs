//! Screen flow as an explicit state machine.
//!
//! [`Game`] owns every store (injected once at start-up) and the current
//! [`Screen`]. The browser layer forwards input and frame deltas to it and then
//! drains the queued sound cues / melody notes / notices for presentation.

use chrono::{Local, NaiveDate};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::audio::{Cue, Melody, Tone};
use crate::characters::{Character, default_character, find_character};
use crate::error::StoreResult;
use crate::gacha;
use crate::ranking::{RankingEntry, RankingStore};
use crate::run::{RunConfig, RunEvent, RunInput, RunPhase, RunState, RunSummary};
use crate::stats::StatsStore;
use crate::storage::KeyValueStore;

/// Pause between time-up and the result screen.
pub const RESULT_DELAY_SECS: f64 = 1.0;
pub const NOTICE_SECS: f64 = 3.0;

pub struct ResultScreen {
    pub summary: RunSummary,
    pub registered_name: Option<String>,
}

impl ResultScreen {
    pub fn taps_per_second(&self, duration_secs: f64) -> f64 {
        if duration_secs <= 0.0 {
            return 0.0;
        }
        self.summary.taps as f64 / duration_secs
    }
}

pub enum Screen {
    Title,
    CharacterSelect,
    Gacha { last_draw: Option<&'static Character> },
    Run { run: Box<RunState>, ended_for: Option<f64> },
    Result(ResultScreen),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Title => "Title",
            Screen::CharacterSelect => "CharacterSelect",
            Screen::Gacha { .. } => "Gacha",
            Screen::Run { .. } => "Run",
            Screen::Result(_) => "Result",
        }
    }
}

/// Short-lived banner text (daily bonus, milestones, unlocks).
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub remaining: f64,
}

type Clock = Box<dyn Fn() -> NaiveDate>;

pub struct Game<S: KeyValueStore> {
    stats: StatsStore<S>,
    personal: RankingStore<S>,
    shared: RankingStore<S>,
    config: RunConfig,
    screen: Screen,
    rng: SmallRng,
    clock: Clock,
    melody: Melody,
    cues: Vec<Cue>,
    tones: Vec<Tone>,
    notices: Vec<Notice>,
}

impl<S: KeyValueStore + Clone> Game<S> {
    /// Game on the given backend using the local calendar and OS entropy.
    pub fn new(storage: S, config: RunConfig) -> StoreResult<Self> {
        Self::with_parts(
            storage,
            config,
            SmallRng::from_entropy(),
            Box::new(|| Local::now().date_naive()),
        )
    }

    /// Fully injected constructor (tests, replays).
    pub fn with_parts(storage: S, config: RunConfig, mut rng: SmallRng, clock: Clock) -> StoreResult<Self> {
        let shared_rng = SmallRng::from_rng(&mut rng).unwrap_or_else(|_| SmallRng::seed_from_u64(0));
        let mut game = Self {
            stats: StatsStore::new(storage.clone()),
            personal: RankingStore::personal(storage.clone()),
            shared: RankingStore::shared(storage, shared_rng),
            config,
            screen: Screen::Title,
            rng,
            clock,
            melody: Melody::new(),
            cues: Vec::new(),
            tones: Vec::new(),
            notices: Vec::new(),
        };
        game.enter_title()?;
        Ok(game)
    }
}

impl<S: KeyValueStore> Game<S> {
    // --- Accessors ---

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn stats(&self) -> &StatsStore<S> {
        &self.stats
    }

    pub fn personal_ranking(&self) -> &RankingStore<S> {
        &self.personal
    }

    pub fn shared_ranking(&self) -> &RankingStore<S> {
        &self.shared
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn drain_tones(&mut self) -> Vec<Tone> {
        std::mem::take(&mut self.tones)
    }

    pub fn current_character(&self) -> &'static Character {
        find_character(&self.stats.load().current_character).unwrap_or_else(default_character)
    }

    fn set_screen(&mut self, screen: Screen) {
        log::info!("screen {} -> {}", self.screen.name(), screen.name());
        self.screen = screen;
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.notices.push(Notice {
            text: text.into(),
            remaining: NOTICE_SECS,
        });
    }

    // --- Transitions ---

    /// Title entry also claims the daily login bonus.
    fn enter_title(&mut self) -> StoreResult<()> {
        self.melody.stop();
        self.set_screen(Screen::Title);
        if let Some(bonus) = self.stats.check_daily_bonus((self.clock)())? {
            self.notify(format!(
                "Login bonus +{} coins ({} day streak)",
                bonus.coins, bonus.streak
            ));
        }
        Ok(())
    }

    pub fn back_to_title(&mut self) -> StoreResult<()> {
        self.enter_title()
    }

    pub fn open_character_select(&mut self) {
        if matches!(self.screen, Screen::Title) {
            self.set_screen(Screen::CharacterSelect);
        }
    }

    pub fn open_gacha(&mut self) {
        if matches!(self.screen, Screen::Title) {
            self.set_screen(Screen::Gacha { last_draw: None });
        }
    }

    /// Start a run from the title screen. Ignored anywhere else.
    pub fn start_run(&mut self) -> StoreResult<()> {
        if matches!(self.screen, Screen::Title) {
            self.begin_run()?;
        }
        Ok(())
    }

    /// Count the play, announce a milestone if hit and start a run as the
    /// current character.
    fn begin_run(&mut self) -> StoreResult<()> {
        let plays = self.stats.increment_play_count()?;
        if let Some(m) = self.stats.check_milestone(plays)? {
            self.notify(m.message);
        }
        let mut run = RunState::new(
            self.config.clone(),
            self.current_character(),
            SmallRng::from_rng(&mut self.rng).unwrap_or_else(|_| SmallRng::seed_from_u64(plays as u64)),
        );
        run.start();
        self.melody.start();
        self.set_screen(Screen::Run {
            run: Box::new(run),
            ended_for: None,
        });
        Ok(())
    }

    /// From the result screen: play again.
    pub fn retry(&mut self) -> StoreResult<()> {
        if matches!(self.screen, Screen::Result(_)) {
            self.begin_run()?;
        }
        Ok(())
    }

    /// Persist the choice and start a run. Locked characters are ignored.
    pub fn select_character(&mut self, id: &str) -> StoreResult<bool> {
        if !matches!(self.screen, Screen::CharacterSelect) {
            return Ok(false);
        }
        if !self.stats.set_current_character(id)? {
            return Ok(false);
        }
        self.begin_run()?;
        Ok(true)
    }

    /// One paid draw. `None` when the balance is short (or off-screen).
    pub fn roll_gacha(&mut self) -> StoreResult<Option<&'static Character>> {
        if !matches!(self.screen, Screen::Gacha { .. }) {
            return Ok(None);
        }
        let drawn = gacha::roll(&self.stats, &mut self.rng)?;
        if let Some(c) = drawn {
            self.cues.push(Cue::Item);
            self.screen = Screen::Gacha { last_draw: Some(c) };
        }
        Ok(drawn)
    }

    /// Submit the result to both boards. Only the first call per result counts.
    /// A failed write leaves the result unregistered so it can be retried.
    pub fn register_name(&mut self, name: &str) -> StoreResult<bool> {
        let Screen::Result(result) = &self.screen else {
            return Ok(false);
        };
        if result.registered_name.is_some() || name.trim().is_empty() {
            return Ok(false);
        }
        let s = result.summary;
        let entry = RankingEntry::now(name, s.score, s.distance);
        self.personal.submit(entry.clone())?;
        self.shared.submit(entry.clone())?;
        if let Screen::Result(result) = &mut self.screen {
            result.registered_name = Some(entry.name);
        }
        self.notify("Registered!");
        Ok(true)
    }

    /// Where the shown result would place on the shared board.
    pub fn shared_rank(&self) -> Option<usize> {
        match &self.screen {
            Screen::Result(r) => Some(self.shared.rank(r.summary.score)),
            _ => None,
        }
    }

    // --- Input ---

    /// Pointer/touch: left half jumps, right half accelerates.
    pub fn pointer(&mut self, x: f64, screen_width: f64) {
        let input = if x < screen_width / 2.0 { RunInput::Jump } else { RunInput::Tap };
        self.run_input(input);
    }

    pub fn key(&mut self, key: &str) {
        match key {
            " " | "Space" | "ArrowUp" => self.run_input(RunInput::Jump),
            "ArrowRight" => self.run_input(RunInput::Tap),
            _ => {}
        }
    }

    pub fn run_input(&mut self, input: RunInput) {
        let Screen::Run { run, .. } = &mut self.screen else {
            return;
        };
        match run.input(input) {
            Some(RunEvent::Tapped) => self.cues.push(Cue::Tap),
            Some(RunEvent::Jumped { .. }) => self.cues.push(Cue::Jump),
            _ => {}
        }
    }

    // --- Frame update ---

    pub fn update(&mut self, dt: f64) -> StoreResult<()> {
        for n in &mut self.notices {
            n.remaining -= dt;
        }
        self.notices.retain(|n| n.remaining > 0.0);
        let notes = self.melody.advance(dt);
        self.tones.extend(notes);

        let Screen::Run { run, ended_for } = &mut self.screen else {
            return Ok(());
        };
        if let Some(waited) = ended_for {
            *waited += dt;
            if *waited >= RESULT_DELAY_SECS {
                let summary = run.summary();
                self.set_screen(Screen::Result(ResultScreen {
                    summary,
                    registered_name: None,
                }));
            }
            return Ok(());
        }
        let events = run.tick(dt);
        let ended = run.phase() == RunPhase::Ended;
        let summary = run.summary();
        for event in events {
            self.apply_run_event(event)?;
        }
        if ended {
            self.finish_run(summary)?;
        }
        Ok(())
    }

    fn apply_run_event(&mut self, event: RunEvent) -> StoreResult<()> {
        match event {
            RunEvent::Jumped { .. } => self.cues.push(Cue::Jump),
            RunEvent::ItemCollected { .. } => self.cues.push(Cue::Item),
            RunEvent::GoldenCollected { coins, .. } => {
                self.cues.push(Cue::Item);
                self.cues.push(Cue::Item);
                self.notify(format!("+{coins} coins!"));
            }
            RunEvent::ObstacleHit | RunEvent::BombHit { .. } => self.cues.push(Cue::Hit),
            RunEvent::CharacterUnlocked(id) => {
                if self.stats.unlock_character(id)? {
                    let name = find_character(id).map(|c| c.name).unwrap_or(id);
                    self.notify(format!("{name} unlocked!"));
                }
            }
            RunEvent::Tapped | RunEvent::Wrapped | RunEvent::GoldenSpawned | RunEvent::TimeUp => {}
        }
        Ok(())
    }

    /// Fold the run into the persistent record and start the result delay.
    fn finish_run(&mut self, summary: RunSummary) -> StoreResult<()> {
        self.melody.stop();
        self.cues.push(Cue::GameOver);
        self.stats.update_distance(summary.distance)?;
        self.stats.add_coins(summary.coins)?;
        if let Screen::Run { ended_for, .. } = &mut self.screen {
            *ended_for = Some(0.0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characters::GOLDEN_CHARACTER_ID;
    use crate::error::StoreError;
    use crate::gacha::GACHA_COST;
    use crate::stats::STATS_KEY;
    use crate::storage::MemoryStorage;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Memory backend whose leaderboard writes can be made to fail.
    #[derive(Clone, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_rankings: Rc<Cell<bool>>,
    }

    impl KeyValueStore for FlakyStorage {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if self.fail_rankings.get() && key != STATS_KEY {
                return Err(StoreError::Backend {
                    key: key.to_string(),
                    message: "quota exceeded".to_string(),
                });
            }
            self.inner.set(key, value)
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn game() -> Game<MemoryStorage> {
        Game::with_parts(
            MemoryStorage::new(),
            RunConfig::default(),
            SmallRng::seed_from_u64(9),
            Box::new(day),
        )
        .unwrap()
    }

    #[test]
    fn starts_on_title_with_login_bonus() {
        let g = game();
        assert_eq!(g.screen().name(), "Title");
        assert_eq!(g.stats().load().coins, 60);
        assert_eq!(g.notices().len(), 1);
    }

    #[test]
    fn notices_expire() {
        let mut g = game();
        g.update(NOTICE_SECS + 0.1).unwrap();
        assert!(g.notices().is_empty());
    }

    #[test]
    fn pointer_split_at_midline() {
        let mut g = game();
        g.start_run().unwrap();
        g.pointer(100.0, 800.0);
        assert_eq!(g.drain_cues(), vec![Cue::Jump]);
        g.pointer(700.0, 800.0);
        assert_eq!(g.drain_cues(), vec![Cue::Tap]);
        g.key("ArrowRight");
        g.key("q");
        assert_eq!(g.drain_cues(), vec![Cue::Tap]);
    }

    #[test]
    fn input_outside_run_is_ignored() {
        let mut g = game();
        g.pointer(700.0, 800.0);
        assert!(g.drain_cues().is_empty());
    }

    #[test]
    fn select_locked_character_is_refused() {
        let mut g = game();
        g.open_character_select();
        assert!(!g.select_character("omae").unwrap());
        assert_eq!(g.screen().name(), "CharacterSelect");
        assert!(g.select_character("subaru").unwrap());
        assert_eq!(g.screen().name(), "Run");
    }

    #[test]
    fn register_name_only_on_result_and_once() {
        let mut g = game();
        assert!(!g.register_name("early").unwrap());
        g.start_run().unwrap();
        for _ in 0..(32 * 60) {
            g.update(1.0 / 60.0).unwrap();
            if matches!(g.screen(), Screen::Result(_)) {
                break;
            }
        }
        assert_eq!(g.screen().name(), "Result");
        assert!(g.register_name("  Tester  ").unwrap());
        assert!(!g.register_name("Again").unwrap());
        let personal = g.personal_ranking().entries();
        assert_eq!(personal.len(), 1);
        assert_eq!(personal[0].name, "Tester");
        assert!(g.shared_rank().is_some());
    }

    #[test]
    fn long_frame_queues_at_most_one_note() {
        let mut g = game();
        g.start_run().unwrap();
        g.update(1.0 / 60.0).unwrap();
        g.drain_tones();
        g.update(60.0).unwrap();
        assert!(g.drain_tones().len() <= 1);
    }

    #[test]
    fn finished_run_is_folded_into_stats() {
        let mut g = game();
        g.start_run().unwrap();
        for _ in 0..(32 * 60) {
            g.pointer(700.0, 800.0);
            g.update(1.0 / 60.0).unwrap();
            if matches!(g.screen(), Screen::Result(_)) {
                break;
            }
        }
        let Screen::Result(result) = g.screen() else {
            panic!("expected result screen, got {}", g.screen().name());
        };
        let summary = result.summary;
        assert!(summary.distance >= 5000, "distance {}", summary.distance);
        let stats = g.stats().load();
        assert_eq!(stats.total_plays, 1);
        assert_eq!(stats.total_distance, summary.distance);
        assert_eq!(stats.highest_distance, summary.distance);
        assert_eq!(stats.coins, 60 + summary.coins);
        assert!(stats.is_unlocked(GOLDEN_CHARACTER_ID));
    }

    #[test]
    fn unlock_event_persists_character_once() {
        let mut g = game();
        g.apply_run_event(RunEvent::CharacterUnlocked(GOLDEN_CHARACTER_ID)).unwrap();
        assert!(g.stats().load().is_unlocked(GOLDEN_CHARACTER_ID));
        assert_eq!(g.notices().len(), 2);
        g.apply_run_event(RunEvent::CharacterUnlocked(GOLDEN_CHARACTER_ID)).unwrap();
        assert_eq!(g.notices().len(), 2);
    }

    #[test]
    fn gacha_rolls_only_on_gacha_screen() {
        let mut g = game();
        assert!(g.roll_gacha().unwrap().is_none());
        g.open_gacha();
        assert!(g.roll_gacha().unwrap().is_none(), "60 coins is short");
        assert_eq!(g.stats().load().coins, 60);
        assert!(g.drain_cues().is_empty());

        g.stats().add_coins(GACHA_COST).unwrap();
        let drawn = g.roll_gacha().unwrap().expect("affordable");
        assert_eq!(g.drain_cues(), vec![Cue::Item]);
        assert!(matches!(g.screen(), Screen::Gacha { last_draw: Some(c) } if c.id == drawn.id));
        let stats = g.stats().load();
        assert_eq!(stats.coins, 60);
        assert!(stats.is_unlocked(drawn.id));
    }

    #[test]
    fn title_reentry_credits_bonus_once_per_day() {
        let today = Rc::new(Cell::new(day()));
        let clock = today.clone();
        let mut g = Game::with_parts(
            MemoryStorage::new(),
            RunConfig::default(),
            SmallRng::seed_from_u64(9),
            Box::new(move || clock.get()),
        )
        .unwrap();
        g.open_gacha();
        g.back_to_title().unwrap();
        assert_eq!(g.stats().load().coins, 60);
        assert_eq!(g.notices().len(), 1);

        today.set(day().succ_opt().unwrap());
        g.back_to_title().unwrap();
        assert_eq!(g.stats().load().coins, 130);
        assert_eq!(g.stats().load().login_streak, 2);
        assert_eq!(g.notices().len(), 2);
    }

    #[test]
    fn runs_start_only_from_title_or_result() {
        let mut g = game();
        g.open_gacha();
        g.start_run().unwrap();
        assert_eq!(g.screen().name(), "Gacha");
        g.back_to_title().unwrap();
        g.retry().unwrap();
        assert_eq!(g.screen().name(), "Title");
        assert_eq!(g.stats().load().total_plays, 0);

        g.start_run().unwrap();
        g.start_run().unwrap();
        assert_eq!(g.screen().name(), "Run");
        assert_eq!(g.stats().load().total_plays, 1);
    }

    #[test]
    fn failed_registration_can_be_retried() {
        let storage = FlakyStorage::default();
        let mut g = Game::with_parts(
            storage.clone(),
            RunConfig::default(),
            SmallRng::seed_from_u64(9),
            Box::new(day),
        )
        .unwrap();
        g.screen = Screen::Result(ResultScreen {
            summary: RunSummary {
                score: 1234,
                distance: 500,
                taps: 40,
                coins: 10,
            },
            registered_name: None,
        });

        storage.fail_rankings.set(true);
        assert!(g.register_name("Tester").is_err());
        assert!(matches!(g.screen(), Screen::Result(r) if r.registered_name.is_none()));
        assert!(g.personal_ranking().entries().is_empty());

        storage.fail_rankings.set(false);
        assert!(g.register_name("Tester").unwrap());
        assert!(matches!(g.screen(), Screen::Result(r) if r.registered_name.as_deref() == Some("Tester")));
        assert_eq!(g.personal_ranking().entries()[0].score, 1234);
    }
}
