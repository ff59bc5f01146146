//! Player progress record and its store.
//!
//! [`PlayerStats`] is a plain value; [`StatsStore`] persists it under a fixed
//! key. Every mutator re-reads the stored record, applies one change and
//! writes it back, so two stores over the same backend never see stale data.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::characters::DEFAULT_CHARACTER_ID;
use crate::error::StoreResult;
use crate::storage::{KeyValueStore, load_json, save_json};

pub const STATS_KEY: &str = "subaruGameStats";

pub const DAILY_BASE_BONUS: u64 = 50;
pub const DAILY_STREAK_STEP: u64 = 10;
pub const DAILY_STREAK_CAP: u64 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStats {
    pub total_plays: u32,
    pub total_distance: u64,
    pub highest_distance: u64,
    pub unlocked_characters: Vec<String>,
    pub unlocked_items: Vec<String>,
    pub coins: u64,
    /// Always one of `unlocked_characters`.
    pub current_character: String,
    pub achievements: Vec<String>,
    pub last_login_date: Option<NaiveDate>,
    pub login_streak: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            total_plays: 0,
            total_distance: 0,
            highest_distance: 0,
            unlocked_characters: vec![DEFAULT_CHARACTER_ID.to_string()],
            unlocked_items: Vec::new(),
            coins: 0,
            current_character: DEFAULT_CHARACTER_ID.to_string(),
            achievements: Vec::new(),
            last_login_date: None,
            login_streak: 0,
        }
    }
}

impl PlayerStats {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn is_unlocked(&self, character_id: &str) -> bool {
        self.unlocked_characters.iter().any(|c| c == character_id)
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }
}

/// Play-count milestone. Fires on the exact count only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Milestone {
    pub count: u32,
    pub message: &'static str,
    pub achievement: &'static str,
}

pub static MILESTONES: [Milestone; 4] = [
    Milestone {
        count: 10,
        message: "10 plays! New title screen unlocked!",
        achievement: "play10",
    },
    Milestone {
        count: 20,
        message: "20 plays! Special BGM unlocked!",
        achievement: "play20",
    },
    Milestone {
        count: 50,
        message: "50 plays! Rare character unlocked!",
        achievement: "play50",
    },
    Milestone {
        count: 100,
        message: "100 plays! Certified master player!",
        achievement: "play100",
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyBonus {
    pub coins: u64,
    pub streak: u32,
}

/// Bonus for a given streak: base plus a capped per-day step.
pub fn daily_bonus_for_streak(streak: u32) -> u64 {
    DAILY_BASE_BONUS + (streak as u64 * DAILY_STREAK_STEP).min(DAILY_STREAK_CAP)
}

pub struct StatsStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> StatsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stored record, or defaults when missing or unreadable.
    pub fn load(&self) -> PlayerStats {
        load_json(&self.storage, STATS_KEY, PlayerStats::default)
    }

    pub fn save(&self, stats: &PlayerStats) -> StoreResult<()> {
        save_json(&self.storage, STATS_KEY, stats)
    }

    fn modify<T>(&self, f: impl FnOnce(&mut PlayerStats) -> (T, bool)) -> StoreResult<T> {
        let mut stats = self.load();
        let (out, dirty) = f(&mut stats);
        if dirty {
            self.save(&stats)?;
        }
        Ok(out)
    }

    pub fn increment_play_count(&self) -> StoreResult<u32> {
        self.modify(|s| {
            s.total_plays += 1;
            (s.total_plays, true)
        })
    }

    pub fn update_distance(&self, distance: u64) -> StoreResult<()> {
        self.modify(|s| {
            s.total_distance += distance;
            s.highest_distance = s.highest_distance.max(distance);
            ((), true)
        })
    }

    /// Returns the new balance.
    pub fn add_coins(&self, amount: u64) -> StoreResult<u64> {
        self.modify(|s| {
            s.coins += amount;
            (s.coins, true)
        })
    }

    /// Deducts `amount` if the balance covers it. Nothing is written otherwise.
    pub fn spend_coins(&self, amount: u64) -> StoreResult<bool> {
        self.modify(|s| {
            if s.coins >= amount {
                s.coins -= amount;
                (true, true)
            } else {
                (false, false)
            }
        })
    }

    /// Returns whether the character was newly unlocked.
    pub fn unlock_character(&self, character_id: &str) -> StoreResult<bool> {
        self.modify(|s| {
            if s.is_unlocked(character_id) {
                (false, false)
            } else {
                log::info!("unlocked character {character_id}");
                s.unlocked_characters.push(character_id.to_string());
                (true, true)
            }
        })
    }

    pub fn unlock_item(&self, item_id: &str) -> StoreResult<bool> {
        self.modify(|s| {
            if s.unlocked_items.iter().any(|i| i == item_id) {
                (false, false)
            } else {
                s.unlocked_items.push(item_id.to_string());
                (true, true)
            }
        })
    }

    /// No-op (returns false) unless the character is unlocked.
    pub fn set_current_character(&self, character_id: &str) -> StoreResult<bool> {
        self.modify(|s| {
            if s.is_unlocked(character_id) {
                s.current_character = character_id.to_string();
                (true, true)
            } else {
                (false, false)
            }
        })
    }

    /// Returns whether the achievement was newly added.
    pub fn add_achievement(&self, id: &str) -> StoreResult<bool> {
        self.modify(|s| {
            if s.has_achievement(id) {
                (false, false)
            } else {
                s.achievements.push(id.to_string());
                (true, true)
            }
        })
    }

    /// Milestone reached by exactly `play_count` plays, if not already awarded.
    /// Counts that are skipped over never fire.
    pub fn check_milestone(&self, play_count: u32) -> StoreResult<Option<&'static Milestone>> {
        for m in MILESTONES.iter() {
            if play_count == m.count && self.add_achievement(m.achievement)? {
                log::info!("milestone {} reached", m.achievement);
                return Ok(Some(m));
            }
        }
        Ok(None)
    }

    /// Credits the login bonus for `today` unless it was already claimed.
    pub fn check_daily_bonus(&self, today: NaiveDate) -> StoreResult<Option<DailyBonus>> {
        self.modify(|s| {
            if s.last_login_date == Some(today) {
                return (None, false);
            }
            let yesterday = today.checked_sub_days(Days::new(1));
            let consecutive = s.last_login_date.is_some() && s.last_login_date == yesterday;
            s.login_streak = if consecutive { s.login_streak + 1 } else { 1 };
            s.last_login_date = Some(today);
            let coins = daily_bonus_for_streak(s.login_streak);
            s.coins += coins;
            (
                Some(DailyBonus {
                    coins,
                    streak: s.login_streak,
                }),
                true,
            )
        })
    }
}
