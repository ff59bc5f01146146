//! Leaderboards: a personal top-10 and a simulated shared top-50.
//!
//! Both are the same [`RankingStore`]; the shared one is seeded with demo
//! entries and occasionally injects a synthetic score after a submission to
//! look like other people are playing.

use chrono::{Days, Local, NaiveDate, Utc};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::storage::{KeyValueStore, load_json, save_json};

pub const PERSONAL_KEY: &str = "subaruGameHighScores";
pub const SHARED_KEY: &str = "subaruGameGlobalRanking";
pub const PERSONAL_CAPACITY: usize = 10;
pub const SHARED_CAPACITY: usize = 50;

pub const MAX_NAME_LEN: usize = 10;
pub const DEFAULT_PLAYER_NAME: &str = "Nameless";

/// Chance per submission that a synthetic player score is added.
pub const SIMULATED_ENTRY_CHANCE: f64 = 0.1;

const SIMULATED_NAMES: [&str; 10] = [
    "SubaFan", "Shubaist", "DuckSquad", "OMAEEEE", "Subaroom", "DuckGang", "Plea", "Shubau",
    "SubaKichi", "HoloBird",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: u64,
    pub distance: u64,
    pub date: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
}

impl RankingEntry {
    /// Entry stamped with the current local date and UTC time.
    pub fn now(name: &str, score: u64, distance: u64) -> Self {
        Self {
            name: sanitize_name(name),
            score,
            distance,
            date: format_date(Local::now().date_naive()),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Trim and cap a display name; blank names get a placeholder.
pub fn sanitize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y/%-m/%-d").to_string()
}

/// Stable descending sort by score, then truncation to `capacity`.
pub fn sort_and_cap(entries: &mut Vec<RankingEntry>, capacity: usize) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(capacity);
}

/// 1-based position a score would take: index of the first stored score that
/// is `<=` it, or one past the end.
pub fn rank_in(entries: &[RankingEntry], score: u64) -> usize {
    entries
        .iter()
        .position(|e| e.score <= score)
        .map(|i| i + 1)
        .unwrap_or(entries.len() + 1)
}

pub struct RankingStore<S: KeyValueStore> {
    storage: S,
    key: &'static str,
    capacity: usize,
    seed: fn() -> Vec<RankingEntry>,
    simulator: Option<SmallRng>,
}

impl<S: KeyValueStore> RankingStore<S> {
    /// Personal high scores: top 10, starts empty.
    pub fn personal(storage: S) -> Self {
        Self {
            storage,
            key: PERSONAL_KEY,
            capacity: PERSONAL_CAPACITY,
            seed: Vec::new,
            simulator: None,
        }
    }

    /// Shared board; `rng` drives the simulated other players.
    pub fn shared(storage: S, rng: SmallRng) -> Self {
        Self {
            storage,
            key: SHARED_KEY,
            capacity: SHARED_CAPACITY,
            seed: initial_shared_rankings,
            simulator: Some(rng),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> Vec<RankingEntry> {
        load_json(&self.storage, self.key, self.seed)
    }

    pub fn top_n(&self, n: usize) -> Vec<RankingEntry> {
        let mut all = self.entries();
        all.truncate(n);
        all
    }

    pub fn rank(&self, score: u64) -> usize {
        rank_in(&self.entries(), score)
    }

    pub fn submit(&mut self, mut entry: RankingEntry) -> StoreResult<()> {
        entry.name = sanitize_name(&entry.name);
        let mut all = self.entries();
        all.push(entry);
        sort_and_cap(&mut all, self.capacity);
        save_json(&self.storage, self.key, &all)?;

        let Some(rng) = self.simulator.as_mut() else {
            return Ok(());
        };
        if rng.gen_bool(SIMULATED_ENTRY_CHANCE) {
            let fake = simulated_entry(rng);
            log::debug!("simulated ranking entry {} ({})", fake.name, fake.score);
            all.push(fake);
            sort_and_cap(&mut all, self.capacity);
            save_json(&self.storage, self.key, &all)?;
        }
        Ok(())
    }
}

fn simulated_entry(rng: &mut SmallRng) -> RankingEntry {
    let base = SIMULATED_NAMES[rng.gen_range(0..SIMULATED_NAMES.len())];
    let score = rng.gen_range(10_000..50_000u64);
    RankingEntry {
        // Suffix would overflow the display cap for the longest names.
        name: sanitize_name(&format!("{base}{}", rng.gen_range(0..1000))),
        score,
        distance: score / 25,
        date: format_date(Local::now().date_naive()),
        timestamp: Utc::now().timestamp_millis(),
    }
}

/// Demo leaderboard shown before anything has been submitted.
pub fn initial_shared_rankings() -> Vec<RankingEntry> {
    const DAY_MS: i64 = 86_400_000;
    let now = Utc::now();
    let today = Local::now().date_naive();
    let rows: [(&str, u64, u64, u64); 10] = [
        ("ShubaShuba", 50_000, 2_000, 1),
        ("SubaFan #1", 45_000, 1_800, 1),
        ("OMAE", 42_000, 1_700, 1),
        ("DuckMaster", 38_000, 1_600, 2),
        ("LoveSubaru", 35_000, 1_500, 2),
        ("ShubaClub", 32_000, 1_400, 2),
        ("Pleadesu", 30_000, 1_300, 3),
        ("Subarer", 28_000, 1_200, 3),
        ("DuckPolice", 25_000, 1_100, 3),
        ("Rookie", 20_000, 1_000, 4),
    ];
    rows.iter()
        .map(|&(name, score, distance, days_ago)| RankingEntry {
            name: name.to_string(),
            score,
            distance,
            date: format_date(today.checked_sub_days(Days::new(days_ago)).unwrap_or(today)),
            timestamp: now.timestamp_millis() - days_ago as i64 * DAY_MS,
        })
        .collect()
}
