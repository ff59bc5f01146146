// Character gacha: weighted rarity roll, then a uniform pick inside the tier.

use rand::Rng;

use crate::characters::{CHARACTERS, Character, Rarity, default_character};
use crate::error::StoreResult;
use crate::stats::StatsStore;
use crate::storage::KeyValueStore;

pub const GACHA_COST: u64 = 100;

/// Cumulative upper bounds for Common / Rare / Epic; everything above is Legendary.
pub const RARITY_THRESHOLDS: [(f64, Rarity); 3] = [
    (0.60, Rarity::Common),
    (0.85, Rarity::Rare),
    (0.98, Rarity::Epic),
];

/// Map a uniform draw in `[0, 1)` to a rarity tier.
pub fn roll_rarity(draw: f64) -> Rarity {
    RARITY_THRESHOLDS
        .iter()
        .find(|(limit, _)| draw < *limit)
        .map(|&(_, r)| r)
        .unwrap_or(Rarity::Legendary)
}

/// Characters that can drop for `rarity` (conditional unlocks excluded).
pub fn eligible(rarity: Rarity) -> Vec<&'static Character> {
    CHARACTERS
        .iter()
        .filter(|c| c.rarity == rarity && c.unlock_condition.is_none())
        .collect()
}

/// Uniform pick among eligible characters using `draw` in `[0, 1)`; falls back
/// to the catalog's first entry when the tier has nothing eligible.
pub fn pick_character(rarity: Rarity, draw: f64) -> &'static Character {
    let pool = eligible(rarity);
    if pool.is_empty() {
        return default_character();
    }
    let idx = ((draw * pool.len() as f64).floor() as usize).min(pool.len() - 1);
    pool[idx]
}

pub fn draw_with<R: Rng + ?Sized>(rng: &mut R) -> &'static Character {
    let rarity = roll_rarity(rng.r#gen::<f64>());
    pick_character(rarity, rng.r#gen::<f64>())
}

/// Pay for and perform one draw. Returns `None` when the balance is short;
/// the drawn character is unlocked otherwise.
pub fn roll<S: KeyValueStore, R: Rng + ?Sized>(
    stats: &StatsStore<S>,
    rng: &mut R,
) -> StoreResult<Option<&'static Character>> {
    if !stats.spend_coins(GACHA_COST)? {
        return Ok(None);
    }
    let drawn = draw_with(rng);
    log::info!("gacha drew {} ({})", drawn.id, drawn.rarity.label());
    stats.unlock_character(drawn.id)?;
    Ok(Some(drawn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_map_to_tiers() {
        assert_eq!(roll_rarity(0.0), Rarity::Common);
        assert_eq!(roll_rarity(0.5999), Rarity::Common);
        assert_eq!(roll_rarity(0.60), Rarity::Rare);
        assert_eq!(roll_rarity(0.85), Rarity::Epic);
        assert_eq!(roll_rarity(0.97), Rarity::Epic);
        assert_eq!(roll_rarity(0.98), Rarity::Legendary);
        assert_eq!(roll_rarity(0.99), Rarity::Legendary);
    }

    #[test]
    fn legendary_falls_back_to_first_character() {
        // Both legendaries carry unlock conditions.
        assert!(eligible(Rarity::Legendary).is_empty());
        assert_eq!(pick_character(Rarity::Legendary, 0.5).id, CHARACTERS[0].id);
    }

    #[test]
    fn pick_is_uniform_over_tier() {
        assert_eq!(pick_character(Rarity::Rare, 0.0).id, "shuba_duck");
        assert_eq!(pick_character(Rarity::Rare, 0.49).id, "shuba_duck");
        assert_eq!(pick_character(Rarity::Rare, 0.5).id, "omae");
        assert_eq!(pick_character(Rarity::Rare, 0.999).id, "omae");
    }
}
