// Static character & item catalog.
// Order of CHARACTERS matters: entry 0 is the starter character and the gacha
// fallback.

use serde::{Deserialize, Serialize};

/// Ordinal rarity; drives gacha odds and card colours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }

    /// Card colour used by the select / gacha screens.
    pub fn color(self) -> &'static str {
        match self {
            Rarity::Common => "#808080",
            Rarity::Rare => "#0080ff",
            Rarity::Epic => "#9400d3",
            Rarity::Legendary => "#ffd700",
        }
    }
}

/// Gameplay modifier carried by some characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialAbility {
    ItemMagnet,        // wider pickup box
    DoubleJump,        // one extra jump per airborne period
    SplashEffect,      // cosmetic only
    ComboBoost,        // +20% combo step
    CoinDouble,        // coin pickups count twice
    LongInvincibility, // longer invulnerability after a hit
}

impl SpecialAbility {
    pub fn description(self) -> &'static str {
        match self {
            SpecialAbility::ItemMagnet => "Wider item pickup range",
            SpecialAbility::DoubleJump => "Double jump",
            SpecialAbility::SplashEffect => "Splash effect",
            SpecialAbility::ComboBoost => "Combo bonus +20%",
            SpecialAbility::CoinDouble => "Double coins",
            SpecialAbility::LongInvincibility => "Extended invincibility",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Character {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub speed: f64, // max-speed multiplier
    pub jump: f64,  // jump impulse multiplier
    pub special: Option<SpecialAbility>,
    /// Characters with a condition are earned by distance milestones and never
    /// drop from the gacha.
    pub unlock_condition: Option<&'static str>,
}

impl Character {
    pub fn has_ability(&self, ability: SpecialAbility) -> bool {
        self.special == Some(ability)
    }
}

pub const DEFAULT_CHARACTER_ID: &str = "subaru";
pub const GOLDEN_CHARACTER_ID: &str = "golden_subaru";

pub static CHARACTERS: [Character; 7] = [
    Character {
        id: "subaru",
        name: "Subaru",
        description: "The starter character",
        rarity: Rarity::Common,
        speed: 1.0,
        jump: 1.0,
        special: None,
        unlock_condition: None,
    },
    Character {
        id: "shuba_duck",
        name: "Shuba Duck",
        description: "Full duck mode",
        rarity: Rarity::Rare,
        speed: 1.1,
        jump: 0.9,
        special: Some(SpecialAbility::ItemMagnet),
        unlock_condition: None,
    },
    Character {
        id: "omae",
        name: "OMAE",
        description: "Subaru's trusty partner",
        rarity: Rarity::Rare,
        speed: 0.9,
        jump: 1.2,
        special: Some(SpecialAbility::DoubleJump),
        unlock_condition: None,
    },
    Character {
        id: "summer_subaru",
        name: "Swimsuit Subaru",
        description: "Special summer outfit",
        rarity: Rarity::Epic,
        speed: 1.2,
        jump: 1.1,
        special: Some(SpecialAbility::SplashEffect),
        unlock_condition: None,
    },
    Character {
        id: "idol_subaru",
        name: "Idol Subaru",
        description: "Sparkly stage costume",
        rarity: Rarity::Epic,
        speed: 1.1,
        jump: 1.1,
        special: Some(SpecialAbility::ComboBoost),
        unlock_condition: None,
    },
    Character {
        id: "golden_subaru",
        name: "Golden Subaru",
        description: "Legendary Subaru who appears at 5000m",
        rarity: Rarity::Legendary,
        speed: 1.5,
        jump: 1.3,
        special: Some(SpecialAbility::CoinDouble),
        unlock_condition: Some("Reach 5000m"),
    },
    Character {
        id: "shadow_subaru",
        name: "Shadow Subaru",
        description: "A mysterious dark Subaru",
        rarity: Rarity::Legendary,
        speed: 2.0,
        jump: 1.0,
        special: Some(SpecialAbility::LongInvincibility),
        unlock_condition: Some("Reach 10000m"),
    },
];

pub fn default_character() -> &'static Character {
    &CHARACTERS[0]
}

pub fn find_character(id: &str) -> Option<&'static Character> {
    CHARACTERS.iter().find(|c| c.id == id)
}

pub fn characters_by_rarity(rarity: Rarity) -> impl Iterator<Item = &'static Character> {
    CHARACTERS.iter().filter(move |c| c.rarity == rarity)
}

// --- Special items ------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemEffect {
    Invincible,
    SuperSpeed,
    ItemMagnet,
    Shield,
    Coins(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecialItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub effect: ItemEffect,
    pub rarity: Rarity, // never Legendary
}

pub static SPECIAL_ITEMS: [SpecialItem; 5] = [
    SpecialItem {
        id: "super_star",
        name: "Super Star",
        description: "Become invincible",
        effect: ItemEffect::Invincible,
        rarity: Rarity::Rare,
    },
    SpecialItem {
        id: "rocket",
        name: "Rocket",
        description: "Massive speed boost",
        effect: ItemEffect::SuperSpeed,
        rarity: Rarity::Epic,
    },
    SpecialItem {
        id: "magnet",
        name: "Magnet",
        description: "Pulls items toward you",
        effect: ItemEffect::ItemMagnet,
        rarity: Rarity::Rare,
    },
    SpecialItem {
        id: "shield",
        name: "Shield",
        description: "Blocks one hit",
        effect: ItemEffect::Shield,
        rarity: Rarity::Common,
    },
    SpecialItem {
        id: "coin_bag",
        name: "Coin Bag",
        description: "Get 100 coins",
        effect: ItemEffect::Coins(100),
        rarity: Rarity::Rare,
    },
];

pub fn find_item(id: &str) -> Option<&'static SpecialItem> {
    SPECIAL_ITEMS.iter().find(|i| i.id == id)
}
