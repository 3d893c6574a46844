//! Item and skill definitions.
//!
//! Items are the tradeable goods units carry; each belongs to a category
//! that the active ruleset can enable or disable. Skills gate a handful of
//! order types (sailing, magic, stealth).

use serde::{Deserialize, Serialize};

/// Content categories a ruleset can toggle on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Normal,
    Weapon,
    Mount,
    TradeGood,
    Magic,
}

/// Number of distinct item categories.
pub const CATEGORY_COUNT: usize = 5;

impl ItemCategory {
    /// Index into a ruleset's enabled-category table.
    pub const fn index(self) -> usize {
        match self {
            ItemCategory::Normal => 0,
            ItemCategory::Weapon => 1,
            ItemCategory::Mount => 2,
            ItemCategory::TradeGood => 3,
            ItemCategory::Magic => 4,
        }
    }

    /// Human-readable category name for the rules reference.
    pub const fn name(self) -> &'static str {
        match self {
            ItemCategory::Normal => "normal goods",
            ItemCategory::Weapon => "weapons",
            ItemCategory::Mount => "mounts",
            ItemCategory::TradeGood => "trade goods",
            ItemCategory::Magic => "magic items",
        }
    }
}

/// Every item the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Silver,
    Grain,
    Wood,
    Stone,
    Iron,
    Horse,
    Sword,
    Gem,
    Amulet,
}

/// All items in a fixed order, used for deterministic iteration.
pub const ALL_ITEMS: [Item; 9] = [
    Item::Silver,
    Item::Grain,
    Item::Wood,
    Item::Stone,
    Item::Iron,
    Item::Horse,
    Item::Sword,
    Item::Gem,
    Item::Amulet,
];

impl Item {
    /// The order-file keyword for this item.
    pub const fn keyword(self) -> &'static str {
        match self {
            Item::Silver => "silver",
            Item::Grain => "grain",
            Item::Wood => "wood",
            Item::Stone => "stone",
            Item::Iron => "iron",
            Item::Horse => "horse",
            Item::Sword => "sword",
            Item::Gem => "gem",
            Item::Amulet => "amulet",
        }
    }

    /// Parses an item from its order-file keyword (case-insensitive).
    pub fn from_keyword(s: &str) -> Option<Item> {
        let lower = s.to_ascii_lowercase();
        ALL_ITEMS.into_iter().find(|i| i.keyword() == lower)
    }

    pub const fn category(self) -> ItemCategory {
        match self {
            Item::Silver | Item::Grain | Item::Wood | Item::Stone | Item::Iron => {
                ItemCategory::Normal
            }
            Item::Sword => ItemCategory::Weapon,
            Item::Horse => ItemCategory::Mount,
            Item::Gem => ItemCategory::TradeGood,
            Item::Amulet => ItemCategory::Magic,
        }
    }

    /// Baseline market price in silver.
    pub const fn base_price(self) -> i64 {
        match self {
            Item::Silver => 1,
            Item::Grain => 15,
            Item::Wood => 25,
            Item::Stone => 30,
            Item::Iron => 40,
            Item::Horse => 60,
            Item::Sword => 80,
            Item::Gem => 120,
            Item::Amulet => 400,
        }
    }
}

/// A quantity of one item carried by a unit or stocked by a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: Item,
    pub amount: i64,
}

/// The skills a unit can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Combat,
    Sailing,
    Stealth,
    Magic,
    Teleportation,
}

/// All skills in a fixed order.
pub const ALL_SKILLS: [Skill; 5] = [
    Skill::Combat,
    Skill::Sailing,
    Skill::Stealth,
    Skill::Magic,
    Skill::Teleportation,
];

impl Skill {
    pub const fn keyword(self) -> &'static str {
        match self {
            Skill::Combat => "combat",
            Skill::Sailing => "sailing",
            Skill::Stealth => "stealth",
            Skill::Magic => "magic",
            Skill::Teleportation => "teleportation",
        }
    }

    /// Parses a skill from its order-file keyword (case-insensitive).
    pub fn from_keyword(s: &str) -> Option<Skill> {
        let lower = s.to_ascii_lowercase();
        ALL_SKILLS.into_iter().find(|k| k.keyword() == lower)
    }
}

/// A unit's progress in one skill, measured in days of study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub skill: Skill,
    pub days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_keyword_roundtrip() {
        for item in ALL_ITEMS {
            assert_eq!(Item::from_keyword(item.keyword()), Some(item));
        }
        assert_eq!(Item::from_keyword("plutonium"), None);
    }

    #[test]
    fn item_keyword_is_case_insensitive() {
        assert_eq!(Item::from_keyword("SWORD"), Some(Item::Sword));
        assert_eq!(Item::from_keyword("Horse"), Some(Item::Horse));
    }

    #[test]
    fn skill_keyword_roundtrip() {
        for skill in ALL_SKILLS {
            assert_eq!(Skill::from_keyword(skill.keyword()), Some(skill));
        }
        assert_eq!(Skill::from_keyword("juggling"), None);
    }

    #[test]
    fn category_indices_are_distinct() {
        let cats = [
            ItemCategory::Normal,
            ItemCategory::Weapon,
            ItemCategory::Mount,
            ItemCategory::TradeGood,
            ItemCategory::Magic,
        ];
        for (i, a) in cats.iter().enumerate() {
            for b in &cats[i + 1..] {
                assert_ne!(a.index(), b.index());
            }
            assert!(a.index() < CATEGORY_COUNT);
        }
    }

    #[test]
    fn silver_is_cheapest() {
        for item in ALL_ITEMS {
            assert!(item.base_price() >= Item::Silver.base_price());
        }
    }
}
