//! Units: the actors orders are addressed to.

use serde::{Deserialize, Serialize};

use crate::game::item::{Item, ItemStack, Skill, SkillRecord};
use crate::orders::{MonthOrder, Order};

/// Whether a unit collected regional income by force or peacefully this
/// turn. Tax and pillage are mutually exclusive per unit per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaxState {
    #[default]
    None,
    Tax,
    Pillage,
}

/// A unit: a group of men belonging to one faction, standing in one region,
/// optionally inside a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub num: u32,
    pub name: String,
    pub faction: u32,
    pub men: i64,
    pub items: Vec<ItemStack>,
    pub skills: Vec<SkillRecord>,
    /// Structure id within the unit's region, if inside one.
    pub structure: Option<u32>,
    pub guard: bool,
    pub avoid: bool,
    /// Hostile units open automatic attacks on every other faction present.
    pub hostile: bool,
    #[serde(default)]
    pub taxing: TaxState,
    /// Immediate orders pending for this turn, in submission order.
    #[serde(default)]
    pub orders: Vec<Order>,
    /// The single month-long order slot.
    #[serde(default)]
    pub month_order: Option<MonthOrder>,
    /// Pending teleport destination set by the cast phase.
    #[serde(default)]
    pub teleport_dest: Option<u32>,
    /// Set by the teach phase; doubles this month's study progress.
    #[serde(default)]
    pub taught: bool,
}

impl Unit {
    pub fn new(num: u32, faction: u32, name: impl Into<String>) -> Unit {
        Unit {
            num,
            name: name.into(),
            faction,
            men: 0,
            items: Vec::new(),
            skills: Vec::new(),
            structure: None,
            guard: false,
            avoid: false,
            hostile: false,
            taxing: TaxState::None,
            orders: Vec::new(),
            month_order: None,
            teleport_dest: None,
            taught: false,
        }
    }

    pub fn item_amount(&self, item: Item) -> i64 {
        self.items
            .iter()
            .find(|s| s.item == item)
            .map_or(0, |s| s.amount)
    }

    pub fn silver(&self) -> i64 {
        self.item_amount(Item::Silver)
    }

    /// Adds (or, with a negative delta, removes) items. Stacks are created
    /// on demand and dropped when they reach zero.
    pub fn add_item(&mut self, item: Item, delta: i64) {
        match self.items.iter_mut().find(|s| s.item == item) {
            Some(stack) => {
                stack.amount += delta;
            }
            None => {
                if delta != 0 {
                    self.items.push(ItemStack { item, amount: delta });
                }
            }
        }
        self.items.retain(|s| s.amount != 0);
    }

    /// Removes up to `amount` of an item; returns how much was removed.
    pub fn take_item(&mut self, item: Item, amount: i64) -> i64 {
        let have = self.item_amount(item);
        let taken = have.min(amount).max(0);
        self.add_item(item, -taken);
        taken
    }

    pub fn skill_days(&self, skill: Skill) -> u32 {
        self.skills
            .iter()
            .find(|r| r.skill == skill)
            .map_or(0, |r| r.days)
    }

    pub fn add_skill_days(&mut self, skill: Skill, days: u32) {
        match self.skills.iter_mut().find(|r| r.skill == skill) {
            Some(rec) => rec.days += days,
            None => self.skills.push(SkillRecord { skill, days }),
        }
    }

    pub fn forget_skill(&mut self, skill: Skill) {
        self.skills.retain(|r| r.skill != skill);
    }

    pub fn knows(&self, skill: Skill) -> bool {
        self.skill_days(skill) > 0
    }

    /// Combat strength: one point per man, one extra per armed man.
    pub fn strength(&self) -> i64 {
        let swords = self.item_amount(Item::Sword);
        self.men + swords.min(self.men)
    }

    /// A unit with no men left is purged by the cleanup phases.
    pub fn is_empty(&self) -> bool {
        self.men <= 0
    }

    /// Kills the unit in place: its men are gone, its goods are lost.
    pub fn destroy(&mut self) {
        self.men = 0;
        self.items.clear();
        self.orders.clear();
        self.month_order = None;
        self.guard = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_unit_is_empty() {
        let unit = Unit::new(1, 2, "Scouts");
        assert!(unit.is_empty());
        assert_eq!(unit.silver(), 0);
        assert_eq!(unit.faction, 2);
    }

    #[test]
    fn add_and_take_items() {
        let mut unit = Unit::new(1, 1, "u");
        unit.add_item(Item::Grain, 10);
        assert_eq!(unit.item_amount(Item::Grain), 10);
        assert_eq!(unit.take_item(Item::Grain, 4), 4);
        assert_eq!(unit.item_amount(Item::Grain), 6);
        // Taking more than held caps at what is there.
        assert_eq!(unit.take_item(Item::Grain, 100), 6);
        assert_eq!(unit.item_amount(Item::Grain), 0);
        assert!(unit.items.is_empty());
    }

    #[test]
    fn zero_stacks_are_dropped() {
        let mut unit = Unit::new(1, 1, "u");
        unit.add_item(Item::Iron, 3);
        unit.add_item(Item::Iron, -3);
        assert!(unit.items.is_empty());
    }

    #[test]
    fn strength_counts_armed_men_twice() {
        let mut unit = Unit::new(1, 1, "u");
        unit.men = 10;
        unit.add_item(Item::Sword, 4);
        assert_eq!(unit.strength(), 14);
        // Extra swords beyond the men carrying them add nothing.
        unit.add_item(Item::Sword, 20);
        assert_eq!(unit.strength(), 20);
    }

    #[test]
    fn skill_bookkeeping() {
        let mut unit = Unit::new(1, 1, "u");
        assert!(!unit.knows(Skill::Sailing));
        unit.add_skill_days(Skill::Sailing, 30);
        unit.add_skill_days(Skill::Sailing, 30);
        assert_eq!(unit.skill_days(Skill::Sailing), 60);
        unit.forget_skill(Skill::Sailing);
        assert!(!unit.knows(Skill::Sailing));
    }

    #[test]
    fn destroy_clears_everything() {
        let mut unit = Unit::new(1, 1, "u");
        unit.men = 5;
        unit.add_item(Item::Silver, 100);
        unit.guard = true;
        unit.orders.push(Order::Tax);
        unit.destroy();
        assert!(unit.is_empty());
        assert!(unit.items.is_empty());
        assert!(unit.orders.is_empty());
        assert!(!unit.guard);
    }
}
