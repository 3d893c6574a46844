//! Rule configuration.
//!
//! A [`RuleSet`] fixes which item categories are in play and the handful of
//! global tuning constants. It is selected once at startup, before the
//! session is created or loaded, and never changes for the rest of the run.
//! Only one ruleset is currently defined.

use std::io::{self, Write};

use crate::game::item::{Item, ItemCategory, ALL_ITEMS, CATEGORY_COUNT};

/// A named rule configuration.
///
/// Immutable after construction; the pipeline takes it by shared reference
/// everywhere.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: &'static str,
    enabled: [bool; CATEGORY_COUNT],
    /// Human factions that miss this many consecutive turns are removed.
    pub max_inactive_turns: u32,
    /// Monthly upkeep in silver per man.
    pub maintenance_cost: i64,
    /// Starting silver for a newly founded faction's first unit.
    pub start_silver: i64,
    /// Human factions seeded into a new world.
    pub start_factions: u32,
}

impl RuleSet {
    /// The standard ruleset: everything enabled.
    pub fn standard() -> RuleSet {
        RuleSet {
            name: "standard",
            enabled: [true; CATEGORY_COUNT],
            max_inactive_turns: 3,
            maintenance_cost: 10,
            start_silver: 5000,
            start_factions: 4,
        }
    }

    /// Looks up a ruleset by name. Unknown names are a usage error at the
    /// CLI boundary.
    pub fn named(name: &str) -> Option<RuleSet> {
        match name {
            "standard" => Some(RuleSet::standard()),
            _ => None,
        }
    }

    pub fn category_enabled(&self, category: ItemCategory) -> bool {
        self.enabled[category.index()]
    }

    pub fn item_enabled(&self, item: Item) -> bool {
        self.category_enabled(item.category())
    }
}

/// Writes the static rules reference document for a ruleset.
///
/// Pure read: consults only the ruleset, never a session.
pub fn write_rules_reference<W: Write>(rules: &RuleSet, out: &mut W) -> io::Result<()> {
    writeln!(out, "Rules reference for the '{}' ruleset", rules.name)?;
    writeln!(out, "==========================================")?;
    writeln!(out)?;
    writeln!(out, "Turn structure")?;
    writeln!(out, "  Orders are read once per turn from orders.<faction>.")?;
    writeln!(out, "  Factions missing {} consecutive turns are removed.", rules.max_inactive_turns)?;
    writeln!(out, "  Upkeep is {} silver per man per month.", rules.maintenance_cost)?;
    writeln!(out)?;
    writeln!(out, "Available goods")?;
    for item in ALL_ITEMS {
        if item == Item::Silver || !rules.item_enabled(item) {
            continue;
        }
        writeln!(
            out,
            "  {:<10} {:>5} silver  ({})",
            item.keyword(),
            item.base_price(),
            item.category().name()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Orders")?;
    writeln!(out, "  find, enter, leave, promote, evict, attack, steal,")?;
    writeln!(out, "  assassinate, give, exchange, destroy, pillage, tax, guard,")?;
    writeln!(out, "  cast, sell, buy, forget, quit, withdraw, teach, form,")?;
    writeln!(out, "  work, study, produce, move, sail")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ruleset_enables_everything() {
        let rules = RuleSet::standard();
        for item in ALL_ITEMS {
            assert!(rules.item_enabled(item), "{:?} should be enabled", item);
        }
    }

    #[test]
    fn named_lookup() {
        assert!(RuleSet::named("standard").is_some());
        assert!(RuleSet::named("conquest").is_none());
        assert!(RuleSet::named("").is_none());
    }

    #[test]
    fn disabled_category_disables_items() {
        let mut rules = RuleSet::standard();
        rules.enabled[ItemCategory::Weapon.index()] = false;
        assert!(!rules.item_enabled(Item::Sword));
        assert!(rules.item_enabled(Item::Grain));
    }

    #[test]
    fn rules_reference_mentions_ruleset_name() {
        let rules = RuleSet::standard();
        let mut out = Vec::new();
        write_rules_reference(&rules, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("'standard'"));
        assert!(text.contains("sword"));
    }

    #[test]
    fn rules_reference_omits_disabled_items() {
        let mut rules = RuleSet::standard();
        rules.enabled[ItemCategory::Magic.index()] = false;
        let mut out = Vec::new();
        write_rules_reference(&rules, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("amulet"));
    }
}
