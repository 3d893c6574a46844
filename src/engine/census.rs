//! Bookkeeping phases: default orders, inactivity removal, unit cleanup,
//! dead-faction detection, maintenance, and the mid/post checkpoints.

use crate::engine::{PhaseError, TurnCtx};
use crate::game::item::Item;
use crate::game::session::{GameStatus, Session};
use crate::game::unit::TaxState;
use crate::orders::{MonthOrder, Order};

/// Phase 1: units with no month-long order and nothing else claiming
/// their month fall back to working for wages.
pub fn default_work_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    let npc_factions: Vec<u32> = session
        .factions
        .iter()
        .filter(|f| f.is_npc)
        .map(|f| f.num)
        .collect();
    for region in &mut session.regions {
        if region.is_ocean() {
            continue;
        }
        for unit in &mut region.units {
            if npc_factions.contains(&unit.faction) || unit.month_order.is_some() {
                continue;
            }
            // Tax, pillage, and teach occupy the month themselves.
            let month_claimed = unit
                .orders
                .iter()
                .any(|o| matches!(o, Order::Tax | Order::Pillage | Order::Teach { .. }));
            if !month_claimed {
                unit.month_order = Some(MonthOrder::Work);
            }
        }
    }
    Ok(())
}

/// Phase 2: factions that have missed too many consecutive turns are
/// flagged as quitting and stripped of their pending orders before they
/// can act. Their assets are wound up by the quit phase.
pub fn remove_inactive_factions(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    let turn = session.turn;
    let mut removed = Vec::new();
    for faction in &mut session.factions {
        if faction.is_npc || !faction.exists || faction.quit {
            continue;
        }
        if turn.saturating_sub(faction.last_orders) >= ctx.rules.max_inactive_turns {
            faction.quit = true;
            faction.event("Removed from the game for inactivity.".to_string());
            removed.push(faction.num);
        }
    }
    if !removed.is_empty() {
        for region in &mut session.regions {
            for unit in &mut region.units {
                if removed.contains(&unit.faction) {
                    unit.orders.clear();
                    unit.month_order = None;
                }
            }
        }
    }
    Ok(())
}

/// Phases 19 and 22: delete empty units, sink uncrewed ships, and drown
/// units left in the open ocean. Run twice per turn because movement can
/// newly empty, uncrew, or strand units.
pub fn unit_cleanup(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    delete_empty_units(session);
    sink_uncrewed_ships(session);
    drown_units(session);
    Ok(())
}

fn delete_empty_units(session: &mut Session) {
    for region in &mut session.regions {
        region.units.retain(|u| !u.is_empty());
    }
}

fn sink_uncrewed_ships(session: &mut Session) {
    for region in &mut session.regions {
        if !region.is_ocean() {
            continue;
        }
        let sunk: Vec<u32> = region
            .structures
            .iter()
            .filter(|s| s.kind.is_ship())
            .map(|s| s.id)
            .filter(|&id| region.structure_men(id) == 0)
            .collect();
        if sunk.is_empty() {
            continue;
        }
        region.structures.retain(|s| !sunk.contains(&s.id));
        for unit in &mut region.units {
            if let Some(id) = unit.structure {
                if sunk.contains(&id) {
                    unit.structure = None;
                }
            }
        }
    }
}

fn drown_units(session: &mut Session) {
    let mut drowned: Vec<(u32, String)> = Vec::new();
    for region in &mut session.regions {
        if !region.is_ocean() {
            continue;
        }
        let ship_ids: Vec<u32> = region
            .structures
            .iter()
            .filter(|s| s.kind.is_ship())
            .map(|s| s.id)
            .collect();
        for unit in &mut region.units {
            let sheltered = unit
                .structure
                .map(|id| ship_ids.contains(&id))
                .unwrap_or(false);
            if !sheltered && !unit.is_empty() {
                drowned.push((unit.faction, format!("{} ({}) drowns in the ocean.", unit.name, unit.num)));
                unit.destroy();
            }
        }
        region.units.retain(|u| !u.is_empty());
    }
    for (faction, message) in drowned {
        super::faction_event(session, faction, message);
    }
}

/// Phase 23: a human faction with no surviving units is dead.
pub fn find_dead_factions(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    let mut alive: Vec<u32> = Vec::new();
    for region in &session.regions {
        for unit in &region.units {
            if !alive.contains(&unit.faction) {
                alive.push(unit.faction);
            }
        }
    }
    for faction in &mut session.factions {
        if faction.is_npc || !faction.exists {
            continue;
        }
        if !alive.contains(&faction.num) {
            faction.exists = false;
            faction.event("Your faction has been eliminated.".to_string());
        }
    }
    Ok(())
}

/// Phase 26: upkeep is charged after every asset-affecting order, so the
/// bill reflects end-of-turn holdings. Men that cannot be paid starve.
pub fn assess_maintenance(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    let npc_factions: Vec<u32> = session
        .factions
        .iter()
        .filter(|f| f.is_npc)
        .map(|f| f.num)
        .collect();
    let cost_per_man = ctx.rules.maintenance_cost;
    let mut starvations: Vec<(u32, String)> = Vec::new();

    for region in &mut session.regions {
        for unit in &mut region.units {
            if npc_factions.contains(&unit.faction) || unit.is_empty() {
                continue;
            }
            let bill = unit.men * cost_per_man;
            let paid = unit.take_item(Item::Silver, bill);
            if paid < bill {
                let shortfall = bill - paid;
                let starved = (shortfall + cost_per_man - 1) / cost_per_man;
                let starved = starved.min(unit.men);
                unit.men -= starved;
                starvations.push((
                    unit.faction,
                    format!("{} ({}): {} men starve.", unit.name, unit.num, starved),
                ));
            }
        }
    }
    for (faction, message) in starvations {
        super::faction_event(session, faction, message);
    }
    Ok(())
}

/// Phase 17: mid-turn checkpoint. Settles region guard ownership from the
/// guard flags before QUIT is evaluated.
pub fn mid_process_turn(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region in &mut session.regions {
        region.guard_faction = region
            .units
            .iter()
            .find(|u| u.guard && !u.is_empty())
            .map(|u| u.faction);
    }
    Ok(())
}

/// Phase 27: post-turn checkpoint. Regional wealth regrows, markets
/// restock, per-turn unit state resets, and a world with no surviving
/// human factions is marked finished.
pub fn post_process_turn(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region in &mut session.regions {
        if region.is_ocean() {
            continue;
        }
        region.wealth += (region.wealth / 20).max(10);
        if let Some(line) = region.market_line_mut(Item::Grain) {
            if line.amount < 10 {
                line.amount = 10;
            }
        }
        for unit in &mut region.units {
            unit.taxing = TaxState::None;
            unit.taught = false;
        }
    }
    if session.human_factions().count() == 0 {
        session.status = GameStatus::Finished;
    }
    Ok(())
}

/// Phase 30: purge factions confirmed dead this turn, after their final
/// reports have been written.
pub fn purge_dead_factions(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    session.factions.retain(|f| f.is_npc || f.exists);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::region::{Region, Structure, StructureKind, Terrain};
    use crate::game::unit::Unit;
    use crate::rules::RuleSet;
    use std::path::Path;

    fn ctx(rules: &RuleSet) -> TurnCtx<'_> {
        TurnCtx {
            rules,
            dir: Path::new("."),
        }
    }

    /// One land region, one human faction, one unit with some men.
    fn base_session() -> (Session, u32, u32) {
        let mut session = Session::dummy();
        let faction = session.new_faction("Humans", false);
        let num = session.next_unit_num();
        let mut unit = Unit::new(num, faction, "Squad");
        unit.men = 10;
        session.regions[0].units.push(unit);
        (session, faction, num)
    }

    #[test]
    fn idle_units_default_to_work() {
        let rules = RuleSet::standard();
        let (mut session, _, unit) = base_session();
        default_work_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(matches!(
            session.unit(unit).unwrap().month_order,
            Some(MonthOrder::Work)
        ));
    }

    #[test]
    fn taxing_units_are_not_defaulted() {
        let rules = RuleSet::standard();
        let (mut session, _, unit) = base_session();
        session.regions[0].unit_mut(unit).unwrap().orders.push(Order::Tax);
        default_work_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(session.unit(unit).unwrap().month_order.is_none());
    }

    #[test]
    fn npc_units_are_not_defaulted() {
        let rules = RuleSet::standard();
        let mut session = Session::dummy();
        let npc = session.new_faction("Guards", true);
        let num = session.next_unit_num();
        let mut unit = Unit::new(num, npc, "Guard");
        unit.men = 10;
        session.regions[0].units.push(unit);
        default_work_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(session.unit(num).unwrap().month_order.is_none());
    }

    #[test]
    fn inactive_factions_are_flagged_and_silenced() {
        let rules = RuleSet::standard();
        let (mut session, faction, unit) = base_session();
        session.turn = 5;
        session.faction_mut(faction).unwrap().last_orders = 1;
        session.regions[0].unit_mut(unit).unwrap().orders.push(Order::Tax);

        remove_inactive_factions(&mut session, &ctx(&rules)).unwrap();
        assert!(session.faction(faction).unwrap().quit);
        assert!(session.unit(unit).unwrap().orders.is_empty());
    }

    #[test]
    fn recently_active_factions_are_kept() {
        let rules = RuleSet::standard();
        let (mut session, faction, _) = base_session();
        session.turn = 5;
        session.faction_mut(faction).unwrap().last_orders = 4;
        remove_inactive_factions(&mut session, &ctx(&rules)).unwrap();
        assert!(!session.faction(faction).unwrap().quit);
    }

    #[test]
    fn cleanup_deletes_empty_units() {
        let rules = RuleSet::standard();
        let (mut session, _, unit) = base_session();
        session.regions[0].unit_mut(unit).unwrap().men = 0;
        unit_cleanup(&mut session, &ctx(&rules)).unwrap();
        assert!(session.unit(unit).is_none());
    }

    #[test]
    fn cleanup_sinks_uncrewed_ships_and_drowns_strays() {
        let rules = RuleSet::standard();
        let mut session = Session::dummy();
        let faction = session.new_faction("Sailors", false);
        let mut ocean = Region::new(2, "Open Sea", Terrain::Ocean);
        ocean.structures.push(Structure {
            id: 101,
            name: "Derelict".into(),
            kind: StructureKind::Ship,
            owner: None,
        });
        let mut stray = Unit::new(10, faction, "Castaways");
        stray.men = 4;
        ocean.units.push(stray);
        session.regions.push(ocean);

        unit_cleanup(&mut session, &ctx(&rules)).unwrap();
        let ocean = session.region(2).unwrap();
        assert!(ocean.structures.is_empty(), "uncrewed ship should sink");
        assert!(ocean.units.is_empty(), "stray unit should drown");
        let faction = session.faction(faction).unwrap();
        assert!(faction.events.iter().any(|e| e.contains("drowns")));
    }

    #[test]
    fn crewed_ship_shelters_its_unit() {
        let rules = RuleSet::standard();
        let mut session = Session::dummy();
        let faction = session.new_faction("Sailors", false);
        let mut ocean = Region::new(2, "Open Sea", Terrain::Ocean);
        ocean.structures.push(Structure {
            id: 101,
            name: "Longboat".into(),
            kind: StructureKind::Ship,
            owner: Some(10),
        });
        let mut crew = Unit::new(10, faction, "Crew");
        crew.men = 4;
        crew.structure = Some(101);
        ocean.units.push(crew);
        session.regions.push(ocean);

        unit_cleanup(&mut session, &ctx(&rules)).unwrap();
        let ocean = session.region(2).unwrap();
        assert_eq!(ocean.structures.len(), 1);
        assert_eq!(ocean.units.len(), 1);
    }

    #[test]
    fn dead_factions_are_found_then_purged() {
        let rules = RuleSet::standard();
        let (mut session, faction, unit) = base_session();
        session.regions[0].unit_mut(unit).unwrap().men = 0;
        unit_cleanup(&mut session, &ctx(&rules)).unwrap();
        find_dead_factions(&mut session, &ctx(&rules)).unwrap();
        assert!(!session.faction(faction).unwrap().exists);
        purge_dead_factions(&mut session, &ctx(&rules)).unwrap();
        assert!(session.faction(faction).is_none());
    }

    #[test]
    fn maintenance_charges_silver() {
        let rules = RuleSet::standard();
        let (mut session, _, unit) = base_session();
        session
            .regions[0]
            .unit_mut(unit)
            .unwrap()
            .add_item(Item::Silver, 1000);
        assess_maintenance(&mut session, &ctx(&rules)).unwrap();
        let u = session.unit(unit).unwrap();
        assert_eq!(u.men, 10);
        assert_eq!(u.silver(), 1000 - 10 * rules.maintenance_cost);
    }

    #[test]
    fn unpaid_men_starve() {
        let rules = RuleSet::standard();
        let (mut session, faction, unit) = base_session();
        // 10 men, bill 100, only 45 silver: 6 men short-paid, so 6 starve.
        session
            .regions[0]
            .unit_mut(unit)
            .unwrap()
            .add_item(Item::Silver, 45);
        assess_maintenance(&mut session, &ctx(&rules)).unwrap();
        let u = session.unit(unit).unwrap();
        assert_eq!(u.men, 4);
        assert_eq!(u.silver(), 0);
        assert!(session
            .faction(faction)
            .unwrap()
            .events
            .iter()
            .any(|e| e.contains("starve")));
    }

    #[test]
    fn mid_process_settles_guard_ownership() {
        let rules = RuleSet::standard();
        let (mut session, faction, unit) = base_session();
        session.regions[0].unit_mut(unit).unwrap().guard = true;
        mid_process_turn(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.regions[0].guard_faction, Some(faction));
    }

    #[test]
    fn post_process_finishes_a_world_without_humans() {
        let rules = RuleSet::standard();
        let (mut session, faction, _) = base_session();
        session.faction_mut(faction).unwrap().exists = false;
        post_process_turn(&mut session, &ctx(&rules)).unwrap();
        assert!(session.is_finished());
    }

    #[test]
    fn post_process_regrows_wealth_and_resets_flags() {
        let rules = RuleSet::standard();
        let (mut session, _, unit) = base_session();
        session.regions[0].wealth = 100;
        {
            let u = session.regions[0].unit_mut(unit).unwrap();
            u.taxing = TaxState::Pillage;
            u.taught = true;
        }
        post_process_turn(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.regions[0].wealth, 110);
        let u = session.unit(unit).unwrap();
        assert_eq!(u.taxing, TaxState::None);
        assert!(!u.taught);
    }
}
