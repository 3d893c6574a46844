//! Movement phases: sailing, walking, and teleport execution.
//!
//! All relocation funnels through [`relocate_unit`] so a unit is never
//! present in two regions at once.

use crate::engine::{faction_error, faction_event, PhaseError, TurnCtx};
use crate::game::item::{Item, Skill};
use crate::game::region::Direction;
use crate::game::session::Session;
use crate::orders::MonthOrder;

/// Exits a ship may take per month.
const SAIL_RANGE: usize = 2;

fn relocate_unit(session: &mut Session, from: u32, to: u32, num: u32) {
    let unit = session
        .region_mut(from)
        .and_then(|r| r.take_unit(num));
    if let (Some(unit), Some(dest)) = (unit, session.region_mut(to)) {
        dest.units.push(unit);
    }
}

/// Phase 21a: SAIL. The ship's owner steers; the ship and everyone aboard
/// relocate together, up to two exits per month. Sailing runs before
/// overland movement so transports reposition first.
pub fn run_sail_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    let mut voyages: Vec<(u32, u32, Vec<Direction>)> = Vec::new();
    for region in &mut session.regions {
        let id = region.id;
        for unit in &mut region.units {
            if let Some(MonthOrder::Sail { .. }) = unit.month_order {
                if let Some(MonthOrder::Sail { dirs }) = unit.month_order.take() {
                    voyages.push((id, unit.num, dirs));
                }
            }
        }
    }
    for (start, captain, dirs) in voyages {
        sail(session, start, captain, dirs);
    }
    Ok(())
}

fn sail(session: &mut Session, start: u32, captain: u32, dirs: Vec<Direction>) {
    let region = match session.region(start) {
        Some(r) => r,
        None => return,
    };
    let (faction, aboard) = match region.unit(captain) {
        Some(u) => (u.faction, u.structure),
        None => return,
    };
    let ship = match aboard {
        Some(s) if region.structure(s).map(|st| st.kind.is_ship()).unwrap_or(false) => s,
        _ => {
            faction_error(
                session,
                faction,
                format!("sail: unit {} is not aboard a ship.", captain),
            );
            return;
        }
    };
    let owns = region.structure(ship).and_then(|s| s.owner) == Some(captain);
    if !owns {
        faction_error(
            session,
            faction,
            format!("sail: unit {} does not captain the ship.", captain),
        );
        return;
    }
    if !region.unit(captain).map(|u| u.knows(Skill::Sailing)).unwrap_or(false) {
        faction_error(
            session,
            faction,
            format!("sail: unit {} has not studied sailing.", captain),
        );
        return;
    }

    let mut here = start;
    let mut sailed = 0usize;
    for dir in dirs.into_iter().take(SAIL_RANGE) {
        let next = match session.region(here).and_then(|r| r.exit(dir)) {
            Some(n) => n,
            None => {
                faction_error(
                    session,
                    faction,
                    format!("sail: no passage {} from here.", dir.keyword()),
                );
                break;
            }
        };
        here = next;
        sailed += 1;
    }
    if sailed == 0 || here == start {
        return;
    }

    // Move the hull, then its whole complement.
    let hull = session
        .region_mut(start)
        .map(|r| {
            let idx = r.structures.iter().position(|s| s.id == ship);
            idx.map(|i| r.structures.remove(i))
        })
        .unwrap_or(None);
    let crew: Vec<u32> = session
        .region(start)
        .map(|r| {
            r.units
                .iter()
                .filter(|u| u.structure == Some(ship))
                .map(|u| u.num)
                .collect()
        })
        .unwrap_or_default();
    if let (Some(hull), Some(dest)) = (hull, session.region_mut(here)) {
        dest.structures.push(hull);
    }
    for num in crew {
        relocate_unit(session, start, here, num);
    }
    let dest_name = session
        .region(here)
        .map(|r| r.name.clone())
        .unwrap_or_default();
    faction_event(
        session,
        faction,
        format!("Unit {} sails to {}.", captain, dest_name),
    );
}

/// Phase 21b: MOVE. One exit per month on foot, two when every man is
/// mounted. Walking into the ocean is refused.
pub fn run_move_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    let mut marches: Vec<(u32, u32, Vec<Direction>)> = Vec::new();
    for region in &mut session.regions {
        let id = region.id;
        for unit in &mut region.units {
            if let Some(MonthOrder::Move { .. }) = unit.month_order {
                if let Some(MonthOrder::Move { dirs }) = unit.month_order.take() {
                    marches.push((id, unit.num, dirs));
                }
            }
        }
    }
    for (start, num, dirs) in marches {
        walk(session, start, num, dirs);
    }
    Ok(())
}

fn walk(session: &mut Session, start: u32, num: u32, dirs: Vec<Direction>) {
    let (faction, range) = match session.region(start).and_then(|r| r.unit(num)) {
        Some(u) => {
            let mounted = u.item_amount(Item::Horse) >= u.men;
            (u.faction, if mounted { 2 } else { 1 })
        }
        None => return,
    };
    let mut here = start;
    for dir in dirs.into_iter().take(range) {
        let next = match session.region(here).and_then(|r| r.exit(dir)) {
            Some(n) => n,
            None => {
                faction_error(
                    session,
                    faction,
                    format!("move: no exit {} from here.", dir.keyword()),
                );
                break;
            }
        };
        if session.region(next).map(|r| r.is_ocean()).unwrap_or(true) {
            faction_error(
                session,
                faction,
                format!("move: unit {} cannot walk into the ocean.", num),
            );
            break;
        }
        here = next;
    }
    if here == start {
        return;
    }
    if let Some(unit) = session.region_mut(start).and_then(|r| r.unit_mut(num)) {
        unit.structure = None;
        unit.guard = false;
    }
    relocate_unit(session, start, here, num);
    let dest_name = session
        .region(here)
        .map(|r| r.name.clone())
        .unwrap_or_default();
    faction_event(
        session,
        faction,
        format!("Unit {} arrives in {}.", num, dest_name),
    );
}

/// Tail of phase 25: executes teleports marked by the cast phase. Runs
/// after ordinary movement so a teleport always wins the month.
pub fn run_teleport_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    let mut jumps: Vec<(u32, u32, u32)> = Vec::new();
    for region in &mut session.regions {
        let id = region.id;
        for unit in &mut region.units {
            if let Some(dest) = unit.teleport_dest.take() {
                jumps.push((id, unit.num, dest));
            }
        }
    }
    for (start, num, dest) in jumps {
        if session.region(dest).is_none() || dest == start {
            continue;
        }
        let faction = match session.region(start).and_then(|r| r.unit(num)) {
            Some(u) => u.faction,
            None => continue,
        };
        if let Some(unit) = session.region_mut(start).and_then(|r| r.unit_mut(num)) {
            unit.structure = None;
            unit.guard = false;
        }
        relocate_unit(session, start, dest, num);
        let dest_name = session
            .region(dest)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        faction_event(
            session,
            faction,
            format!("Unit {} appears in {}.", num, dest_name),
        );
    }
    Ok(())
}
