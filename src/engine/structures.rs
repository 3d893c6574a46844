//! Structure phases: lookups, occupancy, ownership, and demolition.

use crate::engine::{drain_orders, faction_error, faction_event, PhaseError, TurnCtx};
use crate::game::session::Session;
use crate::orders::Order;

/// Phase 3: FIND. Looks a faction number up by its public name and
/// reports it back to the asking faction.
pub fn run_find_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut finds: Vec<(u32, u32)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let asker = unit.faction;
            for order in drain_orders(unit, |o| matches!(o, Order::Find { .. })) {
                if let Order::Find { faction } = order {
                    finds.push((asker, faction));
                }
            }
        }
        for (asker, wanted) in finds {
            match session.faction(wanted) {
                Some(f) if f.exists => {
                    let line = format!("Faction {} is {}.", f.num, f.name);
                    faction_event(session, asker, line);
                }
                _ => {
                    faction_error(session, asker, format!("find: no faction {}.", wanted));
                }
            }
        }
    }
    Ok(())
}

/// Phase 4: ENTER and LEAVE, in submission order per unit. Entering an
/// unowned structure claims ownership; leaving passes ownership to the
/// first remaining occupant.
pub fn run_enter_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut moves: Vec<(u32, Order)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| {
                matches!(o, Order::Enter { .. } | Order::Leave)
            }) {
                moves.push((num, order));
            }
        }
        for (num, order) in moves {
            match order {
                Order::Enter { structure } => enter(session, region_idx, num, structure),
                Order::Leave => leave(session, region_idx, num),
                _ => {}
            }
        }
    }
    Ok(())
}

fn enter(session: &mut Session, region_idx: usize, num: u32, structure: u32) {
    let faction = match session.regions[region_idx].unit(num) {
        Some(u) => u.faction,
        None => return,
    };
    if session.regions[region_idx].structure(structure).is_none() {
        faction_error(
            session,
            faction,
            format!("enter: no structure {} here.", structure),
        );
        return;
    }
    let was_inside = session.regions[region_idx]
        .unit(num)
        .and_then(|u| u.structure);
    if let Some(old) = was_inside {
        vacate(&mut session.regions[region_idx], num, old);
    }
    let region = &mut session.regions[region_idx];
    if let Some(unit) = region.unit_mut(num) {
        unit.structure = Some(structure);
    }
    if let Some(s) = region.structure_mut(structure) {
        if s.owner.is_none() {
            s.owner = Some(num);
        }
    }
    let name = region
        .structure(structure)
        .map(|s| s.name.clone())
        .unwrap_or_default();
    faction_event(session, faction, format!("Unit {} enters {}.", num, name));
}

fn leave(session: &mut Session, region_idx: usize, num: u32) {
    let (faction, inside) = match session.regions[region_idx].unit(num) {
        Some(u) => (u.faction, u.structure),
        None => return,
    };
    let structure = match inside {
        Some(s) => s,
        None => {
            faction_error(
                session,
                faction,
                format!("leave: unit {} is not inside anything.", num),
            );
            return;
        }
    };
    if session.regions[region_idx].is_ocean() {
        faction_error(
            session,
            faction,
            format!("leave: unit {} cannot step off a ship at sea.", num),
        );
        return;
    }
    if let Some(unit) = session.regions[region_idx].unit_mut(num) {
        unit.structure = None;
    }
    vacate(&mut session.regions[region_idx], num, structure);
}

/// Hands a structure's ownership to its first remaining occupant when the
/// current owner departs.
fn vacate(region: &mut crate::game::region::Region, departing: u32, structure: u32) {
    let owns = region
        .structure(structure)
        .map(|s| s.owner == Some(departing))
        .unwrap_or(false);
    if !owns {
        return;
    }
    let heir = region
        .units
        .iter()
        .find(|u| u.structure == Some(structure) && u.num != departing)
        .map(|u| u.num);
    if let Some(s) = region.structure_mut(structure) {
        s.owner = heir;
    }
}

/// Phase 5: PROMOTE and EVICT. Both act on the structure the issuing unit
/// owns, against another occupant of the same structure.
pub fn run_promote_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut acts: Vec<(u32, Order)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| {
                matches!(o, Order::Promote { .. } | Order::Evict { .. })
            }) {
                acts.push((num, order));
            }
        }
        for (num, order) in acts {
            let region = &session.regions[region_idx];
            let (faction, inside) = match region.unit(num) {
                Some(u) => (u.faction, u.structure),
                None => continue,
            };
            let structure = match inside {
                Some(s) if region.structure(s).and_then(|st| st.owner) == Some(num) => s,
                _ => {
                    faction_error(
                        session,
                        faction,
                        format!("promote: unit {} owns no structure.", num),
                    );
                    continue;
                }
            };
            let target = match order {
                Order::Promote { target } | Order::Evict { target } => target,
                _ => continue,
            };
            let target_inside = region
                .unit(target)
                .map(|u| u.structure == Some(structure))
                .unwrap_or(false);
            if !target_inside {
                faction_error(
                    session,
                    faction,
                    format!("promote: unit {} is not in the structure.", target),
                );
                continue;
            }
            let region = &mut session.regions[region_idx];
            match order {
                Order::Promote { .. } => {
                    if let Some(s) = region.structure_mut(structure) {
                        s.owner = Some(target);
                    }
                    faction_event(
                        session,
                        faction,
                        format!("Unit {} promotes unit {} to owner.", num, target),
                    );
                }
                Order::Evict { .. } => {
                    if region.is_ocean() {
                        faction_error(
                            session,
                            faction,
                            "evict: cannot put anyone overboard at sea.".to_string(),
                        );
                        continue;
                    }
                    let evicted_faction = region.unit(target).map(|u| u.faction);
                    if let Some(u) = region.unit_mut(target) {
                        u.structure = None;
                    }
                    faction_event(
                        session,
                        faction,
                        format!("Unit {} evicts unit {}.", num, target),
                    );
                    if let Some(ef) = evicted_faction {
                        if ef != faction {
                            faction_event(
                                session,
                                ef,
                                format!("Unit {} is evicted from its structure.", target),
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Phase 10: DESTROY. The owner demolishes the structure it is in;
/// occupants end up outside.
pub fn run_destroy_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut wreckers: Vec<u32> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for _ in drain_orders(unit, |o| matches!(o, Order::Destroy)) {
                wreckers.push(num);
            }
        }
        for num in wreckers {
            let region = &session.regions[region_idx];
            let (faction, inside) = match region.unit(num) {
                Some(u) => (u.faction, u.structure),
                None => continue,
            };
            let structure = match inside {
                Some(s) if region.structure(s).and_then(|st| st.owner) == Some(num) => s,
                _ => {
                    faction_error(
                        session,
                        faction,
                        format!("destroy: unit {} owns no structure.", num),
                    );
                    continue;
                }
            };
            if region.is_ocean() {
                faction_error(
                    session,
                    faction,
                    "destroy: scuttling a ship at sea would drown the crew.".to_string(),
                );
                continue;
            }
            let region = &mut session.regions[region_idx];
            let name = region
                .structure(structure)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            for unit in &mut region.units {
                if unit.structure == Some(structure) {
                    unit.structure = None;
                }
            }
            region.structures.retain(|s| s.id != structure);
            faction_event(
                session,
                faction,
                format!("Unit {} tears down {}.", num, name),
            );
        }
    }
    Ok(())
}
