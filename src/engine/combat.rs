//! Combat phases: explicit attacks, automatic attacks, and covert action.
//!
//! Explicit ATTACK orders resolve before automatic attacks so initiators
//! get first-strike semantics; auto-attacks then run against the
//! post-attack state, region by region in ascending id order. Resolution
//! is deterministic: side strengths are compared, the defender wins ties.

use crate::engine::{drain_orders, faction_error, faction_event, PhaseError, TurnCtx};
use crate::game::session::Session;
use crate::orders::Order;

/// Phase 6a: explicit ATTACK orders.
pub fn run_attack_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut attacks: Vec<(u32, u32)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let attacker = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Attack { .. })) {
                if let Order::Attack { target } = order {
                    attacks.push((attacker, target));
                }
            }
        }
        for (attacker, target) in attacks {
            resolve_attack(session, region_idx, attacker, target);
        }
    }
    Ok(())
}

/// Phase 6b: automatic region-triggered attacks. Hostile units assault
/// every other faction present. Regions resolve strictly one at a time
/// because deaths in an earlier region can change later resolutions.
pub fn run_auto_attacks(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        loop {
            let next = session.regions[region_idx]
                .units
                .iter()
                .find(|u| u.hostile && !u.is_empty())
                .and_then(|attacker| {
                    session.regions[region_idx]
                        .units
                        .iter()
                        .find(|t| t.faction != attacker.faction && !t.is_empty())
                        .map(|t| (attacker.num, t.num))
                });
            match next {
                // Every resolution empties at least one side, so this
                // loop always terminates.
                Some((attacker, target)) => resolve_attack(session, region_idx, attacker, target),
                None => break,
            }
        }
    }
    Ok(())
}

/// Resolves one battle between an attacking unit and a target unit in the
/// same region. Units of the defender's faction that are not avoiding
/// combat join the defense; guards of the region's guard faction join too.
fn resolve_attack(session: &mut Session, region_idx: usize, attacker: u32, target: u32) {
    let region = &session.regions[region_idx];
    let (attacker_faction, attack_strength) = match region.unit(attacker) {
        Some(u) if !u.is_empty() => (u.faction, u.strength()),
        _ => return,
    };
    let defender_faction = match region.unit(target) {
        Some(u) if !u.is_empty() => u.faction,
        _ => {
            faction_error(
                session,
                attacker_faction,
                format!("attack: unit {} is not here.", target),
            );
            return;
        }
    };
    if defender_faction == attacker_faction {
        faction_error(
            session,
            attacker_faction,
            "attack: cannot attack your own faction.".to_string(),
        );
        return;
    }

    // Region guards stand with whoever is attacked, unless the attacker
    // is their own faction.
    let guard_faction = region.guard_faction.filter(|&g| g != attacker_faction);
    let defenders: Vec<u32> = region
        .units
        .iter()
        .filter(|u| !u.is_empty() && u.faction != attacker_faction)
        .filter(|u| {
            (u.faction == defender_faction && (u.num == target || !u.avoid))
                || (u.guard && Some(u.faction) == guard_faction)
        })
        .map(|u| u.num)
        .collect();
    let defense_strength: i64 = defenders
        .iter()
        .filter_map(|&n| region.unit(n))
        .map(|u| u.strength())
        .sum();
    let guards_joined = match guard_faction {
        Some(g) if g != defender_faction => defenders
            .iter()
            .filter_map(|&n| region.unit(n))
            .any(|u| u.faction == g),
        _ => false,
    };

    let region_name = region.name.clone();
    if attack_strength > defense_strength {
        for num in &defenders {
            if let Some(unit) = session.regions[region_idx].unit_mut(*num) {
                unit.destroy();
            }
        }
        faction_event(
            session,
            attacker_faction,
            format!("Wins a battle in {}.", region_name),
        );
        faction_event(
            session,
            defender_faction,
            format!("Loses a battle in {} and is wiped out there.", region_name),
        );
        if guards_joined {
            if let Some(g) = guard_faction {
                faction_event(
                    session,
                    g,
                    format!("Guards are slain defending {}.", region_name),
                );
            }
        }
    } else {
        if let Some(unit) = session.regions[region_idx].unit_mut(attacker) {
            unit.destroy();
        }
        faction_event(
            session,
            attacker_faction,
            format!("Loses an attack in {}.", region_name),
        );
        faction_event(
            session,
            defender_faction,
            format!("Beats off an attack in {}.", region_name),
        );
        if guards_joined {
            if let Some(g) = guard_faction {
                faction_event(
                    session,
                    g,
                    format!("Guards beat off an attack in {}.", region_name),
                );
            }
        }
    }
}

/// Phase 7: STEAL and ASSASSINATE. Both need the stealth skill and run
/// after combat, since combat can remove either party.
pub fn run_steal_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut actions: Vec<(u32, Order)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let actor = unit.num;
            for order in drain_orders(unit, |o| {
                matches!(o, Order::Steal { .. } | Order::Assassinate { .. })
            }) {
                actions.push((actor, order));
            }
        }
        for (actor, order) in actions {
            match order {
                Order::Steal { target, item } => steal(session, region_idx, actor, target, item),
                Order::Assassinate { target } => assassinate(session, region_idx, actor, target),
                _ => unreachable!("drained only covert orders"),
            }
        }
    }
    Ok(())
}

fn steal(
    session: &mut Session,
    region_idx: usize,
    actor: u32,
    target: u32,
    item: crate::game::item::Item,
) {
    use crate::game::item::Skill;

    let region = &session.regions[region_idx];
    let (actor_faction, is_sneaky) = match region.unit(actor) {
        Some(u) if !u.is_empty() => (u.faction, u.knows(Skill::Stealth)),
        _ => return,
    };
    if !is_sneaky {
        faction_error(
            session,
            actor_faction,
            "steal: the unit knows no stealth.".to_string(),
        );
        return;
    }
    let victim = match region.unit(target) {
        Some(u) if !u.is_empty() && u.faction != actor_faction => u.num,
        _ => {
            faction_error(
                session,
                actor_faction,
                format!("steal: no valid target unit {}.", target),
            );
            return;
        }
    };
    let victim_faction = session.regions[region_idx].unit(victim).map(|u| u.faction);
    let taken = session.regions[region_idx]
        .unit_mut(victim)
        .map(|u| u.take_item(item, 1))
        .unwrap_or(0);
    if taken == 0 {
        faction_error(
            session,
            actor_faction,
            format!("steal: unit {} has no {}.", target, item.keyword()),
        );
        return;
    }
    if let Some(unit) = session.regions[region_idx].unit_mut(actor) {
        unit.add_item(item, taken);
    }
    faction_event(
        session,
        actor_faction,
        format!("Steals {} from unit {}.", item.keyword(), target),
    );
    if let Some(vf) = victim_faction {
        faction_event(
            session,
            vf,
            format!("Unit {} is robbed by persons unknown.", target),
        );
    }
}

fn assassinate(session: &mut Session, region_idx: usize, actor: u32, target: u32) {
    use crate::game::item::Skill;

    let region = &session.regions[region_idx];
    let (actor_faction, is_sneaky) = match region.unit(actor) {
        Some(u) if !u.is_empty() => (u.faction, u.knows(Skill::Stealth)),
        _ => return,
    };
    if !is_sneaky {
        faction_error(
            session,
            actor_faction,
            "assassinate: the unit knows no stealth.".to_string(),
        );
        return;
    }
    let victim_faction = match region.unit(target) {
        Some(u) if !u.is_empty() && u.faction != actor_faction => {
            if u.men > 1 {
                faction_error(
                    session,
                    actor_faction,
                    format!("assassinate: unit {} is too well guarded.", target),
                );
                return;
            }
            u.faction
        }
        _ => {
            faction_error(
                session,
                actor_faction,
                format!("assassinate: no valid target unit {}.", target),
            );
            return;
        }
    };
    if let Some(unit) = session.regions[region_idx].unit_mut(target) {
        unit.destroy();
    }
    faction_event(
        session,
        actor_faction,
        format!("Assassinates unit {}.", target),
    );
    faction_event(
        session,
        victim_faction,
        format!("Unit {} is assassinated by persons unknown.", target),
    );
}
