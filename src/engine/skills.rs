//! Skill phases: spellcasting, teaching, and the month-long orders that
//! convert a unit's month into wages, study, or production.

use crate::engine::{drain_orders, faction_error, faction_event, PhaseError, TurnCtx};
use crate::game::item::{Item, Skill};
use crate::game::session::Session;
use crate::orders::{MonthOrder, Order, Spell};

/// Days of study one month grants.
const STUDY_DAYS_PER_MONTH: u32 = 30;

/// Phase 14: CAST. Teleport marks a destination that the teleport phase
/// executes after ordinary movement; farsight reports on a distant region
/// immediately.
pub fn run_cast_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut casts: Vec<(u32, Spell)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Cast { .. })) {
                if let Order::Cast { spell } = order {
                    casts.push((num, spell));
                }
            }
        }
        for (num, spell) in casts {
            let faction = match session.regions[region_idx].unit(num) {
                Some(u) => u.faction,
                None => continue,
            };
            match spell {
                Spell::Teleport { region } => {
                    let knows = session.regions[region_idx]
                        .unit(num)
                        .map(|u| u.knows(Skill::Teleportation))
                        .unwrap_or(false);
                    if !knows {
                        faction_error(
                            session,
                            faction,
                            format!("cast: unit {} has not studied teleportation.", num),
                        );
                        continue;
                    }
                    let landable = session
                        .region(region)
                        .map(|r| !r.is_ocean())
                        .unwrap_or(false);
                    if !landable {
                        faction_error(
                            session,
                            faction,
                            format!("cast: cannot teleport to region {}.", region),
                        );
                        continue;
                    }
                    if let Some(unit) = session.regions[region_idx].unit_mut(num) {
                        unit.teleport_dest = Some(region);
                    }
                }
                Spell::Farsight { region } => {
                    let knows = session.regions[region_idx]
                        .unit(num)
                        .map(|u| u.knows(Skill::Magic))
                        .unwrap_or(false);
                    if !knows {
                        faction_error(
                            session,
                            faction,
                            format!("cast: unit {} has not studied magic.", num),
                        );
                        continue;
                    }
                    let seen = match session.region(region) {
                        Some(r) => format!(
                            "Farsight: {} ({}), wealth {}, {} units.",
                            r.name,
                            r.terrain.name(),
                            r.wealth,
                            r.units.len()
                        ),
                        None => {
                            faction_error(
                                session,
                                faction,
                                format!("cast: no region {}.", region),
                            );
                            continue;
                        }
                    };
                    faction_event(session, faction, seen);
                }
            }
        }
    }
    Ok(())
}

/// Phase 16: FORGET. Unconditional; days already studied are gone.
pub fn run_forget_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region in &mut session.regions {
        for unit in &mut region.units {
            for order in drain_orders(unit, |o| matches!(o, Order::Forget { .. })) {
                if let Order::Forget { skill } = order {
                    unit.forget_skill(skill);
                }
            }
        }
    }
    Ok(())
}

/// Phase 24: TEACH. A teacher doubles the study progress of listed
/// students in its region for the coming month phase. Teaching is the
/// teacher's month; the flag set here is consumed by the study branch of
/// [`run_month_orders`].
pub fn run_teach_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut lessons: Vec<(u32, Vec<u32>)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Teach { .. })) {
                if let Order::Teach { students } = order {
                    lessons.push((num, students));
                }
            }
        }
        for (teacher, students) in lessons {
            let faction = match session.regions[region_idx].unit(teacher) {
                Some(u) => u.faction,
                None => continue,
            };
            for student in students {
                let region = &session.regions[region_idx];
                let studying = match region.unit(student) {
                    Some(u) => match u.month_order {
                        Some(MonthOrder::Study { skill }) => Some((skill, u.skill_days(skill))),
                        _ => None,
                    },
                    None => {
                        faction_error(
                            session,
                            faction,
                            format!("teach: unit {} is not here.", student),
                        );
                        continue;
                    }
                };
                let (skill, student_days) = match studying {
                    Some(s) => s,
                    None => {
                        faction_error(
                            session,
                            faction,
                            format!("teach: unit {} is not studying.", student),
                        );
                        continue;
                    }
                };
                let qualified = region
                    .unit(teacher)
                    .map(|u| u.skill_days(skill) > student_days)
                    .unwrap_or(false);
                if !qualified {
                    faction_error(
                        session,
                        faction,
                        format!(
                            "teach: unit {} knows no more {} than its student.",
                            teacher,
                            skill.keyword()
                        ),
                    );
                    continue;
                }
                if let Some(u) = session.regions[region_idx].unit_mut(student) {
                    u.taught = true;
                }
                faction_event(
                    session,
                    faction,
                    format!("Unit {} teaches unit {}.", teacher, student),
                );
            }
        }
    }
    Ok(())
}

/// Phase 25: the month orders. WORK earns the region wage per man, STUDY
/// accrues skill days (doubled when taught), PRODUCE extracts the region's
/// terrain resource. MOVE and SAIL were already consumed by the movement
/// phases; any leftover is ignored.
pub fn run_month_orders(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let wages = session.regions[region_idx].wages;
        let resource = session.regions[region_idx].terrain.resource();
        let mut errors: Vec<(u32, String)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let order = match unit.month_order {
                Some(MonthOrder::Work) => MonthOrder::Work,
                Some(MonthOrder::Study { skill }) => MonthOrder::Study { skill },
                Some(MonthOrder::Produce { item }) => MonthOrder::Produce { item },
                // The movement phases already consumed these.
                Some(MonthOrder::Move { .. }) | Some(MonthOrder::Sail { .. }) | None => continue,
            };
            unit.month_order = None;
            if unit.is_empty() {
                continue;
            }
            match order {
                MonthOrder::Work => {
                    unit.add_item(Item::Silver, unit.men * wages);
                }
                MonthOrder::Study { skill } => {
                    let days = if unit.taught {
                        STUDY_DAYS_PER_MONTH * 2
                    } else {
                        STUDY_DAYS_PER_MONTH
                    };
                    unit.add_skill_days(skill, days);
                }
                MonthOrder::Produce { item } => {
                    if !ctx.rules.item_enabled(item) {
                        errors.push((
                            unit.faction,
                            format!("produce: {} is not in play.", item.keyword()),
                        ));
                        continue;
                    }
                    if resource != Some(item) {
                        errors.push((
                            unit.faction,
                            format!("produce: no {} to be had here.", item.keyword()),
                        ));
                        continue;
                    }
                    unit.add_item(item, unit.men);
                }
                MonthOrder::Move { .. } | MonthOrder::Sail { .. } => {}
            }
        }
        for (faction, message) in errors {
            faction_error(session, faction, message);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::region::Terrain;
    use crate::game::unit::Unit;
    use crate::rules::RuleSet;
    use std::path::Path;

    fn ctx(rules: &RuleSet) -> TurnCtx<'_> {
        TurnCtx {
            rules,
            dir: Path::new("."),
        }
    }

    fn one_unit() -> (Session, u32, u32) {
        let mut session = Session::dummy();
        let faction = session.new_faction("Scholars", false);
        let a = session.next_unit_num();
        let mut unit = Unit::new(a, faction, "A");
        unit.men = 4;
        session.regions[0].units.push(unit);
        (session, faction, a)
    }

    #[test]
    fn teleport_needs_the_skill() {
        let rules = RuleSet::standard();
        let (mut session, faction, a) = one_unit();
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Cast {
            spell: Spell::Teleport { region: 1 },
        });
        run_cast_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().teleport_dest, None);
        assert!(!session.faction(faction).unwrap().errors.is_empty());
    }

    #[test]
    fn teleport_marks_the_destination() {
        let rules = RuleSet::standard();
        let (mut session, _, a) = one_unit();
        session.regions[0]
            .unit_mut(a)
            .unwrap()
            .add_skill_days(Skill::Teleportation, 30);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Cast {
            spell: Spell::Teleport { region: 1 },
        });
        run_cast_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().teleport_dest, Some(1));
    }

    #[test]
    fn teleport_refuses_ocean_destinations() {
        let rules = RuleSet::standard();
        let (mut session, faction, a) = one_unit();
        session.regions[0].terrain = Terrain::Ocean;
        session.regions[0]
            .unit_mut(a)
            .unwrap()
            .add_skill_days(Skill::Teleportation, 30);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Cast {
            spell: Spell::Teleport { region: 1 },
        });
        run_cast_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().teleport_dest, None);
        assert!(!session.faction(faction).unwrap().errors.is_empty());
    }

    #[test]
    fn farsight_reports_the_region() {
        let rules = RuleSet::standard();
        let (mut session, faction, a) = one_unit();
        session.regions[0]
            .unit_mut(a)
            .unwrap()
            .add_skill_days(Skill::Magic, 30);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Cast {
            spell: Spell::Farsight { region: 1 },
        });
        run_cast_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(session
            .faction(faction)
            .unwrap()
            .events
            .iter()
            .any(|e| e.starts_with("Farsight:")));
    }

    #[test]
    fn forget_erases_the_skill() {
        let rules = RuleSet::standard();
        let (mut session, _, a) = one_unit();
        session.regions[0]
            .unit_mut(a)
            .unwrap()
            .add_skill_days(Skill::Combat, 60);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Forget {
            skill: Skill::Combat,
        });
        run_forget_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(!session.unit(a).unwrap().knows(Skill::Combat));
    }

    #[test]
    fn teaching_doubles_study() {
        let rules = RuleSet::standard();
        let (mut session, faction, a) = one_unit();
        let b = session.next_unit_num();
        let mut student = Unit::new(b, faction, "B");
        student.men = 2;
        student.month_order = Some(MonthOrder::Study {
            skill: Skill::Combat,
        });
        session.regions[0].units.push(student);
        session.regions[0]
            .unit_mut(a)
            .unwrap()
            .add_skill_days(Skill::Combat, 90);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Teach {
            students: vec![b],
        });
        run_teach_orders(&mut session, &ctx(&rules)).unwrap();
        run_month_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(b).unwrap().skill_days(Skill::Combat), 60);
    }

    #[test]
    fn teacher_must_outrank_the_student() {
        let rules = RuleSet::standard();
        let (mut session, faction, a) = one_unit();
        let b = session.next_unit_num();
        let mut student = Unit::new(b, faction, "B");
        student.men = 2;
        student.add_skill_days(Skill::Combat, 120);
        student.month_order = Some(MonthOrder::Study {
            skill: Skill::Combat,
        });
        session.regions[0].units.push(student);
        session.regions[0]
            .unit_mut(a)
            .unwrap()
            .add_skill_days(Skill::Combat, 30);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Teach {
            students: vec![b],
        });
        run_teach_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(!session.unit(b).unwrap().taught);
        assert!(!session.faction(faction).unwrap().errors.is_empty());
    }

    #[test]
    fn work_earns_the_region_wage() {
        let rules = RuleSet::standard();
        let (mut session, _, a) = one_unit();
        session.regions[0].wages = 12;
        session.regions[0].unit_mut(a).unwrap().month_order = Some(MonthOrder::Work);
        run_month_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().silver(), 48);
        assert_eq!(session.unit(a).unwrap().month_order, None);
    }

    #[test]
    fn produce_matches_the_terrain() {
        let rules = RuleSet::standard();
        let (mut session, faction, a) = one_unit();
        session.regions[0].terrain = Terrain::Forest;
        session.regions[0].unit_mut(a).unwrap().month_order =
            Some(MonthOrder::Produce { item: Item::Wood });
        run_month_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().item_amount(Item::Wood), 4);

        session.regions[0].unit_mut(a).unwrap().month_order =
            Some(MonthOrder::Produce { item: Item::Iron });
        run_month_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().item_amount(Item::Iron), 0);
        assert!(!session.faction(faction).unwrap().errors.is_empty());
    }

    #[test]
    fn leftover_move_orders_are_ignored() {
        let rules = RuleSet::standard();
        let (mut session, _, a) = one_unit();
        session.regions[0].unit_mut(a).unwrap().month_order = Some(MonthOrder::Move {
            dirs: vec![crate::game::region::Direction::North],
        });
        run_month_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(session.unit(a).unwrap().month_order.is_some());
    }
}
