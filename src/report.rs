//! Per-faction turn reports and the player roster.
//!
//! Both writers run as phases near the end of the turn, after all world
//! mutation, so they see final state. Reports go to `report.<faction>` in
//! the game directory; the roster goes to `players.out`. Every non-NPC
//! faction gets a report, including one eliminated this turn, so its
//! player learns what happened to it.

use std::fs::File;
use std::io::{BufWriter, Write};

use crate::engine::{PhaseError, TurnCtx};
use crate::game::faction::Faction;
use crate::game::region::Region;
use crate::game::session::Session;

/// Phase 28: writes `report.<num>` for every human faction.
pub fn write_reports(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    for faction in session.factions.iter().filter(|f| !f.is_npc) {
        let path = ctx.dir.join(format!("report.{}", faction.num));
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        write_faction_report(&mut out, session, faction)?;
        out.flush()?;
    }
    Ok(())
}

fn write_faction_report<W: Write>(
    out: &mut W,
    session: &Session,
    faction: &Faction,
) -> Result<(), std::io::Error> {
    writeln!(out, "{} Turn Report", session.name)?;
    writeln!(out, "{} ({})", faction.name, faction.num)?;
    writeln!(
        out,
        "{}, Year {} (turn {})",
        session.month_name(),
        session.year + 1,
        session.turn
    )?;
    writeln!(out)?;

    if !faction.exists {
        writeln!(out, "Your faction is no more.")?;
        writeln!(out)?;
    }

    if !faction.errors.is_empty() {
        writeln!(out, "Errors during turn:")?;
        for line in &faction.errors {
            writeln!(out, "  {}", line)?;
        }
        writeln!(out)?;
    }

    if !faction.events.is_empty() {
        writeln!(out, "Events during turn:")?;
        for line in &faction.events {
            writeln!(out, "  {}", line)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Unclaimed silver: {}.", faction.unclaimed)?;
    writeln!(out)?;

    for region in &session.regions {
        if !region.units.iter().any(|u| u.faction == faction.num) {
            continue;
        }
        write_region_report(out, region, faction.num)?;
    }
    Ok(())
}

fn write_region_report<W: Write>(
    out: &mut W,
    region: &Region,
    faction: u32,
) -> Result<(), std::io::Error> {
    writeln!(
        out,
        "{} ({}), wealth {}, wages {}.",
        region.name,
        region.terrain.name(),
        region.wealth,
        region.wages
    )?;
    for line in &region.market {
        writeln!(
            out,
            "  for sale: {} {} at {} silver.",
            line.amount,
            line.item.keyword(),
            line.price
        )?;
    }
    for structure in &region.structures {
        writeln!(out, "  {} [{}] ({}).", structure.name, structure.id, structure.kind.name())?;
    }
    for unit in &region.units {
        // Own units in full; everyone else as a silhouette.
        if unit.faction == faction {
            let items: Vec<String> = unit
                .items
                .iter()
                .map(|s| format!("{} {}", s.amount, s.item.keyword()))
                .collect();
            let skills: Vec<String> = unit
                .skills
                .iter()
                .map(|r| format!("{} {}", r.skill.keyword(), r.days))
                .collect();
            writeln!(
                out,
                "  * {} ({}): {} men; items: {}; skills: {}.",
                unit.name,
                unit.num,
                unit.men,
                if items.is_empty() { "none".to_string() } else { items.join(", ") },
                if skills.is_empty() { "none".to_string() } else { skills.join(", ") },
            )?;
        } else {
            writeln!(out, "  - {} ({}): {} men.", unit.name, unit.num, unit.men)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Phase 29: writes the `players.out` roster of every human faction and
/// its standing.
pub fn write_roster(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    let file = File::create(ctx.dir.join("players.out"))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "StormhavenPlayerStatus")?;
    writeln!(out, "Game: {}", session.name)?;
    writeln!(out, "Turn: {}", session.turn)?;
    writeln!(out)?;
    for faction in session.factions.iter().filter(|f| !f.is_npc) {
        let status = if !faction.exists {
            "dead"
        } else if faction.quit {
            "quitting"
        } else {
            "active"
        };
        writeln!(
            out,
            "Faction: {}\nName: {}\nLastOrders: {}\nStatus: {}",
            faction.num, faction.name, faction.last_orders, status
        )?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::unit::Unit;
    use crate::rules::RuleSet;

    fn ctx<'a>(rules: &'a RuleSet, dir: &'a std::path::Path) -> TurnCtx<'a> {
        TurnCtx { rules, dir }
    }

    #[test]
    fn reports_are_written_for_every_human_faction() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::standard();
        let mut session = Session::generate("Test", 7, &rules);
        write_reports(&mut session, &ctx(&rules, dir.path())).unwrap();
        for faction in session.factions.iter().filter(|f| !f.is_npc) {
            assert!(dir.path().join(format!("report.{}", faction.num)).exists());
        }
        // NPC factions get none.
        for faction in session.factions.iter().filter(|f| f.is_npc) {
            assert!(!dir.path().join(format!("report.{}", faction.num)).exists());
        }
    }

    #[test]
    fn dead_factions_still_get_a_farewell_report() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::standard();
        let mut session = Session::dummy();
        let num = session.new_faction("Ghosts", false);
        session.faction_mut(num).unwrap().exists = false;
        write_reports(&mut session, &ctx(&rules, dir.path())).unwrap();
        let text = std::fs::read_to_string(dir.path().join(format!("report.{}", num))).unwrap();
        assert!(text.contains("Your faction is no more."));
    }

    #[test]
    fn report_shows_own_units_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::standard();
        let mut session = Session::dummy();
        let mine = session.new_faction("Mine", false);
        let theirs = session.new_faction("Theirs", false);
        let a = session.next_unit_num();
        let mut unit = Unit::new(a, mine, "Scouts");
        unit.men = 3;
        session.regions[0].units.push(unit);
        let b = session.next_unit_num();
        let mut other = Unit::new(b, theirs, "Strangers");
        other.men = 8;
        session.regions[0].units.push(other);

        write_reports(&mut session, &ctx(&rules, dir.path())).unwrap();
        let text = std::fs::read_to_string(dir.path().join(format!("report.{}", mine))).unwrap();
        assert!(text.contains("* Scouts"));
        assert!(text.contains("- Strangers"));
    }

    #[test]
    fn roster_lists_standing() {
        let dir = tempfile::tempdir().unwrap();
        let rules = RuleSet::standard();
        let mut session = Session::dummy();
        let alive = session.new_faction("Alive", false);
        let dead = session.new_faction("Dead", false);
        session.faction_mut(dead).unwrap().exists = false;
        session.faction_mut(alive).unwrap().last_orders = 4;

        write_roster(&mut session, &ctx(&rules, dir.path())).unwrap();
        let text = std::fs::read_to_string(dir.path().join("players.out")).unwrap();
        assert!(text.contains("Status: active"));
        assert!(text.contains("Status: dead"));
        assert!(text.contains("LastOrders: 4"));
    }
}
