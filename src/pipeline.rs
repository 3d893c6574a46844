//! The turn pipeline: load, ingest, run the phase sequence, save.
//!
//! The sequence lives in [`TURN_PHASES`], an ordered table of named phase
//! functions. The order is load-bearing; several phases only make sense
//! given what ran before them (sells stock markets for buys, movement
//! precedes the second cleanup, reports see final state). The driver
//! narrates each phase at `info` level and aborts on the first phase
//! error without saving, leaving the previous turn's state on disk.

use std::fs::File;
use std::io::{BufReader, ErrorKind};

use thiserror::Error;

use crate::engine::{self, PhaseError, PhaseFn, TurnCtx};
use crate::game::session::{GameStatus, Session};
use crate::orders::parser::{self, ParseMode};
use crate::report;
use crate::rules::RuleSet;
use crate::store::{SessionStore, StoreError};

/// Why a turn did not complete.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("cannot load session: {0}")]
    Load(#[from] StoreError),

    #[error("the game is over; no further turns can be run")]
    Finished,

    #[error("phase '{name}' failed: {source}")]
    Phase {
        name: &'static str,
        source: PhaseError,
    },

    #[error("cannot save session: {0}")]
    Save(StoreError),
}

/// One entry in the phase table.
pub struct PhaseDesc {
    pub name: &'static str,
    pub run: PhaseFn,
}

const fn phase(name: &'static str, run: PhaseFn) -> PhaseDesc {
    PhaseDesc { name, run }
}

/// The full turn sequence. Reordering entries changes game semantics.
pub const TURN_PHASES: &[PhaseDesc] = &[
    phase("default work orders", engine::census::default_work_orders),
    phase("remove inactive factions", engine::census::remove_inactive_factions),
    phase("find orders", engine::structures::run_find_orders),
    phase("enter orders", engine::structures::run_enter_orders),
    phase("promote orders", engine::structures::run_promote_orders),
    phase("combat", run_combat),
    phase("steal orders", engine::combat::run_steal_orders),
    phase("give orders", engine::economy::run_give_orders),
    phase("exchange orders", engine::economy::run_exchange_orders),
    phase("destroy orders", engine::structures::run_destroy_orders),
    phase("pillage orders", engine::economy::run_pillage_orders),
    phase("tax orders", engine::economy::run_tax_orders),
    phase("guard orders", engine::economy::run_guard_orders),
    phase("cast orders", engine::skills::run_cast_orders),
    phase("market orders", run_market),
    phase("forget orders", engine::skills::run_forget_orders),
    phase("mid-turn settlement", engine::census::mid_process_turn),
    phase("quit orders", engine::economy::run_quit_orders),
    phase("unit cleanup", engine::census::unit_cleanup),
    phase("withdraw orders", engine::economy::run_withdraw_orders),
    phase("movement", run_movement),
    phase("unit cleanup after movement", engine::census::unit_cleanup),
    phase("find dead factions", engine::census::find_dead_factions),
    phase("teach orders", engine::skills::run_teach_orders),
    phase("month orders", run_month),
    phase("maintenance", engine::census::assess_maintenance),
    phase("post-turn settlement", engine::census::post_process_turn),
    phase("write reports", report::write_reports),
    phase("write player roster", report::write_roster),
    phase("purge dead factions", engine::census::purge_dead_factions),
];

/// Explicit attacks resolve before hostiles pick their own fights.
fn run_combat(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    engine::combat::run_attack_orders(session, ctx)?;
    engine::combat::run_auto_attacks(session, ctx)
}

/// Sells stock the market before buys consume it.
fn run_market(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    engine::economy::run_sell_orders(session, ctx)?;
    engine::economy::run_buy_orders(session, ctx)
}

/// Ships reposition before overland movement.
fn run_movement(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    engine::movement::run_sail_orders(session, ctx)?;
    engine::movement::run_move_orders(session, ctx)
}

/// Month-long orders resolve, then pending teleports win the month.
fn run_month(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    engine::skills::run_month_orders(session, ctx)?;
    engine::movement::run_teleport_orders(session, ctx)
}

/// Runs one complete turn against the session in `store`.
///
/// Loads the session, ingests every human faction's orders file, runs the
/// thirty phases in order, and saves exactly once at the end. A finished
/// game short-circuits before ingestion; a phase failure aborts without
/// saving.
pub fn run_turn(store: &SessionStore, rules: &RuleSet) -> Result<Session, TurnError> {
    let mut session = store.load()?;
    if session.is_finished() {
        return Err(TurnError::Finished);
    }

    session.advance_month();
    session.status = GameStatus::Running;
    for faction in &mut session.factions {
        faction.clear_diagnostics();
    }
    log::info!(
        "running turn {} ({}, year {}) of {}",
        session.turn,
        session.month_name(),
        session.year + 1,
        session.name
    );

    ingest_orders(store, &mut session);

    let ctx = TurnCtx {
        rules,
        dir: store.dir(),
    };
    for desc in TURN_PHASES {
        log::info!("{}...", desc.name);
        (desc.run)(&mut session, &ctx).map_err(|source| TurnError::Phase {
            name: desc.name,
            source,
        })?;
    }

    store.save(&session).map_err(TurnError::Save)?;
    log::info!("turn {} complete", session.turn);
    Ok(session)
}

/// Reads `orders.<num>` for every living human faction. NPC factions are
/// never read. A missing file just means the faction sat the month out;
/// any parse problem is recorded on the faction and the turn proceeds.
fn ingest_orders(store: &SessionStore, session: &mut Session) {
    let numbers: Vec<u32> = session.human_factions().map(|f| f.num).collect();
    for num in numbers {
        let file = match File::open(store.orders_path(num)) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                if let Some(f) = session.faction_mut(num) {
                    f.error(format!("orders could not be read: {}", e));
                }
                continue;
            }
        };
        match parser::parse_orders(session, num, BufReader::new(file), ParseMode::Run) {
            Ok(outcome) => {
                let turn = session.turn;
                if let Some(f) = session.faction_mut(num) {
                    f.last_orders = turn;
                    for d in outcome.diagnostics {
                        f.error(format!("orders line {}: {}", d.line, d.message));
                    }
                }
            }
            Err(e) => {
                if let Some(f) = session.faction_mut(num) {
                    f.error(format!("orders rejected: {}", e));
                }
            }
        }
    }
}
