//! The phase engine: one function per simulation phase.
//!
//! Every phase has the same shape: `fn(&mut Session, &TurnCtx) ->
//! Result<(), PhaseError>`. The session handle is threaded explicitly
//! through every call; there is no ambient world state. Phases are
//! individually atomic and must be invoked in the order fixed by
//! [`crate::pipeline::TURN_PHASES`]; they do not compose in any other
//! order.

pub mod census;
pub mod combat;
pub mod economy;
pub mod movement;
pub mod skills;
pub mod structures;

use std::path::Path;

use thiserror::Error;

use crate::game::session::Session;
use crate::game::unit::Unit;
use crate::orders::Order;
use crate::rules::RuleSet;

/// Read-only context shared by every phase of one turn.
pub struct TurnCtx<'a> {
    pub rules: &'a RuleSet,
    /// Game directory, for the report-writing phases.
    pub dir: &'a Path,
}

/// An unrecoverable condition inside a phase. Fatal to the turn: the
/// pipeline aborts without saving.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Signature every phase function shares.
pub type PhaseFn = fn(&mut Session, &TurnCtx) -> Result<(), PhaseError>;

/// Pulls the orders matching `pred` off a unit, preserving the order of
/// the rest. Each phase consumes exactly its own order kinds.
pub(crate) fn drain_orders<F>(unit: &mut Unit, mut pred: F) -> Vec<Order>
where
    F: FnMut(&Order) -> bool,
{
    let mut taken = Vec::new();
    let mut kept = Vec::new();
    for order in unit.orders.drain(..) {
        if pred(&order) {
            taken.push(order);
        } else {
            kept.push(order);
        }
    }
    unit.orders = kept;
    taken
}

/// Appends an event line to a faction's report, if the faction exists.
pub(crate) fn faction_event(session: &mut Session, faction: u32, message: String) {
    if let Some(f) = session.faction_mut(faction) {
        f.event(message);
    }
}

/// Appends an error line to a faction's report, if the faction exists.
pub(crate) fn faction_error(session: &mut Session, faction: u32, message: String) {
    if let Some(f) = session.faction_mut(faction) {
        f.error(message);
    }
}
