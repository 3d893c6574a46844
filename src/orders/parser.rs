//! Orders-file parsing.
//!
//! Order files are line oriented:
//!
//! ```text
//! #orders 3            ; header naming the issuing faction
//! unit 17              ; select a unit; orders follow
//! tax
//! move north north
//! form Scouts          ; instant: creates a unit, selects it until `end`
//! buy 5 horse
//! end
//! #end
//! ```
//!
//! Two things are deliberately *not* deferred to the phase pipeline:
//! `form` creates its unit right here during parsing (later phases depend
//! on the unit already existing), and `guard 0` clears the guard flag
//! immediately. Everything else becomes an [`Order`] or [`MonthOrder`] on
//! the selected unit.
//!
//! Parse problems never abort a turn. Each bad line produces a
//! [`Diagnostic`]; the caller attaches them to the faction, which simply
//! proceeds with whatever orders did parse.

use std::io::BufRead;

use thiserror::Error;

use crate::game::item::{Item, Skill};
use crate::game::region::Direction;
use crate::game::session::Session;
use crate::game::unit::Unit;
use crate::orders::{MonthOrder, Order, Spell};

/// File-level failures. Per-line problems are [`Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum OrdersError {
    #[error("error reading orders: {0}")]
    Io(#[from] std::io::Error),

    #[error("orders file has no '#orders <faction>' header")]
    MissingHeader,

    #[error("orders addressed to faction {found}, expected faction {expected}")]
    WrongFaction { expected: u32, found: u32 },
}

/// How strictly to bind orders to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Resolve unit selectors against the session and attach orders.
    Run,
    /// Syntax/semantics check only: selectors are taken on faith and
    /// nothing is attached or mutated.
    Check,
}

/// A per-line parse problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    fn new(line: usize, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            line,
            message: message.into(),
        }
    }
}

/// What a parse pass did.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub orders_attached: usize,
    pub units_formed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Internal parser state: which unit subsequent orders apply to.
struct Selection {
    /// Index into `session.regions` of the selected unit's region.
    region: usize,
    unit: u32,
    /// True while inside a `form`..`end` block.
    formed: bool,
}

/// Parses one faction's orders and attaches them to its units.
///
/// In [`ParseMode::Run`] the header faction must match `faction`, selected
/// units must exist and belong to it, and `form` mutates the session. In
/// [`ParseMode::Check`] only syntax is validated.
pub fn parse_orders<R: BufRead>(
    session: &mut Session,
    faction: u32,
    input: R,
    mode: ParseMode,
) -> Result<ParseOutcome, OrdersError> {
    let mut outcome = ParseOutcome::default();
    let mut selection: Option<Selection> = None;
    let mut saw_header = false;
    let mut saw_unit_line = false;

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let text = match line.split(';').next() {
            Some(t) => t.trim(),
            None => "",
        };
        if text.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let verb = tokens[0].to_ascii_lowercase();

        if !saw_header {
            if verb == "#orders" {
                let found = tokens
                    .get(1)
                    .and_then(|t| t.parse::<u32>().ok())
                    .ok_or(OrdersError::MissingHeader)?;
                if mode == ParseMode::Run && found != faction {
                    return Err(OrdersError::WrongFaction {
                        expected: faction,
                        found,
                    });
                }
                saw_header = true;
                continue;
            }
            return Err(OrdersError::MissingHeader);
        }

        match verb.as_str() {
            "#end" => break,
            "unit" => {
                saw_unit_line = true;
                selection =
                    select_unit(session, faction, &tokens, lineno, mode, &mut outcome.diagnostics);
            }
            "form" => {
                selection = form_unit(
                    session,
                    faction,
                    &tokens,
                    lineno,
                    mode,
                    selection,
                    &mut outcome,
                );
            }
            "end" => match selection {
                Some(ref sel) if sel.formed => selection = None,
                _ => outcome
                    .diagnostics
                    .push(Diagnostic::new(lineno, "end outside a form block")),
            },
            _ => {
                if selection.is_none() && mode == ParseMode::Run {
                    // After a failed unit selection the bad line is already
                    // diagnosed; skip its orders quietly.
                    if !saw_unit_line {
                        outcome
                            .diagnostics
                            .push(Diagnostic::new(lineno, "order given before any unit line"));
                    }
                    continue;
                }
                parse_order_line(session, &tokens, lineno, mode, &selection, &mut outcome);
            }
        }
    }

    if !saw_header {
        return Err(OrdersError::MissingHeader);
    }
    Ok(outcome)
}

fn select_unit(
    session: &Session,
    faction: u32,
    tokens: &[&str],
    lineno: usize,
    mode: ParseMode,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Selection> {
    let num = match tokens.get(1).and_then(|t| t.parse::<u32>().ok()) {
        Some(n) => n,
        None => {
            diagnostics.push(Diagnostic::new(lineno, "unit: expected a unit number"));
            return None;
        }
    };
    if mode == ParseMode::Check {
        return Some(Selection {
            region: 0,
            unit: num,
            formed: false,
        });
    }
    match session.unit_region(num) {
        Some(region) => {
            let unit = session.regions[region].unit(num);
            if unit.map(|u| u.faction) == Some(faction) {
                Some(Selection {
                    region,
                    unit: num,
                    formed: false,
                })
            } else {
                diagnostics.push(Diagnostic::new(
                    lineno,
                    format!("unit {} does not belong to faction {}", num, faction),
                ));
                None
            }
        }
        None => {
            diagnostics.push(Diagnostic::new(lineno, format!("no such unit {}", num)));
            None
        }
    }
}

/// Instant order: creates the new unit during parsing and selects it.
fn form_unit(
    session: &mut Session,
    faction: u32,
    tokens: &[&str],
    lineno: usize,
    mode: ParseMode,
    selection: Option<Selection>,
    outcome: &mut ParseOutcome,
) -> Option<Selection> {
    let parent = match selection {
        Some(sel) => sel,
        None => {
            outcome
                .diagnostics
                .push(Diagnostic::new(lineno, "form: no unit selected"));
            return None;
        }
    };
    if parent.formed {
        outcome
            .diagnostics
            .push(Diagnostic::new(lineno, "form blocks cannot nest"));
        return Some(parent);
    }
    if mode == ParseMode::Check {
        outcome.units_formed += 1;
        return Some(Selection {
            formed: true,
            ..parent
        });
    }

    let name = if tokens.len() > 1 {
        tokens[1..].join(" ")
    } else {
        "New Unit".to_string()
    };
    let num = session.next_unit_num();
    let parent_structure = session.regions[parent.region]
        .unit(parent.unit)
        .and_then(|u| u.structure);
    let mut unit = Unit::new(num, faction, name);
    unit.structure = parent_structure;
    session.regions[parent.region].units.push(unit);
    if let Some(f) = session.faction_mut(faction) {
        f.event(format!("Forms new unit {}.", num));
    }
    outcome.units_formed += 1;
    Some(Selection {
        region: parent.region,
        unit: num,
        formed: true,
    })
}

fn parse_order_line(
    session: &mut Session,
    tokens: &[&str],
    lineno: usize,
    mode: ParseMode,
    selection: &Option<Selection>,
    outcome: &mut ParseOutcome,
) {
    let verb = tokens[0].to_ascii_lowercase();
    let parsed = match verb.as_str() {
        "find" => arg_u32(tokens, 1).map(|faction| Parsed::Order(Order::Find { faction })),
        "enter" => arg_u32(tokens, 1).map(|structure| Parsed::Order(Order::Enter { structure })),
        "leave" => Some(Parsed::Order(Order::Leave)),
        "promote" => arg_u32(tokens, 1).map(|target| Parsed::Order(Order::Promote { target })),
        "evict" => arg_u32(tokens, 1).map(|target| Parsed::Order(Order::Evict { target })),
        "attack" => arg_u32(tokens, 1).map(|target| Parsed::Order(Order::Attack { target })),
        "steal" => match (arg_u32(tokens, 1), arg_item(tokens, 2)) {
            (Some(target), Some(item)) => Some(Parsed::Order(Order::Steal { target, item })),
            _ => None,
        },
        "assassinate" => {
            arg_u32(tokens, 1).map(|target| Parsed::Order(Order::Assassinate { target }))
        }
        "give" | "pay" | "transfer" => match (arg_u32(tokens, 1), arg_i64(tokens, 2), arg_item(tokens, 3)) {
            (Some(target), Some(amount), Some(item)) => Some(Parsed::Order(Order::Give {
                target,
                amount,
                item,
            })),
            _ => None,
        },
        "exchange" => match (
            arg_u32(tokens, 1),
            arg_i64(tokens, 2),
            arg_item(tokens, 3),
            arg_i64(tokens, 4),
            arg_item(tokens, 5),
        ) {
            (Some(target), Some(give_amount), Some(give_item), Some(want_amount), Some(want_item)) => {
                Some(Parsed::Order(Order::Exchange {
                    target,
                    give_amount,
                    give_item,
                    want_amount,
                    want_item,
                }))
            }
            _ => None,
        },
        "destroy" => Some(Parsed::Order(Order::Destroy)),
        "pillage" => Some(Parsed::Order(Order::Pillage)),
        "tax" => Some(Parsed::Order(Order::Tax)),
        "guard" => match arg_i64(tokens, 1) {
            Some(1) => Some(Parsed::Order(Order::Guard)),
            Some(0) => Some(Parsed::GuardOff),
            _ => None,
        },
        "cast" => parse_cast(tokens),
        "sell" => match (arg_i64(tokens, 1), arg_item(tokens, 2)) {
            (Some(amount), Some(item)) => Some(Parsed::Order(Order::Sell { amount, item })),
            _ => None,
        },
        "buy" => match (arg_i64(tokens, 1), arg_item(tokens, 2)) {
            (Some(amount), Some(item)) => Some(Parsed::Order(Order::Buy { amount, item })),
            _ => None,
        },
        "forget" => arg_skill(tokens, 1).map(|skill| Parsed::Order(Order::Forget { skill })),
        "quit" => Some(Parsed::Order(Order::Quit)),
        "withdraw" => match (arg_i64(tokens, 1), arg_item(tokens, 2)) {
            (Some(amount), Some(item)) => Some(Parsed::Order(Order::Withdraw { amount, item })),
            _ => None,
        },
        "teach" => {
            let students: Vec<u32> = tokens[1..]
                .iter()
                .filter_map(|t| t.parse::<u32>().ok())
                .collect();
            if students.is_empty() || students.len() != tokens.len() - 1 {
                None
            } else {
                Some(Parsed::Order(Order::Teach { students }))
            }
        }
        "work" => Some(Parsed::Month(MonthOrder::Work)),
        "study" => arg_skill(tokens, 1).map(|skill| Parsed::Month(MonthOrder::Study { skill })),
        "produce" => arg_item(tokens, 1).map(|item| Parsed::Month(MonthOrder::Produce { item })),
        "move" => parse_dirs(tokens).map(|dirs| Parsed::Month(MonthOrder::Move { dirs })),
        "sail" => parse_dirs(tokens).map(|dirs| Parsed::Month(MonthOrder::Sail { dirs })),
        "avoid" => match arg_i64(tokens, 1) {
            Some(0) => Some(Parsed::Avoid(false)),
            Some(1) => Some(Parsed::Avoid(true)),
            _ => None,
        },
        _ => {
            outcome
                .diagnostics
                .push(Diagnostic::new(lineno, format!("unknown order '{}'", verb)));
            return;
        }
    };

    let parsed = match parsed {
        Some(p) => p,
        None => {
            outcome.diagnostics.push(Diagnostic::new(
                lineno,
                format!("bad arguments to '{}'", verb),
            ));
            return;
        }
    };

    if mode == ParseMode::Check {
        outcome.orders_attached += 1;
        return;
    }
    let sel = match selection {
        Some(s) => s,
        None => return, // already diagnosed at the unit line
    };
    let unit = match session.regions[sel.region].unit_mut(sel.unit) {
        Some(u) => u,
        None => return,
    };
    match parsed {
        Parsed::Order(order) => {
            unit.orders.push(order);
            outcome.orders_attached += 1;
        }
        Parsed::Month(order) => {
            if unit.month_order.is_some() {
                outcome.diagnostics.push(Diagnostic::new(
                    lineno,
                    "replacing an earlier month-long order",
                ));
            }
            unit.month_order = Some(order);
            outcome.orders_attached += 1;
        }
        // Instant: takes effect during parsing, not in a phase.
        Parsed::GuardOff => {
            unit.guard = false;
            outcome.orders_attached += 1;
        }
        Parsed::Avoid(on) => {
            unit.avoid = on;
            outcome.orders_attached += 1;
        }
    }
}

enum Parsed {
    Order(Order),
    Month(MonthOrder),
    GuardOff,
    Avoid(bool),
}

fn parse_cast(tokens: &[&str]) -> Option<Parsed> {
    let spell = tokens.get(1)?.to_ascii_lowercase();
    let region = arg_u32(tokens, 2)?;
    match spell.as_str() {
        "teleport" => Some(Parsed::Order(Order::Cast {
            spell: Spell::Teleport { region },
        })),
        "farsight" => Some(Parsed::Order(Order::Cast {
            spell: Spell::Farsight { region },
        })),
        _ => None,
    }
}

fn parse_dirs(tokens: &[&str]) -> Option<Vec<Direction>> {
    if tokens.len() < 2 {
        return None;
    }
    tokens[1..]
        .iter()
        .map(|t| Direction::from_keyword(t))
        .collect()
}

fn arg_u32(tokens: &[&str], idx: usize) -> Option<u32> {
    tokens.get(idx)?.parse().ok()
}

fn arg_i64(tokens: &[&str], idx: usize) -> Option<i64> {
    tokens.get(idx)?.parse().ok()
}

fn arg_item(tokens: &[&str], idx: usize) -> Option<Item> {
    Item::from_keyword(tokens.get(idx)?)
}

fn arg_skill(tokens: &[&str], idx: usize) -> Option<Skill> {
    Skill::from_keyword(tokens.get(idx)?)
}
