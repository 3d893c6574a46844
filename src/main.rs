//! Stormhaven turn driver.
//!
//! One invocation performs one mode: `new` generates and persists a world,
//! `run` executes a single complete turn, `check` dry-runs an orders file
//! against a throwaway world, and `genrules` emits the rules reference.
//! Phase progress is narrated on stdout so an operator can see exactly
//! where an aborted run stopped.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::Rng;

use stormhaven::engine::TurnCtx;
use stormhaven::game::session::Session;
use stormhaven::orders::parser::{parse_orders, ParseMode};
use stormhaven::pipeline::{run_turn, TurnError};
use stormhaven::report;
use stormhaven::rules::{write_rules_reference, RuleSet};
use stormhaven::store::SessionStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Game directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Named rule configuration
    #[arg(long = "type", value_name = "RULESET", default_value = "standard")]
    game_type: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Generate a new game world in the game directory
    New {
        /// World seed; drawn at random (and printed) when omitted
        seed: Option<u64>,

        /// Name of the new game
        #[arg(long, default_value = "Stormhaven")]
        name: String,
    },
    /// Run one complete turn
    Run,
    /// Validate an orders file without touching any session
    Check {
        /// Orders file to validate
        orders: PathBuf,

        /// Where to write the validation results
        #[arg(long, default_value = "check.out")]
        out: PathBuf,
    },
    /// Write the static rules reference document
    Genrules {
        /// Output file
        #[arg(long, default_value = "rules.txt")]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = std::str::FromStr::from_str(&cli.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .target(env_logger::Target::Stdout)
        .init();

    let rules = match RuleSet::named(&cli.game_type) {
        Some(r) => r,
        None => {
            eprintln!(
                "unknown ruleset '{}'; only 'standard' is defined",
                cli.game_type
            );
            return ExitCode::from(2);
        }
    };

    let result = match cli.mode {
        Mode::New { seed, name } => new_game(&cli.dir, seed, &name, &rules),
        Mode::Run => run_one_turn(&cli.dir, &rules),
        Mode::Check { orders, out } => check_orders(&orders, &out),
        Mode::Genrules { out } => genrules(&out, &rules),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn new_game(
    dir: &PathBuf,
    seed: Option<u64>,
    name: &str,
    rules: &RuleSet,
) -> anyhow::Result<ExitCode> {
    let store = SessionStore::open(dir)?;
    let seed = match seed {
        Some(s) => s,
        None => {
            let drawn = rand::thread_rng().gen_range(0..=2_147_483_647u64);
            println!("seed: {}", drawn);
            drawn
        }
    };
    let mut session = store.create(name, seed, rules)?;
    // Initial roster, so players learn their faction numbers before turn 1.
    let ctx = TurnCtx {
        rules,
        dir: store.dir(),
    };
    report::write_roster(&mut session, &ctx)?;
    log::info!(
        "created '{}' (seed {}): {} regions, {} factions",
        session.name,
        session.seed,
        session.regions.len(),
        session.factions.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_one_turn(dir: &PathBuf, rules: &RuleSet) -> anyhow::Result<ExitCode> {
    let store = SessionStore::open(dir)?;
    match run_turn(&store, rules) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(TurnError::Finished) => {
            println!("This game is over; no further turns can be run.");
            Ok(ExitCode::from(3))
        }
        Err(e) => Err(e.into()),
    }
}

/// Parses an orders file against a throwaway world. Never reads or writes
/// any session; results go to `out`.
fn check_orders(orders: &PathBuf, out: &PathBuf) -> anyhow::Result<ExitCode> {
    let file = File::open(orders)?;
    let mut session = Session::dummy();
    let outcome = parse_orders(&mut session, 0, BufReader::new(file), ParseMode::Check)?;

    let mut writer = BufWriter::new(File::create(out)?);
    if outcome.diagnostics.is_empty() {
        writeln!(writer, "No problems found.")?;
    } else {
        for d in &outcome.diagnostics {
            writeln!(writer, "line {}: {}", d.line, d.message)?;
        }
    }
    writer.flush()?;
    log::info!(
        "checked {}: {} orders, {} problems",
        orders.display(),
        outcome.orders_attached,
        outcome.diagnostics.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn genrules(out: &PathBuf, rules: &RuleSet) -> anyhow::Result<ExitCode> {
    let mut writer = BufWriter::new(File::create(out)?);
    write_rules_reference(rules, &mut writer)?;
    writer.flush()?;
    log::info!("wrote rules reference to {}", out.display());
    Ok(ExitCode::SUCCESS)
}
