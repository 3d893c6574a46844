//! The session: the complete mutable world for one game instance.
//!
//! A [`Session`] is the single shared resource every phase mutates. The
//! orchestrator holds exactly one handle to it for the duration of a turn
//! and persists it exactly once, at the very end of a successful run.
//! Factions and regions are ordered `Vec`s with stable ascending numbers;
//! all iteration is in that order, which is what makes turn resolution
//! deterministic.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::faction::Faction;
use crate::game::item::{Item, Skill};
use crate::game::region::{Direction, Region, Terrain};
use crate::game::unit::Unit;
use crate::rules::RuleSet;

/// Width of a generated world grid.
const WORLD_WIDTH: u32 = 6;
/// Height of a generated world grid.
const WORLD_HEIGHT: u32 = 6;

/// Month names for report headers.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const REGION_NAMES: [&str; 12] = [
    "Asteria", "Brandel", "Caldera", "Dunmore", "Eastmarch", "Fenwick", "Gault", "Hareth",
    "Istria", "Jarrow", "Kelder", "Lorne",
];

/// Terminal state of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    New,
    Running,
    Finished,
}

/// The complete persisted world state for one game instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    /// Turns run so far; incremented once during turn pre-processing.
    pub turn: u32,
    /// Current month, 0 = January.
    pub month: u32,
    pub year: u32,
    pub status: GameStatus,
    /// World-generation seed, kept for operator reference.
    pub seed: u64,
    pub faction_seq: u32,
    pub unit_seq: u32,
    pub structure_seq: u32,
    pub factions: Vec<Faction>,
    pub regions: Vec<Region>,
}

impl Session {
    /// Generates a fresh world from a seed. The same seed always produces
    /// an identical session.
    pub fn generate(name: impl Into<String>, seed: u64, rules: &RuleSet) -> Session {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut session = Session {
            name: name.into(),
            turn: 0,
            month: 11,
            year: 0,
            status: GameStatus::New,
            seed,
            faction_seq: 0,
            unit_seq: 0,
            structure_seq: 0,
            factions: Vec::new(),
            regions: Vec::new(),
        };

        session.generate_regions(&mut rng);
        session.create_npc_factions(&mut rng);
        session.create_starting_factions(&mut rng, rules);
        session
    }

    /// A throwaway in-memory world for dry-run order checking. Never
    /// persisted.
    pub fn dummy() -> Session {
        Session {
            name: "dummy".into(),
            turn: 0,
            month: 11,
            year: 0,
            status: GameStatus::New,
            seed: 0,
            faction_seq: 0,
            unit_seq: 0,
            structure_seq: 0,
            factions: Vec::new(),
            regions: vec![Region::new(1, "Nowhere", Terrain::Plain)],
        }
    }

    fn generate_regions(&mut self, rng: &mut SmallRng) {
        let (w, h) = (WORLD_WIDTH, WORLD_HEIGHT);
        for y in 0..h {
            for x in 0..w {
                let id = y * w + x + 1;
                let border = x == 0 || y == 0 || x == w - 1 || y == h - 1;
                let terrain = if border {
                    Terrain::Ocean
                } else {
                    match rng.gen_range(0..4) {
                        0 => Terrain::Forest,
                        1 => Terrain::Mountain,
                        2 => Terrain::Swamp,
                        _ => Terrain::Plain,
                    }
                };
                let name = if terrain == Terrain::Ocean {
                    format!("Ocean ({},{})", x, y)
                } else {
                    REGION_NAMES[(id as usize) % REGION_NAMES.len()].to_string()
                };
                let mut region = Region::new(id, name, terrain);
                if !region.is_ocean() {
                    region.wealth = rng.gen_range(200..=1000);
                    region.wages = rng.gen_range(10..=15);
                    region.stock_market(Item::Grain, rng.gen_range(10..=40));
                    region.stock_market(Item::Horse, rng.gen_range(0..=5));
                }
                if y > 0 {
                    region.exits[Direction::North.index()] = Some(id - w);
                }
                if x < w - 1 {
                    region.exits[Direction::East.index()] = Some(id + 1);
                }
                if y < h - 1 {
                    region.exits[Direction::South.index()] = Some(id + w);
                }
                if x > 0 {
                    region.exits[Direction::West.index()] = Some(id - 1);
                }
                self.regions.push(region);
            }
        }
    }

    /// Seeds the guard and monster factions. Guards hold plains; monsters
    /// lurk in swamps and mountains with the hostile flag set, which is
    /// what drives per-region auto-attacks.
    fn create_npc_factions(&mut self, rng: &mut SmallRng) {
        let guards = self.new_faction("The City Guard", true);
        let monsters = self.new_faction("Wandering Beasts", true);

        for idx in 0..self.regions.len() {
            let terrain = self.regions[idx].terrain;
            match terrain {
                Terrain::Plain => {
                    let num = self.next_unit_num();
                    let mut unit = Unit::new(num, guards, "City Guard");
                    unit.men = rng.gen_range(20..=40);
                    unit.guard = true;
                    unit.add_skill_days(Skill::Combat, 90);
                    let region = &mut self.regions[idx];
                    region.guard_faction = Some(guards);
                    region.units.push(unit);
                }
                Terrain::Swamp | Terrain::Mountain => {
                    if rng.gen_range(0..3) == 0 {
                        let num = self.next_unit_num();
                        let mut unit = Unit::new(num, monsters, "Prowling Beast");
                        unit.men = rng.gen_range(3..=10);
                        unit.hostile = true;
                        self.regions[idx].units.push(unit);
                    }
                }
                _ => {}
            }
        }
    }

    fn create_starting_factions(&mut self, rng: &mut SmallRng, rules: &RuleSet) {
        let starts: Vec<usize> = self
            .regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.terrain == Terrain::Plain)
            .map(|(i, _)| i)
            .collect();

        for n in 0..rules.start_factions {
            let faction = self.new_faction(format!("Faction {}", n + 1), false);
            let num = self.next_unit_num();
            let mut unit = Unit::new(num, faction, "Founders");
            unit.men = 10;
            unit.add_item(Item::Silver, rules.start_silver);
            let idx = if starts.is_empty() {
                // Degenerate all-ocean world; drop them anywhere inland-ish.
                rng.gen_range(0..self.regions.len())
            } else {
                starts[(n as usize) % starts.len()]
            };
            self.regions[idx].units.push(unit);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    /// Advances the calendar at the start of a turn.
    pub fn advance_month(&mut self) {
        self.turn += 1;
        self.month = (self.month + 1) % 12;
        if self.month == 0 {
            self.year += 1;
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize) % 12]
    }

    pub fn new_faction(&mut self, name: impl Into<String>, is_npc: bool) -> u32 {
        self.faction_seq += 1;
        let num = self.faction_seq;
        self.factions.push(Faction::new(num, name, is_npc));
        num
    }

    pub fn next_unit_num(&mut self) -> u32 {
        self.unit_seq += 1;
        self.unit_seq
    }

    pub fn next_structure_id(&mut self) -> u32 {
        self.structure_seq += 1;
        // Structure ids share no namespace with units; offset for legibility.
        self.structure_seq + 100
    }

    pub fn faction(&self, num: u32) -> Option<&Faction> {
        self.factions.iter().find(|f| f.num == num)
    }

    pub fn faction_mut(&mut self, num: u32) -> Option<&mut Faction> {
        self.factions.iter_mut().find(|f| f.num == num)
    }

    pub fn region(&self, id: u32) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn region_mut(&mut self, id: u32) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == id)
    }

    /// Index of the region containing a unit, if the unit is alive.
    pub fn unit_region(&self, unit: u32) -> Option<usize> {
        self.regions
            .iter()
            .position(|r| r.units.iter().any(|u| u.num == unit))
    }

    pub fn unit(&self, num: u32) -> Option<&Unit> {
        self.regions.iter().find_map(|r| r.unit(num))
    }

    /// Living human factions, in faction-number order.
    pub fn human_factions(&self) -> impl Iterator<Item = &Faction> {
        self.factions.iter().filter(|f| !f.is_npc && f.exists)
    }
}
