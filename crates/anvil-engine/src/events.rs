//! Goblin raids.
//!
//! Every accepted player intent ticks the raid timer. At the threshold a
//! wave of hostiles enters from the border through the ordinary action queue
//! and movement rules. The raid ends once no goblin is left, and the next
//! one needs more player actions.

use anvil_grid::direction::Direction;
use anvil_grid::grid::Grid;
use anvil_grid::object::{ObjectKind, Tag};
use anvil_journal::SimEvent;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::action::Action;
use crate::simulation::Simulation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidState {
    /// Player actions since the last raid ended.
    pub timer: u32,
    /// Timer value that starts the next raid.
    pub threshold: u32,
    pub active: bool,
}

impl RaidState {
    pub fn new(threshold: u32) -> Self {
        Self {
            timer: 0,
            threshold,
            active: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Border helpers
// ---------------------------------------------------------------------------

/// Empty cells on the outer ring, in cell index order.
pub(crate) fn empty_border_cells(grid: &Grid) -> Vec<(i32, i32)> {
    let (columns, rows) = (grid.columns(), grid.rows());
    grid.cells()
        .filter(|c| c.is_empty())
        .map(|c| (c.x(), c.y()))
        .filter(|&(x, y)| x == 0 || y == 0 || x == columns - 1 || y == rows - 1)
        .collect()
}

/// Direction pointing away from the border a cell sits on. Left and right
/// edges win over top and bottom at the corners, so the top-right corner
/// sends its spawn West rather than South.
pub(crate) fn inward(grid: &Grid, x: i32, y: i32) -> Direction {
    if x == 0 {
        Direction::East
    } else if x == grid.columns() - 1 {
        Direction::West
    } else if y == 0 {
        Direction::South
    } else {
        Direction::North
    }
}

// ---------------------------------------------------------------------------
// Raid lifecycle
// ---------------------------------------------------------------------------

/// Count one player action and start a raid when the threshold is reached.
pub(crate) fn note_player_action(sim: &mut Simulation) {
    sim.raid.timer = sim.raid.timer.saturating_add(1);
    if !sim.raid.active && sim.raid.timer >= sim.raid.threshold {
        start_raid(sim);
    }
}

fn start_raid(sim: &mut Simulation) {
    let mut cells = empty_border_cells(&sim.grid);
    cells.shuffle(&mut sim.rng);
    cells.truncate(sim.config.raid_size as usize);

    let mut hostiles = 0;
    for (x, y) in cells {
        let kind = match sim.rng.gen_range(0..4) {
            0 => ObjectKind::Goblin,
            1 => ObjectKind::GoblinBrute,
            2 => ObjectKind::GoblinLooter,
            _ => ObjectKind::goblin_shaman(),
        };
        match sim.add_object(kind, x, y) {
            Ok(id) => {
                let direction = inward(&sim.grid, x, y);
                sim.add_action(Action::slide(id, direction));
                hostiles += 1;
            }
            Err(err) => warn!(%err, "raid spawn failed"),
        }
    }

    sim.raid.active = true;
    info!(hostiles, timer = sim.raid.timer, "goblin raid started");
    sim.journal.record(SimEvent::RaidStarted { hostiles });
}

/// End a running raid once no goblin remains on the grid.
pub(crate) fn check_raid_end(sim: &mut Simulation) {
    if !sim.raid.active || sim.grid.any_tagged(Tag::Goblin) {
        return;
    }
    let growth = sim.config.raid_threshold_growth;
    let raid = &mut sim.raid;
    raid.active = false;
    raid.timer = 0;
    raid.threshold = raid.threshold.saturating_add(growth);
    info!(next_threshold = raid.threshold, "goblin raid ended");
    sim.journal.record(SimEvent::RaidEnded);
}
