//! Actions: units of simulated work with explicit suspension points.
//!
//! Each [`Action`] is a small state machine. The queue calls
//! [`Action::step`] until it answers something other than [`Step::Next`]:
//!
//! - [`Step::Wait`] suspends it until that many simulated milliseconds pass
//!   (a slide travelling, a heal effect playing).
//! - [`Step::Hold`] parks it until the next frame.
//! - [`Step::Done`] retires it; the simulation then runs a crafting sweep.
//!
//! Actions hold [`ObjectId`]s, never references. When the object they were
//! issued for has left the grid in the meantime, the action completes as a
//! no-op.
//!
//! Actions queued while the queue is advancing start on the next frame.

use std::mem;

use anvil_grid::direction::Direction;
use anvil_grid::entity::ObjectId;
use anvil_grid::interaction::{first_acceptor, first_consumable};
use anvil_grid::material::catalog::ORE;
use anvil_grid::material::MaterialQuery;
use anvil_grid::movement::compute_slide_path;
use anvil_grid::object::{Blueprint, ObjectKind, Tag};
use anvil_journal::{EffectKind, SimEvent};
use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::behaviour;
use crate::events;
use crate::simulation::Simulation;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// What an action wants after one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Run the next phase right away.
    Next,
    /// Suspend for the given number of simulated milliseconds.
    Wait(f64),
    /// Yield until the next frame.
    Hold,
    Done,
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlidePhase {
    Start,
    /// Travel is over; interactions at the destination are due. Accept and
    /// consume only run when the object actually changed cell.
    Arrive { moved: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatePhase {
    Start,
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealPhase {
    Start,
    Apply,
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Slide {
        object: ObjectId,
        direction: Direction,
        phase: SlidePhase,
    },
    Rotate {
        object: ObjectId,
        phase: RotatePhase,
    },
    Damage {
        dealer: ObjectId,
        target: ObjectId,
        amount: u32,
    },
    ChangeHp {
        target: ObjectId,
        amount: i32,
    },
    Death {
        target: ObjectId,
    },
    Heal {
        target: ObjectId,
        amount: u32,
        phase: HealPhase,
    },
    /// The repeating ore spawner. Never completes.
    SpawnOre {
        elapsed_ms: f64,
    },
}

impl Action {
    pub fn slide(object: ObjectId, direction: Direction) -> Self {
        Action::Slide {
            object,
            direction,
            phase: SlidePhase::Start,
        }
    }

    pub fn rotate(object: ObjectId) -> Self {
        Action::Rotate {
            object,
            phase: RotatePhase::Start,
        }
    }

    pub fn damage(dealer: ObjectId, target: ObjectId, amount: u32) -> Self {
        Action::Damage {
            dealer,
            target,
            amount,
        }
    }

    pub fn change_hp(target: ObjectId, amount: i32) -> Self {
        Action::ChangeHp { target, amount }
    }

    pub fn death(target: ObjectId) -> Self {
        Action::Death { target }
    }

    pub fn heal(target: ObjectId, amount: u32) -> Self {
        Action::Heal {
            target,
            amount,
            phase: HealPhase::Start,
        }
    }

    pub fn spawn_ore() -> Self {
        Action::SpawnOre { elapsed_ms: 0.0 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Slide { .. } => "Slide",
            Action::Rotate { .. } => "Rotate",
            Action::Damage { .. } => "Damage",
            Action::ChangeHp { .. } => "ChangeHp",
            Action::Death { .. } => "Death",
            Action::Heal { .. } => "Heal",
            Action::SpawnOre { .. } => "SpawnOre",
        }
    }

    /// Per-frame hook for self-timed actions. Runs before stepping.
    pub fn update(&mut self, sim: &mut Simulation, dt_ms: f64) {
        if let Action::SpawnOre { elapsed_ms } = self {
            *elapsed_ms += dt_ms;
            let interval = sim.config().spawn_interval_ms;
            while *elapsed_ms >= interval {
                *elapsed_ms -= interval;
                spawn_from_border(sim);
            }
        }
    }

    /// Run the current phase.
    pub fn step(&mut self, sim: &mut Simulation) -> Step {
        match self {
            Action::Slide {
                object,
                direction,
                phase,
            } => match phase {
                SlidePhase::Start => {
                    let Some((wait, moved)) = start_slide(sim, *object, *direction) else {
                        return Step::Done;
                    };
                    *phase = SlidePhase::Arrive { moved };
                    Step::Wait(wait)
                }
                SlidePhase::Arrive { moved } => {
                    arrive(sim, *object, *direction, *moved);
                    Step::Done
                }
            },
            Action::Rotate { object, phase } => match phase {
                RotatePhase::Start => {
                    let Some(rotation) = sim.grid.rotate_object(*object) else {
                        trace!(object = %*object, "rotate of removed object");
                        return Step::Done;
                    };
                    sim.journal.record(SimEvent::Rotated {
                        object: *object,
                        rotation,
                    });
                    *phase = RotatePhase::Settle;
                    Step::Wait(sim.config().rotate_duration_ms)
                }
                RotatePhase::Settle => Step::Done,
            },
            Action::Damage {
                dealer,
                target,
                amount,
            } => {
                damage(sim, *dealer, *target, *amount);
                Step::Done
            }
            Action::ChangeHp { target, amount } => {
                change_hp(sim, *target, *amount);
                Step::Done
            }
            Action::Death { target } => {
                if let Some(object) = sim.grid.remove_object(*target) {
                    debug!(target = %*target, name = object.name(), "died");
                    let (x, y) = object.position();
                    sim.journal.record(SimEvent::Removed {
                        object: *target,
                        x,
                        y,
                    });
                    sim.effect(EffectKind::Blood, x, y);
                }
                Step::Done
            }
            Action::Heal {
                target,
                amount,
                phase,
            } => match phase {
                HealPhase::Start => {
                    let Some(object) = sim.grid.object(*target) else {
                        trace!(target = %*target, "heal of removed object");
                        return Step::Done;
                    };
                    assert!(
                        object.hp.is_some(),
                        "Heal: {} ({}) has no hit points",
                        target,
                        object.name()
                    );
                    let (x, y) = object.position();
                    sim.effect(EffectKind::Heal, x, y);
                    *phase = HealPhase::Apply;
                    Step::Wait(sim.config().heal_delay_ms)
                }
                HealPhase::Apply => {
                    sim.add_action(Action::change_hp(*target, *amount as i32));
                    Step::Done
                }
            },
            Action::SpawnOre { .. } => Step::Hold,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase bodies
// ---------------------------------------------------------------------------

/// Move the object to its slide destination. Returns the travel time and
/// whether it moved at all, or `None` when the object is gone.
fn start_slide(
    sim: &mut Simulation,
    object: ObjectId,
    direction: Direction,
) -> Option<(f64, bool)> {
    let Some(to) = compute_slide_path(&sim.grid, object, direction) else {
        trace!(%object, "slide of removed object");
        return None;
    };
    let from = sim.grid.object(object)?.position();
    if from == to {
        return Some((0.0, false));
    }
    if let Err(err) = sim.grid.move_object(object, to.0, to.1) {
        panic!("slide destination of {object} was rejected: {err}");
    }
    let distance = (to.0 - from.0).abs() + (to.1 - from.1).abs();
    let duration_ms = f64::from(distance) / sim.config().slide_speed * 1000.0;
    debug!(%object, ?from, ?to, %direction, "slide");
    sim.journal.record(SimEvent::Moved {
        object,
        from,
        to,
        duration_ms,
    });
    Some((duration_ms, true))
}

/// Accept, or failing that consume, at the arrival cell; then bump whatever
/// sits beyond it.
fn arrive(sim: &mut Simulation, object: ObjectId, direction: Direction, moved: bool) {
    let Some(mover) = sim.grid.object(object) else {
        return;
    };
    let (x, y) = mover.position();

    if moved {
        if let Some(target) = first_acceptor(&sim.grid, object, x, y, direction) {
            behaviour::on_accept(sim, target, object, direction);
        } else if let Some(target) = first_consumable(&sim.grid, object, x, y, direction) {
            behaviour::on_consume(sim, object, target, direction);
        }
    }

    // Callbacks above and below may reshape the grid, so work on a copy.
    let (bx, by) = direction.step(x, y);
    let bumped: SmallVec<[ObjectId; 4]> = sim.grid.objects_at(bx, by).iter().copied().collect();
    for target in bumped {
        if sim.grid.is_alive(object) && sim.grid.is_alive(target) {
            behaviour::on_bump(sim, object, target, direction);
        }
    }
}

fn damage(sim: &mut Simulation, dealer: ObjectId, target: ObjectId, amount: u32) {
    let Some(victim) = sim.grid.object(target) else {
        trace!(%target, "damage to removed object");
        return;
    };
    if victim.has_tag(Tag::Dwarf) {
        let chance = sim.modifiers.damage_reduction_chance;
        if sim.chance(chance) {
            debug!(%dealer, %target, "damage dodged");
            return;
        }
    }
    sim.add_action(Action::change_hp(target, -(amount as i32)));
}

fn change_hp(sim: &mut Simulation, target: ObjectId, amount: i32) {
    let Some(object) = sim.grid.object_mut(target) else {
        trace!(%target, "hit point change on removed object");
        return;
    };
    let name = object.name();
    let Some(hp) = object.hp.as_mut() else {
        panic!("ChangeHp: {target} ({name}) has no hit points");
    };
    hp.apply(amount);
    let (current, max) = (hp.current, hp.max);
    let dead = hp.is_dead();
    sim.journal.record(SimEvent::HitPointsChanged {
        object: target,
        current,
        max,
    });
    if dead {
        sim.add_action(Action::death(target));
    }
}

// ---------------------------------------------------------------------------
// Spawner
// ---------------------------------------------------------------------------

/// One spawner pulse: an ore of an unlocked element, or outside raids
/// sometimes a goblin, on a random empty border cell, sliding inward.
fn spawn_from_border(sim: &mut Simulation) {
    let query = MaterialQuery::new()
        .component(ORE)
        .elements(&sim.modifiers.unlocked_elements);
    let registry = sim.grid.materials_arc();
    let Some(ore) = registry.create_by_rarity(&query, &mut sim.rng) else {
        warn!(?query, "spawner found no ore to create");
        return;
    };

    let cells = events::empty_border_cells(&sim.grid);
    if cells.is_empty() {
        trace!("no empty border cell to spawn on");
        return;
    }
    let (x, y) = cells[sim.rng.gen_range(0..cells.len())];

    let goblin_chance = sim.config().goblin_chance;
    let blueprint: Blueprint = if !sim.raid.active && sim.chance(goblin_chance) {
        ObjectKind::Goblin.into()
    } else {
        ore.into()
    };
    match sim.add_object(blueprint, x, y) {
        Ok(id) => sim.add_action(Action::slide(id, events::inward(&sim.grid, x, y))),
        Err(err) => warn!(%err, "spawn failed"),
    }
}

// ---------------------------------------------------------------------------
// ActionQueue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Running {
    action: Action,
    /// Remaining suspension in milliseconds; stepping resumes at or below 0.
    wait_ms: f64,
    /// False until the first frame this action was stepped in has passed.
    started: bool,
}

/// Running actions in FIFO order plus those queued for the next frame.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    running: Vec<Running>,
    pending: Vec<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action. It starts when the queue next advances.
    pub fn push(&mut self, action: Action) {
        self.pending.push(action);
    }

    /// Number of running plus queued actions.
    pub fn len(&self) -> usize {
        self.running.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty() && self.pending.is_empty()
    }

    /// Running and queued actions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.running
            .iter()
            .map(|r| &r.action)
            .chain(self.pending.iter())
    }

    /// Whether nothing but self-timed actions remain.
    pub fn is_idle(&self) -> bool {
        self.iter().all(|a| matches!(a, Action::SpawnOre { .. }))
    }

    fn promote_pending(&mut self) {
        self.running.extend(self.pending.drain(..).map(|action| Running {
            action,
            wait_ms: 0.0,
            started: false,
        }));
    }
}

impl Simulation {
    /// Advance every running action by `dt_ms`. Each action that finishes
    /// triggers a crafting sweep on the spot.
    pub(crate) fn advance_actions(&mut self, dt_ms: f64) {
        self.actions.promote_pending();
        let running = mem::take(&mut self.actions.running);
        let mut kept = Vec::with_capacity(running.len());

        for mut entry in running {
            entry.action.update(self, dt_ms);
            // A freshly promoted action starts at the end of this frame.
            if entry.started {
                entry.wait_ms -= dt_ms;
            }
            entry.started = true;
            let mut done = false;
            while entry.wait_ms <= 0.0 {
                match entry.action.step(self) {
                    Step::Next => {}
                    Step::Wait(ms) => entry.wait_ms += ms,
                    Step::Hold => {
                        entry.wait_ms = 0.0;
                        break;
                    }
                    Step::Done => {
                        done = true;
                        break;
                    }
                }
            }
            if done {
                debug!(action = entry.action.name(), "action complete");
                self.crafting_sweep();
            } else {
                kept.push(entry);
            }
        }

        // Anything queued during this pass sits in `pending` until next frame.
        self.actions.running = kept;
    }
}
