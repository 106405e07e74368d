//! Per-kind reactions.
//!
//! The grid crate answers the pure questions (may this object enter that
//! cell?). This module holds what happens next, dispatched on
//! [`ObjectKind`]:
//!
//! | Hook | Called when |
//! |------|-------------|
//! | [`on_accept`] | a slide ends on a cell whose occupant accepted the mover |
//! | [`on_consume`] | a slide ends on something the mover eats |
//! | [`on_bump`] | a slide ends next to an occupied cell |
//! | [`update`] | every frame, for every object |
//! | [`logic`] | every logic tick, for every automaton |
//!
//! Hooks never hold grid borrows across calls back into the simulation;
//! each reads what it needs, then mutates.

use anvil_grid::capability::Capabilities;
use anvil_grid::direction::Direction;
use anvil_grid::entity::ObjectId;
use anvil_grid::interaction::{anvil_outputs, cell_accepts, furnace_output, whetstone_output};
use anvil_grid::material::catalog::GOLD;
use anvil_grid::object::{
    Blueprint, ObjectKind, Tag, BANK_PAYOUT_MS, HEAL_PULSE_MS, SHAMAN_PERIOD_MS,
};
use anvil_journal::{EffectKind, SimEvent};
use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, info, trace};

use crate::action::Action;
use crate::simulation::Simulation;

/// Coins a mule pays for any material before the trade bonus.
pub const BASE_SALE_PRICE: f64 = 5.0;
/// Chance per pulse that a shaman plants a totem.
pub const TOTEM_CHANCE: f64 = 0.1;

// ---------------------------------------------------------------------------
// Accept / consume / bump
// ---------------------------------------------------------------------------

/// `target` has accepted `incoming`, which slid into its cell along
/// `direction`.
pub fn on_accept(sim: &mut Simulation, target: ObjectId, incoming: ObjectId, direction: Direction) {
    let (Some(machine), Some(mover)) = (sim.grid.object(target), sim.grid.object(incoming)) else {
        return;
    };
    let (x, y) = machine.position();
    let kind = machine.kind.clone();
    let material = mover.as_material().copied();
    let mover_rotation = mover.rotation;
    debug!(%target, %incoming, name = kind.name(), "accept");

    match kind {
        ObjectKind::Furnace => {
            let Some(ore) = material else { return };
            let midas = sim.modifiers.midas_chance;
            let element = if sim.chance(midas) { GOLD } else { ore.element };
            let registry = sim.grid.materials_arc();
            let bar = registry.create_by_rarity(&furnace_output(element), &mut sim.rng);
            sim.remove(incoming);
            if let Some(bar) = bar {
                sim.emit(bar.into(), x, y, direction);
            }
            sim.effect(EffectKind::Smoke, x, y);
        }
        ObjectKind::Anvil => {
            let Some(bar) = material else { return };
            sim.remove(incoming);
            let shortcut = sim.modifiers.anvil_sword_chance;
            if sim.chance(shortcut) {
                sim.economy.swords += 1;
                info!(x, y, "anvil shortcut to a finished sword");
                sim.journal.record(SimEvent::Crafted {
                    recipe: "Sword".to_owned(),
                    cells: vec![(x, y)],
                    reward: 0,
                    notes: vec!["Shortcut".to_owned()],
                });
            } else {
                let registry = sim.grid.materials_arc();
                let part = anvil_outputs(bar.element)
                    .iter()
                    .find_map(|q| registry.create_by_rarity(q, &mut sim.rng));
                if let Some(part) = part {
                    let mut blueprint = Blueprint::from(part);
                    if part.rotates {
                        blueprint = blueprint.facing(direction);
                    }
                    sim.emit(blueprint, x, y, direction);
                }
            }
            sim.effect(EffectKind::Sparks, x, y);
        }
        ObjectKind::Whetstone => {
            let Some(part) = material else { return };
            let registry = sim.grid.materials_arc();
            let refined = registry.create_by_rarity(&whetstone_output(&part), &mut sim.rng);
            sim.remove(incoming);
            if let Some(refined) = refined {
                sim.emit(Blueprint::from(refined).rotated(mover_rotation), x, y, direction);
            }
            sim.effect(EffectKind::Smoke, x, y);
        }
        ObjectKind::Mule => sell(sim, target, incoming),
        ObjectKind::Bank { .. } | ObjectKind::Assembler { .. } | ObjectKind::Automaton { .. } => {
            store(sim, target, incoming, direction);
        }
        ObjectKind::Emptier { .. } => {
            if let Some(ObjectKind::Emptier { exit_direction }) =
                sim.grid.object_mut(target).map(|o| &mut o.kind)
            {
                *exit_direction = direction;
            }
        }
        ObjectKind::Warrior => {
            sim.remove(incoming);
            sim.add_action(Action::change_hp(target, 1));
        }
        ObjectKind::Goblin | ObjectKind::GoblinBrute => {
            debug!(%target, %incoming, "stolen");
            sim.remove(incoming);
            sim.effect(EffectKind::Smoke, x, y);
        }
        ObjectKind::Redirector | ObjectKind::Waiter | ObjectKind::Filter { .. } => {}
        ObjectKind::Material(_)
        | ObjectKind::Bucket
        | ObjectKind::Healer { .. }
        | ObjectKind::GoblinLooter
        | ObjectKind::GoblinShaman { .. }
        | ObjectKind::GoblinTotem { .. } => {
            trace!(%target, "accept on a kind that never accepts");
        }
    }
}

/// `mover` slid onto `target` and eats it.
pub fn on_consume(sim: &mut Simulation, mover: ObjectId, target: ObjectId, direction: Direction) {
    let is_mule = matches!(sim.grid.object(mover).map(|o| &o.kind), Some(ObjectKind::Mule));
    if is_mule {
        sell(sim, mover, target);
        sim.add_action(Action::slide(mover, direction));
    }
}

/// `mover` finished a slide facing `target` in the next cell.
pub fn on_bump(sim: &mut Simulation, mover: ObjectId, target: ObjectId, direction: Direction) {
    let (Some(bumper), Some(bumped)) = (sim.grid.object(mover), sim.grid.object(target)) else {
        return;
    };
    let warrior_hits_goblin =
        matches!(bumper.kind, ObjectKind::Warrior) && bumped.has_tag(Tag::Goblin);
    let bucket_pushes = matches!(bumper.kind, ObjectKind::Bucket) && bumped.can_be_moved();

    if warrior_hits_goblin {
        debug!(%mover, %target, "warrior attacks");
        sim.add_action(Action::damage(mover, target, 1));
        sim.add_action(Action::damage(target, mover, 1));
        let bloodlust = sim.modifiers.bloodlust_chance;
        if sim.chance(bloodlust) {
            sim.add_action(Action::heal(mover, 1));
        }
    } else if bucket_pushes {
        sim.add_action(Action::slide(target, direction));
    }
}

fn sell(sim: &mut Simulation, seller: ObjectId, material: ObjectId) {
    let Some((x, y)) = sim.grid.object(seller).map(|o| o.position()) else {
        return;
    };
    if sim.remove(material).is_none() {
        return;
    }
    let coins = (BASE_SALE_PRICE * (1.0 + sim.modifiers.trade_price_bonus)).floor() as u64;
    sim.economy.coins += coins;
    info!(%material, coins, "sold");
    sim.journal.record(SimEvent::Sold {
        object: material,
        coins,
    });
    sim.effect(EffectKind::Coins, x, y);
}

fn store(sim: &mut Simulation, holder: ObjectId, incoming: ObjectId, direction: Direction) {
    let Some(material) = sim.grid.object(incoming).and_then(|o| o.as_material()).copied() else {
        return;
    };
    let Some(object) = sim.grid.object_mut(holder) else {
        return;
    };
    if !object.kind.container().is_some_and(|c| c.can_store(&material)) {
        return;
    }
    if let ObjectKind::Assembler {
        output_direction, ..
    } = &mut object.kind
    {
        *output_direction = direction;
    }
    let Some(container) = object.kind.container_mut() else {
        return;
    };
    container.push(material);
    let len = container.len();
    sim.remove(incoming);
    sim.journal.record(SimEvent::Stored {
        container: holder,
        material,
        len,
    });
}

// ---------------------------------------------------------------------------
// Per-frame update
// ---------------------------------------------------------------------------

/// What a timed object decided this frame, applied once its borrow ends.
enum Pulse {
    Payout(u64),
    Assemble(Direction),
    Heal(Tag),
    Shaman,
}

/// Advance `id`'s own timers by `dt_ms`.
pub fn update(sim: &mut Simulation, id: ObjectId, dt_ms: f64) {
    let Some(object) = sim.grid.object_mut(id) else {
        return;
    };
    let (x, y) = object.position();

    let pulse = match &mut object.kind {
        ObjectKind::Bank {
            container,
            timer_ms,
        } => {
            *timer_ms += dt_ms;
            (*timer_ms >= BANK_PAYOUT_MS).then(|| {
                *timer_ms = 0.0;
                Pulse::Payout(container.len() as u64)
            })
        }
        ObjectKind::Assembler {
            container,
            output_direction,
        } => container.is_full().then_some(Pulse::Assemble(*output_direction)),
        ObjectKind::Healer { timer_ms } => countdown(timer_ms, dt_ms, HEAL_PULSE_MS)
            .then_some(Pulse::Heal(Tag::Dwarf)),
        ObjectKind::GoblinTotem { timer_ms } => countdown(timer_ms, dt_ms, HEAL_PULSE_MS)
            .then_some(Pulse::Heal(Tag::Goblin)),
        ObjectKind::GoblinShaman { timer_ms } => {
            countdown(timer_ms, dt_ms, SHAMAN_PERIOD_MS).then_some(Pulse::Shaman)
        }
        _ => None,
    };

    match pulse {
        None => {}
        Some(Pulse::Payout(coins)) => {
            sim.economy.coins += coins;
            if coins > 0 {
                debug!(bank = %id, coins, "bank payout");
                sim.effect(EffectKind::Coins, x, y);
            }
        }
        Some(Pulse::Assemble(direction)) => assemble(sim, id, x, y, direction),
        Some(Pulse::Heal(tag)) => heal_around(sim, x, y, tag),
        Some(Pulse::Shaman) => {
            if sim.chance(TOTEM_CHANCE) {
                plant_totem(sim, id, x, y);
            }
        }
    }
}

/// Count `timer` down; on expiry rearm it and report a pulse.
fn countdown(timer: &mut f64, dt_ms: f64, period_ms: f64) -> bool {
    *timer -= dt_ms;
    if *timer <= 0.0 {
        *timer = period_ms;
        true
    } else {
        false
    }
}

fn assemble(sim: &mut Simulation, assembler: ObjectId, x: i32, y: i32, direction: Direction) {
    let (nx, ny) = direction.step(x, y);
    if !cell_accepts(&sim.grid, nx, ny, &ObjectKind::automaton(), direction) {
        return;
    }
    if let Some(container) = sim
        .grid
        .object_mut(assembler)
        .and_then(|o| o.kind.container_mut())
    {
        container.empty();
    }
    info!(%assembler, "automaton assembled");
    sim.emit(ObjectKind::automaton().into(), x, y, direction);
}

fn heal_around(sim: &mut Simulation, x: i32, y: i32, tag: Tag) {
    let mut patients: SmallVec<[ObjectId; 8]> = SmallVec::new();
    for dy in -1..=1 {
        for dx in -1..=1 {
            patients.extend(sim.grid.objects_at(x + dx, y + dy).iter().copied().filter(|&id| {
                sim.grid
                    .object(id)
                    .is_some_and(|o| o.hp.is_some() && o.has_tag(tag))
            }));
        }
    }
    for patient in patients {
        sim.add_action(Action::heal(patient, 1));
    }
}

fn plant_totem(sim: &mut Simulation, shaman: ObjectId, x: i32, y: i32) {
    if let Err(err) = sim.add_object(ObjectKind::goblin_totem(), x, y) {
        trace!(%err, "totem not planted");
        return;
    }
    let exits: SmallVec<[Direction; 4]> = Direction::ALL
        .into_iter()
        .filter(|d| {
            let (nx, ny) = d.step(x, y);
            sim.grid.is_empty_at(nx, ny)
        })
        .collect();
    if !exits.is_empty() {
        let direction = exits[sim.rng.gen_range(0..exits.len())];
        sim.add_action(Action::slide(shaman, direction));
    }
}

// ---------------------------------------------------------------------------
// Logic tick
// ---------------------------------------------------------------------------

/// Let every logic tile sharing `automaton`'s cell act on it.
pub fn logic(sim: &mut Simulation, automaton: ObjectId) {
    let Some(carrier) = sim.grid.object(automaton) else {
        return;
    };
    let (x, y) = carrier.position();
    let tiles: SmallVec<[ObjectId; 4]> = sim
        .grid
        .objects_at(x, y)
        .iter()
        .copied()
        .filter(|&id| id != automaton)
        .collect();

    for tile in tiles {
        let Some(object) = sim.grid.object(tile) else {
            continue;
        };
        if !object.capabilities().contains(Capabilities::LOGIC) {
            continue;
        }
        let facing = object.facing();
        let kind = object.kind.clone();
        let Some(container) = sim.grid.object(automaton).and_then(|o| o.container()) else {
            return;
        };
        let top = container.peek().copied();
        let full = container.is_full();
        trace!(%tile, %automaton, name = kind.name(), "logic");

        match kind {
            ObjectKind::Redirector => sim.add_action(Action::slide(automaton, facing)),
            ObjectKind::Waiter => {
                if full {
                    sim.add_action(Action::slide(automaton, facing));
                }
            }
            ObjectKind::Emptier { exit_direction } => {
                let Some(material) = top else {
                    sim.add_action(Action::slide(automaton, exit_direction));
                    continue;
                };
                let (nx, ny) = facing.step(x, y);
                if !cell_accepts(&sim.grid, nx, ny, &ObjectKind::Material(material), facing) {
                    continue;
                }
                if let Some(container) = sim
                    .grid
                    .object_mut(automaton)
                    .and_then(|o| o.kind.container_mut())
                {
                    container.pop();
                }
                sim.emit(material.into(), x, y, facing);
            }
            ObjectKind::Filter { element, component } => {
                let direction = match top {
                    Some(m) if m.is(element, component) => Direction::East,
                    _ => Direction::West,
                };
                sim.add_action(Action::slide(automaton, direction));
            }
            _ => {}
        }
    }
}
