//! Accept / consume predicates between objects.
//!
//! `can_accept(target, incoming, d)` answers "may `incoming`, sliding in
//! direction `d`, enter the cell of `target` and be handled by it". These are
//! pure reads of the grid; the matching `on_accept` reactions live in the
//! engine's behaviour table.
//!
//! Machines that emit a product only accept when the cell beyond them can
//! take that product. The product is sampled at random when the machine
//! actually fires, so the check runs against the first registered variant of
//! the output query as a stand-in.

use crate::direction::Direction;
use crate::entity::ObjectId;
use crate::grid::Grid;
use crate::material::catalog::{BAR, BLADE, HANDLE, ORE, STRAIGHT, TIP};
use crate::material::{ElementId, Material, MaterialQuery};
use crate::object::{GameObject, ObjectKind, Tag};

// ---------------------------------------------------------------------------
// Machine outputs
// ---------------------------------------------------------------------------

/// What a furnace makes from ore of `element`.
pub fn furnace_output(element: ElementId) -> MaterialQuery {
    MaterialQuery::new().element(element).component(BAR)
}

/// What an anvil makes from a bar of `element`, in order of preference.
pub fn anvil_outputs(element: ElementId) -> [MaterialQuery; 2] {
    let parts = MaterialQuery::new()
        .components(&[TIP, BLADE, HANDLE])
        .element(element);
    [parts.clone().set_bonus(STRAIGHT), parts]
}

/// What a whetstone re-rolls `part` into.
pub fn whetstone_output(part: &Material) -> MaterialQuery {
    MaterialQuery::new()
        .element(part.element)
        .component(part.component)
}

fn representative(grid: &Grid, queries: &[MaterialQuery]) -> Option<Material> {
    queries
        .iter()
        .find_map(|q| grid.materials().first_match(q))
}

/// Whether the cell past `machine` in `direction` would take `output`.
fn output_clear(
    grid: &Grid,
    machine: &GameObject,
    output: Option<Material>,
    direction: Direction,
) -> bool {
    let Some(output) = output else {
        return false;
    };
    let (nx, ny) = direction.step(machine.x(), machine.y());
    cell_accepts(grid, nx, ny, &ObjectKind::Material(output), direction)
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Whether `target` accepts an object of kind `incoming` arriving in
/// `direction`.
pub fn can_accept(
    grid: &Grid,
    target: &GameObject,
    incoming: &ObjectKind,
    direction: Direction,
) -> bool {
    let material = incoming.as_material();
    match &target.kind {
        ObjectKind::Furnace => material.is_some_and(|m| {
            m.component == ORE
                && output_clear(
                    grid,
                    target,
                    representative(grid, &[furnace_output(m.element)]),
                    direction,
                )
        }),
        ObjectKind::Anvil => material.is_some_and(|m| {
            m.component == BAR
                && output_clear(
                    grid,
                    target,
                    representative(grid, &anvil_outputs(m.element)),
                    direction,
                )
        }),
        ObjectKind::Whetstone => material.is_some_and(|m| {
            (m.component == TIP || m.component == BLADE)
                && output_clear(
                    grid,
                    target,
                    representative(grid, &[whetstone_output(m)]),
                    direction,
                )
        }),
        ObjectKind::Mule | ObjectKind::Goblin => material.is_some(),
        ObjectKind::Warrior => material.is_some_and(|m| m.component == BAR),
        ObjectKind::Bank { container, .. }
        | ObjectKind::Assembler { container, .. }
        | ObjectKind::Automaton { container } => {
            material.is_some_and(|m| container.can_store(m))
        }
        ObjectKind::Redirector
        | ObjectKind::Waiter
        | ObjectKind::Emptier { .. }
        | ObjectKind::Filter { .. } => incoming.is_automaton(),
        ObjectKind::GoblinBrute => {
            material.is_none() && !incoming.has_tag(Tag::Dwarf) && !incoming.has_tag(Tag::Goblin)
        }
        ObjectKind::Material(_)
        | ObjectKind::Bucket
        | ObjectKind::Healer { .. }
        | ObjectKind::GoblinLooter
        | ObjectKind::GoblinShaman { .. }
        | ObjectKind::GoblinTotem { .. } => false,
    }
}

/// Whether `mover` eats `target` when sliding into its cell.
pub fn can_consume(mover: &GameObject, target: &GameObject, _direction: Direction) -> bool {
    match mover.kind {
        ObjectKind::Mule => target.as_material().is_some(),
        _ => false,
    }
}

/// Whether an object of kind `incoming` may enter `(x, y)`: the cell exists
/// and is empty, or one of its occupants accepts it.
pub fn cell_accepts(
    grid: &Grid,
    x: i32,
    y: i32,
    incoming: &ObjectKind,
    direction: Direction,
) -> bool {
    let Some(cell) = grid.cell(x, y) else {
        return false;
    };
    cell.is_empty()
        || cell
            .objects()
            .iter()
            .filter_map(|&id| grid.object(id))
            .any(|target| can_accept(grid, target, incoming, direction))
}

/// First occupant of `(x, y)` other than `mover` that accepts it.
pub fn first_acceptor(
    grid: &Grid,
    mover: ObjectId,
    x: i32,
    y: i32,
    direction: Direction,
) -> Option<ObjectId> {
    let incoming = &grid.object(mover)?.kind;
    grid.objects_at(x, y)
        .iter()
        .copied()
        .filter(|&id| id != mover)
        .find(|&id| {
            grid.object(id)
                .is_some_and(|target| can_accept(grid, target, incoming, direction))
        })
}

/// First occupant of `(x, y)` other than `mover` that it can consume.
pub fn first_consumable(
    grid: &Grid,
    mover: ObjectId,
    x: i32,
    y: i32,
    direction: Direction,
) -> Option<ObjectId> {
    let moving = grid.object(mover)?;
    grid.objects_at(x, y)
        .iter()
        .copied()
        .filter(|&id| id != mover)
        .find(|&id| {
            grid.object(id)
                .is_some_and(|target| can_consume(moving, target, direction))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::catalog::{GOLD, IRON};
    use crate::material::MaterialRegistry;

    fn grid() -> Grid {
        Grid::new(5, 1, MaterialRegistry::standard())
    }

    fn material(g: &Grid, element: ElementId, component: crate::material::ComponentId) -> Material {
        g.materials()
            .first_match(&MaterialQuery::new().element(element).component(component))
            .unwrap()
    }

    #[test]
    fn furnace_needs_a_clear_output_cell() {
        let mut g = grid();
        let furnace = g.add_object(ObjectKind::Furnace, 2, 0).unwrap();
        let ore = ObjectKind::Material(material(&g, IRON, ORE));
        let target = g.object(furnace).unwrap().clone();
        assert!(can_accept(&g, &target, &ore, Direction::East));

        // Past the east edge there is nowhere to put the bar.
        g.move_object(furnace, 4, 0).unwrap();
        let target = g.object(furnace).unwrap().clone();
        assert!(!can_accept(&g, &target, &ore, Direction::East));
        // Westward the output cell (3,0) is empty.
        assert!(can_accept(&g, &target, &ore, Direction::West));
    }

    #[test]
    fn furnace_output_may_land_on_an_accepting_machine() {
        let mut g = grid();
        let furnace = g.add_object(ObjectKind::Furnace, 1, 0).unwrap();
        g.add_object(ObjectKind::Anvil, 2, 0).unwrap();
        g.add_object(ObjectKind::Furnace, 3, 0).unwrap();
        let ore = ObjectKind::Material(material(&g, IRON, ORE));
        let target = g.object(furnace).unwrap().clone();
        // (2,0) holds an anvil that takes bars when (3,0) is clear; it is not.
        assert!(!can_accept(&g, &target, &ore, Direction::East));
    }

    #[test]
    fn furnace_rejects_non_ore() {
        let mut g = grid();
        let furnace = g.add_object(ObjectKind::Furnace, 1, 0).unwrap();
        let target = g.object(furnace).unwrap().clone();
        let bar = ObjectKind::Material(material(&g, IRON, BAR));
        assert!(!can_accept(&g, &target, &bar, Direction::East));
        assert!(!can_accept(&g, &target, &ObjectKind::Mule, Direction::East));
    }

    #[test]
    fn storage_acceptance_follows_container_rule() {
        let mut g = grid();
        let bank = g.add_object(ObjectKind::bank(), 0, 0).unwrap();
        let target = g.object(bank).unwrap().clone();
        let gold = ObjectKind::Material(material(&g, GOLD, BAR));
        let iron = ObjectKind::Material(material(&g, IRON, BAR));
        assert!(can_accept(&g, &target, &gold, Direction::East));
        assert!(!can_accept(&g, &target, &iron, Direction::East));
    }

    #[test]
    fn brute_steals_machines_but_not_creatures() {
        let mut g = grid();
        let brute = g.add_object(ObjectKind::GoblinBrute, 0, 0).unwrap();
        let target = g.object(brute).unwrap().clone();
        assert!(can_accept(&g, &target, &ObjectKind::Furnace, Direction::West));
        assert!(!can_accept(&g, &target, &ObjectKind::Warrior, Direction::West));
        assert!(!can_accept(&g, &target, &ObjectKind::Goblin, Direction::West));
        let ore = ObjectKind::Material(material(&g, IRON, ORE));
        assert!(!can_accept(&g, &target, &ore, Direction::West));
    }

    #[test]
    fn logic_tiles_only_take_automatons() {
        let mut g = grid();
        let redirector = g.add_object(ObjectKind::Redirector, 0, 0).unwrap();
        let target = g.object(redirector).unwrap().clone();
        assert!(can_accept(&g, &target, &ObjectKind::automaton(), Direction::North));
        assert!(!can_accept(&g, &target, &ObjectKind::Mule, Direction::North));
    }

    #[test]
    fn mule_consumes_materials_only() {
        let mut g = grid();
        let mule = g.add_object(ObjectKind::Mule, 0, 0).unwrap();
        let ore = g.add_object(material(&g, IRON, ORE), 1, 0).unwrap();
        let anvil = g.add_object(ObjectKind::Anvil, 1, 0).unwrap();
        let m = g.object(mule).unwrap();
        assert!(can_consume(m, g.object(ore).unwrap(), Direction::East));
        assert!(!can_consume(m, g.object(anvil).unwrap(), Direction::East));
        assert_eq!(first_consumable(&g, mule, 1, 0, Direction::East), Some(ore));
    }

    #[test]
    fn cell_accepts_off_grid_is_false() {
        let g = grid();
        assert!(!cell_accepts(&g, 5, 0, &ObjectKind::Mule, Direction::East));
        assert!(cell_accepts(&g, 4, 0, &ObjectKind::Mule, Direction::East));
    }
}
