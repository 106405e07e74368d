//! Property tests for the grid.
//!
//! Random sequences of placements, moves, rotations and removals must keep
//! every object's stored position in step with the cell index. Slide paths
//! must be pure, and a failed recipe attempt must leave the grid exactly as
//! it was.

use anvil_grid::material::catalog::*;
use anvil_grid::prelude::*;
use proptest::prelude::*;

const COLUMNS: i32 = 6;
const ROWS: i32 = 5;

#[derive(Debug, Clone)]
enum GridOp {
    Add(u8, i32, i32),
    Move(usize, i32, i32),
    Rotate(usize),
    Remove(usize),
}

fn coord() -> impl Strategy<Value = (i32, i32)> {
    // Slightly past the edges so out-of-bounds paths are exercised too.
    (-1..=COLUMNS, -1..=ROWS)
}

fn grid_op() -> impl Strategy<Value = GridOp> {
    prop_oneof![
        (0u8..6, coord()).prop_map(|(k, (x, y))| GridOp::Add(k, x, y)),
        (0..40usize, coord()).prop_map(|(i, (x, y))| GridOp::Move(i, x, y)),
        (0..40usize).prop_map(GridOp::Rotate),
        (0..40usize).prop_map(GridOp::Remove),
    ]
}

fn direction() -> impl Strategy<Value = Direction> {
    (0u32..4).prop_map(Direction::from_rotation)
}

fn kind(grid: &Grid, k: u8) -> ObjectKind {
    let component = |c| {
        let m = grid
            .materials()
            .first_match(&MaterialQuery::new().component(c))
            .expect("standard catalogue has every component");
        ObjectKind::Material(m)
    };
    match k {
        0 => component(ORE),
        1 => component(BLADE),
        2 => ObjectKind::Furnace,
        3 => ObjectKind::Mule,
        4 => ObjectKind::automaton(),
        _ => ObjectKind::Redirector,
    }
}

fn apply(grid: &mut Grid, handles: &mut Vec<ObjectId>, op: GridOp) {
    match op {
        GridOp::Add(k, x, y) => {
            let kind = kind(grid, k);
            match grid.add_object(kind, x, y) {
                Ok(id) => handles.push(id),
                Err(e) => assert!(matches!(e, GridError::OutOfBounds { .. })),
            }
        }
        GridOp::Move(i, x, y) => {
            if let Some(&id) = handles.get(i) {
                let _ = grid.move_object(id, x, y);
            }
        }
        GridOp::Rotate(i) => {
            if let Some(&id) = handles.get(i) {
                grid.rotate_object(id);
            }
        }
        GridOp::Remove(i) => {
            if let Some(&id) = handles.get(i) {
                grid.remove_object(id);
            }
        }
    }
}

/// Place sword parts (and some ores) at random with random facings.
fn parts_strategy() -> impl Strategy<Value = Vec<(u8, i32, i32, u32)>> {
    prop::collection::vec((0u8..4, 0..COLUMNS, 0..ROWS, 0u32..4), 0..24)
}

fn build_parts(parts: &[(u8, i32, i32, u32)]) -> Grid {
    let mut grid = Grid::new(COLUMNS, ROWS, MaterialRegistry::standard());
    for &(c, x, y, rotation) in parts {
        let component = [HANDLE, BLADE, TIP, ORE][c as usize];
        let m = grid
            .materials()
            .first_match(&MaterialQuery::new().component(component))
            .expect("standard catalogue has every component");
        grid.add_object(Blueprint::from(m).rotated(rotation), x, y)
            .expect("coordinates are in bounds");
    }
    grid
}

fn sword() -> Recipe {
    Recipe::new(
        "Sword",
        vec![
            Combinator::ExactlyOne(HANDLE),
            Combinator::ZeroOrMore(BLADE),
            Combinator::ExactlyOne(TIP),
        ],
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_preserve_position_invariant(ops in prop::collection::vec(grid_op(), 1..60)) {
        let mut grid = Grid::new(COLUMNS, ROWS, MaterialRegistry::standard());
        let mut handles = Vec::new();
        for op in ops {
            apply(&mut grid, &mut handles, op);
            prop_assert!(grid.positions_consistent());
        }
        let live = handles.iter().filter(|&&id| grid.is_alive(id)).count();
        prop_assert_eq!(live, grid.object_count());
    }

    #[test]
    fn slide_path_is_pure(
        ops in prop::collection::vec(grid_op(), 1..40),
        pick in 0..40usize,
        dir in direction(),
    ) {
        let mut grid = Grid::new(COLUMNS, ROWS, MaterialRegistry::standard());
        let mut handles = Vec::new();
        for op in ops {
            apply(&mut grid, &mut handles, op);
        }
        if let Some(&id) = handles.get(pick) {
            let before = grid.clone();
            let first = compute_slide_path(&grid, id, dir);
            let second = compute_slide_path(&grid, id, dir);
            prop_assert_eq!(first, second);
            prop_assert_eq!(&grid, &before);
            if let Some((x, y)) = first {
                prop_assert!(grid.in_bounds(x, y));
            }
        }
    }

    #[test]
    fn failed_recipe_attempt_mutates_nothing(
        parts in parts_strategy(),
        x in 0..COLUMNS,
        y in 0..ROWS,
        dir in direction(),
    ) {
        let mut grid = build_parts(&parts);
        let before = grid.clone();
        let count = grid.object_count();
        match sword().attempt_to_craft_in_direction(&mut grid, x, y, dir) {
            None => prop_assert_eq!(&grid, &before),
            Some(craft) => {
                prop_assert_eq!(grid.object_count(), count - craft.objects.len());
                prop_assert!(craft.materials.len() >= 2);
                prop_assert_eq!(craft.cells.len(), craft.materials.len());
                for id in craft.objects {
                    prop_assert!(!grid.is_alive(id));
                }
            }
        }
        prop_assert!(grid.positions_consistent());
    }
}
