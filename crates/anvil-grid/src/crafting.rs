//! Recipe matching over directional crafting streams.
//!
//! A [`CraftingStream`] is a cursor walking the grid one cell at a time in a
//! fixed direction. [`Combinator`]s read from it; a [`Recipe`] is an ordered
//! list of combinators that must all succeed against one stream.
//!
//! Matching is a pure read of the grid. Only a complete match removes the
//! matched materials, and the positions are captured before removal so the
//! caller can place rewards where the parts used to be.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::direction::Direction;
use crate::entity::ObjectId;
use crate::grid::Grid;
use crate::material::{ComponentId, Material};

// ---------------------------------------------------------------------------
// CraftingStream
// ---------------------------------------------------------------------------

pub struct CraftingStream<'g> {
    grid: &'g Grid,
    x: i32,
    y: i32,
    direction: Direction,
    materials: Vec<(ObjectId, Material)>,
    cells: Vec<(i32, i32)>,
}

impl<'g> CraftingStream<'g> {
    pub fn new(grid: &'g Grid, x: i32, y: i32, direction: Direction) -> Self {
        Self {
            grid,
            x,
            y,
            direction,
            materials: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn current(&self) -> Option<(ObjectId, Material)> {
        let (id, object, material) = self.grid.material_at(self.x, self.y)?;
        material
            .symmetry
            .is_compatible(object.facing(), self.direction)
            .then_some((id, *material))
    }

    /// The material under the cursor, if any and if its facing is readable
    /// in this stream's direction.
    pub fn peek(&self) -> Option<Material> {
        self.current().map(|(_, m)| m)
    }

    /// Record the current cell (and material, when there is one) and step
    /// forward. Returns what [`peek`](Self::peek) would have.
    pub fn take(&mut self) -> Option<Material> {
        let current = self.current();
        self.cells.push((self.x, self.y));
        if let Some(entry) = current {
            self.materials.push(entry);
        }
        (self.x, self.y) = self.direction.step(self.x, self.y);
        current.map(|(_, m)| m)
    }

    /// Materials taken so far, in stream order.
    pub fn materials(&self) -> &[(ObjectId, Material)] {
        &self.materials
    }

    /// Cells taken so far, in stream order.
    pub fn cells(&self) -> &[(i32, i32)] {
        &self.cells
    }
}

// ---------------------------------------------------------------------------
// Combinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    /// One material of the component. Fails without consuming otherwise.
    ExactlyOne(ComponentId),
    /// Any run (possibly empty) of materials of the component.
    ZeroOrMore(ComponentId),
}

impl Combinator {
    /// Run against `stream`. Only a successful `ExactlyOne` or a non-empty
    /// `ZeroOrMore` advances the cursor.
    pub fn process(&self, stream: &mut CraftingStream<'_>) -> bool {
        match *self {
            Combinator::ExactlyOne(component) => {
                if stream.peek().is_some_and(|m| m.component == component) {
                    stream.take();
                    true
                } else {
                    false
                }
            }
            Combinator::ZeroOrMore(component) => {
                while stream.peek().is_some_and(|m| m.component == component) {
                    stream.take();
                }
                true
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// A successful match: the parts and the cells they covered.
#[derive(Debug, Clone, PartialEq)]
pub struct Craft {
    pub recipe: String,
    pub direction: Direction,
    pub objects: Vec<ObjectId>,
    pub materials: Vec<Material>,
    pub cells: Vec<(i32, i32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    name: String,
    combinators: Vec<Combinator>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, combinators: Vec<Combinator>) -> Self {
        Self {
            name: name.into(),
            combinators,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    /// Match the recipe along `direction` from `(x, y)` without touching the
    /// grid.
    pub fn match_in_direction(
        &self,
        grid: &Grid,
        x: i32,
        y: i32,
        direction: Direction,
    ) -> Option<Craft> {
        let mut stream = CraftingStream::new(grid, x, y, direction);
        for combinator in &self.combinators {
            if !combinator.process(&mut stream) {
                return None;
            }
        }
        if stream.materials().is_empty() {
            return None;
        }
        let (objects, materials) = stream.materials().iter().copied().unzip();
        Some(Craft {
            recipe: self.name.clone(),
            direction,
            objects,
            materials,
            cells: stream.cells().to_vec(),
        })
    }

    /// Match in whichever directions the origin material's symmetry allows,
    /// in canonical order; first match wins.
    pub fn match_any(&self, grid: &Grid, x: i32, y: i32) -> Option<Craft> {
        let (_, object, material) = grid.material_at(x, y)?;
        material
            .symmetry
            .candidate_directions(object.facing())
            .into_iter()
            .find_map(|d| self.match_in_direction(grid, x, y, d))
    }

    /// Match along `direction` and, on success, remove every matched
    /// material from the grid. A failed attempt leaves the grid untouched.
    pub fn attempt_to_craft_in_direction(
        &self,
        grid: &mut Grid,
        x: i32,
        y: i32,
        direction: Direction,
    ) -> Option<Craft> {
        let craft = self.match_in_direction(grid, x, y, direction);
        Self::consume(grid, craft)
    }

    /// Direction-agnostic variant of
    /// [`attempt_to_craft_in_direction`](Self::attempt_to_craft_in_direction).
    pub fn attempt_to_craft(&self, grid: &mut Grid, x: i32, y: i32) -> Option<Craft> {
        let craft = self.match_any(grid, x, y);
        Self::consume(grid, craft)
    }

    fn consume(grid: &mut Grid, craft: Option<Craft>) -> Option<Craft> {
        let Some(craft) = craft else {
            trace!("recipe did not match");
            return None;
        };
        for &id in &craft.objects {
            grid.remove_object(id);
        }
        Some(craft)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::catalog::*;
    use crate::material::{MaterialQuery, MaterialRegistry};
    use crate::object::Blueprint;

    fn part(grid: &Grid, component: ComponentId) -> Material {
        grid.materials()
            .first_match(&MaterialQuery::new().component(component))
            .unwrap()
    }

    fn place(grid: &mut Grid, component: ComponentId, x: i32, facing: Direction) -> ObjectId {
        let m = part(grid, component);
        grid.add_object(Blueprint::from(m).facing(facing), x, 0).unwrap()
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

    // -- streams ------------------------------------------------------------

    #[test]
    fn two_way_part_reads_against_the_stream() {
        let mut g = Grid::new(1, 1, MaterialRegistry::standard());
        place(&mut g, BLADE, 0, Direction::South);
        let stream = CraftingStream::new(&g, 0, 0, Direction::North);
        assert!(stream.peek().is_some());
    }

    #[test]
    fn asymmetric_part_must_face_the_stream() {
        let mut g = Grid::new(1, 1, MaterialRegistry::standard());
        place(&mut g, TIP, 0, Direction::South);
        assert!(CraftingStream::new(&g, 0, 0, Direction::North).peek().is_none());
        assert!(CraftingStream::new(&g, 0, 0, Direction::South).peek().is_some());
    }

    #[test]
    fn take_records_cell_and_advances() {
        let mut g = Grid::new(3, 1, MaterialRegistry::standard());
        let id = place(&mut g, BAR, 0, Direction::North);
        let mut stream = CraftingStream::new(&g, 0, 0, Direction::East);
        assert!(stream.take().is_some());
        assert_eq!(stream.position(), (1, 0));
        assert_eq!(stream.cells(), &[(0, 0)]);
        assert_eq!(stream.materials()[0].0, id);
        assert!(stream.take().is_none());
        assert_eq!(stream.cells(), &[(0, 0), (1, 0)]);
        assert_eq!(stream.materials().len(), 1);
    }

    // -- combinators --------------------------------------------------------

    #[test]
    fn zero_or_more_accepts_an_empty_run() {
        let g = Grid::new(3, 1, MaterialRegistry::standard());
        let mut stream = CraftingStream::new(&g, 0, 0, Direction::East);
        assert!(Combinator::ZeroOrMore(BLADE).process(&mut stream));
        assert_eq!(stream.position(), (0, 0));
    }

    #[test]
    fn exactly_one_failure_does_not_advance() {
        let mut g = Grid::new(3, 1, MaterialRegistry::standard());
        place(&mut g, BLADE, 0, Direction::East);
        let mut stream = CraftingStream::new(&g, 0, 0, Direction::East);
        assert!(!Combinator::ExactlyOne(TIP).process(&mut stream));
        assert_eq!(stream.position(), (0, 0));
        assert!(stream.cells().is_empty());
    }

    // -- recipes ------------------------------------------------------------

    #[test]
    fn single_bar_recipe_consumes_the_bar() {
        let mut g = Grid::new(3, 1, MaterialRegistry::standard());
        place(&mut g, BAR, 0, Direction::East);
        let recipe = Recipe::new("Bar", vec![Combinator::ExactlyOne(BAR)]);
        let craft = recipe
            .attempt_to_craft_in_direction(&mut g, 0, 0, Direction::East)
            .unwrap();
        assert_eq!(craft.materials.len(), 1);
        assert_eq!(craft.cells, vec![(0, 0)]);
        assert!(g.is_empty_at(0, 0));
    }

    #[test]
    fn impossible_recipe_leaves_grid_untouched() {
        let mut g = Grid::new(3, 1, MaterialRegistry::standard());
        let id = place(&mut g, BAR, 0, Direction::East);
        let before = g.clone();
        let recipe = Recipe::new(
            "Two bars",
            vec![Combinator::ExactlyOne(BAR), Combinator::ExactlyOne(BAR)],
        );
        assert!(recipe
            .attempt_to_craft_in_direction(&mut g, 0, 0, Direction::East)
            .is_none());
        assert_eq!(g, before);
        assert_eq!(g.object(id).unwrap().position(), (0, 0));
    }

    #[test]
    fn sword_without_handle_fails_immediately() {
        let mut g = Grid::new(5, 1, MaterialRegistry::standard());
        for x in 1..=3 {
            place(&mut g, BLADE, x, Direction::East);
        }
        place(&mut g, TIP, 4, Direction::East);
        let before = g.clone();
        assert!(sword()
            .attempt_to_craft_in_direction(&mut g, 0, 0, Direction::East)
            .is_none());
        assert_eq!(g, before);
        assert_eq!(g.object_count(), 4);
    }

    #[test]
    fn sword_matches_along_the_handle_facing() {
        let mut g = Grid::new(5, 1, MaterialRegistry::standard());
        place(&mut g, HANDLE, 0, Direction::East);
        place(&mut g, BLADE, 1, Direction::West);
        place(&mut g, BLADE, 2, Direction::East);
        place(&mut g, TIP, 3, Direction::East);
        let craft = sword().attempt_to_craft(&mut g, 0, 0).unwrap();
        assert_eq!(craft.direction, Direction::East);
        assert_eq!(craft.materials.len(), 4);
        assert_eq!(craft.cells, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(g.object_count(), 0);
    }

    #[test]
    fn handle_facing_elsewhere_does_not_match() {
        let mut g = Grid::new(5, 1, MaterialRegistry::standard());
        place(&mut g, HANDLE, 0, Direction::West);
        place(&mut g, TIP, 1, Direction::East);
        assert!(sword().attempt_to_craft(&mut g, 0, 0).is_none());
        assert_eq!(g.object_count(), 2);
    }

    #[test]
    fn four_way_origin_tries_every_direction() {
        let mut g = Grid::new(3, 3, MaterialRegistry::standard());
        let ore = part(&g, ORE);
        g.add_object(ore, 1, 1).unwrap();
        g.add_object(ore, 1, 2).unwrap();
        let recipe = Recipe::new(
            "Two ores",
            vec![Combinator::ExactlyOne(ORE), Combinator::ExactlyOne(ORE)],
        );
        let craft = recipe.match_any(&g, 1, 1).unwrap();
        assert_eq!(craft.direction, Direction::South);
    }

    #[test]
    fn empty_recipe_never_fires() {
        let mut g = Grid::new(1, 1, MaterialRegistry::standard());
        place(&mut g, BAR, 0, Direction::East);
        let recipe = Recipe::new("Nothing", vec![]);
        assert!(recipe.attempt_to_craft(&mut g, 0, 0).is_none());
    }
}
