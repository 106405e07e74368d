//! The [`Grid`] owns every object and the cell index that locates them.
//!
//! Objects live in an [`ObjectArena`] addressed by [`ObjectId`]; each [`Cell`]
//! keeps the insertion-ordered list of ids standing on it. The mutators below
//! are the only code that writes an object's position, which keeps the two
//! views in step.

use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::trace;

use crate::direction::Direction;
use crate::entity::{ObjectArena, ObjectId};
use crate::material::{Material, MaterialRegistry};
use crate::object::{Blueprint, GameObject, Tag};
use crate::GridError;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    x: i32,
    y: i32,
    objects: SmallVec<[ObjectId; 4]>,
}

impl Cell {
    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Occupants in insertion order.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    columns: i32,
    rows: i32,
    cells: Vec<Cell>,
    objects: ObjectArena,
    #[serde(skip)]
    materials: Arc<MaterialRegistry>,
}

impl Grid {
    /// Create an empty `columns × rows` grid.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn new(columns: i32, rows: i32, materials: impl Into<Arc<MaterialRegistry>>) -> Self {
        assert!(columns > 0 && rows > 0, "grid must be at least 1x1");
        let cells = (0..rows)
            .flat_map(|y| {
                (0..columns).map(move |x| Cell {
                    x,
                    y,
                    objects: SmallVec::new(),
                })
            })
            .collect();
        Self {
            columns,
            rows,
            cells,
            objects: ObjectArena::new(),
            materials: materials.into(),
        }
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Shared handle to the registry.
    pub fn materials_arc(&self) -> Arc<MaterialRegistry> {
        Arc::clone(&self.materials)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.columns && y < self.rows
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y).then(|| (x + y * self.columns) as usize)
    }

    fn bounds_error(&self, x: i32, y: i32) -> GridError {
        GridError::OutOfBounds {
            x,
            y,
            columns: self.columns,
            rows: self.rows,
        }
    }

    // -- cells --------------------------------------------------------------

    /// The cell at `(x, y)`, or `None` off the grid.
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// The neighbour of `(x, y)` in `direction`, or `None` past the edge.
    pub fn cell_in_direction(&self, x: i32, y: i32, direction: Direction) -> Option<&Cell> {
        let (nx, ny) = direction.step(x, y);
        self.cell(nx, ny)
    }

    /// All cells in index order (row-major).
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Occupants of `(x, y)`; empty off the grid.
    pub fn objects_at(&self, x: i32, y: i32) -> &[ObjectId] {
        self.cell(x, y).map_or(&[], |c| c.objects())
    }

    /// First occupant of `(x, y)`.
    pub fn object_at(&self, x: i32, y: i32) -> Option<ObjectId> {
        self.objects_at(x, y).first().copied()
    }

    pub fn is_empty_at(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(Cell::is_empty)
    }

    /// First material standing on `(x, y)`.
    pub fn material_at(&self, x: i32, y: i32) -> Option<(ObjectId, &GameObject, &Material)> {
        self.objects_at(x, y).iter().find_map(|&id| {
            let object = self.object(id)?;
            object.as_material().map(|m| (id, object, m))
        })
    }

    // -- objects ------------------------------------------------------------

    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.objects.contains(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Live objects in slot order.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn any_tagged(&self, tag: Tag) -> bool {
        self.objects().any(|o| o.has_tag(tag))
    }

    /// Ids of every live object, in cell index order then insertion order.
    pub fn ids_in_cell_order(&self) -> Vec<ObjectId> {
        self.cells
            .iter()
            .flat_map(|c| c.objects.iter().copied())
            .collect()
    }

    // -- mutators -----------------------------------------------------------

    /// Place a new object at `(x, y)`, appended to the cell's occupants.
    pub fn add_object(
        &mut self,
        blueprint: impl Into<Blueprint>,
        x: i32,
        y: i32,
    ) -> Result<ObjectId, GridError> {
        let cell = self.index(x, y).ok_or_else(|| self.bounds_error(x, y))?;
        let blueprint: Blueprint = blueprint.into();
        let id = self
            .objects
            .insert_with(|id| GameObject::from_blueprint(id, blueprint, x, y));
        self.cells[cell].objects.push(id);
        Ok(id)
    }

    /// Remove an object from its cell and the arena.
    ///
    /// Returns `None` if the handle is stale; pending work holding it should
    /// treat that as a no-op.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<GameObject> {
        let Some(object) = self.objects.remove(id) else {
            trace!(%id, "remove of stale object ignored");
            return None;
        };
        if let Some(cell) = self.index(object.x(), object.y()) {
            self.cells[cell].objects.retain(|o| *o != id);
        }
        Some(object)
    }

    /// Move an object to `(x, y)`, appending it to the destination's
    /// occupants. Moving onto its own cell is a no-op.
    pub fn move_object(&mut self, id: ObjectId, x: i32, y: i32) -> Result<(), GridError> {
        let to = self.index(x, y).ok_or_else(|| self.bounds_error(x, y))?;
        let (fx, fy) = self
            .object(id)
            .map(GameObject::position)
            .ok_or(GridError::StaleObject(id))?;
        if (fx, fy) == (x, y) {
            return Ok(());
        }
        if let Some(from) = self.index(fx, fy) {
            self.cells[from].objects.retain(|o| *o != id);
        }
        self.cells[to].objects.push(id);
        if let Some(object) = self.object_mut(id) {
            object.set_position(x, y);
        }
        Ok(())
    }

    /// Advance an object's rotation by a quarter turn.
    ///
    /// Returns the new rotation, or `None` for a stale handle.
    pub fn rotate_object(&mut self, id: ObjectId) -> Option<u32> {
        let object = self.object_mut(id)?;
        object.rotation = (object.rotation + 1) % 4;
        Some(object.rotation)
    }

    // -- queries ------------------------------------------------------------

    /// Whether `to` lies on a straight line from `from` with every cell after
    /// `from` (up to and including `to`) empty.
    pub fn has_clear_path(&self, from: (i32, i32), to: (i32, i32)) -> bool {
        if !self.in_bounds(from.0, from.1) || !self.in_bounds(to.0, to.1) {
            return false;
        }
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        if dx != 0 && dy != 0 {
            return false;
        }
        let (sx, sy) = (dx.signum(), dy.signum());
        let (mut x, mut y) = from;
        while (x, y) != to {
            x += sx;
            y += sy;
            if !self.is_empty_at(x, y) {
                return false;
            }
        }
        true
    }

    /// Every live object's stored position names the single cell that
    /// lists it.
    pub fn positions_consistent(&self) -> bool {
        let mut seen = 0;
        for cell in &self.cells {
            for &id in cell.objects() {
                match self.object(id) {
                    Some(o) if o.position() == (cell.x, cell.y) => seen += 1,
                    _ => return false,
                }
            }
        }
        seen == self.object_count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
