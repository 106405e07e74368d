//! Anvil Grid -- the tile-grid data model and its pure rules.
//!
//! A fixed `columns × rows` [`Grid`](grid::Grid) owns every object placed on
//! it. Objects are addressed by generational [`ObjectId`](entity::ObjectId)s
//! so that work still holding a removed object's handle degrades to a no-op.
//! On top of the grid sit the rules that never mutate state on their own:
//! the accept/consume predicates, slide path computation, and recipe
//! matching over crafting streams. The simulation context that drives
//! actions and reactions lives in `anvil-engine`.
//!
//! # Quick Start
//!
//! ```
//! use anvil_grid::prelude::*;
//! use anvil_grid::material::catalog::{IRON, ORE};
//!
//! let mut grid = Grid::new(6, 1, MaterialRegistry::standard());
//! let ore = grid
//!     .materials()
//!     .first_match(&MaterialQuery::new().element(IRON).component(ORE))
//!     .unwrap();
//! let id = grid.add_object(ore, 0, 0).unwrap();
//! grid.add_object(ObjectKind::Furnace, 4, 0).unwrap();
//!
//! // The ore slides east until the furnace takes it.
//! assert_eq!(compute_slide_path(&grid, id, Direction::East), Some((4, 0)));
//! ```

#![deny(unsafe_code)]

pub mod capability;
pub mod container;
pub mod crafting;
pub mod direction;
pub mod entity;
pub mod grid;
pub mod interaction;
pub mod material;
pub mod movement;
pub mod object;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by checked grid mutators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The coordinate lies outside the grid.
    #[error("cell ({x}, {y}) is outside the {columns}x{rows} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        columns: i32,
        rows: i32,
    },

    /// The handle refers to an object that has been removed.
    #[error("object {0} is no longer on the grid")]
    StaleObject(entity::ObjectId),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::capability::Capabilities;
    pub use crate::container::{AdmissionRule, Container};
    pub use crate::crafting::{Combinator, Craft, CraftingStream, Recipe};
    pub use crate::direction::Direction;
    pub use crate::entity::ObjectId;
    pub use crate::grid::{Cell, Grid};
    pub use crate::interaction::{can_accept, can_consume, cell_accepts};
    pub use crate::material::{
        ComponentId, ElementId, Material, MaterialQuery, MaterialRegistry, SetBonusId, Symmetry,
        VariantId,
    };
    pub use crate::movement::compute_slide_path;
    pub use crate::object::{Blueprint, GameObject, HitPoints, ObjectKind, Tag};
    pub use crate::GridError;
}
