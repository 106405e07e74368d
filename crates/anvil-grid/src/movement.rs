//! Slide path computation.

use tracing::trace;

use crate::direction::Direction;
use crate::entity::ObjectId;
use crate::grid::Grid;
use crate::interaction::{can_accept, can_consume};

/// Where `id` ends up if slid in `direction`.
///
/// Walks one cell at a time (at most `max(columns, rows)` steps). Empty
/// cells are passed through. A cell where some occupant accepts the mover,
/// or the mover can consume some occupant, is entered and ends the walk.
/// Any other occupied cell, or the grid edge, stops the walk before it. The
/// result equals the start when the first neighbour is blocked.
///
/// Returns `None` only for a stale handle.
pub fn compute_slide_path(grid: &Grid, id: ObjectId, direction: Direction) -> Option<(i32, i32)> {
    let mover = grid.object(id)?;
    let (mut x, mut y) = mover.position();
    let max_steps = grid.columns().max(grid.rows());

    for _ in 0..max_steps {
        let (nx, ny) = direction.step(x, y);
        let Some(cell) = grid.cell(nx, ny) else {
            break;
        };
        if cell.is_empty() {
            (x, y) = (nx, ny);
            continue;
        }

        let occupants = || {
            cell.objects()
                .iter()
                .filter(|&&o| o != id)
                .filter_map(|&o| grid.object(o))
        };
        let accepted = occupants().any(|t| can_accept(grid, t, &mover.kind, direction));
        let consumed = !accepted && occupants().any(|t| can_consume(mover, t, direction));
        if accepted || consumed {
            (x, y) = (nx, ny);
        } else {
            trace!(%id, %direction, x = nx, y = ny, "slide blocked");
        }
        break;
    }

    Some((x, y))
}
