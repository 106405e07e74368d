//! Player input, already reduced by the UI to one of two gestures.

use anvil_grid::direction::Direction;
use anvil_grid::entity::ObjectId;
use serde::{Deserialize, Serialize};

use crate::action::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Turn the object a quarter turn clockwise.
    Rotate { object: ObjectId },
    /// Push the object as far as it goes along `direction`.
    Slide {
        object: ObjectId,
        direction: Direction,
    },
}

impl Intent {
    pub fn object(&self) -> ObjectId {
        match *self {
            Intent::Rotate { object } | Intent::Slide { object, .. } => object,
        }
    }

    pub(crate) fn into_action(self) -> Action {
        match self {
            Intent::Rotate { object } => Action::rotate(object),
            Intent::Slide { object, direction } => Action::slide(object, direction),
        }
    }
}
