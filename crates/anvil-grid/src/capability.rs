//! Capability bitset attached to every object kind.
//!
//! Capabilities are derived once from the object's variant (and for
//! materials, from the component flags) instead of being probed at the call
//! site. The UI asks [`Capabilities::MOVABLE`] / [`Capabilities::ROTATABLE`]
//! to decide gesture affordances; the logic tick asks for
//! [`Capabilities::LOGIC`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    /// The player (or another object) may slide it.
    pub const MOVABLE: Capabilities = Capabilities(1 << 0);
    /// The player may rotate it in place.
    pub const ROTATABLE: Capabilities = Capabilities(1 << 1);
    /// Owns a [`Container`](crate::container::Container).
    pub const STORAGE: Capabilities = Capabilities(1 << 2);
    /// Reacts to co-located automatons on the logic tick.
    pub const LOGIC: Capabilities = Capabilities(1 << 3);
    /// Carries hit points.
    pub const DAMAGEABLE: Capabilities = Capabilities(1 << 4);

    const NAMES: [(Capabilities, &'static str); 5] = [
        (Self::MOVABLE, "movable"),
        (Self::ROTATABLE, "rotatable"),
        (Self::STORAGE, "storage"),
        (Self::LOGIC, "logic"),
        (Self::DAMAGEABLE, "damageable"),
    ];

    /// `true` if every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Capabilities) -> Capabilities {
        Capabilities(self.0 | other.0)
    }

    /// Set or clear `other` depending on `on`.
    #[inline]
    pub fn set(&mut self, other: Capabilities, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        self.union(rhs)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Capabilities) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Capabilities({})", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_contains() {
        let caps = Capabilities::MOVABLE | Capabilities::LOGIC;
        assert!(caps.contains(Capabilities::MOVABLE));
        assert!(caps.contains(Capabilities::LOGIC));
        assert!(!caps.contains(Capabilities::ROTATABLE));
        assert!(caps.contains(Capabilities::MOVABLE | Capabilities::LOGIC));
        assert!(caps.contains(Capabilities::NONE));
    }

    #[test]
    fn set_toggles_bits() {
        let mut caps = Capabilities::NONE;
        caps.set(Capabilities::DAMAGEABLE, true);
        assert!(caps.contains(Capabilities::DAMAGEABLE));
        caps.set(Capabilities::DAMAGEABLE, false);
        assert!(caps.is_empty());
    }

    #[test]
    fn debug_lists_flag_names() {
        let caps = Capabilities::MOVABLE | Capabilities::STORAGE;
        assert_eq!(format!("{caps:?}"), "Capabilities(movable | storage)");
    }
}
