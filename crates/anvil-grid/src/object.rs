//! The entity model: a closed set of object kinds living on the grid.
//!
//! Every object is a [`GameObject`] carrying position, rotation, optional hit
//! points and an [`ObjectKind`]. Kind-specific state (containers, timers,
//! remembered directions) lives inside the variant. Capabilities and tags are
//! pure functions of the kind, so no caller ever probes an object for a
//! feature at runtime.

use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::container::{AdmissionRule, Container};
use crate::direction::Direction;
use crate::entity::ObjectId;
use crate::material::catalog::{BAR, GOLD};
use crate::material::{ComponentId, ElementId, Material};

/// Bank payout period.
pub const BANK_PAYOUT_MS: f64 = 10_000.0;
/// Healer and totem pulse period.
pub const HEAL_PULSE_MS: f64 = 5_000.0;
/// Shaman totem roll period.
pub const SHAMAN_PERIOD_MS: f64 = 3_000.0;

pub const AUTOMATON_CAPACITY: usize = 8;
pub const ASSEMBLER_CAPACITY: usize = 10;
pub const BANK_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Tags and hit points
// ---------------------------------------------------------------------------

/// Allegiance tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Dwarf,
    Goblin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: u32,
    pub max: u32,
}

impl HitPoints {
    pub fn new(current: u32, max: u32) -> Self {
        Self { current, max }
    }

    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Add `delta`, clamping to `0..=max`. Returns the new current value.
    pub fn apply(&mut self, delta: i32) -> u32 {
        let next = (self.current as i64 + delta as i64).clamp(0, self.max as i64);
        self.current = next as u32;
        self.current
    }

    pub fn is_dead(&self) -> bool {
        self.current == 0
    }
}

// ---------------------------------------------------------------------------
// ObjectKind
// ---------------------------------------------------------------------------

/// Every kind of object the grid can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Material(Material),
    Furnace,
    Anvil,
    Whetstone,
    Mule,
    Bucket,
    Bank {
        container: Container,
        timer_ms: f64,
    },
    Assembler {
        container: Container,
        output_direction: Direction,
    },
    Automaton {
        container: Container,
    },
    Redirector,
    Waiter,
    Emptier {
        exit_direction: Direction,
    },
    Filter {
        element: ElementId,
        component: ComponentId,
    },
    Warrior,
    Healer {
        timer_ms: f64,
    },
    Goblin,
    GoblinBrute,
    GoblinLooter,
    GoblinShaman {
        timer_ms: f64,
    },
    GoblinTotem {
        timer_ms: f64,
    },
}

impl ObjectKind {
    pub fn bank() -> Self {
        ObjectKind::Bank {
            container: Container::new(
                BANK_CAPACITY,
                AdmissionRule::Only {
                    element: GOLD,
                    component: BAR,
                },
            ),
            timer_ms: 0.0,
        }
    }

    pub fn assembler() -> Self {
        ObjectKind::Assembler {
            container: Container::new(
                ASSEMBLER_CAPACITY,
                AdmissionRule::Only {
                    element: GOLD,
                    component: BAR,
                },
            ),
            output_direction: Direction::North,
        }
    }

    pub fn automaton() -> Self {
        ObjectKind::Automaton {
            container: Container::new(AUTOMATON_CAPACITY, AdmissionRule::MatchTop),
        }
    }

    pub fn emptier() -> Self {
        ObjectKind::Emptier {
            exit_direction: Direction::North,
        }
    }

    /// A filter that lets gold bars through.
    pub fn filter() -> Self {
        ObjectKind::Filter {
            element: GOLD,
            component: BAR,
        }
    }

    pub fn healer() -> Self {
        ObjectKind::Healer {
            timer_ms: HEAL_PULSE_MS,
        }
    }

    pub fn goblin_shaman() -> Self {
        ObjectKind::GoblinShaman { timer_ms: 0.0 }
    }

    pub fn goblin_totem() -> Self {
        ObjectKind::GoblinTotem {
            timer_ms: HEAL_PULSE_MS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Material(_) => "Material",
            ObjectKind::Furnace => "Furnace",
            ObjectKind::Anvil => "Anvil",
            ObjectKind::Whetstone => "Whetstone",
            ObjectKind::Mule => "Mule",
            ObjectKind::Bucket => "Bucket",
            ObjectKind::Bank { .. } => "Bank",
            ObjectKind::Assembler { .. } => "Assembler",
            ObjectKind::Automaton { .. } => "Automaton",
            ObjectKind::Redirector => "Redirector",
            ObjectKind::Waiter => "Waiter",
            ObjectKind::Emptier { .. } => "Emptier",
            ObjectKind::Filter { .. } => "Filter",
            ObjectKind::Warrior => "Warrior",
            ObjectKind::Healer { .. } => "Healer",
            ObjectKind::Goblin => "Goblin",
            ObjectKind::GoblinBrute => "Brute",
            ObjectKind::GoblinLooter => "Looter",
            ObjectKind::GoblinShaman { .. } => "Shaman",
            ObjectKind::GoblinTotem { .. } => "Totem",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ObjectKind::Material(_) => "",
            ObjectKind::Furnace => "Turns ores into bars",
            ObjectKind::Anvil => "Turns bars into parts",
            ObjectKind::Whetstone => "Refines sword blades",
            ObjectKind::Mule => "Sells items at trade price",
            ObjectKind::Bucket => "Pushes whatever it bumps into",
            ObjectKind::Bank { .. } => "Invests gold bars",
            ObjectKind::Assembler { .. } => "Creates automatons from gold bars",
            ObjectKind::Automaton { .. } => "Carries a stack of identical materials",
            ObjectKind::Redirector => "Redirect automatons",
            ObjectKind::Waiter => "Automatons wait until full",
            ObjectKind::Emptier { .. } => "Automatons empty",
            ObjectKind::Filter { .. } => "Filter automatons",
            ObjectKind::Warrior => "Kills goblins",
            ObjectKind::Healer { .. } => "Heals dwarves",
            ObjectKind::Goblin => "Steals items",
            ObjectKind::GoblinBrute => "Steals objects",
            ObjectKind::GoblinLooter => "Looks rich",
            ObjectKind::GoblinShaman { .. } => "Creates totems",
            ObjectKind::GoblinTotem { .. } => "Heals goblins",
        }
    }

    /// Capabilities implied by the kind alone (hit points add
    /// [`Capabilities::DAMAGEABLE`] on the object).
    pub fn capabilities(&self) -> Capabilities {
        use Capabilities as C;
        match self {
            ObjectKind::Material(m) => {
                let mut caps = C::NONE;
                caps.set(C::MOVABLE, m.moves);
                caps.set(C::ROTATABLE, m.rotates);
                caps
            }
            ObjectKind::Furnace
            | ObjectKind::Anvil
            | ObjectKind::Whetstone
            | ObjectKind::Mule
            | ObjectKind::Bucket
            | ObjectKind::Warrior => C::MOVABLE,
            ObjectKind::Bank { .. }
            | ObjectKind::Assembler { .. }
            | ObjectKind::Automaton { .. } => C::MOVABLE | C::STORAGE,
            ObjectKind::Redirector | ObjectKind::Waiter | ObjectKind::Emptier { .. } => {
                C::MOVABLE | C::ROTATABLE | C::LOGIC
            }
            ObjectKind::Filter { .. } => C::MOVABLE | C::LOGIC,
            ObjectKind::Healer { .. }
            | ObjectKind::Goblin
            | ObjectKind::GoblinBrute
            | ObjectKind::GoblinLooter
            | ObjectKind::GoblinShaman { .. }
            | ObjectKind::GoblinTotem { .. } => C::NONE,
        }
    }

    pub fn tags(&self) -> &'static [Tag] {
        match self {
            ObjectKind::Warrior => &[Tag::Dwarf],
            ObjectKind::Goblin
            | ObjectKind::GoblinBrute
            | ObjectKind::GoblinLooter
            | ObjectKind::GoblinShaman { .. } => &[Tag::Goblin],
            _ => &[],
        }
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags().contains(&tag)
    }

    /// Hit points a freshly built object of this kind starts with.
    pub fn default_hit_points(&self) -> Option<HitPoints> {
        match self {
            ObjectKind::Warrior
            | ObjectKind::Goblin
            | ObjectKind::GoblinLooter
            | ObjectKind::GoblinShaman { .. }
            | ObjectKind::GoblinTotem { .. } => Some(HitPoints::full(1)),
            ObjectKind::GoblinBrute => Some(HitPoints::new(1, 3)),
            _ => None,
        }
    }

    pub fn as_material(&self) -> Option<&Material> {
        match self {
            ObjectKind::Material(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_automaton(&self) -> bool {
        matches!(self, ObjectKind::Automaton { .. })
    }

    pub fn container(&self) -> Option<&Container> {
        match self {
            ObjectKind::Bank { container, .. }
            | ObjectKind::Assembler { container, .. }
            | ObjectKind::Automaton { container } => Some(container),
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut Container> {
        match self {
            ObjectKind::Bank { container, .. }
            | ObjectKind::Assembler { container, .. }
            | ObjectKind::Automaton { container } => Some(container),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Everything needed to place a new object on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub kind: ObjectKind,
    pub rotation: u32,
    pub hp: Option<HitPoints>,
}

impl Blueprint {
    pub fn new(kind: ObjectKind) -> Self {
        let hp = kind.default_hit_points();
        Self {
            kind,
            rotation: 0,
            hp,
        }
    }

    pub fn facing(mut self, direction: Direction) -> Self {
        self.rotation = direction.rotation();
        self
    }

    pub fn rotated(mut self, rotation: u32) -> Self {
        self.rotation = rotation % 4;
        self
    }

    pub fn with_hit_points(mut self, hp: HitPoints) -> Self {
        self.hp = Some(hp);
        self
    }
}

impl From<ObjectKind> for Blueprint {
    fn from(kind: ObjectKind) -> Self {
        Blueprint::new(kind)
    }
}

impl From<Material> for Blueprint {
    fn from(material: Material) -> Self {
        Blueprint::new(ObjectKind::Material(material))
    }
}

// ---------------------------------------------------------------------------
// GameObject
// ---------------------------------------------------------------------------

/// An object placed on the grid.
///
/// Position is only ever written by the grid's mutators, which keep it in
/// step with the cell index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameObject {
    id: ObjectId,
    x: i32,
    y: i32,
    pub rotation: u32,
    pub hp: Option<HitPoints>,
    pub kind: ObjectKind,
}

impl GameObject {
    pub(crate) fn from_blueprint(id: ObjectId, blueprint: Blueprint, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            rotation: blueprint.rotation % 4,
            hp: blueprint.hp,
            kind: blueprint.kind,
        }
    }

    pub(crate) fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn facing(&self) -> Direction {
        Direction::from_rotation(self.rotation)
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    pub fn tags(&self) -> &'static [Tag] {
        self.kind.tags()
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.kind.has_tag(tag)
    }

    pub fn capabilities(&self) -> Capabilities {
        let mut caps = self.kind.capabilities();
        caps.set(Capabilities::DAMAGEABLE, self.hp.is_some());
        caps
    }

    pub fn can_be_moved(&self) -> bool {
        self.capabilities().contains(Capabilities::MOVABLE)
    }

    pub fn can_be_rotated(&self) -> bool {
        self.capabilities().contains(Capabilities::ROTATABLE)
    }

    pub fn as_material(&self) -> Option<&Material> {
        self.kind.as_material()
    }

    pub fn container(&self) -> Option<&Container> {
        self.kind.container()
    }
}
