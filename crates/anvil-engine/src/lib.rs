//! Anvil Engine -- simulation context, clock and rules of the forge.
//!
//! This crate builds on [`anvil_grid`] to drive the game: a [`Simulation`]
//! owns the grid, the action queue, the economy and the RNG, and advances
//! them by frame deltas. Every observable change goes to an
//! [`EventJournal`](anvil_journal::EventJournal) for the renderer.
//!
//! # Quick Start
//!
//! ```
//! use anvil_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig { columns: 6, rows: 1, ..Default::default() });
//! let ore = sim.grid().materials()
//!     .first_match(&MaterialQuery::new().element(catalog::IRON).component(catalog::ORE))
//!     .unwrap();
//! let ore = sim.add_object(ore, 0, 0).unwrap();
//! sim.add_object(ObjectKind::Furnace, 4, 0).unwrap();
//!
//! assert!(sim.apply_intent(Intent::Slide { object: ore, direction: Direction::East }));
//! for _ in 0..20 {
//!     sim.update(16.0);
//! }
//! assert!(!sim.grid().is_alive(ore));
//! ```
//!
//! # Modules
//!
//! - [`action`]: action state machines and the FIFO queue.
//! - [`behaviour`]: per-kind reactions (accept, consume, bump, update, logic).
//! - [`config`]: [`SimConfig`](config::SimConfig) and its validation.
//! - [`economy`]: coins, swords and the shop.
//! - [`events`]: goblin raids.
//! - [`intent`]: player input.
//! - [`recipes`]: the recipe book and sword scoring.
//! - [`replay`]: recording and verifying runs.
//! - [`simulation`]: the context object and its frame update.
//! - [`upgrades`]: upgrades and the modifiers they write.

#![deny(unsafe_code)]

pub mod action;
pub mod behaviour;
pub mod config;
pub mod economy;
pub mod events;
pub mod intent;
pub mod recipes;
pub mod replay;
pub mod simulation;
pub mod upgrades;

pub use simulation::Simulation;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the grid crate for convenience.
pub use anvil_grid;

/// Re-export the journal crate for convenience.
pub use anvil_journal;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Grid(#[from] anvil_grid::GridError),

    #[error("replay initial state mismatch: expected {expected}, got {actual}")]
    ReplayInitialStateMismatch { expected: String, actual: String },

    #[error("replay frames out of order: frame {frame} recorded after frame {previous}")]
    ReplayTickOrder { previous: u64, frame: u64 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use anvil_grid::material::catalog;
    pub use anvil_grid::prelude::*;

    pub use anvil_journal::{EffectKind, EventJournal, JournalEntry, SimEvent};

    pub use crate::action::{Action, ActionQueue, Step};
    pub use crate::config::SimConfig;
    pub use crate::economy::{Cost, Economy, Shop, ShopItem};
    pub use crate::events::RaidState;
    pub use crate::intent::Intent;
    pub use crate::recipes::{calculate_reward, sword_score, RecipeBook, ScoreItem};
    pub use crate::replay::{
        replay, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder, ReplayResult,
    };
    pub use crate::simulation::Simulation;
    pub use crate::upgrades::{Modifiers, Upgrade};
    pub use crate::EngineError;
}
