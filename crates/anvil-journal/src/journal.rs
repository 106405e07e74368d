//! Event journal handed to the renderer.
//!
//! The simulation never talks to a renderer directly. Every observable
//! change (an object appearing, sliding, turning, losing hit points, a craft
//! paying out, a request for a particle burst) is appended to an
//! [`EventJournal`] as a [`SimEvent`]. The presentation layer calls
//! [`EventJournal::drain`] once per frame and animates what it finds.
//!
//! Entries carry the frame they were recorded in and a monotonically
//! increasing sequence number, so a consumer that falls behind can still
//! replay them in order.
//!
//! # Example
//!
//! ```
//! use anvil_journal::journal::{EventJournal, SimEvent};
//! use anvil_grid::entity::ObjectId;
//!
//! let mut journal = EventJournal::new();
//! let id = ObjectId::new(0, 0);
//!
//! journal.begin_frame(1);
//! journal.record(SimEvent::Spawned { object: id, name: "Furnace".to_owned(), x: 2, y: 3 });
//! journal.record(SimEvent::Rotated { object: id, rotation: 1 });
//!
//! assert_eq!(journal.events_for_object(id).count(), 2);
//! let frame = journal.drain();
//! assert_eq!(frame.len(), 2);
//! assert!(journal.is_empty());
//! ```

use std::collections::VecDeque;

use anvil_grid::entity::ObjectId;
use anvil_grid::material::Material;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimEvent
// ---------------------------------------------------------------------------

/// Particle effects the renderer may play at a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Smoke,
    Sparks,
    Coins,
    Blood,
    Heal,
}

/// Something the presentation layer should know about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A new object was placed on the grid.
    Spawned {
        object: ObjectId,
        name: String,
        x: i32,
        y: i32,
    },
    /// An object slid from one cell to another; the renderer tweens over
    /// `duration_ms`.
    Moved {
        object: ObjectId,
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: f64,
    },
    Rotated {
        object: ObjectId,
        rotation: u32,
    },
    /// An object left the grid (eaten, crafted, killed, sold).
    Removed {
        object: ObjectId,
        x: i32,
        y: i32,
    },
    /// A material went into a storage object's container.
    Stored {
        container: ObjectId,
        material: Material,
        len: usize,
    },
    HitPointsChanged {
        object: ObjectId,
        current: u32,
        max: u32,
    },
    /// A recipe fired over `cells`.
    Crafted {
        recipe: String,
        cells: Vec<(i32, i32)>,
        reward: u64,
        notes: Vec<String>,
    },
    /// A material was sold for coins.
    Sold {
        object: ObjectId,
        coins: u64,
    },
    Purchased {
        item: String,
        object: ObjectId,
        coins: u64,
        swords: u64,
    },
    UpgradeApplied {
        upgrade: String,
    },
    RaidStarted {
        hostiles: u32,
    },
    RaidEnded,
    /// Snap the object's sprite back to its logical position.
    Synced {
        object: ObjectId,
    },
    Effect {
        kind: EffectKind,
        x: i32,
        y: i32,
    },
}

impl SimEvent {
    /// The object this event is about, if it names exactly one.
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            SimEvent::Spawned { object, .. }
            | SimEvent::Moved { object, .. }
            | SimEvent::Rotated { object, .. }
            | SimEvent::Removed { object, .. }
            | SimEvent::HitPointsChanged { object, .. }
            | SimEvent::Sold { object, .. }
            | SimEvent::Purchased { object, .. }
            | SimEvent::Synced { object } => Some(*object),
            SimEvent::Stored { container, .. } => Some(*container),
            SimEvent::Crafted { .. }
            | SimEvent::UpgradeApplied { .. }
            | SimEvent::RaidStarted { .. }
            | SimEvent::RaidEnded
            | SimEvent::Effect { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// JournalEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Simulation frame during which the event happened.
    pub frame: u64,
    /// Position in the overall stream, never reused.
    pub sequence: u64,
    pub event: SimEvent,
}

// ---------------------------------------------------------------------------
// EventJournal
// ---------------------------------------------------------------------------

/// Pending events awaiting the renderer.
///
/// By default the journal grows until drained. Headless runs that never
/// drain can bound it with [`with_max_entries`](Self::with_max_entries); the
/// oldest entries are then dropped first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventJournal {
    entries: VecDeque<JournalEntry>,
    frame: u64,
    next_sequence: u64,
    max_entries: Option<usize>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal that keeps at most `max_entries` undrained entries.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    /// Stamp subsequent entries with `frame`.
    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn record(&mut self, event: SimEvent) {
        self.entries.push_back(JournalEntry {
            frame: self.frame,
            sequence: self.next_sequence,
            event,
        });
        self.next_sequence += 1;
        if let Some(max) = self.max_entries {
            while self.entries.len() > max {
                self.entries.pop_front();
            }
        }
    }

    /// Hand every pending entry to the caller, oldest first.
    pub fn drain(&mut self) -> Vec<JournalEntry> {
        self.entries.drain(..).collect()
    }

    /// Drop pending entries without reading them. Sequence numbers keep
    /// counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    pub fn events_for_object(&self, object: ObjectId) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(move |e| e.event.object() == Some(object))
    }

    /// Pending craft events.
    pub fn crafts(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.event, SimEvent::Crafted { .. }))
    }

    /// Pending entries as a JSON array, for out-of-process consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
