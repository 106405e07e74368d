//! Deterministic replay with input recording and checkpoint verification.
//!
//! A run is fully determined by its [`SimConfig`] (which carries the RNG
//! seed), the frame deltas and the intents applied before each frame. The
//! [`ReplayRecorder`] captures those plus periodic state hash checkpoints
//! into a [`ReplayLog`]; [`replay`] feeds the log back into a fresh
//! simulation and reports the first checkpoint whose hash differs.
//!
//! # Recording
//!
//! ```
//! use anvil_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default());
//! let mut recorder = ReplayRecorder::new(&sim, 10);
//! for _ in 0..30 {
//!     recorder.record_frame(sim.frame(), 16.0, &[], Some(sim.state_hash()));
//!     sim.update(16.0);
//! }
//! let log = recorder.finish();
//!
//! let mut fresh = Simulation::new(log.config.clone());
//! let result = replay(&mut fresh, &log).unwrap();
//! assert!(result.completed);
//! assert!(result.first_divergence.is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::intent::Intent;
use crate::simulation::Simulation;
use crate::EngineError;

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// A complete recording: starting conditions plus the ordered frames and
/// checkpoints. Serializable to JSON for fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub seed: u64,
    pub config: SimConfig,
    /// State hash of the simulation when recording began.
    pub initial_hash: String,
    pub total_frames: u64,
    pub entries: Vec<ReplayEntry>,
}

// ---------------------------------------------------------------------------
// ReplayEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// One frame: the intents applied before it and its delta.
    Frame {
        frame: u64,
        dt_ms: f64,
        intents: Vec<Intent>,
    },
    /// State hash taken before `frame` ran (after nothing else).
    Checkpoint { frame: u64, state_hash: String },
}

// ---------------------------------------------------------------------------
// ReplayResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Whether every recorded frame ran without a divergence.
    pub completed: bool,
    pub frames_replayed: u64,
    /// `None` if every checkpoint matched.
    pub first_divergence: Option<ReplayDivergence>,
}

/// A checkpoint whose hash did not match on replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub frame: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Records a run into a [`ReplayLog`].
///
/// Call [`record_frame`](Self::record_frame) before each
/// [`Simulation::update`], with the intents about to be applied. Frames
/// must be recorded in strictly increasing order.
#[derive(Debug)]
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many frames; 0 checkpoints whenever a hash is
    /// supplied.
    checkpoint_interval: u64,
    last_frame: Option<u64>,
}

impl ReplayRecorder {
    pub fn new(sim: &Simulation, checkpoint_interval: u64) -> Self {
        let config = sim.config().clone();
        Self {
            log: ReplayLog {
                seed: config.seed,
                config,
                initial_hash: sim.state_hash(),
                total_frames: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            last_frame: None,
        }
    }

    /// Record one frame.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is not greater than the previously recorded frame.
    pub fn record_frame(
        &mut self,
        frame: u64,
        dt_ms: f64,
        intents: &[Intent],
        state_hash: Option<String>,
    ) {
        if let Some(previous) = self.last_frame {
            assert!(
                frame > previous,
                "ReplayRecorder::record_frame: frame {frame} recorded after frame {previous}"
            );
        }
        self.last_frame = Some(frame);
        self.log.total_frames += 1;

        if let Some(state_hash) = state_hash {
            if self.checkpoint_interval == 0 || frame % self.checkpoint_interval == 0 {
                self.log
                    .entries
                    .push(ReplayEntry::Checkpoint { frame, state_hash });
            }
        }
        self.log.entries.push(ReplayEntry::Frame {
            frame,
            dt_ms,
            intents: intents.to_vec(),
        });
    }

    pub fn finish(self) -> ReplayLog {
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Re-run `log` on `sim`, which must be in the state recording started from
/// (normally `Simulation::new(log.config.clone())`).
///
/// Each checkpoint is compared before its frame runs; replay stops at the
/// first divergence.
///
/// # Errors
///
/// The log is validated before `sim` is touched: frames or checkpoints out
/// of order give [`EngineError::ReplayTickOrder`], and a starting state that
/// does not hash to `initial_hash` gives
/// [`EngineError::ReplayInitialStateMismatch`].
pub fn replay(sim: &mut Simulation, log: &ReplayLog) -> Result<ReplayResult, EngineError> {
    let mut frames = Vec::new();
    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();
    let mut last_frame: Option<u64> = None;
    let mut last_checkpoint: Option<u64> = None;

    for entry in &log.entries {
        let (last, frame) = match entry {
            ReplayEntry::Frame { frame, .. } => (&mut last_frame, *frame),
            ReplayEntry::Checkpoint { frame, .. } => (&mut last_checkpoint, *frame),
        };
        if let Some(previous) = *last {
            if frame <= previous {
                return Err(EngineError::ReplayTickOrder { previous, frame });
            }
        }
        *last = Some(frame);

        match entry {
            ReplayEntry::Frame {
                frame,
                dt_ms,
                intents,
            } => frames.push((*frame, *dt_ms, intents)),
            ReplayEntry::Checkpoint { frame, state_hash } => {
                checkpoints.insert(*frame, state_hash);
            }
        }
    }

    let actual = sim.state_hash();
    if actual != log.initial_hash {
        return Err(EngineError::ReplayInitialStateMismatch {
            expected: log.initial_hash.clone(),
            actual,
        });
    }

    let mut frames_replayed = 0;
    for (frame, dt_ms, intents) in frames {
        if let Some(&expected) = checkpoints.get(&frame) {
            let actual_hash = sim.state_hash();
            if actual_hash != expected {
                warn!(frame, "replay diverged");
                return Ok(ReplayResult {
                    completed: false,
                    frames_replayed,
                    first_divergence: Some(ReplayDivergence {
                        frame,
                        expected_hash: expected.to_owned(),
                        actual_hash,
                    }),
                });
            }
        }
        for &intent in intents {
            sim.apply_intent(intent);
        }
        sim.update(dt_ms);
        frames_replayed += 1;
    }

    debug!(frames_replayed, "replay complete");
    Ok(ReplayResult {
        completed: true,
        frames_replayed,
        first_divergence: None,
    })
}
