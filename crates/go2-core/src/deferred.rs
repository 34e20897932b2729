//! Deferred continuations.
//!
//! Some motions leave the robot resting in a posture that has exactly one
//! correct recovery. Instead of issuing it immediately, the dispatcher arms a
//! cell here and the recovery runs when the operator triggers it.

use crate::sport::Primitive;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuation {
    /// Robot is sitting; recovery is `RiseSit`.
    AwaitingRise,
    /// Robot is crouched with locked joints; recovery is `StandUp`.
    AwaitingStandUp,
}

impl Continuation {
    /// Resolution order when a trigger arrives. Rise comes first.
    pub const PRIORITY: [Continuation; 2] =
        [Continuation::AwaitingRise, Continuation::AwaitingStandUp];

    pub fn primitive(self) -> Primitive {
        match self {
            Continuation::AwaitingRise => Primitive::RiseSit,
            Continuation::AwaitingStandUp => Primitive::StandUp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Continuation::AwaitingRise => "awaiting_rise",
            Continuation::AwaitingStandUp => "awaiting_stand_up",
        }
    }
}

/// Two independent single-slot cells. There is no peek: a cell is only ever
/// observed by draining it.
#[derive(Debug, Default)]
pub struct DeferredStore {
    rise: AtomicBool,
    stand_up: AtomicBool,
}

impl DeferredStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, kind: Continuation) -> &AtomicBool {
        match kind {
            Continuation::AwaitingRise => &self.rise,
            Continuation::AwaitingStandUp => &self.stand_up,
        }
    }

    pub fn arm(&self, kind: Continuation) {
        self.cell(kind).store(true, Ordering::Release);
    }

    /// Return whether `kind` was armed and clear it in the same step.
    pub fn drain(&self, kind: Continuation) -> bool {
        self.cell(kind).swap(false, Ordering::AcqRel)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
