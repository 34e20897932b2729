//! The actuation-service seam.
//!
//! [`SportApi`] is the only way the dispatcher touches the robot. Every call is
//! synchronous and returns a raw status code; `0` means the service accepted
//! and completed the motion. [`SimSport`] is the bench backend: it records
//! what it was asked to do and answers with configurable status codes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Primitive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    StandUp,
    StandDown,
    Sit,
    RiseSit,
    BalanceStand,
    RecoveryStand,
    StopMove,
    Hello,
    Stretch,
    Content,
    Heart,
    Scrape,
    FrontJump,
    Move,
}

impl Primitive {
    pub fn all() -> &'static [Primitive] {
        &[
            Primitive::StandUp,
            Primitive::StandDown,
            Primitive::Sit,
            Primitive::RiseSit,
            Primitive::BalanceStand,
            Primitive::RecoveryStand,
            Primitive::StopMove,
            Primitive::Hello,
            Primitive::Stretch,
            Primitive::Content,
            Primitive::Heart,
            Primitive::Scrape,
            Primitive::FrontJump,
            Primitive::Move,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::StandUp => "stand_up",
            Primitive::StandDown => "stand_down",
            Primitive::Sit => "sit",
            Primitive::RiseSit => "rise_sit",
            Primitive::BalanceStand => "balance_stand",
            Primitive::RecoveryStand => "recovery_stand",
            Primitive::StopMove => "stop_move",
            Primitive::Hello => "hello",
            Primitive::Stretch => "stretch",
            Primitive::Content => "content",
            Primitive::Heart => "heart",
            Primitive::Scrape => "scrape",
            Primitive::FrontJump => "front_jump",
            Primitive::Move => "move",
        }
    }

    /// The sport client's own method name, used in human-facing output.
    pub fn label(self) -> &'static str {
        match self {
            Primitive::StandUp => "StandUp",
            Primitive::StandDown => "StandDown",
            Primitive::Sit => "Sit",
            Primitive::RiseSit => "RiseSit",
            Primitive::BalanceStand => "BalanceStand",
            Primitive::RecoveryStand => "RecoveryStand",
            Primitive::StopMove => "StopMove",
            Primitive::Hello => "Hello",
            Primitive::Stretch => "Stretch",
            Primitive::Content => "Content",
            Primitive::Heart => "Heart",
            Primitive::Scrape => "Scrape",
            Primitive::FrontJump => "FrontJump",
            Primitive::Move => "Move",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// Planar velocity in the sport client's native units (m/s, rad/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub vyaw: f64,
}

impl Velocity {
    pub fn new(vx: f64, vy: f64, vyaw: f64) -> Self {
        Self { vx, vy, vyaw }
    }
}

/// One call into the actuation service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    Basic(Primitive),
    Move(Velocity),
}

impl Motion {
    pub fn primitive(&self) -> Primitive {
        match self {
            Motion::Basic(p) => *p,
            Motion::Move(_) => Primitive::Move,
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Status(pub i32);

impl Status {
    pub const OK: Status = Status(0);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SportApi
// ---------------------------------------------------------------------------

pub trait SportApi {
    /// Upper bound the service may take to answer a single call.
    fn set_timeout(&mut self, timeout: Duration);

    fn init(&mut self);

    fn execute(&mut self, motion: Motion) -> Status;
}

// ---------------------------------------------------------------------------
// SimSport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SimSport {
    failures: HashMap<Primitive, i32>,
    history: Vec<Motion>,
    timeout: Duration,
    initialized: bool,
}

impl SimSport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `primitive` with `code` instead of success.
    pub fn with_failure(mut self, primitive: Primitive, code: i32) -> Self {
        self.failures.insert(primitive, code);
        self
    }

    pub fn set_failure(&mut self, primitive: Primitive, code: i32) {
        self.failures.insert(primitive, code);
    }

    pub fn clear_failure(&mut self, primitive: Primitive) {
        self.failures.remove(&primitive);
    }

    pub fn history(&self) -> &[Motion] {
        &self.history
    }

    /// Primitives called so far, in order.
    pub fn primitives(&self) -> Vec<Primitive> {
        self.history.iter().map(Motion::primitive).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl SportApi for SimSport {
    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn init(&mut self) {
        self.initialized = true;
    }

    fn execute(&mut self, motion: Motion) -> Status {
        self.history.push(motion);
        let status = Status(
            self.failures
                .get(&motion.primitive())
                .copied()
                .unwrap_or(0),
        );
        match motion {
            Motion::Move(v) => tracing::debug!(
                vx = v.vx,
                vy = v.vy,
                vyaw = v.vyaw,
                status = status.code(),
                "sim: Move"
            ),
            Motion::Basic(p) => {
                tracing::debug!(status = status.code(), "sim: {}", p.label())
            }
        }
        status
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_records_calls_in_order() {
        let mut sim = SimSport::new();
        sim.execute(Motion::Basic(Primitive::Hello));
        sim.execute(Motion::Move(Velocity::new(0.5, 0.0, 0.1)));
        assert_eq!(sim.primitives(), vec![Primitive::Hello, Primitive::Move]);
    }

    #[test]
    fn sim_returns_configured_failure() {
        let mut sim = SimSport::new().with_failure(Primitive::Sit, 3104);
        assert_eq!(sim.execute(Motion::Basic(Primitive::Sit)), Status(3104));
        assert!(sim.execute(Motion::Basic(Primitive::Hello)).is_ok());

        sim.clear_failure(Primitive::Sit);
        assert!(sim.execute(Motion::Basic(Primitive::Sit)).is_ok());
    }

    #[test]
    fn primitive_names_are_unique() {
        let mut names: Vec<_> = Primitive::all().iter().map(|p| p.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Primitive::all().len());
    }
}
