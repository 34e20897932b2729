//! The fixed action table.
//!
//! One `Vec<Action>` with two indices over it: normalized name (plus a few
//! aliases) and numeric menu code. The menu and the line protocol therefore
//! always agree on what an identifier means.

use crate::deferred::Continuation;
use crate::sport::{Primitive, Velocity};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ActionId
// ---------------------------------------------------------------------------

/// How an input surface names an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionId {
    Name(String),
    Code(i64),
}

impl ActionId {
    /// All-digit tokens (optionally signed) are codes, anything else is a name.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.parse::<i64>() {
            Ok(code) => ActionId::Code(code),
            Err(_) => ActionId::Name(token.to_string()),
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::Name(name) => f.write_str(name),
            ActionId::Code(code) => write!(f, "{code}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Mandatory step issued before a kinematically risky primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Unlocked balance stand followed by the configured settling delay.
    PreBalance,
}

/// Safe range for the velocity command. `vy` has no limit because it is
/// never forwarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityLimits {
    pub vx: f64,
    pub vyaw: f64,
}

impl VelocityLimits {
    pub const DEFAULT: VelocityLimits = VelocityLimits { vx: 1.0, vyaw: 2.0 };

    /// Clamp into range, silently. NaN becomes 0.0 and `vy` is always 0.0.
    pub fn clamp(&self, raw: Velocity) -> Velocity {
        Velocity {
            vx: clamp_axis(raw.vx, self.vx),
            vy: 0.0,
            vyaw: clamp_axis(raw.vyaw, self.vyaw),
        }
    }
}

fn clamp_axis(value: f64, limit: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-limit, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub code: i64,
    pub name: &'static str,
    pub note: &'static str,
    pub primitive: Primitive,
    pub precondition: Option<Precondition>,
    pub arms: Option<Continuation>,
    pub limits: Option<VelocityLimits>,
}

impl Action {
    fn new(code: i64, primitive: Primitive, note: &'static str) -> Self {
        Self {
            code,
            name: primitive.as_str(),
            note,
            primitive,
            precondition: None,
            arms: None,
            limits: None,
        }
    }

    fn arms(mut self, kind: Continuation) -> Self {
        self.arms = Some(kind);
        self
    }

    fn precondition(mut self, pre: Precondition) -> Self {
        self.precondition = Some(pre);
        self
    }

    fn limits(mut self, limits: VelocityLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn label(&self) -> &'static str {
        self.primitive.label()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Extra names accepted by the line protocol.
const ALIASES: &[(&str, &str)] = &[("stand", "rise_sit"), ("bow", "scrape"), ("stop", "stop_move")];

pub struct Registry {
    actions: Vec<Action>,
    by_name: HashMap<String, usize>,
    by_code: HashMap<i64, usize>,
}

/// Case-insensitive, ignoring `_` and `-`, so `StandUp` and `stand_up` match.
fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl Registry {
    pub fn new(actions: Vec<Action>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_code = HashMap::new();
        for (i, action) in actions.iter().enumerate() {
            by_name.insert(normalize(action.name), i);
            by_code.insert(action.code, i);
        }
        for (alias, target) in ALIASES {
            if let Some(&i) = by_name.get(&normalize(target)) {
                by_name.insert(normalize(alias), i);
            }
        }
        Self {
            actions,
            by_name,
            by_code,
        }
    }

    /// The Go2 motion table.
    pub fn standard() -> Self {
        use Primitive::*;
        Self::new(vec![
            Action::new(1, StandUp, "locked-joint stand"),
            Action::new(2, StandDown, "locked-joint crouch (trigger: StandUp)")
                .arms(Continuation::AwaitingStandUp),
            Action::new(3, Sit, "sit (trigger: RiseSit)").arms(Continuation::AwaitingRise),
            Action::new(4, RiseSit, "recover from sitting"),
            Action::new(5, BalanceStand, "unlocked balance stand"),
            Action::new(6, RecoveryStand, "recover from a fall or crouch"),
            Action::new(7, StopMove, "stop current motion and reset parameters"),
            Action::new(8, Hello, "wave hello"),
            Action::new(9, Stretch, "stretch"),
            Action::new(10, Content, "happy"),
            Action::new(11, Heart, "front-paw heart"),
            Action::new(12, Scrape, "bow"),
            Action::new(13, FrontJump, "jump forward (balance stand first)")
                .precondition(Precondition::PreBalance),
            Action::new(14, Move, "velocity command (zero from the menu)")
                .limits(VelocityLimits::DEFAULT),
        ])
    }

    pub fn lookup(&self, id: &ActionId) -> Option<&Action> {
        match id {
            ActionId::Name(name) => self.find(name),
            ActionId::Code(code) => self.by_code(*code),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Action> {
        self.by_name.get(&normalize(name)).map(|&i| &self.actions[i])
    }

    pub fn by_code(&self, code: i64) -> Option<&Action> {
        self.by_code.get(&code).map(|&i| &self.actions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
