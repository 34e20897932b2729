//! Line protocol: decoding `{"action":...}` lines and encoding responses.
//!
//! Decoding never fails loudly. Strict JSON is tried first; anything else is
//! scraped for `"key": value` pairs so that slightly malformed lines from
//! shell scripts still work. Numeric fields that do not parse are treated as
//! absent, which makes them read as `0.0`.

use crate::dispatch::Event;
use crate::registry::ActionId;
use crate::sport::{Status, Velocity};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty line")]
    Empty,

    #[error("no action")]
    NoAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub action: ActionId,
    fields: HashMap<String, f64>,
}

impl Command {
    pub fn new(action: ActionId) -> Self {
        Self {
            action,
            fields: HashMap::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied()
    }

    /// Raw, unclamped velocity; absent axes read as zero.
    pub fn velocity(&self) -> Velocity {
        Velocity::new(
            self.field("vx").unwrap_or(0.0),
            self.field("vy").unwrap_or(0.0),
            self.field("vyaw").unwrap_or(0.0),
        )
    }
}

pub fn decode_line(line: &str) -> Result<Command, DecodeError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DecodeError::Empty);
    }
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => decode_object(&map),
        _ => decode_scraped(line),
    }
}

fn decode_object(map: &Map<String, Value>) -> Result<Command, DecodeError> {
    let action = match map.get("action") {
        Some(Value::String(s)) if !s.trim().is_empty() => ActionId::parse(s),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(code) => ActionId::Code(code),
            None => ActionId::Name(n.to_string()),
        },
        _ => return Err(DecodeError::NoAction),
    };

    let mut command = Command::new(action);
    for (key, value) in map {
        if key == "action" {
            continue;
        }
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(n) = number {
            command.fields.insert(key.clone(), n);
        }
    }
    Ok(command)
}

static PAIR_RE: OnceLock<Regex> = OnceLock::new();

fn pair_re() -> &'static Regex {
    PAIR_RE.get_or_init(|| {
        Regex::new(r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*(?:"([^"]*)"|([-+0-9.eE]+))"#).unwrap()
    })
}

fn decode_scraped(line: &str) -> Result<Command, DecodeError> {
    let mut action = None;
    let mut fields = HashMap::new();

    for caps in pair_re().captures_iter(line) {
        let key = &caps[1];
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or("");
        if key == "action" {
            if action.is_none() && !raw.trim().is_empty() {
                action = Some(ActionId::parse(raw));
            }
        } else if let Ok(n) = raw.trim().parse::<f64>() {
            fields.entry(key.to_string()).or_insert(n);
        }
    }

    let action = action.ok_or(DecodeError::NoAction)?;
    Ok(Command { action, fields })
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vyaw: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub continuation: bool,
}

impl Response {
    pub fn ok(action: impl Into<String>) -> Self {
        Self {
            ok: true,
            action: Some(action.into()),
            error: None,
            status: None,
            vx: None,
            vy: None,
            vyaw: None,
            continuation: false,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            action: None,
            error: Some(error.into()),
            ..Self::ok("")
        }
    }

    /// Result of an actuation call; failures carry the raw status.
    pub fn from_status(action: impl Into<String>, status: Status) -> Self {
        let mut resp = Self::ok(action);
        if !status.is_ok() {
            resp.ok = false;
            resp.status = Some(status);
        }
        resp
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_velocity(mut self, v: Velocity) -> Self {
        self.vx = Some(v.vx);
        self.vy = Some(v.vy);
        self.vyaw = Some(v.vyaw);
        self
    }

    pub fn to_line(&self) -> String {
        // Every field is a plain scalar, so serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"ok":false}"#.to_string())
    }
}

/// The protocol line for a dispatcher event, if the event has one.
///
/// The safety pre-step and idle notifications are not echoed; every command
/// line still gets exactly one response.
pub fn response_for(event: &Event) -> Option<Response> {
    match event {
        Event::Completed {
            requested,
            status,
            velocity,
            ..
        } => {
            let resp = Response::from_status(requested.as_str(), *status);
            Some(match velocity {
                Some(v) => resp.with_velocity(*v),
                None => resp,
            })
        }
        Event::Continuation {
            primitive, status, ..
        } => {
            let mut resp = Response::from_status(primitive.as_str(), *status);
            resp.status = Some(*status);
            resp.continuation = true;
            Some(resp)
        }
        Event::Unknown { requested } => {
            Some(Response::error("unknown action").with_action(requested.as_str()))
        }
        Event::InvalidToken { token } => {
            Some(Response::error("invalid token").with_action(token.as_str()))
        }
        Event::Rejected { error } => Some(Response::error(error.to_string())),
        Event::Triggered => Some(Response::ok("go")),
        Event::Quit => Some(Response::ok("quit")),
        Event::Precondition { .. } | Event::AwaitingInput => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
