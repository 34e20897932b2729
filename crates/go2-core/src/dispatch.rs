//! The dispatch loop and continuation resolver.
//!
//! A [`Dispatcher`] owns the sport client, the action registry and the
//! deferred store, and shares only [`ControlFlags`] with the outside world.
//! Every surface (command-line codes, menu lines, JSON lines) funnels into
//! [`Dispatcher::run_action`], and the resolver runs at the top of every loop
//! iteration and after every action.
//!
//! Nothing here prints. Progress is reported as [`Event`]s to a [`Sink`]; the
//! binary decides how each surface renders them.

use crate::config::Delays;
use crate::deferred::{Continuation, DeferredStore};
use crate::protocol::{decode_line, DecodeError};
use crate::registry::{Action, ActionId, Precondition, Registry};
use crate::sport::{Motion, Primitive, SportApi, Status, Velocity};
use crate::trigger::ControlFlags;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// In-band trigger token for the menu and the command line.
pub const TRIGGER_TOKEN: &str = "/go";

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// `Running → Stopping → Stopped`. Stopping is entered by a quit command or
/// the stop flag; Stopped only once the current line has been fully handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopping,
    Stopped,
}

// ---------------------------------------------------------------------------
// Event / Sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The safety step issued before a guarded action.
    Precondition { primitive: Primitive, status: Status },
    /// A primary action returned from the sport client.
    Completed {
        requested: String,
        action: Action,
        status: Status,
        velocity: Option<Velocity>,
    },
    /// A deferred continuation fired by a trigger.
    Continuation {
        kind: Continuation,
        primitive: Primitive,
        status: Status,
    },
    Unknown { requested: String },
    /// A menu or argv token that is neither a code nor the trigger token.
    InvalidToken { token: String },
    Rejected { error: DecodeError },
    /// The in-band trigger was accepted.
    Triggered,
    Quit,
    /// The loop is idle and waiting for the next line.
    AwaitingInput,
}

pub trait Sink {
    fn report(&mut self, event: &Event);
}

impl Sink for Vec<Event> {
    fn report(&mut self, event: &Event) {
        self.push(event.clone());
    }
}

/// How lines read by [`Dispatcher::serve`] are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    /// Whitespace-separated codes and `/go`.
    Menu,
    /// One `{"action": ...}` object per line.
    Json,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<S> {
    registry: Registry,
    sport: S,
    store: DeferredStore,
    flags: ControlFlags,
    delays: Delays,
    stopped: bool,
}

impl<S: SportApi> Dispatcher<S> {
    pub fn new(sport: S, flags: ControlFlags, delays: Delays) -> Self {
        Self {
            registry: Registry::standard(),
            sport,
            store: DeferredStore::new(),
            flags,
            delays,
            stopped: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn sport(&self) -> &S {
        &self.sport
    }

    pub fn sport_mut(&mut self) -> &mut S {
        &mut self.sport
    }

    pub fn flags(&self) -> &ControlFlags {
        &self.flags
    }

    pub fn state(&self) -> RunState {
        if self.stopped {
            RunState::Stopped
        } else if self.flags.stop_requested() {
            RunState::Stopping
        } else {
            RunState::Running
        }
    }

    fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Enter the terminal state. Called once the current line is done.
    pub fn finish(&mut self) {
        self.flags.request_stop();
        self.stopped = true;
    }

    // -----------------------------------------------------------------------
    // Resolver
    // -----------------------------------------------------------------------

    /// Consume a pending trigger, if any, and fire armed continuations in
    /// priority order. Returns how many continuations ran.
    pub fn resolve(&mut self, sink: &mut impl Sink) -> usize {
        if !self.flags.take_trigger() {
            return 0;
        }

        let mut fired = 0;
        for kind in Continuation::PRIORITY {
            if !self.store.drain(kind) {
                continue;
            }
            let primitive = kind.primitive();
            let status = self.sport.execute(Motion::Basic(primitive));
            tracing::info!(
                continuation = kind.as_str(),
                status = status.code(),
                "trigger: {}",
                primitive.label()
            );
            sink.report(&Event::Continuation {
                kind,
                primitive,
                status,
            });
            settle(self.delays.continuation());
            fired += 1;
        }

        if fired == 0 {
            tracing::debug!("trigger absorbed, nothing pending");
        }
        fired
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Look up and execute one action. `velocity` is only used by actions
    /// that carry velocity limits; it is clamped before it is forwarded.
    ///
    /// Does not settle or resolve; the surface-level handlers do that.
    pub fn run_action(
        &mut self,
        id: &ActionId,
        velocity: Option<Velocity>,
        sink: &mut impl Sink,
    ) -> Option<Status> {
        let requested = id.to_string();
        let Some(action) = self.registry.lookup(id).copied() else {
            tracing::warn!(requested = %requested, "unknown action");
            sink.report(&Event::Unknown { requested });
            return None;
        };

        if let Some(Precondition::PreBalance) = action.precondition {
            // Issued regardless of its own outcome.
            let status = self.sport.execute(Motion::Basic(Primitive::BalanceStand));
            tracing::info!(status = status.code(), "pre-balance before {}", action.label());
            sink.report(&Event::Precondition {
                primitive: Primitive::BalanceStand,
                status,
            });
            settle(self.delays.pre_balance());
        }

        let (motion, used) = match action.limits {
            Some(limits) => {
                let v = limits.clamp(velocity.unwrap_or_default());
                (Motion::Move(v), Some(v))
            }
            None => (Motion::Basic(action.primitive), None),
        };
        let status = self.sport.execute(motion);

        if status.is_ok() {
            tracing::info!(code = action.code, action = action.name, "ok");
            if let Some(kind) = action.arms {
                self.store.arm(kind);
                tracing::debug!(continuation = kind.as_str(), "armed");
            }
        } else {
            tracing::warn!(
                code = action.code,
                action = action.name,
                status = status.code(),
                "actuation failed"
            );
        }

        sink.report(&Event::Completed {
            requested,
            action,
            status,
            velocity: used,
        });
        Some(status)
    }

    /// Arm the trigger from the same channel as ordinary commands.
    pub fn trigger_in_band(&mut self, sink: &mut impl Sink) {
        self.flags.trigger();
        sink.report(&Event::Triggered);
    }

    fn quit(&mut self, sink: &mut impl Sink) {
        self.flags.request_stop();
        sink.report(&Event::Quit);
    }

    // -----------------------------------------------------------------------
    // Surfaces
    // -----------------------------------------------------------------------

    /// Run command-line tokens in order, then one trailing resolver pass,
    /// then stop.
    pub fn run_batch<T: AsRef<str>>(&mut self, tokens: &[T], sink: &mut impl Sink) {
        for token in tokens {
            if !self.is_running() {
                break;
            }
            self.handle_token(token.as_ref(), self.delays.batch(), sink);
        }
        self.resolve(sink);
        self.finish();
    }

    /// One menu line: `q` quits, otherwise each whitespace-separated token is
    /// a code or `/go`. Remaining tokens are skipped once stopping.
    pub fn handle_menu_line(&mut self, line: &str, sink: &mut impl Sink) {
        let trimmed = line.trim();
        if is_quit(trimmed) {
            self.quit(sink);
            return;
        }
        for token in trimmed.split_whitespace() {
            if !self.is_running() {
                break;
            }
            self.handle_token(token, self.delays.command(), sink);
        }
    }

    fn handle_token(&mut self, token: &str, delay: Duration, sink: &mut impl Sink) {
        if token == TRIGGER_TOKEN {
            self.trigger_in_band(sink);
        } else {
            match token.parse::<i64>() {
                Ok(code) => {
                    if self.run_action(&ActionId::Code(code), None, sink).is_some() {
                        settle(delay);
                    }
                }
                Err(_) => {
                    tracing::warn!(token, "not an action code");
                    sink.report(&Event::InvalidToken {
                        token: token.to_string(),
                    });
                }
            }
        }
        self.resolve(sink);
    }

    /// One line of the JSON protocol. Blank lines are ignored.
    pub fn handle_json_line(&mut self, line: &str, sink: &mut impl Sink) {
        let command = match decode_line(line) {
            Ok(c) => c,
            Err(DecodeError::Empty) => return,
            Err(error) => {
                tracing::warn!(line, "{error}");
                sink.report(&Event::Rejected { error });
                return;
            }
        };

        if let ActionId::Name(name) = &command.action {
            let name = name.trim();
            if is_json_quit(name) {
                self.quit(sink);
                return;
            }
            if name == "go" || name == TRIGGER_TOKEN {
                self.trigger_in_band(sink);
                self.resolve(sink);
                return;
            }
        }

        self.run_action(&command.action, Some(command.velocity()), sink);
        self.resolve(sink);
    }

    pub fn handle_line(&mut self, mode: LineMode, line: &str, sink: &mut impl Sink) {
        match mode {
            LineMode::Menu => self.handle_menu_line(line, sink),
            LineMode::Json => self.handle_json_line(line, sink),
        }
    }

    /// Main loop over lines from a reader thread. Each poll timeout counts as
    /// one iteration, so a trigger or stop signal is seen while idle. Returns
    /// when stopping or when the sender hangs up (EOF).
    pub fn serve(
        &mut self,
        lines: &Receiver<String>,
        mode: LineMode,
        poll: Duration,
        sink: &mut impl Sink,
    ) {
        sink.report(&Event::AwaitingInput);
        loop {
            self.resolve(sink);
            if !self.is_running() {
                break;
            }
            match lines.recv_timeout(poll) {
                Ok(line) => {
                    self.handle_line(mode, &line, sink);
                    if self.is_running() {
                        sink.report(&Event::AwaitingInput);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("input closed");
                    break;
                }
            }
        }
        self.finish();
    }
}

fn is_quit(token: &str) -> bool {
    ["q", "quit", "exit"]
        .iter()
        .any(|q| token.eq_ignore_ascii_case(q))
}

/// JSON clients spell the quit out; a bare `q` is an unknown action there.
fn is_json_quit(name: &str) -> bool {
    name.eq_ignore_ascii_case("quit") || name.eq_ignore_ascii_case("exit")
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
