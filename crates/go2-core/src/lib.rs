//! `go2-core` — dispatch and deferred-continuation state machine for the Go2
//! sport client.
//!
//! ```text
//! stdin line / argv code / SIGUSR1
//!     │
//!     ▼
//! protocol    ← decode `{"action":...}` lines and menu tokens
//!     │
//!     ▼
//! Dispatcher  ← registry lookup, safety precondition, arming, resolver
//!     │
//!     ▼
//! SportApi    ← opaque motion primitives returning a status code
//! ```
//!
//! The only state shared with other threads is [`ControlFlags`]: the trigger
//! signal and the stop flag. Everything else lives on the dispatch thread.

pub mod config;
pub mod deferred;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod sport;
pub mod transport;
pub mod trigger;

pub use config::{Config, ConfigWarning, Delays, WarnLevel};
pub use deferred::{Continuation, DeferredStore};
pub use dispatch::{Dispatcher, Event, LineMode, RunState, Sink, TRIGGER_TOKEN};
pub use error::{MotionError, Result};
pub use registry::{Action, ActionId, Registry};
pub use sport::{Motion, Primitive, SimSport, SportApi, Status};
pub use trigger::ControlFlags;
