use go2_core::protocol::response_for;
use go2_core::{Action, Event, Sink, TRIGGER_TOKEN};
use std::io::Write;

pub const SAFETY_NOTICE: &str = "[Safety] Test on flat ground with no people or obstacles nearby. \
Issue special motions only after the previous motion has finished.";

/// Lines shared by the menu and batch renderings.
fn common_line(event: &Event) -> Option<String> {
    match event {
        Event::Precondition { primitive, status } => {
            Some(format!("[PRE] {} => ret={status}", primitive.label()))
        }
        Event::Continuation {
            primitive, status, ..
        } => Some(format!("[TRIGGER] {} => ret={status}", primitive.label())),
        Event::Unknown { requested } => Some(format!("[WARN] unknown action code: {requested}")),
        Event::InvalidToken { token } => Some(format!("[WARN] not an action code: {token}")),
        Event::Rejected { error } => Some(format!("[WARN] {error}")),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

pub struct MenuSink<W: Write> {
    out: W,
    rows: Vec<Action>,
}

impl<W: Write> MenuSink<W> {
    pub fn new(out: W, rows: Vec<Action>) -> Self {
        Self { out, rows }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_menu(&mut self) -> std::io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "==== Go2 Motion (q = quit) ====")?;
        for action in &self.rows {
            writeln!(self.out, "{}. {} - {}", action.code, action.label(), action.note)?;
        }
        writeln!(self.out, "-------------------------------")?;
        writeln!(
            self.out,
            "[Trigger] from another terminal: kill -USR1 {}  |  here: {TRIGGER_TOKEN}",
            std::process::id()
        )?;
        writeln!(self.out, "===============================")?;
        write!(self.out, "> codes (space separated) or {TRIGGER_TOKEN}: ")?;
        self.out.flush()
    }

    fn write_event(&mut self, event: &Event) -> std::io::Result<()> {
        match event {
            Event::AwaitingInput => return self.print_menu(),
            Event::Completed { action, status, .. } => {
                if status.is_ok() {
                    writeln!(self.out, "[OK] #{} {}", action.code, action.label())?;
                } else {
                    writeln!(
                        self.out,
                        "[FAIL] #{} {} ret={status}",
                        action.code,
                        action.label()
                    )?;
                }
            }
            Event::Triggered => writeln!(self.out, "[TRIGGER] received")?,
            other => {
                if let Some(line) = common_line(other) {
                    writeln!(self.out, "{line}")?;
                }
            }
        }
        self.out.flush()
    }
}

impl<W: Write> Sink for MenuSink<W> {
    fn report(&mut self, event: &Event) {
        if let Err(e) = self.write_event(event) {
            tracing::warn!("failed to write output: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

pub struct BatchSink<W: Write> {
    out: W,
}

impl<W: Write> BatchSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &Event) -> std::io::Result<()> {
        match event {
            Event::Completed { action, status, .. } => {
                writeln!(self.out, "[RUN argv] id={} ret={status}", action.code)?
            }
            Event::Triggered => writeln!(self.out, "[TRIGGER] received")?,
            other => {
                if let Some(line) = common_line(other) {
                    writeln!(self.out, "{line}")?;
                }
            }
        }
        self.out.flush()
    }
}

impl<W: Write> Sink for BatchSink<W> {
    fn report(&mut self, event: &Event) {
        if let Err(e) = self.write_event(event) {
            tracing::warn!("failed to write output: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for JsonSink<W> {
    fn report(&mut self, event: &Event) {
        let Some(resp) = response_for(event) else {
            return;
        };
        let written = writeln!(self.out, "{}", resp.to_line()).and_then(|_| self.out.flush());
        if let Err(e) = written {
            tracing::warn!("failed to write response: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use go2_core::{Continuation, Primitive, Registry, Status};

    fn sit() -> Action {
        *Registry::standard().by_code(3).unwrap()
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn menu_lists_every_action_and_the_trigger() {
        let rows: Vec<Action> = Registry::standard().iter().copied().collect();
        let mut sink = MenuSink::new(Vec::new(), rows);
        sink.report(&Event::AwaitingInput);
        let out = text(sink.into_inner());
        assert!(out.contains("1. StandUp - "));
        assert!(out.contains("13. FrontJump - "));
        assert!(out.contains("kill -USR1"));
        assert!(out.contains("/go"));
    }

    #[test]
    fn menu_results() {
        let mut sink = MenuSink::new(Vec::new(), Vec::new());
        sink.report(&Event::Completed {
            requested: "3".into(),
            action: sit(),
            status: Status::OK,
            velocity: None,
        });
        sink.report(&Event::Completed {
            requested: "3".into(),
            action: sit(),
            status: Status(3104),
            velocity: None,
        });
        sink.report(&Event::Continuation {
            kind: Continuation::AwaitingRise,
            primitive: Primitive::RiseSit,
            status: Status::OK,
        });
        assert_eq!(
            text(sink.into_inner()),
            "[OK] #3 Sit\n[FAIL] #3 Sit ret=3104\n[TRIGGER] RiseSit => ret=0\n"
        );
    }

    #[test]
    fn batch_results() {
        let mut sink = BatchSink::new(Vec::new());
        sink.report(&Event::Completed {
            requested: "3".into(),
            action: sit(),
            status: Status::OK,
            velocity: None,
        });
        sink.report(&Event::InvalidToken {
            token: "abc".into(),
        });
        assert_eq!(
            text(sink.into_inner()),
            "[RUN argv] id=3 ret=0\n[WARN] not an action code: abc\n"
        );
    }

    #[test]
    fn json_lines() {
        let mut sink = JsonSink::new(Vec::new());
        sink.report(&Event::AwaitingInput);
        sink.report(&Event::Completed {
            requested: "sit".into(),
            action: sit(),
            status: Status::OK,
            velocity: None,
        });
        assert_eq!(text(sink.into_inner()), "{\"ok\":true,\"action\":\"sit\"}\n");
    }
}
