use crate::input::spawn_stdin_reader;
use crate::output::JsonSink;
use go2_core::{Dispatcher, LineMode, SportApi};
use std::time::Duration;

/// JSON line server: one `{"action": ...}` per line in, one response per line out.
pub fn run<S: SportApi>(dispatcher: &mut Dispatcher<S>, poll: Duration) -> anyhow::Result<()> {
    tracing::info!("reading JSON commands from stdin");
    let mut sink = JsonSink::new(std::io::stdout());
    let lines = spawn_stdin_reader()?;
    dispatcher.serve(&lines, LineMode::Json, poll, &mut sink);
    tracing::info!("stdin closed or stop requested, exiting");
    Ok(())
}
