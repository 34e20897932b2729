use crate::input::spawn_stdin_reader;
use crate::output::{MenuSink, SAFETY_NOTICE};
use go2_core::{Dispatcher, LineMode, SportApi};
use std::time::Duration;

pub fn run<S: SportApi>(dispatcher: &mut Dispatcher<S>, poll: Duration) -> anyhow::Result<()> {
    println!("{SAFETY_NOTICE}");
    let rows = dispatcher.registry().iter().copied().collect();
    let mut sink = MenuSink::new(std::io::stdout(), rows);
    let lines = spawn_stdin_reader()?;

    dispatcher.serve(&lines, LineMode::Menu, poll, &mut sink);

    println!();
    println!("[Done] exiting.");
    Ok(())
}
