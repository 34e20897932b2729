use crate::output::{BatchSink, SAFETY_NOTICE};
use go2_core::{Dispatcher, SportApi};

/// Run the codes given on the command line, then exit.
pub fn run<S: SportApi>(dispatcher: &mut Dispatcher<S>, tokens: &[String]) -> anyhow::Result<()> {
    println!("{SAFETY_NOTICE}");
    let mut sink = BatchSink::new(std::io::stdout());
    dispatcher.run_batch(tokens, &mut sink);
    Ok(())
}
