//! Signal listener: SIGINT/SIGTERM request a stop, SIGUSR1 fires the trigger.
//!
//! Runs on its own thread with a current-thread tokio runtime. It only ever
//! flips [`ControlFlags`]; the dispatch thread does all the actuation.

use go2_core::ControlFlags;

#[cfg(unix)]
pub fn install(flags: ControlFlags) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // Register before returning so no signal is delivered to a default handler.
    let (mut interrupt, mut terminate, mut user1) = {
        let _guard = rt.enter();
        (
            signal(SignalKind::interrupt())?,
            signal(SignalKind::terminate())?,
            signal(SignalKind::user_defined1())?,
        )
    };

    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            rt.block_on(async move {
                loop {
                    tokio::select! {
                        Some(()) = interrupt.recv() => {
                            tracing::info!("SIGINT: stopping after the current command");
                            flags.request_stop();
                        }
                        Some(()) = terminate.recv() => {
                            tracing::info!("SIGTERM: stopping after the current command");
                            flags.request_stop();
                        }
                        Some(()) = user1.recv() => {
                            tracing::info!("SIGUSR1: trigger");
                            flags.trigger();
                        }
                        else => break,
                    }
                }
            })
        })?;
    Ok(())
}

#[cfg(not(unix))]
pub fn install(flags: ControlFlags) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            rt.block_on(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl-C: stopping after the current command");
                    flags.request_stop();
                }
            })
        })?;
    Ok(())
}
