mod cmd;
mod input;
mod output;
mod signals;

use anyhow::Context;
use clap::Parser;
use go2_core::{transport, Config, ControlFlags, Dispatcher, MotionError, WarnLevel};
use std::path::PathBuf;

/// Exit code when the link to the sport service cannot be brought up.
const EXIT_TRANSPORT: i32 = 10;
/// Exit code for every other failure.
const EXIT_INTERNAL: i32 = 11;

#[derive(Parser)]
#[command(
    name = "go2-motion",
    about = "Drive Go2 sport motions from the menu, the command line, or JSON lines on stdin",
    version
)]
struct Cli {
    /// Network interface the robot is attached to (default from config, else eth0)
    iface: Option<String>,

    /// Action codes to run once, in order, before exiting (`/go` fires the trigger)
    actions: Vec<String>,

    /// Read `{"action": ...}` lines on stdin and answer with JSON lines
    #[arg(long, short = 'j')]
    json: bool,

    /// YAML config file
    #[arg(long, env = "GO2_CONFIG")]
    config: Option<PathBuf>,

    /// Make the simulated client fail an action: NAME or NAME=CODE
    #[arg(long = "sim-fail", value_name = "ACTION[=CODE]")]
    sim_fail: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.json && cli.actions.is_empty() {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    let transport = err.chain().any(|cause| {
        cause
            .downcast_ref::<MotionError>()
            .is_some_and(MotionError::is_transport)
    });
    if transport {
        EXIT_TRANSPORT
    } else {
        EXIT_INTERNAL
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    for (name, code) in parse_sim_failures(&cli.sim_fail)? {
        config.sim.fail.insert(name, code);
    }
    for warning in config.validate() {
        match warning.level {
            WarnLevel::Warning => tracing::warn!("config: {}", warning.message),
            WarnLevel::Error => tracing::error!("config: {}", warning.message),
        }
    }

    let iface = cli.iface.unwrap_or_else(|| config.interface.clone());
    let sport = transport::connect(&iface, &config)
        .with_context(|| format!("failed to initialize sport client on '{iface}'"))?;

    let flags = ControlFlags::new();
    signals::install(flags.clone()).context("failed to install signal handlers")?;

    let mut dispatcher = Dispatcher::new(sport, flags, config.delays.clone());
    if !cli.actions.is_empty() {
        cmd::batch::run(&mut dispatcher, &cli.actions)
    } else if cli.json {
        cmd::serve::run(&mut dispatcher, config.poll_interval())
    } else {
        cmd::menu::run(&mut dispatcher, config.poll_interval())
    }
}

/// `sit` fails with -1, `sit=3104` with 3104.
fn parse_sim_failures(specs: &[String]) -> anyhow::Result<Vec<(String, i32)>> {
    specs
        .iter()
        .map(|spec| match spec.split_once('=') {
            Some((name, code)) => {
                let code = code
                    .trim()
                    .parse::<i32>()
                    .with_context(|| format!("invalid status code in --sim-fail '{spec}'"))?;
                Ok((name.trim().to_string(), code))
            }
            None => Ok((spec.trim().to_string(), -1)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_fail_specs() {
        let parsed =
            parse_sim_failures(&["sit".to_string(), "front_jump=3104".to_string()]).unwrap();
        assert_eq!(
            parsed,
            vec![("sit".to_string(), -1), ("front_jump".to_string(), 3104)]
        );
        assert!(parse_sim_failures(&["sit=x".to_string()]).is_err());
    }

    #[test]
    fn transport_errors_map_to_their_own_exit_code() {
        let err = anyhow::Error::new(MotionError::transport("eth 0", "bad name"))
            .context("failed to initialize sport client");
        assert_eq!(exit_code(&err), EXIT_TRANSPORT);

        let err = anyhow::Error::new(MotionError::ConfigNotFound("x.yaml".into()));
        assert_eq!(exit_code(&err), EXIT_INTERNAL);
    }

    #[test]
    fn cli_parses_iface_and_codes() {
        let cli = Cli::try_parse_from(["go2-motion", "enp3s0", "2", "3", "/go"]).unwrap();
        assert_eq!(cli.iface.as_deref(), Some("enp3s0"));
        assert_eq!(cli.actions, vec!["2", "3", "/go"]);
        assert!(!cli.json);
    }
}
