use anyhow::Context as _;
use clap::Parser;
use gimbal_controller::{
    cli::Args,
    config::{ConfigOptions, create_default_config, init_config_with_options},
    controller::{RunController, RunMode},
    keyboard, logging,
    sequencer::RotationSequencer,
    session::Session,
    signals,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const MOVEMENT_QUEUE: usize = 16;

fn should_create_config() -> bool {
    std::env::var("CREATE_CONFIG")
        .map(|val| val == "1" || val.to_lowercase() == "true")
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if should_create_config() {
        create_default_config(&args.config)?;
    }

    let options = ConfigOptions::with_path(&args.config);
    let (config_manager, mut config) = init_config_with_options(options).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Run with CREATE_CONFIG=1 to create a default configuration file.");
        e
    })?;

    args.apply_overrides(&mut config);
    config.validate()?;

    let mode = RunMode::select(&args.selection());
    let manual = mode == Some(RunMode::Manual);
    if manual {
        keyboard::ensure_interactive(&std::io::stdin()).context("Cannot start manual mode")?;
    }

    let _log_guard = logging::init(&config.logging, manual)?;
    info!(path = %config_manager.path().display(), "configuration loaded");

    let shutdown = CancellationToken::new();

    signals::watch(shutdown.clone()).context("Failed to install signal handlers")?;

    if mode.is_none() {
        println!("No run mode selected: pass -m, -c, -t <secs> or -r <count>.");
    }

    let session = Session::from_config(&config);
    let sequencer = RotationSequencer::from_config(&config.motion);
    let mut controller = RunController::new(session, sequencer, shutdown.clone());

    let keyboard = if manual {
        let (tx, rx) = mpsc::channel(MOVEMENT_QUEUE);
        controller = controller.with_movements(rx);

        println!("Use WASD or the arrow keys to move up, left, down or right. Press q or Ctrl-C to exit.");
        Some(keyboard::spawn(tx, shutdown.clone()))
    } else {
        if mode == Some(RunMode::Continuous) {
            println!("Press Ctrl-C to exit the program.");
        }
        None
    };

    let result = controller
        .run(mode)
        .await
        .with_context(|| format!("Gimbal run against {} failed", config.connection.host));

    // Releases the keyboard thread and restores the terminal.
    shutdown.cancel();
    if let Some(handle) = keyboard {
        match handle.await {
            Ok(Err(e)) => warn!(error = %e, "keyboard input failed"),
            Err(e) => warn!(error = %e, "keyboard task panicked"),
            Ok(Ok(())) => {}
        }
    }

    let report = result?;
    info!(
        sweeps = report.sweeps,
        moves = report.moves,
        interrupted = report.interrupted,
        closed = report.closed,
        "gimbal run finished"
    );

    Ok(())
}
