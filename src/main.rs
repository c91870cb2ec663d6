//! cluequiz binary entrypoint: loads configuration, restores the session and drives the
//! presentation from a moderator console at a fixed frame rate.

use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    time::{MissedTickBehavior, interval},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cluequiz::{
    config::AppConfig,
    dao::save::load_save,
    input::{ScriptedSource, SourceKind, keyboard::HeldButtons},
    services::{
        bootstrap,
        console::{ConsoleCommand, parse_command},
        controller::PresentationController,
    },
    state::{board::PlayerId, events::EventHub},
};

const FRAME: Duration = Duration::from_millis(33);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    let restore = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .map(|path| load_save(&path))
        .transpose()
        .context("restoring save")?;

    let events = EventHub::default();
    #[cfg(feature = "mqtt")]
    let _effects = config
        .effects
        .as_ref()
        .map(|effects| cluequiz::services::effects::spawn_publisher(effects, &events));

    let keys = HeldButtons::new();
    let buzzes = ScriptedSource::new(SourceKind::Keyboard);
    let session =
        bootstrap::build_session(&config, restore, events).context("building session")?;
    let mut merger = bootstrap::build_merger(&config, keys.clone()).context("starting inputs")?;
    merger.push(Box::new(buzzes.clone()));
    let mut controller = PresentationController::new(session, merger, config.viewer);

    let mut lines = spawn_console();
    let mut console_open = true;
    let mut ticker = interval(FRAME);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!(phase = ?controller.phase(), "ready");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.recv(), if console_open => {
                let Some(line) = line else {
                    info!("console closed");
                    console_open = false;
                    continue;
                };
                match parse_command(&line) {
                    Ok(ConsoleCommand::Input(input)) => {
                        controller.handle(input);
                    }
                    Ok(ConsoleCommand::Press(player)) => keys.press(player),
                    Ok(ConsoleCommand::Release(player)) => keys.release(player),
                    Ok(ConsoleCommand::Buzz(player)) => buzzes.press(player),
                    Ok(ConsoleCommand::Status) => log_status(&controller),
                    Ok(ConsoleCommand::Quit) => break,
                    Err(err) => warn!(error = %err, "unrecognised command"),
                }
            }
            _ = ticker.tick() => controller.tick(),
        }
    }

    log_status(&controller);
    info!("shutting down");
    Ok(())
}

/// Forward stdin lines to the frame loop.
fn spawn_console() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "failed to read console");
                    break;
                }
            }
        }
    });
    rx
}

fn log_status(controller: &PresentationController) {
    let session = controller.session();
    for player in PlayerId::all() {
        info!(
            %player,
            name = session.name(player),
            score = session.score(player),
            choosing = session.choosing() == player,
            "standing"
        );
    }
    let snapshot = controller.snapshot();
    info!(
        phase = ?snapshot.phase,
        transitions = snapshot.version,
        viewer = controller.is_viewer(),
        ignore_responded = session.rules().ignore_responded,
        remaining = session.board().remaining(),
        clue_set = %controller.category_set().source().display(),
        clue = controller.current_clue().map(|clue| clue.answer.as_str()),
        save_failures = session.save_failures(),
        "status"
    );
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
