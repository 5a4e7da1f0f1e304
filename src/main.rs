//! Timer Service - interactive console for a bounded set of countdown timers
//!
//! This is the main entry point for the timer-service application.

use std::{io::BufRead, sync::Arc, thread};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use timer_service::{
    config::Config,
    console::{execute, Command, ConsoleResponse},
    services::{ChannelSink, FilePresetStore},
    state::TimerRegistry,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_service={}", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting timer-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: data_dir={}, tick={}ms",
          config.data_dir.display(), config.tick_ms);

    let store = FilePresetStore::new(&config.data_dir);
    let registry = Arc::new(TimerRegistry::with_tick(store, config.tick_interval()));

    // Completions arrive on worker threads; hand them to this task instead.
    let (sink, mut completions) = ChannelSink::channel();
    registry.set_completion_sink(sink);

    info!("Commands: create <name> <secs> | preset <name> | start|pause|resume|stop|delete|show <id>");
    info!("          list | presets | save <name> <secs> | forget <name> | help | quit");

    // Stdin is read on a plain thread so a pending read never holds up runtime shutdown.
    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Failed to install signal handler: {}", e);
            futures::future::pending::<()>().await;
        }
        let _ = stop_tx.send(());
    });

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let command = match Command::parse(line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", ConsoleResponse::error(e).to_json());
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }

                let response = if command.blocks() {
                    let registry = Arc::clone(&registry);
                    tokio::task::spawn_blocking(move || execute(&registry, command)).await?
                } else {
                    execute(&registry, command)
                };
                println!("{}", response.to_json());
            }

            Some(completion) = completions.recv() => {
                info!("Timer {} ({}) finished", completion.id, completion.name);
                println!("{}", serde_json::to_string(&completion)?);
            }

            _ = &mut stop_rx => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // Joining workers can take up to one tick.
    tokio::task::spawn_blocking(move || registry.shutdown()).await?;

    info!("Timer service shutdown complete");
    Ok(())
}
