//! Wearable CLI - heart-rate telemetry server and stream client

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use wearable_cli::cli::{Cli, Commands, ConfigAction, stream_to_stdout};
use wearable_cli::config::{ConfigManager, format_sections};

fn load_config(cli: &Cli) -> Result<ConfigManager> {
    match &cli.config {
        Some(path) => ConfigManager::load_with_path(path),
        None => ConfigManager::load(),
    }
}

async fn serve(mut manager: ConfigManager, listen_addr: Option<String>, push_sender_addr: Option<String>) -> Result<()> {
    let config = manager.config_mut();
    if let Some(addr) = listen_addr {
        config.server.listen_addr = addr;
    }
    if let Some(addr) = push_sender_addr {
        config.notifier.endpoint = addr;
    }
    let config = manager.config();

    let service = wearable_cli::build_service(config)?;
    let listener = wearable_cli::bind(config).await?;
    info!(
        push_sender = %config.notifier.endpoint_uri(),
        target_id = %config.notifier.target_id,
        "alerts routed to push sender"
    );

    service
        .serve_with_shutdown(listener, async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await
        .context("gRPC server error")
}

fn handle_config(mut manager: ConfigManager, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let value = manager
                .get(&key)
                .ok_or_else(|| anyhow!("unknown configuration key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            manager.set(&key, &value)?;
            manager.save()?;
            println!("{key} = {}", manager.get(&key).unwrap_or_default());
        }
        ConfigAction::List => {
            for line in format_sections(&manager) {
                println!("{line}");
            }
        }
        ConfigAction::Path => println!("{}", manager.path().display()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    wearable_cli::logging::init(&cli.log_level)?;

    let manager = load_config(&cli)?;

    match cli.command {
        Commands::Serve {
            listen_addr,
            push_sender_addr,
        } => serve(manager, listen_addr, push_sender_addr).await,
        Commands::Stream { addr, uuid, json } => {
            let received = stream_to_stdout(&addr, &uuid, json).await?;
            info!(received, "stream completed");
            Ok(())
        }
        Commands::Config { action } => handle_config(manager, action),
    }
}
