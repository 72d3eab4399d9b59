//! SessionVault demo
//!
//! Drives the session vault from the terminal with an in-process backend and
//! a simulated fingerprint sensor. Type `help` for the command list.

mod commands;
mod pages;
mod sensor;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sessionvault_core::{load_settings, save_settings, Route, SessionVault};
use sessionvault_platform::{AppLifecycle, EphemeralBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use commands::{Command, HELP};
use pages::{render_status, HomePage, LoginPage, TerminalPresenter};
use sensor::SimulatedSensor;

/// SessionVault terminal demo
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Settings file. Defaults are used when it does not exist.
    #[arg(short, long, default_value = "sessionvault.json")]
    config: PathBuf,

    /// Write the effective settings to the config file before starting
    #[arg(long)]
    write_config: bool,

    /// Debug logging for the vault crates
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("sessionvault_core={level},sessionvault_platform={level},sessionvault_demo={level}")
                    .into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings(&args.config)
        .with_context(|| format!("Failed to load settings from {:?}", args.config))?;
    if args.write_config {
        save_settings(&args.config, &settings)
            .with_context(|| format!("Failed to write settings to {:?}", args.config))?;
        info!("Settings written to {:?}", args.config);
    }

    let lifecycle = AppLifecycle::new();
    let sensor = Arc::new(SimulatedSensor::new());
    let backend = EphemeralBackend::new(settings.vault.clone(), sensor.clone())
        .context("Invalid vault configuration")?;
    let _auto_lock = backend.watch_lifecycle(&lifecycle);

    let (presenter, route) = TerminalPresenter::new();
    let vault = SessionVault::new(
        Arc::new(backend),
        lifecycle.clone(),
        presenter.clone(),
        settings.session_key.clone(),
    );
    vault
        .initialize()
        .await
        .context("Failed to initialize session vault")?;

    info!("Session vault ready, session key '{}'", settings.session_key);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let current = *route.borrow();
        print_prompt(current, &vault);

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let result = match command {
            Command::Quit => break,
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Command::Status => {
                let status = vault.current_status().await?;
                println!("{}", serde_json::to_string_pretty(&status)?);
                Ok(())
            }
            Command::Sensor(outcome) => {
                sensor.arm(outcome).await;
                Ok(())
            }
            Command::Background => {
                lifecycle.set_active(false);
                Ok(())
            }
            Command::Foreground => {
                lifecycle.set_active(true);
                Ok(())
            }
            Command::Login => LoginPage::new(&vault, presenter.as_ref()).login().await,
            Command::Restore => vault.restore_session().await.map_err(Into::into),
            Command::Lock if current == Route::Home => HomePage::new(&vault).toggle_lock().await,
            Command::Biometrics(None) if current == Route::Home => {
                HomePage::new(&vault).toggle_biometrics().await
            }
            Command::Biometrics(Some(enable)) if current == Route::Home => {
                HomePage::new(&vault).set_biometrics(enable).await
            }
            Command::Clear if current == Route::Home => HomePage::new(&vault).clear().await,
            Command::Lock | Command::Biometrics(_) | Command::Clear => {
                println!("Log in first");
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("{:#}", e);
        }
    }

    info!("Bye");
    Ok(())
}

fn print_prompt(route: Route, vault: &SessionVault) {
    println!("{} | {}", route.path(), render_status(&vault.status()));
}
