// SPDX-License-Identifier: MIT

//! Command line front end: bootstrap the sandbox, run the engine in it, or
//! list its desktop.

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use winkor_sandbox::config::{ConfigError, LauncherConfig};
use winkor_sandbox::drive::{BootstrapError, LayoutStatus, VirtualDriveBuilder, desktop_entries};
use winkor_sandbox::runtime::LaunchError;

#[derive(Parser)]
#[command(name = "winkor-launch", version, about)]
struct Cli {
    /// Read settings from this TOML file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use this sandbox root instead of the configured one.
    #[arg(long, value_name = "DIR")]
    sandbox: Option<PathBuf>,

    /// Show debug messages unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the sandbox layout if it is missing.
    Bootstrap,
    /// Launch the engine and wait for it to exit.
    Run,
    /// List the sandbox desktop.
    Desktop,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            let mut source = err.source();
            while let Some(cause) = source {
                error!("  Caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let mut config = match &cli.config {
        Some(path) => LauncherConfig::load(path)?,
        None => LauncherConfig::default(),
    };
    if let Some(sandbox) = cli.sandbox {
        config.sandbox_root = Some(sandbox);
    }

    match cli.command {
        Command::Bootstrap => bootstrap(&config),
        Command::Run => launch(&config),
        Command::Desktop => desktop(&config),
    }
}

fn bootstrap(config: &LauncherConfig) -> Result<ExitCode, CliError> {
    let dirs = config.special_dirs();
    let root = config.sandbox_root(&*dirs)?;
    let status = VirtualDriveBuilder::new(dirs)
        .with_progress(|step| info!("{}", step.status()))
        .ensure_layout(&root)?;
    match status {
        LayoutStatus::AlreadyInitialized => {
            println!("{} is already initialized", root.path().display());
        }
        LayoutStatus::Initialized => println!("Initialized {}", root.path().display()),
    }
    Ok(ExitCode::SUCCESS)
}

fn desktop(config: &LauncherConfig) -> Result<ExitCode, CliError> {
    let dirs = config.special_dirs();
    let root = config.sandbox_root(&*dirs)?;
    for entry in desktop_entries(&root)? {
        let suffix = if entry.is_dir { "/" } else { "" };
        println!("{}{suffix}", entry.name);
    }
    Ok(ExitCode::SUCCESS)
}

fn launch(config: &LauncherConfig) -> Result<ExitCode, CliError> {
    let supervisor = config.supervisor()?;

    let events = supervisor.subscribe();
    std::thread::spawn(move || {
        for event in events {
            info!("{}", event.status);
        }
    });

    // Lines are logged by the supervisor; the tap only tells when the
    // stream has been logged to the end.
    let mut output = supervisor.take_output();
    supervisor.launch()?;

    let code = loop {
        if let Some(code) = supervisor.wait_for_exit(Duration::from_secs(60)) {
            break code;
        }
        if !supervisor.state().is_active() {
            break 1;
        }
    };
    if let Some(output) = output.as_mut() {
        if let Err(err) = io::copy(output, &mut io::sink()) {
            error!("Failed reading engine output: {err}");
        }
    }
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
