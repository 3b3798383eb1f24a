//! meshcfg: inspect, check and watch mesh client configuration.
//!
//! # Architecture Overview
//!
//! ```text
//!   JSON / TOML file
//!         │
//!         ▼
//!   ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐
//!   │  loader  │──▶│  merge   │──▶│ validation │──▶│ Snapshot │
//!   └──────────┘   └────▲─────┘   └────────────┘   └────┬─────┘
//!                       │                               │
//!                  ┌────┴─────┐                  ┌──────▼───────┐
//!                  │ defaults │                  │ ConfigHandle │◀── watcher
//!                  └──────────┘                  └──────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use meshcfg::config::{self, ConfigError, ConfigHandle, Format, Snapshot};
use meshcfg::config::watcher::ConfigWatcher;
use meshcfg::observability;

#[derive(Parser)]
#[command(name = "meshcfg")]
#[command(about = "Resolve and inspect mesh client configuration", long_about = None)]
struct Cli {
    /// Input format; inferred from the file extension when omitted.
    #[arg(short, long, value_enum, global = true)]
    format: Option<Format>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a config file and report every problem found
    Check { file: PathBuf },
    /// Print the resolved value at a dotted path
    Get { file: PathBuf, path: String },
    /// Print the baseline document
    Defaults,
    /// Reload a config file whenever it changes
    Watch { file: PathBuf },
}

fn load(file: &Path, format: Option<Format>) -> Result<Snapshot, ConfigError> {
    match format {
        Some(format) => config::loader::load_path_as(file, format),
        None => config::load_path(file),
    }
}

fn print_error(err: &ConfigError) {
    match err.issues() {
        Some(issues) => {
            eprintln!("configuration rejected ({} issues):", issues.len());
            for issue in issues.iter() {
                eprintln!("  {}", issue);
            }
        }
        None => eprintln!("error: {}", err),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file } => match load(&file, cli.format) {
            Ok(snapshot) => {
                println!(
                    "ok: listen {}:{}, mtu {}, {} point groups",
                    snapshot.listen_addr(),
                    snapshot.listen_port(),
                    snapshot.tun_mtu(),
                    snapshot.document().points.len()
                );
            }
            Err(e) => {
                print_error(&e);
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Get { file, path } => {
            let snapshot = match load(&file, cli.format) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    print_error(&e);
                    return Ok(ExitCode::FAILURE);
                }
            };
            match snapshot.get(&path).or_else(|| snapshot.get_group(&path)) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => {
                    eprintln!("not found: {}", path);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Defaults => {
            let baseline = config::baseline();
            match cli.format.unwrap_or(Format::Toml) {
                Format::Json => println!("{}", serde_json::to_string_pretty(&baseline)?),
                Format::Toml => println!("{}", toml::to_string_pretty(&baseline)?),
            }
        }
        Commands::Watch { file } => {
            let initial = load(&file, cli.format)?;
            observability::logging::init(&initial)?;

            tracing::info!(
                listen_port = initial.listen_port(),
                mtu = initial.tun_mtu(),
                "Configuration loaded"
            );

            let handle = ConfigHandle::new(initial);
            let (mut watcher, mut updates) = ConfigWatcher::new(&file, handle.clone());
            if let Some(format) = cli.format {
                watcher = watcher.with_format(format);
            }
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    Some(snapshot) = updates.recv() => {
                        tracing::info!(
                            revision = handle.revision(),
                            listen_port = snapshot.listen_port(),
                            mtu = snapshot.tun_mtu(),
                            "Configuration reloaded"
                        );
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            tracing::info!("Shutdown complete");
        }
    }

    Ok(ExitCode::SUCCESS)
}
