//! oclkit CLI - 命令行工具

use anyhow::Result;
use clap::{Parser, Subcommand};
use oclkit_core::OclKitConfig;
use oclkit_device::ComputeManager;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "oclkit")]
#[command(about = "oclkit - pick the best compute platform and devices on this host", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,
    /// Use a simulated host described by this JSON file
    #[arg(long, global = true)]
    host: Option<String>,
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List compute platforms and their devices
    Platforms {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Select devices and create an execution context
    Select {
        /// Native OpenGL context handle to share with the compute context
        #[arg(long, value_parser = commands::select::parse_handle)]
        gl_context: Option<usize>,
        /// Enable profiling and print timings
        #[arg(long)]
        profile: bool,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
        /// Criteria tokens after `--`, e.g. `-- --device gpu --preference compute-units`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(expand)
        .unwrap_or_else(OclKitConfig::default_path);
    let mut config = OclKitConfig::load(&config_path)?;
    if let Some(host) = cli.host.as_deref() {
        config.runtime.host_description = Some(expand(host));
    }

    // 初始化日志
    let default_filter = if cli.verbose {
        "oclkit=debug,info".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Platforms { json } => {
            ComputeManager::install(ComputeManager::from_config(&config)?);
            commands::platforms::run(json)
        }
        Commands::Select {
            gl_context,
            profile,
            json,
            tokens,
        } => {
            ComputeManager::install(ComputeManager::from_config(&config)?);
            commands::select::run(&config, &tokens, gl_context, profile, json)
        }
        Commands::Init { force } => commands::init::run(&config_path, force),
    };

    ComputeManager::shutdown();
    result
}
