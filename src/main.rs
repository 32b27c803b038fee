use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentinel_log::LogFormat;
use sentinel_server::OrchestratorServer;
use sentinel_types::Config;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "sentinel",
    about = "Signature collection orchestrator for a multisig wallet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the orchestrator HTTP server")]
    Start {
        #[arg(long, value_name = "FILE", help = "Configuration file path")]
        config: Option<PathBuf>,

        #[arg(long, value_name = "ADDR", help = "Listen address, overrides server.listen_address")]
        listen: Option<String>,

        #[arg(long, value_name = "LEVEL", help = "Log level (trace, debug, info, warn, error)")]
        log_level: Option<String>,
    },

    #[command(about = "Display version information")]
    Version,

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    #[command(about = "Print the effective configuration as TOML")]
    Show {
        #[arg(long, value_name = "FILE", help = "Configuration file path")]
        config: Option<PathBuf>,
    },

    #[command(about = "Validate configuration")]
    Validate {
        #[arg(value_name = "FILE", help = "Configuration file path")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            config,
            listen,
            log_level,
        } => start_command(config, listen, log_level).await,
        Commands::Version => version_command(),
        Commands::Config { command } => config_command(command),
    }
}

async fn start_command(
    config: Option<PathBuf>,
    listen: Option<String>,
    log_level: Option<String>,
) -> Result<()> {
    setup_logging(log_level.as_deref())?;

    let mut config = load_config(config.as_deref())?;
    if let Some(listen) = listen {
        config.server.listen_address = listen;
    }

    tracing::info!(
        listen = %config.server.listen_address,
        threshold = config.quorum.threshold,
        total_signers = config.quorum.total_signers,
        owners = config.quorum.owners.len(),
        "Starting orchestrator"
    );

    OrchestratorServer::new(&config)?.start().await?;
    Ok(())
}

fn version_command() -> Result<()> {
    println!("sentinel {}", env!("CARGO_PKG_VERSION"));
    println!("build: {}", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Validate { file } => {
            let config = load_config(Some(&file))?;
            println!(
                "Configuration is valid: {}-of-{} quorum, {} owners, {} signer keys",
                config.quorum.threshold,
                config.quorum.total_signers,
                config.quorum.owners.len(),
                config.signers.len()
            );
        }
    }
    Ok(())
}

// Helper functions

fn setup_logging(log_level: Option<&str>) -> Result<()> {
    sentinel_log::init(LogFormat::Json, log_level)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).with_context(|| match path {
        Some(path) => format!("loading {}", path.display()),
        None => "loading default configuration".to_string(),
    })?;
    Ok(config)
}
