// Bedrock World Manager - Main entry point
// Move Bedrock worlds between .mcworld packages and server mounts

use anyhow::{anyhow, Result};
use bedrock_world_manager::commands;
use bedrock_world_manager::config::AppConfig;
use bedrock_world_manager::worlds::WorldService;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bedrock-world-manager",
    version,
    about = "Import and export Bedrock worlds for dedicated server containers"
)]
struct Cli {
    /// Settings file (defaults to ~/BedrockAnywhere/config/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage worlds in server mounts
    #[command(subcommand)]
    Worlds(WorldsCommand),
    /// Manage Bedrock server containers
    #[command(subcommand)]
    Servers(ServersCommand),
    /// Inspect the Docker daemon
    #[command(subcommand)]
    Docker(DockerCommand),
}

#[derive(Subcommand)]
enum WorldsCommand {
    /// List worlds across all server mounts
    List,
    /// Import a .mcworld package into a server mount
    Import {
        /// Server mount to import into
        #[arg(long)]
        server: String,
        /// Package file
        file: PathBuf,
    },
    /// Export a world as a .mcworld package
    Export {
        /// World id (<server>-<world>), or the world name when --server is given
        id: String,
        /// Server mount holding the world
        #[arg(long)]
        server: Option<String>,
        /// Output directory or file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ServersCommand {
    /// List Bedrock server containers
    List,
    /// Create and start a server bound to its mount
    Create {
        name: String,
        #[arg(long)]
        port: Option<u16>,
        /// World in the server mount to load
        #[arg(long)]
        world: Option<String>,
    },
    /// Start a server container
    Start { id: String },
    /// Stop a server container
    Stop { id: String },
    /// Show host ports free for new servers
    Ports,
}

#[derive(Subcommand)]
enum DockerCommand {
    /// Check that Docker is reachable
    Status,
    /// Docker system information
    Info,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
            .add_directive("bollard=warn".parse().expect("static directive"))
            .add_directive("hyper=warn".parse().expect("static directive"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_worlds(config: &AppConfig, command: WorldsCommand) -> Result<ExitCode> {
    let service = WorldService::from_config(config);
    match command {
        WorldsCommand::List => {
            let worlds = commands::worlds::list_worlds(&service)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&worlds)?;
            Ok(ExitCode::SUCCESS)
        }
        WorldsCommand::Import { server, file } => {
            let response = commands::worlds::import_world(&service, &server, &file)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&response)?;
            Ok(status(response.success))
        }
        WorldsCommand::Export { id, server, output } => {
            let response = commands::worlds::export_world(
                &service,
                &id,
                server.as_deref(),
                output.as_deref(),
            )
            .await
            .map_err(|e| anyhow!(e))?;
            print(&response)?;
            Ok(status(response.success))
        }
    }
}

async fn run_servers(config: &AppConfig, command: ServersCommand) -> Result<ExitCode> {
    let docker = commands::docker::connect(config)
        .await
        .map_err(|e| anyhow!(e))?;
    let service = WorldService::from_config(config);

    match command {
        ServersCommand::List => {
            let servers = commands::server::list_servers(&docker)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&servers)?;
        }
        ServersCommand::Create { name, port, world } => {
            let response = commands::server::create_server(
                &docker,
                service.storage(),
                &config.docker,
                name,
                port,
                world,
            )
            .await
            .map_err(|e| anyhow!(e))?;
            print(&response)?;
        }
        ServersCommand::Start { id } => {
            commands::server::start_server(&docker, &id)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&serde_json::json!({ "success": true, "id": id }))?;
        }
        ServersCommand::Stop { id } => {
            commands::server::stop_server(&docker, &id)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&serde_json::json!({ "success": true, "id": id }))?;
        }
        ServersCommand::Ports => {
            let ports = commands::server::get_available_ports(&docker, &config.docker)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&ports)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_docker(config: &AppConfig, command: DockerCommand) -> Result<ExitCode> {
    match command {
        DockerCommand::Status => {
            let docker_status = commands::docker::check_docker_status(config)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&docker_status)?;
            Ok(status(docker_status.running))
        }
        DockerCommand::Info => {
            let info = commands::docker::get_docker_info(config)
                .await
                .map_err(|e| anyhow!(e))?;
            print(&info)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    tracing::debug!(
        "Using servers root {} and scratch root {}",
        config.servers_root.display(),
        config.scratch_root.display()
    );

    match cli.command {
        Command::Worlds(command) => run_worlds(&config, command).await,
        Command::Servers(command) => run_servers(&config, command).await,
        Command::Docker(command) => run_docker(&config, command).await,
    }
}
