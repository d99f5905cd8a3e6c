//! iSCSI attach parameter inspection CLI
//!
//! Commands:
//! - endpoint: Split an iscsi:// endpoint into its fields
//! - resolve: Validate publish parameters and print the connector record

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use iscsi_attach::iscsi::{parse_endpoint, ConnectionDescriptor, ConnectorRecord, RawContext};
use iscsi_attach::Config;

#[derive(Parser)]
#[command(name = "iscsi-attach")]
#[command(about = "iSCSI volume attach parameter resolution", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split an iscsi://<portal>/<target>/<lun> endpoint
    Endpoint {
        /// Endpoint string
        endpoint: String,
    },

    /// Resolve publish parameters into a connector record
    Resolve {
        /// Volume identity
        #[arg(long)]
        volume_id: String,

        /// Take portal, target and LUN from an endpoint string
        #[arg(long, conflicts_with = "param")]
        endpoint: Option<String>,

        /// Volume context entry (e.g. targetPortal=10.0.0.1), repeatable
        #[arg(short, long, value_parser = parse_param)]
        param: Vec<(String, String)>,

        /// File holding the JSON credential blob
        #[arg(long)]
        secret_file: Option<PathBuf>,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {:?}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(config.node.log_level.as_str()))
        .init();

    let result = match &cli.command {
        Commands::Endpoint { endpoint } => cmd_endpoint(endpoint),
        Commands::Resolve {
            volume_id,
            endpoint,
            param,
            secret_file,
        } => cmd_resolve(&config, volume_id, endpoint.as_deref(), param, secret_file.as_deref()),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn cmd_endpoint(endpoint: &str) -> Result<()> {
    let ep = parse_endpoint(endpoint)?;

    println!("Portal: {}", ep.portal);
    println!("Target: {}", ep.target);
    println!("LUN:    {}", ep.lun);

    Ok(())
}

fn cmd_resolve(
    config: &Config,
    volume_id: &str,
    endpoint: Option<&str>,
    params: &[(String, String)],
    secret_file: Option<&Path>,
) -> Result<()> {
    let mut ctx = match endpoint {
        Some(endpoint) => RawContext::from_endpoint(endpoint)?,
        None => {
            let map: HashMap<String, String> = params.iter().cloned().collect();
            RawContext::from_volume_context(&map)
        }
    };

    if let Some(path) = secret_file {
        ctx.secret = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secret file {:?}", path))?;
    }

    let settings = config.attach_settings();
    let descriptor = ConnectionDescriptor::build(volume_id, &ctx, settings.default_port)?;
    let connector = ConnectorRecord::assemble(&descriptor, settings.default_port);

    let json = serde_json::to_string_pretty(&connector.redacted())
        .context("Failed to serialize connector to JSON")?;
    println!("{}", json);

    Ok(())
}
