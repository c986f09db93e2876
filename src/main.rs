// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use pinion::registry::{MetadataCache, PypiClient};
use pinion::request::ResolveRequest;
use pinion::research::ResearchUnit;
use pinion::server::{self, PinionConfig, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "pinion")]
#[command(author, version, about = "Asynchronous Python requirement resolution service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the resolution server
    Serve {
        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Bind address (overrides the config file)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
        /// Job store database path (overrides the config file)
        #[arg(short, long)]
        db_path: Option<PathBuf>,
        /// Registry base URL (overrides the config file)
        #[arg(long)]
        registry_url: Option<String>,
    },
    /// Resolve a requirement set once and print the manifest
    Resolve {
        /// Requirement specs ("pandas>=1.3.0")
        #[arg(required = true)]
        specs: Vec<String>,
        /// Target Python version recorded in the report
        #[arg(long, default_value = "3.9")]
        python_version: String,
        /// Print the narrative report instead of the manifest
        #[arg(long)]
        narrative: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinion=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            db_path,
            registry_url,
        } => {
            let mut server_config = match config {
                Some(path) => PinionConfig::load(&path)?.to_server_config()?,
                None => ServerConfig::default(),
            };
            if let Some(bind) = bind {
                server_config.bind_addr = bind;
            }
            if let Some(db_path) = db_path {
                server_config.db_path = db_path;
            }
            if let Some(registry_url) = registry_url {
                server_config.registry_url = registry_url;
            }

            server::run_server(server_config).await
        }
        Commands::Resolve {
            specs,
            python_version,
            narrative,
        } => resolve_once(specs, python_version, narrative).await,
    }
}

/// Run the full pipeline in-process and print the result
async fn resolve_once(specs: Vec<String>, python_version: String, narrative: bool) -> Result<()> {
    let mut request = ResolveRequest::from_specs(specs);
    request.python_version = python_version;
    let requirements = request.parse_requirements()?;

    let config = ServerConfig::default();
    let client = PypiClient::new(&config.registry_url, config.registry_timeout)?;
    let cache = Arc::new(MetadataCache::new(config.cache_ttl));
    let research = ResearchUnit::new(Arc::new(client), cache);

    let job_id = uuid::Uuid::new_v4().to_string();
    info!("Resolving {} requirements", requirements.len());

    let report = server::pipeline::execute(research, job_id, request, requirements).await?;

    if narrative {
        print!("{}", report.narrative_text);
    } else {
        print!("{}", report.manifest_text);
    }

    if !report.resolution_result.success {
        std::process::exit(1);
    }
    Ok(())
}
