//! CLI command implementations

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use shopscout_core::ShopscoutConfig;
use shopscout_search::ProductAggregator;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory with the front end
        #[arg(long)]
        static_dir: Option<PathBuf>,
        /// JSON file holding registered users
        #[arg(long)]
        users_file: Option<PathBuf>,
        /// Require a bearer token for /api/search
        #[arg(long)]
        require_auth: bool,
    },
    /// Run one search and print the merged results as JSON
    Search {
        /// Search text
        query: String,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let config = ShopscoutConfig::from_env();

    match command {
        Commands::Server {
            host,
            port,
            static_dir,
            users_file,
            require_auth,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = static_dir {
                config.server.static_dir = dir;
            }
            if let Some(file) = users_file {
                config.server.users_file = file;
            }
            config.auth.search_requires_auth |= require_auth;

            shopscout_web::run_server(config)
                .await
                .context("server exited with an error")
        }
        Commands::Search { query, pretty } => run_search(&config, &query, pretty).await,
    }
}

async fn run_search(config: &ShopscoutConfig, query: &str, pretty: bool) -> anyhow::Result<()> {
    config.validate()?;

    let enabled = config.enabled_sources();
    if enabled.is_empty() {
        tracing::warn!("No product sources configured, the result will be empty");
    }
    tracing::info!(query, sources = ?enabled, "Searching");

    let result = ProductAggregator::from_config(&config.sources)
        .aggregate(query)
        .await;

    let output = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");
    Ok(())
}
