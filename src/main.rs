use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use validator::Validate;

use classdex::{config, server, store};

/// Classdex - a class-hierarchy reference browser
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the documentation server
    Serve {
        /// HTTP server host address (overrides CLASSDEX_HOST)
        #[arg(long)]
        host: Option<String>,

        /// HTTP server port (overrides CLASSDEX_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// SQLite catalog path (overrides CLASSDEX_DATABASE)
        #[arg(long)]
        database: Option<String>,

        /// Absolute URL prefix for canonical links (overrides CLASSDEX_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Load configuration from a YAML file instead of the environment
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load serialized fixture files into the catalog database
    Loaddata {
        /// Fixture files, applied in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// SQLite catalog path (overrides CLASSDEX_DATABASE)
        #[arg(long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to info level; override with RUST_LOG
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            database,
            base_url,
            config: config_path,
        } => {
            let mut config = match config_path {
                Some(path) => config::ServerConfig::from_yaml_file(&path)
                    .with_context(|| format!("loading config from {}", path.display()))?,
                None => config::ServerConfig::from_env().context("loading config from environment")?,
            };
            if let Some(host) = host {
                config.http_host = host;
            }
            if let Some(port) = port {
                config.http_port = port;
            }
            if let Some(database) = database {
                config.database = database;
            }
            if let Some(base_url) = base_url {
                config.site_base_url = base_url.trim_end_matches('/').to_string();
            }
            config.validate().context("validating configuration")?;

            println!("\nClassdex v{}\n", env!("CARGO_PKG_VERSION"));
            server::run_with_config(config).await;
        }

        Commands::Loaddata { files, database } => {
            let config = config::ServerConfig::from_env().context("loading config from environment")?;
            let database = database.unwrap_or(config.database);
            if database.is_empty() {
                anyhow::bail!(
                    "loaddata needs an on-disk catalog; pass --database or set CLASSDEX_DATABASE"
                );
            }

            let catalog = store::CatalogStore::open(std::path::Path::new(&database))
                .with_context(|| format!("opening catalog database {database}"))?;
            for file in files {
                let count = store::fixtures::load_fixture_file(&catalog, &file)
                    .with_context(|| format!("loading fixture {}", file.display()))?;
                log::info!("Installed {} object(s) from {}", count, file.display());
                println!("Installed {} object(s) from {}", count, file.display());
            }
        }
    }

    Ok(())
}
