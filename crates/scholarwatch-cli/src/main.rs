use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scholarwatch_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "scholarwatch")]
#[command(author, version, about = "Watch scholarly sources for new papers and republish them as RSS")]
struct Cli {
    /// Path to the config file (defaults to ~/.config/scholarwatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watcher and the HTTP server (default)
    Serve,
    /// Run a single cycle over all keywords and exit
    Run,
    /// Manage watched keywords
    Keyword {
        #[command(subcommand)]
        action: KeywordAction,
    },
    /// Show counts and configuration readiness
    Status,
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

#[derive(Subcommand)]
enum KeywordAction {
    /// Watch a new keyword
    Add {
        term: String,
    },
    /// Stop watching a keyword and drop its detections
    Remove {
        term: String,
    },
    /// List watched keywords
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Arc::new(AppConfig::load(cli.config.as_deref())?);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        // Config commands never touch the database
        Commands::Config { action } => {
            let path = cli.config.unwrap_or_else(AppConfig::config_path);
            match action {
                ConfigAction::Init { force } => commands::config::init(&config, &path, force),
                ConfigAction::Path => commands::config::path(&path),
            }
        }
        Commands::Serve => {
            let db = Database::new(&config).await?;
            commands::serve::run(db, config).await
        }
        Commands::Run => {
            let db = Database::new(&config).await?;
            commands::run::run(db, &config).await
        }
        Commands::Keyword { action } => {
            let db = Database::new(&config).await?;
            match action {
                KeywordAction::Add { term } => commands::keyword::add(&db, &term).await,
                KeywordAction::Remove { term } => commands::keyword::remove(&db, &term).await,
                KeywordAction::List => commands::keyword::list(&db).await,
            }
        }
        Commands::Status => {
            let db = Database::new(&config).await?;
            commands::status::run(&db, &config).await
        }
    }
}
