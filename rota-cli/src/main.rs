//! Rota CLI - Command line interface for Rota
//!
//! Reviewer assignment for team-based pull request review. Every data
//! command prints a JSON document on stdout; logs go to stderr.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rota_core::{CancellationToken, Config, ReviewService};
use rota_db::Database;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Context, PrArgs, StatsArgs, TeamArgs, UserArgs};

/// Rota: reviewer assignment for pull requests
#[derive(Parser, Debug)]
#[command(name = "rota")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the SQLite database (overrides config and ROTA_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Seed for reviewer selection (overrides config)
    #[arg(long, global = true, env = "ROTA_SEED")]
    seed: Option<u64>,

    /// Config file to use instead of ~/.config/rota/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Manage teams
    #[command(visible_alias = "t")]
    Team(TeamArgs),

    /// Manage users
    #[command(visible_alias = "u")]
    User(UserArgs),

    /// Manage pull requests and their reviewers
    Pr(PrArgs),

    /// Show live assignment counts per user
    Stats(StatsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs on stderr so stdout stays JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => commands::report_error(&err),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.config.as_deref(), cli.db.clone(), cli.seed)?;
    let db_config = config.database_config();

    if cli.verbose {
        tracing::info!(
            db = %db_config.path.display(),
            seed = ?config.selection.seed,
            timeout = ?config.operations.timeout,
            "Configuration loaded"
        );
    }

    let command = match cli.command {
        Some(Commands::Version) => {
            println!("rota {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(Commands::Config) => {
            print_config(&config, cli.config.as_deref());
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("Rota - Reviewer assignment for pull requests");
            println!();
            println!("Use --help for usage information");
            return Ok(());
        }
    };

    let db = Database::connect(db_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;
    let ctx = Context::new(
        ReviewService::with_picker(db, config.picker()),
        cancel_token(config.operations.timeout),
    );

    match command {
        Commands::Team(args) => args.execute(&ctx).await?,
        Commands::User(args) => args.execute(&ctx).await?,
        Commands::Pr(args) => args.execute(&ctx).await?,
        Commands::Stats(args) => args.execute(&ctx).await?,
        Commands::Version | Commands::Config => {}
    }

    Ok(())
}

/// Token cancelled on Ctrl-C or when the configured deadline passes
fn cancel_token(timeout: Option<std::time::Duration>) -> CancellationToken {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    if let Some(timeout) = timeout {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::warn!(?timeout, "Operation deadline passed, cancelling");
            on_deadline.cancel();
        });
    }

    cancel
}

fn print_config(config: &Config, config_file: Option<&std::path::Path>) {
    let db_config = config.database_config();

    println!("Rota Configuration");
    println!("==================");
    println!();
    println!("Database:");
    println!("  path: {}", db_config.path.display());
    println!("  max_connections: {}", db_config.max_connections);
    println!("  busy_timeout: {:?}", db_config.busy_timeout);
    println!();
    println!("Selection:");
    match config.selection.seed {
        Some(seed) => println!("  seed: {}", seed),
        None => println!("  seed: (random)"),
    }
    println!();
    println!("Operations:");
    match config.operations.timeout {
        Some(timeout) => println!("  timeout: {:?}", timeout),
        None => println!("  timeout: (none)"),
    }
    println!();

    let path = config_file
        .map(|p| p.to_path_buf())
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
