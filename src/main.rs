//! SalesSight - Interactive Sales Analytics
//!
//! Main entry point: launches the terminal UI by default, with subcommands
//! for database initialization and inspecting collected feedback.

use clap::{Parser, Subcommand};
use salessight_core::{
    config::{resolve_db_path, Settings},
    storage::{libsql::LibsqlStore, StorageBackend},
    tui::App,
    SalesSightError,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "salessight")]
#[command(about = "Interactive sales analytics with user accounts and feature feedback", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database path (overrides SALESSIGHT_DB_PATH env var and default)
    #[arg(long)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Inspect collected feedback
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },
}

#[derive(Subcommand)]
enum FeedbackAction {
    /// List all feedback rows, newest first
    List,

    /// List feedback submitted by one user
    User { username: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "salessight={}",
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // the TUI owns stdout
        .init();

    debug!("SalesSight v{} starting...", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    let db_path = resolve_db_path(cli.db_path, &settings);
    debug!("Using database: {}", db_path);

    if let Some(parent) = PathBuf::from(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    match cli.command {
        Some(Commands::Init) => {
            let store = LibsqlStore::new_with_validation(&db_path, true)?;
            store.init_schema().await?;
            println!("Initialized database at {}", db_path);
            Ok(())
        }
        Some(Commands::Feedback { action }) => {
            let store = LibsqlStore::new_with_validation(&db_path, false)?;
            match action {
                FeedbackAction::List => {
                    let rows = store.all_feedback().await?;
                    print_feedback(rows);
                }
                FeedbackAction::User { username } => {
                    if store.find_user(&username).await?.is_none() {
                        return Err(SalesSightError::UserNotFound(username).into());
                    }
                    let rows = store.feedback_for_user(&username).await?;
                    let username = Some(username);
                    print_feedback(
                        rows.into_iter().map(|r| (username.clone(), r)).collect(),
                    );
                }
            }
            Ok(())
        }
        None => {
            // Schema init is idempotent; run it on every start
            let store = LibsqlStore::new_with_validation(&db_path, true)?;
            store.init_schema().await?;

            let app = App::new(Arc::new(store), settings);
            app.run().await
        }
    }
}

fn print_feedback(rows: Vec<(Option<String>, salessight_core::FeedbackRecord)>) {
    if rows.is_empty() {
        println!("No feedback collected yet.");
        return;
    }

    for (username, record) in rows {
        println!(
            "#{:<4} {}  {:<16} {:<24} {}  {}",
            record.id,
            record.submitted_at.format("%Y-%m-%d %H:%M"),
            username.as_deref().unwrap_or("<deleted user>"),
            record.feature_name,
            record.score,
            record.comments.as_deref().unwrap_or("-"),
        );
    }
}
