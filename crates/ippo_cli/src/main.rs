//! Command-line front end over `ippo_core` with a SQLite-backed store.
//!
//! # Responsibility
//! - Wire config, logging and the persistent store together.
//! - Print records and proposals as JSON for scripting.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ippo_core::db::open_db;
use ippo_core::{
    init_logging, load_config, local_date_time, Clock, EntryMemoService, NewEntryRequest,
    ProposalChoice, RecommendationEngine, SqliteKvStore, SystemClock,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ippo", version, about = "Local journal store and next-step suggestions")]
struct Cli {
    /// JSON config file.
    #[arg(long, default_value = "ippo.json")]
    config: PathBuf,
    /// SQLite file; overrides the config value.
    #[arg(long)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the number of unsynced changes
    Pending,
    /// Drop all pending-change markers
    ClearQueue,
    /// Append a journal entry
    Add {
        text: String,
        #[arg(long, default_value = "")]
        category: String,
        /// Defaults to today's local date
        #[arg(long)]
        date: Option<String>,
        /// Defaults to the current local time
        #[arg(long)]
        time: Option<String>,
    },
    /// Append a memo
    Memo { text: String },
    /// Suggest three next steps from recent history
    Propose {
        #[arg(long)]
        days: Option<u32>,
        #[arg(long, default_value = "")]
        focus: String,
    },
    /// Save one freshly generated proposal as an entry
    Adopt {
        #[arg(default_value = "A")]
        choice: String,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long, default_value = "")]
        focus: String,
        #[arg(long)]
        not_done: bool,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Print the core version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log_dir is not valid UTF-8"))?;
        init_logging(&config.log_level, log_dir).map_err(|err| anyhow!(err))?;
    }

    if let Command::Version = cli.command {
        println!("ippo_core version={}", ippo_core::core_version());
        return Ok(());
    }

    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open store `{}`", db_path.display()))?;
    let store = SqliteKvStore::new(&conn);
    let service = EntryMemoService::new(&store);
    let engine = RecommendationEngine::new(&store);
    let default_days = config.default_window_days;

    match cli.command {
        Command::Pending => println!("{}", service.pending_count()),
        Command::ClearQueue => service.cache().queue().clear()?,
        Command::Add {
            text,
            category,
            date,
            time,
        } => {
            let (today, now) = local_date_time(SystemClock.now_ms());
            let entry = service.add_entry(NewEntryRequest::new(
                date.unwrap_or(today),
                time.unwrap_or(now),
                text,
                category,
            ))?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        Command::Memo { text } => {
            let memo = service.add_memo(text)?;
            println!("{}", serde_json::to_string_pretty(&memo)?);
        }
        Command::Propose { days, focus } => {
            let proposals = engine.propose(days.unwrap_or(default_days), &focus);
            println!("{}", serde_json::to_string_pretty(&proposals)?);
        }
        Command::Adopt {
            choice,
            days,
            focus,
            not_done,
            memo,
        } => {
            let proposals = engine.propose(days.unwrap_or(default_days), &focus);
            let choice = ProposalChoice::parse_or_default(&choice);
            let entry = service.record_proposal(&proposals, choice, !not_done, &memo)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        Command::Version => {}
    }

    Ok(())
}
