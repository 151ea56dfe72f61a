//! # Vox KB CLI (`voxkb`)
//!
//! The `voxkb` binary drives the knowledge base: initialization,
//! ingestion, moderation, similarity search, and context consolidation.
//!
//! ## Usage
//!
//! ```bash
//! voxkb --config ./config/voxkb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `voxkb init` | Create the SQLite database and run schema migrations |
//! | `voxkb add` | Ingest a knowledge entry (lands pending review) |
//! | `voxkb review <kb-id>` | Approve or reject a pending entry |
//! | `voxkb context "<question>"` | Consolidate the knowledge relevant to a question |
//! | `voxkb search "<question>"` | Raw similarity matches, no consolidation |
//! | `voxkb topic "<name>"` | List the approved corpus for one topic |
//! | `voxkb stats` | Entry counts by status |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! voxkb init --config ./config/voxkb.toml
//!
//! # Ingest an entry
//! voxkb add --topic "rust" --description "The borrow checker enforces aliasing rules." \
//!     --references "TRPL ch. 4" --author "ada"
//!
//! # Approve it
//! voxkb review kb-0001 --approve
//!
//! # Retrieve grounded context for a question
//! voxkb context "how does rust prevent data races?"
//! ```

mod config;
mod consolidate;
mod db;
mod embedding;
mod ingest;
mod migrate;
mod models;
mod moderate;
mod query;
mod sqlite_store;
#[allow(dead_code)]
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vox KB — a retrieval-grounded knowledge base backend for
/// conversational assistants.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/voxkb.example.toml` for a full
/// example.
#[derive(Parser)]
#[command(
    name = "voxkb",
    about = "Vox KB — a retrieval-grounded knowledge base backend for conversational assistants",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/voxkb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the knowledge_base table.
    /// This command is idempotent — running it multiple times is safe.
    Init,

    /// Ingest a knowledge entry.
    ///
    /// The entry is embedded in document mode and stored with pending
    /// status; it becomes retrievable only after `review --approve`.
    Add {
        /// Short topic label (non-unique; entries sharing a topic form
        /// that topic's corpus).
        #[arg(long)]
        topic: String,

        /// The retrievable content.
        #[arg(long)]
        description: String,

        /// Citation or source text.
        #[arg(long, default_value = "")]
        references: String,

        /// Entry author.
        #[arg(long, default_value = "")]
        author: String,
    },

    /// Approve or reject a pending entry.
    Review {
        /// Entry identifier (kb-NNNN).
        kb_id: String,

        /// Approve the entry, making it retrievable.
        #[arg(long, conflicts_with = "reject")]
        approve: bool,

        /// Reject the entry (logical removal; nothing is deleted).
        #[arg(long)]
        reject: bool,
    },

    /// Consolidate the knowledge relevant to a question.
    ///
    /// Embeds the question in query mode, then applies the
    /// dominant-topic / mixed-topics strategy and prints the context
    /// blob with its source label and contributing entry ids.
    Context {
        /// The user question.
        question: String,
    },

    /// Raw similarity matches for a question, without consolidation.
    Search {
        /// The user question.
        question: String,

        /// Override the configured similarity threshold.
        #[arg(long)]
        threshold: Option<f64>,

        /// Override the configured result cap.
        #[arg(long)]
        limit: Option<i64>,

        /// Only match entries with this topic.
        #[arg(long)]
        topic: Option<String>,
    },

    /// List the approved corpus for one topic.
    Topic {
        /// Exact topic label.
        name: String,
    },

    /// Entry counts by status, plus distinct topics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&config).await?;
            println!("Database initialized at {}", config.db.path.display());
        }
        Commands::Add {
            topic,
            description,
            references,
            author,
        } => {
            ingest::run_add(&config, &topic, &description, &references, &author).await?;
        }
        Commands::Review {
            kb_id,
            approve,
            reject,
        } => {
            if !approve && !reject {
                anyhow::bail!("review requires --approve or --reject");
            }
            moderate::run_review(&config, &kb_id, approve).await?;
        }
        Commands::Context { question } => {
            query::run_context(&config, &question).await?;
        }
        Commands::Search {
            question,
            threshold,
            limit,
            topic,
        } => {
            query::run_search(&config, &question, threshold, limit, topic).await?;
        }
        Commands::Topic { name } => {
            query::run_topic(&config, &name).await?;
        }
        Commands::Stats => {
            moderate::run_stats(&config).await?;
        }
    }

    Ok(())
}
