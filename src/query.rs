//! Query-side CLI runners: `context`, `search`, and `topic`.
//!
//! The `context` command is the full retrieval flow a chat frontend
//! drives per user message: embed the question in query mode, run the
//! consolidation engine, and report the context blob with provenance.
//! An embedding failure or an unreachable store is downgraded to the
//! no-context outcome — the frontend then answers ungrounded rather
//! than erroring at the user.

use anyhow::Result;

use crate::config::Config;
use crate::consolidate::{consolidate, RetrievalParams};
use crate::db;
use crate::embedding::{self, TaskKind};
use crate::models::ConsolidatedContext;
use crate::sqlite_store::SqliteStore;
use crate::store::KnowledgeStore;

/// Consolidate knowledge for an already-embedded question.
///
/// Returns `None` when nothing relevant is stored *and* when the store
/// cannot be opened at all — connect failures get the same warning-and-
/// degrade treatment as a failed similarity search.
pub async fn consolidated_for(config: &Config, query_vec: &[f32]) -> Option<ConsolidatedContext> {
    let pool = match db::connect(&config.db).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!(
                "Warning: knowledge store unavailable, answering without context: {}",
                e
            );
            return None;
        }
    };

    let store = SqliteStore::new(pool);
    let params = RetrievalParams::from(&config.retrieval);
    let ctx = consolidate(&store, &params, query_vec).await;

    store.pool().close().await;
    ctx
}

/// `voxkb context "<question>"` — consolidate knowledge for a question.
pub async fn run_context(config: &Config, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        println!("No relevant knowledge.");
        return Ok(());
    }

    let embedder = embedding::create_embedder(&config.embedding)?;
    let query_vec = match embedder.embed(question, TaskKind::Query).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: query embedding failed, answering without context: {}", e);
            println!("No relevant knowledge.");
            return Ok(());
        }
    };

    match consolidated_for(config, &query_vec).await {
        Some(ctx) => {
            println!("source: {}", ctx.source_label);
            println!("entries: {}", ctx.contributing_ids.len());
            println!("ids: {}", ctx.contributing_ids.join(", "));
            println!();
            println!("{}", ctx.text);
        }
        None => println!("No relevant knowledge."),
    }

    Ok(())
}

/// `voxkb search "<question>"` — raw similarity matches, no consolidation.
pub async fn run_search(
    config: &Config,
    question: &str,
    threshold: Option<f64>,
    limit: Option<i64>,
    topic: Option<String>,
) -> Result<()> {
    if let Some(l) = limit {
        if l < 1 {
            anyhow::bail!("--limit must be >= 1");
        }
    }

    let embedder = embedding::create_embedder(&config.embedding)?;
    let query_vec = embedder.embed(question, TaskKind::Query).await?;

    let pool = db::connect(&config.db).await?;
    let store = SqliteStore::new(pool);

    let matches = store
        .search_similar(
            &query_vec,
            threshold.unwrap_or(config.retrieval.match_threshold),
            limit.unwrap_or(config.retrieval.match_count),
            topic.as_deref(),
        )
        .await?;

    if matches.is_empty() {
        println!("No results.");
    } else {
        for m in &matches {
            println!("{:.4}  {}  [{}]", m.similarity, m.kb_id, m.topic);
            let preview: String = m.description.chars().take(120).collect();
            println!("        {}", preview);
        }
    }

    store.pool().close().await;
    Ok(())
}

/// `voxkb topic "<name>"` — list the approved corpus for one topic.
pub async fn run_topic(config: &Config, topic: &str) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    let store = SqliteStore::new(pool);

    let entries = store.fetch_by_topic(topic).await?;

    if entries.is_empty() {
        println!("No entries for topic '{}'.", topic);
    } else {
        println!("topic: {} ({} entries)", topic, entries.len());
        for e in &entries {
            println!("  {}  by {}", e.id, if e.author.is_empty() { "unknown" } else { &e.author });
            let preview: String = e.description.chars().take(120).collect();
            println!("    {}", preview);
        }
    }

    store.pool().close().await;
    Ok(())
}
