//! # Vox KB
//!
//! **A retrieval-grounded knowledge base backend for conversational assistants.**
//!
//! Vox KB stores curated knowledge entries with their embeddings and,
//! given a user question's embedding, decides what stored knowledge (if
//! any) is relevant enough to inject into a language-model prompt. The
//! chat frontend and the LLM itself stay outside this crate: the
//! backend only produces a consolidated context blob with provenance.
//!
//! ## Data Flow
//!
//! 1. **Ingestion** ([`ingest`]) embeds a new entry in *document* mode
//!    and writes it with pending status.
//! 2. A reviewer approves or rejects the entry ([`moderate`]); only
//!    approved entries are retrievable.
//! 3. Per question, the caller embeds the text in *query* mode and runs
//!    the **consolidation engine** ([`consolidate`]): similarity search,
//!    topic vote tally, then either the full corpus of one dominant
//!    topic or a deduplicated mixed top-k sample.
//! 4. The result — context text, source label, contributing entry ids —
//!    goes into the prompt builder. No matches means the assistant
//!    answers ungrounded; it never sees a retrieval error.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types: `KnowledgeEntry`, `Match`, `ConsolidatedContext` |
//! | [`store`] | `KnowledgeStore` trait and in-memory implementation |
//! | [`sqlite_store`] | SQLite-backed store (brute-force cosine over BLOB vectors) |
//! | [`embedding`] | `Embedder` trait, Gemini and Ollama clients, vector utilities |
//! | [`consolidate`] | The consolidation engine: dominant-topic vs mixed-topics strategy |
//! | [`ingest`] | Knowledge ingestion: validate → embed → write pending |
//! | [`query`] | CLI runners for `context`, `search`, `topic` |
//! | [`moderate`] | CLI runners for `review`, `stats` |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |

pub mod config;
pub mod consolidate;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod moderate;
pub mod query;
pub mod sqlite_store;
pub mod store;

pub use consolidate::{consolidate, RetrievalParams};
pub use models::{ConsolidatedContext, EntryStatus, KnowledgeEntry, Match};
pub use store::KnowledgeStore;
