//! Context consolidation engine.
//!
//! The core retrieval decision logic: given a query embedding, run a
//! similarity search, decide between the dominant-topic and mixed-topics
//! strategy, and assemble one context blob with provenance.
//!
//! # Algorithm
//!
//! 1. Similarity search with the configured threshold and top-k,
//!    no topic filter.
//! 2. Zero matches → no context (the caller falls back to an
//!    ungrounded answer).
//! 3. Tally matches by topic. The first topic encountered in match
//!    order wins count ties.
//! 4. If the top topic's count meets or exceeds `vote_threshold`,
//!    fetch that topic's full approved corpus and concatenate it
//!    (dominant-topic strategy).
//! 5. Otherwise concatenate the raw matches, deduplicated by id in
//!    descending-similarity order (mixed-topics strategy).
//! 6. Both paths cap the blob at `max_chunks` entries; the mixed path
//!    keeps the highest-similarity entries, the dominant path the
//!    earliest-ingested.
//!
//! A single specific question tends to hit many fragments of one topic,
//! which is better answered with the whole topic corpus; a broad or
//! ambiguous question spreads its matches across topics and is better
//! served by the diverse top-k sample.
//!
//! The engine never surfaces a store failure: an unreachable store
//! degrades to "no context" with a warning on stderr.

use crate::config::RetrievalConfig;
use crate::models::{ConsolidatedContext, Match};
use crate::store::KnowledgeStore;

/// Separator between entry descriptions in the context blob, so the
/// prompt builder can tell sources apart.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Source label for the mixed-topics strategy.
pub const MIXED_TOPICS_LABEL: &str = "Mixed topics";

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RetrievalParams {
    /// Minimum cosine similarity for a match.
    pub match_threshold: f64,
    /// Top-k for the similarity query.
    pub match_count: i64,
    /// Matches sharing a topic needed to trigger the dominant-topic
    /// strategy (inclusive: meets-or-exceeds).
    pub vote_threshold: usize,
    /// Cap on entries concatenated into the context blob.
    pub max_chunks: usize,
}

impl From<&RetrievalConfig> for RetrievalParams {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            match_threshold: config.match_threshold,
            match_count: config.match_count,
            vote_threshold: config.vote_threshold,
            max_chunks: config.max_chunks,
        }
    }
}

/// Consolidate the knowledge relevant to a query embedding.
///
/// Returns `None` when no stored knowledge clears the similarity
/// threshold, or when the store is unreachable — never an error.
pub async fn consolidate<S: KnowledgeStore + ?Sized>(
    store: &S,
    params: &RetrievalParams,
    query_vec: &[f32],
) -> Option<ConsolidatedContext> {
    let matches = match store
        .search_similar(query_vec, params.match_threshold, params.match_count, None)
        .await
    {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Warning: knowledge store unavailable, answering without context: {}", e);
            return None;
        }
    };

    if matches.is_empty() {
        return None;
    }

    let (dominant_topic, dominant_count) = tally_topics(&matches);

    if dominant_count >= params.vote_threshold {
        match store.fetch_by_topic(dominant_topic).await {
            Ok(corpus) if !corpus.is_empty() => {
                let mut entries = corpus;
                // Dominant path keeps the earliest-ingested entries.
                entries.truncate(params.max_chunks);

                let text = entries
                    .iter()
                    .map(|e| e.description.as_str())
                    .collect::<Vec<_>>()
                    .join(CONTEXT_SEPARATOR);
                let contributing_ids = entries.into_iter().map(|e| e.id).collect();

                return Some(ConsolidatedContext {
                    text,
                    source_label: format!("Topic: {}", dominant_topic),
                    contributing_ids,
                });
            }
            // An empty corpus cannot normally happen (the search is
            // approved-only), but degrade to the mixed assembly rather
            // than returning an empty context.
            Ok(_) => {}
            Err(e) => {
                eprintln!(
                    "Warning: topic fetch failed for '{}', using raw matches: {}",
                    dominant_topic, e
                );
            }
        }
    }

    Some(assemble_mixed(&matches, params.max_chunks))
}

/// Count matches per topic. Returns the topic with the highest count;
/// ties go to the topic encountered first in match order.
fn tally_topics(matches: &[Match]) -> (&str, usize) {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for m in matches {
        match counts.iter_mut().find(|(topic, _)| *topic == m.topic) {
            Some(entry) => entry.1 += 1,
            None => counts.push((&m.topic, 1)),
        }
    }

    let mut best = ("", 0);
    for (topic, count) in counts {
        // Strictly greater: the first topic to reach the top count wins.
        if count > best.1 {
            best = (topic, count);
        }
    }
    best
}

/// Mixed-topics assembly: deduplicate matches by id, preserve
/// descending-similarity order, cap at `max_chunks`.
fn assemble_mixed(matches: &[Match], max_chunks: usize) -> ConsolidatedContext {
    let mut seen: Vec<&str> = Vec::new();
    let mut texts: Vec<&str> = Vec::new();
    let mut contributing_ids: Vec<String> = Vec::new();

    for m in matches {
        if seen.contains(&m.kb_id.as_str()) {
            continue;
        }
        if contributing_ids.len() >= max_chunks {
            break;
        }
        seen.push(&m.kb_id);
        texts.push(&m.description);
        contributing_ids.push(m.kb_id.clone());
    }

    ConsolidatedContext {
        text: texts.join(CONTEXT_SEPARATOR),
        source_label: MIXED_TOPICS_LABEL.to_string(),
        contributing_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::models::{EntryStatus, KnowledgeEntry, NewKnowledge};
    use crate::store::StoreStats;

    /// Scripted store: returns fixed matches and topic corpora, and
    /// records which topics were fetched.
    struct StubStore {
        matches: Vec<Match>,
        corpus: HashMap<String, Vec<KnowledgeEntry>>,
        fail_search: bool,
        topic_calls: Mutex<Vec<String>>,
    }

    impl StubStore {
        fn with_matches(matches: Vec<Match>) -> Self {
            Self {
                matches,
                corpus: HashMap::new(),
                fail_search: false,
                topic_calls: Mutex::new(Vec::new()),
            }
        }

        fn with_corpus(mut self, topic: &str, entries: Vec<KnowledgeEntry>) -> Self {
            self.corpus.insert(topic.to_string(), entries);
            self
        }

        fn topic_calls(&self) -> Vec<String> {
            self.topic_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KnowledgeStore for StubStore {
        async fn search_similar(
            &self,
            _query_vec: &[f32],
            _threshold: f64,
            max_results: i64,
            _topic_filter: Option<&str>,
        ) -> Result<Vec<Match>> {
            if self.fail_search {
                bail!("connection refused");
            }
            let mut m = self.matches.clone();
            m.truncate(max_results as usize);
            Ok(m)
        }

        async fn fetch_by_topic(&self, topic: &str) -> Result<Vec<KnowledgeEntry>> {
            self.topic_calls.lock().unwrap().push(topic.to_string());
            Ok(self.corpus.get(topic).cloned().unwrap_or_default())
        }

        async fn insert_entry(&self, _entry: &NewKnowledge) -> Result<String> {
            bail!("not supported")
        }

        async fn has_dedup_hash(&self, _hash: &str) -> Result<bool> {
            Ok(false)
        }

        async fn set_status(&self, _kb_id: &str, _status: EntryStatus) -> Result<bool> {
            Ok(false)
        }

        async fn stats(&self) -> Result<StoreStats> {
            Ok(StoreStats::default())
        }
    }

    fn mk_match(id: &str, topic: &str, sim: f64) -> Match {
        Match {
            kb_id: id.to_string(),
            topic: topic.to_string(),
            description: format!("about {}", id),
            similarity: sim,
        }
    }

    fn mk_entry(id: &str, topic: &str, description: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.to_string(),
            topic: topic.to_string(),
            description: description.to_string(),
            references: String::new(),
            author: String::new(),
            embedding: vec![0.0; 4],
            status: EntryStatus::Approved,
            created_at: 0,
        }
    }

    fn params() -> RetrievalParams {
        RetrievalParams {
            match_threshold: 0.5,
            match_count: 10,
            vote_threshold: 3,
            max_chunks: 25,
        }
    }

    #[tokio::test]
    async fn test_dominant_topic_strategy() {
        // Three of four matches share topic A.
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "A", 0.85),
            mk_match("kb-0003", "A", 0.8),
            mk_match("kb-0004", "B", 0.6),
        ])
        .with_corpus(
            "A",
            vec![
                mk_entry("kb-0001", "A", "first"),
                mk_entry("kb-0002", "A", "second"),
                mk_entry("kb-0003", "A", "third"),
                mk_entry("kb-0007", "A", "older fragment never in top-k"),
            ],
        );

        let ctx = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert_eq!(store.topic_calls(), vec!["A"]);
        assert_eq!(ctx.source_label, "Topic: A");
        assert_eq!(
            ctx.contributing_ids,
            vec!["kb-0001", "kb-0002", "kb-0003", "kb-0007"]
        );
        assert!(ctx.text.contains("older fragment never in top-k"));
    }

    #[tokio::test]
    async fn test_mixed_topics_strategy() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "B", 0.8),
        ]);

        let ctx = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert!(store.topic_calls().is_empty());
        assert_eq!(ctx.source_label, MIXED_TOPICS_LABEL);
        assert_eq!(ctx.contributing_ids, vec!["kb-0001", "kb-0002"]);
        assert!(ctx.text.contains("about kb-0001"));
        assert!(ctx.text.contains("about kb-0002"));
    }

    #[tokio::test]
    async fn test_zero_matches_yields_none() {
        let store = StubStore::with_matches(vec![]);
        assert!(consolidate(&store, &params(), &[0.0]).await.is_none());
    }

    #[tokio::test]
    async fn test_vote_threshold_boundary_is_exclusive_below() {
        // Exactly vote_threshold - 1 matches on one topic must stay mixed.
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "A", 0.8),
        ]);

        let ctx = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert!(store.topic_calls().is_empty());
        assert_eq!(ctx.source_label, MIXED_TOPICS_LABEL);
    }

    #[tokio::test]
    async fn test_vote_threshold_boundary_is_inclusive_at() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "A", 0.8),
            mk_match("kb-0003", "A", 0.7),
        ])
        .with_corpus("A", vec![mk_entry("kb-0001", "A", "only one approved")]);

        let ctx = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert_eq!(ctx.source_label, "Topic: A");
    }

    #[tokio::test]
    async fn test_topic_tie_goes_to_first_encountered() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "B", 0.85),
            mk_match("kb-0003", "A", 0.8),
            mk_match("kb-0004", "B", 0.75),
        ])
        .with_corpus("A", vec![mk_entry("kb-0001", "A", "alpha")])
        .with_corpus("B", vec![mk_entry("kb-0002", "B", "beta")]);

        let mut p = params();
        p.vote_threshold = 2;
        let ctx = consolidate(&store, &p, &[0.0]).await.unwrap();
        assert_eq!(store.topic_calls(), vec!["A"]);
        assert_eq!(ctx.source_label, "Topic: A");
    }

    #[tokio::test]
    async fn test_mixed_deduplicates_by_id() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0001", "A", 0.88),
            mk_match("kb-0002", "B", 0.8),
        ]);

        let ctx = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert_eq!(ctx.contributing_ids, vec!["kb-0001", "kb-0002"]);
    }

    #[tokio::test]
    async fn test_mixed_cap_keeps_highest_similarity() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "B", 0.8),
            mk_match("kb-0003", "C", 0.7),
        ]);

        let mut p = params();
        p.max_chunks = 2;
        let ctx = consolidate(&store, &p, &[0.0]).await.unwrap();
        assert_eq!(ctx.contributing_ids, vec!["kb-0001", "kb-0002"]);
    }

    #[tokio::test]
    async fn test_dominant_cap_keeps_earliest_entries() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0002", "A", 0.9),
            mk_match("kb-0003", "A", 0.8),
            mk_match("kb-0004", "A", 0.7),
        ])
        .with_corpus(
            "A",
            vec![
                mk_entry("kb-0001", "A", "one"),
                mk_entry("kb-0002", "A", "two"),
                mk_entry("kb-0003", "A", "three"),
            ],
        );

        let mut p = params();
        p.max_chunks = 2;
        let ctx = consolidate(&store, &p, &[0.0]).await.unwrap();
        assert_eq!(ctx.contributing_ids, vec!["kb-0001", "kb-0002"]);
    }

    #[tokio::test]
    async fn test_store_unavailable_degrades_to_none() {
        let mut store = StubStore::with_matches(vec![mk_match("kb-0001", "A", 0.9)]);
        store.fail_search = true;
        assert!(consolidate(&store, &params(), &[0.0]).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_dominant_corpus_falls_back_to_mixed() {
        // Corpus for A deliberately missing.
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "A", 0.8),
            mk_match("kb-0003", "A", 0.7),
        ]);

        let ctx = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert_eq!(ctx.source_label, MIXED_TOPICS_LABEL);
        assert_eq!(
            ctx.contributing_ids,
            vec!["kb-0001", "kb-0002", "kb-0003"]
        );
    }

    #[tokio::test]
    async fn test_idempotent_for_same_input() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "B", 0.8),
        ]);

        let first = consolidate(&store, &params(), &[0.0]).await.unwrap();
        let second = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert_eq!(first.text, second.text);
        assert_eq!(first.source_label, second.source_label);
        assert_eq!(first.contributing_ids, second.contributing_ids);
    }

    #[tokio::test]
    async fn test_separator_between_descriptions() {
        let store = StubStore::with_matches(vec![
            mk_match("kb-0001", "A", 0.9),
            mk_match("kb-0002", "B", 0.8),
        ]);

        let ctx = consolidate(&store, &params(), &[0.0]).await.unwrap();
        assert_eq!(
            ctx.text,
            format!("about kb-0001{}about kb-0002", CONTEXT_SEPARATOR)
        );
    }
}
