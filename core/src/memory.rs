use crate::bulk::{parse_bulk, BulkSink, SuggestionDoc};
use crate::config::SUGGESTION_LIMIT;
use crate::query::SuggestionQuery;
use crate::scoring::RankingPolicy;
use anyhow::Result;
use std::collections::HashMap;

/// Suggestion store held in process. Accepts bulk bodies and answers
/// queries with the same ranking policy the search backend is sent.
#[derive(Default)]
pub struct MemoryStore {
    docs: HashMap<String, SuggestionDoc>,
    policy: RankingPolicy,
    pub bulk_requests: usize,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_policy(policy: RankingPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn get(&self, suggestion: &str) -> Option<&SuggestionDoc> {
        self.docs.values().find(|d| d.suggestion == suggestion)
    }

    pub fn insert(&mut self, id: impl Into<String>, doc: SuggestionDoc) {
        self.docs.insert(id.into(), doc);
    }

    /// Store every action/body pair of an NDJSON bulk body.
    pub fn load_bulk(&mut self, body: &str) -> Result<()> {
        for (action, doc) in parse_bulk::<SuggestionDoc>(body)? {
            let id = match action.index.id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            self.docs.insert(id, doc);
        }
        Ok(())
    }

    /// Ranked suggestions, best first, at most twenty.
    pub fn search(&self, query: &SuggestionQuery) -> Vec<String> {
        let mut scored: Vec<(f64, &str)> = self
            .docs
            .values()
            .filter(|d| query.accepts(d))
            .filter_map(|d| {
                let score = self.policy.score(&query.partial, &d.suggestion, Some(d.freq))?;
                Some((score, d.suggestion.as_str()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().take(SUGGESTION_LIMIT).map(|(_, s)| s.to_string()).collect()
    }
}

impl BulkSink for MemoryStore {
    async fn send_bulk(&mut self, body: String) -> Result<()> {
        self.load_bulk(&body)?;
        self.bulk_requests += 1;
        Ok(())
    }
}
