use crate::bulk::SuggestionDoc;
use crate::config::SUGGESTION_LIMIT;
use crate::normalizer::fold;
use crate::scoring::RankingPolicy;
use crate::tokenizer::word_count;
use anyhow::{anyhow, Result};
use serde_json::{json, Value};

/// One search-as-you-type request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionQuery {
    /// Partial input, folded the way indexed text is.
    pub partial: String,
    pub min_views: i64,
    pub min_answers: i64,
}

impl SuggestionQuery {
    pub fn new(partial: &str, min_views: i64, min_answers: i64) -> Self {
        Self { partial: fold(partial), min_views, min_answers }
    }

    /// Fewest words a suggestion may have: as many as the partial input holds.
    pub fn min_length(&self) -> usize { word_count(&self.partial) }

    /// Both thresholds must hold within a single metadata snapshot.
    pub fn meta_filter(&self) -> Value {
        json!({
            "nested": {
                "path": "meta",
                "query": {
                    "bool": {
                        "must": [
                            { "range": { "meta.viewcount": { "gte": self.min_views } } },
                            { "range": { "meta.answercount": { "gte": self.min_answers } } }
                        ]
                    }
                }
            }
        })
    }

    pub fn to_json(&self, policy: &RankingPolicy) -> Value {
        json!({
            "query": {
                "bool": {
                    "must": policy.to_json(&self.partial),
                    "filter": {
                        "bool": {
                            "must": [
                                { "range": { "length": { "gte": self.min_length() } } },
                                self.meta_filter()
                            ]
                        }
                    }
                }
            },
            "size": SUGGESTION_LIMIT,
            "_source": ["suggestion"]
        })
    }

    /// In-process form of the filter clause.
    pub fn accepts(&self, doc: &SuggestionDoc) -> bool {
        doc.length >= self.min_length()
            && doc.meta.iter().any(|m| {
                m.get("viewcount").is_some_and(|&v| v >= self.min_views)
                    && m.get("answercount").is_some_and(|&a| a >= self.min_answers)
            })
    }
}

/// Pull the suggestion texts out of a search response, in hit order.
pub fn suggestions_from_response(response: &Value) -> Result<Vec<String>> {
    let hits = response["hits"]["hits"].as_array().ok_or_else(|| anyhow!("search response has no hits array"))?;
    Ok(hits
        .iter()
        .filter_map(|h| h["_source"]["suggestion"].as_str().map(str::to_string))
        .collect())
}
