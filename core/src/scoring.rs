//! Ranking policy for suggestion queries.
//!
//! Each piece renders itself into the suggestion store's query DSL and can
//! also score a candidate in process, so the policy is testable without a
//! running store.

use crate::tokenizer::words;
use serde_json::{json, Map, Value};

/// One way a partial input can match a suggestion.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchStrategy {
    /// Prefix match on the unanalyzed keyword form of the suggestion.
    KeywordPrefix { boost: f32 },
    /// Query terms in order, the last one as a prefix, with up to `slop` skipped positions.
    PhrasePrefix { slop: usize, boost: f32 },
    /// Plain term match; at least `minimum_should_match` terms must occur.
    Terms { minimum_should_match: usize, boost: f32 },
}

impl MatchStrategy {
    pub fn boost(&self) -> f32 {
        match *self {
            Self::KeywordPrefix { boost } | Self::PhrasePrefix { boost, .. } | Self::Terms { boost, .. } => boost,
        }
    }

    pub fn to_json(&self, field: &str, partial: &str) -> Value {
        match *self {
            Self::KeywordPrefix { boost } => json!({
                "prefix": { (format!("{field}.kw")): { "value": partial, "boost": boost } }
            }),
            Self::PhrasePrefix { slop, boost } => json!({
                "match_phrase_prefix": { field: { "query": partial, "slop": slop, "boost": boost } }
            }),
            Self::Terms { minimum_should_match, boost } => {
                let mut params = Map::new();
                params.insert("query".into(), partial.into());
                params.insert("minimum_should_match".into(), minimum_should_match.into());
                if boost != 1.0 {
                    params.insert("boost".into(), boost.into());
                }
                json!({ "match": { field: params } })
            }
        }
    }

    /// Boosted score of `suggestion` for `partial`, or `None` when it does not match.
    pub fn score(&self, partial: &str, suggestion: &str) -> Option<f32> {
        let raw = match *self {
            Self::KeywordPrefix { .. } => suggestion.starts_with(partial).then_some(1.0),
            Self::PhrasePrefix { slop, .. } => phrase_prefix_matches(&words(partial), &words(suggestion), slop).then_some(1.0),
            Self::Terms { minimum_should_match, .. } => {
                let query = words(partial);
                let doc = words(suggestion);
                let hits = query.iter().filter(|t| doc.contains(*t)).count();
                (hits > 0 && hits >= minimum_should_match).then(|| hits as f32 / query.len() as f32)
            }
        };
        raw.map(|r| r * self.boost())
    }
}

fn phrase_prefix_matches(query: &[&str], doc: &[&str], slop: usize) -> bool {
    let Some((last, head)) = query.split_last() else { return false };
    let term_at = |qi: usize, pos: usize| {
        if qi == head.len() { doc[pos].starts_with(last) } else { doc[pos] == head[qi] }
    };
    'starts: for start in 0..doc.len() {
        if !term_at(0, start) { continue; }
        let (mut prev, mut skipped) = (start, 0);
        for qi in 1..query.len() {
            // Earliest later position keeps the total skip minimal.
            match (prev + 1..doc.len()).find(|&p| term_at(qi, p)) {
                Some(p) => {
                    skipped += p - prev - 1;
                    prev = p;
                }
                None => continue 'starts,
            }
        }
        if skipped <= slop { return true; }
    }
    false
}

/// Best-of disjunction: the best alternative wins and the others add
/// `tie_breaker` times their score.
#[derive(Debug, Clone, PartialEq)]
pub struct DisMax {
    pub queries: Vec<MatchStrategy>,
    pub tie_breaker: f32,
}

impl DisMax {
    pub fn combine<I: IntoIterator<Item = f32>>(&self, scores: I) -> Option<f32> {
        let (mut best, mut sum, mut any) = (f32::MIN, 0.0f32, false);
        for s in scores {
            best = best.max(s);
            sum += s;
            any = true;
        }
        any.then(|| best + self.tie_breaker * (sum - best))
    }

    pub fn score(&self, partial: &str, suggestion: &str) -> Option<f32> {
        self.combine(self.queries.iter().filter_map(|q| q.score(partial, suggestion)))
    }

    pub fn to_json(&self, field: &str, partial: &str) -> Value {
        let queries: Vec<Value> = self.queries.iter().map(|q| q.to_json(field, partial)).collect();
        json!({ "dis_max": { "tie_breaker": self.tie_breaker, "queries": queries } })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    None,
    /// Common (base 10) logarithm.
    Log,
}

impl Modifier {
    fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Log => "log",
        }
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Self::None => v,
            Self::Log if v > 0.0 => v.log10(),
            Self::Log => 0.0,
        }
    }
}

/// Multiplier derived from a numeric document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValueFactor {
    pub field: String,
    pub modifier: Modifier,
    pub missing: f64,
}

impl FieldValueFactor {
    pub fn factor(&self, value: Option<f64>) -> f64 {
        self.modifier.apply(value.unwrap_or(self.missing))
    }

    pub fn to_json(&self) -> Value {
        json!({ "field": self.field, "missing": self.missing, "modifier": self.modifier.name() })
    }
}

/// Match score multiplied by a frequency factor.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingPolicy {
    pub field: String,
    pub matcher: DisMax,
    pub popularity: FieldValueFactor,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            field: "suggestion".into(),
            matcher: DisMax {
                queries: vec![
                    MatchStrategy::KeywordPrefix { boost: 100.0 },
                    MatchStrategy::PhrasePrefix { slop: 2, boost: 10.0 },
                    MatchStrategy::Terms { minimum_should_match: 1, boost: 1.0 },
                ],
                tie_breaker: 0.5,
            },
            popularity: FieldValueFactor { field: "freq".into(), modifier: Modifier::Log, missing: 1.0 },
        }
    }
}

impl RankingPolicy {
    pub fn score(&self, partial: &str, suggestion: &str, freq: Option<u64>) -> Option<f64> {
        let matched = self.matcher.score(partial, suggestion)?;
        Some(f64::from(matched) * self.popularity.factor(freq.map(|f| f as f64)))
    }

    pub fn to_json(&self, partial: &str) -> Value {
        json!({
            "function_score": {
                "query": self.matcher.to_json(&self.field, partial),
                "boost_mode": "multiply",
                "field_value_factor": self.popularity.to_json()
            }
        })
    }
}
