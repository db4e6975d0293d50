//! Fixed constants for an indexing run and a suggestion query.

/// Documents requested per scroll page.
pub const PAGE_SIZE: usize = 100;
/// Lease kept on the scroll session between page requests.
pub const SCROLL_LEASE: &str = "2m";
/// Suggestion records per bulk request.
pub const BULK_BATCH_SIZE: usize = 100;

pub const TEXT_FIELDS: &[&str] = &["body", "title"];
pub const META_FIELDS: &[&str] = &["viewcount", "answercount"];

pub const MIN_WORD_LEN: usize = 2;
pub const MAX_WORD_LEN: usize = 30;
pub const MAX_SHINGLE_LEN: usize = 3;

/// Hits returned per suggestion query.
pub const SUGGESTION_LIMIT: usize = 20;

pub const DEFAULT_ES_URL: &str = "http://localhost:9200";
pub const DEFAULT_SOURCE_INDEX: &str = "music";
pub const DEFAULT_SUGGEST_INDEX: &str = "music_suggest";

/// Where a run reads documents from and writes suggestions to.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub es_url: String,
    pub source_index: String,
    pub suggest_index: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            es_url: DEFAULT_ES_URL.to_string(),
            source_index: DEFAULT_SOURCE_INDEX.to_string(),
            suggest_index: DEFAULT_SUGGEST_INDEX.to_string(),
        }
    }
}

impl StoreConfig {
    /// Base URL without a trailing slash, so paths can be appended with `/`.
    pub fn base_url(&self) -> &str {
        self.es_url.trim_end_matches('/')
    }
}
