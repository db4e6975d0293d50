pub mod aggregate;
pub mod bulk;
pub mod config;
pub mod document;
pub mod memory;
pub mod normalizer;
pub mod persist;
pub mod query;
pub mod reader;
pub mod scoring;
pub mod tokenizer;

pub use aggregate::{Aggregator, ShingleRecord};
pub use bulk::{BulkSink, IndexWriter, SuggestionDoc};
pub use document::{Document, Metadata};
pub use query::SuggestionQuery;
pub use reader::{build_suggestions, CorpusReader, DocumentSource, RunStats};
