use crate::config::{META_FIELDS, TEXT_FIELDS};
use crate::document::{Document, Metadata};
use crate::normalizer::normalize;
use crate::tokenizer::shingles;
use parking_lot::Mutex;
use rayon::prelude::*;
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashMap};

/// Corpus-wide state of one shingle.
#[derive(Debug, Clone, PartialEq)]
pub struct ShingleRecord {
    pub shingle: String,
    /// Word count, 1..=3.
    pub length: usize,
    /// Sum of per-field occurrence counts over the corpus.
    pub freq: u64,
    /// Distinct metadata snapshots keyed by their content hash.
    pub metadata: BTreeMap<String, Metadata>,
}

impl ShingleRecord {
    pub fn new(shingle: String) -> Self {
        let length = shingle.split(' ').count();
        Self { shingle, length, freq: 0, metadata: BTreeMap::new() }
    }

    pub fn update(&mut self, freq: u32, metadata_key: &str, metadata: &Metadata) {
        self.freq += u64::from(freq);
        if !self.metadata.contains_key(metadata_key) {
            self.metadata.insert(metadata_key.to_string(), metadata.clone());
        }
    }
}

/// Hex SHA-1 of the canonical JSON of a metadata snapshot.
pub fn metadata_key(metadata: &Metadata) -> String {
    // BTreeMap serializes with sorted keys, so equal snapshots hash equally.
    let json = serde_json::to_vec(metadata).unwrap_or_default();
    let mut hasher = Sha1::new();
    hasher.update(&json);
    format!("{:x}", hasher.finalize())
}

/// Shingles and metadata extracted from one document, ready to merge.
#[derive(Debug, Default)]
pub struct DocumentShingles {
    pub metadata: Metadata,
    /// One count map per text field.
    pub fields: Vec<HashMap<String, u32>>,
}

impl DocumentShingles {
    pub fn extract(doc: &Document) -> Self {
        let fields = TEXT_FIELDS.iter().map(|f| shingles(&normalize(doc.text(f)))).collect();
        Self { metadata: doc.metadata(META_FIELDS), fields }
    }
}

/// The run-wide shingle aggregate.
///
/// Extraction runs without holding the lock; each document's merge takes the
/// lock once, so frequency increments and metadata inserts are never lost or
/// duplicated under concurrent use.
#[derive(Default)]
pub struct Aggregator {
    records: Mutex<HashMap<String, ShingleRecord>>,
}

impl Aggregator {
    pub fn new() -> Self { Self::default() }

    pub fn add_document(&self, doc: &Document) {
        self.merge(DocumentShingles::extract(doc));
    }

    /// Process a page of documents in parallel. Blocks until the whole page is merged.
    pub fn add_batch(&self, docs: &[Document]) {
        docs.par_iter().for_each(|doc| self.add_document(doc));
    }

    pub fn merge(&self, extracted: DocumentShingles) {
        let key = metadata_key(&extracted.metadata);
        let mut records = self.records.lock();
        for field in extracted.fields {
            for (shingle, freq) in field {
                records
                    .entry(shingle)
                    .or_insert_with_key(|s| ShingleRecord::new(s.clone()))
                    .update(freq, &key, &extracted.metadata);
            }
        }
    }

    pub fn len(&self) -> usize { self.records.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn get(&self, shingle: &str) -> Option<ShingleRecord> {
        self.records.lock().get(shingle).cloned()
    }

    /// End the run, handing back every record.
    pub fn into_records(self) -> Vec<ShingleRecord> {
        self.records.into_inner().into_values().collect()
    }
}
