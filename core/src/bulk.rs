use crate::aggregate::ShingleRecord;
use crate::document::Metadata;
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Document body stored in the suggestion index, one per shingle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionDoc {
    pub suggestion: String,
    pub freq: u64,
    pub length: usize,
    #[serde(default)]
    pub meta: Vec<Metadata>,
}

impl From<ShingleRecord> for SuggestionDoc {
    fn from(r: ShingleRecord) -> Self {
        Self { suggestion: r.shingle, freq: r.freq, length: r.length, meta: r.metadata.into_values().collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkAction {
    pub index: BulkTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkTarget {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: Value,
}

/// Append one action/body pair to an NDJSON bulk body.
pub fn push_pair<T: Serialize>(body: &mut String, index: &str, id: Value, doc: &T) -> Result<()> {
    let action = BulkAction { index: BulkTarget { index: index.to_string(), id } };
    body.push_str(&serde_json::to_string(&action)?);
    body.push('\n');
    body.push_str(&serde_json::to_string(doc)?);
    body.push('\n');
    Ok(())
}

/// Split an NDJSON bulk body back into action/body pairs.
pub fn parse_bulk<T: DeserializeOwned>(body: &str) -> Result<Vec<(BulkAction, T)>> {
    let mut lines = body.lines().filter(|l| !l.trim().is_empty());
    let mut pairs = Vec::new();
    while let Some(action) = lines.next() {
        let action: BulkAction = serde_json::from_str(action).context("bulk action line")?;
        let doc = lines.next().ok_or_else(|| anyhow!("bulk action without a document body"))?;
        pairs.push((action, serde_json::from_str(doc).context("bulk document line")?));
    }
    Ok(pairs)
}

/// Receiver of NDJSON bulk requests.
#[allow(async_fn_in_trait)]
pub trait BulkSink {
    /// Write one batch. Any error fails the run.
    async fn send_bulk(&mut self, body: String) -> Result<()>;
}

/// Mapping the suggestion index needs for the ranked query.
pub fn suggest_index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "suggestion": {
                    "type": "text",
                    "fields": { "kw": { "type": "keyword" } }
                },
                "freq": { "type": "long" },
                "length": { "type": "integer" },
                "meta": {
                    "type": "nested",
                    "properties": {
                        "viewcount": { "type": "long" },
                        "answercount": { "type": "long" }
                    }
                }
            }
        }
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub records: u64,
    pub batches: u64,
}

/// Serializes shingle records into bulk batches of a fixed size.
pub struct IndexWriter<'a, S: BulkSink> {
    sink: &'a mut S,
    index: String,
    batch_size: usize,
    body: String,
    pending: usize,
    stats: WriteStats,
}

impl<'a, S: BulkSink> IndexWriter<'a, S> {
    pub fn new(sink: &'a mut S, index: impl Into<String>, batch_size: usize) -> Self {
        Self { sink, index: index.into(), batch_size: batch_size.max(1), body: String::new(), pending: 0, stats: WriteStats::default() }
    }

    pub async fn push(&mut self, record: ShingleRecord) -> Result<()> {
        let id = Value::from(self.stats.records);
        push_pair(&mut self.body, &self.index, id, &SuggestionDoc::from(record))?;
        self.pending += 1;
        self.stats.records += 1;
        if self.pending == self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        if self.pending == 0 { return Ok(()); }
        let body = std::mem::take(&mut self.body);
        self.sink.send_bulk(body).await.with_context(|| format!("bulk batch {} failed", self.stats.batches + 1))?;
        self.pending = 0;
        self.stats.batches += 1;
        tracing::debug!(records = self.stats.records, batches = self.stats.batches, "flushed bulk batch");
        Ok(())
    }

    pub fn stats(&self) -> WriteStats { self.stats }

    /// Flush the final partial batch.
    pub async fn finish(mut self) -> Result<WriteStats> {
        self.flush().await?;
        Ok(self.stats)
    }

    pub async fn write_all<I: IntoIterator<Item = ShingleRecord>>(mut self, records: I) -> Result<WriteStats> {
        for r in records {
            self.push(r).await?;
        }
        self.finish().await
    }
}
