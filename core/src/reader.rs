use crate::aggregate::Aggregator;
use crate::bulk::{BulkSink, IndexWriter};
use crate::config::BULK_BATCH_SIZE;
use crate::document::Document;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

/// Paginated source of corpus documents.
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
    /// The next page of documents. An empty page means the corpus is exhausted.
    async fn next_page(&mut self) -> Result<Vec<Document>>;

    /// Give back any pagination session held on the store.
    async fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drives a source page by page into an aggregator.
pub struct CorpusReader<'a, S: DocumentSource> {
    source: &'a mut S,
}

impl<'a, S: DocumentSource> CorpusReader<'a, S> {
    pub fn new(source: &'a mut S) -> Self { Self { source } }

    /// Read every page, finishing each before requesting the next.
    /// Returns the number of documents processed. The pagination session is
    /// released whether or not the read succeeds.
    pub async fn read_into(self, aggregator: &Arc<Aggregator>) -> Result<u64> {
        let outcome = Self::drain(&mut *self.source, aggregator).await;
        if let Err(e) = self.source.release().await {
            tracing::warn!(error = %e, "could not release pagination session");
        }
        outcome
    }

    async fn drain(source: &mut S, aggregator: &Arc<Aggregator>) -> Result<u64> {
        let mut processed = 0u64;
        loop {
            let page = source.next_page().await?;
            if page.is_empty() { break; }
            let count = page.len() as u64;
            // Extraction fans out over rayon; keep it off the async workers.
            let agg = Arc::clone(aggregator);
            tokio::task::spawn_blocking(move || agg.add_batch(&page))
                .await
                .context("page extraction task failed")?;
            processed += count;
            tracing::info!(docs = processed, shingles = aggregator.len(), "processed page");
        }
        Ok(processed)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub documents: u64,
    pub shingles: u64,
    pub batches: u64,
}

/// One full rebuild: read the whole corpus, then write every aggregated shingle.
/// Nothing is written unless the read completes.
pub async fn build_suggestions<S, W>(source: &mut S, sink: &mut W, suggest_index: &str) -> Result<RunStats>
where
    S: DocumentSource,
    W: BulkSink,
{
    let aggregator = Arc::new(Aggregator::new());
    let documents = CorpusReader::new(source).read_into(&aggregator).await?;
    tracing::info!(documents, shingles = aggregator.len(), "corpus read complete");
    let aggregator = Arc::try_unwrap(aggregator).map_err(|_| anyhow!("aggregate still shared after read"))?;

    let written = IndexWriter::new(sink, suggest_index, BULK_BATCH_SIZE)
        .write_all(aggregator.into_records())
        .await?;
    tracing::info!(records = written.records, batches = written.batches, "suggestion index written");
    Ok(RunStats { documents, shingles: written.records, batches: written.batches })
}
