//! Loads a Stack Exchange `Posts.xml` dump into the source index, giving the
//! suggestion build a corpus to read.

use anyhow::{anyhow, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use std::io::BufRead;
use suggest_core::bulk::push_pair;
use suggest_core::BulkSink;

/// Row attributes copied into the source index, stored under lower-cased names.
pub const POST_FIELDS: &[&str] = &[
    "Body", "Title", "CreationDate", "Score", "ViewCount", "AnswerCount", "CommentCount", "FavoriteCount",
];

/// Documents per bulk request.
pub const LOAD_BATCH_DOCS: usize = 1000;

struct Row {
    id: String,
    fields: Map<String, Value>,
}

fn read_row(e: &BytesStart) -> Result<Option<Row>> {
    let mut id = None;
    let mut fields = Map::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        if key == "Id" {
            id = Some(attr.unescape_value()?.into_owned());
        } else if POST_FIELDS.contains(&key) {
            fields.insert(key.to_lowercase(), Value::String(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(id.map(|id| Row { id, fields }))
}

/// Stream `row` elements from `xml` into `index`. Returns the number of documents sent.
pub async fn load_posts<R: BufRead, W: BulkSink>(xml: R, sink: &mut W, index: &str) -> Result<u64> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut body = String::new();
    let (mut pending, mut loaded) = (0usize, 0u64);

    loop {
        let row = match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"row" => read_row(&e)?,
            Ok(Event::Eof) => break,
            Ok(_) => None,
            Err(e) => return Err(anyhow!("malformed XML at byte {}: {e}", reader.buffer_position())),
        };
        buf.clear();
        let Some(row) = row else { continue };

        push_pair(&mut body, index, Value::String(row.id), &row.fields)?;
        pending += 1;
        if pending == LOAD_BATCH_DOCS {
            sink.send_bulk(std::mem::take(&mut body)).await?;
            loaded += pending as u64;
            pending = 0;
            tracing::info!(documents = loaded, "indexed batch");
        }
    }
    if pending > 0 {
        sink.send_bulk(body).await?;
        loaded += pending as u64;
    }
    tracing::info!(documents = loaded, index, "load complete");
    Ok(loaded)
}
