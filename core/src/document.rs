use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Numeric attributes of one document, keyed by field name.
/// A `BTreeMap` keeps keys sorted so the JSON form is canonical.
pub type Metadata = BTreeMap<String, i64>;

/// One corpus record as returned by the source store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl Document {
    pub fn new(source: Value) -> Self {
        let source = match source {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { id: None, source }
    }

    /// Text of a named field; missing or non-string fields read as empty.
    pub fn text(&self, field: &str) -> &str {
        self.source.get(field).and_then(Value::as_str).unwrap_or("")
    }

    /// Snapshot of the requested numeric fields that are present on this document.
    /// Numbers and numeric strings are accepted; anything else is treated as absent.
    pub fn metadata(&self, fields: &[&str]) -> Metadata {
        fields
            .iter()
            .filter_map(|&f| numeric(self.source.get(f)?).map(|n| (f.to_string(), n)))
            .collect()
    }
}

fn numeric(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_read_as_empty() {
        let doc = Document::new(json!({ "title": 7, "viewcount": "12", "answercount": null }));
        assert_eq!(doc.text("body"), "");
        assert_eq!(doc.text("title"), "");
        let meta = doc.metadata(&["viewcount", "answercount"]);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta["viewcount"], 12);
    }

    #[test]
    fn deserializes_search_hit() {
        let hit = json!({ "_id": "9", "_index": "music", "_source": { "body": "<p>hi</p>", "viewcount": 40 } });
        let doc: Document = serde_json::from_value(hit).unwrap();
        assert_eq!(doc.id.as_deref(), Some("9"));
        assert_eq!(doc.text("body"), "<p>hi</p>");
        assert_eq!(doc.metadata(&["viewcount"])["viewcount"], 40);
    }
}
