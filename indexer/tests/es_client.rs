use indexer::EsClient;
use serde_json::{json, Value};
use suggest_core::bulk::{parse_bulk, suggest_index_mapping, IndexWriter, SuggestionDoc};
use suggest_core::memory::MemoryStore;
use suggest_core::query::SuggestionQuery;
use suggest_core::{build_suggestions, ShingleRecord};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(scroll_id: &str, hits: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "_scroll_id": scroll_id,
        "hits": { "total": { "value": 3 }, "hits": hits }
    }))
}

fn hit(id: &str, body: &str, views: &str) -> Value {
    json!({ "_index": "music", "_id": id, "_source": { "body": body, "title": "", "viewcount": views, "answercount": "1" } })
}

async fn mount_corpus(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/music/_search"))
        .and(query_param("scroll", "2m"))
        .and(query_param("size", "100"))
        .respond_with(page("s1", vec![hit("1", "<p>jazz piano</p>", "1000"), hit("2", "jazz hands", "10")]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .and(body_partial_json(json!({ "scroll_id": "s1", "scroll": "2m" })))
        .respond_with(page("s2", vec![hit("3", "Jazz piano, again.", "1000")]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .and(body_partial_json(json!({ "scroll_id": "s2" })))
        .respond_with(page("s2", vec![]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/_search/scroll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn scrolls_whole_corpus_then_releases() {
    let server = MockServer::start().await;
    mount_corpus(&server).await;

    let client = EsClient::new(&server.uri()).unwrap();
    let mut source = client.scroll("music");
    let mut store = MemoryStore::new();
    let stats = build_suggestions(&mut source, &mut store, "music_suggest").await.unwrap();

    assert_eq!(stats.documents, 3);
    assert_eq!(store.get("jazz piano").unwrap().freq, 2);
    assert_eq!(store.get("jazz").unwrap().meta.len(), 2);
    let hits = store.search(&SuggestionQuery::new("jazz", 100, 0));
    assert!(hits.contains(&"jazz piano".to_string()));
    assert!(!hits.contains(&"jazz hands".to_string()));
}

#[tokio::test]
async fn full_run_writes_bulk_batches() {
    let server = MockServer::start().await;
    mount_corpus(&server).await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(header("content-type", "application/x-ndjson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "took": 3, "errors": false, "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    let mut source = client.scroll("music");
    let mut sink = client.bulk();
    let stats = build_suggestions(&mut source, &mut sink, "music_suggest").await.unwrap();
    assert_eq!(stats.batches, 1);
    assert_eq!(sink.requests, 1);

    let requests = server.received_requests().await.unwrap();
    let bulk = requests.iter().find(|r| r.url.path() == "/_bulk").unwrap();
    let body = String::from_utf8(bulk.body.clone()).unwrap();
    let docs: Vec<(_, SuggestionDoc)> = parse_bulk(&body).unwrap();
    assert_eq!(docs.len() as u64, stats.shingles);
    let piano = docs.iter().find(|(_, d)| d.suggestion == "jazz piano").unwrap();
    assert_eq!(piano.0.index.index, "music_suggest");
    assert_eq!(piano.1.length, 2);
}

#[tokio::test]
async fn bulk_batches_hold_a_hundred_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "errors": false, "items": [] })))
        .expect(3)
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    let mut sink = client.bulk();
    let records = (0..250).map(|i| ShingleRecord::new(format!("take{i}")));
    let stats = IndexWriter::new(&mut sink, "music_suggest", 100).write_all(records).await.unwrap();
    assert_eq!(stats.batches, 3);
    let lines: Vec<usize> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).lines().count())
        .collect();
    assert_eq!(lines, vec![200, 200, 100]);
}

#[tokio::test]
async fn bulk_item_errors_fail_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": true,
            "items": [{ "index": { "_id": "0", "status": 400, "error": { "type": "mapper_parsing_exception" } } }]
        })))
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    let err = client.post_bulk("{}\n{}\n".into()).await.unwrap_err();
    assert!(err.to_string().contains("mapper_parsing_exception"));
}

#[tokio::test]
async fn transport_errors_are_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/music/_search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    let mut source = client.scroll("music");
    let mut store = MemoryStore::new();
    let err = build_suggestions(&mut source, &mut store, "music_suggest").await.unwrap_err();
    assert!(format!("{err:#}").contains("503"));
    assert_eq!(store.bulk_requests, 0);
}

#[tokio::test]
async fn page_without_scroll_id_fails_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/music/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": { "hits": [hit("1", "jazz piano", "1000")] }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    let mut source = client.scroll("music");
    let mut store = MemoryStore::new();
    let err = build_suggestions(&mut source, &mut store, "music_suggest").await.unwrap_err();
    assert!(err.to_string().contains("no _scroll_id"));
    assert_eq!(store.bulk_requests, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn failed_scroll_still_releases_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/music/_search"))
        .respond_with(page("s1", vec![hit("1", "jazz piano", "1000")]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/_search/scroll"))
        .and(body_partial_json(json!({ "scroll_id": ["s1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "succeeded": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    let mut source = client.scroll("music");
    let mut store = MemoryStore::new();
    let err = build_suggestions(&mut source, &mut store, "music_suggest").await.unwrap_err();
    assert!(format!("{err:#}").contains("500"));
    assert_eq!(store.bulk_requests, 0);
}

#[tokio::test]
async fn creates_missing_suggestion_index() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/music_suggest"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/music_suggest"))
        .and(body_partial_json(json!({ "mappings": { "properties": { "meta": { "type": "nested" } } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    assert!(client.ensure_index("music_suggest", &suggest_index_mapping()).await.unwrap());
}

#[tokio::test]
async fn leaves_existing_index_alone() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/music_suggest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = EsClient::new(&server.uri()).unwrap();
    assert!(!client.ensure_index("music_suggest", &suggest_index_mapping()).await.unwrap());
}
