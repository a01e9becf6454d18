//! Integration tests for the phrase admin client
//!
//! These tests drive the list and form controllers against a mocked phrase
//! API and check the requests that reach the server, in order.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, Request, ResponseTemplate,
};

use phrase_admin::{
    api::ApiClient,
    cache::QueryCache,
    config::Config,
    form::SubmitOutcome,
    list::{DeleteOutcome, ListController},
    models::{SortField, SortOrder},
    notify::RecordingNotifier,
};

// ==================== Test Helpers ====================

const DEBOUNCE: Duration = Duration::from_millis(100);

struct Harness {
    server: MockServer,
    list: ListController,
    cache: Arc<QueryCache>,
    notifier: Arc<RecordingNotifier>,
}

/// Mock server with languages and search mounted, and a mounted list view
async fn harness() -> Harness {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/phrase/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([
                {"language": "English", "code": "en"},
                {"language": "Spanish", "code": "es"},
                {"language": "French", "code": "fr"}
            ]),
            "/phrase/languages",
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/phrase/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!([saved_phrase()]),
            "/phrase/search",
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/phrase/p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(saved_phrase(), "/phrase/p1")),
        )
        .mount(&server)
        .await;

    let mut config = Config::for_api(&server.uri());
    config.search_debounce = DEBOUNCE;
    let client = ApiClient::new(&config).expect("Failed to build client");
    let cache = Arc::new(QueryCache::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let list = ListController::new(&config, &client, &cache, notifier.clone());

    list.mount().await.expect("Failed to mount list");

    Harness {
        server,
        list,
        cache,
        notifier,
    }
}

fn envelope(data: Value, path: &str) -> Value {
    json!({
        "success": true,
        "statusCode": 200,
        "data": data,
        "errors": {},
        "path": path,
        "message": "OK"
    })
}

fn saved_phrase() -> Value {
    json!({
        "id": "p1",
        "phrase": "Good morning",
        "status": "active",
        "createdAt": "2024-03-01T09:00:00Z",
        "updatedAt": "2024-03-01T09:00:00Z",
        "translations": [
            {"id": "t-es", "phraseId": "p1", "language": "es", "text": "Buenos días"},
            {"id": "t-fr", "phraseId": "p1", "language": "fr", "text": "Bonjour"}
        ]
    })
}

/// Requests that change server state, as `"METHOD /path"`
async fn writes(server: &MockServer) -> Vec<String> {
    requests(server)
        .await
        .into_iter()
        .filter(|r| r.method.as_str() != "GET")
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}

async fn requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("Request recording is disabled")
}

async fn searches(server: &MockServer) -> Vec<Request> {
    requests(server)
        .await
        .into_iter()
        .filter(|r| r.url.path() == "/phrase/search")
        .collect()
}

fn query_value(request: &Request, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

// ==================== Create Workflow ====================

#[tokio::test]
async fn test_create_sends_one_request_then_one_refresh() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/phrase"))
        .and(body_json(json!({
            "phrase": "Thank you",
            "status": "pending",
            "translations": [
                {"language": "es", "text": "Gracias"},
                {"language": "fr", "text": "Merci"}
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(envelope(
            json!({"id": "p2", "phrase": "Thank you", "status": "pending"}),
            "/phrase",
        )))
        .expect(1)
        .mount(&h.server)
        .await;
    let searches_before = searches(&h.server).await.len();

    h.list.open_create_form().await.expect("open");
    {
        let mut form = h.list.form().await;
        assert_eq!(
            form.language_options(),
            vec!["English (en)", "Spanish (es)", "French (fr)"]
        );
        form.set_phrase("Thank you");
        form.set_status("pending");
        form.set_translation_language(0, "es").unwrap();
        form.set_translation_text(0, "Gracias").unwrap();
        form.add_translation();
        form.set_translation_language(1, "fr").unwrap();
        form.set_translation_text(1, "Merci").unwrap();
    }

    let outcome = h.list.submit_form().await;

    assert!(matches!(outcome, SubmitOutcome::Created(Some(ref p)) if p.id == "p2"));
    assert_eq!(writes(&h.server).await, vec!["POST /phrase"]);
    assert_eq!(searches(&h.server).await.len(), searches_before + 1);
    assert!(!h.list.form().await.is_open());
    assert_eq!(h.notifier.messages(), vec!["Phrase created successfully"]);
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let h = harness().await;

    h.list.open_create_form().await.expect("open");
    h.list.form().await.set_status("archived");

    let outcome = h.list.submit_form().await;

    let SubmitOutcome::Invalid(report) = outcome else {
        panic!("Expected validation failure, got {:?}", outcome);
    };
    assert_eq!(report.message_for("phrase"), Some("Phrase is required"));
    assert!(report.message_for("status").is_some());
    assert_eq!(
        report.message_for("translations.0.language"),
        Some("Language is required")
    );
    assert!(writes(&h.server).await.is_empty());
    assert!(h.list.form().await.is_open());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_failed_create_keeps_input() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/phrase"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "statusCode": 400,
            "data": null,
            "errors": {"phrase": "Phrase already exists"},
            "path": "/phrase",
            "message": "Bad Request"
        })))
        .mount(&h.server)
        .await;

    h.list.open_create_form().await.expect("open");
    {
        let mut form = h.list.form().await;
        form.set_phrase("Good morning");
        form.set_translation_language(0, "es").unwrap();
        form.set_translation_text(0, "Buenos días").unwrap();
    }

    let outcome = h.list.submit_form().await;

    let SubmitOutcome::Failed(error) = outcome else {
        panic!("Expected request failure, got {:?}", outcome);
    };
    assert_eq!(error.status_code(), Some(400));
    assert_eq!(
        error.field_errors().and_then(|e| e.get("phrase")).map(String::as_str),
        Some("Phrase already exists")
    );
    let form = h.list.form().await;
    assert!(form.is_open());
    assert_eq!(form.values().phrase, "Good morning");
    assert_eq!(h.notifier.messages(), vec!["Failed to create phrase"]);
}

// ==================== Edit Workflow ====================

#[tokio::test]
async fn test_edit_deletes_removed_translations_before_update() {
    let h = harness().await;
    Mock::given(method("DELETE"))
        .and(path("/phrase/translations"))
        .and(body_json(json!({"ids": ["t-fr"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            json!({"deleted": 1}),
            "/phrase/translations",
        )))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/phrase/p1"))
        .and(body_json(json!({
            "id": "p1",
            "phrase": "Good morning!",
            "status": "active",
            "translations": [
                {"id": "t-es", "language": "es", "text": "¡Buenos días!"}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(saved_phrase(), "/phrase/p1")),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    h.list.open_edit_form("p1").await.expect("open");
    {
        let mut form = h.list.form().await;
        assert_eq!(form.values().translations.len(), 2);
        assert!(form.is_language_locked(0));
        assert!(form.set_translation_language(0, "en").is_err());

        form.set_phrase("Good morning!");
        form.set_translation_text(0, "¡Buenos días!").unwrap();
        form.remove_translation(1).unwrap();
        assert_eq!(form.removed_translation_ids(), ["t-fr".to_string()]);
    }

    let outcome = h.list.submit_form().await;

    assert!(matches!(outcome, SubmitOutcome::Updated(_)));
    assert_eq!(
        writes(&h.server).await,
        vec!["DELETE /phrase/translations", "PATCH /phrase/p1"]
    );
    assert_eq!(
        h.notifier.messages(),
        vec!["Translations deleted successfully", "Phrase updated successfully"]
    );
    assert!(!h.list.form().await.is_open());
}

#[tokio::test]
async fn test_failed_translation_delete_skips_update() {
    let h = harness().await;
    Mock::given(method("DELETE"))
        .and(path("/phrase/translations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&h.server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    h.list.open_edit_form("p1").await.expect("open");
    h.list.form().await.remove_translation(0).unwrap();

    let outcome = h.list.submit_form().await;

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert_eq!(writes(&h.server).await, vec!["DELETE /phrase/translations"]);
    let form = h.list.form().await;
    assert!(form.is_open());
    assert_eq!(form.removed_translation_ids(), ["t-es".to_string()]);
    assert_eq!(h.notifier.messages(), vec!["Failed to delete translations"]);
}

#[tokio::test]
async fn test_edit_without_removals_only_updates() {
    let h = harness().await;
    Mock::given(method("PATCH"))
        .and(path("/phrase/p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(saved_phrase(), "/phrase/p1")),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    h.list.open_edit_form("p1").await.expect("open");
    h.list.form().await.set_status("spam");

    let outcome = h.list.submit_form().await;

    assert!(outcome.is_success());
    assert_eq!(writes(&h.server).await, vec!["PATCH /phrase/p1"]);
}

#[tokio::test]
async fn test_cancelled_edit_sends_nothing() {
    let h = harness().await;

    h.list.open_edit_form("p1").await.expect("open");
    h.list.form().await.remove_translation(1).unwrap();
    h.list.close_form().await;

    let form = h.list.form().await;
    assert!(!form.is_open());
    assert!(form.removed_translation_ids().is_empty());
    assert!(writes(&h.server).await.is_empty());
}

// ==================== Search Workflow ====================

#[tokio::test]
async fn test_mount_searches_translation_text() {
    let h = harness().await;

    let initial = searches(&h.server).await;
    assert_eq!(initial.len(), 1);
    assert_eq!(query_value(&initial[0], "query").as_deref(), Some(""));
    assert_eq!(query_value(&initial[0], "sort").as_deref(), Some("phrase:asc"));
    assert_eq!(
        query_value(&initial[0], "searchFields").as_deref(),
        Some("phrase,status,translations.text")
    );
    assert_eq!(h.list.phrases().map(|rows| rows.len()), Some(1));
}

#[tokio::test]
async fn test_burst_of_changes_yields_single_search() {
    let h = harness().await;

    h.list.set_search_term("g");
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.list.set_search_term("goo");
    h.list.set_sort_field(SortField::TranslationLanguage, true);
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.list.set_sort_order(SortOrder::Desc);
    h.list.set_search_term("good");

    tokio::time::sleep(DEBOUNCE * 4).await;

    let all = searches(&h.server).await;
    assert_eq!(all.len(), 2);
    let live = &all[1];
    assert_eq!(query_value(live, "query").as_deref(), Some("good"));
    assert_eq!(
        query_value(live, "sort").as_deref(),
        Some("phrase:desc,translations.language:desc")
    );
    assert_eq!(query_value(live, "searchFields").as_deref(), Some("phrase,status"));
}

#[tokio::test]
async fn test_no_sort_fields_omits_sort() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/phrase/search"))
        .and(query_param("query", "hola"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]), "/phrase/search")))
        .with_priority(1)
        .mount(&h.server)
        .await;

    h.list.set_sort_field(SortField::Phrase, false);
    h.list.set_search_term("hola");
    tokio::time::sleep(DEBOUNCE * 4).await;

    let all = searches(&h.server).await;
    let live = all.last().expect("live search");
    assert_eq!(query_value(live, "sort"), None);
    assert_eq!(h.list.phrases().map(|rows| rows.len()), Some(0));
}

// ==================== Delete Workflow ====================

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let h = harness().await;
    Mock::given(method("DELETE"))
        .and(path("/phrase/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}), "/phrase/p1")))
        .expect(1)
        .mount(&h.server)
        .await;

    h.list.request_delete("p1");
    h.list.cancel_delete();
    assert!(writes(&h.server).await.is_empty());

    h.list.request_delete("p1");
    let outcome = h.list.confirm_delete().await;

    assert_eq!(outcome, DeleteOutcome::Deleted("p1".to_string()));
    assert_eq!(writes(&h.server).await, vec!["DELETE /phrase/p1"]);
    assert_eq!(searches(&h.server).await.len(), 2);
    assert_eq!(h.notifier.messages(), vec!["Phrase deleted successfully"]);
}

// ==================== Teardown ====================

#[tokio::test]
async fn test_teardown_clears_cache() {
    let h = harness().await;
    assert!(!h.cache.is_empty());

    h.list.unmount();
    h.cache.clear();

    assert!(h.cache.is_empty());
    assert!(!h.list.is_mounted());
}
