use chrono::{TimeZone, Utc};
use jetso_sieve::{Classifier, ClassifierConfig, FeedEntry, GeminiClassifier, SieveError};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

const GEMINI_PATH: &str = "/v1beta/models/gemini-2.5-flash-lite:generateContent";

fn test_config(api_base: &str) -> ClassifierConfig {
    ClassifierConfig {
        api_base: api_base.to_string(),
        api_key: "test-key".to_string(),
        retry_delay_seconds: 0,
        ..ClassifierConfig::default()
    }
}

fn sample_entry() -> FeedEntry {
    FeedEntry {
        title: "惠康會員優惠".to_string(),
        summary: "憑會員卡消費滿$200即減$20".to_string(),
        published_at: Utc.with_ymd_and_hms(2026, 2, 21, 0, 0, 0).unwrap(),
    }
}

fn verdict_body(text: &str) -> String {
    json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn verdict_is_flattened_to_one_line() {
    init_tracing();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": { "temperature": 0.1 }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(verdict_body(
            "shop=\"惠康\"|payment=\"會員卡\"|min_spend=200|amt=20|\ntext=\"會員滿$200減$20\"|result=1\n",
        ))
        .create_async()
        .await;

    let classifier = GeminiClassifier::new(test_config(&server.url())).unwrap();
    let verdict = classifier.classify(&sample_entry()).await.unwrap();

    assert!(!verdict.contains('\n'));
    assert!(verdict.starts_with("shop=\"惠康\""));
    assert!(verdict.ends_with("result=1"));
    mock.assert_async().await;

    info!("Flattened verdict: {}", verdict);
}

#[tokio::test]
async fn prompt_carries_the_entry_text() {
    init_tracing();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("請分析以下貼文".to_string()),
            Matcher::Regex("惠康會員優惠".to_string()),
            Matcher::Regex("嚴格的優惠分析員".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(verdict_body("shop=\"惠康\"|result=1"))
        .create_async()
        .await;

    let classifier = GeminiClassifier::new(test_config(&server.url())).unwrap();
    classifier.classify(&sample_entry()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn quota_errors_get_exactly_one_retry() {
    init_tracing();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted (e.g. check quota).",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let classifier = GeminiClassifier::new(test_config(&server.url())).unwrap();
    let err = classifier.classify(&sample_entry()).await.unwrap_err();

    assert!(matches!(err, SieveError::QuotaExceeded(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn quota_is_detected_from_the_error_body() {
    init_tracing();

    // Some fronts report exhaustion with a non-429 status.
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "error": {
                    "code": 403,
                    "message": "Quota exceeded for requests per day.",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let classifier = GeminiClassifier::new(test_config(&server.url())).unwrap();
    let err = classifier.classify(&sample_entry()).await.unwrap_err();

    assert!(matches!(err, SieveError::QuotaExceeded(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    init_tracing();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let classifier = GeminiClassifier::new(test_config(&server.url())).unwrap();
    let err = classifier.classify(&sample_entry()).await.unwrap_err();

    assert!(matches!(err, SieveError::Classifier(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_candidates_are_an_error() {
    init_tracing();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GEMINI_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "candidates": [] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let classifier = GeminiClassifier::new(test_config(&server.url())).unwrap();
    let err = classifier.classify(&sample_entry()).await.unwrap_err();

    assert!(matches!(err, SieveError::Classifier(_)));
    mock.assert_async().await;
}
