//! Integration tests for `GeminiClient` using wiremock HTTP mocks.

use instalens_core::Quality;
use instalens_gemini::{AudienceSignals, GeminiClient, GeminiClientConfig, GeminiError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.5-flash";

fn test_client(base_url: &str, api_key: Option<&str>) -> GeminiClient {
    let config = GeminiClientConfig {
        api_key: api_key.map(str::to_owned),
        model: MODEL.to_owned(),
        timeout_secs: 5,
    };
    GeminiClient::with_base_url(&config, base_url).expect("client construction should not fail")
}

fn model_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

async fn mount_image(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/img/p1.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![1u8, 2, 3]),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn analyze_image_parses_fenced_json() {
    let server = MockServer::start().await;
    mount_image(&server).await;

    let reply = "```json\n{\"tags\":[\"travel\",\"nature\",\"travel\"],\"vibe\":\"calm\",\
                 \"quality\":{\"lighting\":\"Natural\",\"visualAppeal\":\"High\",\"consistency\":\"Consistent\"}}\n```";
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .and(header("x-goog-api-key", "key"))
        .and(body_string_contains(r#""mimeType":"image/png""#))
        .and(body_string_contains(r#""data":"AQID""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Some("key"));
    let enrichment = client
        .analyze_image(&format!("{}/img/p1.jpg", server.uri()))
        .await
        .expect("analysis should parse");

    assert_eq!(enrichment.vibe, "calm");
    assert_eq!(enrichment.tags.len(), 2, "duplicate tags collapse");
    assert!(enrichment.tags.contains("nature"));
    match enrichment.quality {
        Quality::Breakdown(q) => assert_eq!(q.visual_appeal, "High"),
        Quality::Label(l) => panic!("expected breakdown, got label {l}"),
    }
}

#[tokio::test]
async fn missing_api_key_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), None);
    let err = client
        .analyze_image(&format!("{}/img/p1.jpg", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::MissingApiKey));

    let err = client
        .infer_demographics(&AudienceSignals::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::MissingApiKey));
}

#[tokio::test]
async fn image_download_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/gone.jpg"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_client(&server.uri(), Some("key"))
        .analyze_image(&format!("{}/img/gone.jpg", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::ImageFetch { status: 403, .. }));
}

#[tokio::test]
async fn oversized_image_is_rejected_before_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/huge.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0u8; instalens_gemini::image::MAX_IMAGE_BYTES + 1]),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let err = test_client(&server.uri(), Some("key"))
        .analyze_image(&format!("{}/img/huge.png", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GeminiError::ImageTooLarge { limit_bytes, .. }
            if limit_bytes == instalens_gemini::image::MAX_IMAGE_BYTES
    ));
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    mount_image(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"code": 429, "message": "Resource has been exhausted"}
        })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri(), Some("key"))
        .analyze_image(&format!("{}/img/p1.jpg", server.uri()))
        .await
        .unwrap_err();
    match err {
        GeminiError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = test_client(&server.uri(), Some("key"))
        .infer_demographics(&AudienceSignals::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::EmptyResponse));
}

#[tokio::test]
async fn infer_demographics_parses_shares() {
    let server = MockServer::start().await;
    let reply = r#"{"genderSplit":[{"name":"Female","value":60},{"name":"Male","value":40}],
                    "ageGroups":[{"name":"18-24","value":50},{"name":"25-34","value":50}],
                    "topGeographies":[{"name":"India","value":35.5}]}"#;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(reply)))
        .mount(&server)
        .await;

    let signals = AudienceSignals {
        username: "alpha",
        full_name: "Alpha",
        followers: 100,
        posts_count: 2,
        captions: vec!["beach day"],
        tags: vec!["travel"],
    };
    let demographics = test_client(&server.uri(), Some("key"))
        .infer_demographics(&signals)
        .await
        .expect("demographics should parse");

    assert_eq!(demographics.gender_split.len(), 2);
    assert_eq!(demographics.gender_split[0].name, "Female");
    assert!((demographics.top_geographies[0].value - 35.5).abs() < f64::EPSILON);
}
