use rvidgen::{
    builders, AspectRatio, GenAiConfig, GeneratedVideo, Resolution, VideoApi, VideoClient,
    VideoGenError, VideoOperation,
};
use rvidgen::models::ImagePayload;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> VideoClient {
    let config = GenAiConfig::new()
        .with_api_key("test-key")
        .with_base_url(format!("{}/v1beta", server.uri()));
    VideoClient::new(&config).expect("client should build")
}

#[tokio::test]
async fn test_submit_text_to_video() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-3.1-fast-generate-preview:predictLongRunning"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "instances": [{"prompt": "a robot exploring a futuristic city"}],
            "parameters": {"sampleCount": 1, "resolution": "720p", "aspectRatio": "16:9"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo-3.1-fast-generate-preview/operations/op123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = builders::text_to_video(
        "a robot exploring a futuristic city",
        Resolution::P720,
        AspectRatio::Landscape,
    );
    let op = client.generate_videos(params).await.expect("submit should succeed");

    assert_eq!(op.name, "models/veo-3.1-fast-generate-preview/operations/op123");
    assert!(!op.done);
}

#[tokio::test]
async fn test_submit_extend_and_start_end_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-3.1-generate-preview:predictLongRunning"))
        .and(body_partial_json(json!({
            "instances": [{
                "prompt": "and then it rains",
                "video": {"uri": "https://files/prev"}
            }],
            "parameters": {"resolution": "720p", "aspectRatio": "9:16"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/ext"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-3.1-generate-preview:predictLongRunning"))
        .and(body_partial_json(json!({
            "instances": [{
                "image": {"bytesBase64Encoded": "YQ==", "mimeType": "image/png"},
                "lastFrame": {"bytesBase64Encoded": "Yg==", "mimeType": "image/png"}
            }],
            "parameters": {"resolution": "1080p"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/se"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let previous = GeneratedVideo {
        uri: "https://files/prev".to_string(),
        resolution: Resolution::P720,
        aspect_ratio: AspectRatio::Portrait,
    };
    let params = builders::extend_video("and then it rains", previous, AspectRatio::Portrait)
        .expect("valid extension");
    let op = client.generate_videos(params).await.expect("extend should submit");
    assert_eq!(op.name, "operations/ext");

    let image = |b64: &str| ImagePayload {
        image_bytes: b64.to_string(),
        mime_type: "image/png".to_string(),
    };
    let params = builders::start_and_end_images(
        None,
        image("YQ=="),
        image("Yg=="),
        Resolution::P1080,
        AspectRatio::Landscape,
    );
    let op = client.generate_videos(params).await.expect("start/end should submit");
    assert_eq!(op.name, "operations/se");
}

#[tokio::test]
async fn test_poll_returns_generated_video() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models/veo/operations/op123"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo/operations/op123",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [
                        {"video": {"uri": "https://files/abc:download?alt=media"}}
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let op = client
        .get_videos_operation(&VideoOperation::pending("models/veo/operations/op123"))
        .await
        .expect("poll should succeed");

    assert!(op.done);
    assert_eq!(op.video_uri(), Some("https://files/abc:download?alt=media"));
}

#[tokio::test]
async fn test_poll_surfaces_operation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/bad",
            "done": true,
            "error": {"code": 3, "message": "Unsafe prompt"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let op = client
        .get_videos_operation(&VideoOperation::pending("operations/bad"))
        .await
        .expect("transport succeeded");
    let error = op.error.expect("error payload");
    assert_eq!(error.code, Some(3));
    assert_eq!(error.message, "Unsafe prompt");
}

#[tokio::test]
async fn test_not_found_maps_to_credential_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "Requested entity was not found.",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .get_videos_operation(&VideoOperation::pending("operations/gone"))
        .await
        .expect_err("404 should fail");

    assert!(matches!(err, VideoGenError::ApiError { status: 404, .. }));
    assert!(err.is_credential_error());
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = builders::text_to_video("city", Resolution::P720, AspectRatio::Landscape);
    let err = client.generate_videos(params).await.expect_err("500 should fail");

    assert_eq!(err.to_string(), "API error (500): upstream exploded");
    assert!(!err.is_credential_error());
}
