//! Control-channel client tests against a mock JSON-RPC endpoint.
//!
//! The channel is advisory: every failure mode (bad status, garbage body,
//! unreachable service) must degrade to an absent result, never an error.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dlmux::ControlChannel;

const SECRET: &str = "s3cret";

fn channel_for(server: &MockServer) -> ControlChannel {
    ControlChannel::new(server.address().port(), SECRET)
}

#[tokio::test]
async fn enqueue_posts_token_tagged_request_and_returns_gid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_json(json!({
            "jsonrpc": "2.0",
            "id": "dlmux",
            "method": "aria2.addUri",
            "params": [format!("token:{SECRET}"), ["http://example.com/file.zip"]],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "dlmux",
            "result": "gid-2089b05ecca3d829",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    let gid = channel.enqueue("http://example.com/file.zip", None).await;

    assert_eq!(gid.as_deref(), Some("gid-2089b05ecca3d829"));
}

#[tokio::test]
async fn enqueue_forwards_caller_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_json(json!({
            "jsonrpc": "2.0",
            "id": "dlmux",
            "method": "aria2.addUri",
            "params": [
                format!("token:{SECRET}"),
                ["http://example.com/file.zip"],
                {"out": "renamed.zip"},
            ],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "dlmux",
            "result": "gid-1",
        })))
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    let gid = channel
        .enqueue(
            "http://example.com/file.zip",
            Some(json!({"out": "renamed.zip"})),
        )
        .await;

    assert_eq!(gid.as_deref(), Some("gid-1"));
}

#[tokio::test]
async fn engine_version_extracts_nested_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "dlmux",
            "result": {"version": "1.36.0", "enabledFeatures": []},
        })))
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    assert_eq!(channel.engine_version().await.as_deref(), Some("1.36.0"));
}

#[tokio::test]
async fn job_status_returns_result_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_json(json!({
            "jsonrpc": "2.0",
            "id": "dlmux",
            "method": "aria2.tellStatus",
            "params": [format!("token:{SECRET}"), "gid-1"],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "dlmux",
            "result": {"gid": "gid-1", "status": "active", "completedLength": "512"},
        })))
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    let status = channel.job_status("gid-1").await.unwrap();
    assert_eq!(status["status"], "active");
    assert_eq!(status["completedLength"], "512");
}

#[tokio::test]
async fn non_200_status_degrades_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    assert!(channel.call("getVersion", Vec::new()).await.is_none());
}

#[tokio::test]
async fn auth_rejection_degrades_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    assert!(channel.engine_version().await.is_none());
}

#[tokio::test]
async fn garbage_body_degrades_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let channel = channel_for(&server);
    assert!(channel.call("getVersion", Vec::new()).await.is_none());
}

#[tokio::test]
async fn unreachable_service_degrades_to_none() {
    // Port 1 is essentially guaranteed to refuse connections.
    let channel = ControlChannel::new(1, SECRET);
    assert!(channel.engine_version().await.is_none());
    assert!(channel.enqueue("http://example.com/f", None).await.is_none());
    assert!(channel.job_status("gid-1").await.is_none());
}
