//! Secret values and passwords must never reach the logs.

mod common;

use common::{TestApp, NOW};
use ephemera::domain::SecretString;
use serde_json::json;
use tracing_test::traced_test;

const PLAINTEXT: &str = "plaintext-canary-7f3a";
const PASSWORD: &str = "password-canary-91c2";

#[tokio::test]
#[traced_test]
async fn lifecycle_logs_ids_but_not_secrets() {
    let app = TestApp::new();
    let created = app
        .manager
        .create(SecretString::new(PLAINTEXT), Some(SecretString::new(PASSWORD)), Some(NOW + 60))
        .await
        .unwrap();

    app.manager.check(created.id.as_str()).await.unwrap();
    let _ = app.manager.retrieve(created.id.as_str(), Some(SecretString::new("wrong"))).await;
    let value =
        app.manager.retrieve(created.id.as_str(), Some(SecretString::new(PASSWORD))).await.unwrap();
    assert_eq!(value.expose_secret(), PLAINTEXT);

    assert!(logs_contain("Secret created"));
    assert!(logs_contain("Secret retrieved and deleted"));
    assert!(logs_contain(created.id.as_str()));
    assert!(!logs_contain(PLAINTEXT));
    assert!(!logs_contain(PASSWORD));
}

#[tokio::test]
#[traced_test]
async fn api_logs_do_not_contain_request_bodies() {
    let app = TestApp::new();

    let (_, body) = app
        .action(json!({"action": "create", "secret": PLAINTEXT, "password": PASSWORD}))
        .await;
    let id = body["id"].as_str().unwrap().to_string();
    app.action(json!({"action": "retrieve", "id": id, "password": PASSWORD})).await;

    // Malformed bodies are rejected without echoing their content.
    app.post_raw("/", format!("{{\"action\":\"create\",\"secret\":{}", PLAINTEXT)).await;

    assert!(!logs_contain(PLAINTEXT));
    assert!(!logs_contain(PASSWORD));
}

#[test]
fn debug_output_is_redacted() {
    let secret = SecretString::new(PLAINTEXT);
    assert!(!format!("{:?}", secret).contains(PLAINTEXT));
    assert!(!format!("{}", secret).contains(PLAINTEXT));
}
