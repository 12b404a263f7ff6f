//! Integration tests for the one-time secret lifecycle
//!
//! These tests drive `SecretLifecycleManager` directly over the in-memory
//! store and inspect the raw entries it leaves behind.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{engine, system_key, TestApp, NOW};
use ephemera::{
    api::ApiError,
    crypto::{decrypt_layer, EncryptionEngine, SymmetricKey},
    domain::{EncryptionMarker, SecretId, SecretString},
    store::SecretStore,
    Error,
};
use proptest::prelude::*;

fn secret(value: &str) -> SecretString {
    SecretString::new(value)
}

async fn raw(app: &TestApp, key: &str) -> Option<String> {
    app.store.get(key).await.expect("store read")
}

#[tokio::test]
async fn retrieve_discloses_once_without_password() {
    let app = TestApp::new();
    let created = app.manager.create(secret("hello"), None, None).await.unwrap();

    let value = app.manager.retrieve(created.id.as_str(), None).await.unwrap();
    assert_eq!(value.expose_secret(), "hello");

    let second = app.manager.retrieve(created.id.as_str(), None).await;
    assert!(matches!(second, Err(Error::NotFound { .. })));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn retrieve_discloses_once_with_password() {
    let app = TestApp::new();
    let created =
        app.manager.create(secret("launch codes"), Some(secret("correct")), None).await.unwrap();

    let value =
        app.manager.retrieve(created.id.as_str(), Some(secret("correct"))).await.unwrap();
    assert_eq!(value.expose_secret(), "launch codes");

    let second = app.manager.retrieve(created.id.as_str(), Some(secret("correct"))).await;
    assert!(matches!(second, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn stored_value_is_not_plaintext_or_single_layer() {
    let app = TestApp::new();
    let plaintext = "do not store me";
    let created = app.manager.create(secret(plaintext), Some(secret("pw")), None).await.unwrap();

    let stored = raw(&app, &created.id.value_key()).await.unwrap();
    assert_ne!(stored, plaintext);
    assert_ne!(stored, STANDARD.encode(plaintext));
    assert!(!stored.contains(plaintext));

    // Peeling the system layer leaves the password envelope, not the plaintext.
    let envelope = STANDARD.decode(&stored).unwrap();
    let inner = decrypt_layer(&envelope, &SymmetricKey::new([0x42; 32])).unwrap();
    assert_ne!(inner, plaintext.as_bytes());
    assert!(!inner.windows(plaintext.len()).any(|w| w == plaintext.as_bytes()));

    assert_eq!(
        raw(&app, &created.id.metadata_key()).await.as_deref(),
        Some("secret_key_password_encrypted")
    );
}

#[tokio::test]
async fn create_writes_marker_and_expiry_entries() {
    let app = TestApp::new();
    let created = app.manager.create(secret("x"), None, Some(NOW + 60)).await.unwrap();
    assert_eq!(created.expires_at, Some(NOW + 60));

    let marker = raw(&app, &created.id.metadata_key()).await;
    assert_eq!(marker.as_deref(), Some("secret_key_encrypted"));
    let expected_expiry = (NOW + 60).to_string();
    assert_eq!(
        raw(&app, &created.id.expires_key()).await.as_deref(),
        Some(expected_expiry.as_str())
    );
    assert_eq!(app.store.len(), 3);
}

#[tokio::test]
async fn check_reports_password_requirement_without_consuming() {
    let app = TestApp::new();
    let open = app.manager.create(secret("a"), None, None).await.unwrap();
    let locked =
        app.manager.create(secret("b"), Some(secret("pw")), Some(NOW + 10)).await.unwrap();

    let status = app.manager.check(open.id.as_str()).await.unwrap();
    assert!(!status.requires_password);
    assert_eq!(status.expires_at, None);

    let status = app.manager.check(locked.id.as_str()).await.unwrap();
    assert!(status.requires_password);
    assert_eq!(status.expires_at, Some(NOW + 10));

    // Checking twice leaves both secrets retrievable.
    app.manager.check(open.id.as_str()).await.unwrap();
    let value = app.manager.retrieve(open.id.as_str(), None).await.unwrap();
    assert_eq!(value.expose_secret(), "a");
}

#[tokio::test]
async fn expired_secret_is_purged_on_check() {
    let app = TestApp::new();
    let created = app.manager.create(secret("P"), None, Some(NOW + 1)).await.unwrap();

    app.clock.advance(2);
    match app.manager.check(created.id.as_str()).await {
        Err(Error::Expired { expired_at, .. }) => assert_eq!(expired_at, NOW + 1),
        other => panic!("expected Expired, got {:?}", other),
    }

    assert!(app.store.is_empty());
    let again = app.manager.check(created.id.as_str()).await;
    assert!(matches!(again, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn expiry_is_inclusive_of_the_boundary_second() {
    let app = TestApp::new();
    let created = app.manager.create(secret("P"), None, Some(NOW + 5)).await.unwrap();

    app.clock.set(NOW + 5);
    let result = app.manager.retrieve(created.id.as_str(), None).await;
    assert!(matches!(result, Err(Error::Expired { expired_at, .. }) if expired_at == NOW + 5));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn wrong_password_is_recoverable() {
    let app = TestApp::new();
    let created = app.manager.create(secret("P"), Some(secret("correct")), None).await.unwrap();

    let wrong = app.manager.retrieve(created.id.as_str(), Some(secret("wrong"))).await;
    let err = wrong.unwrap_err();
    assert!(matches!(err, Error::InvalidPassword));
    assert!(err.is_recoverable());

    let missing = app.manager.retrieve(created.id.as_str(), None).await.unwrap_err();
    assert!(matches!(missing, Error::PasswordRequired));

    let empty = app.manager.retrieve(created.id.as_str(), Some(secret(""))).await.unwrap_err();
    assert!(matches!(empty, Error::PasswordRequired));

    let value = app.manager.retrieve(created.id.as_str(), Some(secret("correct"))).await.unwrap();
    assert_eq!(value.expose_secret(), "P");
}

#[tokio::test]
async fn past_expiry_is_rejected_without_writing() {
    let app = TestApp::new();

    let result = app.manager.create(secret("P"), None, Some(NOW - 1)).await;
    assert!(matches!(result, Err(Error::Validation { .. })));

    let result = app.manager.create(secret("P"), None, Some(NOW)).await;
    assert!(matches!(result, Err(Error::Validation { .. })));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn empty_password_means_no_password() {
    let app = TestApp::new();
    let created = app.manager.create(secret("P"), Some(secret("")), None).await.unwrap();

    assert!(!app.manager.check(created.id.as_str()).await.unwrap().requires_password);
    let value = app.manager.retrieve(created.id.as_str(), None).await.unwrap();
    assert_eq!(value.expose_secret(), "P");
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let app = TestApp::new();
    let unknown = SecretId::new();

    assert!(matches!(app.manager.check(unknown.as_str()).await, Err(Error::NotFound { .. })));
    assert!(matches!(app.manager.retrieve("not-a-uuid", None).await, Err(Error::NotFound { .. })));
    assert!(matches!(app.manager.check("../etc/passwd").await, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn concurrent_retrieves_disclose_exactly_once() {
    let app = TestApp::new();
    let created = app.manager.create(secret("only once"), None, None).await.unwrap();
    let id = created.id.to_string();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = Arc::clone(&app.manager);
        let id = id.clone();
        handles.push(tokio::spawn(async move { manager.retrieve(&id, None).await }));
    }

    let mut disclosed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(value) => {
                assert_eq!(value.expose_secret(), "only once");
                disclosed += 1;
            }
            Err(Error::NotFound { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(disclosed, 1);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn legacy_plaintext_marker_is_served_raw() {
    let app = TestApp::new();
    let id = SecretId::new();
    app.store.set(&id.value_key(), "old plaintext").await.unwrap();
    app.store.set(&id.metadata_key(), "plaintext").await.unwrap();

    assert!(!app.manager.check(id.as_str()).await.unwrap().requires_password);
    let value = app.manager.retrieve(id.as_str(), None).await.unwrap();
    assert_eq!(value.expose_secret(), "old plaintext");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn missing_marker_falls_back_to_plaintext() {
    let app = TestApp::new();
    let id = SecretId::new();
    app.store.set(&id.value_key(), "no marker").await.unwrap();

    let status = app.manager.check(id.as_str()).await.unwrap();
    assert!(!status.requires_password);
    let value = app.manager.retrieve(id.as_str(), None).await.unwrap();
    assert_eq!(value.expose_secret(), "no marker");
}

#[tokio::test]
async fn legacy_encrypted_marker_needs_only_the_password() {
    let app = TestApp::new();
    let id = SecretId::new();

    // Written by an engine with a different system key: the legacy format
    // never touches the system layer.
    let other_engine = EncryptionEngine::new(system_key(0x07));
    let stored = other_engine.encrypt_legacy(&secret("legacy"), &secret("pw")).unwrap();
    app.store.set(&id.value_key(), &stored).await.unwrap();
    app.store.set(&id.metadata_key(), EncryptionMarker::LegacyEncrypted.as_str()).await.unwrap();

    assert!(app.manager.check(id.as_str()).await.unwrap().requires_password);
    assert!(matches!(
        app.manager.retrieve(id.as_str(), None).await,
        Err(Error::PasswordRequired)
    ));
    assert!(matches!(
        app.manager.retrieve(id.as_str(), Some(secret("nope"))).await,
        Err(Error::InvalidPassword)
    ));

    let value = app.manager.retrieve(id.as_str(), Some(secret("pw"))).await.unwrap();
    assert_eq!(value.expose_secret(), "legacy");
}

#[tokio::test]
async fn unknown_marker_is_a_system_failure() {
    let app = TestApp::new();
    let id = SecretId::new();
    app.store.set(&id.value_key(), "whatever").await.unwrap();
    app.store.set(&id.metadata_key(), "rot13").await.unwrap();

    let err = app.manager.retrieve(id.as_str(), None).await.unwrap_err();
    assert!(matches!(err, Error::SystemLayer { .. }));
    assert_eq!(ApiError::from(err).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn tampered_ciphertext_is_a_system_failure_and_kept() {
    let app = TestApp::new();
    let created = app.manager.create(secret("P"), None, None).await.unwrap();

    let mut envelope = STANDARD.decode(raw(&app, &created.id.value_key()).await.unwrap()).unwrap();
    let last = envelope.len() - 1;
    envelope[last] ^= 0x01;
    app.store.set(&created.id.value_key(), &STANDARD.encode(&envelope)).await.unwrap();

    let err = app.manager.retrieve(created.id.as_str(), None).await.unwrap_err();
    assert!(matches!(err, Error::SystemLayer { .. }));
    assert!(app.store.contains_key(&created.id.value_key()));
}

#[tokio::test]
async fn secrets_written_under_one_key_fail_under_another() {
    let app = TestApp::new();
    let created = app.manager.create(secret("P"), None, None).await.unwrap();
    let stored = raw(&app, &created.id.value_key()).await.unwrap();

    let other = EncryptionEngine::new(system_key(0x43));
    let result = other.decrypt_from_storage(&stored, EncryptionMarker::SystemOnly, None);
    assert!(result.is_err());
    assert!(engine().decrypt_from_storage(&stored, EncryptionMarker::SystemOnly, None).is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn create_then_retrieve_round_trips(
        plaintext in "\\PC{1,64}",
        password in proptest::option::of("[a-zA-Z0-9]{1,16}"),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let app = TestApp::new();
            let created = app
                .manager
                .create(secret(&plaintext), password.as_deref().map(secret), None)
                .await
                .unwrap();

            let value = app
                .manager
                .retrieve(created.id.as_str(), password.as_deref().map(secret))
                .await
                .unwrap();
            prop_assert_eq!(value.expose_secret(), plaintext.as_str());

            let again = app
                .manager
                .retrieve(created.id.as_str(), password.as_deref().map(secret))
                .await;
            prop_assert!(matches!(again, Err(Error::NotFound { .. })), "second retrieve must fail");
            Ok(())
        })?;
    }
}
