mod common;

use axum::http::StatusCode;
use notif_receiver_core::receiver::ProviderType;

use common::*;

#[tokio::test]
async fn generic_receiver_annotates_its_named_resource() {
    let harness = TestHarness::new().await;
    let mut receiver = base_receiver("generic-hook", ProviderType::Generic);
    receiver.resources = vec![literal_resource(
        "kustomize.toolkit.fluxcd.io/v1",
        "Kustomization",
        "default",
        "app",
    )];
    harness.store.put_receiver(receiver).await;
    harness
        .store
        .put_object(to_object_ref(object_body("default", "app", &[])))
        .await;

    let (status, _body) = harness.post("/hook/generic-hook", &[], b"{}").await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        is_annotated(
            &harness.store,
            "kustomize.toolkit.fluxcd.io/v1",
            "Kustomization",
            "default",
            "app"
        )
        .await
    );
}

#[tokio::test]
async fn github_receiver_rejects_unsigned_request() {
    let harness = TestHarness::new().await;
    let mut receiver = base_receiver("github-hook", ProviderType::Github);
    receiver.secret_ref = Some(secret_ref("gh-secret"));
    receiver.resources = vec![literal_resource(
        "kustomize.toolkit.fluxcd.io/v1",
        "Kustomization",
        "default",
        "app",
    )];
    harness.store.put_receiver(receiver).await;
    harness.store.put_secret("default", "gh-secret", secret_with_token("s3cr3t")).await;
    harness
        .store
        .put_object(to_object_ref(object_body("default", "app", &[])))
        .await;

    let (status, _body) = harness.post("/hook/github-hook", &[], b"{\"ref\":\"refs/heads/main\"}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn github_receiver_accepts_correctly_signed_push() {
    let harness = TestHarness::new().await;
    let mut receiver = base_receiver("github-hook", ProviderType::Github);
    receiver.secret_ref = Some(secret_ref("gh-secret"));
    receiver.events = vec!["push".to_string()];
    receiver.resources = vec![literal_resource(
        "kustomize.toolkit.fluxcd.io/v1",
        "Kustomization",
        "default",
        "app",
    )];
    harness.store.put_receiver(receiver).await;
    harness.store.put_secret("default", "gh-secret", secret_with_token("s3cr3t")).await;
    harness
        .store
        .put_object(to_object_ref(object_body("default", "app", &[])))
        .await;

    let body = b"{\"ref\":\"refs/heads/main\"}";
    let signature = format!("sha256={}", hmac_sha256_hex(b"s3cr3t", body));

    let (status, _response) = harness
        .post(
            "/hook/github-hook",
            &[("x-hub-signature-256", &signature), ("x-github-event", "push")],
            body,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        is_annotated(
            &harness.store,
            "kustomize.toolkit.fluxcd.io/v1",
            "Kustomization",
            "default",
            "app"
        )
        .await
    );
}

#[tokio::test]
async fn github_receiver_rejects_disallowed_event() {
    let harness = TestHarness::new().await;
    let mut receiver = base_receiver("github-hook", ProviderType::Github);
    receiver.secret_ref = Some(secret_ref("gh-secret"));
    receiver.events = vec!["push".to_string()];
    receiver.resources = vec![literal_resource(
        "kustomize.toolkit.fluxcd.io/v1",
        "Kustomization",
        "default",
        "app",
    )];
    harness.store.put_receiver(receiver).await;
    harness.store.put_secret("default", "gh-secret", secret_with_token("s3cr3t")).await;

    let body = b"{}";
    let signature = format!("sha256={}", hmac_sha256_hex(b"s3cr3t", body));

    let (status, _) = harness
        .post(
            "/hook/github-hook",
            &[("x-hub-signature-256", &signature), ("x-github-event", "pull_request")],
            body,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_webhook_path_returns_404() {
    let harness = TestHarness::new().await;
    let (status, _) = harness.post("/hook/does-not-exist", &[], b"{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suspended_receiver_returns_503() {
    let harness = TestHarness::new().await;
    let mut receiver = base_receiver("suspended-hook", ProviderType::Generic);
    receiver.suspend = true;
    harness.store.put_receiver(receiver).await;

    let (status, _) = harness.post("/hook/suspended-hook", &[], b"{}").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

fn to_object_ref(body: serde_json::Value) -> notif_receiver_core::ObjectRef {
    notif_receiver_core::ObjectRef {
        api_version: body["apiVersion"].as_str().unwrap().to_string(),
        kind: body["kind"].as_str().unwrap().to_string(),
        namespace: body["metadata"]["namespace"].as_str().unwrap().to_string(),
        name: body["metadata"]["name"].as_str().unwrap().to_string(),
        resource_version: Some("1".to_string()),
        body,
    }
}
