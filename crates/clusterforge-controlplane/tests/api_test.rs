//! HTTP surface tests driven through `tower::ServiceExt::oneshot`

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clusterforge_cloud::Stack;
use clusterforge_controlplane::testing::MockStackProvider;
use clusterforge_controlplane::{
    AppState, BasicAuthConfig, ClusterReconciler, ControlPlaneConfig, FailedStackPolicy, router,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(provider: &Arc<MockStackProvider>, config: ControlPlaneConfig) -> Router {
    let reconciler = ClusterReconciler::new(provider.clone(), "{}", config);
    router(AppState::new(
        reconciler,
        BasicAuthConfig::new("admin", "s3cret"),
    ))
}

fn app(provider: &Arc<MockStackProvider>) -> Router {
    app_with(
        provider,
        ControlPlaneConfig::new("vpc-1", "subnet-1", "ops", "dc1", "consul.internal"),
    )
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("admin:s3cret")),
        )
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn demo_stack(status: &str) -> Stack {
    Stack::new("TAP-Kubernetes-demo", status)
        .with_parameter("ClusterName", "demo")
        .with_parameter("Username", "admin")
        .with_output("APIServer", "https://lb.example")
}

#[tokio::test]
async fn test_health_needs_no_auth() {
    let provider = Arc::new(MockStackProvider::new());
    let response = app(&provider)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["provider"], "mock");
}

#[tokio::test]
async fn test_clusters_require_auth() {
    let provider = Arc::new(MockStackProvider::new());

    let missing = app(&provider)
        .oneshot(
            Request::builder()
                .uri("/clusters")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        missing.headers()[header::WWW_AUTHENTICATE],
        r#"Basic realm="clusterforge""#
    );

    let wrong = app(&provider)
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/clusters/demo")
                .header(
                    header::AUTHORIZATION,
                    format!("Basic {}", STANDARD.encode("admin:wrong")),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(provider.deleted().is_empty());
}

#[tokio::test]
async fn test_get_complete_cluster() {
    let provider = Arc::new(MockStackProvider::new().with_stack(demo_stack("CREATE_COMPLETE")));

    let response = app(&provider)
        .oneshot(request(Method::GET, "/clusters/demo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        body,
        json!({
            "cluster_name": "demo",
            "username": "admin",
            "api_server": "https://lb.example",
        })
    );
}

#[tokio::test]
async fn test_get_status_codes() {
    let cases = [
        ("CREATE_IN_PROGRESS", StatusCode::NO_CONTENT),
        ("UPDATE_IN_PROGRESS", StatusCode::NO_CONTENT),
        ("DELETE_IN_PROGRESS", StatusCode::NOT_FOUND),
        ("DELETE_COMPLETE", StatusCode::NOT_FOUND),
        ("CREATE_FAILED", StatusCode::NOT_FOUND),
        ("ROLLBACK_COMPLETE", StatusCode::NOT_FOUND),
    ];

    for (status, expected) in cases {
        let provider = Arc::new(MockStackProvider::new().with_stack(demo_stack(status)));
        let response = app(&provider)
            .oneshot(request(Method::GET, "/clusters/demo"))
            .await
            .unwrap();

        assert_eq!(response.status(), expected, "status {status}");
        assert!(body_bytes(response).await.is_empty(), "status {status}");
    }
}

#[tokio::test]
async fn test_get_missing_cluster() {
    let provider = Arc::new(MockStackProvider::new());
    let response = app(&provider)
        .oneshot(request(Method::GET, "/clusters/nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_failed_cluster_reports_reason() {
    let provider = Arc::new(
        MockStackProvider::new()
            .with_stack(demo_stack("CREATE_FAILED").with_status_reason("Resource creation cancelled")),
    );
    let mut config = ControlPlaneConfig::new("vpc-1", "subnet-1", "ops", "dc1", "consul.internal");
    config.failed_stack_policy = FailedStackPolicy::ServerError;

    let response = app_with(&provider, config)
        .oneshot(request(Method::GET, "/clusters/demo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        String::from_utf8(body_bytes(response).await).unwrap(),
        "TAP-Kubernetes-demo: CREATE_FAILED: Resource creation cancelled"
    );
}

#[tokio::test]
async fn test_search_clusters() {
    let provider = Arc::new(
        MockStackProvider::new()
            .with_stack(demo_stack("CREATE_COMPLETE"))
            .with_stack(Stack::new("TAP-Kubernetes-wip", "CREATE_IN_PROGRESS")),
    );

    let response = app(&provider)
        .oneshot(request(Method::GET, "/clusters"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["cluster_name"], "demo");
}

#[tokio::test]
async fn test_search_empty() {
    let provider = Arc::new(MockStackProvider::new());
    let response = app(&provider)
        .oneshot(request(Method::GET, "/clusters"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"[]");
}

#[tokio::test]
async fn test_put_then_conflict() {
    let provider = Arc::new(MockStackProvider::new());
    let app = app(&provider);

    let first = app
        .clone()
        .oneshot(request(Method::PUT, "/clusters/demo"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app
        .oneshot(request(Method::PUT, "/clusters/demo"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test(start_paused = true)]
async fn test_put_not_confirmed() {
    let provider = Arc::new(MockStackProvider::new().with_initial_status("REVIEW_IN_PROGRESS"));

    let response = app(&provider)
        .oneshot(request(Method::PUT, "/clusters/demo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(provider.describe_calls(), 10);
}

#[tokio::test]
async fn test_put_invalid_name() {
    let provider = Arc::new(MockStackProvider::new());
    let response = app(&provider)
        .oneshot(request(Method::PUT, "/clusters/bad_name"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "Bad Request");
    assert!(provider.created().is_empty());
}

#[tokio::test]
async fn test_provider_failure_is_server_error() {
    let provider = Arc::new(MockStackProvider::new());
    provider.fail_next("InsufficientCapabilities");

    let response = app(&provider)
        .oneshot(request(Method::PUT, "/clusters/demo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "Internal Server Error");
    assert_eq!(body["message"], "API error: InsufficientCapabilities");
}

#[tokio::test]
async fn test_delete_unknown_cluster() {
    let provider = Arc::new(MockStackProvider::new());
    let response = app(&provider)
        .oneshot(request(Method::DELETE, "/clusters/ghost"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(provider.deleted(), vec!["TAP-Kubernetes-ghost"]);
}
