//! Reconciler behavior against the in-memory provider

use clusterforge_cloud::{RetryConfig, Stack};
use clusterforge_controlplane::testing::MockStackProvider;
use clusterforge_controlplane::{
    Cluster, ClusterReconciler, ControlPlaneConfig, ControlPlaneError, CreateOutcome,
    FailedStackPolicy, FieldPolicy, GetOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn config() -> ControlPlaneConfig {
    ControlPlaneConfig::new("vpc-1", "subnet-1", "ops", "dc1", "consul.internal")
}

fn reconciler(provider: &Arc<MockStackProvider>, config: ControlPlaneConfig) -> ClusterReconciler {
    ClusterReconciler::new(provider.clone(), "{\"Resources\":{}}", config)
}

fn demo_stack(status: &str) -> Stack {
    Stack::new("TAP-Kubernetes-demo", status)
        .with_parameter("ClusterName", "demo")
        .with_parameter("Username", "admin")
        .with_output("APIServer", "https://lb.example")
}

#[tokio::test]
async fn test_get_complete_stack() {
    let provider = Arc::new(MockStackProvider::new().with_stack(demo_stack("CREATE_COMPLETE")));
    let reconciler = reconciler(&provider, config());

    assert_eq!(
        reconciler.get("demo").await.unwrap(),
        GetOutcome::Found(Cluster {
            cluster_name: Some("demo".into()),
            username: Some("admin".into()),
            api_server: Some("https://lb.example".into()),
            ..Cluster::default()
        })
    );
}

#[tokio::test]
async fn test_get_maps_every_phase() {
    let cases = [
        ("UPDATE_COMPLETE", true),
        ("CREATE_IN_PROGRESS", false),
        ("UPDATE_IN_PROGRESS", false),
        ("DELETE_IN_PROGRESS", false),
        ("DELETE_COMPLETE", false),
        ("CREATE_FAILED", false),
        ("ROLLBACK_COMPLETE", false),
    ];

    for (status, found) in cases {
        let provider = Arc::new(MockStackProvider::new().with_stack(demo_stack(status)));
        let outcome = reconciler(&provider, config()).get("demo").await.unwrap();

        let expected = match status {
            _ if found => matches!(outcome, GetOutcome::Found(_)),
            "CREATE_IN_PROGRESS" | "UPDATE_IN_PROGRESS" => outcome == GetOutcome::InProgress,
            _ => outcome == GetOutcome::NotFound,
        };
        assert!(expected, "{status} mapped to {outcome:?}");
    }
}

#[tokio::test]
async fn test_get_failed_stack_with_server_error_policy() {
    let provider = Arc::new(MockStackProvider::new().with_stack(
        demo_stack("ROLLBACK_COMPLETE").with_status_reason("The following resource(s) failed"),
    ));
    let mut config = config();
    config.failed_stack_policy = FailedStackPolicy::ServerError;

    assert_eq!(
        reconciler(&provider, config).get("demo").await.unwrap(),
        GetOutcome::Failed {
            reason: "TAP-Kubernetes-demo: ROLLBACK_COMPLETE: The following resource(s) failed"
                .into()
        }
    );
}

#[tokio::test]
async fn test_get_unknown_and_foreign_vpc() {
    let foreign = Stack::new("TAP-Kubernetes-other", "CREATE_COMPLETE")
        .with_parameter("VPC", "vpc-2")
        .with_parameter("ClusterName", "other");
    let provider = Arc::new(MockStackProvider::new().with_stack(foreign));
    let reconciler = reconciler(&provider, config());

    assert_eq!(reconciler.get("missing").await.unwrap(), GetOutcome::NotFound);
    assert_eq!(reconciler.get("other").await.unwrap(), GetOutcome::NotFound);
}

#[tokio::test]
async fn test_search_keeps_complete_visible_stacks_in_order() {
    let provider = Arc::new(
        MockStackProvider::new()
            .with_stack(
                Stack::new("TAP-Kubernetes-b", "UPDATE_COMPLETE")
                    .with_parameter("VPC", "vpc-1")
                    .with_parameter("ClusterName", "b"),
            )
            .with_stack(demo_stack("CREATE_IN_PROGRESS"))
            .with_stack(
                Stack::new("TAP-Kubernetes-foreign", "CREATE_COMPLETE")
                    .with_parameter("VPC", "vpc-9")
                    .with_parameter("ClusterName", "foreign"),
            )
            .with_stack(Stack::new("unrelated", "CREATE_COMPLETE"))
            .with_stack(
                Stack::new("TAP-Kubernetes-a", "CREATE_COMPLETE")
                    .with_parameter("ClusterName", "a")
                    .with_parameter("Password", "secret")
                    .with_output("ConsulHTTPAPI", "http://consul:8500"),
            ),
    );
    let mut config = config();
    config.field_policy = FieldPolicy {
        include_password: false,
        include_consul_http_api: true,
    };

    let clusters = reconciler(&provider, config).search().await.unwrap();
    let names: Vec<_> = clusters
        .iter()
        .map(|c| c.cluster_name.as_deref().unwrap())
        .collect();

    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(clusters[1].password, None);
    assert_eq!(
        clusters[1].consul_http_api.as_deref(),
        Some("http://consul:8500")
    );
}

#[tokio::test]
async fn test_search_skips_stacks_without_cluster_fields() {
    let provider = Arc::new(
        MockStackProvider::new()
            .with_stack(
                Stack::new("my-rds-db", "CREATE_COMPLETE")
                    .with_parameter("DBInstanceClass", "db.t3.micro"),
            )
            .with_stack(
                Stack::new("TAP-Kubernetes-x", "CREATE_COMPLETE").with_parameter("Foo", "bar"),
            )
            .with_stack(demo_stack("UPDATE_COMPLETE")),
    );
    let reconciler = reconciler(&provider, config());

    let clusters = reconciler.search().await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].cluster_name.as_deref(), Some("demo"));

    assert_eq!(reconciler.get("x").await.unwrap(), GetOutcome::NotFound);
}

#[tokio::test(start_paused = true)]
async fn test_requests_proceed_while_create_polls() {
    let provider = Arc::new(
        MockStackProvider::new()
            .with_initial_status("REVIEW_IN_PROGRESS")
            .with_stack(
                Stack::new("TAP-Kubernetes-b", "CREATE_COMPLETE")
                    .with_parameter("ClusterName", "b")
                    .with_output("APIServer", "https://b.example"),
            ),
    );
    let reconciler = reconciler(&provider, config());
    let start = Instant::now();

    let polling = tokio::spawn({
        let reconciler = reconciler.clone();
        async move { reconciler.create("a").await }
    });

    // Wait until the create is inside its backoff sleep
    while provider.describe_calls() == 0 {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        reconciler.get("b").await.unwrap(),
        GetOutcome::Found(_)
    ));
    assert_eq!(reconciler.search().await.unwrap().len(), 1);
    reconciler.delete("c").await.unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(!polling.is_finished());

    assert_eq!(
        polling.await.unwrap().unwrap(),
        CreateOutcome::NotConfirmed
    );
    assert_eq!(start.elapsed(), RetryConfig::default().worst_case_wait());
}

#[tokio::test]
async fn test_search_propagates_provider_failure() {
    let provider = Arc::new(MockStackProvider::new());
    provider.fail_next("describe exploded");

    let err = reconciler(&provider, config()).search().await.unwrap_err();
    assert!(matches!(err, ControlPlaneError::Cloud(_)));
}

#[tokio::test]
async fn test_create_then_conflict() {
    let provider = Arc::new(MockStackProvider::new());
    let reconciler = reconciler(&provider, config());

    assert_eq!(reconciler.create("demo").await.unwrap(), CreateOutcome::Accepted);
    assert_eq!(reconciler.create("demo").await.unwrap(), CreateOutcome::Conflict);

    let created = provider.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "TAP-Kubernetes-demo");
}

#[tokio::test]
async fn test_create_propagates_other_provider_errors() {
    let provider = Arc::new(MockStackProvider::new());
    provider.fail_next("LimitExceeded");

    let err = reconciler(&provider, config()).create("demo").await.unwrap_err();
    assert!(err.to_string().contains("LimitExceeded"));
    assert!(provider.created().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_create_polls_until_in_progress() {
    let provider = Arc::new(MockStackProvider::new().with_scripted_statuses(&[
        "REVIEW_IN_PROGRESS",
        "REVIEW_IN_PROGRESS",
        "CREATE_IN_PROGRESS",
    ]));
    let start = Instant::now();

    let outcome = reconciler(&provider, config()).create("demo").await.unwrap();

    assert_eq!(outcome, CreateOutcome::Accepted);
    assert_eq!(provider.describe_calls(), 3);
    // 0.1s + 0.2s
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_create_gives_up_after_ten_describes() {
    let provider = Arc::new(MockStackProvider::new().with_initial_status("REVIEW_IN_PROGRESS"));
    let start = Instant::now();

    let outcome = reconciler(&provider, config()).create("demo").await.unwrap();

    assert_eq!(outcome, CreateOutcome::NotConfirmed);
    assert_eq!(provider.describe_calls(), 10);
    assert_eq!(
        start.elapsed(),
        RetryConfig::default().worst_case_wait()
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_without_confirmation_skips_polling() {
    let provider = Arc::new(MockStackProvider::new().with_initial_status("REVIEW_IN_PROGRESS"));
    let mut config = config();
    config.create_confirmation = None;

    let outcome = reconciler(&provider, config).create("demo").await.unwrap();

    assert_eq!(outcome, CreateOutcome::Accepted);
    assert_eq!(provider.describe_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_create_stops_polling() {
    let provider = Arc::new(MockStackProvider::new().with_initial_status("REVIEW_IN_PROGRESS"));
    let reconciler = reconciler(&provider, config());

    let result = tokio::time::timeout(Duration::from_millis(250), reconciler.create("demo")).await;
    assert!(result.is_err());

    let calls = provider.describe_calls();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(provider.describe_calls(), calls);
    assert_eq!(provider.created().len(), 1);
}

#[tokio::test]
async fn test_delete_is_unconditional() {
    let provider = Arc::new(MockStackProvider::new().with_stack(demo_stack("CREATE_COMPLETE")));
    let reconciler = reconciler(&provider, config());

    reconciler.delete("demo").await.unwrap();
    reconciler.delete("never-existed").await.unwrap();

    assert_eq!(
        provider.deleted(),
        vec!["TAP-Kubernetes-demo", "TAP-Kubernetes-never-existed"]
    );
    assert_eq!(provider.describe_calls(), 0);
    assert!(provider.stacks().is_empty());
}
