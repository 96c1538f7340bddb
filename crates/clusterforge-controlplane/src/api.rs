//! HTTP facade
//!
//! | Method | Path                       | Codes                |
//! |--------|----------------------------|----------------------|
//! | GET    | `/health`                  | 200 (no auth)        |
//! | GET    | `/clusters`                | 200                  |
//! | GET    | `/clusters/{cluster_name}` | 200, 204, 404, 500   |
//! | PUT    | `/clusters/{cluster_name}` | 202, 400, 409, 500   |
//! | DELETE | `/clusters/{cluster_name}` | 204                  |

use crate::auth::basic_auth_middleware;
use crate::cluster::Cluster;
use crate::config::BasicAuthConfig;
use crate::error::Result;
use crate::reconciler::{ClusterReconciler, CreateOutcome, GetOutcome};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::{Router, middleware};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: ClusterReconciler,
    pub auth: Arc<BasicAuthConfig>,
}

impl AppState {
    pub fn new(reconciler: ClusterReconciler, auth: BasicAuthConfig) -> Self {
        Self {
            reconciler,
            auth: Arc::new(auth),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let clusters = Router::new()
        .route("/clusters", get(search_clusters))
        .route(
            "/clusters/{cluster_name}",
            get(get_cluster).put(create_cluster).delete(delete_cluster),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            basic_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(clusters)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "clusterforged",
        "provider": state.reconciler.provider_name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn search_clusters(State(state): State<AppState>) -> Result<Json<Vec<Cluster>>> {
    Ok(Json(state.reconciler.search().await?))
}

async fn get_cluster(
    State(state): State<AppState>,
    Path(cluster_name): Path<String>,
) -> Result<Response> {
    let response = match state.reconciler.get(&cluster_name).await? {
        GetOutcome::Found(cluster) => (StatusCode::OK, Json(cluster)).into_response(),
        GetOutcome::InProgress => StatusCode::NO_CONTENT.into_response(),
        GetOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
        GetOutcome::Failed { reason } => {
            (StatusCode::INTERNAL_SERVER_ERROR, reason).into_response()
        }
    };

    Ok(response)
}

async fn create_cluster(
    State(state): State<AppState>,
    Path(cluster_name): Path<String>,
) -> Result<StatusCode> {
    let status = match state.reconciler.create(&cluster_name).await? {
        CreateOutcome::Accepted => StatusCode::ACCEPTED,
        CreateOutcome::Conflict => StatusCode::CONFLICT,
        CreateOutcome::NotConfirmed => StatusCode::INTERNAL_SERVER_ERROR,
    };

    Ok(status)
}

async fn delete_cluster(
    State(state): State<AppState>,
    Path(cluster_name): Path<String>,
) -> Result<StatusCode> {
    state.reconciler.delete(&cluster_name).await?;
    Ok(StatusCode::NO_CONTENT)
}
