//! ClusterForge Control Plane
//!
//! Kubernetes clusters are CloudFormation stacks named
//! `TAP-Kubernetes-<cluster_name>`. This crate turns the provider's
//! asynchronous stack lifecycle into synchronous HTTP answers.
//!
//! ```text
//! HTTP request ──▶ api (axum, basic auth)
//!                   │
//!                   ▼
//!             ClusterReconciler ──▶ dyn StackProvider
//!                   │
//!                   ▼
//!      StackPhase::classify ──▶ GetOutcome / CreateOutcome ──▶ status code
//! ```

pub mod api;
pub mod auth;
pub mod cluster;
pub mod config;
pub mod error;
pub mod reconciler;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use api::{AppState, router};
pub use cluster::{Cluster, STACK_PREFIX, extract_cluster, stack_name};
pub use config::{BasicAuthConfig, ControlPlaneConfig, FailedStackPolicy, FieldPolicy};
pub use error::{ControlPlaneError, Result};
pub use reconciler::{ClusterReconciler, CreateOutcome, GetOutcome};
