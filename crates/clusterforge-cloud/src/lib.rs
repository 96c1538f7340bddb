//! ClusterForge stack orchestration abstraction
//!
//! This crate describes what ClusterForge needs from a cloud provider's
//! declarative stack service: create, describe and delete a named stack.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              clusterforge-controlplane           │
//! │        (reconciler + HTTP facade)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               clusterforge-cloud                 │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait StackProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ StackPhase   │  │ poll_until   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────────────┐
//! │ clusterforge-cloud-aws│
//! │  (CloudFormation)     │
//! └───────────────────────┘
//! ```

pub mod error;
pub mod keys;
pub mod provider;
pub mod retry;
pub mod stack;

// Re-exports
pub use error::{CloudError, Result};
pub use provider::{Capability, CreateStackOutcome, CreateStackRequest, StackProvider};
pub use retry::{PollOutcome, RetryConfig, poll_until};
pub use stack::{Stack, StackOutput, StackParameter, StackPhase};
