//! AWS provider for ClusterForge
//!
//! Implements [`clusterforge_cloud::StackProvider`] on top of AWS
//! CloudFormation and ships the Kubernetes master stack template that every
//! cluster is created from.
//!
//! # Requirements
//!
//! - AWS credentials, either passed explicitly through [`AwsConfig`] or
//!   resolved by the SDK's default credential chain
//! - `cloudformation:*` plus the IAM/EC2/ELB/AutoScaling permissions the
//!   template needs
//!
//! # Example
//!
//! ```ignore
//! use clusterforge_cloud::StackProvider;
//! use clusterforge_cloud_aws::{AwsConfig, CloudFormationProvider};
//!
//! let provider = CloudFormationProvider::connect(&AwsConfig::default()).await;
//! let stacks = provider.describe_stacks(None).await?;
//! ```

pub mod error;
pub mod provider;
pub mod template;
pub mod user_data;

pub use error::{AwsError, Result};
pub use provider::{AwsConfig, CloudFormationProvider, DEFAULT_REGION};
