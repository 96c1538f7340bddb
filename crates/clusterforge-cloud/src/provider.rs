//! Stack provider trait definition

use crate::error::Result;
use crate::stack::{Stack, StackParameter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stack orchestration provider abstraction
///
/// Implementations own all durable state; every call is an independent round
/// trip keyed by stack name, so a single handle may be shared between
/// concurrently running requests.
#[async_trait]
pub trait StackProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws-cloudformation")
    fn name(&self) -> &str;

    /// Submit a create request.
    ///
    /// Returns [`CreateStackOutcome::AlreadyExists`] when the provider rejects
    /// the name as taken. Every other rejection is an error.
    async fn create_stack(&self, request: &CreateStackRequest) -> Result<CreateStackOutcome>;

    /// Describe stacks, optionally restricted to one name.
    ///
    /// A name the provider does not know yields an empty list, not an error.
    async fn describe_stacks(&self, name: Option<&str>) -> Result<Vec<Stack>>;

    /// Submit a delete request. Deleting an unknown stack is not an error.
    async fn delete_stack(&self, name: &str) -> Result<()>;
}

/// Everything the provider needs to create a stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStackRequest {
    /// Target stack name
    pub name: String,

    /// Template document, submitted verbatim
    pub template_body: String,

    /// Input parameters
    pub parameters: Vec<StackParameter>,

    /// Keep failed resources around for inspection instead of rolling back
    pub disable_rollback: bool,

    /// Capabilities acknowledged on creation
    pub capabilities: Vec<Capability>,
}

/// Capabilities a stack creation may need to acknowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// The template creates IAM resources
    #[serde(rename = "CAPABILITY_IAM")]
    Iam,
    /// The template creates IAM resources with custom names
    #[serde(rename = "CAPABILITY_NAMED_IAM")]
    NamedIam,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Iam => "CAPABILITY_IAM",
            Capability::NamedIam => "CAPABILITY_NAMED_IAM",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a create submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStackOutcome {
    /// The provider accepted the request
    Created,
    /// A stack with that name already exists
    AlreadyExists,
}
