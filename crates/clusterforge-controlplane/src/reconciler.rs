//! Stack reconciler
//!
//! Maps the provider's asynchronous stack lifecycle onto synchronous
//! outcomes. Every decision goes through [`StackPhase::classify`]; nothing here
//! matches on raw status strings.

use crate::cluster::{Cluster, extract_cluster, stack_name, validate_cluster_name};
use crate::config::{ControlPlaneConfig, FailedStackPolicy};
use crate::error::{ControlPlaneError, Result};
use clusterforge_cloud::keys::params;
use clusterforge_cloud::{
    Capability, CreateStackOutcome, CreateStackRequest, PollOutcome, Stack, StackParameter,
    StackPhase, StackProvider, poll_until,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Length of the generated cluster admin password
pub const PASSWORD_LEN: usize = 16;

/// Result of [`ClusterReconciler::get`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    /// COMPLETE stack visible to this deployment
    Found(Cluster),
    /// Create or update underway
    InProgress,
    /// No such stack, deleted, filtered out, or failed under
    /// [`FailedStackPolicy::NotFound`]
    NotFound,
    /// Failed stack under [`FailedStackPolicy::ServerError`]
    Failed { reason: String },
}

/// Result of [`ClusterReconciler::create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Submitted (and, when confirmation is enabled, seen in progress)
    Accepted,
    /// The provider already has a stack with this name
    Conflict,
    /// Submitted, but never observed in progress within the poll budget
    NotConfirmed,
}

/// Stack reconciler
///
/// Cheap to clone; all clones share the provider handle, the template body and
/// the configuration.
#[derive(Clone)]
pub struct ClusterReconciler {
    provider: Arc<dyn StackProvider>,
    template_body: Arc<str>,
    config: Arc<ControlPlaneConfig>,
}

impl ClusterReconciler {
    pub fn new(
        provider: Arc<dyn StackProvider>,
        template_body: impl Into<Arc<str>>,
        config: ControlPlaneConfig,
    ) -> Self {
        Self {
            provider,
            template_body: template_body.into(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ControlPlaneConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// List every COMPLETE cluster visible to this deployment, in provider order
    pub async fn search(&self) -> Result<Vec<Cluster>> {
        let stacks = self.provider.describe_stacks(None).await?;

        let clusters: Vec<Cluster> = stacks
            .iter()
            .filter(|stack| stack.phase() == StackPhase::Complete)
            .filter_map(|stack| self.extract(stack))
            .collect();

        debug!(
            stacks = stacks.len(),
            clusters = clusters.len(),
            "Searched clusters"
        );
        Ok(clusters)
    }

    /// Fetch one cluster by name
    pub async fn get(&self, cluster_name: &str) -> Result<GetOutcome> {
        let name = stack_name(cluster_name);
        let stacks = self.provider.describe_stacks(Some(&name)).await?;

        let Some(stack) = stacks.iter().find(|stack| stack.name == name) else {
            return Ok(GetOutcome::NotFound);
        };

        let outcome = match stack.phase() {
            StackPhase::Complete => self
                .extract(stack)
                .map_or(GetOutcome::NotFound, GetOutcome::Found),
            StackPhase::InProgress => GetOutcome::InProgress,
            StackPhase::Gone => GetOutcome::NotFound,
            StackPhase::Failed => self.report_failed(stack),
        };

        Ok(outcome)
    }

    /// Submit a create request, then optionally wait for the stack to show up
    /// as in progress.
    ///
    /// Dropping the returned future while polling stops the poll loop. The
    /// submitted create itself is never cancelled.
    pub async fn create(&self, cluster_name: &str) -> Result<CreateOutcome> {
        validate_cluster_name(cluster_name).map_err(ControlPlaneError::InvalidClusterName)?;

        let request = self.create_request(cluster_name);
        let name = request.name.clone();

        match self.provider.create_stack(&request).await? {
            CreateStackOutcome::Created => {
                debug!(stack = %name, "Create accepted by provider");
            }
            CreateStackOutcome::AlreadyExists => {
                info!(stack = %name, "Stack already exists");
                return Ok(CreateOutcome::Conflict);
            }
        }

        let Some(retry) = &self.config.create_confirmation else {
            return Ok(CreateOutcome::Accepted);
        };

        let provider = self.provider.as_ref();
        let target = name.as_str();
        let outcome = poll_until(retry, move |attempt| async move {
            let stacks = provider.describe_stacks(Some(target)).await?;
            let in_progress = stacks
                .iter()
                .any(|stack| stack.name == target && stack.phase() == StackPhase::InProgress);
            debug!(stack = %target, attempt, in_progress, "Checked stack creation");
            Ok::<_, ControlPlaneError>(in_progress.then_some(()))
        })
        .await?;

        match outcome {
            PollOutcome::Ready { attempt, .. } => {
                info!(stack = %name, attempts = attempt + 1, "Stack creation confirmed");
                Ok(CreateOutcome::Accepted)
            }
            PollOutcome::Exhausted => {
                warn!(
                    stack = %name,
                    attempts = retry.max_attempts,
                    "Stack never observed in progress"
                );
                Ok(CreateOutcome::NotConfirmed)
            }
        }
    }

    /// Submit a delete request without checking that the stack exists
    pub async fn delete(&self, cluster_name: &str) -> Result<()> {
        let name = stack_name(cluster_name);
        self.provider.delete_stack(&name).await?;
        debug!(stack = %name, "Delete accepted by provider");
        Ok(())
    }

    /// Build the create request for a cluster. A fresh password is generated
    /// on every call.
    pub fn create_request(&self, cluster_name: &str) -> CreateStackRequest {
        let config = &self.config;

        CreateStackRequest {
            name: stack_name(cluster_name),
            template_body: self.template_body.to_string(),
            parameters: vec![
                StackParameter::new(params::VPC, &config.vpc),
                StackParameter::new(params::SUBNET, &config.subnet),
                StackParameter::new(params::KEY_NAME, &config.key_name),
                StackParameter::new(params::CLUSTER_NAME, cluster_name),
                StackParameter::new(params::PASSWORD, generate_password()),
                StackParameter::new(params::CONSUL_DC, &config.consul_dc),
                StackParameter::new(params::CONSUL_JOIN, &config.consul_join),
            ],
            disable_rollback: config.disable_rollback,
            capabilities: vec![Capability::Iam],
        }
    }

    fn extract(&self, stack: &Stack) -> Option<Cluster> {
        extract_cluster(stack, &self.config.vpc, &self.config.field_policy)
    }

    fn report_failed(&self, stack: &Stack) -> GetOutcome {
        error!(
            stack = %stack.name,
            status = %stack.status,
            reason = stack.status_reason.as_deref().unwrap_or(""),
            "Stack in failed state"
        );

        match self.config.failed_stack_policy {
            FailedStackPolicy::NotFound => GetOutcome::NotFound,
            FailedStackPolicy::ServerError => {
                let mut reason = format!("{}: {}", stack.name, stack.status);
                if let Some(status_reason) = &stack.status_reason {
                    reason.push_str(": ");
                    reason.push_str(status_reason);
                }
                GetOutcome::Failed { reason }
            }
        }
    }
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LEN)
        .map(char::from)
        .collect()
}
