//! Cluster read-model projected from stacks

use crate::config::FieldPolicy;
use clusterforge_cloud::Stack;
use clusterforge_cloud::keys::{outputs, params};
use serde::{Deserialize, Serialize};

/// Prefix every cluster stack name carries
pub const STACK_PREFIX: &str = "TAP-Kubernetes";

/// Longest stack name the provider accepts
const MAX_STACK_NAME_LEN: usize = 128;

/// Cluster as returned by the API
///
/// Built only from COMPLETE stacks. Absent fields mean "not available yet"
/// (or hidden by [`FieldPolicy`]), never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub consul_http_api: Option<String>,
}

impl Cluster {
    /// True when no field was populated
    pub fn is_empty(&self) -> bool {
        *self == Cluster::default()
    }
}

/// Stack name for a cluster
pub fn stack_name(cluster_name: &str) -> String {
    format!("{}-{}", STACK_PREFIX, cluster_name)
}

/// Check that a cluster name yields a stack name the provider accepts
/// (`[-A-Za-z0-9]`, at most 128 characters in total).
pub fn validate_cluster_name(cluster_name: &str) -> Result<(), String> {
    if cluster_name.is_empty() {
        return Err("cluster name must not be empty".to_string());
    }

    if let Some(c) = cluster_name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
    {
        return Err(format!("cluster name contains invalid character '{}'", c));
    }

    let len = stack_name(cluster_name).len();
    if len > MAX_STACK_NAME_LEN {
        return Err(format!(
            "stack name would be {} characters (max {})",
            len, MAX_STACK_NAME_LEN
        ));
    }

    Ok(())
}

/// Project a stack onto a [`Cluster`].
///
/// Returns `None` when the stack has no parameters, when its `VPC` parameter
/// names a different VPC than `vpc` (the stack belongs to another
/// deployment), or when no known key yields a field (not a cluster stack).
/// Unknown keys are ignored.
pub fn extract_cluster(stack: &Stack, vpc: &str, policy: &FieldPolicy) -> Option<Cluster> {
    if stack.parameters.is_empty() {
        return None;
    }

    let mut cluster = Cluster::default();

    for parameter in &stack.parameters {
        let value = Some(parameter.value.clone());
        match parameter.key.as_str() {
            params::CLUSTER_NAME => cluster.cluster_name = value,
            params::USERNAME => cluster.username = value,
            params::PASSWORD if policy.include_password => cluster.password = value,
            params::VPC if parameter.value != vpc => return None,
            _ => {}
        }
    }

    for output in &stack.outputs {
        let value = Some(output.value.clone());
        match output.key.as_str() {
            outputs::API_SERVER => cluster.api_server = value,
            outputs::CONSUL_HTTP_API if policy.include_consul_http_api => {
                cluster.consul_http_api = value
            }
            _ => {}
        }
    }

    (!cluster.is_empty()).then_some(cluster)
}
