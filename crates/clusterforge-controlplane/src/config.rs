//! Control plane configuration
//!
//! Built once at startup and shared read-only (behind `Arc`) by the reconciler
//! and the HTTP facade.

use clusterforge_cloud::{CloudError, RetryConfig};
use serde::{Deserialize, Serialize};

/// How a stack in a failed or rolled-back state is reported by `get`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailedStackPolicy {
    /// 404 with an empty body; the failure is only logged
    #[default]
    NotFound,
    /// 500 carrying the provider's status reason
    ServerError,
}

/// Which optional fields read operations return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    pub include_password: bool,
    pub include_consul_http_api: bool,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            include_password: true,
            include_consul_http_api: true,
        }
    }
}

/// Basic authentication credential pair
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

impl BasicAuthConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Compare supplied credentials without short-circuiting on the first
    /// differing byte.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        user_ok & pass_ok
    }
}

impl std::fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Network placement and stack policy
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPlaneConfig {
    /// VPC clusters are placed in; stacks in any other VPC are invisible
    pub vpc: String,
    pub subnet: String,
    pub key_name: String,
    pub consul_dc: String,
    pub consul_join: String,

    /// Keep failed stacks for inspection instead of rolling back
    pub disable_rollback: bool,

    pub field_policy: FieldPolicy,
    pub failed_stack_policy: FailedStackPolicy,

    /// Post-create confirmation polling. `None` answers 202 right after the
    /// create request is accepted.
    pub create_confirmation: Option<RetryConfig>,
}

impl ControlPlaneConfig {
    pub fn new(
        vpc: impl Into<String>,
        subnet: impl Into<String>,
        key_name: impl Into<String>,
        consul_dc: impl Into<String>,
        consul_join: impl Into<String>,
    ) -> Self {
        Self {
            vpc: vpc.into(),
            subnet: subnet.into(),
            key_name: key_name.into(),
            consul_dc: consul_dc.into(),
            consul_join: consul_join.into(),
            disable_rollback: false,
            field_policy: FieldPolicy::default(),
            failed_stack_policy: FailedStackPolicy::default(),
            create_confirmation: Some(RetryConfig::default()),
        }
    }

    /// Reject empty placement identifiers
    pub fn validate(&self) -> Result<(), CloudError> {
        let required = [
            ("vpc", &self.vpc),
            ("subnet", &self.subnet),
            ("key-name", &self.key_name),
            ("consul-dc", &self.consul_dc),
            ("consul-join", &self.consul_join),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CloudError::InvalidConfig(format!("{} must not be empty", name)));
            }
        }

        if let Some(retry) = &self.create_confirmation {
            if retry.max_attempts == 0 {
                return Err(CloudError::InvalidConfig(
                    "create confirmation needs at least one attempt".to_string(),
                ));
            }
        }

        Ok(())
    }
}
