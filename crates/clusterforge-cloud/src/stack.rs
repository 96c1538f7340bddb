//! Stack model and lifecycle classification
//!
//! A [`Stack`] is a read-only snapshot of what the provider reported. Nothing in
//! this workspace mutates stacks directly; mutations are requests sent through
//! [`crate::StackProvider`].

use serde::{Deserialize, Serialize};

/// Snapshot of a provider-managed stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Stack name (e.g. "TAP-Kubernetes-demo")
    pub name: String,

    /// Raw status string as reported by the provider (e.g. "CREATE_COMPLETE")
    pub status: String,

    /// Human readable reason attached to the last status change
    pub status_reason: Option<String>,

    /// Input parameters, in provider order
    pub parameters: Vec<StackParameter>,

    /// Outputs, in provider order. Empty until the provider materializes them.
    pub outputs: Vec<StackOutput>,
}

impl Stack {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            status_reason: None,
            parameters: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_status_reason(mut self, reason: impl Into<String>) -> Self {
        self.status_reason = Some(reason.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(StackParameter::new(key, value));
        self
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.push(StackOutput::new(key, value));
        self
    }

    /// Lifecycle class of the current status
    pub fn phase(&self) -> StackPhase {
        StackPhase::classify(&self.status)
    }

    /// Value of the first parameter with the given key
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Value of the first output with the given key
    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.key == key)
            .map(|o| o.value.as_str())
    }
}

/// Stack input parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackParameter {
    pub key: String,
    pub value: String,
}

impl StackParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Stack output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Lifecycle class of a provider status string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackPhase {
    /// Stable and queryable
    Complete,
    /// A create or update is underway
    InProgress,
    /// Being removed or already removed
    Gone,
    /// Failed, rolled back, or anything unrecognized
    Failed,
}

const COMPLETE_PREFIXES: &[&str] = &["CREATE_COMPLETE", "UPDATE_COMPLETE"];
const IN_PROGRESS_PREFIXES: &[&str] = &["CREATE_IN_PROGRESS", "UPDATE_IN_PROGRESS"];
const GONE_PREFIXES: &[&str] = &["DELETE_IN_PROGRESS", "DELETE_COMPLETE"];

impl StackPhase {
    /// Classify a raw status string.
    ///
    /// Prefixes are checked in order COMPLETE, IN_PROGRESS, GONE; the first
    /// match wins and everything else is FAILED. Prefix matching means
    /// `UPDATE_COMPLETE_CLEANUP_IN_PROGRESS` is still COMPLETE.
    pub fn classify(status: &str) -> Self {
        let matches = |prefixes: &[&str]| prefixes.iter().any(|p| status.starts_with(p));

        if matches(COMPLETE_PREFIXES) {
            StackPhase::Complete
        } else if matches(IN_PROGRESS_PREFIXES) {
            StackPhase::InProgress
        } else if matches(GONE_PREFIXES) {
            StackPhase::Gone
        } else {
            StackPhase::Failed
        }
    }
}

impl std::fmt::Display for StackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackPhase::Complete => write!(f, "complete"),
            StackPhase::InProgress => write!(f, "in-progress"),
            StackPhase::Gone => write!(f, "gone"),
            StackPhase::Failed => write!(f, "failed"),
        }
    }
}
