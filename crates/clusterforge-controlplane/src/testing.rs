//! In-memory stack provider for tests

use async_trait::async_trait;
use clusterforge_cloud::{
    CloudError, CreateStackOutcome, CreateStackRequest, Result, Stack, StackProvider,
};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct MockState {
    stacks: Vec<Stack>,
    created: Vec<CreateStackRequest>,
    deleted: Vec<String>,
    describe_calls: u32,
    initial_status: String,
    scripted_statuses: VecDeque<String>,
    fail_next: Option<String>,
}

/// Provider that keeps stacks in memory and records every call.
///
/// Created stacks start in `initial_status` (`CREATE_IN_PROGRESS` unless
/// changed). Scripted statuses are applied, one per call, to the stack a
/// filtered describe asks for.
#[derive(Debug)]
pub struct MockStackProvider {
    state: Mutex<MockState>,
}

impl Default for MockStackProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStackProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                stacks: Vec::new(),
                created: Vec::new(),
                deleted: Vec::new(),
                describe_calls: 0,
                initial_status: "CREATE_IN_PROGRESS".to_string(),
                scripted_statuses: VecDeque::new(),
                fail_next: None,
            }),
        }
    }

    pub fn with_stack(self, stack: Stack) -> Self {
        self.lock().stacks.push(stack);
        self
    }

    pub fn with_initial_status(self, status: &str) -> Self {
        self.lock().initial_status = status.to_string();
        self
    }

    /// Statuses reported by successive filtered describe calls
    pub fn with_scripted_statuses(self, statuses: &[&str]) -> Self {
        self.lock()
            .scripted_statuses
            .extend(statuses.iter().map(|s| s.to_string()));
        self
    }

    /// Make the next provider call fail with an API error
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    pub fn created(&self) -> Vec<CreateStackRequest> {
        self.lock().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    pub fn describe_calls(&self) -> u32 {
        self.lock().describe_calls
    }

    pub fn stacks(&self) -> Vec<Stack> {
        self.lock().stacks.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MockState {
    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(message) => Err(CloudError::ApiError(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StackProvider for MockStackProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_stack(&self, request: &CreateStackRequest) -> Result<CreateStackOutcome> {
        let mut state = self.lock();
        state.take_failure()?;

        if state.stacks.iter().any(|stack| stack.name == request.name) {
            return Ok(CreateStackOutcome::AlreadyExists);
        }

        let mut stack = Stack::new(&request.name, &state.initial_status);
        stack.parameters = request.parameters.clone();
        state.stacks.push(stack);
        state.created.push(request.clone());

        Ok(CreateStackOutcome::Created)
    }

    async fn describe_stacks(&self, name: Option<&str>) -> Result<Vec<Stack>> {
        let mut state = self.lock();
        state.describe_calls += 1;
        state.take_failure()?;

        let Some(name) = name else {
            return Ok(state.stacks.clone());
        };

        if let Some(status) = state.scripted_statuses.pop_front() {
            if let Some(stack) = state.stacks.iter_mut().find(|stack| stack.name == name) {
                stack.status = status;
            }
        }

        Ok(state
            .stacks
            .iter()
            .filter(|stack| stack.name == name)
            .cloned()
            .collect())
    }

    async fn delete_stack(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        state.take_failure()?;

        state.stacks.retain(|stack| stack.name != name);
        state.deleted.push(name.to_string());
        Ok(())
    }
}
