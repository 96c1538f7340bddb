//! AWS CloudFormation provider implementation

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::{self as cfn, Capability as CfnCapability};
use clusterforge_cloud::{
    Capability, CreateStackOutcome, CreateStackRequest, Stack, StackOutput, StackParameter,
    StackProvider,
};
use tracing::{debug, info};

/// Default region when none is configured
pub const DEFAULT_REGION: &str = "us-west-2";

/// Connection settings for the CloudFormation client
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,

    /// Static credentials. When either half is missing the SDK's default
    /// credential chain (environment, profile, instance role) is used.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

/// CloudFormation-backed stack provider
#[derive(Clone)]
pub struct CloudFormationProvider {
    client: Client,
}

impl CloudFormationProvider {
    /// Build a client from configuration
    pub async fn connect(config: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = aws_sdk_cloudformation::config::Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "clusterforge-static",
            );
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;
        info!("CloudFormation client ready (region: {})", config.region);

        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn describe_page(
        &self,
        name: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Option<(Vec<Stack>, Option<String>)>> {
        let result = self
            .client
            .describe_stacks()
            .set_stack_name(name.map(str::to_string))
            .set_next_token(next_token)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) if is_missing_stack(err.code(), err.message()) => return Ok(None),
            Err(err) => return Err(api_error(&err)),
        };

        let stacks = output
            .stacks()
            .iter()
            .map(convert_stack)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some((stacks, output.next_token().map(str::to_string))))
    }
}

#[async_trait]
impl StackProvider for CloudFormationProvider {
    fn name(&self) -> &str {
        "aws-cloudformation"
    }

    async fn create_stack(
        &self,
        request: &CreateStackRequest,
    ) -> clusterforge_cloud::Result<CreateStackOutcome> {
        let parameters = request
            .parameters
            .iter()
            .map(|p| {
                cfn::Parameter::builder()
                    .parameter_key(&p.key)
                    .parameter_value(&p.value)
                    .build()
            })
            .collect::<Vec<_>>();

        let capabilities = request
            .capabilities
            .iter()
            .map(|c| to_cfn_capability(*c))
            .collect::<Vec<_>>();

        let result = self
            .client
            .create_stack()
            .stack_name(&request.name)
            .template_body(&request.template_body)
            .set_parameters(Some(parameters))
            .disable_rollback(request.disable_rollback)
            .set_capabilities(Some(capabilities))
            .send()
            .await;

        match result {
            Ok(output) => {
                info!(
                    stack = %request.name,
                    stack_id = output.stack_id().unwrap_or("unknown"),
                    "Stack creation submitted"
                );
                Ok(CreateStackOutcome::Created)
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_already_exists_exception()) =>
            {
                debug!(stack = %request.name, "Stack already exists");
                Ok(CreateStackOutcome::AlreadyExists)
            }
            Err(err) => Err(api_error(&err).into()),
        }
    }

    async fn describe_stacks(&self, name: Option<&str>) -> clusterforge_cloud::Result<Vec<Stack>> {
        let mut stacks = Vec::new();
        let mut next_token = None;

        loop {
            match self.describe_page(name, next_token.take()).await? {
                None => return Ok(Vec::new()),
                Some((page, token)) => {
                    stacks.extend(page);
                    match token {
                        Some(token) => next_token = Some(token),
                        None => break,
                    }
                }
            }
        }

        debug!("Described {} stack(s)", stacks.len());
        Ok(stacks)
    }

    async fn delete_stack(&self, name: &str) -> clusterforge_cloud::Result<()> {
        self.client
            .delete_stack()
            .stack_name(name)
            .send()
            .await
            .map_err(|err| api_error(&err))?;

        info!(stack = %name, "Stack deletion submitted");
        Ok(())
    }
}

fn to_cfn_capability(capability: Capability) -> CfnCapability {
    match capability {
        Capability::Iam => CfnCapability::CapabilityIam,
        Capability::NamedIam => CfnCapability::CapabilityNamedIam,
    }
}

fn convert_stack(stack: &cfn::Stack) -> Result<Stack> {
    // Required members are non-optional in newer SDK releases; `into` accepts both shapes.
    let name: Option<&str> = stack.stack_name().into();
    let status: Option<&cfn::StackStatus> = stack.stack_status().into();

    let name = name.ok_or_else(|| AwsError::MalformedResponse("stack without a name".into()))?;
    let status = status
        .map(|s| s.as_str().to_string())
        .ok_or_else(|| AwsError::MalformedResponse(format!("stack {} without a status", name)))?;

    let parameters = stack
        .parameters()
        .iter()
        .filter_map(|p| match (p.parameter_key(), p.parameter_value()) {
            (Some(key), Some(value)) => Some(StackParameter::new(key, value)),
            _ => None,
        })
        .collect();

    let outputs = stack
        .outputs()
        .iter()
        .filter_map(|o| match (o.output_key(), o.output_value()) {
            (Some(key), Some(value)) => Some(StackOutput::new(key, value)),
            _ => None,
        })
        .collect();

    Ok(Stack {
        name: name.to_string(),
        status,
        status_reason: stack.stack_status_reason().map(str::to_string),
        parameters,
        outputs,
    })
}

/// CloudFormation reports an unknown stack name as a generic validation error.
fn is_missing_stack(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError") && message.is_some_and(|m| m.contains("does not exist"))
}

fn api_error<E>(err: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match err.code() {
        Some(code) => AwsError::Api {
            code: code.to_string(),
            message: err.message().unwrap_or_default().to_string(),
        },
        None => AwsError::Transport(DisplayErrorContext(err).to_string()),
    }
}
