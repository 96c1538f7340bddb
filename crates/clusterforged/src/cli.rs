//! Command line and environment configuration

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clusterforge_cloud::RetryConfig;
use clusterforge_cloud_aws::{AwsConfig, DEFAULT_REGION};
use clusterforge_controlplane::{
    BasicAuthConfig, ControlPlaneConfig, FailedStackPolicy, FieldPolicy,
};
use std::net::IpAddr;

#[derive(Parser)]
#[command(name = "clusterforged")]
#[command(version, about = "Kubernetes clusters on CloudFormation, over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the cluster API
    Serve(ServeArgs),
    /// Print the CloudFormation template as JSON
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailedStackPolicyArg {
    /// 404, failure only logged
    NotFound,
    /// 500 with the stack status reason
    ServerError,
}

impl From<FailedStackPolicyArg> for FailedStackPolicy {
    fn from(arg: FailedStackPolicyArg) -> Self {
        match arg {
            FailedStackPolicyArg::NotFound => FailedStackPolicy::NotFound,
            FailedStackPolicyArg::ServerError => FailedStackPolicy::ServerError,
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Debug logging; failed stacks are kept instead of rolled back
    #[arg(short, long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,

    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Basic auth user
    #[arg(long, env = "USERNAME")]
    pub username: String,

    /// Basic auth password
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = DEFAULT_REGION)]
    pub region_name: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,

    /// VPC id; stacks in other VPCs are ignored
    #[arg(long, env = "VPC")]
    pub vpc: String,

    #[arg(long, env = "SUBNET")]
    pub subnet: String,

    /// EC2 key pair for the master instances
    #[arg(long, env = "KEY_NAME")]
    pub key_name: String,

    #[arg(long, env = "CONSUL_DC")]
    pub consul_dc: String,

    #[arg(long, env = "CONSUL_JOIN")]
    pub consul_join: String,

    #[arg(long, env = "FAILED_STACK_POLICY", value_enum, default_value_t = FailedStackPolicyArg::NotFound)]
    pub failed_stack_policy: FailedStackPolicyArg,

    /// Omit password from cluster responses
    #[arg(long, env = "HIDE_PASSWORD", value_parser = BoolishValueParser::new())]
    pub hide_password: bool,

    /// Omit consul_http_api from cluster responses
    #[arg(long, env = "HIDE_CONSUL_HTTP_API", value_parser = BoolishValueParser::new())]
    pub hide_consul_http_api: bool,

    /// Answer PUT right after submission instead of waiting for the stack
    /// to show up as in progress
    #[arg(long, env = "NO_CREATE_CONFIRMATION", value_parser = BoolishValueParser::new())]
    pub no_create_confirmation: bool,
}

impl ServeArgs {
    pub fn control_plane_config(&self) -> ControlPlaneConfig {
        let mut config = ControlPlaneConfig::new(
            &self.vpc,
            &self.subnet,
            &self.key_name,
            &self.consul_dc,
            &self.consul_join,
        );
        config.disable_rollback = self.debug;
        config.field_policy = FieldPolicy {
            include_password: !self.hide_password,
            include_consul_http_api: !self.hide_consul_http_api,
        };
        config.failed_stack_policy = self.failed_stack_policy.into();
        config.create_confirmation =
            (!self.no_create_confirmation).then(RetryConfig::default);
        config
    }

    pub fn aws_config(&self) -> AwsConfig {
        AwsConfig {
            region: self.region_name.clone(),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
        }
    }

    pub fn basic_auth(&self) -> BasicAuthConfig {
        BasicAuthConfig::new(&self.username, &self.password)
    }
}
