//! AWS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("CloudFormation API error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("CloudFormation request failed: {0}")]
    Transport(String),

    #[error("Unexpected CloudFormation response: {0}")]
    MalformedResponse(String),

    #[error("Template serialization failed: {0}")]
    Template(#[from] serde_json::Error),
}

impl From<AwsError> for clusterforge_cloud::CloudError {
    fn from(err: AwsError) -> Self {
        match &err {
            AwsError::Api { code, .. }
                if code == "AccessDenied" || code == "ExpiredToken" || code == "InvalidClientTokenId" =>
            {
                clusterforge_cloud::CloudError::AuthenticationFailed(err.to_string())
            }
            AwsError::Api { code, .. } if code == "Throttling" => {
                clusterforge_cloud::CloudError::Timeout(err.to_string())
            }
            _ => clusterforge_cloud::CloudError::ApiError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
