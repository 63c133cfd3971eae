//! Cloudit transport error types

use cloudweave_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(
        "Expected HTTP response code {expected:?} when accessing [{method} {url}], but got {actual} instead\n{body}"
    )]
    UnexpectedResponseCode {
        url: String,
        method: String,
        expected: Vec<u16>,
        actual: u16,
        body: String,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::UnexpectedResponseCode { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

impl From<ClientError> for CloudError {
    fn from(err: ClientError) -> Self {
        match err.status() {
            Some(404) => CloudError::NotFound(err.to_string()),
            _ => CloudError::UpstreamError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
