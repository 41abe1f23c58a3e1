//! Tool-level error taxonomy
//!
//! Every failure inside a tool call ends up as a [`ToolError`]. Only
//! [`ToolError::user_message`] is shown to the calling agent; upstream detail
//! stays in the logs.

use super::client::ClientError;
use crate::schema::ValidationErrors;

pub const NOT_CONFIGURED: &str = "Fizzy.do is not configured. \
Run `fizzy-mcp setup --token <TOKEN>` or set FIZZY_TOKEN to provide your API token.\n\n\
Get your token from: https://app.fizzy.do/settings";

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("no API token configured")]
    NotConfigured,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("remote API error: {status} {status_text}")]
    RemoteApi { status: u16, status_text: String },

    #[error("could not recover resource ID: {0}")]
    LocationParse(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    Unknown(String),
}

impl From<ClientError> for ToolError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::InsecureUrl | ClientError::NoAccounts => {
                ToolError::Configuration(error.to_string())
            }
            ClientError::Api {
                status,
                status_text,
            } => ToolError::RemoteApi {
                status,
                status_text,
            },
            ClientError::MissingLocation | ClientError::LocationParse { .. } => {
                ToolError::LocationParse(error.to_string())
            }
            ClientError::Http(_) | ClientError::Decode(_) => ToolError::Unknown(error.to_string()),
        }
    }
}

impl ToolError {
    /// Safe text for the calling agent
    pub fn user_message(&self) -> String {
        match self {
            ToolError::NotConfigured => NOT_CONFIGURED.to_string(),
            ToolError::Configuration(message) => message.clone(),
            ToolError::Validation(errors) => format!("Validation error: {}", errors),
            ToolError::RemoteApi {
                status,
                status_text,
            } => remote_message(*status, status_text).to_string(),
            ToolError::LocationParse(_) => {
                "Fizzy accepted the request but the created resource could not be identified"
                    .to_string()
            }
            ToolError::UnknownTool(name) => format!("Unknown tool: {}", name),
            ToolError::Unknown(_) => "An error occurred while processing your request".to_string(),
        }
    }
}

/// Map a failed HTTP status to a message that reveals nothing about the upstream
pub fn remote_message(status: u16, status_text: &str) -> &'static str {
    match (status, status_text) {
        (401, _) | (_, "Unauthorized") => "Authentication failed",
        (403, _) | (_, "Forbidden") => "Access denied",
        (404, _) | (_, "Not found") => "Resource not found",
        (429, _) => "Rate limit exceeded",
        (500..=599, _) => "Fizzy service temporarily unavailable",
        (400..=499, _) => "Request to Fizzy failed",
        _ => "An error occurred with the Fizzy service",
    }
}
