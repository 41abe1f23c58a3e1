//! Tool router
//!
//! Turns a tool name plus an argument bag into API calls and a response
//! envelope. Credentials are resolved on every call; arguments are validated
//! against the tool's declared schema before anything touches the network.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::cache::ClientCache;
use super::client::FizzyApi;
use super::error::ToolError;
use super::pipeline::{self, tagged_title, StepDraft, StepPipeline};
use super::tools::{
    AddStepsArgs, CardNumberArgs, CreateBoardArgs, CreateCardArgs, ListCardsArgs, SyncTodosArgs,
    ToolKind, UpdateStepArgs,
};
use crate::config::CredentialSource;
use crate::models::CardSummary;
use crate::schema::ValidationErrors;

/// Uniform tool result: one text block, flagged when it reports a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Pretty-printed JSON payload
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        serde_json::to_string_pretty(value)
            .map(Self::text)
            .map_err(|e| ToolError::Unknown(format!("serialization failed: {}", e)))
    }

    /// The wire envelope: `{ content: [{ type: "text", text }], isError?: true }`
    pub fn to_envelope(&self) -> Value {
        let mut envelope = Map::new();
        envelope.insert(
            "content".into(),
            serde_json::json!([{ "type": "text", "text": self.text }]),
        );
        if self.is_error {
            envelope.insert("isError".into(), Value::Bool(true));
        }
        Value::Object(envelope)
    }
}

/// Catalog entry as advertised during discovery
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Map<String, Value>,
}

pub struct ToolRouter {
    credentials: Arc<dyn CredentialSource>,
    clients: ClientCache,
}

impl ToolRouter {
    pub fn new(credentials: Arc<dyn CredentialSource>, clients: ClientCache) -> Self {
        Self {
            credentials,
            clients,
        }
    }

    /// The full tool catalog
    pub fn catalog(&self) -> Vec<ToolDescriptor> {
        catalog()
    }

    /// Forget the cached client so the next call rebuilds it
    pub fn invalidate_client(&self) {
        self.clients.invalidate();
    }

    /// Run one tool call. Never fails: errors become sanitized error responses.
    pub async fn invoke(&self, name: &str, arguments: Option<Map<String, Value>>) -> ToolResponse {
        match self.try_invoke(name, arguments.unwrap_or_default()).await {
            Ok(response) => {
                tracing::info!(tool = name, "Tool call completed");
                response
            }
            Err(error) => {
                match &error {
                    ToolError::Validation(_) | ToolError::NotConfigured => {
                        tracing::debug!(tool = name, error = %error, "Tool call rejected")
                    }
                    _ => tracing::warn!(tool = name, error = %error, "Tool call failed"),
                }
                ToolResponse::error(error.user_message())
            }
        }
    }

    async fn try_invoke(&self, name: &str, args: Map<String, Value>) -> Result<ToolResponse, ToolError> {
        let credentials = self.credentials.resolve();
        let client = self
            .clients
            .client_for(&credentials)?
            .ok_or(ToolError::NotConfigured)?;

        let tool = ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.input_schema().validate(&args)?;

        dispatch(tool, client.as_ref(), args).await
    }
}

/// Catalog without a router instance, used for discovery output
pub fn catalog() -> Vec<ToolDescriptor> {
    ToolKind::ALL
        .into_iter()
        .map(|tool| ToolDescriptor {
            name: tool.name(),
            description: tool.description(),
            input_schema: tool.input_schema().to_json_schema(),
        })
        .collect()
}

fn parse_args<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolError::Validation(ValidationErrors::single("arguments", e.to_string())))
}

async fn dispatch(
    tool: ToolKind,
    client: &dyn FizzyApi,
    args: Map<String, Value>,
) -> Result<ToolResponse, ToolError> {
    match tool {
        ToolKind::ListBoards => ToolResponse::json(&client.list_boards().await?),

        ToolKind::CreateBoard => {
            let CreateBoardArgs { name } = parse_args(args)?;
            let board = client.create_board(&name).await?;
            Ok(ToolResponse::text(format!(
                "Created board \"{}\" (ID: {})",
                board.name, board.id
            )))
        }

        ToolKind::ListCards => {
            let ListCardsArgs { board_id } = parse_args(args)?;
            let board_ids: Vec<String> = board_id.into_iter().collect();
            let cards = client.list_cards(&board_ids).await?;
            let summaries: Vec<CardSummary> = cards.into_iter().map(CardSummary::from).collect();
            ToolResponse::json(&summaries)
        }

        ToolKind::GetCard => {
            let CardNumberArgs { card_number } = parse_args(args)?;
            ToolResponse::json(&client.get_card(card_number).await?)
        }

        ToolKind::CreateCard => {
            let CreateCardArgs {
                board_id,
                title,
                description,
            } = parse_args(args)?;
            let title = tagged_title(&title);
            let number = client
                .create_card(&board_id, &title, description.as_deref())
                .await?;
            Ok(ToolResponse::text(format!(
                "Created card #{} with title \"{}\"",
                number, title
            )))
        }

        ToolKind::AddSteps => {
            let AddStepsArgs { card_number, steps } = parse_args(args)?;
            let pipeline = StepPipeline::add_steps(card_number, steps);
            pipeline.run(client).await?;
            Ok(ToolResponse::text(format!(
                "Added {} steps to card #{}",
                pipeline.len(),
                card_number
            )))
        }

        ToolKind::UpdateStep => {
            let UpdateStepArgs {
                card_number,
                step_id,
                completed,
            } = parse_args(args)?;
            client.update_step(card_number, &step_id, completed).await?;
            Ok(ToolResponse::text(format!(
                "Updated step {} on card #{} to {}",
                step_id,
                card_number,
                if completed { "completed" } else { "incomplete" }
            )))
        }

        ToolKind::SyncTodos => {
            let SyncTodosArgs {
                board_id,
                card_title,
                todos,
            } = parse_args(args)?;
            let todos: Vec<StepDraft> = todos.into_iter().map(StepDraft::from).collect();
            let count = todos.len();
            let outcome = pipeline::sync_todos(client, &board_id, &card_title, todos).await?;
            Ok(ToolResponse::text(format!(
                "Synced {} todos to card #{} \"{}\"",
                count, outcome.card_number, outcome.title
            )))
        }

        ToolKind::CloseCard => {
            let CardNumberArgs { card_number } = parse_args(args)?;
            client.close_card(card_number).await?;
            Ok(ToolResponse::text(format!("Closed card #{}", card_number)))
        }
    }
}
