//! Tool catalog
//!
//! The fixed set of tools exposed to agents, with their descriptions, input
//! schemas and the typed arguments each one deserializes into.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use super::pipeline::StepDraft;
use crate::schema::{Field, FieldType, InputSchema};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 10_000;
const BOARD_NAME_MAX: usize = 100;
const STEP_MAX: usize = 500;
const STEPS_MAX: usize = 100;

/// Every tool the server offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListBoards,
    CreateBoard,
    ListCards,
    GetCard,
    CreateCard,
    AddSteps,
    UpdateStep,
    SyncTodos,
    CloseCard,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::ListBoards,
        ToolKind::CreateBoard,
        ToolKind::ListCards,
        ToolKind::GetCard,
        ToolKind::CreateCard,
        ToolKind::AddSteps,
        ToolKind::UpdateStep,
        ToolKind::SyncTodos,
        ToolKind::CloseCard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ListBoards => "fizzy_list_boards",
            ToolKind::CreateBoard => "fizzy_create_board",
            ToolKind::ListCards => "fizzy_list_cards",
            ToolKind::GetCard => "fizzy_get_card",
            ToolKind::CreateCard => "fizzy_create_card",
            ToolKind::AddSteps => "fizzy_add_steps",
            ToolKind::UpdateStep => "fizzy_update_step",
            ToolKind::SyncTodos => "fizzy_sync_todos",
            ToolKind::CloseCard => "fizzy_close_card",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::ListBoards => "List all Fizzy.do boards",
            ToolKind::CreateBoard => "Create a new Fizzy.do board",
            ToolKind::ListCards => "List cards, optionally filtered by board",
            ToolKind::GetCard => "Get details of a card by its number",
            ToolKind::CreateCard => "Create a new card in a board",
            ToolKind::AddSteps => "Add steps to a card",
            ToolKind::UpdateStep => "Update a step's completion status",
            ToolKind::SyncTodos => {
                "Create a card for a todo list and add each todo as a step, in order"
            }
            ToolKind::CloseCard => "Close a card",
        }
    }

    pub fn input_schema(self) -> InputSchema {
        let card_number = || Field::required("card_number", FieldType::PositiveInteger, "Card number");
        match self {
            ToolKind::ListBoards => InputSchema::empty(),
            ToolKind::CreateBoard => InputSchema::new(vec![Field::required(
                "name",
                FieldType::string(1, Some(BOARD_NAME_MAX)),
                "Name for the new board",
            )]),
            ToolKind::ListCards => InputSchema::new(vec![Field::optional(
                "board_id",
                FieldType::string(1, None),
                "Optional board ID to filter cards",
            )]),
            ToolKind::GetCard => InputSchema::new(vec![Field::required(
                "card_number",
                FieldType::PositiveInteger,
                "The card number to retrieve",
            )]),
            ToolKind::CreateCard => InputSchema::new(vec![
                Field::required("board_id", FieldType::string(1, None), "Board ID"),
                Field::required("title", FieldType::string(1, Some(TITLE_MAX)), "Card title"),
                Field::optional(
                    "description",
                    FieldType::string(0, Some(DESCRIPTION_MAX)),
                    "Optional description (HTML)",
                ),
            ]),
            ToolKind::AddSteps => InputSchema::new(vec![
                card_number(),
                Field::required(
                    "steps",
                    FieldType::array(FieldType::string(1, Some(STEP_MAX)), 1, Some(STEPS_MAX)),
                    "Step contents",
                ),
            ]),
            ToolKind::UpdateStep => InputSchema::new(vec![
                card_number(),
                Field::required("step_id", FieldType::string(1, None), "Step ID"),
                Field::required("completed", FieldType::Boolean, "Completed status"),
            ]),
            ToolKind::SyncTodos => InputSchema::new(vec![
                Field::required("board_id", FieldType::string(1, None), "Board ID"),
                Field::required(
                    "card_title",
                    FieldType::string(1, Some(TITLE_MAX)),
                    "Card title",
                ),
                Field::required(
                    "todos",
                    FieldType::array(
                        FieldType::Object(vec![
                            Field::required(
                                "content",
                                FieldType::string(1, Some(STEP_MAX)),
                                "Todo text",
                            ),
                            Field::optional(
                                "completed",
                                FieldType::Boolean,
                                "Completed (defaults to false)",
                            ),
                        ]),
                        1,
                        Some(STEPS_MAX),
                    ),
                    "Todo items",
                ),
            ]),
            ToolKind::CloseCard => InputSchema::new(vec![Field::required(
                "card_number",
                FieldType::PositiveInteger,
                "Card number to close",
            )]),
        }
    }
}

/// Accepts `2.0` as well as `2`; JSON clients do not always keep the distinction.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_u64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        })
        .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {}", number)))
}

#[derive(Debug, Deserialize)]
pub struct CreateBoardArgs {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCardsArgs {
    pub board_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardNumberArgs {
    #[serde(deserialize_with = "whole_number")]
    pub card_number: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCardArgs {
    pub board_id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddStepsArgs {
    #[serde(deserialize_with = "whole_number")]
    pub card_number: u64,
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStepArgs {
    #[serde(deserialize_with = "whole_number")]
    pub card_number: u64,
    pub step_id: String,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct TodoArg {
    pub content: String,
    #[serde(default)]
    pub completed: bool,
}

impl From<TodoArg> for StepDraft {
    fn from(todo: TodoArg) -> Self {
        StepDraft {
            content: todo.content,
            completed: todo.completed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncTodosArgs {
    pub board_id: String,
    pub card_title: String,
    pub todos: Vec<TodoArg>,
}
