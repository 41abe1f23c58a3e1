//! Client trait definition
//!
//! This module defines the `FizzyApi` trait the tool router is written against.
//! The HTTP client implements it for real traffic; tests substitute doubles.

use super::ClientError;
use crate::models::{Board, Card, CardUpdate, Column};

/// Operations offered by the Fizzy API, scoped to the token's account
#[async_trait::async_trait]
pub trait FizzyApi: Send + Sync {
    /// Resolve the account slug, memoized after the first lookup
    async fn account_slug(&self) -> Result<String, ClientError>;

    /// List all boards in the account
    async fn list_boards(&self) -> Result<Vec<Board>, ClientError>;

    /// Fetch a board by ID
    async fn get_board(&self, board_id: &str) -> Result<Board, ClientError>;

    /// Create a board and return its full representation
    async fn create_board(&self, name: &str) -> Result<Board, ClientError>;

    /// First board whose name matches exactly
    async fn find_board_by_name(&self, name: &str) -> Result<Option<Board>, ClientError> {
        let boards = self.list_boards().await?;
        Ok(boards.into_iter().find(|board| board.name == name))
    }

    /// List cards, optionally restricted to the given boards
    async fn list_cards(&self, board_ids: &[String]) -> Result<Vec<Card>, ClientError>;

    /// Fetch a card by number
    async fn get_card(&self, number: u64) -> Result<Card, ClientError>;

    /// Create a card on a board and return its number
    async fn create_card(
        &self,
        board_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<u64, ClientError>;

    /// Update the title and/or description of a card
    async fn update_card(&self, number: u64, update: &CardUpdate) -> Result<(), ClientError>;

    /// Close a card by creating its closure record
    async fn close_card(&self, number: u64) -> Result<(), ClientError>;

    /// Reopen a card by deleting its closure record
    async fn reopen_card(&self, number: u64) -> Result<(), ClientError>;

    /// Append a step to a card and return the step ID
    async fn add_step(&self, number: u64, content: &str) -> Result<String, ClientError>;

    /// Mark a step completed or not
    async fn update_step(
        &self,
        number: u64,
        step_id: &str,
        completed: bool,
    ) -> Result<(), ClientError>;

    async fn delete_step(&self, number: u64, step_id: &str) -> Result<(), ClientError>;

    /// Columns of a board
    async fn get_columns(&self, board_id: &str) -> Result<Vec<Column>, ClientError>;

    /// Move a card into a column
    async fn triage_card(&self, number: u64, column_id: &str) -> Result<(), ClientError>;
}
