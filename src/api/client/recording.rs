//! In-memory `FizzyApi` double that records every call in order

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{ClientError, FizzyApi};
use crate::models::{Board, Card, CardUpdate, Column};

#[derive(Default)]
pub(crate) struct RecordingApi {
    pub calls: Mutex<Vec<String>>,
    pub boards: Vec<Board>,
    pub cards: Vec<Card>,
    /// Status returned by every call when set
    pub fail_with: Option<u16>,
    /// `add_step` with this content fails at once with a 422
    pub failing_step: Option<String>,
    /// How long each successful `add_step` stays outstanding
    pub step_delay: Option<Duration>,
    next_step: Mutex<u32>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    finished_steps: AtomicUsize,
}

impl RecordingApi {
    pub fn with_boards(boards: Vec<Board>) -> Self {
        Self {
            boards,
            ..Default::default()
        }
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            ..Default::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Default::default()
        }
    }

    pub fn with_step_delay(delay: Duration) -> Self {
        Self {
            step_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn failing_step(mut self, content: &str) -> Self {
        self.failing_step = Some(content.to_string());
        self
    }

    /// Most `add_step` calls that were outstanding at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// `add_step` calls that ran to completion
    pub fn finished_steps(&self) -> usize {
        self.finished_steps.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with {
            Some(status) => Err(ClientError::Api {
                status,
                status_text: String::new(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl FizzyApi for RecordingApi {
    async fn account_slug(&self) -> Result<String, ClientError> {
        Ok("1".to_string())
    }

    async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.record("list_boards".to_string())?;
        Ok(self.boards.clone())
    }

    async fn get_board(&self, board_id: &str) -> Result<Board, ClientError> {
        self.record(format!("get_board {}", board_id))?;
        self.boards
            .iter()
            .find(|b| b.id == board_id)
            .cloned()
            .ok_or(ClientError::Api {
                status: 404,
                status_text: "Not Found".to_string(),
            })
    }

    async fn create_board(&self, name: &str) -> Result<Board, ClientError> {
        self.record(format!("create_board {}", name))?;
        Ok(Board {
            id: "b-new".to_string(),
            name: name.to_string(),
            ..Default::default()
        })
    }

    async fn list_cards(&self, board_ids: &[String]) -> Result<Vec<Card>, ClientError> {
        self.record(format!("list_cards {}", board_ids.join(",")))?;
        Ok(self.cards.clone())
    }

    async fn get_card(&self, number: u64) -> Result<Card, ClientError> {
        self.record(format!("get_card {}", number))?;
        self.cards
            .iter()
            .find(|c| c.number == number)
            .cloned()
            .ok_or(ClientError::Api {
                status: 404,
                status_text: "Not Found".to_string(),
            })
    }

    async fn create_card(
        &self,
        board_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<u64, ClientError> {
        self.record(format!(
            "create_card {} {} {}",
            board_id,
            title,
            description.unwrap_or("-")
        ))?;
        Ok(42)
    }

    async fn update_card(&self, number: u64, update: &CardUpdate) -> Result<(), ClientError> {
        self.record(format!("update_card {} {:?}", number, update.title))
    }

    async fn close_card(&self, number: u64) -> Result<(), ClientError> {
        self.record(format!("close_card {}", number))
    }

    async fn reopen_card(&self, number: u64) -> Result<(), ClientError> {
        self.record(format!("reopen_card {}", number))
    }

    async fn add_step(&self, number: u64, content: &str) -> Result<String, ClientError> {
        self.record(format!("add_step {} {}", number, content))?;
        if self.failing_step.as_deref() == Some(content) {
            return Err(ClientError::Api {
                status: 422,
                status_text: "Unprocessable Entity".to_string(),
            });
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.step_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished_steps.fetch_add(1, Ordering::SeqCst);

        let mut next = self.next_step.lock().unwrap();
        *next += 1;
        Ok(format!("s{}", next))
    }

    async fn update_step(
        &self,
        number: u64,
        step_id: &str,
        completed: bool,
    ) -> Result<(), ClientError> {
        self.record(format!("update_step {} {} {}", number, step_id, completed))
    }

    async fn delete_step(&self, number: u64, step_id: &str) -> Result<(), ClientError> {
        self.record(format!("delete_step {} {}", number, step_id))
    }

    async fn get_columns(&self, board_id: &str) -> Result<Vec<Column>, ClientError> {
        self.record(format!("get_columns {}", board_id))?;
        Ok(Vec::new())
    }

    async fn triage_card(&self, number: u64, column_id: &str) -> Result<(), ClientError> {
        self.record(format!("triage_card {} {}", number, column_id))
    }
}
