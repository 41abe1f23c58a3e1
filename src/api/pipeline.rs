//! Multi-call tool pipelines
//!
//! Some tools fan out into several API calls. [`StepPipeline`] captures the
//! calls for a batch of steps together with the [`Sequencing`] used to issue
//! them, so the ordering guarantee of each tool is part of its definition.

use futures::future::join_all;

use super::client::{ClientError, FizzyApi};

/// Tag prepended to titles of cards created through the tools
pub const AGENT_TITLE_PREFIX: &str = "[Claude] ";

pub fn tagged_title(title: &str) -> String {
    format!("{}{}", AGENT_TITLE_PREFIX, title)
}

/// How the steps of a pipeline are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequencing {
    /// All steps are requested at once, in input order; completion order is unspecified
    Concurrent,
    /// Each step is created (and completed, if asked) before the next one starts,
    /// so the card shows steps in input order
    Sequential,
}

/// A step to create, optionally marked completed right after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    pub content: String,
    pub completed: bool,
}

impl StepDraft {
    pub fn open(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPipeline {
    card_number: u64,
    steps: Vec<StepDraft>,
    sequencing: Sequencing,
}

impl StepPipeline {
    /// Independent steps appended to an existing card
    pub fn add_steps(card_number: u64, contents: Vec<String>) -> Self {
        Self {
            card_number,
            steps: contents.into_iter().map(StepDraft::open).collect(),
            sequencing: Sequencing::Concurrent,
        }
    }

    /// Todo items mirrored onto a card in order
    pub fn sync_todos(card_number: u64, todos: Vec<StepDraft>) -> Self {
        Self {
            card_number,
            steps: todos,
            sequencing: Sequencing::Sequential,
        }
    }

    pub fn sequencing(&self) -> Sequencing {
        self.sequencing
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step and return the created step IDs in input order.
    ///
    /// A sequential pipeline stops at the first failure. A concurrent one lets
    /// every request already issued finish, then reports the first failure in
    /// input order.
    pub async fn run(&self, api: &dyn FizzyApi) -> Result<Vec<String>, ClientError> {
        match self.sequencing {
            Sequencing::Concurrent => {
                let results =
                    join_all(self.steps.iter().map(|step| self.run_step(api, step))).await;
                results.into_iter().collect()
            }
            Sequencing::Sequential => {
                let mut ids = Vec::with_capacity(self.steps.len());
                for step in &self.steps {
                    ids.push(self.run_step(api, step).await?);
                }
                Ok(ids)
            }
        }
    }

    // A step has to exist before it can be marked completed.
    async fn run_step(&self, api: &dyn FizzyApi, step: &StepDraft) -> Result<String, ClientError> {
        let step_id = api.add_step(self.card_number, &step.content).await?;
        if step.completed {
            api.update_step(self.card_number, &step_id, true).await?;
        }
        Ok(step_id)
    }
}

/// Result of mirroring a todo list onto a new card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub card_number: u64,
    pub title: String,
    pub step_ids: Vec<String>,
}

/// Create a tagged card on `board_id` and add `todos` to it in order
pub async fn sync_todos(
    api: &dyn FizzyApi,
    board_id: &str,
    card_title: &str,
    todos: Vec<StepDraft>,
) -> Result<SyncOutcome, ClientError> {
    let title = tagged_title(card_title);
    let card_number = api.create_card(board_id, &title, None).await?;
    tracing::debug!(card_number, todos = todos.len(), "Created card for todo sync");
    let step_ids = StepPipeline::sync_todos(card_number, todos).run(api).await?;
    Ok(SyncOutcome {
        card_number,
        title,
        step_ids,
    })
}
