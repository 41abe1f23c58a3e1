//! Data models for the Fizzy API
//!
//! These types mirror the resources returned by the remote API. Nothing here is
//! persisted; every value is fetched or created per call and handed straight back
//! to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account (tenant) the token has access to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    /// The slug as a bare path segment, without surrounding slashes
    pub fn path_segment(&self) -> &str {
        self.slug.trim_matches('/')
    }
}

/// Response of the identity lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub accounts: Vec<Account>,
}

/// A board groups cards and columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub all_access: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub url: String,
}

/// A card on a board, addressed externally by its `number`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub status: String,
    pub description: String,
    pub description_html: String,
    pub closed: bool,
    pub golden: bool,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<Step>>,
}

/// A checklist entry on a card. Display order is creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    pub id: String,
    pub content: String,
    pub completed: bool,
}

/// A workflow column cards can be triaged into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update for a card. Unset fields are left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Condensed card view returned by the card listing tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub number: u64,
    pub title: String,
    pub status: String,
    pub closed: bool,
    pub url: String,
}

impl From<Card> for CardSummary {
    fn from(card: Card) -> Self {
        Self {
            number: card.number,
            title: card.title,
            status: card.status,
            closed: card.closed,
            url: card.url,
        }
    }
}
