use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Event, Guest};

pub mod dynamo;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conditional write lost its precondition, e.g. the guest at the
    /// targeted position is no longer the one the caller read.
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    #[error("DynamoDB error: {0}")]
    Dynamo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_dynamo::Error> for StoreError {
    fn from(err: serde_dynamo::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Document store holding one record per event with its guest list embedded.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persists a new event, assigning its id.
    async fn create_event(&self, event: Event) -> Result<Event>;

    async fn get_event(&self, id: &str) -> Result<Event>;

    async fn list_events(&self) -> Result<Vec<Event>>;

    /// Writes the event's own fields. The stored guest list is left alone
    /// and comes back in the returned event.
    async fn update_event(&self, event: Event) -> Result<Event>;

    async fn delete_event(&self, id: &str) -> Result<()>;

    async fn replace_guest_list(&self, id: &str, guests: Vec<Guest>) -> Result<()>;

    /// Adds guests to the end of the stored list without rewriting it.
    async fn append_guests(&self, id: &str, guests: Vec<Guest>) -> Result<()>;

    /// Overwrites the single guest entry at `index`, provided it still
    /// belongs to `expected_email`.
    async fn update_guest(
        &self,
        id: &str,
        index: usize,
        expected_email: &str,
        guest: Guest,
    ) -> Result<()>;
}
