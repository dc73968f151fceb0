use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{now_str, Event, Guest};
use crate::store::{EventStore, Result, StoreError};

/// In-memory event store for tests.
#[derive(Default)]
pub struct MockEventStore {
    events: Mutex<HashMap<String, Event>>,
    guest_writes: Mutex<usize>,
    fail_next_guest_update: Mutex<bool>,
}

impl MockEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `update_guest` calls so far.
    pub async fn guest_write_count(&self) -> usize {
        *self.guest_writes.lock().await
    }

    /// Makes the next `update_guest` report a lost precondition, as if the
    /// guest had been removed concurrently.
    pub async fn fail_next_guest_update(&self) {
        *self.fail_next_guest_update.lock().await = true;
    }
}

/// A ready-to-store event with the given guests and no id.
pub fn sample_event(guests: Vec<Guest>) -> Event {
    let now = now_str();
    Event {
        id: String::new(),
        name: "Company Anniversary".to_string(),
        responsible: "Joana Lima".to_string(),
        date: "2030-12-25".to_string(),
        time: "19:00".to_string(),
        venue: "Central Restaurant".to_string(),
        description: Some("Dinner with the whole team".to_string()),
        category: None,
        status: None,
        capacity: None,
        created_at: now.clone(),
        updated_at: now,
        guests,
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn create_event(&self, mut event: Event) -> Result<Event> {
        if event.id.is_empty() {
            event.id = Uuid::new_v4().to_string();
        }
        let mut events = self.events.lock().await;
        if events.contains_key(&event.id) {
            return Err(StoreError::ConditionFailed(format!(
                "Event {} already exists",
                event.id
            )));
        }
        events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: &str) -> Result<Event> {
        self.events
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Event {} not found", id)))
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.events.lock().await.values().cloned().collect();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn update_event(&self, event: Event) -> Result<Event> {
        let mut events = self.events.lock().await;
        match events.get_mut(&event.id) {
            Some(existing) => {
                let guests = std::mem::take(&mut existing.guests);
                *existing = Event { guests, ..event };
                Ok(existing.clone())
            }
            None => Err(StoreError::NotFound(format!("Event {} not found", event.id))),
        }
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        self.events
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Event {} not found", id)))
    }

    async fn replace_guest_list(&self, id: &str, guests: Vec<Guest>) -> Result<()> {
        let mut events = self.events.lock().await;
        let event = events
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("Event {} not found", id)))?;
        event.guests = guests;
        event.updated_at = now_str();
        Ok(())
    }

    async fn append_guests(&self, id: &str, guests: Vec<Guest>) -> Result<()> {
        let mut events = self.events.lock().await;
        let event = events
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("Event {} not found", id)))?;
        event.guests.extend(guests);
        event.updated_at = now_str();
        Ok(())
    }

    async fn update_guest(
        &self,
        id: &str,
        index: usize,
        expected_email: &str,
        guest: Guest,
    ) -> Result<()> {
        let mut fail = self.fail_next_guest_update.lock().await;
        if *fail {
            *fail = false;
            return Err(StoreError::ConditionFailed(format!(
                "Guest {} is no longer at position {}",
                expected_email, index
            )));
        }
        drop(fail);

        let mut events = self.events.lock().await;
        let event = events
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("Event {} not found", id)))?;

        match event.guests.get_mut(index) {
            Some(existing) if existing.email == expected_email => {
                *existing = guest;
                event.updated_at = now_str();
            }
            _ => {
                return Err(StoreError::ConditionFailed(format!(
                    "Guest {} is no longer at position {}",
                    expected_email, index
                )))
            }
        }
        drop(events);

        *self.guest_writes.lock().await += 1;
        Ok(())
    }
}
