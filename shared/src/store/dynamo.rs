use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use log::{debug, error, info};
use std::collections::HashMap;
use uuid::Uuid;

use super::{EventStore, Result, StoreError};
use crate::models::{now_str, Event, Guest};

/// DynamoDB-backed event store. Events are keyed by `id`, guests live in
/// the `guests` list attribute of their event.
pub struct DynamoEventStore {
    client: Client,
    table_name: String,
}

impl DynamoEventStore {
    /// Uses the default AWS configuration.
    pub async fn with_table(table_name: String) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        info!("Using DynamoDB table '{}' for events", table_name);
        Self::with_client_and_table(Client::new(&config), table_name)
    }

    pub fn with_client_and_table(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    fn key(id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([("id".to_string(), AttributeValue::S(id.to_string()))])
    }

    async fn put_item(
        &self,
        item: HashMap<String, AttributeValue>,
        condition: &str,
    ) -> std::result::Result<(), PutItemError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression(condition)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| e.into_service_error())
    }
}

fn dynamo_error(context: &str, err: impl std::error::Error) -> StoreError {
    let message = format!("{}: {}", context, DisplayErrorContext(&err));
    error!("{}", message);
    StoreError::Dynamo(message)
}

#[async_trait]
impl EventStore for DynamoEventStore {
    async fn create_event(&self, mut event: Event) -> Result<Event> {
        if event.id.is_empty() {
            event.id = Uuid::new_v4().to_string();
        }
        debug!("Creating event id={} in {}", event.id, self.table_name);

        let item = serde_dynamo::to_item(&event)?;
        self.put_item(item, "attribute_not_exists(id)")
            .await
            .map_err(|e| dynamo_error("Failed to create event", e))?;

        Ok(event)
    }

    async fn get_event(&self, id: &str) -> Result<Event> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| dynamo_error("Failed to get event", e))?;

        match output.item {
            Some(item) => Ok(serde_dynamo::from_item(item)?),
            None => Err(StoreError::NotFound(format!("Event {} not found", id))),
        }
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| dynamo_error("Failed to scan events", e))?;

            for item in output.items.unwrap_or_default() {
                events.push(serde_dynamo::from_item(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        events.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        debug!("Scanned {} events from {}", events.len(), self.table_name);
        Ok(events)
    }

    async fn update_event(&self, event: Event) -> Result<Event> {
        let mut sets = Vec::new();
        let mut removes = Vec::new();
        let mut names = HashMap::new();
        let mut values = HashMap::new();

        let required = [
            ("name", AttributeValue::S(event.name.clone())),
            ("responsible", AttributeValue::S(event.responsible.clone())),
            ("date", AttributeValue::S(event.date.clone())),
            ("time", AttributeValue::S(event.time.clone())),
            ("venue", AttributeValue::S(event.venue.clone())),
            ("updatedAt", AttributeValue::S(event.updated_at.clone())),
        ];
        for (attr, value) in required {
            names.insert(format!("#{}", attr), attr.to_string());
            values.insert(format!(":{}", attr), value);
            sets.push(format!("#{} = :{}", attr, attr));
        }

        let optional = [
            ("description", event.description.clone().map(AttributeValue::S)),
            ("category", event.category.clone().map(AttributeValue::S)),
            ("status", event.status.clone().map(AttributeValue::S)),
            (
                "capacity",
                event.capacity.map(|c| AttributeValue::N(c.to_string())),
            ),
        ];
        for (attr, value) in optional {
            names.insert(format!("#{}", attr), attr.to_string());
            match value {
                Some(value) => {
                    values.insert(format!(":{}", attr), value);
                    sets.push(format!("#{} = :{}", attr, attr));
                }
                None => removes.push(format!("#{}", attr)),
            }
        }

        let mut expression = format!("SET {}", sets.join(", "));
        if !removes.is_empty() {
            expression.push_str(&format!(" REMOVE {}", removes.join(", ")));
        }

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(&event.id)))
            .update_expression(expression)
            .condition_expression("attribute_exists(id)")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result.map_err(|e| e.into_service_error()) {
            Ok(output) => match output.attributes {
                Some(item) => Ok(serde_dynamo::from_item(item)?),
                None => Err(StoreError::Dynamo(format!(
                    "Update of event {} returned no attributes",
                    event.id
                ))),
            },
            Err(UpdateItemError::ConditionalCheckFailedException(_)) => Err(StoreError::NotFound(
                format!("Event {} not found", event.id),
            )),
            Err(e) => Err(dynamo_error("Failed to update event", e)),
        }
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .condition_expression("attribute_exists(id)")
            .send()
            .await;

        match result.map_err(|e| e.into_service_error()) {
            Ok(_) => Ok(()),
            Err(DeleteItemError::ConditionalCheckFailedException(_)) => {
                Err(StoreError::NotFound(format!("Event {} not found", id)))
            }
            Err(e) => Err(dynamo_error("Failed to delete event", e)),
        }
    }

    async fn replace_guest_list(&self, id: &str, guests: Vec<Guest>) -> Result<()> {
        let guests_value: AttributeValue = serde_dynamo::to_attribute_value(&guests)?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .update_expression("SET #guests = :guests, #updated = :now")
            .condition_expression("attribute_exists(id)")
            .expression_attribute_names("#guests", "guests")
            .expression_attribute_names("#updated", "updatedAt")
            .expression_attribute_values(":guests", guests_value)
            .expression_attribute_values(":now", AttributeValue::S(now_str()))
            .send()
            .await;

        match result.map_err(|e| e.into_service_error()) {
            Ok(_) => Ok(()),
            Err(UpdateItemError::ConditionalCheckFailedException(_)) => {
                Err(StoreError::NotFound(format!("Event {} not found", id)))
            }
            Err(e) => Err(dynamo_error("Failed to replace guest list", e)),
        }
    }

    async fn append_guests(&self, id: &str, guests: Vec<Guest>) -> Result<()> {
        let new_guests: AttributeValue = serde_dynamo::to_attribute_value(&guests)?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .update_expression(
                "SET #guests = list_append(if_not_exists(#guests, :empty), :new), #updated = :now",
            )
            .condition_expression("attribute_exists(id)")
            .expression_attribute_names("#guests", "guests")
            .expression_attribute_names("#updated", "updatedAt")
            .expression_attribute_values(":new", new_guests)
            .expression_attribute_values(":empty", AttributeValue::L(Vec::new()))
            .expression_attribute_values(":now", AttributeValue::S(now_str()))
            .send()
            .await;

        match result.map_err(|e| e.into_service_error()) {
            Ok(_) => Ok(()),
            Err(UpdateItemError::ConditionalCheckFailedException(_)) => {
                Err(StoreError::NotFound(format!("Event {} not found", id)))
            }
            Err(e) => Err(dynamo_error("Failed to append guests", e)),
        }
    }

    async fn update_guest(
        &self,
        id: &str,
        index: usize,
        expected_email: &str,
        guest: Guest,
    ) -> Result<()> {
        let guest_value: AttributeValue = serde_dynamo::to_attribute_value(&guest)?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(id)))
            .update_expression(format!("SET #guests[{}] = :guest, #updated = :now", index))
            .condition_expression(format!(
                "attribute_exists(id) AND #guests[{}].#email = :email",
                index
            ))
            .expression_attribute_names("#guests", "guests")
            .expression_attribute_names("#email", "email")
            .expression_attribute_names("#updated", "updatedAt")
            .expression_attribute_values(":guest", guest_value)
            .expression_attribute_values(":email", AttributeValue::S(expected_email.to_string()))
            .expression_attribute_values(":now", AttributeValue::S(now_str()))
            .send()
            .await;

        match result.map_err(|e| e.into_service_error()) {
            Ok(_) => Ok(()),
            Err(UpdateItemError::ConditionalCheckFailedException(_)) => {
                Err(StoreError::ConditionFailed(format!(
                    "Guest {} is no longer at position {} of event {}",
                    expected_email, index, id
                )))
            }
            Err(e) => Err(dynamo_error("Failed to update guest", e)),
        }
    }
}
