use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use log::debug;
use std::env;

/// Tests run against DynamoDB Local only when `USE_DYNAMODB=true`.
pub fn use_dynamodb() -> bool {
    env::var("USE_DYNAMODB")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

pub async fn create_dynamo_client() -> Client {
    let endpoint =
        env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8000".to_string());
    debug!("Connecting to DynamoDB Local at {}", endpoint);

    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint)
        .credentials_provider(Credentials::new("local", "local", None, None, "test"))
        .load()
        .await;

    Client::new(&config)
}

pub async fn create_event_table(client: &Client, table_name: &str) -> Result<(), String> {
    let id_attribute = AttributeDefinition::builder()
        .attribute_name("id")
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| e.to_string())?;
    let id_key = KeySchemaElement::builder()
        .attribute_name("id")
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| e.to_string())?;

    client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(id_attribute)
        .key_schema(id_key)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .map_err(|e| DisplayErrorContext(&e).to_string())?;

    Ok(())
}

pub async fn clear_dynamo_table(client: &Client, table_name: &str) -> Result<(), String> {
    let output = client
        .scan()
        .table_name(table_name)
        .projection_expression("id")
        .send()
        .await
        .map_err(|e| DisplayErrorContext(&e).to_string())?;

    for item in output.items.unwrap_or_default() {
        if let Some(AttributeValue::S(id)) = item.get("id") {
            client
                .delete_item()
                .table_name(table_name)
                .key("id", AttributeValue::S(id.clone()))
                .send()
                .await
                .map_err(|e| DisplayErrorContext(&e).to_string())?;
        }
    }

    Ok(())
}
