//! Table deployment operations (Imperative Shell).
//!
//! Every key attribute is declared as a string: the adapter encodes
//! partition and sort key values as strings on the wire.

use super::client;
use super::config::{GsiSchema, TableSchema};
use super::error::{DynamodbError, Result};
use super::planning::{DeployPlan, DestroyPlan, GsiStatus, TableStatus};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use std::time::Duration;

/// Execute a deploy plan.
pub async fn execute_deploy_plan(client: &Client, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { schema } => {
            create_table(client, schema).await?;
            wait_for_table_active(client, &schema.name).await?;
        }
        DeployPlan::AddGsis {
            table_name,
            gsis_to_add,
        } => {
            for gsi in gsis_to_add {
                add_gsi(client, table_name, gsi).await?;
                wait_for_table_active(client, table_name).await?;
            }
        }
        DeployPlan::NoChanges { .. } => {
            // Nothing to do
        }
    }
    Ok(())
}

/// Execute a destroy plan.
pub async fn execute_destroy_plan(client: &Client, plan: &DestroyPlan) -> Result<()> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            delete_table(client, table_name).await?;
        }
        DestroyPlan::AlreadyGone { .. } => {
            // Nothing to do
        }
    }
    Ok(())
}

fn key_schema_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))
}

fn push_attribute(definitions: &mut Vec<AttributeDefinition>, name: &str) -> Result<()> {
    if !definitions.iter().any(|a| a.attribute_name() == name) {
        definitions.push(string_attribute(name)?);
    }
    Ok(())
}

fn gsi_key_schema(gsi: &GsiSchema) -> Result<Vec<KeySchemaElement>> {
    let mut key_schema = vec![key_schema_element(&gsi.partition_key, KeyType::Hash)?];
    if let Some(sk) = &gsi.sort_key {
        key_schema.push(key_schema_element(sk, KeyType::Range)?);
    }
    Ok(key_schema)
}

async fn create_table(client: &Client, schema: &TableSchema) -> Result<()> {
    let mut key_schema = vec![key_schema_element(&schema.partition_key, KeyType::Hash)?];
    let mut attribute_definitions = vec![string_attribute(&schema.partition_key)?];

    if let Some(sk) = &schema.sort_key {
        key_schema.push(key_schema_element(sk, KeyType::Range)?);
        attribute_definitions.push(string_attribute(sk)?);
    }

    // GSI key attributes may overlap with the table key or each other
    for gsi in &schema.gsis {
        push_attribute(&mut attribute_definitions, &gsi.partition_key)?;
        if let Some(sk) = &gsi.sort_key {
            push_attribute(&mut attribute_definitions, sk)?;
        }
    }

    let mut request = client
        .create_table()
        .table_name(&schema.name)
        .set_key_schema(Some(key_schema))
        .set_attribute_definitions(Some(attribute_definitions))
        .billing_mode(BillingMode::PayPerRequest);

    for gsi in &schema.gsis {
        request = request.global_secondary_indexes(
            GlobalSecondaryIndex::builder()
                .index_name(&gsi.name)
                .set_key_schema(Some(gsi_key_schema(gsi)?))
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()
                .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
        );
    }

    request
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    Ok(())
}

async fn add_gsi(client: &Client, table_name: &str, gsi: &GsiSchema) -> Result<()> {
    use aws_sdk_dynamodb::types::{CreateGlobalSecondaryIndexAction, GlobalSecondaryIndexUpdate};

    let mut attribute_definitions = vec![string_attribute(&gsi.partition_key)?];
    if let Some(sk) = &gsi.sort_key {
        attribute_definitions.push(string_attribute(sk)?);
    }

    client
        .update_table()
        .table_name(table_name)
        .set_attribute_definitions(Some(attribute_definitions))
        .global_secondary_index_updates(
            GlobalSecondaryIndexUpdate::builder()
                .create(
                    CreateGlobalSecondaryIndexAction::builder()
                        .index_name(&gsi.name)
                        .set_key_schema(Some(gsi_key_schema(gsi)?))
                        .projection(
                            Projection::builder()
                                .projection_type(ProjectionType::All)
                                .build(),
                        )
                        .build()
                        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?,
                )
                .build(),
        )
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    Ok(())
}

async fn delete_table(client: &Client, table_name: &str) -> Result<()> {
    client
        .delete_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    Ok(())
}

async fn wait_for_table_active(client: &Client, table_name: &str) -> Result<()> {
    let max_attempts = 60;
    let delay = Duration::from_secs(2);

    for _ in 0..max_attempts {
        if let Some(state) = client::get_table_state(client, table_name).await? {
            if state.status == TableStatus::Active {
                // Also check all GSIs are active
                let all_gsis_active = state.gsis.iter().all(|g| g.status == GsiStatus::Active);
                if all_gsis_active {
                    return Ok(());
                }
            }
        }
        tokio::time::sleep(delay).await;
    }

    Err(DynamodbError::TableActivationTimeout)
}
