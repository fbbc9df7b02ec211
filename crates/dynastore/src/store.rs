//! The DynamoDB entity store.
//!
//! Implements the `EntityStore` trait from `dynastore_core`: the write
//! path (conditional create, attribute-level update or full replace,
//! single and batch delete) plus the read entry points that hand off to
//! the planner and pagination driver.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use uuid::Uuid;

use dynastore_core::config::StoreConfig;
use dynastore_core::storage::SaveOptions;
use dynastore_core::{
    Canon, EntityStore, Query, QueryValue, Record, Result, StoreError, TableDescriptor,
    TableResolver, Value,
};

use crate::codec::{self, FieldMap};
use crate::error;
use crate::paginate;
use crate::planner;

type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// DynamoDB-backed entity store.
///
/// Holds the SDK client, the per-entity configuration, and the memoized
/// table resolver. Concurrent operations share all three; the only
/// mutable state is the resolver's cache.
pub struct DynamoStore {
    client: Client,
    config: Arc<StoreConfig>,
    resolver: TableResolver,
    generate_id: IdGenerator,
}

impl DynamoStore {
    /// Creates a store with the given DynamoDB client and configuration.
    pub fn new(client: Client, config: StoreConfig) -> Self {
        let config = Arc::new(config);
        Self {
            client,
            resolver: TableResolver::new(Arc::clone(&config)),
            config,
            generate_id: Arc::new(|| Uuid::new_v4().to_string()),
        }
    }

    /// Creates a store from environment configuration.
    ///
    /// Uses the AWS SDK default credential chain; `AWS_ENDPOINT_URL`
    /// points the client at a local DynamoDB when set.
    pub async fn from_env(config: StoreConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), config)
    }

    /// Replaces the id generator used for creates without an explicit
    /// key. The default generates UUID v4 strings.
    pub fn with_id_generator(
        mut self,
        generate: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.generate_id = Arc::new(generate);
        self
    }

    /// The underlying SDK client, for callers that need raw access.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Field coercion metadata for an entity kind, looked up over the
    /// canon's candidate keys like the table layout.
    fn fields_for(&self, canon: &Canon) -> Option<&FieldMap> {
        canon
            .candidates()
            .into_iter()
            .find_map(|candidate| self.config.entity.get(&candidate))
            .map(|entity| &entity.fields)
    }

    async fn get_by_key(
        &self,
        table: &TableDescriptor,
        key: HashMap<String, AttributeValue>,
        fields: Option<&FieldMap>,
    ) -> Result<Option<Record>> {
        let response = self
            .client
            .get_item()
            .table_name(&table.name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| error::map_get_item_error(e, &table.name))?;

        Ok(response.item.map(|item| codec::decode_record(&item, fields)))
    }

    async fn delete_by_key(
        &self,
        table: &TableDescriptor,
        key: HashMap<String, AttributeValue>,
        load: bool,
        fields: Option<&FieldMap>,
    ) -> Result<Option<Record>> {
        let previous = if load {
            self.get_by_key(table, key.clone(), fields).await?
        } else {
            None
        };

        self.client
            .delete_item()
            .table_name(&table.name)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| error::map_delete_item_error(e, &table.name))?;

        Ok(previous)
    }
}

#[async_trait]
impl EntityStore for DynamoStore {
    async fn save(&self, canon: &Canon, record: Record, options: &SaveOptions) -> Result<Record> {
        // Reserved feature: fail fast rather than approximate.
        if options.upsert.is_some() {
            return Err(StoreError::Unimplemented { feature: "upsert" });
        }

        let table = self.resolver.resolve(canon);
        let fields = self.fields_for(canon);

        let mut record = record;
        let update = record.contains(&table.partition_key);
        if !update {
            let id = options.id.clone().unwrap_or_else(|| (self.generate_id)());
            record.insert(table.partition_key.clone(), id);
        }

        let id_display = display_key(record.get(&table.partition_key));
        let item = codec::encode_record(&record);
        let key = key_attributes(&table, &item)?;
        let merge = options.merge.unwrap_or(self.config.merge);

        if !update {
            // No-clobber create: reject a duplicate key.
            tracing::debug!(table = %table.name, kind = %canon, "creating item");
            self.client
                .put_item()
                .table_name(&table.name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(#pk)")
                .expression_attribute_names("#pk", &table.partition_key)
                .send()
                .await
                .map_err(|e| {
                    error::map_put_item_error(e, &table.name, &canon.key(), &id_display)
                })?;
        } else if !merge {
            // Full overwrite.
            tracing::debug!(table = %table.name, kind = %canon, "replacing item");
            self.client
                .put_item()
                .table_name(&table.name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| {
                    error::map_put_item_error(e, &table.name, &canon.key(), &id_display)
                })?;
        } else if let Some((expression, names, values)) = update_expression(&table, &item) {
            // Attribute-level update: absent fields stay untouched
            // server-side, explicit nulls overwrite.
            tracing::debug!(table = %table.name, kind = %canon, "updating item");
            self.client
                .update_item()
                .table_name(&table.name)
                .set_key(Some(key.clone()))
                .update_expression(expression)
                .set_expression_attribute_names(Some(names))
                .set_expression_attribute_values(Some(values))
                .send()
                .await
                .map_err(|e| error::map_update_item_error(e, &table.name))?;
        }

        // Reload to return canonical post-write state.
        match self.get_by_key(&table, key, fields).await? {
            Some(saved) => Ok(saved),
            None => Err(StoreError::Provider(format!(
                "item missing after write: table {}",
                table.name
            ))),
        }
    }

    async fn load(&self, canon: &Canon, query: &Query) -> Result<Option<Record>> {
        let table = self.resolver.resolve(canon);

        if let Some(key) = key_from_query(&table, query) {
            let fields = self.fields_for(canon);
            return self.get_by_key(&table, key, fields).await;
        }

        if query.is_empty() {
            return Ok(None);
        }

        let mut matches = self.list(canon, query).await?;
        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.remove(0)))
        }
    }

    async fn list(&self, canon: &Canon, query: &Query) -> Result<Vec<Record>> {
        let table = self.resolver.resolve(canon);
        let fields = self.fields_for(canon);

        let plan = planner::plan_read(&table, query)?;
        tracing::debug!(
            table = %plan.table,
            mode = ?plan.mode,
            index = plan.index_name.as_deref(),
            "planned read"
        );

        paginate::fetch_all(&self.client, &plan, fields).await
    }

    async fn remove(&self, canon: &Canon, query: &Query) -> Result<Option<Record>> {
        let table = self.resolver.resolve(canon);
        let fields = self.fields_for(canon);

        if let Some(key) = key_from_query(&table, query) {
            return self.delete_by_key(&table, key, query.load, fields).await;
        }

        // Guard against accidental full-table deletion: an empty query
        // must state its intent explicitly.
        if query.is_empty() && !query.all {
            return Err(StoreError::EmptyRemoveQuery);
        }

        let list_query = Query {
            filters: query.filters.clone(),
            sort: query.sort.clone(),
            ..Query::default()
        };
        let matches = self.list(canon, &list_query).await?;

        if query.all {
            if matches.is_empty() {
                return Ok(None);
            }
            let requests = batch_delete_requests(&table, &matches)?;
            tracing::debug!(table = %table.name, count = requests.len(), "batch deleting items");
            self.client
                .batch_write_item()
                .request_items(table.name.clone(), requests)
                .send()
                .await
                .map_err(|e| error::map_batch_write_error(e, &table.name))?;
            return Ok(None);
        }

        match matches.into_iter().next() {
            Some(first) => {
                let item = codec::encode_record(&first);
                let key = key_attributes(&table, &item)?;
                self.delete_by_key(&table, key, query.load, fields).await
            }
            None => Ok(None),
        }
    }
}

/// Extracts the table's key attributes from an encoded item.
fn key_attributes(
    table: &TableDescriptor,
    item: &HashMap<String, AttributeValue>,
) -> Result<HashMap<String, AttributeValue>> {
    let mut key = HashMap::new();

    let partition = item.get(&table.partition_key).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "missing partition key attribute: {}",
            table.partition_key
        ))
    })?;
    key.insert(table.partition_key.clone(), partition.clone());

    if let Some(sort) = &table.sort_key {
        let value = item
            .get(sort)
            .ok_or_else(|| StoreError::InvalidData(format!("missing sort key attribute: {sort}")))?;
        key.insert(sort.clone(), value.clone());
    }

    Ok(key)
}

/// The full primary key from a query, when the query pins every key
/// attribute with plain equality. Anything else returns `None` and the
/// caller goes through the planner instead.
fn key_from_query(
    table: &TableDescriptor,
    query: &Query,
) -> Option<HashMap<String, AttributeValue>> {
    let mut key = HashMap::new();

    match query.get(&table.partition_key)? {
        QueryValue::Scalar(value) => {
            key.insert(table.partition_key.clone(), codec::encode_value(value));
        }
        _ => return None,
    }

    if let Some(sort) = &table.sort_key {
        match query.get(sort)? {
            QueryValue::Scalar(value) => {
                key.insert(sort.clone(), codec::encode_value(value));
            }
            _ => return None,
        }
    }

    Some(key)
}

/// Builds the SET expression for an attribute-level update over every
/// non-key attribute, in deterministic order. Key attributes are never
/// part of the update. Returns `None` when nothing remains to set.
fn update_expression(
    table: &TableDescriptor,
    item: &HashMap<String, AttributeValue>,
) -> Option<(
    String,
    HashMap<String, String>,
    HashMap<String, AttributeValue>,
)> {
    let mut attributes: Vec<&String> = item
        .keys()
        .filter(|name| {
            **name != table.partition_key && Some(name.as_str()) != table.sort_key.as_deref()
        })
        .collect();
    attributes.sort();

    if attributes.is_empty() {
        return None;
    }

    let mut names = HashMap::new();
    let mut values = HashMap::new();
    let mut assignments = Vec::with_capacity(attributes.len());

    for (i, name) in attributes.iter().enumerate() {
        names.insert(format!("#u{i}"), (*name).clone());
        values.insert(format!(":u{i}"), item[*name].clone());
        assignments.push(format!("#u{i} = :u{i}"));
    }

    Some((
        format!("SET {}", assignments.join(", ")),
        names,
        values,
    ))
}

/// Delete requests for one batch write, keyed from each record.
///
/// The provider caps a batch at 25 requests; chunking beyond that is the
/// caller's concern and oversized batches surface as provider errors.
fn batch_delete_requests(
    table: &TableDescriptor,
    records: &[Record],
) -> Result<Vec<WriteRequest>> {
    records
        .iter()
        .map(|record| {
            let item = codec::encode_record(record);
            let key = key_attributes(table, &item)?;
            let delete = DeleteRequest::builder()
                .set_key(Some(key))
                .build()
                .map_err(|e| StoreError::InvalidData(format!("delete request: {e}")))?;
            Ok(WriteRequest::builder().delete_request(delete).build())
        })
        .collect()
}

fn display_key(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => format!("{other:?}"),
        None => String::new(),
    }
}
