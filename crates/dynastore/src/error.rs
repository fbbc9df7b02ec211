//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to [`StoreError`]. Provider failures are logged
//! with operation context here and then propagated verbatim; no retry
//! happens at this layer. The one distinct case is a conditional-check
//! failure on create, which callers must be able to tell apart from
//! other provider failures.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use dynastore_core::StoreError;

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table: &str,
) -> StoreError {
    provider("GetItem", table, err.into_service_error())
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table: &str,
) -> StoreError {
    provider("Query", table, err.into_service_error())
}

/// Map a Scan SDK error to StoreError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
    table: &str,
) -> StoreError {
    provider("Scan", table, err.into_service_error())
}

/// Map a PutItem SDK error to StoreError.
///
/// A conditional-check failure means the no-clobber create found an
/// existing item under the same key; it surfaces as `AlreadyExists` so
/// callers can detect duplicate creates.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table: &str,
    kind: &str,
    id: impl Into<String>,
) -> StoreError {
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::AlreadyExists {
            kind: kind.to_string(),
            id: id.into(),
        },
        err => provider("PutItem", table, err),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    table: &str,
) -> StoreError {
    provider("UpdateItem", table, err.into_service_error())
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table: &str,
) -> StoreError {
    provider("DeleteItem", table, err.into_service_error())
}

/// Map a BatchWriteItem SDK error to StoreError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
    table: &str,
) -> StoreError {
    provider("BatchWriteItem", table, err.into_service_error())
}

fn provider(operation: &'static str, table: &str, err: impl Debug) -> StoreError {
    tracing::error!(operation, table, error = ?err, "dynamodb operation failed");
    StoreError::Provider(format!("{operation} failed: {err:?}"))
}
