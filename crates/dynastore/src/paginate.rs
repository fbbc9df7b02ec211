//! Page-walking execution of planned reads.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use dynastore_core::{Record, Result};

use crate::codec::{self, FieldMap};
use crate::error;
use crate::planner::{ReadMode, ReadPlan};

/// Continuation cursor: the provider's `LastEvaluatedKey`, passed back
/// verbatim as `ExclusiveStartKey` on the next page.
type Cursor = HashMap<String, AttributeValue>;

struct Page {
    items: Vec<HashMap<String, AttributeValue>>,
    cursor: Option<Cursor>,
}

/// Executes a read plan to completion, decoding and accumulating items
/// page by page.
///
/// Continuation is an explicit loop, never recursion, so an arbitrary
/// page count stays flat on the stack; between pages we yield back to
/// the scheduler. A failure on any page aborts the whole accumulation —
/// partial results are never returned.
pub async fn fetch_all(
    client: &Client,
    plan: &ReadPlan,
    fields: Option<&FieldMap>,
) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut cursor: Option<Cursor> = None;

    loop {
        let page = match plan.mode {
            ReadMode::Scan => scan_page(client, plan, cursor.take()).await?,
            _ => query_page(client, plan, cursor.take()).await?,
        };

        records.extend(
            page.items
                .iter()
                .map(|item| codec::decode_record(item, fields)),
        );

        match page.cursor {
            Some(next) if !next.is_empty() => {
                cursor = Some(next);
                tokio::task::yield_now().await;
            }
            _ => return Ok(records),
        }
    }
}

async fn query_page(client: &Client, plan: &ReadPlan, cursor: Option<Cursor>) -> Result<Page> {
    let response = client
        .query()
        .table_name(&plan.table)
        .set_index_name(plan.index_name.clone())
        .set_key_condition_expression(plan.key_condition.clone())
        .set_filter_expression(plan.filter_expression.clone())
        .set_projection_expression(plan.projection_expression.clone())
        .set_expression_attribute_names(non_empty(&plan.expression_names))
        .set_expression_attribute_values(non_empty(&plan.expression_values))
        .set_scan_index_forward(plan.scan_forward)
        .set_exclusive_start_key(cursor)
        .send()
        .await
        .map_err(|e| error::map_query_error(e, &plan.table))?;

    Ok(Page {
        items: response.items.unwrap_or_default(),
        cursor: response.last_evaluated_key,
    })
}

async fn scan_page(client: &Client, plan: &ReadPlan, cursor: Option<Cursor>) -> Result<Page> {
    let response = client
        .scan()
        .table_name(&plan.table)
        .set_filter_expression(plan.filter_expression.clone())
        .set_projection_expression(plan.projection_expression.clone())
        .set_expression_attribute_names(non_empty(&plan.expression_names))
        .set_expression_attribute_values(non_empty(&plan.expression_values))
        .set_exclusive_start_key(cursor)
        .send()
        .await
        .map_err(|e| error::map_scan_error(e, &plan.table))?;

    Ok(Page {
        items: response.items.unwrap_or_default(),
        cursor: response.last_evaluated_key,
    })
}

// DynamoDB rejects empty substitution maps; omit them entirely when
// nothing was parameterized.
fn non_empty<V: Clone>(map: &HashMap<String, V>) -> Option<HashMap<String, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_helper() {
        let empty: HashMap<String, String> = HashMap::new();
        assert_eq!(non_empty(&empty), None);

        let mut map = HashMap::new();
        map.insert("#n0".to_string(), "id".to_string());
        assert_eq!(non_empty(&map).unwrap().len(), 1);
    }
}
