use futures::StreamExt;
use futures::TryStreamExt;
use futures::stream;
use serde_json_bytes::Value;
use tracing::debug;
use tracing::instrument;

use super::ExecutionRequest;
use super::NodeDefinition;
use super::Object;
use super::SourcingContext;
use super::field_path::find_node_field_path;
use super::field_path::get_first_value_by_path;
use super::operations::OperationKind;
use super::operations::list_operation_names;
use super::operations::node_operation_names;
use super::operations::paginate_operation_names;
use crate::error::ConfigurationError;
use crate::error::FetchError;
use crate::pagination::combine;
use crate::pagination::paginate;
use crate::pagination::plan_pagination;

/// Records fetched for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub remote_type_name: String,
    pub nodes: Vec<Value>,
}

/// Runs every `LIST_` operation of every entity type.
///
/// Types are fetched concurrently, at most `concurrency` at a time, in no particular order. The
/// operations of one type run one after the other.
#[instrument(skip_all, fields(entity_types = context.node_definitions.len()))]
pub async fn fetch_all_nodes(context: &SourcingContext) -> Result<Vec<FetchResult>, FetchError> {
    stream::iter(context.node_definitions.values())
        .map(|definition| fetch_nodes_by_type(context, definition))
        .buffer_unordered(context.config.concurrency.max(1))
        .try_collect()
        .await
}

async fn fetch_nodes_by_type(
    context: &SourcingContext,
    definition: &NodeDefinition,
) -> Result<FetchResult, FetchError> {
    let mut nodes = Vec::new();
    for operation_name in list_operation_names(&definition.document) {
        nodes.extend(fetch_node_list(context, definition, &operation_name).await?);
    }
    debug!(
        type_name = %definition.remote_type_name,
        nodes = nodes.len(),
        "fetched nodes"
    );
    Ok(FetchResult {
        remote_type_name: definition.remote_type_name.clone(),
        nodes,
    })
}

/// Paginates a `LIST_` operation and completes every item with its paginated fields.
#[instrument(skip(context, definition), fields(type_name = %definition.remote_type_name))]
pub async fn fetch_node_list(
    context: &SourcingContext,
    definition: &NodeDefinition,
    operation_name: &str,
) -> Result<Vec<Value>, FetchError> {
    let plan = plan_pagination(
        &definition.document,
        definition.query.clone(),
        operation_name,
        Object::new(),
        &context.strategies,
        &context.config,
    )?;
    let mut nodes = Vec::new();
    for page in paginate(context.executor.as_ref(), &plan).await? {
        for mut node in (plan.strategy.get_items)(&page.field_value)? {
            add_paginated_fields(context, definition, &mut node).await?;
            nodes.push(node);
        }
    }
    Ok(nodes)
}

/// Fetches one record with the first `NODE_` operation of the type.
///
/// `variables` are the node query variables of the record, see
/// [`NodeDefinition::node_query_variables`]. When the node field is a list, its first element is
/// the record.
#[instrument(skip_all, fields(type_name = %definition.remote_type_name))]
pub async fn fetch_node_by_id(
    context: &SourcingContext,
    definition: &NodeDefinition,
    variables: Object,
) -> Result<Value, FetchError> {
    let operation_name = node_operation_names(&definition.document)
        .into_iter()
        .next()
        .ok_or_else(|| ConfigurationError::MissingOperation {
            kind: OperationKind::Node.to_string(),
            type_name: definition.remote_type_name.clone(),
        })?;
    let node_field_path = find_node_field_path(
        &definition.document,
        &operation_name,
        context.config.max_field_path_depth,
    )?;

    let request = ExecutionRequest {
        query: definition.query.clone(),
        operation_name: operation_name.clone(),
        variables,
    };
    let response = context
        .executor
        .execute(request)
        .await
        .map_err(|source| FetchError::Transport {
            operation: operation_name.clone(),
            source,
        })?;
    let first_error = response.first_error_message().map(str::to_string);
    let data = response
        .data
        .filter(|data| !data.is_null())
        .ok_or_else(|| {
            FetchError::missing_data(
                first_error.as_deref(),
                &operation_name,
                Some(definition.remote_type_name.as_str()),
            )
        })?;

    let mut node = get_first_value_by_path(&data, &node_field_path)
        .cloned()
        .unwrap_or(Value::Null);
    add_paginated_fields(context, definition, &mut node).await?;
    Ok(node)
}

/// Completes `node` with the fields of every `PAGINATE_` operation of the type.
///
/// Each operation is paginated with the node query variables of the record, and the fields of the
/// node found in the combined response are merged into `node`. Null items and records of other
/// types are left untouched.
pub async fn add_paginated_fields(
    context: &SourcingContext,
    definition: &NodeDefinition,
    node: &mut Value,
) -> Result<(), FetchError> {
    let operations = paginate_operation_names(&definition.document);
    if operations.is_empty() || !is_record_of(context, definition, node) {
        return Ok(());
    }
    let variables = definition.node_query_variables(node)?;
    for operation_name in operations {
        let plan = plan_pagination(
            &definition.document,
            definition.query.clone(),
            &operation_name,
            variables.clone(),
            &context.strategies,
            &context.config,
        )?;
        let pages = paginate(context.executor.as_ref(), &plan).await?;
        let Some(data) = combine(&pages, &plan)? else {
            continue;
        };
        let node_field_path = find_node_field_path(
            &definition.document,
            &operation_name,
            context.config.max_field_path_depth,
        )?;
        if let (Some(Value::Object(fields)), Value::Object(record)) =
            (get_first_value_by_path(&data, &node_field_path), &mut *node)
        {
            record.extend(fields.clone());
        }
    }
    Ok(())
}

/// An object whose type discriminator, when selected, names the type of `definition`.
fn is_record_of(context: &SourcingContext, definition: &NodeDefinition, node: &Value) -> bool {
    let Value::Object(record) = node else {
        return false;
    };
    record
        .get(context.config.field_aliases.typename())
        .and_then(Value::as_str)
        .is_none_or(|type_name| type_name == definition.remote_type_name)
}
