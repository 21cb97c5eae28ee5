use std::sync::Arc;

use apollo_compiler::ast;
use indexmap::IndexSet;
use itertools::Itertools;
use serde_json_bytes::Value;
use tracing::instrument;
use tracing::trace;

use super::PaginationState;
use super::PaginationStrategy;
use crate::ast::find_operation;
use crate::config::SourcingConfig;
use crate::error::ConfigurationError;
use crate::error::FetchError;
use crate::error::PaginationError;
use crate::fetch::ExecutionRequest;
use crate::fetch::Object;
use crate::fetch::QueryExecutor;
use crate::fetch::field_path::find_paginated_field_path;
use crate::fetch::field_path::get_first_value_by_path;
use crate::fetch::field_path::update_first_value_by_path;

/// How to paginate one field of one operation.
#[derive(Debug, Clone)]
pub struct PaginationPlan {
    pub query: Arc<str>,
    pub operation_name: String,
    /// Variables sent with every page, merged under the strategy's variables.
    pub variables: Object,
    pub strategy: PaginationStrategy,
    /// Response keys leading to the paginated field.
    pub field_path: Vec<String>,
    pub page_size: u64,
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The `data` payload of the response.
    pub data: Value,
    /// The value of the paginated field in `data`.
    pub field_value: Value,
}

/// Resolves the strategy of `operation_name` from its declared variables and locates the
/// paginated field.
///
/// Strategies are tested in order and the first match wins.
pub fn plan_pagination(
    document: &ast::Document,
    query: Arc<str>,
    operation_name: &str,
    variables: Object,
    strategies: &[PaginationStrategy],
    config: &SourcingConfig,
) -> Result<PaginationPlan, PaginationError> {
    if config.page_size == 0 {
        return Err(ConfigurationError::ZeroPageSize.into());
    }
    let operation = find_operation(document, operation_name)
        .ok_or_else(|| PaginationError::UnknownOperation(operation_name.to_string()))?;
    let variable_names = operation
        .variables
        .iter()
        .map(|variable| variable.name.clone())
        .collect::<IndexSet<_>>();
    let strategy = strategies
        .iter()
        .find(|strategy| (strategy.test)(&variable_names))
        .copied()
        .ok_or_else(|| PaginationError::NoMatchingStrategy {
            variables: variable_names.iter().join(", "),
            supported: strategies.iter().map(|strategy| strategy.name).join(", "),
        })?;
    let field_path = find_paginated_field_path(
        document,
        operation_name,
        &strategy,
        config.max_field_path_depth,
    )?;

    Ok(PaginationPlan {
        query,
        operation_name: operation_name.to_string(),
        variables,
        strategy,
        field_path,
        page_size: config.page_size,
    })
}

/// Fetches every page of the plan, in order.
///
/// The variables of each page depend on the previous one, so pages are fetched one at a time.
#[instrument(skip_all, fields(operation = %plan.operation_name, strategy = plan.strategy.name))]
pub async fn paginate(
    executor: &dyn QueryExecutor,
    plan: &PaginationPlan,
) -> Result<Vec<Page>, FetchError> {
    let mut state = (plan.strategy.start)(plan.page_size);
    let mut pages = Vec::new();
    while state.has_next_page {
        let mut variables = plan.variables.clone();
        variables.extend(state.variables.clone());
        let request = ExecutionRequest {
            query: plan.query.clone(),
            operation_name: plan.operation_name.clone(),
            variables,
        };
        let response = executor
            .execute(request)
            .await
            .map_err(|source| FetchError::Transport {
                operation: plan.operation_name.clone(),
                source,
            })?;
        let first_error = response.first_error_message().map(str::to_string);
        let data = response
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| {
                FetchError::missing_data(first_error.as_deref(), &plan.operation_name, None)
            })?;

        let field_value = get_first_value_by_path(&data, &plan.field_path)
            .cloned()
            .unwrap_or(Value::Null);
        state = (plan.strategy.add_page)(state, &field_value)?;
        trace!(
            page = pages.len(),
            has_next_page = state.has_next_page,
            "fetched page"
        );
        pages.push(Page { data, field_value });
    }
    Ok(pages)
}

/// Folds the pages into the response data of the last page, with the accumulated result at the
/// paginated field. `None` without pages.
pub fn combine(pages: &[Page], plan: &PaginationPlan) -> Result<Option<Value>, PaginationError> {
    let Some(last) = pages.last() else {
        return Ok(None);
    };
    let mut state: PaginationState = (plan.strategy.start)(plan.page_size);
    for page in pages {
        state = (plan.strategy.add_page)(state, &page.field_value)?;
    }
    let mut data = last.data.clone();
    update_first_value_by_path(&mut data, &plan.field_path, state.result);
    Ok(Some(data))
}

/// Fetches every page of the plan and returns the items of all pages.
pub async fn fetch_paginated_items(
    executor: &dyn QueryExecutor,
    plan: &PaginationPlan,
) -> Result<Vec<Value>, FetchError> {
    let pages = paginate(executor, plan).await?;
    let Some(data) = combine(&pages, plan)? else {
        return Ok(Vec::new());
    };
    let result = get_first_value_by_path(&data, &plan.field_path).unwrap_or(&Value::Null);
    Ok((plan.strategy.get_items)(result)?)
}
