use apollo_compiler::Name;
use indexmap::IndexSet;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;

use super::PaginationState;
use super::PaginationStrategy;
use super::u64_variable;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::PaginationError;
use crate::fetch::Object;

/// Pages of `limit` items starting at `offset`. A page shorter than `limit` is the last one.
pub const LIMIT_OFFSET: PaginationStrategy = PaginationStrategy {
    name: "LimitOffset",
    test,
    start,
    add_page,
    get_items,
};

fn test(variables: &IndexSet<Name>) -> bool {
    variables.contains("limit") && variables.contains("offset")
}

fn start(page_size: u64) -> PaginationState {
    PaginationState {
        result: Value::Array(Vec::new()),
        variables: variables(page_size, 0),
        has_next_page: true,
    }
}

fn add_page(state: PaginationState, page: &Value) -> Result<PaginationState, PaginationError> {
    let limit = u64_variable(&state.variables, "limit", DEFAULT_PAGE_SIZE);
    let offset = u64_variable(&state.variables, "offset", 0) + limit;
    let page = items(page)?;
    let Value::Array(mut result) = state.result else {
        return Err(shape_error("accumulated result is not a list"));
    };
    let has_next_page = limit > 0 && page.len() as u64 == limit;
    result.extend(page.iter().cloned());

    Ok(PaginationState {
        result: Value::Array(result),
        variables: variables(limit, offset),
        has_next_page,
    })
}

fn get_items(page_or_result: &Value) -> Result<Vec<Value>, PaginationError> {
    Ok(items(page_or_result)?.to_vec())
}

fn items(value: &Value) -> Result<&[Value], PaginationError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(&[]),
        _ => Err(shape_error("page is not a list")),
    }
}

fn variables(limit: u64, offset: u64) -> Object {
    Object::from_iter([
        (ByteString::from("limit"), Value::from(limit)),
        (ByteString::from("offset"), Value::from(offset)),
    ])
}

fn shape_error(reason: &'static str) -> PaginationError {
    PaginationError::UnexpectedPageShape {
        strategy: LIMIT_OFFSET.name,
        reason,
    }
}
