use apollo_compiler::Name;
use indexmap::IndexSet;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;
use serde_json_bytes::json;

use super::PaginationState;
use super::PaginationStrategy;
use super::u64_variable;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::PaginationError;
use crate::fetch::Object;

/// Forward pagination of relay connections: `first` items after the `after` cursor.
///
/// Pagination continues while the page reports a next page and is not empty, so that servers
/// reporting a next page after an empty one do not loop forever.
pub const RELAY_FORWARD: PaginationStrategy = PaginationStrategy {
    name: "RelayForward",
    test,
    start,
    add_page,
    get_items,
};

fn test(variables: &IndexSet<Name>) -> bool {
    variables.contains("first") && variables.contains("after")
}

fn start(page_size: u64) -> PaginationState {
    PaginationState {
        result: json!({ "edges": [], "pageInfo": { "hasNextPage": true } }),
        variables: Object::from_iter([(ByteString::from("first"), Value::from(page_size))]),
        has_next_page: true,
    }
}

fn add_page(state: PaginationState, page: &Value) -> Result<PaginationState, PaginationError> {
    let first = u64_variable(&state.variables, "first", DEFAULT_PAGE_SIZE);
    let page_edges = edges(page)?;
    let page_info = page
        .get("pageInfo")
        .cloned()
        .unwrap_or(Value::Null);
    let has_next_page_reported = page_info
        .get("hasNextPage")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let mut variables = Object::from_iter([(ByteString::from("first"), Value::from(first))]);
    let tail = page_edges.last();
    let has_next_page = has_next_page_reported && tail.is_some();
    match tail.and_then(|edge| edge.get("cursor")).filter(|cursor| cursor.is_string()) {
        Some(cursor) => {
            variables.insert(ByteString::from("after"), cursor.clone());
        }
        None if has_next_page => return Err(shape_error("last edge has no cursor")),
        None => {}
    }
    let mut all_edges = edges(&state.result)?.to_vec();
    all_edges.extend(page_edges.iter().cloned());

    Ok(PaginationState {
        result: json!({ "pageInfo": page_info, "edges": all_edges }),
        variables,
        has_next_page,
    })
}

fn get_items(page_or_result: &Value) -> Result<Vec<Value>, PaginationError> {
    Ok(edges(page_or_result)?
        .iter()
        .map(|edge| edge.get("node").cloned().unwrap_or(Value::Null))
        .collect())
}

fn edges(connection: &Value) -> Result<&[Value], PaginationError> {
    match connection {
        Value::Null => Ok(&[]),
        Value::Object(object) => match object.get("edges") {
            Some(Value::Array(edges)) => Ok(edges),
            None | Some(Value::Null) => Ok(&[]),
            Some(_) => Err(shape_error("edges is not a list")),
        },
        _ => Err(shape_error("page is not a connection object")),
    }
}

fn shape_error(reason: &'static str) -> PaginationError {
    PaginationError::UnexpectedPageShape {
        strategy: RELAY_FORWARD.name,
        reason,
    }
}
