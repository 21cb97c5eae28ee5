//! Pagination strategies and the engine walking them.
//!
//! A strategy is a record of plain functions rather than a trait object: strategies are
//! stateless, and the engine tries them in order, the first one whose test accepts the variables
//! of an operation wins.
use std::fmt;

use apollo_compiler::Name;
use indexmap::IndexSet;
use serde_json_bytes::Value;

use crate::error::PaginationError;
use crate::fetch::Object;

mod engine;
mod limit_offset;
mod relay;

pub use engine::Page;
pub use engine::PaginationPlan;
pub use engine::combine;
pub use engine::fetch_paginated_items;
pub use engine::paginate;
pub use engine::plan_pagination;
pub use limit_offset::LIMIT_OFFSET;
pub use relay::RELAY_FORWARD;

/// Accumulated result of the pages fetched so far, with the variables of the next page.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState {
    pub result: Value,
    pub variables: Object,
    pub has_next_page: bool,
}

/// How to request successive pages of a field and when to stop.
#[derive(Clone, Copy)]
pub struct PaginationStrategy {
    pub name: &'static str,
    /// Does the strategy apply to a field taking these variables?
    pub test: fn(&IndexSet<Name>) -> bool,
    /// Initial state for the given page size, with `has_next_page` set.
    pub start: fn(u64) -> PaginationState,
    /// Folds one page into the state and computes the variables of the next one.
    pub add_page: fn(PaginationState, &Value) -> Result<PaginationState, PaginationError>,
    /// Flattens a page or an accumulated result into items.
    pub get_items: fn(&Value) -> Result<Vec<Value>, PaginationError>,
}

impl fmt::Debug for PaginationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PaginationStrategy").field(&self.name).finish()
    }
}

impl PartialEq for PaginationStrategy {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// The built-in strategies: limit/offset, then forward relay connections.
pub fn default_strategies() -> [PaginationStrategy; 2] {
    [LIMIT_OFFSET, RELAY_FORWARD]
}

/// Reads an unsigned integer variable, falling back to `default`.
fn u64_variable(variables: &Object, name: &str, default: u64) -> u64 {
    variables
        .get(name)
        .and_then(Value::as_u64)
        .unwrap_or(default)
}
