//! Locating fields in operations and their values in responses.
//!
//! Paths are sequences of response keys: the alias of a field when it has one, its name
//! otherwise.
use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use indexmap::IndexSet;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;

use crate::ast::find_fragment;
use crate::ast::find_operation;
use crate::ast::response_key;
use crate::error::ConfigurationError;
use crate::error::PaginationError;
use crate::pagination::PaginationStrategy;

/// Path to the first field of `operation_name` whose variable arguments satisfy the strategy.
///
/// `{ field { paginated(limit: $limit, offset: $offset) { id } } }` and
/// `{ field { ...Page } } fragment Page on T { paginated(limit: $limit, offset: $offset) { id } }`
/// both give `["field", "paginated"]` with the limit/offset strategy.
pub fn find_paginated_field_path(
    document: &ast::Document,
    operation_name: &str,
    strategy: &PaginationStrategy,
    max_depth: usize,
) -> Result<Vec<String>, PaginationError> {
    find_field_path(document, operation_name, max_depth, |field| {
        (strategy.test)(&variable_arguments(field))
    })
}

/// Path to the first field of `operation_name` taking a variable argument, the field
/// returning the node in `NODE_` and `PAGINATE_` operations.
pub fn find_node_field_path(
    document: &ast::Document,
    operation_name: &str,
    max_depth: usize,
) -> Result<Vec<String>, PaginationError> {
    find_field_path(document, operation_name, max_depth, |field| {
        !variable_arguments(field).is_empty()
    })
}

/// Names of the variables passed directly as arguments of `field`.
pub(crate) fn variable_arguments(field: &ast::Field) -> IndexSet<Name> {
    field
        .arguments
        .iter()
        .filter_map(|argument| match argument.value.as_ref() {
            ast::Value::Variable(variable) => Some(variable.clone()),
            _ => None,
        })
        .collect()
}

fn find_field_path(
    document: &ast::Document,
    operation_name: &str,
    max_depth: usize,
    predicate: impl Fn(&ast::Field) -> bool,
) -> Result<Vec<String>, PaginationError> {
    let operation = find_operation(document, operation_name)
        .ok_or_else(|| PaginationError::UnknownOperation(operation_name.to_string()))?;
    let mut finder = FieldPathFinder {
        document,
        operation_name,
        max_depth,
        predicate,
        path: Vec::new(),
        fragments: Vec::new(),
    };
    if finder.search(&operation.selection_set)? {
        Ok(finder.path)
    } else {
        Err(PaginationError::FieldNotFound(operation_name.to_string()))
    }
}

/// Depth-first search for the first field matching `predicate`, following fragment spreads into
/// their definitions.
struct FieldPathFinder<'a, P> {
    document: &'a ast::Document,
    operation_name: &'a str,
    max_depth: usize,
    predicate: P,
    path: Vec<String>,
    fragments: Vec<Name>,
}

impl<P> FieldPathFinder<'_, P>
where
    P: Fn(&ast::Field) -> bool,
{
    fn search(&mut self, selections: &[Selection]) -> Result<bool, PaginationError> {
        for selection in selections {
            let found = match selection {
                Selection::Field(field) => {
                    if self.path.len() >= self.max_depth {
                        return Err(PaginationError::MaxNestingReached(
                            self.operation_name.to_string(),
                        ));
                    }
                    self.path.push(response_key(field).to_string());
                    let found = (self.predicate)(field) || self.search(&field.selection_set)?;
                    if !found {
                        self.path.pop();
                    }
                    found
                }
                Selection::InlineFragment(inline) => self.search(&inline.selection_set)?,
                Selection::FragmentSpread(spread) => {
                    let name = &spread.fragment_name;
                    if self.fragments.contains(name) {
                        continue;
                    }
                    let document = self.document;
                    let fragment = find_fragment(document, name)
                        .ok_or_else(|| ConfigurationError::MissingFragment(name.to_string()))?;
                    self.fragments.push(name.clone());
                    let found = self.search(&fragment.selection_set);
                    self.fragments.pop();
                    found?
                }
            };
            if found {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The value at `path`, descending into the first element of every list on the way.
pub fn get_first_value_by_path<'a, S: AsRef<str>>(value: &'a Value, path: &[S]) -> Option<&'a Value> {
    match (value, path.split_first()) {
        (_, None) => Some(value),
        (Value::Array(items), Some(_)) => get_first_value_by_path(items.first()?, path),
        (Value::Object(object), Some((key, rest))) => {
            get_first_value_by_path(object.get(key.as_ref())?, rest)
        }
        _ => None,
    }
}

/// Replaces the value at `path`, following the same walk as [`get_first_value_by_path`].
///
/// Returns false when the path does not lead to an object holding the last key. An empty path
/// replaces `value` itself.
pub fn update_first_value_by_path<S: AsRef<str>>(
    value: &mut Value,
    path: &[S],
    new_value: Value,
) -> bool {
    match (value, path) {
        (value, []) => {
            *value = new_value;
            true
        }
        (Value::Array(items), _) => items
            .first_mut()
            .is_some_and(|first| update_first_value_by_path(first, path, new_value)),
        (Value::Object(object), [key]) => {
            object.insert(ByteString::from(key.as_ref()), new_value);
            true
        }
        (Value::Object(object), [key, rest @ ..]) => object
            .get_mut(key.as_ref())
            .is_some_and(|nested| update_first_value_by_path(nested, rest, new_value)),
        _ => false,
    }
}
