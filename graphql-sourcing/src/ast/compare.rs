//! Structural comparison of selection sets.
//!
//! Containment is order-insensitive: `{ a b }` includes `{ b }` and `{ b a }` equals `{ a b }`.
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use itertools::Itertools;

/// Prints `value` with object fields sorted by name, so that equivalent values print the same.
fn canonical_value(value: &ast::Value) -> String {
    match value {
        ast::Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(name, value)| format!("{name}: {}", canonical_value(value)))
                .sorted()
                .join(", ")
        ),
        ast::Value::List(items) => format!(
            "[{}]",
            items.iter().map(|item| canonical_value(item)).join(", ")
        ),
        _ => value.to_string(),
    }
}

fn canonical_arguments(arguments: &[Node<ast::Argument>]) -> Vec<String> {
    arguments
        .iter()
        .map(|argument| format!("{}: {}", argument.name, canonical_value(&argument.value)))
        .sorted()
        .collect()
}

fn canonical_directives(directives: &ast::DirectiveList) -> Vec<String> {
    directives
        .iter()
        .map(|directive| {
            format!(
                "@{}({})",
                directive.name,
                canonical_arguments(&directive.arguments).join(", ")
            )
        })
        .sorted()
        .collect()
}

fn same_directives(left: &ast::DirectiveList, right: &ast::DirectiveList) -> bool {
    left.len() == right.len() && canonical_directives(left) == canonical_directives(right)
}

/// Returns true if every selection of `possible_subset` is included in some selection of
/// `selection_set`.
pub fn selection_set_includes(selection_set: &[Selection], possible_subset: &[Selection]) -> bool {
    possible_subset.iter().all(|candidate| {
        selection_set
            .iter()
            .any(|selection| selection_includes(selection, candidate))
    })
}

/// Returns true if `selection` fetches at least everything `possible_subset` fetches.
///
/// Fields must agree on response key, name, arguments and directives; fragment spreads on the
/// fragment name; inline fragments on the type condition.
pub fn selection_includes(selection: &Selection, possible_subset: &Selection) -> bool {
    match (selection, possible_subset) {
        (Selection::Field(this), Selection::Field(other)) => {
            this.alias == other.alias
                && this.name == other.name
                && canonical_arguments(&this.arguments) == canonical_arguments(&other.arguments)
                && same_directives(&this.directives, &other.directives)
                && selection_set_includes(&this.selection_set, &other.selection_set)
        }
        (Selection::FragmentSpread(this), Selection::FragmentSpread(other)) => {
            this.fragment_name == other.fragment_name
                && same_directives(&this.directives, &other.directives)
        }
        (Selection::InlineFragment(this), Selection::InlineFragment(other)) => {
            this.type_condition == other.type_condition
                && same_directives(&this.directives, &other.directives)
                && selection_set_includes(&this.selection_set, &other.selection_set)
        }
        _ => false,
    }
}

/// Returns true if both selection sets include each other.
pub fn same_selection_set(left: &[Selection], right: &[Selection]) -> bool {
    selection_set_includes(left, right) && selection_set_includes(right, left)
}
