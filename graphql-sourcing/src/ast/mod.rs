//! Builders and predicates for `apollo_compiler` AST nodes.
//!
//! Every builder returns fresh nodes: transforms never mutate nodes shared by several definitions.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::name;
use apollo_compiler::ast::DirectiveList;
use apollo_compiler::ast::Selection;

use crate::config::TYPENAME_FIELD;

pub mod compare;
pub(crate) mod transform;

pub fn document(definitions: impl IntoIterator<Item = ast::Definition>) -> ast::Document {
    let mut document = ast::Document::new();
    document.definitions = definitions.into_iter().collect();
    document
}

pub fn fragment_definition(
    name: Name,
    type_condition: Name,
    selection_set: Vec<Selection>,
) -> Node<ast::FragmentDefinition> {
    Node::new(ast::FragmentDefinition {
        name,
        type_condition,
        directives: DirectiveList::new(),
        selection_set,
    })
}

pub fn field(
    alias: Option<Name>,
    name: Name,
    arguments: Vec<Node<ast::Argument>>,
    selection_set: Vec<Selection>,
) -> Selection {
    Selection::Field(Node::new(ast::Field {
        alias,
        name,
        arguments,
        directives: DirectiveList::new(),
        selection_set,
    }))
}

/// A `__typename` selection, optionally aliased.
pub fn typename_field(alias: Option<Name>) -> Selection {
    field(alias, name!("__typename"), Vec::new(), Vec::new())
}

pub fn fragment_spread(fragment_name: Name) -> Selection {
    Selection::FragmentSpread(Node::new(ast::FragmentSpread {
        fragment_name,
        directives: DirectiveList::new(),
    }))
}

pub fn inline_fragment(type_condition: Option<Name>, selection_set: Vec<Selection>) -> Selection {
    Selection::InlineFragment(Node::new(ast::InlineFragment {
        type_condition,
        directives: DirectiveList::new(),
        selection_set,
    }))
}

pub fn argument(name: Name, value: ast::Value) -> Node<ast::Argument> {
    Node::new(ast::Argument {
        name,
        value: Node::new(value),
    })
}

pub fn variable_definition(name: Name, ty: ast::Type) -> Node<ast::VariableDefinition> {
    Node::new(ast::VariableDefinition {
        name,
        ty: Node::new(ty),
        default_value: None,
        directives: DirectiveList::new(),
    })
}

/// The key a field's value appears under in a response.
pub fn response_key(field: &ast::Field) -> &Name {
    field.alias.as_ref().unwrap_or(&field.name)
}

/// Any `__typename` selection, aliased or not.
pub fn is_typename_field(selection: &Selection) -> bool {
    matches!(selection, Selection::Field(field) if field.name.as_str() == TYPENAME_FIELD)
}

/// A `__typename` selection whose response key is either `__typename` or `discriminator_alias`.
pub fn is_discriminator_field(selection: &Selection, discriminator_alias: &str) -> bool {
    match selection {
        Selection::Field(field) if field.name.as_str() == TYPENAME_FIELD => field
            .alias
            .as_ref()
            .is_none_or(|alias| alias.as_str() == TYPENAME_FIELD || alias.as_str() == discriminator_alias),
        _ => false,
    }
}

pub fn is_fragment_selection(selection: &Selection) -> bool {
    matches!(
        selection,
        Selection::FragmentSpread(_) | Selection::InlineFragment(_)
    )
}

pub fn fragments(document: &ast::Document) -> impl Iterator<Item = &Node<ast::FragmentDefinition>> {
    document.definitions.iter().filter_map(|definition| match definition {
        ast::Definition::FragmentDefinition(fragment) => Some(fragment),
        _ => None,
    })
}

pub fn operations(
    document: &ast::Document,
) -> impl Iterator<Item = &Node<ast::OperationDefinition>> {
    document.definitions.iter().filter_map(|definition| match definition {
        ast::Definition::OperationDefinition(operation) => Some(operation),
        _ => None,
    })
}

pub fn find_operation<'doc>(
    document: &'doc ast::Document,
    name: &str,
) -> Option<&'doc Node<ast::OperationDefinition>> {
    operations(document).find(|operation| operation.name.as_ref().is_some_and(|n| n.as_str() == name))
}

pub fn find_fragment<'doc>(
    document: &'doc ast::Document,
    name: &str,
) -> Option<&'doc Node<ast::FragmentDefinition>> {
    fragments(document).find(|fragment| fragment.name.as_str() == name)
}
