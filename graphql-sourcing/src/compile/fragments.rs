use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexSet;

use super::CompileContext;
use super::transforms::node_reference::ReplaceNodeSelections;
use crate::analyze::TypeUsagesMap;
use crate::ast::document;
use crate::ast::fragment_definition;
use crate::ast::fragments;
use crate::ast::transform;
use crate::entity::EntityType;
use crate::error::CompileError;
use crate::error::ConfigurationError;

/// Builds the entity fragments of one entity type.
///
/// Every usage of the type or of one of its interfaces becomes a fragment named after its usage
/// path, in which selections of other entity types are replaced by references:
///
/// ```graphql
/// fragment Post on Post { title author { firstName email } }
/// ```
///
/// contributes `fragment Post on Post { title author { __typename id } }` to `Post` and
/// `fragment Post__author on User { firstName email }` to `User`.
pub(super) fn compile_entity_fragments(
    context: &CompileContext<'_>,
    entity: &EntityType,
    usages: &TypeUsagesMap,
) -> Result<Vec<Node<ast::FragmentDefinition>>, CompileError> {
    let type_name = &entity.remote_type_name;
    let all_types =
        std::iter::once(type_name.clone()).chain(context.schema.interfaces(type_name));

    let mut normalized = Vec::new();
    let mut names = IndexSet::new();
    for usage_type in all_types {
        let Some(type_usages) = usages.get(&usage_type) else {
            continue;
        };
        for (usage_path, selections) in type_usages {
            // an interface and its implementor may be used at the same path
            let fragment_name = if names.contains(usage_path.as_str()) {
                format!("{usage_path}__{usage_type}")
            } else {
                usage_path.clone()
            };
            let name = Name::new(&fragment_name)
                .map_err(|_| ConfigurationError::InvalidName(fragment_name.clone()))?;
            names.insert(fragment_name);
            normalized.push(fragment_definition(
                name,
                usage_type.clone(),
                selections.clone(),
            ));
        }
    }
    replace_node_selections(context, normalized)
}

/// Custom fragments on types that are neither entity types nor their interfaces, with their
/// selections of entity types replaced by references.
pub(super) fn compile_non_entity_fragments(
    context: &CompileContext<'_>,
) -> Result<Vec<Node<ast::FragmentDefinition>>, CompileError> {
    let entity_like_types = context.entity_and_interface_types();
    let non_entity = context
        .custom_fragments
        .iter()
        .filter(|fragment| !entity_like_types.contains(&fragment.type_condition))
        .cloned()
        .collect();
    replace_node_selections(context, non_entity)
}

fn replace_node_selections(
    context: &CompileContext<'_>,
    fragment_definitions: Vec<Node<ast::FragmentDefinition>>,
) -> Result<Vec<Node<ast::FragmentDefinition>>, CompileError> {
    let input = document(
        fragment_definitions
            .into_iter()
            .map(ast::Definition::FragmentDefinition),
    );
    let mut replace = ReplaceNodeSelections::new(context);
    let output = transform::document(&mut replace, &input)?;
    Ok(fragments(&output).cloned().collect())
}
