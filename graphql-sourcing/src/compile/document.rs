use apollo_compiler::Node;
use apollo_compiler::ast;

use super::CompileContext;
use super::transforms::alias::AliasEntityFields;
use super::transforms::duplicates::remove_identity_duplicates;
use super::transforms::spreads::AddEntityFragmentSpreads;
use super::transforms::typename::AddTypenameField;
use super::transforms::unused::remove_unused_fragments;
use super::transforms::variables::add_variable_definitions;
use crate::ast::document;
use crate::ast::transform;
use crate::entity::EntityType;
use crate::error::CompileError;
use crate::utils::logging::snapshot;

/// Runs the compilation pipeline over the queries of one entity type.
///
/// Each stage relies on the output of the previous one: spreads of the entity fragments are
/// added before type discriminators, discriminators before aliasing, and fragments are pruned
/// last, once every spread is known.
pub(super) fn compile_document(
    context: &CompileContext<'_>,
    entity: &EntityType,
    entity_fragments: &[Node<ast::FragmentDefinition>],
    non_entity_fragments: &[Node<ast::FragmentDefinition>],
) -> Result<ast::Document, CompileError> {
    let schema = context.schema;
    let typename_alias = context.field_aliases.typename();
    let full_document = document(
        entity
            .queries
            .definitions
            .iter()
            .cloned()
            .chain(
                entity_fragments
                    .iter()
                    .chain(non_entity_fragments)
                    .cloned()
                    .map(ast::Definition::FragmentDefinition),
            ),
    );

    let mut spreads = AddEntityFragmentSpreads::new(
        schema,
        &entity.remote_type_name,
        entity_fragments,
        typename_alias,
    );
    let compiled = transform::document(&mut spreads, &full_document)?;
    let compiled = transform::document(
        &mut AddTypenameField::new(schema, typename_alias),
        &compiled,
    )?;
    let compiled = transform::document(
        &mut AliasEntityFields::new(schema, &context.entity_types, context.field_aliases),
        &compiled,
    )?;
    let compiled = add_variable_definitions(schema, &compiled)?;
    snapshot!("ExpandedDocument", compiled, "document before pruning");

    let compiled = remove_unused_fragments(&compiled)?;
    remove_identity_duplicates(
        schema,
        &compiled,
        &entity.identity_fragment.name,
        &entity.remote_type_name,
    )
}
