//! Compilation of entity declarations and custom fragments into executable node documents.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::debug;
use tracing::instrument;

use crate::analyze::FragmentMap;
use crate::analyze::build_node_reference_fragment_map;
use crate::analyze::build_type_usages_map;
use crate::ast::fragments;
use crate::config::FieldAliases;
use crate::config::SourcingConfig;
use crate::entity::EntityType;
use crate::entity::EntityTypeDeclaration;
use crate::entity::parse_declarations;
use crate::error::CompileError;
use crate::schema::RemoteSchema;
use crate::utils::logging::snapshot;

pub mod default_fragments;
mod document;
mod fragments;
pub(crate) mod transforms;

/// Everything derived once per compilation and shared by every entity type.
pub(crate) struct CompileContext<'a> {
    pub(crate) schema: &'a RemoteSchema,
    pub(crate) entity_types: IndexSet<Name>,
    pub(crate) references: FragmentMap,
    pub(crate) custom_fragments: Vec<Node<ast::FragmentDefinition>>,
    pub(crate) field_aliases: &'a FieldAliases,
}

impl CompileContext<'_> {
    /// Entity types and every interface they implement.
    pub(crate) fn entity_and_interface_types(&self) -> IndexSet<Name> {
        self.entity_types
            .iter()
            .flat_map(|type_name| {
                std::iter::once(type_name.clone()).chain(self.schema.interfaces(type_name))
            })
            .collect()
    }
}

/// Compiles one executable document per declared entity type, keyed by remote type name.
///
/// Each document holds the operations of the declaration, its identity fragment, the custom
/// fragments selecting from the type (nested selections of other entity types replaced by
/// references) and the non-entity custom fragments those reach. Custom fragments are raw GraphQL
/// strings: each may hold several fragments, other definitions are ignored.
#[instrument(skip_all, fields(entity_types = declarations.len()))]
pub fn compile_node_queries(
    schema: &RemoteSchema,
    declarations: &[EntityTypeDeclaration],
    custom_fragments: &[impl AsRef<str>],
    config: &SourcingConfig,
) -> Result<IndexMap<String, ast::Document>, CompileError> {
    let entities = parse_declarations(schema, declarations)?;
    let custom_fragments = parse_custom_fragments(custom_fragments)?;
    let references = build_node_reference_fragment_map(schema, &entities);
    let usages = build_type_usages_map(schema, &custom_fragments, &references);

    let context = CompileContext {
        schema,
        entity_types: entity_names(&entities),
        references,
        custom_fragments,
        field_aliases: &config.field_aliases,
    };
    let non_entity_fragments = fragments::compile_non_entity_fragments(&context)?;

    let mut documents = IndexMap::with_capacity(entities.len());
    for entity in &entities {
        debug!(type_name = %entity.remote_type_name, "compiling node document");
        let entity_fragments = fragments::compile_entity_fragments(&context, entity, &usages)?;
        let document =
            document::compile_document(&context, entity, &entity_fragments, &non_entity_fragments)?;
        snapshot!("CompiledDocument", document, "compiled node document");
        documents.insert(entity.remote_type_name.to_string(), document);
    }
    Ok(documents)
}

fn parse_custom_fragments(
    sources: &[impl AsRef<str>],
) -> Result<Vec<Node<ast::FragmentDefinition>>, CompileError> {
    let mut custom_fragments = Vec::new();
    for (index, source) in sources.iter().enumerate() {
        let source_name = format!("custom_fragments_{index}.graphql");
        let document = ast::Document::parse(source.as_ref(), &source_name)
            .map_err(|errors| CompileError::syntax(source_name.as_str(), errors))?;
        custom_fragments.extend(fragments(&document).cloned());
    }
    Ok(custom_fragments)
}

pub(crate) fn entity_names(entities: &[EntityType]) -> IndexSet<Name> {
    entities
        .iter()
        .map(|entity| entity.remote_type_name.clone())
        .collect()
}
