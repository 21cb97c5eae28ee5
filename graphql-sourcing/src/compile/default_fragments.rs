//! Generation of "select everything" fragments for entity types.
//!
//! Generated fragments are a starting point for custom fragments: they select every field that
//! can be queried without caller input, inline nested objects, and stop at references to other
//! entity types and at cycles in the type graph.
use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use apollo_compiler::schema::ExtendedType;
use indexmap::IndexMap;
use tracing::instrument;

use super::entity_names;
use super::transforms::alias::AliasEntityFields;
use super::transforms::strip_wrapping::StripWrappingFragments;
use crate::analyze::FragmentMap;
use crate::analyze::build_node_reference_fragment_map;
use crate::ast::argument;
use crate::ast::document;
use crate::ast::field;
use crate::ast::fragment_definition;
use crate::ast::fragment_spread;
use crate::ast::fragments;
use crate::ast::inline_fragment;
use crate::ast::transform;
use crate::ast::transform::with_field_selections;
use crate::ast::typename_field;
use crate::config::FieldAliases;
use crate::config::TYPENAME_FIELD;
use crate::entity::EntityTypeDeclaration;
use crate::entity::parse_declarations;
use crate::error::CompileError;
use crate::error::ConfigurationError;
use crate::schema::RemoteSchema;

/// Supplies argument values for a field, given its definition and the name of its parent type.
///
/// Returns `None` when the resolver has nothing to say about the field.
pub type ArgumentValueResolver = Box<
    dyn Fn(&ast::FieldDefinition, &Name) -> Option<IndexMap<Name, ast::Value>> + Send + Sync,
>;

/// Options of default fragment generation.
#[derive(Default)]
pub struct DefaultFragmentsConfig {
    /// Reserved aliases applied to the generated fragments.
    pub field_aliases: FieldAliases,

    /// Resolvers of argument values, asked in order. The first one returning values for a field
    /// provides all of its arguments.
    ///
    /// Fields with a required argument left unresolved are not selected.
    pub default_argument_values: Vec<ArgumentValueResolver>,
}

impl DefaultFragmentsConfig {
    pub fn with_field_aliases(mut self, field_aliases: FieldAliases) -> Self {
        self.field_aliases = field_aliases;
        self
    }

    pub fn with_argument_values<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&ast::FieldDefinition, &Name) -> Option<IndexMap<Name, ast::Value>>
            + Send
            + Sync
            + 'static,
    {
        self.default_argument_values.push(Box::new(resolver));
        self
    }

    fn resolve_arguments(
        &self,
        field_def: &ast::FieldDefinition,
        parent_type: &Name,
    ) -> Vec<Node<ast::Argument>> {
        if field_def.arguments.is_empty() {
            return Vec::new();
        }
        let values = self
            .default_argument_values
            .iter()
            .find_map(|resolver| resolver(field_def, parent_type))
            .unwrap_or_default();
        field_def
            .arguments
            .iter()
            .filter_map(|argument_def| {
                values
                    .get(&argument_def.name)
                    .map(|value| argument(argument_def.name.clone(), value.clone()))
            })
            .collect()
    }
}

impl fmt::Debug for DefaultFragmentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultFragmentsConfig")
            .field("field_aliases", &self.field_aliases)
            .field(
                "default_argument_values",
                &self.default_argument_values.len(),
            )
            .finish()
    }
}

/// Generates the printed default fragment of every declared entity type.
pub fn generate_default_fragments(
    schema: &RemoteSchema,
    declarations: &[EntityTypeDeclaration],
    config: &DefaultFragmentsConfig,
) -> Result<IndexMap<String, String>, CompileError> {
    Ok(
        generate_default_fragment_nodes(schema, declarations, config)?
            .into_iter()
            .map(|(type_name, fragment)| (type_name, fragment.to_string()))
            .collect(),
    )
}

/// Generates the default fragment of every declared entity type, named after the type.
#[instrument(skip_all, fields(entity_types = declarations.len()))]
pub fn generate_default_fragment_nodes(
    schema: &RemoteSchema,
    declarations: &[EntityTypeDeclaration],
    config: &DefaultFragmentsConfig,
) -> Result<IndexMap<String, Node<ast::FragmentDefinition>>, CompileError> {
    let entities = parse_declarations(schema, declarations)?;
    let entity_types = entity_names(&entities);
    let references = build_node_reference_fragment_map(schema, &entities);
    let type_fragments = build_type_fragment_map(schema, config);
    let typename_alias = config.field_aliases.alias_name(TYPENAME_FIELD)?;

    let mut generated = IndexMap::with_capacity(entities.len());
    for type_name in &entity_types {
        let fragment = type_fragments
            .get(type_name)
            .ok_or_else(|| ConfigurationError::UnknownType(type_name.to_string()))?;
        let mut inliner = FragmentInliner {
            references: &references,
            type_fragments: &type_fragments,
            typename_alias: typename_alias.clone(),
            stack: Vec::new(),
        };
        let selections = inliner.inline_selections(&fragment.selection_set)?;
        let inlined = document([ast::Definition::FragmentDefinition(
            fragment_definition(type_name.clone(), type_name.clone(), selections),
        )]);

        let aliased = transform::document(
            &mut AliasEntityFields::new(schema, &entity_types, &config.field_aliases),
            &inlined,
        )?;
        let stripped = transform::document(&mut StripWrappingFragments::new(schema), &aliased)?;
        if let Some(fragment) = fragments(&stripped).next() {
            generated.insert(type_name.to_string(), fragment.clone());
        }
    }
    Ok(generated)
}

/// Builds one fragment per object, interface and union type, named after the type.
///
/// Object fragments select every field whose required arguments can be resolved, composite
/// fields selecting the fragment of their type. Fragments of abstract types spread the fragments
/// of their possible types. The fragments may reference each other in cycles.
fn build_type_fragment_map(schema: &RemoteSchema, config: &DefaultFragmentsConfig) -> FragmentMap {
    let mut type_fragments = FragmentMap::new();
    for (type_name, ty) in &schema.schema().types {
        let selections = match ty {
            ExtendedType::Object(object) => object
                .fields
                .values()
                .filter_map(|field_def| build_field(schema, config, type_name, field_def))
                .collect(),
            ExtendedType::Interface(_) | ExtendedType::Union(_) => schema
                .possible_types(type_name)
                .into_iter()
                .map(fragment_spread)
                .collect(),
            _ => continue,
        };
        type_fragments.insert(
            type_name.clone(),
            fragment_definition(type_name.clone(), type_name.clone(), selections),
        );
    }
    type_fragments
}

fn build_field(
    schema: &RemoteSchema,
    config: &DefaultFragmentsConfig,
    parent_type: &Name,
    field_def: &ast::FieldDefinition,
) -> Option<Selection> {
    let arguments = config.resolve_arguments(field_def, parent_type);
    let required_argument_missing = field_def.arguments.iter().any(|argument_def| {
        argument_def.ty.is_non_null()
            && argument_def.default_value.is_none()
            && !arguments
                .iter()
                .any(|resolved| resolved.name == argument_def.name)
    });
    if required_argument_missing {
        return None;
    }
    let field_type = field_def.ty.inner_named_type();
    let selections = if schema.is_composite(field_type) {
        vec![fragment_spread(field_type.clone())]
    } else {
        Vec::new()
    };
    Some(field(None, field_def.name.clone(), arguments, selections))
}

/// Replaces spreads of type fragments with inline fragments, tracking the types being inlined
/// on an explicit stack.
///
/// The fragment of an entity type or node interface is replaced by its reference. A spread of a
/// type already on the stack is replaced by a type discriminator, which stops cycles at the
/// point of re-entry.
struct FragmentInliner<'a> {
    references: &'a FragmentMap,
    type_fragments: &'a FragmentMap,
    typename_alias: Option<Name>,
    stack: Vec<Name>,
}

impl FragmentInliner<'_> {
    fn inline_selections(
        &mut self,
        selections: &[Selection],
    ) -> Result<Vec<Selection>, CompileError> {
        selections
            .iter()
            .map(|selection| self.inline_selection(selection))
            .collect()
    }

    fn inline_selection(&mut self, selection: &Selection) -> Result<Selection, CompileError> {
        match selection {
            Selection::Field(def) if def.selection_set.is_empty() => Ok(selection.clone()),
            Selection::Field(def) => {
                let selections = self.inline_selections(&def.selection_set)?;
                Ok(with_field_selections(def, selections))
            }
            Selection::InlineFragment(def) => {
                let selections = self.inline_selections(&def.selection_set)?;
                Ok(inline_fragment(def.type_condition.clone(), selections))
            }
            Selection::FragmentSpread(spread) => {
                let type_name = &spread.fragment_name;
                if self.stack.contains(type_name) {
                    return Ok(typename_field(self.typename_alias.clone()));
                }
                let references = self.references;
                let type_fragments = self.type_fragments;
                let fragment = references
                    .get(type_name)
                    .or_else(|| type_fragments.get(type_name))
                    .ok_or_else(|| ConfigurationError::MissingFragment(type_name.to_string()))?;

                self.stack.push(type_name.clone());
                let selections = self.inline_selections(&fragment.selection_set);
                self.stack.pop();
                Ok(inline_fragment(Some(type_name.clone()), selections?))
            }
        }
    }
}
