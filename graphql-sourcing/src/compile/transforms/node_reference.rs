use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::Selection;

use crate::analyze::FragmentMap;
use crate::ast::inline_fragment;
use crate::ast::is_typename_field;
use crate::ast::transform;
use crate::ast::transform::Transform;
use crate::ast::transform::with_field_selections;
use crate::ast::typename_field;
use crate::compile::CompileContext;
use crate::error::CompileError;
use crate::schema::RemoteSchema;

/// Replaces selections of entity types with references to those records.
///
/// ```graphql
/// { author { firstName email } }
/// ```
/// becomes `{ author { __typename id } }` when `author` is of the entity type `User`.
///
/// Fields of an interface type that is not itself referenceable, but has entity implementors,
/// are split into one inline fragment per possible type: entity types get their reference,
/// other types keep the selections applying to them.
pub(crate) struct ReplaceNodeSelections<'a> {
    schema: &'a RemoteSchema,
    references: &'a FragmentMap,
    custom_fragments: &'a [Node<ast::FragmentDefinition>],
}

impl<'a> ReplaceNodeSelections<'a> {
    pub(crate) fn new(context: &'a CompileContext<'_>) -> Self {
        Self {
            schema: context.schema,
            references: &context.references,
            custom_fragments: &context.custom_fragments,
        }
    }

    fn interface_selections(
        &self,
        interface: &NamedType,
        selections: &[Selection],
    ) -> Option<Vec<Selection>> {
        let possible_types = self.schema.possible_types(interface);
        if !possible_types
            .iter()
            .any(|possible_type| self.references.contains_key(possible_type))
        {
            return None;
        }

        let per_type = possible_types.into_iter().filter_map(|possible_type| {
            let type_selections = match self.references.get(&possible_type) {
                Some(reference) => reference.selection_set.clone(),
                None => self.applying_to(&possible_type, selections),
            };
            let type_selections = type_selections
                .into_iter()
                .filter(|selection| !is_typename_field(selection))
                .collect::<Vec<_>>();
            (!type_selections.is_empty())
                .then(|| inline_fragment(Some(possible_type), type_selections))
        });
        Some(std::iter::once(typename_field(None)).chain(per_type).collect())
    }

    /// Selections made on an interface that apply to one of its object types.
    fn applying_to(&self, object_type: &Name, selections: &[Selection]) -> Vec<Selection> {
        selections
            .iter()
            .filter(|selection| match selection {
                // implementors have every field of the interface
                Selection::Field(_) => true,
                Selection::InlineFragment(inline) => inline
                    .type_condition
                    .as_ref()
                    .is_none_or(|type_condition| type_condition == object_type),
                Selection::FragmentSpread(spread) => self
                    .custom_fragments
                    .iter()
                    .find(|fragment| fragment.name == spread.fragment_name)
                    .is_some_and(|fragment| &fragment.type_condition == object_type),
            })
            .cloned()
            .collect()
    }
}

impl Transform for ReplaceNodeSelections<'_> {
    fn schema(&self) -> &RemoteSchema {
        self.schema
    }

    fn field(
        &mut self,
        _parent_type: &NamedType,
        field_def: Option<&Node<ast::FieldDefinition>>,
        def: &Node<ast::Field>,
    ) -> Result<Option<Selection>, CompileError> {
        let Some(definition) = field_def else {
            return transform::field(self, field_def, def);
        };
        if def.selection_set.is_empty() {
            return Ok(Some(Selection::Field(def.clone())));
        }
        let field_type = definition.ty.inner_named_type();
        if let Some(reference) = self.references.get(field_type) {
            return Ok(Some(with_field_selections(
                def,
                reference.selection_set.clone(),
            )));
        }
        if self.schema.is_interface(field_type) {
            if let Some(selections) = self.interface_selections(field_type, &def.selection_set) {
                let mut split = def.as_ref().clone();
                split.selection_set = selections;
                return transform::field(self, field_def, &Node::new(split));
            }
        }
        transform::field(self, field_def, def)
    }
}
