use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::Selection;
use indexmap::IndexSet;
use tracing::debug;

use super::unused::remove_unused_fragments;
use crate::ast::compare::selection_set_includes;
use crate::ast::find_fragment;
use crate::ast::fragments;
use crate::ast::transform;
use crate::ast::transform::Transform;
use crate::error::CompileError;
use crate::error::ConfigurationError;
use crate::schema::RemoteSchema;

/// Removes the fragments selecting nothing more than the identity fragment, with their spreads.
///
/// Only fragments sharing the identity fragment's type condition qualify. Containment ignores
/// selection order but compares aliases, arguments and directives.
pub(crate) fn remove_identity_duplicates(
    schema: &RemoteSchema,
    input: &ast::Document,
    identity_fragment: &Name,
    type_name: &Name,
) -> Result<ast::Document, CompileError> {
    let identity = find_fragment(input, identity_fragment)
        .ok_or_else(|| ConfigurationError::MissingIdentityFragment(type_name.to_string()))?;
    let duplicates = fragments(input)
        .filter(|fragment| {
            fragment.name != identity.name
                && fragment.type_condition == identity.type_condition
                && selection_set_includes(&identity.selection_set, &fragment.selection_set)
        })
        .map(|fragment| fragment.name.clone())
        .collect::<IndexSet<_>>();
    if duplicates.is_empty() {
        return Ok(input.clone());
    }

    debug!(
        type_name = %type_name,
        fragments = ?duplicates.iter().map(Name::as_str).collect::<Vec<_>>(),
        "removing fragments already selected by the identity fragment"
    );
    let mut remove = RemoveFragments { schema, duplicates };
    let output = transform::document(&mut remove, input)?;
    remove_unused_fragments(&output)
}

struct RemoveFragments<'a> {
    schema: &'a RemoteSchema,
    duplicates: IndexSet<Name>,
}

impl Transform for RemoveFragments<'_> {
    fn schema(&self) -> &RemoteSchema {
        self.schema
    }

    fn fragment_definition(
        &mut self,
        def: &Node<ast::FragmentDefinition>,
    ) -> Result<Option<Node<ast::FragmentDefinition>>, CompileError> {
        if self.duplicates.contains(&def.name) {
            return Ok(None);
        }
        transform::fragment_definition(self, def)
    }

    fn fragment_spread(
        &mut self,
        _parent_type: &NamedType,
        def: &Node<ast::FragmentSpread>,
    ) -> Result<Option<Selection>, CompileError> {
        if self.duplicates.contains(&def.fragment_name) {
            return Ok(None);
        }
        Ok(Some(Selection::FragmentSpread(def.clone())))
    }
}
