use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::Selection;

use crate::ast::is_fragment_selection;
use crate::ast::transform;
use crate::ast::transform::Transform;
use crate::error::CompileError;
use crate::schema::RemoteSchema;

/// Unwraps a lone inline fragment holding only fragments:
/// `{ ... on Iface { ... on A { a } ... on B { b } } }` becomes `{ ... on A { a } ... on B { b } }`.
pub(crate) struct StripWrappingFragments<'a> {
    schema: &'a RemoteSchema,
}

impl<'a> StripWrappingFragments<'a> {
    pub(crate) fn new(schema: &'a RemoteSchema) -> Self {
        Self { schema }
    }
}

impl Transform for StripWrappingFragments<'_> {
    fn schema(&self) -> &RemoteSchema {
        self.schema
    }

    fn selection_set(
        &mut self,
        parent_type: &NamedType,
        set: &[Selection],
    ) -> Result<Vec<Selection>, CompileError> {
        let mut selections = transform::selection_set(self, parent_type, set)?;
        if let [Selection::InlineFragment(wrapper)] = selections.as_slice() {
            if wrapper.selection_set.iter().all(is_fragment_selection) {
                selections = wrapper.selection_set.clone();
            }
        }
        Ok(selections)
    }
}
