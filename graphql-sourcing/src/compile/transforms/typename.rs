use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::Selection;

use crate::ast::is_discriminator_field;
use crate::ast::transform;
use crate::ast::transform::Transform;
use crate::ast::typename_field;
use crate::error::CompileError;
use crate::schema::RemoteSchema;

/// Adds `__typename` to the selections of every field of an object, interface or union type,
/// unless a type discriminator is already selected there.
///
/// Top-level selections of operations and fragments are not changed.
pub(crate) struct AddTypenameField<'a> {
    schema: &'a RemoteSchema,
    typename_alias: &'a str,
}

impl<'a> AddTypenameField<'a> {
    pub(crate) fn new(schema: &'a RemoteSchema, typename_alias: &'a str) -> Self {
        Self {
            schema,
            typename_alias,
        }
    }
}

impl Transform for AddTypenameField<'_> {
    fn schema(&self) -> &RemoteSchema {
        self.schema
    }

    fn field(
        &mut self,
        _parent_type: &NamedType,
        field_def: Option<&Node<ast::FieldDefinition>>,
        def: &Node<ast::Field>,
    ) -> Result<Option<Selection>, CompileError> {
        let transformed = transform::field(self, field_def, def)?;
        let (Some(Selection::Field(field)), Some(field_def)) = (&transformed, field_def) else {
            return Ok(transformed);
        };
        let composite = self.schema.is_composite(field_def.ty.inner_named_type());
        let has_discriminator = field
            .selection_set
            .iter()
            .any(|selection| is_discriminator_field(selection, self.typename_alias));
        if field.selection_set.is_empty() || !composite || has_discriminator {
            return Ok(transformed);
        }

        let mut field = field.as_ref().clone();
        field.selection_set.insert(0, typename_field(None));
        Ok(Some(Selection::Field(Node::new(field))))
    }
}
