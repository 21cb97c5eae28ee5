use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::Selection;
use indexmap::IndexSet;

use super::is_entity_like;
use crate::ast::transform;
use crate::ast::transform::Transform;
use crate::config::FieldAliases;
use crate::config::TYPENAME_FIELD;
use crate::error::CompileError;
use crate::schema::RemoteSchema;

/// Gives reserved aliases to identity-infrastructure fields, so that they never collide with the
/// fields a record sink reserves for itself.
///
/// A field is aliased when the alias map knows its name, it has no explicit alias, and either it
/// is `__typename` or it is selected on a type that may hold entity records.
pub(crate) struct AliasEntityFields<'a> {
    schema: &'a RemoteSchema,
    entity_types: &'a IndexSet<Name>,
    field_aliases: &'a FieldAliases,
}

impl<'a> AliasEntityFields<'a> {
    pub(crate) fn new(
        schema: &'a RemoteSchema,
        entity_types: &'a IndexSet<Name>,
        field_aliases: &'a FieldAliases,
    ) -> Self {
        Self {
            schema,
            entity_types,
            field_aliases,
        }
    }

    fn should_alias(&self, parent_type: &NamedType, field: &ast::Field) -> bool {
        let unaliased = field.alias.as_ref().is_none_or(|alias| alias == &field.name);
        unaliased
            && (field.name.as_str() == TYPENAME_FIELD
                || is_entity_like(self.schema, self.entity_types, parent_type))
    }
}

impl Transform for AliasEntityFields<'_> {
    fn schema(&self) -> &RemoteSchema {
        self.schema
    }

    fn field(
        &mut self,
        parent_type: &NamedType,
        field_def: Option<&Node<ast::FieldDefinition>>,
        def: &Node<ast::Field>,
    ) -> Result<Option<Selection>, CompileError> {
        let transformed = transform::field(self, field_def, def)?;
        let Some(Selection::Field(field)) = &transformed else {
            return Ok(transformed);
        };
        if !self.should_alias(parent_type, field) {
            return Ok(transformed);
        }
        let Some(alias) = self.field_aliases.alias_name(&field.name)? else {
            return Ok(transformed);
        };

        let mut field = field.as_ref().clone();
        field.alias = Some(alias);
        Ok(Some(Selection::Field(Node::new(field))))
    }
}
