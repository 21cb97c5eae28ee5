//! Typed tree-to-tree rewriting of GraphQL documents.
//!
//! A [`Transform`] is called for every definition and selection of a document, together with the
//! schema type the selection applies to. Each hook returns a fresh node (or `None` to drop it):
//! the input document is never modified.
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::Selection;

use crate::error::CompileError;
use crate::error::ConfigurationError;
use crate::schema::RemoteSchema;

/// Transform a document with the given transform.
pub(crate) fn document(
    transform: &mut impl Transform,
    document: &ast::Document,
) -> Result<ast::Document, CompileError> {
    let mut definitions = Vec::with_capacity(document.definitions.len());
    for definition in &document.definitions {
        match definition {
            ast::Definition::OperationDefinition(def) => {
                let root_type = transform
                    .schema()
                    .root_type(def.operation_type)
                    .ok_or_else(|| {
                        ConfigurationError::UnknownType(format!("{:?} root", def.operation_type))
                    })?
                    .clone();
                if let Some(def) = transform.operation(&root_type, def)? {
                    definitions.push(ast::Definition::OperationDefinition(def));
                }
            }
            ast::Definition::FragmentDefinition(def) => {
                if let Some(def) = transform.fragment_definition(def)? {
                    definitions.push(ast::Definition::FragmentDefinition(def));
                }
            }
            other => definitions.push(other.clone()),
        }
    }
    let mut transformed = document.clone();
    transformed.definitions = definitions;
    Ok(transformed)
}

pub(crate) trait Transform: Sized {
    fn schema(&self) -> &RemoteSchema;

    /// Transform an operation definition.
    ///
    /// Call the [`operation`] free function for the default behavior.
    /// Return `Ok(None)` to remove this operation.
    fn operation(
        &mut self,
        root_type: &NamedType,
        def: &Node<ast::OperationDefinition>,
    ) -> Result<Option<Node<ast::OperationDefinition>>, CompileError> {
        operation(self, root_type, def)
    }

    /// Transform a fragment definition.
    ///
    /// Call the [`fragment_definition`] free function for the default behavior.
    /// Return `Ok(None)` to remove this fragment.
    fn fragment_definition(
        &mut self,
        def: &Node<ast::FragmentDefinition>,
    ) -> Result<Option<Node<ast::FragmentDefinition>>, CompileError> {
        fragment_definition(self, def)
    }

    /// Transform the selections applying to `parent_type`.
    ///
    /// Call the [`selection_set`] free function for the default behavior.
    fn selection_set(
        &mut self,
        parent_type: &NamedType,
        set: &[Selection],
    ) -> Result<Vec<Selection>, CompileError> {
        selection_set(self, parent_type, set)
    }

    /// Transform a field within a selection set.
    ///
    /// `field_def` is `None` when the schema does not know the field.
    /// Call the [`field`] free function for the default behavior.
    /// Return `Ok(None)` to remove this field.
    fn field(
        &mut self,
        _parent_type: &NamedType,
        field_def: Option<&Node<ast::FieldDefinition>>,
        def: &Node<ast::Field>,
    ) -> Result<Option<Selection>, CompileError> {
        field(self, field_def, def)
    }

    /// Transform a fragment spread within a selection set.
    ///
    /// Return `Ok(None)` to remove this fragment spread.
    fn fragment_spread(
        &mut self,
        _parent_type: &NamedType,
        def: &Node<ast::FragmentSpread>,
    ) -> Result<Option<Selection>, CompileError> {
        Ok(Some(Selection::FragmentSpread(def.clone())))
    }

    /// Transform an inline fragment within a selection set.
    ///
    /// `fragment_type` is the type condition, or the enclosing type when there is none.
    /// Call the [`inline_fragment`] free function for the default behavior.
    /// Return `Ok(None)` to remove this inline fragment.
    fn inline_fragment(
        &mut self,
        fragment_type: &NamedType,
        def: &Node<ast::InlineFragment>,
    ) -> Result<Option<Selection>, CompileError> {
        inline_fragment(self, fragment_type, def)
    }
}

/// The default behavior for transforming an operation.
pub(crate) fn operation(
    transform: &mut impl Transform,
    root_type: &NamedType,
    def: &Node<ast::OperationDefinition>,
) -> Result<Option<Node<ast::OperationDefinition>>, CompileError> {
    let selection_set = transform.selection_set(root_type, &def.selection_set)?;
    let mut def = def.as_ref().clone();
    def.selection_set = selection_set;
    Ok(Some(Node::new(def)))
}

/// The default behavior for transforming a fragment definition.
pub(crate) fn fragment_definition(
    transform: &mut impl Transform,
    def: &Node<ast::FragmentDefinition>,
) -> Result<Option<Node<ast::FragmentDefinition>>, CompileError> {
    let selection_set = transform.selection_set(&def.type_condition, &def.selection_set)?;
    let mut def = def.as_ref().clone();
    def.selection_set = selection_set;
    Ok(Some(Node::new(def)))
}

/// The default behavior for transforming a field: nested selections are transformed against the
/// field's named type, unknown fields are kept as they are.
pub(crate) fn field(
    transform: &mut impl Transform,
    field_def: Option<&Node<ast::FieldDefinition>>,
    def: &Node<ast::Field>,
) -> Result<Option<Selection>, CompileError> {
    let Some(field_def) = field_def else {
        return Ok(Some(Selection::Field(def.clone())));
    };
    if def.selection_set.is_empty() {
        return Ok(Some(Selection::Field(def.clone())));
    }
    let selection_set =
        transform.selection_set(field_def.ty.inner_named_type(), &def.selection_set)?;
    Ok(Some(with_field_selections(def, selection_set)))
}

/// The default behavior for transforming an inline fragment.
pub(crate) fn inline_fragment(
    transform: &mut impl Transform,
    fragment_type: &NamedType,
    def: &Node<ast::InlineFragment>,
) -> Result<Option<Selection>, CompileError> {
    let selection_set = transform.selection_set(fragment_type, &def.selection_set)?;
    let mut def = def.as_ref().clone();
    def.selection_set = selection_set;
    Ok(Some(Selection::InlineFragment(Node::new(def))))
}

/// The default behavior for transforming a selection set.
pub(crate) fn selection_set(
    transform: &mut impl Transform,
    parent_type: &NamedType,
    set: &[Selection],
) -> Result<Vec<Selection>, CompileError> {
    let mut selections = Vec::with_capacity(set.len());
    for selection in set {
        let transformed = match selection {
            Selection::Field(def) => {
                let field_def = transform
                    .schema()
                    .field_definition(parent_type, &def.name)
                    .cloned();
                transform.field(parent_type, field_def.as_ref(), def)?
            }
            Selection::FragmentSpread(def) => transform.fragment_spread(parent_type, def)?,
            Selection::InlineFragment(def) => {
                let fragment_type = def.type_condition.as_ref().unwrap_or(parent_type).clone();
                transform.inline_fragment(&fragment_type, def)?
            }
        };
        selections.extend(transformed);
    }
    Ok(selections)
}

/// A copy of `def` selecting `selection_set` instead.
pub(crate) fn with_field_selections(def: &ast::Field, selection_set: Vec<Selection>) -> Selection {
    let mut def = def.clone();
    def.selection_set = selection_set;
    Selection::Field(Node::new(def))
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::typename_field;

    struct CountAndTag {
        schema: RemoteSchema,
        fields: u32,
    }

    impl Transform for CountAndTag {
        fn schema(&self) -> &RemoteSchema {
            &self.schema
        }

        fn field(
            &mut self,
            parent_type: &NamedType,
            field_def: Option<&Node<ast::FieldDefinition>>,
            def: &Node<ast::Field>,
        ) -> Result<Option<Selection>, CompileError> {
            self.fields += 1;
            if parent_type.as_str() == "Query" && def.name.as_str() == "b" {
                return Ok(None);
            }
            field(self, field_def, def)
        }

        fn inline_fragment(
            &mut self,
            fragment_type: &NamedType,
            def: &Node<ast::InlineFragment>,
        ) -> Result<Option<Selection>, CompileError> {
            let Some(Selection::InlineFragment(fragment)) =
                inline_fragment(self, fragment_type, def)?
            else {
                return Ok(None);
            };
            let mut fragment = fragment.as_ref().clone();
            fragment.selection_set.insert(0, typename_field(Some(name!("kind"))));
            Ok(Some(Selection::InlineFragment(Node::new(fragment))))
        }
    }

    #[test]
    fn transforms_into_a_new_document() {
        let schema = RemoteSchema::parse(
            "type Query { a: String b: Int next: Next } type Next { a: String b: Int }",
            "schema.graphql",
        )
        .unwrap();
        let source = "
            query Q { a b ... on Query { next { a } } ...F }
            fragment F on Query { next { b } }
        ";
        let input = ast::Document::parse(source, "query.graphql").unwrap();
        let mut transform = CountAndTag { schema, fields: 0 };
        let output = document(&mut transform, &input).unwrap();

        assert_eq!(transform.fields, 6);
        let expected = ast::Document::parse(
            "
            query Q { a ... on Query { kind: __typename next { a } } ...F }
            fragment F on Query { next { b } }
            ",
            "expected.graphql",
        )
        .unwrap();
        assert_eq!(output.to_string(), expected.to_string());
        assert_eq!(
            input.to_string(),
            ast::Document::parse(source, "query.graphql")
                .unwrap()
                .to_string()
        );
    }
}
