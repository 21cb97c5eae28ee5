use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::Selection;

use crate::ast::fragment_spread;
use crate::ast::is_discriminator_field;
use crate::ast::transform;
use crate::ast::transform::Transform;
use crate::ast::typename_field;
use crate::error::CompileError;
use crate::schema::RemoteSchema;

/// Adds the entity fragments of a type next to the identity fragment spreads of its operations.
///
/// ```graphql
/// { allUser { ...UserId } }
/// ```
/// becomes `{ allUser { __typename ...UserId ...UserFragment1 ...UserFragment2 } }`.
///
/// Only selection sets of operations holding a fragment spread, and applying to the entity type,
/// are extended. Fragment definitions are left as they are.
pub(crate) struct AddEntityFragmentSpreads<'a> {
    schema: &'a RemoteSchema,
    entity_type: &'a Name,
    fragment_names: Vec<Name>,
    typename_alias: &'a str,
}

impl<'a> AddEntityFragmentSpreads<'a> {
    pub(crate) fn new(
        schema: &'a RemoteSchema,
        entity_type: &'a Name,
        entity_fragments: &[Node<ast::FragmentDefinition>],
        typename_alias: &'a str,
    ) -> Self {
        Self {
            schema,
            entity_type,
            fragment_names: entity_fragments
                .iter()
                .map(|fragment| fragment.name.clone())
                .collect(),
            typename_alias,
        }
    }
}

impl Transform for AddEntityFragmentSpreads<'_> {
    fn schema(&self) -> &RemoteSchema {
        self.schema
    }

    fn fragment_definition(
        &mut self,
        def: &Node<ast::FragmentDefinition>,
    ) -> Result<Option<Node<ast::FragmentDefinition>>, CompileError> {
        Ok(Some(def.clone()))
    }

    fn selection_set(
        &mut self,
        parent_type: &NamedType,
        set: &[Selection],
    ) -> Result<Vec<Selection>, CompileError> {
        let set = transform::selection_set(self, parent_type, set)?;
        let has_spread = set
            .iter()
            .any(|selection| matches!(selection, Selection::FragmentSpread(_)));
        if !has_spread || !self.schema.is_possible_type(parent_type, self.entity_type) {
            return Ok(set);
        }

        let mut selections = vec![typename_field(None)];
        selections.extend(
            set.into_iter()
                .filter(|selection| !is_discriminator_field(selection, self.typename_alias)),
        );
        for fragment_name in &self.fragment_names {
            let already_spread = selections.iter().any(|selection| {
                matches!(selection, Selection::FragmentSpread(spread) if &spread.fragment_name == fragment_name)
            });
            if !already_spread {
                selections.push(fragment_spread(fragment_name.clone()));
            }
        }
        Ok(selections)
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::fragment_definition;

    #[test]
    fn spreads_entity_fragments_into_operations_only() {
        let schema = RemoteSchema::parse(
            "type Query { allFoo: [Foo] meta: Meta } type Foo { id: ID meta: Meta } type Meta { count: Int }",
            "schema.graphql",
        )
        .unwrap();
        let input = ast::Document::parse(
            "
            query LIST_Foo { meta { ...MetaFields } allFoo { __typename ...FooId ...Foo } }
            fragment FooId on Foo { id }
            fragment MetaFields on Meta { count }
            ",
            "queries.graphql",
        )
        .unwrap();
        let entity_type = name!("Foo");
        let entity_fragments = [
            fragment_definition(name!("Foo"), name!("Foo"), Vec::new()),
            fragment_definition(name!("Foo__meta"), name!("Foo"), Vec::new()),
        ];
        let mut spreads =
            AddEntityFragmentSpreads::new(&schema, &entity_type, &entity_fragments, "remoteTypeName");
        let output = transform::document(&mut spreads, &input).unwrap();

        let expected = ast::Document::parse(
            "
            query LIST_Foo { meta { ...MetaFields } allFoo { __typename ...FooId ...Foo ...Foo__meta } }
            fragment FooId on Foo { id }
            fragment MetaFields on Meta { count }
            ",
            "expected.graphql",
        )
        .unwrap();
        assert_eq!(output.to_string(), expected.to_string());
    }
}
