use std::iter;

use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use indexmap::IndexMap;
use indexmap::IndexSet;
use tracing::warn;

use super::FragmentMap;
use crate::ast::field;
use crate::ast::fragment_definition;
use crate::ast::is_typename_field;
use crate::ast::typename_field;
use crate::config::TYPENAME_FIELD;
use crate::entity::EntityType;
use crate::schema::RemoteSchema;

/// Builds the reference fragment of every entity type and every node interface.
///
/// A reference fragment holds what is needed to find a record again: a `__typename` selection
/// followed by the identity fields of the entity type.
///
/// A "node interface" is an interface whose possible types are all entity types, and which
/// declares every top-level field of the union of their identity fields. Fields typed as a node
/// interface can then be replaced by a reference as well.
pub(crate) fn build_node_reference_fragment_map(
    schema: &RemoteSchema,
    entities: &[EntityType],
) -> FragmentMap {
    let mut references = FragmentMap::new();
    let mut candidate_interfaces = IndexSet::new();

    for entity in entities {
        let type_name = &entity.remote_type_name;
        let selections = iter::once(typename_field(None))
            .chain(
                entity
                    .identity_fragment
                    .selection_set
                    .iter()
                    .filter(|selection| !is_typename_field(selection))
                    .cloned(),
            )
            .collect();
        references.insert(
            type_name.clone(),
            fragment_definition(type_name.clone(), type_name.clone(), selections),
        );
        candidate_interfaces.extend(schema.interfaces(type_name));
    }

    for interface in candidate_interfaces {
        let possible_types = schema.possible_types(&interface);
        let entity_references = possible_types
            .iter()
            .map(|type_name| {
                entities
                    .iter()
                    .any(|entity| &entity.remote_type_name == type_name)
                    .then(|| references.get(type_name))
                    .flatten()
            })
            .collect::<Option<Vec<_>>>();
        let Some(entity_references) = entity_references else {
            continue;
        };

        let identity_fields = entity_references
            .iter()
            .flat_map(|reference| reference.selection_set.iter())
            .filter_map(as_field)
            .collect::<Vec<_>>();
        let selections = dedupe_fields_recursively(identity_fields);

        let missing_field = selections.iter().filter_map(as_field).find(|identity_field| {
            identity_field.name.as_str() != TYPENAME_FIELD
                && !schema.has_field(&interface, &identity_field.name)
        });
        if let Some(missing_field) = missing_field {
            warn!(
                interface = %interface,
                field = %missing_field.name,
                "interface does not declare an identity field of its implementors, it cannot be queried by reference"
            );
            continue;
        }
        references.insert(
            interface.clone(),
            fragment_definition(interface.clone(), interface, selections),
        );
    }

    references
}

fn as_field(selection: &Selection) -> Option<&ast::Field> {
    match selection {
        Selection::Field(field) => Some(field),
        _ => None,
    }
}

/// Merges fields by name, recursively merging their sub-selections. Aliases and arguments are
/// not carried over.
fn dedupe_fields_recursively(fields: Vec<&ast::Field>) -> Vec<Selection> {
    let mut unique_fields: IndexMap<&Name, Vec<&ast::Field>> = IndexMap::new();
    for identity_field in fields {
        unique_fields
            .entry(&identity_field.name)
            .or_default()
            .extend(identity_field.selection_set.iter().filter_map(as_field));
    }
    unique_fields
        .into_iter()
        .map(|(name, sub_fields)| {
            field(
                None,
                name.clone(),
                Vec::new(),
                dedupe_fields_recursively(sub_fields),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::*;
    use crate::entity::EntityTypeDeclaration;
    use crate::entity::parse_declarations;

    const SDL: &str = "
        type Query { node: Node }
        interface Node { testId: ID kind: Kind }
        type Kind { code: String }
        interface Named { name: String }
        type Foo implements Node & Named { testId: ID kind: Kind name: String }
        type Bar implements Node & Named { testId: ID kind: Kind name: String slug: String }
        type Baz implements Named { name: String }
    ";

    fn declaration(type_name: &str, identity: &str) -> EntityTypeDeclaration {
        EntityTypeDeclaration::new(
            type_name,
            format!("fragment {type_name}Id on {type_name} {{ {identity} }}"),
        )
    }

    fn printed(references: &FragmentMap, name: &str) -> Option<String> {
        references
            .get(name)
            .map(|fragment| fragment.to_string().split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn build(declarations: &[EntityTypeDeclaration]) -> FragmentMap {
        let schema = RemoteSchema::parse(SDL, "schema.graphql").unwrap();
        let entities = parse_declarations(&schema, declarations).unwrap();
        build_node_reference_fragment_map(&schema, &entities)
    }

    #[test]
    fn entity_reference_replaces_typename() {
        let references = build(&[declaration("Foo", "remoteTypeName: __typename testId")]);
        assert_eq!(
            printed(&references, "Foo").unwrap(),
            "fragment Foo on Foo { __typename testId }"
        );
    }

    #[test]
    fn interface_with_only_entity_implementors_is_a_node_interface() {
        let references = build(&[
            declaration("Foo", "testId kind { code }"),
            declaration("Bar", "testId kind { code } kind { name: code }"),
        ]);
        assert_eq!(
            printed(&references, "Node").unwrap(),
            "fragment Node on Node { __typename testId kind { code } }"
        );
        // Baz implements `Named` without being an entity type
        assert_eq!(printed(&references, "Named"), None);
    }

    #[test]
    fn interface_with_an_undeclared_implementor_is_excluded() {
        let references = build(&[declaration("Foo", "testId")]);
        assert!(references.contains_key("Foo"));
        assert!(!references.contains_key("Node"));
    }

    #[traced_test]
    #[test]
    fn interface_missing_identity_fields_is_excluded() {
        let references = build(&[
            declaration("Foo", "testId"),
            declaration("Bar", "slug"),
        ]);
        assert!(!references.contains_key("Node"));
        assert!(logs_contain("cannot be queried by reference"));
    }
}
