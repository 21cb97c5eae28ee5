//! Entity type declarations and their identity fragments.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use serde::Deserialize;
use serde::Serialize;

use crate::ast::fragments;
use crate::error::CompileError;
use crate::error::ConfigurationError;
use crate::schema::RemoteSchema;

/// A remote type the caller wants to source as individually identified records.
///
/// `queries` holds exactly one fragment on `remote_type_name` (the identity fragment) and the
/// named operations fetching records of this type: `LIST_*` operations listing them, `NODE_*`
/// operations fetching one record by its identity and `PAGINATE_*` operations fetching paginated
/// sub-fields of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeDeclaration {
    #[serde(default)]
    pub remote_type_name: String,
    #[serde(default)]
    pub queries: String,
}

impl EntityTypeDeclaration {
    pub fn new(remote_type_name: impl Into<String>, queries: impl Into<String>) -> Self {
        Self {
            remote_type_name: remote_type_name.into(),
            queries: queries.into(),
        }
    }
}

/// A validated declaration.
#[derive(Debug, Clone)]
pub(crate) struct EntityType {
    pub(crate) remote_type_name: Name,
    pub(crate) queries: ast::Document,
    pub(crate) identity_fragment: Node<ast::FragmentDefinition>,
}

/// Parses and validates every declaration, failing on the first malformed one.
pub(crate) fn parse_declarations(
    schema: &RemoteSchema,
    declarations: &[EntityTypeDeclaration],
) -> Result<Vec<EntityType>, CompileError> {
    declarations
        .iter()
        .enumerate()
        .map(|(index, declaration)| parse_declaration(schema, index, declaration))
        .collect()
}

fn parse_declaration(
    schema: &RemoteSchema,
    index: usize,
    declaration: &EntityTypeDeclaration,
) -> Result<EntityType, CompileError> {
    let type_name = declaration.remote_type_name.trim();
    if type_name.is_empty() {
        return Err(ConfigurationError::MissingRemoteTypeName { index }.into());
    }
    if declaration.queries.trim().is_empty() {
        return Err(ConfigurationError::MissingQueries {
            index,
            type_name: type_name.to_string(),
        }
        .into());
    }
    if !schema.is_object(type_name) {
        return Err(ConfigurationError::NotAnObjectType {
            index,
            type_name: type_name.to_string(),
        }
        .into());
    }
    let remote_type_name =
        Name::new(type_name).map_err(|_| ConfigurationError::InvalidName(type_name.to_string()))?;

    let queries = ast::Document::parse(declaration.queries.as_str(), type_name)
        .map_err(|errors| CompileError::syntax(type_name, errors))?;
    let identity_fragments = fragments(&queries).collect::<Vec<_>>();
    let [identity_fragment] = identity_fragments.as_slice() else {
        return Err(ConfigurationError::IdentityFragmentCount {
            index,
            type_name: type_name.to_string(),
            count: identity_fragments.len(),
        }
        .into());
    };
    if identity_fragment.type_condition != remote_type_name {
        return Err(ConfigurationError::IdentityFragmentTypeMismatch {
            index,
            fragment: identity_fragment.name.to_string(),
            type_name: type_name.to_string(),
            type_condition: identity_fragment.type_condition.to_string(),
        }
        .into());
    }
    let identity_fragment = (*identity_fragment).clone();

    Ok(EntityType {
        remote_type_name,
        queries,
        identity_fragment,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const SDL: &str = "
        type Query { foo: Foo bar: Bar }
        type Foo { id: ID! title: String }
        type Bar { id: ID! }
        interface Iface { id: ID! }
    ";

    fn schema() -> RemoteSchema {
        RemoteSchema::parse(SDL, "schema.graphql").unwrap()
    }

    #[test]
    fn parses_identity_fragment() {
        let declaration = EntityTypeDeclaration::new(
            "Foo",
            "query LIST_Foo { foo { ...FooId } } fragment FooId on Foo { __typename id }",
        );
        let entities = parse_declarations(&schema(), &[declaration]).unwrap();
        assert_eq!(entities[0].remote_type_name.as_str(), "Foo");
        assert_eq!(entities[0].identity_fragment.name.as_str(), "FooId");
        assert_eq!(entities[0].queries.definitions.len(), 2);
    }

    #[rstest]
    #[case::missing_name(
        EntityTypeDeclaration::new("", "fragment FooId on Foo { id }"),
        "entity type declaration at index 0 has no remote type name"
    )]
    #[case::missing_queries(
        EntityTypeDeclaration::new("Foo", "  "),
        "entity type declaration for `Foo` (index 0) has no queries"
    )]
    #[case::not_an_object(
        EntityTypeDeclaration::new("Iface", "fragment IfaceId on Iface { id }"),
        "only object types can be declared as entity types, got `Iface` (index 0)"
    )]
    #[case::no_fragment(
        EntityTypeDeclaration::new("Foo", "query LIST_Foo { foo { id } }"),
        "queries of entity type `Foo` (index 0) must contain exactly one identity fragment, found 0"
    )]
    #[case::two_fragments(
        EntityTypeDeclaration::new(
            "Foo",
            "fragment FooId on Foo { id } fragment Other on Foo { title }"
        ),
        "queries of entity type `Foo` (index 0) must contain exactly one identity fragment, found 2"
    )]
    #[case::wrong_type_condition(
        EntityTypeDeclaration::new("Foo", "fragment FooId on Bar { id }"),
        "identity fragment `FooId` of entity type `Foo` (index 0) is incorrectly defined on type `Bar`"
    )]
    fn rejects_malformed_declarations(
        #[case] declaration: EntityTypeDeclaration,
        #[case] message: &str,
    ) {
        let error = parse_declarations(&schema(), &[declaration]).unwrap_err();
        assert_eq!(error.to_string(), message);
    }

    #[test]
    fn type_mismatch_names_the_declaration_index() {
        let declarations = [
            EntityTypeDeclaration::new("Bar", "fragment BarId on Bar { id }"),
            EntityTypeDeclaration::new("Foo", "fragment FooId on Bar { id }"),
        ];
        let error = parse_declarations(&schema(), &declarations).unwrap_err();
        assert_eq!(
            error,
            CompileError::Configuration(ConfigurationError::IdentityFragmentTypeMismatch {
                index: 1,
                fragment: "FooId".into(),
                type_name: "Foo".into(),
                type_condition: "Bar".into(),
            })
        );
    }

    #[test]
    fn deserializes_camel_case() {
        let declaration: EntityTypeDeclaration = serde_json::from_value(serde_json::json!({
            "remoteTypeName": "Foo",
            "queries": "fragment FooId on Foo { id }"
        }))
        .unwrap();
        assert_eq!(declaration.remote_type_name, "Foo");

        let declaration: EntityTypeDeclaration =
            serde_json::from_value(serde_json::json!({ "remoteTypeName": "Foo" })).unwrap();
        let error = parse_declarations(&schema(), &[declaration]).unwrap_err();
        assert!(matches!(
            error,
            CompileError::Configuration(ConfigurationError::MissingQueries { .. })
        ));
    }
}
