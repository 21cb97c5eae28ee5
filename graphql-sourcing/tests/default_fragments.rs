use apollo_compiler::ExecutableDocument;
use graphql_sourcing::DefaultFragmentsConfig;
use graphql_sourcing::EntityTypeDeclaration;
use graphql_sourcing::SourcingConfig;
use graphql_sourcing::compile_node_queries;
use graphql_sourcing::generate_default_fragments;
use pretty_assertions::assert_eq;

use crate::support::normalize;
use crate::support::schema;

const SDL: &str = "
    type Query { allPost: [Post] }
    interface Node { id: ID! }
    type Post implements Node { id: ID! title: String author: User related: Node }
    type User implements Node { id: ID! name: String }
";

fn declarations() -> [EntityTypeDeclaration; 2] {
    [
        EntityTypeDeclaration::new(
            "Post",
            "query LIST_Post { allPost { ...PostId } } fragment PostId on Post { id }",
        ),
        EntityTypeDeclaration::new("User", "fragment UserId on User { id }"),
    ]
}

#[test]
fn entity_and_node_interface_fields_select_references() {
    let schema = schema(SDL);
    let fragments =
        generate_default_fragments(&schema, &declarations(), &DefaultFragmentsConfig::default())
            .unwrap();

    assert_eq!(
        normalize(&fragments["Post"]),
        normalize(
            "
            fragment Post on Post {
              remoteId: id
              title
              author { ... on User { remoteTypeName: __typename remoteId: id } }
              related { ... on Node { remoteTypeName: __typename remoteId: id } }
            }
            "
        )
    );
    assert_eq!(
        normalize(&fragments["User"]),
        normalize("fragment User on User { remoteId: id name }")
    );
}

#[test]
fn generated_fragments_compile_into_valid_documents() {
    let schema = schema(SDL);
    let declarations = declarations();
    let fragments =
        generate_default_fragments(&schema, &declarations, &DefaultFragmentsConfig::default())
            .unwrap();
    let custom_fragments = fragments.values().collect::<Vec<_>>();
    let documents = compile_node_queries(
        &schema,
        &declarations,
        &custom_fragments,
        &SourcingConfig::default(),
    )
    .unwrap();

    let post = documents["Post"].to_string();
    assert!(post.contains("...Post"), "{post}");
    ExecutableDocument::parse_and_validate(schema.schema(), post, "compiled.graphql").unwrap();
}

#[test]
fn transitive_cycles_stop_at_the_reentered_type() {
    let schema = schema(
        "
        type Query { allHolder: [Holder] }
        type Holder { id: ID! a: A }
        type A { x: Int b: B }
        type B { y: Int a: A }
        ",
    );
    let declarations = [EntityTypeDeclaration::new(
        "Holder",
        "query LIST_Holder { allHolder { ...HolderId } } fragment HolderId on Holder { id }",
    )];
    let fragments =
        generate_default_fragments(&schema, &declarations, &DefaultFragmentsConfig::default())
            .unwrap();

    assert_eq!(
        normalize(&fragments["Holder"]),
        normalize(
            "
            fragment Holder on Holder {
              remoteId: id
              a { ... on A { x b { ... on B { y a { remoteTypeName: __typename } } } } }
            }
            "
        )
    );
}
