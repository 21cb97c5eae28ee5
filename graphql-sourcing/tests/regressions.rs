use graphql_sourcing::EntityTypeDeclaration;
use graphql_sourcing::SourcingConfig;
use graphql_sourcing::build_node_definitions;
use graphql_sourcing::compile_node_queries;
use graphql_sourcing::fetch::remote_node_id;
use pretty_assertions::assert_eq;
use serde_json_bytes::json;

use crate::support::normalize;
use crate::support::printed;
use crate::support::schema;

#[test]
fn interface_and_implementor_used_at_the_same_path() {
    let schema = schema(
        "
        type Query { allBaz: [Baz] allFoo: [Foo] }
        interface Node { id: ID! }
        type Foo implements Node { id: ID! title: String }
        type Baz { id: ID! node: Node }
        ",
    );
    let declarations = [
        EntityTypeDeclaration::new(
            "Foo",
            "query LIST_Foo { allFoo { ...FooId } } fragment FooId on Foo { id }",
        ),
        EntityTypeDeclaration::new(
            "Baz",
            "query LIST_Baz { allBaz { ...BazId } } fragment BazId on Baz { id }",
        ),
    ];
    let documents = compile_node_queries(
        &schema,
        &declarations,
        &["fragment Baz on Baz { node { id ... on Foo { title } } }"],
        &SourcingConfig::default(),
    )
    .unwrap();

    assert_eq!(
        printed(&documents, "Foo"),
        normalize(
            "
            query LIST_Foo {
              allFoo { remoteTypeName: __typename ...FooId ...Baz__node ...Baz__node__Node }
            }
            fragment FooId on Foo { remoteId: id }
            fragment Baz__node on Foo { title }
            fragment Baz__node__Node on Node { remoteId: id ... on Foo { title } }
            "
        )
    );
}

#[test]
fn composite_identity_joins_values_in_declaration_order() {
    let schema = schema("type Query { allFoo: [Foo] } type Foo { id: ID! locale: String }");
    let declarations = [EntityTypeDeclaration::new(
        "Foo",
        "query LIST_Foo { allFoo { ...FooId } } fragment FooId on Foo { id locale }",
    )];
    let documents =
        compile_node_queries(&schema, &declarations, &[] as &[&str], &SourcingConfig::default())
            .unwrap();
    let definitions = build_node_definitions(&declarations, &documents).unwrap();

    let record = json!({ "remoteTypeName": "Foo", "locale": "en", "remoteId": 42 });
    assert_eq!(remote_node_id(&record, &definitions["Foo"]).unwrap(), "42:en");
    assert!(remote_node_id(&json!({ "remoteId": 42 }), &definitions["Foo"]).is_err());
}
