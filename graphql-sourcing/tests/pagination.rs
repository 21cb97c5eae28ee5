use apollo_compiler::ast;
use graphql_sourcing::ConfigurationError;
use graphql_sourcing::FetchError;
use graphql_sourcing::PaginationError;
use graphql_sourcing::SourcingConfig;
use graphql_sourcing::fetch::ExecutionResponse;
use graphql_sourcing::fetch::Object;
use graphql_sourcing::fetch::ResponseError;
use graphql_sourcing::pagination::PaginationPlan;
use graphql_sourcing::pagination::default_strategies;
use graphql_sourcing::pagination::fetch_paginated_items;
use graphql_sourcing::pagination::paginate;
use graphql_sourcing::pagination::plan_pagination;
use pretty_assertions::assert_eq;
use serde_json_bytes::Value;
use serde_json_bytes::json;

use crate::support::FakeExecutor;
use crate::support::u64_variable;

const QUERIES: &str = "
    query LIST_Foo($limit: Int, $offset: Int) {
      allFoo(limit: $limit, offset: $offset) { id }
    }
    query LIST_Bar($first: Int, $after: String) {
      bars(first: $first, after: $after) {
        edges { cursor node { id } }
        pageInfo { hasNextPage }
      }
    }
";

fn plan(operation_name: &str, page_size: u64) -> PaginationPlan {
    let document = ast::Document::parse(QUERIES, "queries.graphql").unwrap();
    let config = SourcingConfig {
        page_size,
        ..Default::default()
    };
    plan_pagination(
        &document,
        QUERIES.into(),
        operation_name,
        Object::new(),
        &default_strategies(),
        &config,
    )
    .unwrap()
}

/// Serves `total` items in pages of `limit` starting at `offset`.
fn limit_offset_server(total: u64) -> FakeExecutor {
    FakeExecutor::new(move |request| {
        let limit = u64_variable(request, "limit");
        let offset = u64_variable(request, "offset");
        let items = (offset..total.min(offset + limit))
            .map(|id| json!({ "id": id }))
            .collect::<Vec<_>>();
        ExecutionResponse::from_data(json!({ "allFoo": items }))
    })
}

#[tokio::test]
async fn limit_offset_walks_until_a_short_page() {
    let executor = limit_offset_server(5);
    let items = fetch_paginated_items(&executor, &plan("LIST_Foo", 2))
        .await
        .unwrap();

    assert_eq!(
        items,
        (0..5).map(|id| json!({ "id": id })).collect::<Vec<_>>()
    );
    assert_eq!(
        executor.calls(),
        [
            ("LIST_Foo".to_string(), json!({ "limit": 2, "offset": 0 })),
            ("LIST_Foo".to_string(), json!({ "limit": 2, "offset": 2 })),
            ("LIST_Foo".to_string(), json!({ "limit": 2, "offset": 4 })),
        ]
    );
}

#[tokio::test]
async fn limit_offset_stops_after_an_empty_page() {
    let executor = limit_offset_server(4);
    let pages = paginate(&executor, &plan("LIST_Foo", 2)).await.unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[2].field_value, json!([]));
}

#[tokio::test]
async fn zero_page_size_does_not_loop() {
    let document = ast::Document::parse(QUERIES, "queries.graphql").unwrap();
    let config = SourcingConfig {
        page_size: 0,
        ..Default::default()
    };
    let error = plan_pagination(
        &document,
        QUERIES.into(),
        "LIST_Foo",
        Object::new(),
        &default_strategies(),
        &config,
    )
    .unwrap_err();
    assert_eq!(
        error,
        PaginationError::Configuration(ConfigurationError::ZeroPageSize)
    );

    let executor = FakeExecutor::new(|_| ExecutionResponse::from_data(json!({ "allFoo": [] })));
    let mut zero_limit = plan("LIST_Foo", 2);
    zero_limit.page_size = 0;
    let pages = paginate(&executor, &zero_limit).await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn relay_follows_cursors() {
    let executor = FakeExecutor::new(|request| {
        let data = match request.variables.get("after").and_then(Value::as_str) {
            None => json!({ "bars": {
                "edges": [
                    { "cursor": "a", "node": { "id": 1 } },
                    { "cursor": "b", "node": { "id": 2 } },
                ],
                "pageInfo": { "hasNextPage": true },
            }}),
            Some(_) => json!({ "bars": {
                "edges": [{ "cursor": "c", "node": { "id": 3 } }],
                "pageInfo": { "hasNextPage": false },
            }}),
        };
        ExecutionResponse::from_data(data)
    });
    let items = fetch_paginated_items(&executor, &plan("LIST_Bar", 2))
        .await
        .unwrap();

    assert_eq!(
        items,
        [json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })]
    );
    assert_eq!(
        executor.calls(),
        [
            ("LIST_Bar".to_string(), json!({ "first": 2 })),
            ("LIST_Bar".to_string(), json!({ "first": 2, "after": "b" })),
        ]
    );
}

#[tokio::test]
async fn relay_stops_on_an_empty_page_reporting_more() {
    let executor = FakeExecutor::new(|_| {
        ExecutionResponse::from_data(json!({ "bars": {
            "edges": [],
            "pageInfo": { "hasNextPage": true },
        }}))
    });
    let items = fetch_paginated_items(&executor, &plan("LIST_Bar", 2))
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn relay_fails_when_more_pages_have_no_cursor() {
    let executor = FakeExecutor::new(|_| {
        ExecutionResponse::from_data(json!({ "bars": {
            "edges": [{ "node": { "id": 1 } }],
            "pageInfo": { "hasNextPage": true },
        }}))
    });
    let error = paginate(&executor, &plan("LIST_Bar", 2))
        .await
        .unwrap_err();

    assert_eq!(
        error.to_string(),
        "unexpected page shape for the RelayForward strategy: last edge has no cursor"
    );
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn responses_without_data_fail_with_the_first_error() {
    let executor = FakeExecutor::new(|_| ExecutionResponse {
        data: None,
        errors: vec![
            ResponseError {
                message: "boom".into(),
            },
            ResponseError {
                message: "second".into(),
            },
        ],
    });
    let error = paginate(&executor, &plan("LIST_Foo", 2))
        .await
        .unwrap_err();
    assert!(matches!(&error, FetchError::Execution(message) if message == "boom"));

    let executor = FakeExecutor::new(|_| ExecutionResponse::default());
    let error = paginate(&executor, &plan("LIST_Foo", 2))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Could not execute operation LIST_Foo");
}
