use std::sync::Mutex;

use apollo_compiler::ast;
use async_trait::async_trait;
use graphql_sourcing::RemoteSchema;
use graphql_sourcing::fetch::ExecutionRequest;
use graphql_sourcing::fetch::ExecutionResponse;
use graphql_sourcing::fetch::QueryExecutor;
use indexmap::IndexMap;
use serde_json_bytes::Value;
use tower::BoxError;

pub(crate) fn schema(sdl: &str) -> RemoteSchema {
    RemoteSchema::parse(sdl, "schema.graphql").unwrap()
}

/// Parses and prints `source`, so that comparisons do not depend on whitespace.
pub(crate) fn normalize(source: &str) -> String {
    ast::Document::parse(source, "expected.graphql")
        .unwrap()
        .to_string()
}

pub(crate) fn printed(documents: &IndexMap<String, ast::Document>, type_name: &str) -> String {
    documents[type_name].to_string()
}

type Handler = Box<dyn Fn(&ExecutionRequest) -> ExecutionResponse + Send + Sync>;

/// Answers requests with a closure and records them.
pub(crate) struct FakeExecutor {
    handler: Handler,
    pub(crate) requests: Mutex<Vec<ExecutionRequest>>,
}

impl FakeExecutor {
    pub(crate) fn new(
        handler: impl Fn(&ExecutionRequest) -> ExecutionResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Operation names and variables of the requests received so far.
    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| {
                (
                    request.operation_name.clone(),
                    Value::Object(request.variables.clone()),
                )
            })
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResponse, BoxError> {
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

pub(crate) fn u64_variable(request: &ExecutionRequest, name: &str) -> u64 {
    request
        .variables
        .get(name)
        .and_then(Value::as_u64)
        .unwrap()
}
