//! Fetching remote records with compiled node documents.
//!
//! Query execution itself is supplied by the caller through [`QueryExecutor`]. Everything here
//! works on `serde_json_bytes` values, the representation used for GraphQL responses.
use std::fmt;
use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Value;
use tower::BoxError;

use crate::ast::find_fragment;
use crate::ast::fragments;
use crate::ast::is_typename_field;
use crate::ast::response_key;
use crate::config::SourcingConfig;
use crate::entity::EntityTypeDeclaration;
use crate::error::CompileError;
use crate::error::ConfigurationError;
use crate::pagination::PaginationStrategy;
use crate::pagination::default_strategies;

pub mod field_path;
mod node_id;
mod nodes;
pub mod operations;
mod sink;

pub use node_id::remote_node_id;
pub use nodes::FetchResult;
pub use nodes::add_paginated_fields;
pub use nodes::fetch_all_nodes;
pub use nodes::fetch_node_by_id;
pub use nodes::fetch_node_list;
pub use sink::RecordSink;
pub use sink::source_all_nodes;

/// A JSON object, as found in GraphQL variables and responses.
pub type Object = serde_json_bytes::Map<ByteString, Value>;

/// A GraphQL request sent to the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub query: Arc<str>,
    pub operation_name: String,
    pub variables: Object,
}

/// A GraphQL response of the remote API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

impl ExecutionResponse {
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// The message of the first reported error, if any.
    pub fn first_error_message(&self) -> Option<&str> {
        self.errors.first().map(|error| error.message.as_str())
    }
}

/// An error reported by the remote API. Fields other than the message are not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

/// Executes GraphQL requests against the remote API.
///
/// Implementations must be safe to call repeatedly and concurrently. Throttling and retries are
/// their concern: a failed execution aborts the pagination loop it belongs to.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResponse, BoxError>;
}

/// A field of the identity selection of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityField {
    /// Name of the remote field, also the name of the node query variable it supplies.
    pub name: Name,
    /// Key of the field in fetched records.
    pub response_key: Name,
    /// Identity fields of a nested object, empty for leaves.
    pub selections: Vec<IdentityField>,
}

/// Everything needed to fetch the records of one entity type.
#[derive(Clone)]
pub struct NodeDefinition {
    pub remote_type_name: String,
    pub document: ast::Document,
    /// Printed `document`, sent with every request.
    pub query: Arc<str>,
    /// Identity selection of the type, in declaration order, type discriminators excluded.
    pub identity_fields: Vec<IdentityField>,
}

impl NodeDefinition {
    /// Variables of `NODE_` and `PAGINATE_` operations fetching `record`.
    ///
    /// Each top-level identity field supplies the variable named after the remote field.
    pub fn node_query_variables(&self, record: &Value) -> Result<Object, ConfigurationError> {
        self.identity_fields
            .iter()
            .map(|field| {
                let value = record
                    .as_object()
                    .and_then(|object| object.get(field.response_key.as_str()))
                    .filter(|value| !value.is_null())
                    .ok_or_else(|| ConfigurationError::MissingIdentityValue {
                        field: field.response_key.to_string(),
                        type_name: self.remote_type_name.clone(),
                    })?;
                Ok((ByteString::from(field.name.as_str()), value.clone()))
            })
            .collect()
    }
}

impl fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("remote_type_name", &self.remote_type_name)
            .field("identity_fields", &self.identity_fields)
            .finish_non_exhaustive()
    }
}

/// Pairs every declaration with its compiled document.
///
/// The identity selection is read from the compiled identity fragment, so that response keys
/// reflect the aliases given during compilation.
pub fn build_node_definitions(
    declarations: &[EntityTypeDeclaration],
    documents: &IndexMap<String, ast::Document>,
) -> Result<IndexMap<String, NodeDefinition>, CompileError> {
    let mut definitions = IndexMap::with_capacity(declarations.len());
    for declaration in declarations {
        let type_name = declaration.remote_type_name.trim();
        let document = documents
            .get(type_name)
            .ok_or_else(|| ConfigurationError::MissingDocument(type_name.to_string()))?;
        let queries = ast::Document::parse(declaration.queries.as_str(), type_name)
            .map_err(|errors| CompileError::syntax(type_name, errors))?;
        let identity_fragment = fragments(&queries)
            .next()
            .and_then(|fragment| find_fragment(document, &fragment.name))
            .ok_or_else(|| ConfigurationError::MissingIdentityFragment(type_name.to_string()))?;

        let mut identity_fields = Vec::new();
        collect_identity_fields(document, &identity_fragment.selection_set, &mut identity_fields)?;
        definitions.insert(
            type_name.to_string(),
            NodeDefinition {
                remote_type_name: type_name.to_string(),
                document: document.clone(),
                query: document.to_string().into(),
                identity_fields,
            },
        );
    }
    Ok(definitions)
}

fn collect_identity_fields(
    document: &ast::Document,
    selections: &[Selection],
    identity_fields: &mut Vec<IdentityField>,
) -> Result<(), ConfigurationError> {
    for selection in selections {
        match selection {
            _ if is_typename_field(selection) => {}
            Selection::Field(field) => {
                let mut nested = Vec::new();
                collect_identity_fields(document, &field.selection_set, &mut nested)?;
                identity_fields.push(IdentityField {
                    name: field.name.clone(),
                    response_key: response_key(field).clone(),
                    selections: nested,
                });
            }
            Selection::InlineFragment(inline) => {
                collect_identity_fields(document, &inline.selection_set, identity_fields)?;
            }
            Selection::FragmentSpread(spread) => {
                let fragment = find_fragment(document, &spread.fragment_name).ok_or_else(|| {
                    ConfigurationError::MissingFragment(spread.fragment_name.to_string())
                })?;
                collect_identity_fields(document, &fragment.selection_set, identity_fields)?;
            }
        }
    }
    Ok(())
}

/// Shared state of a sourcing run.
pub struct SourcingContext {
    pub node_definitions: IndexMap<String, NodeDefinition>,
    pub executor: Arc<dyn QueryExecutor>,
    /// Pagination strategies, tried in order.
    pub strategies: Vec<PaginationStrategy>,
    pub config: SourcingConfig,
}

impl SourcingContext {
    pub fn new(
        node_definitions: IndexMap<String, NodeDefinition>,
        executor: Arc<dyn QueryExecutor>,
        config: SourcingConfig,
    ) -> Self {
        Self {
            node_definitions,
            executor,
            strategies: default_strategies().to_vec(),
            config,
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<PaginationStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn definition(&self, remote_type_name: &str) -> Result<&NodeDefinition, ConfigurationError> {
        self.node_definitions
            .get(remote_type_name)
            .ok_or_else(|| ConfigurationError::MissingDocument(remote_type_name.to_string()))
    }
}
