use async_trait::async_trait;
use serde_json_bytes::Value;
use tower::BoxError;
use tracing::debug;
use tracing::instrument;

use super::NodeDefinition;
use super::SourcingContext;
use super::fetch_all_nodes;
use super::remote_node_id;
use crate::error::FetchError;

/// Receives the records of entity types, downstream of fetching.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// `id` is the [`remote_node_id`] of the record.
    async fn create_record(
        &self,
        definition: &NodeDefinition,
        id: String,
        record: Value,
    ) -> Result<(), BoxError>;
}

/// Fetches the records of every entity type and hands them to `sink`.
///
/// Only records whose type discriminator names the fetched type are forwarded: lists of abstract
/// types may hold records of other types, and null items are skipped. Returns the number of
/// records created.
#[instrument(skip_all)]
pub async fn source_all_nodes(
    context: &SourcingContext,
    sink: &dyn RecordSink,
) -> Result<usize, FetchError> {
    let typename = context.config.field_aliases.typename();
    let mut created = 0;
    for result in fetch_all_nodes(context).await? {
        let definition = context.definition(&result.remote_type_name)?;
        for record in result.nodes {
            let record_type = record.get(typename).and_then(Value::as_str);
            if record_type != Some(definition.remote_type_name.as_str()) {
                continue;
            }
            let id = remote_node_id(&record, definition)?;
            sink.create_record(definition, id, record)
                .await
                .map_err(|source| FetchError::Sink {
                    type_name: definition.remote_type_name.clone(),
                    source,
                })?;
            created += 1;
        }
        debug!(type_name = %definition.remote_type_name, created, "created records");
    }
    Ok(created)
}
