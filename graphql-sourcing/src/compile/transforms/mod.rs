//! The rewriting stages of document compilation, in pipeline order.
use apollo_compiler::Name;
use indexmap::IndexSet;

use crate::schema::RemoteSchema;

pub(crate) mod alias;
pub(crate) mod duplicates;
pub(crate) mod node_reference;
pub(crate) mod spreads;
pub(crate) mod strip_wrapping;
pub(crate) mod typename;
pub(crate) mod unused;
pub(crate) mod variables;

/// Returns true if records of `type_name` may be entity records: an entity object type, or an
/// interface implemented by at least one entity type. Unions never qualify.
pub(crate) fn is_entity_like(
    schema: &RemoteSchema,
    entity_types: &IndexSet<Name>,
    type_name: &str,
) -> bool {
    if schema.is_object(type_name) {
        return entity_types.contains(type_name);
    }
    schema.is_interface(type_name)
        && schema
            .possible_types(type_name)
            .iter()
            .any(|possible_type| entity_types.contains(possible_type))
}
