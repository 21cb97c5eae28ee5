//! ## Usage
//!
//! `graphql-sourcing` turns a remote GraphQL schema, a list of entity type declarations and a set
//! of user-authored fragments into one executable document per entity type. Every compiled
//! document holds the list, item-by-id and paginated sub-field operations for its type, with
//! identity fields, type discriminators and variable definitions filled in.
//!
//! The [`pagination`] and [`fetch`] modules drive those documents against a remote endpoint
//! through a caller-supplied [`fetch::QueryExecutor`], walking every page and stitching paginated
//! sub-fields back into their parent records.
//!
//! ```ignore
//! let documents = compile_node_queries(&schema, &declarations, &fragments, &config)?;
//! let definitions = build_node_definitions(&declarations, &documents)?;
//! ```

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub(crate) mod analyze;
pub mod ast;
pub mod compile;
pub mod config;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod pagination;
pub mod schema;
pub(crate) mod utils;

pub use crate::compile::compile_node_queries;
pub use crate::compile::default_fragments::DefaultFragmentsConfig;
pub use crate::compile::default_fragments::generate_default_fragment_nodes;
pub use crate::compile::default_fragments::generate_default_fragments;
pub use crate::config::SourcingConfig;
pub use crate::entity::EntityTypeDeclaration;
pub use crate::error::CompileError;
pub use crate::error::ConfigurationError;
pub use crate::error::FetchError;
pub use crate::error::PaginationError;
pub use crate::fetch::NodeDefinition;
pub use crate::fetch::build_node_definitions;
pub use crate::schema::RemoteSchema;
