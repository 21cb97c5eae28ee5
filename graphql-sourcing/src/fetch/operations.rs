//! Classification of node operations by name prefix.
use apollo_compiler::ast;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::ast::operations;

/// What an operation of a node document fetches.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    strum_macros::Display,
    strum_macros::IntoStaticStr,
)]
pub enum OperationKind {
    /// Lists records of the type, usually paginated.
    #[strum(to_string = "LIST_")]
    List,
    /// Fetches one record by its identity.
    #[strum(to_string = "NODE_")]
    Node,
    /// Fetches a paginated field of one record.
    #[strum(to_string = "PAGINATE_")]
    Paginate,
}

impl OperationKind {
    pub fn prefix(self) -> &'static str {
        self.into()
    }

    /// The kind of the operation named `operation_name`, if it has a known prefix.
    pub fn of(operation_name: &str) -> Option<Self> {
        Self::iter().find(|kind| operation_name.starts_with(kind.prefix()))
    }
}

/// Names of the operations of `kind`, in document order.
pub fn operation_names(document: &ast::Document, kind: OperationKind) -> Vec<String> {
    operations(document)
        .filter_map(|operation| operation.name.as_ref())
        .filter(|name| name.starts_with(kind.prefix()))
        .map(ToString::to_string)
        .collect()
}

pub fn list_operation_names(document: &ast::Document) -> Vec<String> {
    operation_names(document, OperationKind::List)
}

pub fn node_operation_names(document: &ast::Document) -> Vec<String> {
    operation_names(document, OperationKind::Node)
}

pub fn paginate_operation_names(document: &ast::Document) -> Vec<String> {
    operation_names(document, OperationKind::Paginate)
}
