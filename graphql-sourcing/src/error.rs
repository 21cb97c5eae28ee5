//! Compilation, pagination and fetch errors.
use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::validation::WithErrors;
use displaydoc::Display;
use thiserror::Error;
use tower::BoxError;

/// Errors caused by malformed entity declarations or inconsistent compiled documents.
///
/// These indicate a caller bug and are never retried.
#[derive(Error, Display, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// entity type declaration at index {index} has no remote type name
    MissingRemoteTypeName { index: usize },

    /// entity type declaration for `{type_name}` (index {index}) has no queries
    MissingQueries { index: usize, type_name: String },

    /// queries of entity type `{type_name}` (index {index}) must contain exactly one identity fragment, found {count}
    IdentityFragmentCount {
        index: usize,
        type_name: String,
        count: usize,
    },

    /// identity fragment `{fragment}` of entity type `{type_name}` (index {index}) is incorrectly defined on type `{type_condition}`
    IdentityFragmentTypeMismatch {
        index: usize,
        fragment: String,
        type_name: String,
        type_condition: String,
    },

    /// only object types can be declared as entity types, got `{type_name}` (index {index})
    NotAnObjectType { index: usize, type_name: String },

    /// unknown remote type `{0}`
    UnknownType(String),

    /// missing identity fragment in the compiled document of `{0}`
    MissingIdentityFragment(String),

    /// every operation of a compiled document must be named
    UnnamedOperation,

    /// fragment `{0}` is spread but never defined
    MissingFragment(String),

    /// no compiled document for entity type `{0}`
    MissingDocument(String),

    /// `{0}` is not a valid GraphQL name
    InvalidName(String),

    /// no {kind} operation defined for entity type `{type_name}`
    MissingOperation { kind: String, type_name: String },

    /// identity field `{field}` is missing or null in a record of type `{type_name}`
    MissingIdentityValue { field: String, type_name: String },

    /// page size must be greater than zero
    ZeroPageSize,
}

/// Errors raised while compiling node queries or default fragments.
#[derive(Error, Display, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum CompileError {
    /// {0}
    Configuration(#[from] ConfigurationError),

    /// invalid GraphQL in {source_name}: {message}
    Syntax {
        /// Where the document came from (entity type or custom fragment).
        source_name: String,
        /// Rendered parser diagnostics.
        message: String,
    },
}

impl CompileError {
    pub(crate) fn syntax<T>(source_name: impl Into<String>, errors: WithErrors<T>) -> Self {
        Self::syntax_from_diagnostics(source_name, &errors.errors)
    }

    fn syntax_from_diagnostics(source_name: impl Into<String>, errors: &DiagnosticList) -> Self {
        Self::Syntax {
            source_name: source_name.into(),
            message: errors.to_string(),
        }
    }
}

/// Errors raised while planning or walking pagination.
#[derive(Error, Display, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum PaginationError {
    /// could not resolve a pagination strategy for variables: {variables}, supported strategies: {supported}
    NoMatchingStrategy { variables: String, supported: String },

    /// operation `{0}` is not defined in the document
    UnknownOperation(String),

    /// could not find a matching field in operation `{0}`: reached maximum nesting level
    MaxNestingReached(String),

    /// no matching field in operation `{0}`
    FieldNotFound(String),

    /// unexpected page shape for the {strategy} strategy: {reason}
    UnexpectedPageShape {
        strategy: &'static str,
        reason: &'static str,
    },

    /// {0}
    Configuration(#[from] ConfigurationError),
}

/// Errors raised while fetching remote records.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// {0}
    Execution(String),

    /// transport error while executing `{operation}`: {source}
    Transport {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// record sink rejected a record of type `{type_name}`: {source}
    Sink {
        type_name: String,
        #[source]
        source: BoxError,
    },

    /// {0}
    Pagination(#[from] PaginationError),

    /// {0}
    Configuration(#[from] ConfigurationError),
}

impl FetchError {
    /// Builds the error for a response without a data payload.
    pub(crate) fn missing_data(
        first_message: Option<&str>,
        operation: &str,
        type_name: Option<&str>,
    ) -> Self {
        match (first_message, type_name) {
            (Some(message), _) => Self::Execution(message.to_string()),
            (None, Some(type_name)) => Self::Execution(format!(
                "Could not execute {operation} query for {type_name} node type"
            )),
            (None, None) => Self::Execution(format!("Could not execute operation {operation}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_prefers_server_message() {
        let error = FetchError::missing_data(Some("boom"), "LIST_Foo", Some("Foo"));
        assert_eq!(error.to_string(), "boom");

        let error = FetchError::missing_data(None, "NODE_Foo", Some("Foo"));
        assert_eq!(
            error.to_string(),
            "Could not execute NODE_Foo query for Foo node type"
        );

        let error = FetchError::missing_data(None, "LIST_Foo", None);
        assert_eq!(error.to_string(), "Could not execute operation LIST_Foo");
    }

    #[test]
    fn configuration_errors_render_their_context() {
        let error = ConfigurationError::IdentityFragmentTypeMismatch {
            index: 2,
            fragment: "FooId".into(),
            type_name: "Foo".into(),
            type_condition: "Bar".into(),
        };
        assert_eq!(
            error.to_string(),
            "identity fragment `FooId` of entity type `Foo` (index 2) is incorrectly defined on type `Bar`"
        );
        let error: CompileError = ConfigurationError::UnnamedOperation.into();
        assert_eq!(
            error.to_string(),
            "every operation of a compiled document must be named"
        );
    }
}
