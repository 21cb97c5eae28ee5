use apollo_compiler::Name;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Deserializer;

use crate::error::ConfigurationError;

pub(crate) const TYPENAME_FIELD: &str = "__typename";

const DEFAULT_FIELD_ALIASES: [(&str, &str); 5] = [
    (TYPENAME_FIELD, "remoteTypeName"),
    ("id", "remoteId"),
    ("internal", "remoteInternal"),
    ("children", "remoteChildren"),
    ("parent", "remoteParent"),
];

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_FIELD_PATH_DEPTH: usize = 10;

/// Settings threaded through compilation and fetching.
///
/// Nothing in this crate reads the process environment; callers resolve their settings once and
/// pass them in here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcingConfig {
    /// Reserved aliases given to identity-infrastructure fields of entity types, so that they never
    /// collide with the fields a record sink reserves for itself.
    ///
    /// Entries supplied by the caller are merged over the defaults: `__typename` is aliased to
    /// `remoteTypeName`, `id` to `remoteId`, `internal` to `remoteInternal`, `children` to
    /// `remoteChildren` and `parent` to `remoteParent`.
    pub field_aliases: FieldAliases,

    /// Number of items requested per page by the built-in pagination strategies.
    ///
    /// Defaults to 100.
    pub page_size: u64,

    /// Upper bound of entity types fetched at the same time by
    /// [`fetch_all_nodes`](crate::fetch::fetch_all_nodes).
    ///
    /// Defaults to 5.
    pub concurrency: usize,

    /// How deep the search for a paginated field or a node field may descend into an operation.
    ///
    /// Defaults to 10.
    pub max_field_path_depth: usize,
}

impl Default for SourcingConfig {
    fn default() -> Self {
        Self {
            field_aliases: FieldAliases::default(),
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            max_field_path_depth: DEFAULT_MAX_FIELD_PATH_DEPTH,
        }
    }
}

/// Field name to reserved alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases(IndexMap<String, String>);

impl Default for FieldAliases {
    fn default() -> Self {
        Self(
            DEFAULT_FIELD_ALIASES
                .iter()
                .map(|(field, alias)| (field.to_string(), alias.to_string()))
                .collect(),
        )
    }
}

impl FieldAliases {
    /// Default aliases with `overrides` merged on top.
    pub fn with_overrides<K, V>(overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut aliases = Self::default();
        aliases.0.extend(
            overrides
                .into_iter()
                .map(|(field, alias)| (field.into(), alias.into())),
        );
        aliases
    }

    pub fn get(&self, field_name: &str) -> Option<&str> {
        self.0.get(field_name).map(String::as_str)
    }

    /// The alias of the type discriminator field.
    pub fn typename(&self) -> &str {
        self.get(TYPENAME_FIELD).unwrap_or(TYPENAME_FIELD)
    }

    /// The key under which `field_name` appears in fetched records of entity types.
    pub fn response_key<'a>(&'a self, field_name: &'a str) -> &'a str {
        self.get(field_name).unwrap_or(field_name)
    }

    pub(crate) fn alias_name(&self, field_name: &str) -> Result<Option<Name>, ConfigurationError> {
        self.get(field_name)
            .map(|alias| Name::new(alias).map_err(|_| ConfigurationError::InvalidName(alias.into())))
            .transpose()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(field, alias)| (field.as_str(), alias.as_str()))
    }
}

impl<'de> Deserialize<'de> for FieldAliases {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let overrides = IndexMap::<String, String>::deserialize(deserializer)?;
        Ok(Self::with_overrides(overrides))
    }
}
