//! Schema-aware analysis of identity fragments and custom fragments, shared by the compilers.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexMap;

pub(crate) mod node_references;
pub(crate) mod type_usages;

pub(crate) use node_references::build_node_reference_fragment_map;
pub(crate) use type_usages::TypeUsagesMap;
pub(crate) use type_usages::build_type_usages_map;

/// Type name to fragment on that type.
pub(crate) type FragmentMap = IndexMap<Name, Node<ast::FragmentDefinition>>;
