//! Read-only view of the remote schema.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::ast::NamedType;
use apollo_compiler::ast::OperationType;
use apollo_compiler::ast::Type;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;

use crate::error::CompileError;

/// The remote schema, as supplied by the schema provider.
///
/// Never mutated: compilation only looks types, fields and possible types up.
#[derive(Debug, Clone)]
pub struct RemoteSchema {
    schema: Valid<Schema>,
}

impl RemoteSchema {
    pub fn new(schema: Valid<Schema>) -> Self {
        Self { schema }
    }

    /// Parses and validates SDL.
    pub fn parse(sdl: &str, path: &str) -> Result<Self, CompileError> {
        let schema = Schema::parse_and_validate(sdl, path)
            .map_err(|errors| CompileError::syntax(path, errors))?;
        Ok(Self::new(schema))
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn get_type(&self, name: &str) -> Option<&ExtendedType> {
        self.schema.types.get(name)
    }

    pub fn is_object(&self, name: &str) -> bool {
        matches!(self.get_type(name), Some(ExtendedType::Object(_)))
    }

    pub fn is_interface(&self, name: &str) -> bool {
        matches!(self.get_type(name), Some(ExtendedType::Interface(_)))
    }

    pub fn is_union(&self, name: &str) -> bool {
        matches!(self.get_type(name), Some(ExtendedType::Union(_)))
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        matches!(
            self.get_type(name),
            Some(ExtendedType::Interface(_) | ExtendedType::Union(_))
        )
    }

    /// Object, interface or union.
    pub fn is_composite(&self, name: &str) -> bool {
        matches!(
            self.get_type(name),
            Some(ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_))
        )
    }

    /// Concrete object types a value of type `name` may have.
    ///
    /// An object type is its own only possible type. Interface implementors are listed in schema
    /// order, union members in declaration order.
    pub fn possible_types(&self, name: &str) -> Vec<Name> {
        match self.get_type(name) {
            Some(ExtendedType::Object(object)) => vec![object.name.clone()],
            Some(ExtendedType::Interface(_)) => self
                .schema
                .types
                .values()
                .filter_map(|ty| match ty {
                    ExtendedType::Object(object)
                        if object
                            .implements_interfaces
                            .iter()
                            .any(|implemented| implemented.name.as_str() == name) =>
                    {
                        Some(object.name.clone())
                    }
                    _ => None,
                })
                .collect(),
            Some(ExtendedType::Union(union_)) => union_
                .members
                .iter()
                .map(|member| member.name.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true if an object of type `object` may appear where `name` is expected.
    pub fn is_possible_type(&self, name: &str, object: &str) -> bool {
        name == object || self.possible_types(name).iter().any(|ty| ty.as_str() == object)
    }

    /// Interfaces implemented by an object or interface type.
    pub fn interfaces(&self, name: &str) -> Vec<Name> {
        match self.get_type(name) {
            Some(ExtendedType::Object(object)) => object
                .implements_interfaces
                .iter()
                .map(|implemented| implemented.name.clone())
                .collect(),
            Some(ExtendedType::Interface(interface)) => interface
                .implements_interfaces
                .iter()
                .map(|implemented| implemented.name.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Explicit fields of an object or interface type, in declaration order.
    pub fn fields(&self, name: &str) -> Option<&IndexMap<Name, Component<FieldDefinition>>> {
        match self.get_type(name)? {
            ExtendedType::Object(object) => Some(&object.fields),
            ExtendedType::Interface(interface) => Some(&interface.fields),
            _ => None,
        }
    }

    /// Definition of an explicit field or meta-field.
    pub fn field_definition(&self, parent_type: &str, field_name: &str) -> Option<&Node<FieldDefinition>> {
        self.schema
            .type_field(parent_type, field_name)
            .ok()
            .map(|component| &component.node)
    }

    pub fn has_field(&self, parent_type: &str, field_name: &str) -> bool {
        self.fields(parent_type)
            .is_some_and(|fields| fields.contains_key(field_name))
    }

    /// Declared type of an input object field.
    pub fn input_field_type(&self, input_object: &str, field_name: &str) -> Option<&Type> {
        match self.get_type(input_object)? {
            ExtendedType::InputObject(input) => input.fields.get(field_name).map(|field| &*field.ty),
            _ => None,
        }
    }

    pub fn root_type(&self, operation_type: OperationType) -> Option<&NamedType> {
        self.schema.root_operation(operation_type)
    }

    /// Returns true for the query or mutation root type.
    pub fn is_root_type(&self, name: &str) -> bool {
        [OperationType::Query, OperationType::Mutation]
            .into_iter()
            .filter_map(|operation_type| self.root_type(operation_type))
            .any(|root| root.as_str() == name)
    }
}
