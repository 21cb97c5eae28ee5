use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use apollo_compiler::ast::Type;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::ast::find_fragment;
use crate::ast::variable_definition;
use crate::error::CompileError;
use crate::error::ConfigurationError;
use crate::schema::RemoteSchema;

/// Declares every variable an operation uses, fragments it reaches included.
///
/// Variables may appear in field or directive arguments, nested in input object or list
/// literals: `allFoo(filter: { limit: $limit })` declares `$limit` with the type of the `limit`
/// field of the filter input object. Existing definitions are kept, inferred ones are appended in
/// first-usage order.
pub(crate) fn add_variable_definitions(
    schema: &RemoteSchema,
    document: &ast::Document,
) -> Result<ast::Document, CompileError> {
    let mut definitions = Vec::with_capacity(document.definitions.len());
    for definition in &document.definitions {
        let ast::Definition::OperationDefinition(operation) = definition else {
            definitions.push(definition.clone());
            continue;
        };
        let root_type = schema
            .root_type(operation.operation_type)
            .ok_or_else(|| {
                ConfigurationError::UnknownType(format!("{:?} root", operation.operation_type))
            })?
            .clone();

        let mut collector = VariableCollector {
            schema,
            document,
            visited_fragments: IndexSet::new(),
            variables: IndexMap::new(),
        };
        collector.selection_set(&root_type, &operation.selection_set);

        let mut operation = operation.as_ref().clone();
        for (name, ty) in collector.variables {
            let declared = operation
                .variables
                .iter()
                .any(|variable| variable.name == name);
            if !declared {
                operation.variables.push(variable_definition(name, ty));
            }
        }
        definitions.push(ast::Definition::OperationDefinition(Node::new(operation)));
    }

    let mut output = document.clone();
    output.definitions = definitions;
    Ok(output)
}

struct VariableCollector<'a> {
    schema: &'a RemoteSchema,
    document: &'a ast::Document,
    visited_fragments: IndexSet<Name>,
    variables: IndexMap<Name, Type>,
}

impl VariableCollector<'_> {
    fn selection_set(&mut self, parent_type: &Name, selections: &[Selection]) {
        let schema = self.schema;
        let document = self.document;
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    self.directives(&field.directives);
                    let Some(field_def) = schema.field_definition(parent_type, &field.name)
                    else {
                        continue;
                    };
                    for argument in &field.arguments {
                        if let Some(argument_def) = field_def
                            .arguments
                            .iter()
                            .find(|argument_def| argument_def.name == argument.name)
                        {
                            self.value(&argument.value, &argument_def.ty);
                        }
                    }
                    let field_type = field_def.ty.inner_named_type().clone();
                    self.selection_set(&field_type, &field.selection_set);
                }
                Selection::InlineFragment(inline) => {
                    self.directives(&inline.directives);
                    let fragment_type = inline
                        .type_condition
                        .clone()
                        .unwrap_or_else(|| parent_type.clone());
                    self.selection_set(&fragment_type, &inline.selection_set);
                }
                Selection::FragmentSpread(spread) => {
                    self.directives(&spread.directives);
                    if !self.visited_fragments.insert(spread.fragment_name.clone()) {
                        continue;
                    }
                    if let Some(fragment) = find_fragment(document, &spread.fragment_name) {
                        self.selection_set(&fragment.type_condition, &fragment.selection_set);
                    }
                }
            }
        }
    }

    fn directives(&mut self, directives: &ast::DirectiveList) {
        let schema = self.schema;
        for directive in directives.iter() {
            let Some(directive_def) = schema.schema().directive_definitions.get(&directive.name)
            else {
                continue;
            };
            for argument in &directive.arguments {
                if let Some(argument_def) = directive_def
                    .arguments
                    .iter()
                    .find(|argument_def| argument_def.name == argument.name)
                {
                    self.value(&argument.value, &argument_def.ty);
                }
            }
        }
    }

    /// Records the variables of `value`, expected to be of type `ty`.
    fn value(&mut self, value: &ast::Value, ty: &Type) {
        match value {
            ast::Value::Variable(name) => {
                self.variables
                    .entry(name.clone())
                    .or_insert_with(|| ty.clone());
            }
            ast::Value::List(items) => {
                let item_type = match ty {
                    Type::List(item_type) | Type::NonNullList(item_type) => item_type.as_ref(),
                    // a single value is coerced to a list of one item
                    _ => ty,
                };
                for item in items {
                    self.value(item, item_type);
                }
            }
            ast::Value::Object(fields) => {
                let schema = self.schema;
                let input_type = ty.inner_named_type();
                for (name, field_value) in fields {
                    if let Some(field_type) = schema.input_field_type(input_type, name) {
                        self.value(field_value, field_type);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SDL: &str = "
        type Query {
          allFoo(limit: Int = 10, offset: Int = 0): [Foo]
          allBar(page: Page, ids: [ID!]): [Bar]
          foo(id: ID!): Foo
        }
        input Page { pageNumber: Int perPage: Int filter: Filter }
        input Filter { tags: [String!] }
        type Foo { id: ID items(first: Int, after: String): [Bar] }
        type Bar { id: ID }
    ";

    fn declared(source: &str) -> String {
        let schema = RemoteSchema::parse(SDL, "schema.graphql").unwrap();
        let input = ast::Document::parse(source, "queries.graphql").unwrap();
        add_variable_definitions(&schema, &input)
            .unwrap()
            .to_string()
    }

    fn normalize(source: &str) -> String {
        ast::Document::parse(source, "expected.graphql")
            .unwrap()
            .to_string()
    }

    #[test]
    fn declares_argument_variables_in_first_usage_order() {
        assert_eq!(
            declared("query LIST_Foo { allFoo(offset: $offset, limit: $limit) { id } }"),
            normalize(
                "query LIST_Foo($offset: Int, $limit: Int) { allFoo(offset: $offset, limit: $limit) { id } }"
            )
        );
    }

    #[test]
    fn declares_nested_input_variables() {
        assert_eq!(
            declared(
                "query LIST_Bar { allBar(page: { perPage: $perPage, filter: { tags: [$tag] } }, ids: $ids) { id } }"
            ),
            normalize(
                "
                query LIST_Bar($perPage: Int, $tag: String!, $ids: [ID!]) {
                  allBar(page: { perPage: $perPage, filter: { tags: [$tag] } }, ids: $ids) { id }
                }
                "
            )
        );
    }

    #[test]
    fn follows_fragments_and_keeps_declared_variables() {
        assert_eq!(
            declared(
                "
                query PAGINATE_Foo_items($id: ID!) { foo(id: $id) { ...FooItems } }
                fragment FooItems on Foo { items(first: $first, after: $after) @include(if: $withItems) { id } }
                "
            ),
            normalize(
                "
                query PAGINATE_Foo_items($id: ID!, $withItems: Boolean!, $first: Int, $after: String) {
                  foo(id: $id) { ...FooItems }
                }
                fragment FooItems on Foo { items(first: $first, after: $after) @include(if: $withItems) { id } }
                "
            )
        );
    }
}
