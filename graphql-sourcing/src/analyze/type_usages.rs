use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use indexmap::IndexMap;
use tracing::warn;

use super::FragmentMap;
use crate::ast::compare::same_selection_set;
use crate::ast::compare::selection_includes;
use crate::ast::response_key;
use crate::schema::RemoteSchema;

/// Type name to usage path to the selections made on that type at that path.
///
/// A usage path is the name of the custom fragment the selections were found in, followed by the
/// response key of every field leading to them, joined with `__` (`Post__author__avatar`).
pub(crate) type TypeUsagesMap = IndexMap<Name, IndexMap<String, Vec<Selection>>>;

/// Collects where custom fragments select from types that can be referenced by identity.
///
/// The top-level selections of a fragment are recorded under the fragment name, unless the
/// fragment is defined on a root operation type. Below that, selections are only recorded for
/// fields and inline fragments whose type is in `references`.
pub(crate) fn build_type_usages_map(
    schema: &RemoteSchema,
    fragments: &[Node<ast::FragmentDefinition>],
    references: &FragmentMap,
) -> TypeUsagesMap {
    let mut collector = Collector {
        schema,
        references,
        usages: TypeUsagesMap::new(),
    };
    for fragment in fragments {
        let path = fragment.name.to_string();
        if !schema.is_root_type(&fragment.type_condition) {
            collector.record(&fragment.type_condition, &path, &fragment.selection_set);
        }
        collector.collect(&fragment.type_condition, &path, &fragment.selection_set);
    }

    let mut usages = collector.usages;
    for type_usages in usages.values_mut() {
        let mut seen: Vec<Vec<Selection>> = Vec::new();
        type_usages.retain(|_, selections| {
            if seen.iter().any(|other| same_selection_set(other, selections)) {
                return false;
            }
            seen.push(selections.clone());
            true
        });
    }
    usages
}

struct Collector<'a> {
    schema: &'a RemoteSchema,
    references: &'a FragmentMap,
    usages: TypeUsagesMap,
}

impl Collector<'_> {
    fn record(&mut self, type_name: &Name, path: &str, selections: &[Selection]) {
        let recorded = self
            .usages
            .entry(type_name.clone())
            .or_default()
            .entry(path.to_string())
            .or_default();
        for selection in selections {
            let already_recorded = recorded.iter().any(|existing| {
                selection_includes(existing, selection) && selection_includes(selection, existing)
            });
            if !already_recorded {
                recorded.push(selection.clone());
            }
        }
    }

    fn collect(&mut self, parent_type: &Name, path: &str, selections: &[Selection]) {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let Some(field_def) = self.schema.field_definition(parent_type, &field.name)
                    else {
                        warn!(
                            parent_type = %parent_type,
                            field = %field.name,
                            "field is not defined in the remote schema"
                        );
                        continue;
                    };
                    if field.selection_set.is_empty() {
                        continue;
                    }
                    let field_type = field_def.ty.inner_named_type().clone();
                    let child_path = format!("{path}__{}", response_key(field));
                    if self.references.contains_key(&field_type) {
                        self.record(&field_type, &child_path, &field.selection_set);
                    }
                    self.collect(&field_type, &child_path, &field.selection_set);
                }
                Selection::InlineFragment(inline) => {
                    let fragment_type = inline.type_condition.as_ref().unwrap_or(parent_type);
                    if fragment_type != parent_type && self.references.contains_key(fragment_type) {
                        self.record(fragment_type, path, &inline.selection_set);
                    }
                    let fragment_type = fragment_type.clone();
                    self.collect(&fragment_type, path, &inline.selection_set);
                }
                Selection::FragmentSpread(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::analyze::build_node_reference_fragment_map;
    use crate::ast::fragments;
    use crate::entity::EntityTypeDeclaration;
    use crate::entity::parse_declarations;

    const SDL: &str = "
        type Query { posts: [Post] users: [User] }
        type Post { id: ID title: String author: User meta: Meta }
        type User { id: ID firstName: String email: String recentPosts: [Post] }
        type Meta { author: User }
    ";

    fn usages(custom_fragments: &str) -> TypeUsagesMap {
        let schema = RemoteSchema::parse(SDL, "schema.graphql").unwrap();
        let entities = parse_declarations(
            &schema,
            &[
                EntityTypeDeclaration::new("Post", "fragment PostId on Post { id }"),
                EntityTypeDeclaration::new("User", "fragment UserId on User { id }"),
            ],
        )
        .unwrap();
        let references = build_node_reference_fragment_map(&schema, &entities);
        let document = ast::Document::parse(custom_fragments, "fragments.graphql").unwrap();
        let custom = fragments(&document).cloned().collect::<Vec<_>>();
        build_type_usages_map(&schema, &custom, &references)
    }

    fn printed(usages: &TypeUsagesMap, type_name: &str) -> Vec<(String, String)> {
        usages
            .get(type_name)
            .into_iter()
            .flatten()
            .map(|(path, selections)| {
                let printed = selections
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                (path.clone(), printed.split_whitespace().collect::<Vec<_>>().join(" "))
            })
            .collect()
    }

    #[test]
    fn records_nested_entity_selections_by_path() {
        let usages = usages(
            "
            fragment Post on Post { title author { firstName email } meta { author { email } } }
            fragment User on User { recentPosts { title } }
            ",
        );
        assert_eq!(
            printed(&usages, "Post"),
            [
                ("Post".to_string(), "title author { firstName email } meta { author { email } }".to_string()),
                ("User__recentPosts".to_string(), "title".to_string()),
            ]
        );
        assert_eq!(
            printed(&usages, "User"),
            [
                ("Post__author".to_string(), "firstName email".to_string()),
                ("Post__meta__author".to_string(), "email".to_string()),
                ("User".to_string(), "recentPosts { title }".to_string()),
            ]
        );
        assert!(!usages.contains_key("Meta"));
    }

    #[test]
    fn identical_usages_are_recorded_once() {
        let usages = usages(
            "
            fragment Post on Post { author { email } meta { author { email } } }
            ",
        );
        assert_eq!(
            printed(&usages, "User"),
            [("Post__author".to_string(), "email".to_string())]
        );
    }

    #[test]
    fn root_fragments_are_not_recorded() {
        let usages = usages("fragment Everything on Query { posts { title } }");
        assert!(!usages.contains_key("Query"));
        assert_eq!(
            printed(&usages, "Post"),
            [("Everything__posts".to_string(), "title".to_string())]
        );
    }

    #[test]
    fn aliased_fields_use_their_response_key() {
        let usages = usages("fragment Post on Post { writer: author { email } }");
        assert_eq!(
            printed(&usages, "User"),
            [("Post__writer".to_string(), "email".to_string())]
        );
    }
}
