use apollo_compiler::Name;
use apollo_compiler::ast;
use apollo_compiler::ast::Selection;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::ast::document;
use crate::error::CompileError;
use crate::error::ConfigurationError;

/// Keeps the operations of `input` and the fragments they reach, directly or through other
/// fragments. Other definitions are dropped.
pub(crate) fn remove_unused_fragments(input: &ast::Document) -> Result<ast::Document, CompileError> {
    let mut spreads_by_definition: IndexMap<Name, Vec<Name>> = IndexMap::new();
    let mut pending = Vec::new();
    for definition in &input.definitions {
        match definition {
            ast::Definition::OperationDefinition(operation) => {
                if operation.name.is_none() {
                    return Err(ConfigurationError::UnnamedOperation.into());
                }
                collect_spreads(&operation.selection_set, &mut pending);
            }
            ast::Definition::FragmentDefinition(fragment) => {
                let mut spreads = Vec::new();
                collect_spreads(&fragment.selection_set, &mut spreads);
                spreads_by_definition.insert(fragment.name.clone(), spreads);
            }
            _ => {}
        }
    }

    let mut used = IndexSet::new();
    while let Some(fragment_name) = pending.pop() {
        if !used.insert(fragment_name.clone()) {
            continue;
        }
        if let Some(spreads) = spreads_by_definition.get(&fragment_name) {
            pending.extend(spreads.iter().cloned());
        }
    }

    let operations = input
        .definitions
        .iter()
        .filter(|definition| matches!(definition, ast::Definition::OperationDefinition(_)));
    let fragments = input.definitions.iter().filter(|definition| {
        matches!(definition, ast::Definition::FragmentDefinition(fragment) if used.contains(&fragment.name))
    });
    Ok(document(operations.chain(fragments).cloned()))
}

pub(crate) fn collect_spreads(selections: &[Selection], spreads: &mut Vec<Name>) {
    for selection in selections {
        match selection {
            Selection::Field(field) => collect_spreads(&field.selection_set, spreads),
            Selection::FragmentSpread(spread) => spreads.push(spread.fragment_name.clone()),
            Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, spreads),
        }
    }
}
