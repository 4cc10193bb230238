use std::collections::HashMap;

use crate::tree::{Attribute, Element, Tree};

/// Number of keyed attributes that repeat an earlier key of the same element.
fn repeated_keys(element: &Element) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for attr in &element.attrs {
        if let Attribute::Prop(prop) = attr {
            *counts.entry(prop.key.name.as_str()).or_insert(0) += 1;
        }
    }
    counts.values().map(|count| count - 1).sum()
}

/// Checks a rewritten [`Tree`] against the tree it was derived from before it is printed.
///
/// Passes only ever relocate, rename or drop nodes, so a rewritten tree must still describe
/// the same elements, every import must come from a parsed declaration and keep at least one
/// specifier, and no rename may make an element repeat a key more often than it did.
pub fn validate(original: &Tree, rewritten: &Tree) -> Result<(), String> {
    for decl in &rewritten.imports {
        let Some(parsed) = original
            .imports
            .iter()
            .find(|parsed| parsed.origin == decl.origin)
        else {
            return Err(format!(
                "import of `{}` has no parsed declaration",
                decl.source.value
            ));
        };

        if decl.specifiers.is_empty() && !parsed.specifiers.is_empty() {
            return Err(format!(
                "import of `{}` was left without specifiers",
                decl.source.value
            ));
        }
    }

    if original.elements.len() != rewritten.elements.len() {
        return Err(format!(
            "element count changed from {} to {}",
            original.elements.len(),
            rewritten.elements.len()
        ));
    }

    for (before, after) in original.elements.iter().zip(&rewritten.elements) {
        if before.span != after.span || before.tag != after.tag {
            return Err(format!("element at {} was replaced", before.span.lo));
        }

        if repeated_keys(after) > repeated_keys(before) {
            return Err(format!(
                "element at {} repeats an attribute key",
                after.span.lo
            ));
        }
    }

    Ok(())
}
