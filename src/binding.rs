use std::collections::HashMap;

use crate::rules::ComponentId;
use crate::tree::{BindingKind, Element, Reference, Tag, Tree};

/// How a local name was introduced by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// The module the name was imported from.
    pub source: String,

    /// The exported name; `default` or `*` for default and namespace imports.
    pub imported: String,

    /// The local alias.
    pub local: String,

    /// How the name was bound.
    pub kind: BindingKind,

    /// Whether the binding is type-only and so can't be used as a value.
    pub type_only: bool,
}

/// Maps each local alias in a file to the import that introduced it.
///
/// The table is derived from a [`Tree`] and is never kept across passes: a pass that moves
/// an import changes what later passes must see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    bindings: HashMap<String, ImportBinding>,
}

impl BindingTable {
    /// Walks the import declarations of `tree`. A later import of the same alias replaces an
    /// earlier one, and aliases re-declared at module level by something other than an import
    /// are dropped since the import no longer reaches any usage.
    pub fn resolve(tree: &Tree) -> Self {
        let mut bindings = HashMap::new();
        for decl in &tree.imports {
            for specifier in &decl.specifiers {
                bindings.insert(
                    specifier.local.clone(),
                    ImportBinding {
                        source: decl.source.value.clone(),
                        imported: specifier.imported.clone(),
                        local: specifier.local.clone(),
                        kind: specifier.kind,
                        type_only: decl.type_only || specifier.type_only,
                    },
                );
            }
        }

        for local in &tree.module_locals {
            if bindings.remove(local).is_some() {
                tracing::debug!(local = %local, "import shadowed by a module-level declaration");
            }
        }

        Self { bindings }
    }

    /// Looks up the binding of a local alias.
    pub fn get(&self, local: &str) -> Option<&ImportBinding> {
        self.bindings.get(local)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the file imports nothing.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether some binding imports `name` from `module`, so a pass targeting that component
    /// has anything to do.
    pub fn imports(&self, target: &ComponentId) -> bool {
        self.bindings.values().any(|binding| {
            binding.source == target.module
                && (binding.imported == target.name || binding.kind == BindingKind::Namespace)
        })
    }

    /// Resolves a tag reference to the component it names, if it names an imported one.
    ///
    /// `Button` resolves through a named or default binding, `Lab.Button` through a namespace
    /// binding. Shadowed references and type-only bindings never resolve.
    pub fn resolve_reference(&self, reference: &Reference) -> Option<ComponentId> {
        if reference.shadowed {
            return None;
        }

        let binding = self.bindings.get(&reference.root)?;
        if binding.type_only {
            return None;
        }

        match (binding.kind, reference.members.as_slice()) {
            (BindingKind::Named | BindingKind::Default, []) => Some(ComponentId::new(
                binding.source.clone(),
                binding.imported.clone(),
            )),
            (BindingKind::Namespace, [member]) => {
                Some(ComponentId::new(binding.source.clone(), member.clone()))
            }
            _ => None,
        }
    }

    /// Resolves the tag of an element.
    pub fn resolve_element(&self, element: &Element) -> Option<ComponentId> {
        match &element.tag {
            Tag::Reference(reference) => self.resolve_reference(reference),
            Tag::Intrinsic(_) => None,
        }
    }

    /// Returns the indices of the elements that resolve to `target` and, when `scope` is set,
    /// are nested inside an element resolving to `scope`.
    pub fn usages(
        &self,
        tree: &Tree,
        target: &ComponentId,
        scope: Option<&ComponentId>,
    ) -> Vec<usize> {
        tree.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| self.resolve_element(element).as_ref() == Some(target))
            .filter(|(_, element)| match scope {
                Some(scope) => self.within(tree, element, scope),
                None => true,
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn within(&self, tree: &Tree, element: &Element, scope: &ComponentId) -> bool {
        let mut parent = element.parent;
        while let Some(index) = parent {
            let Some(ancestor) = tree.elements.get(index) else {
                return false;
            };
            if self.resolve_element(ancestor).as_ref() == Some(scope) {
                return true;
            }
            parent = ancestor.parent;
        }
        false
    }
}
