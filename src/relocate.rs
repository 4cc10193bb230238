use tracing::debug;

use crate::binding::BindingTable;
use crate::diagnostic::{DiagnosticKind, Report};
use crate::error::PassError;
use crate::pass::{Pass, Stage};
use crate::rules::{ComponentId, RenameRule};
use crate::tree::{BindingKind, ImportDecl, ImportSpecifier, Tag, Tree};

/// Moves the import of one component from an old module to a new one.
///
/// Only the specifiers binding the component move. If the old declaration still has other
/// specifiers it keeps them and the moved ones get a declaration of their own right after
/// it; otherwise the declaration simply points at the new module.
pub struct ImportRelocation {
    rule: RenameRule,
    from: String,
    to: String,
}

impl ImportRelocation {
    /// Creates the pass for a relocation rule from `from` to `to`.
    pub fn new(rule: RenameRule, from: String, to: String) -> Self {
        Self { rule, from, to }
    }

    fn moves(&self, specifier: &ImportSpecifier, bindings: &BindingTable) -> bool {
        specifier.kind != BindingKind::Namespace
            && specifier.imported == self.rule.target.name
            && bindings.get(&specifier.local).map_or(false, |binding| {
                binding.source == self.from && binding.imported == specifier.imported
            })
    }

    fn flag_namespace_members(&self, tree: &Tree, bindings: &BindingTable, report: &mut Report) {
        let label = self.rule.label();
        for element in &tree.elements {
            let Tag::Reference(reference) = &element.tag else {
                continue;
            };
            if reference.shadowed || reference.members != [self.rule.target.name.as_str()] {
                continue;
            }
            let Some(binding) = bindings.get(&reference.root) else {
                continue;
            };
            if binding.kind == BindingKind::Namespace && binding.source == self.from {
                report.flag(
                    &label,
                    DiagnosticKind::NamespaceImport,
                    element.span,
                    format!(
                        "`{}` is reached through `import * as {}`; import it from `{}` by hand",
                        reference, reference.root, self.to
                    ),
                );
            }
        }
    }
}

impl Pass for ImportRelocation {
    fn stage(&self) -> Stage {
        Stage::Imports
    }

    fn rule(&self) -> &RenameRule {
        &self.rule
    }

    fn apply(
        &self,
        mut tree: Tree,
        bindings: &BindingTable,
        report: &mut Report,
    ) -> Result<Tree, PassError> {
        if !bindings.imports(&ComponentId::new(self.from.as_str(), self.rule.target.name.as_str())) {
            return Ok(tree);
        }

        let mut imports = Vec::with_capacity(tree.imports.len() + 1);
        for decl in std::mem::take(&mut tree.imports) {
            if decl.source.value != self.from {
                imports.push(decl);
                continue;
            }

            let (moved, kept): (Vec<_>, Vec<_>) = decl
                .specifiers
                .iter()
                .cloned()
                .partition(|specifier| self.moves(specifier, bindings));
            if moved.is_empty() {
                imports.push(decl);
                continue;
            }

            debug!(
                name = %self.rule.target.name,
                from = %self.from,
                to = %self.to,
                split = !kept.is_empty(),
                "relocating import"
            );

            let mut relocated = ImportDecl {
                specifiers: moved,
                ..decl.clone()
            };
            relocated.source.value = self.to.clone();

            if !kept.is_empty() {
                imports.push(ImportDecl {
                    specifiers: kept,
                    ..decl
                });
            }
            imports.push(relocated);
        }
        tree.imports = imports;

        self.flag_namespace_members(&tree, bindings, report);
        Ok(tree)
    }
}
