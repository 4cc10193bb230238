use std::fmt::Display;

use crate::binding::BindingTable;
use crate::diagnostic::Report;
use crate::error::PassError;
use crate::relocate::ImportRelocation;
use crate::rename_prop::PropertyRename;
use crate::rename_value::PropertyValueRename;
use crate::rules::{Change, RenameRule};
use crate::tree::Tree;

/// The declared order in which kinds of passes run.
///
/// Relocating an import changes which module a later pass's binding table reports for a
/// local name, so every relocation must have happened before any property pass resolves
/// its target. Renaming a key changes which attribute a value pass looks at, so keys come
/// before values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Import relocation.
    Imports,

    /// Property key renames.
    Keys,

    /// Property value renames.
    Values,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Imports => write!(f, "import relocation"),
            Stage::Keys => write!(f, "property rename"),
            Stage::Values => write!(f, "property value rename"),
        }
    }
}

/// One rewrite stage.
///
/// A pass is a function from a tree to a new tree. Running a pass a second time, with a
/// binding table recomputed from its output, must not change anything.
pub trait Pass: Send + Sync {
    /// The stage this pass belongs to.
    fn stage(&self) -> Stage;

    /// The rule this pass carries out.
    fn rule(&self) -> &RenameRule;

    /// Rewrites `tree`. `bindings` must have been resolved from `tree`.
    fn apply(
        &self,
        tree: Tree,
        bindings: &BindingTable,
        report: &mut Report,
    ) -> Result<Tree, PassError>;
}

/// Builds the pass that carries out `rule`.
pub fn for_rule(rule: &RenameRule) -> Box<dyn Pass> {
    match &rule.change {
        Change::ImportRelocation { from, to } => Box::new(ImportRelocation::new(
            rule.clone(),
            from.clone(),
            to.clone(),
        )),
        Change::PropertyKey { from, to } => Box::new(PropertyRename::new(
            rule.clone(),
            from.clone(),
            to.clone(),
        )),
        Change::PropertyValue {
            attribute,
            from,
            to,
        } => Box::new(PropertyValueRename::new(
            rule.clone(),
            attribute.clone(),
            from.clone(),
            to.clone(),
        )),
    }
}
