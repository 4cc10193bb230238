use tracing::debug;

use crate::binding::BindingTable;
use crate::diagnostic::{DiagnosticKind, Report};
use crate::error::PassError;
use crate::pass::{Pass, Stage};
use crate::rules::RenameRule;
use crate::tree::{AttrValue, Attribute, Tree};

/// Renames one literal value of an attribute on every usage of the target component.
///
/// String literals are rewritten in place, including the entries of responsive object
/// values such as `size={{ mobile: 'small', desktop: 'large' }}`. Values that can't be
/// known statically are left alone and reported.
pub struct PropertyValueRename {
    rule: RenameRule,
    attribute: String,
    from: String,
    to: String,
}

impl PropertyValueRename {
    /// Creates the pass renaming value `from` of `attribute` to `to`.
    pub fn new(rule: RenameRule, attribute: String, from: String, to: String) -> Self {
        Self {
            rule,
            attribute,
            from,
            to,
        }
    }

    fn rewrite(&self, value: &mut AttrValue, label: &str, report: &mut Report) {
        match value {
            AttrValue::Str(lit) => {
                if lit.value == self.from {
                    debug!(attribute = %self.attribute, from = %self.from, to = %self.to, "renaming value");
                    lit.value = self.to.clone();
                }
            }
            AttrValue::Object(entries) => {
                for entry in entries.iter_mut() {
                    self.rewrite(&mut entry.value, label, report);
                }
            }
            AttrValue::Dynamic(span) => report.flag(
                label,
                DiagnosticKind::DynamicValue,
                *span,
                format!(
                    "`{}` is not a literal; replace `{}` with `{}` by hand if it can be",
                    self.attribute, self.from, self.to
                ),
            ),
            AttrValue::Absent | AttrValue::Literal(_) | AttrValue::Element(_) => {}
        }
    }
}

impl Pass for PropertyValueRename {
    fn stage(&self) -> Stage {
        Stage::Values
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
        let usages = bindings.usages(&tree, &self.rule.target, self.rule.scope.as_ref());
        let label = self.rule.label();

        for index in usages {
            let element = tree
                .elements
                .get_mut(index)
                .ok_or(PassError::MissingElement(index))?;

            // later attributes override spreads that come before them
            let last_explicit = element.attrs.iter().rposition(
                |attr| matches!(attr, Attribute::Prop(prop) if prop.key.name == self.attribute),
            );

            for (position, attr) in element.attrs.iter_mut().enumerate() {
                match attr {
                    Attribute::Prop(prop) if prop.key.name == self.attribute => {
                        self.rewrite(&mut prop.value, &label, report)
                    }
                    Attribute::Prop(_) => {}
                    Attribute::Spread(span) => {
                        if last_explicit.map_or(true, |last| last < position) {
                            report.flag(
                                &label,
                                DiagnosticKind::DynamicValue,
                                *span,
                                format!("spread props may set `{}`", self.attribute),
                            );
                        }
                    }
                }
            }
        }

        Ok(tree)
    }
}
