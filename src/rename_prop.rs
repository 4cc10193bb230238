use tracing::debug;

use crate::binding::BindingTable;
use crate::diagnostic::{DiagnosticKind, Report};
use crate::error::PassError;
use crate::pass::{Pass, Stage};
use crate::rules::RenameRule;
use crate::tree::{Attribute, Tree};

/// Renames an attribute key on every usage of the target component.
pub struct PropertyRename {
    rule: RenameRule,
    from: String,
    to: String,
}

impl PropertyRename {
    /// Creates the pass renaming `from` to `to`.
    pub fn new(rule: RenameRule, from: String, to: String) -> Self {
        Self { rule, from, to }
    }
}

impl Pass for PropertyRename {
    fn stage(&self) -> Stage {
        Stage::Keys
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
            if !element.has_prop(&self.from) {
                continue;
            }

            if element.has_prop(&self.to) {
                // the key already set under the new name wins
                let dropped: Vec<_> = element.props_named(&self.from).map(|p| p.span).collect();
                for span in dropped {
                    report.flag(
                        &label,
                        DiagnosticKind::ConflictingKey,
                        span,
                        format!(
                            "`{}` is already set, dropped `{}`; check the intended value",
                            self.to, self.from
                        ),
                    );
                }
                element.attrs.retain(|attr| {
                    !matches!(attr, Attribute::Prop(prop) if prop.key.name == self.from)
                });
                continue;
            }

            for attr in element.attrs.iter_mut() {
                if let Attribute::Prop(prop) = attr {
                    if prop.key.name == self.from {
                        debug!(element = index, from = %self.from, to = %self.to, "renaming property");
                        prop.key.name = self.to.clone();
                    }
                }
            }
        }

        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ComponentId;
    use crate::testing::*;
    use crate::tree::AttrValue;

    fn rename(source: &str) -> (Tree, Report) {
        let rule = RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize");
        apply_helper(&rule, parse_helper(source))
    }

    fn keys(tree: &Tree, index: usize) -> Vec<String> {
        tree.elements[index]
            .attrs
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Prop(prop) => Some(prop.key.name.clone()),
                Attribute::Spread(_) => None,
            })
            .collect()
    }

    #[test]
    fn renames_key() {
        let (tree, report) = rename("import { Button } from 'lib';\n<Button size=\"lg\" onClick={go} />");
        assert_eq!(keys(&tree, 0), ["buttonSize", "onClick"]);
        let Attribute::Prop(prop) = &tree.elements[0].attrs[0] else {
            panic!("expected a prop");
        };
        assert!(matches!(&prop.value, AttrValue::Str(s) if s.value == "lg"));
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn other_components() {
        let source = "import { Button } from 'elsewhere';\nimport { Card } from 'lib';\n<><Button size=\"lg\" /><Card size=\"lg\" /></>";
        let (tree, _) = rename(source);
        assert_eq!(tree, parse_helper(source));
    }

    #[test]
    fn existing_key_wins() {
        let (tree, report) =
            rename("import { Button } from 'lib';\n<Button size=\"lg\" buttonSize=\"sm\" />");
        assert_eq!(keys(&tree, 0), ["buttonSize"]);
        assert_eq!(report.diagnostics().len(), 1);
        assert_eq!(report.diagnostics()[0].kind, DiagnosticKind::ConflictingKey);
    }

    #[test]
    fn idempotent() {
        let (once, _) = rename("import { Button } from 'lib';\n<Button size=\"lg\" />");
        let rule = RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize");
        let (twice, report) = apply_helper(&rule, once.clone());
        assert_eq!(once, twice);
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn scoped() {
        let rule = RenameRule::rename_key(ComponentId::new("lib", "Item"), "label", "title")
            .within(ComponentId::new("lib", "Menu"));
        let (tree, _) = apply_helper(
            &rule,
            parse_helper(
                "import { Item, Menu } from 'lib';\n<><Item label=\"a\" /><Menu><Item label=\"b\" /></Menu></>",
            ),
        );
        assert_eq!(keys(&tree, 0), ["label"]);
        assert_eq!(keys(&tree, 2), ["title"]);
    }
}
