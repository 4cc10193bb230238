use std::fmt::Display;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identifies a component by the module it is exported from and its exported name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    /// The module specifier, ie `@ui/lab`.
    pub module: String,

    /// The exported name, ie `Button`. Use `default` for a default export.
    pub name: String,
}

impl ComponentId {
    /// Creates a new [`ComponentId`].
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.module, self.name)
    }
}

/// What a rule changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Change {
    /// Moves the target's import from module `from` to module `to`.
    ImportRelocation {
        /// The old module.
        from: String,

        /// The new module.
        to: String,
    },

    /// Renames the attribute key `from` to `to` on usages of the target.
    PropertyKey {
        /// The old attribute key.
        from: String,

        /// The new attribute key.
        to: String,
    },

    /// Renames the literal value `from` of `attribute` to `to` on usages of the target.
    PropertyValue {
        /// The attribute whose value is renamed.
        attribute: String,

        /// The old value.
        from: String,

        /// The new value.
        to: String,
    },
}

/// One unit of migration intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    /// The component the rule applies to.
    #[serde(rename = "component")]
    pub target: ComponentId,

    /// The change to make.
    #[serde(flatten)]
    pub change: Change,

    /// When set, only usages nested inside this component are rewritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ComponentId>,
}

impl RenameRule {
    /// A rule moving the import of `name` from `from` to `to`.
    pub fn relocate(name: &str, from: &str, to: &str) -> Self {
        Self {
            target: ComponentId::new(from, name),
            change: Change::ImportRelocation {
                from: from.to_string(),
                to: to.to_string(),
            },
            scope: None,
        }
    }

    /// A rule renaming the attribute key `from` to `to` on `target`.
    pub fn rename_key(target: ComponentId, from: &str, to: &str) -> Self {
        Self {
            target,
            change: Change::PropertyKey {
                from: from.to_string(),
                to: to.to_string(),
            },
            scope: None,
        }
    }

    /// A rule renaming the value `from` of `attribute` to `to` on `target`.
    pub fn rename_value(target: ComponentId, attribute: &str, from: &str, to: &str) -> Self {
        Self {
            target,
            change: Change::PropertyValue {
                attribute: attribute.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            },
            scope: None,
        }
    }

    /// Restricts the rule to usages nested inside `parent`.
    pub fn within(mut self, parent: ComponentId) -> Self {
        self.scope = Some(parent);
        self
    }

    /// A short human-readable description, used in logs and diagnostics.
    pub fn label(&self) -> String {
        match &self.change {
            Change::ImportRelocation { from, to } => {
                format!("{}: {} -> {}", self.target.name, from, to)
            }
            Change::PropertyKey { from, to } => format!("{}.{} -> {}", self.target, from, to),
            Change::PropertyValue {
                attribute,
                from,
                to,
            } => format!("{}.{}: {} -> {}", self.target, attribute, from, to),
        }
    }

    /// Checks that the rule is meaningful.
    pub fn validate(&self) -> Result<(), String> {
        if self.target.module.is_empty() || self.target.name.is_empty() {
            return Err("component module and name must not be empty".to_string());
        }

        let (from, to) = match &self.change {
            Change::ImportRelocation { from, to } => {
                if *from != self.target.module {
                    return Err(format!(
                        "relocation source `{}` must match the component module `{}`",
                        from, self.target.module
                    ));
                }
                (from, to)
            }
            Change::PropertyKey { from, to } => (from, to),
            Change::PropertyValue {
                attribute,
                from,
                to,
            } => {
                if attribute.is_empty() {
                    return Err("attribute must not be empty".to_string());
                }
                (from, to)
            }
        };

        if from.is_empty() || to.is_empty() {
            Err("`from` and `to` must not be empty".to_string())
        } else if from == to {
            Err("`from` and `to` are the same".to_string())
        } else {
            Ok(())
        }
    }
}

/// Options for one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Compute the result without writing anything.
    pub dry_run: bool,

    /// Report per-file diagnostics.
    pub verbose: bool,

    /// The rules to apply. Order within one kind of rule is preserved.
    pub rules: Vec<RenameRule>,
}

impl Options {
    /// Options applying `rules` with everything else defaulted.
    pub fn with_rules(rules: Vec<RenameRule>) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    /// Parses options from a JSON map such as `{"dryRun": true, "rules": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Options = serde_json::from_str(json)?;
        validate_rules(&options.rules)?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

fn validate_rules(rules: &[RenameRule]) -> Result<(), ConfigError> {
    for (index, rule) in rules.iter().enumerate() {
        rule.validate()
            .map_err(|reason| ConfigError::InvalidRule {
                index,
                label: rule.label(),
                reason,
            })?;
    }
    Ok(())
}
