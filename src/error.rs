use std::path::PathBuf;

use thiserror::Error;

/// Reasons a single file could not be migrated. None of these stop a batch.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// The source could not be parsed. The file is skipped and left untouched.
    #[error("{}:{line}:{column}: parse error: {message}", path.display())]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,

        /// One-based line of the parser diagnostic.
        line: usize,

        /// One-based column of the parser diagnostic.
        column: usize,

        /// The parser's message.
        message: String,
    },

    /// A pass failed unexpectedly. The remaining passes are abandoned and the original
    /// source is returned unmodified.
    #[error("{}: {pass} failed: {reason}", path.display())]
    Pass {
        /// The file being rewritten.
        path: PathBuf,

        /// Name of the failing stage.
        pass: String,

        /// What went wrong.
        reason: String,
    },

    /// The file could not be read or written.
    #[error("{}: {message}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,

        /// The underlying I/O error, rendered.
        message: String,
    },
}

/// Errors raised by a pass. The orchestrator turns these into [`TransformError::Pass`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    /// A node index recorded in the tree doesn't exist.
    #[error("element {0} is out of range")]
    MissingElement(usize),

    /// The pass panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The rewritten tree breaks a structural invariant.
    #[error("{0}")]
    Invalid(String),
}

/// Errors raised while loading or validating a rule set.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The rule file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The rule file.
        path: PathBuf,

        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The rule file is not valid JSON for a rule set.
    #[error("malformed rule set: {0}")]
    Json(#[from] serde_json::Error),

    /// A rule is well-formed JSON but makes no sense.
    #[error("rule {index} ({label}): {reason}")]
    InvalidRule {
        /// Position of the rule in the rule set.
        index: usize,

        /// A short description of the rule.
        label: String,

        /// What is wrong with it.
        reason: String,
    },
}
