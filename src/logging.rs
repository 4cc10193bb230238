//! Logging setup for the command-line tool.
//!
//! The filter comes from `UI_CODEMOD_LOG`, falling back to `RUST_LOG`. Without either,
//! only warnings are shown, or info and above with `--verbose`. Output goes to stderr so
//! dry-run diffs on stdout stay clean.
//!
//! ```bash
//! UI_CODEMOD_LOG=ui_codemod::pipeline=trace ui-codemod --rules rules.json --dry-run src
//! UI_CODEMOD_LOG=debug UI_CODEMOD_LOG_FORMAT=json ui-codemod --rules rules.json src
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Log line format, picked by `UI_CODEMOD_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Flat text lines.
    Text,

    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("UI_CODEMOD_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    if let Ok(val) = std::env::var("UI_CODEMOD_LOG") {
        return EnvFilter::builder().parse_lossy(val);
    }
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(if verbose { "info" } else { "warn" })
}

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init_tracing(verbose: bool) {
    let filter = build_filter(verbose);

    // a subscriber may already be installed, ie by a test harness
    let _ = match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text => fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish()
            .try_init(),
    };
}
