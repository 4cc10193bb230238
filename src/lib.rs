#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::path::Path;

use tracing::info;

/// The structural tree the passes rewrite: imports, markup elements and their attributes,
/// each carrying the byte span it was parsed from.
pub mod tree;

/// Lowers the ast produced by [`swc_ecma_parser`] into a [`tree::Tree`], resolving which
/// tag references are shadowed by local declarations along the way.
pub mod parse;

/// Maps local names to the module specifier and exported name they were imported as.
pub mod binding;

/// Rename rules and the options of a migration run, loaded from JSON.
pub mod rules;

/// The pass abstraction and the order passes run in.
pub mod pass;

/// Moves named imports of a component from one module specifier to another.
pub mod relocate;

/// Renames an attribute key on every usage of a component.
pub mod rename_prop;

/// Renames a literal attribute value on every usage of a component.
pub mod rename_value;

/// Structural checks run on a rewritten tree before it is printed.
pub mod validate;

/// Prints a rewritten tree back to source, touching only what changed.
pub mod print;

/// Manual-review diagnostics raised by the passes.
pub mod diagnostic;

/// Error types.
pub mod error;

/// Runs the passes over one file.
pub mod pipeline;

/// Discovers files and runs a pipeline over them in parallel.
pub mod runner;

/// Logging setup for the command-line tool.
pub mod logging;

/// Private crate for testing utilities.
#[cfg(test)]
pub(crate) mod testing;

use pipeline::{Outcome, Pipeline};
use rules::{Options, RenameRule};

fn report(outcome: &Outcome, options: &Options) {
    if options.verbose {
        for diagnostic in &outcome.diagnostics {
            info!("{}:{}", outcome.path.display(), diagnostic.render());
        }
    }
}

/// Applies every rule in `options` to `source`, in stage order.
///
/// Never fails: a file that can't be parsed comes back skipped, and a file a pass fails on
/// comes back errored, both with `source` as their output.
pub fn transform(path: &Path, source: &str, options: &Options) -> Outcome {
    let outcome = Pipeline::new(&options.rules).run(path, source);
    report(&outcome, options);
    outcome
}

/// Applies a single rule to `source`, ignoring the rules in `options`.
pub fn transform_pass(rule: &RenameRule, path: &Path, source: &str, options: &Options) -> Outcome {
    let outcome = Pipeline::new(std::slice::from_ref(rule)).run(path, source);
    report(&outcome, options);
    outcome
}
