use std::path::Path;

use super::binding::BindingTable;
use super::diagnostic::Report;
use super::parse::parse;
use super::pass::for_rule;
use super::pipeline::{Outcome, Pipeline};
use super::rules::RenameRule;
use super::tree::Tree;

pub(crate) fn parse_helper(contents: &str) -> Tree {
    parse_helper_at("test.tsx", contents)
}

pub(crate) fn parse_helper_at(name: &str, contents: &str) -> Tree {
    parse(Path::new(name), contents).expect("error parsing")
}

/// Runs the pass for `rule` once over `tree` with freshly resolved bindings.
pub(crate) fn apply_helper(rule: &RenameRule, tree: Tree) -> (Tree, Report) {
    let bindings = BindingTable::resolve(&tree);
    let mut report = Report::default();
    let tree = for_rule(rule)
        .apply(tree, &bindings, &mut report)
        .expect("pass failed");
    (tree, report)
}

pub(crate) fn run_helper(rules: &[RenameRule], contents: &str) -> Outcome {
    Pipeline::new(rules).run(Path::new("test.tsx"), contents)
}
