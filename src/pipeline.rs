use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::binding::BindingTable;
use crate::diagnostic::{Diagnostic, Report};
use crate::error::{PassError, TransformError};
use crate::parse::parse;
use crate::pass::{self, Pass, Stage};
use crate::print::print;
use crate::rules::RenameRule;
use crate::tree::Tree;
use crate::validate::validate;

/// How far a file got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Nothing has happened yet, or the source failed to parse.
    Unparsed,

    /// The source was parsed into a tree.
    Parsed,

    /// Imports have been relocated.
    ImportsRewritten,

    /// Property keys have been renamed.
    KeysRewritten,

    /// Property values have been renamed.
    ValuesRewritten,

    /// The tree was printed back to source.
    Serialized,
}

impl Stage {
    /// The state a file is in once every pass of this stage has run.
    pub fn completes(self) -> State {
        match self {
            Stage::Imports => State::ImportsRewritten,
            Stage::Keys => State::KeysRewritten,
            Stage::Values => State::ValuesRewritten,
        }
    }
}

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// At least one rule applied.
    Changed,

    /// No rule applied; the output is the input.
    Unchanged,

    /// The file could not be parsed and was left alone.
    Skipped,

    /// A pass failed and the file was left alone.
    Errored,
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Changed => write!(f, "changed"),
            Status::Unchanged => write!(f, "unchanged"),
            Status::Skipped => write!(f, "skipped"),
            Status::Errored => write!(f, "errored"),
        }
    }
}

/// The result of running the pipeline over one file.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The file.
    pub path: PathBuf,

    /// What happened.
    pub status: Status,

    /// The text the pipeline was given.
    pub source: String,

    /// The rewritten source, or the original source unless the status is
    /// [`Status::Changed`].
    pub output: String,

    /// Places that need manual review.
    pub diagnostics: Vec<Diagnostic>,

    /// Why the file was skipped or errored.
    pub error: Option<TransformError>,

    /// The last state the file reached.
    pub state: State,
}

impl Outcome {
    fn failed(
        path: &Path,
        source: &str,
        status: Status,
        error: TransformError,
        mut report: Report,
        state: State,
    ) -> Self {
        warn!("{}", error);
        report.locate(source);
        Self {
            path: path.to_path_buf(),
            status,
            source: source.to_string(),
            output: source.to_string(),
            diagnostics: report.into_diagnostics(),
            error: Some(error),
            state,
        }
    }

    /// Whether the output differs from the input.
    pub fn is_changed(&self) -> bool {
        self.status == Status::Changed
    }
}

/// An ordered list of passes applied to one file at a time.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    /// Builds the passes for `rules` and puts them in the declared [`Stage`] order. Rules of
    /// the same kind keep the order they were given in.
    pub fn new(rules: &[RenameRule]) -> Self {
        let mut passes: Vec<_> = rules.iter().map(pass::for_rule).collect();
        passes.sort_by_key(|pass| pass.stage());
        Self { passes }
    }

    /// Runs `passes` exactly in the order given.
    pub fn unordered(passes: Vec<Box<dyn Pass>>) -> Self {
        Self { passes }
    }

    /// The passes, in the order they run.
    pub fn passes(&self) -> impl Iterator<Item = &dyn Pass> {
        self.passes.iter().map(|pass| pass.as_ref())
    }

    /// Runs every pass over `source`.
    ///
    /// The binding table is resolved again before each pass. If any pass fails, the original
    /// source is returned untouched together with the failure.
    pub fn run(&self, path: &Path, source: &str) -> Outcome {
        let span = tracing::debug_span!("file", path = %path.display());
        let _enter = span.enter();

        let mut report = Report::default();
        let original = match parse(path, source) {
            Ok(tree) => tree,
            Err(error) => {
                return Outcome::failed(
                    path,
                    source,
                    Status::Skipped,
                    error,
                    report,
                    State::Unparsed,
                )
            }
        };

        let mut state = State::Parsed;
        let mut tree = original.clone();
        for (index, pass) in self.passes.iter().enumerate() {
            let bindings = BindingTable::resolve(&tree);
            trace!(stage = %pass.stage(), rule = %pass.rule().label(), bindings = bindings.len(), "running pass");

            tree = match apply_guarded(pass.as_ref(), tree, &bindings, &mut report) {
                Ok(tree) => tree,
                Err(error) => {
                    let error = TransformError::Pass {
                        path: path.to_path_buf(),
                        pass: format!("{} ({})", pass.stage(), pass.rule().label()),
                        reason: error.to_string(),
                    };
                    return Outcome::failed(path, source, Status::Errored, error, report, state);
                }
            };

            let stage_done = self
                .passes
                .get(index + 1)
                .map_or(true, |next| next.stage() != pass.stage());
            if stage_done {
                state = state.max(pass.stage().completes());
                trace!(?state, "stage complete");
            }
        }

        let printed = validate(&original, &tree)
            .map_err(|reason| ("validation", reason))
            .and_then(|()| print(source, &original, &tree).map_err(|reason| ("printing", reason)));
        let output = match printed {
            Ok(output) => output,
            Err((pass, reason)) => {
                let error = TransformError::Pass {
                    path: path.to_path_buf(),
                    pass: pass.to_string(),
                    reason,
                };
                return Outcome::failed(path, source, Status::Errored, error, report, state);
            }
        };

        let status = if output == source {
            Status::Unchanged
        } else {
            Status::Changed
        };
        debug!(%status, diagnostics = report.diagnostics().len(), "file done");
        report.locate(source);

        Outcome {
            path: path.to_path_buf(),
            status,
            source: source.to_string(),
            output,
            diagnostics: report.into_diagnostics(),
            error: None,
            state: State::Serialized,
        }
    }
}

fn apply_guarded(
    pass: &dyn Pass,
    tree: Tree,
    bindings: &BindingTable,
    report: &mut Report,
) -> Result<Tree, PassError> {
    panic::catch_unwind(AssertUnwindSafe(|| pass.apply(tree, bindings, report)))
        .unwrap_or_else(|payload| Err(PassError::Panicked(panic_message(payload))))
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }

    "unknown panic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::rules::ComponentId;
    use crate::testing::*;

    fn lab_button() -> Vec<RenameRule> {
        vec![
            RenameRule::relocate("Button", "lib/lab", "lib/core"),
            RenameRule::rename_value(ComponentId::new("lib/core", "Button"), "size", "small", "sm"),
        ]
    }

    #[test]
    fn import_relocation() {
        let outcome = run_helper(
            &[RenameRule::relocate("Button", "lib/lab", "lib/core")],
            "import { Button } from 'lib/lab'\n",
        );
        assert_eq!(outcome.output, "import { Button } from 'lib/core'\n");
        assert_eq!(outcome.status, Status::Changed);
        assert_eq!(outcome.state, State::Serialized);
    }

    #[test]
    fn split_relocation() {
        let outcome = run_helper(
            &[RenameRule::relocate("Button", "lib/lab", "lib/core")],
            "import { Box, Button as Btn } from 'lib/lab';\n\nexport const a = <Btn />;\n",
        );
        assert_eq!(
            outcome.output,
            "import { Box } from 'lib/lab';\nimport { Button as Btn } from 'lib/core';\n\nexport const a = <Btn />;\n"
        );
    }

    #[test]
    fn property_key_rename() {
        let outcome = run_helper(
            &[RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize")],
            "import { Button } from 'lib';\nconst a = <Button size=\"lg\" />;\n",
        );
        assert_eq!(
            outcome.output,
            "import { Button } from 'lib';\nconst a = <Button buttonSize=\"lg\" />;\n"
        );
    }

    #[test]
    fn property_value_rename() {
        let rules = [RenameRule::rename_value(
            ComponentId::new("lib", "IconButton"),
            "size",
            "small",
            "sm",
        )];

        let outcome = run_helper(
            &rules,
            "import { IconButton } from 'lib';\nconst a = <IconButton size=\"small\" />;\n",
        );
        assert_eq!(
            outcome.output,
            "import { IconButton } from 'lib';\nconst a = <IconButton size=\"sm\" />;\n"
        );

        let source = "import { IconButton } from 'lib';\nconst a = <IconButton size={variable} />;\n";
        let outcome = run_helper(&rules, source);
        assert_eq!(outcome.output, source);
        assert_eq!(outcome.status, Status::Unchanged);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::DynamicValue);
        assert_eq!(
            outcome.diagnostics[0].render(),
            "2:29: [lib#IconButton.size: small -> sm] dynamic value: `size` is not a literal; replace `small` with `sm` by hand if it can be"
        );
    }

    #[test]
    fn responsive_value_rename() {
        let outcome = run_helper(
            &[RenameRule::rename_value(ComponentId::new("lib", "Button"), "size", "small", "sm")],
            "import { Button } from 'lib';\n<Button size={{ mobile: 'small', desktop: \"large\" }} />;\n",
        );
        assert_eq!(
            outcome.output,
            "import { Button } from 'lib';\n<Button size={{ mobile: 'sm', desktop: \"large\" }} />;\n"
        );
    }

    #[test]
    fn namespace_usage() {
        let outcome = run_helper(
            &[RenameRule::rename_value(ComponentId::new("lib/lab", "Button"), "size", "small", "sm")],
            "import * as Lab from 'lib/lab';\n<Lab.Button size=\"small\" />;\n",
        );
        assert_eq!(
            outcome.output,
            "import * as Lab from 'lib/lab';\n<Lab.Button size=\"sm\" />;\n"
        );
    }

    #[test]
    fn shadowing() {
        let rules = [RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize")];
        let source = "import { Button } from 'lib';\n\nfunction Toolbar() {\n  function Button(props) {\n    return null;\n  }\n  return <Button size=\"lg\" />;\n}\n\nexport const App = () => <Button size=\"lg\" />;\n";
        assert_eq!(
            run_helper(&rules, source).output,
            "import { Button } from 'lib';\n\nfunction Toolbar() {\n  function Button(props) {\n    return null;\n  }\n  return <Button size=\"lg\" />;\n}\n\nexport const App = () => <Button buttonSize=\"lg\" />;\n"
        );

        let local_only = "function Button() {\n  return null;\n}\nconst a = <Button size=\"lg\" />;\n";
        assert_eq!(run_helper(&rules, local_only).output, local_only);
    }

    #[test]
    fn conflicting_key() {
        let outcome = run_helper(
            &[RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize")],
            "import { Button } from 'lib';\n<Button size=\"lg\" buttonSize=\"sm\" />;\n",
        );
        assert_eq!(
            outcome.output,
            "import { Button } from 'lib';\n<Button buttonSize=\"sm\" />;\n"
        );
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::ConflictingKey);
    }

    #[test]
    fn declared_order() {
        let source = "import { Button } from 'lib/lab';\nconst a = <Button size=\"small\" />;\n";
        let expected = "import { Button } from 'lib/core';\nconst a = <Button size=\"sm\" />;\n";

        assert_eq!(run_helper(&lab_button(), source).output, expected);

        // the pipeline sorts rules into stage order no matter how they are listed
        let mut reversed = lab_button();
        reversed.reverse();
        let pipeline = Pipeline::new(&reversed);
        let stages: Vec<_> = pipeline.passes().map(|pass| pass.stage()).collect();
        assert_eq!(stages, [Stage::Imports, Stage::Values]);
        assert_eq!(pipeline.run(Path::new("test.tsx"), source).output, expected);

        // running the value rename first misses the button: it still resolves to the old module
        let unordered = Pipeline::unordered(reversed.iter().map(pass::for_rule).collect());
        let output = unordered.run(Path::new("test.tsx"), source).output;
        assert_ne!(output, expected);
        assert_eq!(
            output,
            "import { Button } from 'lib/core';\nconst a = <Button size=\"small\" />;\n"
        );
    }

    #[test]
    fn key_rename_before_relocation() {
        let relocate = RenameRule::relocate("Button", "lib/lab", "lib/core");
        let rename = RenameRule::rename_key(ComponentId::new("lib/core", "Button"), "size", "buttonSize");
        let source = "import { Button } from 'lib/lab';\n<Button size=\"lg\" />;\n";
        let expected = "import { Button } from 'lib/core';\n<Button buttonSize=\"lg\" />;\n";

        let declared = Pipeline::new(&[rename.clone(), relocate.clone()]);
        assert_eq!(declared.run(Path::new("test.tsx"), source).output, expected);

        let reversed = Pipeline::unordered(vec![pass::for_rule(&rename), pass::for_rule(&relocate)]);
        let output = reversed.run(Path::new("test.tsx"), source).output;
        assert_ne!(output, expected);
        assert_eq!(output, "import { Button } from 'lib/core';\n<Button size=\"lg\" />;\n");
    }

    #[test]
    fn idempotent() {
        let rules = vec![
            RenameRule::relocate("Button", "lib/lab", "lib/core"),
            RenameRule::rename_key(ComponentId::new("lib/core", "Button"), "tone", "variant"),
            RenameRule::rename_value(ComponentId::new("lib/core", "Button"), "size", "small", "sm"),
            RenameRule::rename_value(ComponentId::new("lib/core", "Button"), "size", "large", "lg"),
        ];
        let fixtures = [
            "import { Box, Button } from 'lib/lab';\n<Button tone=\"warm\" size=\"small\" />;\n",
            "import { Button } from 'lib/lab';\n<Button tone=\"a\" variant=\"b\" size={{ mobile: 'large' }} />;\n",
            "import * as Lab from 'lib/lab';\n<Lab.Button size=\"small\" />;\n",
            "import { Button } from 'lib/core';\n<Button size={size} {...rest} />;\n",
            "const a = <Button size=\"small\" />;\n",
        ];

        for fixture in fixtures {
            let once = run_helper(&rules, fixture);
            let twice = run_helper(&rules, &once.output);
            assert_eq!(twice.output, once.output, "fixture: {}", fixture);
            assert_eq!(twice.status, Status::Unchanged, "fixture: {}", fixture);
        }
    }

    #[test]
    fn non_interference() {
        let fixtures = [
            "import { Button } from 'other-lib';\n<Button size=\"small\" tone=\"x\" />;\n",
            "import React from 'react';\n\n// comments and   spacing stay\nexport function App() {\n  return <div className=\"small\" />;\n}\n",
            "const Button = () => null;\n<Button size=\"small\" />;\n",
        ];
        let rules = vec![
            RenameRule::relocate("Button", "lib/lab", "lib/core"),
            RenameRule::rename_key(ComponentId::new("lib/core", "Button"), "tone", "variant"),
            RenameRule::rename_value(ComponentId::new("lib/core", "Button"), "size", "small", "sm"),
        ];
        for fixture in fixtures {
            let outcome = run_helper(&rules, fixture);
            assert_eq!(outcome.output, fixture);
            assert_eq!(outcome.status, Status::Unchanged);
        }
    }

    #[test]
    fn parse_failure() {
        let source = "import { Button } from 'lib/lab';\nconst a = <Button size=\"small\" ;";
        let outcome = run_helper(&lab_button(), source);
        assert_eq!(outcome.status, Status::Skipped);
        assert_eq!(outcome.output, source);
        assert_eq!(outcome.state, State::Unparsed);
        assert!(matches!(outcome.error, Some(TransformError::Parse { .. })));
    }

    #[test]
    fn recoverable_parse_failure() {
        let source = "import { Button } from 'lib/lab';\nconst a = 08;\nexport default <Button size=\"small\" />;\n";
        let outcome = Pipeline::new(&lab_button()).run(Path::new("legacy.jsx"), source);
        assert_eq!(outcome.status, Status::Skipped);
        assert_eq!(outcome.output, source);
        assert!(matches!(outcome.error, Some(TransformError::Parse { .. })));
    }

    #[test]
    fn shadowing_in_nested_scopes() {
        let rules = [RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize")];
        let source = "import { Button } from 'lib';\n\nclass Toolbar {\n  constructor(Button) {\n    this.el = <Button size=\"lg\" />;\n  }\n}\n\nfunction pick(kind) {\n  switch (kind) {\n    default:\n      const Button = () => null;\n      return <Button size=\"lg\" />;\n  }\n}\n\nexport const App = () => <Button size=\"lg\" />;\n";
        let outcome = run_helper(&rules, source);
        assert_eq!(
            outcome.output,
            source.replace(
                "export const App = () => <Button size=",
                "export const App = () => <Button buttonSize="
            )
        );
    }

    #[test]
    fn dropped_key_holding_an_element() {
        let rules = [
            RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize"),
            RenameRule::rename_value(ComponentId::new("lib", "IconButton"), "size", "small", "sm"),
        ];
        let outcome = run_helper(
            &rules,
            "import { Button, IconButton } from 'lib';\n<Button size={<IconButton size=\"small\" />} buttonSize=\"x\" />;\n",
        );
        assert_eq!(outcome.status, Status::Changed);
        assert_eq!(
            outcome.output,
            "import { Button, IconButton } from 'lib';\n<Button buttonSize=\"x\" />;\n"
        );
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::ConflictingKey);
    }

    struct Failing(RenameRule, bool);

    impl Pass for Failing {
        fn stage(&self) -> Stage {
            Stage::Keys
        }

        fn rule(&self) -> &RenameRule {
            &self.0
        }

        fn apply(&self, _: Tree, _: &BindingTable, _: &mut Report) -> Result<Tree, PassError> {
            if self.1 {
                panic!("boom");
            }
            Err(PassError::Invalid("boom".to_string()))
        }
    }

    #[test]
    fn pass_failure() {
        let source = "import { Button } from 'lib/lab';\nconst a = <Button size=\"small\" />;\n";
        let relocate = RenameRule::relocate("Button", "lib/lab", "lib/core");

        for panics in [false, true] {
            let pipeline = Pipeline::unordered(vec![
                pass::for_rule(&relocate),
                Box::new(Failing(relocate.clone(), panics)),
            ]);
            let outcome = pipeline.run(Path::new("test.tsx"), source);
            assert_eq!(outcome.status, Status::Errored);
            assert_eq!(outcome.output, source);
            assert_eq!(outcome.state, State::ImportsRewritten);
            match &outcome.error {
                Some(TransformError::Pass { reason, .. }) => assert!(reason.contains("boom")),
                other => panic!("expected a pass failure, got {:?}", other),
            }
        }
    }

    #[test]
    fn comments_preserved() {
        let source = "/* header */\nimport { Button } from 'lib'; // the button\n\n// usage\nexport const a = (\n  <Button\n    size=\"lg\" /* big */\n  />\n);\n";
        let outcome = run_helper(
            &[RenameRule::rename_key(ComponentId::new("lib", "Button"), "size", "buttonSize")],
            source,
        );
        assert_eq!(outcome.output, source.replace("size=", "buttonSize="));
    }
}
