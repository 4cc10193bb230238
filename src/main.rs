use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use ui_codemod::logging::init_tracing;
use ui_codemod::pipeline::{Outcome, Status};
use ui_codemod::rules::Options;
use ui_codemod::runner::{discover, Batch, Summary, DEFAULT_EXTENSIONS};

/// Rewrites imports and JSX props of a UI component library across a codebase.
#[derive(Debug, Parser)]
#[command(name = "ui-codemod", version)]
struct Args {
    /// JSON file holding the rename rules, optionally with `dryRun` and `verbose`.
    #[arg(long)]
    rules: PathBuf,

    /// Print a diff of every change instead of writing files.
    #[arg(long)]
    dry_run: bool,

    /// Print diagnostics for places that need manual review.
    #[arg(short, long)]
    verbose: bool,

    /// Worker threads; 0 uses one per core.
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// File extensions to pick up when walking directories.
    #[arg(long, value_delimiter = ',')]
    extensions: Vec<String>,

    /// Stop starting new files once one has errored.
    #[arg(long)]
    fail_fast: bool,

    /// Files and directories to migrate.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn print_diff(stdout: &mut StandardStream, outcome: &Outcome) -> std::io::Result<()> {
    stdout.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(stdout, "--- {}", outcome.path.display())?;
    stdout.reset()?;

    let changeset = Changeset::new(&outcome.source, &outcome.output, "\n");
    for diff in &changeset.diffs {
        let (marker, color, text) = match diff {
            Difference::Same(_) => continue,
            Difference::Add(x) => ('+', Color::Green, x),
            Difference::Rem(x) => ('-', Color::Red, x),
        };
        stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
        for line in text.lines() {
            writeln!(stdout, "{}{}", marker, line)?;
        }
    }
    stdout.reset()
}

fn run(args: Args) -> Result<bool> {
    let mut options = Options::from_path(&args.rules)
        .with_context(|| format!("loading rules from {}", args.rules.display()))?;
    options.dry_run |= args.dry_run;
    options.verbose |= args.verbose;
    init_tracing(options.verbose);

    let extensions = if args.extensions.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
    } else {
        args.extensions
    };
    let files = discover(&args.paths, &extensions);

    let batch = Batch::new(&options, args.jobs).fail_fast(args.fail_fast);
    let outcomes = batch.run(&files).context("starting worker threads")?;

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for outcome in &outcomes {
        if options.dry_run && outcome.status == Status::Changed {
            print_diff(&mut stdout, outcome).context("writing diff")?;
        }

        if options.verbose {
            for diagnostic in &outcome.diagnostics {
                eprintln!("{}:{}", outcome.path.display(), diagnostic.render());
            }
        }

        if let Some(error) = &outcome.error {
            eprintln!("{}: {}", outcome.status, error);
        }
    }

    let summary = Summary::of(&outcomes, files.len());
    write!(
        stdout,
        "{} changed, {} unchanged, {} skipped, {} errored, {} to review",
        summary.changed, summary.unchanged, summary.skipped, summary.errored, summary.diagnostics,
    )?;
    if summary.cancelled > 0 {
        write!(stdout, ", {} not started", summary.cancelled)?;
    }
    writeln!(stdout, "{}", if options.dry_run { " (dry run)" } else { "" })?;

    Ok(!summary.has_failures())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}
