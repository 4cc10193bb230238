use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::TransformError;
use crate::pipeline::{Outcome, Pipeline, State, Status};
use crate::rules::Options;

/// Extensions of the files a batch picks up by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name == "node_modules" || name.starts_with('.'))
}

/// Collects the source files under `paths`.
///
/// Directories are walked recursively, skipping `node_modules` and hidden directories.
/// Files named directly are always included. The result is sorted and free of duplicates.
pub fn discover(paths: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !is_skipped_dir(entry))
            .filter_map(|entry| entry.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            if path.extension().map_or(false, |ext| {
                extensions.iter().any(|wanted| ext == wanted.as_str())
            }) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Totals over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Files rewritten (or that would be, on a dry run).
    pub changed: usize,

    /// Files no rule applied to.
    pub unchanged: usize,

    /// Files that failed to parse.
    pub skipped: usize,

    /// Files a pass or I/O failed on.
    pub errored: usize,

    /// Files never started because the batch was cancelled.
    pub cancelled: usize,

    /// Diagnostics raised across all files.
    pub diagnostics: usize,
}

impl Summary {
    /// Tallies `outcomes` out of `total` discovered files.
    pub fn of(outcomes: &[Outcome], total: usize) -> Self {
        let mut summary = Summary {
            cancelled: total.saturating_sub(outcomes.len()),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome.status {
                Status::Changed => summary.changed += 1,
                Status::Unchanged => summary.unchanged += 1,
                Status::Skipped => summary.skipped += 1,
                Status::Errored => summary.errored += 1,
            }
            summary.diagnostics += outcome.diagnostics.len();
        }
        summary
    }

    /// Whether a pass or I/O failed on any file. Files skipped because they don't parse are
    /// reported but don't count.
    pub fn has_failures(&self) -> bool {
        self.errored > 0
    }
}

/// Runs one pipeline over many files in parallel.
///
/// Files are independent: a failure in one never affects another. Setting the cancel flag
/// stops the batch before the next file starts; files already being rewritten finish.
pub struct Batch {
    pipeline: Pipeline,
    dry_run: bool,
    jobs: usize,
    fail_fast: bool,
    cancel: Arc<AtomicBool>,
}

impl Batch {
    /// A batch applying the rules in `options`. `jobs` of zero uses one thread per core.
    pub fn new(options: &Options, jobs: usize) -> Self {
        Self {
            pipeline: Pipeline::new(&options.rules),
            dry_run: options.dry_run,
            jobs,
            fail_fast: false,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancels the rest of the batch as soon as a file errors.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// The flag that cancels the batch when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Rewrites `files`, in order. Cancelled files have no outcome.
    pub fn run(&self, files: &[PathBuf]) -> Result<Vec<Outcome>, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()?;

        info!(
            files = files.len(),
            jobs = pool.current_num_threads(),
            dry_run = self.dry_run,
            "starting batch"
        );
        let outcomes: Vec<Outcome> = pool.install(|| {
            files
                .par_iter()
                .filter_map(|path| {
                    if self.cancel.load(Ordering::Relaxed) {
                        debug!(path = %path.display(), "cancelled");
                        return None;
                    }
                    let outcome = self.run_file(path);
                    if self.fail_fast && outcome.status == Status::Errored {
                        self.cancel.store(true, Ordering::Relaxed);
                    }
                    Some(outcome)
                })
                .collect()
        });

        Ok(outcomes)
    }

    fn run_file(&self, path: &Path) -> Outcome {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => return io_failure(path, String::new(), err),
        };

        let outcome = self.pipeline.run(path, &source);
        if outcome.is_changed() && !self.dry_run {
            if let Err(err) = fs::write(path, &outcome.output) {
                return io_failure(path, source, err);
            }
            debug!(path = %path.display(), "written");
        }
        outcome
    }
}

fn io_failure(path: &Path, source: String, err: std::io::Error) -> Outcome {
    let error = TransformError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    warn!("{}", error);
    Outcome {
        path: path.to_path_buf(),
        status: Status::Errored,
        output: source.clone(),
        source,
        diagnostics: Vec::new(),
        error: Some(error),
        state: State::Unparsed,
    }
}
