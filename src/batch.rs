//! Batch composition over independent jobs.
//!
//! Jobs share one read-only configuration and run in parallel on a
//! `rayon` pool. Each job reports its own outcome; a failing job never
//! stops the others.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::asset::{AssetLoader, save_png};
use crate::canvas::Canvas;
use crate::composer::{compose_from_paths, output_file_name};
use crate::config::CompositionConfig;
use crate::error::{ComposeError, ComposeResult};
use crate::text::FontResolver;

/// One unit of batch work: the screenshots of a single output image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub id: String,
    pub screenshots: Vec<PathBuf>,
}

impl BatchJob {
    pub fn new(id: impl Into<String>, screenshots: Vec<PathBuf>) -> Self {
        Self {
            id: id.into(),
            screenshots,
        }
    }

    /// Job for a single screenshot, identified by its path.
    pub fn for_screenshot(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            screenshots: vec![path],
        }
    }

    /// `marketing_<stem>.png` after the job's first screenshot, or its id.
    pub fn output_name(&self) -> PathBuf {
        match self.screenshots.first() {
            Some(first) => output_file_name(first),
            None => output_file_name(Path::new(&self.id)),
        }
    }
}

/// Shared inputs for a batch run.
#[derive(Clone, Copy)]
pub struct BatchContext<'a> {
    pub config: &'a CompositionConfig,
    pub loader: &'a dyn AssetLoader,
    pub fonts: &'a dyn FontResolver,
    /// When set, each successful canvas is written here as a PNG.
    pub output_dir: Option<&'a Path>,
    /// Worker count; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl<'a> BatchContext<'a> {
    pub fn new(
        config: &'a CompositionConfig,
        loader: &'a dyn AssetLoader,
        fonts: &'a dyn FontResolver,
    ) -> Self {
        Self {
            config,
            loader,
            fonts,
            output_dir: None,
            threads: None,
        }
    }

    pub fn with_output_dir(mut self, dir: &'a Path) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

/// Result of one job.
#[derive(Debug)]
pub struct BatchOutcome {
    pub id: String,
    pub result: ComposeResult<Canvas>,
    /// File written for this job, if an output directory was given and the
    /// job succeeded.
    pub output: Option<PathBuf>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs every job and returns their outcomes in input order.
///
/// Fails as a whole only when the configuration is invalid or the thread
/// pool cannot be built; per-job errors are reported in the outcomes.
pub fn compose_batch(jobs: &[BatchJob], ctx: BatchContext<'_>) -> ComposeResult<Vec<BatchOutcome>> {
    ctx.config.validate()?;
    let pool = build_thread_pool(ctx.threads)?;

    let outcomes: Vec<BatchOutcome> = pool.install(|| {
        jobs.par_iter()
            .map(|job| run_job(job, &ctx))
            .collect()
    });

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    tracing::info!(jobs = jobs.len(), failed, "batch finished");
    Ok(outcomes)
}

fn run_job(job: &BatchJob, ctx: &BatchContext<'_>) -> BatchOutcome {
    let _span = tracing::debug_span!("batch_job", id = %job.id).entered();

    let result = compose_from_paths(ctx.config, &job.screenshots, ctx.loader, ctx.fonts);
    let mut output = None;
    let result = match (result, ctx.output_dir) {
        (Ok(canvas), Some(dir)) => {
            let path = dir.join(job.output_name());
            save_png(&canvas, &path).map(|()| {
                output = Some(path);
                canvas
            })
        }
        (result, _) => result,
    };

    if let Err(e) = &result {
        tracing::warn!(id = %job.id, error = %e, "batch job failed");
    }
    BatchOutcome {
        id: job.id.clone(),
        result,
        output,
    }
}

fn build_thread_pool(threads: Option<usize>) -> ComposeResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(ComposeError::config("batch threads must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ComposeError::composition(format!("failed to build rayon thread pool: {e}")))
}
