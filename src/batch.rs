use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::foundation::error::{ImgfitError, ImgfitResult};
use crate::pipeline::{Job, Pipeline};

/// Outcome for one input file.
#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub outcome: ImgfitResult<PathBuf>,
}

/// One [`FileReport`] per input, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Create the output directory if needed. Safe to call repeatedly.
pub fn ensure_out_dir(dir: &Path) -> ImgfitResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> ImgfitResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ImgfitError::dimension("threads must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ImgfitError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

// Some filesystems fold case, so two names differing only in case are one file.
fn path_key(p: &Path) -> String {
    p.to_string_lossy().to_lowercase()
}

/// One output path per input, in input order, no two alike.
///
/// The first input to claim a name keeps it. Later claimants get `<stem>-2.<ext>`,
/// `<stem>-3.<ext>`, ..., skipping any name another input would get by default.
pub fn plan_outputs(pipeline: &Pipeline, inputs: &[PathBuf]) -> Vec<PathBuf> {
    let defaults: Vec<PathBuf> = inputs.iter().map(|i| pipeline.default_output(i)).collect();
    let reserved: HashSet<String> = defaults.iter().map(|p| path_key(p)).collect();
    let mut taken = HashSet::new();

    inputs
        .iter()
        .zip(defaults)
        .map(|(input, out)| {
            if taken.insert(path_key(&out)) {
                return out;
            }
            let stem = out
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ext = out
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            let free = (2u32..)
                .map(|n| out.with_file_name(format!("{stem}-{n}.{ext}")))
                .find(|c| {
                    let key = path_key(c);
                    !reserved.contains(&key) && !taken.contains(&key)
                });
            let renamed = free.unwrap_or(out);
            taken.insert(path_key(&renamed));
            warn!(
                input = %input.display(),
                output = %renamed.display(),
                "output name already claimed in this batch; renamed"
            );
            renamed
        })
        .collect()
}

/// Process every input on a bounded worker pool.
///
/// A failing file is recorded in its report and does not stop the others. Only output
/// directory creation and pool setup fail the batch as a whole.
pub fn run_batch(pipeline: &Pipeline, inputs: &[PathBuf]) -> ImgfitResult<BatchReport> {
    let job = pipeline.job();
    ensure_out_dir(&job.out_dir)?;
    let pool = build_thread_pool(job.threads)?;

    info!(
        files = inputs.len(),
        threads = pool.current_num_threads(),
        out_dir = %job.out_dir.display(),
        "starting batch"
    );

    let outputs = plan_outputs(pipeline, inputs);
    let files: Vec<FileReport> = pool.install(|| {
        inputs
            .par_iter()
            .zip(outputs.par_iter())
            .map(|(input, out)| FileReport {
                input: input.clone(),
                outcome: pipeline.process_file_to(input, out),
            })
            .collect()
    });

    for f in &files {
        if let Err(e) = &f.outcome {
            warn!(input = %f.input.display(), error = %e, "file failed");
        }
    }

    let report = BatchReport { files };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}

/// [`run_batch`] with the default rasterizer for this build.
pub fn run_job(job: &Job, inputs: &[PathBuf]) -> ImgfitResult<BatchReport> {
    run_batch(&Pipeline::new(job.clone()), inputs)
}
