//! Job orchestration.
//!
//! [`convert_pdf`] drives one PDF through the whole pipeline:
//!
//! ```text
//! ResourceGate::acquire ─▶ DocumentSession::open ─▶ for each page:
//!     with_page { rasterize_page ─▶ composite ─▶ write_page } ─▶ JobReport::push
//! ```
//!
//! Everything is sequential. The first failure ends the job; pages already
//! written stay on disk and the gate still removes its working copy because
//! [`WorkingFile`](crate::pipeline::gate::WorkingFile) cleans up on drop.

use crate::config::{Job, JobMode};
use crate::engine::RenderingEngine;
use crate::error::Pdf2ImageError;
use crate::notify::Notifier;
use crate::pipeline::composite::composite;
use crate::pipeline::encode::{page_output_path, write_page};
use crate::pipeline::gate::ResourceGate;
use crate::pipeline::render::rasterize_page;
use crate::pipeline::session::DocumentSession;
use crate::report::{JobReport, JobStatus};
use crate::rights::RightsAgent;
use std::time::Instant;
use tracing::{debug, error, info};

/// Convert every page of `job.source` into `<destination stem>_<n>.jpg`.
///
/// # Errors
/// Any pipeline failure is terminal; see [`Pdf2ImageError`] for the
/// taxonomy. Pages written before the failure are left in place.
pub fn convert_pdf(
    job: &Job,
    engine: &dyn RenderingEngine,
    agent: &dyn RightsAgent,
) -> Result<JobReport, Pdf2ImageError> {
    let start = Instant::now();
    info!(
        "Converting {} → {} (resolution {}, quality {}, scheme {:?})",
        job.source.display(),
        job.destination.display(),
        job.resolution,
        job.jpeg_quality(),
        job.protection
    );

    // ── Step 1: Resource gate ───────────────────────────────────────────
    let gate = ResourceGate::new(job.protection, agent);
    let working = gate.acquire(job)?;
    debug!("Working file {} ({:?})", working.path().display(), working.origin());

    // ── Step 2: Open document and render ────────────────────────────────
    // The session must be closed before the working copy is removed.
    let report = {
        let session = DocumentSession::open(engine, working.path(), job.password.as_deref())?;
        render_all(job, &session)?
    };

    // ── Step 3: Cleanup ─────────────────────────────────────────────────
    working.release();

    info!(
        "Converted {} pages in {} ms",
        report.pages().len(),
        start.elapsed().as_millis()
    );
    Ok(report)
}

fn render_all(job: &Job, session: &DocumentSession<'_>) -> Result<JobReport, Pdf2ImageError> {
    let quality = job.jpeg_quality();
    let mut report = JobReport::new();

    for index in 0..session.page_count() {
        let size = session.with_page(index, |page| {
            let (size, pixels) = rasterize_page(page, index, job.resolution)?;
            let out = page_output_path(&job.destination, index);
            write_page(&composite(pixels), &out, quality)?;
            info!("Wrote {}", out.display());
            Ok(size)
        })?;
        report.push(index, size);
    }

    Ok(report)
}

/// Single-file mode: stage `job.source` at `job.destination` through the
/// gate, without rendering. The staged file is the caller's and is kept.
pub fn stage_single_file(job: &Job, agent: &dyn RightsAgent) -> Result<JobReport, Pdf2ImageError> {
    info!(
        "Staging {} → {} (scheme {:?})",
        job.source.display(),
        job.destination.display(),
        job.protection
    );
    let gate = ResourceGate::new(job.protection, agent);
    let staged = gate.stage(&job.source, &job.destination)?;
    info!("Staged {}", staged.path().display());
    Ok(JobReport::new())
}

/// Run `job` in its mode. `engine` is only consulted for PDF conversion.
pub fn run_job(
    job: &Job,
    engine: Option<&dyn RenderingEngine>,
    agent: &dyn RightsAgent,
) -> Result<JobReport, Pdf2ImageError> {
    match job.mode {
        JobMode::SingleFileStaging => stage_single_file(job, agent),
        JobMode::PdfConversion => match engine {
            Some(engine) => convert_pdf(job, engine, agent),
            None => Err(Pdf2ImageError::EngineUnavailable(
                "no rendering engine available".into(),
            )),
        },
    }
}

/// Log the outcome and tell the host about it.
///
/// Returns the status that was sent, or `None` when the error is one the
/// host is never told about.
pub fn report_outcome(
    job: &Job,
    outcome: Result<JobReport, Pdf2ImageError>,
    notifier: &dyn Notifier,
) -> Option<JobStatus> {
    let status = match outcome {
        Ok(report) => {
            let status = report.into_status();
            info!("Job finished: {}", status);
            status
        }
        Err(e) => {
            error!("Job failed: {}", e);
            if !e.notifies_host() {
                return None;
            }
            JobStatus::Fail(e.reason_tag())
        }
    };
    notifier.notify(&job.app_code, &status);
    Some(status)
}
