//! # pdf2image
//!
//! Rasterise PDF documents into one JPEG per page for a host editor, after
//! optionally clearing rights-management protection on the input.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Gate       pass through, or decrypt/copy via the rights agent
//!  ├─ 2. Session    open the working file with pdfium (optional password)
//!  ├─ 3. Render     per page: 96 DPI × multiplier, BGRA → RGBA
//!  ├─ 4. Composite  flatten partial transparency onto white
//!  ├─ 5. Encode     <destination stem>_<n>.jpg, written atomically
//!  └─ 6. Report     SUCCESS <widths> <heights> | FAIL [tag] → host launch
//! ```
//!
//! Pages are processed strictly one after the other; there is no async
//! runtime and no parallelism.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2image::{convert_pdf, Job, JobMode, PdfiumEngine, Settings};
//! use pdf2image::rights::CommandRightsAgent;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let job = Job::builder(JobMode::PdfConversion, "in.pdf", "out/page.jpg", &settings)
//!         .resolution(2.0)
//!         .build()?;
//!     let engine = PdfiumEngine::bind(None)?;
//!     let agent = CommandRightsAgent::new(&settings.agent_program);
//!     let report = convert_pdf(&job, &engine, &agent)?;
//!     println!("{}", report.into_status());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2image` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod invocation;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod rights;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Job, JobBuilder, JobMode, ProtectionScheme, Settings};
pub use convert::{convert_pdf, report_outcome, run_job, stage_single_file};
pub use engine::PdfiumEngine;
pub use error::{OpenFailure, Pdf2ImageError};
pub use invocation::Invocation;
pub use notify::{HostLauncher, Notifier};
pub use report::{JobReport, JobStatus, PageRecord};
