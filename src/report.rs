//! Job report and host status string.
//!
//! The host editor lays pages out at 96 DPI, so page geometry is always
//! reported at that reference resolution even when the JPEGs were rendered
//! larger or smaller.

use crate::engine::PageSize;
use crate::pipeline::render::reference_extent;
use std::fmt;

/// Geometry of one processed page at the reference DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRecord {
    /// 0-based page index.
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

/// Ordered per-page geometry for the whole job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pages: Vec<PageRecord>,
}

impl JobReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed page. Pages arrive in ascending index order.
    pub fn push(&mut self, index: usize, size: PageSize) {
        debug_assert!(self.pages.last().map_or(true, |p| p.index < index));
        self.pages.push(PageRecord {
            index,
            width: reference_extent(size.width),
            height: reference_extent(size.height),
        });
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Comma-joined widths, e.g. `816,816,1123`.
    pub fn widths(&self) -> String {
        join(self.pages.iter().map(|p| p.width))
    }

    /// Comma-joined heights.
    pub fn heights(&self) -> String {
        join(self.pages.iter().map(|p| p.height))
    }

    pub fn into_status(self) -> JobStatus {
        JobStatus::Success(self)
    }
}

fn join(values: impl Iterator<Item = u32>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

/// Final outcome as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Success(JobReport),
    /// Failure with an optional reason tag such as `PASSWORD`.
    Fail(Option<&'static str>),
}

impl JobStatus {
    /// Whitespace-free tokens of the status string, in order.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            JobStatus::Success(report) if report.pages().is_empty() => vec!["SUCCESS".into()],
            JobStatus::Success(report) => {
                vec!["SUCCESS".into(), report.widths(), report.heights()]
            }
            JobStatus::Fail(None) => vec!["FAIL".into()],
            JobStatus::Fail(Some(tag)) => vec!["FAIL".into(), (*tag).into()],
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}
