//! Core pipeline orchestration for Datawalker.
//!
//! Ties page discovery, extraction, and visualization re-mounting together,
//! folds the results into one set of assets, and splices them into the page
//! shell.

pub mod aggregate;
pub mod assembler;
pub mod pipeline;
pub mod report;

pub use pipeline::{
    BuildConfig, BuildResult, ProgressReporter, SilentProgress, build_document, run_to_file,
    write_document,
};
pub use report::{AnalysisReport, SectionReport, analyze};
