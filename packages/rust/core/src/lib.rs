//! Document pipeline for certnorm.
//!
//! This crate ties together table ingest, schedule normalization, content
//! normalization, and pruning into one call per input document
//! ([`normalize_document`]) and a batch driver over files
//! ([`normalize_files`]).

pub mod document;
pub mod pipeline;

pub use document::{Document, InputKind};
pub use pipeline::{
    BatchSummary, DocumentOutput, FileOutcome, NormalizeOptions, ProgressReporter,
    SilentProgress, normalize_document, normalize_files,
};
