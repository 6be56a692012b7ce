//! End-to-end normalization: document → schedule + content → pruned JSON.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use certnorm_content::normalize_content;
use certnorm_dedupe::prune;
use certnorm_schedule::{extract_fees, merge_outputs, normalize_tables, normalize_tree};
use certnorm_shared::{ContentOutput, Fees, Result, ScheduleOutput, Tokens};

use crate::document::Document;

/// Options shared by every document of a run.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Year for dates written without one, unless the document names its own.
    pub base_year: Option<i32>,
}

/// Normalized output of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentOutput {
    pub schedule: ScheduleOutput,
    pub content: ContentOutput,
    #[serde(rename = "수수료", skip_serializing_if = "Option::is_none")]
    pub fees: Option<Fees>,
}

impl DocumentOutput {
    /// Serialized output with every empty value removed.
    pub fn to_pruned_json(&self) -> Result<Value> {
        Ok(prune(serde_json::to_value(self)?))
    }
}

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a document is read.
    fn document_started(&self, path: &Path, current: usize, total: usize);
    /// Called when a document has been normalized or has failed.
    fn document_finished(&self, path: &Path, ok: bool);
    /// Called when the batch completes.
    fn done(&self, summary: &BatchSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn document_started(&self, _path: &Path, _current: usize, _total: usize) {}
    fn document_finished(&self, _path: &Path, _ok: bool) {}
    fn done(&self, _summary: &BatchSummary) {}
}

/// Run the schedule and content normalizers over one document.
///
/// 1. Tables (structured and HTML) through the schedule builder
/// 2. Schedule tree, merged after the tables
/// 3. Content tree
/// 4. Fees from the tables, else from the paragraphs
#[instrument(skip_all, fields(tables = doc.tables.len(), html = doc.html.is_some()))]
pub fn normalize_document(
    doc: &Document,
    tokens: &Tokens,
    options: &NormalizeOptions,
) -> DocumentOutput {
    let base_year = doc.base_year.or(options.base_year);

    let tables = doc.all_tables();
    let from_tables = normalize_tables(&tables, tokens, base_year);
    let from_tree = doc
        .schedule
        .as_ref()
        .map(|tree| normalize_tree(tree, base_year))
        .unwrap_or_default();
    let schedule = merge_outputs(from_tables, from_tree);

    let content = doc
        .content
        .as_ref()
        .map(normalize_content)
        .unwrap_or_default();

    let fees = extract_fees(&tables, &doc.paragraphs, tokens);

    DocumentOutput {
        schedule,
        content,
        fees,
    }
}

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<DocumentOutput>,
}

/// Totals for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub documents: usize,
    pub failed: usize,
    pub entries: usize,
    pub time_slots: usize,
    pub syllabus: usize,
    pub coverage: usize,
    pub elapsed: Duration,
}

/// Normalize each file in order. A file that cannot be read or parsed is
/// reported in its outcome and does not stop the batch.
#[instrument(skip_all, fields(files = paths.len()))]
pub fn normalize_files(
    paths: &[PathBuf],
    tokens: &Tokens,
    options: &NormalizeOptions,
    progress: &dyn ProgressReporter,
) -> (Vec<FileOutcome>, BatchSummary) {
    let start = Instant::now();
    let mut summary = BatchSummary::default();
    let mut outcomes = Vec::with_capacity(paths.len());

    for (i, path) in paths.iter().enumerate() {
        progress.document_started(path, i + 1, paths.len());
        let result = Document::from_path(path).map(|(doc, kind)| {
            info!(path = %path.display(), ?kind, "normalizing document");
            normalize_document(&doc, tokens, options)
        });

        match &result {
            Ok(out) => {
                summary.documents += 1;
                summary.entries += out.schedule.entries.len();
                summary.time_slots += out.schedule.time_slots.len();
                summary.syllabus += out.content.syllabus.len();
                summary.coverage += out.content.coverage.len();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "document failed, skipping");
                summary.failed += 1;
            }
        }
        progress.document_finished(path, result.is_ok());
        outcomes.push(FileOutcome {
            path: path.clone(),
            result,
        });
    }

    summary.elapsed = start.elapsed();
    info!(
        documents = summary.documents,
        failed = summary.failed,
        entries = summary.entries,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "batch complete"
    );
    progress.done(&summary);
    (outcomes, summary)
}
