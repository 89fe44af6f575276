use std::path::Path;

use crate::error::ItaloError;
use crate::halo::ImageService;
use crate::state::{paths, ImageRecord, MatchSet};

use super::mover::FileMover;
use super::{count_noun, percent};

/// A validated transfer: the records to move and where to put them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    target_dir: String,
    records: Vec<ImageRecord>,
}

impl TransferPlan {
    /// Check the preconditions, in order, before anything touches the
    /// server or the disk.
    pub fn prepare(matches: &MatchSet, target_dir: &str) -> Result<Self, ItaloError> {
        if matches.is_empty() {
            return Err(ItaloError::EmptyMatchSet);
        }

        let target_dir = paths::trim_separators(target_dir.trim());
        if !paths::is_unc(target_dir) {
            return Err(ItaloError::TargetNotUnc);
        }
        if !Path::new(target_dir).is_dir() {
            return Err(ItaloError::TargetMissing(target_dir.to_string()));
        }

        Ok(Self {
            target_dir: target_dir.to_string(),
            records: matches.records().cloned().collect(),
        })
    }

    pub fn target_dir(&self) -> &str {
        &self.target_dir
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// New location for a record: same file name, target directory
    pub fn target_for(&self, record: &ImageRecord) -> String {
        paths::join(&self.target_dir, paths::file_name(&record.location))
    }
}

/// Outcome of a transfer, handed back to the application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferReport {
    pub total: usize,
    /// Records whose database location was changed
    pub transferred: usize,
    /// Files physically copied to the target
    pub copied: usize,
    /// Records already located in the target directory
    pub identical: usize,
    /// Records the server refused or could not be reached for
    pub failed: usize,
    /// (image ID, new location) of every transferred record
    pub relocated: Vec<(String, String)>,
}

impl TransferReport {
    /// Status line, e.g. "TRANSFERRED: 3 images, COPIED: 2 images."
    pub fn status(&self) -> String {
        let mut status = format!(
            "TRANSFERRED: {}, COPIED: {}.",
            count_noun(self.transferred, "image", "images"),
            count_noun(self.copied, "image", "images"),
        );
        if self.identical > 0 {
            status.push_str(&format!(
                " SKIPPED: {} in identical directories.",
                count_noun(self.identical, "image", "images")
            ));
        }
        if self.failed > 0 {
            status.push_str(&format!(
                " FAILED: {}.",
                count_noun(self.failed, "image", "images")
            ));
        }
        status
    }

    pub fn progress(&self) -> f32 {
        if self.transferred > 0 {
            100.0
        } else {
            0.0
        }
    }
}

/// Relocate every record of `plan`, one at a time.
///
/// Each record first gets its database location changed; the file is
/// copied afterwards when the source still exists and the target does
/// not. Failures are logged and the loop moves on: there is no rollback
/// of a location change whose copy failed. `on_progress` receives the
/// share of transferred records after each one.
pub async fn transfer<S, M, F>(
    service: &S,
    mover: &M,
    plan: &TransferPlan,
    mut on_progress: F,
) -> TransferReport
where
    S: ImageService + ?Sized,
    M: FileMover + ?Sized,
    F: FnMut(f32) + Send,
{
    let mut report = TransferReport {
        total: plan.len(),
        ..TransferReport::default()
    };
    tracing::info!(
        images = report.total,
        target_dir = plan.target_dir(),
        "transferring images"
    );

    for record in &plan.records {
        let target = plan.target_for(record);
        transfer_one(service, mover, record, &target, &mut report).await;
        on_progress(percent(report.transferred, report.total));
    }

    tracing::info!(
        transferred = report.transferred,
        copied = report.copied,
        identical = report.identical,
        failed = report.failed,
        "transfer complete"
    );
    report
}

async fn transfer_one<S, M>(
    service: &S,
    mover: &M,
    record: &ImageRecord,
    target: &str,
    report: &mut TransferReport,
) where
    S: ImageService + ?Sized,
    M: FileMover + ?Sized,
{
    if paths::same_location(&record.location, target) {
        tracing::info!(image = %record.id, location = %record.location, "identical directories");
        report.identical += 1;
        return;
    }

    let change = match service.change_location(&record.id, target).await {
        Ok(change) => change,
        Err(err) => {
            tracing::warn!(image = %record.id, error = %err, "location change failed");
            report.failed += 1;
            return;
        }
    };
    if !change.is_success() {
        tracing::warn!(
            image = %change.image_id,
            errors = ?change.errors,
            "server refused location change"
        );
        report.failed += 1;
        return;
    }

    report.transferred += 1;
    let location = change.location.unwrap_or_else(|| target.to_string());
    report.relocated.push((record.id.clone(), location));

    let source_exists = tokio::fs::try_exists(&record.location).await.unwrap_or(false);
    let target_exists = tokio::fs::try_exists(target).await.unwrap_or(false);
    if !source_exists || target_exists {
        tracing::info!(
            image = %record.id,
            source_exists,
            target_exists,
            "file not copied"
        );
        return;
    }

    match mover.copy(&record.location, target).await {
        Ok(()) => report.copied += 1,
        Err(err) => tracing::error!(image = %record.id, error = %err, "copy failed"),
    }
}
