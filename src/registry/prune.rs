//! Retention: keep the most recently deployed records, delete the rest.

use std::fs;

use log::{info, warn};

use super::FeatureRegistry;
use crate::error::{AggregateError, RegistryError};
use crate::record::FeatureRecord;

/// Outcome of [`FeatureRegistry::prune`]
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Records retained, most recent first
    pub kept: Vec<FeatureRecord>,
    /// Identifiers whose files were deleted
    pub removed: Vec<String>,
    /// Deletions that failed
    pub failures: Vec<RegistryError>,
}

impl PruneReport {
    pub fn into_result(self) -> Result<Self, AggregateError> {
        let PruneReport { kept, removed, failures } = self;
        match AggregateError::from_failures(failures) {
            Some(aggregate) => Err(aggregate),
            None => Ok(PruneReport {
                kept,
                removed,
                failures: Vec::new(),
            }),
        }
    }
}

impl FeatureRegistry {
    /// Delete the files of every record beyond the `max_features` most
    /// recently deployed.
    ///
    /// Nothing happens when there are fewer than `max_features` records.
    /// Records with equal timestamps keep their input order. A failed
    /// deletion is recorded and the remaining deletions still run.
    pub fn prune(&self, mut records: Vec<FeatureRecord>, max_features: usize) -> PruneReport {
        if records.len() < max_features {
            info!(
                "Total features ({}) is less than max features ({}) - nothing to do",
                records.len(),
                max_features
            );
            return PruneReport {
                kept: records,
                ..PruneReport::default()
            };
        }

        records.sort_by(|a, b| b.last_deployed.cmp(&a.last_deployed));
        let to_remove = records.split_off(max_features);

        info!("Keep: {:?}", identifiers(&records));
        info!("Remove: {:?}", identifiers(&to_remove));

        let mut report = PruneReport {
            kept: records,
            ..PruneReport::default()
        };

        for record in to_remove {
            let path = self.record_path(&record.identifier);
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Deleted {}", path.display());
                    report.removed.push(record.identifier);
                }
                Err(e) => {
                    warn!("Failed to delete {}: {}", path.display(), e);
                    report.failures.push(RegistryError::io("failed to delete", path, e));
                }
            }
        }

        report
    }
}

fn identifiers(records: &[FeatureRecord]) -> Vec<&str> {
    records.iter().map(|r| r.identifier.as_str()).collect()
}
