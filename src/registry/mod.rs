//! # Feature Registry
//!
//! The registry treats a directory of JSON files as a flat key-value store
//! keyed by sanitized branch name. There is no index: the directory listing is
//! the source of truth, and each `<identifier>.json` file holds exactly one
//! [`FeatureRecord`].
//!
//! ## Layout
//!
//! ```text
//! feature/
//! |-- .gitkeep            # sentinel, never parsed
//! |-- my-branch.json
//! \-- feature-login.json
//! ```
//!
//! ## Operations
//!
//! - [`FeatureRegistry::generate`]: create or update the record for a branch
//! - [`FeatureRegistry::list_all`]: parse every record, collecting failures
//! - [`FeatureRegistry::prune`]: delete all but the most recently deployed records
//!
//! The registry assumes exclusive access to its directory for the duration of
//! one invocation. Writes are not atomic.

mod prune;

pub use prune::PruneReport;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::error::{AggregateError, RegistryError};
use crate::record::{Component, FeatureRecord};
use crate::utils::sanitize_branch_name;

/// Directory holding records when nothing else is configured
pub const DEFAULT_FEATURE_DIR: &str = "feature";

/// Placeholder file that keeps the empty directory in git
pub const SENTINEL_FILE: &str = ".gitkeep";

/// Inputs for [`FeatureRegistry::generate`]
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub branch_name: String,
    pub ui_tag: String,
    pub appserver_tag: String,
    /// Required when the record already exists
    pub component: Option<Component>,
}

/// Result of [`FeatureRegistry::list_all`]: the records that parsed, plus
/// one error per entry that did not
#[derive(Debug, Default)]
pub struct RecordScan {
    pub records: Vec<FeatureRecord>,
    pub failures: Vec<RegistryError>,
}

impl RecordScan {
    /// All records if every entry parsed, otherwise the aggregated failures
    pub fn into_result(self) -> Result<Vec<FeatureRecord>, AggregateError> {
        match AggregateError::from_failures(self.failures) {
            Some(aggregate) => Err(aggregate),
            None => Ok(self.records),
        }
    }
}

/// Records stored as JSON files in a single directory
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    dir: PathBuf,
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_DIR)
    }
}

impl FeatureRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `identifier`
    pub fn record_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.json", identifier))
    }

    /// Read and parse the record stored for `identifier`, if there is one
    pub fn load(&self, identifier: &str) -> Result<Option<FeatureRecord>, RegistryError> {
        let path = self.record_path(identifier);
        match fs::read_to_string(&path) {
            Ok(content) => parse_record(&path, &content).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::io("failed to read", path, e)),
        }
    }

    /// Create or update the record for a branch, stamped with the current time
    pub fn generate(&self, request: &GenerateRequest) -> Result<FeatureRecord, RegistryError> {
        self.generate_at(request, Utc::now())
    }

    /// Create or update the record for a branch, stamped with `now`.
    ///
    /// A new record takes both tags. An existing record only takes the tag
    /// named by `request.component`; without one the update is rejected and
    /// the file is left untouched.
    pub fn generate_at(
        &self,
        request: &GenerateRequest,
        now: DateTime<Utc>,
    ) -> Result<FeatureRecord, RegistryError> {
        let identifier = sanitize_branch_name(&request.branch_name);

        info!(
            "Generating feature record: identifier={} appserver_tag={} ui_tag={}",
            identifier, request.appserver_tag, request.ui_tag
        );

        let record = match self.load(&identifier)? {
            None => {
                info!("No existing record for '{}', creating one", identifier);
                FeatureRecord::new(&identifier, &request.appserver_tag, &request.ui_tag, now)
            }
            Some(mut existing) => {
                match request.component {
                    Some(Component::Appserver) => {
                        existing.appserver_image_tag = request.appserver_tag.clone();
                    }
                    Some(Component::Ui) => {
                        existing.ui_image_tag = request.ui_tag.clone();
                    }
                    None => return Err(RegistryError::ComponentRequired),
                }
                info!(
                    "Updating {} tag of existing record '{}'",
                    request.component.map_or("", |c| c.as_str()),
                    identifier
                );
                existing.last_deployed = now;
                existing
            }
        };

        self.write(&record)?;
        Ok(record)
    }

    /// Serialize `record` as indented JSON, replacing any previous content
    pub fn write(&self, record: &FeatureRecord) -> Result<PathBuf, RegistryError> {
        let json = serde_json::to_string_pretty(record).map_err(|source| RegistryError::Serialize {
            identifier: record.identifier.clone(),
            source,
        })?;

        fs::create_dir_all(&self.dir)
            .map_err(|e| RegistryError::io("failed to create directory", &self.dir, e))?;

        let path = self.record_path(&record.identifier);
        debug!("Writing feature record to {}:\n{}", path.display(), json);
        fs::write(&path, json + "\n").map_err(|e| RegistryError::io("failed to write", &path, e))?;

        Ok(path)
    }

    /// Parse every record in the directory.
    ///
    /// Directories and the `.gitkeep` sentinel are skipped. An entry that
    /// cannot be read or parsed is recorded in [`RecordScan::failures`] and
    /// the scan moves on.
    pub fn list_all(&self) -> RecordScan {
        let mut scan = RecordScan::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read feature directory {}: {}", self.dir.display(), e);
                scan.failures
                    .push(RegistryError::io("failed to read directory", &self.dir, e));
                return scan;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    scan.failures
                        .push(RegistryError::io("failed to read entry in", &self.dir, e));
                    continue;
                }
            };

            let path = entry.path();
            let is_dir = match entry.file_type() {
                Ok(file_type) => file_type.is_dir(),
                Err(e) => {
                    scan.failures
                        .push(RegistryError::io("failed to stat", path, e));
                    continue;
                }
            };
            if is_dir {
                info!("Skipping directory {}", path.display());
                continue;
            }
            if entry.file_name() == SENTINEL_FILE {
                continue;
            }

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    scan.failures.push(RegistryError::io("failed to read", path, e));
                    continue;
                }
            };

            match parse_record(&path, &content) {
                Ok(record) => {
                    debug!("Loaded {}: {:?}", path.display(), record);
                    scan.records.push(record);
                }
                Err(e) => {
                    warn!("{}", e);
                    scan.failures.push(e);
                }
            }
        }

        info!(
            "Found {} feature records ({} failures) in {}",
            scan.records.len(),
            scan.failures.len(),
            self.dir.display()
        );
        scan
    }
}

fn parse_record(path: &Path, content: &str) -> Result<FeatureRecord, RegistryError> {
    serde_json::from_str(content).map_err(|source| RegistryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn request(
        branch: &str,
        appserver: &str,
        ui: &str,
        component: Option<Component>,
    ) -> GenerateRequest {
        GenerateRequest {
            branch_name: branch.to_string(),
            ui_tag: ui.to_string(),
            appserver_tag: appserver.to_string(),
            component,
        }
    }

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_creates_record() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());

        let before = Utc::now();
        let record = registry
            .generate(&request("feature/login", "app-1", "ui-1", None))
            .unwrap();
        let after = Utc::now();

        assert_eq!(record.identifier, "feature-login");
        assert!(record.last_deployed >= before && record.last_deployed <= after);

        let stored = registry.load("feature-login").unwrap().unwrap();
        assert_eq!(stored, record);
        assert_eq!(stored.appserver_image_tag, "app-1");
        assert_eq!(stored.ui_image_tag, "ui-1");
    }

    #[test]
    fn test_generate_writes_indented_json() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        registry
            .generate_at(&request("my-branch", "main", "main", None), jan(1))
            .unwrap();

        let content = fs::read_to_string(dir.path().join("my-branch.json")).unwrap();
        assert!(content.starts_with("{\n  \"identifier\": \"my-branch\""));
        assert!(content.contains("\"appserverImageTag\": \"main\""));
        assert!(content.contains("\"lastDeployed\": \"2024-01-01T12:00:00Z\""));
    }

    #[test]
    fn test_generate_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path().join("nested").join("feature"));
        registry.generate(&request("b", "t", "t", None)).unwrap();
        assert!(registry.record_path("b").exists());
    }

    #[test]
    fn test_update_changes_only_selected_component() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        registry
            .generate_at(&request("feat", "app-1", "ui-1", None), jan(1))
            .unwrap();

        let updated = registry
            .generate_at(&request("feat", "app-2", "ui-2", Some(Component::Ui)), jan(2))
            .unwrap();
        assert_eq!(updated.appserver_image_tag, "app-1");
        assert_eq!(updated.ui_image_tag, "ui-2");
        assert_eq!(updated.last_deployed, jan(2));

        let updated = registry
            .generate_at(&request("feat", "app-3", "ui-3", Some(Component::Appserver)), jan(3))
            .unwrap();
        assert_eq!(updated.appserver_image_tag, "app-3");
        assert_eq!(updated.ui_image_tag, "ui-2");
        assert_eq!(registry.load("feat").unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_without_component_is_rejected() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        let original = registry
            .generate_at(&request("feat", "app-1", "ui-1", None), jan(1))
            .unwrap();

        let err = registry
            .generate_at(&request("feat", "app-2", "ui-2", None), jan(2))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(registry.load("feat").unwrap().unwrap(), original);
    }

    #[test]
    fn test_update_of_corrupt_record_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        fs::write(dir.path().join("feat.json"), "{ not json").unwrap();

        let err = registry
            .generate(&request("feat", "a", "u", Some(Component::Ui)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_list_all_skips_sentinel_and_directories() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        fs::write(dir.path().join(SENTINEL_FILE), "").unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
        registry
            .write(&FeatureRecord::new("a", "main", "main", jan(1)))
            .unwrap();

        let scan = registry.list_all();
        assert!(scan.failures.is_empty());
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.records[0].identifier, "a");
    }

    #[test]
    fn test_list_all_missing_directory_reports_failure() {
        let dir = TempDir::new().unwrap();
        let registry = FeatureRegistry::new(dir.path().join("absent"));

        let scan = registry.list_all();
        assert!(scan.records.is_empty());
        assert_eq!(scan.failures.len(), 1);
        assert_eq!(scan.failures[0].kind(), ErrorKind::IoError);
    }

    #[test]
    fn test_scan_into_result() {
        let clean = RecordScan {
            records: vec![FeatureRecord::new("a", "t", "t", jan(1) + Duration::hours(1))],
            failures: Vec::new(),
        };
        assert_eq!(clean.into_result().unwrap().len(), 1);

        let dirty = RecordScan {
            records: Vec::new(),
            failures: vec![RegistryError::ComponentRequired],
        };
        assert_eq!(dirty.into_result().unwrap_err().errors().len(), 1);
    }
}
