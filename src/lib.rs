//! # Feature Registry - deployment records for feature branches
//!
//! This library keeps one small JSON record per feature branch deployed by
//! CI: the image tags in use and when the branch was last deployed. Old
//! records are pruned once a retention limit is exceeded, oldest first.
//!
//! ## Architecture
//!
//! - `record`: the `FeatureRecord` file format and the `Component` selector
//! - `registry`: generating, listing and pruning records in a directory
//! - `utils`: branch name sanitization and resolution
//! - `config`: optional YAML settings
//! - `error`: typed errors and per-record failure aggregation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use feature_registry::record::Component;
//! use feature_registry::registry::{FeatureRegistry, GenerateRequest};
//!
//! let registry = FeatureRegistry::new("feature");
//!
//! registry.generate(&GenerateRequest {
//!     branch_name: "feature/login".to_string(),
//!     ui_tag: "ui-42".to_string(),
//!     appserver_tag: "main".to_string(),
//!     component: Some(Component::Ui),
//! })?;
//!
//! let records = registry.list_all().into_result()?;
//! registry.prune(records, 6).into_result()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Record Format
//!
//! ```json
//! {
//!   "identifier": "feature-login",
//!   "appserverImageTag": "main",
//!   "uiImageTag": "ui-42",
//!   "lastDeployed": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return `RegistryError`. Listing and pruning continue
//! past per-record failures and report them together as an `AggregateError`.
//! The binary wraps everything in `color_eyre` reports.

pub mod config;
pub mod error;
pub mod record;
pub mod registry;
pub mod utils;

pub use error::{AggregateError, ErrorKind, RegistryError};
pub use record::{Component, FeatureRecord};
pub use registry::{FeatureRegistry, GenerateRequest, PruneReport, RecordScan};
