//! Shared utilities: branch name sanitization and resolution.

pub mod branch;
pub mod sanitize;

pub use branch::{resolve_branch_name, resolve_branch_name_with, BRANCH_ENV_VAR};
pub use sanitize::sanitize_branch_name;
