//! Branch name resolution for the `generate` command.

use crate::error::RegistryError;

/// Environment variable CircleCI sets to the branch being built
pub const BRANCH_ENV_VAR: &str = "CIRCLE_BRANCH";

/// Resolve the branch name from the `--branch` flag or `CIRCLE_BRANCH`
pub fn resolve_branch_name(flag: Option<&str>) -> Result<String, RegistryError> {
    resolve_branch_name_with(flag, |var| std::env::var(var).ok())
}

/// Same as [`resolve_branch_name`] with an injectable environment lookup.
///
/// Empty values count as unset for both sources.
pub fn resolve_branch_name_with<F>(flag: Option<&str>, lookup: F) -> Result<String, RegistryError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(branch) = flag.filter(|b| !b.is_empty()) {
        return Ok(branch.to_string());
    }

    match lookup(BRANCH_ENV_VAR) {
        Some(branch) if !branch.is_empty() => {
            log::debug!("Using branch name from {}: {}", BRANCH_ENV_VAR, branch);
            Ok(branch)
        }
        _ => Err(RegistryError::BranchNotFound { var: BRANCH_ENV_VAR }),
    }
}
