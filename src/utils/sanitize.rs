//! Branch name sanitization.
//!
//! Branch names become file names and record identifiers, so anything other
//! than ASCII letters, digits and spaces is collapsed into a `-`.

use regex::Regex;
use std::sync::LazyLock;

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9 ]+").expect("Invalid branch sanitization regex"));

/// Replace every run of characters outside `[a-zA-Z0-9 ]` with a single `-`
///
/// # Examples
/// ```
/// use feature_registry::utils::sanitize_branch_name;
///
/// assert_eq!(sanitize_branch_name("feature/JIRA-123_login"), "feature-JIRA-123-login");
/// assert_eq!(sanitize_branch_name("fix//double"), "fix-double");
/// assert_eq!(sanitize_branch_name("main"), "main");
/// ```
pub fn sanitize_branch_name(name: &str) -> String {
    UNSAFE_RUN.replace_all(name, "-").into_owned()
}
