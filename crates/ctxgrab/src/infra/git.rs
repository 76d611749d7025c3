//! Git branch discovery.

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Branch names that never name a feature.
const NON_FEATURE_BRANCHES: [&str; 2] = ["main", "origin"];

/// Short name of the checked-out branch, `None` when HEAD is detached.
pub fn current_branch(path: &Path) -> Result<Option<String>> {
    let repo = gix::discover(path)
        .with_context(|| format!("no git repository found at {}", path.display()))?;
    let head = repo.head_name().context("failed to read HEAD")?;
    Ok(head.map(|name| name.shorten().to_string()))
}

/// The checked-out branch, refusing detached HEADs and trunk branches.
pub fn feature_branch(path: &Path) -> Result<String> {
    match current_branch(path)? {
        None => bail!("no active branch found, aborting smartgrab"),
        Some(branch) => check_feature_branch(branch),
    }
}

fn check_feature_branch(branch: String) -> Result<String> {
    if NON_FEATURE_BRANCHES.contains(&branch.as_str()) {
        bail!("active branch is '{branch}', aborting smartgrab");
    }
    Ok(branch)
}
