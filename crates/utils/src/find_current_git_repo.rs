use std::path::Path;

use anyhow::{Context, Result};
use gix::{ThreadSafeRepository, discover};

/// The repository enclosing `current_dir`, searching upwards.
///
/// # Errors
/// Returns error if neither `current_dir` nor one of its parents is in a git repository.
pub fn find_current_git_repo(current_dir: &Path) -> Result<ThreadSafeRepository> {
    let repo = discover(current_dir)
        .with_context(|| format!("No git repository at or above {}", current_dir.display()))?
        .into_sync();
    Ok(repo)
}
