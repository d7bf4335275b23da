use std::{collections::BTreeSet, path::PathBuf};

use anyhow::Result;
use branchbuild_core::VcsGateway;
use tracing::debug;

/// Keep only the reported files version control also sees as modified, untracked or missing.
///
/// Passes can undo each other's work; such files are reported but unchanged.
pub async fn verify(
    reported: &BTreeSet<PathBuf>,
    vcs: &dyn VcsGateway,
) -> Result<BTreeSet<PathBuf>> {
    let actual = vcs.status().await?.all_changed();
    let verified = reported
        .intersection(&actual)
        .cloned()
        .collect::<BTreeSet<_>>();
    for dropped in reported.difference(&verified) {
        debug!(file = %dropped.display(), "reported as changed but unchanged in version control");
    }
    Ok(verified)
}
