use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use branchbuild_core::BuildError;
use tracing::{error, warn};

/// Jobs guarded with this condition are not started by the commits the tool pushes itself.
pub const NO_CI_GUARD: &str = "!contains(github.event.head_commit.message, '[no-ci]')";

const WORKFLOW_DISPATCH: &str = "workflow_dispatch";

fn is_workflow_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yml" || ext == "yaml")
}

fn workflow_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = std::fs::read_dir(dir)
        .context(format!("Failed to list workflows dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_workflow_file(path))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

fn has_name(content: &str, workflow_name: &str) -> bool {
    content.lines().any(|line| {
        line.strip_prefix("name:")
            .is_some_and(|rest| rest.trim_start_matches(' ') == workflow_name)
    })
}

/// File names of the workflows in `dir` that can be dispatched.
///
/// Those whose `name:` is `workflow_name` when there are any, otherwise every dispatchable one.
/// An absent or unreadable directory yields nothing.
pub fn find_trigger_workflows(dir: &Path, workflow_name: Option<&str>) -> BTreeSet<String> {
    let Ok(files) = workflow_files(dir) else {
        return BTreeSet::new();
    };
    let dispatchable = files
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            content
                .contains(WORKFLOW_DISPATCH)
                .then_some((path, content))
        })
        .collect::<Vec<_>>();
    let file_name = |path: &Path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
    };

    if let Some(workflow_name) = workflow_name {
        let named = dispatchable
            .iter()
            .filter(|(_, content)| has_name(content, workflow_name))
            .filter_map(|(path, _)| file_name(path))
            .collect::<BTreeSet<_>>();
        if !named.is_empty() {
            return named;
        }
    }
    dispatchable
        .iter()
        .filter_map(|(path, _)| file_name(path))
        .collect()
}

/// Jobs of one workflow file that lack the recursion guard
fn unguarded_jobs(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let workflow: serde_yaml::Value = serde_yaml::from_str(&content)
        .context(format!("Failed to parse workflow {}", path.display()))?;
    let Some(jobs) = workflow.get("jobs").and_then(|jobs| jobs.as_mapping()) else {
        warn!(
            file = %path.display(),
            "the workflow file does not contain jobs; is it a workflow file?"
        );
        return Ok(vec![]);
    };
    Ok(jobs
        .iter()
        .filter(|(_, job)| job.get("if").and_then(|v| v.as_str()) != Some(NO_CI_GUARD))
        .map(|(name, _)| name.as_str().unwrap_or("?").to_string())
        .collect())
}

/// Every job of every workflow in `dir` must carry [`NO_CI_GUARD`], otherwise a push made by the
/// build would start the build again.
///
/// # Errors
/// Returns [`BuildError::BuildLoopDanger`] naming the offending files, or an error when the
/// directory cannot be listed.
pub fn check_workflow_guards(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        warn!(
            dir = %dir.display(),
            "can not check for BUILD LOOP DANGER: workflows dir not found"
        );
        return Ok(());
    }
    let mut offending = vec![];
    for path in workflow_files(dir)? {
        match unguarded_jobs(&path) {
            Ok(jobs) if jobs.is_empty() => {}
            Ok(jobs) => {
                for job in &jobs {
                    error!(
                        file = %path.display(),
                        job = %job,
                        "RECURSION DANGER: job does not guard against retriggering (add 'if: \"{NO_CI_GUARD}\"')"
                    );
                }
                offending.push(path);
            }
            Err(e) => warn!(file = %path.display(), "can not check workflow: {e:#}"),
        }
    }
    if !offending.is_empty() {
        return Err(BuildError::BuildLoopDanger { files: offending }.into());
    }
    Ok(())
}
