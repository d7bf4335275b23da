//! # branchbuild-triggers
//!
//! Re-running the CI of dependent repositories. Every branch build records, in a shared
//! dependencies repository, which packages it consumes and which of its workflows can be
//! dispatched; a build that publishes a package dispatches the recorded workflows of its
//! consumers on the same branch.
//!
//! Also guards the workflows of the current repository against build loops: pushes made by the
//! build carry `[no-ci]` and every job has to skip those.

mod github;
mod manager;
mod store;
mod workflows;

pub use github::{GITHUB_API_URL, GithubDispatcher};
pub use manager::{
    DEPENDENCIES_DIR, DependencyTriggerManager, checkout_dir, commit_message, is_active,
};
pub use store::{TRIGGER_EXT, TriggerStore, WORKFLOWS_KEY};
pub use workflows::{NO_CI_GUARD, check_workflow_guards, find_trigger_workflows};
