use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use anyhow::Result;
use branchbuild_core::{BuildContext, VcsGateway, WorkflowDispatcher};
use branchbuild_utils::GitGateway;
use chrono::Local;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::{TriggerStore, find_trigger_workflows};

pub const DEPENDENCIES_DIR: &str = "dependencies";
const STAMP_FORMAT: &str = "%y%m%d%H%M";

/// Where the dependencies repository is cloned for one build
pub fn checkout_dir(ctx: &BuildContext) -> PathBuf {
    ctx.root.join("build").join(DEPENDENCIES_DIR)
}

/// Only branch builds under CI or testing notify their dependents.
pub fn is_active(ctx: &BuildContext) -> bool {
    ctx.branch.ci_or_testing() && !ctx.branch.is_master
}

pub fn commit_message(producing_repo: &str, branch: &str) -> String {
    format!(
        "{producing_repo}:{branch} @{}",
        Local::now().format(STAMP_FORMAT)
    )
}

struct Checkout {
    store: TriggerStore,
    vcs: Arc<dyn VcsGateway>,
}

/// Keeps the trigger records of this repository up to date in the dependencies repository and
/// dispatches the workflows of the repositories that consume what this build publishes.
pub struct DependencyTriggerManager {
    branch: String,
    workflows: BTreeSet<String>,
    checkout: Option<Checkout>,
    dispatcher: Arc<dyn WorkflowDispatcher>,
}

impl DependencyTriggerManager {
    /// Over an existing checkout; inert when the build is not a CI/testing branch build.
    pub fn new(
        ctx: &BuildContext,
        dispatcher: Arc<dyn WorkflowDispatcher>,
        store: TriggerStore,
        vcs: Arc<dyn VcsGateway>,
    ) -> Self {
        let checkout = is_active(ctx).then_some(Checkout { store, vcs });
        Self {
            branch: ctx.branch.branch_name.clone(),
            workflows: find_trigger_workflows(
                &ctx.workflows_dir(),
                ctx.environment.workflow.as_deref(),
            ),
            checkout,
            dispatcher,
        }
    }

    /// Clone the dependencies repository on the current branch. A failing clone is logged and
    /// leaves the manager inert.
    pub async fn open(ctx: &BuildContext, dispatcher: Arc<dyn WorkflowDispatcher>) -> Self {
        let inert = |dispatcher: Arc<dyn WorkflowDispatcher>| Self {
            branch: ctx.branch.branch_name.clone(),
            workflows: BTreeSet::new(),
            checkout: None,
            dispatcher,
        };
        if !is_active(ctx) {
            info!(branch = %ctx.branch.branch_name, "dependency triggers inactive");
            return inert(dispatcher);
        }
        let dir = checkout_dir(ctx);
        info!(
            url = %ctx.config.dependencies_repository_url,
            branch = %ctx.branch.branch_name,
            dir = %dir.display(),
            "cloning dependencies repository"
        );
        match GitGateway::clone_branch(
            &ctx.config.dependencies_repository_url,
            &ctx.branch.branch_name,
            &dir,
            ctx.environment.is_dry_run(),
        )
        .await
        {
            Ok(repo) => Self::new(ctx, dispatcher, TriggerStore::new(&dir), Arc::new(repo)),
            Err(e) => {
                error!("problem with dependencies repository: {e:#}");
                inert(dispatcher)
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.checkout.is_some()
    }

    /// The workflows recorded for this repository
    pub fn workflows(&self) -> &BTreeSet<String> {
        &self.workflows
    }

    /// Record that `producing_repo` consumes `packages`, replacing its earlier records, and push.
    /// Returns whether anything was pushed.
    ///
    /// # Errors
    /// Returns error if the records cannot be written or pushed.
    pub async fn save(&self, producing_repo: &str, packages: &BTreeSet<String>) -> Result<bool> {
        let Some(checkout) = &self.checkout else {
            return Ok(false);
        };
        checkout
            .store
            .save(producing_repo, packages, &self.workflows)
            .await?;
        checkout
            .vcs
            .stage_commit_push(&commit_message(producing_repo, &self.branch))
            .await
    }

    /// Dispatch every workflow recorded for one of `produced`, concurrently. Failed dispatches are
    /// logged and do not fail the build. Returns the number of successful dispatches.
    ///
    /// # Errors
    /// Returns error only if the records cannot be read.
    pub async fn trigger(&self, produced: &BTreeSet<String>) -> Result<usize> {
        let Some(checkout) = &self.checkout else {
            return Ok(0);
        };
        let pairs = checkout
            .store
            .records_for(produced)?
            .into_iter()
            .flat_map(|record| {
                record
                    .workflow_file_names
                    .into_iter()
                    .map(move |workflow| (record.producing_repo.clone(), workflow))
            })
            .collect::<BTreeSet<_>>();

        let results = join_all(pairs.iter().map(|(repo, workflow)| async move {
            info!(repo = %repo, branch = %self.branch, workflow = %workflow, "TRIGGER dependent project");
            let result = self.dispatcher.dispatch(repo, workflow, &self.branch).await;
            (repo, workflow, result)
        }))
        .await;

        let mut dispatched = 0;
        for (repo, workflow, result) in results {
            match result {
                Ok(()) => dispatched += 1,
                Err(e) => warn!(repo = %repo, workflow = %workflow, "could not trigger: {e:#}"),
            }
        }
        Ok(dispatched)
    }
}
