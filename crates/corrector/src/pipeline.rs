use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use anyhow::Result;
use branchbuild_core::{BuildContext, CorrectionResult, Corrector, VcsGateway};
use tracing::info;

use crate::{DependabotCorrector, EolCorrector, HeaderCorrector, ScriptCorrector, VersionCorrector};

/// The correction passes of one build, run in order.
pub struct CorrectionPipeline {
    passes: Vec<Box<dyn Corrector>>,
}

impl CorrectionPipeline {
    pub fn new(passes: Vec<Box<dyn Corrector>>) -> Self {
        Self { passes }
    }

    /// dependabot, script, eols, header, version: generated files are in place before the
    /// eol and header passes see them.
    ///
    /// # Errors
    /// Returns `ContextSwitched` when `vcs` belongs to another repository than `ctx`.
    pub fn standard(ctx: Arc<BuildContext>, vcs: Arc<dyn VcsGateway>) -> Result<Self> {
        ctx.ensure_root(vcs.root())?;
        Ok(Self::new(vec![
            Box::new(DependabotCorrector::new(ctx.clone())),
            Box::new(ScriptCorrector::new(ctx.clone())),
            Box::new(EolCorrector::new(ctx.clone())),
            Box::new(HeaderCorrector::new(ctx.clone())),
            Box::new(VersionCorrector::new(ctx, vcs)),
        ]))
    }

    /// Results of the enabled passes
    pub async fn run(&self) -> Result<Vec<CorrectionResult>> {
        let mut results = Vec::new();
        for pass in &self.passes {
            if !pass.enabled() {
                info!(corrector = pass.name(), "skipped: not on CI and not forced");
                continue;
            }
            let result = pass.correct().await?;
            info!(corrector = pass.name(), changed = result.changed_files.len(), "done");
            results.push(result);
        }
        Ok(results)
    }

    /// Union of all changed files
    pub fn reported(results: &[CorrectionResult]) -> BTreeSet<PathBuf> {
        results
            .iter()
            .flat_map(|r| r.changed_files.iter().cloned())
            .collect()
    }
}
