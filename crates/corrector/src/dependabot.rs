use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use branchbuild_core::{BuildContext, CorrectionResult, Corrector};
use tracing::info;

use crate::{FileWriter, read_lines};

pub const NO_TOUCH_MARKER: &str = "#notouch";

pub fn dependabot_lines(target_branch: &str) -> Vec<String> {
    let mut lines = vec!["version: 2".to_string(), "updates:".to_string()];
    for ecosystem in ["gradle", "github-actions"] {
        lines.extend([
            format!("  - package-ecosystem: \"{ecosystem}\""),
            "    directory: \"/\"".to_string(),
            format!("    target-branch: \"{target_branch}\""),
            "    schedule:".to_string(),
            "      interval: \"daily\"".to_string(),
        ]);
    }
    lines
}

/// The lines that matter: no comments, no blank lines
fn significant<S: AsRef<str>>(lines: &[S]) -> Vec<&str> {
    lines
        .iter()
        .map(|l| l.as_ref().trim_end())
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .collect()
}

/// Keeps `.github/dependabot.yml` in the organisation's standard shape, unless it says
/// `#notouch`.
pub struct DependabotCorrector {
    ctx: Arc<BuildContext>,
}

impl DependabotCorrector {
    pub fn new(ctx: Arc<BuildContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Corrector for DependabotCorrector {
    fn name(&self) -> &str {
        "dependabot"
    }

    fn enabled(&self) -> bool {
        self.ctx.branch.ci_or_testing() || self.ctx.config.force_dependabot_correction
    }

    async fn correct(&self) -> Result<CorrectionResult> {
        let file = self.ctx.root.join(".github").join("dependabot.yml");
        let mut writer = FileWriter::new(self.name(), &self.ctx.root, self.ctx.branch.is_testing);
        let desired = dependabot_lines(&self.ctx.config.integration_branch);

        if file.is_file() {
            let content = tokio::fs::read_to_string(&file).await?;
            if content.contains(NO_TOUCH_MARKER) {
                info!(file = %file.display(), "{NO_TOUCH_MARKER} found, not touching");
                return Ok(writer.into_result());
            }
            let (existing, _) = read_lines(&content);
            if significant(&existing) == significant(&desired) {
                info!(file = %file.display(), "untouched");
                return Ok(writer.into_result());
            }
        }
        writer.overwrite(&file, &desired).await?;
        Ok(writer.into_result())
    }
}
