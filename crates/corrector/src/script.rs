use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use branchbuild_core::{BuildContext, CorrectionResult, Corrector};
use branchbuild_utils::{ExclusionSet, walk_files};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::{FileWriter, file_writer::is_fatal, read_lines};

pub const CORRECTOR_EXT: &str = ".corrector.sh";

/// Regenerates `<name>` from the standard output of every `<name>.corrector.sh`.
pub struct ScriptCorrector {
    ctx: Arc<BuildContext>,
}

impl ScriptCorrector {
    pub fn new(ctx: Arc<BuildContext>) -> Self {
        Self { ctx }
    }

    async fn run_script(&self, writer: &mut FileWriter, script: &Path, output_name: &str) -> Result<()> {
        let dir = script.parent().context("Script has no parent directory")?;
        info!(script = %script.display(), "running");
        let output = Command::new("bash")
            .arg(script)
            .current_dir(dir)
            .output()
            .await
            .context(format!("could not run {}", script.display()))?;
        if !output.status.success() {
            error!(
                script = %script.display(),
                "run of script resulted in an error ({})",
                output.status
            );
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            info!(script = %script.display(), "produced messages on stderr:");
            for line in stderr.lines() {
                info!("    {line}");
            }
        }
        let (lines, _) = read_lines(&String::from_utf8_lossy(&output.stdout));
        writer.overwrite(&dir.join(output_name), &lines).await?;
        Ok(())
    }
}

#[async_trait]
impl Corrector for ScriptCorrector {
    fn name(&self) -> &str {
        "script"
    }

    fn enabled(&self) -> bool {
        self.ctx.branch.ci_or_testing() || self.ctx.config.force_script_correction
    }

    async fn correct(&self) -> Result<CorrectionResult> {
        let mut writer = FileWriter::new(self.name(), &self.ctx.root, self.ctx.branch.is_testing);
        let excludes = ExclusionSet::new(&self.ctx.config.script_file_excludes)?;
        let scripts = walk_files(&self.ctx.root, &excludes)
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_string_lossy().to_string();
                let output = name.strip_suffix(CORRECTOR_EXT)?.to_string();
                Some((path, output))
            })
            .collect::<Vec<_>>();

        if !cfg!(unix) {
            for (script, _) in &scripts {
                warn!(script = %script.display(), "scripts only run on unix hosts, skipped");
            }
            return Ok(writer.into_result());
        }
        for (script, output) in scripts {
            if let Err(e) = self.run_script(&mut writer, &script, &output).await {
                if is_fatal(&e) {
                    return Err(e);
                }
                error!(script = %script.display(), "could not run (ignored): {e:#}");
            }
        }
        Ok(writer.into_result())
    }
}
