use std::{path::Path, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use branchbuild_core::{BuildContext, Config, CorrectionResult, Corrector};
use branchbuild_utils::{ExclusionSet, get_extension, walk_files};
use tracing::{debug, info};

use crate::{FileWriter, file_writer::is_fatal, read_lines};

/// Text by file name first, then by extension; unknown extensions are not touched.
pub fn is_text_file(path: &Path, size: u64, config: &Config) -> bool {
    if size == 0 {
        return false;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if config.text_files.contains(&file_name) {
        return true;
    }
    if config.no_text_files.contains(&file_name) {
        return false;
    }
    let Some(ext) = get_extension(path) else {
        return false;
    };
    if config.text_file_extensions.contains(&ext) {
        return true;
    }
    if !config.no_text_file_extensions.contains(&ext) {
        info!(file = %path.display(), "unknown file type (not correcting EOLs)");
    }
    false
}

/// Normalises the line terminators of text files to `\n`.
pub struct EolCorrector {
    ctx: Arc<BuildContext>,
}

impl EolCorrector {
    pub fn new(ctx: Arc<BuildContext>) -> Self {
        Self { ctx }
    }

    async fn correct_file(&self, writer: &mut FileWriter, file: &Path) -> Result<()> {
        let size = tokio::fs::metadata(file).await?.len();
        if !is_text_file(file, size, &self.ctx.config) {
            return Ok(());
        }
        let content = tokio::fs::read_to_string(file).await?;
        let (lines, _) = read_lines(&content);
        writer.overwrite(file, &lines).await?;
        Ok(())
    }
}

#[async_trait]
impl Corrector for EolCorrector {
    fn name(&self) -> &str {
        "eols"
    }

    fn enabled(&self) -> bool {
        self.ctx.branch.ci_or_testing() || self.ctx.config.force_eol_correction
    }

    async fn correct(&self) -> Result<CorrectionResult> {
        let excludes = ExclusionSet::new(&self.ctx.config.eol_file_excludes)?;
        let mut writer = FileWriter::new(self.name(), &self.ctx.root, self.ctx.branch.is_testing);
        for file in walk_files(&self.ctx.root, &excludes) {
            if let Err(e) = self.correct_file(&mut writer, &file).await {
                if is_fatal(&e) {
                    return Err(e);
                }
                info!(file = %file.display(), "error detected (and ignored): {e:#}");
            }
        }
        let result = writer.into_result();
        debug!(changed = result.changed_files.len(), "eol correction done");
        Ok(result)
    }
}
