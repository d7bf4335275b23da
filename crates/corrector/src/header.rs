use std::{collections::BTreeMap, path::Path, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use branchbuild_core::{BuildContext, CorrectionResult, Corrector};
use branchbuild_utils::{ExclusionSet, get_extension, walk_files};
use regex::Regex;
use tracing::{debug, error, info};

use crate::{FileWriter, file_writer::is_fatal, load_header_template, read_lines};

const NO_HEADER: &str = "no header available";

/// Remove comment markers, frames and indentation from a header template
pub fn cleanup(pre: &str, template: &[String]) -> Vec<String> {
    let frame = |prefix: &str| Regex::new(&format!("^{}~+$", regex::escape(prefix))).ok();
    let frames = [frame(pre), frame("//")];
    let mut lines = template
        .iter()
        .map(|l| l.trim_end())
        .filter(|l| !frames.iter().flatten().any(|f| f.is_match(l)))
        .map(|l| {
            let l = l.strip_prefix(pre).unwrap_or(l);
            let l = l.strip_prefix("//").unwrap_or(l);
            let l = l.strip_suffix('~').unwrap_or(l);
            l.trim_end().to_string()
        })
        .collect::<Vec<_>>();

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min();
    if let Some(indent) = indent.filter(|i| *i > 0) {
        lines = lines
            .iter()
            .map(|l| l.get(indent..).unwrap_or("").to_string())
            .collect();
    }

    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].to_vec(),
        _ => vec![NO_HEADER.to_string()],
    }
}

/// The header block for comment prefix `pre`: a tilde frame around the cleaned template,
/// followed by one blank line
pub fn border(pre: &str, template: &[String]) -> Vec<String> {
    let cleaned = cleanup(pre, template);
    let len = cleaned
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let frame = format!("{pre}~{}~~", "~".repeat(len));
    let mut bordered = Vec::with_capacity(cleaned.len() + 3);
    bordered.push(frame.clone());
    bordered.extend(cleaned.iter().map(|l| format!("{pre} {l:<len$} ~")));
    bordered.push(frame);
    bordered.push(String::new());
    bordered
}

fn is_header_line(line: &str, pre: &str) -> bool {
    (line.starts_with(pre) && line.ends_with('~')) || line.trim().is_empty()
}

fn hash_bang_offset(lines: &[String]) -> usize {
    usize::from(lines.first().is_some_and(|l| l.starts_with("#!")))
}

/// Replace the header block after an optional `#!` line by `header`
pub fn replace_header(mut lines: Vec<String>, header: &[String], pre: &str) -> Vec<String> {
    let base = hash_bang_offset(&lines);
    while lines.len() > base && is_header_line(&lines[base], pre) {
        lines.remove(base);
    }
    let base = hash_bang_offset(&lines);
    lines.splice(base..base, header.iter().cloned());
    lines
}

/// Puts the organisation's license header on top of every source file with a known comment
/// convention.
pub struct HeaderCorrector {
    ctx: Arc<BuildContext>,
}

impl HeaderCorrector {
    pub fn new(ctx: Arc<BuildContext>) -> Self {
        Self { ctx }
    }

    async fn correct_file(
        &self,
        writer: &mut FileWriter,
        file: &Path,
        header: &[String],
        pre: &str,
    ) -> Result<()> {
        let content = tokio::fs::read_to_string(file).await?;
        let (lines, _) = read_lines(&content);
        writer.overwrite(file, &replace_header(lines, header, pre)).await?;
        Ok(())
    }
}

#[async_trait]
impl Corrector for HeaderCorrector {
    fn name(&self) -> &str {
        "header"
    }

    fn enabled(&self) -> bool {
        self.ctx.branch.ci_or_testing() || self.ctx.config.force_header_correction
    }

    async fn correct(&self) -> Result<CorrectionResult> {
        let config = &self.ctx.config;
        let mut writer = FileWriter::new(self.name(), &self.ctx.root, self.ctx.branch.is_testing);
        let Some(template) = load_header_template(&config.header_url).await else {
            return Ok(writer.into_result());
        };
        for (ext, pre) in &config.header_file_extensions {
            debug!(extension = %ext, prefix = %pre, "header extension");
        }

        let excludes = ExclusionSet::new(&config.header_file_excludes)?;
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for file in walk_files(&self.ctx.root, &excludes) {
            let Some(ext) = get_extension(&file) else {
                continue;
            };
            let Some(pre) = config.header_file_extensions.get(&ext) else {
                continue;
            };
            if tokio::fs::metadata(&file).await.map(|m| m.len()).unwrap_or(0) == 0 {
                continue;
            }
            let header = headers
                .entry(ext)
                .or_insert_with(|| border(pre, &template));
            if let Err(e) = self.correct_file(&mut writer, &file, header, pre).await {
                if is_fatal(&e) {
                    return Err(e);
                }
                error!(file = %file.display(), "inserting a header impossible, file skipped: {e:#}");
            }
        }
        let result = writer.into_result();
        info!(changed = result.changed_files.len(), "header correction done");
        Ok(result)
    }
}
