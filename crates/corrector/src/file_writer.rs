use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use branchbuild_core::{BuildError, CorrectionResult, WriteOutcome};
use tracing::{debug, info};

/// Split on `\r\n`, `\n\r`, `\n` and a lone `\r`.
///
/// Returns the lines and whether the content ended with a terminator.
pub fn read_lines(content: &str) -> (Vec<String>, bool) {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut terminated = false;
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' | '\n' => {
                let pair = if c == '\r' { '\n' } else { '\r' };
                if chars.peek() == Some(&pair) {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
                terminated = true;
            }
            _ => {
                current.push(c);
                terminated = false;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    (lines, terminated)
}

/// Writes files only when their content changes, and remembers what it changed.
///
/// A new file gets every line terminated by `\n`. An existing file keeps its trailing terminator
/// presence; its line terminators all become `\n`.
pub struct FileWriter {
    corrector_name: String,
    root: PathBuf,
    verify: bool,
    changed: BTreeSet<PathBuf>,
}

impl FileWriter {
    /// In `verify` mode every write is read back and compared.
    pub fn new(corrector_name: &str, root: &Path, verify: bool) -> Self {
        Self {
            corrector_name: corrector_name.to_string(),
            root: root.to_path_buf(),
            verify,
            changed: BTreeSet::new(),
        }
    }

    fn relative(&self, file: &Path) -> PathBuf {
        file.strip_prefix(&self.root).unwrap_or(file).to_path_buf()
    }

    /// # Errors
    /// Returns error on I/O failure, or `WriteVerification` when a verified write reads back
    /// differently.
    pub async fn overwrite(&mut self, file: &Path, lines: &[String]) -> Result<WriteOutcome> {
        let relative = self.relative(file);
        let (desired, outcome) = if !file.is_file() {
            let mut desired = lines.join("\n");
            desired.push('\n');
            (desired, WriteOutcome::Generated)
        } else {
            let was = tokio::fs::read_to_string(file)
                .await
                .context(format!("Failed to read {}", file.display()))?;
            let mut desired = lines.join("\n");
            if was.ends_with('\n') || was.ends_with('\r') {
                desired.push('\n');
            }
            if desired == was {
                info!(corrector = %self.corrector_name, file = %relative.display(), "untouched");
                return Ok(WriteOutcome::Untouched);
            }
            debug!(
                "====\n{}====\n{desired}====",
                was.replace('\r', "\u{2022}")
            );
            (desired, WriteOutcome::Regenerated)
        };

        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(file, &desired)
            .await
            .context(format!("Failed to write {}", file.display()))?;
        if self.verify {
            let written = tokio::fs::read_to_string(file).await?;
            if written != desired {
                return Err(BuildError::WriteVerification {
                    file: file.to_path_buf(),
                }
                .into());
            }
        }
        info!(corrector = %self.corrector_name, file = %relative.display(), "{outcome}");
        self.changed.insert(relative);
        Ok(outcome)
    }

    pub fn into_result(self) -> CorrectionResult {
        CorrectionResult {
            corrector_name: self.corrector_name,
            changed_files: self.changed,
        }
    }
}

/// Fatal errors stop a pass; anything else only skips the file at hand.
pub(crate) fn is_fatal(error: &anyhow::Error) -> bool {
    error.downcast_ref::<BuildError>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("", &[], false)]
    #[case("a", &["a"], false)]
    #[case("a\n", &["a"], true)]
    #[case("a\nb", &["a", "b"], false)]
    #[case("a\r\nb\r\n", &["a", "b"], true)]
    #[case("a\n\rb\n\r", &["a", "b"], true)]
    #[case("a\rb\r", &["a", "b"], true)]
    #[case("a\n\nb", &["a", "", "b"], false)]
    #[case("a\r\n\r\n", &["a", ""], true)]
    #[case("\n", &[""], true)]
    fn test_read_lines(#[case] content: &str, #[case] lines: &[&str], #[case] terminated: bool) {
        assert_eq!(read_lines(content), (strings(lines), terminated));
    }

    #[tokio::test]
    async fn test_generated_regenerated_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("sub").join("f.txt");
        let mut writer = FileWriter::new("test", temp_dir.path(), true);

        let lines = strings(&["a", "b"]);
        assert_eq!(writer.overwrite(&file, &lines).await.unwrap(), WriteOutcome::Generated);
        assert_eq!(fs::read_to_string(&file).unwrap(), "a\nb\n");

        assert_eq!(writer.overwrite(&file, &lines).await.unwrap(), WriteOutcome::Untouched);

        let lines = strings(&["a", "c"]);
        assert_eq!(writer.overwrite(&file, &lines).await.unwrap(), WriteOutcome::Regenerated);
        assert_eq!(fs::read_to_string(&file).unwrap(), "a\nc\n");

        let result = writer.into_result();
        assert_eq!(result.corrector_name, "test");
        assert_eq!(result.changed_files, BTreeSet::from([PathBuf::from("sub/f.txt")]));
    }

    #[tokio::test]
    async fn test_missing_trailing_newline_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.txt");
        fs::write(&file, "a\nb").unwrap();
        let mut writer = FileWriter::new("test", temp_dir.path(), false);

        let outcome = writer.overwrite(&file, &strings(&["a", "b"])).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Untouched);
        assert!(writer.into_result().is_empty());
    }

    #[tokio::test]
    async fn test_crlf_is_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.txt");
        fs::write(&file, "a\r\nb\r\n").unwrap();
        let mut writer = FileWriter::new("test", temp_dir.path(), true);

        let (lines, _) = read_lines(&fs::read_to_string(&file).unwrap());
        let outcome = writer.overwrite(&file, &lines).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Regenerated);
        assert_eq!(fs::read_to_string(&file).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_is_fatal() {
        assert!(is_fatal(&anyhow::Error::from(BuildError::VersionNotSet)));
        assert!(!is_fatal(&anyhow::anyhow!("io")));
    }
}
