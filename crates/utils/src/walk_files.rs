use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::warn;

use crate::ExclusionSet;

/// All regular files below `root` that are not excluded, sorted, as absolute paths.
///
/// Ignore files are not honoured: the corrections also apply to files git ignores, only the
/// exclusion patterns decide. `.git` is never entered.
pub fn walk_files(root: &Path, excludes: &ExclusionSet) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut files = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.strip_prefix(root)
                .map(|relative| !excludes.is_excluded(relative))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    files.sort();
    files
}

/// The extension of a file name: the part after the last dot, `None` without a dot or when the
/// name starts with its only dot.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_files_skips_git_and_excludes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for file in [
            ".git/HEAD",
            ".gitignore",
            "src/A.java",
            "build/out.txt",
            "sub/build/out.txt",
            "README.md",
        ] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        // ignored by git but still visited
        fs::write(root.join(".gitignore"), "src/\n").unwrap();

        let excludes = ExclusionSet::new(&["**/build/**"]).unwrap();
        let files = walk_files(root, &excludes)
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect::<Vec<_>>();

        assert_eq!(
            files,
            vec![
                PathBuf::from(".gitignore"),
                PathBuf::from("README.md"),
                PathBuf::from("src/A.java"),
            ]
        );
    }

    #[rstest]
    #[case("A.java", Some("java"))]
    #[case("archive.tar.gz", Some("gz"))]
    #[case("Makefile", None)]
    #[case(".gitignore", None)]
    #[case("dir/x.corrector.sh", Some("sh"))]
    fn test_get_extension(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(get_extension(Path::new(path)).as_deref(), expected);
    }
}
