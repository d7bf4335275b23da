use std::path::Path;

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Glob patterns matched against root relative paths (always with `/` separators).
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// # Errors
    /// Returns error when one of the patterns is not a valid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).context(format!("Invalid exclusion pattern: {}", p.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(&path, MATCH_OPTIONS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchbuild_core::Config;
    use rstest::rstest;

    #[rstest]
    #[case(".git/config", true)]
    #[case(".github/workflows/build.yaml", true)]
    #[case(".github/dependabot.yml", false)]
    #[case("gradlew", true)]
    #[case("gradlew.bat", true)]
    #[case("sub/gradlew", false)]
    #[case("build/libs/a.jar", true)]
    #[case("module/build/classes/A.class", true)]
    #[case("src/main/java/A.java", false)]
    #[case("lang/models/x_gen/A.java", true)]
    #[case("MPS/lib/mps.jar", true)]
    fn test_default_excludes(#[case] path: &str, #[case] excluded: bool) {
        let excludes = ExclusionSet::new(&Config::default().header_file_excludes).unwrap();
        assert_eq!(excludes.is_excluded(Path::new(path)), excluded);
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let excludes = ExclusionSet::default();
        assert!(!excludes.is_excluded(Path::new(".git/config")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(ExclusionSet::new(&["a[b"]).is_err());
    }
}
