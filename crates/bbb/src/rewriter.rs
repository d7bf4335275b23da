use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use branchbuild_core::Coordinate;
use tracing::debug;

pub const BRANCH_INDICATOR: &str = "-BRANCHED";
pub const SNAPSHOT_VERSION_POST: &str = "-SNAPSHOT";
pub const SNAPSHOTS_REPO_POST: &str = "-snapshots";
pub const SNAPSHOTS_GROUP_PRE: &str = "snapshots.";
pub const MAX_BRANCHNAME_PART_LENGTH: usize = 16;

/// 32 bit string hash over UTF-16 code units (`h = 31 * h + unit`), as the JVM computes it.
/// Snapshot versions published by JVM based builds use this hash, so it has to match exactly.
pub fn java_string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// `<branch fragment>-<hash as 8 hex digits>-SNAPSHOT`
fn snapshot_id(branch: &str) -> String {
    let without_params = branch.split_once('@').map_or(branch, |(name, _)| name);
    // per UTF-16 unit, so a character outside the BMP becomes two underscores
    let part = without_params
        .encode_utf16()
        .map(|unit| match char::from_u32(u32::from(unit)) {
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => c,
            _ => '_',
        })
        .take(MAX_BRANCHNAME_PART_LENGTH)
        .collect::<String>();
    format!(
        "{part}-{:08x}{SNAPSHOT_VERSION_POST}",
        java_string_hash(branch) as u32
    )
}

/// Append `-snapshots` to a repository url, once
pub fn snapshot_repository(url: &str) -> String {
    let trimmed = url.strip_suffix('/').unwrap_or(url);
    if trimmed.is_empty() || trimmed.ends_with(SNAPSHOTS_REPO_POST) {
        url.to_string()
    } else {
        format!("{trimmed}{SNAPSHOTS_REPO_POST}")
    }
}

/// Rewrites coordinates into the snapshot namespace of a branch.
///
/// On the trunk branch under CI or testing nothing is rewritten: those builds publish releases.
/// Snapshot ids are memoised per branch name for the lifetime of the rewriter, which lives as
/// long as one build.
#[derive(Debug)]
pub struct CoordinateRewriter {
    ci_or_testing: bool,
    trunk_branch: String,
    snapshot_ids: Mutex<HashMap<String, String>>,
}

impl CoordinateRewriter {
    pub fn new(ci_or_testing: bool, trunk_branch: &str) -> Self {
        Self {
            ci_or_testing,
            trunk_branch: trunk_branch.to_string(),
            snapshot_ids: Mutex::new(HashMap::new()),
        }
    }

    fn releasing(&self, branch: &str) -> bool {
        self.ci_or_testing && branch == self.trunk_branch
    }

    pub fn rewrite_group(&self, group: &str, branch: &str) -> String {
        if self.releasing(branch) || group.is_empty() || group.starts_with(SNAPSHOTS_GROUP_PRE) {
            group.to_string()
        } else {
            format!("{SNAPSHOTS_GROUP_PRE}{group}")
        }
    }

    pub fn rewrite_artifact(&self, artifact: &str, _branch: &str) -> String {
        artifact.to_string()
    }

    pub fn rewrite_version(&self, version: &str, branch: &str) -> String {
        if self.releasing(branch) || version.is_empty() || version.ends_with(SNAPSHOT_VERSION_POST)
        {
            version.to_string()
        } else {
            self.snapshot_id(branch)
        }
    }

    pub fn rewrite(&self, coordinate: &Coordinate, branch: &str) -> Coordinate {
        Coordinate {
            group: self.rewrite_group(&coordinate.group, branch),
            artifact: self.rewrite_artifact(&coordinate.artifact, branch),
            version: self.rewrite_version(&coordinate.version, branch),
        }
    }

    pub fn snapshot_id(&self, branch: &str) -> String {
        let mut ids = self
            .snapshot_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ids.entry(branch.to_string())
            .or_insert_with(|| {
                let id = snapshot_id(branch);
                debug!(branch, id = %id, "computed snapshot id");
                id
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 0)]
    #[case("master", -1081267614)]
    #[case("a", 97)]
    fn test_java_string_hash(#[case] input: &str, #[case] expected: i32) {
        assert_eq!(java_string_hash(input), expected);
    }

    #[rstest]
    #[case("master", "master-bf8d2a62-SNAPSHOT")]
    #[case("develop", "develop-5cf6fe5d-SNAPSHOT")]
    #[case("feature/x", "feature_x-e6ef9b9f-SNAPSHOT")]
    #[case("a-very-long-branch-name-indeed", "a_very_long_bran-a49a0aa2-SNAPSHOT")]
    #[case("feature@mps=2021.1", "feature-86161057-SNAPSHOT")]
    #[case("é", "_-000000e9-SNAPSHOT")]
    #[case("a\u{1F600}b", "a__b-0372b75e-SNAPSHOT")]
    fn test_snapshot_id(#[case] branch: &str, #[case] expected: &str) {
        assert_eq!(snapshot_id(branch), expected);
    }

    #[rstest]
    #[case("https://maven.pkg.github.com/org/packages", "https://maven.pkg.github.com/org/packages-snapshots")]
    #[case("https://maven.pkg.github.com/org/packages/", "https://maven.pkg.github.com/org/packages-snapshots")]
    #[case("https://maven.pkg.github.com/org/packages-snapshots", "https://maven.pkg.github.com/org/packages-snapshots")]
    #[case("", "")]
    fn test_snapshot_repository(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(snapshot_repository(url), expected);
        assert_eq!(snapshot_repository(&snapshot_repository(url)), expected);
    }

    #[rstest]
    // (ci_or_testing, branch, group, expected)
    #[case(true, "master", "org.example", "org.example")]
    #[case(false, "master", "org.example", "snapshots.org.example")]
    #[case(true, "feature/x", "org.example", "snapshots.org.example")]
    #[case(true, "feature/x", "snapshots.org.example", "snapshots.org.example")]
    #[case(true, "feature/x", "", "")]
    fn test_rewrite_group(
        #[case] ci_or_testing: bool,
        #[case] branch: &str,
        #[case] group: &str,
        #[case] expected: &str,
    ) {
        let rewriter = CoordinateRewriter::new(ci_or_testing, "master");
        let once = rewriter.rewrite_group(group, branch);
        assert_eq!(once, expected);
        assert_eq!(rewriter.rewrite_group(&once, branch), expected);
    }

    #[rstest]
    #[case(true, "master", "1.0.0", "1.0.0")]
    #[case(false, "master", "1.0.0", "master-bf8d2a62-SNAPSHOT")]
    #[case(true, "feature/x", "1.0.0", "feature_x-e6ef9b9f-SNAPSHOT")]
    #[case(true, "feature/x", "other-SNAPSHOT", "other-SNAPSHOT")]
    #[case(true, "feature/x", "", "")]
    fn test_rewrite_version(
        #[case] ci_or_testing: bool,
        #[case] branch: &str,
        #[case] version: &str,
        #[case] expected: &str,
    ) {
        let rewriter = CoordinateRewriter::new(ci_or_testing, "master");
        assert_eq!(rewriter.rewrite_version(version, branch), expected);
    }

    #[test]
    fn test_rewrite_is_a_fixed_point() {
        let rewriter = CoordinateRewriter::new(true, "master");
        let coordinate = Coordinate::new("org.example", "lib", "1.2.3");
        let once = rewriter.rewrite(&coordinate, "feature/x");
        assert_eq!(
            once,
            Coordinate::new("snapshots.org.example", "lib", "feature_x-e6ef9b9f-SNAPSHOT")
        );
        assert_eq!(rewriter.rewrite(&once, "feature/x"), once);
    }

    #[test]
    fn test_snapshot_id_is_shared_across_modules() {
        let rewriter = CoordinateRewriter::new(true, "master");
        let a = rewriter.rewrite(&Coordinate::new("g", "a", "1.0.0"), "feature/x");
        let b = rewriter.rewrite(&Coordinate::new("g", "b", "2.0.0"), "feature/x");
        assert_eq!(a.version, b.version);
        assert_eq!(rewriter.snapshot_ids.lock().unwrap().len(), 1);
    }
}
