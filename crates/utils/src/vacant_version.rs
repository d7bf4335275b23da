use std::{collections::HashSet, sync::LazyLock};

use branchbuild_core::{BuildError, BuildModel};
use regex::Regex;
use tracing::{debug, info};

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("hardcoded regex must compile"));

pub const DEFAULT_VERSION: &str = "0.0.1";

/// Find the lowest patch version at or above `base` that has no `v<version>` tag yet.
///
/// Outside CI/testing the base version is returned as is; the format is checked in every mode.
///
/// # Errors
/// Returns `MalformedVersion` if `base` is not `MAJOR.MINOR.PATCH`.
pub fn negotiate(
    base: &str,
    tags: &HashSet<String>,
    ci_or_testing: bool,
) -> Result<String, BuildError> {
    let malformed = || BuildError::MalformedVersion {
        version: base.to_string(),
    };
    if !VERSION_PATTERN.is_match(base) {
        return Err(malformed());
    }
    if !ci_or_testing {
        info!(version = base, "version not adjusted: not on CI");
        return Ok(base.to_string());
    }
    // only the patch is numeric; major and minor keep their text
    let (prefix, patch) = base.rsplit_once('.').ok_or_else(malformed)?;
    let mut patch = patch.parse::<u64>().map_err(|_| malformed())?;
    let mut candidate = base.to_string();
    while tags.contains(&format!("v{candidate}")) {
        patch = patch.checked_add(1).ok_or_else(malformed)?;
        candidate = format!("{prefix}.{patch}");
        debug!(version = %candidate, "trying next version");
    }
    info!(version = %candidate, was = base, "found vacant version");
    Ok(candidate)
}

/// Publish the negotiated version and the group to every module of the build and to the
/// coordinates of its publications.
pub fn apply_version(model: &mut BuildModel, version: &str, group: &str) {
    for module in model.modules.iter_mut() {
        if module.version != version || module.group != group {
            info!(
                module = %module.name,
                "version: {} => {version}, group: {} => {group}",
                module.version,
                module.group
            );
            module.version = version.to_string();
            module.group = group.to_string();
        }
        for publication in module.publications.iter_mut() {
            let coordinate = &mut publication.coordinate;
            if coordinate.version != version || coordinate.group != group {
                debug!(
                    module = %module.name,
                    publication = %publication.name,
                    "{coordinate} => {group}:{}:{version}",
                    coordinate.artifact
                );
                coordinate.version = version.to_string();
                coordinate.group = group.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("0.0.1", &["v0.0.1", "v0.0.2", "v0.0.3"], "0.0.4")]
    #[case("0.0.1", &[], "0.0.1")]
    #[case("1.2.3", &["v1.2.4"], "1.2.3")]
    #[case("1.2.3", &["v1.2.3", "v1.2.5"], "1.2.4")]
    #[case("1.2.9", &["v1.2.9"], "1.2.10")]
    #[case("2.0.0", &["2.0.0", "V2.0.0"], "2.0.0")]
    #[case("1.02.3", &["v1.02.3"], "1.02.4")]
    fn test_negotiate(#[case] base: &str, #[case] existing: &[&str], #[case] expected: &str) {
        let existing = tags(existing);
        let version = negotiate(base, &existing, true).unwrap();
        assert_eq!(version, expected);
        assert!(!existing.contains(&format!("v{version}")));
    }

    #[test]
    fn test_negotiate_local_build_keeps_version() {
        let existing = tags(&["v0.0.1"]);
        assert_eq!(negotiate("0.0.1", &existing, false).unwrap(), "0.0.1");
    }

    #[rstest]
    #[case("1.2")]
    #[case("1.2.3.4")]
    #[case("v1.2.3")]
    #[case("1.2.3-SNAPSHOT")]
    #[case("")]
    fn test_negotiate_malformed(#[case] base: &str) {
        for ci in [true, false] {
            let result = negotiate(base, &HashSet::new(), ci);
            assert!(matches!(result, Err(BuildError::MalformedVersion { .. })));
        }
    }

    #[test]
    fn test_apply_version() {
        use branchbuild_core::BuildModule;
        let mut model = BuildModel {
            modules: vec![
                BuildModule {
                    name: "a".to_string(),
                    version: "0.0.1".to_string(),
                    ..Default::default()
                },
                BuildModule {
                    name: "b".to_string(),
                    group: "org.example".to_string(),
                    version: "0.0.4".to_string(),
                    ..Default::default()
                },
            ],
        };
        apply_version(&mut model, "0.0.4", "org.example");
        for module in &model.modules {
            assert_eq!(module.version, "0.0.4");
            assert_eq!(module.group, "org.example");
        }
    }

    #[test]
    fn test_apply_version_reaches_publications() {
        use branchbuild_core::{BuildModule, Coordinate, Publication};
        let mut model = BuildModel {
            modules: vec![BuildModule {
                name: "app".to_string(),
                group: "org.example".to_string(),
                version: "1.0.0".to_string(),
                publications: vec![Publication {
                    name: "maven".to_string(),
                    coordinate: Coordinate::new("org.old", "app", "1.0.0"),
                }],
                ..Default::default()
            }],
        };
        apply_version(&mut model, "1.0.1", "org.example");
        assert_eq!(
            model.modules[0].publications[0].coordinate,
            Coordinate::new("org.example", "app", "1.0.1")
        );
    }
}
