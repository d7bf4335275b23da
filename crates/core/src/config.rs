use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_HEADER_URL: &str =
    "https://raw.githubusercontent.com/ModelingValueGroup/generic-info/master/header";
pub const DEFAULT_RELEASE_REPOSITORY_URL: &str =
    "https://maven.pkg.github.com/ModelingValueGroup/packages";
pub const DEFAULT_DEPENDENCIES_REPOSITORY_URL: &str =
    "https://github.com/ModelingValueGroup/dependencies.git";

/// Loaded from `.branchbuild/config.json`, controls which corrections run and on which files,
/// plus the branch and repository conventions of branch based building.
///
/// Every field has a default, so an absent file behaves like `{}`.
/// Unknown keys are rejected when the file is loaded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Where the header template is downloaded from (`http(s)://` or `file://`)
    #[serde(default = "default_header_url")]
    pub header_url: String,

    /// File names that are always text (EOL correction)
    #[serde(default = "default_text_files")]
    pub text_files: BTreeSet<String>,

    /// File names that are never text
    #[serde(default = "default_no_text_files")]
    pub no_text_files: BTreeSet<String>,

    #[serde(default = "default_text_file_extensions")]
    pub text_file_extensions: BTreeSet<String>,

    #[serde(default = "default_no_text_file_extensions")]
    pub no_text_file_extensions: BTreeSet<String>,

    /// Extension to comment prefix, e.g. `"java": "//"`
    #[serde(default = "default_header_file_extensions")]
    pub header_file_extensions: BTreeMap<String, String>,

    /// Glob patterns (root relative) excluded from header correction
    #[serde(default = "default_excludes")]
    pub header_file_excludes: Vec<String>,

    #[serde(default = "default_excludes")]
    pub eol_file_excludes: Vec<String>,

    #[serde(default = "default_excludes")]
    pub script_file_excludes: Vec<String>,

    #[serde(default)]
    pub force_header_correction: bool,

    #[serde(default)]
    pub force_eol_correction: bool,

    #[serde(default)]
    pub force_dependabot_correction: bool,

    #[serde(default)]
    pub force_script_correction: bool,

    #[serde(default)]
    pub force_version_correction: bool,

    #[serde(default = "default_trunk_branch")]
    pub trunk_branch: String,

    #[serde(default = "default_integration_branch")]
    pub integration_branch: String,

    #[serde(default = "default_release_repository_url")]
    pub release_repository_url: String,

    /// Repositories probed when substituting branched dependencies
    #[serde(default = "default_probe_repository_urls")]
    pub probe_repository_urls: Vec<String>,

    #[serde(default = "default_dependencies_repository_url")]
    pub dependencies_repository_url: String,

    #[serde(default = "default_github_owner")]
    pub github_owner: String,

    /// The properties file at the repository root holding `version` and `group`
    #[serde(default = "default_properties_file")]
    pub properties_file: String,
}

fn default_header_url() -> String {
    DEFAULT_HEADER_URL.to_string()
}

fn default_text_files() -> BTreeSet<String> {
    [".gitignore", ".gitattributes", "LICENSE", "header"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_no_text_files() -> BTreeSet<String> {
    [".DS_Store"].into_iter().map(String::from).collect()
}

fn default_text_file_extensions() -> BTreeSet<String> {
    [
        "MF", "java", "js", "md", "pom", "properties", "sh", "txt", "xml", "yaml", "yml", "adoc",
        "project", "prefs", "classpath", "jardesc", "mps", "mpl", "msd", "kt", "kts", "gradle",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_no_text_file_extensions() -> BTreeSet<String> {
    ["class", "iml", "jar", "jpeg", "jpg", "png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_header_file_extensions() -> BTreeMap<String, String> {
    [
        ("java", "//"),
        ("js", "//"),
        ("kt", "//"),
        ("kts", "//"),
        ("gradle", "//"),
        ("properties", "##"),
        ("sh", "##"),
        ("yaml", "##"),
        ("yml", "##"),
    ]
    .into_iter()
    .map(|(ext, prefix)| (ext.to_string(), prefix.to_string()))
    .collect()
}

fn default_excludes() -> Vec<String> {
    [
        ".git/**",
        // bot pushes of workflow files are refused by github
        ".github/workflows/**",
        ".idea/**",
        ".gradle/**",
        "gradle/**",
        "gradlew*",
        "MPS/**",
        "**/build/**",
        "**/*_gen/**",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_trunk_branch() -> String {
    "master".to_string()
}

fn default_integration_branch() -> String {
    "develop".to_string()
}

fn default_release_repository_url() -> String {
    DEFAULT_RELEASE_REPOSITORY_URL.to_string()
}

fn default_probe_repository_urls() -> Vec<String> {
    vec![
        DEFAULT_RELEASE_REPOSITORY_URL.to_string(),
        format!("{DEFAULT_RELEASE_REPOSITORY_URL}-snapshots"),
    ]
}

fn default_dependencies_repository_url() -> String {
    DEFAULT_DEPENDENCIES_REPOSITORY_URL.to_string()
}

fn default_github_owner() -> String {
    "ModelingValueGroup".to_string()
}

fn default_properties_file() -> String {
    "gradle.properties".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_url: default_header_url(),
            text_files: default_text_files(),
            no_text_files: default_no_text_files(),
            text_file_extensions: default_text_file_extensions(),
            no_text_file_extensions: default_no_text_file_extensions(),
            header_file_extensions: default_header_file_extensions(),
            header_file_excludes: default_excludes(),
            eol_file_excludes: default_excludes(),
            script_file_excludes: default_excludes(),
            force_header_correction: false,
            force_eol_correction: false,
            force_dependabot_correction: false,
            force_script_correction: false,
            force_version_correction: false,
            trunk_branch: default_trunk_branch(),
            integration_branch: default_integration_branch(),
            release_repository_url: default_release_repository_url(),
            probe_repository_urls: default_probe_repository_urls(),
            dependencies_repository_url: default_dependencies_repository_url(),
            github_owner: default_github_owner(),
            properties_file: default_properties_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"forceEolCorrection": true, "headerFileExtensions": {"rs": "//"}}"#,
        )
        .unwrap();
        assert!(config.force_eol_correction);
        assert!(!config.force_header_correction);
        assert_eq!(config.header_file_extensions.len(), 1);
        assert_eq!(config.trunk_branch, "master");
        assert!(config.text_files.contains("LICENSE"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = serde_json::from_str::<Config>(r#"{"forceEverything": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_excludes_cover_workflows() {
        let config = Config::default();
        assert!(
            config
                .header_file_excludes
                .contains(&".github/workflows/**".to_string())
        );
        assert_eq!(config.header_file_excludes, config.eol_file_excludes);
    }
}
