use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use branchbuild_core::Config;

pub const CONFIG_DIR: &str = ".branchbuild";
pub const CONFIG_FILE: &str = "config.json";

pub fn get_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load `.branchbuild/config.json` below `root`; the defaults when there is none.
///
/// # Errors
/// Returns error if the file exists but cannot be read or contains unknown or mistyped keys.
pub async fn get_branchbuild_config(root: &Path) -> Result<Config> {
    let path = get_config_path(root);
    if !path.is_file() {
        return Ok(Config::default());
    }
    let content = tokio::fs::read_to_string(&path)
        .await
        .context(format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .context(format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_config_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = get_branchbuild_config(temp_dir.path()).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_config_is_loaded() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(CONFIG_DIR)).unwrap();
        fs::write(
            get_config_path(temp_dir.path()),
            r#"{"forceHeaderCorrection": true, "trunkBranch": "main"}"#,
        )
        .unwrap();
        let config = get_branchbuild_config(temp_dir.path()).await.unwrap();
        assert!(config.force_header_correction);
        assert_eq!(config.trunk_branch, "main");
    }

    #[tokio::test]
    async fn test_unknown_key_fails() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(CONFIG_DIR)).unwrap();
        fs::write(get_config_path(temp_dir.path()), r#"{"trunk": "main"}"#).unwrap();
        let err = get_branchbuild_config(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
