use std::path::PathBuf;

use branchbuild_core::branch_context::DRY_RUN_TOKEN;
use tracing::info;

use crate::DotProperties;

/// Look `name` up in the properties (repository, then user home), then in the process environment
pub fn env_or_prop(properties: &DotProperties, name: &str) -> Option<String> {
    let value = properties
        .get(name)
        .or_else(|| std::env::var(name).ok());
    info!(
        name,
        value = %value.as_deref().map(hide).unwrap_or_default(),
        "envOrProp"
    );
    value
}

pub fn user_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// `~/.gradle/gradle.properties`, when a home directory is known
pub fn user_home_properties_path() -> Option<PathBuf> {
    user_home().map(|home| home.join(".gradle").join("gradle.properties"))
}

/// Mask a secret for logging: short secrets completely, longer ones after the third character
pub fn hide(secret: &str) -> String {
    let count = secret.chars().count();
    if secret == DRY_RUN_TOKEN {
        secret.to_string()
    } else if count < 7 {
        "*".repeat(count)
    } else {
        secret
            .chars()
            .enumerate()
            .map(|(i, c)| if i < 3 { c } else { '*' })
            .collect()
    }
}
