mod dot_properties;
mod env_or_prop;
mod exclusion_set;
mod find_current_git_repo;
mod get_config;
mod git_gateway;
mod vacant_version;
mod walk_files;

pub use dot_properties::{DotProperties, checksum};
pub use env_or_prop::{env_or_prop, hide, user_home, user_home_properties_path};
pub use exclusion_set::ExclusionSet;
pub use find_current_git_repo::find_current_git_repo;
pub use get_config::{CONFIG_DIR, CONFIG_FILE, get_branchbuild_config, get_config_path};
pub use git_gateway::{
    AUTOMATION_EMAIL, AUTOMATION_USER, GitGateway, repo_name_from_url, run_git,
};
pub use vacant_version::{DEFAULT_VERSION, apply_version, negotiate};
pub use walk_files::{get_extension, walk_files};
