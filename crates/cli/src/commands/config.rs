use anyhow::Result;
use branchbuild_utils::{find_current_git_repo, get_branchbuild_config};
use clap::Args;

use crate::CommandContext;

#[derive(Args, Debug)]
#[command(about = "Show the effective branchbuild configuration")]
pub struct ConfigArgs {}

/// Display the configuration with every default filled in
///
/// # Errors
/// Returns error if reading the configuration fails.
pub async fn handle_config(_args: &ConfigArgs) -> Result<()> {
    let current_dir = CommandContext::current_dir()?;
    let root = find_current_git_repo(&current_dir)?
        .work_dir()
        .map(|dir| dir.to_path_buf())
        .unwrap_or(current_dir);
    let config = get_branchbuild_config(&root).await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn test_config_args_parsing() {
        let cli = TestCli::parse_from(["test"]);
        assert!(format!("{:?}", cli.config).contains("ConfigArgs"));
    }
}
