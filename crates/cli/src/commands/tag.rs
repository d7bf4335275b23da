use anyhow::Result;
use branchbuild_core::{BuildError, VcsGateway};
use branchbuild_corrector::{PROP_NAME_VERSION, project_version};
use branchbuild_utils::DotProperties;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::CommandContext;

#[derive(Args, Debug)]
#[command(about = "Tag the current commit with the version, on the trunk branch only")]
pub struct TagArgs {}

/// Tag `v<version>` and push the tags
///
/// # Errors
/// Returns [`BuildError::VersionNotSet`] when the properties file has no version.
pub async fn handle_tag(_args: &TagArgs) -> Result<()> {
    let ctx = CommandContext::new().await?;
    let properties = DotProperties::load(&ctx.build.properties_path())?;
    if properties.get(PROP_NAME_VERSION).is_none() {
        return Err(BuildError::VersionNotSet.into());
    }
    let project = project_version(&ctx.build, &properties, ctx.vcs.as_ref())?
        .ok_or(BuildError::VersionNotSet)?;
    let tag = format!("v{}", project.version);

    if !ctx.build.branch.is_master {
        info!(
            tag = %tag,
            branch = %ctx.build.branch.branch_name,
            "not tagging: this is not the trunk branch"
        );
        println!("Not tagging {tag} on branch {}", ctx.build.branch.branch_name);
        return Ok(());
    }
    info!(tag = %tag, "tagging the trunk branch");
    ctx.vcs.tag(&tag).await?;
    println!("Tagged {}", tag.bright_green().bold());
    Ok(())
}
