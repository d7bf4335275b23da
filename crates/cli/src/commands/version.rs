use anyhow::Result;
use branchbuild_core::{BuildError, Corrector};
use branchbuild_corrector::{VersionCorrector, project_version};
use branchbuild_utils::DotProperties;
use clap::Args;
use colored::Colorize;

use crate::{CommandContext, options::FormatOptions};

#[derive(Args, Debug)]
#[command(about = "Show the first version without a release tag")]
pub struct VersionArgs {
    /// Write the version to the properties file
    #[arg(short, long)]
    write: bool,

    #[arg(long, default_value = "stdout")]
    format: FormatOptions,
}

/// Negotiate the version, optionally writing it back
pub async fn handle_version(args: &VersionArgs) -> Result<()> {
    let ctx = CommandContext::new().await?;
    let properties = DotProperties::load(&ctx.build.properties_path())?;
    let project = project_version(&ctx.build, &properties, ctx.vcs.as_ref())?
        .ok_or(BuildError::VersionNotSet)?;

    if args.write {
        VersionCorrector::new(ctx.build.clone(), ctx.vcs())
            .correct()
            .await?;
    }

    let stdout = if project.changed() {
        format!(
            "{}:{} (was {})",
            project.group,
            project.version.bright_green().bold(),
            project.previous
        )
    } else {
        format!("{}:{}", project.group, project.version.bright_green().bold())
    };
    args.format.print(
        &stdout,
        &serde_json::json!({
            "group": project.group,
            "version": project.version,
            "previous": project.previous,
        }),
    );
    Ok(())
}
