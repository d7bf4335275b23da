use std::path::PathBuf;

use anyhow::{Context, Result};
use branchbuild_bbb::{
    BranchSubstitutionEngine, CoordinateRewriter, MavenRepositoryProbe, PublicationRetargeter,
};
use branchbuild_core::{BuildModel, ResolveReport};
use branchbuild_corrector::project_version;
use branchbuild_utils::{DotProperties, apply_version, user_home};
use clap::Args;
use colored::Colorize;
use tracing::warn;

use crate::CommandContext;

#[derive(Args, Debug)]
#[command(about = "Rewrite the dependencies and publications of a build model for this branch")]
pub struct ResolveArgs {
    /// Build model (JSON) of the modules of the build
    model: PathBuf,

    /// Write the report here instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Apply version, dependency substitution and publication retargeting to a build model
///
/// # Errors
/// Returns error if the model cannot be read or parsed, or the version is malformed.
pub async fn handle_resolve(args: &ResolveArgs) -> Result<()> {
    let ctx = CommandContext::new().await?;
    let build = &ctx.build;
    let content = tokio::fs::read_to_string(&args.model)
        .await
        .context(format!("Failed to read build model {}", args.model.display()))?;
    let mut model: BuildModel = serde_json::from_str(&content)
        .context(format!("Invalid build model in {}", args.model.display()))?;

    let properties = DotProperties::load(&build.properties_path())?;
    if let Some(project) = project_version(build, &properties, ctx.vcs.as_ref())? {
        apply_version(&mut model, &project.version, &project.group);
    }

    let rewriter = CoordinateRewriter::new(build.branch.ci_or_testing(), &build.config.trunk_branch);
    let probe = MavenRepositoryProbe::new(
        &build.config.probe_repository_urls,
        build.environment.token.clone(),
    )?;
    let engine = BranchSubstitutionEngine::new(&rewriter, &probe, &build.branch, &build.config);
    let used_packages = engine.substitute_model(&mut model).await;

    let home = user_home().unwrap_or_else(|| {
        warn!("no home directory, the local repository is relative to the repository root");
        build.root.clone()
    });
    let retargeter = PublicationRetargeter::new(&rewriter, &build.branch, &build.config, &home);
    let published_packages = retargeter.retarget_model(&mut model);

    let report = ResolveReport {
        branch: build.branch.branch_name.clone(),
        model,
        used_packages,
        published_packages,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(output) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(output, format!("{json}\n"))
                .await
                .context(format!("Failed to write {}", output.display()))?;
            println!(
                "Resolved {} module(s) for branch {}: {} substituted, {} published to {}",
                report.model.modules.len(),
                report.branch.bright_white().bold(),
                report.used_packages.len(),
                report.published_packages.len(),
                retargeter.repository().name.bright_blue()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
