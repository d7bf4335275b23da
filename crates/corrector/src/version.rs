use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use branchbuild_core::{BuildContext, CorrectionResult, Corrector, VcsGateway};
use branchbuild_utils::{DEFAULT_VERSION, DotProperties, negotiate};
use tracing::info;

pub const PROP_NAME_VERSION: &str = "version";
pub const PROP_NAME_GROUP: &str = "group";

/// Version and group of the build, after negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectVersion {
    pub version: String,
    pub previous: String,
    pub group: String,
}

impl ProjectVersion {
    pub fn changed(&self) -> bool {
        self.version != self.previous
    }
}

fn default_group(ctx: &BuildContext) -> String {
    ctx.root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Read `version` and `group` from the properties file and negotiate a vacant version against
/// the tags. `None` when there is no properties file.
///
/// # Errors
/// Returns error if the version is malformed or the tags cannot be read.
pub fn project_version(
    ctx: &BuildContext,
    properties: &DotProperties,
    vcs: &dyn VcsGateway,
) -> Result<Option<ProjectVersion>> {
    if !properties.is_valid() {
        info!(file = %properties.file().display(), "can not determine version: no properties file found");
        return Ok(None);
    }
    let previous = properties.get_or(PROP_NAME_VERSION, DEFAULT_VERSION);
    let group = properties.get_or(PROP_NAME_GROUP, &default_group(ctx));
    let tags = vcs.tags()?.into_iter().collect::<HashSet<_>>();
    let adjust = ctx.branch.ci_or_testing() || ctx.config.force_version_correction;
    let version = negotiate(&previous, &tags, adjust)?;
    Ok(Some(ProjectVersion {
        version,
        previous,
        group,
    }))
}

/// Moves the `version` property to the first version without a release tag.
pub struct VersionCorrector {
    ctx: Arc<BuildContext>,
    vcs: Arc<dyn VcsGateway>,
}

impl VersionCorrector {
    pub fn new(ctx: Arc<BuildContext>, vcs: Arc<dyn VcsGateway>) -> Self {
        Self { ctx, vcs }
    }
}

#[async_trait]
impl Corrector for VersionCorrector {
    fn name(&self) -> &str {
        "version"
    }

    fn enabled(&self) -> bool {
        self.ctx.branch.ci_or_testing() || self.ctx.config.force_version_correction
    }

    async fn correct(&self) -> Result<CorrectionResult> {
        let mut result = CorrectionResult::new(self.name());
        let path = self.ctx.properties_path();
        let mut properties = DotProperties::load(&path)?;
        let Some(project) = project_version(&self.ctx, &properties, self.vcs.as_ref())? else {
            return Ok(result);
        };
        if project.changed() {
            info!(
                file = %path.display(),
                "overwriting property {PROP_NAME_VERSION} with new version {} (was {})",
                project.version,
                project.previous
            );
            properties.set(PROP_NAME_VERSION, &project.version)?;
            result
                .changed_files
                .insert(self.ctx.config.properties_file.clone().into());
        }
        Ok(result)
    }
}
