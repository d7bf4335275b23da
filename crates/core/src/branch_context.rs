use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{BuildError, Config};

pub const PROP_NAME_CI: &str = "CI";
pub const PROP_NAME_TESTING: &str = "TESTING";
pub const PROP_NAME_TOKEN: &str = "ALLREP_TOKEN";
pub const PROP_NAME_WORKFLOW: &str = "GITHUB_WORKFLOW";
pub const DEFAULT_BRANCH: &str = "can-not-determine-branch";
pub const DRY_RUN_TOKEN: &str = "DRY";

/// The environment inputs recognised by the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub ci: bool,
    pub testing: bool,
    pub token: Option<String>,
    pub workflow: Option<String>,
}

impl Environment {
    /// Build from a lookup function (properties files first, then process environment)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| {
            lookup(name)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };
        Self {
            ci: flag(PROP_NAME_CI),
            testing: flag(PROP_NAME_TESTING),
            token: lookup(PROP_NAME_TOKEN).filter(|t| !t.is_empty() && t != "notset"),
            workflow: lookup(PROP_NAME_WORKFLOW).filter(|w| !w.is_empty()),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.token.as_deref() == Some(DRY_RUN_TOKEN)
    }
}

/// Parameters encoded in a branch name: `some_text@a=aaa;b=bbb`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchParameters {
    mapping: HashMap<String, String>,
}

impl BranchParameters {
    pub fn parse(branch: &str) -> Self {
        let mut mapping = HashMap::new();
        if let Some((_, params)) = branch.split_once('@') {
            for kv in params.split(';') {
                let (k, v) = kv.split_once('=').unwrap_or((kv, ""));
                mapping.entry(k.to_string()).or_insert_with(|| v.to_string());
            }
        }
        Self { mapping }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.mapping.get(name).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }
}

/// Branch state of one build invocation. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub branch_name: String,
    pub is_master: bool,
    pub is_develop: bool,
    pub is_ci: bool,
    pub is_testing: bool,
}

impl BranchContext {
    pub fn new(branch_name: &str, environment: &Environment, config: &Config) -> Self {
        Self {
            branch_name: branch_name.to_string(),
            is_master: branch_name == config.trunk_branch,
            is_develop: branch_name == config.integration_branch,
            is_ci: environment.ci,
            is_testing: environment.testing,
        }
    }

    pub fn ci_or_testing(&self) -> bool {
        self.is_ci || self.is_testing
    }

    pub fn parameters(&self) -> BranchParameters {
        BranchParameters::parse(&self.branch_name)
    }
}

/// Everything a component needs to know about the current build, constructed once at the
/// entry point and handed down by reference.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub root: PathBuf,
    pub branch: BranchContext,
    pub environment: Environment,
    pub config: Config,
}

impl BuildContext {
    pub fn new(root: &Path, branch_name: &str, environment: Environment, config: Config) -> Self {
        let branch = BranchContext::new(branch_name, &environment, &config);
        Self {
            root: root.to_path_buf(),
            branch,
            environment,
            config,
        }
    }

    /// The context is bound to one repository root for the whole build
    pub fn ensure_root(&self, root: &Path) -> Result<(), BuildError> {
        if self.root != root {
            return Err(BuildError::ContextSwitched {
                expected: self.root.clone(),
                found: root.to_path_buf(),
            });
        }
        Ok(())
    }

    pub fn properties_path(&self) -> PathBuf {
        self.root.join(&self.config.properties_file)
    }

    pub fn workflows_dir(&self) -> PathBuf {
        self.root.join(".github").join("workflows")
    }

    /// Push corrections only when running under the CI/testing policy with credentials
    pub fn may_push(&self) -> bool {
        self.branch.ci_or_testing() && self.environment.token.is_some()
    }
}
