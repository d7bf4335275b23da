use std::{collections::BTreeSet, fmt::Display};

/// "`consuming_package` is used by `producing_repo`, which re-runs `workflow_file_names`
/// when that package changes."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerRecord {
    pub producing_repo: String,
    pub consuming_package: String,
    pub workflow_file_names: BTreeSet<String>,
}

impl Display for TriggerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{repo={}, package={}, workflows={}}}",
            self.producing_repo,
            self.consuming_package,
            self.workflow_file_names
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join("/")
        )
    }
}
