use std::{collections::BTreeSet, fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize};

/// What a single file write did.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOutcome {
    /// The file did not exist and was created
    Generated,
    /// The file existed with different content and was rewritten
    Regenerated,
    /// The file already had the desired content
    Untouched,
}

impl WriteOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Untouched)
    }
}

impl Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Generated => "generated",
                Self::Regenerated => "regenerated",
                Self::Untouched => "untouched",
            }
        )
    }
}

/// The files one correction pass actually changed, relative to the repository root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionResult {
    pub corrector_name: String,
    pub changed_files: BTreeSet<PathBuf>,
}

impl CorrectionResult {
    pub fn new(corrector_name: &str) -> Self {
        Self {
            corrector_name: corrector_name.to_string(),
            changed_files: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_files.is_empty()
    }
}
