use std::path::PathBuf;

use thiserror::Error;

/// Conditions that abort the build.
///
/// Everything that can degrade gracefully (an unreachable header template, a failing probe,
/// a dispatch that did not go through) is logged at the call site instead.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("the current version '{version}' does not match the version pattern 'MAJOR.MINOR.PATCH'")]
    MalformedVersion { version: String },

    #[error("properties file could not be read: {}", file.display())]
    PropertiesUnreadable {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("properties file was modified by another process since it was read: {}", file.display())]
    PropertiesModified { file: PathBuf },

    #[error(
        "corrections are pending on the trunk branch '{branch}'; run the corrections on a development branch first. First offending file {}:\n{diff}",
        file.display()
    )]
    TrunkDirty {
        branch: String,
        file: PathBuf,
        diff: String,
    },

    #[error("BUILD LOOP DANGER in workflow file(s): {}", files.iter().map(|f| f.display().to_string()).collect::<Vec<_>>().join(", "))]
    BuildLoopDanger { files: Vec<PathBuf> },

    #[error("written file does not read back as intended: {}", file.display())]
    WriteVerification { file: PathBuf },

    #[error("repository root switched during the build: expected {}, found {}", expected.display(), found.display())]
    ContextSwitched { expected: PathBuf, found: PathBuf },

    #[error("version of the root project is not set")]
    VersionNotSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trunk_dirty_message_contains_diff() {
        let err = BuildError::TrunkDirty {
            branch: "master".to_string(),
            file: PathBuf::from("src/A.java"),
            diff: "-old\n+new".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("master"));
        assert!(message.contains("src/A.java"));
        assert!(message.contains("+new"));
    }

    #[test]
    fn test_build_loop_danger_lists_files() {
        let err = BuildError::BuildLoopDanger {
            files: vec![PathBuf::from("a.yaml"), PathBuf::from("b.yml")],
        };
        assert!(err.to_string().ends_with("a.yaml, b.yml"));
    }
}
