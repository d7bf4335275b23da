//! # branchbuild-bbb
//!
//! Branch based building. Builds on a development branch publish isolated snapshot artifacts
//! (`snapshots.<group>:<artifact>:<branch>-<hash>-SNAPSHOT`) and consume each other's snapshot
//! artifacts through dependencies whose version carries the `-BRANCHED` indicator.

pub mod maven_probe;
pub mod retarget;
pub mod rewriter;
pub mod substitution;

pub use maven_probe::{MavenRepositoryProbe, pom_path};
pub use retarget::{
    LOCAL_REPOSITORY_NAME, PublicationRetargeter, RELEASE_REPOSITORY_NAME, RepositoryTarget,
    SNAPSHOT_REPOSITORY_NAME,
};
pub use rewriter::{
    BRANCH_INDICATOR, CoordinateRewriter, MAX_BRANCHNAME_PART_LENGTH, SNAPSHOT_VERSION_POST,
    SNAPSHOTS_GROUP_PRE, SNAPSHOTS_REPO_POST, java_string_hash, snapshot_repository,
};
pub use substitution::{BranchSubstitutionEngine, SubstitutionOutcome};
