//! # branchbuild-core
//!
//! Core types and traits shared by the branch based building and source correction crates.
//!
//! The build context replaces any process-wide state: it is derived once at the entry point
//! from the repository, the environment and the typed configuration, and passed down.

pub mod branch_context;
pub mod build_model;
pub mod config;
pub mod coordinate;
pub mod correction;
pub mod corrector;
pub mod dispatch;
pub mod error;
pub mod probe;
pub mod trigger_record;
pub mod vcs;

pub use branch_context::{BranchContext, BranchParameters, BuildContext, Environment};
pub use build_model::{BuildModel, BuildModule, Publication, PublishRepository, ResolveReport};
pub use config::Config;
pub use coordinate::Coordinate;
pub use correction::{CorrectionResult, WriteOutcome};
pub use corrector::Corrector;
pub use dispatch::WorkflowDispatcher;
pub use error::BuildError;
pub use probe::ArtifactProbe;
pub use trigger_record::TriggerRecord;
pub use vcs::{VcsGateway, VcsStatus};
