//! # branchbuild-corrector
//!
//! Source tree corrections. Every pass writes through [`FileWriter`], which only touches a file
//! when its content changes, so running the pipeline twice changes nothing the second time.

pub mod dependabot;
pub mod eol;
pub mod file_writer;
pub mod header;
pub mod header_template;
pub mod pipeline;
pub mod script;
pub mod verifier;
pub mod version;

#[cfg(test)]
mod test_support;

pub use dependabot::DependabotCorrector;
pub use eol::EolCorrector;
pub use file_writer::{FileWriter, read_lines};
pub use header::HeaderCorrector;
pub use header_template::load_header_template;
pub use pipeline::CorrectionPipeline;
pub use script::ScriptCorrector;
pub use verifier::verify;
pub use version::{
    PROP_NAME_GROUP, PROP_NAME_VERSION, ProjectVersion, VersionCorrector, project_version,
};
