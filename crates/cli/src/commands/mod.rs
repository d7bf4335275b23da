mod config;
mod correct;
mod resolve;
mod tag;
mod triggers;
mod version;

pub use config::ConfigArgs;
pub use config::handle_config;
pub use correct::CorrectArgs;
pub use correct::handle_correct;
pub use correct::{CORRECTION_COMMIT_MESSAGE, Settlement, settle};
pub use resolve::ResolveArgs;
pub use resolve::handle_resolve;
pub use tag::TagArgs;
pub use tag::handle_tag;
pub use triggers::TriggersArgs;
pub use triggers::handle_triggers;
pub use version::VersionArgs;
pub use version::handle_version;
