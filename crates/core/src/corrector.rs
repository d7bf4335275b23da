use anyhow::Result;
use async_trait::async_trait;

use crate::CorrectionResult;

/// One pass of the correction pipeline.
#[async_trait]
pub trait Corrector: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the pass runs in this build (policy or force flag)
    fn enabled(&self) -> bool;

    async fn correct(&self) -> Result<CorrectionResult>;
}
