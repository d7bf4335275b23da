use anyhow::Result;
use async_trait::async_trait;

use crate::Coordinate;

/// Existence check of a coordinate in some artifact repository.
#[async_trait]
pub trait ArtifactProbe: Send + Sync {
    async fn exists(&self, coordinate: &Coordinate) -> Result<bool>;
}
