use crate::{
    error::Result,
    models::{GenerateVideosParams, VideoOperation},
};
use async_trait::async_trait;

/// Long-running video generation service.
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Submits a generation job and returns its operation handle.
    async fn generate_videos(&self, params: GenerateVideosParams) -> Result<VideoOperation>;

    /// Fetches the current state of a previously returned handle.
    async fn get_videos_operation(&self, operation: &VideoOperation) -> Result<VideoOperation>;
}
