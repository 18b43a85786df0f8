pub mod traits;
pub mod video_client;

use crate::{config::GenAiConfig, error::Result};
use std::sync::Arc;
use url::Url;

pub use traits::VideoApi;
pub use video_client::VideoClient;

#[derive(Clone)]
pub struct GenAiClient {
    video_client: Arc<VideoClient>,
    api_key: String,
}

impl GenAiClient {
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let video_client = VideoClient::new(config)?;

        Ok(Self {
            video_client: Arc::new(video_client),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    pub fn video(&self) -> Arc<VideoClient> {
        Arc::clone(&self.video_client)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Appends the credential to a vendor download uri so it can be played directly.
pub fn playable_url(uri: &str, api_key: &str) -> Result<String> {
    let mut url = Url::parse(uri)?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url.into())
}
