use crate::{
    config::GenAiConfig,
    error::{Result, VideoGenError},
    genai::traits::VideoApi,
    models::{
        AspectRatio, GenerateVideosParams, GeneratedSample, ImagePayload, ModelInfo,
        OperationError, ReferenceImage, Resolution, VideoOperation, VideoResponse, VEO_FAST_MODEL, VEO_MODEL,
    },
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct VideoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: Parameters,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Instance<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a ImagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_frame: Option<&'a ImagePayload>,
    #[serde(skip_serializing_if = "no_references")]
    reference_images: &'a [ReferenceImage],
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoUri<'a>>,
}

fn no_references(images: &&[ReferenceImage]) -> bool {
    images.is_empty()
}

#[derive(Serialize)]
struct VideoUri<'a> {
    uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<RawResponse>,
    error: Option<OperationError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    generate_video_response: Option<RawVideoResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<RawOperation> for VideoOperation {
    fn from(raw: RawOperation) -> Self {
        let response = raw.response.map(|r| VideoResponse {
            generated_videos: r
                .generate_video_response
                .map(|v| v.generated_samples)
                .unwrap_or_default(),
        });

        VideoOperation {
            name: raw.name,
            done: raw.done,
            response,
            error: raw.error,
        }
    }
}

impl VideoClient {
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| VideoGenError::ConfigError("API key is not set".into()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| VideoGenError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn supported_models() -> Vec<ModelInfo> {
        let model = |id: &str, name: &str, description: &str| ModelInfo {
            id: id.to_string(),
            name: name.to_string(),
            provider: "Google".to_string(),
            description: description.to_string(),
        };
        vec![
            model(
                VEO_MODEL,
                "Veo 3.1",
                "1080p output, reference images and video extension",
            ),
            model(VEO_FAST_MODEL, "Veo 3.1 Fast", "720p text and image modes"),
        ]
    }

    async fn read_operation(response: Response) -> Result<VideoOperation> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            log::error!("Video API returned {}: {}", status, message);
            return Err(VideoGenError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let raw: RawOperation = serde_json::from_str(&body)
            .map_err(|e| VideoGenError::ResponseError(e.to_string()))?;
        Ok(raw.into())
    }
}

#[async_trait]
impl VideoApi for VideoClient {
    async fn generate_videos(&self, params: GenerateVideosParams) -> Result<VideoOperation> {
        let payload = PredictRequest {
            instances: vec![Instance {
                prompt: params.prompt.as_deref(),
                image: params.image.as_ref(),
                last_frame: params.last_frame.as_ref(),
                reference_images: &params.reference_images,
                video: params.video.as_ref().map(|v| VideoUri { uri: &v.uri }),
            }],
            parameters: Parameters {
                sample_count: params.config.number_of_videos,
                resolution: params.config.resolution,
                aspect_ratio: params.config.aspect_ratio,
            },
        };

        let url = format!("{}/models/{}:predictLongRunning", self.base_url, params.model);

        log::info!("Generating video with model: {}", params.model);
        log::debug!(
            "Video request: resolution={}, aspect_ratio={}, image={}, last_frame={}, references={}, extends={}",
            params.config.resolution,
            params.config.aspect_ratio,
            params.image.is_some(),
            params.last_frame.is_some(),
            params.reference_images.len(),
            params.video.is_some()
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Video generation request failed: {:?}", e);
                VideoGenError::RequestError(e.to_string())
            })?;

        let operation = Self::read_operation(response).await?;
        log::info!("Video operation started: {}", operation.name);
        Ok(operation)
    }

    async fn get_videos_operation(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        let url = format!("{}/{}", self.base_url, operation.name);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| {
                log::error!("Error polling video operation: {:?}", e);
                VideoGenError::RequestError(e.to_string())
            })?;

        let updated = Self::read_operation(response).await?;
        log::debug!("Operation {} done={}", updated.name, updated.done);
        Ok(updated)
    }
}
