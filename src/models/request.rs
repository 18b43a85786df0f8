use serde::{Deserialize, Serialize};

use super::common::{AspectRatio, Resolution};
use super::media::{GeneratedVideo, ImagePayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    Asset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub image: ImagePayload,
    pub reference_type: ReferenceType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGenerationConfig {
    pub number_of_videos: u32,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
}

impl VideoGenerationConfig {
    pub fn single(resolution: Resolution, aspect_ratio: AspectRatio) -> Self {
        Self {
            number_of_videos: 1,
            resolution,
            aspect_ratio,
        }
    }
}

/// Fully resolved call for the video API, produced by one of the builders.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateVideosParams {
    pub model: String,
    pub prompt: Option<String>,
    pub image: Option<ImagePayload>,
    pub last_frame: Option<ImagePayload>,
    pub reference_images: Vec<ReferenceImage>,
    pub video: Option<GeneratedVideo>,
    pub config: VideoGenerationConfig,
}

impl GenerateVideosParams {
    pub fn new(model: impl Into<String>, config: VideoGenerationConfig) -> Self {
        Self {
            model: model.into(),
            prompt: None,
            image: None,
            last_frame: None,
            reference_images: Vec::new(),
            video: None,
            config,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_last_frame(mut self, image: ImagePayload) -> Self {
        self.last_frame = Some(image);
        self
    }

    pub fn with_reference_images(mut self, images: Vec<ReferenceImage>) -> Self {
        self.reference_images = images;
        self
    }

    pub fn with_video(mut self, video: GeneratedVideo) -> Self {
        self.video = Some(video);
        self
    }
}
