use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::common::{AspectRatio, Resolution};
use super::media::{GeneratedVideo, ImageFile, ImagePayload};

pub const MAX_REFERENCE_IMAGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoMode {
    #[default]
    TextToVideo,
    TextAndImageToVideo,
    StartEndImageVideo,
    MultiReferenceVideo,
    ExtendVideo,
}

impl VideoMode {
    pub const ALL: [VideoMode; 5] = [
        VideoMode::TextToVideo,
        VideoMode::TextAndImageToVideo,
        VideoMode::StartEndImageVideo,
        VideoMode::MultiReferenceVideo,
        VideoMode::ExtendVideo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VideoMode::TextToVideo => "Text to Video",
            VideoMode::TextAndImageToVideo => "Text & Image to Video",
            VideoMode::StartEndImageVideo => "Start & End Image Video",
            VideoMode::MultiReferenceVideo => "Multi-Reference Image Video",
            VideoMode::ExtendVideo => "Extend Video",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VideoMode::TextToVideo => "Generate a video from a text prompt.",
            VideoMode::TextAndImageToVideo => {
                "Generate a video from a text prompt and a starting image."
            }
            VideoMode::StartEndImageVideo => {
                "Generate a video transitioning between a start and end image (optional prompt)."
            }
            VideoMode::MultiReferenceVideo => {
                "Generate a video using 1-3 reference images and a prompt."
            }
            VideoMode::ExtendVideo => "Extend an existing generated video with a new prompt.",
        }
    }

    /// Modes that pin resolution and aspect ratio, so the selectors are locked.
    pub fn forces_output_format(&self) -> bool {
        matches!(self, VideoMode::MultiReferenceVideo | VideoMode::ExtendVideo)
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "text-to-video" => Ok(VideoMode::TextToVideo),
            "text-image" | "text-and-image" => Ok(VideoMode::TextAndImageToVideo),
            "start-end" | "start-end-image" => Ok(VideoMode::StartEndImageVideo),
            "multi-ref" | "multi-reference" => Ok(VideoMode::MultiReferenceVideo),
            "extend" => Ok(VideoMode::ExtendVideo),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// Editable inputs of a session, as the user fills them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationForm {
    pub mode: VideoMode,
    pub prompt: String,
    pub start_image: Option<ImageFile>,
    pub end_image: Option<ImageFile>,
    pub reference_images: Vec<ImageFile>,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
}

impl GenerationForm {
    pub fn new(mode: VideoMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_start_image(mut self, image: ImageFile) -> Self {
        self.start_image = Some(image);
        self
    }

    pub fn with_end_image(mut self, image: ImageFile) -> Self {
        self.end_image = Some(image);
        self
    }

    pub fn with_reference_image(mut self, image: ImageFile) -> Self {
        self.reference_images.push(image);
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn trimmed_prompt(&self) -> Option<&str> {
        let prompt = self.prompt.trim();
        (!prompt.is_empty()).then_some(prompt)
    }

    /// First unmet requirement of the selected mode, phrased for the user.
    /// Only presence and counts are checked here; nothing is read from disk.
    pub fn missing_requirement(&self, previous: Option<&GeneratedVideo>) -> Option<String> {
        let has_prompt = self.trimmed_prompt().is_some();
        let message = match self.mode {
            VideoMode::TextToVideo if !has_prompt => "Prompt is required for Text to Video.",
            VideoMode::TextAndImageToVideo if !has_prompt => {
                "Prompt is required for Text & Image to Video."
            }
            VideoMode::TextAndImageToVideo if self.start_image.is_none() => {
                "Starting image is required for Text & Image to Video."
            }
            VideoMode::StartEndImageVideo if self.start_image.is_none() => {
                "Starting image is required for Start & End Image Video."
            }
            VideoMode::StartEndImageVideo if self.end_image.is_none() => {
                "Ending image is required for Start & End Image Video."
            }
            VideoMode::MultiReferenceVideo if !has_prompt => {
                "Prompt is required for Multi-Reference Image Video."
            }
            VideoMode::MultiReferenceVideo
                if self.reference_images.is_empty()
                    || self.reference_images.len() > MAX_REFERENCE_IMAGES =>
            {
                "Please provide 1 to 3 reference images."
            }
            VideoMode::ExtendVideo if !has_prompt => "Prompt is required to extend the video.",
            VideoMode::ExtendVideo if previous.is_none() => {
                "No previous video found to extend. Generate a video first."
            }
            _ => return None,
        };
        Some(message.to_string())
    }
}

/// One submission, with exactly the inputs its mode needs.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    TextToVideo {
        prompt: String,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    },
    TextAndImage {
        prompt: String,
        start: ImagePayload,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    },
    StartEndImage {
        prompt: Option<String>,
        start: ImagePayload,
        end: ImagePayload,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    },
    MultiReference {
        prompt: String,
        references: Vec<ImagePayload>,
    },
    Extend {
        prompt: String,
        previous: GeneratedVideo,
        aspect_ratio: AspectRatio,
    },
}

impl GenerationRequest {
    pub fn mode(&self) -> VideoMode {
        match self {
            GenerationRequest::TextToVideo { .. } => VideoMode::TextToVideo,
            GenerationRequest::TextAndImage { .. } => VideoMode::TextAndImageToVideo,
            GenerationRequest::StartEndImage { .. } => VideoMode::StartEndImageVideo,
            GenerationRequest::MultiReference { .. } => VideoMode::MultiReferenceVideo,
            GenerationRequest::Extend { .. } => VideoMode::ExtendVideo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> ImageFile {
        ImageFile::from_path(name)
    }

    fn video_720() -> GeneratedVideo {
        GeneratedVideo {
            uri: "https://files/v".to_string(),
            resolution: Resolution::P720,
            aspect_ratio: AspectRatio::Landscape,
        }
    }

    #[test]
    fn test_request_reports_its_mode() {
        let extend = GenerationRequest::Extend {
            prompt: "more".into(),
            previous: video_720(),
            aspect_ratio: AspectRatio::Landscape,
        };
        assert_eq!(extend.mode(), VideoMode::ExtendVideo);

        let text = GenerationRequest::TextToVideo {
            prompt: "city".into(),
            resolution: Resolution::P1080,
            aspect_ratio: AspectRatio::Portrait,
        };
        assert_eq!(text.mode(), VideoMode::TextToVideo);
    }

    #[test]
    fn test_text_to_video_requires_prompt() {
        let form = GenerationForm::new(VideoMode::TextToVideo).with_prompt("   ");
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Prompt is required for Text to Video.")
        );
        let form = form.with_prompt("a robot in a city");
        assert!(form.missing_requirement(None).is_none());
    }

    #[test]
    fn test_text_and_image_requires_both() {
        let form = GenerationForm::new(VideoMode::TextAndImageToVideo).with_prompt("p");
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Starting image is required for Text & Image to Video.")
        );
        let form = GenerationForm::new(VideoMode::TextAndImageToVideo).with_start_image(image("a.png"));
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Prompt is required for Text & Image to Video.")
        );
    }

    #[test]
    fn test_start_end_prompt_is_optional() {
        let form = GenerationForm::new(VideoMode::StartEndImageVideo).with_start_image(image("a.png"));
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Ending image is required for Start & End Image Video.")
        );
        let form = form.with_end_image(image("b.png"));
        assert!(form.missing_requirement(None).is_none());

        let form = GenerationForm::new(VideoMode::StartEndImageVideo).with_end_image(image("b.png"));
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Starting image is required for Start & End Image Video.")
        );
    }

    #[test]
    fn test_multi_reference_counts() {
        let form = GenerationForm::new(VideoMode::MultiReferenceVideo).with_prompt("creature");
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Please provide 1 to 3 reference images.")
        );

        let mut form = form.with_reference_image(image("1.png"));
        assert!(form.missing_requirement(None).is_none());

        for name in ["2.png", "3.png", "4.png"] {
            form = form.with_reference_image(image(name));
        }
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Please provide 1 to 3 reference images.")
        );

        let form = GenerationForm::new(VideoMode::MultiReferenceVideo).with_reference_image(image("1.png"));
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("Prompt is required for Multi-Reference Image Video.")
        );
    }

    #[test]
    fn test_extend_needs_previous_video() {
        let form = GenerationForm::new(VideoMode::ExtendVideo).with_prompt("and then it rains");
        assert_eq!(
            form.missing_requirement(None).as_deref(),
            Some("No previous video found to extend. Generate a video first.")
        );
        assert!(form.missing_requirement(Some(&video_720())).is_none());

        let form = GenerationForm::new(VideoMode::ExtendVideo);
        assert_eq!(
            form.missing_requirement(Some(&video_720())).as_deref(),
            Some("Prompt is required to extend the video.")
        );
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("multi-ref".parse::<VideoMode>(), Ok(VideoMode::MultiReferenceVideo));
        assert!("slideshow".parse::<VideoMode>().is_err());
        assert!(VideoMode::ExtendVideo.forces_output_format());
        assert!(!VideoMode::TextToVideo.forces_output_format());
    }
}
