//! Request builders, one per generation mode.
//!
//! Each builder maps mode inputs to a [`GenerateVideosParams`] and applies the
//! model, resolution and aspect ratio the mode requires.

use crate::{
    error::{Result, VideoGenError},
    models::{
        AspectRatio, GenerateVideosParams, GeneratedVideo, GenerationRequest, ImagePayload,
        ReferenceImage, ReferenceType, Resolution, VideoGenerationConfig, MAX_REFERENCE_IMAGES,
        VEO_MODEL,
    },
};

pub fn text_to_video(
    prompt: &str,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
) -> GenerateVideosParams {
    GenerateVideosParams::new(
        resolution.default_model(),
        VideoGenerationConfig::single(resolution, aspect_ratio),
    )
    .with_prompt(prompt)
}

pub fn text_and_image_to_video(
    prompt: &str,
    start: ImagePayload,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
) -> GenerateVideosParams {
    text_to_video(prompt, resolution, aspect_ratio).with_image(start)
}

pub fn start_and_end_images(
    prompt: Option<&str>,
    start: ImagePayload,
    end: ImagePayload,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
) -> GenerateVideosParams {
    let mut params = GenerateVideosParams::new(
        resolution.default_model(),
        VideoGenerationConfig::single(resolution, aspect_ratio),
    )
    .with_image(start)
    .with_last_frame(end);

    if let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) {
        params = params.with_prompt(prompt);
    }
    params
}

/// Reference images only work with the full model at 720p landscape; whatever
/// the user picked for those is ignored.
pub fn multi_reference_images(
    prompt: &str,
    references: Vec<ImagePayload>,
) -> Result<GenerateVideosParams> {
    if references.is_empty() || references.len() > MAX_REFERENCE_IMAGES {
        return Err(VideoGenError::validation(
            "Please provide 1 to 3 reference images.",
        ));
    }

    let references = references
        .into_iter()
        .map(|image| ReferenceImage {
            image,
            reference_type: ReferenceType::Asset,
        })
        .collect();

    Ok(GenerateVideosParams::new(
        VEO_MODEL,
        VideoGenerationConfig::single(Resolution::P720, AspectRatio::Landscape),
    )
    .with_prompt(prompt)
    .with_reference_images(references))
}

/// Extension keeps the previous video's format: 720p only, same aspect ratio.
pub fn extend_video(
    prompt: &str,
    previous: GeneratedVideo,
    aspect_ratio: AspectRatio,
) -> Result<GenerateVideosParams> {
    if previous.resolution != Resolution::P720 {
        return Err(VideoGenError::validation("Only 720p videos can be extended."));
    }
    if previous.aspect_ratio != aspect_ratio {
        return Err(VideoGenError::validation(
            "Extended video must have the same aspect ratio as the previous video.",
        ));
    }

    Ok(GenerateVideosParams::new(
        VEO_MODEL,
        VideoGenerationConfig::single(Resolution::P720, aspect_ratio),
    )
    .with_prompt(prompt)
    .with_video(previous))
}

pub fn build(request: GenerationRequest) -> Result<GenerateVideosParams> {
    log::debug!("Building {} request", request.mode());
    match request {
        GenerationRequest::TextToVideo {
            prompt,
            resolution,
            aspect_ratio,
        } => Ok(text_to_video(&prompt, resolution, aspect_ratio)),
        GenerationRequest::TextAndImage {
            prompt,
            start,
            resolution,
            aspect_ratio,
        } => Ok(text_and_image_to_video(
            &prompt,
            start,
            resolution,
            aspect_ratio,
        )),
        GenerationRequest::StartEndImage {
            prompt,
            start,
            end,
            resolution,
            aspect_ratio,
        } => Ok(start_and_end_images(
            prompt.as_deref(),
            start,
            end,
            resolution,
            aspect_ratio,
        )),
        GenerationRequest::MultiReference { prompt, references } => {
            multi_reference_images(&prompt, references)
        }
        GenerationRequest::Extend {
            prompt,
            previous,
            aspect_ratio,
        } => extend_video(&prompt, previous, aspect_ratio),
    }
}
