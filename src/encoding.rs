use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::try_join_all;

use crate::{
    error::{Result, VideoGenError},
    models::{ImageFile, ImagePayload},
};

fn io_error(file: &ImageFile, error: std::io::Error) -> VideoGenError {
    VideoGenError::IoError {
        name: file.name.clone(),
        message: error.to_string(),
    }
}

fn too_large(file: &ImageFile, size: u64, max_bytes: u64) -> VideoGenError {
    VideoGenError::validation(format!(
        "Image '{}' is too large ({} bytes, limit {} bytes).",
        file.name, size, max_bytes
    ))
}

/// Reads an uploaded image fully and converts it to a base64 payload.
///
/// The size limit is checked against file metadata before anything is read.
pub async fn encode_image(file: &ImageFile, max_bytes: u64) -> Result<ImagePayload> {
    let size = tokio::fs::metadata(&file.path)
        .await
        .map_err(|e| io_error(file, e))?
        .len();
    if size > max_bytes {
        return Err(too_large(file, size, max_bytes));
    }

    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| io_error(file, e))?;

    // the file may have grown since the metadata call
    if bytes.len() as u64 > max_bytes {
        return Err(too_large(file, bytes.len() as u64, max_bytes));
    }

    log::debug!(
        "Encoded image {} ({} bytes, {})",
        file.name,
        bytes.len(),
        file.mime_type
    );

    Ok(ImagePayload {
        image_bytes: STANDARD.encode(&bytes),
        mime_type: file.mime_type.clone(),
    })
}

/// Encodes every file concurrently. The first failure fails the batch.
pub async fn encode_images(files: &[ImageFile], max_bytes: u64) -> Result<Vec<ImagePayload>> {
    try_join_all(files.iter().map(|file| encode_image(file, max_bytes))).await
}
