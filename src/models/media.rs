use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::common::{AspectRatio, Resolution};

/// An image the user picked, not yet read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub path: PathBuf,
    pub mime_type: String,
}

impl ImageFile {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_type_for(&path).to_string();

        Self {
            name,
            path,
            mime_type,
        }
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Base64 image bytes ready to embed in a request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    #[serde(rename = "bytesBase64Encoded")]
    pub image_bytes: String,
    pub mime_type: String,
}

// Payloads are large; keep them out of debug logs.
impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("image_bytes", &format_args!("<{} base64 chars>", self.image_bytes.len()))
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    pub uri: String,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
}
