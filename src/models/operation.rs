use serde::{Deserialize, Serialize};

/// Handle for a server-side video job. Re-fetched until `done` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<VideoResponse>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    #[serde(default)]
    pub generated_videos: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: Option<i32>,
    pub message: String,
}

impl VideoOperation {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            response: None,
            error: None,
        }
    }

    pub fn completed(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            response: Some(VideoResponse {
                generated_videos: vec![GeneratedSample {
                    video: Some(VideoRef {
                        uri: Some(uri.into()),
                    }),
                }],
            }),
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            response: None,
            error: Some(OperationError {
                code: Some(code),
                message: message.into(),
            }),
        }
    }

    /// Uri of the first generated video, if the job produced one.
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generated_videos
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_uri_extraction() {
        let op = VideoOperation::completed("operations/1", "https://files/v1?alt=media");
        assert_eq!(op.video_uri(), Some("https://files/v1?alt=media"));

        let mut empty = VideoOperation::pending("operations/2");
        empty.done = true;
        empty.response = Some(VideoResponse {
            generated_videos: vec![GeneratedSample { video: None }],
        });
        assert_eq!(empty.video_uri(), None);
    }
}
