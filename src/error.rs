use thiserror::Error;

/// Failure text the Gemini API returns when the selected key no longer maps to a
/// usable project. Seeing it means the user must pick a key again.
pub const KEY_NOT_FOUND_SIGNATURE: &str = "Requested entity was not found.";

pub const KEY_ERROR_MESSAGE: &str = "API key issue detected. Please re-select your API key.";
pub const MISSING_RESULT_MESSAGE: &str = "Video generation completed but no video URI was found.";

#[derive(Debug, Error)]
pub enum VideoGenError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to read image '{name}': {message}")]
    IoError { name: String, message: String },
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("{message}")]
    OperationError { code: Option<i32>, message: String },
    #[error("{}", MISSING_RESULT_MESSAGE)]
    MissingResult,
    #[error("Operation did not finish after {0} status checks")]
    PollLimitExceeded(u32),
    #[error("A video generation is already in progress")]
    Busy,
}

impl From<reqwest::Error> for VideoGenError {
    fn from(e: reqwest::Error) -> Self {
        VideoGenError::RequestError(e.to_string())
    }
}

impl From<serde_json::Error> for VideoGenError {
    fn from(e: serde_json::Error) -> Self {
        VideoGenError::SerializationError(e.to_string())
    }
}

impl From<url::ParseError> for VideoGenError {
    fn from(e: url::ParseError) -> Self {
        VideoGenError::ResponseError(format!("invalid url: {}", e))
    }
}

impl From<std::io::Error> for VideoGenError {
    fn from(e: std::io::Error) -> Self {
        VideoGenError::IoError {
            name: "unknown".to_string(),
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VideoGenError>;

/// Which half of a generation cycle a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Submission,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Credential,
    MissingResult,
    Generic,
}

impl VideoGenError {
    pub fn validation(msg: impl Into<String>) -> Self {
        VideoGenError::ValidationError(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            VideoGenError::MissingResult => FailureKind::MissingResult,
            other if other.to_string().contains(KEY_NOT_FOUND_SIGNATURE) => {
                FailureKind::Credential
            }
            _ => FailureKind::Generic,
        }
    }

    pub fn is_credential_error(&self) -> bool {
        self.kind() == FailureKind::Credential
    }

    /// Text shown to the user when a cycle ends with this error.
    pub fn user_message(&self, stage: Stage) -> String {
        match (self.kind(), stage) {
            (FailureKind::Credential, _) => KEY_ERROR_MESSAGE.to_string(),
            (FailureKind::MissingResult, _) => MISSING_RESULT_MESSAGE.to_string(),
            (FailureKind::Generic, Stage::Submission) => {
                format!("Video generation failed: {}", self)
            }
            (FailureKind::Generic, Stage::Polling) => {
                format!("Failed to retrieve video status: {}", self)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_signature_is_credential_error() {
        let err = VideoGenError::ApiError {
            status: 404,
            message: "Requested entity was not found.".to_string(),
        };
        assert!(err.is_credential_error());
        assert_eq!(err.user_message(Stage::Polling), KEY_ERROR_MESSAGE);
        assert_eq!(err.user_message(Stage::Submission), KEY_ERROR_MESSAGE);
    }

    #[test]
    fn test_generic_messages_depend_on_stage() {
        let err = VideoGenError::validation("Prompt is required for Text to Video.");
        assert_eq!(
            err.user_message(Stage::Submission),
            "Video generation failed: Prompt is required for Text to Video."
        );

        let err = VideoGenError::OperationError {
            code: Some(3),
            message: "quota exceeded".to_string(),
        };
        assert_eq!(
            err.user_message(Stage::Polling),
            "Failed to retrieve video status: quota exceeded"
        );
    }

    #[test]
    fn test_missing_result_message() {
        let err = VideoGenError::MissingResult;
        assert_eq!(err.kind(), FailureKind::MissingResult);
        assert_eq!(err.user_message(Stage::Polling), MISSING_RESULT_MESSAGE);
    }
}
