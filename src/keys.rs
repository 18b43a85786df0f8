//! API key selection.
//!
//! The host decides where the key comes from. The controller only needs to tell
//! it when the current key stopped working.

use crate::{config::GenAiConfig, error::Result};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

#[async_trait]
pub trait KeySelector: Send + Sync {
    async fn has_selected_key(&self) -> Result<bool>;
    async fn open_select_key(&self) -> Result<()>;
}

/// Receives notice that the vendor rejected the current key.
pub trait KeyErrorListener: Send + Sync {
    fn on_key_error(&self);
}

/// Listener for callers that do not track key state.
pub struct NoopKeyListener;

impl KeyErrorListener for NoopKeyListener {
    fn on_key_error(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Unknown,
    Selected,
    NotSelected,
}

/// Key gate in front of the generator.
pub struct KeySession<S: KeySelector> {
    selector: S,
    status: Mutex<KeyStatus>,
}

impl<S: KeySelector> KeySession<S> {
    pub fn new(selector: S) -> Self {
        Self {
            selector,
            status: Mutex::new(KeyStatus::Unknown),
        }
    }

    pub fn status(&self) -> KeyStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: KeyStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub async fn check_status(&self) -> KeyStatus {
        let status = match self.selector.has_selected_key().await {
            Ok(true) => KeyStatus::Selected,
            Ok(false) => KeyStatus::NotSelected,
            Err(e) => {
                log::error!("Error checking API key status: {}", e);
                KeyStatus::NotSelected
            }
        };
        self.set_status(status);
        status
    }

    /// Opens the selection flow. Success of the flow itself is assumed.
    pub async fn open_selection(&self) -> KeyStatus {
        let status = match self.selector.open_select_key().await {
            Ok(()) => KeyStatus::Selected,
            Err(e) => {
                log::error!("Error opening API key selection: {}", e);
                KeyStatus::NotSelected
            }
        };
        self.set_status(status);
        status
    }
}

impl<S: KeySelector> KeyErrorListener for KeySession<S> {
    fn on_key_error(&self) {
        log::warn!("API key rejected, selection required");
        self.set_status(KeyStatus::NotSelected);
    }
}

/// Selects the key from the process environment (and `.env`).
///
/// Re-selection only updates the environment. Clients built earlier keep their
/// key until they are rebuilt from [`GenAiConfig::from_env`] and handed to
/// `GenerationController::set_client`.
pub struct EnvKeySelector;

#[async_trait]
impl KeySelector for EnvKeySelector {
    async fn has_selected_key(&self) -> Result<bool> {
        Ok(GenAiConfig::from_env().has_api_key())
    }

    async fn open_select_key(&self) -> Result<()> {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env file reloaded: {}", e);
        }
        if !GenAiConfig::from_env().has_api_key() {
            return Err(crate::error::VideoGenError::ConfigError(
                "set GEMINI_API_KEY or API_KEY".into(),
            ));
        }
        Ok(())
    }
}
