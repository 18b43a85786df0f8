//! Generation session: form state, mode dispatch and the submit/poll cycle.

pub mod poller;
pub mod status;

use crate::{
    builders,
    config::GenerationSettings,
    encoding::{encode_image, encode_images},
    error::{Result, Stage, VideoGenError},
    genai::{playable_url, VideoApi},
    keys::{KeyErrorListener, NoopKeyListener},
    models::{
        AspectRatio, GeneratedVideo, GenerationForm, GenerationRequest, ImageFile, Resolution,
        VideoMode, MAX_REFERENCE_IMAGES,
    },
};
use poller::{OperationPoller, PollOutcome};
use status::StatusTicker;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub use status::VIDEO_LOADING_MESSAGES;

/// Result of one submit, already reduced to what the user sees.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed { video: GeneratedVideo, url: String },
    Failed(String),
    /// The session was reset while the cycle was running.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub form: GenerationForm,
    pub busy: bool,
    pub status_message: Option<String>,
    pub error: Option<String>,
    pub video: Option<GeneratedVideo>,
    pub video_url: Option<String>,
    pub status_ticker_running: bool,
}

struct SessionState {
    form: GenerationForm,
    busy: bool,
    error: Option<String>,
    video: Option<GeneratedVideo>,
    video_url: Option<String>,
    // bumped by every submit and reset; a cycle whose number is stale is ignored
    cycle: u64,
    ticker: Option<StatusTicker>,
}

struct CycleFailure {
    stage: Stage,
    error: VideoGenError,
}

impl CycleFailure {
    fn submission(error: VideoGenError) -> Self {
        Self {
            stage: Stage::Submission,
            error,
        }
    }

    fn polling(error: VideoGenError) -> Self {
        Self {
            stage: Stage::Polling,
            error,
        }
    }
}

pub struct GenerationController {
    api: Arc<dyn VideoApi>,
    key_listener: Arc<dyn KeyErrorListener>,
    api_key: String,
    settings: GenerationSettings,
    state: Mutex<SessionState>,
    status: Arc<watch::Sender<String>>,
}

impl GenerationController {
    pub fn new(
        api: Arc<dyn VideoApi>,
        api_key: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        let (status, _) = watch::channel(VIDEO_LOADING_MESSAGES[0].to_string());

        Self {
            api,
            key_listener: Arc::new(NoopKeyListener),
            api_key: api_key.into(),
            settings,
            state: Mutex::new(SessionState {
                form: GenerationForm::default(),
                busy: false,
                error: None,
                video: None,
                video_url: None,
                cycle: 0,
                ticker: None,
            }),
            status: Arc::new(status),
        }
    }

    pub fn with_key_listener(mut self, listener: Arc<dyn KeyErrorListener>) -> Self {
        self.key_listener = listener;
        self
    }

    /// Swaps the vendor client, e.g. after the user picked a new key.
    /// The form and any previous video are kept.
    pub fn set_client(&mut self, api: Arc<dyn VideoApi>, api_key: impl Into<String>) {
        self.api = api;
        self.api_key = api_key.into();
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_form(&self, form: GenerationForm) {
        self.state().form = form;
    }

    pub fn set_mode(&self, mode: VideoMode) {
        self.state().form.mode = mode;
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.state().form.prompt = prompt.into();
    }

    pub fn set_resolution(&self, resolution: Resolution) {
        self.state().form.resolution = resolution;
    }

    pub fn set_aspect_ratio(&self, aspect_ratio: AspectRatio) {
        self.state().form.aspect_ratio = aspect_ratio;
    }

    pub fn set_start_image(&self, image: Option<ImageFile>) {
        self.state().form.start_image = image;
    }

    pub fn set_end_image(&self, image: Option<ImageFile>) {
        self.state().form.end_image = image;
    }

    /// Sets or clears one reference slot. Slots stay packed: clearing one
    /// shifts the later images down.
    pub fn set_reference_image(&self, index: usize, image: Option<ImageFile>) -> Result<()> {
        if index >= MAX_REFERENCE_IMAGES {
            return Err(VideoGenError::validation(
                "Please provide 1 to 3 reference images.",
            ));
        }

        let mut state = self.state();
        let references = &mut state.form.reference_images;
        match image {
            Some(image) if index < references.len() => references[index] = image,
            Some(image) => references.push(image),
            None if index < references.len() => {
                references.remove(index);
            }
            None => {}
        }
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.state().busy
    }

    /// Whether the current form could be submitted right now.
    pub fn can_generate(&self) -> bool {
        let state = self.state();
        !state.busy && state.form.missing_requirement(state.video.as_ref()).is_none()
    }

    pub fn last_video(&self) -> Option<GeneratedVideo> {
        self.state().video.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            form: state.form.clone(),
            busy: state.busy,
            status_message: state.busy.then(|| self.status.borrow().clone()),
            error: state.error.clone(),
            video: state.video.clone(),
            video_url: state.video_url.clone(),
            status_ticker_running: state.ticker.as_ref().map_or(false, StatusTicker::is_running),
        }
    }

    /// Loading messages published while a cycle runs.
    pub fn status_updates(&self) -> WatchStream<String> {
        WatchStream::new(self.status.subscribe())
    }

    /// Clears inputs, result and error. A running cycle keeps its network
    /// request but its outcome is dropped and it stops polling.
    pub fn reset(&self) {
        let mut state = self.state();
        state.form = GenerationForm {
            mode: state.form.mode,
            resolution: state.form.resolution,
            aspect_ratio: state.form.aspect_ratio,
            ..GenerationForm::default()
        };
        state.video = None;
        state.video_url = None;
        state.error = None;
        state.busy = false;
        state.ticker = None;
        state.cycle += 1;
        log::info!("Session reset");
    }

    fn is_current(&self, cycle: u64) -> bool {
        self.state().cycle == cycle
    }

    /// Runs one generation cycle with the current form.
    ///
    /// Fails only with [`VideoGenError::Busy`]; every other failure is turned
    /// into [`CycleOutcome::Failed`] and recorded in the session.
    pub async fn submit(&self) -> Result<CycleOutcome> {
        let (cycle, form, previous) = {
            let mut state = self.state();
            if state.busy {
                return Err(VideoGenError::Busy);
            }
            state.busy = true;
            state.error = None;
            state.video_url = None;
            let previous = state.video.take();
            state.cycle += 1;
            state.ticker = Some(StatusTicker::start(
                Arc::clone(&self.status),
                self.settings.status_rotation_interval,
            ));
            (state.cycle, state.form.clone(), previous)
        };

        let mut guard = CycleGuard {
            controller: self,
            cycle,
            armed: true,
        };

        log::info!("Starting {} generation", form.mode);
        let _timer = crate::logger::timer("video generation cycle");

        let result = self.run_cycle(cycle, &form, previous).await;
        guard.armed = false;
        Ok(self.finish_cycle(cycle, result))
    }

    async fn run_cycle(
        &self,
        cycle: u64,
        form: &GenerationForm,
        previous: Option<GeneratedVideo>,
    ) -> std::result::Result<Option<(GeneratedVideo, String)>, CycleFailure> {
        let request = self
            .prepare_request(form, previous)
            .await
            .map_err(CycleFailure::submission)?;
        let params = builders::build(request).map_err(CycleFailure::submission)?;
        let (resolution, aspect_ratio) = (params.config.resolution, params.config.aspect_ratio);

        let operation = self
            .api
            .generate_videos(params)
            .await
            .map_err(CycleFailure::submission)?;

        let poller = OperationPoller::new(
            self.settings.poll_interval,
            self.settings.max_poll_attempts,
        );
        let operation = match poller
            .poll(self.api.as_ref(), operation, || self.is_current(cycle))
            .await
            .map_err(CycleFailure::polling)?
        {
            PollOutcome::Done(operation) => operation,
            PollOutcome::Abandoned => return Ok(None),
        };

        let uri = operation
            .video_uri()
            .ok_or(VideoGenError::MissingResult)
            .map_err(CycleFailure::polling)?;
        let url = playable_url(uri, &self.api_key).map_err(CycleFailure::polling)?;

        Ok(Some((
            GeneratedVideo {
                uri: uri.to_string(),
                resolution,
                aspect_ratio,
            },
            url,
        )))
    }

    /// Validates the form for its mode, then reads only the images that mode uses.
    async fn prepare_request(
        &self,
        form: &GenerationForm,
        previous: Option<GeneratedVideo>,
    ) -> Result<GenerationRequest> {
        if let Some(message) = form.missing_requirement(previous.as_ref()) {
            return Err(VideoGenError::ValidationError(message));
        }

        let prompt = form.trimmed_prompt().unwrap_or_default().to_string();
        let max_bytes = self.settings.max_image_bytes;
        let missing = |msg: &str| VideoGenError::validation(msg);

        let request = match form.mode {
            VideoMode::TextToVideo => GenerationRequest::TextToVideo {
                prompt,
                resolution: form.resolution,
                aspect_ratio: form.aspect_ratio,
            },
            VideoMode::TextAndImageToVideo => {
                let start = form
                    .start_image
                    .as_ref()
                    .ok_or_else(|| missing("Starting image is required for Text & Image to Video."))?;
                GenerationRequest::TextAndImage {
                    prompt,
                    start: encode_image(start, max_bytes).await?,
                    resolution: form.resolution,
                    aspect_ratio: form.aspect_ratio,
                }
            }
            VideoMode::StartEndImageVideo => {
                let start = form
                    .start_image
                    .as_ref()
                    .ok_or_else(|| missing("Starting image is required for Start & End Image Video."))?;
                let end = form
                    .end_image
                    .as_ref()
                    .ok_or_else(|| missing("Ending image is required for Start & End Image Video."))?;
                let (start, end) = futures::try_join!(
                    encode_image(start, max_bytes),
                    encode_image(end, max_bytes)
                )?;
                GenerationRequest::StartEndImage {
                    prompt: (!prompt.is_empty()).then_some(prompt),
                    start,
                    end,
                    resolution: form.resolution,
                    aspect_ratio: form.aspect_ratio,
                }
            }
            VideoMode::MultiReferenceVideo => GenerationRequest::MultiReference {
                prompt,
                references: encode_images(&form.reference_images, max_bytes).await?,
            },
            VideoMode::ExtendVideo => GenerationRequest::Extend {
                prompt,
                previous: previous.ok_or_else(|| {
                    missing("No previous video found to extend. Generate a video first.")
                })?,
                aspect_ratio: form.aspect_ratio,
            },
        };

        Ok(request)
    }

    fn finish_cycle(
        &self,
        cycle: u64,
        result: std::result::Result<Option<(GeneratedVideo, String)>, CycleFailure>,
    ) -> CycleOutcome {
        let mut state = self.state();
        if state.cycle != cycle {
            log::info!("Discarding outcome of a reset generation cycle");
            return CycleOutcome::Discarded;
        }
        state.busy = false;
        state.ticker = None;

        match result {
            Ok(Some((video, url))) => {
                log::info!("Video ready: {}", video.uri);
                state.video = Some(video.clone());
                state.video_url = Some(url.clone());
                state.error = None;
                CycleOutcome::Completed { video, url }
            }
            Ok(None) => CycleOutcome::Discarded,
            Err(CycleFailure { stage, error }) => {
                log::error!("Video generation {:?} error: {}", stage, error);
                let message = error.user_message(stage);
                state.error = Some(message.clone());
                drop(state);

                if error.is_credential_error() {
                    self.key_listener.on_key_error();
                }
                CycleOutcome::Failed(message)
            }
        }
    }
}

/// Releases the busy flag and the status ticker when a `submit` future is
/// dropped before its cycle finishes.
struct CycleGuard<'a> {
    controller: &'a GenerationController,
    cycle: u64,
    armed: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.controller.state();
        if state.cycle == self.cycle {
            log::warn!("Generation cycle dropped before completion");
            state.busy = false;
            state.ticker = None;
        }
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        // make sure the rotation task does not outlive the session
        self.state().ticker = None;
    }
}
