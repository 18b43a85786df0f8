use crate::{
    error::{Result, VideoGenError},
    genai::VideoApi,
    models::VideoOperation,
};
use std::time::Duration;

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Done(VideoOperation),
    /// The owning cycle was abandoned; no further requests were made.
    Abandoned,
}

/// Re-fetches an operation at a fixed interval until it is done.
#[derive(Debug, Clone)]
pub struct OperationPoller {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl OperationPoller {
    pub fn new(interval: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// `still_wanted` is checked after every wait; once it returns false the
    /// loop stops without touching the network again.
    pub async fn poll<F>(
        &self,
        api: &dyn VideoApi,
        mut operation: VideoOperation,
        still_wanted: F,
    ) -> Result<PollOutcome>
    where
        F: Fn() -> bool,
    {
        let mut attempts = 0u32;

        while !operation.done {
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    log::warn!(
                        "Giving up on operation {} after {} status checks",
                        operation.name,
                        attempts
                    );
                    return Err(VideoGenError::PollLimitExceeded(max));
                }
            }

            tokio::time::sleep(self.interval).await;
            if !still_wanted() {
                log::info!("Stopped polling abandoned operation {}", operation.name);
                return Ok(PollOutcome::Abandoned);
            }

            attempts += 1;
            log::info!("Polling operation {} (attempt {})", operation.name, attempts);
            operation = api.get_videos_operation(&operation).await?;

            if let Some(error) = operation.error.take() {
                log::error!("Operation {} failed: {}", operation.name, error.message);
                return Err(VideoGenError::OperationError {
                    code: error.code,
                    message: error.message,
                });
            }
        }

        Ok(PollOutcome::Done(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerateVideosParams;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedApi {
        polls: Mutex<VecDeque<Result<VideoOperation>>>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(polls: Vec<Result<VideoOperation>>) -> Self {
            Self {
                polls: Mutex::new(polls.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VideoApi for ScriptedApi {
        async fn generate_videos(&self, _params: GenerateVideosParams) -> Result<VideoOperation> {
            unreachable!("poller never submits")
        }

        async fn get_videos_operation(&self, _op: &VideoOperation) -> Result<VideoOperation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected poll")
        }
    }

    fn poller() -> OperationPoller {
        OperationPoller::new(Duration::from_secs(10), None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_done_skips_polling() {
        let api = ScriptedApi::new(vec![]);
        let op = VideoOperation::completed("ops/1", "https://f/v");
        let outcome = poller().poll(&api, op.clone(), || true).await.unwrap();
        assert_eq!(outcome, PollOutcome::Done(op));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_done_with_fixed_interval() {
        let api = ScriptedApi::new(vec![
            Ok(VideoOperation::pending("ops/1")),
            Ok(VideoOperation::pending("ops/1")),
            Ok(VideoOperation::completed("ops/1", "https://f/v")),
        ]);
        let started = tokio::time::Instant::now();
        let outcome = poller()
            .poll(&api, VideoOperation::pending("ops/1"), || true)
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Done(ref op) if op.video_uri() == Some("https://f/v")));
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_payload_stops_immediately() {
        let api = ScriptedApi::new(vec![
            Ok(VideoOperation::failed("ops/1", 13, "internal failure")),
            Ok(VideoOperation::pending("ops/1")),
        ]);
        let err = poller()
            .poll(&api, VideoOperation::pending("ops/1"), || true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "internal failure");
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_propagates() {
        let api = ScriptedApi::new(vec![Err(VideoGenError::RequestError("reset".into()))]);
        let err = poller()
            .poll(&api, VideoOperation::pending("ops/1"), || true)
            .await
            .unwrap_err();
        assert!(matches!(err, VideoGenError::RequestError(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_cap() {
        let api = ScriptedApi::new(vec![
            Ok(VideoOperation::pending("ops/1")),
            Ok(VideoOperation::pending("ops/1")),
        ]);
        let err = OperationPoller::new(Duration::from_secs(10), Some(2))
            .poll(&api, VideoOperation::pending("ops/1"), || true)
            .await
            .unwrap_err();
        assert!(matches!(err, VideoGenError::PollLimitExceeded(2)));
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_cycle_stops_before_fetch() {
        let api = ScriptedApi::new(vec![]);
        let wanted = AtomicBool::new(false);
        let outcome = poller()
            .poll(&api, VideoOperation::pending("ops/1"), || {
                wanted.load(Ordering::SeqCst)
            })
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Abandoned);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }
}
