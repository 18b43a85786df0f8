use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const VIDEO_LOADING_MESSAGES: [&str; 7] = [
    "Crafting your cinematic masterpiece...",
    "The AI director is envisioning your scene...",
    "Generating frames with a touch of magic...",
    "Assembling pixels into moving stories...",
    "Adding the final touches to your visual narrative...",
    "Almost there! Your video is rendering...",
    "Just a moment more, the AI is perfecting your video...",
];

const MIN_ROTATION_PERIOD: Duration = Duration::from_millis(100);

/// Rotating loading message for one generation cycle.
///
/// The rotation task lives exactly as long as the ticker; dropping it aborts
/// the task.
pub struct StatusTicker {
    handle: JoinHandle<()>,
}

impl StatusTicker {
    /// Publishes the first message immediately, then advances every `period`
    /// (at least 100 ms).
    pub fn start(sender: Arc<watch::Sender<String>>, period: Duration) -> Self {
        sender.send_replace(VIDEO_LOADING_MESSAGES[0].to_string());
        let period = period.max(MIN_ROTATION_PERIOD);

        let handle = tokio::spawn(async move {
            let mut index = 0;
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                index = (index + 1) % VIDEO_LOADING_MESSAGES.len();
                sender.send_replace(VIDEO_LOADING_MESSAGES[index].to_string());
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
