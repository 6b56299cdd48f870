use std::sync::Arc;

use rollcall_business::{AttendFlow, BusinessConfig, EnrollFlow, Gateway, HttpGateway, VideoFeed};

use crate::camera::TestPattern;

/// Which kiosk page is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Attendance,
    Enroll,
}

/// The main application state.
///
/// Owns the tokio runtime the flows schedule their timers on; dropping the
/// state stops every pending countdown and auto-clear with it.
pub struct State {
    _rt: tokio::runtime::Runtime,
    pub video: VideoFeed,
    pub enroll: EnrollFlow,
    pub attendance: AttendFlow,
    pub page: Page,
    /// Reused GPU texture for the live preview.
    pub preview: Option<egui::TextureHandle>,
}

impl State {
    pub fn new(config: BusinessConfig) -> Self {
        let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&config));
        Self::with_gateway(gateway)
    }

    /// Builds the state around any gateway; tests inject scripted ones.
    pub fn with_gateway(gateway: Arc<dyn Gateway>) -> Self {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .expect("failed to start the timer runtime");
        let video = VideoFeed::new(Arc::new(TestPattern::new(640, 480)));
        let enroll = EnrollFlow::new(Arc::clone(&gateway), video.clone(), rt.handle().clone());
        let attendance = AttendFlow::new(gateway, video.clone(), rt.handle().clone());
        Self {
            _rt: rt,
            video,
            enroll,
            attendance,
            page: Page::Attendance,
            preview: None,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new(BusinessConfig::default())
    }
}
