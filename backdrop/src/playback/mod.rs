//! Background video playback state machine
//!
//! The [`PlaybackController`] owns one [`Player`](crate::player::Player)
//! and the live [`Session`](session::Session) for the asset it shows:
//!
//! 1. `setup_player` tears down the previous session, parses the filename
//!    metadata and loads the asset muted
//! 2. once the player is ready, duration and frame rate are discovered
//!    asynchronously (see [`crate::runtime`])
//! 3. autoplay runs for the whole clip when it is short, otherwise up to
//!    the authored stop frame or the autoplay ceiling
//! 4. the first tap finalizes autoplay and enters manual playback; later
//!    taps alternate play and pause
//!
//! Autoplay completion and manual playback are orthogonal: a session
//! tracks `autoplay_finished` and a [`ManualPlayState`] separately.

mod controller;
mod progress;
mod session;


pub use controller::{Discovery, PlaybackController};
pub use progress::PROGRESS_MILESTONE;
pub use session::{LoadPhase, ManualPlayState};

use crate::overlay::OverlayView;
use crate::player::SessionId;
use common::{BackgroundColor, FillMode};
use std::time::Duration;

/// Playback tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Autoplay ceiling; clips at most this long are "short"
    pub max_autoplay_duration: Duration,
    /// Grace period between track discovery and acting on it
    pub settle_delay: Duration,
    /// Sampling interval of the watch-progress observer
    pub progress_interval: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            max_autoplay_duration: Duration::from_secs(6),
            settle_delay: Duration::from_millis(500),
            progress_interval: Duration::from_millis(100),
        }
    }
}

/// Render snapshot handed to the UI layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
    pub session: Option<SessionId>,
    pub background: BackgroundColor,
    pub fill_mode: FillMode,
    pub visible: bool,
    pub overlay: OverlayView,
}

/// How long autoplay runs for a clip of `duration`.
///
/// Short clips play to their natural end. Long clips stop at
/// `stop_frame / frame_rate` when both are known, otherwise at `ceiling`.
/// A stop time too large to represent clamps to the clip duration.
pub fn autoplay_length(
    duration: Duration,
    ceiling: Duration,
    stop_frame: Option<u64>,
    frame_rate: Option<f32>,
) -> Duration {
    if duration <= ceiling {
        return duration;
    }

    match (stop_frame, frame_rate) {
        (Some(frame), Some(rate)) if rate.is_finite() && rate > 0.0 => {
            Duration::try_from_secs_f64(frame as f64 / f64::from(rate)).unwrap_or(duration)
        }
        _ => ceiling,
    }
}
