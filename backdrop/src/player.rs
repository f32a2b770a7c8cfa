//! The opaque player capability driven by the playback core.
//!
//! A [`Player`] decodes and renders one video item. The core never looks
//! inside it: it loads an asset, issues transport commands and registers
//! observers. Observations come back as [`PlayerNotification`]s tagged with
//! the [`ObserverToken`] they were registered under, so the controller can
//! drop anything that belongs to a released observer or a superseded
//! session.

use common::{FillMode, PlaybackError};
use futures::future::BoxFuture;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a [`Player`] implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Player command '{command}' failed: {reason}")]
    Command {
        command: &'static str,
        reason: String,
    },

    #[error("Track metadata unavailable: {0}")]
    Metadata(String),
}

impl From<PlayerError> for PlaybackError {
    fn from(error: PlayerError) -> Self {
        match error {
            PlayerError::Load { .. } => PlaybackError::LoadFailure(error.to_string()),
            PlayerError::Metadata(reason) => PlaybackError::MetadataUnavailable(reason),
            PlayerError::Command { .. } => PlaybackError::Player(error.to_string()),
        }
    }
}

/// Identifies one asset load. Monotonic per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle for one registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken {
    pub(crate) session: SessionId,
    pub(crate) slot: u32,
}

impl ObserverToken {
    pub fn session(&self) -> SessionId {
        self.session
    }
}

/// What an observer is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverKind {
    /// Item status changes (ready / failed)
    Status,
    /// The current time changed discontinuously, including stopping at the
    /// forward playback end time
    TimeJumped,
    /// Playback reached the end of the media (or the forward end time)
    EndOfMedia,
    /// Periodic samples of the playback position
    Periodic(Duration),
}

/// Item status as reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Unknown,
    ReadyToPlay,
    Failed,
}

/// A single observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerSignal {
    Status(PlayerStatus),
    TimeJumped { current_time: Duration },
    EndOfMedia,
    Tick { current_time: Duration },
}

/// An observation delivered to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerNotification {
    pub token: ObserverToken,
    pub signal: PlayerSignal,
}

/// Channel used by players to deliver notifications to the runtime
pub type NotificationSender = mpsc::UnboundedSender<PlayerNotification>;
pub type NotificationReceiver = mpsc::UnboundedReceiver<PlayerNotification>;

/// Create the channel a player reports its observations on
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}

/// Duration and frame rate of the loaded item's video track
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackParams {
    pub duration: Option<Duration>,
    pub frame_rate: Option<f32>,
}

/// Asynchronous track discovery, detached from the player's borrow
pub type TrackParamsFuture = BoxFuture<'static, Result<TrackParams, PlayerError>>;

/// Playback engine capability.
///
/// Implementations own the decoder and the render target. Every method is
/// called from the single task that owns the controller.
pub trait Player: Send {
    /// Replace the current item with the asset at `path`.
    ///
    /// An `Err` here is treated exactly like a failed status.
    fn load(&mut self, path: &Path) -> Result<(), PlayerError>;

    fn play(&mut self) -> Result<(), PlayerError>;

    fn pause(&mut self) -> Result<(), PlayerError>;

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError>;

    fn set_muted(&mut self, muted: bool);

    /// Stop forward playback at `end`, or clear the limit with `None`
    fn set_forward_end_time(&mut self, end: Option<Duration>);

    fn set_fill_mode(&mut self, mode: FillMode);

    /// Start delivering observations of `kind` tagged with `token`
    fn observe(&mut self, token: ObserverToken, kind: ObserverKind);

    /// Stop delivering observations for `token`. Unknown tokens are ignored.
    fn unobserve(&mut self, token: ObserverToken);

    /// Discover duration and frame rate of the current item
    fn track_params(&self) -> TrackParamsFuture;
}
