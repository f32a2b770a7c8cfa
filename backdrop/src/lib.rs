//! Background video playback core.
//!
//! Backdrop drives a looping background video on a home surface: it
//! autoplays a muted preview whose length is derived from the asset's
//! filename, then lets the user tap into full playback with a transient
//! play/pause overlay.
//!
//! - [`player`]: the opaque [`Player`](player::Player) capability
//! - [`playback`]: the [`PlaybackController`](playback::PlaybackController)
//!   state machine
//! - [`overlay`]: the tap overlay and its icon flash
//! - [`runtime`]: a tokio task owning the controller
//! - [`config`]: TOML configuration
//!
//! With the `gstreamer` feature, `gst_player::GstPlayer` implements the
//! player over a GStreamer `playbin`.

pub mod macros;

pub mod config;
pub mod overlay;
pub mod playback;
pub mod player;
pub mod runtime;

#[cfg(feature = "gstreamer")]
pub mod gst_player;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use common::{BackgroundColor, FillMode, PlaybackError, PlaybackEvent, VideoMetadata};
pub use config::Config;
pub use playback::{PlaybackController, PlaybackSettings};
pub use runtime::{PlaybackHandle, Request};
