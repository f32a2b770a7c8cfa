//! Common types for Backdrop.
//!
//! This crate defines the data shared between the playback core
//! (`backdrop`) and the UI layer that hosts it:
//!
//! - the filename metadata protocol ([`VideoMetadata`]), which lets an
//!   asset carry its background color, autoplay stop frame and fill mode
//!   in its own name
//! - the lifecycle events emitted by the playback core ([`PlaybackEvent`])
//! - the error taxonomy ([`PlaybackError`])
//!
//! Everything here is serializable so a UI bridge can forward events and
//! errors as JSON.
//!
//! # Filename protocol
//!
//! Tokens are ASCII, case-sensitive and delimited by dots:
//!
//! | Token            | Meaning                                   |
//! |------------------|-------------------------------------------|
//! | `.RGBrrggbb.`    | background fill color (6 hex digits)      |
//! | `.KF<digits>.`   | autoplay stop frame for long clips        |
//! | `.RTF.`          | fill (crop) instead of fit (letterbox)    |
//!
//! # Examples
//!
//! ```
//! use common::{BackgroundColor, FillMode, VideoMetadata};
//!
//! let meta = VideoMetadata::from_filename("clip.RGB00ff00.KF30.RTF.mp4");
//! assert_eq!(meta.background, BackgroundColor::new(0x00, 0xff, 0x00));
//! assert_eq!(meta.stop_frame, Some(30));
//! assert_eq!(meta.fill_mode, FillMode::Fill);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy of the playback core.
///
/// None of these cross the controller boundary as a `Result`: load
/// failures surface as [`PlaybackEvent::VideoLoaded`] with `success: false`
/// and the rest are logged and absorbed.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackError {
    #[error("Load failure: {0}")]
    LoadFailure(String),

    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Player error: {0}")]
    Player(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Discrete lifecycle events emitted by the playback core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Asset finished loading (or failed to).
    VideoLoaded { success: bool },
    /// Autoplay reached its end. Fires at most once per session.
    AutoplayFinished,
    /// Manual playback reached the natural end of the media.
    PlayFinished,
    /// Manual playback was cancelled by the user or the host.
    PlayCancelled,
    /// A quarter of the clip was watched during manual playback.
    #[serde(rename = "played_25_percent")]
    Played25Percent,
}

/// How the video is fitted into the surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillMode {
    /// Scale to fit within the surface (may letterbox)
    #[default]
    Fit,
    /// Scale to fill the entire surface (may crop)
    Fill,
}

/// Opaque background color shown behind the video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BackgroundColor {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a 6 digit hex color ("ff0000"), with or without a leading '#'
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }

    /// Color as normalized RGBA floats (alpha is always 1.0)
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            1.0,
        ]
    }
}

/// Metadata encoded in a video asset's filename.
///
/// Parsed once when an asset is loaded. Malformed or missing tokens are
/// never an error; they fall back to black, no stop frame and fit mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub background: BackgroundColor,
    pub stop_frame: Option<u64>,
    pub fill_mode: FillMode,
}

impl VideoMetadata {
    pub fn from_filename(filename: &str) -> Self {
        Self {
            background: parse_background(filename),
            stop_frame: parse_stop_frame(filename),
            fill_mode: parse_fill_mode(filename),
        }
    }
}

/// Find the first `.<prefix><body>.` token whose body is a non-empty run of
/// characters accepted by `accept`, returning the body.
fn find_token<'a>(filename: &'a str, prefix: &str, accept: fn(&u8) -> bool) -> Option<&'a str> {
    filename.match_indices(prefix).find_map(|(start, _)| {
        let rest = &filename[start + prefix.len()..];
        let len = rest.bytes().take_while(accept).count();
        (len > 0 && rest.as_bytes().get(len) == Some(&b'.')).then(|| &rest[..len])
    })
}

fn parse_background(filename: &str) -> BackgroundColor {
    find_token(filename, ".RGB", u8::is_ascii_hexdigit)
        .and_then(BackgroundColor::parse_hex)
        .unwrap_or(BackgroundColor::BLACK)
}

fn parse_stop_frame(filename: &str) -> Option<u64> {
    find_token(filename, ".KF", u8::is_ascii_digit)?.parse().ok()
}

fn parse_fill_mode(filename: &str) -> FillMode {
    if filename.contains(".RTF.") {
        FillMode::Fill
    } else {
        FillMode::Fit
    }
}
