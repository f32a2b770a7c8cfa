//! GStreamer-backed [`Player`]
//!
//! Wraps a `playbin` element. GStreamer has no forward playback end time,
//! so [`GstPlayer::pump`] enforces it: when the position crosses the limit
//! the pipeline is paused and observers see a time jump followed by end of
//! media. Bus messages and periodic samples are also delivered from `pump`,
//! which the host calls from its frame loop.

use crate::player::{
    NotificationSender, ObserverKind, ObserverToken, Player, PlayerError, PlayerNotification,
    PlayerSignal, PlayerStatus, TrackParams, TrackParamsFuture,
};
use common::FillMode;
use futures::FutureExt;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_video as gst_video;
use std::path::Path;
use std::time::{Duration, Instant};

/// Initialize GStreamer (idempotent)
fn initialize_gstreamer() -> Result<(), PlayerError> {
    gst::init().map_err(|e| PlayerError::Command {
        command: "init",
        reason: e.to_string(),
    })
}

fn to_duration(time: gst::ClockTime) -> Duration {
    Duration::from_nanos(time.nseconds())
}

/// Saturates at `ClockTime::MAX`; `u64::MAX` is reserved for "none"
fn to_clock_time(duration: Duration) -> gst::ClockTime {
    let max = gst::ClockTime::MAX.nseconds();
    let nanos = u64::try_from(duration.as_nanos()).unwrap_or(max).min(max);
    gst::ClockTime::from_nseconds(nanos)
}

struct Observer {
    token: ObserverToken,
    kind: ObserverKind,
    last_sample: Option<Instant>,
}

pub struct GstPlayer {
    playbin: Option<gst::Element>,
    notifications: NotificationSender,
    observers: Vec<Observer>,
    forward_end: Option<Duration>,
    end_reached: bool,
    ready_reported: bool,
    muted: bool,
    fill_mode: FillMode,
}

impl GstPlayer {
    pub fn new(notifications: NotificationSender) -> Self {
        Self {
            playbin: None,
            notifications,
            observers: Vec::new(),
            forward_end: None,
            end_reached: false,
            ready_reported: false,
            muted: false,
            fill_mode: FillMode::default(),
        }
    }

    /// Fill mode the renderer should apply to the video sink
    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    /// Drain the bus, enforce the forward end time and sample periodic
    /// observers. Call once per frame.
    pub fn pump(&mut self) {
        let Some(playbin) = self.playbin.clone() else {
            return;
        };

        if let Some(bus) = playbin.bus() {
            while let Some(msg) = bus.pop() {
                match msg.view() {
                    gst::MessageView::AsyncDone(_) => {
                        if !self.ready_reported {
                            self.ready_reported = true;
                            log::debug!("Pipeline prerolled");
                            self.notify(
                                |kind| kind == ObserverKind::Status,
                                PlayerSignal::Status(PlayerStatus::ReadyToPlay),
                            );
                        }
                    }
                    gst::MessageView::Eos(_) => {
                        log::debug!("Video reached EOS");
                        self.notify(
                            |kind| kind == ObserverKind::EndOfMedia,
                            PlayerSignal::EndOfMedia,
                        );
                    }
                    gst::MessageView::Error(err) => {
                        log::error!(
                            "GStreamer error: {} (debug: {:?})",
                            err.error(),
                            err.debug()
                        );
                        self.notify(
                            |kind| kind == ObserverKind::Status,
                            PlayerSignal::Status(PlayerStatus::Failed),
                        );
                    }
                    _ => {
                        // Drain other messages
                    }
                }
            }
        }

        let Some(position) = playbin.query_position::<gst::ClockTime>().map(to_duration) else {
            return;
        };

        if let Some(end) = self.forward_end
            && !self.end_reached
            && position >= end
        {
            self.end_reached = true;
            log::debug!("Reached forward end time at {:.2}s", position.as_secs_f64());
            if let Err(e) = playbin.set_state(gst::State::Paused) {
                log::warn!("Failed to pause at forward end time: {}", e);
            }
            self.notify(
                |kind| kind == ObserverKind::TimeJumped,
                PlayerSignal::TimeJumped {
                    current_time: position,
                },
            );
            self.notify(
                |kind| kind == ObserverKind::EndOfMedia,
                PlayerSignal::EndOfMedia,
            );
        }

        let now = Instant::now();
        for observer in &mut self.observers {
            let ObserverKind::Periodic(interval) = observer.kind else {
                continue;
            };
            let due = observer
                .last_sample
                .is_none_or(|last| now.duration_since(last) >= interval);
            if due {
                observer.last_sample = Some(now);
                let notification = PlayerNotification {
                    token: observer.token,
                    signal: PlayerSignal::Tick {
                        current_time: position,
                    },
                };
                if self.notifications.send(notification).is_err() {
                    log::trace!("Notification receiver dropped");
                }
            }
        }
    }

    fn notify(&self, matches: impl Fn(ObserverKind) -> bool, signal: PlayerSignal) {
        for observer in self.observers.iter().filter(|o| matches(o.kind)) {
            let notification = PlayerNotification {
                token: observer.token,
                signal,
            };
            if self.notifications.send(notification).is_err() {
                log::trace!("Notification receiver dropped");
            }
        }
    }

    fn playbin(&self, command: &'static str) -> Result<&gst::Element, PlayerError> {
        self.playbin.as_ref().ok_or(PlayerError::Command {
            command,
            reason: "nothing loaded".to_string(),
        })
    }

    fn set_state(&self, command: &'static str, state: gst::State) -> Result<(), PlayerError> {
        self.playbin(command)?
            .set_state(state)
            .map(|_| ())
            .map_err(|e| PlayerError::Command {
                command,
                reason: e.to_string(),
            })
    }

    fn shutdown_pipeline(&mut self) {
        if let Some(playbin) = self.playbin.take() {
            if let Err(e) = playbin.set_state(gst::State::Null) {
                log::warn!("Failed to set pipeline state to Null: {}", e);
            }
            log::debug!("Pipeline stopped");
        }
    }
}

impl Player for GstPlayer {
    fn load(&mut self, path: &Path) -> Result<(), PlayerError> {
        initialize_gstreamer()?;
        self.shutdown_pipeline();
        self.ready_reported = false;
        self.end_reached = false;
        self.forward_end = None;

        let load_error = |reason: String| PlayerError::Load {
            path: path.display().to_string(),
            reason,
        };

        let uri = gst::glib::filename_to_uri(path, None).map_err(|e| load_error(e.to_string()))?;
        log::info!("Loading video: {}", uri);

        let playbin = gst::ElementFactory::make("playbin")
            .property("uri", uri.as_str())
            .property("mute", self.muted)
            .build()
            .map_err(|e| load_error(e.to_string()))?;

        playbin
            .set_state(gst::State::Paused)
            .map_err(|e| load_error(e.to_string()))?;

        self.playbin = Some(playbin);
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        self.set_state("play", gst::State::Playing)
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.set_state("pause", gst::State::Paused)
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.playbin("seek")?
            .seek_simple(
                gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE,
                to_clock_time(position),
            )
            .map_err(|e| PlayerError::Command {
                command: "seek",
                reason: e.to_string(),
            })?;

        if self.forward_end.is_some_and(|end| position < end) {
            self.end_reached = false;
        }
        self.notify(
            |kind| kind == ObserverKind::TimeJumped,
            PlayerSignal::TimeJumped {
                current_time: position,
            },
        );
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(playbin) = &self.playbin {
            playbin.set_property("mute", muted);
        }
    }

    fn set_forward_end_time(&mut self, end: Option<Duration>) {
        self.forward_end = end;
        self.end_reached = false;
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        self.fill_mode = mode;
    }

    fn observe(&mut self, token: ObserverToken, kind: ObserverKind) {
        self.observers.push(Observer {
            token,
            kind,
            last_sample: None,
        });
    }

    fn unobserve(&mut self, token: ObserverToken) {
        self.observers.retain(|o| o.token != token);
    }

    fn track_params(&self) -> TrackParamsFuture {
        let result = self.playbin("track_params").map(|playbin| {
            let duration = playbin
                .query_duration::<gst::ClockTime>()
                .map(to_duration);
            TrackParams {
                duration,
                frame_rate: detect_fps(playbin),
            }
        });
        futures::future::ready(result).boxed()
    }
}

impl Drop for GstPlayer {
    fn drop(&mut self) {
        self.shutdown_pipeline();
    }
}

/// Frame rate of the first video stream, from its negotiated caps
fn detect_fps(playbin: &gst::Element) -> Option<f32> {
    let pad = playbin.emit_by_name::<Option<gst::Pad>>("get-video-pad", &[&0i32])?;
    let caps = pad.current_caps()?;
    let info = gst_video::VideoInfo::from_caps(&caps).ok()?;
    let fps = info.fps();

    if fps.denom() == 0 || fps.numer() <= 0 {
        log::warn!("Could not detect video FPS");
        return None;
    }

    let fps = fps.numer() as f32 / fps.denom() as f32;
    log::info!("Detected video FPS: {:.2}", fps);
    Some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::notification_channel;

    #[test]
    fn test_clock_time_conversion() {
        let position = Duration::from_millis(2_500);
        assert_eq!(to_clock_time(position), gst::ClockTime::from_mseconds(2_500));
        assert_eq!(to_duration(gst::ClockTime::from_mseconds(2_500)), position);
        assert_eq!(to_clock_time(Duration::ZERO), gst::ClockTime::ZERO);
    }

    #[test]
    fn test_clock_time_saturates() {
        assert_eq!(to_clock_time(Duration::MAX), gst::ClockTime::MAX);
    }

    #[test]
    fn test_forward_end_time_rearms() {
        let (tx, _rx) = notification_channel();
        let mut player = GstPlayer::new(tx);

        player.set_forward_end_time(Some(Duration::from_secs(2)));
        player.end_reached = true;
        player.set_forward_end_time(Some(Duration::from_secs(4)));
        assert_eq!(player.forward_end, Some(Duration::from_secs(4)));
        assert!(!player.end_reached);

        player.set_forward_end_time(None);
        assert_eq!(player.forward_end, None);
    }

    #[test]
    fn test_commands_before_load_fail() {
        let (tx, _rx) = notification_channel();
        let mut player = GstPlayer::new(tx);

        assert!(matches!(
            player.play(),
            Err(PlayerError::Command { command: "play", .. })
        ));
        assert!(matches!(
            player.seek(Duration::from_secs(1)),
            Err(PlayerError::Command { command: "seek", .. })
        ));
        let params = futures::executor::block_on(player.track_params());
        assert!(params.is_err());

        // Settings are kept until a pipeline exists
        player.set_muted(true);
        player.set_fill_mode(FillMode::Fill);
        assert!(player.muted);
        assert_eq!(player.fill_mode(), FillMode::Fill);
    }

    #[test]
    fn test_observers_register_and_release() {
        let (tx, _rx) = notification_channel();
        let mut player = GstPlayer::new(tx);
        let token = ObserverToken {
            session: crate::player::SessionId(1),
            slot: 7,
        };

        player.observe(token, ObserverKind::EndOfMedia);
        assert_eq!(player.observers.len(), 1);
        player.unobserve(token);
        assert!(player.observers.is_empty());
    }
}
