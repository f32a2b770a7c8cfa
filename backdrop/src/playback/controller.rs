//! Main PlaybackController driving autoplay and manual playback

use super::session::{LoadPhase, ManualPlayState, Session};
use super::{PlaybackSettings, SurfaceState, autoplay_length};
use crate::log_and_continue;
use crate::overlay::{Insets, OverlayAction, OverlayController, OverlaySettings, Point, Size};
use crate::player::{
    ObserverKind, Player, PlayerError, PlayerNotification, PlayerSignal, PlayerStatus, SessionId,
    TrackParams, TrackParamsFuture,
};
use common::{PlaybackError, PlaybackEvent, VideoMetadata};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Track discovery requested by the controller.
///
/// Whoever drives the controller awaits `params` and hands the result back
/// through [`PlaybackController::track_params_loaded`] with the same session.
pub struct Discovery {
    pub session: SessionId,
    pub params: TrackParamsFuture,
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Drives one player through autoplay, manual playback and teardown
pub struct PlaybackController<P: Player> {
    /// The player, exclusively owned
    player: P,

    settings: PlaybackSettings,

    /// Tap overlay shown during manual playback
    overlay: OverlayController,

    /// Lifecycle events for the host
    events: mpsc::UnboundedSender<PlaybackEvent>,

    /// Live session, if an asset was set up
    session: Option<Session>,

    /// Last issued session number
    last_session: u64,

    /// Whether the video surface is shown
    surface_visible: bool,
}

impl<P: Player> PlaybackController<P> {
    pub fn new(
        player: P,
        settings: PlaybackSettings,
        overlay: OverlaySettings,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Self {
        Self {
            player,
            settings,
            overlay: OverlayController::new(overlay),
            events,
            session: None,
            last_session: 0,
            surface_visible: true,
        }
    }

    /// Load a new asset, replacing whatever was set up before.
    ///
    /// Parses the filename metadata, loads the asset muted and waits for the
    /// player's status. With `should_autoplay` false the session starts with
    /// autoplay already finished.
    pub fn setup_player(&mut self, path: impl AsRef<Path>, should_autoplay: bool) -> SessionId {
        self.teardown();
        self.overlay.hide();

        self.last_session += 1;
        let id = SessionId(self.last_session);

        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let metadata = VideoMetadata::from_filename(&filename);

        log::info!(
            "Session {}: loading {} (autoplay: {}, stop frame: {:?}, fill: {:?})",
            id,
            path.display(),
            should_autoplay,
            metadata.stop_frame,
            metadata.fill_mode
        );

        let mut session = Session::new(id, path.to_path_buf(), metadata, should_autoplay);

        self.player.set_fill_mode(metadata.fill_mode);
        self.player.set_muted(true);

        match self.player.load(path) {
            Ok(()) => {
                let token = session.observers.allocate(id);
                session.observers.hold(ObserverKind::Status, token);
                self.player.observe(token, ObserverKind::Status);
                self.session = Some(session);
            }
            Err(e) => {
                log::warn!("Session {}: {}", id, PlaybackError::from(e));
                self.session = Some(session);
                self.load_failed();
            }
        }

        id
    }

    /// Act on an observation from the player.
    ///
    /// Returns a [`Discovery`] when the player became ready and track
    /// parameters must be fetched. Observations from released observers or
    /// earlier sessions are dropped.
    pub fn handle_notification(&mut self, notification: PlayerNotification) -> Option<Discovery> {
        let PlayerNotification { token, signal } = notification;

        let Some(session) = self.session.as_ref().filter(|s| s.is_active(token)) else {
            log::debug!("Ignoring {:?} from released observer {:?}", signal, token);
            return None;
        };
        let id = session.id;

        match signal {
            PlayerSignal::Status(PlayerStatus::ReadyToPlay) => return self.on_ready(id),
            PlayerSignal::Status(PlayerStatus::Failed) => self.load_failed(),
            PlayerSignal::Status(PlayerStatus::Unknown) => {}
            PlayerSignal::TimeJumped { current_time } => self.on_time_jumped(current_time),
            PlayerSignal::EndOfMedia => self.on_end_of_media(),
            PlayerSignal::Tick { current_time } => self.on_progress_tick(current_time),
        }

        None
    }

    /// Complete track discovery for `session_id`.
    ///
    /// Stale completions (superseded or retired sessions) are no-ops. A
    /// missing duration counts as a load failure. Autoplay only starts if
    /// nothing finished it or entered manual playback in the meantime.
    pub fn track_params_loaded(
        &mut self,
        session_id: SessionId,
        result: Result<TrackParams, PlayerError>,
    ) {
        let Some(session) = self.session.as_ref().filter(|s| s.id == session_id) else {
            log::debug!("Dropping track params for superseded session {}", session_id);
            return;
        };
        if session.phase != LoadPhase::Discovering {
            log::debug!(
                "Dropping track params for session {} in phase {:?}",
                session_id,
                session.phase
            );
            return;
        }

        let params = match result {
            Ok(params) => params,
            Err(e) => {
                log::warn!("Session {}: {}", session_id, PlaybackError::from(e));
                self.load_failed();
                return;
            }
        };

        let Some(duration) = params.duration.filter(|d| !d.is_zero()) else {
            let error = PlaybackError::MetadataUnavailable("no video duration".into());
            log::warn!("Session {}: {}", session_id, error);
            self.load_failed();
            return;
        };
        let is_short = duration <= self.settings.max_autoplay_duration;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.phase = LoadPhase::Loaded { duration, is_short };

        let token = session.observers.allocate(session_id);
        session.observers.hold(ObserverKind::EndOfMedia, token);
        self.player.observe(token, ObserverKind::EndOfMedia);

        let should_autoplay =
            !session.autoplay_finished && session.manual == ManualPlayState::NotEntered;
        let stop_frame = session.metadata.stop_frame;

        log::info!(
            "Session {}: loaded {:.2}s at {:?} fps ({} clip)",
            session_id,
            duration.as_secs_f64(),
            params.frame_rate,
            if is_short { "short" } else { "long" }
        );
        self.emit(PlaybackEvent::VideoLoaded { success: true });

        if should_autoplay {
            self.start_autoplay(duration, stop_frame, params.frame_rate);
        }
    }

    /// Toggle manual playback.
    ///
    /// The first call finalizes autoplay, reveals the overlay, unmutes and
    /// rewinds into a paused manual state; every call then flips between
    /// playing and paused. So from a fresh session the first call ends up
    /// playing, the second paused, the third playing again.
    pub fn play_or_pause_toggle(&mut self) {
        let Some(session) = self.session.as_ref().filter(|s| s.is_interactive()) else {
            log::debug!("No interactive session, ignoring play/pause");
            return;
        };

        if session.manual == ManualPlayState::NotEntered {
            self.enter_manual();
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.manual {
            ManualPlayState::Paused => {
                log_and_continue!(self.player.play(), "resume playback");
                session.manual = ManualPlayState::Playing;
            }
            ManualPlayState::Playing => {
                log_and_continue!(self.player.pause(), "pause playback");
                session.manual = ManualPlayState::Paused;
            }
            ManualPlayState::NotEntered => {}
        }
        log::debug!("Session {}: manual state {:?}", session.id, session.manual);
    }

    /// Stop manual playback, hide the overlay and report the cancellation.
    ///
    /// Autoplay state is left alone.
    pub fn cancel(&mut self) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("No session to cancel");
            return;
        };

        self.overlay.hide();
        log_and_continue!(self.player.pause(), "pause playback");
        if let Some(token) = session.progress.stop() {
            self.player.unobserve(token);
        }
        session.manual = ManualPlayState::NotEntered;

        log::info!("Session {}: playback cancelled", session.id);
        self.emit(PlaybackEvent::PlayCancelled);
    }

    /// Host is leaving the screen: settle every state and hide the surface.
    ///
    /// Forces autoplay to finish if it was still running, cancels manual
    /// playback if it was entered, then retires the session so no observer
    /// or pending discovery survives.
    pub fn cancel_and_hide(&mut self) {
        if let Some(session) = self.session.as_ref() {
            let autoplay_finished = session.autoplay_finished;
            let manual = session.manual;

            if !autoplay_finished {
                log_and_continue!(self.player.pause(), "stop autoplay");
                self.finish_autoplay();
            }
            if manual != ManualPlayState::NotEntered {
                self.cancel();
            }
            self.retire();
        }

        self.overlay.hide();
        self.surface_visible = false;
        log::debug!("Surface hidden");
    }

    pub fn show_surface(&mut self) {
        self.surface_visible = true;
        log::debug!("Surface shown");
    }

    /// Forward a tap on the overlay
    pub fn handle_overlay_tap(&mut self, point: Point, now: Instant) {
        match self.overlay.handle_tap(point, now) {
            Some(OverlayAction::BackgroundTapped) => self.play_or_pause_toggle(),
            Some(OverlayAction::CancelTapped) => self.cancel(),
            None => {}
        }
    }

    /// Update the surface geometry used for overlay hit testing
    pub fn set_bounds(&mut self, bounds: Size, safe_area: Insets) {
        self.overlay.set_bounds(bounds, safe_area);
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn load_phase(&self) -> Option<LoadPhase> {
        self.session.as_ref().map(|s| s.phase)
    }

    /// Whether `session_id` is live and waiting for track discovery
    pub fn awaiting_track_params(&self, session_id: SessionId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == session_id && s.phase == LoadPhase::Discovering)
    }

    pub fn autoplay_finished(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.autoplay_finished)
    }

    pub fn manual_state(&self) -> ManualPlayState {
        self.session
            .as_ref()
            .map(|s| s.manual)
            .unwrap_or_default()
    }

    /// Short-ness of the loaded clip, once its duration is known
    pub fn is_short_video(&self) -> Option<bool> {
        self.session.as_ref().and_then(Session::is_short)
    }

    pub fn autoplay_length(&self) -> Option<Duration> {
        self.session.as_ref().and_then(|s| s.autoplay_length)
    }

    /// Forward end time imposed on the player for long-clip autoplay
    pub fn autoplay_end_time(&self) -> Option<Duration> {
        self.session.as_ref().and_then(|s| s.autoplay_end)
    }

    /// Whether the watch-progress observer is active
    pub fn is_tracking_progress(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.progress.is_tracking())
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.session.as_ref().map(|s| &s.metadata)
    }

    pub fn overlay(&self) -> &OverlayController {
        &self.overlay
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn surface(&self) -> SurfaceState {
        let metadata = self.metadata().copied().unwrap_or_default();
        SurfaceState {
            session: self.session_id(),
            background: metadata.background,
            fill_mode: metadata.fill_mode,
            visible: self.surface_visible,
            overlay: self.overlay.view(),
        }
    }

    fn on_ready(&mut self, id: SessionId) -> Option<Discovery> {
        let session = self.session.as_mut()?;

        // Status is observed once
        if let Some(token) = session.observers.take(ObserverKind::Status) {
            self.player.unobserve(token);
        }
        if session.phase != LoadPhase::Loading {
            return None;
        }

        session.phase = LoadPhase::Discovering;
        log::debug!("Session {}: ready, discovering track params", id);

        Some(Discovery {
            session: id,
            params: self.player.track_params(),
        })
    }

    fn load_failed(&mut self) {
        if let Some(session) = self.session.as_mut() {
            for token in session.release_observers() {
                self.player.unobserve(token);
            }
            session.phase = LoadPhase::Failed;
            session.autoplay_finished = true;
            log::info!(
                "Session {}: failed to load {}",
                session.id,
                session.path.display()
            );
        }
        self.emit(PlaybackEvent::VideoLoaded { success: false });
    }

    fn start_autoplay(&mut self, duration: Duration, stop_frame: Option<u64>, frame_rate: Option<f32>) {
        let ceiling = self.settings.max_autoplay_duration;
        let length = autoplay_length(duration, ceiling, stop_frame, frame_rate);

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.autoplay_length = Some(length);

        if duration > ceiling {
            session.autoplay_end = Some(length);
            self.player.set_forward_end_time(Some(length));

            // Seeks can skip over the end time without an end-of-media signal
            let token = session.observers.allocate(session.id);
            session.observers.hold(ObserverKind::TimeJumped, token);
            self.player.observe(token, ObserverKind::TimeJumped);
        }

        log::info!(
            "Session {}: autoplaying {:.2}s",
            session.id,
            length.as_secs_f64()
        );
        self.player.set_muted(true);
        log_and_continue!(self.player.play(), "start autoplay");
    }

    fn on_time_jumped(&mut self, current_time: Duration) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.autoplay_finished || session.is_short().unwrap_or(true) {
            return;
        }

        if session.autoplay_end.is_some_and(|end| current_time >= end) {
            log::debug!(
                "Session {}: reached autoplay end at {:.2}s",
                session.id,
                current_time.as_secs_f64()
            );
            self.finish_autoplay();
        }
    }

    fn on_end_of_media(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if !session.autoplay_finished && session.is_short() == Some(true) {
            self.finish_autoplay();
            return;
        }

        if session.manual == ManualPlayState::NotEntered {
            log::debug!("Session {}: end of media outside manual playback", session.id);
            return;
        }

        session.manual = ManualPlayState::NotEntered;
        if let Some(token) = session.progress.stop() {
            self.player.unobserve(token);
        }
        self.overlay.hide();

        log::info!("Session {}: playback finished", session.id);
        self.emit(PlaybackEvent::PlayFinished);
    }

    fn on_progress_tick(&mut self, current_time: Duration) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.manual == ManualPlayState::NotEntered {
            return;
        }
        let Some(duration) = session.duration() else {
            return;
        };

        if session.progress.sample(current_time, duration) {
            if let Some(token) = session.progress.stop() {
                self.player.unobserve(token);
            }
            log::info!("Session {}: played 25%", session.id);
            self.emit(PlaybackEvent::Played25Percent);
        }
    }

    /// Mark autoplay finished, firing the event the first time only
    fn finish_autoplay(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.autoplay_finished {
            return;
        }

        session.autoplay_finished = true;
        if let Some(token) = session.observers.take(ObserverKind::TimeJumped) {
            self.player.unobserve(token);
        }

        log::info!("Session {}: autoplay finished", session.id);
        self.emit(PlaybackEvent::AutoplayFinished);
    }

    fn enter_manual(&mut self) {
        self.finish_autoplay();
        self.overlay.reveal();
        self.overlay.set_play_started();

        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.player.set_muted(false);
        log_and_continue!(self.player.pause(), "pause autoplay");
        log_and_continue!(self.player.seek(Duration::ZERO), "rewind");
        self.player.set_forward_end_time(None);
        session.autoplay_end = None;

        let token = session.observers.allocate(session.id);
        if session.progress.start(token) {
            self.player
                .observe(token, ObserverKind::Periodic(self.settings.progress_interval));
        }

        session.manual = ManualPlayState::Paused;
        log::info!("Session {}: entered manual playback", session.id);
    }

    /// Release every observer and make the session inert
    fn retire(&mut self) {
        if let Some(session) = self.session.as_mut() {
            for token in session.release_observers() {
                self.player.unobserve(token);
            }
            session.phase = LoadPhase::Retired;
            log::debug!("Session {}: retired", session.id);
        }
    }

    /// Drop the current session, releasing its observers
    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            for token in session.release_observers() {
                self.player.unobserve(token);
            }
            log::debug!("Session {}: torn down", session.id);
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        log::debug!("Emitting {:?}", event);
        if self.events.send(event).is_err() {
            log::trace!("No listener for {:?}", event);
        }
    }
}

impl<P: Player> Drop for PlaybackController<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
