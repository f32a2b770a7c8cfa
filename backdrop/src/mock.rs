//! In-memory [`Player`] for driving the playback core without a decoder

use crate::player::{
    ObserverKind, ObserverToken, Player, PlayerError, PlayerNotification, PlayerSignal,
    TrackParams, TrackParamsFuture,
};
use common::FillMode;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A command the core issued to the player
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Load(PathBuf),
    Play,
    Pause,
    Seek(Duration),
    SetMuted(bool),
    SetForwardEndTime(Option<Duration>),
    SetFillMode(FillMode),
}

#[derive(Debug)]
struct MockState {
    commands: Vec<PlayerCommand>,
    observers: Vec<(ObserverToken, ObserverKind)>,
    track_params: Result<TrackParams, PlayerError>,
    load_error: Option<PlayerError>,
    playing: bool,
    muted: bool,
    forward_end_time: Option<Duration>,
    fill_mode: FillMode,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            observers: Vec::new(),
            track_params: Ok(TrackParams::default()),
            load_error: None,
            playing: false,
            muted: false,
            forward_end_time: None,
            fill_mode: FillMode::default(),
        }
    }
}

/// Records every command and observer registration.
///
/// Clones share state, so a test can keep one handle while the controller
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockPlayer {
    state: Arc<Mutex<MockState>>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `duration` and `frame_rate` from track discovery
    #[must_use]
    pub fn with_track(self, duration: Duration, frame_rate: Option<f32>) -> Self {
        self.set_track_params(Ok(TrackParams {
            duration: Some(duration),
            frame_rate,
        }));
        self
    }

    /// Make every subsequent `load` fail
    #[must_use]
    pub fn with_load_error(self, reason: &str) -> Self {
        self.state().load_error = Some(PlayerError::Load {
            path: String::new(),
            reason: reason.to_string(),
        });
        self
    }

    pub fn set_track_params(&self, params: Result<TrackParams, PlayerError>) {
        self.state().track_params = params;
    }

    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.state().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state().commands.clear();
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    pub fn is_muted(&self) -> bool {
        self.state().muted
    }

    pub fn forward_end_time(&self) -> Option<Duration> {
        self.state().forward_end_time
    }

    pub fn fill_mode(&self) -> FillMode {
        self.state().fill_mode
    }

    pub fn active_observer_count(&self) -> usize {
        self.state().observers.len()
    }

    /// Latest live observer whose kind matches `matches`
    pub fn observer(&self, matches: impl Fn(ObserverKind) -> bool) -> Option<ObserverToken> {
        self.state()
            .observers
            .iter()
            .rev()
            .find(|(_, kind)| matches(*kind))
            .map(|(token, _)| *token)
    }

    pub fn status_token(&self) -> Option<ObserverToken> {
        self.observer(|kind| kind == ObserverKind::Status)
    }

    pub fn time_jumped_token(&self) -> Option<ObserverToken> {
        self.observer(|kind| kind == ObserverKind::TimeJumped)
    }

    pub fn end_of_media_token(&self) -> Option<ObserverToken> {
        self.observer(|kind| kind == ObserverKind::EndOfMedia)
    }

    pub fn periodic_token(&self) -> Option<ObserverToken> {
        self.observer(|kind| matches!(kind, ObserverKind::Periodic(_)))
    }

    /// Build a notification under `token`
    pub fn notification(token: ObserverToken, signal: PlayerSignal) -> PlayerNotification {
        PlayerNotification { token, signal }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Player for MockPlayer {
    fn load(&mut self, path: &Path) -> Result<(), PlayerError> {
        let mut state = self.state();
        state.commands.push(PlayerCommand::Load(path.to_path_buf()));
        state.playing = false;
        match state.load_error.clone() {
            Some(PlayerError::Load { reason, .. }) => Err(PlayerError::Load {
                path: path.display().to_string(),
                reason,
            }),
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let mut state = self.state();
        state.commands.push(PlayerCommand::Play);
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        let mut state = self.state();
        state.commands.push(PlayerCommand::Pause);
        state.playing = false;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlayerError> {
        self.state().commands.push(PlayerCommand::Seek(position));
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) {
        let mut state = self.state();
        state.commands.push(PlayerCommand::SetMuted(muted));
        state.muted = muted;
    }

    fn set_forward_end_time(&mut self, end: Option<Duration>) {
        let mut state = self.state();
        state.commands.push(PlayerCommand::SetForwardEndTime(end));
        state.forward_end_time = end;
    }

    fn set_fill_mode(&mut self, mode: FillMode) {
        let mut state = self.state();
        state.commands.push(PlayerCommand::SetFillMode(mode));
        state.fill_mode = mode;
    }

    fn observe(&mut self, token: ObserverToken, kind: ObserverKind) {
        self.state().observers.push((token, kind));
    }

    fn unobserve(&mut self, token: ObserverToken) {
        self.state().observers.retain(|(held, _)| *held != token);
    }

    fn track_params(&self) -> TrackParamsFuture {
        let result = self.state().track_params.clone();
        futures::future::ready(result).boxed()
    }
}
