//! Live state of one loaded asset

use super::progress::WatchProgress;
use crate::player::{ObserverKind, ObserverToken, SessionId};
use common::VideoMetadata;
use std::path::PathBuf;
use std::time::Duration;

/// Manual (user-controlled) playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManualPlayState {
    /// Manual playback was never entered (or was cancelled / finished)
    #[default]
    NotEntered,
    Paused,
    Playing,
}

/// Where the asset load stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Waiting for the player to report its status
    Loading,
    /// Ready; duration and frame rate are being discovered
    Discovering,
    /// Duration known, autoplay parameters fixed
    Loaded { duration: Duration, is_short: bool },
    /// Load failed; the session is inert
    Failed,
    /// Torn down by the host; every observer is released
    Retired,
}

/// Observer handles registered for this session.
///
/// Each kind has at most one live handle. Anything arriving under a token
/// that is not held here is stale.
#[derive(Debug, Default)]
pub struct Observers {
    next_slot: u32,
    pub(crate) status: Option<ObserverToken>,
    pub(crate) time_jumped: Option<ObserverToken>,
    pub(crate) end_of_media: Option<ObserverToken>,
}

impl Observers {
    pub(crate) fn allocate(&mut self, session: SessionId) -> ObserverToken {
        let token = ObserverToken {
            session,
            slot: self.next_slot,
        };
        self.next_slot += 1;
        token
    }

    fn slot_mut(&mut self, kind: ObserverKind) -> Option<&mut Option<ObserverToken>> {
        match kind {
            ObserverKind::Status => Some(&mut self.status),
            ObserverKind::TimeJumped => Some(&mut self.time_jumped),
            ObserverKind::EndOfMedia => Some(&mut self.end_of_media),
            ObserverKind::Periodic(_) => None,
        }
    }

    /// Store `token` as the handle for `kind`, returning the one it replaces
    pub(crate) fn hold(&mut self, kind: ObserverKind, token: ObserverToken) -> Option<ObserverToken> {
        self.slot_mut(kind).and_then(|slot| slot.replace(token))
    }

    pub(crate) fn take(&mut self, kind: ObserverKind) -> Option<ObserverToken> {
        self.slot_mut(kind).and_then(Option::take)
    }

    pub(crate) fn holds(&self, token: ObserverToken) -> bool {
        [self.status, self.time_jumped, self.end_of_media].contains(&Some(token))
    }

    pub(crate) fn drain(&mut self) -> Vec<ObserverToken> {
        [
            self.status.take(),
            self.time_jumped.take(),
            self.end_of_media.take(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// One asset's playback session
#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) path: PathBuf,
    pub(crate) metadata: VideoMetadata,
    pub(crate) phase: LoadPhase,
    pub(crate) autoplay_finished: bool,
    pub(crate) manual: ManualPlayState,
    pub(crate) autoplay_length: Option<Duration>,
    pub(crate) autoplay_end: Option<Duration>,
    pub(crate) observers: Observers,
    pub(crate) progress: WatchProgress,
}

impl Session {
    pub(crate) fn new(id: SessionId, path: PathBuf, metadata: VideoMetadata, should_autoplay: bool) -> Self {
        Self {
            id,
            path,
            metadata,
            phase: LoadPhase::Loading,
            // Nothing to autoplay, so autoplay counts as finished without an event
            autoplay_finished: !should_autoplay,
            manual: ManualPlayState::NotEntered,
            autoplay_length: None,
            autoplay_end: None,
            observers: Observers::default(),
            progress: WatchProgress::default(),
        }
    }

    /// Whether `token` is one of this session's live observers
    pub(crate) fn is_active(&self, token: ObserverToken) -> bool {
        token.session == self.id
            && (self.observers.holds(token) || self.progress.observer() == Some(token))
    }

    /// Release every observer, returning the tokens to unregister
    pub(crate) fn release_observers(&mut self) -> Vec<ObserverToken> {
        let mut tokens = self.observers.drain();
        tokens.extend(self.progress.stop());
        tokens
    }

    /// Whether inbound commands can still act on this session
    pub(crate) fn is_interactive(&self) -> bool {
        !matches!(self.phase, LoadPhase::Failed | LoadPhase::Retired)
    }

    pub(crate) fn duration(&self) -> Option<Duration> {
        match self.phase {
            LoadPhase::Loaded { duration, .. } => Some(duration),
            _ => None,
        }
    }

    pub(crate) fn is_short(&self) -> Option<bool> {
        match self.phase {
            LoadPhase::Loaded { is_short, .. } => Some(is_short),
            _ => None,
        }
    }
}
