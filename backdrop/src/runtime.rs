//! Tokio task that owns a [`PlaybackController`] and feeds it from channels
//!
//! Host calls, player observations and completed track discoveries all
//! funnel into one task, so the controller itself never needs locking and
//! every state change happens on a single sequence.

use crate::overlay::{Insets, OverlaySettings, Point, Size};
use crate::playback::{Discovery, PlaybackController, PlaybackSettings, SurfaceState};
use crate::player::{NotificationReceiver, Player, PlayerError, SessionId, TrackParams};
use anyhow::{Context, Result};
use common::PlaybackEvent;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Inbound host calls
#[derive(Debug, Clone)]
pub enum Request {
    SetupPlayer { path: PathBuf, should_autoplay: bool },
    PlayOrPauseToggle,
    Cancel,
    CancelAndHide,
    ShowSurface,
    OverlayTap { point: Point, at: Instant },
    Resize { bounds: Size, safe_area: Insets },
    Shutdown,
}

type DiscoveryResult = (SessionId, Result<TrackParams, PlayerError>);

/// Cloneable handle to a running playback task
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    requests: mpsc::UnboundedSender<Request>,
    surface: watch::Receiver<SurfaceState>,
}

impl PlaybackHandle {
    pub fn send(&self, request: Request) -> Result<()> {
        self.requests
            .send(request)
            .context("Playback task has stopped")
    }

    pub fn setup_player(&self, path: impl Into<PathBuf>, should_autoplay: bool) -> Result<()> {
        self.send(Request::SetupPlayer {
            path: path.into(),
            should_autoplay,
        })
    }

    pub fn play_or_pause_toggle(&self) -> Result<()> {
        self.send(Request::PlayOrPauseToggle)
    }

    pub fn cancel(&self) -> Result<()> {
        self.send(Request::Cancel)
    }

    pub fn cancel_and_hide(&self) -> Result<()> {
        self.send(Request::CancelAndHide)
    }

    pub fn show_surface(&self) -> Result<()> {
        self.send(Request::ShowSurface)
    }

    pub fn tap(&self, point: Point) -> Result<()> {
        self.send(Request::OverlayTap {
            point,
            at: Instant::now(),
        })
    }

    pub fn resize(&self, bounds: Size, safe_area: Insets) -> Result<()> {
        self.send(Request::Resize { bounds, safe_area })
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Request::Shutdown)
    }

    /// Latest render snapshot
    pub fn surface(&self) -> SurfaceState {
        *self.surface.borrow()
    }

    /// Wait until the render snapshot satisfies `predicate`
    pub async fn wait_for_surface(
        &mut self,
        predicate: impl FnMut(&SurfaceState) -> bool,
    ) -> Result<SurfaceState> {
        let state = self
            .surface
            .wait_for(predicate)
            .await
            .context("Playback task has stopped")?;
        Ok(*state)
    }
}

/// Spawn the playback task.
///
/// `notifications` must be the receiving end of the channel the player
/// reports its observations on. Returns the handle, the event stream and
/// the task itself, which ends after [`Request::Shutdown`] or once every
/// handle is dropped.
pub fn spawn<P>(
    player: P,
    notifications: NotificationReceiver,
    settings: PlaybackSettings,
    overlay: OverlaySettings,
) -> (
    PlaybackHandle,
    mpsc::UnboundedReceiver<PlaybackEvent>,
    JoinHandle<()>,
)
where
    P: Player + 'static,
{
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();

    let controller = PlaybackController::new(player, settings, overlay, events_tx);
    let (surface_tx, surface_rx) = watch::channel(controller.surface());

    let task = tokio::spawn(run(
        controller,
        requests_rx,
        notifications,
        surface_tx,
        settings.settle_delay,
    ));

    let handle = PlaybackHandle {
        requests: requests_tx,
        surface: surface_rx,
    };
    (handle, events_rx, task)
}

async fn run<P: Player + 'static>(
    mut controller: PlaybackController<P>,
    mut requests: mpsc::UnboundedReceiver<Request>,
    mut notifications: NotificationReceiver,
    surface: watch::Sender<SurfaceState>,
    settle_delay: Duration,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<DiscoveryResult>();
    let mut pending: Option<(SessionId, JoinHandle<()>)> = None;

    log::info!("Playback task started");

    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Shutdown) | None => break,
                Some(request) => apply(&mut controller, request),
            },
            Some(notification) = notifications.recv() => {
                if let Some(discovery) = controller.handle_notification(notification) {
                    if let Some((_, task)) = pending.take() {
                        task.abort();
                    }
                    let session = discovery.session;
                    let task = spawn_discovery(discovery, settle_delay, done_tx.clone());
                    pending = Some((session, task));
                }
            }
            Some((session, result)) = done_rx.recv() => {
                controller.track_params_loaded(session, result);
            }
        }

        // A superseded or retired session no longer needs its discovery
        let superseded = pending
            .as_ref()
            .is_some_and(|(session, _)| !controller.awaiting_track_params(*session));
        if superseded && let Some((session, task)) = pending.take() {
            log::debug!("Session {}: discovery no longer pending", session);
            task.abort();
        }

        surface.send_replace(controller.surface());
    }

    if let Some((_, task)) = pending.take() {
        task.abort();
    }
    log::info!("Playback task stopped");
}

fn apply<P: Player>(controller: &mut PlaybackController<P>, request: Request) {
    log::debug!("Request: {:?}", request);
    match request {
        Request::SetupPlayer {
            path,
            should_autoplay,
        } => {
            controller.setup_player(path, should_autoplay);
        }
        Request::PlayOrPauseToggle => controller.play_or_pause_toggle(),
        Request::Cancel => controller.cancel(),
        Request::CancelAndHide => controller.cancel_and_hide(),
        Request::ShowSurface => controller.show_surface(),
        Request::OverlayTap { point, at } => controller.handle_overlay_tap(point, at),
        Request::Resize { bounds, safe_area } => controller.set_bounds(bounds, safe_area),
        Request::Shutdown => {}
    }
}

fn spawn_discovery(
    discovery: Discovery,
    settle_delay: Duration,
    done: mpsc::UnboundedSender<DiscoveryResult>,
) -> JoinHandle<()> {
    let Discovery { session, params } = discovery;
    tokio::spawn(async move {
        let result = params.await;
        // Let the player's buffering settle before acting on the parameters
        tokio::time::sleep(settle_delay).await;
        if done.send((session, result)).is_err() {
            log::trace!("Session {}: playback task gone before discovery finished", session);
        }
    })
}
