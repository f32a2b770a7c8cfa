//! Watch-progress milestone tracking

use crate::player::ObserverToken;
use std::time::Duration;

/// Fraction of the clip that counts as "played 25%"
pub const PROGRESS_MILESTONE: f64 = 0.25;

/// Tracks the periodic observer that samples manual playback and whether
/// the milestone was already reported this session.
#[derive(Debug, Default)]
pub struct WatchProgress {
    observer: Option<ObserverToken>,
    reported: bool,
}

impl WatchProgress {
    pub fn is_tracking(&self) -> bool {
        self.observer.is_some()
    }

    pub fn is_reported(&self) -> bool {
        self.reported
    }

    pub fn observer(&self) -> Option<ObserverToken> {
        self.observer
    }

    /// Start tracking with `token`. Returns false once the milestone was
    /// reported, in which case the caller should not register an observer.
    pub fn start(&mut self, token: ObserverToken) -> bool {
        if self.reported {
            return false;
        }
        self.observer = Some(token);
        true
    }

    /// Stop tracking, returning the observer to release
    pub fn stop(&mut self) -> Option<ObserverToken> {
        self.observer.take()
    }

    /// Feed one sample. Returns true exactly once, when the milestone is
    /// first crossed. The caller then stops tracking.
    pub fn sample(&mut self, current_time: Duration, duration: Duration) -> bool {
        if self.reported || self.observer.is_none() || duration.is_zero() {
            return false;
        }

        let fraction = current_time.as_secs_f64() / duration.as_secs_f64();
        log::trace!("Watch progress: {:.1}%", fraction * 100.0);

        if fraction >= PROGRESS_MILESTONE {
            self.reported = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::SessionId;

    fn token() -> ObserverToken {
        ObserverToken {
            session: SessionId(1),
            slot: 4,
        }
    }

    #[test]
    fn samples_ignored_until_tracking() {
        let mut progress = WatchProgress::default();
        assert!(!progress.sample(Duration::from_secs(9), Duration::from_secs(10)));
        assert!(!progress.is_reported());
    }

    #[test]
    fn milestone_reported_once() {
        let mut progress = WatchProgress::default();
        assert!(progress.start(token()));

        let duration = Duration::from_secs(8);
        assert!(!progress.sample(Duration::from_millis(1_900), duration));
        assert!(progress.sample(Duration::from_secs(2), duration));
        assert!(!progress.sample(Duration::from_secs(3), duration));
        assert!(progress.is_reported());

        // Re-entering manual playback does not track again
        progress.stop();
        assert!(!progress.start(token()));
        assert!(!progress.is_tracking());
    }

    #[test]
    fn zero_duration_never_reports() {
        let mut progress = WatchProgress::default();
        progress.start(token());
        assert!(!progress.sample(Duration::from_secs(1), Duration::ZERO));
    }
}
