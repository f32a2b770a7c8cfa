//! Timed flash of the play/pause glyph
//!
//! A flash fades the glyph in, holds it, then fades it out. The whole
//! sequence is a pure function of the time elapsed since it started, so a
//! renderer can sample it at any frame and a new tap simply replaces it.

use std::time::{Duration, Instant};

/// Easing functions for smooth fades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EasingFunction {
    /// Linear interpolation (constant speed)
    Linear,
    /// Ease in (slow start, fast end)
    EaseIn,
    /// Ease out (fast start, slow end)
    EaseOut,
    /// Ease in-out (slow start and end, fast middle)
    #[default]
    EaseInOut,
}

impl EasingFunction {
    /// Apply easing to a linear progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }

    /// Parse the config spelling ("ease-in-out")
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            _ => None,
        }
    }
}

/// Durations of the three animated phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashTiming {
    pub fade_in: Duration,
    pub hold: Duration,
    pub fade_out: Duration,
}

impl Default for FlashTiming {
    fn default() -> Self {
        Self {
            fade_in: Duration::from_millis(100),
            hold: Duration::from_millis(500),
            fade_out: Duration::from_millis(300),
        }
    }
}

impl FlashTiming {
    pub fn total(&self) -> Duration {
        self.fade_in + self.hold + self.fade_out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashPhase {
    Hidden,
    FadingIn,
    HoldingVisible,
    FadingOut,
}

/// Which glyph is flashed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Play,
    Pause,
}

/// One running flash of a glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconFlash {
    glyph: Glyph,
    timing: FlashTiming,
    easing: EasingFunction,
    started_at: Instant,
}

impl IconFlash {
    pub fn new(glyph: Glyph, timing: FlashTiming, easing: EasingFunction, started_at: Instant) -> Self {
        Self {
            glyph,
            timing,
            easing,
            started_at,
        }
    }

    pub fn glyph(&self) -> Glyph {
        self.glyph
    }

    pub fn phase(&self, now: Instant) -> FlashPhase {
        let elapsed = now.saturating_duration_since(self.started_at);
        let timing = &self.timing;

        if elapsed < timing.fade_in {
            FlashPhase::FadingIn
        } else if elapsed < timing.fade_in + timing.hold {
            FlashPhase::HoldingVisible
        } else if elapsed < timing.total() {
            FlashPhase::FadingOut
        } else {
            FlashPhase::Hidden
        }
    }

    /// Glyph opacity at `now` (0.0 to 1.0)
    pub fn alpha(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started_at);
        let timing = &self.timing;

        match self.phase(now) {
            FlashPhase::FadingIn => self.easing.apply(fraction(elapsed, timing.fade_in)),
            FlashPhase::HoldingVisible => 1.0,
            FlashPhase::FadingOut => {
                let into_fade = elapsed - timing.fade_in - timing.hold;
                1.0 - self.easing.apply(fraction(into_fade, timing.fade_out))
            }
            FlashPhase::Hidden => 0.0,
        }
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.phase(now) == FlashPhase::Hidden
    }
}

fn fraction(elapsed: Duration, span: Duration) -> f32 {
    if span.is_zero() {
        1.0
    } else {
        elapsed.as_secs_f32() / span.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            EasingFunction::Linear,
            EasingFunction::EaseIn,
            EasingFunction::EaseOut,
            EasingFunction::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < f32::EPSILON);
            assert_eq!(easing.apply(-3.0), 0.0);
        }
    }

    #[test]
    fn test_easing_from_name() {
        assert_eq!(
            EasingFunction::from_name("ease-in-out"),
            Some(EasingFunction::EaseInOut)
        );
        assert_eq!(EasingFunction::from_name("linear"), Some(EasingFunction::Linear));
        assert_eq!(EasingFunction::from_name("bounce"), None);
    }

    #[test]
    fn test_flash_phases() {
        let start = Instant::now();
        let flash = IconFlash::new(
            Glyph::Pause,
            FlashTiming::default(),
            EasingFunction::Linear,
            start,
        );

        assert_eq!(flash.phase(start), FlashPhase::FadingIn);
        assert_eq!(flash.phase(start + ms(99)), FlashPhase::FadingIn);
        assert_eq!(flash.phase(start + ms(100)), FlashPhase::HoldingVisible);
        assert_eq!(flash.phase(start + ms(599)), FlashPhase::HoldingVisible);
        assert_eq!(flash.phase(start + ms(600)), FlashPhase::FadingOut);
        assert_eq!(flash.phase(start + ms(900)), FlashPhase::Hidden);
        assert!(flash.is_complete(start + ms(5_000)));
    }

    #[test]
    fn test_flash_alpha() {
        let start = Instant::now();
        let flash = IconFlash::new(
            Glyph::Play,
            FlashTiming::default(),
            EasingFunction::Linear,
            start,
        );

        assert_eq!(flash.alpha(start), 0.0);
        assert!((flash.alpha(start + ms(50)) - 0.5).abs() < 0.01);
        assert_eq!(flash.alpha(start + ms(300)), 1.0);
        assert!((flash.alpha(start + ms(750)) - 0.5).abs() < 0.01);
        assert_eq!(flash.alpha(start + ms(900)), 0.0);
    }

    #[test]
    fn test_sampling_before_start_is_fading_in() {
        let start = Instant::now() + ms(10);
        let flash = IconFlash::new(
            Glyph::Play,
            FlashTiming::default(),
            EasingFunction::default(),
            start,
        );
        assert_eq!(flash.phase(Instant::now()), FlashPhase::FadingIn);
        assert_eq!(flash.alpha(Instant::now()), 0.0);
    }

    #[test]
    fn test_zero_fade_in_starts_visible() {
        let start = Instant::now();
        let timing = FlashTiming {
            fade_in: Duration::ZERO,
            ..FlashTiming::default()
        };
        let flash = IconFlash::new(Glyph::Play, timing, EasingFunction::default(), start);
        assert_eq!(flash.phase(start), FlashPhase::HoldingVisible);
        assert_eq!(flash.alpha(start), 1.0);
    }
}
