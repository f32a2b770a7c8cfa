//! Tap overlay shown on top of the video during manual playback
//!
//! The overlay is a small cosmetic state machine: it knows whether it is
//! visible, which glyph to flash on the next tap, and whether a tap landed
//! on the cancel button. It never touches the player; the playback
//! controller acts on the [`OverlayAction`] it returns.

mod flash;
mod layout;

pub use flash::{EasingFunction, FlashPhase, FlashTiming, Glyph, IconFlash};
pub use layout::{Insets, OverlayLayout, Point, Rect, Size};

use std::time::Instant;

/// Overlay tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySettings {
    pub timing: FlashTiming,
    pub easing: EasingFunction,
    pub cancel_button_size: f32,
    pub cancel_button_inset: f32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            timing: FlashTiming::default(),
            easing: EasingFunction::default(),
            cancel_button_size: 32.0,
            cancel_button_inset: 20.0,
        }
    }
}

/// What a tap on the overlay asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    BackgroundTapped,
    CancelTapped,
}

/// Render snapshot of the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayView {
    pub visible: bool,
    pub layout: OverlayLayout,
    pub flash: Option<IconFlash>,
}

impl OverlayView {
    /// Glyph and opacity to draw at `now`, if any
    pub fn icon_frame(&self, now: Instant) -> Option<(Glyph, f32)> {
        if !self.visible {
            return None;
        }
        let flash = self.flash?;
        (!flash.is_complete(now)).then(|| (flash.glyph(), flash.alpha(now)))
    }
}

#[derive(Debug, Clone)]
pub struct OverlayController {
    settings: OverlaySettings,
    layout: OverlayLayout,
    visible: bool,
    icon_playing: bool,
    flash: Option<IconFlash>,
}

impl OverlayController {
    pub fn new(settings: OverlaySettings) -> Self {
        Self {
            layout: OverlayLayout::new(settings.cancel_button_size, settings.cancel_button_inset),
            settings,
            visible: false,
            icon_playing: false,
            flash: None,
        }
    }

    /// Update the surface geometry used for hit testing
    pub fn set_bounds(&mut self, bounds: Size, safe_area: Insets) {
        self.layout.bounds = bounds;
        self.layout.safe_area = safe_area;
    }

    pub fn reveal(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.flash = None;
    }

    /// Manual playback started: the next tap pauses
    pub fn set_play_started(&mut self) {
        self.icon_playing = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn icon_playing(&self) -> bool {
        self.icon_playing
    }

    pub fn flash(&self) -> Option<&IconFlash> {
        self.flash.as_ref()
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    /// Handle a tap at `point`.
    ///
    /// Taps are ignored while hidden. A tap on the cancel button is
    /// reported as such; any other tap flips the icon state and restarts
    /// the flash with the glyph for the new state.
    pub fn handle_tap(&mut self, point: Point, now: Instant) -> Option<OverlayAction> {
        if !self.visible {
            log::trace!("Overlay hidden, ignoring tap at ({}, {})", point.x, point.y);
            return None;
        }

        if self.layout.hits_cancel(point) {
            return Some(OverlayAction::CancelTapped);
        }

        self.icon_playing = !self.icon_playing;
        let glyph = if self.icon_playing {
            Glyph::Play
        } else {
            Glyph::Pause
        };
        self.flash = Some(IconFlash::new(
            glyph,
            self.settings.timing,
            self.settings.easing,
            now,
        ));
        log::debug!("Overlay flashing {:?} glyph", glyph);

        Some(OverlayAction::BackgroundTapped)
    }

    pub fn view(&self) -> OverlayView {
        OverlayView {
            visible: self.visible,
            layout: self.layout,
            flash: self.flash,
        }
    }
}
