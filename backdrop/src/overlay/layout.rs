//! Overlay geometry and hit testing

/// Point in surface coordinates (origin top-left)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Safe area insets of the hosting surface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.origin.x + self.size.width
            && point.y >= self.origin.y
            && point.y <= self.origin.y + self.size.height
    }
}

/// Vertical offset of the play/pause glyph below the surface center
const ICON_CENTER_OFFSET: f32 = 20.0;

/// Where the overlay affordances sit inside the surface.
///
/// The cancel button is pinned to the top-right corner of the safe area;
/// the play/pause glyph is centered slightly below the middle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub bounds: Size,
    pub safe_area: Insets,
    pub cancel_button_size: f32,
    pub cancel_button_inset: f32,
}

impl OverlayLayout {
    pub fn new(cancel_button_size: f32, cancel_button_inset: f32) -> Self {
        Self {
            bounds: Size::default(),
            safe_area: Insets::default(),
            cancel_button_size,
            cancel_button_inset,
        }
    }

    pub fn cancel_button(&self) -> Rect {
        let size = self.cancel_button_size;
        let x = self.bounds.width - self.safe_area.right - self.cancel_button_inset - size;
        let y = self.safe_area.top + self.cancel_button_inset;
        Rect {
            origin: Point::new(x, y),
            size: Size::new(size, size),
        }
    }

    pub fn icon_center(&self) -> Point {
        Point::new(
            self.bounds.width / 2.0,
            self.bounds.height / 2.0 + ICON_CENTER_OFFSET,
        )
    }

    /// Whether a tap at `point` lands on the cancel button
    pub fn hits_cancel(&self, point: Point) -> bool {
        self.cancel_button().contains(point)
    }
}
