//! Pointer and touch events translated into device-agnostic [`Gesture`]s.

use super::annotation::Point;
use super::capture::{Gesture, RegionCapture};

/// Where the page is displayed, in device (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert a client coordinate to a page fraction.
    ///
    /// A zero-sized viewport maps everything to the origin.
    pub fn to_page(&self, client_x: f64, client_y: f64) -> Point {
        let fx = if self.width > 0.0 {
            (client_x - self.left) / self.width
        } else {
            0.0
        };
        let fy = if self.height > 0.0 {
            (client_y - self.top) / self.height
        } else {
            0.0
        };
        Point::new(fx, fy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed { x: f64, y: f64 },
    Moved { x: f64, y: f64, modifier: bool },
    Released { x: f64, y: f64 },
    /// Secondary button / context menu.
    SecondaryClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// A touch event with its currently active and changed contacts.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    /// Contacts still on the surface after this event.
    pub active: Vec<(f64, f64)>,
    /// Contacts that changed in this event.
    pub changed: Vec<(f64, f64)>,
}

pub fn pointer_gesture(viewport: &Viewport, event: PointerEvent) -> Option<Gesture> {
    match event {
        PointerEvent::Pressed { x, y } => Some(Gesture::Start(viewport.to_page(x, y))),
        PointerEvent::Moved { x, y, modifier } => Some(Gesture::Update {
            point: viewport.to_page(x, y),
            symmetric: modifier,
        }),
        PointerEvent::Released { .. } => Some(Gesture::Commit),
        PointerEvent::SecondaryClick => Some(Gesture::Clear),
    }
}

/// `dragging` is whether the capture already holds a candidate.
///
/// A second finger landing mid-drag does not restart the candidate, and the
/// drag only commits once the last finger lifts. Two or more active contacts
/// act like the held modifier.
pub fn touch_gesture(viewport: &Viewport, event: &TouchEvent, dragging: bool) -> Option<Gesture> {
    match event.phase {
        TouchPhase::Start => {
            if dragging {
                return None;
            }
            let &(x, y) = event.changed.first()?;
            Some(Gesture::Start(viewport.to_page(x, y)))
        }
        TouchPhase::Move => {
            let &(x, y) = event.active.first()?;
            Some(Gesture::Update {
                point: viewport.to_page(x, y),
                symmetric: event.active.len() > 1,
            })
        }
        TouchPhase::End => event.active.is_empty().then_some(Gesture::Commit),
    }
}

impl RegionCapture {
    pub fn handle_pointer(&mut self, viewport: &Viewport, event: PointerEvent) {
        if let Some(gesture) = pointer_gesture(viewport, event) {
            self.apply(gesture);
        }
    }

    pub fn handle_touch(&mut self, viewport: &Viewport, event: &TouchEvent) {
        if let Some(gesture) = touch_gesture(viewport, event, self.is_dragging()) {
            self.apply(gesture);
        }
    }
}
