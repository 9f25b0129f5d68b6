//! Point-to-aim interaction.
//!
//! While the designated hand makes the [`Gesture::Point`] gesture, a ray is
//! cast from the index fingertip along its forward axis and a line is drawn
//! to whatever it hits.  Any other gesture, a miss, or a missing fingertip
//! bone hides the line.

use manus_perception::math::{Ray, Vec3};
use manus_perception::skeleton::lookup_fingertip;
use manus_types::{Finger, Gesture, HandSide};
use tracing::{debug, trace};

use crate::session::HandSession;

/// Result of a successful scene raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    pub distance: f32,
}

/// Rendering services the trigger needs from the host engine.
pub trait RenderSurface {
    /// Cast `ray` into the scene geometry.
    fn raycast(&self, ray: &Ray) -> Option<Hit>;

    /// Show (`visible = true`) a polyline through `points`, or hide it.
    fn set_line(&mut self, visible: bool, points: &[Vec3]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AimState {
    #[default]
    Idle,
    Aiming,
}

/// Two-state (Idle / Aiming) trigger bound to one hand.
#[derive(Debug)]
pub struct InteractionTrigger {
    hand: HandSide,
    state: AimState,
    /// Last visibility requested from the surface; `None` until the first
    /// request so the initial frame always syncs the line.
    line_visible: Option<bool>,
}

impl InteractionTrigger {
    pub fn new(hand: HandSide) -> Self {
        Self {
            hand,
            state: AimState::Idle,
            line_visible: None,
        }
    }

    pub fn hand(&self) -> HandSide {
        self.hand
    }

    pub fn state(&self) -> AimState {
        self.state
    }

    pub fn line_visible(&self) -> bool {
        self.line_visible.unwrap_or(false)
    }

    /// Run one frame against the current state of `hand`.
    pub fn update(&mut self, hand: &HandSession, surface: &mut dyn RenderSurface) -> AimState {
        if hand.gesture() != Gesture::Point {
            self.release(surface);
            return self.state;
        }

        if self.state != AimState::Aiming {
            debug!(hand = %self.hand, "aiming");
        }
        self.state = AimState::Aiming;

        let hierarchy = hand.hierarchy();
        let Some(tip) = lookup_fingertip(hierarchy, Finger::Index) else {
            trace!(hand = %self.hand, "index fingertip missing, no aim this frame");
            self.hide(surface);
            return self.state;
        };

        let ray = Ray::new(hierarchy.world_position(tip), hierarchy.world_forward(tip));
        match surface.raycast(&ray) {
            Some(hit) => {
                trace!(distance = hit.distance, "aim hit");
                surface.set_line(true, &[ray.origin, hit.point]);
                self.line_visible = Some(true);
            }
            None => self.hide(surface),
        }
        self.state
    }

    /// Go idle and hide the line, e.g. when the hand is not tracked.
    pub fn release(&mut self, surface: &mut dyn RenderSurface) {
        if self.state == AimState::Aiming {
            debug!(hand = %self.hand, "aim released");
        }
        self.state = AimState::Idle;
        self.hide(surface);
    }

    fn hide(&mut self, surface: &mut dyn RenderSurface) {
        if self.line_visible != Some(false) {
            surface.set_line(false, &[]);
            self.line_visible = Some(false);
        }
    }
}
