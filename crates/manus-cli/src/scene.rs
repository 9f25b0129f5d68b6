//! Headless scene used by the CLI: a single target wall facing the hand.

use manus_perception::math::{Ray, Vec3};
use manus_runtime::{Hit, RenderSurface};
use tracing::info;

/// Infinite wall at `z = distance`, facing the origin.
#[derive(Debug)]
pub struct TargetWall {
    distance: f32,
    line: Option<Vec<Vec3>>,
    toggles: u64,
}

impl TargetWall {
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            line: None,
            toggles: 0,
        }
    }

    /// Points of the visible aim line, if any.
    pub fn line(&self) -> Option<&[Vec3]> {
        self.line.as_deref()
    }

    /// Number of times the line switched between shown and hidden.
    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

impl RenderSurface for TargetWall {
    fn raycast(&self, ray: &Ray) -> Option<Hit> {
        if ray.direction.z <= f32::EPSILON {
            return None;
        }
        let t = (self.distance - ray.origin.z) / ray.direction.z;
        (t >= 0.0).then(|| Hit {
            point: ray.at(t),
            distance: t,
        })
    }

    fn set_line(&mut self, visible: bool, points: &[Vec3]) {
        let was_visible = self.line.is_some();
        if visible != was_visible {
            self.toggles += 1;
        }
        if visible {
            if !was_visible
                && let Some(end) = points.last()
            {
                info!(x = end.x, y = end.y, z = end.z, "aim line on target");
            }
            self.line = Some(points.to_vec());
        } else {
            if was_visible {
                info!("aim line hidden");
            }
            self.line = None;
        }
    }
}
