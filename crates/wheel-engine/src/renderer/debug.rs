//! Debug rendering: collider wireframes as a flat line-segment buffer.
//!
//! Each segment is four floats `x0, y0, x1, y1` in world units, ready to be
//! stroked by whatever canvas the host draws with.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::core::physics::{ColliderDesc, PhysicsWorld};

/// Floats per line segment in [`DebugRenderer::lines`].
pub const SEGMENT_FLOATS: usize = 4;

const CIRCLE_SEGMENTS: usize = 24;

/// Owns the wireframe buffer so nothing outlives the renderer that built it.
#[derive(Debug, Default)]
pub struct DebugRenderer {
    lines: Vec<f32>,
    outlines: usize,
    disposed: bool,
}

impl DebugRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the wireframe from every collider in `world`.
    /// Returns the number of segments, or 0 once disposed.
    pub fn render(&mut self, world: &PhysicsWorld) -> usize {
        if self.disposed {
            return 0;
        }
        self.lines.clear();
        self.outlines = 0;
        for (pos, rot, shape) in world.collider_poses() {
            let points = collider_outline(pos, rot, &shape);
            for pair in points.windows(2) {
                self.lines
                    .extend_from_slice(&[pair[0][0], pair[0][1], pair[1][0], pair[1][1]]);
            }
            self.outlines += 1;
        }
        self.segment_count()
    }

    /// Release the buffer. Later renders do nothing until [`reset`](Self::reset).
    pub fn dispose(&mut self) {
        self.lines = Vec::new();
        self.outlines = 0;
        self.disposed = true;
    }

    /// Empty the buffer and allow rendering again.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.outlines = 0;
        self.disposed = false;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn lines(&self) -> &[f32] {
        &self.lines
    }

    pub fn segment_count(&self) -> usize {
        self.lines.len() / SEGMENT_FLOATS
    }

    /// Colliders drawn by the last render.
    pub fn outline_count(&self) -> usize {
        self.outlines
    }

    pub fn lines_ptr(&self) -> *const f32 {
        self.lines.as_ptr()
    }
}

/// Closed outline of a collider shape at a given position and rotation.
fn collider_outline(center: Vec2, rot: f32, shape: &ColliderDesc) -> Vec<[f32; 2]> {
    let (sin_r, cos_r) = rot.sin_cos();
    let place = |lx: f32, ly: f32| -> [f32; 2] {
        [
            center.x + lx * cos_r - ly * sin_r,
            center.y + lx * sin_r + ly * cos_r,
        ]
    };

    let mut points = match shape {
        ColliderDesc::Ball { radius } => {
            let mut points = Vec::with_capacity(CIRCLE_SEGMENTS + 2);
            // A spoke from the centre shows the ball's rotation.
            points.push(place(0.0, 0.0));
            for i in 0..=CIRCLE_SEGMENTS {
                let angle = (i as f32 / CIRCLE_SEGMENTS as f32) * TAU;
                points.push(place(angle.cos() * radius, angle.sin() * radius));
            }
            return points;
        }
        ColliderDesc::Cuboid {
            half_width,
            half_height,
        } => vec![
            place(-half_width, -half_height),
            place(*half_width, -half_height),
            place(*half_width, *half_height),
            place(-half_width, *half_height),
        ],
        ColliderDesc::ConvexPolygon { vertices } => {
            vertices.iter().map(|v| place(v.x, v.y)).collect()
        }
    };
    // Close the loop
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}
