use crate::api::types::BodyTransform;
use crate::core::physics::{PhysicsBody, PhysicsWorld};
use crate::wheel::scene::WheelScene;

/// Floats preceding the transforms in [`WheelSnapshot::write_floats`]:
/// peg count, then 1.0 if the needle is present.
pub const SNAPSHOT_HEADER_FLOATS: usize = 2;

/// Read-only poses of the wheel assembly after a completed step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WheelSnapshot {
    pub wheel: BodyTransform,
    /// In peg index order.
    pub pegs: Vec<BodyTransform>,
    /// `None` if the needle body no longer exists.
    pub needle: Option<BodyTransform>,
    pub needle_anchor: BodyTransform,
}

impl WheelSnapshot {
    pub fn capture(world: &PhysicsWorld, scene: &WheelScene) -> Self {
        Self {
            wheel: transform_of(world, &scene.wheel).unwrap_or_default(),
            pegs: scene
                .pegs
                .iter()
                .map(|peg| transform_of(world, peg).unwrap_or_default())
                .collect(),
            needle: transform_of(world, &scene.needle),
            needle_anchor: transform_of(world, &scene.needle_anchor).unwrap_or_default(),
        }
    }

    /// Needle angle for drawing. Without a needle body, sway it a little
    /// and lean it with the wheel so the scene still looks alive.
    pub fn needle_rotation_or_fallback(&self, time: f32) -> f32 {
        match self.needle {
            Some(needle) => needle.rotation,
            None => (time * 2.0).sin() * 0.05 + self.wheel.rotation * 0.03,
        }
    }

    /// Number of floats [`write_floats`](Self::write_floats) produces.
    pub fn float_len(&self) -> usize {
        SNAPSHOT_HEADER_FLOATS + BodyTransform::FLOATS * (3 + self.pegs.len())
    }

    /// Flatten into `out`, replacing its contents.
    ///
    /// Layout: header, wheel, needle anchor, needle (zeros when absent),
    /// then one transform per peg.
    pub fn write_floats(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.float_len());
        out.push(self.pegs.len() as f32);
        out.push(if self.needle.is_some() { 1.0 } else { 0.0 });
        let fixed = [
            self.wheel,
            self.needle_anchor,
            self.needle.unwrap_or_default(),
        ];
        out.extend_from_slice(bytemuck::cast_slice(&fixed));
        out.extend_from_slice(bytemuck::cast_slice(&self.pegs));
    }

    pub fn to_floats(&self) -> Vec<f32> {
        let mut out = Vec::new();
        self.write_floats(&mut out);
        out
    }
}

fn transform_of(world: &PhysicsWorld, body: &PhysicsBody) -> Option<BodyTransform> {
    world.body_transform(body).map(|(pos, rotation)| BodyTransform {
        x: pos.x,
        y: pos.y,
        rotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::WheelConfig;

    fn scene() -> (PhysicsWorld, WheelScene) {
        let config = WheelConfig::with_pegs(12);
        let mut world = PhysicsWorld::new(config.gravity(), config.fixed_dt).expect("valid world");
        let scene = WheelScene::build(&mut world, &config, 10.0).expect("scene builds");
        (world, scene)
    }

    #[test]
    fn captures_every_body() {
        let (world, scene) = scene();
        let snapshot = WheelSnapshot::capture(&world, &scene);

        assert_eq!(snapshot.pegs.len(), 12);
        let needle = snapshot.needle.expect("needle present");
        assert!((needle.rotation - 0.3).abs() < 1e-4);
        assert!((snapshot.needle_anchor.y - 1.69).abs() < 1e-4);
        assert!((snapshot.pegs[0].x - 1.47).abs() < 1e-4);
        assert!(snapshot.pegs[0].y.abs() < 1e-4);
    }

    #[test]
    fn flat_layout() {
        let (world, scene) = scene();
        let snapshot = WheelSnapshot::capture(&world, &scene);
        let floats = snapshot.to_floats();

        assert_eq!(floats.len(), snapshot.float_len());
        assert_eq!(floats.len(), 2 + 3 * (3 + 12));
        assert_eq!(floats[0], 12.0);
        assert_eq!(floats[1], 1.0);
        // needle rotation sits after header, wheel, and anchor
        assert_eq!(floats[2 + 6 + 2], snapshot.needle.map(|n| n.rotation).unwrap_or_default());
        let first_peg = &floats[2 + 9..2 + 12];
        assert_eq!(first_peg, &[snapshot.pegs[0].x, snapshot.pegs[0].y, snapshot.pegs[0].rotation]);
    }

    #[test]
    fn missing_needle_is_reported() {
        let (mut world, scene) = scene();
        world.remove_body(&scene.needle);
        let snapshot = WheelSnapshot::capture(&world, &scene);

        assert_eq!(snapshot.needle, None);
        assert_eq!(snapshot.to_floats()[1], 0.0);
    }

    #[test]
    fn fallback_needle_angle() {
        let snapshot = WheelSnapshot {
            wheel: BodyTransform {
                x: 0.0,
                y: 0.0,
                rotation: 1.0,
            },
            ..WheelSnapshot::default()
        };
        // Leans the same way the wheel has turned.
        assert!((snapshot.needle_rotation_or_fallback(0.0) - 0.03).abs() < 1e-6);
        let t = 0.25_f32;
        let expected = (2.0 * t).sin() * 0.05 + 0.03;
        assert!((snapshot.needle_rotation_or_fallback(t) - expected).abs() < 1e-6);

        let with_needle = WheelSnapshot {
            needle: Some(BodyTransform {
                x: 0.0,
                y: 1.69,
                rotation: -0.2,
            }),
            ..snapshot
        };
        assert_eq!(with_needle.needle_rotation_or_fallback(3.0), -0.2);
    }
}
