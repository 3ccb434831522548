//! Wheel assembly: hub, disc, peg ring, and the needle with its stops.

use glam::Vec2;
use log::{info, warn};

use crate::api::config::WheelConfig;
use crate::api::types::{BodyRole, EntityId};
use crate::core::physics::{
    BodyDesc, ColliderDesc, ColliderMaterial, CollisionPair, JointDesc, PhysicsBody, PhysicsWorld,
};
use crate::error::WheelError;

/// Handles to every body and joint of one wheel, plus the round's arm strength.
///
/// The scene only stores handles; all state lives in the [`PhysicsWorld`] it
/// was built in.
#[derive(Debug, Clone)]
pub struct WheelScene {
    pub base: PhysicsBody,
    pub wheel: PhysicsBody,
    /// Pegs in angular order; `pegs[i]` starts at angle `i * peg_spacing`.
    pub pegs: Vec<PhysicsBody>,
    pub needle: PhysicsBody,
    pub needle_anchor: PhysicsBody,
    /// Left and right stop.
    pub stops: [PhysicsBody; 2],
    arm_strength: f32,
    peg_spacing: f32,
    needle_pivot: Vec2,
}

impl WheelScene {
    /// Build a wheel inside `world`.
    ///
    /// Either the whole assembly is created or nothing is: on failure every
    /// body and joint added so far is removed again.
    pub fn build(
        world: &mut PhysicsWorld,
        config: &WheelConfig,
        arm_strength: f32,
    ) -> Result<Self, WheelError> {
        config.validate()?;
        if !arm_strength.is_finite() || arm_strength < 0.0 {
            return Err(WheelError::invalid(format!(
                "arm strength must be finite and non-negative, got {}",
                arm_strength
            )));
        }

        let mut builder = SceneBuilder {
            world,
            created: Vec::new(),
        };
        match builder.assemble(config, arm_strength) {
            Ok(scene) => {
                info!(
                    "wheel scene built: {} pegs, arm strength {:.2}",
                    scene.peg_count(),
                    arm_strength
                );
                Ok(scene)
            }
            Err(err) => {
                warn!("wheel scene build failed, rolling back: {}", err);
                builder.rollback();
                Err(err)
            }
        }
    }

    pub fn peg_count(&self) -> u32 {
        self.pegs.len() as u32
    }

    /// Angle between neighbouring pegs.
    pub fn peg_spacing(&self) -> f32 {
        self.peg_spacing
    }

    /// Torque magnitude the spin driver pulls the lever with.
    pub fn arm_strength(&self) -> f32 {
        self.arm_strength
    }

    /// World position of the needle pivot.
    pub fn needle_pivot(&self) -> Vec2 {
        self.needle_pivot
    }

    /// Role of a body in this scene, or `None` if it does not belong to it.
    pub fn role_of(&self, id: EntityId) -> Option<BodyRole> {
        match BodyRole::from_id(id)? {
            BodyRole::Peg(index) if index >= self.peg_count() => None,
            role => Some(role),
        }
    }

    /// Peg index the needle touches in `pair`, if the pair is needle against peg.
    pub fn struck_peg(&self, pair: &CollisionPair) -> Option<u32> {
        match self.role_of(pair.partner_of(BodyRole::Needle.id())?)? {
            BodyRole::Peg(index) => Some(index),
            _ => None,
        }
    }

    /// Remove every body of the scene from `world` (joints go with them).
    pub fn remove(self, world: &mut PhysicsWorld) {
        for body in self.bodies() {
            world.remove_body(&body);
        }
    }

    fn bodies(&self) -> Vec<PhysicsBody> {
        let mut bodies = vec![self.base, self.wheel, self.needle, self.needle_anchor];
        bodies.extend(self.stops);
        bodies.extend(self.pegs.iter().copied());
        bodies
    }
}

/// Tracks created bodies so a failed build can be undone.
struct SceneBuilder<'w> {
    world: &'w mut PhysicsWorld,
    created: Vec<PhysicsBody>,
}

impl SceneBuilder<'_> {
    fn body(
        &mut self,
        role: BodyRole,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> Result<PhysicsBody, WheelError> {
        let body = self.world.create_body(role.id(), &desc, material)?;
        self.created.push(body);
        Ok(body)
    }

    fn rollback(self) {
        for body in self.created.iter().rev() {
            self.world.remove_body(body);
        }
    }

    fn assemble(&mut self, config: &WheelConfig, arm_strength: f32) -> Result<WheelScene, WheelError> {
        let base = self.body(
            BodyRole::Base,
            BodyDesc::fixed(ColliderDesc::Ball {
                radius: config.base_radius,
            }),
            ColliderMaterial::default().inert(),
        )?;

        // The disc itself is inert; only its pegs touch the needle.
        let wheel = self.body(
            BodyRole::Wheel,
            BodyDesc::dynamic(ColliderDesc::Ball {
                radius: config.wheel_radius,
            }),
            ColliderMaterial::default()
                .with_density(config.wheel_density)
                .inert(),
        )?;
        self.world.create_joint(&wheel, &base, &JointDesc::Revolute {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            motor: None,
        });

        let peg_spacing = config.peg_spacing();
        let peg_offset = config.peg_offset();
        let mut pegs = Vec::with_capacity(config.peg_count as usize);
        for index in 0..config.peg_count {
            let pos = Vec2::from_angle(index as f32 * peg_spacing) * peg_offset;
            let peg = self.body(
                BodyRole::Peg(index),
                BodyDesc::dynamic(ColliderDesc::Ball {
                    radius: config.peg_radius,
                })
                .with_position(pos)
                .with_ccd(true),
                ColliderMaterial::default(),
            )?;
            self.world.create_joint(&wheel, &peg, &JointDesc::Fixed {
                anchor_a: pos,
                anchor_b: Vec2::ZERO,
            });
            pegs.push(peg);
        }

        let needle_pivot = config.needle_anchor();
        let needle_anchor = self.body(
            BodyRole::NeedleAnchor,
            BodyDesc::fixed(ColliderDesc::Ball { radius: 0.01 }).with_position(needle_pivot),
            ColliderMaterial::default().inert(),
        )?;
        let needle = self.body(
            BodyRole::Needle,
            BodyDesc::dynamic(ColliderDesc::ConvexPolygon {
                vertices: config.needle_vertices(),
            })
            .with_position(needle_pivot)
            .with_rotation(config.needle_initial_rotation),
            ColliderMaterial::default()
                .with_density(config.needle_density)
                .with_friction(config.needle_friction),
        )?;
        self.world.create_joint(&needle, &needle_anchor, &JointDesc::Revolute {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            motor: None,
        });

        let stop_shape = ColliderDesc::Cuboid {
            half_width: config.stop_half_extent,
            half_height: config.stop_half_extent,
        };
        let stop_y = needle_pivot.y + config.stop_lift;
        let left_stop = self.body(
            BodyRole::LeftStop,
            BodyDesc::fixed(stop_shape.clone()).with_position(Vec2::new(-config.stop_offset_x, stop_y)),
            ColliderMaterial::default(),
        )?;
        let right_stop = self.body(
            BodyRole::RightStop,
            BodyDesc::fixed(stop_shape).with_position(Vec2::new(config.stop_offset_x, stop_y)),
            ColliderMaterial::default(),
        )?;

        Ok(WheelScene {
            base,
            wheel,
            pegs,
            needle,
            needle_anchor,
            stops: [left_stop, right_stop],
            arm_strength,
            peg_spacing,
            needle_pivot,
        })
    }
}
