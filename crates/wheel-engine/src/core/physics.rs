use glam::Vec2;
use rapier2d::prelude::*;
use std::sync::Mutex;
use thiserror::Error;

use crate::api::types::EntityId;

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn vec2_to_point(v: Vec2) -> nalgebra::Point2<f32> {
    nalgebra::Point2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

/// Squared length below which two polygon vertices count as coincident.
const AREA_EPSILON: f32 = 1e-9;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures raised by the physics layer.
#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    /// Gravity must be a finite vector.
    #[error("gravity must be finite, got ({x}, {y})")]
    InvalidGravity { x: f32, y: f32 },

    /// The integration step must be finite and strictly positive.
    #[error("timestep must be finite and positive, got {0}")]
    InvalidTimestep(f32),

    /// A convex polygon whose vertices do not enclose any area.
    #[error("convex polygon with {vertices} vertices encloses no area")]
    DegenerateShape { vertices: usize },
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
    /// Convex hull of the given body-local points.
    ConvexPolygon { vertices: Vec<Vec2> },
}

impl ColliderDesc {
    fn build_collider(&self) -> Result<ColliderBuilder, PhysicsError> {
        match self {
            ColliderDesc::Ball { radius } => Ok(ColliderBuilder::ball(*radius)),
            ColliderDesc::Cuboid { half_width, half_height } => {
                Ok(ColliderBuilder::cuboid(*half_width, *half_height))
            }
            ColliderDesc::ConvexPolygon { vertices } => {
                let degenerate = PhysicsError::DegenerateShape { vertices: vertices.len() };
                if !spans_area(vertices) {
                    return Err(degenerate);
                }
                let points: Vec<_> = vertices.iter().copied().map(vec2_to_point).collect();
                ColliderBuilder::convex_hull(&points).ok_or(degenerate)
            }
        }
    }

    fn from_shape(shape: &dyn Shape) -> Option<Self> {
        if let Some(ball) = shape.as_ball() {
            Some(ColliderDesc::Ball { radius: ball.radius })
        } else if let Some(cuboid) = shape.as_cuboid() {
            Some(ColliderDesc::Cuboid {
                half_width: cuboid.half_extents.x,
                half_height: cuboid.half_extents.y,
            })
        } else {
            shape.as_convex_polygon().map(|polygon| ColliderDesc::ConvexPolygon {
                vertices: polygon.points().iter().map(|p| Vec2::new(p.x, p.y)).collect(),
            })
        }
    }
}

/// Whether the points are finite and not all collinear.
fn spans_area(vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 || vertices.iter().any(|v| !v.is_finite()) {
        return false;
    }
    let origin = vertices[0];
    let Some(axis) = vertices
        .iter()
        .map(|v| *v - origin)
        .find(|d| d.length_squared() > AREA_EPSILON)
    else {
        return false;
    };
    vertices
        .iter()
        .any(|v| axis.perp_dot(*v - origin).abs() > AREA_EPSILON)
}

/// Collision group bitmasks. A collider only touches another when each one's
/// memberships intersect the other's filter, so an all-zero mask is inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionGroups {
    pub memberships: u32,
    pub filter: u32,
}

impl CollisionGroups {
    pub const ALL: Self = Self {
        memberships: u32::MAX,
        filter: u32::MAX,
    };
    pub const NONE: Self = Self {
        memberships: 0,
        filter: 0,
    };

    fn to_rapier(self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.memberships),
            Group::from_bits_truncate(self.filter),
        )
    }
}

/// Physical material properties for a collider.
///
/// Restitution always combines with the `Min` rule, so a zero on either side
/// of a contact makes it perfectly inelastic.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub groups: CollisionGroups,
}

impl ColliderMaterial {
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Make the collider touch nothing.
    pub fn inert(mut self) -> Self {
        self.groups = CollisionGroups::NONE;
        self
    }
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
            density: 1.0,
            groups: CollisionGroups::ALL,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub ccd: bool,
    pub collider: ColliderDesc,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            ccd: false,
            collider,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            ..Self::dynamic(collider)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

/// Handle pair referencing Rapier internals for one body and its collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// Velocity motor carried by a revolute joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointMotor {
    /// Angular velocity of the second body relative to the first, in rad/s.
    pub target_velocity: f32,
    /// How strongly the motor corrects velocity error.
    pub damping: f32,
    /// Upper bound on the motor's driving force.
    pub max_force: f32,
}

/// Description of a joint to create between two bodies.
#[derive(Debug, Clone, Copy)]
pub enum JointDesc {
    /// Rigidly locks two bodies together at the given local anchors.
    Fixed { anchor_a: Vec2, anchor_b: Vec2 },
    /// Allows free rotation around the anchor points (hinge joint in 2D).
    Revolute {
        anchor_a: Vec2,
        anchor_b: Vec2,
        motor: Option<JointMotor>,
    },
}

/// A collision event between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    /// `true` when the collision just started, `false` when it ended.
    pub started: bool,
}

impl CollisionPair {
    /// The other entity of the pair, if `id` takes part in it.
    pub fn partner_of(&self, id: EntityId) -> Option<EntityId> {
        if self.entity_a == id {
            Some(self.entity_b)
        } else if self.entity_b == id {
            Some(self.entity_a)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        self.collisions
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.collisions.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct.
///
/// Coordinates are Y-up: the wheel hub sits at the origin and gravity points
/// toward negative Y.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity and fixed step.
    pub fn new(gravity: Vec2, dt: f32) -> Result<Self, PhysicsError> {
        if !gravity.is_finite() {
            return Err(PhysicsError::InvalidGravity {
                x: gravity.x,
                y: gravity.y,
            });
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PhysicsError::InvalidTimestep(dt));
        }

        let integration_parameters = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };

        Ok(Self {
            gravity: vec2_to_na(gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
        })
    }

    /// The integration timestep.
    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Create a rigid body + collider and return handles.
    /// The EntityId is stored in the body's `user_data` for collision lookups.
    ///
    /// The shape is validated before anything is inserted, so an error leaves
    /// the world untouched.
    pub fn create_body(
        &mut self,
        entity_id: EntityId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> Result<PhysicsBody, PhysicsError> {
        let collider = desc
            .collider
            .build_collider()?
            .restitution(material.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Min)
            .friction(material.friction)
            .density(material.density)
            .collision_groups(material.groups.to_rapier())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .ccd_enabled(desc.ccd)
            .user_data(entity_id.0 as u128)
            .build();

        let body_handle = self.bodies.insert(rb);
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        Ok(PhysicsBody {
            body_handle,
            collider_handle,
        })
    }

    /// Remove a body, its colliders, and every joint attached to it.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Step the simulation and collect collision events into the provided Vec.
    pub fn step_into(&mut self, collision_events: &mut Vec<CollisionPair>) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        // Resolve collider handles → body handles → entity IDs
        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };

            let entity_a = self.collider_to_entity(h1);
            let entity_b = self.collider_to_entity(h2);

            if let (Some(a), Some(b)) = (entity_a, entity_b) {
                collision_events.push(CollisionPair {
                    entity_a: a,
                    entity_b: b,
                    started,
                });
            }
        }
    }

    // -- Torque --

    /// Add a persistent torque. It keeps acting on every step until reset.
    pub fn add_torque(&mut self, body: &PhysicsBody, torque: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.add_torque(torque, true);
        }
    }

    /// Clear every torque previously added to the body.
    pub fn reset_torques(&mut self, body: &PhysicsBody) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.reset_torques(true);
        }
    }

    /// Apply an instantaneous angular impulse.
    pub fn apply_torque_impulse(&mut self, body: &PhysicsBody, impulse: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_torque_impulse(impulse, true);
        }
    }

    // -- State queries --

    /// Position and rotation of a body, or `None` once it has been removed.
    pub fn body_transform(&self, body: &PhysicsBody) -> Option<(Vec2, f32)> {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
    }

    /// Rotation of a body in radians, within (-π, π].
    pub fn rotation(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.rotation().angle())
            .unwrap_or(0.0)
    }

    /// Angular velocity in rad/s; positive is counter-clockwise.
    pub fn angular_velocity(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.angvel())
            .unwrap_or(0.0)
    }

    /// Set the angular velocity of a body directly.
    pub fn set_angular_velocity(&mut self, body: &PhysicsBody, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_angvel(angvel, true);
        }
    }

    /// Whether the engine has put the body to sleep. Missing bodies read as awake.
    pub fn is_sleeping(&self, body: &PhysicsBody) -> bool {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.is_sleeping())
            .unwrap_or(false)
    }

    /// Force a body to sleep immediately, zeroing its velocities.
    pub fn sleep(&mut self, body: &PhysicsBody) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.sleep();
        }
    }

    /// Teleport a body without waking it.
    pub fn set_transform(&mut self, body: &PhysicsBody, pos: Vec2, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_position(nalgebra::Isometry2::new(vec2_to_na(pos), rotation), false);
        }
    }

    /// Whether the body still exists in this world.
    pub fn contains(&self, body: &PhysicsBody) -> bool {
        self.bodies.contains(body.body_handle)
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// World pose and shape of every collider, for wireframe rendering.
    pub fn collider_poses(&self) -> impl Iterator<Item = (Vec2, f32, ColliderDesc)> + '_ {
        self.colliders.iter().filter_map(|(_, collider)| {
            let (pos, rot) = na_iso_to_pos_rot(collider.position());
            ColliderDesc::from_shape(collider.shape()).map(|shape| (pos, rot, shape))
        })
    }

    // -- Joint methods --

    /// Create a joint between two bodies. It lives until either body is removed.
    pub fn create_joint(&mut self, body_a: &PhysicsBody, body_b: &PhysicsBody, desc: &JointDesc) {
        match *desc {
            JointDesc::Fixed { anchor_a, anchor_b } => {
                let joint = FixedJointBuilder::new()
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .build();
                self.impulse_joints.insert(body_a.body_handle, body_b.body_handle, joint, true);
            }
            JointDesc::Revolute { anchor_a, anchor_b, motor } => {
                let mut builder = RevoluteJointBuilder::new()
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b));
                if let Some(motor) = motor {
                    builder = builder
                        .motor_velocity(motor.target_velocity, motor.damping)
                        .motor_max_force(motor.max_force);
                }
                self.impulse_joints
                    .insert(body_a.body_handle, body_b.body_handle, builder.build(), true);
            }
        }
    }

    /// Number of joints in the simulation.
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    // -- private helpers --

    fn collider_to_entity(&self, collider_handle: ColliderHandle) -> Option<EntityId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        Some(EntityId(body.user_data as u32))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn world(gravity: Vec2) -> PhysicsWorld {
        PhysicsWorld::new(gravity, 1.0 / 60.0).expect("valid world parameters")
    }

    fn ball(world: &mut PhysicsWorld, id: u32, desc: BodyDesc) -> PhysicsBody {
        world
            .create_body(EntityId(id), &desc, ColliderMaterial::default())
            .expect("ball collider")
    }

    fn step(world: &mut PhysicsWorld, steps: usize) -> Vec<CollisionPair> {
        let mut events = Vec::new();
        for _ in 0..steps {
            world.step_into(&mut events);
        }
        events
    }

    #[test]
    fn rejects_invalid_world_parameters() {
        assert!(matches!(
            PhysicsWorld::new(Vec2::new(f32::NAN, 0.0), 0.01),
            Err(PhysicsError::InvalidGravity { .. })
        ));
        assert!(matches!(
            PhysicsWorld::new(Vec2::ZERO, 0.0),
            Err(PhysicsError::InvalidTimestep(_))
        ));
        assert!(matches!(
            PhysicsWorld::new(Vec2::ZERO, f32::INFINITY),
            Err(PhysicsError::InvalidTimestep(_))
        ));
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = world(Vec2::ZERO);
        let body = ball(&mut world, 1, BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }));
        assert_eq!(world.body_count(), 1);
        assert!(world.contains(&body));
        world.remove_body(&body);
        assert_eq!(world.body_count(), 0);
        assert!(!world.contains(&body));
        assert_eq!(world.body_transform(&body), None);
    }

    #[test]
    fn gravity_pulls_toward_negative_y() {
        let mut world = world(Vec2::new(0.0, -9.81));
        let body = ball(&mut world, 1, BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 }));

        step(&mut world, 10);
        let (pos, _) = world.body_transform(&body).expect("body exists");
        assert!(pos.y < 0.0, "Body should fall: y={}", pos.y);
    }

    #[test]
    fn fixed_body_does_not_move() {
        let mut world = world(Vec2::new(0.0, -9.81));
        let body = ball(
            &mut world,
            1,
            BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: 1.0,
                half_height: 0.1,
            })
            .with_position(Vec2::new(0.0, 5.0)),
        );

        step(&mut world, 10);
        let (pos, _) = world.body_transform(&body).expect("body exists");
        assert!((pos.y - 5.0).abs() < 0.001, "Fixed body should not move: y={}", pos.y);
    }

    #[test]
    fn torque_persists_until_reset() {
        let mut world = world(Vec2::ZERO);
        let body = ball(&mut world, 1, BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }));

        world.add_torque(&body, 2.0);
        step(&mut world, 10);
        let spun_up = world.angular_velocity(&body);
        assert!(spun_up > 0.0, "Positive torque spins counter-clockwise: {}", spun_up);

        step(&mut world, 10);
        let faster = world.angular_velocity(&body);
        assert!(faster > spun_up, "Torque keeps accelerating: {} -> {}", spun_up, faster);

        world.reset_torques(&body);
        step(&mut world, 10);
        let coasting = world.angular_velocity(&body);
        assert!(
            (coasting - faster).abs() < 1e-3,
            "Without torque the body coasts: {} vs {}",
            coasting,
            faster
        );
    }

    #[test]
    fn torque_impulse_changes_angular_velocity() {
        let mut world = world(Vec2::ZERO);
        let body = ball(&mut world, 1, BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }));

        step(&mut world, 1);
        assert_eq!(world.angular_velocity(&body), 0.0);
        world.apply_torque_impulse(&body, -1.0);
        step(&mut world, 1);
        assert!(world.angular_velocity(&body) < 0.0);
    }

    #[test]
    fn sleep_flag_follows_engine() {
        let mut world = world(Vec2::ZERO);
        let body = ball(&mut world, 1, BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }));

        world.sleep(&body);
        assert!(world.is_sleeping(&body));

        world.add_torque(&body, 1.0);
        assert!(!world.is_sleeping(&body), "Adding torque wakes the body");
    }

    #[test]
    fn resting_body_falls_asleep() {
        let mut world = world(Vec2::ZERO);
        let body = ball(&mut world, 1, BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }));

        step(&mut world, 400);
        assert!(world.is_sleeping(&body));
    }

    #[test]
    fn body_transform_and_teleport() {
        let mut world = world(Vec2::ZERO);
        let body = ball(
            &mut world,
            1,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 })
                .with_position(Vec2::new(1.0, 2.0))
                .with_rotation(1.5),
        );

        let (pos, rot) = world.body_transform(&body).expect("body exists");
        assert!((pos - Vec2::new(1.0, 2.0)).length() < 0.001);
        assert!((rot - 1.5).abs() < 0.001);

        world.set_transform(&body, Vec2::new(-3.0, 0.5), -0.25);
        let (pos, rot) = world.body_transform(&body).expect("body exists");
        assert!((pos - Vec2::new(-3.0, 0.5)).length() < 0.001);
        assert!((world.rotation(&body) - rot).abs() < f32::EPSILON);
        assert!((rot + 0.25).abs() < 0.001);
    }

    #[test]
    fn convex_polygon_round_trips_through_shape_query() {
        let mut world = world(Vec2::ZERO);
        let triangle = vec![Vec2::new(0.0, 0.5), Vec2::new(0.3, 0.0), Vec2::new(-0.3, 0.0)];
        let body = ball(
            &mut world,
            1,
            BodyDesc::dynamic(ColliderDesc::ConvexPolygon { vertices: triangle }),
        );

        assert!(world.contains(&body));
        match world.collider_poses().next() {
            Some((_, _, ColliderDesc::ConvexPolygon { vertices })) => assert_eq!(vertices.len(), 3),
            other => panic!("expected ConvexPolygon, got {:?}", other),
        };
    }

    #[test]
    fn degenerate_polygon_is_rejected_without_side_effects() {
        let mut world = world(Vec2::ZERO);
        let collinear = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        let result = world.create_body(
            EntityId(1),
            &BodyDesc::dynamic(ColliderDesc::ConvexPolygon { vertices: collinear }),
            ColliderMaterial::default(),
        );
        assert_eq!(result, Err(PhysicsError::DegenerateShape { vertices: 3 }));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn collider_poses_report_ball_and_cuboid() {
        let mut world = world(Vec2::ZERO);
        ball(
            &mut world,
            1,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.5 }).with_position(Vec2::new(2.0, 0.0)),
        );
        ball(
            &mut world,
            2,
            BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: 5.0,
                half_height: 1.0,
            }),
        );

        let poses: Vec<_> = world.collider_poses().collect();
        assert_eq!(poses.len(), 2);
        assert!(poses.contains(&(Vec2::new(2.0, 0.0), 0.0, ColliderDesc::Ball { radius: 1.5 })));
        assert!(poses.iter().any(|(_, _, shape)| *shape
            == ColliderDesc::Cuboid {
                half_width: 5.0,
                half_height: 1.0
            }));
    }

    #[test]
    fn falling_ball_reports_collision_with_ground() {
        let mut world = world(Vec2::new(0.0, -9.81));
        ball(
            &mut world,
            1,
            BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: 5.0,
                half_height: 0.5,
            }),
        );
        ball(
            &mut world,
            2,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 })
                .with_position(Vec2::new(0.0, 2.0)),
        );

        let events = step(&mut world, 120);
        let started = events
            .iter()
            .find(|e| e.started)
            .expect("ball should land on the ground");
        assert_eq!(started.partner_of(EntityId(1)), Some(EntityId(2)));
        assert_eq!(started.partner_of(EntityId(2)), Some(EntityId(1)));
        assert_eq!(started.partner_of(EntityId(3)), None);
    }

    #[test]
    fn inert_collider_passes_through() {
        let mut world = world(Vec2::new(0.0, -9.81));
        world
            .create_body(
                EntityId(1),
                &BodyDesc::fixed(ColliderDesc::Cuboid {
                    half_width: 5.0,
                    half_height: 0.5,
                }),
                ColliderMaterial::default().inert(),
            )
            .expect("ground");
        let falling = ball(
            &mut world,
            2,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.5 })
                .with_position(Vec2::new(0.0, 2.0)),
        );

        let events = step(&mut world, 120);
        assert!(events.is_empty(), "Inert ground should produce no contacts");
        let (pos, _) = world.body_transform(&falling).expect("body exists");
        assert!(pos.y < -1.0, "Ball should fall through: y={}", pos.y);
    }

    #[test]
    fn fixed_joint_carries_body_along() {
        let mut world = world(Vec2::ZERO);
        let hub = ball(&mut world, 1, BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }));
        let rim = world
            .create_body(
                EntityId(2),
                &BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.1 })
                    .with_position(Vec2::new(1.0, 0.0)),
                ColliderMaterial::default().inert(),
            )
            .expect("rim");

        assert_eq!(world.joint_count(), 0);
        world.create_joint(&hub, &rim, &JointDesc::Fixed {
            anchor_a: Vec2::new(1.0, 0.0),
            anchor_b: Vec2::ZERO,
        });
        assert_eq!(world.joint_count(), 1);

        world.set_angular_velocity(&hub, 2.0);
        step(&mut world, 30);

        let (rim_pos, _) = world.body_transform(&rim).expect("rim exists");
        let (hub_pos, _) = world.body_transform(&hub).expect("hub exists");
        let distance = (rim_pos - hub_pos).length();
        assert!((distance - 1.0).abs() < 0.05, "Rim should stay attached: d={}", distance);
        assert!(rim_pos.y > 0.1, "Rim should rotate with the hub: {:?}", rim_pos);
    }

    #[test]
    fn revolute_joint_allows_rotation() {
        let mut world = world(Vec2::new(0.0, -9.81));

        let pivot = ball(
            &mut world,
            1,
            BodyDesc::fixed(ColliderDesc::Ball { radius: 0.05 }),
        );
        let bob = world
            .create_body(
                EntityId(2),
                &BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.1 })
                    .with_position(Vec2::new(1.0, 0.0)),
                ColliderMaterial::default().inert(),
            )
            .expect("bob");

        world.create_joint(&pivot, &bob, &JointDesc::Revolute {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::new(-1.0, 0.0),
            motor: None,
        });

        step(&mut world, 30);
        let (pos, _) = world.body_transform(&bob).expect("bob exists");
        assert!(pos.y < -0.1, "Pendulum should swing down: {:?}", pos);
        assert!((pos.length() - 1.0).abs() < 0.05, "Pendulum keeps its length: {:?}", pos);
    }

    #[test]
    fn removing_body_removes_attached_joints() {
        let mut world = world(Vec2::ZERO);
        let a = ball(&mut world, 1, BodyDesc::fixed(ColliderDesc::Ball { radius: 0.1 }));
        let b = ball(&mut world, 2, BodyDesc::dynamic(ColliderDesc::Ball { radius: 0.1 }));
        world.create_joint(&a, &b, &JointDesc::Revolute {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            motor: None,
        });

        world.remove_body(&b);
        assert_eq!(world.joint_count(), 0);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn revolute_motor_drives_toward_target_velocity() {
        let mut world = world(Vec2::ZERO);
        let base = ball(&mut world, 1, BodyDesc::fixed(ColliderDesc::Ball { radius: 0.1 }));
        let disc = world
            .create_body(
                EntityId(2),
                &BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }),
                ColliderMaterial::default().inert(),
            )
            .expect("disc");

        // The target is the disc's velocity relative to the base.
        world.create_joint(&base, &disc, &JointDesc::Revolute {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            motor: Some(JointMotor {
                target_velocity: 2.0,
                damping: 1.0,
                max_force: f32::MAX,
            }),
        });

        step(&mut world, 60);
        let angvel = world.angular_velocity(&disc);
        assert!(angvel > 0.5, "Motor should spin the disc: {}", angvel);
    }

    #[test]
    fn revolute_motor_target_is_relative_to_first_body() {
        let mut world = world(Vec2::ZERO);
        let base = ball(&mut world, 1, BodyDesc::fixed(ColliderDesc::Ball { radius: 0.1 }));
        let disc = world
            .create_body(
                EntityId(2),
                &BodyDesc::dynamic(ColliderDesc::Ball { radius: 1.0 }),
                ColliderMaterial::default().inert(),
            )
            .expect("disc");

        // Same motor with the bodies swapped drives the disc the other way.
        world.create_joint(&disc, &base, &JointDesc::Revolute {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            motor: Some(JointMotor {
                target_velocity: 2.0,
                damping: 1.0,
                max_force: f32::MAX,
            }),
        });

        step(&mut world, 60);
        let angvel = world.angular_velocity(&disc);
        assert!(angvel < -0.5, "disc should turn against the target sign: {}", angvel);
    }

    #[test]
    fn builder_pattern() {
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: 5.0 })
            .with_position(Vec2::new(10.0, 20.0))
            .with_rotation(0.3)
            .with_ccd(true);

        assert_eq!(desc.body_type, BodyType::Dynamic);
        assert_eq!(desc.position, Vec2::new(10.0, 20.0));
        assert!((desc.rotation - 0.3).abs() < 0.001);
        assert!(desc.ccd);
        assert_eq!(BodyDesc::fixed(ColliderDesc::Ball { radius: 1.0 }).body_type, BodyType::Fixed);
    }

    #[test]
    fn collider_material_defaults() {
        let mat = ColliderMaterial::default();
        assert_eq!(mat.restitution, 0.0);
        assert!((mat.friction - 0.5).abs() < 0.001);
        assert!((mat.density - 1.0).abs() < 0.001);
        assert_eq!(mat.groups, CollisionGroups::ALL);

        let needle = mat.with_density(5.0).with_friction(0.1);
        assert!((needle.density - 5.0).abs() < 0.001);
        assert!((needle.friction - 0.1).abs() < 0.001);
    }
}
