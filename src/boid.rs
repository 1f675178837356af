use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::Rng;

use crate::config::{BoidParams, SteeringConfig, WorldBox};
use crate::math::{
    heading_orientation, limit_magnitude, normalize_or_default, rand_in_box, rand_range,
};
use crate::scene::Transform;
use crate::spatial::AgentId;
use crate::steering::{self, Kinematics, Neighbor, SteeringLimits};

/// One fish. `H` is the spatial index handle kept between ticks.
#[derive(Clone, Debug)]
pub struct Boid<H> {
    id: AgentId,
    position: Vec3,
    velocity: Vec3,
    direction: Vec3,
    orientation: Quat,
    radius: f32,
    max_speed: f32,
    max_steering_force: f32,
    acceleration: f32,
    wander_angle: f32,
    spatial_handle: Option<H>,
}

impl<H: Copy> Boid<H> {
    /// Draw a new boid. Assumes `params` passed [`BoidParams::validate`].
    pub fn spawn<R: Rng + ?Sized>(id: AgentId, params: &BoidParams, rng: &mut R) -> Self {
        let position = rand_in_box(rng, params.spawn_min, params.spawn_max);
        let yaw = rand_range(rng, 0.0, TAU);
        let heading = Vec3::new(rand_range(rng, -1.0, 1.0), 0.0, rand_range(rng, -1.0, 1.0));
        let speed_multiplier = rand_range(rng, params.speed_min, params.speed_max);

        Self {
            id,
            position,
            velocity: heading,
            direction: normalize_or_default(heading, Vec3::X),
            orientation: Quat::from_rotation_y(yaw),
            radius: params.base_scale / speed_multiplier,
            max_speed: params.speed * speed_multiplier,
            max_steering_force: params.max_steering_force * speed_multiplier,
            acceleration: params.acceleration * speed_multiplier,
            wander_angle: 0.0,
            spatial_handle: None,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn max_steering_force(&self) -> f32 {
        self.max_steering_force
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    pub fn wander_angle(&self) -> f32 {
        self.wander_angle
    }

    pub fn spatial_handle(&self) -> Option<H> {
        self.spatial_handle
    }

    pub(crate) fn set_spatial_handle(&mut self, handle: H) {
        self.spatial_handle = Some(handle);
    }

    /// Place the boid explicitly, e.g. for scripted setups.
    pub fn set_state(&mut self, position: Vec3, velocity: Vec3) {
        self.position = position;
        self.velocity = limit_magnitude(velocity, self.max_speed);
        self.direction = normalize_or_default(self.velocity, self.direction);
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            position: self.position,
            direction: self.direction,
            radius: self.radius,
        }
    }

    pub fn as_neighbor(&self) -> Neighbor {
        Neighbor {
            id: self.id,
            position: self.position,
            direction: self.direction,
            radius: self.radius,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            orientation: self.orientation,
            scale: self.radius,
        }
    }

    /// Compose steering from `neighbors` and fold it into the velocity.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_steering<R: Rng + ?Sized>(
        &mut self,
        cfg: &SteeringConfig,
        target: Vec3,
        neighbors: &[Neighbor],
        scratch: &mut Vec<Neighbor>,
        dt: f32,
        rng: &mut R,
    ) {
        let limits = SteeringLimits {
            acceleration: self.acceleration,
            max_steering_force: self.max_steering_force,
        };
        let me = self.kinematics();
        let dv = steering::compose(
            cfg,
            &me,
            limits,
            &mut self.wander_angle,
            target,
            neighbors,
            scratch,
            dt,
            rng,
        );

        self.velocity += dv;
        self.settle_velocity();
    }

    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Push the velocity back toward `bounds`. This skips the steering clamp
    /// but still respects the speed limit.
    pub fn contain(&mut self, cfg: &SteeringConfig, bounds: &WorldBox) {
        if bounds.contains(self.position) {
            return;
        }
        self.velocity += steering::containment(cfg, self.position, bounds);
        self.settle_velocity();
    }

    pub fn update_orientation(&mut self) {
        self.orientation = heading_orientation(self.direction);
    }

    fn settle_velocity(&mut self) {
        self.velocity = limit_magnitude(self.velocity, self.max_speed);
        self.direction = normalize_or_default(self.velocity, self.direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn spawn_one(seed: u64) -> Boid<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Boid::spawn(AgentId(0), &BoidParams::default(), &mut rng)
    }

    #[test]
    fn faster_boids_are_smaller() {
        let params = BoidParams::default();
        for seed in 0..32 {
            let boid = spawn_one(seed);
            let multiplier = boid.max_speed() / params.speed;
            assert!((3.0..=4.0).contains(&multiplier));
            assert!((boid.radius() - params.base_scale / multiplier).abs() < 1.0e-4);
            assert!((boid.acceleration() - params.acceleration * multiplier).abs() < 1.0e-4);
            assert!(boid.radius() > 0.0);
        }
    }

    #[test]
    fn spawn_uses_configured_box() {
        let boid = spawn_one(1);
        let p = boid.position();
        assert_eq!(p.x, 5.0);
        assert_eq!(p.z, 5.0);
        assert!((0.0..5.0).contains(&p.y));
        assert!((boid.direction().length() - 1.0).abs() < 1.0e-5);
        assert_eq!(boid.direction().y, 0.0);
    }

    #[test]
    fn steering_keeps_speed_and_direction_invariants() {
        let cfg = SteeringConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut boid = spawn_one(2);
        let mut scratch = Vec::new();

        for _ in 0..200 {
            boid.apply_steering(&cfg, Vec3::new(300.0, 0.0, 0.0), &[], &mut scratch, 0.1, &mut rng);
            boid.integrate(0.1);
            assert!(boid.velocity().length() <= boid.max_speed() + 1.0e-3);
            assert!((boid.direction().length() - 1.0).abs() < 1.0e-4);
            assert!(boid.direction().dot(boid.velocity().normalize()) > 0.9999);
        }
    }

    #[test]
    fn containment_respects_speed_limit() {
        let cfg = SteeringConfig::default();
        let mut boid = spawn_one(3);
        let top_speed = boid.max_speed();
        boid.set_state(Vec3::new(2000.0, 0.0, 0.0), Vec3::new(top_speed, 0.0, 0.0));
        boid.contain(&cfg, &WorldBox::default());

        assert!(boid.velocity().x < 0.0);
        assert!(boid.velocity().length() <= top_speed + 1.0e-3);
    }

    #[test]
    fn orientation_follows_direction() {
        let mut boid = spawn_one(4);
        boid.set_state(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        boid.update_orientation();
        let facing = boid.orientation() * Vec3::NEG_Z;
        assert!((facing - Vec3::Z).length() < 1.0e-4);
    }
}
