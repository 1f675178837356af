use glam::Vec3;

use crate::error::SchoolError;
use crate::math::clamp_finite;

pub const DEFAULT_BOID_COUNT: usize = 100;
pub const DEFAULT_MAX_STEP: f32 = 1.0 / 10.0;
pub const DEFAULT_COLOUR: u32 = 0x80_FF_80;

pub const BOID_SPEED: f32 = 20.0;
pub const BOID_ACCELERATION: f32 = BOID_SPEED / 2.0;
pub const BOID_FORCE_MAX: f32 = BOID_ACCELERATION / 5.0;

/// Weights and thresholds shared by every steering behaviour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringConfig {
    pub seek_force: f32,
    pub seek_min_force: f32,
    pub seek_near_distance: f32,
    pub seek_ramp: f32,
    pub wander_force: f32,
    pub wander_step: f32,
    pub wander_lead: f32,
    pub separation_force: f32,
    pub separation_floor: f32,
    pub separation_spacing: f32,
    pub alignment_force: f32,
    pub cohesion_force: f32,
    pub ground_level: f32,
    pub ceiling_level: f32,
    pub neighbor_radius: f32,
    pub small_radius: f32,
    pub similar_ratio_min: f32,
    pub similar_ratio_max: f32,
    pub vertical_scale: f32,
    pub boundary_gain: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            seek_force: 8.0,
            seek_min_force: 100.0,
            seek_near_distance: 50.0,
            seek_ramp: 250.0,
            wander_force: 3.0,
            wander_step: 0.1,
            wander_lead: 2.0,
            separation_force: 5.0,
            separation_floor: 0.001,
            separation_spacing: 1.5,
            alignment_force: 30.0,
            cohesion_force: 100.0,
            ground_level: 10.0,
            ceiling_level: 30.0,
            neighbor_radius: 15.0,
            small_radius: 5.0,
            similar_ratio_min: 0.75,
            similar_ratio_max: 1.35,
            vertical_scale: 0.25,
            boundary_gain: 0.1,
        }
    }
}

impl SteeringConfig {
    pub fn sanitize(&mut self) {
        let d = Self::default();
        self.seek_force = clamp_finite(self.seek_force, 0.0, 1.0e4, d.seek_force);
        self.seek_min_force = clamp_finite(self.seek_min_force, 0.0, 1.0e4, d.seek_min_force);
        self.seek_near_distance =
            clamp_finite(self.seek_near_distance, 0.0, 1.0e5, d.seek_near_distance);
        self.seek_ramp = clamp_finite(self.seek_ramp, 1.0e-3, 1.0e5, d.seek_ramp);
        self.wander_force = clamp_finite(self.wander_force, 0.0, 1.0e4, d.wander_force);
        self.wander_step = clamp_finite(self.wander_step, 0.0, 10.0, d.wander_step);
        self.wander_lead = clamp_finite(self.wander_lead, 0.0, 100.0, d.wander_lead);
        self.separation_force =
            clamp_finite(self.separation_force, 0.0, 1.0e4, d.separation_force);
        self.separation_floor =
            clamp_finite(self.separation_floor, 1.0e-6, 1.0, d.separation_floor);
        self.separation_spacing =
            clamp_finite(self.separation_spacing, 0.0, 100.0, d.separation_spacing);
        self.alignment_force = clamp_finite(self.alignment_force, 0.0, 1.0e4, d.alignment_force);
        self.cohesion_force = clamp_finite(self.cohesion_force, 0.0, 1.0e4, d.cohesion_force);
        self.ground_level = clamp_finite(self.ground_level, -1.0e5, 1.0e5, d.ground_level);
        self.ceiling_level = clamp_finite(
            self.ceiling_level,
            self.ground_level,
            1.0e5,
            d.ceiling_level.max(self.ground_level),
        );
        self.neighbor_radius = clamp_finite(self.neighbor_radius, 0.0, 1.0e4, d.neighbor_radius);
        self.small_radius = clamp_finite(self.small_radius, 0.0, 1.0e4, d.small_radius);
        self.similar_ratio_min =
            clamp_finite(self.similar_ratio_min, 0.0, 1.0, d.similar_ratio_min);
        self.similar_ratio_max = clamp_finite(
            self.similar_ratio_max,
            self.similar_ratio_min.max(1.0),
            100.0,
            d.similar_ratio_max,
        );
        self.vertical_scale = clamp_finite(self.vertical_scale, 0.0, 1.0, d.vertical_scale);
        self.boundary_gain = clamp_finite(self.boundary_gain, 0.0, 10.0, d.boundary_gain);
    }
}

/// Axis-aligned containment volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for WorldBox {
    fn default() -> Self {
        Self {
            min: Vec3::new(-50.0, -70.0, -100.0),
            max: Vec3::new(50.0, 90.0, 100.0),
        }
    }
}

impl WorldBox {
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Opaque geometry token supplied by the asset provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GeometryHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Material {
    /// Material loaded alongside the geometry.
    Shared(u32),
    /// Solid RGB colour used when no material was provided.
    Solid(u32),
}

/// Geometry and material pair shared by a batch of boids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Appearance {
    pub geometry: GeometryHandle,
    pub material: Material,
}

impl Appearance {
    pub fn new(geometry: GeometryHandle, material: Option<u32>, colour: u32) -> Self {
        Self {
            geometry,
            material: material.map_or(Material::Solid(colour), Material::Shared),
        }
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::new(GeometryHandle::default(), None, DEFAULT_COLOUR)
    }
}

/// Creation parameters for one batch of boids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoidParams {
    pub appearance: Appearance,
    pub speed_min: f32,
    pub speed_max: f32,
    pub speed: f32,
    pub max_steering_force: f32,
    pub acceleration: f32,
    /// Radius of a boid whose speed multiplier is 1.
    pub base_scale: f32,
    pub spawn_min: Vec3,
    pub spawn_max: Vec3,
}

impl Default for BoidParams {
    fn default() -> Self {
        Self {
            appearance: Appearance::default(),
            speed_min: 3.0,
            speed_max: 4.0,
            speed: BOID_SPEED,
            max_steering_force: BOID_FORCE_MAX,
            acceleration: BOID_ACCELERATION,
            base_scale: 6.0,
            spawn_min: Vec3::new(5.0, 0.0, 5.0),
            spawn_max: Vec3::new(5.0, 5.0, 5.0),
        }
    }
}

impl BoidParams {
    pub fn validate(&self) -> Result<(), SchoolError> {
        if !self.speed_min.is_finite() || self.speed_min <= 0.0 {
            return Err(SchoolError::InvalidParams("speed_min must be positive"));
        }
        if !self.speed_max.is_finite() || self.speed_max < self.speed_min {
            return Err(SchoolError::InvalidParams(
                "speed_max must not be below speed_min",
            ));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(SchoolError::InvalidParams("speed must be non-negative"));
        }
        if !self.max_steering_force.is_finite() || self.max_steering_force < 0.0 {
            return Err(SchoolError::InvalidParams(
                "max_steering_force must be non-negative",
            ));
        }
        if !self.acceleration.is_finite() || self.acceleration < 0.0 {
            return Err(SchoolError::InvalidParams(
                "acceleration must be non-negative",
            ));
        }
        if !self.base_scale.is_finite() || self.base_scale <= 0.0 {
            return Err(SchoolError::InvalidParams("base_scale must be positive"));
        }
        if !self.spawn_min.is_finite() || !self.spawn_max.is_finite() {
            return Err(SchoolError::InvalidParams("spawn box must be finite"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetConfig {
    pub initial_position: Vec3,
    pub initial_radius: f32,
    pub initial_y_radius: f32,
    pub angular_speed: f32,
    pub lerp_factor: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub y_radius_min: f32,
    pub y_radius_max: f32,
    /// Seconds between radius re-randomizations.
    pub randomize_period: f32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            initial_position: Vec3::ZERO,
            initial_radius: 1.0,
            initial_y_radius: 1.0,
            angular_speed: 1.0,
            lerp_factor: 0.005,
            radius_min: 10.0,
            radius_max: 50.0,
            y_radius_min: 10.0,
            y_radius_max: 210.0,
            randomize_period: 30.0,
        }
    }
}

impl TargetConfig {
    pub fn sanitize(&mut self) {
        let d = Self::default();
        self.angular_speed = clamp_finite(self.angular_speed, -100.0, 100.0, d.angular_speed);
        self.lerp_factor = clamp_finite(self.lerp_factor, 0.0, 1.0, d.lerp_factor);
        self.radius_min = clamp_finite(self.radius_min, 1.0e-3, 1.0e5, d.radius_min);
        self.radius_max = clamp_finite(self.radius_max, self.radius_min, 1.0e5, d.radius_max);
        self.y_radius_min = clamp_finite(self.y_radius_min, 1.0e-3, 1.0e5, d.y_radius_min);
        self.y_radius_max =
            clamp_finite(self.y_radius_max, self.y_radius_min, 1.0e5, d.y_radius_max);
        self.randomize_period =
            clamp_finite(self.randomize_period, 1.0e-3, 1.0e6, d.randomize_period);
    }
}

/// Everything needed to build a [`crate::School`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchoolConfig {
    pub count: usize,
    pub seed: u64,
    pub max_step: f32,
    pub boid: BoidParams,
    pub steering: SteeringConfig,
    pub bounds: WorldBox,
    pub target: TargetConfig,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_BOID_COUNT,
            seed: 0,
            max_step: DEFAULT_MAX_STEP,
            boid: BoidParams::default(),
            steering: SteeringConfig::default(),
            bounds: WorldBox::default(),
            target: TargetConfig::default(),
        }
    }
}

impl SchoolConfig {
    pub fn sanitize(&mut self) {
        self.max_step = clamp_finite(self.max_step, 1.0e-4, 1.0, DEFAULT_MAX_STEP);
        self.steering.sanitize();
        self.target.sanitize();
    }
}
