//! The attractor the school seeks: a point that trails a spiral path whose
//! radii are re-rolled on a fixed period.

use glam::Vec3;
use rand::Rng;
use tracing::{debug, error, warn};

use crate::config::TargetConfig;
use crate::math::rand_range;

#[derive(Clone, Debug)]
pub struct Target {
    position: Vec3,
    target_position: Vec3,
    angle: f32,
    radius: f32,
    y_radius: f32,
    since_randomize: f32,
    config: TargetConfig,
}

impl Target {
    pub fn new(mut config: TargetConfig) -> Self {
        config.sanitize();
        Self {
            position: config.initial_position,
            target_position: config.initial_position,
            angle: 0.0,
            radius: config.initial_radius,
            y_radius: config.initial_y_radius,
            since_randomize: 0.0,
            config,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn y_radius(&self) -> f32 {
        self.y_radius
    }

    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    /// Override the spiral extents. Invalid values are accepted and make
    /// subsequent updates skip until valid radii are set again.
    pub fn set_radii(&mut self, radius: f32, y_radius: f32) {
        self.radius = radius;
        self.y_radius = y_radius;
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    pub fn randomize_radius<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.radius = rand_range(rng, self.config.radius_min, self.config.radius_max);
        self.y_radius = rand_range(rng, self.config.y_radius_min, self.config.y_radius_max);
        debug!(radius = self.radius, y_radius = self.y_radius, "target radii randomized");
    }

    /// Advance by one rendered frame of `dt` seconds.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) {
        self.since_randomize += dt;
        if self.since_randomize >= self.config.randomize_period {
            self.since_randomize %= self.config.randomize_period;
            self.randomize_radius(rng);
        }

        self.update_position(dt);
    }

    /// Step along the spiral and ease toward it. Skipped while the radii
    /// are invalid.
    pub fn update_position(&mut self, dt: f32) {
        if !valid_radius(self.radius) || !valid_radius(self.y_radius) {
            warn!(
                radius = self.radius,
                y_radius = self.y_radius,
                "invalid target radius, skipping update"
            );
            return;
        }

        self.angle += self.config.angular_speed * dt;
        if !self.angle.is_finite() {
            error!("target angle is not finite, resetting to 0");
            self.angle = 0.0;
        }

        let (sin, cos) = self.angle.sin_cos();
        self.target_position = Vec3::new(self.radius * cos, self.y_radius * sin, self.radius * sin);
        self.position = self.position.lerp(self.target_position, self.config.lerp_factor);
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new(TargetConfig::default())
    }
}

fn valid_radius(r: f32) -> bool {
    r.is_finite() && r > 0.0
}

/// Linear remap of `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
pub fn map_value(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn one_frame_moves_toward_spiral_point() {
        let mut target = Target::default();
        target.set_radii(10.0, 10.0);
        target.update_position(0.016);

        let spiral = target.target_position();
        assert!((spiral - Vec3::new(10.0, 0.0, 0.0)).length() < 0.2, "{spiral:?}");

        let step = target.position().length();
        assert!(step > 0.0);
        assert!(step <= 0.005 * spiral.length() + 1.0e-6);
        assert!((target.position() - spiral * 0.005).length() < 1.0e-6);
    }

    #[test]
    fn invalid_radius_skips_update() {
        let mut target = Target::default();
        for (radius, y_radius) in [(f32::NAN, 10.0), (10.0, 0.0), (-1.0, 5.0), (f32::INFINITY, 5.0)] {
            target.set_radii(radius, y_radius);
            target.update_position(0.016);
            assert_eq!(target.angle(), 0.0);
            assert_eq!(target.position(), Vec3::ZERO);
        }
    }

    #[test]
    fn non_finite_angle_resets() {
        let mut target = Target::default();
        target.set_angle(f32::INFINITY);
        target.update_position(0.016);
        assert_eq!(target.angle(), 0.0);
        assert!(target.position().is_finite());
    }

    #[test]
    fn radii_rerolled_on_period() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut target = Target::new(TargetConfig {
            randomize_period: 1.0,
            ..TargetConfig::default()
        });

        target.update(0.5, &mut rng);
        assert_eq!(target.radius(), 1.0);

        target.update(0.6, &mut rng);
        assert!((10.0..50.0).contains(&target.radius()));
        assert!((10.0..210.0).contains(&target.y_radius()));
    }

    #[test]
    fn map_value_is_linear() {
        assert_eq!(map_value(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
        assert_eq!(map_value(1.0, 1.0, 1.0, 3.0, 4.0), 3.0);
    }
}
