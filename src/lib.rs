use tracing::error;
use wasm_bindgen::prelude::*;

pub mod boid;
pub mod config;
pub mod driver;
pub mod error;
pub mod math;
pub mod scene;
pub mod school;
pub mod spatial;
pub mod steering;
pub mod target;

pub use boid::Boid;
pub use config::{
    Appearance, BoidParams, GeometryHandle, Material, SchoolConfig, SteeringConfig, TargetConfig,
    WorldBox,
};
pub use driver::Driver;
pub use error::SchoolError;
pub use scene::{NullScene, RenderBuffers, SceneSink, Transform};
pub use school::School;
pub use spatial::{AgentId, BruteForceIndex, SpatialIndex, UniformGrid};
pub use target::Target;

struct Stage {
    school: School,
    scene: RenderBuffers,
}

/// JS-facing handle owning a school and its render buffers.
#[wasm_bindgen]
pub struct Sim {
    driver: Driver<Stage>,
}

#[wasm_bindgen]
impl Sim {
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u32) -> Result<Sim, JsError> {
        Self::build(count, u64::from(seed)).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Like `new`, seeded from the platform entropy source.
    pub fn from_entropy(count: usize) -> Result<Sim, JsError> {
        let seed = entropy_seed().map_err(|e| JsError::new(&e.to_string()))?;
        Self::build(count, seed).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Drive one animation frame from a `requestAnimationFrame` timestamp.
    pub fn frame(&mut self, timestamp_ms: f64) -> f32 {
        self.driver.frame(timestamp_ms / 1000.0)
    }

    pub fn step(&mut self, dt: f32) {
        self.driver.advance(dt);
    }

    pub fn count(&self) -> usize {
        self.driver.state().school.len()
    }

    pub fn positions(&self) -> Vec<f32> {
        self.driver.state().scene.positions.clone()
    }

    pub fn orientations(&self) -> Vec<f32> {
        self.driver.state().scene.orientations.clone()
    }

    pub fn scales(&self) -> Vec<f32> {
        self.driver.state().scene.scales.clone()
    }

    pub fn target_position(&self) -> Vec<f32> {
        self.driver.state().school.target().position().to_array().to_vec()
    }

    pub fn set_target_radii(&mut self, radius: f32, y_radius: f32) {
        self.driver
            .state_mut()
            .school
            .target_mut()
            .set_radii(radius, y_radius);
    }
}

impl Sim {
    fn build(count: usize, seed: u64) -> Result<Sim, SchoolError> {
        let school = School::new(SchoolConfig {
            count,
            seed,
            ..SchoolConfig::default()
        })?;
        let stage = Stage {
            school,
            scene: RenderBuffers::default(),
        };

        let mut driver = Driver::new(
            stage,
            |stage: &mut Stage| {
                if let Err(err) = stage.school.initialize(&mut stage.scene) {
                    error!(%err, "failed to spawn flock");
                }
            },
            |stage: &mut Stage, dt| stage.school.step(dt, &mut stage.scene),
        );
        driver.initialize();
        Ok(Sim { driver })
    }
}

pub fn entropy_seed() -> Result<u64, getrandom::Error> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::Sim;

    #[test]
    fn sim_exposes_flat_buffers() {
        let mut sim = Sim::build(12, 4).unwrap();
        assert_eq!(sim.count(), 12);
        assert_eq!(sim.positions().len(), 36);
        assert_eq!(sim.orientations().len(), 48);
        assert_eq!(sim.scales().len(), 12);

        let before = sim.positions();
        sim.frame(0.0);
        sim.frame(16.0);
        sim.frame(32.0);
        assert_ne!(before, sim.positions());
        assert!(sim.positions().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn target_radii_can_be_overridden() {
        let mut sim = Sim::build(0, 1).unwrap();
        sim.set_target_radii(10.0, 10.0);
        sim.step(0.016);
        let target = sim.target_position();
        assert!(target[0] > 0.0);
    }
}
