use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::boid::Boid;
use crate::config::{BoidParams, SchoolConfig};
use crate::error::SchoolError;
use crate::scene::SceneSink;
use crate::spatial::{AgentId, SpatialIndex, UniformGrid};
use crate::steering::Neighbor;
use crate::target::Target;

/// Simulation context: the flock, its spatial index, the target and the
/// random stream every stochastic behaviour draws from.
pub struct School<I: SpatialIndex = UniformGrid> {
    config: SchoolConfig,
    boids: Vec<Boid<I::Handle>>,
    index: I,
    target: Target,
    rng: ChaCha8Rng,
    found: Vec<AgentId>,
    neighbors: Vec<Neighbor>,
    similar: Vec<Neighbor>,
    tick_count: u64,
}

impl School<UniformGrid> {
    pub fn new(config: SchoolConfig) -> Result<Self, SchoolError> {
        Self::with_index(config, UniformGrid::default())
    }
}

impl<I: SpatialIndex> School<I> {
    pub fn with_index(mut config: SchoolConfig, index: I) -> Result<Self, SchoolError> {
        config.sanitize();
        config.boid.validate()?;

        Ok(Self {
            target: Target::new(config.target),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            boids: Vec::new(),
            index,
            found: Vec::new(),
            neighbors: Vec::new(),
            similar: Vec::new(),
            tick_count: 0,
        })
    }

    pub fn config(&self) -> &SchoolConfig {
        &self.config
    }

    pub fn boids(&self) -> &[Boid<I::Handle>] {
        &self.boids
    }

    pub fn boid(&self, id: AgentId) -> Option<&Boid<I::Handle>> {
        self.boids.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Spawn the configured batch of boids.
    pub fn initialize<S: SceneSink>(&mut self, scene: &mut S) -> Result<(), SchoolError> {
        let params = self.config.boid;
        self.spawn_flock(self.config.count, &params, scene)
    }

    pub fn spawn_flock<S: SceneSink>(
        &mut self,
        count: usize,
        params: &BoidParams,
        scene: &mut S,
    ) -> Result<(), SchoolError> {
        params.validate()?;

        self.boids.reserve(count);
        for _ in 0..count {
            let id = AgentId(self.boids.len() as u32);
            let mut boid = Boid::spawn(id, params, &mut self.rng);
            let handle = self.index.upsert(id, boid.position(), None);
            boid.set_spatial_handle(handle);
            scene.spawn(id, &params.appearance, &boid.transform());
            self.boids.push(boid);
        }

        info!(count, total = self.boids.len(), seed = self.config.seed, "spawned flock");
        Ok(())
    }

    /// Move a boid and re-index it immediately.
    pub fn place(&mut self, id: AgentId, position: Vec3, velocity: Vec3) {
        let Some(boid) = self.boids.get_mut(id.index()) else {
            return;
        };
        boid.set_state(position, velocity);
        let handle = self.index.upsert(id, boid.position(), boid.spatial_handle());
        boid.set_spatial_handle(handle);
    }

    /// Neighbors the next tick would hand to `id`'s steering.
    pub fn neighbors_of(&self, id: AgentId) -> Vec<Neighbor> {
        let mut found = Vec::new();
        let mut neighbors = Vec::new();
        if id.index() < self.boids.len() {
            collect_neighbors(
                &self.index,
                &self.boids,
                id,
                self.config.steering.neighbor_radius,
                &mut found,
                &mut neighbors,
            );
        }
        neighbors
    }

    /// Advance one rendered frame. Boids step with the delta clamped to
    /// `max_step`; the target follows the raw frame delta.
    pub fn step<S: SceneSink>(&mut self, frame_dt: f32, scene: &mut S) {
        if !frame_dt.is_finite() || frame_dt < 0.0 {
            warn!(frame_dt, "dropping invalid frame delta");
            return;
        }

        let dt = frame_dt.min(self.config.max_step);
        if !self.boids.is_empty() {
            for i in 0..self.boids.len() {
                self.tick_boid(i, dt, scene);
            }
            self.tick_count += 1;
        }

        self.target.update(frame_dt, &mut self.rng);
    }

    fn tick_boid<S: SceneSink>(&mut self, i: usize, dt: f32, scene: &mut S) {
        let Self {
            config,
            boids,
            index,
            target,
            rng,
            found,
            neighbors,
            similar,
            ..
        } = self;
        let id = boids[i].id();

        collect_neighbors(
            index,
            boids,
            id,
            config.steering.neighbor_radius,
            found,
            neighbors,
        );

        let boid = &mut boids[i];
        boid.apply_steering(
            &config.steering,
            target.position(),
            neighbors,
            similar,
            dt,
            rng,
        );
        boid.integrate(dt);
        boid.contain(&config.steering, &config.bounds);
        boid.update_orientation();

        let handle = index.upsert(id, boid.position(), boid.spatial_handle());
        boid.set_spatial_handle(handle);
        scene.update(id, &boid.transform());
    }
}

/// Snapshot every indexed boid within `radius` of `id`, excluding `id` itself.
fn collect_neighbors<I: SpatialIndex>(
    index: &I,
    boids: &[Boid<I::Handle>],
    id: AgentId,
    radius: f32,
    found: &mut Vec<AgentId>,
    out: &mut Vec<Neighbor>,
) {
    found.clear();
    out.clear();

    let origin = boids[id.index()].position();
    index.query_radius(origin, radius, |other| found.push(other));
    // Fixed order regardless of index implementation.
    found.sort_unstable();
    out.extend(
        found
            .iter()
            .filter(|&&other| other != id)
            .filter_map(|other| boids.get(other.index()))
            .map(Boid::as_neighbor),
    );
}
