//! Rendering collaborator seam. The simulation pushes transforms out and
//! never reads anything back.

use glam::{Quat, Vec3};

use crate::config::Appearance;
use crate::spatial::AgentId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: f32,
}

pub trait SceneSink {
    /// Called once per agent when the flock is created.
    fn spawn(&mut self, id: AgentId, appearance: &Appearance, transform: &Transform);
    /// Called once per agent per tick.
    fn update(&mut self, id: AgentId, transform: &Transform);
}

/// Sink for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullScene;

impl SceneSink for NullScene {
    fn spawn(&mut self, _id: AgentId, _appearance: &Appearance, _transform: &Transform) {}

    fn update(&mut self, _id: AgentId, _transform: &Transform) {}
}

/// Flat per-agent arrays a JS host can upload straight into instance buffers:
/// xyz positions, xyzw orientations and one scale each.
#[derive(Clone, Debug, Default)]
pub struct RenderBuffers {
    pub positions: Vec<f32>,
    pub orientations: Vec<f32>,
    pub scales: Vec<f32>,
    pub appearance: Option<Appearance>,
}

impl RenderBuffers {
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    fn ensure_slot(&mut self, index: usize) {
        if self.scales.len() <= index {
            self.positions.resize((index + 1) * 3, 0.0);
            self.orientations.resize((index + 1) * 4, 0.0);
            self.scales.resize(index + 1, 0.0);
        }
    }

    fn write(&mut self, index: usize, transform: &Transform) {
        self.positions[index * 3..index * 3 + 3].copy_from_slice(&transform.position.to_array());
        self.orientations[index * 4..index * 4 + 4]
            .copy_from_slice(&transform.orientation.to_array());
        self.scales[index] = transform.scale;
    }
}

impl SceneSink for RenderBuffers {
    fn spawn(&mut self, id: AgentId, appearance: &Appearance, transform: &Transform) {
        self.appearance.get_or_insert(*appearance);
        self.ensure_slot(id.index());
        self.write(id.index(), transform);
    }

    fn update(&mut self, id: AgentId, transform: &Transform) {
        // Updates for agents that were never spawned are dropped.
        if id.index() < self.scales.len() {
            self.write(id.index(), transform);
        }
    }
}
