//! Renderer-facing types
//!
//! This module provides the vertex layout handed to renderers and the
//! scene interface a hosting view implements to display renderable units.

use crate::model::{scene_bounds, Aabb, RenderableUnit};
use bytemuck::{Pod, Zeroable};
use uuid::Uuid;

/// A vertex with position, normal and UV data
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 3D position
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0], // Default up (Z+)
            uv: [0.0, 0.0],
        }
    }
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Size of a vertex in bytes
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Number of floats per vertex
    pub const fn floats_per_vertex() -> usize {
        8 // 3 + 3 + 2
    }
}

/// A live scene that displays renderable units
pub trait SceneSink {
    fn add_unit(&mut self, unit: RenderableUnit);

    /// Remove a unit, handing it back for disposal
    fn remove_unit(&mut self, id: Uuid) -> Option<RenderableUnit>;

    /// Frame the camera around `bounds`, or the default view when empty
    fn reset_view(&mut self, bounds: Option<Aabb>);
}

/// Display a finished load: add every unit, then frame them
pub fn commit_units<S: SceneSink + ?Sized>(scene: &mut S, units: Vec<RenderableUnit>) {
    let bounds = scene_bounds(&units);
    for unit in units {
        scene.add_unit(unit);
    }
    scene.reset_view(bounds);
}

/// In-memory scene that records what it was asked to display
#[derive(Debug, Default)]
pub struct RecordingScene {
    units: Vec<RenderableUnit>,
    last_view: Option<Aabb>,
    view_resets: usize,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> &[RenderableUnit] {
        &self.units
    }

    pub fn last_view(&self) -> Option<Aabb> {
        self.last_view
    }

    pub fn view_resets(&self) -> usize {
        self.view_resets
    }

    /// Remove every unit, handing them back for disposal
    pub fn clear(&mut self) -> Vec<RenderableUnit> {
        std::mem::take(&mut self.units)
    }
}

impl SceneSink for RecordingScene {
    fn add_unit(&mut self, unit: RenderableUnit) {
        self.units.push(unit);
    }

    fn remove_unit(&mut self, id: Uuid) -> Option<RenderableUnit> {
        let pos = self.units.iter().position(|u| u.id == id)?;
        Some(self.units.remove(pos))
    }

    fn reset_view(&mut self, bounds: Option<Aabb>) {
        self.last_view = bounds;
        self.view_resets += 1;
    }
}
