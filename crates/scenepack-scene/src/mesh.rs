// scenepack-scene/src/mesh.rs
//! Host mesh data structures
//!
//! Geometry is stored the way the host stores it: shared vertex positions,
//! per-corner loops pointing at vertices, and polygons spanning a contiguous
//! run of loops. UV layers hold one coordinate per loop.

use scenepack_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A mesh data block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Mesh name (also the vertex-buffer file stem)
    pub name: String,
    /// Vertex positions in object space
    #[serde(default)]
    pub vertices: Vec<[f32; 3]>,
    /// Face corners
    #[serde(default)]
    pub loops: Vec<MeshLoop>,
    /// Faces of any size >= 3
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    /// Per-loop UV layers
    #[serde(default)]
    pub uv_layers: Vec<UvLayer>,
    /// Index into `uv_layers` of the active layer
    #[serde(default)]
    pub active_uv_layer: Option<usize>,
}

/// One face corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshLoop {
    pub vertex_index: u32,
}

/// A face as a run of loops
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// First loop of the face
    pub loop_start: u32,
    /// Number of corners
    pub loop_total: u32,
    /// Smooth shading (vertex normals) instead of flat face normals
    #[serde(default)]
    pub smooth: bool,
    /// Material slot index
    #[serde(default)]
    pub material_index: u32,
}

impl Polygon {
    /// Loop indices of this face
    pub fn loop_range(&self) -> std::ops::Range<usize> {
        let start = self.loop_start as usize;
        start..start + self.loop_total as usize
    }
}

/// A named UV layer with one coordinate per loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvLayer {
    pub name: String,
    pub uvs: Vec<[f32; 2]>,
}

impl MeshData {
    /// Create a new empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            loops: Vec::new(),
            polygons: Vec::new(),
            uv_layers: Vec::new(),
            active_uv_layer: None,
        }
    }

    /// Append a face over existing vertices, returning its index
    pub fn add_polygon(&mut self, vertex_indices: &[u32], smooth: bool) -> usize {
        let loop_start = self.loops.len() as u32;
        self.loops
            .extend(vertex_indices.iter().map(|&vertex_index| MeshLoop { vertex_index }));
        self.polygons.push(Polygon {
            loop_start,
            loop_total: vertex_indices.len() as u32,
            smooth,
            material_index: 0,
        });
        self.polygons.len() - 1
    }

    /// Add a UV layer and make it active
    pub fn add_uv_layer(&mut self, name: impl Into<String>, uvs: Vec<[f32; 2]>) {
        self.uv_layers.push(UvLayer { name: name.into(), uvs });
        self.active_uv_layer = Some(self.uv_layers.len() - 1);
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get polygon count
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Whether there is any geometry to export
    pub fn has_geometry(&self) -> bool {
        !self.vertices.is_empty()
    }

    /// The active UV layer, if any
    pub fn active_uv(&self) -> Option<&UvLayer> {
        self.active_uv_layer.and_then(|i| self.uv_layers.get(i))
    }

    /// Number of triangles a fan/ear triangulation yields
    pub fn triangle_count(&self) -> usize {
        self.polygons
            .iter()
            .map(|p| (p.loop_total as usize).saturating_sub(2))
            .sum()
    }

    /// Check indices and layer sizes for consistency
    pub fn validate(&self) -> Result<()> {
        for (i, l) in self.loops.iter().enumerate() {
            if l.vertex_index as usize >= self.vertices.len() {
                return Err(Error::invalid_data(format!(
                    "mesh '{}': loop {i} points at missing vertex {}",
                    self.name, l.vertex_index
                )));
            }
        }

        for (i, p) in self.polygons.iter().enumerate() {
            if p.loop_total < 3 || p.loop_range().end > self.loops.len() {
                return Err(Error::invalid_data(format!(
                    "mesh '{}': polygon {i} has an invalid loop range",
                    self.name
                )));
            }
        }

        for layer in &self.uv_layers {
            if layer.uvs.len() != self.loops.len() {
                return Err(Error::invalid_data(format!(
                    "mesh '{}': UV layer '{}' has {} entries for {} loops",
                    self.name,
                    layer.name,
                    layer.uvs.len(),
                    self.loops.len()
                )));
            }
        }

        if let Some(active) = self.active_uv_layer {
            if active >= self.uv_layers.len() {
                return Err(Error::invalid_data(format!(
                    "mesh '{}': active UV layer {active} does not exist",
                    self.name
                )));
            }
        }

        Ok(())
    }
}
