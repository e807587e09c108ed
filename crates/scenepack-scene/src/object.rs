//! Scene objects and light payloads

use scenepack_core::Mat4x4;
use serde::{Deserialize, Serialize};

use crate::ids::{MaterialId, MeshId};

/// Light type as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightKind {
    Point,
    Sun,
    Spot,
    Area,
}

impl LightKind {
    /// Host type name, e.g. `"POINT"`
    pub fn as_str(&self) -> &'static str {
        match self {
            LightKind::Point => "POINT",
            LightKind::Sun => "SUN",
            LightKind::Spot => "SPOT",
            LightKind::Area => "AREA",
        }
    }
}

impl std::fmt::Display for LightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Light payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    #[serde(rename = "type")]
    pub kind: LightKind,
    /// Power in watts
    pub energy: f32,
    /// Linear RGB
    pub color: [f32; 3],
    /// Falloff distance
    pub distance: f32,
}

impl Light {
    pub fn point(energy: f32, color: [f32; 3], distance: f32) -> Self {
        Self {
            kind: LightKind::Point,
            energy,
            color,
            distance,
        }
    }
}

/// What an object carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum ObjectData {
    Mesh {
        /// `None` models a mesh object whose data was removed
        #[serde(default)]
        mesh: Option<MeshId>,
        /// One entry per material slot; `None` is an empty slot
        #[serde(default)]
        material_slots: Vec<Option<MaterialId>>,
    },
    Light(Light),
    /// Empties, cameras and anything else the exporter ignores
    Empty,
}

/// A placed object in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub name: String,
    /// Name of the parent object, if parented
    #[serde(default)]
    pub parent: Option<String>,
    /// Transform relative to the parent (or world when unparented)
    #[serde(default)]
    pub matrix_local: Mat4x4,
    /// Selection state in the host
    #[serde(default)]
    pub selected: bool,
    pub data: ObjectData,
}

impl Object {
    /// Mesh object with the given slots
    pub fn mesh(name: impl Into<String>, mesh: MeshId, slots: Vec<Option<MaterialId>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            matrix_local: Mat4x4::IDENTITY,
            selected: false,
            data: ObjectData::Mesh {
                mesh: Some(mesh),
                material_slots: slots,
            },
        }
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self {
            name: name.into(),
            parent: None,
            matrix_local: Mat4x4::IDENTITY,
            selected: false,
            data: ObjectData::Light(light),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            matrix_local: Mat4x4::IDENTITY,
            selected: false,
            data: ObjectData::Empty,
        }
    }

    pub fn with_matrix(mut self, matrix: Mat4x4) -> Self {
        self.matrix_local = matrix;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Host type name of the object
    pub fn type_name(&self) -> &'static str {
        match self.data {
            ObjectData::Mesh { .. } => "MESH",
            ObjectData::Light(_) => "LIGHT",
            ObjectData::Empty => "EMPTY",
        }
    }
}
