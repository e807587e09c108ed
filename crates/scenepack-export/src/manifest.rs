//! Scene manifest
//!
//! One JSON document with three arrays: `lights`, `meshes` and `materials`.
//! Records pass through [`serde_json::Value`] before printing so object keys
//! come out sorted, and the same scene always yields the same bytes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use scenepack_core::Transform;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::collector::{CollectedScene, InstanceData};
use crate::error::{ExportError, ExportResult};
use crate::shader::MaterialTextures;

/// Transform as written to the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub location: [f32; 3],
    /// `[w, x, y, z]`
    #[serde(rename = "rotationQuat")]
    pub rotation_quat: [f32; 4],
    pub scale: [f32; 3],
}

impl From<&Transform> for TransformRecord {
    fn from(t: &Transform) -> Self {
        Self {
            location: t.location.to_array(),
            rotation_quat: t.rotation.to_array(),
            scale: t.scale.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub energy: f32,
    pub color: [f32; 3],
    pub distance: f32,
    pub transform: TransformRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshEntry {
    /// Object name
    pub name: String,
    pub transform: TransformRecord,
    /// Mesh data block name, the vertex-buffer file stem
    pub mesh: String,
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    /// Channel name to texture names; every channel is present
    pub textures: BTreeMap<String, Vec<String>>,
}

impl From<&MaterialTextures> for MaterialEntry {
    fn from(m: &MaterialTextures) -> Self {
        Self {
            name: m.name.clone(),
            textures: m
                .channels
                .iter()
                .map(|(channel, names)| (channel.as_str().to_string(), names.to_vec()))
                .collect(),
        }
    }
}

/// The whole manifest document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub lights: Vec<LightEntry>,
    pub meshes: Vec<MeshEntry>,
    pub materials: Vec<MaterialEntry>,
}

impl Manifest {
    /// Assemble from collected instances and resolved materials
    pub fn build(collected: &CollectedScene, materials: &[MaterialTextures]) -> Self {
        let mut manifest = Manifest::default();

        for instance in &collected.instances {
            let transform = TransformRecord::from(&instance.transform);
            match &instance.data {
                InstanceData::Light(light) => manifest.lights.push(LightEntry {
                    name: light.name.clone(),
                    kind: light.kind.as_str().to_string(),
                    energy: light.energy,
                    color: light.color,
                    distance: light.distance,
                    transform,
                }),
                InstanceData::Mesh(mesh) => manifest.meshes.push(MeshEntry {
                    name: instance.name.clone(),
                    transform,
                    mesh: mesh.mesh_name.clone(),
                    materials: mesh.materials.clone(),
                }),
            }
        }

        manifest.materials = materials.iter().map(MaterialEntry::from).collect();
        manifest
    }

    /// Pretty-print with sorted keys and `indent` spaces, no trailing newline
    pub fn to_json_string(&self, indent: usize) -> ExportResult<String> {
        let value = serde_json::to_value(self)?;

        let indent = vec![b' '; indent];
        let formatter = PrettyFormatter::with_indent(&indent);
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)?;

        String::from_utf8(out).map_err(|e| ExportError::Config(format!("manifest is not UTF-8: {e}")))
    }

    pub fn from_json_str(text: &str) -> ExportResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Writes the manifest file
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    path: PathBuf,
    indent: usize,
}

impl ManifestWriter {
    pub fn new(path: impl Into<PathBuf>, indent: usize) -> Self {
        Self {
            path: path.into(),
            indent,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize and write; any failure here aborts the export
    pub fn write(&self, manifest: &Manifest) -> ExportResult<()> {
        let text = manifest.to_json_string(self.indent)?;
        std::fs::write(&self.path, text).map_err(|e| ExportError::fatal_io(&self.path, e))?;

        info!(
            path = %self.path.display(),
            lights = manifest.lights.len(),
            meshes = manifest.meshes.len(),
            materials = manifest.materials.len(),
            "Manifest written"
        );
        Ok(())
    }
}
