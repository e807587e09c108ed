//! Scene collection
//!
//! Walks the host objects once, producing one [`SceneInstance`] per exported
//! object and the distinct meshes and materials those instances reference.

use std::collections::HashMap;

use indexmap::IndexSet;
use scenepack_core::{Mat4x4, Transform};
use scenepack_scene::{LightKind, MaterialId, MeshId, Object, ObjectData, Scene};
use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::options::ExportOptions;

/// Manifest name for an empty material slot
pub const EMPTY_SLOT: &str = "NONE";

/// Instance type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    Mesh,
    Light,
}

/// A collected point light
#[derive(Debug, Clone, PartialEq)]
pub struct LightRecord {
    pub name: String,
    pub kind: LightKind,
    pub energy: f32,
    pub color: [f32; 3],
    pub distance: f32,
    pub transform: Transform,
}

/// A collected mesh placement
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub mesh: MeshId,
    /// Name of the mesh data block
    pub mesh_name: String,
    /// One name per material slot, [`EMPTY_SLOT`] for empty slots
    pub materials: Vec<String>,
}

/// Payload of an instance
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceData {
    Mesh(MeshInstance),
    Light(LightRecord),
}

/// One exported object
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInstance {
    pub name: String,
    pub transform: Transform,
    pub data: InstanceData,
}

impl SceneInstance {
    pub fn kind(&self) -> InstanceKind {
        match self.data {
            InstanceData::Mesh(_) => InstanceKind::Mesh,
            InstanceData::Light(_) => InstanceKind::Light,
        }
    }
}

/// Why an object was left out
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoMeshData,
    NoGeometry,
    UnsupportedLight(LightKind),
    MissingParent(String),
    ParentCycle,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoMeshData => write!(f, "mesh data missing"),
            SkipReason::NoGeometry => write!(f, "mesh has no vertices"),
            SkipReason::UnsupportedLight(kind) => write!(f, "unsupported light type {kind}"),
            SkipReason::MissingParent(parent) => write!(f, "parent '{parent}' not found"),
            SkipReason::ParentCycle => write!(f, "parent chain is cyclic"),
        }
    }
}

/// An object excluded from the export
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedObject {
    pub object: String,
    pub reason: SkipReason,
}

impl SkippedObject {
    pub fn to_error(&self) -> ExportError {
        ExportError::SkippedInstance {
            object: self.object.clone(),
            reason: self.reason.to_string(),
        }
    }
}

/// Result of a collection pass
#[derive(Debug, Clone, Default)]
pub struct CollectedScene {
    /// Exported objects in host order
    pub instances: Vec<SceneInstance>,
    /// Distinct mesh data blocks, first-seen order
    pub meshes: IndexSet<MeshId>,
    /// Distinct materials, first-seen order
    pub materials: IndexSet<MaterialId>,
    pub skipped: Vec<SkippedObject>,
}

impl CollectedScene {
    pub fn lights(&self) -> impl Iterator<Item = &LightRecord> + '_ {
        self.instances.iter().filter_map(|i| match &i.data {
            InstanceData::Light(light) => Some(light),
            _ => None,
        })
    }

    pub fn mesh_instances(&self) -> impl Iterator<Item = (&SceneInstance, &MeshInstance)> + '_ {
        self.instances.iter().filter_map(|i| match &i.data {
            InstanceData::Mesh(mesh) => Some((i, mesh)),
            _ => None,
        })
    }
}

/// Scene walker
pub struct SceneCollector<'a> {
    scene: &'a Scene,
    options: &'a ExportOptions,
    by_name: HashMap<&'a str, usize>,
}

impl<'a> SceneCollector<'a> {
    pub fn new(scene: &'a Scene, options: &'a ExportOptions) -> Self {
        let by_name = scene
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| (o.name.as_str(), i))
            .collect();

        Self {
            scene,
            options,
            by_name,
        }
    }

    /// Walk every object once
    pub fn collect(&self) -> CollectedScene {
        let mut out = CollectedScene::default();

        for (index, object) in self.scene.objects.iter().enumerate() {
            if self.options.selected_only && !object.selected {
                continue;
            }

            match self.collect_object(index, object, &mut out) {
                Ok(()) => {}
                Err(reason) => {
                    debug!(object = %object.name, reason = %reason, "Skipping object");
                    out.skipped.push(SkippedObject {
                        object: object.name.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            instances = out.instances.len(),
            meshes = out.meshes.len(),
            materials = out.materials.len(),
            skipped = out.skipped.len(),
            "Scene collected"
        );
        out
    }

    fn collect_object(
        &self,
        index: usize,
        object: &Object,
        out: &mut CollectedScene,
    ) -> Result<(), SkipReason> {
        let (transform, data) = match &object.data {
            ObjectData::Empty => return Ok(()),
            ObjectData::Light(light) => {
                if light.kind != LightKind::Point {
                    return Err(SkipReason::UnsupportedLight(light.kind));
                }
                let transform = self.world_matrix(index)?.decompose();
                let record = LightRecord {
                    name: object.name.clone(),
                    kind: light.kind,
                    energy: light.energy,
                    color: light.color,
                    distance: light.distance,
                    transform,
                };
                (transform, InstanceData::Light(record))
            }
            ObjectData::Mesh {
                mesh,
                material_slots,
            } => {
                let mesh_id = mesh.ok_or(SkipReason::NoMeshData)?;
                let mesh = self.scene.mesh(mesh_id).ok_or(SkipReason::NoMeshData)?;
                if !mesh.has_geometry() {
                    return Err(SkipReason::NoGeometry);
                }
                // Resolve the transform before touching the dedup sets
                let transform = self.world_matrix(index)?.decompose();

                out.meshes.insert(mesh_id);
                let materials = material_slots
                    .iter()
                    .map(|slot| self.slot_name(object, *slot, &mut out.materials))
                    .collect();

                let instance = MeshInstance {
                    mesh: mesh_id,
                    mesh_name: mesh.name.clone(),
                    materials,
                };
                (transform, InstanceData::Mesh(instance))
            }
        };

        out.instances.push(SceneInstance {
            name: object.name.clone(),
            transform,
            data,
        });
        Ok(())
    }

    fn slot_name(
        &self,
        object: &Object,
        slot: Option<MaterialId>,
        materials: &mut IndexSet<MaterialId>,
    ) -> String {
        let Some(id) = slot else {
            return EMPTY_SLOT.to_string();
        };
        match self.scene.material(id) {
            Some(material) => {
                materials.insert(id);
                material.name.clone()
            }
            None => {
                warn!(object = %object.name, material = %id, "Material slot points at a missing material");
                EMPTY_SLOT.to_string()
            }
        }
    }

    /// Parent-chain product of local matrices
    fn world_matrix(&self, index: usize) -> Result<Mat4x4, SkipReason> {
        let mut chain = vec![index];
        let mut current = &self.scene.objects[index];

        while let Some(parent) = current.parent.as_deref() {
            let parent_index = *self
                .by_name
                .get(parent)
                .ok_or_else(|| SkipReason::MissingParent(parent.to_string()))?;
            if chain.contains(&parent_index) {
                return Err(SkipReason::ParentCycle);
            }
            chain.push(parent_index);
            current = &self.scene.objects[parent_index];
        }

        Ok(chain
            .iter()
            .rev()
            .fold(Mat4x4::IDENTITY, |world, &i| world.mul(&self.scene.objects[i].matrix_local)))
    }
}
