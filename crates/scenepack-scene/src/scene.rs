//! The scene root and its datablock arenas

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use scenepack_core::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ids::{ImageId, MaterialId, MeshId};
use crate::image::Image;
use crate::material::Material;
use crate::mesh::MeshData;
use crate::object::Object;

/// A host scene snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene (or source file) name
    #[serde(default)]
    pub name: String,
    /// Objects in host traversal order
    #[serde(default)]
    pub objects: Vec<Object>,
    #[serde(default)]
    pub meshes: Vec<MeshData>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a JSON snapshot written by the host
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let reader = BufReader::new(File::open(path)?);
        let scene: Scene = serde_json::from_reader(reader)
            .map_err(|e| Error::invalid_data(e.to_string()))
            .and_then(|scene: Scene| scene.validate().map(|()| scene))
            .with_context(|| format!("parsing scene snapshot {}", path.display()))?;

        debug!(
            path = %path.display(),
            objects = scene.objects.len(),
            meshes = scene.meshes.len(),
            materials = scene.materials.len(),
            images = scene.images.len(),
            "Loaded scene snapshot"
        );
        Ok(scene)
    }

    /// Parse a JSON snapshot from a string
    pub fn from_json_str(text: &str) -> Result<Self> {
        let scene: Scene = serde_json::from_str(text).map_err(|e| Error::invalid_data(e.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        MeshId::new(self.meshes.len() as u32 - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId::new(self.materials.len() as u32 - 1)
    }

    pub fn add_image(&mut self, image: Image) -> ImageId {
        self.images.push(image);
        ImageId::new(self.images.len() as u32 - 1)
    }

    pub fn add_object(&mut self, object: Object) -> &mut Self {
        self.objects.push(object);
        self
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(id.index())
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn image(&self, id: ImageId) -> Option<&Image> {
        self.images.get(id.index())
    }

    /// Check every material's node links
    pub fn validate(&self) -> Result<()> {
        for material in &self.materials {
            if let Some(tree) = &material.node_tree {
                tree.validate()
                    .with_context(|| format!("material '{}'", material.name))?;
            }
        }
        Ok(())
    }

    /// Find an object by name
    pub fn object_by_name(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Light, Object};
    use std::io::Write;

    #[test]
    fn test_handles_are_arena_indices() {
        let mut scene = Scene::new("test");
        let a = scene.add_mesh(MeshData::new("A"));
        let b = scene.add_mesh(MeshData::new("A"));

        assert_ne!(a, b);
        assert_eq!(scene.mesh(b).unwrap().name, "A");
        assert!(scene.mesh(MeshId::new(7)).is_none());
    }

    #[test]
    fn test_snapshot_roundtrip_through_file() {
        let mut scene = Scene::new("level");
        let mesh = scene.add_mesh(MeshData::new("Cube"));
        scene
            .add_object(Object::mesh("Cube", mesh, vec![None]))
            .add_object(Object::light("Lamp", Light::point(10.0, [1.0, 0.5, 0.5], 5.0)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&scene).unwrap().as_bytes()).unwrap();

        let loaded = Scene::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, scene);
        assert!(loaded.object_by_name("Lamp").is_some());
    }

    #[test]
    fn test_missing_snapshot() {
        let err = Scene::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_snapshot_with_broken_link_is_rejected() {
        let text = r#"{
            "materials": [{
                "name": "Broken",
                "node_tree": {
                    "nodes": [{"name": "Material Output", "type": "OUTPUT_MATERIAL", "inputs": ["Surface"]}],
                    "links": [{"from": {"node": 4, "socket": 0}, "to": {"node": 0, "socket": 0}}]
                }
            }]
        }"#;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let err = Scene::from_json_file(file.path()).unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_malformed_snapshot_is_parse_error() {
        let err = Scene::from_json_str("{\"objects\": 3}").unwrap_err();
        assert!(err.is_parse_error());
    }
}
