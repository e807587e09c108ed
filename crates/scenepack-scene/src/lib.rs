//! scenepack-scene
//!
//! The host application's scene as the exporter sees it: objects with
//! transforms, mesh geometry, lights, material node graphs and images.
//!
//! Meshes, materials and images live in arenas owned by [`Scene`] and are
//! referenced through copyable handles. Two objects holding the same
//! [`MeshId`] share one mesh data block, regardless of names or geometry.
//!
//! # Example
//!
//! ```rust,ignore
//! use scenepack_scene::Scene;
//!
//! let scene = Scene::from_json_file("level.scene.json")?;
//! println!("{} objects, {} meshes", scene.objects.len(), scene.meshes.len());
//! ```

pub mod ids;
pub mod image;
pub mod material;
pub mod mesh;
pub mod object;
pub mod scene;

pub use ids::{ImageId, MaterialId, MeshId};
pub use image::{Image, ImageFormat, ImageSource};
pub use material::{Link, Material, Node, NodeIndex, NodeKind, NodeTree, SocketRef};
pub use mesh::{MeshData, MeshLoop, Polygon, UvLayer};
pub use object::{Light, LightKind, Object, ObjectData};
pub use scene::Scene;
