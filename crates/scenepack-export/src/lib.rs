//! scenepack-export
//!
//! Turns a [`scenepack_scene::Scene`] into game-ready assets:
//!
//! - one binary vertex buffer per distinct mesh (`<mesh>.bin`)
//! - every image referenced by an exported material
//! - a JSON manifest listing point lights, mesh instances and materials
//!
//! # Example
//!
//! ```rust,ignore
//! use scenepack_export::{ExportOptions, Exporter};
//! use scenepack_scene::Scene;
//!
//! let scene = Scene::from_json_file("level.scene.json")?;
//! let report = Exporter::new(ExportOptions::default()).export(&scene, "out/level.spj")?;
//! println!("{} meshes written", report.meshes_written());
//! ```

pub mod collector;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod mesh;
pub mod naming;
pub mod options;
pub mod pipeline;
pub mod shader;
pub mod textures;

pub use collector::{CollectedScene, SceneCollector, SceneInstance, SkipReason, EMPTY_SLOT};
pub use error::{ExportError, ExportResult};
pub use manifest::{Manifest, ManifestWriter};
pub use mesh::{MeshExportResult, MeshSerializer, VertexBuffer};
pub use options::ExportOptions;
pub use pipeline::{ExportReport, ExportSummary, Exporter};
pub use shader::{Channel, ChannelTextures, MaterialTextures, ShaderGraphResolver, ShadingKind};
pub use textures::{TextureEmitter, TextureExportResult};
