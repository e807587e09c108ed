//! Export pipeline
//!
//! Runs the stages once each, in order: collect, meshes, materials, textures,
//! manifest. Per-asset failures are gathered into the [`ExportReport`]; only an
//! unwritable output directory or manifest stops the run.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use scenepack_scene::Scene;
use serde::Serialize;
use tracing::{info, warn};

use crate::collector::{SceneCollector, SkippedObject};
use crate::error::{ExportError, ExportResult};
use crate::logging::instrument_stage;
use crate::manifest::{Manifest, ManifestWriter};
use crate::mesh::{MeshExportResult, MeshSerializer};
use crate::options::ExportOptions;
use crate::shader::{MaterialTextures, ShaderGraphResolver};
use crate::textures::{TextureEmitter, TextureExportResult};

/// Everything an export run produced
#[derive(Debug)]
pub struct ExportReport {
    pub manifest_path: PathBuf,
    pub output_dir: PathBuf,
    pub manifest: Manifest,
    pub mesh_results: Vec<MeshExportResult>,
    pub materials: Vec<MaterialTextures>,
    pub texture_results: Vec<TextureExportResult>,
    pub skipped: Vec<SkippedObject>,
    pub elapsed: Duration,
}

impl ExportReport {
    pub fn meshes_written(&self) -> usize {
        self.mesh_results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn textures_written(&self) -> usize {
        self.texture_results.iter().filter(|r| r.is_ok()).count()
    }

    /// Every per-asset failure, meshes first
    pub fn failures(&self) -> impl Iterator<Item = &ExportError> + '_ {
        self.mesh_results
            .iter()
            .filter_map(|r| r.error())
            .chain(self.texture_results.iter().filter_map(|r| r.error()))
    }

    /// No asset failed (skipped objects don't count)
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            manifest: self.manifest_path.display().to_string(),
            output_dir: self.output_dir.display().to_string(),
            lights: self.manifest.lights.len(),
            mesh_instances: self.manifest.meshes.len(),
            meshes_written: self.meshes_written(),
            materials: self.materials.len(),
            textures_written: self.textures_written(),
            failures: self.failures().map(|e| e.to_string()).collect(),
            skipped: self.skipped.iter().map(|s| s.to_error().to_string()).collect(),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

/// Serializable digest of a report
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub manifest: String,
    pub output_dir: String,
    pub lights: usize,
    pub mesh_instances: usize,
    pub meshes_written: usize,
    pub materials: usize,
    pub textures_written: usize,
    pub failures: Vec<String>,
    pub skipped: Vec<String>,
    pub elapsed_ms: u64,
}

/// Scene exporter
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export next to the manifest: assets go into its parent directory
    pub fn export(&self, scene: &Scene, manifest_path: impl AsRef<Path>) -> ExportResult<ExportReport> {
        let manifest_path = manifest_path.as_ref();
        let output_dir = match manifest_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.export_to(scene, manifest_path, &output_dir)
    }

    /// Export with an explicit asset directory
    pub fn export_to(
        &self,
        scene: &Scene,
        manifest_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> ExportResult<ExportReport> {
        let start = Instant::now();
        let manifest_path = manifest_path.as_ref();
        let output_dir = output_dir.as_ref();
        let options = &self.options;
        options.validate()?;

        info!(
            scene = %scene.name,
            manifest = %manifest_path.display(),
            output = %output_dir.display(),
            "Starting export"
        );

        std::fs::create_dir_all(output_dir).map_err(|e| ExportError::fatal_io(output_dir, e))?;

        let collected = instrument_stage("collect", || SceneCollector::new(scene, options).collect());

        let mesh_results = instrument_stage("meshes", || {
            let serializer = MeshSerializer::new(output_dir, options);
            collected
                .meshes
                .iter()
                .filter_map(|&id| scene.mesh(id).map(|mesh| serializer.write(id, mesh)))
                .collect::<Vec<_>>()
        });

        let (materials, images) = instrument_stage("materials", || {
            let mut resolver = ShaderGraphResolver::new(scene, options.max_graph_depth);
            let materials = collected
                .materials
                .iter()
                .filter_map(|&id| scene.material(id).map(|m| resolver.resolve(id, m)))
                .collect::<Vec<_>>();
            (materials, resolver.into_images())
        });

        let texture_results = instrument_stage("textures", || {
            if !options.write_textures {
                info!(count = images.len(), "Texture writing disabled");
                return Vec::new();
            }
            let emitter = TextureEmitter::new(output_dir);
            images
                .iter()
                .filter_map(|&id| scene.image(id).map(|image| emitter.emit(id, image)))
                .collect::<Vec<_>>()
        });

        let manifest = instrument_stage("manifest", || -> ExportResult<Manifest> {
            let manifest = Manifest::build(&collected, &materials);
            ManifestWriter::new(manifest_path, options.indent).write(&manifest)?;
            Ok(manifest)
        })?;

        let report = ExportReport {
            manifest_path: manifest_path.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            manifest,
            mesh_results,
            materials,
            texture_results,
            skipped: collected.skipped,
            elapsed: start.elapsed(),
        };

        let failures = report.failures().count();
        if failures > 0 {
            warn!(failures, "Some assets could not be written");
        }
        info!(
            meshes = report.meshes_written(),
            textures = report.textures_written(),
            "Finished export in {:.3} seconds",
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scene_writes_empty_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("empty.spj");

        let report = Exporter::new(ExportOptions::default())
            .export(&Scene::new("empty"), &manifest_path)
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.output_dir, dir.path());
        let text = std::fs::read_to_string(&manifest_path).unwrap();
        assert_eq!(
            text,
            "{\n    \"lights\": [],\n    \"materials\": [],\n    \"meshes\": []\n}"
        );
    }

    #[test]
    fn test_invalid_options_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            max_graph_depth: 0,
            ..Default::default()
        };
        let err = Exporter::new(options)
            .export(&Scene::new("s"), dir.path().join("out").join("a.spj"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_unwritable_output_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = Exporter::new(ExportOptions::default())
            .export_to(&Scene::new("s"), dir.path().join("a.spj"), blocker.join("sub"))
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
