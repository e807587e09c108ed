//! Mesh serialization
//!
//! Each distinct mesh is copied, triangulated and flattened into an unindexed
//! [`VertexBuffer`]. The buffer is built completely in memory before its file
//! is created, so a mesh that fails leaves nothing on disk.

pub mod attributes;
pub mod triangulate;
pub mod vertex_buffer;

use std::path::{Path, PathBuf};

use scenepack_scene::{MeshData, MeshId};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::options::ExportOptions;
use crate::naming::check_file_name;
use crate::{log_asset_failed, log_asset_written};

pub use attributes::CornerAttributes;
pub use triangulate::{ScratchMesh, Triangle};
pub use vertex_buffer::{AttributeFlags, Vertex, VertexBuffer};

/// Outcome of one mesh write
#[derive(Debug)]
pub struct MeshExportResult {
    pub mesh: MeshId,
    pub name: String,
    /// Destination, whether or not it was written
    pub path: PathBuf,
    /// Vertex count on success
    pub status: ExportResult<usize>,
}

impl MeshExportResult {
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn error(&self) -> Option<&ExportError> {
        self.status.as_ref().err()
    }
}

/// Writes vertex buffers into an output directory
#[derive(Debug, Clone)]
pub struct MeshSerializer {
    root: PathBuf,
    extension: String,
}

impl MeshSerializer {
    pub fn new(root: impl Into<PathBuf>, options: &ExportOptions) -> Self {
        Self {
            root: root.into(),
            extension: options.mesh_extension.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name of a mesh's vertex buffer
    pub fn file_name(&self, mesh: &MeshData) -> String {
        format!("{}.{}", mesh.name, self.extension)
    }

    pub fn path_for(&self, mesh: &MeshData) -> PathBuf {
        self.root.join(self.file_name(mesh))
    }

    /// Triangulate a copy of `mesh` and lay out its vertices.
    pub fn build(mesh: &MeshData) -> ExportResult<VertexBuffer> {
        if mesh.active_uv().is_none() {
            return Err(ExportError::MissingChannel {
                mesh: mesh.name.clone(),
                channel: "UV",
            });
        }

        let scratch = ScratchMesh::from_mesh(mesh).map_err(|e| ExportError::InvalidMesh {
            mesh: mesh.name.clone(),
            message: e.to_string(),
        })?;
        let uvs = scratch.uvs.as_deref().unwrap_or_default();
        let attrs = CornerAttributes::compute(&scratch, uvs);

        let mut vertices = Vec::with_capacity(scratch.triangle_count() * 3);
        for (t, tri) in scratch.triangles.iter().enumerate() {
            for (corner, &l) in tri.loops.iter().enumerate() {
                let i = t * 3 + corner;
                vertices.push(Vertex {
                    position: scratch.loop_position(l).to_array(),
                    uv: uvs[l as usize],
                    normal: attrs.normals[i].to_array(),
                    tangent: attrs.tangents[i].to_array(),
                });
            }
        }

        if u32::try_from(vertices.len()).is_err() {
            return Err(ExportError::InvalidMesh {
                mesh: mesh.name.clone(),
                message: format!("{} vertices exceed the format limit", vertices.len()),
            });
        }

        debug!(
            mesh = %mesh.name,
            polygons = mesh.polygon_count(),
            triangles = scratch.triangle_count(),
            "Mesh triangulated"
        );
        Ok(VertexBuffer::new(vertices))
    }

    /// Build and write one mesh. Never panics on bad data; failures land in the result.
    pub fn write(&self, id: MeshId, mesh: &MeshData) -> MeshExportResult {
        let path = self.path_for(mesh);
        let status = check_file_name(&mesh.name)
            .map_err(|message| ExportError::InvalidMesh {
                mesh: mesh.name.clone(),
                message,
            })
            .and_then(|()| Self::build(mesh))
            .and_then(|buffer| {
                let bytes = buffer.to_bytes().map_err(|e| ExportError::asset_io(&path, e))?;
                std::fs::write(&path, bytes).map_err(|e| ExportError::asset_io(&path, e))?;
                Ok(buffer.vertex_count())
            });

        match &status {
            Ok(_) => {
                log_asset_written!("mesh", mesh.name, path);
            }
            Err(e) => {
                log_asset_failed!("mesh", mesh.name, e);
            }
        }

        MeshExportResult {
            mesh: id,
            name: mesh.name.clone(),
            path,
            status,
        }
    }
}
