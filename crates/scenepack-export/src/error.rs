//! Export pipeline errors
//!
//! Only [`ExportError::FatalIo`] and [`ExportError::Serialization`] abort a
//! run. The other variants are reported per asset in the export report.

use std::path::PathBuf;
use thiserror::Error;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// Output directory or manifest cannot be written
    #[error("Cannot write {path}: {source}")]
    FatalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object excluded from the export
    #[error("Skipped object '{object}': {reason}")]
    SkippedInstance { object: String, reason: String },

    /// Mesh lacks a required attribute layer
    #[error("Mesh '{mesh}' has no {channel} layer")]
    MissingChannel { mesh: String, channel: &'static str },

    /// Mesh data that cannot be serialized
    #[error("Invalid mesh '{mesh}': {message}")]
    InvalidMesh { mesh: String, message: String },

    /// Per-asset file write failure
    #[error("I/O error writing {path}: {source}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image could not be persisted
    #[error("Cannot write texture '{image}': {message}")]
    TextureWrite { image: String, message: String },

    /// Vertex buffer decode failure
    #[error("Vertex buffer error: {0}")]
    Codec(#[from] scenepack_core::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

impl ExportError {
    pub fn fatal_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::FatalIo {
            path: path.into(),
            source,
        }
    }

    pub fn asset_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::AssetIo {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole export
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExportError::FatalIo { .. } | ExportError::Serialization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(ExportError::fatal_io("/out", io).is_fatal());

        let missing = ExportError::MissingChannel {
            mesh: "Cube".into(),
            channel: "UV",
        };
        assert!(!missing.is_fatal());
        assert_eq!(missing.to_string(), "Mesh 'Cube' has no UV layer");
    }
}
