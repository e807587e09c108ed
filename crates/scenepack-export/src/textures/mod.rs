//! Texture emission
//!
//! Writes every distinct referenced image to `<output root>/<image name>`.

mod converter;

pub use converter::{to_img_format, TextureConverter, TextureWriteKind};

use std::path::{Path, PathBuf};

use scenepack_scene::{Image, ImageId};
use thiserror::Error;

use crate::error::{ExportError, ExportResult};
use crate::naming::check_file_name;
use crate::{log_asset_failed, log_asset_written};

/// Texture write errors
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Invalid pixel buffer: {width}x{height} with {len} bytes")]
    InvalidDimensions { width: u32, height: u32, len: usize },

    #[error("Generated image has no pixel data")]
    NoPixels,
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Outcome of one image write
#[derive(Debug)]
pub struct TextureExportResult {
    pub image: ImageId,
    pub name: String,
    pub path: PathBuf,
    pub status: ExportResult<TextureWriteKind>,
}

impl TextureExportResult {
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn error(&self) -> Option<&ExportError> {
        self.status.as_ref().err()
    }
}

/// Persists images into an output directory
#[derive(Debug, Clone)]
pub struct TextureEmitter {
    root: PathBuf,
    converter: TextureConverter,
}

impl TextureEmitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            converter: TextureConverter::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, image: &Image) -> PathBuf {
        self.root.join(&image.name)
    }

    pub fn emit(&self, id: ImageId, image: &Image) -> TextureExportResult {
        let path = self.path_for(image);
        let status = check_file_name(&image.name)
            .and_then(|()| self.converter.write(image, &path).map_err(|e| e.to_string()))
            .map_err(|message| ExportError::TextureWrite {
                image: image.name.clone(),
                message,
            });

        match &status {
            Ok(_) => {
                log_asset_written!("texture", image.name, path);
            }
            Err(e) => {
                log_asset_failed!("texture", image.name, e);
            }
        }

        TextureExportResult {
            image: id,
            name: image.name.clone(),
            path,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenepack_scene::ImageSource;

    #[test]
    fn test_emit_reports_failure_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = TextureEmitter::new(dir.path());
        let image = Image {
            name: "procedural.png".into(),
            format: None,
            source: ImageSource::Generated,
        };

        let result = emitter.emit(ImageId::new(0), &image);
        assert!(!result.is_ok());
        assert!(matches!(result.error(), Some(ExportError::TextureWrite { .. })));
        assert_eq!(result.path, dir.path().join("procedural.png"));
    }

    #[test]
    fn test_name_with_parent_component_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        let emitter = TextureEmitter::new(&root);
        let image = Image::from_pixels("../escaped.png", 1, 1, vec![0, 0, 0, 255]);

        let result = emitter.emit(ImageId::new(0), &image);
        assert!(matches!(result.error(), Some(ExportError::TextureWrite { .. })));
        assert!(!dir.path().join("escaped.png").exists());
    }

    #[test]
    fn test_emit_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = TextureEmitter::new(dir.path());
        let image = Image::from_pixels("tex.png", 1, 1, vec![10, 20, 30, 255]);

        let result = emitter.emit(ImageId::new(5), &image);
        assert_eq!(result.status.as_ref().ok(), Some(&TextureWriteKind::Encoded));
        assert!(dir.path().join("tex.png").exists());
    }
}
