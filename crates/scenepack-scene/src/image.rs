//! Image datablocks referenced by texture nodes

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File format an image renders to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Tga,
    Bmp,
    Tiff,
    #[serde(rename = "OPEN_EXR")]
    OpenExr,
    Hdr,
}

impl ImageFormat {
    /// Canonical file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tga => "tga",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tif",
            ImageFormat::OpenExr => "exr",
            ImageFormat::Hdr => "hdr",
        }
    }

    /// Guess the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "tga" => Some(ImageFormat::Tga),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "exr" => Some(ImageFormat::OpenExr),
            "hdr" => Some(ImageFormat::Hdr),
            _ => None,
        }
    }

    /// Guess the format from a path's extension
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Where an image's pixels come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Backed by a file on disk
    File { path: PathBuf },
    /// Packed RGBA8 pixels held by the host
    Pixels {
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },
    /// Procedurally generated, no pixel buffer available
    Generated,
}

/// An image datablock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Datablock name, also the exported file name
    pub name: String,
    /// Render format; guessed from the name or source path when absent
    #[serde(default)]
    pub format: Option<ImageFormat>,
    pub source: ImageSource,
}

impl Image {
    /// Create an image backed by a file
    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            format: None,
            source: ImageSource::File { path: path.into() },
        }
    }

    /// Create an image from RGBA8 pixels
    pub fn from_pixels(name: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format: None,
            source: ImageSource::Pixels { width, height, rgba },
        }
    }

    /// Format the image is written in: explicit, then the name's extension,
    /// then the source file's extension, then PNG.
    pub fn render_format(&self) -> ImageFormat {
        self.format
            .or_else(|| ImageFormat::from_path(&self.name))
            .or_else(|| match &self.source {
                ImageSource::File { path } => ImageFormat::from_path(path),
                _ => None,
            })
            .unwrap_or(ImageFormat::Png)
    }

}
