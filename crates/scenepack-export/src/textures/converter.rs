//! Image persistence
//!
//! Copies, re-encodes or encodes a host image into its render format.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat as ImgFormat, ImageReader, RgbaImage};
use scenepack_scene::{Image, ImageFormat, ImageSource};

use crate::textures::{TextureError, TextureResult};

/// How an image reached the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWriteKind {
    /// Source file already in the render format, copied verbatim
    Copied,
    /// Source file decoded and saved in the render format
    Converted,
    /// In-memory pixels encoded
    Encoded,
    /// Destination is the source file itself
    InPlace,
}

/// Map a render format to the `image` crate's format
pub fn to_img_format(format: ImageFormat) -> ImgFormat {
    match format {
        ImageFormat::Png => ImgFormat::Png,
        ImageFormat::Jpeg => ImgFormat::Jpeg,
        ImageFormat::Tga => ImgFormat::Tga,
        ImageFormat::Bmp => ImgFormat::Bmp,
        ImageFormat::Tiff => ImgFormat::Tiff,
        ImageFormat::OpenExr => ImgFormat::OpenExr,
        ImageFormat::Hdr => ImgFormat::Hdr,
    }
}

/// Writes images in their render format
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureConverter;

impl TextureConverter {
    pub fn new() -> Self {
        Self
    }

    /// Persist `image` at `dest`
    pub fn write(&self, image: &Image, dest: &Path) -> TextureResult<TextureWriteKind> {
        let format = image.render_format();

        match &image.source {
            ImageSource::File { path } => {
                if !path.exists() {
                    return Err(TextureError::SourceMissing(path.clone()));
                }
                if same_file(path, dest) {
                    return Ok(TextureWriteKind::InPlace);
                }

                if ImageFormat::from_path(path) == Some(format) {
                    std::fs::copy(path, dest)?;
                    Ok(TextureWriteKind::Copied)
                } else {
                    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
                    self.encode_to_file(decoded, format, dest)?;
                    Ok(TextureWriteKind::Converted)
                }
            }
            ImageSource::Pixels { width, height, rgba } => {
                let expected = *width as usize * *height as usize * 4;
                if *width == 0 || *height == 0 || rgba.len() != expected {
                    return Err(TextureError::InvalidDimensions {
                        width: *width,
                        height: *height,
                        len: rgba.len(),
                    });
                }
                let img = RgbaImage::from_raw(*width, *height, rgba.clone()).ok_or(
                    TextureError::InvalidDimensions {
                        width: *width,
                        height: *height,
                        len: rgba.len(),
                    },
                )?;
                self.encode_to_file(DynamicImage::ImageRgba8(img), format, dest)?;
                Ok(TextureWriteKind::Encoded)
            }
            ImageSource::Generated => Err(TextureError::NoPixels),
        }
    }

    /// Encode in memory, then write, so a failed encode leaves no file behind
    fn encode_to_file(&self, img: DynamicImage, format: ImageFormat, dest: &Path) -> TextureResult<()> {
        let img = prepare_for(img, format);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), to_img_format(format))?;
        std::fs::write(dest, bytes)?;
        Ok(())
    }
}

/// Convert pixel layout to one the target encoder accepts
fn prepare_for(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Png | ImageFormat::Tiff => img,
        ImageFormat::Tga | ImageFormat::Bmp => DynamicImage::ImageRgba8(img.to_rgba8()),
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::OpenExr => DynamicImage::ImageRgba32F(img.to_rgba32f()),
        ImageFormat::Hdr => DynamicImage::ImageRgb32F(img.to_rgb32f()),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Vec<u8> {
        [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255], [255, 255, 255, 128]].concat()
    }

    #[test]
    fn test_encode_pixels_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("checker.png");
        let image = Image::from_pixels("checker.png", 2, 2, checker());

        let kind = TextureConverter::new().write(&image, &dest).unwrap();
        assert_eq!(kind, TextureWriteKind::Encoded);

        let back = image::open(&dest).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (2, 2));
        assert_eq!(back.get_pixel(1, 1).0, [255, 255, 255, 128]);
    }

    #[test]
    fn test_matching_file_is_copied_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.png");
        TextureConverter::new()
            .write(&Image::from_pixels("src.png", 2, 2, checker()), &src)
            .unwrap();

        let dest_dir = dir.path().join("out");
        std::fs::create_dir(&dest_dir).unwrap();
        let dest = dest_dir.join("tex.png");
        let kind = TextureConverter::new()
            .write(&Image::from_file("tex.png", &src), &dest)
            .unwrap();

        assert_eq!(kind, TextureWriteKind::Copied);
        assert_eq!(std::fs::read(&src).unwrap(), std::fs::read(&dest).unwrap());
    }

    #[test]
    fn test_other_format_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.png");
        TextureConverter::new()
            .write(&Image::from_pixels("src.png", 2, 2, checker()), &src)
            .unwrap();

        let dest = dir.path().join("tex.tga");
        let kind = TextureConverter::new()
            .write(&Image::from_file("tex.tga", &src), &dest)
            .unwrap();

        assert_eq!(kind, TextureWriteKind::Converted);
        let back = image::open(&dest).unwrap();
        assert_eq!((back.width(), back.height()), (2, 2));
    }

    #[test]
    fn test_generated_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = Image {
            name: "noise.png".into(),
            format: None,
            source: ImageSource::Generated,
        };
        let dest = dir.path().join("noise.png");
        assert!(matches!(
            TextureConverter::new().write(&image, &dest),
            Err(TextureError::NoPixels)
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_short_pixel_buffer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = Image::from_pixels("bad.png", 4, 4, vec![0; 10]);
        assert!(matches!(
            TextureConverter::new().write(&image, &dir.path().join("bad.png")),
            Err(TextureError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = Image::from_file("gone.png", dir.path().join("missing.png"));
        assert!(matches!(
            TextureConverter::new().write(&image, &dir.path().join("gone.png")),
            Err(TextureError::SourceMissing(_))
        ));
    }
}
