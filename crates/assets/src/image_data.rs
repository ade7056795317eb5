use std::path::Path;

use crate::AssetError;

/// Decoded RGBA8 image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Decode any format the `image` crate understands. Grey, RGB and RGBA
    /// sources all come out as RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(source) => AssetError::Io {
                path: path.to_path_buf(),
                source,
            },
            source => AssetError::Image {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::debug!("decoded {} ({width}x{height})", path.display());
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Two-tone checkerboard used when no texture file is configured.
    pub fn checker(width: u32, height: u32, cell: u32) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let c = if ((x / cell) + (y / cell)) % 2 == 0 {
                    200
                } else {
                    90
                };
                pixels.extend_from_slice(&[c, c, c, 255]);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Single opaque white texel, bound where a mesh has no texture.
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }

    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_alternates() {
        let img = ImageData::checker(4, 4, 2);
        assert_eq!(img.byte_size(), 4 * 4 * 4);
        assert_eq!(img.pixels[0], 200);
        // Third texel of the first row is in the next cell.
        assert_eq!(img.pixels[2 * 4], 90);
    }

    #[test]
    fn load_rgb_png_expands_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let img = ImageData::load(&path).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(&img.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ImageData::load("does/not/exist.png").unwrap_err();
        assert!(err.to_string().contains("exist.png"));
    }
}
