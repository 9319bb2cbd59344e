//! Image artifact capability: encode to a file, decode from one.
//!
//! `DynamicImage` is the artifact the capture layer hands over. It is
//! stored as PNG, so a decoded image is pixel-for-pixel what was queued.

use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Anything the queue can back with a file.
pub trait ImageArtifact: Sized {
    /// Writes the artifact to `path` in a lossless raster format.
    fn encode_to(&self, path: &Path) -> Result<(), ArtifactError>;

    /// Reads back an artifact previously written by [`encode_to`](Self::encode_to).
    fn decode_from(path: &Path) -> Result<Self, ArtifactError>;
}

impl ImageArtifact for DynamicImage {
    fn encode_to(&self, path: &Path) -> Result<(), ArtifactError> {
        let file = File::create(path).map_err(|e| ArtifactError::Io(e.to_string()))?;
        let mut writer = BufWriter::new(file);

        self.write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| ArtifactError::EncodingFailed(e.to_string()))?;

        let file = writer
            .into_inner()
            .map_err(|e| ArtifactError::Io(e.to_string()))?;
        file.sync_all().map_err(|e| ArtifactError::Io(e.to_string()))?;
        Ok(())
    }

    fn decode_from(path: &Path) -> Result<Self, ArtifactError> {
        let mut reader = ImageReader::open(path).map_err(|e| ArtifactError::Io(e.to_string()))?;
        reader.set_format(ImageFormat::Png);
        reader
            .decode()
            .map_err(|e| ArtifactError::DecodingFailed(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact I/O failed: {0}")]
    Io(String),

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),

    #[error("PNG decoding failed: {0}")]
    DecodingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7) as u8, (y * 13) as u8, (x ^ y) as u8, 200])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn png_round_trip_is_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let img = gradient(31, 17);

        img.encode_to(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // PNG magic bytes
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);

        let decoded = DynamicImage::decode_from(&path).unwrap();
        assert_eq!(decoded.width(), 31);
        assert_eq!(decoded.height(), 17);
        assert_eq!(decoded.as_bytes(), img.as_bytes());
    }

    #[test]
    fn decode_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let result = DynamicImage::decode_from(&path);
        assert!(matches!(result, Err(ArtifactError::DecodingFailed(_))));
    }

    #[test]
    fn decode_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DynamicImage::decode_from(&dir.path().join("nope.png"));
        assert!(matches!(result, Err(ArtifactError::Io(_))));
    }

    #[test]
    fn encode_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("shot.png");
        let result = gradient(2, 2).encode_to(&path);
        assert!(matches!(result, Err(ArtifactError::Io(_))));
    }
}
