//! Image decoding from disk or memory.

use std::path::{Path, PathBuf};

use runstamp_common::error::{RunstampError, RunstampResult};
use runstamp_image_model::PixelBuffer;

/// Where an input image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A file on disk; the format is guessed from its contents.
    Path(PathBuf),
    /// An already-read encoded image.
    Bytes(Vec<u8>),
}

impl ImageSource {
    fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

/// The two decoded inputs of a run.
#[derive(Debug, Clone)]
pub struct SourceImages {
    pub background: PixelBuffer,
    pub screenshot: PixelBuffer,
}

/// Decode an encoded image into an RGBA buffer.
pub fn decode_bytes(bytes: &[u8]) -> RunstampResult<PixelBuffer> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| RunstampError::decode(format!("Unsupported or corrupt image: {e}")))?;
    Ok(PixelBuffer::from(img.to_rgba8()))
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> RunstampResult<PixelBuffer> {
    if !path.exists() {
        return Err(RunstampError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes)
        .map_err(|e| RunstampError::decode(format!("{}: {e}", path.display())))
}

/// Decode a single source.
pub fn load_source(source: &ImageSource) -> RunstampResult<PixelBuffer> {
    let buffer = match source {
        ImageSource::Path(path) => load_image(path)?,
        ImageSource::Bytes(bytes) => decode_bytes(bytes)?,
    };
    tracing::debug!(
        source = %source.describe(),
        width = buffer.width(),
        height = buffer.height(),
        "Decoded image"
    );
    Ok(buffer)
}

/// Decode both inputs concurrently on the blocking pool.
///
/// Both decodes always run to completion; the background's error is
/// reported first if both fail.
pub async fn load_sources(
    background: ImageSource,
    screenshot: ImageSource,
) -> RunstampResult<SourceImages> {
    let background_task = tokio::task::spawn_blocking(move || load_source(&background));
    let screenshot_task = tokio::task::spawn_blocking(move || load_source(&screenshot));

    let (background, screenshot) = tokio::join!(background_task, screenshot_task);
    let background = background
        .map_err(|e| RunstampError::decode(format!("Background decode task failed: {e}")))??;
    let screenshot = screenshot
        .map_err(|e| RunstampError::decode(format!("Screenshot decode task failed: {e}")))??;

    Ok(SourceImages {
        background,
        screenshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use runstamp_image_model::Rgba;
    use runstamp_render_engine::encode_png;

    #[test]
    fn decodes_png_bytes() {
        let buf = PixelBuffer::filled(4, 3, Rgba::opaque(9, 8, 7)).unwrap();
        let bytes = encode_png(&buf).unwrap();
        assert_eq!(decode_bytes(&bytes).unwrap(), buf);
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        let err = decode_bytes(b"definitely not an image").unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_image(Path::new("/nonexistent/runstamp/input.png")).unwrap_err();
        assert!(matches!(err, RunstampError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn loads_both_sources() {
        let bg = encode_png(&PixelBuffer::filled(10, 20, Rgba::WHITE).unwrap()).unwrap();
        let shot = encode_png(&PixelBuffer::filled(5, 5, Rgba::BLACK).unwrap()).unwrap();
        let sources = load_sources(bg.into(), shot.into()).await.unwrap();
        assert_eq!(sources.background.width(), 10);
        assert_eq!(sources.screenshot.height(), 5);
    }

    #[tokio::test]
    async fn one_bad_source_fails_the_load() {
        let bg = encode_png(&PixelBuffer::filled(10, 20, Rgba::WHITE).unwrap()).unwrap();
        let err = load_sources(bg.into(), ImageSource::Bytes(vec![1, 2, 3]))
            .await
            .unwrap_err();
        assert!(err.is_decode_failure());
    }
}
