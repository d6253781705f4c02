//! Uploaded files on local disk.

use image::ImageFormat;
use std::path::PathBuf;
use uuid::Uuid;

/// Writes uploads under a media root; stored references are paths relative to it.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the format if `bytes` fully decode as a JPEG or PNG image.
    pub fn sniff_image(bytes: &[u8]) -> Option<ImageFormat> {
        let format = image::guess_format(bytes).ok()?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return None;
        }
        image::load_from_memory_with_format(bytes, format).ok()?;
        Some(format)
    }

    /// Stores a recipe image as `uploads/recipe/<uuid>.<ext>` and returns that path.
    pub async fn save_recipe_image(
        &self,
        bytes: &[u8],
        format: ImageFormat,
    ) -> anyhow::Result<String> {
        let ext = match format {
            ImageFormat::Png => "png",
            _ => "jpg",
        };
        let relative = format!("uploads/recipe/{}.{}", Uuid::new_v4(), ext);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(relative)
    }
}
