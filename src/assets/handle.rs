use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;

use crate::foundation::error::{ParallaxError, ParallaxResult};

/// Immutable reference to an image file on disk plus its path parts.
///
/// Pixels are decoded on first access and cached for the lifetime of the handle.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    path: PathBuf,
    filename: String,
    basename: String,
    ext: String,
    pixels: OnceCell<RgbaImage>,
}

impl ImageHandle {
    /// Split `path` into filename/basename/extension without touching the filesystem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (basename, ext) = match filename.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() => (base.to_string(), ext.to_string()),
            _ => (filename.clone(), String::new()),
        };
        Self {
            path,
            filename,
            basename,
            ext,
            pixels: OnceCell::new(),
        }
    }

    /// Wrap already-decoded pixels that were (or will be) written to `path`.
    pub fn with_pixels(path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        let handle = Self::from_path(path);
        let _ = handle.pixels.set(pixels);
        handle
    }

    /// Full path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, e.g. `layer_1_00002_.png`.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Filename without the extension.
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Extension without the dot (empty when absent).
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Directory containing the file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Decoded RGBA8 pixels (straight alpha), loading them on first use.
    pub fn pixels(&self, layer: &str) -> ParallaxResult<&RgbaImage> {
        if let Some(px) = self.pixels.get() {
            return Ok(px);
        }
        let decoded = load_rgba(&self.path, layer)?;
        Ok(self.pixels.get_or_init(|| decoded))
    }

    /// `true` once pixels have been decoded or attached.
    pub fn is_loaded(&self) -> bool {
        self.pixels.get().is_some()
    }
}

/// One output of one extension iteration for one layer.
#[derive(Debug, Clone)]
pub struct StepImage {
    /// 1-based step index; step 1 is the unaltered seed slice.
    pub step_index: usize,
    /// File backing this step.
    pub handle: ImageHandle,
}

/// Decode `path` into straight-alpha RGBA8.
///
/// A missing file is reported as [`ParallaxError::MissingAsset`] attributed to `layer`.
pub fn load_rgba(path: &Path, layer: &str) -> ParallaxResult<RgbaImage> {
    if !path.exists() {
        return Err(ParallaxError::missing_asset(path, layer));
    }
    let img = image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img.to_rgba8())
}

/// Write `img` as PNG, creating parent directories as needed.
pub fn save_png(img: &RgbaImage, path: &Path) -> ParallaxResult<()> {
    ensure_parent_dir(path)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> ParallaxResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/handle.rs"]
mod tests;
