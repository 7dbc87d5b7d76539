//! Project directory, configuration, and the stage driver.

pub mod config;
pub mod layout;
pub mod pipeline;

use std::path::PathBuf;

use image::RgbaImage;

use crate::assets::handle::load_rgba;
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::geometry::engine::LayerGeometryEngine;

use self::config::{ProjectConfig, resolve_path};
use self::layout::ProjectDirs;

/// Read-only view of a project shared by every stage.
pub trait ProjectContext {
    fn dirs(&self) -> &ProjectDirs;
    fn config(&self) -> &ProjectConfig;
    /// Decoded source still.
    fn source_image(&self) -> &RgbaImage;
    /// Authoritative number of extension steps.
    fn total_steps(&self) -> usize;

    /// Geometry engine configured with the project's feathering margin.
    fn engine(&self) -> LayerGeometryEngine {
        LayerGeometryEngine::new(self.config().feathering_margin)
    }

    /// Playback duration shared by every layer clip.
    fn duration_secs(&self) -> f64 {
        self.config().duration_secs(self.total_steps())
    }
}

/// A project loaded from disk.
#[derive(Debug)]
pub struct Project {
    dirs: ProjectDirs,
    config: ProjectConfig,
    source: RgbaImage,
    total_steps: usize,
}

impl Project {
    /// Load `<root>/config.json` and the source image it names.
    pub fn open(root: impl Into<PathBuf>) -> ParallaxResult<Self> {
        let root = root.into();
        let config = ProjectConfig::from_project_dir(&root)?;
        let source_path = resolve_path(&root, &config.input_image_path);
        let source = load_rgba(&source_path, "source")?;
        Self::new(root, config, source)
    }

    /// Assemble a project from parts already in memory.
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig, source: RgbaImage) -> ParallaxResult<Self> {
        config.validate()?;
        if source.width() == 0 || source.height() == 0 {
            return Err(ParallaxError::geometry("source image is empty"));
        }
        let total_steps = config.resolve_total_steps(source.width())?;
        Ok(Self {
            dirs: ProjectDirs::new(root),
            config,
            source,
            total_steps,
        })
    }

    /// Override the step count for this run.
    pub fn with_total_steps(mut self, total_steps: usize) -> ParallaxResult<Self> {
        if total_steps == 0 {
            return Err(ParallaxError::validation("total_steps must be > 0"));
        }
        self.total_steps = total_steps;
        Ok(self)
    }
}

impl ProjectContext for Project {
    fn dirs(&self) -> &ProjectDirs {
        &self.dirs
    }

    fn config(&self) -> &ProjectConfig {
        &self.config
    }

    fn source_image(&self) -> &RgbaImage {
        &self.source
    }

    fn total_steps(&self) -> usize {
        self.total_steps
    }
}
