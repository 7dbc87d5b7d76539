use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Fps, Velocity};
use crate::foundation::error::{ParallaxError, ParallaxResult};

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Immutable project configuration, loaded once and passed explicitly to every stage.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProjectConfig {
    /// Human name, used for output filenames.
    pub project_name: String,
    /// Source still image (relative paths resolve against the project directory).
    pub input_image_path: PathBuf,
    /// Number of extension iterations; derived from the slowest layer when absent.
    #[serde(default)]
    pub total_steps: Option<usize>,
    /// Playback seconds allotted to each extension step.
    pub seconds_per_step: f64,
    /// Output frame rate.
    pub fps: u32,
    /// Overlap preserved at every stitch join, in pixels.
    #[serde(default = "default_feathering_margin")]
    pub feathering_margin: u32,
    /// Global motion used to derive velocities for layers that omit one.
    #[serde(default)]
    pub motion: Option<MotionConfig>,
    /// Depth bands, top to bottom.
    pub layers: Vec<LayerConfig>,
    /// Tags of segmented salient objects; entry `k` maps to cutout `k + 1`.
    #[serde(default)]
    pub salient_objects: Vec<String>,
    /// Text prepended to the inpainting prompt.
    #[serde(default)]
    pub prompt_prepend: Option<String>,
    /// Inpainting job-graph template.
    #[serde(default)]
    pub workflow_path: Option<PathBuf>,
    /// Inpainting service endpoint and retry budget.
    #[serde(default)]
    pub service: ServiceConfig,
}

/// One depth band.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerConfig {
    /// Band height in pixels; the last band absorbs any remainder.
    pub height: u32,
    /// Explicit per-step velocity `[x, y]` in pixels.
    #[serde(default)]
    pub velocity: Option<[f64; 2]>,
    /// Share of the total scene distance, in `0..=1`.
    #[serde(default)]
    pub distance_ratio: f64,
}

/// Camera motion shared by all layers.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct MotionConfig {
    /// Direction of travel: 0 is right, 90 is up, 180 is left, 270 is down.
    pub direction_degrees: f64,
    /// Base pixels per step before scaling by distance ratio.
    pub smoothness: f64,
}

impl MotionConfig {
    /// Unit direction in image coordinates (y grows downward).
    pub fn direction(&self) -> (f64, f64) {
        let deg = self.direction_degrees.rem_euclid(360.0);
        // Exact axes avoid cos/sin residue such as 6e-17.
        match deg {
            d if d == 0.0 => (1.0, 0.0),
            d if d == 90.0 => (0.0, -1.0),
            d if d == 180.0 => (-1.0, 0.0),
            d if d == 270.0 => (0.0, 1.0),
            d => {
                let theta = d.to_radians();
                (theta.cos(), -theta.sin())
            }
        }
    }

    /// Velocity of a layer at `distance_ratio`.
    pub fn velocity_for(&self, distance_ratio: f64) -> ParallaxResult<Velocity> {
        let (dx, dy) = self.direction();
        let scale = distance_ratio * self.smoothness;
        Velocity::from_f64(dx * scale, dy * scale)
    }
}

/// Endpoint and connect-retry budget of the inpainting service.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Hostname or IP.
    pub host: String,
    /// HTTP/WebSocket port.
    pub port: u16,
    /// Connect attempts before giving up.
    pub max_connect_attempts: u32,
    /// Delay between connect attempts.
    pub retry_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8188,
            max_connect_attempts: 15,
            retry_delay_ms: 1000,
        }
    }
}

fn default_feathering_margin() -> u32 {
    8
}

impl ProjectConfig {
    /// Load `<project_dir>/config.json`.
    pub fn from_project_dir(project_dir: &Path) -> ParallaxResult<Self> {
        Self::from_path(&project_dir.join(CONFIG_FILENAME))
    }

    /// Load and validate a configuration file.
    pub fn from_path(path: &Path) -> ParallaxResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ParallaxError::serde(format!("parse '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write the configuration as pretty JSON.
    pub fn write(&self, path: &Path) -> ParallaxResult<()> {
        let f = File::create(path).with_context(|| format!("create config '{}'", path.display()))?;
        serde_json::to_writer_pretty(f, self)
            .map_err(|e| ParallaxError::serde(format!("write '{}': {e}", path.display())))
    }

    /// Check every field the pipeline relies on.
    pub fn validate(&self) -> ParallaxResult<()> {
        if self.fps == 0 {
            return Err(ParallaxError::validation("fps must be > 0"));
        }
        if !(self.seconds_per_step.is_finite() && self.seconds_per_step > 0.0) {
            return Err(ParallaxError::validation("seconds_per_step must be > 0"));
        }
        if self.layers.is_empty() {
            return Err(ParallaxError::validation("at least one layer is required"));
        }
        if self.total_steps == Some(0) {
            return Err(ParallaxError::validation("total_steps must be > 0 when set"));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            let n = i + 1;
            if layer.height == 0 && n != self.layers.len() {
                return Err(ParallaxError::validation(format!("layer {n} height must be > 0")));
            }
            if !(0.0..=1.0).contains(&layer.distance_ratio) {
                return Err(ParallaxError::validation(format!(
                    "layer {n} distance_ratio must be within 0..=1"
                )));
            }
            if layer.velocity.is_none() && self.motion.is_none() {
                return Err(ParallaxError::validation(format!(
                    "layer {n} has no velocity and the project has no motion block"
                )));
            }
        }
        // Every join overlaps by the feathering margin, so a strip no wider than it adds nothing.
        for (i, v) in self.velocities()?.into_iter().enumerate() {
            if !v.is_static_x() && v.abs_x() <= self.feathering_margin {
                return Err(ParallaxError::geometry(format!(
                    "layer {} horizontal velocity {} must exceed the {}px feathering margin",
                    i + 1,
                    v.x,
                    self.feathering_margin
                )));
            }
        }
        Ok(())
    }

    /// Frame rate as a validated [`Fps`].
    pub fn fps(&self) -> ParallaxResult<Fps> {
        Fps::new(self.fps, 1)
    }

    /// Band heights in configuration order.
    pub fn layer_heights(&self) -> Vec<u32> {
        self.layers.iter().map(|l| l.height).collect()
    }

    /// Whole-pixel velocity of layer `index` (1-based).
    pub fn layer_velocity(&self, index: usize) -> ParallaxResult<Velocity> {
        let layer = index
            .checked_sub(1)
            .and_then(|i| self.layers.get(i))
            .ok_or_else(|| ParallaxError::validation(format!("no layer {index}")))?;
        match (layer.velocity, self.motion) {
            (Some([x, y]), _) => Velocity::from_f64(x, y),
            (None, Some(motion)) => motion.velocity_for(layer.distance_ratio),
            (None, None) => Err(ParallaxError::validation(format!(
                "layer {index} has no velocity"
            ))),
        }
    }

    /// Velocities of all layers in configuration order.
    pub fn velocities(&self) -> ParallaxResult<Vec<Velocity>> {
        (1..=self.layers.len()).map(|i| self.layer_velocity(i)).collect()
    }

    /// Authoritative step count: the configured value, else [`default_steps`].
    pub fn resolve_total_steps(&self, image_width: u32) -> ParallaxResult<usize> {
        match self.total_steps {
            Some(n) => Ok(n),
            None => default_steps(image_width, &self.velocities()?),
        }
    }

    /// Playback duration shared by every layer clip.
    pub fn duration_secs(&self, total_steps: usize) -> f64 {
        total_steps as f64 * self.seconds_per_step
    }
}

/// Steps needed for the slowest moving layer to traverse the full image width.
pub fn default_steps(image_width: u32, velocities: &[Velocity]) -> ParallaxResult<usize> {
    let slowest = velocities
        .iter()
        .filter(|v| !v.is_static_x())
        .map(|v| v.abs_x())
        .min()
        .ok_or_else(|| {
            ParallaxError::validation("cannot derive a step count: no layer moves horizontally")
        })?;
    match (image_width / slowest) as usize {
        0 => Err(ParallaxError::geometry(format!(
            "cannot derive a step count: slowest horizontal velocity {slowest}px exceeds the \
             {image_width}px image width"
        ))),
        n => Ok(n),
    }
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/config.rs"]
mod tests;
