use std::path::{Path, PathBuf};

/// Per-layer unshifted slices of the source image.
pub const ORIGINAL_LAYERS_DIR: &str = "original_layers";
/// Seeds, service outputs, and per-layer step slices.
pub const LAYER_OUTPUT_DIR: &str = "layer_outputs";
/// Extension strips cropped out of step slices.
pub const CROPPED_STEPS_DIR: &str = "cropped_steps";
/// Final stitched ribbons.
pub const STITCHED_INPAINT_DIR: &str = "stitched_inpainted";
/// Salient-object RGBA cutouts.
pub const SALIENT_OBJECTS_DIR: &str = "salient_objects";
/// Per-project copies of job-graph templates.
pub const WORKFLOW_DIR: &str = "project_workflows";
/// Final videos.
pub const OUTPUT_VIDEO_DIR: &str = "output";

/// Filename prefix of salient-object cutouts.
pub const SALIENT_OBJECT_ALPHA_LAYER_PREFIX: &str = "salient_object_alpha_layer";
/// Filename prefix of seed images submitted to the service.
pub const SEED_PREFIX: &str = "start_step";
/// Filename prefix the service writes its results under.
pub const SERVICE_OUTPUT_PREFIX: &str = "end_step";
/// Prefix marking cropped extension strips.
pub const CROPPED_PREFIX: &str = "cropped-";

/// Known subpaths of a project directory.
///
/// The directory tree itself is owned by whoever bootstraps the project; this type only names
/// the files each stage reads and writes.
#[derive(Clone, Debug)]
pub struct ProjectDirs {
    root: PathBuf,
}

impl ProjectDirs {
    /// Paths relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `original_layers/`
    pub fn original_layers_dir(&self) -> PathBuf {
        self.root.join(ORIGINAL_LAYERS_DIR)
    }

    /// `layer_outputs/`
    pub fn layer_outputs_dir(&self) -> PathBuf {
        self.root.join(LAYER_OUTPUT_DIR)
    }

    /// `cropped_steps/`
    pub fn cropped_steps_dir(&self) -> PathBuf {
        self.root.join(CROPPED_STEPS_DIR)
    }

    /// `stitched_inpainted/`
    pub fn stitched_dir(&self) -> PathBuf {
        self.root.join(STITCHED_INPAINT_DIR)
    }

    /// `salient_objects/`
    pub fn salient_objects_dir(&self) -> PathBuf {
        self.root.join(SALIENT_OBJECTS_DIR)
    }

    /// `project_workflows/`
    pub fn workflow_dir(&self) -> PathBuf {
        self.root.join(WORKFLOW_DIR)
    }

    /// `output/`
    pub fn output_video_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_VIDEO_DIR)
    }

    /// Unshifted slice of band `index` (1-based).
    pub fn original_layer_path(&self, index: usize) -> PathBuf {
        self.original_layers_dir()
            .join(format!("{index}_original_layer.png"))
    }

    /// Step output `step` of the layer named `prefix`.
    pub fn step_output_path(&self, prefix: &str, step: usize) -> PathBuf {
        self.layer_outputs_dir().join(step_filename(prefix, step))
    }

    /// Seed image submitted for extension step `step`.
    pub fn seed_path(&self, step: usize) -> PathBuf {
        self.layer_outputs_dir()
            .join(step_filename(SEED_PREFIX, step))
    }

    /// Full-frame result the service produces for extension step `step`.
    pub fn service_output_path(&self, step: usize) -> PathBuf {
        self.layer_outputs_dir()
            .join(step_filename(SERVICE_OUTPUT_PREFIX, step))
    }

    /// Directory holding the cropped strips of layer `prefix`.
    pub fn cropped_dir(&self, prefix: &str) -> PathBuf {
        self.cropped_steps_dir()
            .join(format!("{prefix}_cropped_steps"))
    }

    /// Cropped strip of step `step` of layer `prefix`.
    pub fn cropped_path(&self, prefix: &str, step: usize) -> PathBuf {
        self.cropped_dir(prefix)
            .join(format!("{CROPPED_PREFIX}{}", step_filename(prefix, step)))
    }

    /// Stitched ribbon of base layer `prefix`.
    pub fn ribbon_path(&self, prefix: &str) -> PathBuf {
        self.stitched_dir()
            .join(format!("{prefix}_stitched_inpainted_regions.png"))
    }

    /// Stitched ribbon of object layer `prefix`.
    pub fn object_ribbon_path(&self, prefix: &str) -> PathBuf {
        self.stitched_dir()
            .join(format!("{prefix}_stitched_alpha_layer.png"))
    }

    /// Cutout of salient object `object` (1-based).
    pub fn salient_cutout_path(&self, object: usize) -> PathBuf {
        self.salient_objects_dir()
            .join(step_filename(SALIENT_OBJECT_ALPHA_LAYER_PREFIX, object))
    }

    /// Final composited video.
    pub fn output_video_path(&self, project_name: &str) -> PathBuf {
        self.output_video_dir()
            .join(format!("{project_name}-final_parallax_video.mp4"))
    }
}

/// `<prefix>_<step:05d>_.png`
pub fn step_filename(prefix: &str, step: usize) -> String {
    format!("{prefix}_{step:05}_.png")
}

/// Filename prefix of base layer `index` (1-based).
pub fn layer_prefix(index: usize) -> String {
    format!("layer_{index}")
}

/// Filename prefix of object layer `object` (1-based).
pub fn object_prefix(object: usize) -> String {
    format!("object_{object}")
}

#[cfg(test)]
#[path = "../../tests/unit/project/layout.rs"]
mod tests;
