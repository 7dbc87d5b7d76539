use image::RgbaImage;

use crate::assets::handle::{ImageHandle, StepImage, load_rgba, save_png};
use crate::foundation::core::Velocity;
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::geometry::engine::{LayerGeometryEngine, Ribbon, Segment};
use crate::layers::{LayerKind, LayerLike};
use crate::project::layout::{ProjectDirs, layer_prefix};

/// One horizontal depth band and everything produced for it.
///
/// `step_outputs` grows append-only: step `s` can only be recorded after step `s - 1`.
#[derive(Debug)]
pub struct BaseLayer {
    index: usize,
    prefix: String,
    top: u32,
    height: u32,
    velocity: Velocity,
    total_steps: usize,
    original: ImageHandle,
    step_outputs: Vec<StepImage>,
    ribbon: Option<Ribbon>,
}

impl BaseLayer {
    /// Wrap the unshifted band `segment` of layer `index` (1-based).
    pub fn new(
        index: usize,
        segment: Segment,
        velocity: Velocity,
        total_steps: usize,
        dirs: &ProjectDirs,
    ) -> Self {
        let height = segment.height();
        Self {
            index,
            prefix: layer_prefix(index),
            top: segment.top,
            height,
            velocity,
            total_steps,
            original: ImageHandle::with_pixels(dirs.original_layer_path(index), segment.image),
            step_outputs: Vec::new(),
            ribbon: None,
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Unshifted slice of the source image.
    pub fn original(&self) -> &ImageHandle {
        &self.original
    }

    /// Recorded step images, ordered by step index.
    pub fn step_outputs(&self) -> &[StepImage] {
        &self.step_outputs
    }

    /// Slide distance of the stitched ribbon, once built.
    pub fn slide_distance(&self) -> Option<u32> {
        self.ribbon.as_ref().map(|r| r.slide_distance)
    }

    /// Persist the unshifted slice under `original_layers/`.
    pub fn save_original(&self) -> ParallaxResult<()> {
        save_png(self.original.pixels(&self.prefix)?, self.original.path())
    }

    /// Append the next step image.
    pub fn push_step(&mut self, step: StepImage) -> ParallaxResult<()> {
        let expected = self.step_outputs.len() + 1;
        if step.step_index != expected {
            return Err(ParallaxError::validation(format!(
                "{}: step {} recorded out of order (expected {expected})",
                self.prefix, step.step_index
            )));
        }
        self.step_outputs.push(step);
        Ok(())
    }

    /// Save `slice` as step `step` of this layer and record it.
    pub fn record_step(&mut self, dirs: &ProjectDirs, step: usize, slice: RgbaImage) -> ParallaxResult<()> {
        let path = dirs.step_output_path(&self.prefix, step);
        save_png(&slice, &path)?;
        self.push_step(StepImage {
            step_index: step,
            handle: ImageHandle::with_pixels(path, slice),
        })
    }

    /// Discover step images already on disk.
    ///
    /// Expects exactly steps `1..=total_steps + 1`: a gap is a missing asset and files beyond the
    /// last expected step are a step-count mismatch.
    pub fn collect_step_outputs(&mut self, dirs: &ProjectDirs) -> ParallaxResult<()> {
        let last = self.total_steps + 1;
        for step in self.step_outputs.len() + 1..=last {
            let path = dirs.step_output_path(&self.prefix, step);
            if !path.exists() {
                return Err(ParallaxError::missing_asset(path, &self.prefix));
            }
            self.push_step(StepImage {
                step_index: step,
                handle: ImageHandle::from_path(path),
            })?;
        }
        let found = (last + 1..)
            .take_while(|&s| dirs.step_output_path(&self.prefix, s).exists())
            .last()
            .unwrap_or(last);
        if found != last {
            return Err(ParallaxError::StepCountMismatch {
                layer: self.prefix.clone(),
                expected: last,
                found,
            });
        }
        Ok(())
    }

    /// Crop the generated strip out of every step after the first and save it under
    /// `cropped_steps/`.
    pub fn create_cropped_steps(
        &self,
        engine: &LayerGeometryEngine,
        dirs: &ProjectDirs,
    ) -> ParallaxResult<Vec<RgbaImage>> {
        if self.step_outputs.len() != self.total_steps + 1 {
            return Err(ParallaxError::missing_asset(
                dirs.step_output_path(&self.prefix, self.step_outputs.len() + 1),
                &self.prefix,
            ));
        }
        let mut out = Vec::with_capacity(self.total_steps);
        for step in self.step_outputs.iter().skip(1) {
            let pixels = step.handle.pixels(&self.prefix)?;
            if pixels.height() != self.height {
                return Err(ParallaxError::geometry(format!(
                    "{} step {} is {}px tall, expected {}px",
                    self.prefix,
                    step.step_index,
                    pixels.height(),
                    self.height
                )));
            }
            let Some(strip) = engine.crop_extension(pixels, self.velocity.x)? else {
                break;
            };
            save_png(&strip, &dirs.cropped_path(&self.prefix, step.step_index))?;
            out.push(strip);
        }
        Ok(out)
    }

    /// Crop, stitch, and save this layer's ribbon.
    #[tracing::instrument(skip_all, fields(layer = %self.prefix))]
    pub fn stitch(&mut self, engine: &LayerGeometryEngine, dirs: &ProjectDirs) -> ParallaxResult<&Ribbon> {
        let extensions = self.create_cropped_steps(engine, dirs)?;
        let original = self.original.pixels(&self.prefix)?;
        let ribbon = engine.stitch_ribbon(original, &extensions)?;
        save_png(&ribbon.image, &dirs.ribbon_path(&self.prefix))?;
        tracing::info!(
            width = ribbon.image.width(),
            slide_distance = ribbon.slide_distance,
            "ribbon stitched"
        );
        Ok(self.ribbon.insert(ribbon))
    }

    /// Reload a ribbon stitched by an earlier run.
    ///
    /// The slide distance is whatever the ribbon affords beyond the visible width.
    pub fn load_ribbon(&mut self, dirs: &ProjectDirs) -> ParallaxResult<&Ribbon> {
        let image = load_rgba(&dirs.ribbon_path(&self.prefix), &self.prefix)?;
        let visible = self.visible_width();
        if image.width() < visible || image.height() != self.height {
            return Err(ParallaxError::geometry(format!(
                "{} ribbon is {}x{}, expected at least {visible}x{}",
                self.prefix,
                image.width(),
                image.height(),
                self.height
            )));
        }
        let slide_distance = image.width() - visible;
        Ok(self.ribbon.insert(Ribbon {
            image,
            slide_distance,
        }))
    }
}

impl LayerLike for BaseLayer {
    fn index(&self) -> usize {
        self.index
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Base
    }

    fn velocity(&self) -> Velocity {
        self.velocity
    }

    fn top(&self) -> u32 {
        self.top
    }

    fn visible_width(&self) -> u32 {
        self.original
            .pixels(&self.prefix)
            .map_or(0, |px| px.width())
    }

    fn ribbon(&self) -> Option<&Ribbon> {
        self.ribbon.as_ref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/base.rs"]
mod tests;
