use image::{GrayImage, RgbaImage, imageops};

use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::geometry::engine::Ribbon;

/// A stitched ribbon turned into a time-indexed panning frame source.
///
/// The visible window slides from `x = 0` to `x = slide_distance` over `duration` seconds.
/// Object clips carry a binary mask sampled with the same window as the pixels.
#[derive(Clone, Debug)]
pub struct LayerClip {
    name: String,
    ribbon: RgbaImage,
    mask: Option<GrayImage>,
    slide_distance: u32,
    duration: f64,
    visible_width: u32,
    top: u32,
}

impl LayerClip {
    /// Build a clip that shows `visible_width` columns of `ribbon`, placed `top` rows down the canvas.
    pub fn new(
        name: impl Into<String>,
        ribbon: &Ribbon,
        visible_width: u32,
        top: u32,
        duration: f64,
    ) -> ParallaxResult<Self> {
        let name = name.into();
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ParallaxError::validation(format!(
                "clip '{name}' duration must be > 0, got {duration}"
            )));
        }
        if visible_width == 0 {
            return Err(ParallaxError::validation(format!(
                "clip '{name}' visible width must be > 0"
            )));
        }
        let needed = u64::from(visible_width) + u64::from(ribbon.slide_distance);
        if u64::from(ribbon.image.width()) < needed {
            return Err(ParallaxError::geometry(format!(
                "clip '{name}' ribbon is {}px wide but the pan needs {needed}px",
                ribbon.image.width()
            )));
        }
        Ok(Self {
            name,
            ribbon: ribbon.image.clone(),
            mask: None,
            slide_distance: ribbon.slide_distance,
            duration,
            visible_width,
            top,
        })
    }

    /// Attach a binary mask; it must match the ribbon dimensions.
    pub fn with_mask(mut self, mask: GrayImage) -> ParallaxResult<Self> {
        if mask.dimensions() != self.ribbon.dimensions() {
            return Err(ParallaxError::geometry(format!(
                "clip '{}' mask is {:?}, ribbon is {:?}",
                self.name,
                mask.dimensions(),
                self.ribbon.dimensions()
            )));
        }
        self.mask = Some(mask);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn height(&self) -> u32 {
        self.ribbon.height()
    }

    pub fn visible_width(&self) -> u32 {
        self.visible_width
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn slide_distance(&self) -> u32 {
        self.slide_distance
    }

    /// `true` for object clips drawn through a mask.
    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Left edge of the visible window at time `t` (seconds, clamped to `[0, duration]`).
    pub fn pan_offset(&self, t: f64) -> u32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, self.duration) };
        let x = (f64::from(self.slide_distance) * t / self.duration).round();
        (x as u32).min(self.slide_distance)
    }

    /// Visible pixels at time `t`.
    pub fn frame_at(&self, t: f64) -> RgbaImage {
        let x = self.pan_offset(t);
        imageops::crop_imm(&self.ribbon, x, 0, self.visible_width, self.ribbon.height()).to_image()
    }

    /// Visible mask at time `t`, for masked clips.
    pub fn mask_at(&self, t: f64) -> Option<GrayImage> {
        let mask = self.mask.as_ref()?;
        let x = self.pan_offset(t);
        Some(imageops::crop_imm(mask, x, 0, self.visible_width, mask.height()).to_image())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/clip.rs"]
mod tests;
