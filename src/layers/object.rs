use image::{GrayImage, RgbaImage, imageops};

use crate::assets::handle::{ImageHandle, load_rgba, save_png};
use crate::foundation::core::Velocity;
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::geometry::attach::{alpha_mask, find_lowest_opaque_pixel, layer_breakpoints, resolve_parent};
use crate::geometry::engine::Ribbon;
use crate::layers::{LayerKind, LayerLike};
use crate::project::layout::{ProjectDirs, object_prefix};
use crate::video::clip::LayerClip;

/// A salient-object cutout panned with the depth layer it rests on.
///
/// Parent and velocity are fixed by [`ObjectLayer::resolve`] and never change afterwards.
#[derive(Debug)]
pub struct ObjectLayer {
    object: usize,
    prefix: String,
    parent: usize,
    velocity: Velocity,
    lowest_opaque_pixel: (u32, u32),
    cutout: ImageHandle,
    ribbon: Option<Ribbon>,
    mask: Option<GrayImage>,
}

impl ObjectLayer {
    /// Bind cutout `object` (1-based) to its parent layer.
    ///
    /// Returns `Ok(None)` when the cutout is fully transparent: nothing was segmented, so no
    /// layer is created.
    pub fn resolve(
        object: usize,
        cutout: ImageHandle,
        heights: &[u32],
        velocities: &[Velocity],
        source_height: u32,
    ) -> ParallaxResult<Option<Self>> {
        let prefix = object_prefix(object);
        let pixels = cutout.pixels(&prefix)?;
        if pixels.height() != source_height {
            return Err(ParallaxError::geometry(format!(
                "{prefix} cutout is {}px tall, source image is {source_height}px",
                pixels.height()
            )));
        }
        let Some(lowest) = find_lowest_opaque_pixel(pixels) else {
            tracing::info!(object = %prefix, "cutout is fully transparent; object layer skipped");
            return Ok(None);
        };

        let parent = resolve_parent(&layer_breakpoints(heights), lowest);
        let velocity = *velocities.get(parent - 1).ok_or_else(|| {
            ParallaxError::validation(format!("{prefix}: no velocity for parent layer {parent}"))
        })?;
        tracing::debug!(object = %prefix, parent, x = lowest.0, y = lowest.1, "object attached");

        Ok(Some(Self {
            object,
            prefix,
            parent,
            velocity,
            lowest_opaque_pixel: lowest,
            cutout,
            ribbon: None,
            mask: None,
        }))
    }

    /// 1-based index of the layer this object inherits its motion from.
    pub fn parent(&self) -> usize {
        self.parent
    }

    /// Pixel that decided parenthood.
    pub fn lowest_opaque_pixel(&self) -> (u32, u32) {
        self.lowest_opaque_pixel
    }

    pub fn cutout(&self) -> &ImageHandle {
        &self.cutout
    }

    /// Binary mask derived from the ribbon alpha, once built.
    pub fn mask(&self) -> Option<&GrayImage> {
        self.mask.as_ref()
    }

    /// Place the cutout at the left end of a transparent ribbon long enough to pan
    /// `parent_slide` pixels, and save it.
    #[tracing::instrument(skip_all, fields(object = %self.prefix, parent_slide))]
    pub fn build_ribbon(&mut self, parent_slide: u32, dirs: &ProjectDirs) -> ParallaxResult<&Ribbon> {
        let cutout = self.cutout.pixels(&self.prefix)?;
        let (w, h) = cutout.dimensions();
        let mut image = RgbaImage::new(w + parent_slide, h);
        imageops::replace(&mut image, cutout, 0, 0);
        save_png(&image, &dirs.object_ribbon_path(&self.prefix))?;
        Ok(self.set_ribbon(Ribbon {
            image,
            slide_distance: parent_slide,
        }))
    }

    /// Reload a ribbon built by an earlier run.
    pub fn load_ribbon(&mut self, dirs: &ProjectDirs) -> ParallaxResult<&Ribbon> {
        let image = load_rgba(&dirs.object_ribbon_path(&self.prefix), &self.prefix)?;
        let visible = self.visible_width();
        if image.width() < visible {
            return Err(ParallaxError::geometry(format!(
                "{} ribbon is {}px wide, narrower than the {visible}px cutout",
                self.prefix,
                image.width()
            )));
        }
        let slide_distance = image.width() - visible;
        Ok(self.set_ribbon(Ribbon {
            image,
            slide_distance,
        }))
    }

    fn set_ribbon(&mut self, ribbon: Ribbon) -> &Ribbon {
        self.mask = Some(alpha_mask(&ribbon.image));
        self.ribbon.insert(ribbon)
    }
}

impl LayerLike for ObjectLayer {
    fn index(&self) -> usize {
        self.object
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Object {
            parent: self.parent,
        }
    }

    fn velocity(&self) -> Velocity {
        self.velocity
    }

    fn top(&self) -> u32 {
        0
    }

    fn visible_width(&self) -> u32 {
        self.cutout.pixels(&self.prefix).map_or(0, |px| px.width())
    }

    fn ribbon(&self) -> Option<&Ribbon> {
        self.ribbon.as_ref()
    }

    fn clip(&self, duration: f64) -> ParallaxResult<LayerClip> {
        let (Some(ribbon), Some(mask)) = (self.ribbon.as_ref(), self.mask.as_ref()) else {
            return Err(ParallaxError::validation(format!(
                "{} has no stitched ribbon",
                self.prefix
            )));
        };
        LayerClip::new(&self.prefix, ribbon, self.visible_width(), 0, duration)?
            .with_mask(mask.clone())
    }
}

/// Load and resolve cutout `object` from `salient_objects/`.
pub fn load_object_layer(
    dirs: &ProjectDirs,
    object: usize,
    heights: &[u32],
    velocities: &[Velocity],
    source_height: u32,
) -> ParallaxResult<Option<ObjectLayer>> {
    let path = dirs.salient_cutout_path(object);
    if !path.exists() {
        return Err(ParallaxError::missing_asset(path, object_prefix(object)));
    }
    ObjectLayer::resolve(object, ImageHandle::from_path(path), heights, velocities, source_height)
}

#[cfg(test)]
#[path = "../../tests/unit/layers/object.rs"]
mod tests;
