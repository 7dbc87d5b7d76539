use image::{RgbaImage, imageops};

use crate::foundation::core::Velocity;
use crate::foundation::error::{ParallaxError, ParallaxResult};

/// One horizontal band of a source image.
#[derive(Clone, Debug)]
pub struct Segment {
    /// First source row covered by this band.
    pub top: u32,
    /// Band pixels, full source width.
    pub image: RgbaImage,
}

impl Segment {
    /// Band height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// One past the last source row covered by this band.
    pub fn bottom(&self) -> u32 {
        self.top + self.image.height()
    }
}

/// A stitched layer image plus the horizontal travel it affords.
#[derive(Clone, Debug)]
pub struct Ribbon {
    /// Stitched pixels.
    pub image: RgbaImage,
    /// Total pan distance in pixels.
    pub slide_distance: u32,
}

/// Pixel-exact slicing, shifting, cropping, and feathered stitching of layer imagery.
///
/// All operations are pure: inputs are borrowed, outputs are freshly allocated buffers.
#[derive(Clone, Copy, Debug)]
pub struct LayerGeometryEngine {
    feathering: u32,
}

impl LayerGeometryEngine {
    /// Create an engine that preserves `feathering` pixels of overlap at every stitch join.
    pub fn new(feathering: u32) -> Self {
        Self { feathering }
    }

    /// Overlap preserved at every join.
    pub fn feathering(&self) -> u32 {
        self.feathering
    }

    /// Partition `image` into contiguous bands by cumulative height.
    ///
    /// The last band absorbs whatever remains below the preceding bands, so the partition
    /// always covers the full image height.
    pub fn slice_original(&self, image: &RgbaImage, heights: &[u32]) -> ParallaxResult<Vec<Segment>> {
        let (width, total) = image.dimensions();
        let Some((_, leading)) = heights.split_last() else {
            return Err(ParallaxError::geometry("at least one layer height is required"));
        };

        let requested: u64 = heights.iter().map(|&h| u64::from(h)).sum();
        if requested > u64::from(total) {
            return Err(ParallaxError::geometry(format!(
                "layer heights sum to {requested}px but the image is only {total}px tall"
            )));
        }
        if let Some(i) = leading.iter().position(|&h| h == 0) {
            return Err(ParallaxError::geometry(format!(
                "layer {} has zero height",
                i + 1
            )));
        }
        let above_last: u32 = leading.iter().sum();
        if above_last >= total {
            return Err(ParallaxError::geometry(format!(
                "no rows left for the last layer ({above_last}px used of {total}px)"
            )));
        }

        let mut out = Vec::with_capacity(heights.len());
        let mut top = 0u32;
        for &h in leading {
            out.push(Segment {
                top,
                image: imageops::crop_imm(image, 0, top, width, h).to_image(),
            });
            top += h;
        }
        out.push(Segment {
            top,
            image: imageops::crop_imm(image, 0, top, width, total - top).to_image(),
        });
        Ok(out)
    }

    /// Build the next seed image by shifting every band by its velocity.
    ///
    /// Each band keeps `width - |vx|` columns on the side opposite to its travel and is pasted
    /// onto a transparent canvas, leaving an empty strip at the trailing edge for the inpainting
    /// service to fill. Only the top band (moving down) or the bottom band (moving up) is cropped
    /// vertically.
    pub fn shift_and_composite(
        &self,
        segments: &[Segment],
        velocities: &[Velocity],
    ) -> ParallaxResult<RgbaImage> {
        if segments.is_empty() {
            return Err(ParallaxError::geometry("no segments to composite"));
        }
        if segments.len() != velocities.len() {
            return Err(ParallaxError::validation(format!(
                "{} segments but {} velocities",
                segments.len(),
                velocities.len()
            )));
        }

        let width = segments[0].image.width();
        let height: u32 = segments.iter().map(Segment::height).sum();
        let last = segments.len() - 1;
        let mut canvas = RgbaImage::new(width, height);

        let mut cursor = 0u32;
        for (i, (seg, v)) in segments.iter().zip(velocities).enumerate() {
            if seg.image.width() != width {
                return Err(ParallaxError::geometry(format!(
                    "segment {} is {}px wide, expected {width}px",
                    i + 1,
                    seg.image.width()
                )));
            }
            let dx = v.abs_x();
            if dx >= width {
                return Err(ParallaxError::geometry(format!(
                    "layer {} horizontal velocity {} leaves no columns in a {width}px image",
                    i + 1,
                    v.x
                )));
            }
            let left = if v.x < 0 { dx } else { 0 };
            let keep_w = width - dx;

            let mut crop_top = 0u32;
            let mut keep_h = seg.height();
            if (i == 0 && v.y > 0) || (i == last && v.y < 0) {
                let dy = v.abs_y();
                if dy >= keep_h {
                    return Err(ParallaxError::geometry(format!(
                        "layer {} vertical velocity {} leaves no rows in a {keep_h}px band",
                        i + 1,
                        v.y
                    )));
                }
                keep_h -= dy;
                if v.y > 0 {
                    crop_top = dy;
                }
            }

            let piece = imageops::crop_imm(&seg.image, left, crop_top, keep_w, keep_h).to_image();
            let dst_x = v.x.max(0);
            let dst_y = i64::from(cursor) + i64::from(v.y.max(0));
            imageops::replace(&mut canvas, &piece, i64::from(dst_x), dst_y);
            cursor += keep_h;
        }

        Ok(canvas)
    }

    /// Extract the freshly generated strip from a step image.
    ///
    /// Returns `None` for a layer without horizontal motion.
    pub fn crop_extension(&self, step: &RgbaImage, velocity_x: i32) -> ParallaxResult<Option<RgbaImage>> {
        if velocity_x == 0 {
            return Ok(None);
        }
        let (width, height) = step.dimensions();
        let strip = velocity_x.unsigned_abs();
        if strip >= width {
            return Err(ParallaxError::geometry(format!(
                "extension width {strip}px is not smaller than the {width}px step image"
            )));
        }
        let x = if velocity_x < 0 { width - strip } else { 0 };
        Ok(Some(imageops::crop_imm(step, x, 0, strip, height).to_image()))
    }

    /// Lay `original` followed by every extension, overlapping each join by the feathering margin.
    pub fn stitch_ribbon(&self, original: &RgbaImage, extensions: &[RgbaImage]) -> ParallaxResult<Ribbon> {
        let f = self.feathering;
        let (orig_w, height) = original.dimensions();
        if !extensions.is_empty() && orig_w <= f {
            return Err(ParallaxError::geometry(format!(
                "original segment width {orig_w}px must exceed the {f}px feathering margin"
            )));
        }
        for (i, ext) in extensions.iter().enumerate() {
            if ext.width() <= f {
                return Err(ParallaxError::geometry(format!(
                    "extension {} is {}px wide, not wider than the {f}px feathering margin",
                    i + 1,
                    ext.width()
                )));
            }
            if ext.height() != height {
                return Err(ParallaxError::geometry(format!(
                    "extension {} is {}px tall, expected {height}px",
                    i + 1,
                    ext.height()
                )));
            }
        }

        let widths: Vec<u32> = extensions.iter().map(RgbaImage::width).collect();
        let width = ribbon_width(orig_w, &widths, f);
        let mut canvas = RgbaImage::new(width, height);
        imageops::replace(&mut canvas, original, 0, 0);

        let mut x = i64::from(orig_w) - i64::from(f);
        let mut slide_distance = 0u32;
        for ext in extensions {
            imageops::replace(&mut canvas, ext, x, 0);
            x += i64::from(ext.width()) - i64::from(f);
            slide_distance += ext.width() - f;
        }

        Ok(Ribbon {
            image: canvas,
            slide_distance,
        })
    }
}

/// Ribbon width for an original of `original_width` joined to extensions of `extension_widths`.
///
/// Every extension adds one join, and every join costs `feathering` pixels.
pub fn ribbon_width(original_width: u32, extension_widths: &[u32], feathering: u32) -> u32 {
    let joins = extension_widths.len() as u32;
    original_width + extension_widths.iter().sum::<u32>() - joins * feathering
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/engine.rs"]
mod tests;
