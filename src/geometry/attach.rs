//! Binding of salient-object cutouts to the depth layer they visually rest on.
//!
//! An object that spans several bands is panned with the band containing its lowest visible
//! pixel: whatever an object stands on determines how far away it is.

use image::{GrayImage, Luma, RgbaImage};

/// Cumulative band boundaries, excluding the bottom of the last band.
pub fn layer_breakpoints(heights: &[u32]) -> Vec<u32> {
    let Some((_, leading)) = heights.split_last() else {
        return Vec::new();
    };
    leading
        .iter()
        .scan(0u32, |acc, &h| {
            *acc += h;
            Some(*acc)
        })
        .collect()
}

/// Deepest non-transparent pixel of `cutout`, scanning rows bottom-up and left-to-right.
///
/// `None` means nothing was segmented and the object layer must not be created.
pub fn find_lowest_opaque_pixel(cutout: &RgbaImage) -> Option<(u32, u32)> {
    let (width, height) = cutout.dimensions();
    (0..height)
        .rev()
        .find_map(|y| (0..width).find(|&x| cutout.get_pixel(x, y)[3] != 0).map(|x| (x, y)))
}

/// 1-based index of the layer owning `pixel`.
///
/// The owner is the first layer whose breakpoint lies strictly below the pixel; a pixel on a
/// boundary row belongs to the deeper layer. Falls back to the last layer.
pub fn resolve_parent(breakpoints: &[u32], pixel: (u32, u32)) -> usize {
    let (_, y) = pixel;
    breakpoints
        .iter()
        .position(|&bp| y < bp)
        .map_or(breakpoints.len() + 1, |i| i + 1)
}

/// Binary mask of the cutout's visible region (alpha > 0 maps to 255).
pub fn alpha_mask(rgba: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        if rgba.get_pixel(x, y)[3] > 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/attach.rs"]
mod tests;
