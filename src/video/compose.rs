use image::{GrayImage, RgbaImage};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::foundation::math::over_straight;
use crate::video::clip::LayerClip;
use crate::video::sink::{FrameSink, SinkConfig};

/// Composite every clip at time `t` onto a `canvas`-sized frame filled with `bg`.
///
/// Base clips are drawn first at their band offsets; masked object clips are drawn on top in
/// input order. Pixels falling outside the canvas are dropped.
pub fn compose_frame(clips: &[LayerClip], canvas: Canvas, t: f64, bg: [u8; 4]) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, image::Rgba(bg));
    let (objects, bases): (Vec<&LayerClip>, Vec<&LayerClip>) =
        clips.iter().partition(|c| c.is_masked());
    for clip in bases.into_iter().chain(objects) {
        let frame = clip.frame_at(t);
        let mask = clip.mask_at(t);
        draw_over(&mut out, &frame, mask.as_ref(), clip.top());
    }
    out
}

fn draw_over(dst: &mut RgbaImage, src: &RgbaImage, mask: Option<&GrayImage>, top: u32) {
    let w = src.width().min(dst.width());
    let rows = dst.height().saturating_sub(top).min(src.height());
    for y in 0..rows {
        for x in 0..w {
            let coverage = mask.map_or(255, |m| m.get_pixel(x, y)[0]);
            if coverage == 0 {
                continue;
            }
            let d = dst.get_pixel_mut(x, top + y);
            d.0 = over_straight(d.0, src.get_pixel(x, y).0, coverage);
        }
    }
}

/// Render `duration` seconds of the clip stack into `sink`.
///
/// Pushes `round(duration × fps)` frames; frame `i` samples the clips at `i / fps` seconds.
#[tracing::instrument(skip(clips, sink), fields(clips = clips.len()))]
pub fn render_video(
    clips: &[LayerClip],
    canvas: Canvas,
    fps: Fps,
    duration: f64,
    bg: [u8; 4],
    sink: &mut dyn FrameSink,
) -> ParallaxResult<u64> {
    if clips.is_empty() {
        return Err(ParallaxError::validation("no clips to render"));
    }
    if !(duration.is_finite() && duration > 0.0) {
        return Err(ParallaxError::validation(format!(
            "video duration must be > 0, got {duration}"
        )));
    }
    let frames = fps.secs_to_frames_round(duration);
    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
    })?;
    for idx in 0..frames {
        let t = fps.frame_to_secs(idx);
        let frame = compose_frame(clips, canvas, t, bg);
        sink.push_frame(idx, &frame)?;
    }
    sink.end()?;
    tracing::info!(frames, "video rendered");
    Ok(frames)
}

#[cfg(test)]
#[path = "../../tests/unit/video/compose.rs"]
mod tests;
