//! Stage driver: slice -> extend -> stitch -> clips -> video.
//!
//! Each stage reads what the previous one left on disk, so stages can also be run one at a time.

use crate::extend::orchestrator::ExtensionLoop;
use crate::extend::progress::ProgressSink;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::layers::object::load_object_layer;
use crate::layers::{BaseLayer, LayerLike, ObjectLayer};
use crate::project::ProjectContext;
use crate::project::config::resolve_path;
use crate::project::layout::object_prefix;
use crate::service::client::InpaintService;
use crate::service::workflow::Workflow;
use crate::video::clip::LayerClip;
use crate::video::compose::render_video;
use crate::video::sink::FrameSink;

/// Background behind transparent pixels in the final video.
pub const BACKGROUND_RGBA: [u8; 4] = [0, 0, 0, 255];

/// Items a stage produced plus the per-layer failures it tolerated.
#[derive(Debug)]
pub struct StageReport<T> {
    pub items: Vec<T>,
    pub failures: Vec<ParallaxError>,
}

impl<T> Default for StageReport<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> StageReport<T> {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Slice the source into base layers and save each unshifted band under `original_layers/`.
#[tracing::instrument(skip_all)]
pub fn build_base_layers(ctx: &dyn ProjectContext) -> ParallaxResult<Vec<BaseLayer>> {
    let cfg = ctx.config();
    let segments = ctx
        .engine()
        .slice_original(ctx.source_image(), &cfg.layer_heights())?;
    let velocities = cfg.velocities()?;
    let mut layers = Vec::with_capacity(segments.len());
    for (i, (segment, velocity)) in segments.into_iter().zip(velocities).enumerate() {
        let layer = BaseLayer::new(i + 1, segment, velocity, ctx.total_steps(), ctx.dirs());
        layer.save_original()?;
        tracing::debug!(layer = i + 1, top = layer.top(), height = layer.height(), ?velocity, "layer sliced");
        layers.push(layer);
    }
    tracing::info!(layers = layers.len(), "source sliced");
    Ok(layers)
}

/// Resolve every configured salient object; transparent cutouts are dropped silently.
#[tracing::instrument(skip_all)]
pub fn resolve_object_layers(ctx: &dyn ProjectContext) -> StageReport<ObjectLayer> {
    let cfg = ctx.config();
    let mut report = StageReport::default();
    let velocities = match cfg.velocities() {
        Ok(v) => v,
        Err(e) => {
            report.failures.push(e);
            return report;
        }
    };
    let heights = cfg.layer_heights();
    let source_height = ctx.source_image().height();
    for (k, tag) in cfg.salient_objects.iter().enumerate() {
        let object = k + 1;
        match load_object_layer(ctx.dirs(), object, &heights, &velocities, source_height) {
            Ok(Some(layer)) => {
                tracing::info!(object, tag = %tag, parent = layer.parent(), "object layer resolved");
                report.items.push(layer);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(object, tag = %tag, "object layer failed: {e}");
                report.failures.push(e.in_layer(object_prefix(object)));
            }
        }
    }
    report
}

/// Job-graph template: the configured file, else the built-in one.
pub fn load_template(ctx: &dyn ProjectContext) -> ParallaxResult<Workflow> {
    match &ctx.config().workflow_path {
        Some(path) => Workflow::load(&resolve_path(ctx.dirs().root(), path)),
        None => Workflow::builtin(),
    }
}

/// Run every extension step; returns how many jobs were submitted.
///
/// On failure everything ingested so far stays on disk for the next run to resume from.
pub fn run_extension<S: InpaintService>(
    ctx: &dyn ProjectContext,
    layers: &mut [BaseLayer],
    service: S,
    template: Workflow,
    progress: &mut dyn ProgressSink,
) -> ParallaxResult<usize> {
    let mut looper = ExtensionLoop::new(service, template);
    looper.run(ctx, layers, progress)?;
    Ok(looper.submissions())
}

/// Stitch every base layer, then build object ribbons from their parents' slide distances.
///
/// Geometry and asset failures are confined to the layer they occur in.
#[tracing::instrument(skip_all)]
pub fn stitch_layers(
    ctx: &dyn ProjectContext,
    base: &mut [BaseLayer],
    objects: &mut [ObjectLayer],
) -> StageReport<String> {
    let engine = ctx.engine();
    let dirs = ctx.dirs();
    let mut report = StageReport::default();

    for layer in base.iter_mut() {
        let prefix = layer.prefix().to_string();
        let result = if layer.step_outputs().is_empty() {
            layer.collect_step_outputs(dirs)
        } else {
            Ok(())
        }
        .and_then(|()| layer.stitch(&engine, dirs).map(|_| ()));
        match result {
            Ok(()) => report.items.push(prefix),
            Err(e) => {
                tracing::warn!(layer = %prefix, "stitch failed: {e}");
                report.failures.push(e.in_layer(prefix));
            }
        }
    }

    for object in objects.iter_mut() {
        let prefix = object.prefix().to_string();
        let parent_slide = base
            .get(object.parent() - 1)
            .and_then(BaseLayer::slide_distance)
            .ok_or_else(|| {
                ParallaxError::validation(format!("parent layer {} has no ribbon", object.parent()))
            });
        match parent_slide.and_then(|slide| object.build_ribbon(slide, dirs).map(|_| ())) {
            Ok(()) => report.items.push(prefix),
            Err(e) => {
                tracing::warn!(layer = %prefix, "object ribbon failed: {e}");
                report.failures.push(e.in_layer(prefix));
            }
        }
    }
    report
}

/// Reload ribbons stitched by an earlier run.
pub fn load_ribbons(
    ctx: &dyn ProjectContext,
    base: &mut [BaseLayer],
    objects: &mut [ObjectLayer],
) -> StageReport<String> {
    let dirs = ctx.dirs();
    let mut report = StageReport::default();
    for layer in base.iter_mut() {
        let prefix = layer.prefix().to_string();
        match layer.load_ribbon(dirs) {
            Ok(_) => report.items.push(prefix),
            Err(e) => report.failures.push(e.in_layer(prefix)),
        }
    }
    for object in objects.iter_mut() {
        let prefix = object.prefix().to_string();
        match object.load_ribbon(dirs) {
            Ok(_) => report.items.push(prefix),
            Err(e) => report.failures.push(e.in_layer(prefix)),
        }
    }
    report
}

/// One panning clip per layer that has a ribbon; layers without one are skipped.
pub fn build_clips(ctx: &dyn ProjectContext, layers: &[Box<dyn LayerLike>]) -> ParallaxResult<Vec<LayerClip>> {
    let duration = ctx.duration_secs();
    let mut clips = Vec::with_capacity(layers.len());
    for layer in layers {
        if layer.ribbon().is_none() {
            tracing::debug!(layer = layer.prefix(), "no ribbon; clip skipped");
            continue;
        }
        clips.push(layer.clip(duration)?);
    }
    Ok(clips)
}

/// Output canvas: the source size, trimmed to even dimensions for yuv420p.
pub fn output_canvas(ctx: &dyn ProjectContext) -> Canvas {
    let (w, h) = ctx.source_image().dimensions();
    Canvas {
        width: (w & !1).max(2),
        height: (h & !1).max(2),
    }
}

/// Composite `clips` into `sink` at the project frame rate; returns the frame count.
pub fn render(ctx: &dyn ProjectContext, clips: &[LayerClip], sink: &mut dyn FrameSink) -> ParallaxResult<u64> {
    let fps = ctx.config().fps()?;
    render_video(
        clips,
        output_canvas(ctx),
        fps,
        ctx.duration_secs(),
        BACKGROUND_RGBA,
        sink,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/project/pipeline.rs"]
mod tests;
