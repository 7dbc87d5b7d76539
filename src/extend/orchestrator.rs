use image::RgbaImage;

use crate::assets::handle::{load_rgba, save_png};
use crate::extend::progress::ProgressSink;
use crate::foundation::core::Velocity;
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::geometry::engine::{LayerGeometryEngine, Segment};
use crate::layers::{BaseLayer, LayerLike};
use crate::project::ProjectContext;
use crate::project::layout::SERVICE_OUTPUT_PREFIX;
use crate::service::client::InpaintService;
use crate::service::workflow::Workflow;

/// Progress of one extension run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IterationState {
    /// Connect attempts used by the most recent submission.
    pub attempt: u32,
    /// Step in flight, or the last one finished.
    pub current_step: usize,
    pub max_steps: usize,
    /// Correlator of the most recent submitted job.
    pub completion_token: Option<String>,
}

impl IterationState {
    /// Last step whose outputs were fully ingested.
    pub fn last_completed(&self) -> usize {
        self.current_step.saturating_sub(1)
    }
}

/// Drives shift -> submit -> ingest for every extension step.
///
/// A step whose service output already exists on disk is ingested without resubmitting, so an
/// interrupted run resumes where it stopped.
pub struct ExtensionLoop<S> {
    service: S,
    template: Workflow,
    state: IterationState,
    submissions: usize,
}

impl<S: InpaintService> ExtensionLoop<S> {
    pub fn new(service: S, template: Workflow) -> Self {
        Self {
            service,
            template,
            state: IterationState::default(),
            submissions: 0,
        }
    }

    pub fn state(&self) -> &IterationState {
        &self.state
    }

    /// Jobs actually sent to the service during this run.
    pub fn submissions(&self) -> usize {
        self.submissions
    }

    pub fn into_service(self) -> S {
        self.service
    }

    /// Run every step for `layers`, which must be freshly built from the source image.
    #[tracing::instrument(skip_all, fields(steps = ctx.total_steps(), layers = layers.len()))]
    pub fn run(
        &mut self,
        ctx: &dyn ProjectContext,
        layers: &mut [BaseLayer],
        progress: &mut dyn ProgressSink,
    ) -> ParallaxResult<()> {
        let total = ctx.total_steps();
        let bands = Bands {
            engine: ctx.engine(),
            heights: layers.iter().map(BaseLayer::height).collect(),
            velocities: layers.iter().map(LayerLike::velocity).collect(),
        };
        self.state = IterationState {
            max_steps: total,
            ..IterationState::default()
        };

        let mut segments = bands.slice(ctx.source_image())?;
        ingest(ctx, layers, 1, &segments)?;

        for step in 1..=total {
            self.state.current_step = step;
            segments = self
                .iterate(ctx, &bands, step, &segments, layers, progress)
                .map_err(|e| {
                    let err = e.at_step(step, step - 1);
                    tracing::error!(step, last_completed = step - 1, "extension aborted: {err}");
                    err
                })?;
            progress.on_step_done(step, total);
        }
        tracing::info!(submissions = self.submissions, "extension loop complete");
        Ok(())
    }

    fn iterate(
        &mut self,
        ctx: &dyn ProjectContext,
        bands: &Bands,
        step: usize,
        segments: &[Segment],
        layers: &mut [BaseLayer],
        progress: &mut dyn ProgressSink,
    ) -> ParallaxResult<Vec<Segment>> {
        let dirs = ctx.dirs();
        let output_path = dirs.service_output_path(step);

        if output_path.exists() {
            tracing::debug!(step, "service output already present; skipping submission");
        } else {
            let seed = bands.engine.shift_and_composite(segments, &bands.velocities)?;
            let seed_path = dirs.seed_path(step);
            save_png(&seed, &seed_path)?;
            let seed_name = seed_path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let workflow = self.step_workflow(ctx, &seed_name)?;
            let copy_name = workflow.project_copy_filename(&ctx.config().project_name);
            workflow.save(&dirs.workflow_dir().join(copy_name))?;

            let outcome = self.service.run_job(&workflow, progress)?;
            self.submissions += 1;
            self.state.attempt = outcome.connect_attempts;
            self.state.completion_token = Some(outcome.job_id);
        }

        let output = load_rgba(&output_path, SERVICE_OUTPUT_PREFIX)?;
        check_output_dims(&output, ctx.source_image(), step)?;
        let next = bands.slice(&output)?;
        ingest(ctx, layers, step + 1, &next)?;
        Ok(next)
    }

    /// The template with this step's seed and the project's mask and prompt settings applied.
    fn step_workflow(&self, ctx: &dyn ProjectContext, seed_name: &str) -> ParallaxResult<Workflow> {
        let cfg = ctx.config();
        let f = cfg.feathering_margin;
        let mut wf = self.template.clone();
        wf.set_input("LoadImage", "image", seed_name)?;
        wf.set_input_if_present("SaveImage", "filename_prefix", SERVICE_OUTPUT_PREFIX)?;
        wf.set_input_if_present("GrowMaskWithBlur", "expand", mask_expand(f))?;
        wf.set_input_if_present("GrowMaskWithBlur", "blur_radius", f64::from(f) / 4.0)?;
        if let Some(prompt) = cfg.prompt_prepend.as_deref() {
            wf.set_input_if_present("ImpactWildcardProcessor", "wildcard_text", prompt)?;
        }
        Ok(wf)
    }
}

/// Per-run band layout shared by every step.
struct Bands {
    engine: LayerGeometryEngine,
    heights: Vec<u32>,
    velocities: Vec<Velocity>,
}

impl Bands {
    fn slice(&self, image: &RgbaImage) -> ParallaxResult<Vec<Segment>> {
        self.engine.slice_original(image, &self.heights)
    }
}

/// Mask growth that covers the feathered seam: `trunc(1.85 × feathering)`.
pub fn mask_expand(feathering: u32) -> u64 {
    (f64::from(feathering) * 1.85) as u64
}

fn ingest(
    ctx: &dyn ProjectContext,
    layers: &mut [BaseLayer],
    step: usize,
    segments: &[Segment],
) -> ParallaxResult<()> {
    for (layer, seg) in layers.iter_mut().zip(segments) {
        layer.record_step(ctx.dirs(), step, seg.image.clone())?;
    }
    Ok(())
}

fn check_output_dims(output: &RgbaImage, source: &RgbaImage, step: usize) -> ParallaxResult<()> {
    if output.dimensions() != source.dimensions() {
        return Err(ParallaxError::geometry(format!(
            "service output for step {step} is {:?}, source is {:?}",
            output.dimensions(),
            source.dimensions()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/extend/orchestrator.rs"]
mod tests;
