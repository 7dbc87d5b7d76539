use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parallax::project::pipeline::{self, StageReport};
use parallax::{
    BaseLayer, ComfyTransport, FfmpegSink, FfmpegSinkOpts, InpaintingServiceClient, ObjectLayer,
    Project, ProjectContext, RetryPolicy, TracingProgress,
};

#[derive(Parser, Debug)]
#[command(name = "parallax", version)]
struct Cli {
    /// Project directory containing `config.json`.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Slice the source image into depth layers.
    Slice,
    /// Extend every layer sideways through the inpainting service.
    Extend(StepArgs),
    /// Stitch extended layers and object cutouts into ribbons.
    Stitch,
    /// Render the stitched ribbons into an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Slice, extend, stitch, and render in one go.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct StepArgs {
    /// Override the configured number of extension steps.
    #[arg(long)]
    steps: Option<usize>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Output MP4 path (default: `output/<project>-final_parallax_video.mp4`).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    steps: StepArgs,

    #[command(flatten)]
    render: RenderArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Slice => cmd_slice(open(&cli.project, None)?),
        Command::Extend(args) => cmd_extend(&open(&cli.project, args.steps)?).map(|_| ()),
        Command::Stitch => cmd_stitch(&open(&cli.project, None)?),
        Command::Render(args) => cmd_render(&open(&cli.project, None)?, args),
        Command::Run(args) => {
            let project = open(&cli.project, args.steps.steps)?;
            let mut base = cmd_extend(&project)?;
            let mut objects = pipeline::resolve_object_layers(&project).items;
            let report = pipeline::stitch_layers(&project, &mut base, &mut objects);
            check_report("stitch", &report)?;
            render_layers(&project, base, objects, args.render.out)
        }
    }
}

fn open(root: &Path, steps: Option<usize>) -> anyhow::Result<Project> {
    let project = Project::open(root).with_context(|| format!("open project '{}'", root.display()))?;
    Ok(match steps {
        Some(n) => project.with_total_steps(n)?,
        None => project,
    })
}

fn cmd_slice(project: Project) -> anyhow::Result<()> {
    let layers = pipeline::build_base_layers(&project)?;
    let objects = pipeline::resolve_object_layers(&project);
    for e in &objects.failures {
        eprintln!("warning: {e}");
    }
    eprintln!(
        "wrote {} layers to {} ({} object layers)",
        layers.len(),
        project.dirs().original_layers_dir().display(),
        objects.items.len()
    );
    Ok(())
}

fn cmd_extend(project: &Project) -> anyhow::Result<Vec<BaseLayer>> {
    let mut layers = pipeline::build_base_layers(project)?;
    let template = pipeline::load_template(project)?;
    let cfg = &project.config().service;
    let client = InpaintingServiceClient::new(ComfyTransport::new(cfg), RetryPolicy::from_config(cfg));
    let submitted = pipeline::run_extension(project, &mut layers, client, template, &mut TracingProgress)?;
    eprintln!(
        "extended {} layers over {} steps ({submitted} jobs submitted)",
        layers.len(),
        project.total_steps()
    );
    Ok(layers)
}

fn cmd_stitch(project: &Project) -> anyhow::Result<()> {
    let mut base = pipeline::build_base_layers(project)?;
    let mut objects = pipeline::resolve_object_layers(project).items;
    let report = pipeline::stitch_layers(project, &mut base, &mut objects);
    check_report("stitch", &report)?;
    eprintln!(
        "wrote {} ribbons to {}",
        report.items.len(),
        project.dirs().stitched_dir().display()
    );
    Ok(())
}

fn cmd_render(project: &Project, args: RenderArgs) -> anyhow::Result<()> {
    let mut base = pipeline::build_base_layers(project)?;
    let mut objects = pipeline::resolve_object_layers(project).items;
    let report = pipeline::load_ribbons(project, &mut base, &mut objects);
    check_report("load ribbons", &report)?;
    render_layers(project, base, objects, args.out)
}

fn render_layers(
    project: &Project,
    base: Vec<BaseLayer>,
    objects: Vec<ObjectLayer>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    if !parallax::video::ffmpeg::is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg not found on PATH");
    }
    let layers = parallax::layers::into_dyn(base, objects);
    let clips = pipeline::build_clips(project, &layers)?;
    let out = out.unwrap_or_else(|| project.dirs().output_video_path(&project.config().project_name));

    let mut opts = FfmpegSinkOpts::new(&out);
    opts.bg_rgba = pipeline::BACKGROUND_RGBA;
    let mut sink = FfmpegSink::new(opts);
    let frames = pipeline::render(project, &clips, &mut sink)?;

    eprintln!("wrote {} ({frames} frames)", out.display());
    Ok(())
}

/// Print tolerated failures; fail only when nothing succeeded.
fn check_report(stage: &str, report: &StageReport<String>) -> anyhow::Result<()> {
    for e in &report.failures {
        eprintln!("warning: {stage}: {e}");
    }
    if report.items.is_empty() {
        anyhow::bail!("{stage} produced nothing");
    }
    Ok(())
}
