#![forbid(unsafe_code)]

pub mod assets;
pub mod extend;
pub mod foundation;
pub mod geometry;
pub mod layers;
pub mod project;
pub mod service;
pub mod video;

pub use assets::handle::{ImageHandle, StepImage};
pub use extend::orchestrator::{ExtensionLoop, IterationState};
pub use extend::progress::{ProgressSink, TracingProgress};
pub use foundation::core::{Canvas, Fps, Velocity};
pub use foundation::error::{ParallaxError, ParallaxResult};
pub use geometry::engine::{LayerGeometryEngine, Ribbon, Segment};
pub use layers::{BaseLayer, LayerKind, LayerLike, ObjectLayer};
pub use project::config::{ProjectConfig, ServiceConfig};
pub use project::layout::ProjectDirs;
pub use project::{Project, ProjectContext};
pub use service::client::{InpaintService, InpaintingServiceClient, JobOutcome, RetryPolicy};
pub use service::transport::ComfyTransport;
pub use service::workflow::Workflow;
pub use video::clip::LayerClip;
pub use video::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use video::sink::{FrameSink, InMemorySink, SinkConfig};
