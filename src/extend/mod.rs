//! Iterative sideways extension through the inpainting service.

pub mod orchestrator;
pub mod progress;
