//! Client side of the external inpainting service.

pub mod client;
pub mod protocol;
pub mod transport;
pub mod workflow;
