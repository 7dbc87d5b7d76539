use std::path::PathBuf;

/// Convenience result type used across the crate.
pub type ParallaxResult<T> = Result<T, ParallaxError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ParallaxError {
    /// Invalid user-provided configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Degenerate slice/crop/stitch dimensions.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// An original segment or step output is absent on disk.
    #[error("missing asset for {layer}: '{}'", path.display())]
    MissingAsset {
        /// Path that was expected to exist.
        path: PathBuf,
        /// Layer prefix the asset belongs to.
        layer: String,
    },

    /// More step outputs on disk than the configured step count accounts for.
    #[error("{layer} has {found} step images on disk, expected {expected}")]
    StepCountMismatch {
        /// Layer prefix.
        layer: String,
        /// Step images the configured step count implies.
        expected: usize,
        /// Step images actually present.
        found: usize,
    },

    /// The inpainting service stayed unreachable for the whole retry budget.
    #[error("connection error after {attempts} attempt(s): {reason}")]
    Connection {
        /// Number of connect attempts made.
        attempts: u32,
        /// Last underlying failure.
        reason: String,
    },

    /// The completion stream closed before the terminal event arrived.
    #[error("service disconnected before job '{job_id}' completed")]
    Disconnected {
        /// Correlator of the job that was in flight.
        job_id: String,
    },

    /// Malformed or unexpected service message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An extension iteration failed; `last_completed` is the resume point.
    #[error("extension step {step} failed (last completed step: {last_completed}): {source}")]
    IterationFailed {
        /// 1-based step that failed.
        step: usize,
        /// Last step whose outputs were fully ingested.
        last_completed: usize,
        /// Underlying failure.
        #[source]
        source: Box<ParallaxError>,
    },

    /// Processing of a single layer failed.
    #[error("layer {layer} failed: {source}")]
    LayerFailed {
        /// Layer prefix.
        layer: String,
        /// Underlying failure.
        #[source]
        source: Box<ParallaxError>,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ParallaxError {
    /// Build a [`ParallaxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ParallaxError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`ParallaxError::MissingAsset`] value.
    pub fn missing_asset(path: impl Into<PathBuf>, layer: impl Into<String>) -> Self {
        Self::MissingAsset {
            path: path.into(),
            layer: layer.into(),
        }
    }

    /// Build a [`ParallaxError::Protocol`] value.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Build a [`ParallaxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Wrap `self` as the failure of extension `step`.
    pub fn at_step(self, step: usize, last_completed: usize) -> Self {
        Self::IterationFailed {
            step,
            last_completed,
            source: Box::new(self),
        }
    }

    /// Wrap `self` as the failure of layer `layer`.
    pub fn in_layer(self, layer: impl Into<String>) -> Self {
        Self::LayerFailed {
            layer: layer.into(),
            source: Box::new(self),
        }
    }

    /// `true` for service reachability failures that abort the whole extension loop.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Disconnected { .. } => true,
            Self::IterationFailed { source, .. } | Self::LayerFailed { source, .. } => {
                source.is_connection()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
