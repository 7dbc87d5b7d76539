use crate::foundation::error::{ParallaxError, ParallaxResult};

/// Per-step pixel displacement of a layer.
///
/// Positive `x` moves content right, positive `y` moves content down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Velocity {
    /// Horizontal pixels per step.
    pub x: i32,
    /// Vertical pixels per step.
    pub y: i32,
}

impl Velocity {
    /// Create a velocity from whole-pixel components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round fractional configuration values to whole pixels (half away from zero).
    pub fn from_f64(x: f64, y: f64) -> ParallaxResult<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ParallaxError::validation(format!(
                "velocity ({x}, {y}) must be finite"
            )));
        }
        let round = |v: f64| -> ParallaxResult<i32> {
            let r = v.round();
            if r < f64::from(i32::MIN) || r > f64::from(i32::MAX) {
                return Err(ParallaxError::validation(format!(
                    "velocity component {v} is out of range"
                )));
            }
            Ok(r as i32)
        };
        Ok(Self {
            x: round(x)?,
            y: round(y)?,
        })
    }

    /// Horizontal magnitude in pixels.
    pub fn abs_x(self) -> u32 {
        self.x.unsigned_abs()
    }

    /// Vertical magnitude in pixels.
    pub fn abs_y(self) -> u32 {
        self.y.unsigned_abs()
    }

    /// `true` when the layer does not move horizontally.
    pub fn is_static_x(self) -> bool {
        self.x == 0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ParallaxResult<Self> {
        if den == 0 {
            return Err(ParallaxError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ParallaxError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Time in seconds at which frame `frame` starts.
    pub fn frame_to_secs(self, frame: u64) -> f64 {
        (frame as f64) * self.frame_duration_secs()
    }

    /// Number of frames covering `secs`, rounded to the nearest frame.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
