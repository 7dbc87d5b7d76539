//! Depth layers and the salient-object layers attached to them.

pub mod base;
pub mod object;

use crate::foundation::core::Velocity;
use crate::foundation::error::{ParallaxError, ParallaxResult};
use crate::geometry::engine::Ribbon;
use crate::video::clip::LayerClip;

pub use base::BaseLayer;
pub use object::ObjectLayer;

/// Which variant a [`LayerLike`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// An opaque band of the source image.
    Base,
    /// A salient-object cutout panned with layer `parent` (1-based).
    Object {
        /// Layer whose velocity the object inherits.
        parent: usize,
    },
}

/// Common surface of every layer that ends up as a clip in the final video.
pub trait LayerLike {
    /// 1-based index within its kind.
    fn index(&self) -> usize;
    /// Filename prefix, e.g. `layer_2` or `object_1`.
    fn prefix(&self) -> &str;
    fn kind(&self) -> LayerKind;
    fn velocity(&self) -> Velocity;
    /// Canvas row of the layer's top edge.
    fn top(&self) -> u32;
    /// Width of the window shown at any instant.
    fn visible_width(&self) -> u32;
    /// Stitched ribbon, once built.
    fn ribbon(&self) -> Option<&Ribbon>;

    /// Panning clip of the finished ribbon.
    fn clip(&self, duration: f64) -> ParallaxResult<LayerClip> {
        let ribbon = self.ribbon().ok_or_else(|| {
            ParallaxError::validation(format!("{} has no stitched ribbon", self.prefix()))
        })?;
        LayerClip::new(self.prefix(), ribbon, self.visible_width(), self.top(), duration)
    }
}

/// Box every layer for uniform clip building, base layers first.
pub fn into_dyn(base: Vec<BaseLayer>, objects: Vec<ObjectLayer>) -> Vec<Box<dyn LayerLike>> {
    base.into_iter()
        .map(|l| Box::new(l) as Box<dyn LayerLike>)
        .chain(objects.into_iter().map(|l| Box::new(l) as Box<dyn LayerLike>))
        .collect()
}
