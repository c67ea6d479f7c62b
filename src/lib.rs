#![forbid(unsafe_code)]

//! Parametric radial "blaze" pattern engine: ring/stripe geometry, gradient
//! synthesis, timestamp-driven animation, and a two-pass render + glow
//! pipeline producing premultiplied RGBA8 frames.

pub mod anim;
pub mod color;
pub mod error;
pub mod geometry;
pub mod glow;
pub mod glow_cpu;
#[cfg(feature = "gpu")]
pub mod glow_gpu;
pub mod gradient;
pub mod params;
pub mod player;
pub mod render;
pub mod scheme;
pub mod share;

pub use anim::{AnimationController, RingState};
pub use color::{Rgb, mix};
pub use error::{BlazonError, BlazonResult};
pub use geometry::{Band, RingBand, StripeArc};
pub use glow::GlowCompositor;
pub use gradient::{ColorVariations, GradientCurve, GradientStop, gradient_stops};
pub use params::{GlowParams, PatternParameters, RingOverride};
pub use player::Player;
pub use render::{Frame, render_frame};
pub use scheme::{SchemePair, SchemeRegistry};
