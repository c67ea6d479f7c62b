use crate::{error::BlazonResult, glow_cpu, params::GlowParams, render::Frame};

/// Glow post-pass over a rendered frame.
///
/// The compositor never mutates its input; it always produces a new frame.
/// Disabled glow is a byte-identical pass-through. Every failure path
/// degrades instead of erroring out of the frame loop: a GPU strategy that
/// fails (adapter, shader, upload, readback) falls back to the CPU pass for
/// the rest of the session, and a CPU failure falls back to pass-through.
/// Degradation is observable via [`GlowCompositor::degraded`] and logged.
#[derive(Debug, Default)]
pub struct GlowCompositor {
    #[cfg(feature = "gpu")]
    gpu: GpuStrategy,
    degraded: bool,
}

#[cfg(feature = "gpu")]
#[derive(Debug, Default)]
enum GpuStrategy {
    /// GPU never requested; CPU pass only.
    #[default]
    Off,
    /// Acquire a context lazily on first composite.
    Pending,
    Active(Box<crate::glow_gpu::GpuGlow>),
}

impl GlowCompositor {
    /// CPU-only compositor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compositor that acquires a GPU context lazily on first use and falls
    /// back to the CPU pass if acquisition or any later GPU step fails.
    #[cfg(feature = "gpu")]
    pub fn with_gpu() -> Self {
        Self {
            gpu: GpuStrategy::Pending,
            degraded: false,
        }
    }

    /// Whether a failure forced this compositor into a weaker strategy.
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    pub fn composite(&mut self, frame: &Frame, glow: &GlowParams) -> BlazonResult<Frame> {
        if !glow.enabled || glow.intensity <= 0.0 || glow.size <= 0.0 {
            return Ok(frame.clone());
        }

        #[cfg(feature = "gpu")]
        {
            if matches!(self.gpu, GpuStrategy::Pending) {
                match crate::glow_gpu::GpuGlow::new() {
                    Ok(gpu) => self.gpu = GpuStrategy::Active(Box::new(gpu)),
                    Err(e) => {
                        tracing::warn!("gpu glow unavailable, using cpu pass: {e}");
                        self.degraded = true;
                        self.gpu = GpuStrategy::Off;
                    }
                }
            }
            if let GpuStrategy::Active(gpu) = &mut self.gpu {
                match gpu.composite(frame, glow) {
                    Ok(out) => return Ok(out),
                    Err(e) => {
                        tracing::warn!("gpu glow failed, falling back to cpu pass: {e}");
                        self.degraded = true;
                        self.gpu = GpuStrategy::Off;
                    }
                }
            }
        }

        match glow_cpu::glow_composite_rgba8(&frame.data, frame.width, frame.height, glow) {
            Ok(data) => Ok(Frame {
                width: frame.width,
                height: frame.height,
                data,
                premultiplied: frame.premultiplied,
            }),
            Err(e) => {
                // Last resort: the frame loop must survive, so hand the
                // source back unmodified.
                tracing::warn!("cpu glow failed, passing frame through: {e}");
                self.degraded = true;
                Ok(frame.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{anim::AnimationController, params::PatternParameters, render::render_frame};

    fn rendered() -> (PatternParameters, Frame) {
        let params = PatternParameters::default();
        let controller = AnimationController::new(params.ring_count as usize);
        let frame = render_frame(&params, controller.states(), 96, 96).unwrap();
        (params, frame)
    }

    #[test]
    fn disabled_glow_is_byte_identical() {
        let (params, frame) = rendered();
        let mut compositor = GlowCompositor::new();
        let out = compositor.composite(&frame, &params.glow).unwrap();
        assert_eq!(out, frame);
        assert!(!compositor.degraded());
    }

    #[test]
    fn enabled_glow_keeps_dimensions_and_source() {
        let (mut params, frame) = rendered();
        params.glow.enabled = true;
        params.glow.size = 6.0;
        let before = frame.clone();

        let mut compositor = GlowCompositor::new();
        let out = compositor.composite(&frame, &params.glow).unwrap();

        assert_eq!(frame, before);
        assert_eq!(out.width, frame.width);
        assert_eq!(out.height, frame.height);
        assert!(!compositor.degraded());
    }
}
