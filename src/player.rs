use crate::{
    anim::AnimationController,
    error::{BlazonError, BlazonResult},
    glow::GlowCompositor,
    params::PatternParameters,
    render::{Frame, render_frame},
};

/// The host-driven frame loop.
///
/// The host owns the timer (a display-refresh callback, a fixed-rate thread,
/// a test harness) and calls [`tick`](Self::tick) with each new timestamp;
/// everything between two ticks completes synchronously. The controller's
/// ring-state array is the only state shared between "controls changed"
/// events and rendering, and [`set_params`](Self::set_params) swaps the
/// parameter struct and resizes that array in one call, so a tick can never
/// observe a half-updated parameter set or a stale state length.
#[derive(Debug)]
pub struct Player {
    params: PatternParameters,
    controller: AnimationController,
    glow: GlowCompositor,
    width: u32,
    height: u32,
    running: bool,
}

impl Player {
    /// Validates parameters and the render target up front; a missing usable
    /// surface is the one fail-fast condition of the loop.
    pub fn new(params: &PatternParameters, width: u32, height: u32) -> BlazonResult<Self> {
        Self::with_compositor(params, width, height, GlowCompositor::new())
    }

    /// Like [`new`](Self::new), but tries the GPU glow strategy first.
    #[cfg(feature = "gpu")]
    pub fn with_gpu_glow(
        params: &PatternParameters,
        width: u32,
        height: u32,
    ) -> BlazonResult<Self> {
        Self::with_compositor(params, width, height, GlowCompositor::with_gpu())
    }

    fn with_compositor(
        params: &PatternParameters,
        width: u32,
        height: u32,
        glow: GlowCompositor,
    ) -> BlazonResult<Self> {
        if width == 0 || height == 0 || width > u32::from(u16::MAX) || height > u32::from(u16::MAX)
        {
            return Err(BlazonError::validation(
                "player surface must be 1..=65535 on each side",
            ));
        }
        let params = params.validated()?;
        let controller = AnimationController::new(params.ring_count as usize);
        Ok(Self {
            params,
            controller,
            glow,
            width,
            height,
            running: true,
        })
    }

    pub fn params(&self) -> &PatternParameters {
        &self.params
    }

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the glow compositor has fallen back to a weaker strategy.
    pub fn glow_degraded(&self) -> bool {
        self.glow.degraded()
    }

    /// Atomically replaces the parameter set. The ring-state array is resized
    /// in the same call, so a shrink can never leave a pending tick reading a
    /// longer stale array.
    pub fn set_params(&mut self, params: &PatternParameters) -> BlazonResult<()> {
        let params = params.validated()?;
        self.controller.resize(params.ring_count as usize);
        self.params = params;
        Ok(())
    }

    /// Retargets the output surface; all radii are recomputed from the new
    /// dimensions on the next render.
    pub fn resize(&mut self, width: u32, height: u32) -> BlazonResult<()> {
        if width == 0 || height == 0 || width > u32::from(u16::MAX) || height > u32::from(u16::MAX)
        {
            return Err(BlazonError::validation(
                "player surface must be 1..=65535 on each side",
            ));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Pauses state advancement. Rendering stays available through
    /// [`render_once`](Self::render_once); the clock is suspended so resuming
    /// does not integrate the pause duration.
    pub fn pause(&mut self) {
        self.running = false;
        self.controller.suspend_clock();
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Stops the loop cooperatively: any tick the host still has scheduled
    /// becomes a no-advancement render.
    pub fn stop(&mut self) {
        self.pause();
    }

    /// Zeroes all animation state without touching parameters or run state.
    pub fn reset(&mut self) {
        self.controller.reset();
    }

    /// Seeds animation phases deterministically.
    pub fn randomize(&mut self, seed: u32) {
        self.controller.randomize(seed);
    }

    /// One frame step: advance state (when running), render, glow-composite.
    pub fn tick(&mut self, timestamp_ms: f64) -> BlazonResult<Frame> {
        if self.running {
            self.controller.advance(&self.params, timestamp_ms);
        } else {
            self.controller
                .resize(self.params.ring_count as usize);
        }
        self.render_current()
    }

    /// Renders the current state without advancing it, e.g. right after a
    /// manual reset while paused.
    pub fn render_once(&mut self) -> BlazonResult<Frame> {
        self.controller.resize(self.params.ring_count as usize);
        self.render_current()
    }

    /// Drives frames synchronously at the given timestamps (time-lapse or
    /// thumbnail capture), then restores the prior running/paused state and
    /// clock exactly as they were.
    pub fn capture(&mut self, timestamps_ms: &[f64]) -> BlazonResult<Vec<Frame>> {
        let saved_running = self.running;
        let saved_clock = self.controller.clock();

        self.running = true;
        self.controller.suspend_clock();
        let mut frames = Vec::with_capacity(timestamps_ms.len());
        let mut result = Ok(());
        for &t in timestamps_ms {
            match self.tick(t) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        self.running = saved_running;
        self.controller.set_clock(saved_clock);
        result.map(|_| frames)
    }

    fn render_current(&mut self) -> BlazonResult<Frame> {
        let frame = render_frame(
            &self.params,
            self.controller.states(),
            self.width,
            self.height,
        )?;
        self.glow.composite(&frame, &self.params.glow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PatternParameters {
        PatternParameters {
            ring_count: 3,
            rotation_speed: 0.02,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_unusable_surface() {
        assert!(Player::new(&params(), 0, 64).is_err());
        assert!(Player::new(&params(), 64, 70_000).is_err());
    }

    #[test]
    fn tick_advances_only_while_running() {
        let mut player = Player::new(&params(), 64, 64).unwrap();
        player.tick(0.0).unwrap();
        player.tick(500.0).unwrap();
        let moved = player.controller().states()[0].rotation;
        assert!(moved > 0.0);

        player.pause();
        player.tick(2000.0).unwrap();
        assert_eq!(player.controller().states()[0].rotation, moved);
    }

    #[test]
    fn pause_does_not_integrate_the_gap() {
        let mut player = Player::new(&params(), 64, 64).unwrap();
        player.tick(0.0).unwrap();
        player.tick(100.0).unwrap();
        let before = player.controller().states()[0].rotation;

        player.pause();
        player.resume();
        // A long wall-clock gap while paused must not fast-forward state.
        player.tick(60_000.0).unwrap();
        assert_eq!(player.controller().states()[0].rotation, before);
        player.tick(60_100.0).unwrap();
        assert!(player.controller().states()[0].rotation > before);
    }

    #[test]
    fn set_params_resizes_ring_state_atomically() {
        let mut player = Player::new(&params(), 64, 64).unwrap();
        player.tick(0.0).unwrap();
        assert_eq!(player.controller().ring_count(), 3);

        let smaller = PatternParameters {
            ring_count: 1,
            ..params()
        };
        player.set_params(&smaller).unwrap();
        assert_eq!(player.controller().ring_count(), 1);
        player.tick(16.0).unwrap();
    }

    #[test]
    fn capture_restores_loop_state() {
        let mut player = Player::new(&params(), 64, 64).unwrap();
        player.tick(0.0).unwrap();
        player.tick(50.0).unwrap();
        player.pause();
        let clock_before = player.controller().clock();

        let frames = player.capture(&[0.0, 100.0, 200.0]).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(!player.is_running());
        assert_eq!(player.controller().clock(), clock_before);

        player.resume();
        let frames = player.capture(&[0.0, 100.0]).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(player.is_running());
    }

    #[test]
    fn render_once_works_while_paused() {
        let mut player = Player::new(&params(), 64, 64).unwrap();
        player.pause();
        player.reset();
        let frame = player.render_once().unwrap();
        assert_eq!(frame.width, 64);
        assert!(frame.data.iter().any(|&b| b != 0));
    }

    #[test]
    fn capture_is_deterministic_after_reset() {
        let mut a = Player::new(&params(), 48, 48).unwrap();
        let mut b = Player::new(&params(), 48, 48).unwrap();
        // Different live histories, then both reset to zeroed state.
        a.tick(0.0).unwrap();
        a.tick(900.0).unwrap();
        b.tick(5000.0).unwrap();
        a.reset();
        b.reset();
        let fa = a.capture(&[0.0, 250.0]).unwrap();
        let fb = b.capture(&[0.0, 250.0]).unwrap();
        assert_eq!(fa, fb);
    }
}
