use std::f64::consts::{FRAC_PI_4, TAU};

use crate::params::{MIN_OSCILLATION_PERIOD, PatternParameters};

/// Reference tick rate: `rotation_speed` is expressed in radians per tick at
/// 60 Hz, and advancement scales it by the wall-clock delta so playback speed
/// is consistent regardless of achieved frame rate.
pub const REFERENCE_TICK_HZ: f64 = 60.0;

/// Peak rotation swing of an oscillating ring, radians.
pub const OSCILLATION_SWING: f64 = FRAC_PI_4;

/// Width oscillation never shrinks a ring below this factor, so ring widths
/// stay positive.
pub const MIN_WIDTH_FACTOR: f64 = 0.05;

/// Per-ring mutable animation state. Owned exclusively by
/// [`AnimationController`]; the renderer reads it through
/// [`AnimationController::states`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RingState {
    /// Current rotation, radians.
    pub rotation: f64,
    /// Phase of the rotation oscillator, radians.
    pub oscillation_phase: f64,
    /// Phase of the width oscillator, radians.
    pub width_phase: f64,
    /// Derived width multiplier, >= [`MIN_WIDTH_FACTOR`].
    pub width_factor: f64,
}

impl Default for RingState {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            oscillation_phase: 0.0,
            width_phase: 0.0,
            width_factor: 1.0,
        }
    }
}

/// Advances per-ring rotation and width-oscillation state from wall-clock
/// timestamps.
///
/// Each ring is independent and is in exactly one rotation mode: continuous
/// accrual, or sine oscillation when the ring's override enables it. Width
/// oscillation is a parallel, independently toggled state.
#[derive(Clone, Debug, Default)]
pub struct AnimationController {
    states: Vec<RingState>,
    last_timestamp_ms: Option<f64>,
}

impl AnimationController {
    pub fn new(ring_count: usize) -> Self {
        Self {
            states: vec![RingState::default(); ring_count],
            last_timestamp_ms: None,
        }
    }

    pub fn states(&self) -> &[RingState] {
        &self.states
    }

    pub fn ring_count(&self) -> usize {
        self.states.len()
    }

    /// Recreates the state array when the ring count changes; values reset.
    pub fn resize(&mut self, ring_count: usize) {
        if self.states.len() != ring_count {
            self.states = vec![RingState::default(); ring_count];
        }
    }

    /// Zeroes all ring state and forgets the clock, so the next tick observes
    /// a zero delta.
    pub fn reset(&mut self) {
        for s in &mut self.states {
            *s = RingState::default();
        }
        self.last_timestamp_ms = None;
    }

    /// Seeds rotations and phases from a deterministic xorshift32 stream.
    pub fn randomize(&mut self, seed: u32) {
        let mut rng = Xorshift32::new(seed);
        for s in &mut self.states {
            s.rotation = rng.next_angle();
            s.oscillation_phase = rng.next_angle();
            s.width_phase = rng.next_angle();
            s.width_factor = 1.0;
        }
        self.last_timestamp_ms = None;
    }

    /// Forgets the reference timestamp without touching ring state. Used when
    /// the loop pauses so resuming does not integrate the pause duration.
    pub fn suspend_clock(&mut self) {
        self.last_timestamp_ms = None;
    }

    pub fn clock(&self) -> Option<f64> {
        self.last_timestamp_ms
    }

    pub fn set_clock(&mut self, timestamp_ms: Option<f64>) {
        self.last_timestamp_ms = timestamp_ms;
    }

    /// Advances all ring state to `timestamp_ms`. The first call after
    /// construction, reset, or a suspended clock observes a zero delta.
    pub fn advance(&mut self, params: &PatternParameters, timestamp_ms: f64) {
        let dt = match self.last_timestamp_ms {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_timestamp_ms = Some(timestamp_ms);

        self.resize(params.ring_count as usize);

        for (r, state) in self.states.iter_mut().enumerate() {
            let over = params.override_for(r);

            match over.and_then(|o| o.rotation_oscillation) {
                Some(osc) => {
                    let period = osc.period_secs.max(MIN_OSCILLATION_PERIOD);
                    state.oscillation_phase =
                        (state.oscillation_phase + dt / period * TAU).rem_euclid(TAU);
                    state.rotation = state.oscillation_phase.sin() * OSCILLATION_SWING;
                }
                None => {
                    let direction = if params.alternate_rotation && r % 2 == 1 {
                        -1.0
                    } else {
                        1.0
                    };
                    state.rotation = (state.rotation
                        + direction * params.rotation_speed * dt * REFERENCE_TICK_HZ)
                        .rem_euclid(TAU);
                }
            }

            match over.and_then(|o| o.width_oscillation) {
                Some(osc) => {
                    let period = osc.period_secs.max(MIN_OSCILLATION_PERIOD);
                    state.width_phase = (state.width_phase + dt / period * TAU).rem_euclid(TAU);
                    let amplitude = osc.amplitude_percent / 100.0;
                    state.width_factor =
                        (1.0 + amplitude / 2.0 * state.width_phase.sin()).max(MIN_WIDTH_FACTOR);
                }
                None => {
                    state.width_phase = 0.0;
                    state.width_factor = 1.0;
                }
            }
        }
    }
}

struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    fn next_angle(&mut self) -> f64 {
        f64::from(self.next() & 0x00ff_ffff) / 16_777_215.0 * TAU
    }
}
