use std::collections::BTreeMap;

use crate::{
    color::Rgb,
    error::{BlazonError, BlazonResult},
    gradient::GradientCurve,
    scheme,
};

pub const MAX_RING_COUNT: u32 = 64;
pub const MAX_SEGMENT_COUNT: u32 = 128;
pub const MAX_STRIPE_COUNT: u32 = 64;
/// Steepest usable stripe shear, degrees.
pub const MAX_STRIP_ANGLE_DEG: f64 = 85.0;
pub const MAX_RING_WIDTH_PERCENT: f64 = 400.0;
/// Largest glow kernel radius, in pixels.
pub const MAX_GLOW_SIZE: f64 = 64.0;
/// Shortest accepted oscillation period, seconds.
pub const MIN_OSCILLATION_PERIOD: f64 = 0.05;

/// Immutable-per-frame parameter snapshot.
///
/// The struct is flat and serde-serializable; every field has a documented
/// default so a partially persisted settings object never fails to load.
/// Ingestion goes through [`PatternParameters::validated`], after which the
/// renderer assumes the ranges below hold.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PatternParameters {
    pub ring_count: u32,
    pub segment_count: u32,
    pub stripe_count: u32,
    /// Global angular offset, radians.
    pub angle_offset: f64,
    /// Radians per tick at the 60 Hz reference rate.
    pub rotation_speed: f64,
    /// Odd rings spin the opposite way when set.
    pub alternate_rotation: bool,
    /// Stripe shear, degrees. Applied to outer stripe edges only.
    pub strip_angle: f64,
    /// Ring width as a percentage of the base unit.
    pub ring_width_percent: f64,
    /// Scheme identifier; resolution never fails (unknown ids map to the
    /// default pair).
    pub color_scheme: String,
    pub primary_color: Rgb,
    pub secondary_color: Rgb,
    pub background_color: Rgb,
    pub gradient_enabled: bool,
    /// Scales both brightness offsets, 0..=1.
    pub gradient_intensity: f64,
    /// Channel offset toward the lighter variation, 0..=255.
    pub edge_brightness: f64,
    /// Channel offset toward the deeper variation, 0..=255.
    pub center_darkness: f64,
    /// Gradient axis length multiplier.
    pub gradient_width: f64,
    pub gradient_curve: GradientCurve,
    pub glow: GlowParams,
    /// Per-ring overrides, keyed by ring index. Absent fields fall back to
    /// the globals above.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ring_overrides: BTreeMap<u32, RingOverride>,
}

impl Default for PatternParameters {
    fn default() -> Self {
        let pair = scheme::default_pair();
        Self {
            ring_count: 6,
            segment_count: 8,
            stripe_count: 3,
            angle_offset: 0.0,
            rotation_speed: 0.01,
            alternate_rotation: true,
            strip_angle: 0.0,
            ring_width_percent: 100.0,
            color_scheme: scheme::DEFAULT_SCHEME.to_string(),
            primary_color: pair.primary,
            secondary_color: pair.secondary,
            background_color: Rgb::new(0x12, 0x14, 0x1c),
            gradient_enabled: true,
            gradient_intensity: 0.6,
            edge_brightness: 70.0,
            center_darkness: 80.0,
            gradient_width: 1.0,
            gradient_curve: GradientCurve::default(),
            glow: GlowParams::default(),
            ring_overrides: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlowParams {
    pub enabled: bool,
    /// Halo strength, 0..=1.
    pub intensity: f64,
    /// Kernel radius, pixels.
    pub size: f64,
    pub color: Rgb,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.5,
            size: 12.0,
            color: Rgb::new(0xff, 0x96, 0x32),
        }
    }
}

/// Per-ring override block. Every field is optional; `None` means "use the
/// global parameter".
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RingOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_percent: Option<f64>,
    /// Replaces the band color for every stripe in the ring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solid_color: Option<Rgb>,
    /// Degrees; overrides the global stripe shear for this ring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_oscillation: Option<RotationOscillation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_oscillation: Option<WidthOscillation>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RotationOscillation {
    /// Seconds per full swing cycle.
    pub period_secs: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WidthOscillation {
    /// Seconds per full width cycle.
    pub period_secs: f64,
    /// Peak-to-trough swing as a percentage of the base width.
    pub amplitude_percent: f64,
}

impl PatternParameters {
    /// Strict range check: rejects what
    /// [`validated`](Self::validated) would have to clamp.
    pub fn validate(&self) -> BlazonResult<()> {
        if self.ring_count == 0 {
            return Err(BlazonError::validation("ring_count must be >= 1"));
        }
        if self.segment_count == 0 {
            return Err(BlazonError::validation("segment_count must be >= 1"));
        }
        if self.stripe_count == 0 {
            return Err(BlazonError::validation("stripe_count must be >= 1"));
        }
        for (name, v) in self.scalar_fields() {
            if !v.is_finite() {
                return Err(BlazonError::validation(format!("{name} must be finite")));
            }
        }
        if self.ring_width_percent <= 0.0 {
            return Err(BlazonError::validation("ring_width_percent must be > 0"));
        }
        if self.gradient_width <= 0.0 {
            return Err(BlazonError::validation("gradient_width must be > 0"));
        }
        for (ring, over) in &self.ring_overrides {
            if let Some(w) = over.width_percent
                && (!w.is_finite() || w <= 0.0)
            {
                return Err(BlazonError::validation(format!(
                    "ring {ring} width_percent must be finite and > 0"
                )));
            }
            if let Some(osc) = &over.rotation_oscillation
                && (!osc.period_secs.is_finite() || osc.period_secs <= 0.0)
            {
                return Err(BlazonError::validation(format!(
                    "ring {ring} rotation oscillation period must be finite and > 0"
                )));
            }
            if let Some(osc) = &over.width_oscillation {
                if !osc.period_secs.is_finite() || osc.period_secs <= 0.0 {
                    return Err(BlazonError::validation(format!(
                        "ring {ring} width oscillation period must be finite and > 0"
                    )));
                }
                if !osc.amplitude_percent.is_finite() || osc.amplitude_percent < 0.0 {
                    return Err(BlazonError::validation(format!(
                        "ring {ring} width oscillation amplitude must be finite and >= 0"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The ingestion boundary: returns a copy with every field clamped into
    /// the renderer's assumed ranges. Non-finite numbers are rejected rather
    /// than clamped.
    pub fn validated(&self) -> BlazonResult<Self> {
        for (name, v) in self.scalar_fields() {
            if !v.is_finite() {
                return Err(BlazonError::validation(format!("{name} must be finite")));
            }
        }

        let mut p = self.clone();
        p.ring_count = p.ring_count.clamp(1, MAX_RING_COUNT);
        p.segment_count = p.segment_count.clamp(1, MAX_SEGMENT_COUNT);
        p.stripe_count = p.stripe_count.clamp(1, MAX_STRIPE_COUNT);
        p.strip_angle = p.strip_angle.clamp(-MAX_STRIP_ANGLE_DEG, MAX_STRIP_ANGLE_DEG);
        p.ring_width_percent = p.ring_width_percent.clamp(1.0, MAX_RING_WIDTH_PERCENT);
        p.gradient_intensity = p.gradient_intensity.clamp(0.0, 1.0);
        p.edge_brightness = p.edge_brightness.clamp(0.0, 255.0);
        p.center_darkness = p.center_darkness.clamp(0.0, 255.0);
        p.gradient_width = p.gradient_width.clamp(0.05, 8.0);
        p.glow.intensity = p.glow.intensity.clamp(0.0, 1.0);
        p.glow.size = p.glow.size.clamp(0.0, MAX_GLOW_SIZE);

        p.ring_overrides.retain(|ring, _| *ring < p.ring_count);
        for over in p.ring_overrides.values_mut() {
            if let Some(w) = &mut over.width_percent {
                if !w.is_finite() {
                    return Err(BlazonError::validation(
                        "ring override width_percent must be finite",
                    ));
                }
                *w = w.clamp(1.0, MAX_RING_WIDTH_PERCENT);
            }
            if let Some(a) = &mut over.stripe_angle {
                if !a.is_finite() {
                    return Err(BlazonError::validation(
                        "ring override stripe_angle must be finite",
                    ));
                }
                *a = a.clamp(-MAX_STRIP_ANGLE_DEG, MAX_STRIP_ANGLE_DEG);
            }
            if let Some(osc) = &mut over.rotation_oscillation {
                if !osc.period_secs.is_finite() {
                    return Err(BlazonError::validation(
                        "rotation oscillation period must be finite",
                    ));
                }
                osc.period_secs = osc.period_secs.max(MIN_OSCILLATION_PERIOD);
            }
            if let Some(osc) = &mut over.width_oscillation {
                if !osc.period_secs.is_finite() || !osc.amplitude_percent.is_finite() {
                    return Err(BlazonError::validation(
                        "width oscillation fields must be finite",
                    ));
                }
                osc.period_secs = osc.period_secs.max(MIN_OSCILLATION_PERIOD);
                osc.amplitude_percent = osc.amplitude_percent.clamp(0.0, 200.0);
            }
        }

        Ok(p)
    }

    /// Resolves `color_scheme` through `registry` and adopts its pair.
    /// Explicit colors survive loading untouched; this is the boundary step
    /// for "scheme picked" events.
    pub fn apply_scheme(&mut self, registry: &crate::scheme::SchemeRegistry) {
        let pair = registry.resolve(&self.color_scheme);
        self.primary_color = pair.primary;
        self.secondary_color = pair.secondary;
    }

    pub fn override_for(&self, ring: usize) -> Option<&RingOverride> {
        self.ring_overrides.get(&(ring as u32))
    }

    /// Effective stripe shear for a ring, degrees.
    pub fn stripe_angle_for(&self, ring: usize) -> f64 {
        self.override_for(ring)
            .and_then(|o| o.stripe_angle)
            .unwrap_or(self.strip_angle)
    }

    /// Effective width percentage for a ring.
    pub fn width_percent_for(&self, ring: usize) -> f64 {
        self.override_for(ring)
            .and_then(|o| o.width_percent)
            .unwrap_or(self.ring_width_percent)
    }

    fn scalar_fields(&self) -> [(&'static str, f64); 10] {
        [
            ("angle_offset", self.angle_offset),
            ("rotation_speed", self.rotation_speed),
            ("strip_angle", self.strip_angle),
            ("ring_width_percent", self.ring_width_percent),
            ("gradient_intensity", self.gradient_intensity),
            ("edge_brightness", self.edge_brightness),
            ("center_darkness", self.center_darkness),
            ("gradient_width", self.gradient_width),
            ("glow.intensity", self.glow.intensity),
            ("glow.size", self.glow.size),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let mut p = PatternParameters::default();
        p.ring_overrides.insert(
            2,
            RingOverride {
                width_percent: Some(150.0),
                solid_color: Some(Rgb::new(10, 20, 30)),
                stripe_angle: None,
                rotation_oscillation: Some(RotationOscillation { period_secs: 4.0 }),
                width_oscillation: None,
            },
        );
        let s = serde_json::to_string_pretty(&p).unwrap();
        let de: PatternParameters = serde_json::from_str(&s).unwrap();
        assert_eq!(de, p);
    }

    #[test]
    fn missing_fields_default() {
        let p: PatternParameters = serde_json::from_str("{\"ring_count\": 3}").unwrap();
        assert_eq!(p.ring_count, 3);
        assert_eq!(p.segment_count, PatternParameters::default().segment_count);
        assert_eq!(p.gradient_curve, GradientCurve::Triangle);
    }

    #[test]
    fn apply_scheme_adopts_the_resolved_pair() {
        let mut p = PatternParameters {
            color_scheme: "glacier".to_string(),
            ..Default::default()
        };
        p.apply_scheme(&crate::scheme::SchemeRegistry::new());
        let pair = crate::scheme::builtin("glacier").unwrap();
        assert_eq!(p.primary_color, pair.primary);
        assert_eq!(p.secondary_color, pair.secondary);

        // Unknown identifiers resolve to the default pair, never fail.
        p.color_scheme = "mystery".to_string();
        p.apply_scheme(&crate::scheme::SchemeRegistry::new());
        assert_eq!(p.primary_color, crate::scheme::default_pair().primary);
    }

    #[test]
    fn validate_rejects_zero_counts() {
        let p = PatternParameters {
            ring_count: 0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn validated_clamps_ranges() {
        let p = PatternParameters {
            ring_count: 0,
            segment_count: 1000,
            strip_angle: 120.0,
            gradient_intensity: 3.0,
            ..Default::default()
        };
        let v = p.validated().unwrap();
        assert_eq!(v.ring_count, 1);
        assert_eq!(v.segment_count, MAX_SEGMENT_COUNT);
        assert_eq!(v.strip_angle, MAX_STRIP_ANGLE_DEG);
        assert_eq!(v.gradient_intensity, 1.0);
    }

    #[test]
    fn validated_rejects_non_finite() {
        let p = PatternParameters {
            rotation_speed: f64::NAN,
            ..Default::default()
        };
        assert!(p.validated().is_err());
    }

    #[test]
    fn validated_drops_out_of_range_overrides() {
        let mut p = PatternParameters {
            ring_count: 3,
            ..Default::default()
        };
        p.ring_overrides.insert(9, RingOverride::default());
        let v = p.validated().unwrap();
        assert!(v.ring_overrides.is_empty());
    }
}
