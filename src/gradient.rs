use crate::color::{Rgb, mix};

/// Named gradient curve shapes. Each curve is a fixed color-stop topology
/// built from a lighter/deeper pair; the set is the visual signature of the
/// pattern and is reproduced exactly.
///
/// `Triangle` is the canonical default; unrecognized curve names resolve to
/// it at the parsing boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientCurve {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Step,
    Sine,
    Trapezoid,
    DoublePeak,
    Organic,
    #[default]
    Triangle,
}

impl GradientCurve {
    pub const ALL: [GradientCurve; 10] = [
        Self::Linear,
        Self::EaseIn,
        Self::EaseOut,
        Self::EaseInOut,
        Self::Step,
        Self::Sine,
        Self::Trapezoid,
        Self::DoublePeak,
        Self::Organic,
        Self::Triangle,
    ];

    /// Kebab-case name used in persisted parameters and share codes.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
            Self::Step => "step",
            Self::Sine => "sine",
            Self::Trapezoid => "trapezoid",
            Self::DoublePeak => "double-peak",
            Self::Organic => "organic",
            Self::Triangle => "triangle",
        }
    }

    /// Unknown names resolve to the default curve rather than failing.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name.trim())
            .unwrap_or_default()
    }
}

impl serde::Serialize for GradientCurve {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for GradientCurve {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        Ok(Self::from_name(&s))
    }
}

/// Lighter/deeper variation pair derived from a base color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorVariations {
    pub lighter: Rgb,
    pub deeper: Rgb,
}

impl ColorVariations {
    /// Additive/subtractive brightness per channel, clamped to [0, 255].
    pub fn of(base: Rgb, brightness_up: f64, brightness_down: f64) -> Self {
        Self {
            lighter: base.offset(brightness_up),
            deeper: base.offset(-brightness_down),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgb,
}

fn stop(offset: f32, color: Rgb) -> GradientStop {
    GradientStop { offset, color }
}

/// Builds the ordered stop sequence for `curve` from a variation pair.
///
/// Offsets are strictly increasing. The near-duplicate offsets around 0.5 in
/// [`GradientCurve::Step`] are intentional: they force a hard edge without a
/// zero-width span in the raster backend.
pub fn gradient_stops(curve: GradientCurve, vars: ColorVariations) -> Vec<GradientStop> {
    let l = vars.lighter;
    let d = vars.deeper;
    match curve {
        GradientCurve::Linear => vec![stop(0.0, l), stop(0.5, d), stop(1.0, l)],
        GradientCurve::EaseIn => vec![
            stop(0.0, l),
            stop(0.2, mix(l, d, 0.3)),
            stop(0.45, d),
            stop(1.0, d),
        ],
        GradientCurve::EaseOut => vec![
            stop(0.0, l),
            stop(0.12, mix(l, d, 0.7)),
            stop(0.4, d),
            stop(1.0, d),
        ],
        GradientCurve::EaseInOut => vec![
            stop(0.0, l),
            stop(0.25, mix(l, d, 0.5)),
            stop(0.4, d),
            stop(0.6, d),
            stop(0.75, mix(l, d, 0.5)),
            stop(1.0, l),
        ],
        GradientCurve::Step => vec![stop(0.0, l), stop(0.499, l), stop(0.501, d), stop(1.0, d)],
        GradientCurve::Sine => vec![
            stop(0.0, l),
            stop(0.25, d),
            stop(0.5, l),
            stop(0.75, d),
            stop(1.0, l),
        ],
        GradientCurve::Trapezoid => vec![stop(0.0, l), stop(0.3, d), stop(0.7, d), stop(1.0, l)],
        GradientCurve::DoublePeak => vec![
            stop(0.0, l),
            stop(0.15, d),
            stop(0.3, d),
            stop(0.5, l),
            stop(0.7, d),
            stop(0.85, d),
            stop(1.0, l),
        ],
        GradientCurve::Organic => vec![
            stop(0.0, l),
            stop(0.25, mix(l, d, 0.3)),
            stop(0.5, d),
            stop(0.75, mix(l, d, 0.7)),
            stop(1.0, l),
        ],
        GradientCurve::Triangle => vec![
            stop(0.0, l),
            stop(0.35, mix(l, d, 0.2)),
            stop(0.5, d),
            stop(0.65, mix(l, d, 0.2)),
            stop(1.0, l),
        ],
    }
}
