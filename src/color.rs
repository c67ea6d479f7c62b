use std::fmt;

/// The canonical color representation of the engine: 8-bit straight RGB.
///
/// Text forms (`#rrggbb`, `#rgb`, `rgb(...)`, `rgba(...)`) are converted at
/// the boundary; everything past parsing works on this struct. Alpha only
/// exists at the raster boundary (premultiplied RGBA8 frames).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const BLACK: Rgb = Rgb::new(0, 0, 0);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Strict parse of the two textual forms the system produces:
    /// `#rgb`/`#rrggbb` hex and `rgb(r,g,b)`/`rgba(r,g,b,a)` function syntax
    /// (the alpha component is accepted and dropped).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let body = s
            .strip_prefix("rgba")
            .or_else(|| s.strip_prefix("rgb"))?
            .trim();
        let body = body.strip_prefix('(')?.strip_suffix(')')?;
        let mut channels = [0u8; 3];
        let mut parts = body.split(',');
        for c in &mut channels {
            let n: f64 = parts.next()?.trim().parse().ok()?;
            if !n.is_finite() {
                return None;
            }
            *c = n.round().clamp(0.0, 255.0) as u8;
        }
        // rgb() must be exactly 3 components, rgba() exactly 4.
        match (s.starts_with("rgba"), parts.next()) {
            (true, Some(alpha)) => {
                alpha.trim().parse::<f64>().ok()?;
                parts.next().is_none().then(|| Self::new(channels[0], channels[1], channels[2]))
            }
            (false, None) => Some(Self::new(channels[0], channels[1], channels[2])),
            _ => None,
        }
    }

    /// Soft-failing parse: malformed input yields black instead of an error.
    pub fn parse_lossy(s: &str) -> Self {
        Self::parse(s).unwrap_or(BLACK)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Additive brightness offset per channel, saturating to [0, 255].
    pub fn offset(self, delta: f64) -> Self {
        fn shift(c: u8, delta: f64) -> u8 {
            (f64::from(c) + delta).round().clamp(0.0, 255.0) as u8
        }
        Self::new(shift(self.r, delta), shift(self.g, delta), shift(self.b, delta))
    }

}

fn parse_hex(hex: &str) -> Option<Rgb> {
    match hex.len() {
        3 => {
            let mut channels = [0u8; 3];
            for (i, ch) in hex.chars().enumerate() {
                let v = ch.to_digit(16)? as u8;
                channels[i] = v * 16 + v;
            }
            Some(Rgb::new(channels[0], channels[1], channels[2]))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        _ => None,
    }
}

/// Linear per-channel interpolation between `a` and `b`, rounded to the
/// nearest integer channel.
///
/// Precondition: `ratio` is in [0, 1]. Out-of-range ratios are not clamped;
/// channels still saturate to [0, 255] after extrapolation.
pub fn mix(a: Rgb, b: Rgb, ratio: f64) -> Rgb {
    fn mix_u8(a: u8, b: u8, t: f64) -> u8 {
        let a = f64::from(a);
        let b = f64::from(b);
        (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
    }
    Rgb::new(
        mix_u8(a.r, b.r, ratio),
        mix_u8(a.g, b.g, ratio),
        mix_u8(a.b, b.b, ratio),
    )
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl serde::Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Malformed persisted colors are recoverable by contract.
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        Ok(Self::parse_lossy(&s))
    }
}
