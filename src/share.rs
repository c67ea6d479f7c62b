use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{
    color::Rgb,
    error::{BlazonError, BlazonResult},
    gradient::GradientCurve,
    params::{GlowParams, PatternParameters},
};

/// Compact transport form of the scalar parameter subset: short field names,
/// defaults omitted, JSON, then URL-safe base64 without padding. Per-ring
/// overrides are deliberately not part of share codes.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Compact {
    #[serde(rename = "rc", skip_serializing_if = "Option::is_none")]
    ring_count: Option<u32>,
    #[serde(rename = "sg", skip_serializing_if = "Option::is_none")]
    segment_count: Option<u32>,
    #[serde(rename = "st", skip_serializing_if = "Option::is_none")]
    stripe_count: Option<u32>,
    #[serde(rename = "ao", skip_serializing_if = "Option::is_none")]
    angle_offset: Option<f64>,
    #[serde(rename = "rs", skip_serializing_if = "Option::is_none")]
    rotation_speed: Option<f64>,
    #[serde(rename = "ar", skip_serializing_if = "Option::is_none")]
    alternate_rotation: Option<bool>,
    #[serde(rename = "sa", skip_serializing_if = "Option::is_none")]
    strip_angle: Option<f64>,
    #[serde(rename = "rw", skip_serializing_if = "Option::is_none")]
    ring_width_percent: Option<f64>,
    #[serde(rename = "cs", skip_serializing_if = "Option::is_none")]
    color_scheme: Option<String>,
    #[serde(rename = "pc", skip_serializing_if = "Option::is_none")]
    primary_color: Option<Rgb>,
    #[serde(rename = "xc", skip_serializing_if = "Option::is_none")]
    secondary_color: Option<Rgb>,
    #[serde(rename = "bg", skip_serializing_if = "Option::is_none")]
    background_color: Option<Rgb>,
    #[serde(rename = "ge", skip_serializing_if = "Option::is_none")]
    gradient_enabled: Option<bool>,
    #[serde(rename = "gi", skip_serializing_if = "Option::is_none")]
    gradient_intensity: Option<f64>,
    #[serde(rename = "eb", skip_serializing_if = "Option::is_none")]
    edge_brightness: Option<f64>,
    #[serde(rename = "cd", skip_serializing_if = "Option::is_none")]
    center_darkness: Option<f64>,
    #[serde(rename = "gw", skip_serializing_if = "Option::is_none")]
    gradient_width: Option<f64>,
    #[serde(rename = "gq", skip_serializing_if = "Option::is_none")]
    gradient_curve: Option<GradientCurve>,
    #[serde(rename = "le", skip_serializing_if = "Option::is_none")]
    glow_enabled: Option<bool>,
    #[serde(rename = "li", skip_serializing_if = "Option::is_none")]
    glow_intensity: Option<f64>,
    #[serde(rename = "ls", skip_serializing_if = "Option::is_none")]
    glow_size: Option<f64>,
    #[serde(rename = "lc", skip_serializing_if = "Option::is_none")]
    glow_color: Option<Rgb>,
}

fn keep<T: PartialEq>(value: T, default: T) -> Option<T> {
    (value != default).then_some(value)
}

/// Encodes the shareable subset of `params` as a URL-safe string.
pub fn encode(params: &PatternParameters) -> BlazonResult<String> {
    let d = PatternParameters::default();
    let compact = Compact {
        ring_count: keep(params.ring_count, d.ring_count),
        segment_count: keep(params.segment_count, d.segment_count),
        stripe_count: keep(params.stripe_count, d.stripe_count),
        angle_offset: keep(params.angle_offset, d.angle_offset),
        rotation_speed: keep(params.rotation_speed, d.rotation_speed),
        alternate_rotation: keep(params.alternate_rotation, d.alternate_rotation),
        strip_angle: keep(params.strip_angle, d.strip_angle),
        ring_width_percent: keep(params.ring_width_percent, d.ring_width_percent),
        color_scheme: keep(params.color_scheme.clone(), d.color_scheme),
        primary_color: keep(params.primary_color, d.primary_color),
        secondary_color: keep(params.secondary_color, d.secondary_color),
        background_color: keep(params.background_color, d.background_color),
        gradient_enabled: keep(params.gradient_enabled, d.gradient_enabled),
        gradient_intensity: keep(params.gradient_intensity, d.gradient_intensity),
        edge_brightness: keep(params.edge_brightness, d.edge_brightness),
        center_darkness: keep(params.center_darkness, d.center_darkness),
        gradient_width: keep(params.gradient_width, d.gradient_width),
        gradient_curve: keep(params.gradient_curve, d.gradient_curve),
        glow_enabled: keep(params.glow.enabled, d.glow.enabled),
        glow_intensity: keep(params.glow.intensity, d.glow.intensity),
        glow_size: keep(params.glow.size, d.glow.size),
        glow_color: keep(params.glow.color, d.glow.color),
    };

    let json = serde_json::to_vec(&compact)
        .map_err(|e| BlazonError::serde(format!("share encode failed: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a share code back into a full, validated parameter struct. Absent
/// fields take their documented defaults; only an undecodable payload errors.
pub fn decode(code: &str) -> BlazonResult<PatternParameters> {
    let json = URL_SAFE_NO_PAD
        .decode(code.trim())
        .map_err(|e| BlazonError::serde(format!("share code is not valid base64: {e}")))?;
    let compact: Compact = serde_json::from_slice(&json)
        .map_err(|e| BlazonError::serde(format!("share code is not valid JSON: {e}")))?;

    let d = PatternParameters::default();
    let params = PatternParameters {
        ring_count: compact.ring_count.unwrap_or(d.ring_count),
        segment_count: compact.segment_count.unwrap_or(d.segment_count),
        stripe_count: compact.stripe_count.unwrap_or(d.stripe_count),
        angle_offset: compact.angle_offset.unwrap_or(d.angle_offset),
        rotation_speed: compact.rotation_speed.unwrap_or(d.rotation_speed),
        alternate_rotation: compact.alternate_rotation.unwrap_or(d.alternate_rotation),
        strip_angle: compact.strip_angle.unwrap_or(d.strip_angle),
        ring_width_percent: compact.ring_width_percent.unwrap_or(d.ring_width_percent),
        color_scheme: compact.color_scheme.unwrap_or(d.color_scheme),
        primary_color: compact.primary_color.unwrap_or(d.primary_color),
        secondary_color: compact.secondary_color.unwrap_or(d.secondary_color),
        background_color: compact.background_color.unwrap_or(d.background_color),
        gradient_enabled: compact.gradient_enabled.unwrap_or(d.gradient_enabled),
        gradient_intensity: compact.gradient_intensity.unwrap_or(d.gradient_intensity),
        edge_brightness: compact.edge_brightness.unwrap_or(d.edge_brightness),
        center_darkness: compact.center_darkness.unwrap_or(d.center_darkness),
        gradient_width: compact.gradient_width.unwrap_or(d.gradient_width),
        gradient_curve: compact.gradient_curve.unwrap_or(d.gradient_curve),
        glow: GlowParams {
            enabled: compact.glow_enabled.unwrap_or(d.glow.enabled),
            intensity: compact.glow_intensity.unwrap_or(d.glow.intensity),
            size: compact.glow_size.unwrap_or(d.glow.size),
            color: compact.glow_color.unwrap_or(d.glow.color),
        },
        ring_overrides: Default::default(),
    };
    params.validated()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_shared_fields() {
        let mut params = PatternParameters {
            ring_count: 9,
            segment_count: 12,
            strip_angle: 22.5,
            gradient_curve: GradientCurve::DoublePeak,
            ..Default::default()
        };
        params.glow.enabled = true;
        params.glow.size = 20.0;
        params.primary_color = Rgb::new(1, 2, 3);

        let code = encode(&params).unwrap();
        let decoded = decode(&code).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn default_params_encode_to_empty_object() {
        let code = encode(&PatternParameters::default()).unwrap();
        let json = URL_SAFE_NO_PAD.decode(&code).unwrap();
        assert_eq!(json, b"{}");
        assert_eq!(decode(&code).unwrap(), PatternParameters::default());
    }

    #[test]
    fn decode_tolerates_absent_fields() {
        let code = URL_SAFE_NO_PAD.encode(br#"{"rc":4}"#);
        let params = decode(&code).unwrap();
        assert_eq!(params.ring_count, 4);
        assert_eq!(
            params.segment_count,
            PatternParameters::default().segment_count
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("!!!not base64!!!").is_err());
        let not_json = URL_SAFE_NO_PAD.encode(b"pattern");
        assert!(decode(&not_json).is_err());
    }

    #[test]
    fn codes_are_url_safe() {
        let mut params = PatternParameters::default();
        params.glow.enabled = true;
        params.angle_offset = 1.25;
        let code = encode(&params).unwrap();
        assert!(
            code.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
