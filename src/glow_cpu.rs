use crate::{
    error::{BlazonError, BlazonResult},
    params::{GlowParams, MAX_GLOW_SIZE},
};

/// CPU glow pass over a premultiplied RGBA8 raster.
///
/// A separable weighted blur (`exp(-d²/size²)` kernel in Q16 fixed point)
/// spreads the source's energy into a halo; the halo is then tinted with the
/// glow color and added back only where the source is transparent or dark,
/// scaled by `intensity`. The source buffer is never mutated.
pub fn glow_composite_rgba8(
    src: &[u8],
    width: u32,
    height: u32,
    glow: &GlowParams,
) -> BlazonResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BlazonError::render("glow buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(BlazonError::render(
            "glow_composite_rgba8 expects src matching width*height*4",
        ));
    }
    if !glow.size.is_finite() || !glow.intensity.is_finite() {
        return Err(BlazonError::validation("glow size/intensity must be finite"));
    }

    let radius = glow.size.ceil().clamp(0.0, MAX_GLOW_SIZE) as u32;
    let intensity = glow.intensity.clamp(0.0, 1.0);
    if radius == 0 || intensity <= 0.0 {
        return Ok(src.to_vec());
    }

    let kernel = halo_kernel_q16(radius, glow.size)?;
    let mut tmp = vec![0u8; expected_len];
    let mut halo = vec![0u8; expected_len];
    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut halo, width, height, &kernel);

    let mut out = src.to_vec();
    let tint = [glow.color.r, glow.color.g, glow.color.b];
    for (dst, blurred) in out.chunks_exact_mut(4).zip(halo.chunks_exact(4)) {
        // Halo energy: brightest blurred color channel. Premultiplied input
        // keeps this zero in empty surroundings regardless of alpha.
        let energy = blurred[0].max(blurred[1]).max(blurred[2]);
        if energy == 0 {
            continue;
        }

        // Glow-source mask: alpha-or-darkness. Opaque bright pixels receive
        // nothing; transparent or dark regions receive the full halo.
        let transparency = 255 - dst[3];
        let darkness = 255 - dst[0].max(dst[1]).max(dst[2]);
        let mask = transparency.max(darkness);
        if mask == 0 {
            continue;
        }

        let strength = (f64::from(energy) / 255.0)
            * (f64::from(mask) / 255.0)
            * intensity;
        let add_a = (strength * 255.0).round() as u8;
        dst[0] = dst[0].saturating_add(scale_u8(tint[0], strength));
        dst[1] = dst[1].saturating_add(scale_u8(tint[1], strength));
        dst[2] = dst[2].saturating_add(scale_u8(tint[2], strength));
        dst[3] = dst[3].saturating_add(add_a);
    }
    Ok(out)
}

fn scale_u8(c: u8, f: f64) -> u8 {
    (f64::from(c) * f).round().clamp(0.0, 255.0) as u8
}

/// Normalized `exp(-d²/size²)` weights in Q16, corrected so they sum to
/// exactly 1<<16.
fn halo_kernel_q16(radius: u32, size: f64) -> BlazonResult<Vec<u32>> {
    if !size.is_finite() || size <= 0.0 {
        return Err(BlazonError::validation("glow size must be > 0"));
    }

    let r = radius as i32;
    let denom = size * size;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    for i in -r..=r {
        let d = f64::from(i);
        let w = (-d * d / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(BlazonError::render("glow kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let corrected = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = corrected as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    (((acc + 32768) >> 16).min(255)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn glow(size: f64, intensity: f64) -> GlowParams {
        GlowParams {
            enabled: true,
            intensity,
            size,
            color: Rgb::new(255, 128, 0),
        }
    }

    #[test]
    fn zero_radius_or_intensity_is_identity() {
        let src = vec![9u8, 8, 7, 255, 1, 2, 3, 255];
        assert_eq!(
            glow_composite_rgba8(&src, 1, 2, &glow(0.0, 1.0)).unwrap(),
            src
        );
        assert_eq!(
            glow_composite_rgba8(&src, 1, 2, &glow(4.0, 0.0)).unwrap(),
            src
        );
    }

    #[test]
    fn source_is_not_mutated() {
        let src = vec![200u8; 6 * 6 * 4];
        let before = src.clone();
        let _ = glow_composite_rgba8(&src, 6, 6, &glow(3.0, 0.8)).unwrap();
        assert_eq!(src, before);
    }

    #[test]
    fn halo_spills_into_transparent_neighbors() {
        let (w, h) = (9u32, 9u32);
        let mut src = vec![0u8; (w * h * 4) as usize];
        let center = ((4 * w + 4) * 4) as usize;
        src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

        let out = glow_composite_rgba8(&src, w, h, &glow(2.0, 1.0)).unwrap();

        // A neighbor that started fully transparent picked up tinted glow.
        let n = ((4 * w + 5) * 4) as usize;
        assert_eq!(&src[n..n + 4], &[0, 0, 0, 0]);
        assert!(out[n] > 0);
        assert!(out[n + 3] > 0);
    }

    #[test]
    fn opaque_bright_pixels_receive_no_glow() {
        let (w, h) = (5u32, 5u32);
        let src = vec![255u8; (w * h * 4) as usize];
        let out = glow_composite_rgba8(&src, w, h, &glow(2.0, 1.0)).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn kernel_is_normalized() {
        let k = halo_kernel_q16(5, 3.0).unwrap();
        assert_eq!(k.len(), 11);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(glow_composite_rgba8(&[0u8; 12], 2, 2, &glow(2.0, 1.0)).is_err());
    }
}
