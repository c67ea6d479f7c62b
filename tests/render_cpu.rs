use blazon::{
    AnimationController, PatternParameters, Rgb,
    geometry::{self, Band},
    render_frame,
};
use kurbo::Point;

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn pixel(frame: &blazon::Frame, x: u32, y: u32) -> [u8; 4] {
    let idx = ((y * frame.width + x) * 4) as usize;
    frame.data[idx..idx + 4].try_into().unwrap()
}

#[test]
fn cpu_render_is_deterministic_and_nonempty() {
    let params = PatternParameters::default();
    let controller = AnimationController::new(params.ring_count as usize);

    let a = render_frame(&params, controller.states(), 128, 128).unwrap();
    let b = render_frame(&params, controller.states(), 128, 128).unwrap();

    assert_eq!(a.width, 128);
    assert_eq!(a.height, 128);
    assert!(a.premultiplied);
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
    assert!(a.data.iter().any(|&x| x != 0));
}

#[test]
fn flat_scenario_resolves_24_two_color_stripes() {
    let params = PatternParameters {
        ring_count: 3,
        segment_count: 4,
        stripe_count: 2,
        angle_offset: 0.0,
        strip_angle: 0.0,
        primary_color: Rgb::new(0xff, 0x00, 0x00),
        secondary_color: Rgb::new(0x00, 0x00, 0xff),
        gradient_enabled: false,
        ..Default::default()
    };
    let controller = AnimationController::new(3);

    let size = 480u32;
    let frame = render_frame(&params, controller.states(), size, size).unwrap();
    let center = Point::new(f64::from(size) / 2.0, f64::from(size) / 2.0);
    let bands = geometry::ring_bands(&params, controller.states(), f64::from(size) / 2.0);

    let mut probed = 0usize;
    for band in &bands {
        for segment in 0..4usize {
            for stripe in 0..2usize {
                let arc = geometry::stripe_arc(band, 0.0, segment, 4, stripe, 2, 0.0);
                let probe = geometry::point_on_circle(
                    center,
                    band.middle_radius(),
                    (arc.inner_start + arc.inner_end) / 2.0,
                );
                let px = pixel(&frame, probe.x as u32, probe.y as u32);

                let expected =
                    match geometry::stripe_band(band.index, 3, segment, stripe, 2) {
                        Band::Primary => params.primary_color,
                        Band::Secondary => params.secondary_color,
                    };
                assert_eq!(
                    px,
                    [expected.r, expected.g, expected.b, 255],
                    "ring {} segment {segment} stripe {stripe}",
                    band.index
                );
                // Every stripe is exactly one of the two scheme colors.
                assert!(
                    px == [0xff, 0, 0, 255] || px == [0, 0, 0xff, 255],
                    "unexpected color {px:?}"
                );
                // Innermost and outermost rings always carry the primary band.
                if band.index == 0 || band.index == 2 {
                    assert_eq!(px, [0xff, 0, 0, 255]);
                }
                probed += 1;
            }
        }
    }
    assert_eq!(probed, 24);
}

#[test]
fn rotation_changes_pixels_between_timestamps() {
    let params = PatternParameters {
        ring_count: 4,
        rotation_speed: 0.05,
        gradient_enabled: false,
        ..Default::default()
    };
    let mut controller = AnimationController::new(4);
    controller.advance(&params, 0.0);
    let before = render_frame(&params, controller.states(), 160, 160).unwrap();
    controller.advance(&params, 500.0);
    let after = render_frame(&params, controller.states(), 160, 160).unwrap();
    assert_ne!(digest_u64(&before.data), digest_u64(&after.data));
}

#[test]
fn gradient_render_stays_within_scheme_envelope() {
    // With gradients on, stripe interiors blend between the lighter and
    // deeper variations of the base colors; the frame must still render and
    // keep the background outside the pattern untouched.
    let params = PatternParameters {
        ring_count: 2,
        ..Default::default()
    };
    let controller = AnimationController::new(2);
    let frame = render_frame(&params, controller.states(), 200, 200).unwrap();

    let bg = params.background_color;
    assert_eq!(pixel(&frame, 2, 2), [bg.r, bg.g, bg.b, 255]);
    assert_eq!(pixel(&frame, 197, 2), [bg.r, bg.g, bg.b, 255]);
}
