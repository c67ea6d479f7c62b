use std::f64::consts::{FRAC_PI_4, TAU};

use kurbo::{BezPath, Point, Vec2};

use crate::{anim::RingState, params::PatternParameters};

/// Ring widths are expressed against `max_radius / BASE_UNIT_DIVISOR`, a
/// fixed reference independent of the actual ring count so visual density is
/// comparable across ring-count changes.
pub const BASE_UNIT_DIVISOR: f64 = 12.0;

/// Cap on the angular widening applied to sheared outer edges. Without it,
/// stripes would overlap visually at steep shear angles.
pub const SHEAR_WIDEN_CAP: f64 = 1.2;

/// Shear angles beyond this are treated as this for the widening factor.
pub const SHEAR_ANGLE_CAP: f64 = FRAC_PI_4;

/// Flattening tolerance for arc-to-cubic conversion.
const ARC_TOLERANCE: f64 = 0.1;

/// Which of the two scheme colors a stripe resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Primary,
    Secondary,
}

/// A ring's radial extent for the current frame. Derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingBand {
    pub index: usize,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl RingBand {
    pub fn thickness(&self) -> f64 {
        self.outer_radius - self.inner_radius
    }

    pub fn middle_radius(&self) -> f64 {
        (self.inner_radius + self.outer_radius) / 2.0
    }
}

/// One stripe's angular extent. The outer edge carries the shear shift and
/// the capped widening; the inner edge is the raw partition, so spans within
/// a ring tile `[0, 2π)` exactly before shear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StripeArc {
    pub inner_start: f64,
    pub inner_end: f64,
    pub outer_start: f64,
    pub outer_end: f64,
}

impl StripeArc {
    pub fn inner_span(&self) -> f64 {
        self.inner_end - self.inner_start
    }
}

/// Base unit for ring widths at the given outer radius.
pub fn base_unit(max_radius: f64) -> f64 {
    max_radius / BASE_UNIT_DIVISOR
}

/// Computes every ring's radial band from cumulative widths.
///
/// `width[r] = base_unit * (width_percent[r] / 100) * width_factor[r]`, and
/// each ring starts exactly where the previous one ends. A state array that
/// does not cover `ring_count` (mid-swap resize) contributes factor 1.
pub fn ring_bands(
    params: &PatternParameters,
    states: &[RingState],
    max_radius: f64,
) -> Vec<RingBand> {
    let unit = base_unit(max_radius);
    let mut bands = Vec::with_capacity(params.ring_count as usize);
    let mut inner = 0.0;
    for r in 0..params.ring_count as usize {
        let factor = states.get(r).map_or(1.0, |s| s.width_factor);
        let width = unit * (params.width_percent_for(r) / 100.0) * factor;
        bands.push(RingBand {
            index: r,
            inner_radius: inner,
            outer_radius: inner + width,
        });
        inner += width;
    }
    bands
}

/// Resolves the color band for a stripe.
///
/// Interior rings alternate by `ring_phase XOR span_phase`, where the span
/// phase folds segment and stripe indices together so that adjacent stripes
/// across a segment boundary always differ, for any stripe count. The
/// innermost and outermost rings force the primary band to keep the
/// pattern's boundary visually stable.
pub fn stripe_band(
    ring: usize,
    ring_count: usize,
    segment: usize,
    stripe: usize,
    stripe_count: usize,
) -> Band {
    if ring == 0 || ring + 1 == ring_count {
        return Band::Primary;
    }
    let ring_phase = ring % 2;
    let span_phase = (segment * stripe_count + stripe) % 2;
    if ring_phase ^ span_phase == 0 {
        Band::Primary
    } else {
        Band::Secondary
    }
}

/// Computes a stripe's angular extent within its ring.
///
/// `base_angle` is the sum of the global angle offset and the ring's current
/// rotation; `shear_deg` is the effective stripe angle for the ring. The
/// shear shift is scaled by `thickness / middle_radius` so shearing never
/// changes effective ring thickness.
pub fn stripe_arc(
    band: &RingBand,
    base_angle: f64,
    segment: usize,
    segment_count: u32,
    stripe: usize,
    stripe_count: u32,
    shear_deg: f64,
) -> StripeArc {
    let segment_span = TAU / f64::from(segment_count);
    let stripe_span = segment_span / f64::from(stripe_count);
    let inner_start = base_angle + segment as f64 * segment_span + stripe as f64 * stripe_span;
    let inner_end = inner_start + stripe_span;

    let shear_rad = shear_deg.to_radians();
    let middle = band.middle_radius();
    let shift = if middle > 0.0 {
        shear_rad * band.thickness() / middle
    } else {
        0.0
    };
    let widen = shear_widen_factor(shear_rad);

    let center = (inner_start + inner_end) / 2.0 + shift;
    let half = stripe_span / 2.0 * widen;
    StripeArc {
        inner_start,
        inner_end,
        outer_start: center - half,
        outer_end: center + half,
    }
}

/// `min(1.2, 1 / cos(min(π/4, |angle|)))`; identity at zero shear.
pub fn shear_widen_factor(shear_rad: f64) -> f64 {
    let capped = shear_rad.abs().min(SHEAR_ANGLE_CAP);
    (1.0 / capped.cos()).min(SHEAR_WIDEN_CAP)
}

pub fn point_on_circle(center: Point, radius: f64, angle: f64) -> Point {
    Point::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

/// Builds the closed stripe outline: inner arc forward, radial edge, outer
/// arc backward, close. Arcs are flattened to cubics.
pub fn stripe_path(center: Point, band: &RingBand, arc: &StripeArc) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(point_on_circle(center, band.inner_radius, arc.inner_start));
    append_arc(
        &mut path,
        center,
        band.inner_radius,
        arc.inner_start,
        arc.inner_end - arc.inner_start,
    );
    path.line_to(point_on_circle(center, band.outer_radius, arc.outer_end));
    append_arc(
        &mut path,
        center,
        band.outer_radius,
        arc.outer_end,
        arc.outer_start - arc.outer_end,
    );
    path.close_path();
    path
}

fn append_arc(path: &mut BezPath, center: Point, radius: f64, start: f64, sweep: f64) {
    if radius <= 0.0 || sweep == 0.0 {
        path.line_to(point_on_circle(center, radius, start + sweep));
        return;
    }
    let arc = kurbo::Arc::new(center, Vec2::new(radius, radius), start, sweep, 0.0);
    arc.to_cubic_beziers(ARC_TOLERANCE, |p1, p2, p| {
        path.curve_to(p1, p2, p);
    });
}

/// The two endpoints of a stripe's linear gradient.
///
/// The axis is perpendicular to the inner-midpoint → outer-midpoint vector,
/// centered between the midpoints, with half-length `middle_radius *
/// angular_half_width * gradient_width`. Returns `None` for degenerate
/// geometry (zero-length vector, non-finite coordinates); callers fall back
/// to a flat fill.
pub fn gradient_axis(
    center: Point,
    band: &RingBand,
    arc: &StripeArc,
    gradient_width: f64,
) -> Option<(Point, Point)> {
    let inner_mid = point_on_circle(
        center,
        band.inner_radius,
        (arc.inner_start + arc.inner_end) / 2.0,
    );
    let outer_mid = point_on_circle(
        center,
        band.outer_radius,
        (arc.outer_start + arc.outer_end) / 2.0,
    );

    let v = outer_mid - inner_mid;
    let len = v.hypot();
    if !len.is_finite() || len == 0.0 {
        return None;
    }
    let perp = Vec2::new(-v.y / len, v.x / len);

    let half_len = band.middle_radius() * (arc.inner_span() / 2.0).abs() * gradient_width;
    if !half_len.is_finite() || half_len <= 0.0 {
        return None;
    }

    let mid = inner_mid.midpoint(outer_mid);
    let a = mid - perp * half_len;
    let b = mid + perp * half_len;
    if !a.x.is_finite() || !a.y.is_finite() || !b.x.is_finite() || !b.y.is_finite() {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::AnimationController;

    fn flat_params(ring_count: u32) -> PatternParameters {
        PatternParameters {
            ring_count,
            ..Default::default()
        }
    }

    #[test]
    fn rings_are_contiguous_and_sum_matches() {
        for ring_count in [1u32, 2, 3, 7, 12] {
            let params = flat_params(ring_count);
            let controller = AnimationController::new(ring_count as usize);
            let bands = ring_bands(&params, controller.states(), 240.0);
            assert_eq!(bands.len(), ring_count as usize);

            let unit = base_unit(240.0);
            let expected_total: f64 = (0..ring_count as usize)
                .map(|r| unit * params.width_percent_for(r) / 100.0)
                .sum();
            let total = bands.last().unwrap().outer_radius;
            assert!((total - expected_total).abs() < 1e-9);

            assert_eq!(bands[0].inner_radius, 0.0);
            for w in bands.windows(2) {
                assert_eq!(w[0].outer_radius, w[1].inner_radius);
                assert!(w[1].outer_radius > w[1].inner_radius);
            }
        }
    }

    #[test]
    fn override_width_flows_into_bands() {
        let mut params = flat_params(3);
        params.ring_overrides.insert(
            1,
            crate::params::RingOverride {
                width_percent: Some(200.0),
                ..Default::default()
            },
        );
        let controller = AnimationController::new(3);
        let bands = ring_bands(&params, controller.states(), 240.0);
        let unit = base_unit(240.0);
        assert!((bands[1].thickness() - unit * 2.0).abs() < 1e-9);
        assert!((bands[0].thickness() - unit).abs() < 1e-9);
    }

    #[test]
    fn band_forces_primary_on_boundary_rings() {
        for stripe in 0..4 {
            for segment in 0..4 {
                assert_eq!(stripe_band(0, 5, segment, stripe, 4), Band::Primary);
                assert_eq!(stripe_band(4, 5, segment, stripe, 4), Band::Primary);
            }
        }
    }

    #[test]
    fn adjacent_stripes_differ_across_segment_boundaries() {
        // Interior rings only; odd and even stripe counts both hold.
        for stripe_count in [1usize, 2, 3, 4, 5] {
            for segment_count in [2usize, 3, 4, 6] {
                for ring in 1..4 {
                    let mut previous = None;
                    for segment in 0..segment_count {
                        for stripe in 0..stripe_count {
                            let band = stripe_band(ring, 5, segment, stripe, stripe_count);
                            if let Some(prev) = previous {
                                assert_ne!(
                                    prev, band,
                                    "doubled color at ring {ring}, segment {segment}, \
                                     stripe {stripe} (stripe_count {stripe_count})"
                                );
                            }
                            previous = Some(band);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn alternation_is_deterministic() {
        assert_eq!(stripe_band(1, 5, 0, 0, 3), stripe_band(1, 5, 0, 0, 3));
        assert_ne!(stripe_band(1, 5, 0, 0, 3), stripe_band(2, 5, 0, 0, 3));
    }

    #[test]
    fn zero_shear_is_identity() {
        let band = RingBand {
            index: 1,
            inner_radius: 40.0,
            outer_radius: 60.0,
        };
        let arc = stripe_arc(&band, 0.3, 2, 8, 1, 3, 0.0);
        assert!((arc.outer_start - arc.inner_start).abs() < 1e-12);
        assert!((arc.outer_end - arc.inner_end).abs() < 1e-12);
    }

    #[test]
    fn shear_shifts_only_outer_edge() {
        let band = RingBand {
            index: 1,
            inner_radius: 40.0,
            outer_radius: 60.0,
        };
        let flat = stripe_arc(&band, 0.0, 0, 8, 0, 2, 0.0);
        let sheared = stripe_arc(&band, 0.0, 0, 8, 0, 2, 30.0);
        assert_eq!(flat.inner_start, sheared.inner_start);
        assert_eq!(flat.inner_end, sheared.inner_end);
        assert!(sheared.outer_start > flat.outer_start - 1e-9);
        assert_ne!(flat.outer_start, sheared.outer_start);
    }

    #[test]
    fn widen_factor_is_capped() {
        assert_eq!(shear_widen_factor(0.0), 1.0);
        assert!((shear_widen_factor(0.3) - 1.0 / 0.3f64.cos()).abs() < 1e-12);
        assert_eq!(shear_widen_factor(1.5), SHEAR_WIDEN_CAP);
        assert_eq!(shear_widen_factor(-1.5), SHEAR_WIDEN_CAP);
    }

    #[test]
    fn stripes_partition_the_ring() {
        let band = RingBand {
            index: 2,
            inner_radius: 40.0,
            outer_radius: 60.0,
        };
        let (segments, stripes) = (6u32, 3u32);
        let mut cursor = 0.0;
        for segment in 0..segments as usize {
            for stripe in 0..stripes as usize {
                let arc = stripe_arc(&band, 0.0, segment, segments, stripe, stripes, 0.0);
                assert!((arc.inner_start - cursor).abs() < 1e-9);
                cursor = arc.inner_end;
            }
        }
        assert!((cursor - TAU).abs() < 1e-9);
    }

    #[test]
    fn gradient_axis_rejects_degenerate_geometry() {
        let band = RingBand {
            index: 0,
            inner_radius: 0.0,
            outer_radius: 0.0,
        };
        let arc = stripe_arc(&band, 0.0, 0, 4, 0, 2, 0.0);
        assert!(gradient_axis(Point::new(100.0, 100.0), &band, &arc, 1.0).is_none());
    }

    #[test]
    fn gradient_axis_is_perpendicular() {
        let band = RingBand {
            index: 1,
            inner_radius: 40.0,
            outer_radius: 60.0,
        };
        let arc = stripe_arc(&band, 0.0, 0, 8, 0, 2, 0.0);
        let center = Point::new(100.0, 100.0);
        let (a, b) = gradient_axis(center, &band, &arc, 1.0).unwrap();

        let inner_mid = point_on_circle(
            center,
            band.inner_radius,
            (arc.inner_start + arc.inner_end) / 2.0,
        );
        let outer_mid = point_on_circle(
            center,
            band.outer_radius,
            (arc.outer_start + arc.outer_end) / 2.0,
        );
        let radial = outer_mid - inner_mid;
        let axis = b - a;
        assert!(radial.dot(axis).abs() < 1e-9);
    }

    #[test]
    fn stripe_path_is_closed_and_nonempty() {
        let band = RingBand {
            index: 1,
            inner_radius: 40.0,
            outer_radius: 60.0,
        };
        let arc = stripe_arc(&band, 0.0, 0, 8, 0, 2, 15.0);
        let path = stripe_path(Point::new(100.0, 100.0), &band, &arc);
        let elements: Vec<_> = path.elements().to_vec();
        assert!(elements.len() >= 4);
        assert!(matches!(elements.last(), Some(kurbo::PathEl::ClosePath)));
    }
}
