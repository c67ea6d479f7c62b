use kurbo::Point;

use crate::{
    anim::RingState,
    color::Rgb,
    error::{BlazonError, BlazonResult},
    geometry::{self, Band},
    gradient::{ColorVariations, GradientStop, gradient_stops},
    params::PatternParameters,
};

/// A rendered frame: **premultiplied** RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Renders one frame into a fresh pixmap and reads it back.
///
/// This is a pure function of (parameters, ring states, surface size):
/// timestamps only ever enter the animation controller. The same algorithm
/// also serves offscreen targets through [`render_to_pixmap`].
#[tracing::instrument(skip(params, states))]
pub fn render_frame(
    params: &PatternParameters,
    states: &[RingState],
    width: u32,
    height: u32,
) -> BlazonResult<Frame> {
    let mut pixmap = new_pixmap(width, height)?;
    render_to_pixmap(params, states, &mut pixmap)?;
    Ok(Frame {
        width,
        height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

/// Creates a render surface, failing fast when the target is unusable.
pub fn new_pixmap(width: u32, height: u32) -> BlazonResult<vello_cpu::Pixmap> {
    if width == 0 || height == 0 {
        return Err(BlazonError::validation(
            "render target must have nonzero width and height",
        ));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| BlazonError::render("render target width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BlazonError::render("render target height exceeds u16"))?;
    Ok(vello_cpu::Pixmap::new(w, h))
}

/// Renders the pattern into `pixmap`: background fill, then rings inside-out,
/// segments, stripes. Degenerate gradient geometry falls back to a flat fill
/// per stripe; no stripe aborts the frame.
///
/// All radii derive from the pixmap's current dimensions, so resizing between
/// frames only requires a new pixmap.
pub fn render_to_pixmap(
    params: &PatternParameters,
    states: &[RingState],
    pixmap: &mut vello_cpu::Pixmap,
) -> BlazonResult<()> {
    let width = u32::from(pixmap.width());
    let height = u32::from(pixmap.height());
    if width == 0 || height == 0 {
        return Err(BlazonError::validation(
            "render target must have nonzero width and height",
        ));
    }

    let mut ctx = vello_cpu::RenderContext::new(pixmap.width(), pixmap.height());

    // Background fill before any stripe.
    ctx.set_paint(to_cpu_color(params.background_color));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(width),
        f64::from(height),
    ));

    let center = Point::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
    // Recomputed every frame, never cached across resizes.
    let max_radius = f64::from(width.min(height)) / 2.0;
    let bands = geometry::ring_bands(params, states, max_radius);

    let ring_count = params.ring_count as usize;
    for band in &bands {
        let r = band.index;
        let rotation = states.get(r).map_or(0.0, |s| s.rotation);
        let base_angle = params.angle_offset + rotation;
        let shear_deg = params.stripe_angle_for(r);
        let solid = params.override_for(r).and_then(|o| o.solid_color);

        for segment in 0..params.segment_count as usize {
            for stripe in 0..params.stripe_count as usize {
                let fill = solid.unwrap_or_else(|| {
                    match geometry::stripe_band(
                        r,
                        ring_count,
                        segment,
                        stripe,
                        params.stripe_count as usize,
                    ) {
                        Band::Primary => params.primary_color,
                        Band::Secondary => params.secondary_color,
                    }
                });

                let arc = geometry::stripe_arc(
                    band,
                    base_angle,
                    segment,
                    params.segment_count,
                    stripe,
                    params.stripe_count,
                    shear_deg,
                );
                let path = geometry::stripe_path(center, band, &arc);

                set_stripe_paint(&mut ctx, params, center, band, &arc, fill);
                ctx.fill_path(&bezpath_to_cpu(&path));
            }
        }
    }

    ctx.flush();
    ctx.render_to_pixmap(pixmap);
    Ok(())
}

fn set_stripe_paint(
    ctx: &mut vello_cpu::RenderContext,
    params: &PatternParameters,
    center: Point,
    band: &geometry::RingBand,
    arc: &geometry::StripeArc,
    fill: Rgb,
) {
    if params.gradient_enabled {
        let vars = ColorVariations::of(
            fill,
            params.edge_brightness * params.gradient_intensity,
            params.center_darkness * params.gradient_intensity,
        );
        if let Some((a, b)) = geometry::gradient_axis(center, band, arc, params.gradient_width) {
            let stops = gradient_stops(params.gradient_curve, vars);
            ctx.set_paint(linear_gradient(a, b, &stops));
            return;
        }
    }
    ctx.set_paint(to_cpu_color(fill));
}

fn linear_gradient(a: Point, b: Point, stops: &[GradientStop]) -> vello_cpu::peniko::Gradient {
    let cpu_stops: Vec<vello_cpu::peniko::ColorStop> = stops
        .iter()
        .map(|s| vello_cpu::peniko::ColorStop::from((s.offset, to_cpu_color(s.color))))
        .collect();
    vello_cpu::peniko::Gradient::new_linear(point_to_cpu(a), point_to_cpu(b))
        .with_stops(cpu_stops.as_slice())
}

fn to_cpu_color(c: Rgb) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, 255)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
