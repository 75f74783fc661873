// Boost/Apache2 License

//! Rasterization through `tiny-skia`.
//!
//! Every draw is a fill of a pixel-space path with the identity transform, so sources are
//! always prepared in pixel space.

use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, GradientStop, LinearGradient, Mask, MaskType,
    Paint, Pixmap, Point, RadialGradient, Rect, Shader, SpreadMode, Stroke, StrokeDash,
    Transform,
};

use super::matrix::{
    matrix_determinant, matrix_inverse, matrix_multiply, matrix_transform_bounds, to_transform,
    RawMatrix,
};
use super::pattern::{ColorStop, PatternKind, RawPattern};
use super::surface::RawSurface;
use super::{
    RawColor, RawPoint, RawStatus, ANTIALIAS_NONE, EXTEND_NONE, EXTEND_REFLECT, EXTEND_REPEAT,
    FILL_RULE_EVEN_ODD, FILTER_BEST, FILTER_FAST, FILTER_GAUSSIAN, FILTER_NEAREST,
    LINE_CAP_ROUND, LINE_CAP_SQUARE, LINE_JOIN_BEVEL, LINE_JOIN_ROUND, OPERATOR_ADD,
    OPERATOR_ATOP, OPERATOR_CLEAR, OPERATOR_COLOR_BURN, OPERATOR_COLOR_DODGE, OPERATOR_DARKEN,
    OPERATOR_DEST, OPERATOR_DEST_ATOP, OPERATOR_DEST_IN, OPERATOR_DEST_OUT, OPERATOR_DEST_OVER,
    OPERATOR_DIFFERENCE, OPERATOR_EXCLUSION, OPERATOR_HARD_LIGHT, OPERATOR_HSL_COLOR,
    OPERATOR_HSL_HUE, OPERATOR_HSL_LUMINOSITY, OPERATOR_HSL_SATURATION, OPERATOR_IN,
    OPERATOR_LIGHTEN, OPERATOR_MULTIPLY, OPERATOR_OUT, OPERATOR_OVERLAY, OPERATOR_SATURATE,
    OPERATOR_SCREEN, OPERATOR_SOFT_LIGHT, OPERATOR_SOURCE, OPERATOR_XOR, STATUS_DEVICE_ERROR,
    STATUS_SUCCESS,
};

/// A prepared source, in pixel space.
pub(crate) enum Source {
    Solid(Color),
    Gradient(Shader<'static>),
    /// A surface pattern drawn into a target-sized layer.
    Layer(Pixmap),
}

impl Source {
    fn transparent() -> Self {
        Source::Solid(Color::TRANSPARENT)
    }

    fn shader(&self) -> Shader<'_> {
        match self {
            Source::Solid(color) => Shader::SolidColor(*color),
            Source::Gradient(shader) => shader.clone(),
            Source::Layer(layer) => tiny_skia::Pattern::new(
                layer.as_ref(),
                SpreadMode::Pad,
                FilterQuality::Nearest,
                1.0,
                Transform::identity(),
            ),
        }
    }
}

/// How a draw composites.
pub(crate) struct Draw<'a> {
    pub(crate) source: &'a Source,
    pub(crate) operator: i32,
    pub(crate) antialias: i32,
    pub(crate) mask: Option<&'a Mask>,
}

impl Draw<'_> {
    fn paint(&self) -> Paint<'_> {
        Paint {
            shader: self.source.shader(),
            blend_mode: blend_mode(self.operator),
            anti_alias: self.antialias != ANTIALIAS_NONE,
            ..Paint::default()
        }
    }
}

/// Line settings for a stroke.
pub(crate) struct StrokeStyle<'a> {
    pub(crate) width: f64,
    pub(crate) cap: i32,
    pub(crate) join: i32,
    pub(crate) miter_limit: f64,
    pub(crate) dash: &'a [f64],
    pub(crate) dash_offset: f64,
}

pub(crate) fn blend_mode(operator: i32) -> BlendMode {
    match operator {
        OPERATOR_CLEAR => BlendMode::Clear,
        OPERATOR_SOURCE => BlendMode::Source,
        OPERATOR_IN => BlendMode::SourceIn,
        OPERATOR_OUT => BlendMode::SourceOut,
        OPERATOR_ATOP => BlendMode::SourceAtop,
        OPERATOR_DEST => BlendMode::Destination,
        OPERATOR_DEST_OVER => BlendMode::DestinationOver,
        OPERATOR_DEST_IN => BlendMode::DestinationIn,
        OPERATOR_DEST_OUT => BlendMode::DestinationOut,
        OPERATOR_DEST_ATOP => BlendMode::DestinationAtop,
        OPERATOR_XOR => BlendMode::Xor,
        // There is no saturating blend; plain addition is the closest.
        OPERATOR_ADD | OPERATOR_SATURATE => BlendMode::Plus,
        OPERATOR_MULTIPLY => BlendMode::Multiply,
        OPERATOR_SCREEN => BlendMode::Screen,
        OPERATOR_OVERLAY => BlendMode::Overlay,
        OPERATOR_DARKEN => BlendMode::Darken,
        OPERATOR_LIGHTEN => BlendMode::Lighten,
        OPERATOR_COLOR_DODGE => BlendMode::ColorDodge,
        OPERATOR_COLOR_BURN => BlendMode::ColorBurn,
        OPERATOR_HARD_LIGHT => BlendMode::HardLight,
        OPERATOR_SOFT_LIGHT => BlendMode::SoftLight,
        OPERATOR_DIFFERENCE => BlendMode::Difference,
        OPERATOR_EXCLUSION => BlendMode::Exclusion,
        OPERATOR_HSL_HUE => BlendMode::Hue,
        OPERATOR_HSL_SATURATION => BlendMode::Saturation,
        OPERATOR_HSL_COLOR => BlendMode::Color,
        OPERATOR_HSL_LUMINOSITY => BlendMode::Luminosity,
        _ => BlendMode::SourceOver,
    }
}

pub(crate) fn fill_rule(rule: i32) -> FillRule {
    if rule == FILL_RULE_EVEN_ODD {
        FillRule::EvenOdd
    } else {
        FillRule::Winding
    }
}

fn color(c: RawColor) -> Color {
    let c = c.clamped();
    Color::from_rgba(c.red as f32, c.green as f32, c.blue as f32, c.alpha as f32)
        .unwrap_or(Color::TRANSPARENT)
}

fn point(p: RawPoint) -> Point {
    Point::from_xy(p.x as f32, p.y as f32)
}

fn spread_mode(extend: i32) -> SpreadMode {
    match extend {
        EXTEND_REPEAT => SpreadMode::Repeat,
        EXTEND_REFLECT => SpreadMode::Reflect,
        _ => SpreadMode::Pad,
    }
}

fn filter_quality(filter: i32) -> FilterQuality {
    match filter {
        FILTER_FAST | FILTER_NEAREST => FilterQuality::Nearest,
        FILTER_BEST | FILTER_GAUSSIAN => FilterQuality::Bicubic,
        _ => FilterQuality::Bilinear,
    }
}

/// Stops of a gradient with at least two entries, or `None` if it has no stops.
fn normalized_stops(stops: &[ColorStop]) -> Option<Vec<ColorStop>> {
    match stops {
        [] => None,
        [only] => Some(vec![
            ColorStop {
                offset: 0.0,
                color: only.color,
            },
            ColorStop {
                offset: 1.0,
                color: only.color,
            },
        ]),
        _ => Some(stops.to_vec()),
    }
}

/// Remap stops into `[lo, hi]` and make everything outside that range transparent, so a
/// padded gradient behaves as an unextended one.
fn unextended_stops(stops: &[ColorStop], lo: f64, hi: f64) -> Vec<GradientStop> {
    let clear = Color::TRANSPARENT;
    let mut out = Vec::with_capacity(stops.len() + 6);
    let first = stops.first().map_or(clear, |s| color(s.color));
    let last = stops.last().map_or(clear, |s| color(s.color));

    out.push(GradientStop::new(0.0, clear));
    out.push(GradientStop::new(lo as f32, clear));
    out.push(GradientStop::new(lo as f32, first));
    out.extend(
        stops
            .iter()
            .map(|s| GradientStop::new((lo + s.offset * (hi - lo)) as f32, color(s.color))),
    );
    out.push(GradientStop::new(hi as f32, last));
    out.push(GradientStop::new(hi as f32, clear));
    out.push(GradientStop::new(1.0, clear));
    out
}

fn linear_source(
    pattern: &RawPattern,
    p0: RawPoint,
    p1: RawPoint,
    pixel_from_pattern: &RawMatrix,
) -> Source {
    let stops = match normalized_stops(&pattern.stops()) {
        Some(stops) => stops,
        None => return Source::transparent(),
    };
    let ts = to_transform(pixel_from_pattern);

    let shader = if pattern.extend() == EXTEND_NONE {
        // Triple the gradient line, the middle third holds the real stops.
        let d = RawPoint::new(p1.x - p0.x, p1.y - p0.y);
        let start = RawPoint::new(p0.x - d.x, p0.y - d.y);
        let end = RawPoint::new(p1.x + d.x, p1.y + d.y);
        LinearGradient::new(
            point(start),
            point(end),
            unextended_stops(&stops, 1.0 / 3.0, 2.0 / 3.0),
            SpreadMode::Pad,
            ts,
        )
    } else {
        LinearGradient::new(
            point(p0),
            point(p1),
            stops
                .iter()
                .map(|s| GradientStop::new(s.offset as f32, color(s.color)))
                .collect(),
            spread_mode(pattern.extend()),
            ts,
        )
    };

    shader.map_or_else(Source::transparent, Source::Gradient)
}

/// The renderer only knows gradients whose start circle has radius zero, so the inner
/// radius is folded into the stop offsets. This is exact for concentric circles and an
/// approximation otherwise.
fn radial_source(
    pattern: &RawPattern,
    (c0, r0): (RawPoint, f64),
    (c1, r1): (RawPoint, f64),
    pixel_from_pattern: &RawMatrix,
) -> Source {
    let stops = match normalized_stops(&pattern.stops()) {
        Some(stops) => stops,
        None => return Source::transparent(),
    };

    let (focal, center, outer, inner, reversed) = if r0 <= r1 {
        (c0, c1, r1, r0.max(0.0), false)
    } else {
        (c1, c0, r0, r1.max(0.0), true)
    };
    if outer <= 0.0 {
        return Source::transparent();
    }

    let start = inner / outer;
    let mut folded: Vec<ColorStop> = stops
        .iter()
        .map(|s| {
            let t = if reversed { 1.0 - s.offset } else { s.offset };
            ColorStop {
                offset: start + t * (1.0 - start),
                color: s.color,
            }
        })
        .collect();
    if reversed {
        folded.reverse();
    }

    let ts = to_transform(pixel_from_pattern);
    let shader = if pattern.extend() == EXTEND_NONE {
        // Double the radius so that everything past the outer circle lands in the
        // transparent tail. The center moves with it to keep the circles in place.
        let far = RawPoint::new(
            focal.x + 2.0 * (center.x - focal.x),
            focal.y + 2.0 * (center.y - focal.y),
        );
        let halved: Vec<ColorStop> = folded
            .iter()
            .map(|s| ColorStop {
                offset: if start < 1.0 { (s.offset - start) / (1.0 - start) } else { 0.0 },
                color: s.color,
            })
            .collect();
        RadialGradient::new(
            point(focal),
            point(far),
            (outer * 2.0) as f32,
            unextended_stops(&halved, start / 2.0, 0.5),
            SpreadMode::Pad,
            ts,
        )
    } else {
        RadialGradient::new(
            point(focal),
            point(center),
            outer as f32,
            folded
                .iter()
                .map(|s| GradientStop::new(s.offset as f32, color(s.color)))
                .collect(),
            spread_mode(pattern.extend()),
            ts,
        )
    };

    shader.map_or_else(Source::transparent, Source::Gradient)
}

fn surface_source(
    pattern: &RawPattern,
    surface: &RawSurface,
    pixel_from_pattern: &RawMatrix,
    (width, height): (u32, u32),
) -> Result<Source, RawStatus> {
    let pixels = surface
        .pixels()
        .try_borrow()
        .map_err(|_| STATUS_DEVICE_ERROR)?;
    let image = match pixels.as_ref() {
        Some(image) => image,
        None => return Ok(Source::transparent()),
    };

    // Pattern space is the device space of the source surface.
    let source_pixel_to_pattern = match matrix_inverse(&surface.pixel_from_device()) {
        Some(m) => m,
        None => return Ok(Source::transparent()),
    };
    let target_from_source = matrix_multiply(&source_pixel_to_pattern, pixel_from_pattern);
    let source_from_target = match matrix_inverse(&target_from_source) {
        Some(m) => m,
        None => return Ok(Source::transparent()),
    };

    let (x1, y1, x2, y2) = if pattern.extend() == EXTEND_NONE {
        (0.0, 0.0, f64::from(image.width()), f64::from(image.height()))
    } else {
        matrix_transform_bounds(
            &source_from_target,
            (0.0, 0.0, f64::from(width), f64::from(height)),
        )
    };

    let mut layer = match Pixmap::new(width, height) {
        Some(layer) => layer,
        None => return Ok(Source::transparent()),
    };
    let rect = match Rect::from_ltrb(x1 as f32, y1 as f32, x2 as f32, y2 as f32) {
        Some(rect) => rect,
        None => return Ok(Source::Layer(layer)),
    };

    let paint = Paint {
        shader: tiny_skia::Pattern::new(
            image.as_ref(),
            spread_mode(pattern.extend()),
            filter_quality(pattern.filter()),
            1.0,
            Transform::identity(),
        ),
        blend_mode: BlendMode::Source,
        ..Paint::default()
    };
    layer.fill_rect(rect, &paint, to_transform(&target_from_source), None);

    Ok(Source::Layer(layer))
}

/// Prepare `pattern` for drawing onto a `size` pixel target. `pixel_from_user` maps the
/// user space the pattern was set in to target pixels.
pub(crate) fn prepare_source(
    pattern: &RawPattern,
    pixel_from_user: &RawMatrix,
    size: (u32, u32),
) -> Result<Source, RawStatus> {
    if pattern.status() != STATUS_SUCCESS {
        return Err(pattern.status());
    }

    let pattern_to_user = match matrix_inverse(&pattern.matrix()) {
        Some(m) => m,
        None => return Ok(Source::transparent()),
    };
    let pixel_from_pattern = matrix_multiply(&pattern_to_user, pixel_from_user);

    Ok(match pattern.kind() {
        PatternKind::Solid(c) => Source::Solid(color(*c)),
        PatternKind::Linear { p0, p1 } => linear_source(pattern, *p0, *p1, &pixel_from_pattern),
        PatternKind::Radial { c0, r0, c1, r1 } => {
            radial_source(pattern, (*c0, *r0), (*c1, *r1), &pixel_from_pattern)
        }
        PatternKind::Surface(surface) => {
            return surface_source(pattern, surface, &pixel_from_pattern, size)
        }
    })
}

/// Fill a pixel-space path.
pub(crate) fn fill(target: &mut Pixmap, path: &tiny_skia::Path, rule: i32, draw: &Draw<'_>) {
    target.fill_path(
        path,
        &draw.paint(),
        fill_rule(rule),
        Transform::identity(),
        draw.mask,
    );
}

/// Apply the source everywhere, subject to the mask.
pub(crate) fn paint(target: &mut Pixmap, draw: &Draw<'_>) {
    if let Some(rect) = Rect::from_xywh(0.0, 0.0, target.width() as f32, target.height() as f32) {
        target.fill_rect(rect, &draw.paint(), Transform::identity(), draw.mask);
    }
}

/// Outline of `path` stroked in its own space, or `None` if nothing would be drawn.
pub(crate) fn stroke_outline(
    path: &tiny_skia::Path,
    style: &StrokeStyle<'_>,
    to_pixels: &RawMatrix,
) -> Option<tiny_skia::Path> {
    if !(style.width > 0.0) {
        return None;
    }

    let dash = if style.dash.is_empty() {
        None
    } else {
        let mut intervals: Vec<f32> = style.dash.iter().map(|&d| d as f32).collect();
        if intervals.len() % 2 == 1 {
            intervals.extend_from_within(..);
        }
        StrokeDash::new(intervals, style.dash_offset as f32)
    };

    let stroke = Stroke {
        width: style.width as f32,
        miter_limit: style.miter_limit as f32,
        line_cap: match style.cap {
            LINE_CAP_ROUND => tiny_skia::LineCap::Round,
            LINE_CAP_SQUARE => tiny_skia::LineCap::Square,
            _ => tiny_skia::LineCap::Butt,
        },
        line_join: match style.join {
            LINE_JOIN_ROUND => tiny_skia::LineJoin::Round,
            LINE_JOIN_BEVEL => tiny_skia::LineJoin::Bevel,
            _ => tiny_skia::LineJoin::Miter,
        },
        dash,
    };

    let res_scale = matrix_determinant(to_pixels).abs().sqrt().max(1e-3) as f32;
    path.stroke(&stroke, res_scale)
}

/// Coverage of a pixel-space path.
pub(crate) fn path_mask(
    path: &tiny_skia::Path,
    rule: i32,
    antialias: i32,
    (width, height): (u32, u32),
) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    mask.fill_path(
        path,
        fill_rule(rule),
        antialias != ANTIALIAS_NONE,
        Transform::identity(),
    );
    Some(mask)
}

/// A mask with the same coverage everywhere.
pub(crate) fn uniform_mask(alpha: f64, (width, height): (u32, u32)) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    let value = (alpha.max(0.0).min(1.0) * 255.0).round() as u8;
    mask.data_mut().fill(value);
    Some(mask)
}

/// The alpha channel of a source as a mask.
pub(crate) fn source_mask(source: &Source, (width, height): (u32, u32)) -> Option<Mask> {
    let mut layer = Pixmap::new(width, height)?;
    paint(
        &mut layer,
        &Draw {
            source,
            operator: OPERATOR_SOURCE,
            antialias: ANTIALIAS_NONE,
            mask: None,
        },
    );
    Some(Mask::from_pixmap(layer.as_ref(), MaskType::Alpha))
}

/// Multiply `mask` by `other`, byte by byte.
pub(crate) fn intersect_masks(mask: &mut Mask, other: &Mask) {
    for (a, &b) in mask.data_mut().iter_mut().zip(other.data()) {
        *a = ((u16::from(*a) * u16::from(b) + 127) / 255) as u8;
    }
}

/// Combine an optional clip with an optional extra mask.
pub(crate) fn combine_masks(clip: Option<&Mask>, extra: Option<Mask>) -> Option<Mask> {
    match (clip, extra) {
        (Some(clip), Some(mut extra)) => {
            intersect_masks(&mut extra, clip);
            Some(extra)
        }
        (Some(clip), None) => Some(clip.clone()),
        (None, extra) => extra,
    }
}

/// Drop the alpha channel, as for targets without one.
pub(crate) fn force_opaque(pixmap: &mut Pixmap) {
    for px in pixmap.data_mut().chunks_exact_mut(4) {
        px[3] = u8::MAX;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersecting_masks_multiplies_coverage() {
        let mut a = uniform_mask(1.0, (2, 2)).unwrap();
        let b = uniform_mask(0.5, (2, 2)).unwrap();
        intersect_masks(&mut a, &b);
        assert!(a.data().iter().all(|&v| v == 128));
    }

    #[test]
    fn unextended_stops_are_padded_with_transparency() {
        let stops = [
            ColorStop {
                offset: 0.0,
                color: RawColor {
                    red: 1.0,
                    green: 0.0,
                    blue: 0.0,
                    alpha: 1.0,
                },
            },
            ColorStop {
                offset: 1.0,
                color: RawColor {
                    red: 0.0,
                    green: 0.0,
                    blue: 1.0,
                    alpha: 1.0,
                },
            },
        ];
        assert_eq!(unextended_stops(&stops, 1.0 / 3.0, 2.0 / 3.0).len(), 8);
    }

    #[test]
    fn saturate_falls_back_to_addition() {
        assert_eq!(blend_mode(OPERATOR_SATURATE), BlendMode::Plus);
        assert_eq!(blend_mode(-5), BlendMode::SourceOver);
    }
}
