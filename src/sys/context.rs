// Boost/Apache2 License

//! Drawing contexts.
//!
//! A context keeps a stack of graphics states, the path under construction (in device
//! space) and the surface it draws to.

use core::cell::{Cell, RefCell};
use core::f64::consts::PI;
use std::rc::Rc;

use tiny_skia::Mask;

use super::font::{
    font_options_assign, font_options_create_from, font_options_destroy, scaled_font_create,
    toy_font_face_create, FontOptionsData, RawFontFace, RawFontOptions, RawScaledFont,
    DEFAULT_FAMILY,
};
use super::matrix::{
    matrix_init_identity, matrix_init_scale, matrix_init_translate, matrix_inverse,
    matrix_is_invertible, matrix_is_rectilinear, matrix_multiply, matrix_rotate, matrix_scale,
    matrix_transform_bounds, matrix_transform_distance, matrix_transform_point,
    matrix_translate, to_transform, RawMatrix,
};
use super::object::{self, Header, Object, Ref};
use super::path::{self, path_create, CurrentPath, RawPath, RawPathData};
use super::pattern::{
    pattern_create_for_surface, pattern_create_in_error, pattern_create_rgb,
    pattern_create_rgba, pattern_destroy, pattern_set_matrix, RawPattern,
};
use super::render::{self, Draw, StrokeStyle};
use super::surface::{
    surface_create_in_error, surface_create_similar, surface_get_device_offset,
    surface_set_device_offset, RawSurface,
};
use super::{
    RawPoint, RawRectangle, RawStatus, ANTIALIAS_DEFAULT, CONTENT_COLOR_ALPHA,
    FILL_RULE_WINDING, FONT_SLANT_NORMAL, FONT_WEIGHT_NORMAL, FORMAT_RGB24, LINE_CAP_BUTT,
    LINE_JOIN_MITER, OPERATOR_OVER, STATUS_CLIP_NOT_REPRESENTABLE, STATUS_DEVICE_ERROR,
    STATUS_INVALID_DASH, STATUS_INVALID_MATRIX, STATUS_INVALID_POP_GROUP,
    STATUS_INVALID_RESTORE, STATUS_NO_CURRENT_POINT, STATUS_NULL_POINTER, STATUS_SUCCESS,
    STATUS_SURFACE_FINISHED,
};

const DEFAULT_TOLERANCE: f64 = 0.1;
const MIN_TOLERANCE: f64 = 1.0 / 256.0;
const DEFAULT_LINE_WIDTH: f64 = 2.0;
const DEFAULT_MITER_LIMIT: f64 = 10.0;
const DEFAULT_FONT_SIZE: f64 = 10.0;
const MAX_ARC_SEGMENTS: f64 = 1024.0;

/// The clip region, in device space.
struct Clip {
    /// Flattened clip paths with their fill rules; a point is inside if inside all of them.
    paths: Vec<(Vec<RawPathData>, i32)>,
    /// Coverage in target pixels.
    mask: Option<Mask>,
    extents: (f64, f64, f64, f64),
    /// The clip as one rectangle, when it is one.
    rectangle: Option<(f64, f64, f64, f64)>,
}

fn intersect_boxes(
    a: (f64, f64, f64, f64),
    b: (f64, f64, f64, f64),
) -> (f64, f64, f64, f64) {
    let x1 = a.0.max(b.0);
    let y1 = a.1.max(b.1);
    let x2 = a.2.min(b.2);
    let y2 = a.3.min(b.3);
    if x2 <= x1 || y2 <= y1 {
        // Disjoint boxes collapse to the empty box at the origin.
        (0.0, 0.0, 0.0, 0.0)
    } else {
        (x1, y1, x2, y2)
    }
}

#[derive(Clone)]
struct GState {
    operator: i32,
    tolerance: f64,
    antialias: i32,
    fill_rule: i32,
    line_width: f64,
    line_cap: i32,
    line_join: i32,
    miter_limit: f64,
    dash: Vec<f64>,
    dash_offset: f64,
    ctm: RawMatrix,
    ctm_inverse: RawMatrix,
    source: Ref<RawPattern>,
    /// The transform in effect when the source was set.
    source_ctm: RawMatrix,
    clip: Option<Rc<Clip>>,
    target: Ref<RawSurface>,
    /// Set on the state created by `push_group`.
    parent_target: Option<Ref<RawSurface>>,
    font_face: Option<Ref<RawFontFace>>,
    font_matrix: RawMatrix,
    font_options: FontOptionsData,
    scaled_font: Option<Ref<RawScaledFont>>,
}

impl GState {
    fn pixel_from_device(&self) -> RawMatrix {
        self.target.pixel_from_device()
    }

    fn pixel_from_user(&self) -> RawMatrix {
        matrix_multiply(&self.ctm, &self.pixel_from_device())
    }

    fn target_size(&self) -> (u32, u32) {
        let (w, h) = self.target.size();
        (w.max(0) as u32, h.max(0) as u32)
    }

    /// The target bounds in device space.
    fn device_bounds(&self) -> (f64, f64, f64, f64) {
        let (w, h) = self.target_size();
        match matrix_inverse(&self.pixel_from_device()) {
            Some(device_from_pixel) => {
                matrix_transform_bounds(&device_from_pixel, (0.0, 0.0, f64::from(w), f64::from(h)))
            }
            None => (0.0, 0.0, 0.0, 0.0),
        }
    }

    fn stroke_style(&self) -> StrokeStyle<'_> {
        StrokeStyle {
            width: self.line_width,
            cap: self.line_cap,
            join: self.line_join,
            miter_limit: self.miter_limit,
            dash: &self.dash,
            dash_offset: self.dash_offset,
        }
    }
}

pub struct RawContext {
    header: Header,
    status: Cell<RawStatus>,
    original_target: Ref<RawSurface>,
    gstate: RefCell<GState>,
    saved: RefCell<Vec<GState>>,
    path: RefCell<CurrentPath>,
}

impl Object for RawContext {
    const KIND: &'static str = "context";

    fn header(&self) -> &Header {
        &self.header
    }
}

impl RawContext {
    fn fail(&self, status: RawStatus) {
        object::set_error(Self::KIND, &self.status, status);
    }

    fn check(&self, status: RawStatus) {
        if status != STATUS_SUCCESS {
            self.fail(status);
        }
    }

    fn to_device(&self, x: f64, y: f64) -> RawPoint {
        matrix_transform_point(&self.gstate.borrow().ctm, RawPoint::new(x, y))
    }

    fn set_ctm(&self, ctm: RawMatrix) {
        match matrix_inverse(&ctm) {
            Some(inverse) => {
                let mut gs = self.gstate.borrow_mut();
                gs.ctm = ctm;
                gs.ctm_inverse = inverse;
                gs.scaled_font = None;
            }
            None => self.fail(STATUS_INVALID_MATRIX),
        }
    }

    fn set_source_pattern(&self, pattern: &RawPattern) {
        if pattern.status() != STATUS_SUCCESS {
            self.fail(pattern.status());
            return;
        }

        let mut gs = self.gstate.borrow_mut();
        gs.source = Ref::share(pattern);
        gs.source_ctm = gs.ctm;
    }

    fn save(&self) {
        let mut copy = self.gstate.borrow().clone();
        copy.parent_target = None;
        let previous = core::mem::replace(&mut *self.gstate.borrow_mut(), copy);
        self.saved.borrow_mut().push(previous);
    }

    fn restore(&self) -> RawStatus {
        match self.saved.borrow_mut().pop() {
            Some(previous) => {
                *self.gstate.borrow_mut() = previous;
                STATUS_SUCCESS
            }
            None => STATUS_INVALID_RESTORE,
        }
    }

    /// Device path flattened at the current tolerance.
    fn flat_path(&self) -> Vec<RawPathData> {
        self.path.borrow().flattened(self.gstate.borrow().tolerance)
    }

    /// Composite the source through an optional pixel-space shape and extra mask.
    fn draw(&self, shape: Option<(&tiny_skia::Path, i32)>, extra: Option<Mask>) -> RawStatus {
        let gs = self.gstate.borrow();
        let target = &gs.target;

        if target.status() != STATUS_SUCCESS {
            return target.status();
        }
        if target.is_finished() {
            return STATUS_SURFACE_FINISHED;
        }

        let size = gs.target_size();
        if size.0 == 0 || size.1 == 0 {
            return STATUS_SUCCESS;
        }

        let pixel_from_source_user = matrix_multiply(&gs.source_ctm, &gs.pixel_from_device());
        let source = match render::prepare_source(&gs.source, &pixel_from_source_user, size) {
            Ok(source) => source,
            Err(status) => return status,
        };
        let mask = render::combine_masks(gs.clip.as_ref().and_then(|c| c.mask.as_ref()), extra);

        let mut pixels = match target.pixels().try_borrow_mut() {
            Ok(pixels) => pixels,
            Err(_) => return STATUS_DEVICE_ERROR,
        };
        let pixmap = match pixels.as_mut() {
            Some(pixmap) => pixmap,
            None => return STATUS_SUCCESS,
        };

        let draw = Draw {
            source: &source,
            operator: gs.operator,
            antialias: gs.antialias,
            mask: mask.as_ref(),
        };
        match shape {
            Some((path, rule)) => render::fill(pixmap, path, rule, &draw),
            None => render::paint(pixmap, &draw),
        }

        if target.format() == FORMAT_RGB24 {
            render::force_opaque(pixmap);
        }

        STATUS_SUCCESS
    }

    fn fill_now(&self) {
        let pixel_path = {
            let gs = self.gstate.borrow();
            path::to_skia(self.path.borrow().elements(), &gs.pixel_from_device())
        };

        if let Some(pixel_path) = pixel_path {
            let rule = self.gstate.borrow().fill_rule;
            let status = self.draw(Some((&pixel_path, rule)), None);
            self.check(status);
        }
    }

    /// The stroke outline in user space.
    fn user_stroke_outline(&self) -> Option<tiny_skia::Path> {
        let gs = self.gstate.borrow();
        let user_path = path::to_skia(self.path.borrow().elements(), &gs.ctm_inverse)?;
        render::stroke_outline(&user_path, &gs.stroke_style(), &gs.pixel_from_user())
    }

    fn stroke_now(&self) {
        let pixel_outline = self.user_stroke_outline().and_then(|outline| {
            let to_pixels = self.gstate.borrow().pixel_from_user();
            outline.transform(to_transform(&to_pixels))
        });

        if let Some(outline) = pixel_outline {
            let status = self.draw(Some((&outline, FILL_RULE_WINDING)), None);
            self.check(status);
        }
    }

    fn clip_now(&self) {
        let mut gs = self.gstate.borrow_mut();
        let elements = self.path.borrow().elements().to_vec();
        let flat = path::flatten_elements(&elements, gs.tolerance);
        let size = gs.target_size();

        let mut mask = match path::to_skia(&elements, &gs.pixel_from_device()) {
            Some(pixel_path) => render::path_mask(&pixel_path, gs.fill_rule, gs.antialias, size),
            None => Mask::new(size.0, size.1),
        };
        if let (Some(mask), Some(previous)) = (
            mask.as_mut(),
            gs.clip.as_ref().and_then(|c| c.mask.as_ref()),
        ) {
            render::intersect_masks(mask, previous);
        }

        let own_extents = path::bounds(&flat).unwrap_or((0.0, 0.0, 0.0, 0.0));
        let own_rectangle = if elements.is_empty() {
            Some((0.0, 0.0, 0.0, 0.0))
        } else {
            path::as_rectangle(&elements)
        };

        let (mut paths, extents, rectangle) = match &gs.clip {
            Some(previous) => (
                previous.paths.clone(),
                intersect_boxes(previous.extents, own_extents),
                previous
                    .rectangle
                    .and_then(|r| own_rectangle.map(|own| intersect_boxes(r, own))),
            ),
            None => (Vec::new(), own_extents, own_rectangle),
        };
        paths.push((flat, gs.fill_rule));

        gs.clip = Some(Rc::new(Clip {
            paths,
            mask,
            extents,
            rectangle,
        }));
    }

    fn arc(&self, xc: f64, yc: f64, radius: f64, angle1: f64, mut angle2: f64, forward: bool) {
        if radius <= 0.0 || !radius.is_finite() {
            let p = self.to_device(xc, yc);
            self.path.borrow_mut().line_to(p);
            return;
        }

        let turn = 2.0 * PI;
        if forward && angle2 < angle1 {
            angle2 = angle1 + (angle2 - angle1).rem_euclid(turn);
        } else if !forward && angle2 > angle1 {
            angle2 = angle1 - (angle1 - angle2).rem_euclid(turn);
        }

        let on_circle = |a: f64| (xc + radius * a.cos(), yc + radius * a.sin());
        let (sx, sy) = on_circle(angle1);
        let start = self.to_device(sx, sy);
        self.path.borrow_mut().line_to(start);

        let total = angle2 - angle1;
        let segments = (total.abs() / (PI / 2.0)).ceil().min(MAX_ARC_SEGMENTS);
        if !(segments >= 1.0) {
            return;
        }

        let delta = total / segments;
        let h = 4.0 / 3.0 * (delta / 4.0).tan();
        for i in 0..segments as usize {
            let a = angle1 + delta * i as f64;
            let b = a + delta;
            let (cos_a, sin_a) = (a.cos(), a.sin());
            let (cos_b, sin_b) = (b.cos(), b.sin());

            let p1 = self.to_device(
                xc + radius * (cos_a - h * sin_a),
                yc + radius * (sin_a + h * cos_a),
            );
            let p2 = self.to_device(
                xc + radius * (cos_b + h * sin_b),
                yc + radius * (sin_b - h * cos_b),
            );
            let p3 = self.to_device(xc + radius * cos_b, yc + radius * sin_b);
            self.path.borrow_mut().curve_to(p1, p2, p3);
        }
    }

    fn ensure_font_face(&self) -> Ref<RawFontFace> {
        if let Some(face) = &self.gstate.borrow().font_face {
            return face.clone();
        }

        // SAFETY: freshly created.
        let face = unsafe {
            Ref::fresh(toy_font_face_create(
                DEFAULT_FAMILY,
                FONT_SLANT_NORMAL,
                FONT_WEIGHT_NORMAL,
            ))
        };
        self.gstate.borrow_mut().font_face = Some(face.clone());
        face
    }

    fn ensure_scaled_font(&self) -> Ref<RawScaledFont> {
        if let Some(font) = &self.gstate.borrow().scaled_font {
            return font.clone();
        }

        let face = self.ensure_font_face();
        let (font_matrix, ctm, options) = {
            let gs = self.gstate.borrow();
            (gs.font_matrix, gs.ctm, gs.font_options.clone())
        };

        let options = font_options_create_from(options);
        // SAFETY: every pointer is live for the call, and the font is fresh.
        let font = unsafe {
            let font = Ref::fresh(scaled_font_create(face.as_ptr(), &font_matrix, &ctm, options));
            font_options_destroy(options);
            font
        };

        self.check(font.status());
        self.gstate.borrow_mut().scaled_font = Some(font.clone());
        font
    }
}

/// A context that accepts further operations.
unsafe fn live<'a>(cr: *mut RawContext) -> Option<&'a RawContext> {
    cr.as_ref().filter(|cr| cr.status.get() == STATUS_SUCCESS)
}

/// Create a context drawing to `target`. The context holds a reference to it.
///
/// # Safety
///
/// `target` must be null or a live surface.
pub unsafe fn context_create(target: *mut RawSurface) -> *mut RawContext {
    let (target, status) = match target.as_ref() {
        Some(surface) => {
            let status = if surface.status() != STATUS_SUCCESS {
                surface.status()
            } else if surface.is_finished() {
                STATUS_SURFACE_FINISHED
            } else {
                STATUS_SUCCESS
            };
            (Ref::share(surface), status)
        }
        None => (
            Ref::fresh(surface_create_in_error(STATUS_NULL_POINTER)),
            STATUS_NULL_POINTER,
        ),
    };

    let gstate = GState {
        operator: OPERATOR_OVER,
        tolerance: DEFAULT_TOLERANCE,
        antialias: ANTIALIAS_DEFAULT,
        fill_rule: FILL_RULE_WINDING,
        line_width: DEFAULT_LINE_WIDTH,
        line_cap: LINE_CAP_BUTT,
        line_join: LINE_JOIN_MITER,
        miter_limit: DEFAULT_MITER_LIMIT,
        dash: Vec::new(),
        dash_offset: 0.0,
        ctm: matrix_init_identity(),
        ctm_inverse: matrix_init_identity(),
        source: Ref::fresh(pattern_create_rgb(0.0, 0.0, 0.0)),
        source_ctm: matrix_init_identity(),
        clip: None,
        target: target.clone(),
        parent_target: None,
        font_face: None,
        font_matrix: matrix_init_scale(DEFAULT_FONT_SIZE, DEFAULT_FONT_SIZE),
        font_options: FontOptionsData::default(),
        scaled_font: None,
    };

    let cr = object::allocate(RawContext {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        original_target: target,
        gstate: RefCell::new(gstate),
        saved: RefCell::new(Vec::new()),
        path: RefCell::new(CurrentPath::default()),
    });

    if let Some(c) = cr.as_ref() {
        c.check(status);
    }
    cr
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_reference(cr: *mut RawContext) -> *mut RawContext {
    object::reference(cr)
}

/// # Safety
///
/// `cr` must be null or a live context, and the caller must own one count of it.
pub unsafe fn context_destroy(cr: *mut RawContext) {
    object::release(cr)
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_reference_count(cr: *mut RawContext) -> u32 {
    object::reference_count(cr)
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_status(cr: *mut RawContext) -> RawStatus {
    cr.as_ref().map_or(STATUS_NULL_POINTER, |c| c.status.get())
}

/// The surface the context was created for. Borrowed from the context.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_target(cr: *mut RawContext) -> *mut RawSurface {
    cr.as_ref()
        .map_or(core::ptr::null_mut(), |c| c.original_target.as_ptr())
}

/// The surface currently drawn to, which differs from the target inside a group.
/// Borrowed from the context.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_group_target(cr: *mut RawContext) -> *mut RawSurface {
    cr.as_ref()
        .map_or(core::ptr::null_mut(), |c| c.gstate.borrow().target.as_ptr())
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_save(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.save();
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_restore(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        if cr.gstate.borrow().parent_target.is_some() {
            cr.fail(STATUS_INVALID_RESTORE);
            return;
        }
        let status = cr.restore();
        cr.check(status);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_push_group(cr: *mut RawContext) {
    context_push_group_with_content(cr, CONTENT_COLOR_ALPHA)
}

/// Redirect drawing to a new intermediate surface until the matching pop.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_push_group_with_content(cr: *mut RawContext, content: i32) {
    let cr = match live(cr) {
        Some(cr) => cr,
        None => return,
    };

    let parent = cr.gstate.borrow().target.clone();
    let (w, h) = parent.size();
    let group = surface_create_similar(parent.as_ptr(), content, w, h);
    let (ox, oy) = surface_get_device_offset(parent.as_ptr());
    surface_set_device_offset(group, ox, oy);

    let group = Ref::fresh(group);
    if group.status() != STATUS_SUCCESS {
        cr.fail(group.status());
        return;
    }

    cr.save();
    let mut gs = cr.gstate.borrow_mut();
    gs.parent_target = Some(parent);
    gs.target = group;
}

/// End a group and return its contents as a pattern owned by the caller.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_pop_group(cr: *mut RawContext) -> *mut RawPattern {
    let cr = match cr.as_ref() {
        Some(cr) => cr,
        None => return pattern_create_in_error(STATUS_NULL_POINTER),
    };
    if cr.status.get() != STATUS_SUCCESS {
        return pattern_create_in_error(cr.status.get());
    }

    if cr.gstate.borrow().parent_target.is_none() {
        cr.fail(STATUS_INVALID_POP_GROUP);
        return pattern_create_in_error(STATUS_INVALID_POP_GROUP);
    }

    let group = cr.gstate.borrow().target.clone();
    let status = cr.restore();
    if status != STATUS_SUCCESS {
        cr.fail(status);
        return pattern_create_in_error(status);
    }

    let pattern = pattern_create_for_surface(group.as_ptr());
    pattern_set_matrix(pattern, &cr.gstate.borrow().ctm);
    pattern
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_pop_group_to_source(cr: *mut RawContext) {
    let pattern = context_pop_group(cr);
    context_set_source(cr, pattern);
    pattern_destroy(pattern);
}

macro_rules! state_accessors {
    ($($set: ident, $get: ident, $field: ident: $ty: ty;)*) => {
        $(
            /// # Safety
            ///
            /// `cr` must be null or a live context.
            pub unsafe fn $set(cr: *mut RawContext, value: $ty) {
                if let Some(cr) = live(cr) {
                    cr.gstate.borrow_mut().$field = value;
                }
            }

            /// # Safety
            ///
            /// `cr` must be null or a live context.
            pub unsafe fn $get(cr: *mut RawContext) -> $ty {
                match cr.as_ref() {
                    Some(cr) => cr.gstate.borrow().$field,
                    None => Default::default(),
                }
            }
        )*
    };
}

state_accessors! {
    context_set_operator, context_get_operator, operator: i32;
    context_set_antialias, context_get_antialias, antialias: i32;
    context_set_fill_rule, context_get_fill_rule, fill_rule: i32;
    context_set_line_cap, context_get_line_cap, line_cap: i32;
    context_set_line_join, context_get_line_join, line_join: i32;
    context_set_miter_limit, context_get_miter_limit, miter_limit: f64;
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_tolerance(cr: *mut RawContext, tolerance: f64) {
    if let Some(cr) = live(cr) {
        cr.gstate.borrow_mut().tolerance = tolerance.max(MIN_TOLERANCE);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_tolerance(cr: *mut RawContext) -> f64 {
    cr.as_ref()
        .map_or(DEFAULT_TOLERANCE, |c| c.gstate.borrow().tolerance)
}

/// Set the line width. Negative widths are treated as zero.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_line_width(cr: *mut RawContext, width: f64) {
    if let Some(cr) = live(cr) {
        cr.gstate.borrow_mut().line_width = width.max(0.0);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_line_width(cr: *mut RawContext) -> f64 {
    cr.as_ref()
        .map_or(DEFAULT_LINE_WIDTH, |c| c.gstate.borrow().line_width)
}

/// Set the dash pattern. An empty slice turns dashing off; negative lengths, or lengths
/// that are all zero, put the context in an error status.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_dash(cr: *mut RawContext, dashes: &[f64], offset: f64) {
    let cr = match live(cr) {
        Some(cr) => cr,
        None => return,
    };

    if !dashes.is_empty()
        && (dashes.iter().any(|&d| d < 0.0 || !d.is_finite()) || dashes.iter().all(|&d| d == 0.0))
    {
        cr.fail(STATUS_INVALID_DASH);
        return;
    }

    let mut gs = cr.gstate.borrow_mut();
    gs.dash = dashes.to_vec();
    gs.dash_offset = offset;
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_dash_count(cr: *mut RawContext) -> i32 {
    cr.as_ref().map_or(0, |c| c.gstate.borrow().dash.len() as i32)
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_dash(cr: *mut RawContext, dashes: &mut Vec<f64>, offset: &mut f64) {
    if let Some(cr) = cr.as_ref() {
        let gs = cr.gstate.borrow();
        dashes.clear();
        dashes.extend_from_slice(&gs.dash);
        *offset = gs.dash_offset;
    }
}

/// Use `pattern` as the source. It is locked to the current transform.
///
/// # Safety
///
/// `cr` must be null or a live context, and `pattern` null or a live pattern.
pub unsafe fn context_set_source(cr: *mut RawContext, pattern: *mut RawPattern) {
    if let Some(cr) = live(cr) {
        match pattern.as_ref() {
            Some(pattern) => cr.set_source_pattern(pattern),
            None => cr.fail(STATUS_NULL_POINTER),
        }
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_source_rgb(cr: *mut RawContext, red: f64, green: f64, blue: f64) {
    context_set_source_rgba(cr, red, green, blue, 1.0)
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_source_rgba(
    cr: *mut RawContext,
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
) {
    if live(cr).is_some() {
        let pattern = pattern_create_rgba(red, green, blue, alpha);
        context_set_source(cr, pattern);
        pattern_destroy(pattern);
    }
}

/// Use `surface` as the source, with its origin at user-space `(x, y)`.
///
/// # Safety
///
/// `cr` must be null or a live context, and `surface` null or a live surface.
pub unsafe fn context_set_source_surface(
    cr: *mut RawContext,
    surface: *mut RawSurface,
    x: f64,
    y: f64,
) {
    if live(cr).is_some() {
        let pattern = pattern_create_for_surface(surface);
        pattern_set_matrix(pattern, &matrix_init_translate(-x, -y));
        context_set_source(cr, pattern);
        pattern_destroy(pattern);
    }
}

/// The current source. Borrowed from the context.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_source(cr: *mut RawContext) -> *mut RawPattern {
    cr.as_ref()
        .map_or(core::ptr::null_mut(), |c| c.gstate.borrow().source.as_ptr())
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_translate(cr: *mut RawContext, tx: f64, ty: f64) {
    if let Some(cr) = live(cr) {
        let mut ctm = cr.gstate.borrow().ctm;
        matrix_translate(&mut ctm, tx, ty);
        cr.set_ctm(ctm);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_scale(cr: *mut RawContext, sx: f64, sy: f64) {
    if let Some(cr) = live(cr) {
        let mut ctm = cr.gstate.borrow().ctm;
        matrix_scale(&mut ctm, sx, sy);
        cr.set_ctm(ctm);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_rotate(cr: *mut RawContext, radians: f64) {
    if let Some(cr) = live(cr) {
        let mut ctm = cr.gstate.borrow().ctm;
        matrix_rotate(&mut ctm, radians);
        cr.set_ctm(ctm);
    }
}

/// Apply `matrix` before the current transform.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_transform(cr: *mut RawContext, matrix: &RawMatrix) {
    if let Some(cr) = live(cr) {
        let ctm = matrix_multiply(matrix, &cr.gstate.borrow().ctm);
        cr.set_ctm(ctm);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_matrix(cr: *mut RawContext, matrix: &RawMatrix) {
    if let Some(cr) = live(cr) {
        cr.set_ctm(*matrix);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_matrix(cr: *mut RawContext) -> RawMatrix {
    cr.as_ref().map(|c| c.gstate.borrow().ctm).unwrap_or_default()
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_identity_matrix(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.set_ctm(matrix_init_identity());
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_user_to_device(cr: *mut RawContext, point: RawPoint) -> RawPoint {
    match cr.as_ref() {
        Some(c) => matrix_transform_point(&c.gstate.borrow().ctm, point),
        None => point,
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_user_to_device_distance(cr: *mut RawContext, distance: RawPoint) -> RawPoint {
    match cr.as_ref() {
        Some(c) => matrix_transform_distance(&c.gstate.borrow().ctm, distance),
        None => distance,
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_device_to_user(cr: *mut RawContext, point: RawPoint) -> RawPoint {
    match cr.as_ref() {
        Some(c) => matrix_transform_point(&c.gstate.borrow().ctm_inverse, point),
        None => point,
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_device_to_user_distance(cr: *mut RawContext, distance: RawPoint) -> RawPoint {
    match cr.as_ref() {
        Some(c) => matrix_transform_distance(&c.gstate.borrow().ctm_inverse, distance),
        None => distance,
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_new_path(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.path.borrow_mut().clear();
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_new_sub_path(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.path.borrow_mut().new_sub_path();
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_move_to(cr: *mut RawContext, x: f64, y: f64) {
    if let Some(cr) = live(cr) {
        let p = cr.to_device(x, y);
        cr.path.borrow_mut().move_to(p);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_line_to(cr: *mut RawContext, x: f64, y: f64) {
    if let Some(cr) = live(cr) {
        let p = cr.to_device(x, y);
        cr.path.borrow_mut().line_to(p);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_curve_to(
    cr: *mut RawContext,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    x3: f64,
    y3: f64,
) {
    if let Some(cr) = live(cr) {
        let (p1, p2, p3) = (cr.to_device(x1, y1), cr.to_device(x2, y2), cr.to_device(x3, y3));
        cr.path.borrow_mut().curve_to(p1, p2, p3);
    }
}

/// Add a clockwise arc, joined to the current point by a line.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_arc(
    cr: *mut RawContext,
    xc: f64,
    yc: f64,
    radius: f64,
    angle1: f64,
    angle2: f64,
) {
    if let Some(cr) = live(cr) {
        cr.arc(xc, yc, radius, angle1, angle2, true);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_arc_negative(
    cr: *mut RawContext,
    xc: f64,
    yc: f64,
    radius: f64,
    angle1: f64,
    angle2: f64,
) {
    if let Some(cr) = live(cr) {
        cr.arc(xc, yc, radius, angle1, angle2, false);
    }
}

/// Device-space current point plus a user-space offset, or an error if there is none.
fn relative(cr: &RawContext, dx: f64, dy: f64) -> Option<RawPoint> {
    let current = match cr.path.borrow().current_point() {
        Some(p) => p,
        None => {
            cr.fail(STATUS_NO_CURRENT_POINT);
            return None;
        }
    };

    let d = matrix_transform_distance(&cr.gstate.borrow().ctm, RawPoint::new(dx, dy));
    Some(RawPoint::new(current.x + d.x, current.y + d.y))
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_rel_move_to(cr: *mut RawContext, dx: f64, dy: f64) {
    if let Some(cr) = live(cr) {
        if let Some(p) = relative(cr, dx, dy) {
            cr.path.borrow_mut().move_to(p);
        }
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_rel_line_to(cr: *mut RawContext, dx: f64, dy: f64) {
    if let Some(cr) = live(cr) {
        if let Some(p) = relative(cr, dx, dy) {
            cr.path.borrow_mut().line_to(p);
        }
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_rel_curve_to(
    cr: *mut RawContext,
    dx1: f64,
    dy1: f64,
    dx2: f64,
    dy2: f64,
    dx3: f64,
    dy3: f64,
) {
    if let Some(cr) = live(cr) {
        let points = (
            relative(cr, dx1, dy1),
            relative(cr, dx2, dy2),
            relative(cr, dx3, dy3),
        );
        if let (Some(p1), Some(p2), Some(p3)) = points {
            cr.path.borrow_mut().curve_to(p1, p2, p3);
        }
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_rectangle(cr: *mut RawContext, x: f64, y: f64, width: f64, height: f64) {
    context_move_to(cr, x, y);
    context_rel_line_to(cr, width, 0.0);
    context_rel_line_to(cr, 0.0, height);
    context_rel_line_to(cr, -width, 0.0);
    context_close_path(cr);
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_close_path(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.path.borrow_mut().close_path();
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_has_current_point(cr: *mut RawContext) -> bool {
    cr.as_ref()
        .map_or(false, |c| c.path.borrow().current_point().is_some())
}

/// The current point in user space, or the origin if there is none.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_current_point(cr: *mut RawContext) -> RawPoint {
    match cr.as_ref() {
        Some(c) => match c.path.borrow().current_point() {
            Some(p) => matrix_transform_point(&c.gstate.borrow().ctm_inverse, p),
            None => RawPoint::default(),
        },
        None => RawPoint::default(),
    }
}

fn user_elements(device: Vec<RawPathData>, ctm_inverse: &RawMatrix) -> Vec<RawPathData> {
    device
        .into_iter()
        .map(|mut element| {
            let count = element.point_count();
            for p in element.points[..count].iter_mut() {
                *p = matrix_transform_point(ctm_inverse, *p);
            }
            element
        })
        .collect()
}

fn user_bounds(cr: &RawContext, device: Option<(f64, f64, f64, f64)>) -> RawRectangle {
    match device {
        Some(b) => {
            let (x1, y1, x2, y2) = matrix_transform_bounds(&cr.gstate.borrow().ctm_inverse, b);
            RawRectangle {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
            }
        }
        None => RawRectangle::default(),
    }
}

/// Bounds of the current path in user space, as origin and size.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_path_extents(cr: *mut RawContext) -> RawRectangle {
    match cr.as_ref() {
        Some(cr) => {
            let ctm_inverse = cr.gstate.borrow().ctm_inverse;
            let user = user_elements(cr.flat_path(), &ctm_inverse);
            match path::bounds(&user) {
                Some((x1, y1, x2, y2)) => RawRectangle {
                    x: x1,
                    y: y1,
                    width: x2 - x1,
                    height: y2 - y1,
                },
                None => RawRectangle::default(),
            }
        }
        None => RawRectangle::default(),
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_fill_extents(cr: *mut RawContext) -> RawRectangle {
    match cr.as_ref() {
        Some(cr) => {
            let flat = cr.flat_path();
            user_bounds(cr, path::bounds(&flat))
        }
        None => RawRectangle::default(),
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_stroke_extents(cr: *mut RawContext) -> RawRectangle {
    match cr.as_ref().and_then(RawContext::user_stroke_outline) {
        Some(outline) => {
            let b = outline.bounds();
            RawRectangle {
                x: f64::from(b.left()),
                y: f64::from(b.top()),
                width: f64::from(b.width()),
                height: f64::from(b.height()),
            }
        }
        None => RawRectangle::default(),
    }
}

/// Copy the current path, in user space. The caller owns the result.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_copy_path(cr: *mut RawContext) -> *mut RawPath {
    match cr.as_ref() {
        Some(cr) if cr.status.get() == STATUS_SUCCESS => {
            let ctm_inverse = cr.gstate.borrow().ctm_inverse;
            path_create(cr.path.borrow().transformed(&ctm_inverse), STATUS_SUCCESS)
        }
        Some(cr) => path_create(Vec::new(), cr.status.get()),
        None => path_create(Vec::new(), STATUS_NULL_POINTER),
    }
}

/// Copy the current path with curves replaced by lines. The caller owns the result.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_copy_path_flat(cr: *mut RawContext) -> *mut RawPath {
    match cr.as_ref() {
        Some(cr) if cr.status.get() == STATUS_SUCCESS => {
            let ctm_inverse = cr.gstate.borrow().ctm_inverse;
            path_create(user_elements(cr.flat_path(), &ctm_inverse), STATUS_SUCCESS)
        }
        Some(cr) => path_create(Vec::new(), cr.status.get()),
        None => path_create(Vec::new(), STATUS_NULL_POINTER),
    }
}

/// Append a user-space path to the current path.
///
/// # Safety
///
/// `cr` must be null or a live context, and `path` null or a live path.
pub unsafe fn context_append_path(cr: *mut RawContext, path: *mut RawPath) {
    let cr = match live(cr) {
        Some(cr) => cr,
        None => return,
    };
    let path = match path.as_ref() {
        Some(path) => path,
        None => {
            cr.fail(STATUS_NULL_POINTER);
            return;
        }
    };

    if path.status() != STATUS_SUCCESS {
        cr.fail(path.status());
        return;
    }

    let ctm = cr.gstate.borrow().ctm;
    let status = cr.path.borrow_mut().append(path.data(), &ctm);
    cr.check(status);
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_paint(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        let status = cr.draw(None, None);
        cr.check(status);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_paint_with_alpha(cr: *mut RawContext, alpha: f64) {
    let cr = match live(cr) {
        Some(cr) => cr,
        None => return,
    };

    if alpha >= 1.0 {
        let status = cr.draw(None, None);
        cr.check(status);
    } else if alpha > 0.0 {
        let size = cr.gstate.borrow().target_size();
        if let Some(mask) = render::uniform_mask(alpha, size) {
            let status = cr.draw(None, Some(mask));
            cr.check(status);
        }
    }
}

/// Paint the source using the alpha channel of `pattern` as coverage.
///
/// # Safety
///
/// `cr` must be null or a live context, and `pattern` null or a live pattern.
pub unsafe fn context_mask(cr: *mut RawContext, pattern: *mut RawPattern) {
    let cr = match live(cr) {
        Some(cr) => cr,
        None => return,
    };
    let pattern = match pattern.as_ref() {
        Some(pattern) => pattern,
        None => {
            cr.fail(STATUS_NULL_POINTER);
            return;
        }
    };

    let (pixel_from_user, size) = {
        let gs = cr.gstate.borrow();
        (gs.pixel_from_user(), gs.target_size())
    };
    let coverage = match render::prepare_source(pattern, &pixel_from_user, size) {
        Ok(source) => source,
        Err(status) => {
            cr.fail(status);
            return;
        }
    };

    if let Some(mask) = render::source_mask(&coverage, size) {
        let status = cr.draw(None, Some(mask));
        cr.check(status);
    }
}

/// Mask with the alpha channel of `surface`, placed at user-space `(x, y)`.
///
/// # Safety
///
/// `cr` must be null or a live context, and `surface` null or a live surface.
pub unsafe fn context_mask_surface(cr: *mut RawContext, surface: *mut RawSurface, x: f64, y: f64) {
    if live(cr).is_some() {
        let pattern = pattern_create_for_surface(surface);
        pattern_set_matrix(pattern, &matrix_init_translate(-x, -y));
        context_mask(cr, pattern);
        pattern_destroy(pattern);
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_stroke_preserve(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.stroke_now();
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_stroke(cr: *mut RawContext) {
    context_stroke_preserve(cr);
    context_new_path(cr);
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_fill_preserve(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.fill_now();
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_fill(cr: *mut RawContext) {
    context_fill_preserve(cr);
    context_new_path(cr);
}

/// Whether user-space `(x, y)` is inside the area the current path would fill.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_in_fill(cr: *mut RawContext, x: f64, y: f64) -> bool {
    match live(cr) {
        Some(cr) => {
            let p = cr.to_device(x, y);
            let rule = cr.gstate.borrow().fill_rule;
            path::contains(&cr.flat_path(), p, rule)
        }
        None => false,
    }
}

/// Whether user-space `(x, y)` is inside the area the current path would stroke.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_in_stroke(cr: *mut RawContext, x: f64, y: f64) -> bool {
    match live(cr).and_then(RawContext::user_stroke_outline) {
        Some(outline) => {
            let tolerance = context_get_tolerance(cr);
            let flat = path::flatten_elements(&path::from_skia(&outline), tolerance);
            path::contains(&flat, RawPoint::new(x, y), FILL_RULE_WINDING)
        }
        None => false,
    }
}

/// Whether user-space `(x, y)` is inside the clip.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_in_clip(cr: *mut RawContext, x: f64, y: f64) -> bool {
    let cr = match live(cr) {
        Some(cr) => cr,
        None => return false,
    };

    let p = cr.to_device(x, y);
    match &cr.gstate.borrow().clip {
        Some(clip) => clip
            .paths
            .iter()
            .all(|(flat, rule)| path::contains(flat, p, *rule)),
        None => true,
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_reset_clip(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.gstate.borrow_mut().clip = None;
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_clip_preserve(cr: *mut RawContext) {
    if let Some(cr) = live(cr) {
        cr.clip_now();
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_clip(cr: *mut RawContext) {
    context_clip_preserve(cr);
    context_new_path(cr);
}

/// Bounds of the clip in user space, limited to the target.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_clip_extents(cr: *mut RawContext) -> RawRectangle {
    match cr.as_ref() {
        Some(cr) => {
            let device = {
                let gs = cr.gstate.borrow();
                let bounds = gs.device_bounds();
                match &gs.clip {
                    Some(clip) => intersect_boxes(bounds, clip.extents),
                    None => bounds,
                }
            };
            if device.2 <= device.0 || device.3 <= device.1 {
                return RawRectangle::default();
            }
            user_bounds(cr, Some(device))
        }
        None => RawRectangle::default(),
    }
}

/// The clip as a list of user-space rectangles.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_copy_clip_rectangle_list(
    cr: *mut RawContext,
    rectangles: &mut Vec<RawRectangle>,
) -> RawStatus {
    let cr = match cr.as_ref() {
        Some(cr) => cr,
        None => return STATUS_NULL_POINTER,
    };
    if cr.status.get() != STATUS_SUCCESS {
        return cr.status.get();
    }

    let device = {
        let gs = cr.gstate.borrow();
        if !matrix_is_rectilinear(&gs.ctm) {
            return STATUS_CLIP_NOT_REPRESENTABLE;
        }

        let bounds = gs.device_bounds();
        match &gs.clip {
            Some(clip) => match clip.rectangle {
                Some(r) => intersect_boxes(bounds, r),
                None => return STATUS_CLIP_NOT_REPRESENTABLE,
            },
            None => bounds,
        }
    };

    rectangles.clear();
    let rect = user_bounds(cr, Some(device));
    if rect.width > 0.0 && rect.height > 0.0 {
        rectangles.push(rect);
    }
    STATUS_SUCCESS
}

/// Select a toy font face.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_select_font_face(cr: *mut RawContext, family: &str, slant: i32, weight: i32) {
    if let Some(c) = live(cr) {
        let face = Ref::fresh(toy_font_face_create(family, slant, weight));
        if face.status() != STATUS_SUCCESS {
            c.fail(face.status());
            return;
        }
        context_set_font_face(cr, face.as_ptr());
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_font_size(cr: *mut RawContext, size: f64) {
    context_set_font_matrix(cr, &matrix_init_scale(size, size));
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_set_font_matrix(cr: *mut RawContext, matrix: &RawMatrix) {
    if let Some(cr) = live(cr) {
        if !matrix_is_invertible(matrix) {
            cr.fail(STATUS_INVALID_MATRIX);
            return;
        }
        let mut gs = cr.gstate.borrow_mut();
        gs.font_matrix = *matrix;
        gs.scaled_font = None;
    }
}

/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_font_matrix(cr: *mut RawContext) -> RawMatrix {
    cr.as_ref()
        .map_or_else(RawMatrix::default, |c| c.gstate.borrow().font_matrix)
}

/// # Safety
///
/// `cr` must be null or a live context, and `options` null or a live font options object.
pub unsafe fn context_set_font_options(cr: *mut RawContext, options: *const RawFontOptions) {
    if let (Some(cr), Some(options)) = (live(cr), options.as_ref()) {
        let mut gs = cr.gstate.borrow_mut();
        gs.font_options = options.data();
        gs.scaled_font = None;
    }
}

/// Copy the font options of the context into `options`.
///
/// # Safety
///
/// `cr` must be null or a live context, and `options` null or a live font options object.
pub unsafe fn context_get_font_options(cr: *mut RawContext, options: *mut RawFontOptions) {
    if let (Some(cr), Some(options)) = (cr.as_ref(), options.as_ref()) {
        font_options_assign(options, cr.gstate.borrow().font_options.clone());
    }
}

/// Set the font face. Null restores the default face.
///
/// # Safety
///
/// `cr` must be null or a live context, and `face` null or a live font face.
pub unsafe fn context_set_font_face(cr: *mut RawContext, face: *mut RawFontFace) {
    if let Some(cr) = live(cr) {
        let face = match face.as_ref() {
            Some(face) if face.status() != STATUS_SUCCESS => {
                cr.fail(face.status());
                return;
            }
            Some(face) => Some(Ref::share(face)),
            None => None,
        };

        let mut gs = cr.gstate.borrow_mut();
        gs.font_face = face;
        gs.scaled_font = None;
    }
}

/// The current font face. Borrowed from the context.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_font_face(cr: *mut RawContext) -> *mut RawFontFace {
    cr.as_ref()
        .map_or(core::ptr::null_mut(), |c| c.ensure_font_face().as_ptr())
}

/// Replace face, font matrix and font options with those of `font`.
///
/// # Safety
///
/// `cr` must be null or a live context, and `font` null or a live scaled font.
pub unsafe fn context_set_scaled_font(cr: *mut RawContext, font: *mut RawScaledFont) {
    let cr = match live(cr) {
        Some(cr) => cr,
        None => return,
    };
    let font = match font.as_ref() {
        Some(font) => font,
        None => {
            cr.fail(STATUS_NULL_POINTER);
            return;
        }
    };

    if font.status() != STATUS_SUCCESS {
        cr.fail(font.status());
        return;
    }

    let mut gs = cr.gstate.borrow_mut();
    gs.font_face = Some(font.face().clone());
    gs.font_matrix = font.font_matrix();
    gs.font_options = font.options().clone();

    let mut ctm = gs.ctm;
    ctm.x0 = 0.0;
    ctm.y0 = 0.0;
    gs.scaled_font = if ctm == font.ctm() {
        Some(Ref::share(font))
    } else {
        None
    };
}

/// The scaled font for the current face, font matrix, transform and options. Borrowed
/// from the context.
///
/// # Safety
///
/// `cr` must be null or a live context.
pub unsafe fn context_get_scaled_font(cr: *mut RawContext) -> *mut RawScaledFont {
    cr.as_ref()
        .map_or(core::ptr::null_mut(), |c| c.ensure_scaled_font().as_ptr())
}

#[cfg(test)]
mod tests {
    use super::super::{
        image_surface_create, image_surface_get_data, surface_destroy,
        surface_get_reference_count, FORMAT_ARGB32, PATH_MOVE_TO,
    };
    use super::*;
    use approx::assert_abs_diff_eq;

    fn with_context(width: i32, height: i32, f: impl FnOnce(*mut RawContext, *mut RawSurface)) {
        let surface = image_surface_create(FORMAT_ARGB32, width, height);
        unsafe {
            let cr = context_create(surface);
            f(cr, surface);
            context_destroy(cr);
            surface_destroy(surface);
        }
    }

    #[test]
    fn context_keeps_its_target_alive() {
        let surface = image_surface_create(FORMAT_ARGB32, 4, 4);
        unsafe {
            let cr = context_create(surface);
            // One count for the original target, one for the current state's target.
            assert_eq!(surface_get_reference_count(surface), 3);
            assert_eq!(context_get_target(cr), surface);

            context_destroy(cr);
            assert_eq!(surface_get_reference_count(surface), 1);
            surface_destroy(surface);
        }
    }

    #[test]
    fn disjoint_clips_are_empty_at_the_origin() {
        with_context(100, 100, |cr, _| unsafe {
            context_translate(cr, 3.0, 7.0);
            context_rectangle(cr, 0.0, 0.0, 5.0, 5.0);
            context_clip(cr);
            context_rectangle(cr, 0.0, 80.0, 5.0, 5.0);
            context_clip(cr);

            assert_eq!(context_clip_extents(cr), RawRectangle::default());
            let mut rectangles = vec![RawRectangle::default()];
            assert_eq!(
                context_copy_clip_rectangle_list(cr, &mut rectangles),
                STATUS_SUCCESS
            );
            assert!(rectangles.is_empty());
            assert!(!context_in_clip(cr, 1.0, 1.0));
        });
    }

    #[test]
    fn unbalanced_restore_is_sticky() {
        with_context(4, 4, |cr, _| unsafe {
            context_restore(cr);
            assert_eq!(context_status(cr), STATUS_INVALID_RESTORE);
            context_save(cr);
            assert_eq!(context_status(cr), STATUS_INVALID_RESTORE);
        });
    }

    #[test]
    fn relative_move_needs_a_current_point() {
        with_context(4, 4, |cr, _| unsafe {
            context_rel_line_to(cr, 1.0, 1.0);
            assert_eq!(context_status(cr), STATUS_NO_CURRENT_POINT);
        });
    }

    #[test]
    fn paint_fills_every_pixel() {
        with_context(3, 3, |cr, surface| unsafe {
            context_set_source_rgb(cr, 1.0, 0.0, 0.0);
            context_paint(cr);
            assert_eq!(context_status(cr), STATUS_SUCCESS);
            let data = image_surface_get_data(surface).unwrap();
            assert!(data.chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
        });
    }

    #[test]
    fn borrowed_pixels_block_drawing() {
        with_context(2, 2, |cr, surface| unsafe {
            let data = image_surface_get_data(surface);
            context_paint(cr);
            drop(data);
            assert_eq!(context_status(cr), STATUS_DEVICE_ERROR);
        });
    }

    #[test]
    fn group_round_trip_restores_the_target() {
        with_context(8, 8, |cr, surface| unsafe {
            context_push_group(cr);
            assert_ne!(context_get_group_target(cr), surface);
            context_set_source_rgb(cr, 0.0, 0.0, 1.0);
            context_paint(cr);
            context_pop_group_to_source(cr);
            assert_eq!(context_get_group_target(cr), surface);
            context_paint(cr);
            assert_eq!(context_status(cr), STATUS_SUCCESS);

            let data = image_surface_get_data(surface).unwrap();
            assert_eq!(&data[..4], &[0, 0, 255, 255]);
        });
    }

    #[test]
    fn pop_without_push_fails() {
        with_context(2, 2, |cr, _| unsafe {
            let pattern = context_pop_group(cr);
            assert_eq!(super::super::pattern_status(pattern), STATUS_INVALID_POP_GROUP);
            assert_eq!(context_status(cr), STATUS_INVALID_POP_GROUP);
            pattern_destroy(pattern);
        });
    }

    #[test]
    fn arc_starts_with_a_move_and_ends_on_the_circle() {
        with_context(2, 2, |cr, _| unsafe {
            context_arc(cr, 10.0, 10.0, 5.0, 0.0, PI);
            let path = context_copy_path(cr);
            let data = super::super::path_get_data(path);
            assert_eq!(data[0].data_type, PATH_MOVE_TO);
            assert_eq!(data.len(), 3);

            let end = context_get_current_point(cr);
            assert_abs_diff_eq!(end.x, 5.0, epsilon = 1e-9);
            assert_abs_diff_eq!(end.y, 10.0, epsilon = 1e-9);
            super::super::path_destroy(path);
        });
    }

    #[test]
    fn non_rectangular_clip_is_not_a_rectangle_list() {
        with_context(20, 20, |cr, _| unsafe {
            context_arc(cr, 10.0, 10.0, 5.0, 0.0, 2.0 * PI);
            context_clip(cr);
            let mut rects = Vec::new();
            assert_eq!(
                context_copy_clip_rectangle_list(cr, &mut rects),
                STATUS_CLIP_NOT_REPRESENTABLE
            );
            assert!(context_in_clip(cr, 10.0, 10.0));
            assert!(!context_in_clip(cr, 1.0, 1.0));
        });
    }

    #[test]
    fn scaled_font_is_cached_until_the_transform_changes() {
        with_context(2, 2, |cr, _| unsafe {
            let first = context_get_scaled_font(cr);
            assert_eq!(context_get_scaled_font(cr), first);
            context_scale(cr, 2.0, 2.0);
            let second = context_get_scaled_font(cr);
            assert_eq!(
                super::super::scaled_font_get_scale_matrix(second),
                matrix_init_scale(20.0, 20.0)
            );
        });
    }

    #[test]
    fn stroke_hit_testing() {
        with_context(20, 20, |cr, _| unsafe {
            context_move_to(cr, 0.0, 10.0);
            context_line_to(cr, 20.0, 10.0);
            context_set_line_width(cr, 4.0);
            assert!(context_in_stroke(cr, 10.0, 11.0));
            assert!(!context_in_stroke(cr, 10.0, 15.0));

            let extents = context_stroke_extents(cr);
            assert_abs_diff_eq!(extents.y, 8.0, epsilon = 1e-4);
            assert_abs_diff_eq!(extents.height, 4.0, epsilon = 1e-4);
        });
    }
}
