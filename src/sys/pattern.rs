// Boost/Apache2 License

//! Patterns: the paint that drawing operations apply.

use core::cell::{Cell, RefCell};
use core::convert::TryFrom;

use super::matrix::{matrix_is_invertible, RawMatrix};
use super::object::{self, Header, Object, Ref};
use super::surface::RawSurface;
use super::{
    RawColor, RawPoint, RawStatus, EXTEND_NONE, EXTEND_PAD, FILTER_GAUSSIAN, FILTER_GOOD,
    PATTERN_TYPE_LINEAR, PATTERN_TYPE_RADIAL, PATTERN_TYPE_SOLID, PATTERN_TYPE_SURFACE,
    STATUS_INVALID_INDEX, STATUS_INVALID_MATRIX, STATUS_NULL_POINTER,
    STATUS_PATTERN_TYPE_MISMATCH, STATUS_SUCCESS,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ColorStop {
    pub(crate) offset: f64,
    pub(crate) color: RawColor,
}

pub(crate) enum PatternKind {
    Solid(RawColor),
    Surface(Ref<RawSurface>),
    Linear {
        p0: RawPoint,
        p1: RawPoint,
    },
    Radial {
        c0: RawPoint,
        r0: f64,
        c1: RawPoint,
        r1: f64,
    },
}

pub struct RawPattern {
    header: Header,
    status: Cell<RawStatus>,
    kind: PatternKind,
    matrix: Cell<RawMatrix>,
    extend: Cell<i32>,
    filter: Cell<i32>,
    stops: RefCell<Vec<ColorStop>>,
}

impl Object for RawPattern {
    const KIND: &'static str = "pattern";

    fn header(&self) -> &Header {
        &self.header
    }
}

impl RawPattern {
    pub(crate) fn status(&self) -> RawStatus {
        self.status.get()
    }

    pub(crate) fn kind(&self) -> &PatternKind {
        &self.kind
    }

    pub(crate) fn matrix(&self) -> RawMatrix {
        self.matrix.get()
    }

    pub(crate) fn extend(&self) -> i32 {
        self.extend.get()
    }

    pub(crate) fn filter(&self) -> i32 {
        self.filter.get()
    }

    pub(crate) fn stops(&self) -> Vec<ColorStop> {
        self.stops.borrow().clone()
    }

    fn is_gradient(&self) -> bool {
        matches!(
            self.kind,
            PatternKind::Linear { .. } | PatternKind::Radial { .. }
        )
    }

    fn pattern_type(&self) -> i32 {
        match self.kind {
            PatternKind::Solid(_) => PATTERN_TYPE_SOLID,
            PatternKind::Surface(_) => PATTERN_TYPE_SURFACE,
            PatternKind::Linear { .. } => PATTERN_TYPE_LINEAR,
            PatternKind::Radial { .. } => PATTERN_TYPE_RADIAL,
        }
    }

    fn fail(&self, status: RawStatus) -> RawStatus {
        object::set_error(Self::KIND, &self.status, status)
    }
}

fn pattern_allocate(kind: PatternKind, extend: i32) -> *mut RawPattern {
    object::allocate(RawPattern {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        kind,
        matrix: Cell::new(RawMatrix::default()),
        extend: Cell::new(extend),
        filter: Cell::new(FILTER_GOOD),
        stops: RefCell::new(Vec::new()),
    })
}

pub(crate) fn pattern_create_in_error(status: RawStatus) -> *mut RawPattern {
    let pattern = pattern_allocate(PatternKind::Solid(RawColor::default()), EXTEND_PAD);

    // SAFETY: freshly allocated.
    if let Some(p) = unsafe { pattern.as_ref() } {
        p.fail(status);
    }
    pattern
}

pub fn pattern_create_rgb(red: f64, green: f64, blue: f64) -> *mut RawPattern {
    pattern_create_rgba(red, green, blue, 1.0)
}

/// Create a solid pattern. Components are clamped to `0.0..=1.0`.
pub fn pattern_create_rgba(red: f64, green: f64, blue: f64, alpha: f64) -> *mut RawPattern {
    let color = RawColor {
        red,
        green,
        blue,
        alpha,
    }
    .clamped();
    pattern_allocate(PatternKind::Solid(color), EXTEND_PAD)
}

/// Create a pattern that paints the contents of `surface`.
///
/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn pattern_create_for_surface(surface: *mut RawSurface) -> *mut RawPattern {
    let surface = match surface.as_ref() {
        Some(surface) => surface,
        None => return pattern_create_in_error(STATUS_NULL_POINTER),
    };

    if surface.status() != STATUS_SUCCESS {
        return pattern_create_in_error(surface.status());
    }

    pattern_allocate(PatternKind::Surface(Ref::share(surface)), EXTEND_NONE)
}

/// Create a linear gradient along the line from `(x0, y0)` to `(x1, y1)`.
pub fn pattern_create_linear(x0: f64, y0: f64, x1: f64, y1: f64) -> *mut RawPattern {
    pattern_allocate(
        PatternKind::Linear {
            p0: RawPoint::new(x0, y0),
            p1: RawPoint::new(x1, y1),
        },
        EXTEND_PAD,
    )
}

/// Create a radial gradient between the circle at `(cx0, cy0)` with `radius0` and the
/// circle at `(cx1, cy1)` with `radius1`.
pub fn pattern_create_radial(
    cx0: f64,
    cy0: f64,
    radius0: f64,
    cx1: f64,
    cy1: f64,
    radius1: f64,
) -> *mut RawPattern {
    pattern_allocate(
        PatternKind::Radial {
            c0: RawPoint::new(cx0, cy0),
            r0: radius0,
            c1: RawPoint::new(cx1, cy1),
            r1: radius1,
        },
        EXTEND_PAD,
    )
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_reference(pattern: *mut RawPattern) -> *mut RawPattern {
    object::reference(pattern)
}

/// # Safety
///
/// `pattern` must be null or a live pattern, and the caller must own one count of it.
pub unsafe fn pattern_destroy(pattern: *mut RawPattern) {
    object::release(pattern)
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_reference_count(pattern: *mut RawPattern) -> u32 {
    object::reference_count(pattern)
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_status(pattern: *mut RawPattern) -> RawStatus {
    pattern
        .as_ref()
        .map_or(STATUS_NULL_POINTER, |p| p.status.get())
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_type(pattern: *mut RawPattern) -> i32 {
    pattern
        .as_ref()
        .map_or(PATTERN_TYPE_SOLID, RawPattern::pattern_type)
}

/// Set the map from user space to pattern space. A singular matrix puts the pattern in
/// an error status.
///
/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_set_matrix(pattern: *mut RawPattern, matrix: &RawMatrix) {
    if let Some(pattern) = pattern.as_ref() {
        if pattern.status.get() != STATUS_SUCCESS {
            return;
        }
        if !matrix_is_invertible(matrix) {
            pattern.fail(STATUS_INVALID_MATRIX);
            return;
        }
        pattern.matrix.set(*matrix);
    }
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_matrix(pattern: *mut RawPattern) -> RawMatrix {
    pattern.as_ref().map(RawPattern::matrix).unwrap_or_default()
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_set_extend(pattern: *mut RawPattern, extend: i32) {
    if let Some(pattern) = pattern.as_ref() {
        if (EXTEND_NONE..=EXTEND_PAD).contains(&extend) && pattern.status.get() == STATUS_SUCCESS {
            pattern.extend.set(extend);
        }
    }
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_extend(pattern: *mut RawPattern) -> i32 {
    pattern.as_ref().map_or(EXTEND_NONE, RawPattern::extend)
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_set_filter(pattern: *mut RawPattern, filter: i32) {
    if let Some(pattern) = pattern.as_ref() {
        if (0..=FILTER_GAUSSIAN).contains(&filter) && pattern.status.get() == STATUS_SUCCESS {
            pattern.filter.set(filter);
        }
    }
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_filter(pattern: *mut RawPattern) -> i32 {
    pattern.as_ref().map_or(FILTER_GOOD, RawPattern::filter)
}

/// Read the color of a solid pattern.
///
/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_rgba(pattern: *mut RawPattern, color: &mut RawColor) -> RawStatus {
    match pattern.as_ref().map(RawPattern::kind) {
        Some(PatternKind::Solid(c)) => {
            *color = *c;
            STATUS_SUCCESS
        }
        Some(_) => STATUS_PATTERN_TYPE_MISMATCH,
        None => STATUS_NULL_POINTER,
    }
}

/// Read the surface of a surface pattern. The address is borrowed from the pattern.
///
/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_surface(
    pattern: *mut RawPattern,
    surface: &mut *mut RawSurface,
) -> RawStatus {
    match pattern.as_ref().map(RawPattern::kind) {
        Some(PatternKind::Surface(s)) => {
            *surface = s.as_ptr();
            STATUS_SUCCESS
        }
        Some(_) => STATUS_PATTERN_TYPE_MISMATCH,
        None => STATUS_NULL_POINTER,
    }
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_linear_points(
    pattern: *mut RawPattern,
    p0: &mut RawPoint,
    p1: &mut RawPoint,
) -> RawStatus {
    match pattern.as_ref().map(RawPattern::kind) {
        Some(PatternKind::Linear { p0: a, p1: b }) => {
            *p0 = *a;
            *p1 = *b;
            STATUS_SUCCESS
        }
        Some(_) => STATUS_PATTERN_TYPE_MISMATCH,
        None => STATUS_NULL_POINTER,
    }
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_radial_circles(
    pattern: *mut RawPattern,
    c0: &mut RawPoint,
    r0: &mut f64,
    c1: &mut RawPoint,
    r1: &mut f64,
) -> RawStatus {
    match pattern.as_ref().map(RawPattern::kind) {
        Some(PatternKind::Radial {
            c0: a,
            r0: ra,
            c1: b,
            r1: rb,
        }) => {
            *c0 = *a;
            *r0 = *ra;
            *c1 = *b;
            *r1 = *rb;
            STATUS_SUCCESS
        }
        Some(_) => STATUS_PATTERN_TYPE_MISMATCH,
        None => STATUS_NULL_POINTER,
    }
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_add_color_stop_rgb(
    pattern: *mut RawPattern,
    offset: f64,
    red: f64,
    green: f64,
    blue: f64,
) {
    pattern_add_color_stop_rgba(pattern, offset, red, green, blue, 1.0)
}

/// Add a stop to a gradient. Stops are kept sorted by offset; a stop with the same offset
/// as an existing one goes after it.
///
/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_add_color_stop_rgba(
    pattern: *mut RawPattern,
    offset: f64,
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
) {
    let pattern = match pattern.as_ref() {
        Some(pattern) => pattern,
        None => return,
    };

    if pattern.status.get() != STATUS_SUCCESS {
        return;
    }
    if !pattern.is_gradient() {
        pattern.fail(STATUS_PATTERN_TYPE_MISMATCH);
        return;
    }

    let stop = ColorStop {
        offset: if offset.is_nan() { 0.0 } else { offset.max(0.0).min(1.0) },
        color: RawColor {
            red,
            green,
            blue,
            alpha,
        }
        .clamped(),
    };

    let mut stops = pattern.stops.borrow_mut();
    let index = stops
        .iter()
        .position(|s| s.offset > stop.offset)
        .unwrap_or_else(|| stops.len());
    stops.insert(index, stop);
}

/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_color_stop_count(pattern: *mut RawPattern, count: &mut i32) -> RawStatus {
    match pattern.as_ref() {
        Some(pattern) if pattern.is_gradient() => {
            *count = pattern.stops.borrow().len() as i32;
            STATUS_SUCCESS
        }
        Some(_) => STATUS_PATTERN_TYPE_MISMATCH,
        None => STATUS_NULL_POINTER,
    }
}

/// Read stop `index` of a gradient as `(offset, color)`.
///
/// # Safety
///
/// `pattern` must be null or a live pattern.
pub unsafe fn pattern_get_color_stop_rgba(
    pattern: *mut RawPattern,
    index: i32,
    offset: &mut f64,
    color: &mut RawColor,
) -> RawStatus {
    let pattern = match pattern.as_ref() {
        Some(pattern) => pattern,
        None => return STATUS_NULL_POINTER,
    };

    if !pattern.is_gradient() {
        return STATUS_PATTERN_TYPE_MISMATCH;
    }

    let stops = pattern.stops.borrow();
    match usize::try_from(index).ok().and_then(|i| stops.get(i)) {
        Some(stop) => {
            *offset = stop.offset;
            *color = stop.color;
            STATUS_SUCCESS
        }
        None => STATUS_INVALID_INDEX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_are_sorted_and_stable() {
        let pattern = pattern_create_linear(0.0, 0.0, 10.0, 0.0);
        unsafe {
            pattern_add_color_stop_rgb(pattern, 1.0, 0.0, 0.0, 1.0);
            pattern_add_color_stop_rgb(pattern, 0.0, 1.0, 0.0, 0.0);
            pattern_add_color_stop_rgb(pattern, 1.0, 0.0, 1.0, 0.0);

            let mut count = 0;
            assert_eq!(pattern_get_color_stop_count(pattern, &mut count), STATUS_SUCCESS);
            assert_eq!(count, 3);

            let mut offset = 0.0;
            let mut color = RawColor::default();
            assert_eq!(
                pattern_get_color_stop_rgba(pattern, 2, &mut offset, &mut color),
                STATUS_SUCCESS
            );
            assert_eq!(offset, 1.0);
            assert_eq!(color.green, 1.0);

            assert_eq!(
                pattern_get_color_stop_rgba(pattern, 3, &mut offset, &mut color),
                STATUS_INVALID_INDEX
            );
            pattern_destroy(pattern);
        }
    }

    #[test]
    fn stops_on_solid_pattern_are_a_type_error() {
        let pattern = pattern_create_rgb(0.0, 0.0, 0.0);
        unsafe {
            pattern_add_color_stop_rgb(pattern, 0.5, 1.0, 1.0, 1.0);
            assert_eq!(pattern_status(pattern), STATUS_PATTERN_TYPE_MISMATCH);
            pattern_destroy(pattern);
        }
    }

    #[test]
    fn surface_pattern_holds_its_surface() {
        unsafe {
            let surface = super::super::image_surface_create(super::super::FORMAT_ARGB32, 4, 4);
            let pattern = pattern_create_for_surface(surface);
            assert_eq!(super::super::surface_get_reference_count(surface), 2);
            assert_eq!(pattern_get_extend(pattern), EXTEND_NONE);

            let mut inner = core::ptr::null_mut();
            assert_eq!(pattern_get_surface(pattern, &mut inner), STATUS_SUCCESS);
            assert_eq!(inner, surface);

            pattern_destroy(pattern);
            assert_eq!(super::super::surface_get_reference_count(surface), 1);
            super::super::surface_destroy(surface);
        }
    }

    #[test]
    fn singular_matrix_poisons_the_pattern() {
        let pattern = pattern_create_rgb(1.0, 1.0, 1.0);
        unsafe {
            pattern_set_matrix(pattern, &super::super::matrix_init_scale(0.0, 0.0));
            assert_eq!(pattern_status(pattern), STATUS_INVALID_MATRIX);
            pattern_destroy(pattern);
        }
    }
}
