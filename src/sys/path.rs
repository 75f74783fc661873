// Boost/Apache2 License

//! Path storage, flattening and hit testing.

use core::cell::Cell;

use super::matrix::{matrix_transform_point, RawMatrix};
use super::object::{self, Header, Object};
use super::{
    RawPoint, RawStatus, FILL_RULE_EVEN_ODD, PATH_CLOSE_PATH, PATH_CURVE_TO, PATH_LINE_TO,
    PATH_MOVE_TO, STATUS_INVALID_PATH_DATA, STATUS_NULL_POINTER, STATUS_SUCCESS,
};

/// Upper bound on the segments one curve flattens into.
const MAX_CURVE_SEGMENTS: usize = 1024;

/// One element of a path. `points` holds one point for a move or line, three for a curve
/// and none for a close; unused slots are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPathData {
    pub data_type: i32,
    pub points: [RawPoint; 3],
}

impl RawPathData {
    pub(crate) fn move_to(p: RawPoint) -> Self {
        Self::with(PATH_MOVE_TO, [p, RawPoint::default(), RawPoint::default()])
    }

    pub(crate) fn line_to(p: RawPoint) -> Self {
        Self::with(PATH_LINE_TO, [p, RawPoint::default(), RawPoint::default()])
    }

    pub(crate) fn curve_to(p1: RawPoint, p2: RawPoint, p3: RawPoint) -> Self {
        Self::with(PATH_CURVE_TO, [p1, p2, p3])
    }

    pub(crate) fn close_path() -> Self {
        Self::with(PATH_CLOSE_PATH, [RawPoint::default(); 3])
    }

    fn with(data_type: i32, points: [RawPoint; 3]) -> Self {
        Self { data_type, points }
    }

    /// Number of meaningful entries in `points`.
    pub fn point_count(&self) -> usize {
        match self.data_type {
            PATH_MOVE_TO | PATH_LINE_TO => 1,
            PATH_CURVE_TO => 3,
            _ => 0,
        }
    }

    fn transformed(&self, matrix: &RawMatrix) -> Self {
        let mut out = *self;
        for point in out.points.iter_mut().take(self.point_count()) {
            *point = matrix_transform_point(matrix, *point);
        }
        out
    }
}

/// A path copied out of a context.
pub struct RawPath {
    header: Header,
    status: Cell<RawStatus>,
    data: Vec<RawPathData>,
}

impl Object for RawPath {
    const KIND: &'static str = "path";

    fn header(&self) -> &Header {
        &self.header
    }
}

impl RawPath {
    pub(crate) fn data(&self) -> &[RawPathData] {
        &self.data
    }

    pub(crate) fn status(&self) -> RawStatus {
        self.status.get()
    }
}

pub(crate) fn path_create(data: Vec<RawPathData>, status: RawStatus) -> *mut RawPath {
    let path = object::allocate(RawPath {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        data: if status == STATUS_SUCCESS { data } else { Vec::new() },
    });

    // SAFETY: freshly allocated.
    if let Some(p) = unsafe { path.as_ref() } {
        object::set_error(RawPath::KIND, &p.status, status);
    }
    path
}

/// # Safety
///
/// `path` must be null or a live path owned by the caller.
pub unsafe fn path_destroy(path: *mut RawPath) {
    object::release(path)
}

/// # Safety
///
/// `path` must be null or a live path.
pub unsafe fn path_status(path: *mut RawPath) -> RawStatus {
    path.as_ref().map_or(STATUS_NULL_POINTER, RawPath::status)
}

/// The elements of `path`.
///
/// # Safety
///
/// `path` must be null or a live path that outlives `'a`.
pub unsafe fn path_get_data<'a>(path: *mut RawPath) -> &'a [RawPathData] {
    path.as_ref().map_or(&[], |p| &p.data)
}

/// The path under construction in a context, in device space.
#[derive(Debug, Clone, Default)]
pub(crate) struct CurrentPath {
    elements: Vec<RawPathData>,
    current: Option<RawPoint>,
    last_move: Option<RawPoint>,
    /// Set after a close: the next segment starts a new subpath at `last_move`.
    needs_move_to: bool,
}

impl CurrentPath {
    pub(crate) fn elements(&self) -> &[RawPathData] {
        &self.elements
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn current_point(&self) -> Option<RawPoint> {
        self.current
    }

    /// Forget the current point without starting a subpath.
    pub(crate) fn new_sub_path(&mut self) {
        self.current = None;
        self.needs_move_to = false;
    }

    pub(crate) fn move_to(&mut self, p: RawPoint) {
        self.needs_move_to = false;

        // Consecutive moves collapse into the last one.
        match self.elements.last_mut() {
            Some(last) if last.data_type == PATH_MOVE_TO => *last = RawPathData::move_to(p),
            _ => self.elements.push(RawPathData::move_to(p)),
        }

        self.current = Some(p);
        self.last_move = Some(p);
    }

    fn ensure_subpath(&mut self, start: RawPoint) {
        if self.needs_move_to {
            if let Some(p) = self.last_move {
                self.move_to(p);
            }
        } else if self.current.is_none() {
            self.move_to(start);
        }
    }

    /// With no current point this is a move.
    pub(crate) fn line_to(&mut self, p: RawPoint) {
        if self.current.is_none() && !self.needs_move_to {
            self.move_to(p);
            return;
        }

        self.ensure_subpath(p);
        self.elements.push(RawPathData::line_to(p));
        self.current = Some(p);
    }

    /// With no current point the curve starts at `p1`.
    pub(crate) fn curve_to(&mut self, p1: RawPoint, p2: RawPoint, p3: RawPoint) {
        self.ensure_subpath(p1);
        self.elements.push(RawPathData::curve_to(p1, p2, p3));
        self.current = Some(p3);
    }

    pub(crate) fn close_path(&mut self) {
        if self.current.is_none() || self.needs_move_to {
            return;
        }

        self.elements.push(RawPathData::close_path());
        self.current = self.last_move;
        self.needs_move_to = true;
    }

    /// Append elements, validating their shape.
    pub(crate) fn append(&mut self, data: &[RawPathData], matrix: &RawMatrix) -> RawStatus {
        if data
            .iter()
            .any(|d| !(PATH_MOVE_TO..=PATH_CLOSE_PATH).contains(&d.data_type))
        {
            return STATUS_INVALID_PATH_DATA;
        }

        for element in data {
            let e = element.transformed(matrix);
            match e.data_type {
                PATH_MOVE_TO => self.move_to(e.points[0]),
                PATH_LINE_TO => self.line_to(e.points[0]),
                PATH_CURVE_TO => self.curve_to(e.points[0], e.points[1], e.points[2]),
                _ => self.close_path(),
            }
        }

        STATUS_SUCCESS
    }

    /// Elements mapped through `matrix`.
    pub(crate) fn transformed(&self, matrix: &RawMatrix) -> Vec<RawPathData> {
        self.elements.iter().map(|e| e.transformed(matrix)).collect()
    }

    /// Curves replaced by line segments within `tolerance`.
    pub(crate) fn flattened(&self, tolerance: f64) -> Vec<RawPathData> {
        flatten_elements(&self.elements, tolerance)
    }
}

/// Replace curves by lines whose distance from the curve stays under `tolerance`.
pub(crate) fn flatten_elements(elements: &[RawPathData], tolerance: f64) -> Vec<RawPathData> {
    let mut out = Vec::with_capacity(elements.len());
    let mut current = RawPoint::default();

    for e in elements {
        match e.data_type {
            PATH_CURVE_TO => {
                let [p1, p2, p3] = e.points;
                for p in flatten_cubic(current, p1, p2, p3, tolerance) {
                    out.push(RawPathData::line_to(p));
                }
                current = p3;
            }
            PATH_MOVE_TO | PATH_LINE_TO => {
                current = e.points[0];
                out.push(*e);
            }
            _ => out.push(*e),
        }
    }

    out
}

/// Points after `p0` along the cubic from `p0` to `p3`.
fn flatten_cubic(
    p0: RawPoint,
    p1: RawPoint,
    p2: RawPoint,
    p3: RawPoint,
    tolerance: f64,
) -> Vec<RawPoint> {
    // Bound the second difference of the curve to pick a uniform step.
    let dd = |a: RawPoint, b: RawPoint, c: RawPoint| {
        let x = a.x - 2.0 * b.x + c.x;
        let y = a.y - 2.0 * b.y + c.y;
        (x * x + y * y).sqrt()
    };
    let d = dd(p0, p1, p2).max(dd(p1, p2, p3));
    let n = ((0.75 * d / tolerance.max(f64::EPSILON)).sqrt().ceil() as usize)
        .max(1)
        .min(MAX_CURVE_SEGMENTS);

    (1..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            RawPoint::new(
                a * p0.x + b * p1.x + c * p2.x + d * p3.x,
                a * p0.y + b * p1.y + c * p2.y + d * p3.y,
            )
        })
        .collect()
}

/// Closed polygons of a flattened path. Every subpath is closed implicitly.
fn polygons(flat: &[RawPathData]) -> Vec<Vec<RawPoint>> {
    let mut polys = Vec::new();
    let mut poly: Vec<RawPoint> = Vec::new();

    for e in flat {
        match e.data_type {
            PATH_MOVE_TO => {
                if poly.len() > 1 {
                    polys.push(core::mem::take(&mut poly));
                }
                poly.clear();
                poly.push(e.points[0]);
            }
            PATH_LINE_TO => poly.push(e.points[0]),
            PATH_CLOSE_PATH => {
                let start = poly.first().copied();
                if poly.len() > 1 {
                    polys.push(core::mem::take(&mut poly));
                }
                poly.clear();
                if let Some(start) = start {
                    poly.push(start);
                }
            }
            _ => {}
        }
    }

    if poly.len() > 1 {
        polys.push(poly);
    }
    polys
}

/// Whether `point` is inside the flattened path under `fill_rule`.
pub(crate) fn contains(flat: &[RawPathData], point: RawPoint, fill_rule: i32) -> bool {
    let mut winding = 0i32;

    for poly in polygons(flat) {
        for (i, a) in poly.iter().enumerate() {
            let b = poly[(i + 1) % poly.len()];
            let cross = (b.x - a.x) * (point.y - a.y) - (point.x - a.x) * (b.y - a.y);

            if a.y <= point.y {
                if b.y > point.y && cross > 0.0 {
                    winding += 1;
                }
            } else if b.y <= point.y && cross < 0.0 {
                winding -= 1;
            }
        }
    }

    if fill_rule == FILL_RULE_EVEN_ODD {
        winding % 2 != 0
    } else {
        winding != 0
    }
}

/// Bounding box of every point of the flattened path, as `(x1, y1, x2, y2)`.
pub(crate) fn bounds(flat: &[RawPathData]) -> Option<(f64, f64, f64, f64)> {
    flat.iter()
        .flat_map(|e| e.points.iter().take(e.point_count()))
        .fold(None, |acc, p| {
            Some(match acc {
                None => (p.x, p.y, p.x, p.y),
                Some((x1, y1, x2, y2)) => (x1.min(p.x), y1.min(p.y), x2.max(p.x), y2.max(p.y)),
            })
        })
}

/// If the elements trace exactly one axis-aligned rectangle, its corners as
/// `(x1, y1, x2, y2)`.
pub(crate) fn as_rectangle(elements: &[RawPathData]) -> Option<(f64, f64, f64, f64)> {
    let points: Vec<RawPoint> = match elements {
        [m, l1, l2, l3, rest @ ..]
            if m.data_type == PATH_MOVE_TO
                && [l1, l2, l3].iter().all(|e| e.data_type == PATH_LINE_TO)
                && rest.iter().all(|e| {
                    e.data_type == PATH_CLOSE_PATH
                        || (e.data_type == PATH_MOVE_TO && e.points[0] == m.points[0])
                        || (e.data_type == PATH_LINE_TO && e.points[0] == m.points[0])
                }) =>
        {
            vec![m.points[0], l1.points[0], l2.points[0], l3.points[0]]
        }
        _ => return None,
    };

    let horizontal_first = (0..4).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % 4];
        if i % 2 == 0 {
            a.y == b.y
        } else {
            a.x == b.x
        }
    });
    let vertical_first = (0..4).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % 4];
        if i % 2 == 0 {
            a.x == b.x
        } else {
            a.y == b.y
        }
    });

    if !horizontal_first && !vertical_first {
        return None;
    }

    let xs = points.iter().map(|p| p.x);
    let ys = points.iter().map(|p| p.y);
    Some((
        xs.clone().fold(f64::INFINITY, f64::min),
        ys.clone().fold(f64::INFINITY, f64::min),
        xs.fold(f64::NEG_INFINITY, f64::max),
        ys.fold(f64::NEG_INFINITY, f64::max),
    ))
}

/// Build a `tiny-skia` path from elements, mapping every point through `matrix`.
pub(crate) fn to_skia(elements: &[RawPathData], matrix: &RawMatrix) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();

    for e in elements {
        let e = e.transformed(matrix);
        let [p1, p2, p3] = e.points;
        match e.data_type {
            PATH_MOVE_TO => builder.move_to(p1.x as f32, p1.y as f32),
            PATH_LINE_TO => builder.line_to(p1.x as f32, p1.y as f32),
            PATH_CURVE_TO => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            _ => builder.close(),
        }
    }

    builder.finish()
}

/// Convert a `tiny-skia` path back to elements. Quadratic segments become cubics.
pub(crate) fn from_skia(path: &tiny_skia::Path) -> Vec<RawPathData> {
    use tiny_skia::PathSegment;

    let point = |p: tiny_skia::Point| RawPoint::new(f64::from(p.x), f64::from(p.y));
    let mut out = Vec::new();
    let mut current = RawPoint::default();

    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                current = point(p);
                out.push(RawPathData::move_to(current));
            }
            PathSegment::LineTo(p) => {
                current = point(p);
                out.push(RawPathData::line_to(current));
            }
            PathSegment::QuadTo(c, p) => {
                let (c, p) = (point(c), point(p));
                let c1 = RawPoint::new(
                    current.x + 2.0 / 3.0 * (c.x - current.x),
                    current.y + 2.0 / 3.0 * (c.y - current.y),
                );
                let c2 = RawPoint::new(p.x + 2.0 / 3.0 * (c.x - p.x), p.y + 2.0 / 3.0 * (c.y - p.y));
                out.push(RawPathData::curve_to(c1, c2, p));
                current = p;
            }
            PathSegment::CubicTo(c1, c2, p) => {
                current = point(p);
                out.push(RawPathData::curve_to(point(c1), point(c2), current));
            }
            PathSegment::Close => out.push(RawPathData::close_path()),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::super::FILL_RULE_WINDING;
    use super::*;

    fn square(path: &mut CurrentPath, x: f64, y: f64, size: f64) {
        path.move_to(RawPoint::new(x, y));
        path.line_to(RawPoint::new(x + size, y));
        path.line_to(RawPoint::new(x + size, y + size));
        path.line_to(RawPoint::new(x, y + size));
        path.close_path();
    }

    #[test]
    fn line_without_current_point_moves() {
        let mut path = CurrentPath::default();
        path.line_to(RawPoint::new(3.0, 4.0));
        assert_eq!(path.elements(), &[RawPathData::move_to(RawPoint::new(3.0, 4.0))]);
    }

    #[test]
    fn moves_collapse() {
        let mut path = CurrentPath::default();
        path.move_to(RawPoint::new(1.0, 1.0));
        path.move_to(RawPoint::new(2.0, 2.0));
        assert_eq!(path.elements().len(), 1);
        assert_eq!(path.current_point(), Some(RawPoint::new(2.0, 2.0)));
    }

    #[test]
    fn close_restarts_at_subpath_start() {
        let mut path = CurrentPath::default();
        square(&mut path, 0.0, 0.0, 1.0);
        assert_eq!(path.current_point(), Some(RawPoint::new(0.0, 0.0)));

        path.line_to(RawPoint::new(5.0, 5.0));
        let types: Vec<i32> = path.elements().iter().map(|e| e.data_type).collect();
        assert_eq!(
            types,
            [
                PATH_MOVE_TO,
                PATH_LINE_TO,
                PATH_LINE_TO,
                PATH_LINE_TO,
                PATH_CLOSE_PATH,
                PATH_MOVE_TO,
                PATH_LINE_TO
            ]
        );
    }

    #[test]
    fn fill_rules_differ_on_nested_squares() {
        let mut path = CurrentPath::default();
        square(&mut path, 0.0, 0.0, 10.0);
        square(&mut path, 2.0, 2.0, 6.0);
        let flat = path.flattened(0.1);
        let center = RawPoint::new(5.0, 5.0);

        assert!(contains(&flat, center, FILL_RULE_WINDING));
        assert!(!contains(&flat, center, FILL_RULE_EVEN_ODD));
        assert!(!contains(&flat, RawPoint::new(11.0, 5.0), FILL_RULE_WINDING));
    }

    #[test]
    fn flattened_curve_stays_on_the_endpoints() {
        let mut path = CurrentPath::default();
        path.move_to(RawPoint::new(0.0, 0.0));
        path.curve_to(
            RawPoint::new(0.0, 10.0),
            RawPoint::new(10.0, 10.0),
            RawPoint::new(10.0, 0.0),
        );
        let flat = path.flattened(0.1);
        assert!(flat.len() > 4);
        assert!(flat.iter().all(|e| e.data_type != PATH_CURVE_TO));
        assert_eq!(flat.last().unwrap().points[0], RawPoint::new(10.0, 0.0));
    }

    #[test]
    fn recognizes_rectangles() {
        let mut path = CurrentPath::default();
        square(&mut path, 1.0, 2.0, 3.0);
        assert_eq!(as_rectangle(path.elements()), Some((1.0, 2.0, 4.0, 5.0)));

        path.line_to(RawPoint::new(9.0, 9.0));
        assert_eq!(as_rectangle(path.elements()), None);
    }
}
