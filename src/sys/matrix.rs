// Boost/Apache2 License

//! Affine matrices.

use super::{RawPoint, RawStatus, STATUS_INVALID_MATRIX, STATUS_SUCCESS};

/// An affine transform.
///
/// A point `(x, y)` maps to `(xx * x + xy * y + x0, yx * x + yy * y + y0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMatrix {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Default for RawMatrix {
    fn default() -> Self {
        matrix_init_identity()
    }
}

pub fn matrix_init(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> RawMatrix {
    RawMatrix {
        xx,
        yx,
        xy,
        yy,
        x0,
        y0,
    }
}

pub fn matrix_init_identity() -> RawMatrix {
    matrix_init(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
}

pub fn matrix_init_translate(tx: f64, ty: f64) -> RawMatrix {
    matrix_init(1.0, 0.0, 0.0, 1.0, tx, ty)
}

pub fn matrix_init_scale(sx: f64, sy: f64) -> RawMatrix {
    matrix_init(sx, 0.0, 0.0, sy, 0.0, 0.0)
}

pub fn matrix_init_rotate(radians: f64) -> RawMatrix {
    let (s, c) = radians.sin_cos();
    matrix_init(c, s, -s, c, 0.0, 0.0)
}

/// The transform that applies `a`, then `b`.
pub fn matrix_multiply(a: &RawMatrix, b: &RawMatrix) -> RawMatrix {
    RawMatrix {
        xx: a.xx * b.xx + a.yx * b.xy,
        yx: a.xx * b.yx + a.yx * b.yy,
        xy: a.xy * b.xx + a.yy * b.xy,
        yy: a.xy * b.yx + a.yy * b.yy,
        x0: a.x0 * b.xx + a.y0 * b.xy + b.x0,
        y0: a.x0 * b.yx + a.y0 * b.yy + b.y0,
    }
}

/// Prepend a translation to `matrix`.
pub fn matrix_translate(matrix: &mut RawMatrix, tx: f64, ty: f64) {
    *matrix = matrix_multiply(&matrix_init_translate(tx, ty), matrix);
}

/// Prepend a scale to `matrix`.
pub fn matrix_scale(matrix: &mut RawMatrix, sx: f64, sy: f64) {
    *matrix = matrix_multiply(&matrix_init_scale(sx, sy), matrix);
}

/// Prepend a rotation to `matrix`.
pub fn matrix_rotate(matrix: &mut RawMatrix, radians: f64) {
    *matrix = matrix_multiply(&matrix_init_rotate(radians), matrix);
}

pub(crate) fn matrix_determinant(matrix: &RawMatrix) -> f64 {
    matrix.xx * matrix.yy - matrix.yx * matrix.xy
}

pub(crate) fn matrix_is_invertible(matrix: &RawMatrix) -> bool {
    let det = matrix_determinant(matrix);
    det.is_finite()
        && det != 0.0
        && matrix.x0.is_finite()
        && matrix.y0.is_finite()
}

/// Invert `matrix` in place. On failure the matrix is left unchanged.
pub fn matrix_invert(matrix: &mut RawMatrix) -> RawStatus {
    if !matrix_is_invertible(matrix) {
        return STATUS_INVALID_MATRIX;
    }

    let det = matrix_determinant(matrix);
    let m = *matrix;
    *matrix = RawMatrix {
        xx: m.yy / det,
        yx: -m.yx / det,
        xy: -m.xy / det,
        yy: m.xx / det,
        x0: (m.xy * m.y0 - m.yy * m.x0) / det,
        y0: (m.yx * m.x0 - m.xx * m.y0) / det,
    };

    STATUS_SUCCESS
}

/// The inverse of `matrix`, if there is one.
pub(crate) fn matrix_inverse(matrix: &RawMatrix) -> Option<RawMatrix> {
    let mut inverse = *matrix;
    if matrix_invert(&mut inverse) == STATUS_SUCCESS {
        Some(inverse)
    } else {
        None
    }
}

pub fn matrix_transform_point(matrix: &RawMatrix, point: RawPoint) -> RawPoint {
    RawPoint {
        x: matrix.xx * point.x + matrix.xy * point.y + matrix.x0,
        y: matrix.yx * point.x + matrix.yy * point.y + matrix.y0,
    }
}

pub fn matrix_transform_distance(matrix: &RawMatrix, distance: RawPoint) -> RawPoint {
    RawPoint {
        x: matrix.xx * distance.x + matrix.xy * distance.y,
        y: matrix.yx * distance.x + matrix.yy * distance.y,
    }
}

/// Bounding box, as `(x1, y1, x2, y2)`, of a box mapped through `matrix`.
pub(crate) fn matrix_transform_bounds(
    matrix: &RawMatrix,
    (x1, y1, x2, y2): (f64, f64, f64, f64),
) -> (f64, f64, f64, f64) {
    let corners = [
        RawPoint::new(x1, y1),
        RawPoint::new(x2, y1),
        RawPoint::new(x1, y2),
        RawPoint::new(x2, y2),
    ];

    let mut bounds = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for corner in corners.iter() {
        let p = matrix_transform_point(matrix, *corner);
        bounds.0 = bounds.0.min(p.x);
        bounds.1 = bounds.1.min(p.y);
        bounds.2 = bounds.2.max(p.x);
        bounds.3 = bounds.3.max(p.y);
    }

    bounds
}

/// Whether `matrix` keeps axis-aligned rectangles axis-aligned.
pub(crate) fn matrix_is_rectilinear(matrix: &RawMatrix) -> bool {
    (matrix.yx == 0.0 && matrix.xy == 0.0) || (matrix.xx == 0.0 && matrix.yy == 0.0)
}

pub(crate) fn to_transform(matrix: &RawMatrix) -> tiny_skia::Transform {
    tiny_skia::Transform::from_row(
        matrix.xx as f32,
        matrix.yx as f32,
        matrix.xy as f32,
        matrix.yy as f32,
        matrix.x0 as f32,
        matrix.y0 as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn multiply_applies_left_first() {
        let a = matrix_init_translate(10.0, 0.0);
        let b = matrix_init_scale(2.0, 2.0);
        let p = matrix_transform_point(&matrix_multiply(&a, &b), RawPoint::new(1.0, 1.0));
        assert_abs_diff_eq!(p.x, 22.0);
        assert_abs_diff_eq!(p.y, 2.0);
    }

    #[test]
    fn translate_is_applied_in_user_space() {
        let mut m = matrix_init_scale(2.0, 2.0);
        matrix_translate(&mut m, 5.0, 5.0);
        let p = matrix_transform_point(&m, RawPoint::new(0.0, 0.0));
        assert_abs_diff_eq!(p.x, 10.0);
        assert_abs_diff_eq!(p.y, 10.0);
    }

    #[test]
    fn invert_round_trips() {
        let mut m = matrix_init_rotate(0.7);
        matrix_scale(&mut m, 3.0, 0.5);
        matrix_translate(&mut m, -4.0, 9.0);
        let inverse = matrix_inverse(&m).unwrap();
        let p = RawPoint::new(12.5, -3.25);
        let q = matrix_transform_point(&inverse, matrix_transform_point(&m, p));
        assert_abs_diff_eq!(q.x, p.x, epsilon = 1e-9);
        assert_abs_diff_eq!(q.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut m = matrix_init_scale(0.0, 1.0);
        assert_eq!(matrix_invert(&mut m), STATUS_INVALID_MATRIX);
        assert_eq!(m, matrix_init_scale(0.0, 1.0));
    }

    #[test]
    fn distance_ignores_translation() {
        let m = matrix_init(2.0, 0.0, 0.0, 3.0, 100.0, 100.0);
        let d = matrix_transform_distance(&m, RawPoint::new(1.0, 1.0));
        assert_eq!(d, RawPoint::new(2.0, 3.0));
    }
}
