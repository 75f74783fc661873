// Boost/Apache2 License

//! Points, rectangles, colors and affine transforms.

use crate::sys;
use crate::Error;

use core::ops::Mul;

/// A two-dimensional vector or point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vec2<T> {
    pub x: T,
    pub y: T,
}

impl<T> Vec2<T> {
    /// Create a vector from its components.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self {
        Self { x, y }
    }
}

impl<T> From<[T; 2]> for Vec2<T> {
    fn from([x, y]: [T; 2]) -> Self {
        Self { x, y }
    }
}

impl<T> From<Vec2<T>> for [T; 2] {
    fn from(v: Vec2<T>) -> Self {
        [v.x, v.y]
    }
}

impl From<sys::RawPoint> for Vec2<f64> {
    fn from(p: sys::RawPoint) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Vec2<f64>> for sys::RawPoint {
    fn from(v: Vec2<f64>) -> Self {
        sys::RawPoint::new(v.x, v.y)
    }
}

/// An axis-aligned rectangle given by its origin and size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    /// Create a rectangle from its origin and size.
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl<T: Copy> Rect<T> {
    /// The top-left corner.
    pub fn origin(&self) -> Vec2<T> {
        Vec2::new(self.x, self.y)
    }

    /// Width and height as a vector.
    pub fn size(&self) -> Vec2<T> {
        Vec2::new(self.width, self.height)
    }
}

impl From<sys::RawRectangle> for Rect<f64> {
    fn from(r: sys::RawRectangle) -> Self {
        Self::new(r.x, r.y, r.width, r.height)
    }
}

/// A color with straight (not premultiplied) alpha. Components range over `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// An opaque color.
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// A color with an alpha channel.
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<sys::RawColor> for Color {
    fn from(c: sys::RawColor) -> Self {
        Self::rgba(c.red, c.green, c.blue, c.alpha)
    }
}

impl From<Color> for sys::RawColor {
    fn from(c: Color) -> Self {
        sys::RawColor {
            red: c.red,
            green: c.green,
            blue: c.blue,
            alpha: c.alpha,
        }
    }
}

/// An affine transform.
///
/// A point `(x, y)` maps to `(xx * x + xy * y + x0, yx * x + yy * y + y0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Matrix {
    /// Create a matrix from its six components.
    pub fn new(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        sys::matrix_init(xx, yx, xy, yy, x0, y0).into()
    }

    /// The identity transform.
    pub fn identity() -> Self {
        sys::matrix_init_identity().into()
    }

    /// A pure translation.
    pub fn translation(tx: f64, ty: f64) -> Self {
        sys::matrix_init_translate(tx, ty).into()
    }

    /// A pure scale.
    pub fn scaling(sx: f64, sy: f64) -> Self {
        sys::matrix_init_scale(sx, sy).into()
    }

    /// A rotation by `radians`. Positive angles turn the x axis towards the y axis.
    pub fn rotation(radians: f64) -> Self {
        sys::matrix_init_rotate(radians).into()
    }

    /// Translate before applying this transform.
    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        self.modify(|m| sys::matrix_translate(m, tx, ty))
    }

    /// Scale before applying this transform.
    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.modify(|m| sys::matrix_scale(m, sx, sy))
    }

    /// Rotate before applying this transform.
    pub fn rotate(&mut self, radians: f64) -> &mut Self {
        self.modify(|m| sys::matrix_rotate(m, radians))
    }

    /// Invert in place. A singular matrix is left unchanged.
    pub fn invert(&mut self) -> Result<(), Error> {
        let mut raw = sys::RawMatrix::from(*self);
        Error::check(sys::matrix_invert(&mut raw), "matrix_invert")?;
        *self = raw.into();
        Ok(())
    }

    /// The inverse transform.
    pub fn inverse(&self) -> Result<Self, Error> {
        let mut inverse = *self;
        inverse.invert()?;
        Ok(inverse)
    }

    /// The transform that applies `self` first, then `other`.
    pub fn multiply(&self, other: &Self) -> Self {
        sys::matrix_multiply(&(*self).into(), &(*other).into()).into()
    }

    /// Apply the full transform to a point.
    pub fn transform_point(&self, point: Vec2<f64>) -> Vec2<f64> {
        sys::matrix_transform_point(&(*self).into(), point.into()).into()
    }

    /// Transform a distance vector, ignoring the translation.
    pub fn transform_distance(&self, distance: Vec2<f64>) -> Vec2<f64> {
        sys::matrix_transform_distance(&(*self).into(), distance.into()).into()
    }

    fn modify(&mut self, f: impl FnOnce(&mut sys::RawMatrix)) -> &mut Self {
        let mut raw = sys::RawMatrix::from(*self);
        f(&mut raw);
        *self = raw.into();
        self
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// `a * b` applies `a` first, then `b`.
impl Mul for Matrix {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl From<sys::RawMatrix> for Matrix {
    fn from(m: sys::RawMatrix) -> Self {
        Self {
            xx: m.xx,
            yx: m.yx,
            xy: m.xy,
            yy: m.yy,
            x0: m.x0,
            y0: m.y0,
        }
    }
}

impl From<Matrix> for sys::RawMatrix {
    fn from(m: Matrix) -> Self {
        sys::matrix_init(m.xx, m.yx, m.xy, m.yy, m.x0, m.y0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn operations_prepend() {
        let mut m = Matrix::translation(10.0, 0.0);
        m.scale(2.0, 2.0);
        let p = m.transform_point(Vec2::new(1.0, 1.0));
        assert_eq!(p, Vec2::new(12.0, 2.0));
    }

    #[test]
    fn product_applies_left_first() {
        let m = Matrix::scaling(2.0, 2.0) * Matrix::translation(1.0, 0.0);
        assert_eq!(m.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(3.0, 2.0));
    }

    #[test]
    fn rotation_and_inverse() {
        let m = Matrix::rotation(FRAC_PI_2);
        let p = m.transform_point(Vec2::new(1.0, 0.0));
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-12);

        let back = m.inverse().unwrap().transform_point(p);
        assert_abs_diff_eq!(back.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(back.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_matrices_do_not_invert() {
        let mut m = Matrix::scaling(0.0, 1.0);
        let err = m.invert().unwrap_err();
        assert_eq!(err.status(), Status::InvalidMatrix);
        assert_eq!(m, Matrix::scaling(0.0, 1.0));
    }

    #[test]
    fn distances_ignore_translation() {
        let m = Matrix::new(2.0, 0.0, 0.0, 3.0, 100.0, 100.0);
        assert_eq!(
            m.transform_distance(Vec2::new(1.0, 1.0)),
            Vec2::new(2.0, 3.0)
        );
    }
}
