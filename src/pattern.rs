// Boost/Apache2 License

//! Patterns, the paint a context draws with.

use crate::geometry::{Color, Matrix, Vec2};
use crate::handle::SharedHandle;
use crate::status::Status;
use crate::surface::Surface;
use crate::sys;
use crate::Error;

use core::convert::TryFrom;
use core::ops::Deref;

raw_enum! {
    /// Kind of a pattern.
    pub enum PatternType {
        Solid = sys::PATTERN_TYPE_SOLID,
        Surface = sys::PATTERN_TYPE_SURFACE,
        Linear = sys::PATTERN_TYPE_LINEAR,
        Radial = sys::PATTERN_TYPE_RADIAL,
    }
}

raw_enum! {
    /// What a pattern paints outside of its natural area.
    pub enum Extend {
        /// Nothing. The default for surface patterns.
        None = sys::EXTEND_NONE,
        Repeat = sys::EXTEND_REPEAT,
        Reflect = sys::EXTEND_REFLECT,
        /// The nearest edge color. The default for gradients.
        Pad = sys::EXTEND_PAD,
    }
}

raw_enum! {
    /// How surface patterns are sampled.
    pub enum Filter {
        Fast = sys::FILTER_FAST,
        Good = sys::FILTER_GOOD,
        Best = sys::FILTER_BEST,
        Nearest = sys::FILTER_NEAREST,
        Bilinear = sys::FILTER_BILINEAR,
        Gaussian = sys::FILTER_GAUSSIAN,
    }
}

/// Any kind of pattern.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    handle: SharedHandle<sys::RawPattern>,
}

impl Pattern {
    /// Wrap an owned pattern.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live pattern whose count the caller owns.
    pub unsafe fn from_raw(ptr: *mut sys::RawPattern) -> Self {
        Self {
            handle: SharedHandle::from_raw(ptr),
        }
    }

    /// Wrap a borrowed pattern, adding a reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live pattern.
    pub unsafe fn from_raw_shared(ptr: *mut sys::RawPattern) -> Self {
        Self {
            handle: SharedHandle::from_raw_shared(ptr),
        }
    }

    /// The underlying pattern pointer.
    pub fn as_ptr(&self) -> *mut sys::RawPattern {
        self.handle.as_ptr()
    }

    /// The sticky error status of the pattern.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::pattern_status(self.as_ptr()) })
    }

    /// What kind of pattern this is.
    pub fn pattern_type(&self) -> PatternType {
        let raw = unsafe { sys::pattern_get_type(self.as_ptr()) };
        PatternType::from_raw(raw).unwrap_or(PatternType::Solid)
    }

    /// Set the map from user space to pattern space. A singular matrix puts the pattern
    /// in [`Status::InvalidMatrix`].
    pub fn set_matrix(&self, matrix: &Matrix) {
        let raw = sys::RawMatrix::from(*matrix);
        unsafe { sys::pattern_set_matrix(self.as_ptr(), &raw) }
    }

    /// The pattern-space transform.
    pub fn matrix(&self) -> Matrix {
        unsafe { sys::pattern_get_matrix(self.as_ptr()) }.into()
    }

    /// Set how the pattern fills space outside its natural area.
    pub fn set_extend(&self, extend: Extend) {
        unsafe { sys::pattern_set_extend(self.as_ptr(), extend.into_raw()) }
    }

    /// The current extend mode.
    pub fn extend(&self) -> Extend {
        let raw = unsafe { sys::pattern_get_extend(self.as_ptr()) };
        Extend::from_raw(raw).unwrap_or(Extend::None)
    }

    /// Set the filter used when resampling.
    pub fn set_filter(&self, filter: Filter) {
        unsafe { sys::pattern_set_filter(self.as_ptr(), filter.into_raw()) }
    }

    /// The current filter.
    pub fn filter(&self) -> Filter {
        let raw = unsafe { sys::pattern_get_filter(self.as_ptr()) };
        Filter::from_raw(raw).unwrap_or(Filter::Good)
    }

    /// Number of live references to the pattern.
    pub fn reference_count(&self) -> u32 {
        self.handle.reference_count()
    }

    /// Check the runtime type before a downcast.
    fn expect_type(&self, accepted: &[PatternType]) -> Result<(), Error> {
        const FUNCTION: &str = "pattern_get_type";

        if self.handle.is_empty() {
            Err(Error::new(Status::NullPointer, FUNCTION))
        } else if accepted.contains(&self.pattern_type()) {
            Ok(())
        } else {
            Err(Error::new(Status::PatternTypeMismatch, FUNCTION))
        }
    }
}

macro_rules! subtype {
    ($(#[$meta: meta])* $name: ident($parent: ident) => [$($accepted: ident),*]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name($parent);

        impl Deref for $name {
            type Target = $parent;

            fn deref(&self) -> &$parent {
                &self.0
            }
        }

        impl From<$name> for Pattern {
            fn from(pattern: $name) -> Self {
                Pattern::from(pattern.0)
            }
        }

        impl TryFrom<Pattern> for $name {
            type Error = Error;

            fn try_from(pattern: Pattern) -> Result<Self, Error> {
                pattern.expect_type(&[$(PatternType::$accepted),*])?;
                Ok(Self($parent::unchecked(pattern)))
            }
        }
    };
}

impl Pattern {
    fn unchecked(pattern: Pattern) -> Self {
        pattern
    }

    /// Getters on an empty or failed pattern may report a mismatch; nothing else may.
    fn getter_ok(&self, status: sys::RawStatus) -> bool {
        status == sys::STATUS_SUCCESS || !self.status().is_success()
    }
}

subtype! {
    /// A single color.
    SolidPattern(Pattern) => [Solid]
}

subtype! {
    /// The contents of a surface.
    SurfacePattern(Pattern) => [Surface]
}

subtype! {
    /// A linear or radial gradient.
    Gradient(Pattern) => [Linear, Radial]
}

subtype! {
    LinearGradient(Gradient) => [Linear]
}

subtype! {
    RadialGradient(Gradient) => [Radial]
}

impl Gradient {
    fn unchecked(pattern: Pattern) -> Self {
        Self(pattern)
    }
}

impl From<LinearGradient> for Gradient {
    fn from(gradient: LinearGradient) -> Self {
        gradient.0
    }
}

impl From<RadialGradient> for Gradient {
    fn from(gradient: RadialGradient) -> Self {
        gradient.0
    }
}

impl SolidPattern {
    /// An opaque color. Components are clamped to `0.0..=1.0`.
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self(unsafe { Pattern::from_raw(sys::pattern_create_rgb(red, green, blue)) })
    }

    /// A translucent solid pattern.
    pub fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self(unsafe { Pattern::from_raw(sys::pattern_create_rgba(red, green, blue, alpha)) })
    }

    /// A solid pattern of `color`.
    pub fn from_color(color: Color) -> Self {
        Self::rgba(color.red, color.green, color.blue, color.alpha)
    }

    /// The color of the pattern.
    pub fn color(&self) -> Color {
        let mut color = sys::RawColor::default();
        let status = unsafe { sys::pattern_get_rgba(self.as_ptr(), &mut color) };
        debug_assert!(self.getter_ok(status));
        color.into()
    }
}

impl SurfacePattern {
    /// Paint `surface`, with its origin at the user-space origin.
    pub fn create(surface: &Surface) -> Self {
        Self(unsafe { Pattern::from_raw(sys::pattern_create_for_surface(surface.as_ptr())) })
    }

    /// The surface being painted. Empty for patterns in an error status.
    pub fn surface(&self) -> Surface {
        let mut surface = core::ptr::null_mut();
        let status = unsafe { sys::pattern_get_surface(self.as_ptr(), &mut surface) };
        debug_assert!(self.getter_ok(status));
        unsafe { Surface::from_raw_shared(surface) }
    }
}

impl Gradient {
    /// Add a color stop. `offset` is clamped to `0.0..=1.0`; stops at the same offset
    /// keep the order they were added in.
    pub fn add_color_stop_rgb(&self, offset: f64, red: f64, green: f64, blue: f64) {
        unsafe { sys::pattern_add_color_stop_rgb(self.as_ptr(), offset, red, green, blue) }
    }

    /// Add a translucent color stop at `offset`.
    pub fn add_color_stop_rgba(&self, offset: f64, red: f64, green: f64, blue: f64, alpha: f64) {
        unsafe {
            sys::pattern_add_color_stop_rgba(self.as_ptr(), offset, red, green, blue, alpha)
        }
    }

    /// Add a color stop at `offset`.
    pub fn add_color_stop_color(&self, offset: f64, color: Color) {
        self.add_color_stop_rgba(offset, color.red, color.green, color.blue, color.alpha)
    }

    /// Number of color stops.
    pub fn color_stop_count(&self) -> usize {
        let mut count = 0;
        let status = unsafe { sys::pattern_get_color_stop_count(self.as_ptr(), &mut count) };
        debug_assert!(self.getter_ok(status));
        count.max(0) as usize
    }

    /// The offset and color of stop `index`.
    pub fn color_stop(&self, index: usize) -> Result<(f64, Color), Error> {
        let index = i32::try_from(index)
            .map_err(|_| Error::new(Status::InvalidIndex, "pattern_get_color_stop_rgba"))?;
        let mut offset = 0.0;
        let mut color = sys::RawColor::default();
        Error::check(
            unsafe {
                sys::pattern_get_color_stop_rgba(self.as_ptr(), index, &mut offset, &mut color)
            },
            "pattern_get_color_stop_rgba",
        )?;
        Ok((offset, color.into()))
    }
}

impl LinearGradient {
    /// A gradient along the line from `p0` to `p1`.
    pub fn create(p0: Vec2<f64>, p1: Vec2<f64>) -> Self {
        Self(Gradient(unsafe {
            Pattern::from_raw(sys::pattern_create_linear(p0.x, p0.y, p1.x, p1.y))
        }))
    }

    /// The start and end points of the gradient.
    pub fn linear_points(&self) -> (Vec2<f64>, Vec2<f64>) {
        let (mut p0, mut p1) = (sys::RawPoint::default(), sys::RawPoint::default());
        let status = unsafe { sys::pattern_get_linear_points(self.as_ptr(), &mut p0, &mut p1) };
        debug_assert!(self.getter_ok(status));
        (p0.into(), p1.into())
    }
}

impl RadialGradient {
    /// A gradient between the circle around `c0` with radius `r0` and the circle around
    /// `c1` with radius `r1`.
    pub fn create(c0: Vec2<f64>, r0: f64, c1: Vec2<f64>, r1: f64) -> Self {
        Self(Gradient(unsafe {
            Pattern::from_raw(sys::pattern_create_radial(c0.x, c0.y, r0, c1.x, c1.y, r1))
        }))
    }

    /// Both circles, as `((c0, r0), (c1, r1))`.
    pub fn radial_circles(&self) -> ((Vec2<f64>, f64), (Vec2<f64>, f64)) {
        let (mut c0, mut c1) = (sys::RawPoint::default(), sys::RawPoint::default());
        let (mut r0, mut r1) = (0.0, 0.0);
        let status = unsafe {
            sys::pattern_get_radial_circles(self.as_ptr(), &mut c0, &mut r0, &mut c1, &mut r1)
        };
        debug_assert!(self.getter_ok(status));
        ((c0.into(), r0), (c1.into(), r1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Format, ImageSurface};

    #[test]
    fn solid_colors_are_clamped() {
        let pattern = SolidPattern::rgba(2.0, 0.5, -1.0, 1.0);
        assert_eq!(pattern.pattern_type(), PatternType::Solid);
        assert_eq!(pattern.color(), Color::rgb(1.0, 0.5, 0.0));
    }

    #[test]
    fn stops_are_sorted_and_indexed() {
        let gradient = LinearGradient::create(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        gradient.add_color_stop_color(1.0, Color::WHITE);
        gradient.add_color_stop_rgb(0.0, 1.0, 0.0, 0.0);
        gradient.add_color_stop_rgba(0.5, 0.0, 1.0, 0.0, 0.5);

        assert_eq!(gradient.color_stop_count(), 3);
        assert_eq!(gradient.color_stop(0).unwrap(), (0.0, Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(gradient.color_stop(2).unwrap(), (1.0, Color::WHITE));
        assert_eq!(
            gradient.color_stop(3).unwrap_err().status(),
            Status::InvalidIndex
        );
        assert_eq!(gradient.extend(), Extend::Pad);
    }

    #[test]
    fn downcasts_check_the_type() {
        let radial: Pattern =
            RadialGradient::create(Vec2::new(1.0, 1.0), 0.0, Vec2::new(1.0, 1.0), 4.0).into();

        assert!(Gradient::try_from(radial.clone()).is_ok());
        let err = LinearGradient::try_from(radial.clone()).unwrap_err();
        assert_eq!(err.status(), Status::PatternTypeMismatch);

        let radial = RadialGradient::try_from(radial).unwrap();
        assert_eq!(radial.radial_circles().1, (Vec2::new(1.0, 1.0), 4.0));
    }

    #[test]
    fn surface_patterns_keep_their_surface() {
        let surface = ImageSurface::create(Format::Argb32, 2, 2);
        let pattern = SurfacePattern::create(&surface);
        assert_eq!(surface.reference_count(), 2);
        assert_eq!(pattern.surface().as_ptr(), surface.as_ptr());
        assert_eq!(pattern.extend(), Extend::None);

        pattern.set_filter(Filter::Nearest);
        assert_eq!(pattern.filter(), Filter::Nearest);
    }

    #[test]
    fn singular_pattern_matrix_is_sticky() {
        let pattern = SolidPattern::rgb(0.0, 0.0, 0.0);
        pattern.set_matrix(&Matrix::scaling(0.0, 1.0));
        assert_eq!(pattern.status(), Status::InvalidMatrix);
        pattern.set_matrix(&Matrix::identity());
        assert_eq!(pattern.status(), Status::InvalidMatrix);
    }
}
