// Boost/Apache2 License

#![forbid(future_incompatible, rust_2018_idioms)]
#![allow(clippy::uninlined_format_args, clippy::too_many_arguments)]

//! An RAII wrapper around a reference-counted 2D vector graphics library.
//!
//! The library itself lives in [`sys`]: opaque objects behind raw addresses, integer
//! codes and a sticky status per object. Everything outside of `sys` turns those into
//! owned values that release their object on drop, typed enumerations and `Result`s.
//!
//! ```no_run
//! use vellum::{Context, Format, ImageSurface};
//!
//! let surface = ImageSurface::create(Format::Argb32, 64, 64);
//! let cr = Context::create(&surface);
//! cr.set_source_rgb(0.2, 0.4, 0.8);
//! cr.rectangle(8.0, 8.0, 48.0, 48.0).fill();
//! surface.write_to_png("square.png").unwrap();
//! ```

/// Convenience macro for aborting with a message.
macro_rules! abort {
    ($($arg:tt)*) => {
        $crate::abort_with_message(&format_args!($($arg)*))
    };
}

/// Define a typed enumeration over a group of integer codes from [`sys`].
macro_rules! raw_enum {
    (
        $(#[$meta: meta])*
        pub enum $name: ident {
            $(
                $(#[$vmeta: meta])*
                $variant: ident = $raw: path,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $raw,
            )*
        }

        impl $name {
            /// Convert a raw code, if it names a known value.
            pub fn from_raw(raw: i32) -> Option<Self> {
                match raw {
                    $(
                        $raw => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            /// The raw code for this value.
            pub fn into_raw(self) -> i32 {
                self as i32
            }
        }
    };
}

pub mod sys;

// Public modules.
pub mod context;
pub mod device;
pub mod font;
pub mod geometry;
pub mod guard;
pub mod handle;
pub mod path;
pub mod pattern;
pub mod status;
pub mod surface;

pub use context::{Antialias, Context, FillRule, LineCap, LineJoin, Operator};
pub use device::{Device, DeviceType};
pub use font::{
    FontFace, FontOptions, FontSlant, FontType, FontWeight, HintMetrics, HintStyle, ScaledFont,
    SubpixelOrder, ToyFontFace,
};
pub use geometry::{Color, Matrix, Rect, Vec2};
pub use guard::StateGuard;
pub use path::{Path, PathDataType, PathElement};
pub use pattern::{
    Extend, Filter, Gradient, LinearGradient, Pattern, PatternType, RadialGradient,
    SolidPattern, SurfacePattern,
};
pub use status::Status;
pub use surface::{format_stride_for_width, Content, Format, ImageSurface, Surface, SurfaceType};

use core::fmt;

/// The error type for fallible library operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    /// The status the library reported.
    status: Status,

    /// The library function that reported it.
    function: &'static str,
}

impl Error {
    pub(crate) fn new(status: Status, function: &'static str) -> Self {
        Self { status, function }
    }

    /// Turn a raw status into a `Result`, blaming `function` on failure.
    pub(crate) fn check(status: sys::RawStatus, function: &'static str) -> Result<(), Self> {
        match Status::from_raw(status) {
            Status::Success => Ok(()),
            status => Err(Self::new(status, function)),
        }
    }

    /// The status the library reported.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The library function that failed.
    pub fn function(&self) -> &'static str {
        self.function
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.function, self.status.description())
    }
}

impl std::error::Error for Error {}

fn abort() -> ! {
    std::process::abort();
}

fn abort_with_message(msg: &fmt::Arguments<'_>) -> ! {
    /// tracing::error! may panic, so we need to abort if that happens.
    struct AbortOnDrop;

    impl Drop for AbortOnDrop {
        fn drop(&mut self) {
            abort();
        }
    }

    let _bomb = AbortOnDrop;
    tracing::error!("Aborting: {}", msg);
    abort()
}

fn abort_on_panic<R>(f: impl FnOnce() -> R) -> R {
    struct AbortOnPanic;

    impl Drop for AbortOnPanic {
        fn drop(&mut self) {
            abort!("Function panicked in a context where panics are not allowed");
        }
    }

    let _abort_on_panic = AbortOnPanic;
    let result = f();
    core::mem::forget(_abort_on_panic);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_formats_function_and_description() {
        let err = Error::new(Status::InvalidMatrix, "matrix_invert");
        assert_eq!(
            err.to_string(),
            "matrix_invert failed: invalid matrix (not invertible)"
        );
        assert_eq!(err.status(), Status::InvalidMatrix);
    }

    #[test]
    fn success_is_not_an_error() {
        assert!(Error::check(sys::STATUS_SUCCESS, "surface_write_to_png").is_ok());
        assert_eq!(
            Error::check(sys::STATUS_WRITE_ERROR, "surface_write_to_png")
                .unwrap_err()
                .status(),
            Status::WriteError
        );
    }
}
