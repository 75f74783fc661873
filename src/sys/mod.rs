// Boost/Apache2 License

//! The raw drawing library.
//!
//! This is a C-shaped API: objects are opaque heap addresses, enumerations are plain
//! integer codes, and every object carries a sticky status. Objects are created by a
//! `*_create*` function and released by `*_destroy`. Reference-counted families also
//! have `*_reference` and `*_get_reference_count`, and deep-copyable families have
//! `*_copy`. Getters that return another object's address (for instance
//! [`surface_get_device`]) do not add a count; the caller has to `*_reference` it to
//! keep it.
//!
//! Once an object enters an error status it keeps that status, and further operations on
//! it do nothing. Rasterization is delegated to `tiny-skia`.
//!
//! Image data is stored as premultiplied RGBA, four bytes per pixel.

mod context;
mod device;
mod font;
mod matrix;
mod object;
mod path;
mod pattern;
mod render;
mod surface;

pub use context::*;
pub use device::*;
pub use font::*;
pub use matrix::*;
pub use path::{path_destroy, path_get_data, path_status, RawPath, RawPathData};
pub use pattern::*;
pub use surface::*;

/// An integer status code.
pub type RawStatus = i32;

pub const STATUS_SUCCESS: RawStatus = 0;
pub const STATUS_NO_MEMORY: RawStatus = 1;
pub const STATUS_INVALID_RESTORE: RawStatus = 2;
pub const STATUS_INVALID_POP_GROUP: RawStatus = 3;
pub const STATUS_NO_CURRENT_POINT: RawStatus = 4;
pub const STATUS_INVALID_MATRIX: RawStatus = 5;
pub const STATUS_INVALID_STATUS: RawStatus = 6;
pub const STATUS_NULL_POINTER: RawStatus = 7;
pub const STATUS_INVALID_STRING: RawStatus = 8;
pub const STATUS_INVALID_PATH_DATA: RawStatus = 9;
pub const STATUS_READ_ERROR: RawStatus = 10;
pub const STATUS_WRITE_ERROR: RawStatus = 11;
pub const STATUS_SURFACE_FINISHED: RawStatus = 12;
pub const STATUS_SURFACE_TYPE_MISMATCH: RawStatus = 13;
pub const STATUS_PATTERN_TYPE_MISMATCH: RawStatus = 14;
pub const STATUS_INVALID_CONTENT: RawStatus = 15;
pub const STATUS_INVALID_FORMAT: RawStatus = 16;
pub const STATUS_FILE_NOT_FOUND: RawStatus = 18;
pub const STATUS_INVALID_DASH: RawStatus = 19;
pub const STATUS_INVALID_INDEX: RawStatus = 21;
pub const STATUS_CLIP_NOT_REPRESENTABLE: RawStatus = 22;
pub const STATUS_INVALID_STRIDE: RawStatus = 24;
pub const STATUS_FONT_TYPE_MISMATCH: RawStatus = 25;
pub const STATUS_NEGATIVE_COUNT: RawStatus = 28;
pub const STATUS_INVALID_SLANT: RawStatus = 30;
pub const STATUS_INVALID_WEIGHT: RawStatus = 31;
pub const STATUS_INVALID_SIZE: RawStatus = 32;
pub const STATUS_DEVICE_TYPE_MISMATCH: RawStatus = 34;
pub const STATUS_DEVICE_ERROR: RawStatus = 35;
pub const STATUS_DEVICE_FINISHED: RawStatus = 37;
pub const STATUS_PNG_ERROR: RawStatus = 39;

pub const CONTENT_COLOR: i32 = 0x1000;
pub const CONTENT_ALPHA: i32 = 0x2000;
pub const CONTENT_COLOR_ALPHA: i32 = 0x3000;

pub const FORMAT_INVALID: i32 = -1;
pub const FORMAT_ARGB32: i32 = 0;
pub const FORMAT_RGB24: i32 = 1;
pub const FORMAT_A8: i32 = 2;
pub const FORMAT_A1: i32 = 3;
pub const FORMAT_RGB16_565: i32 = 4;
pub const FORMAT_RGB30: i32 = 5;

pub const OPERATOR_CLEAR: i32 = 0;
pub const OPERATOR_SOURCE: i32 = 1;
pub const OPERATOR_OVER: i32 = 2;
pub const OPERATOR_IN: i32 = 3;
pub const OPERATOR_OUT: i32 = 4;
pub const OPERATOR_ATOP: i32 = 5;
pub const OPERATOR_DEST: i32 = 6;
pub const OPERATOR_DEST_OVER: i32 = 7;
pub const OPERATOR_DEST_IN: i32 = 8;
pub const OPERATOR_DEST_OUT: i32 = 9;
pub const OPERATOR_DEST_ATOP: i32 = 10;
pub const OPERATOR_XOR: i32 = 11;
pub const OPERATOR_ADD: i32 = 12;
pub const OPERATOR_SATURATE: i32 = 13;
pub const OPERATOR_MULTIPLY: i32 = 14;
pub const OPERATOR_SCREEN: i32 = 15;
pub const OPERATOR_OVERLAY: i32 = 16;
pub const OPERATOR_DARKEN: i32 = 17;
pub const OPERATOR_LIGHTEN: i32 = 18;
pub const OPERATOR_COLOR_DODGE: i32 = 19;
pub const OPERATOR_COLOR_BURN: i32 = 20;
pub const OPERATOR_HARD_LIGHT: i32 = 21;
pub const OPERATOR_SOFT_LIGHT: i32 = 22;
pub const OPERATOR_DIFFERENCE: i32 = 23;
pub const OPERATOR_EXCLUSION: i32 = 24;
pub const OPERATOR_HSL_HUE: i32 = 25;
pub const OPERATOR_HSL_SATURATION: i32 = 26;
pub const OPERATOR_HSL_COLOR: i32 = 27;
pub const OPERATOR_HSL_LUMINOSITY: i32 = 28;

pub const ANTIALIAS_DEFAULT: i32 = 0;
pub const ANTIALIAS_NONE: i32 = 1;
pub const ANTIALIAS_GRAY: i32 = 2;
pub const ANTIALIAS_SUBPIXEL: i32 = 3;
pub const ANTIALIAS_FAST: i32 = 4;
pub const ANTIALIAS_GOOD: i32 = 5;
pub const ANTIALIAS_BEST: i32 = 6;

pub const FILL_RULE_WINDING: i32 = 0;
pub const FILL_RULE_EVEN_ODD: i32 = 1;

pub const LINE_CAP_BUTT: i32 = 0;
pub const LINE_CAP_ROUND: i32 = 1;
pub const LINE_CAP_SQUARE: i32 = 2;

pub const LINE_JOIN_MITER: i32 = 0;
pub const LINE_JOIN_ROUND: i32 = 1;
pub const LINE_JOIN_BEVEL: i32 = 2;

pub const FONT_SLANT_NORMAL: i32 = 0;
pub const FONT_SLANT_ITALIC: i32 = 1;
pub const FONT_SLANT_OBLIQUE: i32 = 2;

pub const FONT_WEIGHT_NORMAL: i32 = 0;
pub const FONT_WEIGHT_BOLD: i32 = 1;

pub const SUBPIXEL_ORDER_DEFAULT: i32 = 0;
pub const SUBPIXEL_ORDER_RGB: i32 = 1;
pub const SUBPIXEL_ORDER_BGR: i32 = 2;
pub const SUBPIXEL_ORDER_VRGB: i32 = 3;
pub const SUBPIXEL_ORDER_VBGR: i32 = 4;

pub const HINT_STYLE_DEFAULT: i32 = 0;
pub const HINT_STYLE_NONE: i32 = 1;
pub const HINT_STYLE_SLIGHT: i32 = 2;
pub const HINT_STYLE_MEDIUM: i32 = 3;
pub const HINT_STYLE_FULL: i32 = 4;

pub const HINT_METRICS_DEFAULT: i32 = 0;
pub const HINT_METRICS_OFF: i32 = 1;
pub const HINT_METRICS_ON: i32 = 2;

pub const FONT_TYPE_TOY: i32 = 0;

pub const PATH_MOVE_TO: i32 = 0;
pub const PATH_LINE_TO: i32 = 1;
pub const PATH_CURVE_TO: i32 = 2;
pub const PATH_CLOSE_PATH: i32 = 3;

pub const PATTERN_TYPE_SOLID: i32 = 0;
pub const PATTERN_TYPE_SURFACE: i32 = 1;
pub const PATTERN_TYPE_LINEAR: i32 = 2;
pub const PATTERN_TYPE_RADIAL: i32 = 3;

pub const EXTEND_NONE: i32 = 0;
pub const EXTEND_REPEAT: i32 = 1;
pub const EXTEND_REFLECT: i32 = 2;
pub const EXTEND_PAD: i32 = 3;

pub const FILTER_FAST: i32 = 0;
pub const FILTER_GOOD: i32 = 1;
pub const FILTER_BEST: i32 = 2;
pub const FILTER_NEAREST: i32 = 3;
pub const FILTER_BILINEAR: i32 = 4;
pub const FILTER_GAUSSIAN: i32 = 5;

pub const DEVICE_TYPE_SOFTWARE: i32 = 0;
pub const DEVICE_TYPE_INVALID: i32 = -1;

pub const SURFACE_TYPE_IMAGE: i32 = 0;

/// Human-readable description of a status code.
pub fn status_to_string(status: RawStatus) -> &'static str {
    match status {
        STATUS_SUCCESS => "no error has occurred",
        STATUS_NO_MEMORY => "out of memory",
        STATUS_INVALID_RESTORE => "restore() without matching save()",
        STATUS_INVALID_POP_GROUP => "no saved group to pop, i.e. pop_group() without matching push_group()",
        STATUS_NO_CURRENT_POINT => "no current point",
        STATUS_INVALID_MATRIX => "invalid matrix (not invertible)",
        STATUS_INVALID_STATUS => "invalid value for an input status",
        STATUS_NULL_POINTER => "NULL pointer",
        STATUS_INVALID_STRING => "input string not valid UTF-8",
        STATUS_INVALID_PATH_DATA => "input path data not valid",
        STATUS_READ_ERROR => "error while reading from input stream",
        STATUS_WRITE_ERROR => "error while writing to output stream",
        STATUS_SURFACE_FINISHED => "the target surface has been finished",
        STATUS_SURFACE_TYPE_MISMATCH => "the surface type is not appropriate for the operation",
        STATUS_PATTERN_TYPE_MISMATCH => "the pattern type is not appropriate for the operation",
        STATUS_INVALID_CONTENT => "invalid value for an input content",
        STATUS_INVALID_FORMAT => "invalid value for an input format",
        STATUS_FILE_NOT_FOUND => "file not found",
        STATUS_INVALID_DASH => "invalid value for a dash setting",
        STATUS_INVALID_INDEX => "invalid index passed to getter",
        STATUS_CLIP_NOT_REPRESENTABLE => "clip region not representable in desired format",
        STATUS_INVALID_STRIDE => "invalid value for stride",
        STATUS_FONT_TYPE_MISMATCH => "the font type is not appropriate for the operation",
        STATUS_NEGATIVE_COUNT => "negative number used where it is not allowed",
        STATUS_INVALID_SLANT => "invalid value for an input font slant",
        STATUS_INVALID_WEIGHT => "invalid value for an input font weight",
        STATUS_INVALID_SIZE => "invalid value (typically too big) for the size of the input (surface, pattern, etc.)",
        STATUS_DEVICE_TYPE_MISMATCH => "the device type is not appropriate for the operation",
        STATUS_DEVICE_ERROR => "an operation to the device caused an unspecified error",
        STATUS_DEVICE_FINISHED => "the target device has been finished",
        STATUS_PNG_ERROR => "error occurred in libpng while reading from or writing to a PNG file",
        _ => "<unknown error status>",
    }
}

/// A point in some coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
}

impl RawPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle, as origin and size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawRectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A non-premultiplied color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl RawColor {
    /// Clamp each component into range, mapping NaN to zero.
    pub(crate) fn clamped(self) -> Self {
        fn clamp(v: f64) -> f64 {
            if v.is_nan() {
                0.0
            } else {
                v.max(0.0).min(1.0)
            }
        }

        Self {
            red: clamp(self.red),
            green: clamp(self.green),
            blue: clamp(self.blue),
            alpha: clamp(self.alpha),
        }
    }
}

/// Instrumentation for tests and leak hunting.
pub mod debug {
    /// Number of library objects currently alive on this thread.
    ///
    /// Every surface, device, context, pattern, font and path counts as one object for as
    /// long as at least one reference to it exists.
    pub fn live_objects() -> usize {
        super::object::live_objects()
    }
}
