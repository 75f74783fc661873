// Boost/Apache2 License

//! Status codes reported by library objects.

use crate::sys;

use core::fmt;

/// The status of a library object or operation.
///
/// Objects keep the first failure they run into; every later operation on them does
/// nothing and the status stays the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Success = sys::STATUS_SUCCESS,
    NoMemory = sys::STATUS_NO_MEMORY,
    InvalidRestore = sys::STATUS_INVALID_RESTORE,
    InvalidPopGroup = sys::STATUS_INVALID_POP_GROUP,
    NoCurrentPoint = sys::STATUS_NO_CURRENT_POINT,
    InvalidMatrix = sys::STATUS_INVALID_MATRIX,
    /// Also used for codes this crate does not know about.
    InvalidStatus = sys::STATUS_INVALID_STATUS,
    NullPointer = sys::STATUS_NULL_POINTER,
    InvalidString = sys::STATUS_INVALID_STRING,
    InvalidPathData = sys::STATUS_INVALID_PATH_DATA,
    ReadError = sys::STATUS_READ_ERROR,
    WriteError = sys::STATUS_WRITE_ERROR,
    SurfaceFinished = sys::STATUS_SURFACE_FINISHED,
    SurfaceTypeMismatch = sys::STATUS_SURFACE_TYPE_MISMATCH,
    PatternTypeMismatch = sys::STATUS_PATTERN_TYPE_MISMATCH,
    InvalidContent = sys::STATUS_INVALID_CONTENT,
    InvalidFormat = sys::STATUS_INVALID_FORMAT,
    FileNotFound = sys::STATUS_FILE_NOT_FOUND,
    InvalidDash = sys::STATUS_INVALID_DASH,
    InvalidIndex = sys::STATUS_INVALID_INDEX,
    ClipNotRepresentable = sys::STATUS_CLIP_NOT_REPRESENTABLE,
    InvalidStride = sys::STATUS_INVALID_STRIDE,
    FontTypeMismatch = sys::STATUS_FONT_TYPE_MISMATCH,
    NegativeCount = sys::STATUS_NEGATIVE_COUNT,
    InvalidSlant = sys::STATUS_INVALID_SLANT,
    InvalidWeight = sys::STATUS_INVALID_WEIGHT,
    InvalidSize = sys::STATUS_INVALID_SIZE,
    DeviceTypeMismatch = sys::STATUS_DEVICE_TYPE_MISMATCH,
    DeviceError = sys::STATUS_DEVICE_ERROR,
    DeviceFinished = sys::STATUS_DEVICE_FINISHED,
    PngError = sys::STATUS_PNG_ERROR,
}

impl Status {
    /// Convert a raw status code.
    pub fn from_raw(raw: sys::RawStatus) -> Self {
        match raw {
            sys::STATUS_SUCCESS => Self::Success,
            sys::STATUS_NO_MEMORY => Self::NoMemory,
            sys::STATUS_INVALID_RESTORE => Self::InvalidRestore,
            sys::STATUS_INVALID_POP_GROUP => Self::InvalidPopGroup,
            sys::STATUS_NO_CURRENT_POINT => Self::NoCurrentPoint,
            sys::STATUS_INVALID_MATRIX => Self::InvalidMatrix,
            sys::STATUS_NULL_POINTER => Self::NullPointer,
            sys::STATUS_INVALID_STRING => Self::InvalidString,
            sys::STATUS_INVALID_PATH_DATA => Self::InvalidPathData,
            sys::STATUS_READ_ERROR => Self::ReadError,
            sys::STATUS_WRITE_ERROR => Self::WriteError,
            sys::STATUS_SURFACE_FINISHED => Self::SurfaceFinished,
            sys::STATUS_SURFACE_TYPE_MISMATCH => Self::SurfaceTypeMismatch,
            sys::STATUS_PATTERN_TYPE_MISMATCH => Self::PatternTypeMismatch,
            sys::STATUS_INVALID_CONTENT => Self::InvalidContent,
            sys::STATUS_INVALID_FORMAT => Self::InvalidFormat,
            sys::STATUS_FILE_NOT_FOUND => Self::FileNotFound,
            sys::STATUS_INVALID_DASH => Self::InvalidDash,
            sys::STATUS_INVALID_INDEX => Self::InvalidIndex,
            sys::STATUS_CLIP_NOT_REPRESENTABLE => Self::ClipNotRepresentable,
            sys::STATUS_INVALID_STRIDE => Self::InvalidStride,
            sys::STATUS_FONT_TYPE_MISMATCH => Self::FontTypeMismatch,
            sys::STATUS_NEGATIVE_COUNT => Self::NegativeCount,
            sys::STATUS_INVALID_SLANT => Self::InvalidSlant,
            sys::STATUS_INVALID_WEIGHT => Self::InvalidWeight,
            sys::STATUS_INVALID_SIZE => Self::InvalidSize,
            sys::STATUS_DEVICE_TYPE_MISMATCH => Self::DeviceTypeMismatch,
            sys::STATUS_DEVICE_ERROR => Self::DeviceError,
            sys::STATUS_DEVICE_FINISHED => Self::DeviceFinished,
            sys::STATUS_PNG_ERROR => Self::PngError,
            _ => Self::InvalidStatus,
        }
    }

    /// The raw status code.
    pub fn into_raw(self) -> sys::RawStatus {
        self as sys::RawStatus
    }

    /// Whether this is [`Status::Success`].
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// A human-readable description of this status.
    pub fn description(self) -> &'static str {
        sys::status_to_string(self.into_raw())
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_and_unknown_codes_collapse() {
        assert_eq!(Status::from_raw(Status::PngError.into_raw()), Status::PngError);
        assert_eq!(Status::from_raw(1234), Status::InvalidStatus);
        assert!(Status::default().is_success());
    }

    #[test]
    fn display_uses_the_description() {
        assert_eq!(Status::NoCurrentPoint.to_string(), "no current point");
    }
}
