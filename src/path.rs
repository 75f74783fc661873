// Boost/Apache2 License

//! Copies of a context's path.

use crate::geometry::Vec2;
use crate::handle::UniqueHandle;
use crate::status::Status;
use crate::sys;

raw_enum! {
    /// Kind of a path element.
    pub enum PathDataType {
        MoveTo = sys::PATH_MOVE_TO,
        LineTo = sys::PATH_LINE_TO,
        CurveTo = sys::PATH_CURVE_TO,
        ClosePath = sys::PATH_CLOSE_PATH,
    }
}

/// One element of a path, in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathElement {
    data_type: PathDataType,
    points: [Vec2<f64>; 3],
    count: usize,
}

impl PathElement {
    fn from_raw(raw: &sys::RawPathData) -> Self {
        let data_type = PathDataType::from_raw(raw.data_type).unwrap_or(PathDataType::ClosePath);
        let mut points = [Vec2::default(); 3];
        for (point, raw) in points.iter_mut().zip(raw.points.iter()) {
            *point = (*raw).into();
        }

        Self {
            data_type,
            points,
            count: raw.point_count(),
        }
    }

    /// Kind of this element.
    pub fn data_type(&self) -> PathDataType {
        self.data_type
    }

    /// One point for moves and lines, the two control points and the end point for
    /// curves, none for closes.
    pub fn points(&self) -> &[Vec2<f64>] {
        &self.points[..self.count]
    }
}

/// A path copied out of a context. Cannot be cloned.
#[derive(Debug, Default)]
pub struct Path {
    handle: UniqueHandle<sys::RawPath>,
}

impl Path {
    /// Wrap an owned path.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live path the caller owns.
    pub unsafe fn from_raw(ptr: *mut sys::RawPath) -> Self {
        Self {
            handle: UniqueHandle::from_raw(ptr),
        }
    }

    /// The underlying path pointer.
    pub fn as_ptr(&self) -> *mut sys::RawPath {
        self.handle.as_ptr()
    }

    /// The status of the context when the path was copied.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::path_status(self.as_ptr()) })
    }

    fn data(&self) -> &[sys::RawPathData] {
        unsafe { sys::path_get_data(self.as_ptr()) }
    }

    /// Number of elements in the path.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Whether the path holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Iterate over the elements of the path.
    pub fn iter(&self) -> impl Iterator<Item = PathElement> + '_ {
        self.data().iter().map(PathElement::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, Format, ImageSurface};

    #[test]
    fn copied_paths_are_in_user_space() {
        let surface = ImageSurface::create(Format::Argb32, 8, 8);
        let cr = Context::create(&surface);
        cr.scale(2.0, 2.0);
        cr.move_to(1.0, 1.0).line_to(3.0, 1.0).close_path();

        let path = cr.copy_path();
        assert_eq!(path.status(), Status::Success);
        assert_eq!(path.len(), 3);

        let elements: Vec<_> = path.iter().collect();
        assert_eq!(elements[0].data_type(), PathDataType::MoveTo);
        assert_eq!(elements[1].points(), &[Vec2::new(3.0, 1.0)]);
        assert_eq!(elements[2].data_type(), PathDataType::ClosePath);
        assert!(elements[2].points().is_empty());
    }

    #[test]
    fn empty_paths_have_no_elements() {
        let path = Path::default();
        assert!(path.is_empty());
        assert_eq!(path.status(), Status::NullPointer);
    }
}
