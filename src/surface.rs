// Boost/Apache2 License

//! Surfaces, the targets drawing ends up on.

use crate::device::Device;
use crate::font::FontOptions;
use crate::geometry::{Rect, Vec2};
use crate::handle::SharedHandle;
use crate::status::Status;
use crate::sys;
use crate::Error;

use core::cell::RefMut;
use core::convert::TryFrom;
use core::ops::Deref;
use std::path::Path;

bitflags::bitflags! {
    /// What a surface stores.
    pub struct Content : i32 {
        /// The surface holds color and no alpha.
        const COLOR = sys::CONTENT_COLOR;

        /// The surface holds alpha and no color.
        const ALPHA = sys::CONTENT_ALPHA;

        /// The surface holds color and alpha.
        const COLOR_ALPHA = sys::CONTENT_COLOR_ALPHA;
    }
}

raw_enum! {
    /// The pixel layout of an image surface.
    ///
    /// Only [`Format::Argb32`] and [`Format::Rgb24`] can be created; the others report
    /// [`Status::InvalidFormat`].
    #[allow(non_camel_case_types)]
    pub enum Format {
        Invalid = sys::FORMAT_INVALID,
        Argb32 = sys::FORMAT_ARGB32,
        Rgb24 = sys::FORMAT_RGB24,
        A8 = sys::FORMAT_A8,
        A1 = sys::FORMAT_A1,
        Rgb16_565 = sys::FORMAT_RGB16_565,
        Rgb30 = sys::FORMAT_RGB30,
    }
}

raw_enum! {
    /// The backend of a surface.
    pub enum SurfaceType {
        Image = sys::SURFACE_TYPE_IMAGE,
    }
}

/// Bytes per row of an image of `format` that is `width` pixels wide, if there can be one.
pub fn format_stride_for_width(format: Format, width: i32) -> Option<i32> {
    match sys::format_stride_for_width(format.into_raw(), width) {
        -1 => None,
        stride => Some(stride),
    }
}

/// A drawing target.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    handle: SharedHandle<sys::RawSurface>,
}

impl Surface {
    /// Wrap an owned surface.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live surface whose count the caller owns.
    pub unsafe fn from_raw(ptr: *mut sys::RawSurface) -> Self {
        Self {
            handle: SharedHandle::from_raw(ptr),
        }
    }

    /// Wrap a borrowed surface, adding a reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live surface.
    pub unsafe fn from_raw_shared(ptr: *mut sys::RawSurface) -> Self {
        Self {
            handle: SharedHandle::from_raw_shared(ptr),
        }
    }

    /// The underlying surface pointer, without a new reference.
    pub fn as_ptr(&self) -> *mut sys::RawSurface {
        self.handle.as_ptr()
    }

    /// The sticky error status of the surface.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::surface_status(self.as_ptr()) })
    }

    /// The backend of this surface.
    pub fn surface_type(&self) -> SurfaceType {
        let raw = unsafe { sys::surface_get_type(self.as_ptr()) };
        SurfaceType::from_raw(raw).unwrap_or(SurfaceType::Image)
    }

    /// Which channels the surface stores.
    pub fn content(&self) -> Content {
        Content::from_bits_truncate(unsafe { sys::surface_get_content(self.as_ptr()) })
    }

    /// Create a surface that draws well onto this one, sharing its device and scale.
    pub fn create_similar(&self, content: Content, width: i32, height: i32) -> Surface {
        unsafe {
            Surface::from_raw(sys::surface_create_similar(
                self.as_ptr(),
                content.bits(),
                width,
                height,
            ))
        }
    }

    /// Create an image surface that draws well onto this one.
    pub fn create_similar_image(&self, format: Format, width: i32, height: i32) -> ImageSurface {
        ImageSurface(unsafe {
            Surface::from_raw(sys::surface_create_similar_image(
                self.as_ptr(),
                format.into_raw(),
                width,
                height,
            ))
        })
    }

    /// Finish the surface. Later drawing reports [`Status::SurfaceFinished`].
    pub fn finish(&self) {
        unsafe { sys::surface_finish(self.as_ptr()) }
    }

    /// Complete any pending drawing.
    pub fn flush(&self) {
        unsafe { sys::surface_flush(self.as_ptr()) }
    }

    /// Tell the library the pixels were changed directly.
    pub fn mark_dirty(&self) {
        unsafe { sys::surface_mark_dirty(self.as_ptr()) }
    }

    /// Tell the surface that `rect` was changed outside the library.
    pub fn mark_dirty_rectangle(&self, rect: Rect<i32>) {
        unsafe {
            sys::surface_mark_dirty_rectangle(self.as_ptr(), rect.x, rect.y, rect.width, rect.height)
        }
    }

    /// The device behind this surface. Empty for surfaces in an error status.
    pub fn device(&self) -> Device {
        unsafe { Device::from_raw_shared(sys::surface_get_device(self.as_ptr())) }
    }

    /// The default font options for text on this surface.
    pub fn font_options(&self) -> FontOptions {
        let options = FontOptions::new();
        unsafe { sys::surface_get_font_options(self.as_ptr(), options.as_ptr()) };
        options
    }

    /// Scale from user units to pixels, applied before any drawing transform.
    pub fn set_device_scale(&self, scale: Vec2<f64>) {
        unsafe { sys::surface_set_device_scale(self.as_ptr(), scale.x, scale.y) }
    }

    /// The device scale.
    pub fn device_scale(&self) -> Vec2<f64> {
        unsafe { sys::surface_get_device_scale(self.as_ptr()) }.into()
    }

    /// Set the offset added to device coordinates.
    pub fn set_device_offset(&self, offset: Vec2<f64>) {
        unsafe { sys::surface_set_device_offset(self.as_ptr(), offset.x, offset.y) }
    }

    /// The device offset.
    pub fn device_offset(&self) -> Vec2<f64> {
        unsafe { sys::surface_get_device_offset(self.as_ptr()) }.into()
    }

    /// Resolution, in pixels per inch, for content that has to be rasterized.
    pub fn set_fallback_resolution(&self, resolution: Vec2<f64>) {
        unsafe { sys::surface_set_fallback_resolution(self.as_ptr(), resolution.x, resolution.y) }
    }

    /// The fallback resolution, in pixels per inch.
    pub fn fallback_resolution(&self) -> Vec2<f64> {
        unsafe { sys::surface_get_fallback_resolution(self.as_ptr()) }.into()
    }

    /// Write the surface to a PNG file.
    pub fn write_to_png(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        const FUNCTION: &str = "surface_write_to_png";

        let path = path
            .as_ref()
            .to_str()
            .ok_or_else(|| Error::new(Status::InvalidString, FUNCTION))?;
        Error::check(unsafe { sys::surface_write_to_png(self.as_ptr(), path) }, FUNCTION)
    }

    /// Number of live references to the surface.
    pub fn reference_count(&self) -> u32 {
        self.handle.reference_count()
    }
}

/// A surface whose pixels live in memory.
#[derive(Debug, Clone, Default)]
pub struct ImageSurface(Surface);

impl ImageSurface {
    /// Create an image surface. Check [`Surface::status`] for failures.
    pub fn create(format: Format, width: i32, height: i32) -> Self {
        Self(unsafe {
            Surface::from_raw(sys::image_surface_create(format.into_raw(), width, height))
        })
    }

    /// Load a PNG file. On failure the surface is empty and its status says why.
    pub fn create_from_png(path: impl AsRef<Path>) -> Self {
        let raw = match path.as_ref().to_str() {
            Some(path) => sys::image_surface_create_from_png(path),
            None => sys::surface_create_in_error(sys::STATUS_INVALID_STRING),
        };
        Self(unsafe { Surface::from_raw(raw) })
    }

    /// The pixel format.
    pub fn format(&self) -> Format {
        let raw = unsafe { sys::image_surface_get_format(self.as_ptr()) };
        Format::from_raw(raw).unwrap_or(Format::Invalid)
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        unsafe { sys::image_surface_get_width(self.as_ptr()) }
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        unsafe { sys::image_surface_get_height(self.as_ptr()) }
    }

    /// Width and height in pixels.
    pub fn size(&self) -> Vec2<i32> {
        Vec2::new(self.width(), self.height())
    }

    /// Bytes per row of [`ImageSurface::data`].
    pub fn stride(&self) -> i32 {
        unsafe { sys::image_surface_get_stride(self.as_ptr()) }
    }

    /// Borrow the pixels: premultiplied RGBA, four bytes per pixel.
    ///
    /// `None` for empty surfaces and while the pixels are already borrowed. Drawing to
    /// the surface while the borrow is held fails with [`Status::DeviceError`].
    pub fn data(&self) -> Option<RefMut<'_, [u8]>> {
        unsafe { sys::image_surface_get_data(self.as_ptr()) }
    }

    /// Forget the image type.
    pub fn into_surface(self) -> Surface {
        self.0
    }
}

impl Deref for ImageSurface {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        &self.0
    }
}

impl From<ImageSurface> for Surface {
    fn from(image: ImageSurface) -> Self {
        image.0
    }
}

/// Image surfaces are the only kind the library creates, so today this fails only for
/// an empty handle, with [`Status::NullPointer`].
impl TryFrom<Surface> for ImageSurface {
    type Error = Error;

    fn try_from(surface: Surface) -> Result<Self, Error> {
        if surface.handle.is_empty() {
            return Err(Error::new(Status::NullPointer, "surface_get_type"));
        }

        match surface.surface_type() {
            SurfaceType::Image => Ok(Self(surface)),
            #[allow(unreachable_patterns)]
            _ => Err(Error::new(Status::SurfaceTypeMismatch, "surface_get_type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::debug::live_objects;

    #[test]
    fn image_surfaces_report_their_layout() {
        let surface = ImageSurface::create(Format::Argb32, 10, 3);
        assert_eq!(surface.status(), Status::Success);
        assert_eq!(surface.size(), Vec2::new(10, 3));
        assert_eq!(surface.stride(), 40);
        assert_eq!(surface.content(), Content::COLOR_ALPHA);
        assert_eq!(surface.data().map(|d| d.len()), Some(120));
    }

    #[test]
    fn unsupported_formats_fail() {
        let surface = ImageSurface::create(Format::A8, 4, 4);
        assert_eq!(surface.status(), Status::InvalidFormat);
        assert!(surface.data().is_none());
        assert!(surface.device().as_ptr().is_null());
    }

    #[test]
    fn missing_png_reports_file_not_found() {
        let surface = ImageSurface::create_from_png("/nonexistent/vellum/missing.png");
        assert_eq!(surface.status(), Status::FileNotFound);
        assert_eq!(surface.size(), Vec2::new(0, 0));
    }

    #[test]
    fn clones_share_and_release_together() {
        let before = live_objects();
        let surface = ImageSurface::create(Format::Rgb24, 2, 2);
        let copy: Surface = surface.clone().into();
        assert_eq!(surface.reference_count(), 2);

        let back = ImageSurface::try_from(copy).unwrap();
        assert_eq!(back.as_ptr(), surface.as_ptr());

        drop(surface);
        drop(back);
        assert_eq!(live_objects(), before);
    }

    #[test]
    fn empty_surfaces_are_not_images() {
        let err = ImageSurface::try_from(Surface::default()).unwrap_err();
        assert_eq!(err.status(), Status::NullPointer);
        assert_eq!(err.function(), "surface_get_type");
    }

    #[test]
    fn device_scale_rejects_zero() {
        let surface = ImageSurface::create(Format::Argb32, 2, 2);
        surface.set_device_scale(Vec2::new(2.0, 2.0));
        assert_eq!(surface.device_scale(), Vec2::new(2.0, 2.0));
        surface.set_device_scale(Vec2::new(0.0, 1.0));
        assert_eq!(surface.status(), Status::InvalidMatrix);
    }

    #[test]
    fn stride_for_unknown_width() {
        assert_eq!(format_stride_for_width(Format::A1, 33), Some(8));
        assert_eq!(format_stride_for_width(Format::Invalid, 1), None);
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_round_trip() {
        let path = std::env::temp_dir().join(format!("vellum-{}.png", std::process::id()));
        let surface = ImageSurface::create(Format::Argb32, 3, 2);
        if let Some(mut data) = surface.data() {
            data[..4].copy_from_slice(&[255, 0, 0, 255]);
        }
        surface.write_to_png(&path).unwrap();

        let loaded = ImageSurface::create_from_png(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.status(), Status::Success);
        assert_eq!(loaded.size(), Vec2::new(3, 2));
        assert_eq!(loaded.format(), Format::Argb32);
        assert_eq!(&loaded.data().unwrap()[..4], &[255, 0, 0, 255]);
    }

    #[cfg(feature = "png")]
    #[test]
    fn undecodable_png_reports_png_error() {
        let path = std::env::temp_dir().join(format!("vellum-garbage-{}.png", std::process::id()));
        std::fs::write(&path, b"definitely not a png").unwrap();

        let surface = ImageSurface::create_from_png(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(surface.status(), Status::PngError);
        assert_eq!(surface.size(), Vec2::new(0, 0));
        assert!(surface.data().is_none());
    }

    #[cfg(feature = "png")]
    #[test]
    fn unreadable_png_reports_read_error() {
        // A directory exists but cannot be read as a file.
        let surface = ImageSurface::create_from_png(std::env::temp_dir());
        assert_eq!(surface.status(), Status::ReadError);
        assert_eq!(surface.size(), Vec2::new(0, 0));
    }

    #[test]
    fn drawing_on_a_finished_surface_fails() {
        let surface = ImageSurface::create(Format::Argb32, 2, 2);
        let cr = crate::Context::create(&surface);
        surface.finish();

        cr.set_source_rgb(1.0, 0.0, 0.0);
        cr.paint();
        assert_eq!(cr.status(), Status::SurfaceFinished);
    }

    #[test]
    fn finished_surfaces_refuse_png_output() {
        let surface = ImageSurface::create(Format::Argb32, 1, 1);
        surface.finish();
        let err = surface.write_to_png("unused.png").unwrap_err();
        assert_eq!(err.status(), Status::SurfaceFinished);
    }
}
