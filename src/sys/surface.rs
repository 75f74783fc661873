// Boost/Apache2 License

//! Image surfaces.

use core::cell::{Cell, RefCell, RefMut};

use tiny_skia::Pixmap;

use super::device::{device_create_software, RawDevice};
use super::font::{font_options_assign, FontOptionsData, RawFontOptions};
use super::matrix::{matrix_init, RawMatrix};
use super::object::{self, Header, Object, Ref};
use super::{
    RawStatus, CONTENT_ALPHA, CONTENT_COLOR, CONTENT_COLOR_ALPHA, FORMAT_A1, FORMAT_A8,
    FORMAT_ARGB32, FORMAT_INVALID, FORMAT_RGB16_565, FORMAT_RGB24, FORMAT_RGB30,
    STATUS_INVALID_CONTENT, STATUS_INVALID_FORMAT, STATUS_INVALID_MATRIX, STATUS_INVALID_SIZE,
    STATUS_NULL_POINTER, STATUS_SUCCESS, STATUS_SURFACE_FINISHED, STATUS_WRITE_ERROR,
    SURFACE_TYPE_IMAGE,
};

/// Largest width or height accepted for a surface.
const MAX_IMAGE_SIZE: i32 = 32767;

/// Default fallback resolution, in pixels per inch.
const DEFAULT_FALLBACK_RESOLUTION: f64 = 300.0;

pub struct RawSurface {
    header: Header,
    status: Cell<RawStatus>,
    finished: Cell<bool>,
    format: i32,
    content: i32,
    width: i32,
    height: i32,
    /// Pixel storage. `None` for empty and error surfaces.
    pixels: RefCell<Option<Pixmap>>,
    device: Option<Ref<RawDevice>>,
    device_scale: Cell<(f64, f64)>,
    device_offset: Cell<(f64, f64)>,
    fallback_resolution: Cell<(f64, f64)>,
}

impl Object for RawSurface {
    const KIND: &'static str = "surface";

    fn header(&self) -> &Header {
        &self.header
    }
}

impl RawSurface {
    pub(crate) fn status(&self) -> RawStatus {
        self.status.get()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.get()
    }

    pub(crate) fn format(&self) -> i32 {
        self.format
    }

    pub(crate) fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub(crate) fn pixels(&self) -> &RefCell<Option<Pixmap>> {
        &self.pixels
    }

    /// Map from device space to pixel space.
    pub(crate) fn pixel_from_device(&self) -> RawMatrix {
        let (sx, sy) = self.device_scale.get();
        let (ox, oy) = self.device_offset.get();
        matrix_init(sx, 0.0, 0.0, sy, ox, oy)
    }
}

fn format_is_supported(format: i32) -> bool {
    format == FORMAT_ARGB32 || format == FORMAT_RGB24
}

fn content_for_format(format: i32) -> i32 {
    match format {
        FORMAT_RGB24 | FORMAT_RGB16_565 | FORMAT_RGB30 => CONTENT_COLOR,
        FORMAT_A8 | FORMAT_A1 => CONTENT_ALPHA,
        _ => CONTENT_COLOR_ALPHA,
    }
}

struct Init {
    format: i32,
    content: i32,
    width: i32,
    height: i32,
    pixels: Option<Pixmap>,
    device: Option<Ref<RawDevice>>,
    device_scale: (f64, f64),
}

fn surface_allocate(init: Init) -> *mut RawSurface {
    object::allocate(RawSurface {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        finished: Cell::new(false),
        format: init.format,
        content: init.content,
        width: init.width,
        height: init.height,
        pixels: RefCell::new(init.pixels),
        device: init.device,
        device_scale: Cell::new(init.device_scale),
        device_offset: Cell::new((0.0, 0.0)),
        fallback_resolution: Cell::new((DEFAULT_FALLBACK_RESOLUTION, DEFAULT_FALLBACK_RESOLUTION)),
    })
}

/// Allocate an empty surface that reports `status`.
pub(crate) fn surface_create_in_error(status: RawStatus) -> *mut RawSurface {
    let surface = surface_allocate(Init {
        format: FORMAT_INVALID,
        content: CONTENT_COLOR_ALPHA,
        width: 0,
        height: 0,
        pixels: None,
        device: None,
        device_scale: (1.0, 1.0),
    });

    // SAFETY: freshly allocated.
    if let Some(s) = unsafe { surface.as_ref() } {
        object::set_error(RawSurface::KIND, &s.status, status);
    }
    surface
}

fn image_surface_create_internal(
    format: i32,
    content: i32,
    width: i32,
    height: i32,
    device: Option<Ref<RawDevice>>,
    device_scale: (f64, f64),
) -> *mut RawSurface {
    if !format_is_supported(format) {
        return surface_create_in_error(STATUS_INVALID_FORMAT);
    }
    if !(0..=MAX_IMAGE_SIZE).contains(&width) || !(0..=MAX_IMAGE_SIZE).contains(&height) {
        return surface_create_in_error(STATUS_INVALID_SIZE);
    }

    let pixels = Pixmap::new(width as u32, height as u32).map(|mut pixmap| {
        if format == FORMAT_RGB24 {
            pixmap.fill(tiny_skia::Color::BLACK);
        }
        pixmap
    });

    let device = device.or_else(|| {
        // SAFETY: a fresh device carries the count we adopt.
        unsafe { Ref::adopt(device_create_software()) }
    });

    surface_allocate(Init {
        format,
        content,
        width,
        height,
        pixels,
        device,
        device_scale,
    })
}

/// Create an image surface. `ARGB32` surfaces start transparent, `RGB24` surfaces opaque
/// black.
pub fn image_surface_create(format: i32, width: i32, height: i32) -> *mut RawSurface {
    image_surface_create_internal(
        format,
        content_for_format(format),
        width,
        height,
        None,
        (1.0, 1.0),
    )
}

/// Row stride, in bytes, of an image of `format` that is `width` pixels wide, or -1 if
/// there is no such image.
pub fn format_stride_for_width(format: i32, width: i32) -> i32 {
    if width < 0 || width > MAX_IMAGE_SIZE {
        return -1;
    }

    let bits = match format {
        FORMAT_ARGB32 | FORMAT_RGB24 | FORMAT_RGB30 => 32,
        FORMAT_RGB16_565 => 16,
        FORMAT_A8 => 8,
        FORMAT_A1 => 1,
        _ => return -1,
    };

    // Rows are padded to whole 32-bit words.
    ((bits * width + 31) / 32) * 4
}

/// Create a surface compatible with `other` for the given content.
///
/// The new surface shares the device and device scale of `other`.
///
/// # Safety
///
/// `other` must be null or a live surface.
pub unsafe fn surface_create_similar(
    other: *mut RawSurface,
    content: i32,
    width: i32,
    height: i32,
) -> *mut RawSurface {
    let other = match other.as_ref() {
        Some(other) => other,
        None => return surface_create_in_error(STATUS_NULL_POINTER),
    };

    if other.status.get() != STATUS_SUCCESS {
        return surface_create_in_error(other.status.get());
    }
    if other.finished.get() {
        return surface_create_in_error(STATUS_SURFACE_FINISHED);
    }

    let format = match content {
        CONTENT_COLOR => FORMAT_RGB24,
        // Alpha-only content is stored as ARGB32.
        CONTENT_ALPHA | CONTENT_COLOR_ALPHA => FORMAT_ARGB32,
        _ => return surface_create_in_error(STATUS_INVALID_CONTENT),
    };

    image_surface_create_internal(
        format,
        content,
        width,
        height,
        other.device.clone(),
        other.device_scale.get(),
    )
}

/// Create an image surface compatible with `other`.
///
/// # Safety
///
/// `other` must be null or a live surface.
pub unsafe fn surface_create_similar_image(
    other: *mut RawSurface,
    format: i32,
    width: i32,
    height: i32,
) -> *mut RawSurface {
    let other = match other.as_ref() {
        Some(other) => other,
        None => return surface_create_in_error(STATUS_NULL_POINTER),
    };

    if other.status.get() != STATUS_SUCCESS {
        return surface_create_in_error(other.status.get());
    }
    if other.finished.get() {
        return surface_create_in_error(STATUS_SURFACE_FINISHED);
    }

    image_surface_create_internal(
        format,
        content_for_format(format),
        width,
        height,
        other.device.clone(),
        other.device_scale.get(),
    )
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_reference(surface: *mut RawSurface) -> *mut RawSurface {
    object::reference(surface)
}

/// # Safety
///
/// `surface` must be null or a live surface, and the caller must own one count of it.
pub unsafe fn surface_destroy(surface: *mut RawSurface) {
    object::release(surface)
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_get_reference_count(surface: *mut RawSurface) -> u32 {
    object::reference_count(surface)
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_status(surface: *mut RawSurface) -> RawStatus {
    surface
        .as_ref()
        .map_or(STATUS_NULL_POINTER, |s| s.status.get())
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_get_type(surface: *mut RawSurface) -> i32 {
    let _ = surface;
    SURFACE_TYPE_IMAGE
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_get_content(surface: *mut RawSurface) -> i32 {
    surface.as_ref().map_or(CONTENT_COLOR_ALPHA, |s| s.content)
}

/// The device of `surface`, or null. The returned address is borrowed from the surface.
///
/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_get_device(surface: *mut RawSurface) -> *mut RawDevice {
    surface
        .as_ref()
        .and_then(|s| s.device.as_ref())
        .map_or(core::ptr::null_mut(), Ref::as_ptr)
}

/// Finish the surface. Its pixels are kept, but it can no longer be drawn to.
///
/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_finish(surface: *mut RawSurface) {
    if let Some(surface) = surface.as_ref() {
        surface.finished.set(true);
    }
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_flush(surface: *mut RawSurface) {
    // Drawing is immediate.
    let _ = surface;
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_mark_dirty(surface: *mut RawSurface) {
    surface_mark_dirty_rectangle(surface, 0, 0, -1, -1)
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_mark_dirty_rectangle(
    surface: *mut RawSurface,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) {
    let _ = (x, y, width, height);
    if let Some(surface) = surface.as_ref() {
        if surface.finished.get() {
            object::set_error(RawSurface::KIND, &surface.status, STATUS_SURFACE_FINISHED);
        }
    }
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_set_device_scale(surface: *mut RawSurface, sx: f64, sy: f64) {
    if let Some(surface) = surface.as_ref() {
        if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
            object::set_error(RawSurface::KIND, &surface.status, STATUS_INVALID_MATRIX);
            return;
        }
        surface.device_scale.set((sx, sy));
    }
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_get_device_scale(surface: *mut RawSurface) -> (f64, f64) {
    surface.as_ref().map_or((1.0, 1.0), |s| s.device_scale.get())
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_set_device_offset(surface: *mut RawSurface, x: f64, y: f64) {
    if let Some(surface) = surface.as_ref() {
        surface.device_offset.set((x, y));
    }
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_get_device_offset(surface: *mut RawSurface) -> (f64, f64) {
    surface.as_ref().map_or((0.0, 0.0), |s| s.device_offset.get())
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_set_fallback_resolution(surface: *mut RawSurface, x_ppi: f64, y_ppi: f64) {
    if let Some(surface) = surface.as_ref() {
        if x_ppi <= 0.0 || y_ppi <= 0.0 {
            object::set_error(RawSurface::KIND, &surface.status, STATUS_INVALID_MATRIX);
            return;
        }
        surface.fallback_resolution.set((x_ppi, y_ppi));
    }
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_get_fallback_resolution(surface: *mut RawSurface) -> (f64, f64) {
    surface.as_ref().map_or(
        (DEFAULT_FALLBACK_RESOLUTION, DEFAULT_FALLBACK_RESOLUTION),
        |s| s.fallback_resolution.get(),
    )
}

/// Write the default font options for `surface` into `options`.
///
/// # Safety
///
/// `surface` must be null or a live surface, and `options` null or a live font options
/// object.
pub unsafe fn surface_get_font_options(surface: *mut RawSurface, options: *mut RawFontOptions) {
    if let (Some(_), Some(options)) = (surface.as_ref(), options.as_ref()) {
        font_options_assign(options, FontOptionsData::default());
    }
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn image_surface_get_format(surface: *mut RawSurface) -> i32 {
    surface.as_ref().map_or(FORMAT_INVALID, |s| s.format)
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn image_surface_get_width(surface: *mut RawSurface) -> i32 {
    surface.as_ref().map_or(0, |s| s.width)
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn image_surface_get_height(surface: *mut RawSurface) -> i32 {
    surface.as_ref().map_or(0, |s| s.height)
}

/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn image_surface_get_stride(surface: *mut RawSurface) -> i32 {
    surface
        .as_ref()
        .map_or(0, |s| match format_stride_for_width(s.format, s.width) {
            -1 => 0,
            stride => stride,
        })
}

/// Borrow the pixel bytes of `surface`: premultiplied RGBA, row-major, `stride` bytes per
/// row.
///
/// Returns `None` for empty surfaces and while the pixels are borrowed elsewhere. Drawing
/// to the surface while the data is borrowed puts the drawing context in an error status.
///
/// # Safety
///
/// `surface` must be null or a live surface, and must stay alive for `'a`.
pub unsafe fn image_surface_get_data<'a>(surface: *mut RawSurface) -> Option<RefMut<'a, [u8]>> {
    let surface = surface.as_ref()?;
    let pixels = surface.pixels.try_borrow_mut().ok()?;
    RefMut::filter_map(pixels, |pixels| pixels.as_mut().map(Pixmap::data_mut)).ok()
}

/// Load a PNG file into a new image surface.
///
/// On failure the surface is empty and reports `FILE_NOT_FOUND`, `READ_ERROR` or
/// `PNG_ERROR`.
pub fn image_surface_create_from_png(filename: &str) -> *mut RawSurface {
    match png::load(filename) {
        Ok(pixmap) => {
            let opaque = pixmap.data().chunks_exact(4).all(|px| px[3] == u8::MAX);
            let format = if opaque { FORMAT_RGB24 } else { FORMAT_ARGB32 };
            let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);

            surface_allocate(Init {
                format,
                content: content_for_format(format),
                width,
                height,
                pixels: Some(pixmap),
                // SAFETY: a fresh device carries the count we adopt.
                device: unsafe { Ref::adopt(device_create_software()) },
                device_scale: (1.0, 1.0),
            })
        }
        Err(status) => surface_create_in_error(status),
    }
}

/// Write the contents of `surface` to a PNG file.
///
/// # Safety
///
/// `surface` must be null or a live surface.
pub unsafe fn surface_write_to_png(surface: *mut RawSurface, filename: &str) -> RawStatus {
    let surface = match surface.as_ref() {
        Some(surface) => surface,
        None => return STATUS_NULL_POINTER,
    };

    if surface.status.get() != STATUS_SUCCESS {
        return surface.status.get();
    }
    if surface.finished.get() {
        return STATUS_SURFACE_FINISHED;
    }

    let pixels = match surface.pixels.try_borrow() {
        Ok(pixels) => pixels,
        Err(_) => return STATUS_WRITE_ERROR,
    };

    match pixels.as_ref() {
        Some(pixmap) => png::save(pixmap, filename),
        None => STATUS_INVALID_SIZE,
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "png")] {
        mod png {
            use tiny_skia::Pixmap;

            use super::super::{
                RawStatus, STATUS_FILE_NOT_FOUND, STATUS_PNG_ERROR, STATUS_READ_ERROR,
                STATUS_SUCCESS, STATUS_WRITE_ERROR,
            };

            pub(super) fn load(filename: &str) -> Result<Pixmap, RawStatus> {
                let bytes = std::fs::read(filename).map_err(|err| {
                    if err.kind() == std::io::ErrorKind::NotFound {
                        STATUS_FILE_NOT_FOUND
                    } else {
                        STATUS_READ_ERROR
                    }
                })?;

                Pixmap::decode_png(&bytes).map_err(|err| {
                    tracing::debug!(filename, error = %err, "failed to decode PNG");
                    STATUS_PNG_ERROR
                })
            }

            pub(super) fn save(pixmap: &Pixmap, filename: &str) -> RawStatus {
                let encoded = match pixmap.encode_png() {
                    Ok(encoded) => encoded,
                    Err(err) => {
                        tracing::debug!(filename, error = %err, "failed to encode PNG");
                        return STATUS_PNG_ERROR;
                    }
                };

                match std::fs::write(filename, encoded) {
                    Ok(()) => STATUS_SUCCESS,
                    Err(err) => {
                        tracing::debug!(filename, error = %err, "failed to write PNG");
                        STATUS_WRITE_ERROR
                    }
                }
            }
        }
    } else {
        mod png {
            use tiny_skia::Pixmap;

            use super::super::{RawStatus, STATUS_PNG_ERROR};

            pub(super) fn load(_filename: &str) -> Result<Pixmap, RawStatus> {
                Err(STATUS_PNG_ERROR)
            }

            pub(super) fn save(_pixmap: &Pixmap, _filename: &str) -> RawStatus {
                STATUS_PNG_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::device::device_get_reference_count;
    use super::*;

    #[test]
    fn rgb24_starts_opaque() {
        unsafe {
            let surface = image_surface_create(FORMAT_RGB24, 2, 2);
            assert_eq!(surface_status(surface), STATUS_SUCCESS);
            assert_eq!(surface_get_content(surface), CONTENT_COLOR);
            let data = image_surface_get_data(surface).unwrap();
            assert_eq!(&data[..4], &[0, 0, 0, 255]);
            drop(data);
            surface_destroy(surface);
        }
    }

    #[test]
    fn unsupported_formats_are_rejected() {
        unsafe {
            let surface = image_surface_create(FORMAT_A8, 4, 4);
            assert_eq!(surface_status(surface), STATUS_INVALID_FORMAT);
            assert_eq!(image_surface_get_width(surface), 0);
            surface_destroy(surface);
        }
    }

    #[test]
    fn similar_surfaces_share_the_device() {
        unsafe {
            let parent = image_surface_create(FORMAT_ARGB32, 8, 8);
            let child = surface_create_similar(parent, CONTENT_ALPHA, 4, 4);
            assert_eq!(surface_get_device(parent), surface_get_device(child));
            assert_eq!(device_get_reference_count(surface_get_device(parent)), 2);
            assert_eq!(surface_get_content(child), CONTENT_ALPHA);
            surface_destroy(child);
            surface_destroy(parent);
        }
    }

    #[test]
    fn strides_are_word_aligned() {
        assert_eq!(format_stride_for_width(FORMAT_ARGB32, 3), 12);
        assert_eq!(format_stride_for_width(FORMAT_A8, 3), 4);
        assert_eq!(format_stride_for_width(FORMAT_A1, 33), 8);
        assert_eq!(format_stride_for_width(FORMAT_INVALID, 3), -1);
    }

    #[test]
    fn data_is_exclusive() {
        unsafe {
            let surface = image_surface_create(FORMAT_ARGB32, 1, 1);
            let first = image_surface_get_data(surface);
            assert!(first.is_some());
            assert!(image_surface_get_data(surface).is_none());
            drop(first);
            surface_destroy(surface);
        }
    }
}
