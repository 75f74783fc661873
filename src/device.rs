// Boost/Apache2 License

//! Devices, the rendering backends behind surfaces.

use crate::handle::SharedHandle;
use crate::status::Status;
use crate::sys;
use crate::Error;

raw_enum! {
    /// The kind of backend a device drives.
    pub enum DeviceType {
        Software = sys::DEVICE_TYPE_SOFTWARE,
        Invalid = sys::DEVICE_TYPE_INVALID,
    }
}

/// A rendering backend shared by related surfaces.
#[derive(Debug, Clone, Default)]
pub struct Device {
    handle: SharedHandle<sys::RawDevice>,
}

impl Device {
    /// Wrap an owned device.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live device whose count the caller owns.
    pub unsafe fn from_raw(ptr: *mut sys::RawDevice) -> Self {
        Self {
            handle: SharedHandle::from_raw(ptr),
        }
    }

    /// Wrap a borrowed device, adding a reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live device.
    pub unsafe fn from_raw_shared(ptr: *mut sys::RawDevice) -> Self {
        Self {
            handle: SharedHandle::from_raw_shared(ptr),
        }
    }

    /// The underlying device pointer.
    pub fn as_ptr(&self) -> *mut sys::RawDevice {
        self.handle.as_ptr()
    }

    /// The sticky error status of the device.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::device_status(self.as_ptr()) })
    }

    /// The backend of this device.
    pub fn device_type(&self) -> DeviceType {
        let raw = unsafe { sys::device_get_type(self.as_ptr()) };
        DeviceType::from_raw(raw).unwrap_or(DeviceType::Invalid)
    }

    /// Take exclusive use of the device. Pair with [`Device::release`].
    pub fn acquire(&self) -> Result<(), Error> {
        Error::check(unsafe { sys::device_acquire(self.as_ptr()) }, "device_acquire")
    }

    /// Release a device taken with [`Device::acquire`].
    pub fn release(&self) {
        unsafe { sys::device_release(self.as_ptr()) }
    }

    /// Finish any pending operations on the device.
    pub fn flush(&self) {
        unsafe { sys::device_flush(self.as_ptr()) }
    }

    /// Finish the device. Further use reports [`Status::DeviceFinished`].
    pub fn finish(&self) {
        unsafe { sys::device_finish(self.as_ptr()) }
    }

    /// Number of live references to the device.
    pub fn reference_count(&self) -> u32 {
        self.handle.reference_count()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Format, ImageSurface, Status};

    #[test]
    fn finished_devices_cannot_be_acquired() {
        let surface = ImageSurface::create(Format::Argb32, 2, 2);
        let device = surface.device();
        assert_eq!(device.device_type(), super::DeviceType::Software);

        device.acquire().unwrap();
        device.release();
        device.finish();

        let err = device.acquire().unwrap_err();
        assert_eq!(err.status(), Status::DeviceFinished);
        assert_eq!(err.function(), "device_acquire");
    }

    #[test]
    fn similar_surfaces_share_a_device() {
        let surface = ImageSurface::create(Format::Argb32, 2, 2);
        let similar = surface.create_similar(crate::Content::COLOR_ALPHA, 1, 1);
        assert_eq!(similar.device().as_ptr(), surface.device().as_ptr());
    }
}
