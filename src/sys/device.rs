// Boost/Apache2 License

//! Devices: the backend a surface renders through.

use core::cell::Cell;

use super::object::{self, Header, Object};
use super::{
    RawStatus, DEVICE_TYPE_INVALID, DEVICE_TYPE_SOFTWARE, STATUS_DEVICE_FINISHED,
    STATUS_SUCCESS,
};

pub struct RawDevice {
    header: Header,
    status: Cell<RawStatus>,
    finished: Cell<bool>,
    /// Nesting depth of `device_acquire`.
    acquired: Cell<u32>,
}

impl Object for RawDevice {
    const KIND: &'static str = "device";

    fn header(&self) -> &Header {
        &self.header
    }
}

/// Create a software device.
pub(crate) fn device_create_software() -> *mut RawDevice {
    object::allocate(RawDevice {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        finished: Cell::new(false),
        acquired: Cell::new(0),
    })
}

/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_reference(device: *mut RawDevice) -> *mut RawDevice {
    object::reference(device)
}

/// # Safety
///
/// `device` must be null or a live device, and the caller must own one count of it.
pub unsafe fn device_destroy(device: *mut RawDevice) {
    object::release(device)
}

/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_get_reference_count(device: *mut RawDevice) -> u32 {
    object::reference_count(device)
}

/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_status(device: *mut RawDevice) -> RawStatus {
    device.as_ref().map_or(super::STATUS_NULL_POINTER, |d| d.status.get())
}

/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_get_type(device: *mut RawDevice) -> i32 {
    match device.as_ref() {
        Some(d) if d.status.get() == STATUS_SUCCESS => DEVICE_TYPE_SOFTWARE,
        _ => DEVICE_TYPE_INVALID,
    }
}

/// Take exclusive use of the device. Calls nest and must be paired with [`device_release`].
///
/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_acquire(device: *mut RawDevice) -> RawStatus {
    let device = match device.as_ref() {
        Some(device) => device,
        None => return super::STATUS_NULL_POINTER,
    };

    if device.status.get() != STATUS_SUCCESS {
        return device.status.get();
    }
    if device.finished.get() {
        return object::set_error(RawDevice::KIND, &device.status, STATUS_DEVICE_FINISHED);
    }

    device.acquired.set(device.acquired.get() + 1);
    STATUS_SUCCESS
}

/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_release(device: *mut RawDevice) {
    if let Some(device) = device.as_ref() {
        device.acquired.set(device.acquired.get().saturating_sub(1));
    }
}

/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_flush(device: *mut RawDevice) {
    // Software rendering is immediate, nothing is ever pending.
    let _ = device;
}

/// Finish the device. Surfaces on it stay readable, but the device can no longer be
/// acquired.
///
/// # Safety
///
/// `device` must be null or a live device.
pub unsafe fn device_finish(device: *mut RawDevice) {
    if let Some(device) = device.as_ref() {
        device.finished.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_after_finish_fails() {
        let device = device_create_software();
        unsafe {
            assert_eq!(device_get_type(device), DEVICE_TYPE_SOFTWARE);
            assert_eq!(device_acquire(device), STATUS_SUCCESS);
            device_release(device);

            device_finish(device);
            assert_eq!(device_acquire(device), STATUS_DEVICE_FINISHED);
            assert_eq!(device_status(device), STATUS_DEVICE_FINISHED);
            assert_eq!(device_get_type(device), DEVICE_TYPE_INVALID);
            device_destroy(device);
        }
    }
}
