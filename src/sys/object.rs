// Boost/Apache2 License

//! Object headers, reference counting and allocation bookkeeping.

use core::cell::Cell;
use core::ops::Deref;
use core::ptr::NonNull;

use super::{status_to_string, STATUS_SUCCESS};

thread_local! {
    /// Number of library objects currently allocated on this thread.
    static LIVE_OBJECTS: Cell<usize> = Cell::new(0);
}

/// Bookkeeping shared by every library object.
pub(crate) struct Header {
    /// The reference count. Uniquely-owned objects keep this at one.
    ref_count: Cell<u32>,
}

impl Header {
    pub(crate) fn new() -> Self {
        Self {
            ref_count: Cell::new(1),
        }
    }
}

/// A heap-allocated library object.
pub(crate) trait Object {
    /// Name used in diagnostics.
    const KIND: &'static str;

    fn header(&self) -> &Header;
}

/// Move an object to the heap and hand out its address with a count of one.
pub(crate) fn allocate<T: Object>(object: T) -> *mut T {
    LIVE_OBJECTS.with(|live| live.set(live.get() + 1));
    let ptr = Box::into_raw(Box::new(object));
    tracing::trace!(kind = T::KIND, address = ?ptr, "allocated object");
    ptr
}

/// Increment the count of `ptr`. Null is passed through.
///
/// # Safety
///
/// `ptr` must be null or an address returned by [`allocate`] that has not been released.
pub(crate) unsafe fn reference<T: Object>(ptr: *mut T) -> *mut T {
    if let Some(object) = ptr.as_ref() {
        let header = object.header();
        let count = header
            .ref_count
            .get()
            .checked_add(1)
            .unwrap_or_else(|| abort!("reference count of a {} overflowed", T::KIND));
        header.ref_count.set(count);
    }

    ptr
}

/// Drop one count of `ptr`, freeing the object when it reaches zero. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or an address returned by [`allocate`] that has not been released.
pub(crate) unsafe fn release<T: Object>(ptr: *mut T) {
    let object = match ptr.as_ref() {
        Some(object) => object,
        None => return,
    };

    let header = object.header();
    let count = header.ref_count.get();
    debug_assert!(count > 0, "released a dead {}", T::KIND);

    if count > 1 {
        header.ref_count.set(count - 1);
        return;
    }

    drop(Box::from_raw(ptr));
    LIVE_OBJECTS.with(|live| live.set(live.get() - 1));
    tracing::trace!(kind = T::KIND, address = ?ptr, "released object");
}

/// Read the count of `ptr`, or zero for null.
///
/// # Safety
///
/// `ptr` must be null or a live address returned by [`allocate`].
pub(crate) unsafe fn reference_count<T: Object>(ptr: *const T) -> u32 {
    ptr.as_ref().map_or(0, |object| object.header().ref_count.get())
}

/// Record the first error on an object. Later errors are ignored.
pub(crate) fn set_error(kind: &'static str, status: &Cell<i32>, error: i32) -> i32 {
    if status.get() == STATUS_SUCCESS && error != STATUS_SUCCESS {
        tracing::debug!(kind, error = status_to_string(error), "object entered an error state");
        status.set(error);
    }

    status.get()
}

/// Number of library objects alive on the current thread.
pub(crate) fn live_objects() -> usize {
    LIVE_OBJECTS.with(Cell::get)
}

/// A counted reference held by one library object on another.
pub(crate) struct Ref<T: Object> {
    ptr: NonNull<T>,
}

impl<T: Object> Ref<T> {
    /// Take over a count the caller already owns.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live address returned by [`allocate`].
    pub(crate) unsafe fn adopt(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Take over the count of an object `allocate` just returned.
    ///
    /// # Safety
    ///
    /// `ptr` must come straight from [`allocate`], with its count not yet handed out.
    pub(crate) unsafe fn fresh(ptr: *mut T) -> Self {
        match NonNull::new(ptr) {
            Some(ptr) => Self { ptr },
            None => abort!("allocation of a {} returned null", T::KIND),
        }
    }

    /// Add a count to a borrowed object.
    pub(crate) fn share(object: &T) -> Self {
        let ptr = NonNull::from(object);

        // SAFETY: every `T: Object` reachable by reference lives on the heap via `allocate`.
        unsafe {
            reference(ptr.as_ptr());
        }

        Self { ptr }
    }

    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[cfg(test)]
    pub(crate) fn ptr_eq(&self, other: &T) -> bool {
        core::ptr::eq(self.ptr.as_ptr(), other)
    }
}

impl<T: Object> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self::share(self)
    }
}

impl<T: Object> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: we hold a count, so the object is alive.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: Object> Drop for Ref<T> {
    fn drop(&mut self) {
        unsafe {
            release(self.ptr.as_ptr());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy {
        header: Header,
    }

    impl Object for Dummy {
        const KIND: &'static str = "dummy";

        fn header(&self) -> &Header {
            &self.header
        }
    }

    #[test]
    fn counts_and_frees() {
        let before = live_objects();
        let ptr = allocate(Dummy {
            header: Header::new(),
        });
        assert_eq!(live_objects(), before + 1);

        unsafe {
            assert_eq!(reference(ptr), ptr);
            assert_eq!(reference_count(ptr), 2);
            release(ptr);
            assert_eq!(reference_count(ptr), 1);
            release(ptr);
        }

        assert_eq!(live_objects(), before);
    }

    #[test]
    fn null_is_ignored() {
        unsafe {
            assert!(reference::<Dummy>(core::ptr::null_mut()).is_null());
            release::<Dummy>(core::ptr::null_mut());
            assert_eq!(reference_count::<Dummy>(core::ptr::null()), 0);
        }
    }

    #[test]
    fn internal_refs_share_the_count() {
        let ptr = allocate(Dummy {
            header: Header::new(),
        });
        let owned = unsafe { Ref::adopt(ptr) }.unwrap();
        let shared = owned.clone();
        assert_eq!(unsafe { reference_count(ptr) }, 2);
        assert!(shared.ptr_eq(&owned));
        drop(owned);
        assert_eq!(unsafe { reference_count(ptr) }, 1);
        drop(shared);
    }

    #[test]
    fn first_error_sticks() {
        let status = Cell::new(STATUS_SUCCESS);
        assert_eq!(set_error("dummy", &status, super::super::STATUS_NO_CURRENT_POINT), 4);
        assert_eq!(set_error("dummy", &status, super::super::STATUS_INVALID_MATRIX), 4);
    }
}
