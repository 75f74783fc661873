// Boost/Apache2 License

//! The owning handle behind every wrapper type.
//!
//! A [`Handle`] owns zero or one library object and releases it on drop. What happens
//! when a handle is cloned is decided by its copy strategy:
//!
//! - [`Unique`]: the handle cannot be cloned.
//! - [`Shared`]: cloning adds a reference to the same object.
//! - [`Cloned`]: cloning asks the library for a deep copy.

use crate::sys;
use __sealed::{Sealed, StrategySealed};

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

/// A library object type, and the function that destroys it.
///
/// # Safety
///
/// This trait should not be implemented outside of this crate.
pub unsafe trait Resource: Sealed {}

/// A library object type with an internal reference count.
///
/// # Safety
///
/// This trait should not be implemented outside of this crate.
pub unsafe trait Counted: Resource {
    #[doc(hidden)]
    unsafe fn reference(ptr: *mut Self) -> *mut Self;

    #[doc(hidden)]
    unsafe fn reference_count(ptr: *mut Self) -> u32;
}

/// A library object type that can be deep-copied.
///
/// # Safety
///
/// This trait should not be implemented outside of this crate.
pub unsafe trait Copyable: Resource {
    #[doc(hidden)]
    unsafe fn copy(ptr: *mut Self) -> *mut Self;
}

/// How a [`Handle`] behaves when cloned.
pub trait Strategy: StrategySealed {}

/// Handles that cannot be cloned.
#[derive(Debug)]
pub enum Unique {}

/// Handles whose clones share the object and add a reference.
#[derive(Debug)]
pub enum Shared {}

/// Handles whose clones own a deep copy of the object.
#[derive(Debug)]
pub enum Cloned {}

impl StrategySealed for Unique {}
impl StrategySealed for Shared {}
impl StrategySealed for Cloned {}
impl Strategy for Unique {}
impl Strategy for Shared {}
impl Strategy for Cloned {}

/// A handle that owns its object alone.
pub type UniqueHandle<T> = Handle<T, Unique>;

/// A handle to a reference-counted object.
pub type SharedHandle<T> = Handle<T, Shared>;

/// A handle to an object that is deep-copied on clone.
pub type CopyableHandle<T> = Handle<T, Cloned>;

/// An owned library object, or nothing.
pub struct Handle<T: Resource, S: Strategy> {
    /// The object, if any.
    ptr: Option<NonNull<T>>,

    /// This handle is `!Send` and `!Sync`; the library counts references non-atomically.
    _thread_safety: PhantomData<Cell<()>>,

    /// The copy strategy.
    _strategy: PhantomData<S>,
}

impl<T: Resource, S: Strategy> Handle<T, S> {
    /// A handle that holds nothing.
    pub const fn empty() -> Self {
        Self {
            ptr: None,
            _thread_safety: PhantomData,
            _strategy: PhantomData,
        }
    }

    /// Take ownership of an object without adding a reference. Null gives an empty handle.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live object of this type whose count the caller owns.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            ptr: NonNull::new(ptr),
            _thread_safety: PhantomData,
            _strategy: PhantomData,
        }
    }

    /// The address of the object, or null. Ownership stays with the handle.
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// The address of the object, if there is one.
    pub fn get(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Whether the handle holds nothing.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Move the object out, leaving this handle empty.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }

    /// Release the object now, leaving this handle empty.
    pub fn reset(&mut self) {
        drop(self.take());
    }

    /// Give up ownership without releasing. The caller has to destroy the object.
    pub fn into_raw(self) -> *mut T {
        let ptr = self.as_ptr();
        mem::forget(self);
        ptr
    }
}

impl<T: Counted> Handle<T, Shared> {
    /// Wrap a borrowed object, adding a reference to it. Null gives an empty handle.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live object of this type.
    pub unsafe fn from_raw_shared(ptr: *mut T) -> Self {
        Self::from_raw(T::reference(ptr))
    }

    /// The library's reference count for the object, or zero for an empty handle.
    pub fn reference_count(&self) -> u32 {
        // SAFETY: we own a count, so the object is alive.
        unsafe { T::reference_count(self.as_ptr()) }
    }
}

impl<T: Resource, S: Strategy> Drop for Handle<T, S> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // Unwinding out of a release would leave the object half torn down.
            crate::abort_on_panic(|| unsafe { T::destroy(ptr.as_ptr()) });
        }
    }
}

impl<T: Resource, S: Strategy> Default for Handle<T, S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Counted> Clone for Handle<T, Shared> {
    fn clone(&self) -> Self {
        // SAFETY: the object is alive while we hold our count.
        unsafe { Self::from_raw_shared(self.as_ptr()) }
    }

    fn clone_from(&mut self, source: &Self) {
        if self.ptr != source.ptr {
            *self = source.clone();
        }
    }
}

impl<T: Copyable> Clone for Handle<T, Cloned> {
    fn clone(&self) -> Self {
        match self.ptr {
            // SAFETY: the object is alive, and the copy is a fresh object we own.
            Some(ptr) => unsafe { Self::from_raw(T::copy(ptr.as_ptr())) },
            None => Self::empty(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if self.ptr != source.ptr {
            *self = source.clone();
        }
    }
}

impl<T: Resource, S: Strategy> fmt::Debug for Handle<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.as_ptr()).finish()
    }
}

macro_rules! resources {
    ($($raw: ty => $destroy: path;)*) => {
        $(
            unsafe impl Sealed for $raw {
                unsafe fn destroy(ptr: *mut Self) {
                    $destroy(ptr)
                }
            }

            unsafe impl Resource for $raw {}
        )*
    };
}

macro_rules! counted {
    ($($raw: ty => $reference: path, $count: path;)*) => {
        $(
            unsafe impl Counted for $raw {
                unsafe fn reference(ptr: *mut Self) -> *mut Self {
                    $reference(ptr)
                }

                unsafe fn reference_count(ptr: *mut Self) -> u32 {
                    $count(ptr)
                }
            }
        )*
    };
}

resources! {
    sys::RawContext => sys::context_destroy;
    sys::RawDevice => sys::device_destroy;
    sys::RawFontFace => sys::font_face_destroy;
    sys::RawFontOptions => sys::font_options_destroy;
    sys::RawPath => sys::path_destroy;
    sys::RawPattern => sys::pattern_destroy;
    sys::RawScaledFont => sys::scaled_font_destroy;
    sys::RawSurface => sys::surface_destroy;
}

counted! {
    sys::RawContext => sys::context_reference, sys::context_get_reference_count;
    sys::RawDevice => sys::device_reference, sys::device_get_reference_count;
    sys::RawFontFace => sys::font_face_reference, sys::font_face_get_reference_count;
    sys::RawPattern => sys::pattern_reference, sys::pattern_get_reference_count;
    sys::RawScaledFont => sys::scaled_font_reference, sys::scaled_font_get_reference_count;
    sys::RawSurface => sys::surface_reference, sys::surface_get_reference_count;
}

unsafe impl Copyable for sys::RawFontOptions {
    unsafe fn copy(ptr: *mut Self) -> *mut Self {
        sys::font_options_copy(ptr)
    }
}

mod __sealed {
    #[doc(hidden)]
    pub unsafe trait Sealed {
        /// Drop one count of the object.
        unsafe fn destroy(ptr: *mut Self);
    }

    #[doc(hidden)]
    pub trait StrategySealed {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::debug::live_objects;

    fn surface() -> SharedHandle<sys::RawSurface> {
        unsafe { Handle::from_raw(sys::image_surface_create(sys::FORMAT_ARGB32, 4, 4)) }
    }

    #[test]
    fn shared_handles_release_with_the_last_owner() {
        let before = live_objects();
        let first = surface();
        let created = live_objects();
        assert!(created > before);

        let copies: Vec<_> = (0..4).map(|_| first.clone()).collect();
        assert_eq!(first.reference_count(), 5);
        assert!(copies.iter().all(|c| c.as_ptr() == first.as_ptr()));

        drop(copies);
        assert_eq!(first.reference_count(), 1);
        assert_eq!(live_objects(), created);

        drop(first);
        assert_eq!(live_objects(), before);
    }

    #[test]
    fn take_leaves_an_empty_handle() {
        let before = live_objects();
        let mut first = surface();
        let ptr = first.as_ptr();

        let mut second = first.take();
        assert!(first.is_empty());
        assert_eq!(second.as_ptr(), ptr);
        assert_eq!(second.reference_count(), 1);

        drop(first);
        assert_eq!(second.reference_count(), 1);

        second.reset();
        assert!(second.is_empty());
        assert_eq!(live_objects(), before);
    }

    #[test]
    fn clone_from_the_same_object_is_a_no_op() {
        let mut first = surface();
        let alias = first.clone();
        first.clone_from(&alias);
        assert_eq!(first.reference_count(), 2);
        assert_eq!(first.as_ptr(), alias.as_ptr());
    }

    #[test]
    fn copyable_handles_deep_copy() {
        let original: CopyableHandle<sys::RawFontOptions> =
            unsafe { Handle::from_raw(sys::font_options_create()) };
        let copy = original.clone();
        assert_ne!(copy.as_ptr(), original.as_ptr());

        unsafe {
            sys::font_options_set_hint_style(copy.as_ptr(), sys::HINT_STYLE_FULL);
            assert_eq!(
                sys::font_options_get_hint_style(original.as_ptr()),
                sys::HINT_STYLE_DEFAULT
            );
        }
    }

    #[test]
    fn copyable_clone_from_the_same_object_keeps_it() {
        let mut options: CopyableHandle<sys::RawFontOptions> =
            unsafe { Handle::from_raw(sys::font_options_create()) };
        let ptr = options.as_ptr();
        let before = live_objects();

        // A second owner of the same address, released by hand below.
        let alias: CopyableHandle<sys::RawFontOptions> = unsafe { Handle::from_raw(ptr) };
        options.clone_from(&alias);
        let _ = alias.into_raw();

        assert_eq!(options.as_ptr(), ptr);
        assert_eq!(live_objects(), before);
        unsafe {
            sys::font_options_set_hint_style(options.as_ptr(), sys::HINT_STYLE_FULL);
            assert_eq!(
                sys::font_options_get_hint_style(ptr),
                sys::HINT_STYLE_FULL
            );
        }
    }

    #[test]
    fn copyable_clone_from_another_object_copies() {
        let mut target: CopyableHandle<sys::RawFontOptions> =
            unsafe { Handle::from_raw(sys::font_options_create()) };
        let source: CopyableHandle<sys::RawFontOptions> =
            unsafe { Handle::from_raw(sys::font_options_create()) };
        unsafe { sys::font_options_set_hint_style(source.as_ptr(), sys::HINT_STYLE_FULL) };

        target.clone_from(&source);
        assert_ne!(target.as_ptr(), source.as_ptr());
        assert_eq!(
            unsafe { sys::font_options_get_hint_style(target.as_ptr()) },
            sys::HINT_STYLE_FULL
        );
    }

    #[test]
    fn borrowed_addresses_are_shared_on_construct() {
        let surface = surface();
        let device = unsafe {
            SharedHandle::from_raw_shared(sys::surface_get_device(surface.as_ptr()))
        };
        assert_eq!(device.reference_count(), 2);
    }

    #[test]
    fn into_raw_keeps_the_object_alive() {
        let ptr = surface().into_raw();
        unsafe {
            assert_eq!(sys::surface_get_reference_count(ptr), 1);
            drop(SharedHandle::from_raw(ptr));
        }
    }

    #[test]
    fn empty_handles_do_nothing() {
        let handle = UniqueHandle::<sys::RawPath>::default();
        assert!(handle.as_ptr().is_null());
        assert!(handle.get().is_none());
    }
}
