// Boost/Apache2 License

//! Scoped save and restore of a context's graphics state.

use crate::context::Context;
use core::ops::Deref;

/// Saves the graphics state of a context and restores it on drop.
///
/// The restore also runs while unwinding from a panic, so a state pushed by a guard is
/// always popped. Guards nest; inner guards restore first.
///
/// ```no_run
/// use vellum::{Context, Format, ImageSurface, StateGuard};
///
/// let surface = ImageSurface::create(Format::Argb32, 32, 32);
/// let cr = Context::create(&surface);
/// {
///     let cr = StateGuard::new(&cr);
///     cr.scale(2.0, 2.0);
///     cr.rectangle(1.0, 1.0, 4.0, 4.0).fill();
/// }
/// // Back to the identity transform.
/// ```
#[derive(Debug)]
#[must_use = "the state is restored as soon as the guard is dropped"]
pub struct StateGuard<'a> {
    context: &'a Context,
}

impl<'a> StateGuard<'a> {
    /// Save the state of `context`.
    pub fn new(context: &'a Context) -> Self {
        context.save();
        Self { context }
    }

    /// The guarded context.
    pub fn context(&self) -> &'a Context {
        self.context
    }
}

impl Deref for StateGuard<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.context
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.context.restore();
    }
}

impl Context {
    /// Run `f` with the graphics state saved, then restore it.
    pub fn with_saved_state<R>(&self, f: impl FnOnce(&Context) -> R) -> R {
        let guard = StateGuard::new(self);
        f(guard.context())
    }
}

#[cfg(test)]
mod tests {
    use super::StateGuard;
    use crate::{Context, Format, ImageSurface, Matrix, Status};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn context() -> Context {
        let surface = ImageSurface::create(Format::Argb32, 8, 8);
        Context::create(&surface)
    }

    #[test]
    fn nested_guards_restore_in_order() {
        let cr = context();
        {
            let outer = StateGuard::new(&cr);
            outer.scale(2.0, 2.0);
            {
                let inner = StateGuard::new(&cr);
                inner.scale(3.0, 3.0);
                assert_eq!(cr.matrix(), Matrix::scaling(6.0, 6.0));
            }
            assert_eq!(cr.matrix(), Matrix::scaling(2.0, 2.0));
        }
        assert_eq!(cr.matrix(), Matrix::identity());
        assert_eq!(cr.status(), Status::Success);
    }

    #[test]
    fn closures_restore_state() {
        let cr = context();
        let width = cr.with_saved_state(|cr| {
            cr.set_line_width(7.0);
            cr.line_width()
        });
        assert_eq!(width, 7.0);
        assert_eq!(cr.line_width(), 2.0);
    }

    #[test]
    fn unwinding_restores_state() {
        let cr = context();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = StateGuard::new(&cr);
            cr.translate(5.0, 5.0);
            panic!("drawing failed");
        }));

        assert!(result.is_err());
        assert_eq!(cr.matrix(), Matrix::identity());
        assert_eq!(cr.status(), Status::Success);
    }

    #[test]
    fn moved_guards_restore_once() {
        let cr = context();
        let guard = StateGuard::new(&cr);
        cr.scale(4.0, 4.0);
        let moved = guard;
        drop(moved);

        assert_eq!(cr.matrix(), Matrix::identity());
        assert_eq!(cr.status(), Status::Success);
    }
}
