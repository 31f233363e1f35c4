//! Public handle surface: the `Resource` capability and `Handle` values.

use crate::error::HandleError;
use crate::shared::Shared;
use core::fmt;
use std::sync::Arc;

/// A disposable resource with an exposed value.
///
/// The handle layer takes exclusive ownership of the resource at wrap time
/// and calls `dispose` exactly once, when the last outstanding handle is
/// disposed. `value` returns the exposed value by copy/clone so reads never
/// borrow past the handle's released check; resources whose only capability
/// is teardown use `Value = ()` (see [`DisposeFn`]).
pub trait Resource {
    type Value;

    /// The value this resource exposes through live handles.
    fn value(&self) -> Self::Value;

    /// Tear the resource down. Called at most once, never under the
    /// handle layer's lock.
    fn dispose(self);
}

/// Adapter turning a teardown closure into a value-less [`Resource`].
pub struct DisposeFn<F: FnOnce()>(F);

impl<F: FnOnce()> DisposeFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F: FnOnce()> Resource for DisposeFn<F> {
    type Value = ();
    fn value(&self) {}
    fn dispose(self) {
        (self.0)()
    }
}

/// A disposable view onto a shared resource, tied to one version slot.
///
/// `wrap` issues the first handle (version 0); [`Handle::acquire`] issues
/// further independent handles sharing the same state. Each version must be
/// disposed exactly once; the resource is torn down when the last one is.
///
/// `Default` is the "no resource" sentinel: its operations are no-ops and
/// its value is the value type's default. `Clone` copies the handle *value*,
/// so both copies alias one version; disposing each of two clones is the
/// double-release error this crate exists to catch. Use `acquire` to extend
/// the resource's lifetime.
pub struct Handle<R: Resource> {
    shared: Option<Arc<Shared<R>>>,
    version: u32,
}

impl<R: Resource> Handle<R> {
    /// Take exclusive ownership of `resource` and issue the first handle.
    pub fn wrap(resource: R) -> Self {
        Self {
            shared: Some(Shared::wrap(resource)),
            version: 0,
        }
    }

    /// Issue a new independent handle onto the same resource.
    ///
    /// The returned handle must itself be disposed; the current handle
    /// remains usable until separately disposed. Fails with
    /// [`HandleError::UseAfterRelease`] if this handle was already disposed.
    /// Acquiring from a default handle yields another default handle.
    pub fn acquire(&self) -> Result<Self, HandleError> {
        match &self.shared {
            None => Ok(Self::default()),
            Some(shared) => {
                let version = shared.acquire(self.version)?;
                Ok(Self {
                    shared: Some(Arc::clone(shared)),
                    version,
                })
            }
        }
    }

    /// Read the resource's exposed value.
    ///
    /// A default handle returns `R::Value::default()`. Fails with
    /// [`HandleError::UseAfterRelease`] if this handle was already disposed.
    pub fn value(&self) -> Result<R::Value, HandleError>
    where
        R::Value: Default,
    {
        match &self.shared {
            None => Ok(R::Value::default()),
            Some(shared) => shared.read_value(self.version),
        }
    }

    /// Dispose this handle's version. On the last outstanding version, the
    /// resource is torn down exactly once. A second dispose of the same
    /// version fails with [`HandleError::DoubleRelease`]; a default handle
    /// is a no-op.
    pub fn dispose(&self) -> Result<(), HandleError> {
        match &self.shared {
            None => Ok(()),
            Some(shared) => shared.release(self.version),
        }
    }

    /// Whether this is the "no resource" sentinel.
    pub fn is_default(&self) -> bool {
        self.shared.is_none()
    }
}

impl<R: Resource> Default for Handle<R> {
    fn default() -> Self {
        Self {
            shared: None,
            version: 0,
        }
    }
}

impl<R: Resource> Clone for Handle<R> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            version: self.version,
        }
    }
}

impl<R: Resource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("version", &self.version)
            .field("is_default", &self.is_default())
            .finish()
    }
}
