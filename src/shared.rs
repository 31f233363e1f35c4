//! Shared state: the resource, its slot store, the live count, and the lock.
//!
//! One `Shared` is created per wrapped resource and held by every handle
//! derived from it through an `Arc`. A single short-held mutex guards slot
//! append, flag mutation, and live-count updates; the resource's own
//! teardown always runs outside it so user code never executes under the
//! lock. Exactly-once disposal follows from the `disposed` flag flipping
//! under the mutex on the live-count 1 to 0 transition.

use crate::error::{HandleError, ReleaseSite};
use crate::handle::Resource;
use crate::slot_store::SlotStore;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

struct State {
    /// Number of slots not yet released.
    live: usize,
    /// Next version to issue; versions are never reused.
    next_version: u32,
    /// Set under the lock by the release that saw `live` reach zero.
    disposed: bool,
}

pub(crate) struct Shared<R: Resource> {
    state: Mutex<State>,
    slots: SlotStore,
    /// Taken exactly once, by the final release. Readers hold the shared
    /// side only long enough to copy the exposed value out.
    resource: RwLock<Option<R>>,
}

impl<R: Resource> Shared<R> {
    /// Wrap a resource, issuing version 0 with a live count of one.
    pub(crate) fn wrap(resource: R) -> Arc<Self> {
        let shared = Self {
            state: Mutex::new(State {
                live: 1,
                next_version: 1,
                disposed: false,
            }),
            slots: SlotStore::new(),
            resource: RwLock::new(Some(resource)),
        };
        shared.slots.grow_to(0).acquired_at.record();
        Arc::new(shared)
    }

    /// Issue a new version derived from `from`. Fails if `from` was already
    /// released; acquiring through a disposed handle is a programmer error.
    pub(crate) fn acquire(&self, from: u32) -> Result<u32, HandleError> {
        let mut state = self.state.lock();
        if self.slots.slot(from).is_released() {
            drop(state);
            return Err(self.use_after_release(from));
        }
        let version = state.next_version;
        state.next_version = version
            .checked_add(1)
            .expect("slot store exhausted all u32 versions");
        state.live += 1;
        self.slots.grow_to(version).acquired_at.record();
        Ok(version)
    }

    /// Release one version. On the last live release, tears the resource
    /// down exactly once, outside the lock. A second release of the same
    /// version fails without re-running teardown.
    pub(crate) fn release(&self, version: u32) -> Result<(), HandleError> {
        let mut state = self.state.lock();
        let slot = self.slots.slot(version);
        if slot.is_released() {
            drop(state);
            return Err(HandleError::DoubleRelease {
                version,
                released_at: self.release_site(version),
            });
        }
        slot.released_at.record();
        slot.mark_released();
        state.live -= 1;
        let last = state.live == 0;
        if last {
            state.disposed = true;
        }
        drop(state);
        if last {
            let resource = self
                .resource
                .write()
                .take()
                .expect("resource must still be present at the final release");
            resource.dispose();
        }
        Ok(())
    }

    /// Released check for one version. The soft form (`precise == false`)
    /// reads the flag without the lock: a stale `false` is tolerable because
    /// the value read that follows it re-validates against the resource
    /// itself, and a stale `true` cannot occur (the flag is monotonic, and a
    /// thread holding a live handle has observed its own acquisition).
    pub(crate) fn check_released(&self, version: u32, precise: bool) -> bool {
        if precise {
            let _state = self.state.lock();
            self.slots.slot(version).is_released()
        } else {
            self.slots.slot(version).is_released()
        }
    }

    /// Read the resource's exposed value through one version.
    pub(crate) fn read_value(&self, version: u32) -> Result<R::Value, HandleError> {
        if self.check_released(version, false) {
            return Err(self.use_after_release(version));
        }
        let guard = self.resource.read();
        match guard.as_ref() {
            Some(resource) => Ok(resource.value()),
            None => {
                // An aliased copy of this handle won the race to the final
                // release; the precise check is authoritative.
                drop(guard);
                debug_assert!(self.check_released(version, true));
                Err(self.use_after_release(version))
            }
        }
    }

    pub(crate) fn use_after_release(&self, version: u32) -> HandleError {
        HandleError::UseAfterRelease {
            version,
            released_at: self.release_site(version),
        }
    }

    fn release_site(&self, version: u32) -> ReleaseSite {
        ReleaseSite(self.slots.slot(version).released_at.render())
    }

    /// Scan for slots never released and report each through the diagnostic
    /// sink. Skipped entirely after a clean zero-reference disposal, so a
    /// normal shutdown never produces a false leak report. Reporting only:
    /// the resource is not torn down here.
    #[cfg(debug_assertions)]
    fn report_leaks(&mut self) -> usize {
        let state = self.state.get_mut();
        if state.disposed {
            return 0;
        }
        let drop_site = std::backtrace::Backtrace::force_capture().to_string();
        let mut leaked = 0;
        for version in 0..state.next_version {
            let slot = self.slots.slot(version);
            if !slot.is_released() {
                leaked += 1;
                let acquired_at = slot.acquired_at.render();
                tracing::warn!(
                    version,
                    acquired_at = acquired_at.as_deref().unwrap_or("<unavailable>"),
                    drop_site = %drop_site,
                    "potential leak: handle dropped without dispose"
                );
            }
        }
        leaked
    }
}

impl<R: Resource> Drop for Shared<R> {
    fn drop(&mut self) {
        // Rust's analogue of finalization: the last Arc is gone, so every
        // handle referencing this state has been dropped.
        #[cfg(debug_assertions)]
        self.report_leaks();
    }
}
