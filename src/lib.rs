//! rc-handle: versioned, reference-counted handles over a single
//! exclusively owned disposable resource.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: let one resource be shared by many independently disposable
//!   handle values, with the resource torn down exactly once when the last
//!   handle is disposed, in safe, verifiable layers.
//! - Layers:
//!   - SlotStore: append-only chunked arena of per-version slots whose
//!     addresses never move on growth; this is what makes the lock-free
//!     released check sound.
//!   - Shared<R>: one per wrapped resource; owns the resource, the slot
//!     store, the live count, and the lock. Implements acquire/release and
//!     the exactly-once teardown transition.
//!   - Handle<R>: public value type pairing an `Arc<Shared<R>>` with a
//!     version number; `Default` is the "no resource" sentinel.
//!
//! Constraints
//! - Thread-safe: plain threads, no async; every operation is synchronous
//!   with bounded critical sections.
//! - One short-held mutex per shared state guards slot append, flag
//!   mutation, and live-count updates. Resource teardown always runs
//!   outside it, so user code never executes under the lock.
//! - Versions are issued once and never reused; the released flag is
//!   monotonic (false to true, never back).
//! - The hot value-read path takes no mutex: a lock-free released check,
//!   then a shared read guard on the resource cell.
//!
//! Error model
//! - Use-after-release (value read or acquire through a released slot) and
//!   double-release (second dispose of one slot) are programmer errors,
//!   raised synchronously and never retried. In debug builds the error
//!   message embeds a backtrace of the first release.
//! - A second dispose never re-runs teardown: the first release's effects
//!   stand.
//!
//! Leak diagnostics (debug builds)
//! - Every acquisition and release records a backtrace, rendered to text
//!   only when a diagnostic needs it. When the last handle drops without
//!   the state having been cleanly disposed, each still-live slot is
//!   reported through `tracing::warn!` with its acquisition trace and the
//!   drop site. After a clean zero-reference disposal the scan is skipped,
//!   so normal shutdowns never produce false reports.
//!
//! Notes and non-goals
//! - Not a general reference-counting collector and not a lease service;
//!   once disposed, a resource's lineage is permanently dead (no reuse).
//! - `Handle::clone` aliases the same version (handles are plain values);
//!   extending a resource's lifetime is `acquire`'s job.
//! - The slot store only grows; slots are never compacted or reused.
//! - Public API surface is `Resource`, `Handle`, `DisposeFn`, and the
//!   error types; the slot store and shared state are implementation
//!   details.

mod error;
mod handle;
mod shared;
mod slot_store;
mod trace;

// Public surface
pub use error::{HandleError, ReleaseSite};
pub use handle::{DisposeFn, Handle, Resource};
