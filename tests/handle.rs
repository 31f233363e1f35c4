use rc_handle::{DisposeFn, Handle, HandleError, Resource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Probe {
    id: u64,
    disposed: Arc<AtomicUsize>,
}

impl Resource for Probe {
    type Value = u64;
    fn value(&self) -> u64 {
        self.id
    }
    fn dispose(self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn probe(id: u64) -> (Probe, Arc<AtomicUsize>) {
    let disposed = Arc::new(AtomicUsize::new(0));
    (
        Probe {
            id,
            disposed: Arc::clone(&disposed),
        },
        disposed,
    )
}

#[test]
fn wrap_read_dispose() {
    let (p, count) = probe(42);
    let h = Handle::wrap(p);
    assert!(!h.is_default());
    assert_eq!(h.value().expect("live handle reads"), 42);
    h.dispose().expect("first dispose succeeds");
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn acquire_extends_lifetime_until_last_dispose() {
    let (p, count) = probe(7);
    let h0 = Handle::wrap(p);
    let h1 = h0.acquire().expect("acquire from live handle");
    let h2 = h1.acquire().expect("acquire chains through any live handle");

    h0.dispose().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(h1.value().unwrap(), 7);

    h2.dispose().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    h1.dispose().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// The worked end-to-end sequence: dispose order does not matter, teardown
/// happens exactly once, and every operation after a release is rejected.
#[test]
fn lifecycle_with_misuse_after_the_end() {
    let (p, count) = probe(9);
    let h0 = Handle::wrap(p);
    let h1 = h0.acquire().unwrap();

    h0.dispose().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);

    h1.dispose().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let again = h1.dispose().unwrap_err();
    assert!(matches!(again, HandleError::DoubleRelease { .. }));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let from_dead = h0.acquire().unwrap_err();
    assert!(matches!(from_dead, HandleError::UseAfterRelease { .. }));

    let read_dead = h0.value().unwrap_err();
    assert!(matches!(read_dead, HandleError::UseAfterRelease { .. }));
}

#[test]
fn clone_aliases_the_same_version() {
    let (p, count) = probe(3);
    let h0 = Handle::wrap(p);
    let h1 = h0.acquire().unwrap();
    let alias = h1.clone();

    // Both copies read through the same slot.
    assert_eq!(alias.value().unwrap(), 3);
    h1.dispose().unwrap();

    // The alias observes the release made through the other copy.
    assert!(matches!(
        alias.dispose().unwrap_err(),
        HandleError::DoubleRelease { .. }
    ));
    assert!(matches!(
        alias.value().unwrap_err(),
        HandleError::UseAfterRelease { .. }
    ));

    h0.dispose().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn default_handle_operations_are_safe_noops() {
    let h: Handle<Probe> = Handle::default();
    assert!(h.is_default());
    assert_eq!(h.value().unwrap(), 0);
    h.dispose().unwrap();
    h.dispose().unwrap();

    // Acquiring from nothing yields nothing.
    let h2 = h.acquire().unwrap();
    assert!(h2.is_default());
    assert_eq!(h2.value().unwrap(), 0);
}

#[test]
fn errors_carry_the_failing_version() {
    let (p, _count) = probe(1);
    let h0 = Handle::wrap(p);
    let h1 = h0.acquire().unwrap();
    h1.dispose().unwrap();
    assert_eq!(h1.dispose().unwrap_err().version(), 1);
    assert_eq!(h1.value().unwrap_err().version(), 1);
    h0.dispose().unwrap();
    assert_eq!(h0.acquire().unwrap_err().version(), 0);
}

#[cfg(debug_assertions)]
#[test]
fn debug_errors_embed_the_first_release_site() {
    let (p, _count) = probe(5);
    let h = Handle::wrap(p);
    h.dispose().unwrap();
    let err = h.dispose().unwrap_err();
    assert!(err.to_string().contains("first released at:"));
}

#[test]
fn dispose_fn_wraps_a_teardown_closure() {
    let torn_down = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&torn_down);
    let h = Handle::wrap(DisposeFn::new(move || {
        flag.fetch_add(1, Ordering::SeqCst);
    }));
    h.value().expect("value-less resource reads unit");
    let h2 = h.acquire().unwrap();
    h.dispose().unwrap();
    assert_eq!(torn_down.load(Ordering::SeqCst), 0);
    h2.dispose().unwrap();
    assert_eq!(torn_down.load(Ordering::SeqCst), 1);
}
