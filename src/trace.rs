//! Debug-only call-site capture.
//!
//! `SiteTrace` records a backtrace at acquisition or release time so that
//! use-after-release and double-release errors can point at the site of the
//! first release, and leak reports can point at the acquisition that was
//! never balanced. In release builds this is a zero-sized no-op.

#[cfg(debug_assertions)]
use parking_lot::Mutex;
#[cfg(debug_assertions)]
use std::backtrace::Backtrace;

/// Per-slot call-site record. Written at most once per event (acquire or
/// release), always while the owning shared state's lock is held; the inner
/// mutex makes reads from error paths and leak scans safe on their own.
#[derive(Debug, Default)]
pub(crate) struct SiteTrace {
    #[cfg(debug_assertions)]
    site: Mutex<Option<Backtrace>>,
}

impl SiteTrace {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            site: Mutex::new(None),
        }
    }

    /// Capture the current call stack. `force_capture` so diagnostics work
    /// without `RUST_BACKTRACE`; the capture itself is cheap, symbol
    /// resolution is deferred until `render`.
    #[inline]
    pub(crate) fn record(&self) {
        #[cfg(debug_assertions)]
        {
            *self.site.lock() = Some(Backtrace::force_capture());
        }
    }

    /// Render the recorded stack to text, if one was captured.
    pub(crate) fn render(&self) -> Option<String> {
        #[cfg(debug_assertions)]
        {
            return self.site.lock().as_ref().map(|bt| bt.to_string());
        }
        #[cfg(not(debug_assertions))]
        {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SiteTrace;

    #[test]
    fn unrecorded_renders_nothing() {
        let t = SiteTrace::new();
        assert!(t.render().is_none());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn record_then_render_in_debug() {
        let t = SiteTrace::new();
        t.record();
        let text = t.render().expect("trace recorded in debug builds");
        assert!(!text.is_empty());
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn record_is_noop_in_release() {
        let t = SiteTrace::new();
        t.record();
        assert!(t.render().is_none());
    }
}
