//! Error taxonomy for handle misuse.

use core::fmt;
use thiserror::Error;

/// Where a slot was first released, rendered lazily into error messages.
///
/// Holds backtrace text in debug builds; empty otherwise. Kept as a wrapper
/// so `Display` can stay silent when no trace was captured.
#[derive(Debug, Clone, Default)]
pub struct ReleaseSite(pub(crate) Option<String>);

impl ReleaseSite {
    /// The rendered release-site backtrace, if one was captured.
    pub fn trace(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for ReleaseSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(trace) => write!(f, "; first released at:\n{trace}"),
            None => Ok(()),
        }
    }
}

/// Misuse of a handle: both variants are programmer errors, raised
/// synchronously to the caller and never retried internally.
#[derive(Debug, Clone, Error)]
pub enum HandleError {
    /// A value read or `acquire` went through a slot that was already
    /// released.
    #[error("handle version {version} used after release{released_at}")]
    UseAfterRelease {
        version: u32,
        released_at: ReleaseSite,
    },

    /// The same slot was disposed twice. The first release's effects
    /// (including resource teardown, if it was the last live slot) stand.
    #[error("handle version {version} released twice{released_at}")]
    DoubleRelease {
        version: u32,
        released_at: ReleaseSite,
    },
}

impl HandleError {
    /// The slot version the failing operation went through.
    pub fn version(&self) -> u32 {
        match self {
            Self::UseAfterRelease { version, .. } | Self::DoubleRelease { version, .. } => *version,
        }
    }
}
