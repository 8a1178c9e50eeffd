use thiserror::Error;

use crate::{bridge::ForeignException, context::ContextId, context::SlotKind};

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `current()` was called on a thread with no entered context.
    #[error("no execution context is bound to the current thread")]
    ContextUnbound,

    /// The context is already entered, on this thread or another one.
    #[error("execution context {0} is already entered")]
    ContextBusy(ContextId),

    /// The slot's platform capability is not compiled into this build.
    #[error("platform extension slot `{0}` is not available on this target")]
    SlotUnavailable(SlotKind),
}

/// Script-level exception raised by a bridge call whose foreign operation
/// left an exception pending.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("foreign call failed: {0}")]
pub struct ForeignCallException(pub ForeignException);

impl ForeignCallException {
    pub const fn exception(&self) -> &ForeignException {
        &self.0
    }

    #[must_use]
    pub fn into_exception(self) -> ForeignException {
        self.0
    }
}

impl From<ForeignException> for ForeignCallException {
    fn from(value: ForeignException) -> Self {
        Self(value)
    }
}
