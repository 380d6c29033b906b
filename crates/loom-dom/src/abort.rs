//! Cancellation shared between a component and everything it registers.
//!
//! One [`AbortController`] is owned by a component instance. Listeners and
//! timers registered with its [`AbortSignal`] are dropped once the controller
//! aborts, so teardown never needs to track individual subscriptions.
//! Controllers form a tree: aborting a parent aborts every child created
//! from it, while aborting a child leaves the parent untouched.

use std::fmt;

use tokio_util::sync::CancellationToken;

/// Read side of an abort controller. Cheap to clone.
#[derive(Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal is aborted.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }

    /// A new controller that aborts together with this signal.
    pub fn child(&self) -> AbortController {
        AbortController {
            signal: AbortSignal {
                token: self.token.child_token(),
            },
        }
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// Owner of an [`AbortSignal`].
#[derive(Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// A controller aborted whenever this one is.
    pub fn child(&self) -> AbortController {
        self.signal.child()
    }

    /// Abort the signal and every child. Idempotent.
    pub fn abort(&self) {
        self.signal.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }
}
