//! Cooperative cancellation
//!
//! A [`CancelHandle`] flips a shared flag once; every [`Cancellation`] clone
//! observes it. Engine calls are raced against the flag with
//! [`Cancellation::guard`].

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::infrastructure::EngineError;

/// The guarded future was abandoned because the run was cancelled
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Run cancelled")]
pub struct Cancelled;

impl From<Cancelled> for EngineError {
    fn from(_: Cancelled) -> Self {
        EngineError::Cancelled
    }
}

/// Creates a linked handle and token
#[must_use]
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, Cancellation { rx })
}

/// Trigger side
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancels every linked [`Cancellation`]. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observer side
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    /// A token that is never cancelled
    #[must_use]
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    /// Returns true once cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pending forever if the
    /// handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Runs `fut` to completion unless cancellation arrives first.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if the token is or becomes cancelled before
    /// `fut` finishes; `fut` is dropped in that case.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}
