//! Cancelable handles over a shared load outcome
//!
//! All callers of `Loader::initialize` watch the same outcome slot. Each caller
//! gets its own `CancelableTask` with its own cancel flag, so canceling one
//! handle never affects another handle or the load itself.

use crate::error::LoadError;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Settled result of a load; `None` while the load is still running.
pub(crate) type Outcome<M> = Option<Result<Arc<M>, LoadError>>;

/// Caller's view of the eventual library instance.
pub struct CancelableTask<M> {
    outcome: watch::Receiver<Outcome<M>>,
    canceled: Arc<AtomicBool>,
}

/// Cancels a `CancelableTask` from somewhere other than its owner.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    canceled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

impl<M> CancelableTask<M> {
    pub(crate) fn new(outcome: watch::Receiver<Outcome<M>>) -> Self {
        Self {
            outcome,
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark this handle canceled. Idempotent.
    ///
    /// A later successful load resolves this handle to
    /// `LoadError::Cancellation`; failures still come through unchanged.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// A cloneable canceler sharing this handle's flag.
    pub fn canceler(&self) -> CancelHandle {
        CancelHandle {
            canceled: Arc::clone(&self.canceled),
        }
    }

    /// Peek at the settled outcome without waiting.
    ///
    /// Returns `None` while the load is running. Cancellation is not applied.
    pub fn try_outcome(&self) -> Outcome<M> {
        self.outcome.borrow().clone()
    }

    /// Wait for the shared load to settle.
    pub async fn wait(mut self) -> Result<Arc<M>, LoadError> {
        let settled = match self.outcome.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            // The sending side went away without ever settling.
            Err(_) => None,
        };

        match settled {
            Some(Ok(_)) if self.is_canceled() => Err(LoadError::Cancellation),
            Some(result) => result,
            None => Err(LoadError::Abandoned),
        }
    }
}

impl<M: Send + Sync + 'static> IntoFuture for CancelableTask<M> {
    type Output = Result<Arc<M>, LoadError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl<M> fmt::Debug for CancelableTask<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.outcome.borrow() {
            None => "pending",
            Some(Ok(_)) => "resolved",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("CancelableTask")
            .field("state", &state)
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
