//! Process-wide loader state
//!
//! One `ProcessState` backs one `Loader`. It is a plain record: all mutation
//! happens synchronously under the loader's lock.

use crate::cancelable::Outcome;
use crate::config::LoaderConfig;
use std::sync::Arc;
use tokio::sync::watch;

/// Where the loader is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    /// No load has been started.
    Uninitialized,
    /// A load is running.
    Initializing,
    /// An instance is stored and every caller gets it.
    Ready,
    /// The single load attempt failed; callers observe that failure.
    Failed,
}

/// State shared by every caller of a `Loader`.
pub struct ProcessState<M> {
    /// Merged configuration
    pub(crate) config: LoaderConfig,
    /// Set as soon as a load has been started or an instance adopted
    pub(crate) is_initialized: bool,
    /// The loaded or embedder-supplied instance. Written once.
    pub(crate) instance: Option<Arc<M>>,
    /// Outcome slot of the load in progress (or finished)
    pub(crate) pending: Option<watch::Receiver<Outcome<M>>>,
    /// Bumped by every reset so stale loads cannot write back
    pub(crate) generation: u64,
}

impl<M> Default for ProcessState<M> {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl<M> ProcessState<M> {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            is_initialized: false,
            instance: None,
            pending: None,
            generation: 0,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn instance(&self) -> Option<&Arc<M>> {
        self.instance.as_ref()
    }

    pub fn phase(&self) -> LoaderPhase {
        if !self.is_initialized {
            return LoaderPhase::Uninitialized;
        }
        if self.instance.is_some() {
            return LoaderPhase::Ready;
        }
        match &self.pending {
            Some(rx) if rx.borrow().is_some() => LoaderPhase::Failed,
            // The load task went away without reporting back.
            Some(rx) if rx.has_changed().is_err() => LoaderPhase::Failed,
            _ => LoaderPhase::Initializing,
        }
    }

    /// Store `instance` unless one is already stored.
    ///
    /// Returns the instance that ended up in the state.
    pub(crate) fn store_instance(&mut self, instance: Arc<M>) -> Arc<M> {
        match &self.instance {
            Some(existing) => {
                tracing::debug!("editor instance already stored, keeping the first one");
                Arc::clone(existing)
            }
            None => {
                self.instance = Some(Arc::clone(&instance));
                instance
            }
        }
    }

    /// Back to a fresh default state; outstanding loads become stale.
    pub(crate) fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::default();
        self.generation = generation;
    }
}
