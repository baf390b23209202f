//! Loader orchestrator
//!
//! Makes sure the editor library is loaded at most once per `ProcessState` and
//! hands every caller the same instance. The first `initialize()` picks one of
//! three strategies, in order:
//!
//! 1. an instance supplied up front via `provide_instance`,
//! 2. an instance already installed globally in the environment,
//! 3. injecting `paths.vs/loader.js` and asking the library's module loader
//!    for `vs/editor/editor.main`.
//!
//! Later callers never start new work; they get a fresh cancelable handle over
//! the outcome of that first attempt.

use crate::cancelable::{CancelableTask, Outcome};
use crate::config::{self, ConfigError, LoaderConfig};
use crate::environment::{Bootstrap, Environment, LibraryInstance, Script};
use crate::error::LoadError;
use crate::state::{LoaderPhase, ProcessState};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Shared entry point for everyone who needs the editor library.
///
/// Clones share the same state, so a single `Loader` can be handed out across
/// the application.
pub struct Loader<M> {
    state: Arc<Mutex<ProcessState<M>>>,
    environment: Arc<dyn Environment<M>>,
    bootstrap: Arc<dyn Bootstrap<M>>,
}

impl<M> Clone for Loader<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            environment: Arc::clone(&self.environment),
            bootstrap: Arc::clone(&self.bootstrap),
        }
    }
}

impl<M: LibraryInstance> Loader<M> {
    /// Create a loader with the default configuration.
    pub fn new(environment: Arc<dyn Environment<M>>, bootstrap: Arc<dyn Bootstrap<M>>) -> Self {
        Self::with_state(ProcessState::default(), environment, bootstrap)
    }

    pub fn with_state(
        state: ProcessState<M>,
        environment: Arc<dyn Environment<M>>,
        bootstrap: Arc<dyn Bootstrap<M>>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            environment,
            bootstrap,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProcessState<M>> {
        // The state is only ever touched synchronously, a poisoned lock still
        // holds a consistent record.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge `options` into the stored configuration.
    ///
    /// Changes made after `initialize()` has been called are stored but do not
    /// affect the load that is already running or finished.
    ///
    /// # Errors
    ///
    /// `ConfigError::Required` for a missing or `null` argument,
    /// `ConfigError::Type` for anything that is not a JSON object. The stored
    /// configuration is left untouched in both cases.
    pub fn configure(&self, options: Option<Value>) -> Result<(), ConfigError> {
        let partial = config::validate(options)?;

        let mut state = self.lock();
        if state.is_initialized {
            tracing::debug!(
                "configuration changed after initialization; the current load keeps its settings"
            );
        }
        state.config.merge(partial);
        Ok(())
    }

    /// Hand in an already constructed library instance.
    ///
    /// It is stored right away, so `cached_instance()` returns it and the next
    /// `initialize()` adopts it instead of loading anything. Ignored once
    /// `initialize()` has been called or an instance is already stored.
    pub fn provide_instance(&self, instance: Arc<M>) {
        let mut state = self.lock();
        if state.is_initialized {
            tracing::debug!("loader already initialized, ignoring the supplied instance");
            return;
        }
        state.store_instance(instance);
    }

    /// Get a handle to the library instance, starting the load if needed.
    ///
    /// Every call returns a new handle, but all handles observe the same
    /// outcome. Never panics; when a load is needed but there is no Tokio
    /// runtime, the returned handle settles with `LoadError::Abandoned` and the
    /// state is left as it was, so a later call from inside a runtime loads.
    pub fn initialize(&self) -> CancelableTask<M> {
        let mut state = self.lock();

        if let Some(outcome) = &state.pending {
            return CancelableTask::new(outcome.clone());
        }

        if let Some(instance) = state.instance.clone() {
            tracing::debug!("using the pre-supplied editor instance");
            return Self::settle_now(&mut state, Ok(instance));
        }

        if let Some(instance) = self
            .environment
            .global_instance()
            .filter(|instance| instance.has_editor())
        {
            tracing::debug!("using the editor instance already present in the environment");
            return Self::settle_now(&mut state, Ok(instance));
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("cannot load the editor library outside a Tokio runtime: {}", e);
                let (_, outcome) = watch::channel(Some(Err(LoadError::Abandoned)));
                return CancelableTask::new(outcome);
            }
        };

        let (sender, outcome) = watch::channel(None);
        state.is_initialized = true;
        state.pending = Some(outcome.clone());
        let generation = state.generation;
        let config = state.config.clone();
        drop(state);

        let loader = self.clone();
        runtime.spawn(async move {
            let result = loader.load(&config).await;
            loader.finish(generation, result, sender);
        });

        CancelableTask::new(outcome)
    }

    /// The stored instance, if a load has succeeded. Never starts a load.
    pub fn cached_instance(&self) -> Option<Arc<M>> {
        self.lock().instance.clone()
    }

    pub fn phase(&self) -> LoaderPhase {
        self.lock().phase()
    }

    /// Snapshot of the merged configuration.
    pub fn config(&self) -> LoaderConfig {
        self.lock().config.clone()
    }

    /// Reset to the initial defaults.
    ///
    /// The next `initialize()` starts a brand-new load. Handles taken before
    /// disposal still settle with the old load's outcome, which is never stored.
    pub fn dispose(&self) {
        self.lock().reset();
        tracing::debug!("editor loader disposed");
    }

    async fn load(&self, config: &LoaderConfig) -> Result<Arc<M>, LoadError> {
        let script = Script::loader(config).map_err(LoadError::script)?;

        tracing::debug!(src = %script.src, "injecting editor loader script");
        self.environment
            .inject_script(script)
            .await
            .map_err(LoadError::script)?;

        let module = self
            .bootstrap
            .require_main(config)
            .await
            .map_err(LoadError::bootstrap)?;
        Ok(module.into_instance())
    }

    fn finish(
        &self,
        generation: u64,
        result: Result<Arc<M>, LoadError>,
        sender: watch::Sender<Outcome<M>>,
    ) {
        let outcome = {
            let mut state = self.lock();
            match result {
                Ok(instance) if state.generation == generation => {
                    tracing::info!("editor library loaded");
                    Ok(state.store_instance(instance))
                }
                Ok(instance) => {
                    tracing::debug!(
                        "loader was disposed during the load, not storing the instance"
                    );
                    Ok(instance)
                }
                Err(e) => {
                    tracing::warn!("editor library failed to load: {}", e);
                    Err(e)
                }
            }
        };
        sender.send_replace(Some(outcome));
    }

    fn settle_now(
        state: &mut ProcessState<M>,
        result: Result<Arc<M>, LoadError>,
    ) -> CancelableTask<M> {
        let result = result.map(|instance| state.store_instance(instance));
        let (_, outcome) = watch::channel(Some(result));
        state.is_initialized = true;
        state.pending = Some(outcome.clone());
        CancelableTask::new(outcome)
    }
}
