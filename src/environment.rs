//! Seams to the embedding environment
//!
//! The loader never touches a DOM directly. An `Environment` knows how to look
//! for an already-present global instance and how to inject a script element,
//! and a `Bootstrap` drives the library's own AMD module loader once its
//! `loader.js` has run.

use crate::config::{LoaderConfig, LOADER_SCRIPT};
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Arc;

/// The editor library object handed to callers.
pub trait LibraryInstance: Send + Sync + 'static {
    /// Presence check for the `editor` namespace.
    ///
    /// A global instance that reports `false` here is not adopted.
    fn has_editor(&self) -> bool {
        true
    }
}

/// A script element to inject into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub src: String,
    pub nonce: Option<String>,
}

impl Script {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            nonce: None,
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// The library's loader script, as described by `config`.
    pub fn loader(config: &LoaderConfig) -> anyhow::Result<Self> {
        let src = config
            .loader_script_url()
            .ok_or_else(|| anyhow!("`paths.vs` is not set, cannot locate {}", LOADER_SCRIPT))?;

        let script = Self::new(src);
        Ok(match config.csp_nonce() {
            Some(nonce) => script.with_nonce(nonce),
            None => script,
        })
    }
}

/// What `vs/editor/editor.main` resolved to.
///
/// Some library releases export the API directly, others wrap it in an `m`
/// member. Either way the caller gets the same instance.
#[derive(Debug)]
pub enum MainModule<M> {
    Direct(Arc<M>),
    Namespaced { m: Arc<M> },
}

impl<M> MainModule<M> {
    pub fn into_instance(self) -> Arc<M> {
        match self {
            MainModule::Direct(instance) => instance,
            MainModule::Namespaced { m } => m,
        }
    }
}

/// Host environment (a browser document, or a test double)
#[async_trait]
pub trait Environment<M: LibraryInstance>: Send + Sync {
    /// A library instance already installed globally by someone else.
    fn global_instance(&self) -> Option<Arc<M>>;

    /// Append `script` to the document and wait for its load or error event.
    ///
    /// # Errors
    ///
    /// Returns the script's error event when the script fails to load.
    async fn inject_script(&self, script: Script) -> anyhow::Result<()>;
}

/// The library's own module loader (`require.config` + `require([...])`)
#[async_trait]
pub trait Bootstrap<M: LibraryInstance>: Send + Sync {
    /// Configure the module loader with `config` and resolve the main editor
    /// module.
    ///
    /// # Errors
    ///
    /// Returns whatever the module loader reports through its error callback.
    async fn require_main(&self, config: &LoaderConfig) -> anyhow::Result<MainModule<M>>;
}
