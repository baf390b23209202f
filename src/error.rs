//! Load-time errors
//!
//! Every waiter on the same load observes the same `LoadError`, so the type is
//! cheap to clone: collaborator failures are kept behind an `Arc`.

use std::fmt;
use std::sync::Arc;

/// Marker type reported by a handle that was canceled before it resolved.
pub const CANCELATION_TYPE: &str = "cancelation";

/// Message carried by the cancellation marker.
pub const CANCELATION_MESSAGE: &str = "operation is manually canceled";

/// Failure observed by a caller waiting on the editor library.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// The injected loader script fired its error event.
    ScriptLoadFailure(Arc<anyhow::Error>),
    /// The library's module loader failed to resolve the main editor module.
    BootstrapFailure(Arc<anyhow::Error>),
    /// This handle was canceled before the load succeeded.
    Cancellation,
    /// The load task stopped without producing an outcome.
    Abandoned,
}

impl LoadError {
    pub fn script(err: anyhow::Error) -> Self {
        LoadError::ScriptLoadFailure(Arc::new(err))
    }

    pub fn bootstrap(err: anyhow::Error) -> Self {
        LoadError::BootstrapFailure(Arc::new(err))
    }

    /// True for the cancellation signal, which callers usually ignore.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, LoadError::Cancellation)
    }

    /// Short machine-readable tag for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::ScriptLoadFailure(_) => "script",
            LoadError::BootstrapFailure(_) => "bootstrap",
            LoadError::Cancellation => CANCELATION_TYPE,
            LoadError::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::ScriptLoadFailure(err) => write!(f, "failed to load loader script: {err}"),
            LoadError::BootstrapFailure(err) => {
                write!(f, "failed to resolve the editor main module: {err}")
            }
            LoadError::Cancellation => f.write_str(CANCELATION_MESSAGE),
            LoadError::Abandoned => f.write_str("the load ended without producing an instance"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::ScriptLoadFailure(err) | LoadError::BootstrapFailure(err) => Some(&***err),
            LoadError::Cancellation | LoadError::Abandoned => None,
        }
    }
}
