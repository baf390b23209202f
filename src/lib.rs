// Monaco loader library - loads the editor once and shares the instance

pub mod cancelable;
pub mod config;
pub mod environment;
pub mod error;
pub mod loader;
pub mod state;

pub use cancelable::{CancelHandle, CancelableTask};
pub use config::{ConfigError, LoaderConfig};
pub use environment::{Bootstrap, Environment, LibraryInstance, MainModule, Script};
pub use error::LoadError;
pub use loader::Loader;
pub use state::{LoaderPhase, ProcessState};
