//! mirror-daemon library: exposes internal modules for testing.
//!
//! This is a thin library layer over the daemon components, allowing
//! integration tests to access internal types.

pub mod auth;
pub mod prompt;
pub mod translator;
pub mod watcher;

// Re-export key types for convenience
pub use prompt::Credentials;
pub use translator::Translator;
pub use watcher::{DirWatcher, WatchEvent};
