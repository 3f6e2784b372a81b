//! Native library discovery and loading.
//!
//! Libraries are loaded from packaged bytes (staged to a temporary file first) and
//! from the search paths named in [`LoaderConfig`]. [`load_at_startup`] performs this
//! once per process unless configuration disables it.

pub mod config;
pub mod loader;
pub mod startup;

pub use config::LoaderConfig;
pub use loader::{LoadedLibrary, NativeLibLoader, PackagedLibrary};
pub use startup::load_at_startup;
