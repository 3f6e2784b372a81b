//! Process-wide, run-once library loading.

use std::sync::OnceLock;

use zerobridge_common::{Result, error::Error};

use crate::{
    config::LoaderConfig,
    loader::{NativeLibLoader, PackagedLibrary},
};

struct Startup {
    // Holds the libraries loaded at startup for the rest of the process.
    _loader: NativeLibLoader,
    outcome: std::result::Result<usize, String>,
}

static STARTUP: OnceLock<Startup> = OnceLock::new();

/// Loads `packaged` and the libraries named by the process environment, once per
/// process. Later calls return the first call's outcome without loading anything.
///
/// Does nothing when [`LOAD_AT_STARTUP_VAR`](crate::config::LOAD_AT_STARTUP_VAR) is
/// set to anything other than `true`.
///
/// Returns the number of libraries loaded by the first call.
pub fn load_at_startup(packaged: &[PackagedLibrary]) -> Result<usize> {
    let startup = STARTUP.get_or_init(|| run(&LoaderConfig::from_env(), packaged));
    startup
        .outcome
        .clone()
        .map_err(|message| Error::invalid_operation(format!("startup load failed: {message}")))
}

fn run(config: &LoaderConfig, packaged: &[PackagedLibrary]) -> Startup {
    let mut loader = NativeLibLoader::new();
    if !config.load_at_startup {
        log::info!("native library loading at startup is disabled");
        return Startup {
            _loader: loader,
            outcome: Ok(0),
        };
    }
    let outcome = loader.load_libs(config, packaged).map_err(|e| {
        log::error!("native library loading at startup failed: {e}");
        e.to_string()
    });
    Startup {
        _loader: loader,
        outcome,
    }
}
