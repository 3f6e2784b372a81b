//! Loading native libraries from files, directories and packaged bytes.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use libloading::Library;
use tempfile::TempPath;
use zerobridge_common::{Result, error::Error};

use crate::config::LoaderConfig;

/// Library bytes shipped inside the application, e.g. via `include_bytes!`.
#[derive(Debug, Clone, Copy)]
pub struct PackagedLibrary {
    /// File name of the library; the staged copy is named after it.
    pub name: &'static str,
    pub bytes: &'static [u8],
}

/// A library kept loaded for as long as this value lives.
#[derive(Debug)]
pub struct LoadedLibrary {
    // Declared first so it is unloaded before a kept staged file is removed.
    library: Library,
    path: PathBuf,
    staged: bool,
    // Staged file that could not be removed while the library is loaded.
    _staged_file: Option<TempPath>,
}

impl LoadedLibrary {
    /// The file the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the library was staged from packaged bytes.
    ///
    /// On unix the staged file is removed as soon as the library is mapped, so
    /// [`path`](LoadedLibrary::path) no longer exists afterwards.
    pub fn is_staged(&self) -> bool {
        self.staged
    }

    pub fn library(&self) -> &Library {
        &self.library
    }
}

/// Loads native libraries and keeps them resident.
#[derive(Debug, Default)]
pub struct NativeLibLoader {
    libraries: Vec<LoadedLibrary>,
}

impl NativeLibLoader {
    pub fn new() -> NativeLibLoader {
        NativeLibLoader::default()
    }

    /// Loads every packaged library, then every configured search path.
    /// Returns the number of libraries loaded.
    pub fn load_libs(
        &mut self,
        config: &LoaderConfig,
        packaged: &[PackagedLibrary],
    ) -> Result<usize> {
        let before = self.libraries.len();
        for lib in packaged {
            self.load_packaged(lib)?;
        }
        for path in &config.search_paths {
            self.load_path(path)?;
        }
        Ok(self.libraries.len() - before)
    }

    /// Loads the library at `path`, or every file directly inside it if `path` is a
    /// directory. Subdirectories are not descended into. A path that does not exist
    /// is skipped.
    ///
    /// Returns the number of libraries loaded.
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            log::debug!("skipping missing native library path {}", path.display());
            return Ok(0);
        }
        if !path.is_dir() {
            self.load_file(path)?;
            return Ok(1);
        }

        let entries =
            std::fs::read_dir(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(path.display().to_string(), e))?;
            let entry_path = entry.path();
            if entry_path.is_file() {
                files.push(entry_path);
            }
        }
        files.sort();
        for file in &files {
            self.load_file(file)?;
        }
        Ok(files.len())
    }

    /// Loads a single library file.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let library = open_library(path)?;
        log::info!("loaded native library {}", path.display());
        self.libraries.push(LoadedLibrary {
            library,
            path: path.to_path_buf(),
            staged: false,
            _staged_file: None,
        });
        Ok(())
    }

    /// Writes packaged library bytes to a temporary file named after the library and
    /// loads it from there.
    ///
    /// On unix the file is unlinked right after loading; the mapping stays valid, and
    /// nothing is left behind even if the loader is never dropped. Elsewhere the file
    /// is locked while loaded and is removed when the library is unloaded.
    pub fn load_packaged(&mut self, lib: &PackagedLibrary) -> Result<()> {
        if lib.bytes.is_empty() {
            return Err(Error::invalid_arg(
                "bytes",
                format!("packaged library {} is empty", lib.name),
            ));
        }
        let mut staged = tempfile::Builder::new()
            .prefix(lib.name)
            .tempfile()
            .map_err(|e| {
                Error::io(
                    format!(
                        "staging native library {}; if temporary files are unavailable, \
                         install the library manually and list its path in {}",
                        lib.name,
                        crate::config::NATIVE_LIBS_DIRS_VAR
                    ),
                    e,
                )
            })?;
        staged
            .write_all(lib.bytes)
            .and_then(|()| staged.flush())
            .map_err(|e| Error::io(format!("staging native library {}", lib.name), e))?;
        let staged = staged.into_temp_path();

        let library = open_library(&staged)?;
        log::info!(
            "loaded packaged native library {} from {}",
            lib.name,
            staged.display()
        );
        let path = staged.to_path_buf();
        let staged_file = release_staged_file(staged);
        self.libraries.push(LoadedLibrary {
            library,
            path,
            staged: true,
            _staged_file: staged_file,
        });
        Ok(())
    }

    pub fn libraries(&self) -> &[LoadedLibrary] {
        &self.libraries
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

#[cfg(unix)]
fn release_staged_file(staged: TempPath) -> Option<TempPath> {
    let path = staged.to_path_buf();
    if let Err(e) = staged.close() {
        log::warn!(
            "failed to remove staged native library {}: {e}",
            path.display()
        );
    }
    None
}

#[cfg(not(unix))]
fn release_staged_file(staged: TempPath) -> Option<TempPath> {
    Some(staged)
}

fn open_library(path: &Path) -> Result<Library> {
    // SAFETY: loading runs the library's initializers; callers only point the loader
    // at libraries they trust.
    unsafe { Library::new(path) }.map_err(|e| Error::load(path, e))
}
