use std::process::Command;

use zerobridge_loader::{PackagedLibrary, load_at_startup};
use zerobridge_testkit::lib_dirs::{LibDir, system_library_path};

const CHILD_LIBRARY_VAR: &str = "ZEROBRIDGE_TEST_STARTUP_LIBRARY";
const STAGED_NAME: &str = "libzbstartup";

/// Runs only inside the child process spawned by
/// `test_startup_leaves_no_staged_file_after_exit`.
#[test]
fn startup_child_loads_packaged_library() {
    let Some(library) = std::env::var_os(CHILD_LIBRARY_VAR) else {
        return;
    };
    let bytes: &'static [u8] = Box::leak(std::fs::read(library).unwrap().into_boxed_slice());
    let loaded = load_at_startup(&[PackagedLibrary {
        name: STAGED_NAME,
        bytes,
    }])
    .unwrap();
    assert_eq!(loaded, 1);
}

#[test]
fn test_startup_leaves_no_staged_file_after_exit() {
    let Some(system_lib) = system_library_path() else {
        return;
    };
    let scratch = LibDir::new().unwrap();

    let status = Command::new(std::env::current_exe().unwrap())
        .args([
            "startup_child_loads_packaged_library",
            "--exact",
            "--test-threads=1",
        ])
        .env(CHILD_LIBRARY_VAR, &system_lib)
        .env("TMPDIR", scratch.path())
        .env("ZEROBRIDGE_LOAD_NATIVE_LIBS_AT_STARTUP", "true")
        .env_remove("ZEROBRIDGE_NATIVE_LIBS_DIRS")
        .status()
        .unwrap();
    assert!(status.success());

    let leftovers: Vec<_> = std::fs::read_dir(scratch.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name.to_string_lossy().starts_with(STAGED_NAME))
        .collect();
    assert!(leftovers.is_empty(), "staged files left behind: {leftovers:?}");
}
