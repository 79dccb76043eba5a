//! Load a test library, let it register its tests, run them, unload it.

use std::mem::ManuallyDrop;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dynlib::DynLibApi;
use crate::framework::TestFramework;


/// Export every test library has to provide.
pub const INIT_FUNC_NAME: &str = "init_unit_test";

/// Signature of [`INIT_FUNC_NAME`]: registers the library's tests, returns
/// whether that worked.
pub type InitFunc = unsafe extern "C" fn() -> bool;

/// Exit code for a library that could not be loaded or bootstrapped.
pub const EXIT_BOOTSTRAP_FAILURE: i32 = 3;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("fail to load test library {path}: {reason}")]
    LoadFailed { path: String, reason: String },
    #[error("can't locate test initialization function {symbol}: {reason}")]
    MissingEntryPoint { symbol: String, reason: String },
}

impl DriverError {
    pub fn exit_code(&self) -> i32 {
        EXIT_BOOTSTRAP_FAILURE
    }
}

/// Owns the open library for one run. Dropping it clears the framework and
/// closes the handle, also when the run loop unwinds.
struct LoadedSuite<'a, L: DynLibApi, F: TestFramework> {
    loader: &'a mut L,
    framework: &'a mut F,
    handle: ManuallyDrop<L::Handle>,
}

impl<L: DynLibApi, F: TestFramework> LoadedSuite<'_, L, F> {
    fn run(&mut self, framework_args: &[String]) -> Result<i32, DriverError> {
        let init = match unsafe { self.loader.locate_symbol::<InitFunc>(&*self.handle, INIT_FUNC_NAME) } {
            Some(init) => init,
            None => {
                return Err(DriverError::MissingEntryPoint {
                    symbol: INIT_FUNC_NAME.to_owned(),
                    reason: self.loader.error(),
                })
            }
        };

        let mut init_suite = || {
            // SAFETY: the symbol was requested with the signature test libraries export it with
            let registered = unsafe { (*init)() };
            if !registered {
                warn!(symbol = init.name(), "test library reported a registration failure");
            }
            registered
        };
        Ok(self.framework.run(&mut init_suite, framework_args))
    }
}

impl<L: DynLibApi, F: TestFramework> Drop for LoadedSuite<'_, L, F> {
    fn drop(&mut self) {
        self.framework.clear();
        // SAFETY: drop runs once and the handle is not touched afterwards
        let handle = unsafe { ManuallyDrop::take(&mut self.handle) };
        self.loader.close(handle);
        debug!("test library closed");
    }
}

/// Runs one load, initialize, run, teardown cycle for the library at
/// `lib_path` and returns the run loop's exit code.
pub fn run_suite<L, F>(loader: &mut L, framework: &mut F, lib_path: &str, framework_args: &[String]) -> Result<i32, DriverError>
    where L: DynLibApi,
          F: TestFramework,
{
    let handle = match loader.open(lib_path) {
        Some(handle) => handle,
        None => {
            return Err(DriverError::LoadFailed {
                path: lib_path.to_owned(),
                reason: loader.error(),
            })
        }
    };
    info!(path = lib_path, "test library loaded");

    let mut suite = LoadedSuite {
        loader,
        framework,
        handle: ManuallyDrop::new(handle),
    };
    suite.run(framework_args)
}
