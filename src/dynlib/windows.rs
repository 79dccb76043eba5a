use std::cell::RefCell;
use std::ffi::c_void;
use std::ptr::NonNull;

use libloading::os::windows::{Library, Symbol};
use tracing::{debug, warn};

use super::{check_symbol_name, DynLibApi};


pub type LibraryHandle = Library;

/// `LoadLibrary`/`GetProcAddress`/`FreeLibrary` backend.
#[derive(Debug, Default)]
pub struct WindowsLoader {
    last_error: RefCell<Option<String>>,
}

impl WindowsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, err: Option<String>) {
        *self.last_error.borrow_mut() = err;
    }
}

impl DynLibApi for WindowsLoader {
    type Handle = LibraryHandle;

    fn open(&mut self, path: &str) -> Option<Library> {
        self.record(None);
        // SAFETY: running DllMain is what loading the library means
        match unsafe { Library::new(path) } {
            Ok(lib) => {
                debug!(path, "library mapped");
                Some(lib)
            }
            Err(err) => {
                self.record(Some(err.to_string()));
                None
            }
        }
    }

    fn locate_raw(&self, handle: &Library, name: &str) -> Option<NonNull<c_void>> {
        if let Err(err) = check_symbol_name(name) {
            self.record(Some(err));
            return None;
        }
        self.record(None);
        let lookup: Result<Symbol<*mut c_void>, _> = unsafe { handle.get(name.as_bytes()) };
        match lookup {
            Ok(sym) => {
                let addr = NonNull::new(*sym);
                if addr.is_none() {
                    self.record(Some(format!("{}: symbol resolves to a null address", name)));
                }
                addr
            }
            Err(err) => {
                self.record(Some(err.to_string()));
                None
            }
        }
    }

    fn close(&mut self, handle: Library) {
        self.record(None);
        if let Err(err) = handle.close() {
            warn!(error = %err, "FreeLibrary failed");
            self.record(Some(err.to_string()));
        }
    }

    fn error(&self) -> String {
        self.last_error.borrow().clone().unwrap_or_default()
    }
}
