//! Portable access to the platform's dynamic loader.
//!
//! Exactly one backend is compiled in: `dlopen` and friends on unix targets,
//! `LoadLibrary` and friends on windows. Both expose the same [`DynLibApi`]
//! surface, re-exported here as [`NativeLoader`].

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::Deref;
use std::ptr::NonNull;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use self::unix::{LibraryHandle, PosixLoader as NativeLoader};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::{LibraryHandle, WindowsLoader as NativeLoader};

#[cfg(not(any(unix, windows)))]
compile_error!("dynamic library API is unknown for this target");


/// The four operations the bootstrap driver needs from a dynamic loader.
///
/// Failures are reported through `None` results. The reason of the most
/// recent failure is available from [`DynLibApi::error`] until the next call
/// on the same loader.
pub trait DynLibApi {
    /// Owned reference to a mapped library. Not `Clone`: closing consumes it.
    type Handle;

    /// Maps the library at `path` into the process. Static initializers of
    /// the library run before this returns.
    fn open(&mut self, path: &str) -> Option<Self::Handle>;

    /// Resolves `name` to its raw address.
    fn locate_raw(&self, handle: &Self::Handle, name: &str) -> Option<NonNull<c_void>>;

    /// Resolves `name` and reinterprets its address as `T`.
    ///
    /// # Safety
    ///
    /// `T` must be the exact function pointer type the library exports under
    /// `name`. Only the size of `T` can be checked here: requesting a type that
    /// is not pointer-sized panics.
    unsafe fn locate_symbol<'h, T: Copy>(&self, handle: &'h Self::Handle, name: &str) -> Option<Symbol<'h, T>> {
        assert_eq!(
            mem::size_of::<T>(),
            mem::size_of::<*mut c_void>(),
            "symbol `{}` requested as a type that is not pointer-sized",
            name,
        );
        let addr = self.locate_raw(handle, name)?;
        Some(Symbol {
            value: mem::transmute_copy::<*mut c_void, T>(&addr.as_ptr()),
            name: name.to_owned(),
            _handle: PhantomData,
        })
    }

    /// Unmaps the library. The handle is gone afterwards, so it can neither be
    /// closed twice nor used for further lookups.
    fn close(&mut self, handle: Self::Handle);

    /// Describes the most recent failure, or returns an empty string.
    fn error(&self) -> String;
}


/// Symbol names go to the native loader as C strings. Any NUL byte, trailing
/// ones included, makes the name unresolvable instead of silently cut short.
fn check_symbol_name(name: &str) -> Result<(), String> {
    match name.find('\0') {
        Some(pos) => Err(format!("{:?}: symbol name contains a NUL byte at offset {}", name, pos)),
        None => Ok(()),
    }
}


/// A resolved export, valid only while the handle it came from is borrowed.
pub struct Symbol<'h, T> {
    value: T,
    name: String,
    _handle: PhantomData<&'h ()>,
}

impl<T> Symbol<'_, T> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Deref for Symbol<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> fmt::Debug for Symbol<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Symbol").field("name", &self.name).finish()
    }
}


#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    extern "C" fn answer() -> u32 {
        42
    }

    struct StaticLoader {
        last_error: RefCell<String>,
    }

    impl DynLibApi for StaticLoader {
        type Handle = ();

        fn open(&mut self, _path: &str) -> Option<()> {
            Some(())
        }

        fn locate_raw(&self, _handle: &(), name: &str) -> Option<NonNull<c_void>> {
            if name == "answer" {
                NonNull::new(answer as extern "C" fn() -> u32 as *mut c_void)
            }
            else {
                *self.last_error.borrow_mut() = format!("undefined symbol: {}", name);
                None
            }
        }

        fn close(&mut self, _handle: ()) {}

        fn error(&self) -> String {
            self.last_error.borrow().clone()
        }
    }

    #[test]
    fn typed_lookup_calls_through() {
        let loader = StaticLoader { last_error: RefCell::new(String::new()) };
        let handle = ();
        let sym = unsafe { loader.locate_symbol::<extern "C" fn() -> u32>(&handle, "answer") }.unwrap();
        assert_eq!(sym.name(), "answer");
        assert_eq!((*sym)(), 42);
    }

    #[test]
    fn missing_symbol_leaves_error_text() {
        let loader = StaticLoader { last_error: RefCell::new(String::new()) };
        let found = unsafe { loader.locate_symbol::<extern "C" fn() -> u32>(&(), "question") };
        assert!(found.is_none());
        assert!(loader.error().contains("question"));
    }

    #[test]
    fn nul_bytes_in_names_are_refused() {
        assert!(check_symbol_name("strlen").is_ok());
        assert!(check_symbol_name("str\0len").unwrap_err().contains("offset 3"));
        assert!(check_symbol_name("init_unit_test\0").is_err());
    }

    #[test]
    #[should_panic(expected = "not pointer-sized")]
    fn wrongly_sized_type_is_rejected() {
        let loader = StaticLoader { last_error: RefCell::new(String::new()) };
        let _ = unsafe { loader.locate_symbol::<[usize; 2]>(&(), "answer") };
    }
}
