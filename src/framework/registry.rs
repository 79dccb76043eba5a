use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use thiserror::Error;
use tracing::{debug, warn};


/// Body of a registered test case. Returns whether the case passed.
pub type TestBody = extern "C" fn() -> bool;

#[derive(Debug, Error, PartialEq)]
pub enum RegistrationError {
    #[error("test case name is missing")]
    MissingName,
    #[error("test case name is not valid UTF-8")]
    InvalidName,
    #[error("test case `{0}` has no body")]
    MissingBody(String),
    #[error("test case `{0}` is already registered")]
    Duplicate(String),
}

#[derive(Clone, Debug)]
pub struct TestCase {
    pub name: String,
    pub body: TestBody,
}

/// Test cases in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    pub fn register(&mut self, name: &str, body: TestBody) -> Result<(), RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::MissingName);
        }
        if self.cases.iter().any(|tc| tc.name == name) {
            return Err(RegistrationError::Duplicate(name.to_owned()));
        }
        self.cases.push(TestCase { name: name.to_owned(), body });
        Ok(())
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn clear(&mut self) {
        self.cases.clear();
    }
}

lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(Registry::default());
}

/// Locks the process-wide registry. Never hold the guard while calling into a
/// test library, it registers through the same lock.
pub fn global() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

fn register_raw(name: *const c_char, body: Option<TestBody>) -> Result<(), RegistrationError> {
    if name.is_null() {
        return Err(RegistrationError::MissingName);
    }
    // SAFETY: caller passes a NUL-terminated string that outlives this call
    let name = unsafe { CStr::from_ptr(name) }.to_str().map_err(|_| RegistrationError::InvalidName)?;
    let body = body.ok_or_else(|| RegistrationError::MissingBody(name.to_owned()))?;
    global().register(name, body)?;
    debug!(name, "test case registered");
    Ok(())
}

/// Registration hook for test libraries, called from their `init_unit_test`.
#[no_mangle]
pub extern "C" fn unit_test_register(name: *const c_char, body: Option<TestBody>) -> bool {
    match register_raw(name, body) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "rejected test case registration");
            false
        }
    }
}
