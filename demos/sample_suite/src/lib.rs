//! Example test library for `console_test_runner`.
//!
//! Build with `cargo build -p sample_suite` and run
//! `console_test_runner target/debug/libsample_suite.so`.

use std::os::raw::c_char;

#[cfg(unix)]
use libloading::os::unix::{Library, Symbol};
#[cfg(windows)]
use libloading::os::windows::{Library, Symbol};


type TestBody = extern "C" fn() -> bool;
type RegisterFunc = unsafe extern "C" fn(*const c_char, Option<TestBody>) -> bool;

extern "C" fn addition_commutes() -> bool {
    (2 + 3) == (3 + 2)
}

extern "C" fn split_whitespace() -> bool {
    "load init run".split_whitespace().count() == 3
}

extern "C" fn checked_overflow() -> bool {
    u8::MAX.checked_add(1).is_none()
}

const CASES: &[(&[u8], TestBody)] = &[
    (b"addition_commutes\0", addition_commutes),
    (b"split_whitespace\0", split_whitespace),
    (b"checked_overflow\0", checked_overflow),
];

#[cfg(unix)]
fn host() -> Option<Library> {
    Some(Library::this())
}

#[cfg(windows)]
fn host() -> Option<Library> {
    Library::this().ok()
}

/// Registers this library's cases with the runner that loaded it.
#[no_mangle]
pub extern "C" fn init_unit_test() -> bool {
    let host = match host() {
        Some(host) => host,
        None => return false,
    };
    let register: Symbol<RegisterFunc> = match unsafe { host.get(b"unit_test_register\0") } {
        Ok(register) => register,
        Err(_) => return false,
    };
    CASES
        .iter()
        .all(|(name, body)| unsafe { register(name.as_ptr() as *const c_char, Some(*body)) })
}
