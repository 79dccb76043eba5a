//! Scoped merge of standard error into standard output.

use std::io::{self, Write};
use std::os::raw::c_int;

use tracing::warn;


const STDOUT_FD: c_int = 1;
const STDERR_FD: c_int = 2;

/// While alive, everything written to stderr ends up on stdout. The original
/// stderr is restored on drop.
#[derive(Debug)]
pub struct StderrToStdout {
    saved: c_int,
}

impl StderrToStdout {
    pub fn engage() -> io::Result<Self> {
        io::stderr().flush()?;
        let saved = unsafe { libc::dup(STDERR_FD) };
        if saved < 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::dup2(STDOUT_FD, STDERR_FD) } < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(saved) };
            return Err(err);
        }
        Ok(StderrToStdout { saved })
    }
}

impl Drop for StderrToStdout {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        if unsafe { libc::dup2(self.saved, STDERR_FD) } < 0 {
            warn!(error = %io::Error::last_os_error(), "could not restore stderr");
        }
        unsafe { libc::close(self.saved) };
    }
}
