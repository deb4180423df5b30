//! Socket Subsystem Lifecycle
//!
//! Process-wide setup and teardown, called once by the hosting application
//! at startup and shutdown.
//!
//! On unix, [`initialize`] ignores `SIGPIPE` so that writing to a connection
//! the peer has closed surfaces as a `TransmitError` instead of terminating
//! the process. [`clean_up`] restores the previous disposition. Windows
//! socket startup is performed by the socket layer on first use.

use entities_socket::Result;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(unix)]
use std::sync::atomic::AtomicUsize;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
static PREVIOUS_SIGPIPE: AtomicUsize = AtomicUsize::new(0);

/// Check if the socket subsystem has been initialized
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Prepare the process for socket use
///
/// Calling it again while initialized does nothing.
///
/// # Returns
/// * `Ok(())` - Subsystem ready
/// * `Err(CommunicationError)` - `OptionError` if the signal disposition could not be changed
pub fn initialize() -> Result<()> {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    #[cfg(unix)]
    {
        match set_sigpipe(libc::SIG_IGN) {
            Ok(previous) => PREVIOUS_SIGPIPE.store(previous, Ordering::Release),
            Err(err) => {
                INITIALIZED.store(false, Ordering::Release);
                return Err(err);
            }
        }
    }

    debug!("socket subsystem initialized");
    Ok(())
}

/// Release process-wide socket state
///
/// Calling it while not initialized does nothing.
pub fn clean_up() -> Result<()> {
    if !INITIALIZED.swap(false, Ordering::AcqRel) {
        return Ok(());
    }

    #[cfg(unix)]
    set_sigpipe(PREVIOUS_SIGPIPE.load(Ordering::Acquire))?;

    debug!("socket subsystem cleaned up");
    Ok(())
}

#[cfg(unix)]
fn set_sigpipe(handler: libc::sighandler_t) -> Result<libc::sighandler_t> {
    use entities_socket::{CommunicationError, ErrorKind};

    // SAFETY: SIG_IGN, SIG_DFL and a previously returned disposition are all
    // valid handlers for SIGPIPE.
    let previous = unsafe { libc::signal(libc::SIGPIPE, handler) };
    if previous == libc::SIG_ERR {
        return Err(CommunicationError::with_host_error(
            ErrorKind::Option,
            "Set of SIGPIPE disposition failed (signal())",
            std::io::Error::last_os_error(),
        ));
    }
    Ok(previous)
}
