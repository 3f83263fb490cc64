//! Input injection behind a pluggable backend.
//!
//! [`InputBackend`] is the seam the repeat loop talks to. [`ActionSender`]
//! picks the concrete backend from [`Backend`] and fails at construction
//! when that backend cannot work here, so a run never dies halfway for
//! that reason.

mod enigo_backend;
#[cfg(windows)]
mod scancode;

pub use enigo_backend::EnigoBackend;
#[cfg(windows)]
pub use scancode::ScanCodeBackend;

use tracing::debug;

use crate::capabilities::Capabilities;
use crate::config::{Action, Backend};
use crate::error::{RepeatError, Result};

/// Press, release and tap primitives for one key or mouse button.
///
/// Calls are fire-and-forget: `Ok` means the OS accepted the event, not
/// that any application received it.
pub trait InputBackend {
    fn down(&mut self, action: &Action) -> Result<()>;
    fn up(&mut self, action: &Action) -> Result<()>;
    /// Press and release as one step.
    fn tap(&mut self, action: &Action) -> Result<()>;
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn down(&mut self, action: &Action) -> Result<()> {
        (**self).down(action)
    }

    fn up(&mut self, action: &Action) -> Result<()> {
        (**self).up(action)
    }

    fn tap(&mut self, action: &Action) -> Result<()> {
        (**self).tap(action)
    }
}

/// The backend selected for a run.
pub struct ActionSender {
    inner: Box<dyn InputBackend>,
}

impl ActionSender {
    pub fn new(backend: Backend, caps: &Capabilities) -> Result<Self> {
        let inner: Box<dyn InputBackend> = match backend {
            Backend::Primary => Box::new(EnigoBackend::new()?),
            Backend::Alternate => {
                if !caps.alternate_backend {
                    return Err(RepeatError::backend_unavailable(
                        backend.to_string(),
                        "scan-code injection is only available on Windows",
                    ));
                }
                alternate_backend()?
            }
        };
        debug!(%backend, "input backend ready");
        Ok(Self { inner })
    }
}

impl InputBackend for ActionSender {
    fn down(&mut self, action: &Action) -> Result<()> {
        self.inner.down(action)
    }

    fn up(&mut self, action: &Action) -> Result<()> {
        self.inner.up(action)
    }

    fn tap(&mut self, action: &Action) -> Result<()> {
        self.inner.tap(action)
    }
}

#[cfg(windows)]
fn alternate_backend() -> Result<Box<dyn InputBackend>> {
    Ok(Box::new(ScanCodeBackend::new()))
}

#[cfg(not(windows))]
fn alternate_backend() -> Result<Box<dyn InputBackend>> {
    Err(RepeatError::backend_unavailable(
        Backend::Alternate.to_string(),
        "scan-code injection is only available on Windows",
    ))
}

/// Whether [`Backend::Alternate`] can be constructed on this platform.
pub fn alternate_available() -> bool {
    cfg!(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternate_rejected_without_capability() {
        let result = ActionSender::new(Backend::Alternate, &Capabilities::none());
        match result {
            Err(RepeatError::BackendUnavailable { backend, .. }) => {
                assert_eq!(backend, "alternate");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("alternate backend should be unavailable"),
        }
    }

    #[test]
    #[cfg(not(windows))]
    fn test_alternate_unavailable_off_windows() {
        assert!(!alternate_available());
        let caps = Capabilities {
            alternate_backend: true,
            ..Capabilities::none()
        };
        // Even a capability registry that claims support cannot conjure it.
        assert!(ActionSender::new(Backend::Alternate, &caps).is_err());
    }
}
