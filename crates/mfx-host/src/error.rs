use std::fmt;
use std::path::PathBuf;

use mfx_sys::*;
use thiserror::Error;

use crate::mesh_effect::EffectState;

/// Failure of a suite-level operation. Each variant maps onto exactly one non-OK status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MfxError {
    #[error("operation failed")]
    Failed,
    #[error("fatal error")]
    Fatal,
    #[error("unknown name or handle")]
    Unknown,
    #[error("missing host feature")]
    MissingHostFeature,
    #[error("unsupported operation")]
    Unsupported,
    #[error("entry already exists")]
    Exists,
    #[error("bad format")]
    Format,
    #[error("out of memory")]
    Memory,
    #[error("bad handle")]
    BadHandle,
    #[error("bad index")]
    BadIndex,
    #[error("bad value")]
    Value,
}

impl MfxError {
    pub fn status(self) -> OfxStatus {
        match self {
            MfxError::Failed => kOfxStatFailed,
            MfxError::Fatal => kOfxStatErrFatal,
            MfxError::Unknown => kOfxStatErrUnknown,
            MfxError::MissingHostFeature => kOfxStatErrMissingHostFeature,
            MfxError::Unsupported => kOfxStatErrUnsupported,
            MfxError::Exists => kOfxStatErrExists,
            MfxError::Format => kOfxStatErrFormat,
            MfxError::Memory => kOfxStatErrMemory,
            MfxError::BadHandle => kOfxStatErrBadHandle,
            MfxError::BadIndex => kOfxStatErrBadIndex,
            MfxError::Value => kOfxStatErrValue,
        }
    }

    /// Parses a status returned across the ABI. `OK` and the three replies are not errors.
    pub fn from_status(status: OfxStatus) -> Option<Self> {
        Some(match status {
            kOfxStatFailed => MfxError::Failed,
            kOfxStatErrFatal => MfxError::Fatal,
            kOfxStatErrUnknown => MfxError::Unknown,
            kOfxStatErrMissingHostFeature => MfxError::MissingHostFeature,
            kOfxStatErrUnsupported => MfxError::Unsupported,
            kOfxStatErrExists => MfxError::Exists,
            kOfxStatErrFormat => MfxError::Format,
            kOfxStatErrMemory => MfxError::Memory,
            kOfxStatErrBadHandle => MfxError::BadHandle,
            kOfxStatErrBadIndex => MfxError::BadIndex,
            kOfxStatErrValue => MfxError::Value,
            _ => return None,
        })
    }
}

/// Collapses a suite result into the status code handed back to the plug-in.
pub(crate) fn into_status(result: Result<(), MfxError>) -> OfxStatus {
    match result {
        Ok(()) => kOfxStatOK,
        Err(err) => err.status(),
    }
}

/// Status code rendered by its symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub OfxStatus);

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(status_name(self.0))
    }
}

/// Errors raised while driving a plug-in through its lifecycle actions.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("plug-in '{plugin}' failed {action} with {status}")]
    Rejected {
        plugin: String,
        action: &'static str,
        status: StatusCode,
    },
    #[error("plug-in '{plugin}' replied {status} to {action}, which is not a legal reply")]
    ProtocolViolation {
        plugin: String,
        action: &'static str,
        status: StatusCode,
    },
    #[error("cannot dispatch {action} to an effect in state {state:?}")]
    InvalidState {
        action: &'static str,
        state: EffectState,
    },
    #[error("plug-in '{0}' is disabled after a failed load or a fatal reply")]
    PluginDisabled(String),
    #[error("effect is not attached to a plug-in")]
    MissingPlugin,
}

/// Errors that can occur while opening a plug-in bundle.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("plug-in bundle not found at {}", .0.display())]
    MissingBinary(PathBuf),
    #[error("failed to load plug-in bundle: {0}")]
    LibraryLoad(#[from] libloading::Error),
    #[error("bundle {} does not export {symbol}", .path.display())]
    MissingSymbol { path: PathBuf, symbol: &'static str },
}
