use std::ffi::CStr;

use anyhow::Result;
use mfx_sys::{kOfxStatOK, kOfxStatReplyDefault, OfxStatus};

use crate::runtime::{Effect, Runtime};

/// Identity of a plug-in exported from a bundle.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    pub identifier: &'static CStr,
    pub version: (u32, u32),
}

/// Non-error reply of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    /// The plug-in does not handle the action and lets the host do its default.
    Default,
}

impl Reply {
    pub fn status(self) -> OfxStatus {
        match self {
            Reply::Ok => kOfxStatOK,
            Reply::Default => kOfxStatReplyDefault,
        }
    }
}

/// One mesh effect. The same value serves the descriptor and every instance, so per-instance
/// state has to live in the effect's properties or behind interior mutability.
///
/// Errors are reported to the host as the status of a [`SuiteError`](crate::SuiteError) when
/// the error is one, and as `kOfxStatFailed` otherwise.
pub trait Plugin: Send + Sync + 'static {
    fn load(&self, _runtime: &Runtime) -> Result<()> {
        Ok(())
    }

    fn unload(&self) {}

    fn describe(&self, effect: Effect<'_>) -> Result<()>;

    fn create_instance(&self, _effect: Effect<'_>) -> Result<()> {
        Ok(())
    }

    fn destroy_instance(&self, _effect: Effect<'_>) -> Result<()> {
        Ok(())
    }

    /// Name of the input to pass through unchanged, or `None` when the effect must cook.
    fn is_identity(&self, _effect: Effect<'_>) -> Result<Option<&'static CStr>> {
        Ok(None)
    }

    fn cook(&self, effect: Effect<'_>) -> Result<Reply>;
}

pub trait PluginFactory: 'static {
    fn descriptors() -> &'static [PluginDescriptor];
    fn new_plugin(identifier: &CStr) -> Result<Box<dyn Plugin>>;
}
