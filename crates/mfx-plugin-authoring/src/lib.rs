//! Helpers for exporting OpenMfx mesh effect plug-ins with safe Rust wrappers.

mod attribute;
mod author;
pub mod export;
mod runtime;

pub use attribute::{copy_attribute, AttributeBuffer, ComponentType};
pub use author::{Plugin, PluginDescriptor, PluginFactory, Reply};
pub use runtime::{
    Attribute, Effect, Input, Mesh, MeshCounts, Param, Properties, Runtime, SuiteError,
    SuiteResult,
};

pub use mfx_sys as ffi;
