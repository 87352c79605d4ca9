//! Host runtime for OpenMfx mesh effect plug-ins: the property, parameter and mesh model the
//! suites operate on, the lifecycle driver and the bundle cache.

mod attributes;
mod error;
mod host;
mod inputs;
mod manager;
mod mesh;
mod mesh_effect;
mod parameters;
mod properties;
mod registry;
pub mod suites;
#[cfg(test)]
mod testing;

pub use attributes::{
    Attachment, Attribute, AttributeData, AttributeDefinition, AttributeSemantic, AttributeSet,
    AttributeStorage, AttributeType, OwnedBuffer,
};
pub use error::{ActionError, HostError, MfxError, StatusCode};
pub use host::{Host, HostHooks, HostOptions, Identity, NoHooks};
pub use inputs::{Input, InputSet};
pub use manager::PluginRegistryManager;
pub use mesh::{ElementCounts, Mesh};
pub use mesh_effect::{AbortHandle, EffectState, MeshEffect, MessageType, PersistentMessage};
pub use parameters::{Parameter, ParameterSet, ParameterType, ParameterValue, ValueKind};
pub use properties::{Property, PropertyContext, PropertySet, PropertyType, RawPointer, Value};
pub use registry::{PluginHandle, PluginRegistry, PluginStatus};

/// Re-export the raw bindings for users that need to drop down to the ABI.
pub use mfx_sys as ffi;
