//! Mesh effect descriptors and instances.

use std::ffi::CStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use mfx_sys::*;

use crate::host::Host;
use crate::inputs::InputSet;
use crate::parameters::ParameterSet;
use crate::properties::{PropertyContext, PropertySet};
use crate::registry::PluginHandle;

/// Lifecycle position of an effect. Descriptors stop at `Described`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectState {
    Created,
    Described,
    Instantiated,
    Cooked,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// No message is set.
    Invalid,
    Fatal,
    Error,
    Warning,
    Message,
    Log,
    Question,
}

impl MessageType {
    pub fn from_cstr(name: &CStr) -> Option<Self> {
        [
            MessageType::Fatal,
            MessageType::Error,
            MessageType::Warning,
            MessageType::Message,
            MessageType::Log,
            MessageType::Question,
        ]
        .into_iter()
        .find(|kind| kind.as_cstr() == Some(name))
    }

    pub fn as_cstr(self) -> Option<&'static CStr> {
        match self {
            MessageType::Invalid => None,
            MessageType::Fatal => Some(kOfxMessageFatal),
            MessageType::Error => Some(kOfxMessageError),
            MessageType::Warning => Some(kOfxMessageWarning),
            MessageType::Message => Some(kOfxMessageMessage),
            MessageType::Log => Some(kOfxMessageLog),
            MessageType::Question => Some(kOfxMessageQuestion),
        }
    }

    /// Whether the embedding application must report the message as a failure.
    pub fn is_failure(self) -> bool {
        matches!(self, MessageType::Fatal | MessageType::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistentMessage {
    pub kind: MessageType,
    pub text: String,
}

impl Default for PersistentMessage {
    fn default() -> Self {
        Self {
            kind: MessageType::Invalid,
            text: String::new(),
        }
    }
}

/// Cooperative cancellation flag polled by plug-ins through the `abort` suite entry.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct MeshEffect {
    pub(crate) inputs: InputSet,
    pub(crate) properties: PropertySet,
    pub(crate) parameters: ParameterSet,
    pub(crate) message: PersistentMessage,
    pub(crate) state: EffectState,
    host: Weak<Host>,
    plugin: Option<PluginHandle>,
    abort: AbortHandle,
}

impl PartialEq for MeshEffect {
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs
            && self.properties == other.properties
            && self.parameters == other.parameters
    }
}

impl MeshEffect {
    /// Boxed so the parameter set's back-reference and the handles given to plug-ins stay put.
    pub fn new(host: Weak<Host>, plugin: Option<PluginHandle>) -> Box<Self> {
        let mut effect = Box::new(Self::unbound(host, plugin));
        effect.rebind();
        effect
    }

    /// Like [`MeshEffect::new`], but built directly in the allocation descriptors are shared
    /// from. The parameter set is bound once the caller has exclusive access.
    pub(crate) fn new_shared(host: Weak<Host>, plugin: Option<PluginHandle>) -> Arc<Self> {
        Arc::new(Self::unbound(host, plugin))
    }

    fn unbound(host: Weak<Host>, plugin: Option<PluginHandle>) -> Self {
        let mut properties = PropertySet::new(PropertyContext::MeshEffect);
        let _ = properties.set_string(kOfxMeshEffectPropContext, 0, kOfxMeshEffectContextFilter);
        Self {
            inputs: InputSet::new(),
            properties,
            parameters: ParameterSet::new(),
            message: PersistentMessage::default(),
            state: EffectState::Created,
            host,
            plugin,
            abort: AbortHandle::default(),
        }
    }

    /// Value copy of inputs, properties and parameters. The copy gets its own abort flag and an
    /// empty message slot.
    pub fn deep_copy(&self) -> Box<Self> {
        let mut effect = Box::new(Self {
            inputs: self.inputs.clone(),
            properties: self.properties.clone(),
            parameters: self.parameters.clone(),
            message: PersistentMessage::default(),
            state: EffectState::Created,
            host: self.host.clone(),
            plugin: self.plugin.clone(),
            abort: AbortHandle::default(),
        });
        effect.rebind();
        effect
    }

    pub(crate) fn rebind(&mut self) {
        let properties: *mut PropertySet = &mut self.properties;
        self.parameters.bind_effect_properties(properties);
    }

    /// Raw handle handed to the plug-in. Only dereferenced by the suites.
    pub fn handle(&mut self) -> OfxMeshEffectHandle {
        (self as *mut MeshEffect).cast()
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn plugin(&self) -> Option<&PluginHandle> {
        self.plugin.as_ref()
    }

    pub fn host(&self) -> &Weak<Host> {
        &self.host
    }

    pub fn inputs(&self) -> &InputSet {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut InputSet {
        &mut self.inputs
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.parameters
    }

    pub fn persistent_message(&self) -> Option<&PersistentMessage> {
        (self.message.kind != MessageType::Invalid).then_some(&self.message)
    }

    pub fn set_persistent_message(&mut self, kind: MessageType, text: String) {
        self.message = PersistentMessage { kind, text };
    }

    pub fn clear_persistent_message(&mut self) {
        self.message = PersistentMessage::default();
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parameters::{ParameterType, ParameterValue};

    fn descriptor() -> Box<MeshEffect> {
        let mut effect = MeshEffect::new(Weak::new(), None);
        let host = effect.host().clone();
        effect.inputs_mut().ensure(kOfxMeshMainInput, &host);
        effect.inputs_mut().ensure(kOfxMeshMainOutput, &host);
        effect
            .parameters_mut()
            .define(cstr!("Count"), ParameterType::Integer)
            .unwrap();
        effect
    }

    #[test]
    fn deep_copies_are_equal_and_independent() {
        let source = descriptor();
        let mut copy = source.deep_copy();
        assert_eq!(*copy, *source);

        copy.parameters_mut()
            .find_mut(cstr!("Count"))
            .unwrap()
            .set_value(ParameterValue::Integer(9))
            .unwrap();
        copy.inputs_mut()
            .find_mut(kOfxMeshMainInput)
            .unwrap()
            .properties_mut()
            .set_string(kOfxPropLabel, 0, cstr!("Source"))
            .unwrap();

        assert_ne!(*copy, *source);
        assert_eq!(
            source.parameters().find(cstr!("Count")).unwrap().value(),
            ParameterValue::Integer(0)
        );
        assert_eq!(source.inputs().find(kOfxMeshMainInput).unwrap().label(), None);
    }

    #[test]
    fn copies_point_at_their_own_properties() {
        let source = descriptor();
        let copy = source.deep_copy();
        assert_eq!(
            copy.parameters().effect_properties().cast_const(),
            &copy.properties as *const PropertySet
        );
        assert_ne!(
            copy.parameters().effect_properties(),
            source.parameters().effect_properties()
        );
    }

    #[test]
    fn abort_flags_are_not_shared_with_copies() {
        let source = descriptor();
        let copy = source.deep_copy();
        source.abort_handle().abort();
        assert!(source.abort_handle().is_aborted());
        assert!(!copy.abort_handle().is_aborted());
    }

    #[test]
    fn persistent_message_round_trip() {
        let mut effect = descriptor();
        assert_eq!(effect.persistent_message(), None);
        effect.set_persistent_message(MessageType::Warning, "careful".into());
        assert_eq!(
            effect.persistent_message(),
            Some(&PersistentMessage {
                kind: MessageType::Warning,
                text: "careful".into(),
            })
        );
        effect.clear_persistent_message();
        assert_eq!(effect.persistent_message(), None);
        assert_eq!(MessageType::from_cstr(kOfxMessageError), Some(MessageType::Error));
    }
}
