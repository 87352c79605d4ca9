//! Context-validated property storage.
//!
//! Every entity exchanged with a plug-in carries a [`PropertySet`]: an insertion-ordered list of
//! named properties, each holding up to four typed slots. Which `(name, type)` pairs are legal is
//! fixed by the set's [`PropertyContext`]; anything outside that schema is rejected with
//! [`MfxError::BadHandle`] before the set is touched.

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;

use mfx_sys::*;

use crate::error::MfxError;

/// Number of value slots carried by every property.
pub const PROPERTY_SLOTS: usize = 4;

/// Raw pointer stored in a property or handed across the ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPointer(pub *mut c_void);

// Pointers stored in property sets are opaque to the host: it never dereferences them, it only
// hands them back to whoever stored them.
unsafe impl Send for RawPointer {}
unsafe impl Sync for RawPointer {}

impl RawPointer {
    pub const fn null() -> Self {
        Self(ptr::null_mut())
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for RawPointer {
    fn default() -> Self {
        Self::null()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyContext {
    Host,
    MeshEffect,
    Input,
    Mesh,
    Param,
    Attrib,
    ActionIdentityIn,
    ActionIdentityOut,
    /// Unvalidated, kept for plug-ins written against older hosts.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Pointer,
    String,
    Double,
    Int,
}

/// One slot of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Pointer(RawPointer),
    Str(CString),
    Double(f64),
    Int(i32),
}

impl Value {
    pub fn kind(&self) -> PropertyType {
        match self {
            Value::Pointer(_) => PropertyType::Pointer,
            Value::Str(_) => PropertyType::String,
            Value::Double(_) => PropertyType::Double,
            Value::Int(_) => PropertyType::Int,
        }
    }

    pub fn as_pointer(&self) -> *mut c_void {
        match self {
            Value::Pointer(p) => p.0,
            _ => ptr::null_mut(),
        }
    }

    /// Numeric slots convert between int and double; anything else reads as zero.
    pub fn as_double(&self) -> f64 {
        match self {
            Value::Double(v) => *v,
            Value::Int(v) => f64::from(*v),
            _ => 0.0,
        }
    }

    pub fn as_int(&self) -> i32 {
        match self {
            Value::Int(v) => *v,
            Value::Double(v) => *v as i32,
            _ => 0,
        }
    }

    pub fn as_c_str(&self) -> &CStr {
        match self {
            Value::Str(s) => s.as_c_str(),
            _ => EMPTY,
        }
    }
}

const EMPTY: &CStr = mfx_sys::cstr!("");

pub(crate) fn slot_double(slot: &Option<Value>) -> f64 {
    slot.as_ref().map_or(0.0, Value::as_double)
}

pub(crate) fn slot_int(slot: &Option<Value>) -> i32 {
    slot.as_ref().map_or(0, Value::as_int)
}

pub(crate) fn slot_pointer(slot: &Option<Value>) -> *mut c_void {
    slot.as_ref().map_or(ptr::null_mut(), Value::as_pointer)
}

pub(crate) fn slot_str(slot: &Option<Value>) -> &CStr {
    slot.as_ref().map_or(EMPTY, Value::as_c_str)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: CString,
    values: [Option<Value>; PROPERTY_SLOTS],
}

impl Property {
    fn new(name: &CStr) -> Self {
        Self {
            name: name.to_owned(),
            values: Default::default(),
        }
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn values(&self) -> &[Option<Value>; PROPERTY_SLOTS] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }
}

type Schema = &'static [(&'static CStr, PropertyType)];

use PropertyType::{Double as D, Int as I, Pointer as P, String as S};

const HOST_SCHEMA: Schema = &[
    (kOfxHostPropBeforeMeshReleaseCb, P),
    (kOfxHostPropBeforeMeshGetCb, P),
    (kOfxHostPropBeforeMeshAllocateCb, P),
    (kOfxMeshPropHostHandle, P),
];

const MESH_EFFECT_SCHEMA: Schema = &[(kOfxMeshEffectPropContext, S), (kOfxPropLabel, S)];

const INPUT_SCHEMA: Schema = &[
    (kOfxPropLabel, S),
    (kOfxInputPropRequestGeometry, I),
    (kOfxInputPropRequestTransform, I),
];

const MESH_SCHEMA: Schema = &[
    (kOfxMeshPropInternalData, P),
    (kOfxMeshPropHostHandle, P),
    (kOfxMeshPropPointCount, I),
    (kOfxMeshPropCornerCount, I),
    (kOfxMeshPropFaceCount, I),
    (kOfxMeshPropNoLooseEdge, I),
    (kOfxMeshPropConstantFaceSize, I),
    (kOfxMeshPropAttributeCount, I),
    (kOfxMeshPropTransformMatrix, P),
];

const PARAM_SCHEMA: Schema = &[
    (kOfxParamPropType, S),
    (kOfxParamPropScriptName, S),
    (kOfxPropLabel, S),
    (kOfxParamPropDefault, S),
    (kOfxParamPropDefault, I),
    (kOfxParamPropDefault, D),
    (kOfxParamPropDefault, P),
    (kOfxParamPropMin, S),
    (kOfxParamPropMin, I),
    (kOfxParamPropMin, D),
    (kOfxParamPropMin, P),
    (kOfxParamPropMax, S),
    (kOfxParamPropMax, I),
    (kOfxParamPropMax, D),
    (kOfxParamPropMax, P),
    (kOfxParamPropDisplayMin, S),
    (kOfxParamPropDisplayMin, I),
    (kOfxParamPropDisplayMin, D),
    (kOfxParamPropDisplayMin, P),
    (kOfxParamPropDisplayMax, S),
    (kOfxParamPropDisplayMax, I),
    (kOfxParamPropDisplayMax, D),
    (kOfxParamPropDisplayMax, P),
];

const ATTRIB_SCHEMA: Schema = &[
    (kOfxMeshAttribPropData, P),
    (kOfxMeshAttribPropStride, I),
    (kOfxMeshAttribPropComponentCount, I),
    (kOfxMeshAttribPropType, S),
    (kOfxMeshAttribPropSemantic, S),
    (kOfxMeshAttribPropIsOwner, I),
    (kMeshAttribRequestPropMandatory, I),
];

const IDENTITY_IN_SCHEMA: Schema = &[(kOfxPropTime, I)];

const IDENTITY_OUT_SCHEMA: Schema = &[(kOfxPropName, S), (kOfxPropTime, I)];

impl PropertyContext {
    /// Legal `(name, type)` pairs, or `None` for the unvalidated `Other` context.
    pub fn schema(self) -> Option<Schema> {
        match self {
            PropertyContext::Host => Some(HOST_SCHEMA),
            PropertyContext::MeshEffect => Some(MESH_EFFECT_SCHEMA),
            PropertyContext::Input => Some(INPUT_SCHEMA),
            PropertyContext::Mesh => Some(MESH_SCHEMA),
            PropertyContext::Param => Some(PARAM_SCHEMA),
            PropertyContext::Attrib => Some(ATTRIB_SCHEMA),
            PropertyContext::ActionIdentityIn => Some(IDENTITY_IN_SCHEMA),
            PropertyContext::ActionIdentityOut => Some(IDENTITY_OUT_SCHEMA),
            PropertyContext::Other => None,
        }
    }

    pub fn allows(self, name: &CStr, kind: PropertyType) -> bool {
        match self.schema() {
            Some(schema) => schema.iter().any(|(key, ty)| *key == name && *ty == kind),
            None => {
                tracing::warn!(
                    property = %name.to_string_lossy(),
                    "property accessed in the unvalidated Other context"
                );
                true
            }
        }
    }
}

/// Insertion-ordered, key-unique property collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySet {
    context: PropertyContext,
    properties: Vec<Property>,
}

impl PropertySet {
    pub fn new(context: PropertyContext) -> Self {
        Self {
            context,
            properties: Vec::new(),
        }
    }

    pub fn context(&self) -> PropertyContext {
        self.context
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn find(&self, name: &CStr) -> Option<&Property> {
        self.properties.iter().find(|prop| prop.name.as_c_str() == name)
    }

    pub fn contains(&self, name: &CStr) -> bool {
        self.find(name).is_some()
    }

    /// Find-or-create, without schema validation.
    pub fn ensure(&mut self, name: &CStr) -> &mut Property {
        let index = match self.properties.iter().position(|prop| prop.name.as_c_str() == name) {
            Some(index) => index,
            None => {
                self.properties.push(Property::new(name));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    /// Peeks at a slot without creating the property.
    pub fn value(&self, name: &CStr, index: usize) -> Option<&Value> {
        self.find(name).and_then(|prop| prop.value(index))
    }

    pub fn int(&self, name: &CStr, index: usize) -> Option<i32> {
        self.value(name, index).map(Value::as_int)
    }

    pub fn double(&self, name: &CStr, index: usize) -> Option<f64> {
        self.value(name, index).map(Value::as_double)
    }

    pub fn pointer(&self, name: &CStr, index: usize) -> Option<*mut c_void> {
        self.value(name, index).map(Value::as_pointer)
    }

    pub fn string(&self, name: &CStr, index: usize) -> Option<&CStr> {
        self.value(name, index).map(Value::as_c_str)
    }

    fn check(&self, name: &CStr, kind: PropertyType, index: i32) -> Result<usize, MfxError> {
        if !self.context.allows(name, kind) {
            tracing::debug!(
                context = ?self.context,
                property = %name.to_string_lossy(),
                ?kind,
                "property rejected by context schema"
            );
            return Err(MfxError::BadHandle);
        }
        usize::try_from(index)
            .ok()
            .filter(|index| *index < PROPERTY_SLOTS)
            .ok_or(MfxError::BadIndex)
    }

    pub fn set(&mut self, name: &CStr, index: i32, value: Value) -> Result<(), MfxError> {
        let slot = self.check(name, value.kind(), index)?;
        self.ensure(name).values[slot] = Some(value);
        Ok(())
    }

    pub fn set_pointer(&mut self, name: &CStr, index: i32, value: *mut c_void) -> Result<(), MfxError> {
        self.set(name, index, Value::Pointer(RawPointer(value)))
    }

    pub fn set_string(&mut self, name: &CStr, index: i32, value: &CStr) -> Result<(), MfxError> {
        self.set(name, index, Value::Str(value.to_owned()))
    }

    pub fn set_double(&mut self, name: &CStr, index: i32, value: f64) -> Result<(), MfxError> {
        self.set(name, index, Value::Double(value))
    }

    pub fn set_int(&mut self, name: &CStr, index: i32, value: i32) -> Result<(), MfxError> {
        self.set(name, index, Value::Int(value))
    }

    /// Sets slots `0..values.len()`; the schema is checked once before anything is written.
    pub fn set_n(&mut self, name: &CStr, values: Vec<Value>) -> Result<(), MfxError> {
        for value in &values {
            self.check(name, value.kind(), 0)?;
        }
        for (index, value) in values.into_iter().enumerate() {
            let index = i32::try_from(index).map_err(|_| MfxError::BadIndex)?;
            self.set(name, index, value)?;
        }
        Ok(())
    }

    fn slot(&mut self, name: &CStr, kind: PropertyType, index: i32) -> Result<&Option<Value>, MfxError> {
        let slot = self.check(name, kind, index)?;
        Ok(&self.ensure(name).values[slot])
    }

    // Getters create the property when missing, so reading a legal key never fails.

    pub fn get_pointer(&mut self, name: &CStr, index: i32) -> Result<*mut c_void, MfxError> {
        self.slot(name, PropertyType::Pointer, index).map(slot_pointer)
    }

    pub fn get_string(&mut self, name: &CStr, index: i32) -> Result<*const c_char, MfxError> {
        self.slot(name, PropertyType::String, index)
            .map(|slot| slot_str(slot).as_ptr())
    }

    pub fn get_double(&mut self, name: &CStr, index: i32) -> Result<f64, MfxError> {
        self.slot(name, PropertyType::Double, index).map(slot_double)
    }

    pub fn get_int(&mut self, name: &CStr, index: i32) -> Result<i32, MfxError> {
        self.slot(name, PropertyType::Int, index).map(slot_int)
    }

    /// Always four: property arity is not tracked.
    pub fn dimension(&self, _name: &CStr) -> usize {
        PROPERTY_SLOTS
    }
}
