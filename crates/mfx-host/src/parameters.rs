//! Effect parameters and their typed value slots.

use std::ffi::{c_char, CStr, CString};

use mfx_sys::*;

use crate::error::MfxError;
use crate::properties::{PropertyContext, PropertySet, RawPointer, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Integer,
    Integer2D,
    Integer3D,
    Double,
    Double2D,
    Double3D,
    Rgb,
    Rgba,
    Boolean,
    Choice,
    String,
    Custom,
    PushButton,
    Group,
    Page,
}

/// Storage class of a parameter's slots, which also decides the variadic argument types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Boolean,
    Double,
    String,
    /// Buttons, groups and pages carry no value.
    None,
}

const TYPES: [(ParameterType, &CStr); 15] = [
    (ParameterType::Integer, kOfxParamTypeInteger),
    (ParameterType::Integer2D, kOfxParamTypeInteger2D),
    (ParameterType::Integer3D, kOfxParamTypeInteger3D),
    (ParameterType::Double, kOfxParamTypeDouble),
    (ParameterType::Double2D, kOfxParamTypeDouble2D),
    (ParameterType::Double3D, kOfxParamTypeDouble3D),
    (ParameterType::Rgb, kOfxParamTypeRGB),
    (ParameterType::Rgba, kOfxParamTypeRGBA),
    (ParameterType::Boolean, kOfxParamTypeBoolean),
    (ParameterType::Choice, kOfxParamTypeChoice),
    (ParameterType::String, kOfxParamTypeString),
    (ParameterType::Custom, kOfxParamTypeCustom),
    (ParameterType::PushButton, kOfxParamTypePushButton),
    (ParameterType::Group, kOfxParamTypeGroup),
    (ParameterType::Page, kOfxParamTypePage),
];

impl ParameterType {
    pub fn from_cstr(name: &CStr) -> Result<Self, MfxError> {
        TYPES
            .iter()
            .find(|(_, key)| *key == name)
            .map(|(ty, _)| *ty)
            .ok_or(MfxError::Unknown)
    }

    pub fn as_cstr(self) -> &'static CStr {
        TYPES
            .iter()
            .find(|(ty, _)| *ty == self)
            .map_or(kOfxParamTypeInteger, |(_, key)| *key)
    }

    /// Number of slots read or written by `paramGetValue` / `paramSetValue`.
    pub fn dimension(self) -> usize {
        match self {
            ParameterType::Integer2D | ParameterType::Double2D => 2,
            ParameterType::Integer3D | ParameterType::Double3D | ParameterType::Rgb => 3,
            ParameterType::Rgba => 4,
            _ => 1,
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            ParameterType::Integer
            | ParameterType::Integer2D
            | ParameterType::Integer3D
            | ParameterType::Choice => ValueKind::Int,
            ParameterType::Boolean => ValueKind::Boolean,
            ParameterType::Double
            | ParameterType::Double2D
            | ParameterType::Double3D
            | ParameterType::Rgb
            | ParameterType::Rgba => ValueKind::Double,
            ParameterType::String | ParameterType::Custom => ValueKind::String,
            ParameterType::PushButton | ParameterType::Group | ParameterType::Page => {
                ValueKind::None
            }
        }
    }
}

/// Typed view of a parameter's current value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Integer(i32),
    Integer2D([i32; 2]),
    Integer3D([i32; 3]),
    Double(f64),
    Double2D([f64; 2]),
    Double3D([f64; 3]),
    Rgb([f64; 3]),
    Rgba([f64; 4]),
    Boolean(bool),
    Choice(i32),
    String(String),
    Custom(String),
    None,
}

impl ParameterValue {
    pub fn parameter_type(&self) -> Option<ParameterType> {
        Some(match self {
            ParameterValue::Integer(_) => ParameterType::Integer,
            ParameterValue::Integer2D(_) => ParameterType::Integer2D,
            ParameterValue::Integer3D(_) => ParameterType::Integer3D,
            ParameterValue::Double(_) => ParameterType::Double,
            ParameterValue::Double2D(_) => ParameterType::Double2D,
            ParameterValue::Double3D(_) => ParameterType::Double3D,
            ParameterValue::Rgb(_) => ParameterType::Rgb,
            ParameterValue::Rgba(_) => ParameterType::Rgba,
            ParameterValue::Boolean(_) => ParameterType::Boolean,
            ParameterValue::Choice(_) => ParameterType::Choice,
            ParameterValue::String(_) => ParameterType::String,
            ParameterValue::Custom(_) => ParameterType::Custom,
            ParameterValue::None => return None,
        })
    }
}

fn zero_slot(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Double => Value::Double(0.0),
        ValueKind::String => Value::Str(CString::default()),
        ValueKind::Int | ValueKind::Boolean | ValueKind::None => Value::Int(0),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: CString,
    kind: ParameterType,
    values: [Value; 4],
    pub(crate) properties: PropertySet,
}

impl Parameter {
    pub fn new(name: &CStr, kind: ParameterType) -> Self {
        let mut param = Self {
            name: name.to_owned(),
            kind,
            values: std::array::from_fn(|_| zero_slot(kind.value_kind())),
            properties: PropertySet::new(PropertyContext::Param),
        };
        param.set_type(kind);
        param
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.kind
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }

    /// Changes the type tag and resets every slot.
    pub fn set_type(&mut self, kind: ParameterType) {
        self.kind = kind;
        self.values = std::array::from_fn(|_| zero_slot(kind.value_kind()));
        let _ = self.properties.set_string(kOfxParamPropType, 0, kind.as_cstr());
    }

    pub fn int_slot(&self, index: usize) -> i32 {
        self.values.get(index).map_or(0, Value::as_int)
    }

    pub fn double_slot(&self, index: usize) -> f64 {
        self.values.get(index).map_or(0.0, Value::as_double)
    }

    /// Pointer to a NUL-terminated copy owned by the parameter; valid until the slot changes.
    pub fn string_slot(&self, index: usize) -> *const c_char {
        match self.values.get(index) {
            Some(value) => value.as_c_str().as_ptr(),
            None => mfx_sys::cstr!("").as_ptr(),
        }
    }

    pub fn str_slot(&self, index: usize) -> &CStr {
        match self.values.get(index) {
            Some(value) => value.as_c_str(),
            None => mfx_sys::cstr!(""),
        }
    }

    pub fn set_int_slot(&mut self, index: usize, value: i32) -> Result<(), MfxError> {
        *self.values.get_mut(index).ok_or(MfxError::BadIndex)? = Value::Int(value);
        Ok(())
    }

    pub fn set_double_slot(&mut self, index: usize, value: f64) -> Result<(), MfxError> {
        *self.values.get_mut(index).ok_or(MfxError::BadIndex)? = Value::Double(value);
        Ok(())
    }

    pub fn set_string_slot(&mut self, index: usize, value: &CStr) -> Result<(), MfxError> {
        *self.values.get_mut(index).ok_or(MfxError::BadIndex)? = Value::Str(value.to_owned());
        Ok(())
    }

    pub fn value(&self) -> ParameterValue {
        let ints = |i: usize| self.int_slot(i);
        let doubles = |i: usize| self.double_slot(i);
        let string = || self.str_slot(0).to_string_lossy().into_owned();
        match self.kind {
            ParameterType::Integer => ParameterValue::Integer(ints(0)),
            ParameterType::Integer2D => ParameterValue::Integer2D(std::array::from_fn(ints)),
            ParameterType::Integer3D => ParameterValue::Integer3D(std::array::from_fn(ints)),
            ParameterType::Double => ParameterValue::Double(doubles(0)),
            ParameterType::Double2D => ParameterValue::Double2D(std::array::from_fn(doubles)),
            ParameterType::Double3D => ParameterValue::Double3D(std::array::from_fn(doubles)),
            ParameterType::Rgb => ParameterValue::Rgb(std::array::from_fn(doubles)),
            ParameterType::Rgba => ParameterValue::Rgba(std::array::from_fn(doubles)),
            ParameterType::Boolean => ParameterValue::Boolean(ints(0) != 0),
            ParameterType::Choice => ParameterValue::Choice(ints(0)),
            ParameterType::String => ParameterValue::String(string()),
            ParameterType::Custom => ParameterValue::Custom(string()),
            ParameterType::PushButton | ParameterType::Group | ParameterType::Page => {
                ParameterValue::None
            }
        }
    }

    /// Writes a typed value; the variant must match the parameter's type.
    pub fn set_value(&mut self, value: ParameterValue) -> Result<(), MfxError> {
        if value.parameter_type() != Some(self.kind) {
            return Err(MfxError::Value);
        }
        match value {
            ParameterValue::Integer(v) | ParameterValue::Choice(v) => self.set_int_slot(0, v),
            ParameterValue::Boolean(v) => self.set_int_slot(0, i32::from(v)),
            ParameterValue::Integer2D(v) => self.set_ints(&v),
            ParameterValue::Integer3D(v) => self.set_ints(&v),
            ParameterValue::Double(v) => self.set_double_slot(0, v),
            ParameterValue::Double2D(v) => self.set_doubles(&v),
            ParameterValue::Double3D(v) | ParameterValue::Rgb(v) => self.set_doubles(&v),
            ParameterValue::Rgba(v) => self.set_doubles(&v),
            ParameterValue::String(v) | ParameterValue::Custom(v) => {
                let v = CString::new(v).map_err(|_| MfxError::Value)?;
                self.set_string_slot(0, &v)
            }
            ParameterValue::None => Ok(()),
        }
    }

    fn set_ints(&mut self, values: &[i32]) -> Result<(), MfxError> {
        values
            .iter()
            .enumerate()
            .try_for_each(|(i, v)| self.set_int_slot(i, *v))
    }

    fn set_doubles(&mut self, values: &[f64]) -> Result<(), MfxError> {
        values
            .iter()
            .enumerate()
            .try_for_each(|(i, v)| self.set_double_slot(i, *v))
    }

    /// Copies `OfxParamPropDefault` into the value slots, converting to the slot kind.
    pub fn apply_defaults(&mut self) {
        for index in 0..self.kind.dimension() {
            let Some(default) = self.properties.value(kOfxParamPropDefault, index).cloned() else {
                continue;
            };
            let slot = match self.kind.value_kind() {
                ValueKind::Int | ValueKind::Boolean => Value::Int(default.as_int()),
                ValueKind::Double => Value::Double(default.as_double()),
                ValueKind::String => Value::Str(default.as_c_str().to_owned()),
                ValueKind::None => continue,
            };
            self.values[index] = slot;
        }
    }
}

/// Insertion-ordered, name-unique parameters of one effect.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    parameters: Vec<Box<Parameter>>,
    /// Back-reference to the owning effect's properties, rebound whenever the effect moves.
    effect_properties: RawPointer,
}

impl PartialEq for ParameterSet {
    fn eq(&self, other: &Self) -> bool {
        self.parameters == other.parameters
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().map(Box::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.parameters.iter_mut().map(Box::as_mut)
    }

    pub fn find(&self, name: &CStr) -> Option<&Parameter> {
        self.iter().find(|param| param.name.as_c_str() == name)
    }

    pub fn find_mut(&mut self, name: &CStr) -> Option<&mut Parameter> {
        self.iter_mut().find(|param| param.name.as_c_str() == name)
    }

    /// Defines a new parameter. Unlike inputs and attributes, redefinition is an error.
    pub fn define(&mut self, name: &CStr, kind: ParameterType) -> Result<&mut Parameter, MfxError> {
        if self.find(name).is_some() {
            return Err(MfxError::Exists);
        }
        self.parameters.push(Box::new(Parameter::new(name, kind)));
        self.parameters
            .last_mut()
            .map(Box::as_mut)
            .ok_or(MfxError::Memory)
    }

    pub fn apply_defaults(&mut self) {
        for param in self.iter_mut() {
            param.apply_defaults();
        }
    }

    pub(crate) fn bind_effect_properties(&mut self, properties: *mut PropertySet) {
        self.effect_properties = RawPointer(properties.cast());
    }

    pub(crate) fn effect_properties(&self) -> *mut PropertySet {
        self.effect_properties.0.cast()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dimensions_follow_the_type() {
        let dims: Vec<usize> = [
            kOfxParamTypeInteger,
            kOfxParamTypeDouble2D,
            kOfxParamTypeInteger3D,
            kOfxParamTypeRGB,
            kOfxParamTypeRGBA,
            kOfxParamTypeString,
        ]
        .into_iter()
        .map(|name| ParameterType::from_cstr(name).unwrap().dimension())
        .collect();
        assert_eq!(dims, vec![1, 2, 3, 3, 4, 1]);
        assert_eq!(
            ParameterType::from_cstr(mfx_sys::cstr!("OfxParamTypeCamera")),
            Err(MfxError::Unknown)
        );
    }

    #[test]
    fn redefinition_is_rejected() {
        let mut set = ParameterSet::new();
        set.define(mfx_sys::cstr!("Count"), ParameterType::Integer).unwrap();
        assert_eq!(
            set.define(mfx_sys::cstr!("Count"), ParameterType::Double).err(),
            Some(MfxError::Exists)
        );
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.find(mfx_sys::cstr!("Count")).unwrap().parameter_type(),
            ParameterType::Integer
        );
    }

    #[test]
    fn defaults_are_converted_to_the_slot_kind() {
        let mut set = ParameterSet::new();
        let distance = set.define(mfx_sys::cstr!("Distance"), ParameterType::Double).unwrap();
        distance.properties_mut().set_int(kOfxParamPropDefault, 0, 17).unwrap();
        let size = set.define(mfx_sys::cstr!("Size"), ParameterType::Integer2D).unwrap();
        size.properties_mut().set_int(kOfxParamPropDefault, 0, 25).unwrap();
        size.properties_mut().set_int(kOfxParamPropDefault, 1, 87).unwrap();

        set.apply_defaults();
        assert_eq!(
            set.find(mfx_sys::cstr!("Distance")).unwrap().value(),
            ParameterValue::Double(17.0)
        );
        assert_eq!(
            set.find(mfx_sys::cstr!("Size")).unwrap().value(),
            ParameterValue::Integer2D([25, 87])
        );
    }

    #[test]
    fn typed_values_must_match() {
        let mut param = Parameter::new(mfx_sys::cstr!("Color"), ParameterType::Rgb);
        param.set_value(ParameterValue::Rgb([0.1, 0.2, 0.3])).unwrap();
        assert_eq!(param.value(), ParameterValue::Rgb([0.1, 0.2, 0.3]));
        assert_eq!(
            param.set_value(ParameterValue::Double3D([1.0, 2.0, 3.0])),
            Err(MfxError::Value)
        );

        param.set_type(ParameterType::String);
        assert_eq!(param.value(), ParameterValue::String(String::new()));
        param.set_value(ParameterValue::String("hello".into())).unwrap();
        assert_eq!(param.str_slot(0).to_bytes(), b"hello");
    }

    #[test]
    fn clones_do_not_share_values() {
        let mut set = ParameterSet::new();
        set.define(mfx_sys::cstr!("Flag"), ParameterType::Boolean).unwrap();
        let mut copy = set.clone();
        assert_eq!(copy, set);

        copy.find_mut(mfx_sys::cstr!("Flag"))
            .unwrap()
            .set_value(ParameterValue::Boolean(true))
            .unwrap();
        assert_eq!(
            set.find(mfx_sys::cstr!("Flag")).unwrap().value(),
            ParameterValue::Boolean(false)
        );
    }
}
