//! Mesh attributes: typed, strided buffers keyed by `(attachment, name)`.

use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::ptr;

use mfx_sys::*;

use crate::error::MfxError;
use crate::properties::{PropertyContext, PropertySet, RawPointer};

/// Mesh entity class an attribute is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Point,
    Corner,
    Face,
    Mesh,
}

impl Attachment {
    pub const ALL: [Attachment; 4] = [
        Attachment::Point,
        Attachment::Corner,
        Attachment::Face,
        Attachment::Mesh,
    ];

    pub fn from_cstr(name: &CStr) -> Option<Self> {
        Self::ALL.into_iter().find(|attachment| attachment.as_cstr() == name)
    }

    pub fn as_cstr(self) -> &'static CStr {
        match self {
            Attachment::Point => kOfxMeshAttribPoint,
            Attachment::Corner => kOfxMeshAttribCorner,
            Attachment::Face => kOfxMeshAttribFace,
            Attachment::Mesh => kOfxMeshAttribMesh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    UByte,
    Int,
    Float,
}

impl AttributeType {
    pub fn from_cstr(name: &CStr) -> Option<Self> {
        [AttributeType::UByte, AttributeType::Int, AttributeType::Float]
            .into_iter()
            .find(|kind| kind.as_cstr() == name)
    }

    pub fn as_cstr(self) -> &'static CStr {
        match self {
            AttributeType::UByte => kOfxMeshAttribTypeUByte,
            AttributeType::Int => kOfxMeshAttribTypeInt,
            AttributeType::Float => kOfxMeshAttribTypeFloat,
        }
    }

    /// Size of one component in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            AttributeType::UByte => 1,
            AttributeType::Int => std::mem::size_of::<i32>(),
            AttributeType::Float => std::mem::size_of::<f32>(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    TextureCoordinate,
    Normal,
    Color,
    Weight,
}

impl AttributeSemantic {
    pub fn from_cstr(name: &CStr) -> Option<Self> {
        [
            AttributeSemantic::TextureCoordinate,
            AttributeSemantic::Normal,
            AttributeSemantic::Color,
            AttributeSemantic::Weight,
        ]
        .into_iter()
        .find(|semantic| semantic.as_cstr() == name)
    }

    pub fn as_cstr(self) -> &'static CStr {
        match self {
            AttributeSemantic::TextureCoordinate => kOfxMeshAttribSemanticTextureCoordinate,
            AttributeSemantic::Normal => kOfxMeshAttribSemanticNormal,
            AttributeSemantic::Color => kOfxMeshAttribSemanticColor,
            AttributeSemantic::Weight => kOfxMeshAttribSemanticWeight,
        }
    }
}

/// Validated arguments of `attributeDefine` / `inputRequestAttribute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub attachment: Attachment,
    pub component_count: i32,
    pub kind: AttributeType,
    pub semantic: Option<AttributeSemantic>,
}

impl AttributeDefinition {
    /// Checks the raw strings coming from a plug-in. Nothing is created if this fails.
    pub fn parse(
        attachment: Option<&CStr>,
        component_count: i32,
        kind: Option<&CStr>,
        semantic: Option<&CStr>,
    ) -> Result<Self, MfxError> {
        if !(1..=4).contains(&component_count) {
            return Err(MfxError::Value);
        }
        let kind = kind
            .and_then(AttributeType::from_cstr)
            .ok_or(MfxError::Value)?;
        let semantic = match semantic {
            None => None,
            Some(name) => Some(AttributeSemantic::from_cstr(name).ok_or(MfxError::Value)?),
        };
        let attachment = attachment
            .and_then(Attachment::from_cstr)
            .ok_or(MfxError::BadIndex)?;
        Ok(Self {
            attachment,
            component_count,
            kind,
            semantic,
        })
    }
}

/// Host-allocated attribute memory, 8-byte aligned.
#[derive(Clone)]
pub struct OwnedBuffer {
    words: Vec<u64>,
    len: usize,
}

impl OwnedBuffer {
    pub fn zeroed(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(8)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.words.as_mut_ptr().cast()
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `words` spans at least `len` initialized bytes.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr().cast(), self.len) }
    }
}

impl fmt::Debug for OwnedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedBuffer").field("len", &self.len).finish()
    }
}

/// Who is responsible for an attribute's memory.
#[derive(Debug, Default)]
pub enum AttributeStorage {
    #[default]
    Unallocated,
    /// Aliases memory owned by the embedding application. Never freed here.
    Borrowed(RawPointer),
    Owned(OwnedBuffer),
}

/// Read-only view over an attribute's current data.
#[derive(Debug, Clone, Copy)]
pub enum AttributeData<'a> {
    Unallocated,
    Borrowed(*mut u8),
    Owned(&'a [u8]),
}

pub struct Attribute {
    attachment: Attachment,
    name: CString,
    pub(crate) properties: PropertySet,
    storage: AttributeStorage,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("attachment", &self.attachment)
            .field("name", &self.name)
            .field("storage", &self.storage)
            .finish()
    }
}

impl Clone for Attribute {
    fn clone(&self) -> Self {
        let mut properties = self.properties.clone();
        let storage = match &self.storage {
            AttributeStorage::Unallocated => AttributeStorage::Unallocated,
            AttributeStorage::Borrowed(data) => AttributeStorage::Borrowed(*data),
            AttributeStorage::Owned(buffer) => {
                let mut buffer = buffer.clone();
                // The copy must not point at the source's buffer.
                let _ = properties.set_pointer(kOfxMeshAttribPropData, 0, buffer.as_mut_ptr().cast());
                AttributeStorage::Owned(buffer)
            }
        };
        Self {
            attachment: self.attachment,
            name: self.name.clone(),
            properties,
            storage,
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        let same_data = match (&self.storage, &other.storage) {
            (AttributeStorage::Owned(a), AttributeStorage::Owned(b)) => a.as_bytes() == b.as_bytes(),
            _ => self.properties.pointer(kOfxMeshAttribPropData, 0)
                == other.properties.pointer(kOfxMeshAttribPropData, 0),
        };
        let props_without_data = |attr: &Attribute| {
            attr.properties
                .iter()
                .filter(|prop| prop.name() != kOfxMeshAttribPropData)
                .cloned()
                .collect::<Vec<_>>()
        };
        self.attachment == other.attachment
            && self.name == other.name
            && same_data
            && props_without_data(self) == props_without_data(other)
    }
}

impl Attribute {
    pub fn new(attachment: Attachment, name: &CStr) -> Self {
        Self {
            attachment,
            name: name.to_owned(),
            properties: PropertySet::new(PropertyContext::Attrib),
            storage: AttributeStorage::Unallocated,
        }
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }

    /// Writes the attribute's metadata. The attribute starts owned and without data.
    pub fn define(&mut self, definition: &AttributeDefinition) -> Result<(), MfxError> {
        self.release();
        let props = &mut self.properties;
        props.set_pointer(kOfxMeshAttribPropData, 0, ptr::null_mut())?;
        props.set_int(kOfxMeshAttribPropComponentCount, 0, definition.component_count)?;
        props.set_string(kOfxMeshAttribPropType, 0, definition.kind.as_cstr())?;
        if let Some(semantic) = definition.semantic {
            props.set_string(kOfxMeshAttribPropSemantic, 0, semantic.as_cstr())?;
        }
        props.set_int(kOfxMeshAttribPropIsOwner, 0, 1)?;
        let stride = definition.component_count * definition.kind.byte_size() as i32;
        props.set_int(kOfxMeshAttribPropStride, 0, stride)?;
        Ok(())
    }

    pub fn component_count(&self) -> i32 {
        self.properties.int(kOfxMeshAttribPropComponentCount, 0).unwrap_or(0)
    }

    pub fn kind(&self) -> Option<AttributeType> {
        self.properties
            .string(kOfxMeshAttribPropType, 0)
            .and_then(AttributeType::from_cstr)
    }

    pub fn semantic(&self) -> Option<AttributeSemantic> {
        self.properties
            .string(kOfxMeshAttribPropSemantic, 0)
            .and_then(AttributeSemantic::from_cstr)
    }

    pub fn stride(&self) -> i32 {
        self.properties.int(kOfxMeshAttribPropStride, 0).unwrap_or(0)
    }

    pub fn is_owner(&self) -> bool {
        self.properties.int(kOfxMeshAttribPropIsOwner, 0).unwrap_or(0) != 0
    }

    pub fn storage(&self) -> &AttributeStorage {
        &self.storage
    }

    pub fn data_ptr(&self) -> *mut c_void {
        self.properties
            .pointer(kOfxMeshAttribPropData, 0)
            .unwrap_or(ptr::null_mut())
    }

    pub fn data(&self) -> AttributeData<'_> {
        match &self.storage {
            AttributeStorage::Owned(buffer) => AttributeData::Owned(buffer.as_bytes()),
            _ => {
                let data = self.data_ptr();
                if data.is_null() {
                    AttributeData::Unallocated
                } else {
                    AttributeData::Borrowed(data.cast())
                }
            }
        }
    }

    /// Points the attribute at memory owned by the embedding application.
    pub fn bind_borrowed(&mut self, data: *mut c_void, stride: i32) -> Result<(), MfxError> {
        self.release();
        self.properties.set_pointer(kOfxMeshAttribPropData, 0, data)?;
        self.properties.set_int(kOfxMeshAttribPropStride, 0, stride)?;
        self.properties.set_int(kOfxMeshAttribPropIsOwner, 0, 0)?;
        self.storage = AttributeStorage::Borrowed(RawPointer(data));
        Ok(())
    }

    /// Allocates zeroed storage for `element_count` elements if the attribute is still owned.
    pub fn allocate(&mut self, element_count: usize) -> Result<(), MfxError> {
        if !self.is_owner() {
            return Ok(());
        }
        let kind = self.kind().ok_or(MfxError::BadHandle)?;
        let components = usize::try_from(self.component_count()).map_err(|_| MfxError::Value)?;
        let stride = components * kind.byte_size();
        let len = stride.checked_mul(element_count).ok_or(MfxError::Memory)?;

        let mut buffer = OwnedBuffer::zeroed(len);
        self.properties
            .set_pointer(kOfxMeshAttribPropData, 0, buffer.as_mut_ptr().cast())?;
        self.properties
            .set_int(kOfxMeshAttribPropStride, 0, i32::try_from(stride).map_err(|_| MfxError::Value)?)?;
        self.storage = AttributeStorage::Owned(buffer);
        Ok(())
    }

    /// Frees host-owned memory and detaches the attribute from any data. Borrowed memory is
    /// only forgotten.
    pub fn release(&mut self) {
        if let AttributeStorage::Owned(buffer) = std::mem::take(&mut self.storage) {
            drop(buffer);
        }
        if self.properties.contains(kOfxMeshAttribPropData) {
            let _ = self
                .properties
                .set_pointer(kOfxMeshAttribPropData, 0, ptr::null_mut());
            let _ = self.properties.set_int(kOfxMeshAttribPropIsOwner, 0, 0);
        }
    }
}

/// Insertion-ordered attributes, unique by `(attachment, name)`.
///
/// Attributes are boxed so the property-set handles given to plug-ins stay valid while the set
/// grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    attributes: Vec<Box<Attribute>>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().map(Box::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        self.attributes.iter_mut().map(Box::as_mut)
    }

    fn position(&self, attachment: Attachment, name: &CStr) -> Option<usize> {
        self.attributes
            .iter()
            .position(|attr| attr.attachment == attachment && attr.name.as_c_str() == name)
    }

    pub fn find(&self, attachment: Attachment, name: &CStr) -> Option<&Attribute> {
        self.position(attachment, name).map(|index| self.attributes[index].as_ref())
    }

    pub fn find_mut(&mut self, attachment: Attachment, name: &CStr) -> Option<&mut Attribute> {
        self.position(attachment, name)
            .map(|index| self.attributes[index].as_mut())
    }

    pub fn ensure(&mut self, attachment: Attachment, name: &CStr) -> &mut Attribute {
        let index = match self.position(attachment, name) {
            Some(index) => index,
            None => {
                self.attributes.push(Box::new(Attribute::new(attachment, name)));
                self.attributes.len() - 1
            }
        };
        self.attributes[index].as_mut()
    }

    /// Adds copies of `other`'s attributes that are not present yet.
    pub fn append(&mut self, other: &AttributeSet) {
        for attr in other.iter() {
            if self.position(attr.attachment, &attr.name).is_none() {
                self.attributes.push(Box::new(attr.clone()));
            }
        }
    }

    pub fn release_all(&mut self) {
        for attr in self.iter_mut() {
            attr.release();
        }
    }

    /// Frees owned buffers and drops every attribute.
    pub fn clear(&mut self) {
        self.release_all();
        self.attributes.clear();
    }
}
