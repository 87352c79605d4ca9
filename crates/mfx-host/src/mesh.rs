use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::Weak;

use mfx_sys::*;

use crate::attributes::{
    Attachment, Attribute, AttributeDefinition, AttributeSet, AttributeType,
};
use crate::error::MfxError;
use crate::host::Host;
use crate::properties::{PropertyContext, PropertySet};

/// One geometry snapshot flowing through an input.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) properties: PropertySet,
    pub(crate) attributes: AttributeSet,
    input: CString,
    host: Weak<Host>,
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties && self.attributes == other.attributes
    }
}

/// Element counts read from the mesh properties before allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementCounts {
    pub points: usize,
    pub corners: usize,
    pub faces: usize,
}

impl ElementCounts {
    pub fn for_attachment(&self, attachment: Attachment) -> usize {
        match attachment {
            Attachment::Point => self.points,
            Attachment::Corner => self.corners,
            Attachment::Face => self.faces,
            Attachment::Mesh => 1,
        }
    }
}

impl Mesh {
    pub fn new(host: Weak<Host>) -> Self {
        Self::for_input(cstr!(""), host)
    }

    /// A mesh flowing through the input called `input`.
    pub fn for_input(input: &CStr, host: Weak<Host>) -> Self {
        Self {
            properties: PropertySet::new(PropertyContext::Mesh),
            attributes: AttributeSet::new(),
            input: input.to_owned(),
            host,
        }
    }

    /// Name of the input this mesh belongs to, empty for free-standing meshes.
    pub fn input_name(&self) -> &CStr {
        &self.input
    }

    pub fn handle(&mut self) -> OfxMeshHandle {
        (self as *mut Mesh).cast()
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn attribute(&self, attachment: Attachment, name: &CStr) -> Option<&Attribute> {
        self.attributes.find(attachment, name)
    }

    pub fn attribute_mut(&mut self, attachment: Attachment, name: &CStr) -> Option<&mut Attribute> {
        self.attributes.find_mut(attachment, name)
    }

    pub fn point_count(&self) -> i32 {
        self.properties.int(kOfxMeshPropPointCount, 0).unwrap_or(0)
    }

    pub fn corner_count(&self) -> i32 {
        self.properties.int(kOfxMeshPropCornerCount, 0).unwrap_or(0)
    }

    pub fn face_count(&self) -> i32 {
        self.properties.int(kOfxMeshPropFaceCount, 0).unwrap_or(0)
    }

    pub fn set_counts(&mut self, points: i32, corners: i32, faces: i32) -> Result<(), MfxError> {
        self.properties.set_int(kOfxMeshPropPointCount, 0, points)?;
        self.properties.set_int(kOfxMeshPropCornerCount, 0, corners)?;
        self.properties.set_int(kOfxMeshPropFaceCount, 0, faces)?;
        Ok(())
    }

    /// Find-or-create an attribute, owned and without data, keeping the attribute count in sync.
    pub fn define_attribute(
        &mut self,
        name: &CStr,
        definition: &AttributeDefinition,
    ) -> Result<&mut Attribute, MfxError> {
        self.attributes
            .ensure(definition.attachment, name)
            .define(definition)?;
        let count = i32::try_from(self.attributes.len()).map_err(|_| MfxError::Memory)?;
        self.properties.set_int(kOfxMeshPropAttributeCount, 0, count)?;
        self.attributes
            .find_mut(definition.attachment, name)
            .ok_or(MfxError::Unknown)
    }

    /// Resets the mesh for a new fetch: empty counts and only the three default attributes.
    pub(crate) fn prepare(&mut self) -> Result<(), MfxError> {
        self.attributes.clear();
        let raw_host = self
            .host
            .upgrade()
            .map_or(ptr::null_mut(), |host| host.raw_host());
        self.properties
            .set_pointer(kOfxMeshPropHostHandle, 0, raw_host.cast())?;
        self.set_counts(0, 0, 0)?;
        self.properties.set_int(kOfxMeshPropAttributeCount, 0, 0)?;

        let defaults = [
            (kOfxMeshAttribPointPosition, Attachment::Point, 3, AttributeType::Float),
            (kOfxMeshAttribCornerPoint, Attachment::Corner, 1, AttributeType::Int),
            (kOfxMeshAttribFaceSize, Attachment::Face, 1, AttributeType::Int),
        ];
        for (name, attachment, component_count, kind) in defaults {
            self.define_attribute(
                name,
                &AttributeDefinition {
                    attachment,
                    component_count,
                    kind,
                    semantic: None,
                },
            )?;
        }
        Ok(())
    }

    /// Reads the element counts `meshAlloc` sizes buffers from. Missing or negative counts fail.
    pub fn element_counts(&self) -> Result<ElementCounts, MfxError> {
        let count = |key: &CStr| {
            self.properties
                .int(key, 0)
                .and_then(|value| usize::try_from(value).ok())
                .ok_or(MfxError::Value)
        };
        Ok(ElementCounts {
            points: count(kOfxMeshPropPointCount)?,
            corners: count(kOfxMeshPropCornerCount)?,
            faces: count(kOfxMeshPropFaceCount)?,
        })
    }

    /// Allocates every attribute still marked owned. Borrowed attributes are left untouched.
    pub fn allocate(&mut self, counts: ElementCounts) -> Result<(), MfxError> {
        for attr in self.attributes.iter_mut() {
            attr.allocate(counts.for_attachment(attr.attachment()))?;
        }
        Ok(())
    }

    /// Frees owned buffers and zeroes the counts. Releasing twice is harmless.
    pub fn release(&mut self) {
        self.attributes.release_all();
        let _ = self.set_counts(0, 0, 0);
    }

    /// Runs the callback stored under `key` in the host properties against this mesh.
    ///
    /// # Safety
    ///
    /// `mesh` must point to a live mesh that is not otherwise borrowed for the duration of the
    /// call; the callback receives it as a raw handle.
    pub(crate) unsafe fn run_host_callback(mesh: *mut Mesh, key: &CStr) -> Result<(), MfxError> {
        let Some(host) = (*mesh).host.upgrade() else {
            return Ok(());
        };
        let Some(callback) = host.mesh_callback(key) else {
            return Ok(());
        };
        let status = callback(host.raw_host(), mesh.cast());
        if status == kOfxStatOK {
            Ok(())
        } else {
            tracing::debug!(
                callback = %key.to_string_lossy(),
                status = status_name(status),
                "host mesh callback failed"
            );
            Err(MfxError::from_status(status).unwrap_or(MfxError::Failed))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::attributes::AttributeData;

    fn custom_float3() -> AttributeDefinition {
        AttributeDefinition {
            attachment: Attachment::Point,
            component_count: 3,
            kind: AttributeType::Float,
            semantic: None,
        }
    }

    #[test]
    fn prepare_seeds_default_attributes() {
        let mut mesh = Mesh::new(Weak::new());
        mesh.prepare().unwrap();

        let names: Vec<_> = mesh
            .attributes()
            .iter()
            .map(|attr| (attr.attachment(), attr.name().to_owned()))
            .collect();
        assert_eq!(
            names,
            vec![
                (Attachment::Point, kOfxMeshAttribPointPosition.to_owned()),
                (Attachment::Corner, kOfxMeshAttribCornerPoint.to_owned()),
                (Attachment::Face, kOfxMeshAttribFaceSize.to_owned()),
            ]
        );
        assert_eq!(mesh.properties().int(kOfxMeshPropAttributeCount, 0), Some(3));
        assert_eq!(mesh.point_count(), 0);
    }

    #[test]
    fn prepare_drops_attributes_of_the_previous_fetch() {
        let mut mesh = Mesh::new(Weak::new());
        mesh.prepare().unwrap();
        mesh.define_attribute(cstr!("uv"), &custom_float3()).unwrap();
        mesh.set_counts(2, 0, 0).unwrap();
        mesh.allocate(mesh.element_counts().unwrap()).unwrap();
        assert_eq!(mesh.properties().int(kOfxMeshPropAttributeCount, 0), Some(4));
        mesh.release();

        mesh.prepare().unwrap();
        assert_eq!(mesh.attributes().len(), 3);
        assert_eq!(mesh.properties().int(kOfxMeshPropAttributeCount, 0), Some(3));
        assert!(mesh.attribute(Attachment::Point, cstr!("uv")).is_none());
    }

    #[test]
    fn allocation_uses_counts_per_attachment() {
        let mut mesh = Mesh::new(Weak::new());
        mesh.define_attribute(cstr!("custom"), &custom_float3()).unwrap();
        mesh.set_counts(10, 0, 0).unwrap();

        let counts = mesh.element_counts().unwrap();
        mesh.allocate(counts).unwrap();

        let attr = mesh.attribute(Attachment::Point, cstr!("custom")).unwrap();
        assert_eq!(attr.stride(), 12);
        match attr.data() {
            AttributeData::Owned(bytes) => assert_eq!(bytes.len(), 120),
            other => panic!("expected owned data, got {other:?}"),
        }
    }

    #[test]
    fn missing_or_negative_counts_fail() {
        let mut mesh = Mesh::new(Weak::new());
        assert_eq!(mesh.element_counts(), Err(MfxError::Value));
        mesh.set_counts(4, -1, 1).unwrap();
        assert_eq!(mesh.element_counts(), Err(MfxError::Value));
    }

    #[test]
    fn release_is_idempotent() {
        let mut mesh = Mesh::new(Weak::new());
        mesh.prepare().unwrap();
        mesh.set_counts(3, 3, 1).unwrap();
        mesh.allocate(mesh.element_counts().unwrap()).unwrap();

        mesh.release();
        mesh.release();
        assert_eq!(mesh.point_count(), 0);
        assert!(mesh
            .attributes()
            .iter()
            .all(|attr| matches!(attr.data(), AttributeData::Unallocated)));
    }
}
