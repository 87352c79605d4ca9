use std::ffi::{CStr, CString};
use std::sync::Weak;

use mfx_sys::*;

use crate::attributes::{Attribute, AttributeDefinition, AttributeSet};
use crate::error::MfxError;
use crate::host::Host;
use crate::mesh::Mesh;
use crate::properties::{PropertyContext, PropertySet};

/// A named mesh slot of an effect.
#[derive(Debug, Clone)]
pub struct Input {
    name: CString,
    pub(crate) properties: PropertySet,
    pub(crate) requested_attributes: AttributeSet,
    pub(crate) mesh: Mesh,
    host: Weak<Host>,
}

impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.properties == other.properties
            && self.requested_attributes == other.requested_attributes
            && self.mesh == other.mesh
    }
}

impl Input {
    pub fn new(name: &CStr, host: Weak<Host>) -> Self {
        let mut properties = PropertySet::new(PropertyContext::Input);
        let _ = properties.set_int(kOfxInputPropRequestGeometry, 0, 1);
        let _ = properties.set_int(kOfxInputPropRequestTransform, 0, 0);
        Self {
            name: name.to_owned(),
            properties,
            requested_attributes: AttributeSet::new(),
            mesh: Mesh::for_input(name, host.clone()),
            host,
        }
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn handle(&mut self) -> OfxMeshInputHandle {
        (self as *mut Input).cast()
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        &mut self.properties
    }

    pub fn label(&self) -> Option<&CStr> {
        self.properties.string(kOfxPropLabel, 0)
    }

    pub fn requested_attributes(&self) -> &AttributeSet {
        &self.requested_attributes
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn host(&self) -> &Weak<Host> {
        &self.host
    }

    /// Records an attribute the plug-in wants bound on this input's mesh. Metadata only.
    pub fn request_attribute(
        &mut self,
        name: &CStr,
        definition: &AttributeDefinition,
        mandatory: bool,
    ) -> Result<&mut Attribute, MfxError> {
        let attr = self.requested_attributes.ensure(definition.attachment, name);
        attr.define(definition)?;
        attr.properties_mut()
            .set_int(kMeshAttribRequestPropMandatory, 0, i32::from(mandatory))?;
        Ok(attr)
    }
}

/// Insertion-ordered, name-unique inputs. Boxed so input handles survive growth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSet {
    inputs: Vec<Box<Input>>,
}

impl InputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Input> {
        self.inputs.iter().map(Box::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Input> {
        self.inputs.iter_mut().map(Box::as_mut)
    }

    pub fn names(&self) -> Vec<String> {
        self.iter()
            .map(|input| input.name.to_string_lossy().into_owned())
            .collect()
    }

    pub fn find(&self, name: &CStr) -> Option<&Input> {
        self.iter().find(|input| input.name.as_c_str() == name)
    }

    pub fn find_mut(&mut self, name: &CStr) -> Option<&mut Input> {
        self.iter_mut().find(|input| input.name.as_c_str() == name)
    }

    pub fn ensure(&mut self, name: &CStr, host: &Weak<Host>) -> &mut Input {
        let index = match self.inputs.iter().position(|input| input.name.as_c_str() == name) {
            Some(index) => index,
            None => {
                self.inputs.push(Box::new(Input::new(name, host.clone())));
                self.inputs.len() - 1
            }
        };
        self.inputs[index].as_mut()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::attributes::{Attachment, AttributeType};

    #[test]
    fn ensure_is_find_or_create() {
        let mut inputs = InputSet::new();
        let first: *const Input = inputs.ensure(kOfxMeshMainInput, &Weak::new());
        inputs.ensure(kOfxMeshMainOutput, &Weak::new());
        let again: *const Input = inputs.ensure(kOfxMeshMainInput, &Weak::new());

        assert_eq!(first, again);
        assert_eq!(inputs.names(), vec!["OfxMeshMainInput", "OfxMeshMainOutput"]);
    }

    #[test]
    fn new_inputs_request_geometry_only() {
        let input = Input::new(kOfxMeshMainInput, Weak::new());
        assert_eq!(input.properties().int(kOfxInputPropRequestGeometry, 0), Some(1));
        assert_eq!(input.properties().int(kOfxInputPropRequestTransform, 0), Some(0));
        assert_eq!(input.mesh().input_name(), kOfxMeshMainInput);
    }

    #[test]
    fn requested_attributes_carry_the_mandatory_flag() {
        let mut input = Input::new(kOfxMeshMainInput, Weak::new());
        let definition = AttributeDefinition {
            attachment: Attachment::Corner,
            component_count: 2,
            kind: AttributeType::Float,
            semantic: None,
        };
        input.request_attribute(cstr!("uv0"), &definition, true).unwrap();

        let attr = input
            .requested_attributes()
            .find(Attachment::Corner, cstr!("uv0"))
            .unwrap();
        assert_eq!(attr.properties().int(kMeshAttribRequestPropMandatory, 0), Some(1));
        assert_eq!(attr.component_count(), 2);
        assert!(input.mesh().attributes().is_empty());
    }
}
