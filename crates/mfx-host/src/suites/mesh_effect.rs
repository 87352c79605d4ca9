use std::ffi::{c_char, c_int};
use std::ptr;

use mfx_sys::*;

use super::{c_str, handle_mut, property_handle, write_out};
use crate::attributes::{Attachment, AttributeDefinition};
use crate::error::{into_status, MfxError};
use crate::inputs::Input;
use crate::mesh::Mesh;
use crate::mesh_effect::{EffectState, MeshEffect};

pub static MESH_EFFECT_SUITE_V1: OfxMeshEffectSuiteV1 = OfxMeshEffectSuiteV1 {
    getPropertySet: Some(get_property_set),
    getParamSet: Some(get_param_set),
    inputDefine: Some(input_define),
    inputGetHandle: Some(input_get_handle),
    inputGetPropertySet: Some(input_get_property_set),
    inputRequestAttribute: Some(input_request_attribute),
    inputGetMesh: Some(input_get_mesh),
    inputReleaseMesh: Some(input_release_mesh),
    attributeDefine: Some(attribute_define),
    meshGetAttribute: Some(mesh_get_attribute),
    meshGetPropertySet: Some(mesh_get_property_set),
    meshAlloc: Some(mesh_alloc),
    abort: Some(abort),
};

unsafe fn definition(
    attachment: *const c_char,
    component_count: c_int,
    kind: *const c_char,
    semantic: *const c_char,
) -> Result<AttributeDefinition, MfxError> {
    AttributeDefinition::parse(c_str(attachment), component_count, c_str(kind), c_str(semantic))
}

unsafe extern "C" fn get_property_set(
    effect: OfxMeshEffectHandle,
    prop_handle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let effect = handle_mut::<MeshEffect, _>(effect)?;
        write_out(prop_handle, property_handle(&mut effect.properties));
        Ok(())
    })())
}

unsafe extern "C" fn get_param_set(
    effect: OfxMeshEffectHandle,
    param_set: *mut OfxParamSetHandle,
) -> OfxStatus {
    into_status((|| {
        let effect = handle_mut::<MeshEffect, _>(effect)?;
        write_out(param_set, ptr::addr_of_mut!(effect.parameters).cast());
        Ok(())
    })())
}

unsafe extern "C" fn input_define(
    effect: OfxMeshEffectHandle,
    name: *const c_char,
    input: *mut OfxMeshInputHandle,
    property_set: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let effect = handle_mut::<MeshEffect, _>(effect)?;
        let name = c_str(name).ok_or(MfxError::BadHandle)?;
        if effect.state != EffectState::Created {
            let strict = effect
                .host()
                .upgrade()
                .map_or(true, |host| host.options().strict_lifecycle);
            tracing::warn!(
                input = %name.to_string_lossy(),
                state = ?effect.state,
                "inputDefine called outside of describe"
            );
            if strict {
                return Err(MfxError::Unsupported);
            }
        }
        let host = effect.host().clone();
        let found = effect.inputs.ensure(name, &host);
        write_out(property_set, property_handle(&mut found.properties));
        write_out(input, found.handle());
        Ok(())
    })())
}

unsafe extern "C" fn input_get_handle(
    effect: OfxMeshEffectHandle,
    name: *const c_char,
    input: *mut OfxMeshInputHandle,
    property_set: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let effect = handle_mut::<MeshEffect, _>(effect)?;
        let name = c_str(name).ok_or(MfxError::BadHandle)?;
        let found = effect.inputs.find_mut(name).ok_or(MfxError::Unknown)?;
        write_out(property_set, property_handle(&mut found.properties));
        write_out(input, found.handle());
        Ok(())
    })())
}

unsafe extern "C" fn input_get_property_set(
    input: OfxMeshInputHandle,
    prop_handle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let input = handle_mut::<Input, _>(input)?;
        write_out(prop_handle, property_handle(&mut input.properties));
        Ok(())
    })())
}

unsafe extern "C" fn input_request_attribute(
    input: OfxMeshInputHandle,
    attachment: *const c_char,
    name: *const c_char,
    component_count: c_int,
    kind: *const c_char,
    semantic: *const c_char,
    mandatory: c_int,
) -> OfxStatus {
    into_status((|| {
        let input = handle_mut::<Input, _>(input)?;
        let definition = definition(attachment, component_count, kind, semantic)?;
        let name = c_str(name).ok_or(MfxError::BadHandle)?;
        input.request_attribute(name, &definition, mandatory != 0)?;
        Ok(())
    })())
}

/// Hands out the input's mesh, reset to empty counts and the default attributes, after the
/// embedding application had a chance to bind its data.
unsafe extern "C" fn input_get_mesh(
    input: OfxMeshInputHandle,
    _time: OfxTime,
    mesh_handle: *mut OfxMeshHandle,
    property_set: *mut OfxPropertySetHandle,
) -> OfxStatus {
    write_out(mesh_handle, ptr::null_mut());
    write_out(property_set, ptr::null_mut());
    into_status((|| {
        let input = handle_mut::<Input, _>(input)?;
        let mesh: *mut Mesh = &mut input.mesh;
        (*mesh).prepare()?;
        Mesh::run_host_callback(mesh, kOfxHostPropBeforeMeshGetCb)?;
        write_out(mesh_handle, (*mesh).handle());
        write_out(property_set, property_handle(&mut (*mesh).properties));
        Ok(())
    })())
}

/// The release hook runs first so the application can read the results. Buffers are freed
/// even when it fails.
unsafe extern "C" fn input_release_mesh(mesh: OfxMeshHandle) -> OfxStatus {
    let mesh = mesh.cast::<Mesh>();
    if mesh.is_null() {
        return kOfxStatErrBadHandle;
    }
    let hook = Mesh::run_host_callback(mesh, kOfxHostPropBeforeMeshReleaseCb);
    (*mesh).release();
    into_status(hook)
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn attribute_define(
    mesh: OfxMeshHandle,
    attachment: *const c_char,
    name: *const c_char,
    component_count: c_int,
    kind: *const c_char,
    semantic: *const c_char,
    attribute_handle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let mesh = handle_mut::<Mesh, _>(mesh)?;
        let definition = definition(attachment, component_count, kind, semantic)?;
        let name = c_str(name).ok_or(MfxError::BadHandle)?;
        let attribute = mesh.define_attribute(name, &definition)?;
        write_out(attribute_handle, property_handle(&mut attribute.properties));
        Ok(())
    })())
}

unsafe extern "C" fn mesh_get_attribute(
    mesh: OfxMeshHandle,
    attachment: *const c_char,
    name: *const c_char,
    attribute_handle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let mesh = handle_mut::<Mesh, _>(mesh)?;
        let attachment = c_str(attachment)
            .and_then(Attachment::from_cstr)
            .ok_or(MfxError::BadIndex)?;
        let name = c_str(name).ok_or(MfxError::BadIndex)?;
        let attribute = mesh
            .attribute_mut(attachment, name)
            .ok_or(MfxError::BadIndex)?;
        write_out(attribute_handle, property_handle(&mut attribute.properties));
        Ok(())
    })())
}

unsafe extern "C" fn mesh_get_property_set(
    mesh: OfxMeshHandle,
    prop_handle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let mesh = handle_mut::<Mesh, _>(mesh)?;
        write_out(prop_handle, property_handle(&mut mesh.properties));
        Ok(())
    })())
}

unsafe extern "C" fn mesh_alloc(mesh: OfxMeshHandle) -> OfxStatus {
    let mesh = mesh.cast::<Mesh>();
    if mesh.is_null() {
        return kOfxStatErrBadHandle;
    }
    into_status((|| {
        let counts = (*mesh).element_counts()?;
        Mesh::run_host_callback(mesh, kOfxHostPropBeforeMeshAllocateCb)?;
        (*mesh).allocate(counts)
    })())
}

unsafe extern "C" fn abort(effect: OfxMeshEffectHandle) -> c_int {
    match effect.cast::<MeshEffect>().as_ref() {
        Some(effect) => c_int::from(effect.abort_handle().is_aborted()),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use std::sync::Weak;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::attributes::{Attribute, AttributeData, AttributeType};
    use crate::parameters::ParameterSet;
    use crate::properties::PropertySet;
    use crate::suites::PROPERTY_SUITE_V1;

    fn effect() -> Box<MeshEffect> {
        MeshEffect::new(Weak::new(), None)
    }

    unsafe fn define_input(effect: &mut MeshEffect, name: &CStr) -> (OfxStatus, OfxMeshInputHandle) {
        let mut input = ptr::null_mut();
        let status = MESH_EFFECT_SUITE_V1.inputDefine.unwrap()(
            effect.handle(),
            name.as_ptr(),
            &mut input,
            ptr::null_mut(),
        );
        (status, input)
    }

    unsafe fn get_mesh(input: OfxMeshInputHandle) -> OfxMeshHandle {
        let mut mesh = ptr::null_mut();
        let status =
            MESH_EFFECT_SUITE_V1.inputGetMesh.unwrap()(input, 0.0, &mut mesh, ptr::null_mut());
        assert_eq!(status, kOfxStatOK);
        mesh
    }

    unsafe fn set_counts(mesh: OfxMeshHandle, points: i32, corners: i32, faces: i32) {
        let mut props = ptr::null_mut();
        MESH_EFFECT_SUITE_V1.meshGetPropertySet.unwrap()(mesh, &mut props);
        let set_int = PROPERTY_SUITE_V1.propSetInt.unwrap();
        set_int(props, kOfxMeshPropPointCount.as_ptr(), 0, points);
        set_int(props, kOfxMeshPropCornerCount.as_ptr(), 0, corners);
        set_int(props, kOfxMeshPropFaceCount.as_ptr(), 0, faces);
    }

    fn owned_len(attribute: &Attribute) -> usize {
        match attribute.data() {
            AttributeData::Owned(bytes) => bytes.len(),
            other => panic!("expected an owned buffer, got {other:?}"),
        }
    }

    #[test]
    fn effect_level_handles() {
        let mut effect = effect();
        let mut props = ptr::null_mut();
        let mut params = ptr::null_mut();
        unsafe {
            MESH_EFFECT_SUITE_V1.getPropertySet.unwrap()(effect.handle(), &mut props);
            MESH_EFFECT_SUITE_V1.getParamSet.unwrap()(effect.handle(), &mut params);
            assert_eq!(
                MESH_EFFECT_SUITE_V1.getPropertySet.unwrap()(ptr::null_mut(), &mut props),
                kOfxStatErrBadHandle
            );
        }
        assert_eq!(props.cast::<PropertySet>(), ptr::addr_of_mut!(effect.properties));
        assert_eq!(params.cast::<ParameterSet>(), ptr::addr_of_mut!(effect.parameters));
    }

    #[test]
    fn inputs_are_find_or_create_and_stable() {
        let mut effect = effect();
        unsafe {
            let (status, first) = define_input(&mut effect, kOfxMeshMainInput);
            assert_eq!(status, kOfxStatOK);
            define_input(&mut effect, kOfxMeshMainOutput);
            let (_, again) = define_input(&mut effect, kOfxMeshMainInput);
            assert_eq!(first, again);

            let mut looked_up = ptr::null_mut();
            assert_eq!(
                MESH_EFFECT_SUITE_V1.inputGetHandle.unwrap()(
                    effect.handle(),
                    kOfxMeshMainInput.as_ptr(),
                    &mut looked_up,
                    ptr::null_mut()
                ),
                kOfxStatOK
            );
            assert_eq!(looked_up, first);
            assert_eq!(
                MESH_EFFECT_SUITE_V1.inputGetHandle.unwrap()(
                    effect.handle(),
                    cstr!("Missing").as_ptr(),
                    &mut looked_up,
                    ptr::null_mut()
                ),
                kOfxStatErrUnknown
            );
        }
        assert_eq!(effect.inputs().len(), 2);
    }

    #[test]
    fn inputs_cannot_be_defined_after_describe() {
        let mut effect = effect();
        effect.state = EffectState::Instantiated;
        unsafe {
            assert_eq!(define_input(&mut effect, kOfxMeshMainInput).0, kOfxStatErrUnsupported);
        }
        assert!(effect.inputs().is_empty());
    }

    #[test]
    fn requested_attributes_are_validated() {
        let mut effect = effect();
        unsafe {
            let (_, input) = define_input(&mut effect, kOfxMeshMainInput);
            let request = MESH_EFFECT_SUITE_V1.inputRequestAttribute.unwrap();
            assert_eq!(
                request(
                    input,
                    kOfxMeshAttribPoint.as_ptr(),
                    cstr!("uv").as_ptr(),
                    2,
                    kOfxMeshAttribTypeFloat.as_ptr(),
                    kOfxMeshAttribSemanticTextureCoordinate.as_ptr(),
                    1
                ),
                kOfxStatOK
            );
            assert_eq!(
                request(
                    input,
                    kOfxMeshAttribPoint.as_ptr(),
                    cstr!("bad").as_ptr(),
                    5,
                    kOfxMeshAttribTypeFloat.as_ptr(),
                    ptr::null(),
                    0
                ),
                kOfxStatErrValue
            );
            assert_eq!(
                request(
                    input,
                    cstr!("OfxMeshAttribEdge").as_ptr(),
                    cstr!("bad").as_ptr(),
                    1,
                    kOfxMeshAttribTypeInt.as_ptr(),
                    ptr::null(),
                    0
                ),
                kOfxStatErrBadIndex
            );
        }
        let input = effect.inputs().find(kOfxMeshMainInput).unwrap();
        assert_eq!(input.requested_attributes().len(), 1);
        let uv = input
            .requested_attributes()
            .find(Attachment::Point, cstr!("uv"))
            .unwrap();
        assert_eq!(uv.properties().int(kMeshAttribRequestPropMandatory, 0), Some(1));
    }

    #[test]
    fn fetched_meshes_carry_the_default_attributes() {
        let mut effect = effect();
        unsafe {
            let (_, input) = define_input(&mut effect, kOfxMeshMainInput);
            let mesh = get_mesh(input);
            let mesh = &*mesh.cast::<Mesh>();
            assert_eq!(mesh.point_count(), 0);
            assert_eq!(mesh.attributes().len(), 3);
            let position = mesh
                .attribute(Attachment::Point, kOfxMeshAttribPointPosition)
                .unwrap();
            assert_eq!(position.component_count(), 3);
            assert_eq!(position.kind(), Some(AttributeType::Float));
            assert!(position.is_owner());
        }
    }

    #[test]
    fn allocation_sizes_buffers_from_counts() {
        let mut effect = effect();
        unsafe {
            let (_, output) = define_input(&mut effect, kOfxMeshMainOutput);
            let mesh = get_mesh(output);
            let mut custom = ptr::null_mut();
            assert_eq!(
                MESH_EFFECT_SUITE_V1.attributeDefine.unwrap()(
                    mesh,
                    kOfxMeshAttribPoint.as_ptr(),
                    cstr!("custom").as_ptr(),
                    3,
                    kOfxMeshAttribTypeFloat.as_ptr(),
                    ptr::null(),
                    &mut custom
                ),
                kOfxStatOK
            );
            set_counts(mesh, 10, 24, 6);
            assert_eq!(MESH_EFFECT_SUITE_V1.meshAlloc.unwrap()(mesh), kOfxStatOK);

            let mut looked_up = ptr::null_mut();
            MESH_EFFECT_SUITE_V1.meshGetAttribute.unwrap()(
                mesh,
                kOfxMeshAttribPoint.as_ptr(),
                cstr!("custom").as_ptr(),
                &mut looked_up,
            );
            assert_eq!(looked_up, custom);

            let typed = &*mesh.cast::<Mesh>();
            let attribute = typed.attribute(Attachment::Point, cstr!("custom")).unwrap();
            assert_eq!(attribute.stride(), 12);
            assert_eq!(owned_len(attribute), 120);
            let corners = typed
                .attribute(Attachment::Corner, kOfxMeshAttribCornerPoint)
                .unwrap();
            assert_eq!(owned_len(corners), 24 * 4);
            assert_eq!(
                typed.properties().int(kOfxMeshPropAttributeCount, 0),
                Some(4)
            );

            assert_eq!(MESH_EFFECT_SUITE_V1.inputReleaseMesh.unwrap()(mesh), kOfxStatOK);
            let typed = &*mesh.cast::<Mesh>();
            assert_eq!(typed.point_count(), 0);
            assert!(matches!(
                typed.attribute(Attachment::Point, cstr!("custom")).unwrap().data(),
                AttributeData::Unallocated
            ));
        }
    }

    #[test]
    fn allocation_requires_counts() {
        let mut mesh = Mesh::new(Weak::new());
        unsafe {
            assert_eq!(MESH_EFFECT_SUITE_V1.meshAlloc.unwrap()(mesh.handle()), kOfxStatErrValue);
            assert_eq!(
                MESH_EFFECT_SUITE_V1.meshAlloc.unwrap()(ptr::null_mut()),
                kOfxStatErrBadHandle
            );
        }
    }

    #[test]
    fn missing_attributes_are_bad_index() {
        let mut mesh = Mesh::new(Weak::new());
        let mut handle = ptr::null_mut();
        unsafe {
            assert_eq!(
                MESH_EFFECT_SUITE_V1.meshGetAttribute.unwrap()(
                    mesh.handle(),
                    kOfxMeshAttribPoint.as_ptr(),
                    cstr!("nothing").as_ptr(),
                    &mut handle
                ),
                kOfxStatErrBadIndex
            );
            assert_eq!(
                MESH_EFFECT_SUITE_V1.attributeDefine.unwrap()(
                    mesh.handle(),
                    kOfxMeshAttribFace.as_ptr(),
                    cstr!("weights").as_ptr(),
                    0,
                    kOfxMeshAttribTypeFloat.as_ptr(),
                    ptr::null(),
                    &mut handle
                ),
                kOfxStatErrValue
            );
        }
        assert!(mesh.attributes().is_empty());
    }

    #[test]
    fn abort_reflects_the_handle() {
        let mut effect = effect();
        let abort = MESH_EFFECT_SUITE_V1.abort.unwrap();
        unsafe {
            assert_eq!(abort(effect.handle()), 0);
            effect.abort_handle().abort();
            assert_eq!(abort(effect.handle()), 1);
            assert_eq!(abort(ptr::null_mut()), 0);
        }
    }
}
