use core::ffi::{c_char, c_int, c_uint, c_void};

use crate::types::*;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OfxPropertySuiteV1 {
    pub propSetPointer: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: *mut c_void,
        ) -> OfxStatus,
    >,
    pub propSetString: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: *const c_char,
        ) -> OfxStatus,
    >,
    pub propSetDouble: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: f64,
        ) -> OfxStatus,
    >,
    pub propSetInt: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: c_int,
        ) -> OfxStatus,
    >,
    pub propSetPointerN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *const *mut c_void,
        ) -> OfxStatus,
    >,
    pub propSetStringN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *const *const c_char,
        ) -> OfxStatus,
    >,
    pub propSetDoubleN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *const f64,
        ) -> OfxStatus,
    >,
    pub propSetIntN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *const c_int,
        ) -> OfxStatus,
    >,
    pub propGetPointer: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: *mut *mut c_void,
        ) -> OfxStatus,
    >,
    pub propGetString: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: *mut *mut c_char,
        ) -> OfxStatus,
    >,
    pub propGetDouble: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: *mut f64,
        ) -> OfxStatus,
    >,
    pub propGetInt: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            index: c_int,
            value: *mut c_int,
        ) -> OfxStatus,
    >,
    pub propGetPointerN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *mut *mut c_void,
        ) -> OfxStatus,
    >,
    pub propGetStringN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *mut *mut c_char,
        ) -> OfxStatus,
    >,
    pub propGetDoubleN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *mut f64,
        ) -> OfxStatus,
    >,
    pub propGetIntN: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: c_int,
            value: *mut c_int,
        ) -> OfxStatus,
    >,
    pub propReset: Option<
        unsafe extern "C" fn(properties: OfxPropertySetHandle, property: *const c_char) -> OfxStatus,
    >,
    pub propGetDimension: Option<
        unsafe extern "C" fn(
            properties: OfxPropertySetHandle,
            property: *const c_char,
            count: *mut c_int,
        ) -> OfxStatus,
    >,
}

/// Parameter suite. The value accessors are C-variadic: plug-ins pass one pointer (get) or one
/// value (set) per dimension of the parameter type.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OfxParameterSuiteV1 {
    pub paramDefine: Option<
        unsafe extern "C" fn(
            paramSet: OfxParamSetHandle,
            paramType: *const c_char,
            name: *const c_char,
            propertySet: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub paramGetHandle: Option<
        unsafe extern "C" fn(
            paramSet: OfxParamSetHandle,
            name: *const c_char,
            param: *mut OfxParamHandle,
            propertySet: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub paramSetGetPropertySet: Option<
        unsafe extern "C" fn(
            paramSet: OfxParamSetHandle,
            propHandle: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub paramGetPropertySet: Option<
        unsafe extern "C" fn(
            paramHandle: OfxParamHandle,
            propHandle: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub paramGetValue: Option<unsafe extern "C" fn(paramHandle: OfxParamHandle, ...) -> OfxStatus>,
    pub paramGetValueAtTime:
        Option<unsafe extern "C" fn(paramHandle: OfxParamHandle, time: OfxTime, ...) -> OfxStatus>,
    pub paramGetDerivative:
        Option<unsafe extern "C" fn(paramHandle: OfxParamHandle, time: OfxTime, ...) -> OfxStatus>,
    pub paramGetIntegral: Option<
        unsafe extern "C" fn(
            paramHandle: OfxParamHandle,
            time1: OfxTime,
            time2: OfxTime,
            ...
        ) -> OfxStatus,
    >,
    pub paramSetValue: Option<unsafe extern "C" fn(paramHandle: OfxParamHandle, ...) -> OfxStatus>,
    pub paramSetValueAtTime:
        Option<unsafe extern "C" fn(paramHandle: OfxParamHandle, time: OfxTime, ...) -> OfxStatus>,
    pub paramGetNumKeys: Option<
        unsafe extern "C" fn(paramHandle: OfxParamHandle, numberOfKeys: *mut c_uint) -> OfxStatus,
    >,
    pub paramGetKeyTime: Option<
        unsafe extern "C" fn(
            paramHandle: OfxParamHandle,
            nthKey: c_uint,
            time: *mut OfxTime,
        ) -> OfxStatus,
    >,
    pub paramGetKeyIndex: Option<
        unsafe extern "C" fn(
            paramHandle: OfxParamHandle,
            time: OfxTime,
            direction: c_int,
            index: *mut c_int,
        ) -> OfxStatus,
    >,
    pub paramDeleteKey:
        Option<unsafe extern "C" fn(paramHandle: OfxParamHandle, time: OfxTime) -> OfxStatus>,
    pub paramDeleteAllKeys: Option<unsafe extern "C" fn(paramHandle: OfxParamHandle) -> OfxStatus>,
    pub paramCopy: Option<
        unsafe extern "C" fn(
            paramTo: OfxParamHandle,
            paramFrom: OfxParamHandle,
            dstOffset: OfxTime,
            frameRange: *const OfxRangeD,
        ) -> OfxStatus,
    >,
    pub paramEditBegin: Option<
        unsafe extern "C" fn(paramSet: OfxParamSetHandle, name: *const c_char) -> OfxStatus,
    >,
    pub paramEditEnd: Option<unsafe extern "C" fn(paramSet: OfxParamSetHandle) -> OfxStatus>,
}

pub type OfxMessageFunc = unsafe extern "C" fn(
    handle: *mut c_void,
    messageType: *const c_char,
    messageId: *const c_char,
    format: *const c_char,
    ...
) -> OfxStatus;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OfxMessageSuiteV1 {
    pub message: Option<OfxMessageFunc>,
}

/// Version 2 extends version 1, so a V2 table can be served for either request.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OfxMessageSuiteV2 {
    pub message: Option<OfxMessageFunc>,
    pub setPersistentMessage: Option<OfxMessageFunc>,
    pub clearPersistentMessage: Option<unsafe extern "C" fn(handle: *mut c_void) -> OfxStatus>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OfxMeshEffectSuiteV1 {
    pub getPropertySet: Option<
        unsafe extern "C" fn(
            meshEffect: OfxMeshEffectHandle,
            propHandle: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub getParamSet: Option<
        unsafe extern "C" fn(
            meshEffect: OfxMeshEffectHandle,
            paramSet: *mut OfxParamSetHandle,
        ) -> OfxStatus,
    >,
    pub inputDefine: Option<
        unsafe extern "C" fn(
            meshEffect: OfxMeshEffectHandle,
            name: *const c_char,
            input: *mut OfxMeshInputHandle,
            propertySet: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub inputGetHandle: Option<
        unsafe extern "C" fn(
            meshEffect: OfxMeshEffectHandle,
            name: *const c_char,
            input: *mut OfxMeshInputHandle,
            propertySet: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub inputGetPropertySet: Option<
        unsafe extern "C" fn(
            input: OfxMeshInputHandle,
            propHandle: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub inputRequestAttribute: Option<
        unsafe extern "C" fn(
            input: OfxMeshInputHandle,
            attachment: *const c_char,
            name: *const c_char,
            componentCount: c_int,
            type_: *const c_char,
            semantic: *const c_char,
            mandatory: c_int,
        ) -> OfxStatus,
    >,
    pub inputGetMesh: Option<
        unsafe extern "C" fn(
            input: OfxMeshInputHandle,
            time: OfxTime,
            meshHandle: *mut OfxMeshHandle,
            propertySet: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub inputReleaseMesh: Option<unsafe extern "C" fn(meshHandle: OfxMeshHandle) -> OfxStatus>,
    pub attributeDefine: Option<
        unsafe extern "C" fn(
            meshHandle: OfxMeshHandle,
            attachment: *const c_char,
            name: *const c_char,
            componentCount: c_int,
            type_: *const c_char,
            semantic: *const c_char,
            attributeHandle: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub meshGetAttribute: Option<
        unsafe extern "C" fn(
            meshHandle: OfxMeshHandle,
            attachment: *const c_char,
            name: *const c_char,
            attributeHandle: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub meshGetPropertySet: Option<
        unsafe extern "C" fn(
            mesh: OfxMeshHandle,
            propHandle: *mut OfxPropertySetHandle,
        ) -> OfxStatus,
    >,
    pub meshAlloc: Option<unsafe extern "C" fn(meshHandle: OfxMeshHandle) -> OfxStatus>,
    pub abort: Option<unsafe extern "C" fn(meshEffect: OfxMeshEffectHandle) -> c_int>,
}
