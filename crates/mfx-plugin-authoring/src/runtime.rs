//! Safe wrappers over the suites a plug-in fetches from its host.
//!
//! Every wrapper is a thin `Copy` view pairing a raw handle with the [`Runtime`] it came from.
//! Non-OK statuses surface as [`SuiteError::Status`] naming the suite entry that failed.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;

use mfx_sys::*;
use thiserror::Error;

use crate::attribute::{AttributeBuffer, ComponentType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SuiteError {
    #[error("{call} returned {}", status_name(*.status))]
    Status { call: &'static str, status: OfxStatus },
    #[error("host does not provide {}", .0.to_string_lossy())]
    MissingSuite(&'static CStr),
    #[error("suite entry {0} is missing")]
    MissingEntry(&'static str),
    #[error("attribute has no data")]
    Unallocated,
    #[error("cannot convert {from:?} components to {to:?}")]
    UnsupportedConversion { from: ComponentType, to: ComponentType },
}

impl SuiteError {
    /// The status a plug-in should report for this error.
    pub fn status(&self) -> OfxStatus {
        match self {
            SuiteError::Status { status, .. } => *status,
            SuiteError::MissingSuite(_) | SuiteError::MissingEntry(_) => kOfxStatErrMissingHostFeature,
            SuiteError::Unallocated => kOfxStatErrBadHandle,
            SuiteError::UnsupportedConversion { .. } => kOfxStatErrUnsupported,
        }
    }
}

pub type SuiteResult<T> = Result<T, SuiteError>;

fn check(call: &'static str, status: OfxStatus) -> SuiteResult<()> {
    if status == kOfxStatOK {
        Ok(())
    } else {
        Err(SuiteError::Status { call, status })
    }
}

macro_rules! entry {
    ($suite:expr, $name:ident) => {
        $suite.$name.ok_or(SuiteError::MissingEntry(stringify!($name)))?
    };
}

/// The suites of one host, fetched when it calls `setHost`.
#[derive(Debug, Clone, Copy)]
pub struct Runtime {
    properties: &'static OfxPropertySuiteV1,
    parameters: &'static OfxParameterSuiteV1,
    mesh_effect: &'static OfxMeshEffectSuiteV1,
    messages: Option<&'static OfxMessageSuiteV2>,
}

impl Runtime {
    /// Fetches the property, parameter and mesh effect suites, plus the message suite if the
    /// host has one.
    ///
    /// # Safety
    ///
    /// `host` must be null or point to a host whose suites outlive the returned runtime.
    pub unsafe fn fetch(host: *mut OfxHost) -> SuiteResult<Self> {
        let host = host.as_ref().ok_or(SuiteError::MissingEntry("OfxHost"))?;
        let fetch_suite = host.fetchSuite.ok_or(SuiteError::MissingEntry("fetchSuite"))?;
        let fetch = |name: &'static CStr, version: c_int| fetch_suite(host.host, name.as_ptr(), version);
        let required = |name: &'static CStr| {
            let suite = fetch(name, 1);
            if suite.is_null() {
                Err(SuiteError::MissingSuite(name))
            } else {
                Ok(suite)
            }
        };

        Ok(Self {
            properties: &*required(kOfxPropertySuite)?.cast::<OfxPropertySuiteV1>(),
            parameters: &*required(kOfxParameterSuite)?.cast::<OfxParameterSuiteV1>(),
            mesh_effect: &*required(kOfxMeshEffectSuite)?.cast::<OfxMeshEffectSuiteV1>(),
            messages: fetch(kOfxMessageSuite, 2)
                .cast::<OfxMessageSuiteV2>()
                .as_ref(),
        })
    }

    pub fn effect(&self, handle: OfxMeshEffectHandle) -> Effect<'_> {
        Effect {
            handle,
            runtime: self,
        }
    }

    pub fn properties(&self, handle: OfxPropertySetHandle) -> Properties<'_> {
        Properties {
            handle,
            runtime: self,
        }
    }

    pub fn has_messages(&self) -> bool {
        self.messages.is_some()
    }
}

/// A mesh effect handle, either a descriptor or an instance.
#[derive(Debug, Clone, Copy)]
pub struct Effect<'a> {
    handle: OfxMeshEffectHandle,
    runtime: &'a Runtime,
}

impl<'a> Effect<'a> {
    pub fn handle(&self) -> OfxMeshEffectHandle {
        self.handle
    }

    pub fn properties(&self) -> SuiteResult<Properties<'a>> {
        let mut props = ptr::null_mut();
        let status = unsafe { entry!(self.runtime.mesh_effect, getPropertySet)(self.handle, &mut props) };
        check("getPropertySet", status)?;
        Ok(self.runtime.properties(props))
    }

    /// Defines an input during Describe and gives it a label.
    pub fn define_input(&self, name: &CStr, label: &CStr) -> SuiteResult<Input<'a>> {
        let mut input = ptr::null_mut();
        let mut props = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.mesh_effect, inputDefine)(self.handle, name.as_ptr(), &mut input, &mut props)
        };
        check("inputDefine", status)?;
        let input = Input {
            handle: input,
            properties: self.runtime.properties(props),
            runtime: self.runtime,
        };
        input.properties.set_string(kOfxPropLabel, 0, label)?;
        Ok(input)
    }

    pub fn input(&self, name: &CStr) -> SuiteResult<Input<'a>> {
        let mut input = ptr::null_mut();
        let mut props = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.mesh_effect, inputGetHandle)(self.handle, name.as_ptr(), &mut input, &mut props)
        };
        check("inputGetHandle", status)?;
        Ok(Input {
            handle: input,
            properties: self.runtime.properties(props),
            runtime: self.runtime,
        })
    }

    fn param_set(&self) -> SuiteResult<OfxParamSetHandle> {
        let mut params = ptr::null_mut();
        let status = unsafe { entry!(self.runtime.mesh_effect, getParamSet)(self.handle, &mut params) };
        check("getParamSet", status)?;
        Ok(params)
    }

    /// Defines a parameter of type `kind` and returns its properties for defaults and ranges.
    pub fn define_param(&self, kind: &CStr, name: &CStr) -> SuiteResult<Properties<'a>> {
        let params = self.param_set()?;
        let mut props = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.parameters, paramDefine)(params, kind.as_ptr(), name.as_ptr(), &mut props)
        };
        check("paramDefine", status)?;
        Ok(self.runtime.properties(props))
    }

    pub fn param(&self, name: &CStr) -> SuiteResult<Param<'a>> {
        let params = self.param_set()?;
        let mut param = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.parameters, paramGetHandle)(params, name.as_ptr(), &mut param, ptr::null_mut())
        };
        check("paramGetHandle", status)?;
        Ok(Param {
            handle: param,
            runtime: self.runtime,
        })
    }

    /// Posts a transient message. Text is passed through a `%s` directive so it is never
    /// interpreted as a format string.
    pub fn message(&self, kind: &CStr, text: &str) -> SuiteResult<()> {
        let messages = self.runtime.messages.ok_or(SuiteError::MissingSuite(kOfxMessageSuite))?;
        let text = c_text(text);
        let status = unsafe {
            entry!(messages, message)(
                self.handle.cast(),
                kind.as_ptr(),
                ptr::null(),
                cstr!("%s").as_ptr(),
                text.as_ptr(),
            )
        };
        check("message", status)
    }

    pub fn set_persistent_message(&self, kind: &CStr, text: &str) -> SuiteResult<()> {
        let messages = self.runtime.messages.ok_or(SuiteError::MissingSuite(kOfxMessageSuite))?;
        let text = c_text(text);
        let status = unsafe {
            entry!(messages, setPersistentMessage)(
                self.handle.cast(),
                kind.as_ptr(),
                ptr::null(),
                cstr!("%s").as_ptr(),
                text.as_ptr(),
            )
        };
        check("setPersistentMessage", status)
    }

    pub fn clear_persistent_message(&self) -> SuiteResult<()> {
        let messages = self.runtime.messages.ok_or(SuiteError::MissingSuite(kOfxMessageSuite))?;
        let status = unsafe { entry!(messages, clearPersistentMessage)(self.handle.cast()) };
        check("clearPersistentMessage", status)
    }

    /// True once the host asked the running cook to stop.
    pub fn is_aborted(&self) -> bool {
        match self.runtime.mesh_effect.abort {
            Some(abort) => unsafe { abort(self.handle) != 0 },
            None => false,
        }
    }
}

fn c_text(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
pub struct Input<'a> {
    handle: OfxMeshInputHandle,
    properties: Properties<'a>,
    runtime: &'a Runtime,
}

impl<'a> Input<'a> {
    pub fn handle(&self) -> OfxMeshInputHandle {
        self.handle
    }

    pub fn properties(&self) -> Properties<'a> {
        self.properties
    }

    /// Asks the host to provide an attribute on the meshes of this input.
    pub fn request_attribute(
        &self,
        attachment: &CStr,
        name: &CStr,
        component_count: usize,
        kind: ComponentType,
        semantic: Option<&CStr>,
        mandatory: bool,
    ) -> SuiteResult<()> {
        let status = unsafe {
            entry!(self.runtime.mesh_effect, inputRequestAttribute)(
                self.handle,
                attachment.as_ptr(),
                name.as_ptr(),
                c_int::try_from(component_count).unwrap_or(c_int::MAX),
                kind.as_cstr().as_ptr(),
                semantic.map_or(ptr::null(), CStr::as_ptr),
                c_int::from(mandatory),
            )
        };
        check("inputRequestAttribute", status)
    }

    /// Fetches the mesh of this input. It is released when dropped.
    pub fn fetch_mesh(&self, time: OfxTime) -> SuiteResult<Mesh<'a>> {
        let mut mesh = ptr::null_mut();
        let mut props = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.mesh_effect, inputGetMesh)(self.handle, time, &mut mesh, &mut props)
        };
        check("inputGetMesh", status)?;
        Ok(Mesh {
            handle: mesh,
            properties: self.runtime.properties(props),
            runtime: self.runtime,
            released: false,
        })
    }
}

/// Element counts of a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshCounts {
    pub points: i32,
    pub corners: i32,
    pub faces: i32,
}

/// A fetched mesh. Dropping it releases it back to the host.
#[derive(Debug)]
pub struct Mesh<'a> {
    handle: OfxMeshHandle,
    properties: Properties<'a>,
    runtime: &'a Runtime,
    released: bool,
}

impl<'a> Mesh<'a> {
    pub fn handle(&self) -> OfxMeshHandle {
        self.handle
    }

    pub fn properties(&self) -> Properties<'a> {
        self.properties
    }

    pub fn counts(&self) -> SuiteResult<MeshCounts> {
        Ok(MeshCounts {
            points: self.properties.int(kOfxMeshPropPointCount, 0)?,
            corners: self.properties.int(kOfxMeshPropCornerCount, 0)?,
            faces: self.properties.int(kOfxMeshPropFaceCount, 0)?,
        })
    }

    pub fn set_counts(&self, counts: MeshCounts) -> SuiteResult<()> {
        self.properties.set_int(kOfxMeshPropPointCount, 0, counts.points)?;
        self.properties.set_int(kOfxMeshPropCornerCount, 0, counts.corners)?;
        self.properties.set_int(kOfxMeshPropFaceCount, 0, counts.faces)
    }

    pub fn attribute(&self, attachment: &CStr, name: &CStr) -> SuiteResult<Attribute<'a>> {
        let mut props = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.mesh_effect, meshGetAttribute)(
                self.handle,
                attachment.as_ptr(),
                name.as_ptr(),
                &mut props,
            )
        };
        check("meshGetAttribute", status)?;
        Ok(Attribute {
            properties: self.runtime.properties(props),
        })
    }

    pub fn define_attribute(
        &self,
        attachment: &CStr,
        name: &CStr,
        component_count: usize,
        kind: ComponentType,
        semantic: Option<&CStr>,
    ) -> SuiteResult<Attribute<'a>> {
        let mut props = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.mesh_effect, attributeDefine)(
                self.handle,
                attachment.as_ptr(),
                name.as_ptr(),
                c_int::try_from(component_count).unwrap_or(c_int::MAX),
                kind.as_cstr().as_ptr(),
                semantic.map_or(ptr::null(), CStr::as_ptr),
                &mut props,
            )
        };
        check("attributeDefine", status)?;
        Ok(Attribute {
            properties: self.runtime.properties(props),
        })
    }

    /// Allocates every owned attribute from the counts set on the mesh.
    pub fn allocate(&self) -> SuiteResult<()> {
        let status = unsafe { entry!(self.runtime.mesh_effect, meshAlloc)(self.handle) };
        check("meshAlloc", status)
    }

    pub fn release(mut self) -> SuiteResult<()> {
        self.released = true;
        let status = unsafe { entry!(self.runtime.mesh_effect, inputReleaseMesh)(self.handle) };
        check("inputReleaseMesh", status)
    }
}

impl Drop for Mesh<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Some(release) = self.runtime.mesh_effect.inputReleaseMesh {
            let status = unsafe { release(self.handle) };
            if status != kOfxStatOK {
                log::warn!("releasing a dropped mesh returned {}", status_name(status));
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Attribute<'a> {
    properties: Properties<'a>,
}

impl<'a> Attribute<'a> {
    pub fn properties(&self) -> Properties<'a> {
        self.properties
    }

    pub fn is_owner(&self) -> SuiteResult<bool> {
        Ok(self.properties.int(kOfxMeshAttribPropIsOwner, 0)? != 0)
    }

    /// Reads the data pointer, stride and layout published by the host.
    pub fn buffer(&self) -> SuiteResult<AttributeBuffer> {
        let kind = self.properties.string(kOfxMeshAttribPropType, 0)?;
        let kind = ComponentType::from_cstr(&kind).ok_or(SuiteError::Status {
            call: "propGetString",
            status: kOfxStatErrValue,
        })?;
        let non_negative = |value: i32| usize::try_from(value).unwrap_or(0);
        Ok(AttributeBuffer {
            data: self.properties.pointer(kOfxMeshAttribPropData, 0)?.cast(),
            stride: non_negative(self.properties.int(kOfxMeshAttribPropStride, 0)?),
            component_count: non_negative(self.properties.int(kOfxMeshAttribPropComponentCount, 0)?),
            kind,
        })
    }
}

/// A property set handle: host, effect, input, mesh, attribute or parameter properties.
#[derive(Debug, Clone, Copy)]
pub struct Properties<'a> {
    handle: OfxPropertySetHandle,
    runtime: &'a Runtime,
}

impl<'a> Properties<'a> {
    pub fn handle(&self) -> OfxPropertySetHandle {
        self.handle
    }

    pub fn int(&self, key: &CStr, index: i32) -> SuiteResult<i32> {
        let mut value: c_int = 0;
        let status = unsafe {
            entry!(self.runtime.properties, propGetInt)(self.handle, key.as_ptr(), index, &mut value)
        };
        check("propGetInt", status).map(|()| value)
    }

    pub fn set_int(&self, key: &CStr, index: i32, value: i32) -> SuiteResult<()> {
        let status = unsafe {
            entry!(self.runtime.properties, propSetInt)(self.handle, key.as_ptr(), index, value)
        };
        check("propSetInt", status)
    }

    pub fn double(&self, key: &CStr, index: i32) -> SuiteResult<f64> {
        let mut value = 0.0;
        let status = unsafe {
            entry!(self.runtime.properties, propGetDouble)(self.handle, key.as_ptr(), index, &mut value)
        };
        check("propGetDouble", status).map(|()| value)
    }

    pub fn set_double(&self, key: &CStr, index: i32, value: f64) -> SuiteResult<()> {
        let status = unsafe {
            entry!(self.runtime.properties, propSetDouble)(self.handle, key.as_ptr(), index, value)
        };
        check("propSetDouble", status)
    }

    /// Sets `values.len()` consecutive doubles starting at index 0.
    pub fn set_doubles(&self, key: &CStr, values: &[f64]) -> SuiteResult<()> {
        for (index, value) in (0..).zip(values) {
            self.set_double(key, index, *value)?;
        }
        Ok(())
    }

    pub fn set_ints(&self, key: &CStr, values: &[i32]) -> SuiteResult<()> {
        for (index, value) in (0..).zip(values) {
            self.set_int(key, index, *value)?;
        }
        Ok(())
    }

    /// Copies the string out; the host keeps ownership of its storage.
    pub fn string(&self, key: &CStr, index: i32) -> SuiteResult<CString> {
        let mut value: *mut c_char = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.properties, propGetString)(self.handle, key.as_ptr(), index, &mut value)
        };
        check("propGetString", status)?;
        if value.is_null() {
            return Ok(CString::default());
        }
        Ok(unsafe { CStr::from_ptr(value) }.to_owned())
    }

    pub fn set_string(&self, key: &CStr, index: i32, value: &CStr) -> SuiteResult<()> {
        let status = unsafe {
            entry!(self.runtime.properties, propSetString)(self.handle, key.as_ptr(), index, value.as_ptr())
        };
        check("propSetString", status)
    }

    pub fn pointer(&self, key: &CStr, index: i32) -> SuiteResult<*mut c_void> {
        let mut value = ptr::null_mut();
        let status = unsafe {
            entry!(self.runtime.properties, propGetPointer)(self.handle, key.as_ptr(), index, &mut value)
        };
        check("propGetPointer", status).map(|()| value)
    }

    pub fn set_pointer(&self, key: &CStr, index: i32, value: *mut c_void) -> SuiteResult<()> {
        let status = unsafe {
            entry!(self.runtime.properties, propSetPointer)(self.handle, key.as_ptr(), index, value)
        };
        check("propSetPointer", status)
    }
}

/// A parameter handle. The getters pass one out pointer per dimension, so each must match the
/// parameter's declared type.
#[derive(Debug, Clone, Copy)]
pub struct Param<'a> {
    handle: OfxParamHandle,
    runtime: &'a Runtime,
}

impl<'a> Param<'a> {
    pub fn handle(&self) -> OfxParamHandle {
        self.handle
    }

    pub fn properties(&self) -> SuiteResult<Properties<'a>> {
        let mut props = ptr::null_mut();
        let status = unsafe { entry!(self.runtime.parameters, paramGetPropertySet)(self.handle, &mut props) };
        check("paramGetPropertySet", status)?;
        Ok(self.runtime.properties(props))
    }

    fn get(&self) -> SuiteResult<unsafe extern "C" fn(OfxParamHandle, ...) -> OfxStatus> {
        Ok(entry!(self.runtime.parameters, paramGetValue))
    }

    fn set(&self) -> SuiteResult<unsafe extern "C" fn(OfxParamHandle, ...) -> OfxStatus> {
        Ok(entry!(self.runtime.parameters, paramSetValue))
    }

    /// Integer, boolean and choice parameters.
    pub fn int(&self) -> SuiteResult<i32> {
        let mut value: c_int = 0;
        let status = unsafe { self.get()?(self.handle, &mut value as *mut c_int) };
        check("paramGetValue", status).map(|()| value)
    }

    pub fn int2(&self) -> SuiteResult<[i32; 2]> {
        let mut v: [c_int; 2] = [0; 2];
        let status = unsafe { self.get()?(self.handle, &mut v[0] as *mut c_int, &mut v[1] as *mut c_int) };
        check("paramGetValue", status).map(|()| v)
    }

    pub fn int3(&self) -> SuiteResult<[i32; 3]> {
        let mut v: [c_int; 3] = [0; 3];
        let status = unsafe {
            self.get()?(
                self.handle,
                &mut v[0] as *mut c_int,
                &mut v[1] as *mut c_int,
                &mut v[2] as *mut c_int,
            )
        };
        check("paramGetValue", status).map(|()| v)
    }

    pub fn boolean(&self) -> SuiteResult<bool> {
        self.int().map(|value| value != 0)
    }

    pub fn double(&self) -> SuiteResult<f64> {
        let mut value = 0.0f64;
        let status = unsafe { self.get()?(self.handle, &mut value as *mut f64) };
        check("paramGetValue", status).map(|()| value)
    }

    pub fn double2(&self) -> SuiteResult<[f64; 2]> {
        let mut v = [0.0f64; 2];
        let status = unsafe { self.get()?(self.handle, &mut v[0] as *mut f64, &mut v[1] as *mut f64) };
        check("paramGetValue", status).map(|()| v)
    }

    /// Double3D and RGB parameters.
    pub fn double3(&self) -> SuiteResult<[f64; 3]> {
        let mut v = [0.0f64; 3];
        let status = unsafe {
            self.get()?(
                self.handle,
                &mut v[0] as *mut f64,
                &mut v[1] as *mut f64,
                &mut v[2] as *mut f64,
            )
        };
        check("paramGetValue", status).map(|()| v)
    }

    pub fn rgba(&self) -> SuiteResult<[f64; 4]> {
        let mut v = [0.0f64; 4];
        let status = unsafe {
            self.get()?(
                self.handle,
                &mut v[0] as *mut f64,
                &mut v[1] as *mut f64,
                &mut v[2] as *mut f64,
                &mut v[3] as *mut f64,
            )
        };
        check("paramGetValue", status).map(|()| v)
    }

    pub fn string(&self) -> SuiteResult<CString> {
        let mut value: *const c_char = ptr::null();
        let status = unsafe { self.get()?(self.handle, &mut value as *mut *const c_char) };
        check("paramGetValue", status)?;
        if value.is_null() {
            return Ok(CString::default());
        }
        Ok(unsafe { CStr::from_ptr(value) }.to_owned())
    }

    pub fn set_int(&self, value: i32) -> SuiteResult<()> {
        let status = unsafe { self.set()?(self.handle, value as c_int) };
        check("paramSetValue", status)
    }

    pub fn set_double(&self, value: f64) -> SuiteResult<()> {
        let status = unsafe { self.set()?(self.handle, value) };
        check("paramSetValue", status)
    }

    pub fn set_string(&self, value: &CStr) -> SuiteResult<()> {
        let status = unsafe { self.set()?(self.handle, value.as_ptr()) };
        check("paramSetValue", status)
    }
}
