use core::ffi::{c_char, c_int, c_uint, c_void};

pub type OfxStatus = c_int;
pub type OfxTime = f64;

pub const kOfxStatOK: OfxStatus = 0;
pub const kOfxStatFailed: OfxStatus = 1;
pub const kOfxStatErrFatal: OfxStatus = 2;
pub const kOfxStatErrUnknown: OfxStatus = 3;
pub const kOfxStatErrMissingHostFeature: OfxStatus = 4;
pub const kOfxStatErrUnsupported: OfxStatus = 5;
pub const kOfxStatErrExists: OfxStatus = 6;
pub const kOfxStatErrFormat: OfxStatus = 7;
pub const kOfxStatErrMemory: OfxStatus = 8;
pub const kOfxStatErrBadHandle: OfxStatus = 9;
pub const kOfxStatErrBadIndex: OfxStatus = 10;
pub const kOfxStatErrValue: OfxStatus = 11;
pub const kOfxStatReplyYes: OfxStatus = 12;
pub const kOfxStatReplyNo: OfxStatus = 13;
pub const kOfxStatReplyDefault: OfxStatus = 14;

/// Symbolic name of a status code, for diagnostics.
pub fn status_name(status: OfxStatus) -> &'static str {
    match status {
        kOfxStatOK => "kOfxStatOK",
        kOfxStatFailed => "kOfxStatFailed",
        kOfxStatErrFatal => "kOfxStatErrFatal",
        kOfxStatErrUnknown => "kOfxStatErrUnknown",
        kOfxStatErrMissingHostFeature => "kOfxStatErrMissingHostFeature",
        kOfxStatErrUnsupported => "kOfxStatErrUnsupported",
        kOfxStatErrExists => "kOfxStatErrExists",
        kOfxStatErrFormat => "kOfxStatErrFormat",
        kOfxStatErrMemory => "kOfxStatErrMemory",
        kOfxStatErrBadHandle => "kOfxStatErrBadHandle",
        kOfxStatErrBadIndex => "kOfxStatErrBadIndex",
        kOfxStatErrValue => "kOfxStatErrValue",
        kOfxStatReplyYes => "kOfxStatReplyYes",
        kOfxStatReplyNo => "kOfxStatReplyNo",
        kOfxStatReplyDefault => "kOfxStatReplyDefault",
        _ => "<unknown status>",
    }
}

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident, $handle:ident) => {
        $(#[$meta])*
        #[repr(C)]
        pub struct $name {
            _private: [u8; 0],
        }

        pub type $handle = *mut $name;
    };
}

opaque_handle!(
    /// Blind property set; the host decides what lies behind it.
    OfxPropertySetStruct,
    OfxPropertySetHandle
);
opaque_handle!(OfxParamSetStruct, OfxParamSetHandle);
opaque_handle!(OfxParamStruct, OfxParamHandle);
opaque_handle!(OfxMeshEffectStruct, OfxMeshEffectHandle);
opaque_handle!(OfxMeshInputStruct, OfxMeshInputHandle);
opaque_handle!(OfxMeshStruct, OfxMeshHandle);

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OfxRangeD {
    pub min: f64,
    pub max: f64,
}

pub type OfxFetchSuiteFunc = unsafe extern "C" fn(
    host: OfxPropertySetHandle,
    suiteName: *const c_char,
    suiteVersion: c_int,
) -> *const c_void;

/// Handed to each plug-in through `setHost`.
#[repr(C)]
#[derive(Debug)]
pub struct OfxHost {
    pub host: OfxPropertySetHandle,
    pub fetchSuite: Option<OfxFetchSuiteFunc>,
}

pub type OfxPluginEntryPoint = unsafe extern "C" fn(
    action: *const c_char,
    handle: *const c_void,
    inArgs: OfxPropertySetHandle,
    outArgs: OfxPropertySetHandle,
) -> OfxStatus;

#[repr(C)]
#[derive(Debug)]
pub struct OfxPlugin {
    pub pluginApi: *const c_char,
    pub apiVersion: c_int,
    pub pluginIdentifier: *const c_char,
    pub pluginVersionMajor: c_uint,
    pub pluginVersionMinor: c_uint,
    pub setHost: Option<unsafe extern "C" fn(host: *mut OfxHost)>,
    pub mainEntry: Option<OfxPluginEntryPoint>,
}

/// `int OfxGetNumberOfPlugins(void)`
pub type OfxGetNumberOfPluginsFunc = unsafe extern "C" fn() -> c_int;
/// `OfxPlugin *OfxGetPlugin(int nth)`
pub type OfxGetPluginFunc = unsafe extern "C" fn(nth: c_int) -> *mut OfxPlugin;
/// Optional `void OfxSetBundleDirectory(const char *path)`
pub type OfxSetBundleDirectoryFunc = unsafe extern "C" fn(path: *const c_char);

/// Host-side hook signature stored under the `OfxHostPropBeforeMesh*Cb` properties.
pub type BeforeMeshCbFunc = unsafe extern "C" fn(host: *mut OfxHost, mesh: OfxMeshHandle) -> OfxStatus;
