//! `extern "C"` suite tables handed to plug-ins through `OfxHost::fetchSuite`.
//!
//! Every entry point is a thin shim: it turns raw handles into references, runs the safe
//! implementation and folds the `Result` back into a status code. Nothing unwinds across the
//! ABI boundary.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::ptr;

use mfx_sys::*;

use crate::error::MfxError;
use crate::properties::PropertySet;

mod format;
mod mesh_effect;
mod message;
mod parameter;
mod property;
mod varargs;

pub use self::mesh_effect::MESH_EFFECT_SUITE_V1;
pub use self::message::MESSAGE_SUITE_V2;
pub use self::parameter::PARAMETER_SUITE_V1;
pub use self::property::PROPERTY_SUITE_V1;
pub use self::varargs::SUPPORTED as VARIADIC_SUPPORTED;

/// `OfxHost::fetchSuite`: name + version lookup over the four static tables.
pub unsafe extern "C" fn fetch_suite(
    _host: OfxPropertySetHandle,
    suite_name: *const c_char,
    suite_version: c_int,
) -> *const c_void {
    let Some(name) = c_str(suite_name) else {
        return ptr::null();
    };
    let (suite, supported): (*const c_void, &str) = if name == kOfxPropertySuite {
        (ptr::addr_of!(PROPERTY_SUITE_V1).cast(), "1")
    } else if name == kOfxParameterSuite {
        (ptr::addr_of!(PARAMETER_SUITE_V1).cast(), "1")
    } else if name == kOfxMessageSuite {
        // Version 2 only appends entries, so one table serves both versions.
        (ptr::addr_of!(MESSAGE_SUITE_V2).cast(), "1 and 2")
    } else if name == kOfxMeshEffectSuite {
        (ptr::addr_of!(MESH_EFFECT_SUITE_V1).cast(), "1")
    } else {
        tracing::warn!(suite = %name.to_string_lossy(), "plug-in requested an unknown suite");
        return ptr::null();
    };

    let version_ok = match suite_version {
        1 => true,
        2 => name == kOfxMessageSuite,
        _ => false,
    };
    if version_ok {
        suite
    } else {
        tracing::warn!(
            suite = %name.to_string_lossy(),
            requested = suite_version,
            "suite is only supported in version {supported}"
        );
        ptr::null()
    }
}

pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr))
    }
}

pub(crate) unsafe fn props_mut<'a>(handle: OfxPropertySetHandle) -> Result<&'a mut PropertySet, MfxError> {
    handle
        .cast::<PropertySet>()
        .as_mut()
        .ok_or(MfxError::BadHandle)
}

/// Dereferences a typed handle, failing with `BadHandle` on null.
pub(crate) unsafe fn handle_mut<'a, T, H>(handle: *mut H) -> Result<&'a mut T, MfxError> {
    handle.cast::<T>().as_mut().ok_or(MfxError::BadHandle)
}

/// Writes an optional out-parameter.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: T) {
    if let Some(out) = out.as_mut() {
        *out = value;
    }
}

pub(crate) fn property_handle(props: &mut PropertySet) -> OfxPropertySetHandle {
    (props as *mut PropertySet).cast()
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn fetch(name: &CStr, version: c_int) -> *const c_void {
        fetch_suite(ptr::null_mut(), name.as_ptr(), version)
    }

    #[test]
    fn known_suites_are_served_in_their_versions() {
        unsafe {
            assert!(!fetch(kOfxPropertySuite, 1).is_null());
            assert!(!fetch(kOfxParameterSuite, 1).is_null());
            assert!(!fetch(kOfxMeshEffectSuite, 1).is_null());
            assert_eq!(fetch(kOfxMessageSuite, 1), fetch(kOfxMessageSuite, 2));

            assert!(fetch(kOfxPropertySuite, 2).is_null());
            assert!(fetch(kOfxMessageSuite, 3).is_null());
            assert!(fetch(cstr!("OfxImageEffectSuite"), 1).is_null());
            assert!(fetch_suite(ptr::null_mut(), ptr::null(), 1).is_null());
        }
    }
}
