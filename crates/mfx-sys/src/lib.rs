#![no_std]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

//! Hand-written bindings for the OpenMfx mesh effect ABI.
//!
//! Layouts follow `ofxCore.h`, `ofxProperty.h`, `ofxParam.h`, `ofxMessage.h` and
//! `ofxMeshEffect.h`. Every string constant is exposed as a `&'static CStr` so it can be
//! handed to plug-ins without allocation and compared against incoming `*const c_char`.

/// Builds a `&'static CStr` from a string literal at compile time.
#[macro_export]
macro_rules! cstr {
    ($s:literal) => {
        unsafe { ::core::ffi::CStr::from_bytes_with_nul_unchecked(concat!($s, "\0").as_bytes()) }
    };
}

mod constants;
mod suites;
mod types;

pub use crate::constants::*;
pub use crate::suites::*;
pub use crate::types::*;

/// Mesh effect API identifier a bundle must report in `OfxPlugin::pluginApi`.
pub const kOfxMeshEffectPluginApi: &::core::ffi::CStr = cstr!("OfxMeshEffectPluginAPI");
/// The only API version this host speaks.
pub const kOfxMeshEffectPluginApiVersion: ::core::ffi::c_int = 1;
