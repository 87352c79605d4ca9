//! Receiving C-variadic calls without `c_variadic`.
//!
//! On the System V x86-64 and Linux AArch64 ABIs, variadic arguments travel in the same registers
//! as named ones: integer-class values in the general purpose argument registers, floating point
//! values in the vector registers, each class in order. A non-variadic function that names enough
//! trailing `usize` and `f64` parameters therefore observes exactly what the plug-in passed, and
//! is transmuted into the variadic pointer type the suite tables declare. Elsewhere the entries
//! report `ErrUnsupported`.

use std::ffi::c_char;

use mfx_sys::*;

/// Whether variadic arguments can be received on this target.
pub const SUPPORTED: bool = cfg!(any(
    all(target_arch = "x86_64", not(windows)),
    all(target_arch = "aarch64", target_os = "linux")
));

/// Register-passed trailing arguments of a `paramGetValue` call: one out-pointer per dimension.
pub type GetValueShim =
    unsafe extern "C" fn(OfxParamHandle, usize, usize, usize, usize) -> OfxStatus;

/// Register-passed trailing arguments of a `paramSetValue` call. Integer, boolean and string
/// values land in `a*`, doubles in `f*`.
pub type SetValueShim = unsafe extern "C" fn(
    OfxParamHandle,
    usize,
    usize,
    usize,
    usize,
    f64,
    f64,
    f64,
    f64,
) -> OfxStatus;

/// Register-passed trailing arguments of `message` / `setPersistentMessage`: two integer-class
/// and eight floating point format arguments.
///
/// Two integer registers are all x86-64 leaves after the four named arguments; later
/// integer-class arguments go to the stack, interleaved with spilled doubles, and are not read.
/// Directives past the second `%d`, `%s`, `%c` or `%p` are therefore kept verbatim.
pub type MessageShim = unsafe extern "C" fn(
    *mut std::ffi::c_void,
    *const c_char,
    *const c_char,
    *const c_char,
    usize,
    usize,
    f64,
    f64,
    f64,
    f64,
    f64,
    f64,
    f64,
    f64,
) -> OfxStatus;

pub type VariadicParamFn = unsafe extern "C" fn(OfxParamHandle, ...) -> OfxStatus;
pub type VariadicParamTimeFn = unsafe extern "C" fn(OfxParamHandle, OfxTime, ...) -> OfxStatus;
pub type VariadicParamIntegralFn =
    unsafe extern "C" fn(OfxParamHandle, OfxTime, OfxTime, ...) -> OfxStatus;

pub const fn get_value(shim: GetValueShim) -> VariadicParamFn {
    unsafe { std::mem::transmute::<GetValueShim, VariadicParamFn>(shim) }
}

pub const fn set_value(shim: SetValueShim) -> VariadicParamFn {
    unsafe { std::mem::transmute::<SetValueShim, VariadicParamFn>(shim) }
}

pub const fn message(shim: MessageShim) -> OfxMessageFunc {
    unsafe { std::mem::transmute::<MessageShim, OfxMessageFunc>(shim) }
}

type HandleOnly = unsafe extern "C" fn(OfxParamHandle) -> OfxStatus;

/// The callee ignores every argument after the handle, which the C calling convention allows.
pub const fn time(shim: HandleOnly) -> VariadicParamTimeFn {
    unsafe { std::mem::transmute::<HandleOnly, VariadicParamTimeFn>(shim) }
}

pub const fn integral(shim: HandleOnly) -> VariadicParamIntegralFn {
    unsafe { std::mem::transmute::<HandleOnly, VariadicParamIntegralFn>(shim) }
}

pub const fn handle_only(shim: HandleOnly) -> VariadicParamFn {
    unsafe { std::mem::transmute::<HandleOnly, VariadicParamFn>(shim) }
}

/// `message` without trailing arguments, for targets where they cannot be received.
pub type MessageFixed =
    unsafe extern "C" fn(*mut std::ffi::c_void, *const c_char, *const c_char, *const c_char) -> OfxStatus;

pub const fn message_fixed(shim: MessageFixed) -> OfxMessageFunc {
    unsafe { std::mem::transmute::<MessageFixed, OfxMessageFunc>(shim) }
}
