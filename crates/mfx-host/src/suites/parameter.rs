use std::ffi::{c_char, c_int, c_uint};

use mfx_sys::*;

use super::varargs::{self, SUPPORTED};
use super::{c_str, handle_mut, property_handle, write_out};
use crate::error::{into_status, MfxError};
use crate::parameters::{Parameter, ParameterSet, ParameterType, ValueKind};

pub static PARAMETER_SUITE_V1: OfxParameterSuiteV1 = OfxParameterSuiteV1 {
    paramDefine: Some(param_define),
    paramGetHandle: Some(param_get_handle),
    paramSetGetPropertySet: Some(param_set_get_property_set),
    paramGetPropertySet: Some(param_get_property_set),
    paramGetValue: Some(if SUPPORTED {
        varargs::get_value(param_get_value)
    } else {
        varargs::handle_only(unsupported)
    }),
    paramGetValueAtTime: Some(varargs::time(unsupported)),
    paramGetDerivative: Some(varargs::time(unsupported)),
    paramGetIntegral: Some(varargs::integral(unsupported)),
    paramSetValue: Some(if SUPPORTED {
        varargs::set_value(param_set_value)
    } else {
        varargs::handle_only(unsupported)
    }),
    paramSetValueAtTime: Some(varargs::time(unsupported)),
    paramGetNumKeys: Some(param_get_num_keys),
    paramGetKeyTime: Some(param_get_key_time),
    paramGetKeyIndex: Some(param_get_key_index),
    paramDeleteKey: Some(param_delete_key),
    paramDeleteAllKeys: Some(unsupported),
    paramCopy: Some(param_copy),
    paramEditBegin: Some(param_edit_begin),
    paramEditEnd: Some(param_edit_end),
};

unsafe extern "C" fn param_define(
    param_set: OfxParamSetHandle,
    param_type: *const c_char,
    name: *const c_char,
    property_set: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let params = handle_mut::<ParameterSet, _>(param_set)?;
        let name = c_str(name).ok_or(MfxError::BadHandle)?;
        let kind = ParameterType::from_cstr(c_str(param_type).ok_or(MfxError::Unknown)?)?;
        let param = params.define(name, kind)?;
        write_out(property_set, property_handle(&mut param.properties));
        Ok(())
    })())
}

unsafe extern "C" fn param_get_handle(
    param_set: OfxParamSetHandle,
    name: *const c_char,
    param: *mut OfxParamHandle,
    property_set: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let params = handle_mut::<ParameterSet, _>(param_set)?;
        let name = c_str(name).ok_or(MfxError::BadHandle)?;
        let found = params.find_mut(name).ok_or(MfxError::Unknown)?;
        write_out(property_set, property_handle(&mut found.properties));
        write_out(param, (found as *mut Parameter).cast());
        Ok(())
    })())
}

unsafe extern "C" fn param_set_get_property_set(
    param_set: OfxParamSetHandle,
    prop_handle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let params = handle_mut::<ParameterSet, _>(param_set)?;
        write_out(prop_handle, params.effect_properties().cast());
        Ok(())
    })())
}

unsafe extern "C" fn param_get_property_set(
    param: OfxParamHandle,
    prop_handle: *mut OfxPropertySetHandle,
) -> OfxStatus {
    into_status((|| {
        let param = handle_mut::<Parameter, _>(param)?;
        write_out(prop_handle, property_handle(&mut param.properties));
        Ok(())
    })())
}

/// Out-pointers arrive in `a0..a3`, one per dimension, typed by the parameter's slot kind.
unsafe extern "C" fn param_get_value(
    param: OfxParamHandle,
    a0: usize,
    a1: usize,
    a2: usize,
    a3: usize,
) -> OfxStatus {
    into_status((|| {
        let param = handle_mut::<Parameter, _>(param)?;
        let out = [a0, a1, a2, a3];
        let kind = param.parameter_type().value_kind();
        for (index, address) in out.into_iter().enumerate().take(param.parameter_type().dimension()) {
            match kind {
                ValueKind::Int | ValueKind::Boolean => {
                    write_out(address as *mut c_int, param.int_slot(index))
                }
                ValueKind::Double => write_out(address as *mut f64, param.double_slot(index)),
                ValueKind::String => {
                    write_out(address as *mut *const c_char, param.string_slot(index))
                }
                ValueKind::None => {}
            }
        }
        Ok(())
    })())
}

/// Integer-class values arrive in `a0..a3` (ints are promoted, so only the low 32 bits are
/// meaningful), doubles in `f0..f3`.
#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn param_set_value(
    param: OfxParamHandle,
    a0: usize,
    a1: usize,
    a2: usize,
    a3: usize,
    f0: f64,
    f1: f64,
    f2: f64,
    f3: f64,
) -> OfxStatus {
    into_status((|| {
        let param = handle_mut::<Parameter, _>(param)?;
        let ints = [a0, a1, a2, a3];
        let doubles = [f0, f1, f2, f3];
        let kind = param.parameter_type().value_kind();
        for index in 0..param.parameter_type().dimension() {
            match kind {
                ValueKind::Int => param.set_int_slot(index, ints[index] as u32 as i32)?,
                ValueKind::Boolean => {
                    param.set_int_slot(index, i32::from(ints[index] as u32 != 0))?
                }
                ValueKind::Double => param.set_double_slot(index, doubles[index])?,
                ValueKind::String => {
                    let value = c_str(ints[index] as *const c_char).unwrap_or(cstr!(""));
                    param.set_string_slot(index, value)?
                }
                ValueKind::None => {}
            }
        }
        Ok(())
    })())
}

/// Time-varying evaluation and keyframes are not provided by this host.
unsafe extern "C" fn unsupported(_param: OfxParamHandle) -> OfxStatus {
    kOfxStatErrUnsupported
}

unsafe extern "C" fn param_get_num_keys(_param: OfxParamHandle, _count: *mut c_uint) -> OfxStatus {
    kOfxStatErrUnsupported
}

unsafe extern "C" fn param_get_key_time(
    _param: OfxParamHandle,
    _nth_key: c_uint,
    _time: *mut OfxTime,
) -> OfxStatus {
    kOfxStatErrUnsupported
}

unsafe extern "C" fn param_get_key_index(
    _param: OfxParamHandle,
    _time: OfxTime,
    _direction: c_int,
    _index: *mut c_int,
) -> OfxStatus {
    kOfxStatErrUnsupported
}

unsafe extern "C" fn param_delete_key(_param: OfxParamHandle, _time: OfxTime) -> OfxStatus {
    kOfxStatErrUnsupported
}

unsafe extern "C" fn param_copy(
    _to: OfxParamHandle,
    _from: OfxParamHandle,
    _offset: OfxTime,
    _range: *const OfxRangeD,
) -> OfxStatus {
    kOfxStatErrUnsupported
}

unsafe extern "C" fn param_edit_begin(_param_set: OfxParamSetHandle, _name: *const c_char) -> OfxStatus {
    kOfxStatErrUnsupported
}

unsafe extern "C" fn param_edit_end(_param_set: OfxParamSetHandle) -> OfxStatus {
    kOfxStatErrUnsupported
}
