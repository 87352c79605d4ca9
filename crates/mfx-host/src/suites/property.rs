use std::ffi::{c_char, c_int, c_void, CStr};

use mfx_sys::*;

use super::{c_str, props_mut, write_out};
use crate::error::{into_status, MfxError};
use crate::properties::{PropertySet, RawPointer, Value};

pub static PROPERTY_SUITE_V1: OfxPropertySuiteV1 = OfxPropertySuiteV1 {
    propSetPointer: Some(prop_set_pointer),
    propSetString: Some(prop_set_string),
    propSetDouble: Some(prop_set_double),
    propSetInt: Some(prop_set_int),
    propSetPointerN: Some(prop_set_pointer_n),
    propSetStringN: Some(prop_set_string_n),
    propSetDoubleN: Some(prop_set_double_n),
    propSetIntN: Some(prop_set_int_n),
    propGetPointer: Some(prop_get_pointer),
    propGetString: Some(prop_get_string),
    propGetDouble: Some(prop_get_double),
    propGetInt: Some(prop_get_int),
    propGetPointerN: Some(prop_get_pointer_n),
    propGetStringN: Some(prop_get_string_n),
    propGetDoubleN: Some(prop_get_double_n),
    propGetIntN: Some(prop_get_int_n),
    propReset: Some(prop_reset),
    propGetDimension: Some(prop_get_dimension),
};

unsafe fn with_props(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    f: impl FnOnce(&mut PropertySet, &CStr) -> Result<(), MfxError>,
) -> OfxStatus {
    into_status((|| {
        let props = props_mut(handle)?;
        let key = c_str(key).ok_or(MfxError::BadHandle)?;
        f(props, key)
    })())
}

unsafe fn slice<'a, T>(values: *const T, count: c_int) -> Result<&'a [T], MfxError> {
    let count = usize::try_from(count).map_err(|_| MfxError::BadIndex)?;
    if count == 0 {
        return Ok(&[]);
    }
    if values.is_null() {
        return Err(MfxError::BadHandle);
    }
    Ok(std::slice::from_raw_parts(values, count))
}

unsafe extern "C" fn prop_set_pointer(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: *mut c_void,
) -> OfxStatus {
    with_props(handle, key, |props, key| props.set_pointer(key, index, value))
}

unsafe extern "C" fn prop_set_string(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: *const c_char,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        let value = c_str(value).unwrap_or(cstr!(""));
        props.set_string(key, index, value)
    })
}

unsafe extern "C" fn prop_set_double(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: f64,
) -> OfxStatus {
    with_props(handle, key, |props, key| props.set_double(key, index, value))
}

unsafe extern "C" fn prop_set_int(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: c_int,
) -> OfxStatus {
    with_props(handle, key, |props, key| props.set_int(key, index, value))
}

unsafe extern "C" fn prop_set_pointer_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *const *mut c_void,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        let values = slice(values, count)?;
        props.set_n(key, values.iter().map(|v| Value::Pointer(RawPointer(*v))).collect())
    })
}

unsafe extern "C" fn prop_set_string_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *const *const c_char,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        let values = slice(values, count)?;
        let values = values
            .iter()
            .map(|v| Value::Str(c_str(*v).unwrap_or(cstr!("")).to_owned()))
            .collect();
        props.set_n(key, values)
    })
}

unsafe extern "C" fn prop_set_double_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *const f64,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        let values = slice(values, count)?;
        props.set_n(key, values.iter().copied().map(Value::Double).collect())
    })
}

unsafe extern "C" fn prop_set_int_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *const c_int,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        let values = slice(values, count)?;
        props.set_n(key, values.iter().copied().map(Value::Int).collect())
    })
}

unsafe extern "C" fn prop_get_pointer(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: *mut *mut c_void,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        write_out(value, props.get_pointer(key, index)?);
        Ok(())
    })
}

unsafe extern "C" fn prop_get_string(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: *mut *mut c_char,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        write_out(value, props.get_string(key, index)?.cast_mut());
        Ok(())
    })
}

unsafe extern "C" fn prop_get_double(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: *mut f64,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        write_out(value, props.get_double(key, index)?);
        Ok(())
    })
}

unsafe extern "C" fn prop_get_int(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    index: c_int,
    value: *mut c_int,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        write_out(value, props.get_int(key, index)?);
        Ok(())
    })
}

/// Reads `count` slots; the schema is checked before the first write to `values`.
unsafe fn get_n<T>(
    values: *mut T,
    count: c_int,
    mut get: impl FnMut(c_int) -> Result<T, MfxError>,
) -> Result<(), MfxError> {
    get(0)?;
    for index in 0..count {
        let value = get(index)?;
        write_out(values.wrapping_add(index as usize), value);
    }
    Ok(())
}

unsafe extern "C" fn prop_get_pointer_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *mut *mut c_void,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        get_n(values, count, |index| props.get_pointer(key, index))
    })
}

unsafe extern "C" fn prop_get_string_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *mut *mut c_char,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        get_n(values, count, |index| {
            props.get_string(key, index).map(<*const c_char>::cast_mut)
        })
    })
}

unsafe extern "C" fn prop_get_double_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *mut f64,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        get_n(values, count, |index| props.get_double(key, index))
    })
}

unsafe extern "C" fn prop_get_int_n(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: c_int,
    values: *mut c_int,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        get_n(values, count, |index| props.get_int(key, index))
    })
}

unsafe extern "C" fn prop_reset(_handle: OfxPropertySetHandle, _key: *const c_char) -> OfxStatus {
    kOfxStatReplyDefault
}

unsafe extern "C" fn prop_get_dimension(
    handle: OfxPropertySetHandle,
    key: *const c_char,
    count: *mut c_int,
) -> OfxStatus {
    with_props(handle, key, |props, key| {
        // Arity is not tracked per property, so every property reports all four slots.
        write_out(count, props.dimension(key) as c_int);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::properties::PropertyContext;
    use crate::suites::property_handle;

    #[test]
    fn suite_rejects_keys_outside_the_schema_without_mutation() {
        let mut props = PropertySet::new(PropertyContext::Attrib);
        let handle = property_handle(&mut props);
        let mut value = 0.0;
        unsafe {
            assert_eq!(
                PROPERTY_SUITE_V1.propSetDouble.unwrap()(handle, kOfxMeshAttribPropStride.as_ptr(), 0, 1.0),
                kOfxStatErrBadHandle
            );
            assert_eq!(
                PROPERTY_SUITE_V1.propGetDouble.unwrap()(handle, kOfxPropLabel.as_ptr(), 0, &mut value),
                kOfxStatErrBadHandle
            );
            assert_eq!(
                PROPERTY_SUITE_V1.propSetInt.unwrap()(handle, kOfxMeshAttribPropStride.as_ptr(), 4, 1),
                kOfxStatErrBadIndex
            );
        }
        assert!(props.is_empty());
    }

    #[test]
    fn suite_reads_back_written_values() {
        let mut props = PropertySet::new(PropertyContext::Mesh);
        let handle = property_handle(&mut props);
        let mut count = 0;
        let mut data: *mut c_void = ptr::null_mut();
        let mut marker = 7u8;
        unsafe {
            PROPERTY_SUITE_V1.propSetInt.unwrap()(handle, kOfxMeshPropPointCount.as_ptr(), 0, 42);
            PROPERTY_SUITE_V1.propSetPointer.unwrap()(
                handle,
                kOfxMeshPropInternalData.as_ptr(),
                0,
                ptr::addr_of_mut!(marker).cast(),
            );
            assert_eq!(
                PROPERTY_SUITE_V1.propGetInt.unwrap()(handle, kOfxMeshPropPointCount.as_ptr(), 0, &mut count),
                kOfxStatOK
            );
            PROPERTY_SUITE_V1.propGetPointer.unwrap()(handle, kOfxMeshPropInternalData.as_ptr(), 0, &mut data);
        }
        assert_eq!(count, 42);
        assert_eq!(data, ptr::addr_of_mut!(marker).cast::<c_void>());
    }

    #[test]
    fn n_variants_cover_consecutive_slots() {
        let mut props = PropertySet::new(PropertyContext::Param);
        let handle = property_handle(&mut props);
        let input = [1.0, 2.0, 3.0];
        let mut output = [0.0; 3];
        unsafe {
            assert_eq!(
                PROPERTY_SUITE_V1.propSetDoubleN.unwrap()(handle, kOfxParamPropMax.as_ptr(), 3, input.as_ptr()),
                kOfxStatOK
            );
            assert_eq!(
                PROPERTY_SUITE_V1.propGetDoubleN.unwrap()(
                    handle,
                    kOfxParamPropMax.as_ptr(),
                    3,
                    output.as_mut_ptr()
                ),
                kOfxStatOK
            );
        }
        assert_eq!(output, input);
    }

    #[test]
    fn unset_strings_are_empty_not_null() {
        let mut props = PropertySet::new(PropertyContext::Input);
        let handle = property_handle(&mut props);
        let mut label: *mut c_char = ptr::null_mut();
        unsafe {
            PROPERTY_SUITE_V1.propGetString.unwrap()(handle, kOfxPropLabel.as_ptr(), 0, &mut label);
            assert!(!label.is_null());
            assert_eq!(CStr::from_ptr(label).to_bytes(), b"");
        }
    }

    #[test]
    fn reset_and_dimension_keep_their_fixed_replies() {
        let mut props = PropertySet::new(PropertyContext::Mesh);
        let handle = property_handle(&mut props);
        let mut dimension = 0;
        unsafe {
            assert_eq!(
                PROPERTY_SUITE_V1.propReset.unwrap()(handle, kOfxMeshPropPointCount.as_ptr()),
                kOfxStatReplyDefault
            );
            PROPERTY_SUITE_V1.propGetDimension.unwrap()(handle, kOfxMeshPropFaceCount.as_ptr(), &mut dimension);
        }
        assert_eq!(dimension, 4);
    }

    #[test]
    fn null_handles_are_rejected() {
        let status = unsafe {
            PROPERTY_SUITE_V1.propSetInt.unwrap()(ptr::null_mut(), kOfxMeshPropPointCount.as_ptr(), 0, 1)
        };
        assert_eq!(status, kOfxStatErrBadHandle);
    }
}
