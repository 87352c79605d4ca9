use std::ffi::CStr;
use std::ptr;

use mfx_sys::*;

use crate::runtime::SuiteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    UByte,
    Int,
    Float,
}

impl ComponentType {
    pub fn from_cstr(name: &CStr) -> Option<Self> {
        [
            (kOfxMeshAttribTypeUByte, ComponentType::UByte),
            (kOfxMeshAttribTypeInt, ComponentType::Int),
            (kOfxMeshAttribTypeFloat, ComponentType::Float),
        ]
        .into_iter()
        .find(|(key, _)| *key == name)
        .map(|(_, kind)| kind)
    }

    pub fn as_cstr(self) -> &'static CStr {
        match self {
            ComponentType::UByte => kOfxMeshAttribTypeUByte,
            ComponentType::Int => kOfxMeshAttribTypeInt,
            ComponentType::Float => kOfxMeshAttribTypeFloat,
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            ComponentType::UByte => 1,
            ComponentType::Int => std::mem::size_of::<i32>(),
            ComponentType::Float => std::mem::size_of::<f32>(),
        }
    }
}

/// Raw view of an attribute's memory as published in its properties.
#[derive(Debug, Clone, Copy)]
pub struct AttributeBuffer {
    pub data: *mut u8,
    /// Distance in bytes between two consecutive elements.
    pub stride: usize,
    pub component_count: usize,
    pub kind: ComponentType,
}

impl AttributeBuffer {
    fn element(&self, index: usize) -> *mut u8 {
        self.data.wrapping_add(index * self.stride)
    }
}

/// Copies elements `start..start + count` from `source` into `destination`.
///
/// Only the components both buffers have are copied. Matching types are copied bytewise and
/// unsigned bytes widen to floats in `[0, 1]`; any other conversion is unsupported.
///
/// # Safety
///
/// Both buffers must cover at least `start + count` elements of their stride.
pub unsafe fn copy_attribute(
    destination: &AttributeBuffer,
    source: &AttributeBuffer,
    start: usize,
    count: usize,
) -> Result<(), SuiteError> {
    if count == 0 {
        return Ok(());
    }
    if destination.data.is_null() || source.data.is_null() {
        return Err(SuiteError::Unallocated);
    }
    let components = source.component_count.min(destination.component_count);

    if source.kind == destination.kind {
        let len = components * source.kind.byte_size();
        for index in start..start + count {
            ptr::copy_nonoverlapping(source.element(index), destination.element(index), len);
        }
        return Ok(());
    }

    match (source.kind, destination.kind) {
        (ComponentType::UByte, ComponentType::Float) => {
            for index in start..start + count {
                let src = source.element(index);
                let dst = destination.element(index).cast::<f32>();
                for k in 0..components {
                    dst.add(k).write_unaligned(f32::from(*src.add(k)) / 255.0);
                }
            }
            Ok(())
        }
        (from, to) => {
            log::warn!("cannot convert {from:?} attributes to {to:?}");
            Err(SuiteError::UnsupportedConversion { from, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn buffer<T>(data: &mut [T], component_count: usize, kind: ComponentType) -> AttributeBuffer {
        AttributeBuffer {
            data: data.as_mut_ptr().cast(),
            stride: component_count * kind.byte_size(),
            component_count,
            kind,
        }
    }

    #[test]
    fn same_type_copies_the_requested_range() {
        let mut src = [1i32, 2, 3, 4, 5];
        let mut dst = [0i32; 5];
        let (s, d) = (
            buffer(&mut src, 1, ComponentType::Int),
            buffer(&mut dst, 1, ComponentType::Int),
        );
        unsafe { copy_attribute(&d, &s, 1, 3).unwrap() };
        assert_eq!(dst, [0, 2, 3, 4, 0]);
    }

    #[test]
    fn interleaved_strides_are_respected() {
        // Two float3 positions interleaved with a trailing pad float.
        let mut src = [1.0f32, 2.0, 3.0, -1.0, 4.0, 5.0, 6.0, -1.0];
        let mut dst = [0.0f32; 6];
        let s = AttributeBuffer {
            stride: 16,
            ..buffer(&mut src, 3, ComponentType::Float)
        };
        let d = buffer(&mut dst, 3, ComponentType::Float);
        unsafe { copy_attribute(&d, &s, 0, 2).unwrap() };
        assert_eq!(dst, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn bytes_widen_to_normalised_floats() {
        let mut src = [0u8, 255, 51, 102];
        let mut dst = [9.0f32; 6];
        let s = buffer(&mut src, 2, ComponentType::UByte);
        let d = buffer(&mut dst, 3, ComponentType::Float);
        unsafe { copy_attribute(&d, &s, 0, 2).unwrap() };
        assert_eq!(dst, [0.0, 1.0, 9.0, 0.2, 0.4, 9.0]);
    }

    #[test]
    fn other_conversions_are_unsupported() {
        let mut src = [1i32];
        let mut dst = [0.0f32];
        let s = buffer(&mut src, 1, ComponentType::Int);
        let d = buffer(&mut dst, 1, ComponentType::Float);
        let err = unsafe { copy_attribute(&d, &s, 0, 1).unwrap_err() };
        assert_eq!(err.status(), kOfxStatErrUnsupported);
    }

    #[test]
    fn null_buffers_are_rejected_unless_empty() {
        let mut dst = [0i32];
        let d = buffer(&mut dst, 1, ComponentType::Int);
        let s = AttributeBuffer {
            data: ptr::null_mut(),
            ..d
        };
        unsafe {
            assert!(copy_attribute(&d, &s, 0, 0).is_ok());
            assert_eq!(copy_attribute(&d, &s, 0, 1), Err(SuiteError::Unallocated));
        }
    }

    #[test]
    fn component_types_parse_their_names() {
        for kind in [ComponentType::UByte, ComponentType::Int, ComponentType::Float] {
            assert_eq!(ComponentType::from_cstr(kind.as_cstr()), Some(kind));
        }
        assert_eq!(ComponentType::from_cstr(cstr!("OfxMeshAttribTypeDouble")), None);
    }
}
