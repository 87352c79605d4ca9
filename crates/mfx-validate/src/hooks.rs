//! Host hooks binding the configured geometry to the main input and capturing the main output.

use std::ffi::{c_void, CStr};
use std::mem;
use std::sync::Arc;

use mfx_host::ffi::{
    kOfxMeshAttribCornerPoint, kOfxMeshAttribFaceSize, kOfxMeshAttribPointPosition,
    kOfxMeshMainInput, kOfxMeshMainOutput,
};
use mfx_host::{Attachment, Attribute, AttributeData, AttributeType, HostHooks, Mesh, MfxError};
use parking_lot::Mutex;

use crate::config::CookConfig;

/// Flat buffers of the input mesh, laid out the way the default attributes expect them.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticMesh {
    positions: Vec<[f32; 3]>,
    corner_points: Vec<i32>,
    face_sizes: Vec<i32>,
}

impl SyntheticMesh {
    pub fn from_config(config: &CookConfig) -> Self {
        Self {
            positions: config.points.clone(),
            corner_points: config.faces.iter().flatten().copied().collect(),
            face_sizes: config
                .faces
                .iter()
                .map(|face| i32::try_from(face.len()).unwrap_or(i32::MAX))
                .collect(),
        }
    }

    fn counts(&self) -> Result<(i32, i32, i32), MfxError> {
        let count = |len: usize| i32::try_from(len).map_err(|_| MfxError::Value);
        Ok((
            count(self.positions.len())?,
            count(self.corner_points.len())?,
            count(self.face_sizes.len())?,
        ))
    }
}

/// Summary of what a plug-in wrote to its main output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookedMesh {
    pub points: usize,
    pub corners: usize,
    pub faces: usize,
    pub positions: Vec<[f32; 3]>,
}

pub struct ValidatorHooks {
    input: SyntheticMesh,
    output: Arc<Mutex<Option<CookedMesh>>>,
}

impl ValidatorHooks {
    pub fn new(input: SyntheticMesh) -> Self {
        Self {
            input,
            output: Arc::default(),
        }
    }

    /// Slot the main output is captured into when the plug-in releases it.
    pub fn output(&self) -> Arc<Mutex<Option<CookedMesh>>> {
        self.output.clone()
    }
}

fn bind<T>(mesh: &mut Mesh, attachment: Attachment, name: &CStr, data: &[T]) -> Result<(), MfxError> {
    let stride = i32::try_from(mem::size_of::<T>()).map_err(|_| MfxError::Value)?;
    let attribute = mesh
        .attribute_mut(attachment, name)
        .ok_or(MfxError::Unknown)?;
    // Input meshes are read-only for plug-ins, the cast only satisfies the property type.
    attribute.bind_borrowed(data.as_ptr().cast_mut().cast::<c_void>(), stride)
}

impl HostHooks for ValidatorHooks {
    fn before_mesh_get(&self, mesh: &mut Mesh) -> Result<(), MfxError> {
        if mesh.input_name() != kOfxMeshMainInput {
            return Ok(());
        }
        let (points, corners, faces) = self.input.counts()?;
        mesh.set_counts(points, corners, faces)?;
        bind(mesh, Attachment::Point, kOfxMeshAttribPointPosition, &self.input.positions)?;
        bind(mesh, Attachment::Corner, kOfxMeshAttribCornerPoint, &self.input.corner_points)?;
        bind(mesh, Attachment::Face, kOfxMeshAttribFaceSize, &self.input.face_sizes)?;
        tracing::debug!(points, corners, faces, "bound synthetic input mesh");
        Ok(())
    }

    fn before_mesh_release(&self, mesh: &mut Mesh) -> Result<(), MfxError> {
        if mesh.input_name() != kOfxMeshMainOutput {
            return Ok(());
        }
        let counts = mesh.element_counts()?;
        let positions = mesh
            .attribute(Attachment::Point, kOfxMeshAttribPointPosition)
            .map(|attribute| read_positions(attribute, counts.points))
            .unwrap_or_default();
        *self.output.lock() = Some(CookedMesh {
            points: counts.points,
            corners: counts.corners,
            faces: counts.faces,
            positions,
        });
        Ok(())
    }
}

/// Reads `count` float3 positions, or nothing when the attribute holds something else.
fn read_positions(attribute: &Attribute, count: usize) -> Vec<[f32; 3]> {
    let Ok(stride) = usize::try_from(attribute.stride()) else {
        return Vec::new();
    };
    if attribute.kind() != Some(AttributeType::Float)
        || attribute.component_count() < 3
        || stride < mem::size_of::<[f32; 3]>()
        || count == 0
    {
        return Vec::new();
    }
    let len = stride * (count - 1) + mem::size_of::<[f32; 3]>();
    let bytes = match attribute.data() {
        AttributeData::Owned(bytes) if bytes.len() >= len => &bytes[..len],
        // SAFETY: a plug-in that forwards memory must keep it valid for the counts it set.
        AttributeData::Borrowed(data) => unsafe { std::slice::from_raw_parts(data, len) },
        _ => return Vec::new(),
    };
    (0..count)
        .map(|index| {
            let element = &bytes[index * stride..];
            std::array::from_fn(|k| {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&element[k * 4..k * 4 + 4]);
                f32::from_ne_bytes(raw)
            })
        })
        .collect()
}
