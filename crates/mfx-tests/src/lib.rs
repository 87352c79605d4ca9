//! Fixtures for the end-to-end tests: the demo bundles staged as `.ofx` files and host hooks
//! that feed a known mesh in and capture what comes out.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::{c_void, CStr};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mfx_host::ffi::{
    kOfxMeshAttribCornerPoint, kOfxMeshAttribFaceSize, kOfxMeshAttribPointPosition,
    kOfxMeshMainInput, kOfxMeshMainOutput,
};
use mfx_host::{Attachment, Attribute, AttributeData, HostHooks, Mesh, MfxError};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tempfile::TempDir;

pub const IDENTITY: &str = "mfx_identity";
pub const TEST_PARAMETERS: &str = "mfx_test_parameters";

static BUILT: Lazy<Result<PathBuf, String>> =
    Lazy::new(|| build_demos().map_err(|err| format!("{err:#}")));

/// Directory holding the compiled demo libraries, building them on first use.
///
/// `MFX_TEST_BUNDLE_DIR` points at prebuilt libraries instead.
fn build_demos() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("MFX_TEST_BUNDLE_DIR") {
        return Ok(dir.into());
    }
    let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    // A separate target directory keeps the nested build off the lock of the running one.
    let target = std::env::var_os("CARGO_TARGET_DIR")
        .map_or_else(|| workspace.join("target"), PathBuf::from)
        .join("mfx-bundles");
    let cargo = std::env::var_os("CARGO").unwrap_or_else(|| "cargo".into());
    let status = Command::new(cargo)
        .arg("build")
        .arg("--quiet")
        .arg("--manifest-path")
        .arg(workspace.join("Cargo.toml"))
        .args(["-p", "mfx-identity", "-p", "mfx-test-parameters"])
        .arg("--target-dir")
        .arg(&target)
        .status()
        .context("failed to run cargo")?;
    if !status.success() {
        bail!("building the demo bundles failed: {status}");
    }
    Ok(target.join("debug"))
}

/// Copies the demo library `crate_name` into a fresh directory as `<crate_name>.ofx`.
///
/// Every call yields a distinct file, so each test loads its own copy of the plug-ins.
pub fn stage_bundle(crate_name: &str) -> Result<(TempDir, PathBuf)> {
    let built = match &*BUILT {
        Ok(dir) => dir,
        Err(err) => bail!("demo bundles unavailable: {err}"),
    };
    let library = built.join(format!("{DLL_PREFIX}{crate_name}{DLL_SUFFIX}"));
    let dir = tempfile::Builder::new()
        .prefix("mfx-bundle")
        .tempdir()
        .context("failed to create bundle directory")?;
    let bundle = dir.path().join(format!("{crate_name}.ofx"));
    fs::copy(&library, &bundle)
        .with_context(|| format!("failed to copy {}", library.display()))?;
    Ok((dir, bundle))
}

/// Geometry with the three default attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub corner_points: Vec<i32>,
    pub face_sizes: Vec<i32>,
}

impl MeshData {
    pub fn triangle() -> Self {
        Self {
            positions: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.5], [0.0, 3.0, -1.0]],
            corner_points: vec![0, 1, 2],
            face_sizes: vec![3],
        }
    }
}

/// Binds a [`MeshData`] to the main input and records the main output on release.
pub struct MeshFixture {
    input: MeshData,
    output: Arc<Mutex<Option<MeshData>>>,
}

impl MeshFixture {
    pub fn new(input: MeshData) -> Self {
        Self {
            input,
            output: Arc::default(),
        }
    }

    pub fn output(&self) -> Arc<Mutex<Option<MeshData>>> {
        self.output.clone()
    }
}

fn count(len: usize) -> Result<i32, MfxError> {
    i32::try_from(len).map_err(|_| MfxError::Value)
}

fn bind<T>(mesh: &mut Mesh, attachment: Attachment, name: &CStr, data: &[T]) -> Result<(), MfxError> {
    let stride = count(std::mem::size_of::<T>())?;
    mesh.attribute_mut(attachment, name)
        .ok_or(MfxError::Unknown)?
        .bind_borrowed(data.as_ptr().cast_mut().cast::<c_void>(), stride)
}

/// The first `width` bytes of each of `count` elements.
fn elements(attribute: &Attribute, count: usize, width: usize) -> Vec<Vec<u8>> {
    let stride = usize::try_from(attribute.stride()).unwrap_or(0);
    if count == 0 || stride < width {
        return Vec::new();
    }
    let len = stride * (count - 1) + width;
    let bytes = match attribute.data() {
        AttributeData::Owned(bytes) if bytes.len() >= len => bytes,
        AttributeData::Borrowed(data) => unsafe { std::slice::from_raw_parts(data, len) },
        _ => return Vec::new(),
    };
    (0..count)
        .map(|index| bytes[index * stride..index * stride + width].to_vec())
        .collect()
}

fn word(bytes: &[u8]) -> [u8; 4] {
    let mut word = [0; 4];
    word.copy_from_slice(&bytes[..4]);
    word
}

fn read(mesh: &Mesh) -> Result<MeshData, MfxError> {
    let counts = mesh.element_counts()?;
    let attribute = |attachment: Attachment, name: &CStr| {
        mesh.attribute(attachment, name).ok_or(MfxError::Unknown)
    };
    let points = attribute(Attachment::Point, kOfxMeshAttribPointPosition)?;
    let positions = elements(points, counts.points, 12)
        .iter()
        .map(|bytes| std::array::from_fn(|k| f32::from_ne_bytes(word(&bytes[k * 4..]))))
        .collect();
    let ints = |attachment: Attachment, name: &CStr, count: usize| -> Result<Vec<i32>, MfxError> {
        Ok(elements(attribute(attachment, name)?, count, 4)
            .iter()
            .map(|bytes| i32::from_ne_bytes(word(bytes)))
            .collect())
    };
    Ok(MeshData {
        positions,
        corner_points: ints(Attachment::Corner, kOfxMeshAttribCornerPoint, counts.corners)?,
        face_sizes: ints(Attachment::Face, kOfxMeshAttribFaceSize, counts.faces)?,
    })
}

impl HostHooks for MeshFixture {
    fn before_mesh_get(&self, mesh: &mut Mesh) -> Result<(), MfxError> {
        if mesh.input_name() != kOfxMeshMainInput {
            return Ok(());
        }
        let input = &self.input;
        mesh.set_counts(
            count(input.positions.len())?,
            count(input.corner_points.len())?,
            count(input.face_sizes.len())?,
        )?;
        bind(mesh, Attachment::Point, kOfxMeshAttribPointPosition, &input.positions)?;
        bind(mesh, Attachment::Corner, kOfxMeshAttribCornerPoint, &input.corner_points)?;
        bind(mesh, Attachment::Face, kOfxMeshAttribFaceSize, &input.face_sizes)
    }

    fn before_mesh_release(&self, mesh: &mut Mesh) -> Result<(), MfxError> {
        if mesh.input_name() == kOfxMeshMainOutput {
            *self.output.lock() = Some(read(mesh)?);
        }
        Ok(())
    }
}
