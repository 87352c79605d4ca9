//! Reference bundle with a single plug-in that passes its main input through unchanged.

use std::ffi::CStr;

use anyhow::Result;
use mfx_plugin_authoring::{
    copy_attribute, mfx_export, Effect, Mesh, Plugin, PluginDescriptor, PluginFactory, Reply,
};
use mfx_sys::*;

pub const IDENTIFIER: &CStr = cstr!("Identity");

struct Identity;

/// Copies one of the default attributes over `count` elements.
fn copy_default(output: &Mesh<'_>, input: &Mesh<'_>, attachment: &CStr, name: &CStr, count: i32) -> Result<()> {
    let source = input.attribute(attachment, name)?.buffer()?;
    let destination = output.attribute(attachment, name)?.buffer()?;
    let count = usize::try_from(count).unwrap_or(0);
    unsafe { copy_attribute(&destination, &source, 0, count)? };
    Ok(())
}

impl Plugin for Identity {
    fn describe(&self, effect: Effect<'_>) -> Result<()> {
        effect.define_input(kOfxMeshMainInput, cstr!("Main Input"))?;
        effect.define_input(kOfxMeshMainOutput, cstr!("Main Output"))?;
        Ok(())
    }

    fn is_identity(&self, _effect: Effect<'_>) -> Result<Option<&'static CStr>> {
        Ok(Some(kOfxMeshMainInput))
    }

    fn cook(&self, effect: Effect<'_>) -> Result<Reply> {
        let input = effect.input(kOfxMeshMainInput)?.fetch_mesh(0.0)?;
        let output = effect.input(kOfxMeshMainOutput)?.fetch_mesh(0.0)?;

        let counts = input.counts()?;
        output.set_counts(counts)?;
        output.allocate()?;

        copy_default(&output, &input, kOfxMeshAttribPoint, kOfxMeshAttribPointPosition, counts.points)?;
        copy_default(&output, &input, kOfxMeshAttribCorner, kOfxMeshAttribCornerPoint, counts.corners)?;
        copy_default(&output, &input, kOfxMeshAttribFace, kOfxMeshAttribFaceSize, counts.faces)?;

        input.release()?;
        output.release()?;
        Ok(Reply::Ok)
    }
}

pub struct IdentityFactory;

impl PluginFactory for IdentityFactory {
    fn descriptors() -> &'static [PluginDescriptor] {
        static DESCRIPTORS: [PluginDescriptor; 1] = [PluginDescriptor {
            identifier: IDENTIFIER,
            version: (1, 0),
        }];
        &DESCRIPTORS
    }

    fn new_plugin(_identifier: &CStr) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(Identity))
    }
}

mfx_export!(IdentityFactory);
