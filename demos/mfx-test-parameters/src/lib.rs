//! Reference bundle exercising the parameter and message suites.
//!
//! `TestParameters` defines one parameter of every value type and reports what it read back
//! while cooking. `FailingLoad` and `FailingCook` misbehave on purpose so hosts can test their
//! error paths.

use std::ffi::CStr;

use anyhow::{bail, Result};
use mfx_plugin_authoring::{
    mfx_export, Effect, Plugin, PluginDescriptor, PluginFactory, Properties, Reply, Runtime,
};
use mfx_sys::*;

pub const TEST_PARAMETERS: &CStr = cstr!("TestParameters");
pub const FAILING_LOAD: &CStr = cstr!("FailingLoad");
pub const FAILING_COOK: &CStr = cstr!("FailingCook");

enum DefaultValue {
    Ints(&'static [i32]),
    Doubles(&'static [f64]),
    Text(&'static CStr),
}

/// Every parameter `TestParameters` defines, with its default.
const PARAMETERS: &[(&CStr, &CStr, DefaultValue)] = &[
    (cstr!("Count"), kOfxParamTypeInteger, DefaultValue::Ints(&[15])),
    (cstr!("Count2D"), kOfxParamTypeInteger2D, DefaultValue::Ints(&[25, 87])),
    (cstr!("Count3D"), kOfxParamTypeInteger3D, DefaultValue::Ints(&[12, 45, 1569])),
    (cstr!("Distance"), kOfxParamTypeDouble, DefaultValue::Doubles(&[17.0])),
    (cstr!("Vector2D"), kOfxParamTypeDouble2D, DefaultValue::Doubles(&[12.89, 1.02369])),
    (
        cstr!("Vector3D"),
        kOfxParamTypeDouble3D,
        DefaultValue::Doubles(&[-159.51, 0.00416, 2257896.123]),
    ),
    (cstr!("Color"), kOfxParamTypeRGB, DefaultValue::Doubles(&[0.025363, 0.608, 0.62])),
    (
        cstr!("RGBA Color"),
        kOfxParamTypeRGBA,
        DefaultValue::Doubles(&[0.72, 0.058068, 0.14, 0.5]),
    ),
    (cstr!("Enable Option"), kOfxParamTypeBoolean, DefaultValue::Ints(&[1])),
    (cstr!("Description"), kOfxParamTypeString, DefaultValue::Text(cstr!("Description here!"))),
];

fn define_main_inputs(effect: Effect<'_>) -> Result<()> {
    effect.define_input(kOfxMeshMainInput, cstr!("Main Input"))?;
    effect.define_input(kOfxMeshMainOutput, cstr!("Main Output"))?;
    Ok(())
}

fn set_default(props: Properties<'_>, default: &DefaultValue) -> Result<()> {
    match default {
        DefaultValue::Ints(values) => props.set_ints(kOfxParamPropDefault, values)?,
        DefaultValue::Doubles(values) => props.set_doubles(kOfxParamPropDefault, values)?,
        DefaultValue::Text(value) => props.set_string(kOfxParamPropDefault, 0, value)?,
    }
    Ok(())
}

/// Reads a parameter back through the accessor matching its type.
fn read(effect: Effect<'_>, name: &CStr, kind: &CStr) -> Result<String> {
    let param = effect.param(name)?;
    let text = if kind == kOfxParamTypeInteger {
        param.int()?.to_string()
    } else if kind == kOfxParamTypeInteger2D {
        format!("{:?}", param.int2()?)
    } else if kind == kOfxParamTypeInteger3D {
        format!("{:?}", param.int3()?)
    } else if kind == kOfxParamTypeDouble {
        param.double()?.to_string()
    } else if kind == kOfxParamTypeDouble2D {
        format!("{:?}", param.double2()?)
    } else if kind == kOfxParamTypeDouble3D || kind == kOfxParamTypeRGB {
        format!("{:?}", param.double3()?)
    } else if kind == kOfxParamTypeRGBA {
        format!("{:?}", param.rgba()?)
    } else if kind == kOfxParamTypeBoolean {
        param.boolean()?.to_string()
    } else {
        param.string()?.to_string_lossy().into_owned()
    };
    Ok(text)
}

struct TestParameters;

impl Plugin for TestParameters {
    fn load(&self, runtime: &Runtime) -> Result<()> {
        if !runtime.has_messages() {
            bail!("host has no message suite");
        }
        Ok(())
    }

    fn describe(&self, effect: Effect<'_>) -> Result<()> {
        effect
            .properties()?
            .set_string(kOfxMeshEffectPropContext, 0, kOfxMeshEffectContextFilter)?;
        define_main_inputs(effect)?;
        for (name, kind, default) in PARAMETERS {
            let props = effect.define_param(kind, name)?;
            set_default(props, default)?;
            if *name == cstr!("Distance") {
                props.set_double(kOfxParamPropMin, 0, -10.0)?;
                props.set_double(kOfxParamPropMax, 0, 110.0)?;
                props.set_double(kOfxParamPropDisplayMin, 0, 0.0)?;
                props.set_double(kOfxParamPropDisplayMax, 0, 100.0)?;
            }
        }
        Ok(())
    }

    fn cook(&self, effect: Effect<'_>) -> Result<Reply> {
        let input = effect.input(kOfxMeshMainInput)?.fetch_mesh(0.0)?;
        let points = input.counts()?.points;
        input.release()?;

        for (name, kind, _) in PARAMETERS {
            let value = read(effect, name, kind)?;
            effect.message(kOfxMessageLog, &format!("{} = {value}", name.to_string_lossy()))?;
        }

        if effect.param(cstr!("Enable Option"))?.boolean()? {
            let count = effect.param(cstr!("Count"))?.int()?;
            let summary = format!(
                "read {} parameters, Count is {count}, input has {points} points",
                PARAMETERS.len()
            );
            effect.set_persistent_message(kOfxMessageMessage, &summary)?;
        } else {
            effect.set_persistent_message(kOfxMessageWarning, "option disabled")?;
        }
        Ok(Reply::Ok)
    }
}

/// Refuses to load, so the host must disable it.
struct FailingLoad;

impl Plugin for FailingLoad {
    fn load(&self, _runtime: &Runtime) -> Result<()> {
        bail!("this plug-in never loads")
    }

    fn describe(&self, effect: Effect<'_>) -> Result<()> {
        define_main_inputs(effect)
    }

    fn cook(&self, _effect: Effect<'_>) -> Result<Reply> {
        Ok(Reply::Ok)
    }
}

/// Replies `ReplyDefault` to Cook, which is not a legal reply.
struct FailingCook;

impl Plugin for FailingCook {
    fn describe(&self, effect: Effect<'_>) -> Result<()> {
        define_main_inputs(effect)
    }

    fn cook(&self, _effect: Effect<'_>) -> Result<Reply> {
        log::debug!("FailingCook declines to cook");
        Ok(Reply::Default)
    }
}

pub struct TestParametersFactory;

impl PluginFactory for TestParametersFactory {
    fn descriptors() -> &'static [PluginDescriptor] {
        static DESCRIPTORS: [PluginDescriptor; 3] = [
            PluginDescriptor {
                identifier: TEST_PARAMETERS,
                version: (1, 0),
            },
            PluginDescriptor {
                identifier: FAILING_LOAD,
                version: (1, 0),
            },
            PluginDescriptor {
                identifier: FAILING_COOK,
                version: (1, 0),
            },
        ];
        &DESCRIPTORS
    }

    fn new_plugin(identifier: &CStr) -> Result<Box<dyn Plugin>> {
        if identifier == TEST_PARAMETERS {
            Ok(Box::new(TestParameters))
        } else if identifier == FAILING_LOAD {
            Ok(Box::new(FailingLoad))
        } else if identifier == FAILING_COOK {
            Ok(Box::new(FailingCook))
        } else {
            bail!("unknown plug-in {}", identifier.to_string_lossy())
        }
    }
}

mfx_export!(TestParametersFactory);
