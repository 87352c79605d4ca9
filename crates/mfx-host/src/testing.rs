//! In-process plug-ins for exercising the lifecycle without a bundle on disk.
//!
//! Each slot is an independent plug-in with its own recorded actions and scripted replies, so
//! tests running in parallel never share state as long as they use distinct slots.

#![allow(clippy::declare_interior_mutable_const)]

use std::ffi::{c_char, c_int, c_void, CStr};
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};
use std::sync::Mutex;

use mfx_sys::*;

use crate::registry::PluginRegistry;

pub(crate) const SLOT_COUNT: usize = 12;

pub(crate) struct Slot {
    host: AtomicPtr<OfxHost>,
    pub load: AtomicI32,
    pub describe: AtomicI32,
    pub is_identity: AtomicI32,
    pub cook: AtomicI32,
    actions: Mutex<Vec<String>>,
    described_effect: AtomicPtr<c_void>,
    described_params: AtomicPtr<c_void>,
}

impl Slot {
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn count(&self, action: &str) -> usize {
        self.actions().iter().filter(|a| a.as_str() == action).count()
    }

    pub fn has_host(&self) -> bool {
        !self.host.load(Ordering::SeqCst).is_null()
    }

    /// Load was received more often than Unload.
    pub fn is_loaded(&self) -> bool {
        let actions = self.actions();
        let count = |name: &str| actions.iter().filter(|a| a.as_str() == name).count();
        count("OfxActionLoad") > count("OfxActionUnload")
    }

    /// Effect and parameter-set handles the last Describe received.
    pub fn described_handles(&self) -> (*mut c_void, *mut c_void) {
        (
            self.described_effect.load(Ordering::SeqCst),
            self.described_params.load(Ordering::SeqCst),
        )
    }
}

const SLOT: Slot = Slot {
    host: AtomicPtr::new(ptr::null_mut()),
    load: AtomicI32::new(kOfxStatOK),
    describe: AtomicI32::new(kOfxStatOK),
    is_identity: AtomicI32::new(kOfxStatReplyDefault),
    cook: AtomicI32::new(kOfxStatOK),
    actions: Mutex::new(Vec::new()),
    described_effect: AtomicPtr::new(ptr::null_mut()),
    described_params: AtomicPtr::new(ptr::null_mut()),
};

pub(crate) static SLOTS: [Slot; SLOT_COUNT] = [SLOT; SLOT_COUNT];

struct StaticPlugin(OfxPlugin);
unsafe impl Sync for StaticPlugin {}

const IDS: [&CStr; SLOT_COUNT] = [
    cstr!("Slot0"),
    cstr!("Slot1"),
    cstr!("Slot2"),
    cstr!("Slot3"),
    cstr!("Slot4"),
    cstr!("Slot5"),
    cstr!("Slot6"),
    cstr!("Slot7"),
    cstr!("Slot8"),
    cstr!("Slot9"),
    cstr!("Slot10"),
    cstr!("Slot11"),
];

const fn plugin<const N: usize>() -> StaticPlugin {
    StaticPlugin(OfxPlugin {
        pluginApi: kOfxMeshEffectPluginApi.as_ptr(),
        apiVersion: kOfxMeshEffectPluginApiVersion,
        pluginIdentifier: IDS[N].as_ptr(),
        pluginVersionMajor: 1,
        pluginVersionMinor: 0,
        setHost: Some(set_host::<N>),
        mainEntry: Some(main_entry::<N>),
    })
}

static PLUGINS: [StaticPlugin; SLOT_COUNT] = [
    plugin::<0>(),
    plugin::<1>(),
    plugin::<2>(),
    plugin::<3>(),
    plugin::<4>(),
    plugin::<5>(),
    plugin::<6>(),
    plugin::<7>(),
    plugin::<8>(),
    plugin::<9>(),
    plugin::<10>(),
    plugin::<11>(),
];

unsafe extern "C" fn count() -> c_int {
    1
}

unsafe extern "C" fn get<const N: usize>(nth: c_int) -> *mut OfxPlugin {
    if nth == 0 {
        ptr::addr_of!(PLUGINS[N].0).cast_mut()
    } else {
        ptr::null_mut()
    }
}

const GETTERS: [unsafe extern "C" fn(c_int) -> *mut OfxPlugin; SLOT_COUNT] = [
    get::<0>,
    get::<1>,
    get::<2>,
    get::<3>,
    get::<4>,
    get::<5>,
    get::<6>,
    get::<7>,
    get::<8>,
    get::<9>,
    get::<10>,
    get::<11>,
];

/// A registry holding only the plug-in of `slot`.
pub(crate) fn registry(slot: usize) -> PluginRegistry {
    unsafe { PluginRegistry::from_entry_points(count, GETTERS[slot]) }
}

unsafe extern "C" fn set_host<const N: usize>(host: *mut OfxHost) {
    SLOTS[N].host.store(host, Ordering::SeqCst);
}

unsafe fn suite<T>(host: *mut OfxHost, name: &CStr) -> &'static T {
    let host = &*host;
    let suite = host.fetchSuite.expect("fetchSuite")(host.host, name.as_ptr(), 1);
    &*suite.cast::<T>()
}

unsafe extern "C" fn main_entry<const N: usize>(
    action: *const c_char,
    handle: *const c_void,
    _in_args: OfxPropertySetHandle,
    out_args: OfxPropertySetHandle,
) -> OfxStatus {
    let slot = &SLOTS[N];
    let action = CStr::from_ptr(action);
    if let Ok(mut actions) = slot.actions.lock() {
        actions.push(action.to_string_lossy().into_owned());
    }
    let host = slot.host.load(Ordering::SeqCst);
    let effect = handle.cast_mut().cast::<OfxMeshEffectStruct>();

    if action == kOfxActionLoad {
        slot.load.load(Ordering::SeqCst)
    } else if action == kOfxActionDescribe {
        slot.described_effect.store(effect.cast(), Ordering::SeqCst);
        let param_set = describe(host, effect);
        slot.described_params.store(param_set.cast(), Ordering::SeqCst);
        slot.describe.load(Ordering::SeqCst)
    } else if action == kOfxMeshEffectActionIsIdentity {
        let status = slot.is_identity.load(Ordering::SeqCst);
        if status == kOfxStatOK {
            let props = suite::<OfxPropertySuiteV1>(host, kOfxPropertySuite);
            props.propSetString.expect("propSetString")(
                out_args,
                kOfxPropName.as_ptr(),
                0,
                kOfxMeshMainInput.as_ptr(),
            );
        }
        status
    } else if action == kOfxMeshEffectActionCook {
        let status = slot.cook.load(Ordering::SeqCst);
        if status == kOfxStatOK {
            cook(host, effect)
        } else {
            status
        }
    } else {
        kOfxStatOK
    }
}

/// MainInput, MainOutput and an integer parameter `Count` defaulting to 15.
unsafe fn describe(host: *mut OfxHost, effect: OfxMeshEffectHandle) -> OfxParamSetHandle {
    let mesh = suite::<OfxMeshEffectSuiteV1>(host, kOfxMeshEffectSuite);
    let params = suite::<OfxParameterSuiteV1>(host, kOfxParameterSuite);
    let props = suite::<OfxPropertySuiteV1>(host, kOfxPropertySuite);

    for name in [kOfxMeshMainInput, kOfxMeshMainOutput] {
        let mut input = ptr::null_mut();
        mesh.inputDefine.expect("inputDefine")(effect, name.as_ptr(), &mut input, ptr::null_mut());
    }
    let mut param_set = ptr::null_mut();
    mesh.getParamSet.expect("getParamSet")(effect, &mut param_set);
    let mut param_props = ptr::null_mut();
    params.paramDefine.expect("paramDefine")(
        param_set,
        kOfxParamTypeInteger.as_ptr(),
        cstr!("Count").as_ptr(),
        &mut param_props,
    );
    props.propSetInt.expect("propSetInt")(param_props, kOfxParamPropDefault.as_ptr(), 0, 15);
    param_set
}

/// Copies the input point count to the output and allocates it.
unsafe fn cook(host: *mut OfxHost, effect: OfxMeshEffectHandle) -> OfxStatus {
    let mesh_suite = suite::<OfxMeshEffectSuiteV1>(host, kOfxMeshEffectSuite);
    let props = suite::<OfxPropertySuiteV1>(host, kOfxPropertySuite);

    let fetch = |name: &CStr| {
        let mut input = ptr::null_mut();
        let mut mesh = ptr::null_mut();
        let mut mesh_props = ptr::null_mut();
        mesh_suite.inputGetHandle.expect("inputGetHandle")(
            effect,
            name.as_ptr(),
            &mut input,
            ptr::null_mut(),
        );
        let status =
            mesh_suite.inputGetMesh.expect("inputGetMesh")(input, 0.0, &mut mesh, &mut mesh_props);
        (status, mesh, mesh_props)
    };

    let (status, input, input_props) = fetch(kOfxMeshMainInput);
    if status != kOfxStatOK {
        return status;
    }
    let (status, output, output_props) = fetch(kOfxMeshMainOutput);
    if status != kOfxStatOK {
        mesh_suite.inputReleaseMesh.expect("inputReleaseMesh")(input);
        return status;
    }

    let mut points = 0;
    props.propGetInt.expect("propGetInt")(input_props, kOfxMeshPropPointCount.as_ptr(), 0, &mut points);
    for key in [kOfxMeshPropPointCount, kOfxMeshPropCornerCount, kOfxMeshPropFaceCount] {
        let value = if key == kOfxMeshPropPointCount { points } else { 0 };
        props.propSetInt.expect("propSetInt")(output_props, key.as_ptr(), 0, value);
    }
    let status = mesh_suite.meshAlloc.expect("meshAlloc")(output);

    mesh_suite.inputReleaseMesh.expect("inputReleaseMesh")(input);
    mesh_suite.inputReleaseMesh.expect("inputReleaseMesh")(output);
    status
}
