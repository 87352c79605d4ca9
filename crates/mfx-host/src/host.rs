//! Lifecycle driver: owns the host handle given to plug-ins and dispatches their actions.

use std::cell::UnsafeCell;
use std::ffi::{c_void, CStr};
use std::ptr;
use std::sync::{Arc, Weak};

use mfx_sys::*;

use crate::error::{into_status, ActionError, MfxError, StatusCode};
use crate::inputs::Input;
use crate::mesh::Mesh;
use crate::mesh_effect::{EffectState, MeshEffect};
use crate::properties::{PropertyContext, PropertySet};
use crate::registry::{PluginHandle, PluginStatus};
use crate::suites;

/// Extension points through which the embedding application binds its own mesh data.
///
/// Every hook defaults to doing nothing, so a host without native geometry still runs plug-ins
/// against the generic mesh buffers.
pub trait HostHooks: Send + Sync {
    /// Called by `inputGetMesh` after the default attributes were seeded.
    fn before_mesh_get(&self, _mesh: &mut Mesh) -> Result<(), MfxError> {
        Ok(())
    }

    /// Called by `inputReleaseMesh` before owned buffers are freed.
    fn before_mesh_release(&self, _mesh: &mut Mesh) -> Result<(), MfxError> {
        Ok(())
    }

    /// Called by `meshAlloc` before owned attributes get their buffers.
    fn before_mesh_allocate(&self, _mesh: &mut Mesh) -> Result<(), MfxError> {
        Ok(())
    }

    /// Called for every input of a freshly created instance.
    fn init_input(&self, _input: &mut Input) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl HostHooks for NoHooks {}

#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Reject IsIdentity and Cook on effects that are not instantiated.
    pub strict_lifecycle: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            strict_lifecycle: true,
        }
    }
}

/// Outcome of the IsIdentity action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The plug-in asks for `input` to be passed through unchanged.
    PassThrough { input: String },
    MustCook,
}

pub struct Host {
    hooks: Box<dyn HostHooks>,
    options: HostOptions,
    // Both cells are handed to plug-ins as raw pointers and mutated through the suites.
    properties: Box<UnsafeCell<PropertySet>>,
    raw: Box<UnsafeCell<OfxHost>>,
    this: Weak<Host>,
}

// Plug-ins reach the cells only through suite calls made during a dispatched action.
unsafe impl Send for Host {}
unsafe impl Sync for Host {}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").field("options", &self.options).finish()
    }
}

impl Host {
    pub fn new(hooks: impl HostHooks + 'static) -> Arc<Self> {
        Self::with_options(hooks, HostOptions::default())
    }

    pub fn with_options(hooks: impl HostHooks + 'static, options: HostOptions) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Host>| {
            let properties = Box::new(UnsafeCell::new(PropertySet::new(PropertyContext::Host)));
            let raw = Box::new(UnsafeCell::new(OfxHost {
                host: properties.get().cast(),
                fetchSuite: Some(suites::fetch_suite),
            }));
            // SAFETY: the set was just created and is not shared yet.
            let props = unsafe { &mut *properties.get() };
            let callbacks: [(&CStr, BeforeMeshCbFunc); 3] = [
                (kOfxHostPropBeforeMeshGetCb, before_mesh_get_cb),
                (kOfxHostPropBeforeMeshReleaseCb, before_mesh_release_cb),
                (kOfxHostPropBeforeMeshAllocateCb, before_mesh_allocate_cb),
            ];
            for (key, callback) in callbacks {
                let _ = props.set_pointer(key, 0, callback as *mut c_void);
            }
            let _ = props.set_pointer(kOfxMeshPropHostHandle, 0, this.as_ptr().cast_mut().cast());

            Self {
                hooks: Box::new(hooks),
                options,
                properties,
                raw,
                this: this.clone(),
            }
        })
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    pub fn hooks(&self) -> &dyn HostHooks {
        self.hooks.as_ref()
    }

    /// The `OfxHost` handed to plug-ins through `setHost`.
    pub fn raw_host(&self) -> *mut OfxHost {
        self.raw.get()
    }

    pub fn properties(&self) -> *mut PropertySet {
        self.properties.get()
    }

    /// Recovers the host from the handle a plug-in passes back.
    ///
    /// # Safety
    ///
    /// `raw` must be null or a handle produced by [`Host::raw_host`] of a live host.
    pub unsafe fn from_raw<'a>(raw: *mut OfxHost) -> Option<&'a Host> {
        let props = raw.as_ref()?.host.cast::<PropertySet>().as_ref()?;
        props
            .pointer(kOfxMeshPropHostHandle, 0)
            .and_then(|host| host.cast::<Host>().as_ref())
    }

    pub(crate) fn mesh_callback(&self, key: &CStr) -> Option<BeforeMeshCbFunc> {
        // SAFETY: read-only access between suite calls.
        let props = unsafe { &*self.properties.get() };
        let callback = props.pointer(key, 0)?;
        if callback.is_null() {
            return None;
        }
        Some(unsafe { std::mem::transmute::<*mut c_void, BeforeMeshCbFunc>(callback) })
    }

    fn dispatch(
        &self,
        plugin: &PluginHandle,
        action: &'static CStr,
        handle: *const c_void,
        in_args: OfxPropertySetHandle,
        out_args: OfxPropertySetHandle,
    ) -> OfxStatus {
        let status = unsafe { plugin.main_entry(action, handle, in_args, out_args) };
        tracing::debug!(
            plugin = %plugin.identifier(),
            action = %action.to_string_lossy(),
            status = status_name(status),
            "dispatched action"
        );
        status
    }

    fn rejected(plugin: &PluginHandle, action: &CStr, status: OfxStatus) -> ActionError {
        let err = ActionError::Rejected {
            plugin: plugin.identifier(),
            action: action_name(action),
            status: StatusCode(status),
        };
        tracing::error!("{err}");
        err
    }

    /// Sends Load to a plug-in that is not loaded yet. A failed load disables the plug-in.
    pub fn load_plugin(&self, plugin: &PluginHandle) -> Result<(), ActionError> {
        match plugin.status() {
            PluginStatus::Ok => return Ok(()),
            PluginStatus::Error => return Err(ActionError::PluginDisabled(plugin.identifier())),
            PluginStatus::NotLoaded => {}
        }
        unsafe { plugin.set_host(self.raw_host()) };
        let status = self.dispatch(plugin, kOfxActionLoad, ptr::null(), ptr::null_mut(), ptr::null_mut());
        match status {
            kOfxStatFailed | kOfxStatErrFatal => {
                plugin.set_status(PluginStatus::Error);
                Err(Self::rejected(plugin, kOfxActionLoad, status))
            }
            other => {
                if other == kOfxStatReplyDefault {
                    tracing::warn!(plugin = %plugin.identifier(), "plug-in ignored the load action");
                }
                plugin.set_status(PluginStatus::Ok);
                Ok(())
            }
        }
    }

    /// Sends Unload and detaches the host. Only loaded plug-ins are unloaded.
    pub fn unload_plugin(&self, plugin: &PluginHandle) -> Result<(), ActionError> {
        if plugin.status() != PluginStatus::Ok {
            return Ok(());
        }
        let status = self.dispatch(plugin, kOfxActionUnload, ptr::null(), ptr::null_mut(), ptr::null_mut());
        unsafe { plugin.set_host(ptr::null_mut()) };
        plugin.set_status(PluginStatus::NotLoaded);
        match status {
            kOfxStatReplyDefault => {
                tracing::warn!(plugin = %plugin.identifier(), "plug-in ignored the unload action");
                Ok(())
            }
            kOfxStatFailed | kOfxStatErrFatal => Err(Self::rejected(plugin, kOfxActionUnload, status)),
            _ => Ok(()),
        }
    }

    /// Runs Describe on a fresh effect. Failures discard the descriptor.
    ///
    /// The effect lives in its final `Arc` allocation before Describe is sent, so the handles the
    /// plug-in keeps from describing stay valid for the life of the descriptor.
    pub fn get_descriptor(&self, plugin: &PluginHandle) -> Result<Arc<MeshEffect>, ActionError> {
        Self::check_enabled(plugin)?;
        let mut descriptor = MeshEffect::new_shared(self.this.clone(), Some(plugin.clone()));
        // Not shared yet, so exclusive access is always granted.
        if let Some(effect) = Arc::get_mut(&mut descriptor) {
            self.describe(plugin, effect)?;
        }
        Ok(descriptor)
    }

    fn describe(&self, plugin: &PluginHandle, effect: &mut MeshEffect) -> Result<(), ActionError> {
        effect.rebind();
        let status = self.dispatch(
            plugin,
            kOfxActionDescribe,
            effect.handle() as *const c_void,
            ptr::null_mut(),
            ptr::null_mut(),
        );
        match status {
            kOfxStatErrMissingHostFeature | kOfxStatErrMemory | kOfxStatFailed | kOfxStatErrFatal => {
                if status == kOfxStatErrFatal {
                    plugin.set_status(PluginStatus::Error);
                }
                Err(Self::rejected(plugin, kOfxActionDescribe, status))
            }
            _ => {
                effect.state = EffectState::Described;
                Ok(())
            }
        }
    }

    pub fn release_descriptor(&self, descriptor: Arc<MeshEffect>) {
        tracing::debug!(
            plugin = ?descriptor.plugin().map(PluginHandle::identifier),
            "releasing descriptor"
        );
        drop(descriptor);
    }

    /// Deep-copies a descriptor, applies parameter defaults and runs CreateInstance.
    pub fn create_instance(&self, descriptor: &MeshEffect) -> Result<Box<MeshEffect>, ActionError> {
        let plugin = descriptor.plugin().ok_or(ActionError::MissingPlugin)?.clone();
        Self::check_enabled(&plugin)?;
        let mut instance = descriptor.deep_copy();
        instance.parameters.apply_defaults();

        let status = self.dispatch(
            &plugin,
            kOfxActionCreateInstance,
            instance.handle() as *const c_void,
            ptr::null_mut(),
            ptr::null_mut(),
        );
        match status {
            kOfxStatErrMemory | kOfxStatFailed | kOfxStatErrFatal => {
                if status == kOfxStatErrFatal {
                    plugin.set_status(PluginStatus::Error);
                }
                return Err(Self::rejected(&plugin, kOfxActionCreateInstance, status));
            }
            _ => {}
        }
        instance.state = EffectState::Instantiated;
        for input in instance.inputs.iter_mut() {
            self.hooks.init_input(input);
        }
        Ok(instance)
    }

    pub fn destroy_instance(&self, mut instance: Box<MeshEffect>) {
        if let Some(plugin) = instance.plugin().cloned() {
            let status = self.dispatch(
                &plugin,
                kOfxActionDestroyInstance,
                instance.handle() as *const c_void,
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if matches!(status, kOfxStatFailed | kOfxStatErrFatal) {
                let _ = Self::rejected(&plugin, kOfxActionDestroyInstance, status);
            }
        }
        for input in instance.inputs.iter_mut() {
            input.mesh.release();
        }
        instance.state = EffectState::Destroyed;
    }

    /// Plug-ins disabled by a failed Load or a Fatal reply receive no further actions.
    fn check_enabled(plugin: &PluginHandle) -> Result<(), ActionError> {
        if plugin.status() == PluginStatus::Error {
            return Err(ActionError::PluginDisabled(plugin.identifier()));
        }
        Ok(())
    }

    fn check_instantiated(&self, effect: &MeshEffect, action: &CStr) -> Result<(), ActionError> {
        if self.options.strict_lifecycle
            && !matches!(effect.state, EffectState::Instantiated | EffectState::Cooked)
        {
            return Err(ActionError::InvalidState {
                action: action_name(action),
                state: effect.state,
            });
        }
        Ok(())
    }

    /// Asks the plug-in whether it would leave an input unchanged.
    pub fn is_identity(&self, effect: &mut MeshEffect) -> Result<Identity, ActionError> {
        self.check_instantiated(effect, kOfxMeshEffectActionIsIdentity)?;
        let plugin = effect.plugin().ok_or(ActionError::MissingPlugin)?.clone();
        Self::check_enabled(&plugin)?;

        let mut in_args = PropertySet::new(PropertyContext::ActionIdentityIn);
        let mut out_args = PropertySet::new(PropertyContext::ActionIdentityOut);
        let _ = in_args.set_int(kOfxPropTime, 0, 0);
        let _ = out_args.set_string(kOfxPropName, 0, cstr!(""));
        let _ = out_args.set_int(kOfxPropTime, 0, 0);

        let status = self.dispatch(
            &plugin,
            kOfxMeshEffectActionIsIdentity,
            effect.handle() as *const c_void,
            ptr::addr_of_mut!(in_args).cast(),
            ptr::addr_of_mut!(out_args).cast(),
        );
        match status {
            kOfxStatOK => {
                let input = out_args
                    .string(kOfxPropName, 0)
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Identity::PassThrough { input })
            }
            kOfxStatErrMemory | kOfxStatFailed | kOfxStatErrFatal => {
                Err(Self::rejected(&plugin, kOfxMeshEffectActionIsIdentity, status))
            }
            _ => Ok(Identity::MustCook),
        }
    }

    /// Runs Cook. `ReplyDefault` is not a legal reply to this action.
    pub fn cook(&self, effect: &mut MeshEffect) -> Result<(), ActionError> {
        self.check_instantiated(effect, kOfxMeshEffectActionCook)?;
        let plugin = effect.plugin().ok_or(ActionError::MissingPlugin)?.clone();
        Self::check_enabled(&plugin)?;
        let status = self.dispatch(
            &plugin,
            kOfxMeshEffectActionCook,
            effect.handle() as *const c_void,
            ptr::null_mut(),
            ptr::null_mut(),
        );
        match status {
            kOfxStatOK => {
                effect.state = EffectState::Cooked;
                Ok(())
            }
            kOfxStatReplyDefault => {
                let err = ActionError::ProtocolViolation {
                    plugin: plugin.identifier(),
                    action: action_name(kOfxMeshEffectActionCook),
                    status: StatusCode(status),
                };
                tracing::error!("{err}");
                Err(err)
            }
            _ => Err(Self::rejected(&plugin, kOfxMeshEffectActionCook, status)),
        }
    }
}

fn action_name(action: &CStr) -> &'static str {
    [
        (kOfxActionLoad, "Load"),
        (kOfxActionUnload, "Unload"),
        (kOfxActionDescribe, "Describe"),
        (kOfxActionCreateInstance, "CreateInstance"),
        (kOfxActionDestroyInstance, "DestroyInstance"),
        (kOfxMeshEffectActionIsIdentity, "IsIdentity"),
        (kOfxMeshEffectActionCook, "Cook"),
    ]
    .into_iter()
    .find(|(key, _)| *key == action)
    .map_or("unknown action", |(_, name)| name)
}

unsafe fn run_hook(
    raw: *mut OfxHost,
    mesh: OfxMeshHandle,
    hook: impl FnOnce(&Host, &mut Mesh) -> Result<(), MfxError>,
) -> OfxStatus {
    let Some(host) = Host::from_raw(raw) else {
        return kOfxStatErrFatal;
    };
    let Some(mesh) = mesh.cast::<Mesh>().as_mut() else {
        return kOfxStatErrBadHandle;
    };
    into_status(hook(host, mesh))
}

unsafe extern "C" fn before_mesh_get_cb(host: *mut OfxHost, mesh: OfxMeshHandle) -> OfxStatus {
    run_hook(host, mesh, |host, mesh| host.hooks.before_mesh_get(mesh))
}

unsafe extern "C" fn before_mesh_release_cb(host: *mut OfxHost, mesh: OfxMeshHandle) -> OfxStatus {
    run_hook(host, mesh, |host, mesh| host.hooks.before_mesh_release(mesh))
}

unsafe extern "C" fn before_mesh_allocate_cb(host: *mut OfxHost, mesh: OfxMeshHandle) -> OfxStatus {
    run_hook(host, mesh, |host, mesh| host.hooks.before_mesh_allocate(mesh))
}
