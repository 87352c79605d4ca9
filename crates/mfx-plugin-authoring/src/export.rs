use std::ffi::{c_char, c_int, c_void, CStr};
use std::marker::PhantomData;
use std::ptr;

use mfx_sys::*;
use parking_lot::RwLock;

use crate::author::{Plugin, PluginFactory, Reply};
use crate::runtime::{Runtime, SuiteError};

#[doc(hidden)]
pub use once_cell::sync::Lazy;

/// Most plug-ins a single bundle can export.
pub const MAX_PLUGINS: usize = 8;

type SetHostFn = unsafe extern "C" fn(*mut OfxHost);

#[doc(hidden)]
pub struct PluginSlot {
    identifier: &'static CStr,
    plugin: Option<Box<dyn Plugin>>,
    runtime: RwLock<Option<Runtime>>,
}

/// The `OfxPlugin` records of a bundle and the plug-in state behind them.
#[doc(hidden)]
pub struct PluginTable {
    raw: Box<[OfxPlugin]>,
    slots: Box<[PluginSlot]>,
}

// The raw records only point at 'static identifier strings and entry functions.
unsafe impl Send for PluginTable {}
unsafe impl Sync for PluginTable {}

/// Links a factory to the table `mfx_export!` generated for it.
#[doc(hidden)]
pub trait Exported: PluginFactory {
    fn table() -> &'static PluginTable;
}

impl PluginTable {
    pub fn new<F: Exported>() -> Self {
        let descriptors = F::descriptors();
        if descriptors.len() > MAX_PLUGINS {
            log::error!(
                "bundle declares {} plug-ins, only the first {MAX_PLUGINS} are exported",
                descriptors.len()
            );
        }
        let mut raw = Vec::new();
        let mut slots = Vec::new();
        for (descriptor, (set_host, main_entry)) in descriptors.iter().zip(Shim::<F>::ENTRIES) {
            let plugin = match F::new_plugin(descriptor.identifier) {
                Ok(plugin) => Some(plugin),
                Err(err) => {
                    log::error!(
                        "failed to create plug-in {}: {err:#}",
                        descriptor.identifier.to_string_lossy()
                    );
                    None
                }
            };
            raw.push(OfxPlugin {
                pluginApi: kOfxMeshEffectPluginApi.as_ptr(),
                apiVersion: kOfxMeshEffectPluginApiVersion,
                pluginIdentifier: descriptor.identifier.as_ptr(),
                pluginVersionMajor: descriptor.version.0,
                pluginVersionMinor: descriptor.version.1,
                setHost: Some(set_host),
                mainEntry: Some(main_entry),
            });
            slots.push(PluginSlot {
                identifier: descriptor.identifier,
                plugin,
                runtime: RwLock::new(None),
            });
        }
        Self {
            raw: raw.into_boxed_slice(),
            slots: slots.into_boxed_slice(),
        }
    }

    pub fn count(&self) -> c_int {
        c_int::try_from(self.raw.len()).unwrap_or(0)
    }

    pub fn get(&self, nth: c_int) -> *mut OfxPlugin {
        usize::try_from(nth)
            .ok()
            .and_then(|index| self.raw.get(index))
            .map_or(ptr::null_mut(), |plugin| (plugin as *const OfxPlugin).cast_mut())
    }

    fn set_host(&self, index: usize, host: *mut OfxHost) {
        let Some(slot) = self.slots.get(index) else {
            return;
        };
        let runtime = if host.is_null() {
            None
        } else {
            match unsafe { Runtime::fetch(host) } {
                Ok(runtime) => Some(runtime),
                Err(err) => {
                    log::error!("{}: {err}", slot.identifier.to_string_lossy());
                    None
                }
            }
        };
        *slot.runtime.write() = runtime;
    }

    unsafe fn dispatch(
        &self,
        index: usize,
        action: *const c_char,
        handle: *const c_void,
        out_args: OfxPropertySetHandle,
    ) -> OfxStatus {
        let Some(slot) = self.slots.get(index) else {
            return kOfxStatErrFatal;
        };
        let Some(plugin) = slot.plugin.as_deref() else {
            return kOfxStatErrFatal;
        };
        if action.is_null() {
            return kOfxStatErrBadHandle;
        }
        let action = CStr::from_ptr(action);
        let Some(runtime) = *slot.runtime.read() else {
            log::error!(
                "{} received {} before setHost",
                slot.identifier.to_string_lossy(),
                action.to_string_lossy()
            );
            return kOfxStatErrMissingHostFeature;
        };
        let effect = runtime.effect(handle.cast_mut().cast());

        let result = if action == kOfxActionLoad {
            plugin.load(&runtime).map(|()| kOfxStatOK)
        } else if action == kOfxActionUnload {
            plugin.unload();
            Ok(kOfxStatOK)
        } else if action == kOfxActionDescribe {
            plugin.describe(effect).map(|()| kOfxStatOK)
        } else if action == kOfxActionCreateInstance {
            plugin.create_instance(effect).map(|()| kOfxStatOK)
        } else if action == kOfxActionDestroyInstance {
            plugin.destroy_instance(effect).map(|()| kOfxStatOK)
        } else if action == kOfxMeshEffectActionIsIdentity {
            plugin.is_identity(effect).and_then(|input| match input {
                Some(input) => {
                    runtime.properties(out_args).set_string(kOfxPropName, 0, input)?;
                    Ok(kOfxStatOK)
                }
                None => Ok(kOfxStatReplyDefault),
            })
        } else if action == kOfxMeshEffectActionCook {
            plugin.cook(effect).map(Reply::status)
        } else {
            Ok(kOfxStatReplyDefault)
        };

        result.unwrap_or_else(|err| {
            log::error!(
                "{} failed {}: {err:#}",
                slot.identifier.to_string_lossy(),
                action.to_string_lossy()
            );
            err.downcast_ref::<SuiteError>()
                .map_or(kOfxStatFailed, SuiteError::status)
        })
    }
}

struct Shim<F> {
    _marker: PhantomData<F>,
}

impl<F: Exported> Shim<F> {
    const ENTRIES: [(SetHostFn, OfxPluginEntryPoint); MAX_PLUGINS] = [
        (Self::set_host::<0>, Self::main_entry::<0>),
        (Self::set_host::<1>, Self::main_entry::<1>),
        (Self::set_host::<2>, Self::main_entry::<2>),
        (Self::set_host::<3>, Self::main_entry::<3>),
        (Self::set_host::<4>, Self::main_entry::<4>),
        (Self::set_host::<5>, Self::main_entry::<5>),
        (Self::set_host::<6>, Self::main_entry::<6>),
        (Self::set_host::<7>, Self::main_entry::<7>),
    ];

    unsafe extern "C" fn set_host<const N: usize>(host: *mut OfxHost) {
        F::table().set_host(N, host);
    }

    unsafe extern "C" fn main_entry<const N: usize>(
        action: *const c_char,
        handle: *const c_void,
        _in_args: OfxPropertySetHandle,
        out_args: OfxPropertySetHandle,
    ) -> OfxStatus {
        F::table().dispatch(N, action, handle, out_args)
    }
}

/// Exports the plug-ins of a [`PluginFactory`] as an OpenMfx bundle.
///
/// Emits `OfxGetNumberOfPlugins` and `OfxGetPlugin`. Invoke it once per cdylib.
#[macro_export]
macro_rules! mfx_export {
    ($factory:path) => {
        static __MFX_PLUGINS: $crate::export::Lazy<$crate::export::PluginTable> =
            $crate::export::Lazy::new($crate::export::PluginTable::new::<$factory>);

        impl $crate::export::Exported for $factory {
            fn table() -> &'static $crate::export::PluginTable {
                &__MFX_PLUGINS
            }
        }

        #[no_mangle]
        pub unsafe extern "C" fn OfxGetNumberOfPlugins() -> ::core::ffi::c_int {
            __MFX_PLUGINS.count()
        }

        #[no_mangle]
        pub unsafe extern "C" fn OfxGetPlugin(
            nth: ::core::ffi::c_int,
        ) -> *mut $crate::ffi::OfxPlugin {
            __MFX_PLUGINS.get(nth)
        }
    };
}

#[cfg(test)]
mod tests {
    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::author::PluginDescriptor;
    use crate::runtime::Effect;

    struct Quiet;

    impl Plugin for Quiet {
        fn describe(&self, _effect: Effect<'_>) -> Result<()> {
            Ok(())
        }

        fn cook(&self, _effect: Effect<'_>) -> Result<Reply> {
            Ok(Reply::Default)
        }
    }

    struct TestFactory;

    impl PluginFactory for TestFactory {
        fn descriptors() -> &'static [PluginDescriptor] {
            const DESCRIPTORS: &[PluginDescriptor] = &[
                PluginDescriptor {
                    identifier: cstr!("First"),
                    version: (1, 2),
                },
                PluginDescriptor {
                    identifier: cstr!("Broken"),
                    version: (0, 1),
                },
            ];
            DESCRIPTORS
        }

        fn new_plugin(identifier: &CStr) -> Result<Box<dyn Plugin>> {
            if identifier == cstr!("Broken") {
                bail!("cannot build");
            }
            Ok(Box::new(Quiet))
        }
    }

    mfx_export!(TestFactory);

    #[test]
    fn table_describes_every_plugin() {
        unsafe {
            assert_eq!(OfxGetNumberOfPlugins(), 2);
            let first = &*OfxGetPlugin(0);
            assert_eq!(CStr::from_ptr(first.pluginApi), kOfxMeshEffectPluginApi);
            assert_eq!(first.apiVersion, 1);
            assert_eq!(CStr::from_ptr(first.pluginIdentifier), cstr!("First"));
            assert_eq!((first.pluginVersionMajor, first.pluginVersionMinor), (1, 2));
            assert!(OfxGetPlugin(2).is_null());
            assert!(OfxGetPlugin(-1).is_null());
        }
    }

    #[test]
    fn actions_need_a_host_and_a_plugin() {
        unsafe {
            let first = &*OfxGetPlugin(0);
            let main_entry = first.mainEntry.unwrap();
            let status = main_entry(
                kOfxActionLoad.as_ptr(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
            assert_eq!(status, kOfxStatErrMissingHostFeature);

            let broken = &*OfxGetPlugin(1);
            let status = broken.mainEntry.unwrap()(
                kOfxActionLoad.as_ptr(),
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
            assert_eq!(status, kOfxStatErrFatal);
        }
    }

    #[test]
    fn reply_statuses() {
        assert_eq!(Reply::Ok.status(), kOfxStatOK);
        assert_eq!(Reply::Default.status(), kOfxStatReplyDefault);
    }
}
