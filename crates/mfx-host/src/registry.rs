use std::ffi::{c_void, CStr, CString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;
use mfx_sys::*;
use parking_lot::Mutex;

use crate::error::HostError;

/// Load state of one plug-in of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginStatus {
    NotLoaded,
    Ok,
    /// Load failed; no further action is dispatched to the plug-in.
    Error,
}

struct PluginShared {
    status: Mutex<PluginStatus>,
    _library: Option<Arc<Library>>,
}

/// Shared reference to a plug-in exported by a bundle. Keeps the bundle mapped while alive.
#[derive(Clone)]
pub struct PluginHandle {
    raw: NonNull<OfxPlugin>,
    shared: Arc<PluginShared>,
}

// The plug-in struct is static data inside the bundle, which `shared` keeps loaded.
unsafe impl Send for PluginHandle {}
unsafe impl Sync for PluginHandle {}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("identifier", &self.identifier())
            .field("status", &self.status())
            .finish()
    }
}

fn lossy(ptr: *const std::ffi::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

impl PluginHandle {
    fn plugin(&self) -> &OfxPlugin {
        unsafe { self.raw.as_ref() }
    }

    pub fn identifier(&self) -> String {
        lossy(self.plugin().pluginIdentifier)
    }

    pub fn version(&self) -> (u32, u32) {
        let plugin = self.plugin();
        (plugin.pluginVersionMajor, plugin.pluginVersionMinor)
    }

    pub fn status(&self) -> PluginStatus {
        *self.shared.status.lock()
    }

    pub(crate) fn set_status(&self, status: PluginStatus) {
        *self.shared.status.lock() = status;
    }

    pub fn ptr_eq(&self, other: &PluginHandle) -> bool {
        self.raw == other.raw
    }

    pub(crate) unsafe fn set_host(&self, host: *mut OfxHost) {
        if let Some(set_host) = self.plugin().setHost {
            set_host(host);
        }
    }

    pub(crate) unsafe fn main_entry(
        &self,
        action: &CStr,
        handle: *const c_void,
        in_args: OfxPropertySetHandle,
        out_args: OfxPropertySetHandle,
    ) -> OfxStatus {
        match self.plugin().mainEntry {
            Some(main_entry) => main_entry(action.as_ptr(), handle, in_args, out_args),
            None => {
                tracing::error!(plugin = %self.identifier(), "plug-in has no main entry");
                kOfxStatFailed
            }
        }
    }
}

/// The mesh effect plug-ins exported by one bundle.
pub struct PluginRegistry {
    path: PathBuf,
    plugins: Vec<PluginHandle>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("path", &self.path)
            .field("plugins", &self.plugins)
            .finish()
    }
}

impl PluginRegistry {
    /// Opens a bundle and enumerates its mesh effect plug-ins.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers; the bundle must honour the OpenMfx export
    /// contract.
    pub unsafe fn load<P: AsRef<Path>>(path: P) -> Result<Self, HostError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(HostError::MissingBinary(path));
        }
        let library = Arc::new(Library::new(&path)?);

        let missing = |symbol| HostError::MissingSymbol {
            path: path.clone(),
            symbol,
        };
        let get_count = *library
            .get::<OfxGetNumberOfPluginsFunc>(b"OfxGetNumberOfPlugins\0")
            .map_err(|_| missing("OfxGetNumberOfPlugins"))?;
        let get_plugin = *library
            .get::<OfxGetPluginFunc>(b"OfxGetPlugin\0")
            .map_err(|_| missing("OfxGetPlugin"))?;

        if let Ok(set_directory) =
            library.get::<OfxSetBundleDirectoryFunc>(b"OfxSetBundleDirectory\0")
        {
            let directory = path.parent().unwrap_or(Path::new(""));
            if let Ok(directory) = CString::new(directory.to_string_lossy().as_bytes()) {
                set_directory(directory.as_ptr());
            }
        }

        let plugins = enumerate(get_count, get_plugin, Some(library));
        tracing::debug!(path = %path.display(), count = plugins.len(), "loaded plug-in bundle");
        Ok(Self { path, plugins })
    }

    /// Builds a registry from entry points already linked into the process.
    ///
    /// # Safety
    ///
    /// Both functions must follow the OpenMfx export contract and return plug-ins that outlive
    /// the registry.
    pub unsafe fn from_entry_points(
        get_count: OfxGetNumberOfPluginsFunc,
        get_plugin: OfxGetPluginFunc,
    ) -> Self {
        Self {
            path: PathBuf::new(),
            plugins: enumerate(get_count, get_plugin, None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn plugin(&self, index: usize) -> Option<&PluginHandle> {
        self.plugins.get(index)
    }

    pub fn plugins(&self) -> &[PluginHandle] {
        &self.plugins
    }

    pub fn find(&self, identifier: &str) -> Option<&PluginHandle> {
        self.plugins
            .iter()
            .find(|plugin| plugin.identifier() == identifier)
    }
}

/// Keeps only mesh effect plug-ins of the supported API version; indices are compacted.
unsafe fn enumerate(
    get_count: OfxGetNumberOfPluginsFunc,
    get_plugin: OfxGetPluginFunc,
    library: Option<Arc<Library>>,
) -> Vec<PluginHandle> {
    let count = get_count().max(0);
    let mut plugins = Vec::with_capacity(count as usize);
    for index in 0..count {
        let Some(raw) = NonNull::new(get_plugin(index)) else {
            tracing::warn!(index, "bundle returned a null plug-in");
            continue;
        };
        let plugin = raw.as_ref();
        let api = lossy(plugin.pluginApi);
        if plugin.pluginApi.is_null()
            || CStr::from_ptr(plugin.pluginApi) != kOfxMeshEffectPluginApi
            || plugin.apiVersion != kOfxMeshEffectPluginApiVersion
        {
            tracing::warn!(
                index,
                plugin = %lossy(plugin.pluginIdentifier),
                api = %api,
                version = plugin.apiVersion,
                "skipping plug-in with unsupported API"
            );
            continue;
        }
        plugins.push(PluginHandle {
            raw,
            shared: Arc::new(PluginShared {
                status: Mutex::new(PluginStatus::NotLoaded),
                _library: library.clone(),
            }),
        });
    }
    plugins
}

#[cfg(test)]
mod tests {
    use std::ffi::c_int;
    use std::ptr;

    use pretty_assertions::assert_eq;

    use super::*;

    struct StaticPlugin(OfxPlugin);
    unsafe impl Sync for StaticPlugin {}

    const fn plugin(api: &'static CStr, version: c_int, id: &'static CStr) -> StaticPlugin {
        StaticPlugin(OfxPlugin {
            pluginApi: api.as_ptr(),
            apiVersion: version,
            pluginIdentifier: id.as_ptr(),
            pluginVersionMajor: 1,
            pluginVersionMinor: 2,
            setHost: None,
            mainEntry: None,
        })
    }

    static PLUGINS: [StaticPlugin; 4] = [
        plugin(kOfxMeshEffectPluginApi, 1, cstr!("First")),
        plugin(cstr!("OfxImageEffectPluginAPI"), 1, cstr!("Image")),
        plugin(kOfxMeshEffectPluginApi, 2, cstr!("Future")),
        plugin(kOfxMeshEffectPluginApi, 1, cstr!("Second")),
    ];

    unsafe extern "C" fn count() -> c_int {
        PLUGINS.len() as c_int + 1
    }

    unsafe extern "C" fn get(nth: c_int) -> *mut OfxPlugin {
        match PLUGINS.get(nth as usize) {
            Some(plugin) => ptr::addr_of!(plugin.0).cast_mut(),
            None => ptr::null_mut(),
        }
    }

    #[test]
    fn enumeration_skips_foreign_and_null_plugins() {
        let registry = unsafe { PluginRegistry::from_entry_points(count, get) };
        let ids: Vec<_> = registry.plugins().iter().map(PluginHandle::identifier).collect();
        assert_eq!(ids, vec!["First", "Second"]);
        assert_eq!(registry.plugin(0).unwrap().version(), (1, 2));
        assert!(registry.plugin(2).is_none());
    }

    #[test]
    fn status_is_shared_between_clones() {
        let registry = unsafe { PluginRegistry::from_entry_points(count, get) };
        let handle = registry.find("Second").unwrap().clone();
        assert_eq!(handle.status(), PluginStatus::NotLoaded);
        handle.set_status(PluginStatus::Error);
        assert_eq!(registry.plugin(1).unwrap().status(), PluginStatus::Error);
        assert!(handle.ptr_eq(registry.plugin(1).unwrap()));
    }

    #[test]
    fn missing_bundle_is_reported() {
        let err = unsafe { PluginRegistry::load("/nonexistent/bundle.ofx") }.unwrap_err();
        assert!(matches!(err, HostError::MissingBinary(_)));
    }

    #[test]
    fn plugins_without_main_entry_fail_actions() {
        let registry = unsafe { PluginRegistry::from_entry_points(count, get) };
        let status = unsafe {
            registry.plugin(0).unwrap().main_entry(
                kOfxActionLoad,
                ptr::null(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        assert_eq!(status, kOfxStatFailed);
    }
}
