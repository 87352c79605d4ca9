//! Process-wide cache of opened bundles and the descriptors described from them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::HostError;
use crate::host::Host;
use crate::mesh_effect::MeshEffect;
use crate::registry::PluginRegistry;

struct ManagerEntry {
    path: PathBuf,
    /// `None` when the bundle failed to load. The entry still counts references.
    registry: Option<Arc<PluginRegistry>>,
    reference_count: usize,
    descriptors: Vec<Option<Arc<MeshEffect>>>,
}

/// Reference-counted bundle cache shared by every consumer of a [`Host`].
///
/// Each successful or failed [`get_registry`](Self::get_registry) must be balanced by one
/// [`release_registry`](Self::release_registry). When the count of a bundle drops to zero its
/// descriptors are released, its loaded plug-ins receive Unload and the library is closed once
/// the last outstanding handle goes away.
pub struct PluginRegistryManager {
    host: Arc<Host>,
    entries: Mutex<Vec<ManagerEntry>>,
}

impl std::fmt::Debug for PluginRegistryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistryManager")
            .field("live_entries", &self.live_entries())
            .finish()
    }
}

impl PluginRegistryManager {
    pub fn new(host: Arc<Host>) -> Self {
        Self {
            host,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn host(&self) -> &Arc<Host> {
        &self.host
    }

    /// Returns the registry of the bundle at `path`, opening it on first use.
    pub fn get_registry(&self, path: impl AsRef<Path>) -> Option<Arc<PluginRegistry>> {
        self.get_registry_with(path.as_ref(), |path| unsafe { PluginRegistry::load(path) })
    }

    pub(crate) fn get_registry_with(
        &self,
        path: &Path,
        load: impl FnOnce(&Path) -> Result<PluginRegistry, HostError>,
    ) -> Option<Arc<PluginRegistry>> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.iter_mut().find(|entry| entry.path == path) {
            entry.reference_count += 1;
            return entry.registry.clone();
        }

        let registry = match load(path) {
            Ok(registry) => {
                tracing::debug!(
                    path = %path.display(),
                    plugins = registry.len(),
                    "opened plug-in bundle"
                );
                Some(Arc::new(registry))
            }
            Err(err) => {
                tracing::error!(path = %path.display(), "{err}");
                None
            }
        };
        let descriptor_slots = registry.as_ref().map_or(0, |registry| registry.len());
        entries.push(ManagerEntry {
            path: path.to_path_buf(),
            registry: registry.clone(),
            reference_count: 1,
            descriptors: vec![None; descriptor_slots],
        });
        registry
    }

    /// Takes one more reference on an already cached bundle. Returns false if it is not cached.
    pub fn increment_registry_reference(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.entries.lock().iter_mut().find(|entry| entry.path == path) {
            Some(entry) => {
                entry.reference_count += 1;
                true
            }
            None => false,
        }
    }

    /// Drops one reference; the last one tears the entry down.
    ///
    /// Teardown runs under the cache lock, so a concurrent `get_registry` of the same path waits
    /// until Unload was sent and then opens the bundle afresh.
    pub fn release_registry(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock();
        let Some(index) = entries.iter().position(|entry| entry.path == path) else {
            tracing::warn!(path = %path.display(), "releasing a bundle that is not cached");
            return;
        };
        let entry = &mut entries[index];
        entry.reference_count = entry.reference_count.saturating_sub(1);
        if entry.reference_count > 0 {
            return;
        }
        let released = entries.remove(index);
        self.tear_down(released);
    }

    /// The descriptor of plug-in `index`, loading and describing it on first request.
    pub fn get_effect_descriptor(&self, path: impl AsRef<Path>, index: usize) -> Option<Arc<MeshEffect>> {
        let path = path.as_ref();
        let mut entries = self.entries.lock();
        let entry = entries.iter_mut().find(|entry| entry.path == path)?;
        let registry = entry.registry.clone()?;
        if let Some(descriptor) = entry.descriptors.get(index).cloned().flatten() {
            return Some(descriptor);
        }
        let Some(plugin) = registry.plugin(index) else {
            tracing::error!(path = %path.display(), index, "no plug-in at this index");
            return None;
        };

        let described = self
            .host
            .load_plugin(plugin)
            .and_then(|()| self.host.get_descriptor(plugin));
        match described {
            Ok(descriptor) => {
                entry.descriptors[index] = Some(descriptor.clone());
                Some(descriptor)
            }
            Err(err) => {
                tracing::error!(path = %path.display(), index, "could not describe plug-in: {err}");
                None
            }
        }
    }

    /// Number of cached bundles, failed ones included.
    pub fn live_entries(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn reference_count(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.path == path)
            .map_or(0, |entry| entry.reference_count)
    }

    fn tear_down(&self, entry: ManagerEntry) {
        tracing::debug!(path = %entry.path.display(), "closing plug-in bundle");
        for descriptor in entry.descriptors.into_iter().flatten() {
            self.host.release_descriptor(descriptor);
        }
        if let Some(registry) = entry.registry {
            for plugin in registry.plugins() {
                if let Err(err) = self.host.unload_plugin(plugin) {
                    tracing::warn!("{err}");
                }
            }
        }
    }
}

impl Drop for PluginRegistryManager {
    fn drop(&mut self) {
        let entries = std::mem::take(&mut *self.entries.lock());
        for entry in entries {
            if entry.reference_count > 0 {
                tracing::warn!(
                    path = %entry.path.display(),
                    references = entry.reference_count,
                    "bundle still referenced when the manager was dropped"
                );
            }
            self.tear_down(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::host::NoHooks;
    use crate::registry::PluginStatus;
    use crate::testing::{self, SLOTS};

    fn manager() -> PluginRegistryManager {
        PluginRegistryManager::new(Host::new(NoHooks))
    }

    fn fake_path(slot: usize) -> PathBuf {
        PathBuf::from(format!("/bundles/slot{slot}.ofx"))
    }

    fn get(manager: &PluginRegistryManager, slot: usize) -> Option<Arc<PluginRegistry>> {
        manager.get_registry_with(&fake_path(slot), |_| Ok(testing::registry(slot)))
    }

    #[test]
    fn balanced_gets_and_releases_leave_nothing() {
        let manager = manager();
        let first = get(&manager, 0).unwrap();
        for _ in 0..4 {
            assert!(Arc::ptr_eq(&first, &get(&manager, 0).unwrap()));
        }
        assert_eq!(manager.reference_count(fake_path(0)), 5);
        drop(first);
        for _ in 0..5 {
            manager.release_registry(fake_path(0));
        }
        assert_eq!(manager.live_entries(), 0);
    }

    #[test]
    fn one_missing_release_keeps_the_entry() {
        let manager = manager();
        let registries: Vec<_> = (0..3).map(|_| get(&manager, 1).unwrap()).collect();
        for _ in 0..2 {
            manager.release_registry(fake_path(1));
        }
        assert_eq!(manager.live_entries(), 1);
        assert_eq!(manager.reference_count(fake_path(1)), 1);
        let again = get(&manager, 1).unwrap();
        assert!(registries.iter().all(|registry| Arc::ptr_eq(registry, &again)));
    }

    #[test]
    fn failed_loads_still_hold_a_reference() {
        let manager = manager();
        assert!(manager.get_registry("/nonexistent/bundle.ofx").is_none());
        assert!(manager.get_registry("/nonexistent/bundle.ofx").is_none());
        assert_eq!(manager.live_entries(), 1);
        assert!(manager.get_effect_descriptor("/nonexistent/bundle.ofx", 0).is_none());
        manager.release_registry("/nonexistent/bundle.ofx");
        manager.release_registry("/nonexistent/bundle.ofx");
        assert_eq!(manager.live_entries(), 0);
    }

    #[test]
    fn increment_requires_a_cached_bundle() {
        let manager = manager();
        assert!(!manager.increment_registry_reference(fake_path(2)));
        get(&manager, 2);
        assert!(manager.increment_registry_reference(fake_path(2)));
        assert_eq!(manager.reference_count(fake_path(2)), 2);
    }

    #[test]
    fn descriptors_are_described_once_and_unloaded_on_release() {
        let slot = &SLOTS[3];
        let manager = manager();
        let registry = get(&manager, 3).unwrap();

        let first = manager.get_effect_descriptor(fake_path(3), 0).unwrap();
        let second = manager.get_effect_descriptor(fake_path(3), 0).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(manager.get_effect_descriptor(fake_path(3), 1).is_none());
        assert_eq!(slot.count("OfxActionLoad"), 1);
        assert_eq!(slot.count("OfxActionDescribe"), 1);
        assert_eq!(registry.plugin(0).unwrap().status(), PluginStatus::Ok);

        manager.release_registry(fake_path(3));
        assert_eq!(slot.count("OfxActionUnload"), 1);
        assert!(!slot.has_host());
        assert_eq!(registry.plugin(0).unwrap().status(), PluginStatus::NotLoaded);
    }

    #[test]
    fn reopening_while_closing_never_unloads_a_held_plugin() {
        let slot = &SLOTS[10];
        let manager = manager();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        assert!(get(&manager, 10).is_some());
                        assert!(manager.get_effect_descriptor(fake_path(10), 0).is_some());
                        assert!(slot.is_loaded(), "plug-in unloaded while a reference is held");
                        manager.release_registry(fake_path(10));
                    }
                });
            }
        });
        assert_eq!(manager.live_entries(), 0);
        assert!(!slot.is_loaded());
        assert_eq!(slot.count("OfxActionLoad"), slot.count("OfxActionUnload"));
    }

    #[test]
    fn failed_describe_is_not_cached() {
        use std::sync::atomic::Ordering;

        let slot = &SLOTS[4];
        slot.describe.store(mfx_sys::kOfxStatFailed, Ordering::SeqCst);
        let manager = manager();
        get(&manager, 4);
        assert!(manager.get_effect_descriptor(fake_path(4), 0).is_none());

        slot.describe.store(mfx_sys::kOfxStatOK, Ordering::SeqCst);
        assert!(manager.get_effect_descriptor(fake_path(4), 0).is_some());
        assert_eq!(slot.count("OfxActionDescribe"), 2);
        assert_eq!(slot.count("OfxActionLoad"), 1);
    }
}
