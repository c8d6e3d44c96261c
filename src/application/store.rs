//! Bookmark store: tree ownership, load/save and deferred persistence
//!
//! A store owns one bookmark tree. At most one store per process is the
//! *default* store, bound to the default bookmark file; only that store
//! saves itself automatically, one debounce delay after its first unsaved
//! change, and once more on drop if a save is still pending.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument, warn};

use crate::application::error_ext::IoResultExt;
use crate::application::save_timer::SaveTimer;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::codec;
use crate::domain::{
    to_header, BookmarkArena, BookmarkData, DomainError, Fragment, ItemAttributes, ModuleInfo,
    NodeId, NodeKind, TreeNode,
};
use crate::infrastructure::traits::{Clock, FileSystem, KeyNormalizer, ModuleRegistry};

/// Module name shown in headers of bookmarks whose module is not installed.
pub const UNKNOWN_MODULE: &str = "unknown";

/// Claim on the process-wide default store.
///
/// Held by the service container; whoever claims it gets the only
/// [`DefaultStoreGuard`] until that guard is dropped.
#[derive(Debug, Clone, Default)]
pub struct DefaultStoreSlot(Arc<AtomicBool>);

impl DefaultStoreSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self) -> Option<DefaultStoreGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DefaultStoreGuard(Arc::clone(&self.0)))
    }

    pub fn is_taken(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Proof of being the default store. Releases the slot on drop.
#[derive(Debug)]
pub struct DefaultStoreGuard(Arc<AtomicBool>);

impl Drop for DefaultStoreGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Collaborators and settings a store works with.
#[derive(Clone)]
pub struct StoreServices {
    pub fs: Arc<dyn FileSystem>,
    pub modules: Arc<dyn ModuleRegistry>,
    pub keys: Arc<dyn KeyNormalizer>,
    pub clock: Arc<dyn Clock>,
    /// Bookmark file used when no explicit source or destination is given
    pub default_file: PathBuf,
    /// Book-name language for rendering verse keys
    pub locale: String,
    pub save_delay: Duration,
}

pub struct BookmarkStore {
    tree: BookmarkArena,
    services: StoreServices,
    save_timer: SaveTimer,
    default_guard: Option<DefaultStoreGuard>,
}

impl BookmarkStore {
    /// Create an empty, non-default store.
    pub fn new(services: StoreServices) -> Self {
        let save_timer = SaveTimer::new(services.save_delay);
        Self {
            tree: BookmarkArena::new(),
            services,
            save_timer,
            default_guard: None,
        }
    }

    /// Create an empty store that saves itself automatically.
    pub fn new_default(services: StoreServices, guard: DefaultStoreGuard) -> Self {
        let mut store = Self::new(services);
        store.default_guard = Some(guard);
        store
    }

    pub fn is_default(&self) -> bool {
        self.default_guard.is_some()
    }

    pub fn tree(&self) -> &BookmarkArena {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut BookmarkArena {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn default_file(&self) -> &Path {
        &self.services.default_file
    }

    pub fn services(&self) -> &StoreServices {
        &self.services
    }

    // ------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------

    /// Read and decode a bookmark document without touching the tree.
    pub fn read_items(&self, source: Option<&Path>) -> ApplicationResult<Vec<Fragment>> {
        let path = source.unwrap_or(&self.services.default_file);
        if !self.services.fs.exists(path) {
            return Err(ApplicationError::SourceNotFound(path.to_path_buf()));
        }
        let xml = self
            .services
            .fs
            .read_to_string(path)
            .with_path_context("read bookmarks", path)?;
        let items = codec::decode(&xml)?;
        if items.is_empty() {
            return Err(DomainError::EmptyDocument.into());
        }
        Ok(items)
    }

    /// Append the items of a bookmark document to `target` (default: root).
    ///
    /// Either every top-level item is inserted or, on error, none is.
    #[instrument(level = "debug", skip(self))]
    pub fn try_load(
        &mut self,
        source: Option<&Path>,
        target: Option<NodeId>,
    ) -> ApplicationResult<Vec<NodeId>> {
        let target = target.unwrap_or_else(|| self.tree.root());
        let items = self.read_items(source)?;
        let row = self.tree.node(target)?.child_count();
        let ids = self.tree.graft_all(target, row, &items)?;
        info!(
            "loaded {} bookmark item(s) from {}",
            ids.len(),
            source.unwrap_or(&self.services.default_file).display()
        );
        Ok(ids)
    }

    /// Like [`BookmarkStore::try_load`], reporting failure as `false`.
    pub fn load(&mut self, source: Option<&Path>, target: Option<NodeId>) -> bool {
        match self.try_load(source, target) {
            Ok(_) => true,
            Err(e) => {
                warn!("bookmarks not loaded: {}", e);
                false
            }
        }
    }

    // ------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------

    /// Encode the subtree below `subtree` (default: root) as a document.
    pub fn serialize(&self, subtree: Option<NodeId>) -> ApplicationResult<String> {
        let subtree = subtree.unwrap_or_else(|| self.tree.root());
        let modules = &self.services.modules;
        let xml = codec::encode(&self.tree, subtree, |name| {
            modules
                .find_module_by_name(name)
                .map(|module| module.description)
                .unwrap_or_default()
        })?;
        Ok(xml)
    }

    fn write_document(&self, path: &Path, xml: &str) -> ApplicationResult<()> {
        self.services
            .fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.services
            .fs
            .write(path, xml)
            .with_path_context("write bookmarks", path)
    }

    /// Write the subtree to `destination` (default: the default file),
    /// overwriting it, then cancel any pending deferred save.
    #[instrument(level = "debug", skip(self))]
    pub fn try_save(
        &mut self,
        destination: Option<&Path>,
        subtree: Option<NodeId>,
    ) -> ApplicationResult<PathBuf> {
        let xml = self.serialize(subtree)?;
        let path = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.services.default_file.clone());
        let written = self.write_document(&path, &xml);
        self.save_timer.cancel();
        written?;
        info!("saved bookmarks to {}", path.display());
        Ok(path)
    }

    /// Like [`BookmarkStore::try_save`]. Reports success once the write was
    /// attempted; failures are logged.
    pub fn save(&mut self, destination: Option<&Path>, subtree: Option<NodeId>) -> bool {
        if let Err(e) = self.try_save(destination, subtree) {
            error!("failed to save bookmarks: {}", e);
        }
        true
    }

    // ------------------------------------------------------------
    // Deferred persistence
    // ------------------------------------------------------------

    /// Record an unsaved change. On the default store this schedules a save
    /// one delay from now unless one is already scheduled.
    pub fn mark_dirty(&mut self) {
        if !self.is_default() {
            return;
        }
        if self.save_timer.arm(self.services.clock.now()) {
            debug!("save scheduled in {:?}", self.save_timer.delay());
        }
    }

    pub fn save_pending(&self) -> bool {
        self.save_timer.is_armed()
    }

    pub fn save_deadline(&self) -> Option<Instant> {
        self.save_timer.deadline()
    }

    /// Event-loop hook: run the scheduled save if its time has come.
    ///
    /// Returns true if a save ran.
    pub fn process_pending_save(&mut self) -> bool {
        if self.save_timer.take_due(self.services.clock.now()) {
            debug!("deferred save due");
            self.save(None, None)
        } else {
            false
        }
    }

    // ------------------------------------------------------------
    // Bookmark presentation
    // ------------------------------------------------------------

    pub fn find_module(&self, name: &str) -> Option<ModuleInfo> {
        self.services.modules.find_module_by_name(name)
    }

    /// Module a bookmark refers to, if it is installed.
    pub fn module_of(&self, id: NodeId) -> Option<ModuleInfo> {
        let data = self.tree.get(id)?.bookmark_data()?;
        self.find_module(&data.module_name)
    }

    /// Canonical form of a user-entered key for `module`.
    pub fn canonical_key(&self, module: &ModuleInfo, raw_key: &str) -> String {
        if module.module_type.uses_verse_keys() {
            self.services.keys.to_canonical(raw_key, module)
        } else {
            raw_key.to_string()
        }
    }

    /// Key rendered in the configured book-name language. Falls back to the
    /// canonical key when the module is missing or not verse-keyed.
    pub fn localized_key(&self, data: &BookmarkData) -> String {
        match self.find_module(&data.module_name) {
            Some(module) if module.module_type.uses_verse_keys() => {
                self.services
                    .keys
                    .to_localized(&data.key, &module, &self.services.locale)
            }
            _ => data.key.clone(),
        }
    }

    /// `"<localized key> (<module>)"`, with `unknown` for missing modules.
    pub fn header(&self, data: &BookmarkData) -> String {
        let module = self.find_module(&data.module_name);
        let module_name = module
            .as_ref()
            .map_or(UNKNOWN_MODULE, |m| m.display_name());
        to_header(&self.localized_key(data), module_name)
    }

    /// Build a detached bookmark node from user input.
    ///
    /// A non-empty `title` is kept as the node text instead of the derived
    /// header; an empty title leaves the header to be derived on display.
    pub fn new_bookmark_node(
        &self,
        module: &ModuleInfo,
        key: &str,
        description: &str,
        title: &str,
    ) -> TreeNode {
        let data = BookmarkData::new(
            module.name.clone(),
            self.canonical_key(module, key),
            description,
        );
        TreeNode::new_bookmark(data, title)
    }

    pub fn display_text(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        match &node.kind {
            NodeKind::Bookmark(data) if node.text.is_empty() => self.header(data),
            _ => node.text.clone(),
        }
    }

    /// Bookmark tooltips are rendered from the bookmark itself; other nodes
    /// show their stored tooltip.
    pub fn tooltip(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        let NodeKind::Bookmark(data) = &node.kind else {
            return node.tooltip.clone();
        };
        let Some(module) = self.find_module(&data.module_name) else {
            return String::new();
        };

        let header = to_header(&self.localized_key(data), module.display_name());
        let text = self.display_text(id);
        if text == header {
            format!("<b>{}</b><hr>{}", header, data.description)
        } else {
            format!("<b>{}</b><br>{}<hr>{}", header, text, data.description)
        }
    }

    pub fn attributes(&self, id: NodeId) -> Option<ItemAttributes> {
        let node = self.tree.get(id)?;
        Some(ItemAttributes {
            text: self.display_text(id),
            tooltip: self.tooltip(id),
            icon: node.icon,
            flags: node.flags,
            item_type: node.kind.item_type(),
        })
    }
}

impl Drop for BookmarkStore {
    fn drop(&mut self) {
        if self.save_timer.is_armed() {
            debug!("flushing pending save before teardown");
            self.save(None, None);
        }
    }
}

impl std::fmt::Debug for BookmarkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookmarkStore")
            .field("default_file", &self.services.default_file)
            .field("is_default", &self.is_default())
            .field("nodes", &self.tree.len())
            .field("save_pending", &self.save_timer.is_armed())
            .finish()
    }
}
