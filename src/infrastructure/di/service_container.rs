//! Service container for dependency injection
//!
//! Wires the store collaborators together and owns the default-store slot:
//! the container is the application context through which the single
//! auto-saving store is handed out.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::{
    ApplicationError, ApplicationResult, BookmarkStore, BookmarksModel, DefaultStoreSlot,
    StoreServices,
};
use crate::config::Settings;
use crate::domain::DomainError;
use crate::infrastructure::registry::ModuleCatalog;
use crate::infrastructure::traits::{
    Clock, FileSystem, IdentityKeyNormalizer, KeyNormalizer, ModuleRegistry, RealFileSystem,
    SystemClock,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Installed modules
    pub modules: Arc<dyn ModuleRegistry>,

    /// Verse-key translation
    pub keys: Arc<dyn KeyNormalizer>,

    /// Time source for deferred saves
    pub clock: Arc<dyn Clock>,

    default_slot: DefaultStoreSlot,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// The module registry is seeded from the `modules` list in the settings.
    pub fn new(settings: Settings) -> Self {
        let modules = Arc::new(ModuleCatalog::from_config(&settings.modules));
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            modules,
            Arc::new(IdentityKeyNormalizer),
            Arc::new(SystemClock),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        modules: Arc<dyn ModuleRegistry>,
        keys: Arc<dyn KeyNormalizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            modules,
            keys,
            clock,
            default_slot: DefaultStoreSlot::new(),
        }
    }

    pub fn store_services(&self) -> StoreServices {
        StoreServices {
            fs: Arc::clone(&self.fs),
            modules: Arc::clone(&self.modules),
            keys: Arc::clone(&self.keys),
            clock: Arc::clone(&self.clock),
            default_file: self.settings.bookmarks_path(),
            locale: self.settings.booknames_locale.clone(),
            save_delay: self.settings.save_delay(),
        }
    }

    /// True while a default store handed out by this container is alive.
    pub fn default_store_open(&self) -> bool {
        self.default_slot.is_taken()
    }

    /// Empty model that never saves on its own.
    pub fn open_model(&self) -> BookmarksModel {
        BookmarksModel::new(BookmarkStore::new(self.store_services()))
    }

    /// Model holding the contents of `path`. Fails if the file cannot be
    /// loaded; a document whose root holds no items opens empty.
    pub fn open_model_from(&self, path: &Path) -> ApplicationResult<BookmarksModel> {
        let mut store = BookmarkStore::new(self.store_services());
        match store.try_load(Some(path), None) {
            Ok(_) => {}
            Err(ApplicationError::Domain(DomainError::EmptyDocument)) => {
                debug!("{} holds no bookmarks, starting empty", path.display());
            }
            Err(e) => return Err(e),
        }
        Ok(BookmarksModel::new(store))
    }

    /// The auto-saving model bound to the default bookmark file.
    ///
    /// At most one may exist at a time; a missing or unreadable default
    /// file yields an empty tree.
    pub fn open_default_model(&self) -> ApplicationResult<BookmarksModel> {
        let guard = self
            .default_slot
            .claim()
            .ok_or(ApplicationError::DefaultStoreTaken)?;
        let mut store = BookmarkStore::new_default(self.store_services(), guard);
        store.load(None, None);
        debug!(
            "default store opened on {}",
            store.default_file().display()
        );
        Ok(BookmarksModel::new(store))
    }
}
