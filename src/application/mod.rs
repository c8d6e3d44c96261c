//! Application layer: the bookmark store and its tree-table model
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod model;
pub mod save_timer;
pub mod store;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use model::{BookmarksModel, LayoutChange, ModelIndex, NEW_FOLDER_NAME};
pub use save_timer::SaveTimer;
pub use store::{BookmarkStore, DefaultStoreGuard, DefaultStoreSlot, StoreServices, UNKNOWN_MODULE};
