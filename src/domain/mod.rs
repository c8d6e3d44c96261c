//! Domain layer: the bookmark tree and its persistent format
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod codec;
pub mod collation;
pub mod entities;
pub mod error;
pub mod fragment;

pub use arena::{BookmarkArena, NodeId, TreeNode};
pub use collation::TextCollator;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use fragment::Fragment;
