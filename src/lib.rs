//! Bookmark tree store for Bible-study applications
//!
//! Folders and bookmarks live in an arena-backed tree, persist as
//! `SwordBookmarks` XML documents and are edited through a row/column
//! model suitable for item views. The default store saves itself one
//! debounce delay after its first unsaved change.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
