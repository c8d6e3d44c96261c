//! Domain entities: node payloads, display attributes and module metadata

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Capabilities a GUI binding layer may offer for an item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ItemFlags: u8 {
        const EDITABLE = 1;
        const SELECTABLE = 1 << 1;
        const DRAG_ENABLED = 1 << 2;
        const DROP_ENABLED = 1 << 3;
        const ENABLED = 1 << 4;
    }
}

impl ItemFlags {
    /// Folders can be renamed, so they get every capability.
    pub const FOLDER: ItemFlags = ItemFlags::all();

    /// Bookmarks carry everything except in-place editing.
    pub const BOOKMARK: ItemFlags = ItemFlags::SELECTABLE
        .union(ItemFlags::DRAG_ENABLED)
        .union(ItemFlags::DROP_ENABLED)
        .union(ItemFlags::ENABLED);
}

/// Opaque icon handle, resolved to an actual image by the GUI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Icon {
    #[default]
    None,
    ClosedFolder,
    Bookmark,
}

/// Kind of an external text module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Bible,
    Commentary,
    GenericBook,
    Lexicon,
    #[default]
    Other,
}

impl ModuleType {
    /// Bibles and commentaries are addressed by verse keys, which need
    /// locale translation. Every other kind passes keys through.
    pub fn uses_verse_keys(self) -> bool {
        matches!(self, ModuleType::Bible | ModuleType::Commentary)
    }
}

/// An installed module as reported by the module registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Unique module name, e.g. "KJV"
    pub name: String,
    pub module_type: ModuleType,
    /// Human-readable description from the module configuration
    pub description: String,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, module_type: ModuleType) -> Self {
        Self {
            name: name.into(),
            module_type,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }
}

/// Payload of a bookmark node.
///
/// The module is stored by name so a bookmark survives its module being
/// uninstalled; it is resolved against the registry on every use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkData {
    /// Locale-invariant key, e.g. "John 3:16"
    pub key: String,
    pub description: String,
    pub module_name: String,
}

impl BookmarkData {
    pub fn new(
        module_name: impl Into<String>,
        key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            module_name: module_name.into(),
        }
    }
}

/// Variant of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Untyped row created by raw row insertion, waiting to be promoted.
    Placeholder,
    Folder,
    Bookmark(BookmarkData),
}

impl NodeKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            NodeKind::Bookmark(_) => ItemType::Bookmark,
            NodeKind::Folder | NodeKind::Placeholder => ItemType::Folder,
        }
    }
}

/// Type tag exposed to the GUI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Bookmark,
    Folder,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Bookmark => "bookmark",
            ItemType::Folder => "folder",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a GUI layer needs to render one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAttributes {
    pub text: String,
    pub tooltip: String,
    pub icon: Icon,
    pub flags: ItemFlags,
    pub item_type: ItemType,
}

/// Ordering for child sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Synthesized bookmark header: `"<key> (<module>)"`.
pub fn to_header(key: &str, module_name: &str) -> String {
    format!("{} ({})", key, module_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bookmark_flags_exclude_editable() {
        assert!(!ItemFlags::BOOKMARK.contains(ItemFlags::EDITABLE));
        assert!(ItemFlags::FOLDER.contains(ItemFlags::EDITABLE | ItemFlags::DROP_ENABLED));
    }

    #[test]
    fn placeholder_reports_folder_type_tag() {
        assert_eq!(NodeKind::Placeholder.item_type().as_str(), "folder");
        assert_eq!(
            NodeKind::Bookmark(BookmarkData::default()).item_type().as_str(),
            "bookmark"
        );
    }

    #[test]
    fn header_joins_key_and_module() {
        assert_eq!(to_header("John 3:16", "KJV"), "John 3:16 (KJV)");
    }
}
