//! Tree-table surface over a bookmark store
//!
//! `BookmarksModel` speaks in row/column indexes the way a GUI item view
//! does. The root folder is never addressable: the invalid index stands
//! for it, and its children are the top-level rows.

use std::path::Path;

use itertools::Itertools;
use tracing::{debug, instrument, warn};

use crate::application::store::BookmarkStore;
use crate::domain::{
    BookmarkData, ItemAttributes, ItemFlags, ModuleInfo, NodeId, SortOrder, TextCollator,
    TreeNode,
};

/// Default caption of folders created without a name.
pub const NEW_FOLDER_NAME: &str = "New folder";

/// Position of an item as seen by an item view.
///
/// The invalid index (`node == None`) refers to the root folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelIndex {
    node: Option<NodeId>,
    row: usize,
    column: usize,
}

impl ModelIndex {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

/// Row moves applied to one folder's children by a sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutChange {
    pub parent: ModelIndex,
    /// `(old_row, new_row)` for every child whose row changed
    pub moves: Vec<(usize, usize)>,
}

pub struct BookmarksModel {
    store: BookmarkStore,
    collator: TextCollator,
}

impl BookmarksModel {
    pub fn new(store: BookmarkStore) -> Self {
        Self {
            store,
            collator: TextCollator::new(),
        }
    }

    pub fn store(&self) -> &BookmarkStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BookmarkStore {
        &mut self.store
    }

    pub fn into_store(self) -> BookmarkStore {
        self.store
    }

    /// Node behind an index; the invalid index resolves to the root.
    /// Stale indexes resolve to `None`.
    pub fn resolve(&self, index: &ModelIndex) -> Option<NodeId> {
        match index.node {
            None => Some(self.store.root()),
            Some(id) if self.store.tree().contains(id) => Some(id),
            Some(_) => None,
        }
    }

    fn resolve_folder(&self, index: &ModelIndex) -> Option<NodeId> {
        self.resolve(index)
            .filter(|&id| self.store.tree().get(id).is_some_and(TreeNode::is_folder))
    }

    /// Addressable index of a node. The root and unknown nodes map to the
    /// invalid index.
    pub fn index_of(&self, id: NodeId) -> ModelIndex {
        match self.store.tree().index_in_parent(id) {
            Some(row) => ModelIndex {
                node: Some(id),
                row,
                column: 0,
            },
            None => ModelIndex::invalid(),
        }
    }

    // ------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------

    pub fn row_count(&self, parent: &ModelIndex) -> usize {
        self.resolve(parent)
            .map_or(0, |id| self.store.tree().child_count(id))
    }

    pub fn column_count(&self, _parent: &ModelIndex) -> usize {
        1
    }

    pub fn has_children(&self, parent: &ModelIndex) -> bool {
        self.row_count(parent) > 0
    }

    pub fn index(&self, row: usize, column: usize, parent: &ModelIndex) -> ModelIndex {
        if column != 0 {
            return ModelIndex::invalid();
        }
        self.resolve(parent)
            .and_then(|id| self.store.tree().child(id, row))
            .map_or_else(ModelIndex::invalid, |child| ModelIndex {
                node: Some(child),
                row,
                column,
            })
    }

    /// Parent of an index. Top-level rows have the invalid index as parent.
    pub fn parent(&self, index: &ModelIndex) -> ModelIndex {
        let Some(id) = index.node else {
            return ModelIndex::invalid();
        };
        let tree = self.store.tree();
        match tree.get(id).and_then(TreeNode::parent) {
            Some(parent) if parent != tree.root() => self.index_of(parent),
            _ => ModelIndex::invalid(),
        }
    }

    // ------------------------------------------------------------
    // Display attributes
    // ------------------------------------------------------------

    pub fn attributes(&self, index: &ModelIndex) -> Option<ItemAttributes> {
        index.node.and_then(|id| self.store.attributes(id))
    }

    pub fn flags(&self, index: &ModelIndex) -> ItemFlags {
        self.resolve(index)
            .and_then(|id| self.store.tree().get(id))
            .map_or(ItemFlags::empty(), |node| node.flags)
    }

    /// Rename a folder, retitle a bookmark or label a placeholder.
    pub fn set_text(&mut self, index: &ModelIndex, text: &str) -> bool {
        self.set_attribute(index, |node| node.text = text.to_string())
    }

    pub fn set_tooltip(&mut self, index: &ModelIndex, tooltip: &str) -> bool {
        self.set_attribute(index, |node| node.tooltip = tooltip.to_string())
    }

    fn set_attribute(&mut self, index: &ModelIndex, apply: impl FnOnce(&mut TreeNode)) -> bool {
        let Some(id) = index.node else {
            return false;
        };
        let Some(node) = self.store.tree_mut().get_mut(id) else {
            return false;
        };
        apply(node);
        let persistent = !node.is_placeholder();
        if persistent {
            self.store.mark_dirty();
        }
        true
    }

    // ------------------------------------------------------------
    // Row insertion and removal
    // ------------------------------------------------------------

    /// Insert `count` untyped placeholder rows. Placeholders are not
    /// persisted until promoted, so the store is not marked dirty.
    ///
    /// Rows can only be inserted below a folder or the root; a bookmark or
    /// placeholder parent is refused with `false`.
    pub fn insert_rows(&mut self, row: usize, count: usize, parent: &ModelIndex) -> bool {
        let Some(parent_id) = self.resolve_folder(parent) else {
            return false;
        };
        let placeholders = (0..count).map(|_| TreeNode::new_placeholder()).collect();
        match self
            .store
            .tree_mut()
            .insert_children(parent_id, row, placeholders)
        {
            Ok(ids) => {
                debug!("inserted {} placeholder row(s) at {}", ids.len(), row);
                true
            }
            Err(e) => {
                warn!("insert_rows rejected: {}", e);
                false
            }
        }
    }

    /// Destroy `count` consecutive rows starting at `row`, with their subtrees.
    ///
    /// Removing zero rows is reported as `false`, like any other range that
    /// changes nothing.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_rows(&mut self, row: usize, count: usize, parent: &ModelIndex) -> bool {
        let Some(parent_id) = self.resolve(parent) else {
            return false;
        };
        let available = self.store.tree().child_count(parent_id);
        if count == 0 || row + count > available {
            warn!(
                "remove_rows rejected: rows {}..{} of {}",
                row,
                row + count,
                available
            );
            return false;
        }

        for _ in 0..count {
            if let Err(e) = self.store.tree_mut().remove_child(parent_id, row) {
                warn!("remove_rows stopped early: {}", e);
                break;
            }
        }
        self.store.mark_dirty();
        true
    }

    // ------------------------------------------------------------
    // Placeholder promotion
    // ------------------------------------------------------------

    pub fn promote_to_folder(&mut self, index: &ModelIndex, name: &str) -> bool {
        let name = if name.is_empty() { NEW_FOLDER_NAME } else { name };
        self.promote(index, TreeNode::new_folder(name))
    }

    pub fn promote_to_bookmark(
        &mut self,
        index: &ModelIndex,
        module: &ModuleInfo,
        key: &str,
        description: &str,
        title: &str,
    ) -> bool {
        let template = self
            .store
            .new_bookmark_node(module, key, description, title);
        self.promote(index, template)
    }

    fn promote(&mut self, index: &ModelIndex, template: TreeNode) -> bool {
        let Some(id) = index.node else {
            return false;
        };
        match self.store.tree_mut().promote(id, template) {
            Ok(()) => {
                self.store.mark_dirty();
                true
            }
            Err(e) => {
                warn!("promotion rejected: {}", e);
                false
            }
        }
    }

    // ------------------------------------------------------------
    // Copy and move
    // ------------------------------------------------------------

    /// Check a selection against a destination folder.
    ///
    /// A folder may only be copied or moved alone, and never into its own
    /// subtree. Placeholders and the root cannot be selected.
    fn validate_selection(
        &self,
        sources: &[ModelIndex],
        row: usize,
        dest: NodeId,
    ) -> Result<Vec<NodeId>, String> {
        let tree = self.store.tree();
        let dest_count = tree.child_count(dest);
        if row > dest_count {
            return Err(format!("row {} out of range 0..={}", row, dest_count));
        }

        let mut nodes = Vec::with_capacity(sources.len());
        for index in sources {
            let id = index
                .node
                .filter(|&id| tree.contains(id))
                .ok_or_else(|| "selection contains the root or a stale index".to_string())?;
            if tree.get(id).is_some_and(TreeNode::is_placeholder) {
                return Err("selection contains an untyped row".to_string());
            }
            nodes.push(id);
        }

        let folders: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&id| tree.get(id).is_some_and(TreeNode::is_folder))
            .collect();
        match folders.as_slice() {
            [] => Ok(nodes),
            [folder] if nodes.len() == 1 => {
                if tree.has_descendant(*folder, dest) {
                    Err("cannot place a folder into its own subtree".to_string())
                } else {
                    Ok(nodes)
                }
            }
            _ => Err("a folder must be selected alone".to_string()),
        }
    }

    /// Copy the selected items to `row` of `parent`, in selection order.
    ///
    /// Returns the indexes of the copies, or nothing if the selection was
    /// rejected. Nothing is modified on rejection.
    #[instrument(level = "debug", skip(self, sources))]
    pub fn copy_items(
        &mut self,
        row: usize,
        parent: &ModelIndex,
        sources: &[ModelIndex],
    ) -> Vec<ModelIndex> {
        let Some(dest) = self.resolve_folder(parent) else {
            warn!("copy rejected: destination is not a folder");
            return Vec::new();
        };
        let nodes = match self.validate_selection(sources, row, dest) {
            Ok(nodes) if !nodes.is_empty() => nodes,
            Ok(_) => return Vec::new(),
            Err(reason) => {
                warn!("copy rejected: {}", reason);
                return Vec::new();
            }
        };

        let fragments = nodes
            .iter()
            .filter_map(|&id| self.store.tree().snapshot(id))
            .collect_vec();
        match self.store.tree_mut().graft_all(dest, row, &fragments) {
            Ok(ids) => {
                self.store.mark_dirty();
                debug!("copied {} item(s)", ids.len());
                ids.into_iter().map(|id| self.index_of(id)).collect()
            }
            Err(e) => {
                warn!("copy failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Relocate the selected items to `row` of `parent`, in selection order.
    ///
    /// `row` refers to the destination before the move; sources taken from
    /// above it in the same folder shift it up.
    #[instrument(level = "debug", skip(self, sources))]
    pub fn move_items(
        &mut self,
        row: usize,
        parent: &ModelIndex,
        sources: &[ModelIndex],
    ) -> Vec<ModelIndex> {
        let Some(dest) = self.resolve_folder(parent) else {
            warn!("move rejected: destination is not a folder");
            return Vec::new();
        };
        let nodes = match self.validate_selection(sources, row, dest) {
            Ok(nodes) if !nodes.is_empty() => nodes.into_iter().unique().collect_vec(),
            Ok(_) => return Vec::new(),
            Err(reason) => {
                warn!("move rejected: {}", reason);
                return Vec::new();
            }
        };

        let tree = self.store.tree();
        let shift = nodes
            .iter()
            .filter(|&&id| {
                tree.get(id).and_then(TreeNode::parent) == Some(dest)
                    && tree.index_in_parent(id).is_some_and(|r| r < row)
            })
            .count();
        let target_row = row - shift;

        for &id in &nodes {
            if let Err(e) = self.store.tree_mut().detach(id) {
                warn!("move failed: {}", e);
                return Vec::new();
            }
        }
        for (offset, &id) in nodes.iter().enumerate() {
            if let Err(e) = self.store.tree_mut().attach(id, dest, target_row + offset) {
                warn!("move failed: {}", e);
                return Vec::new();
            }
        }
        self.store.mark_dirty();
        debug!("moved {} item(s)", nodes.len());
        nodes.into_iter().map(|id| self.index_of(id)).collect()
    }

    // ------------------------------------------------------------
    // Adding items
    // ------------------------------------------------------------

    /// Add a bookmark to the folder `parent`. A negative `row` counts from
    /// the end: `-1` appends.
    ///
    /// A non-empty `title` replaces the derived `"<key> (<module>)"` header
    /// as the bookmark's text; an empty `title` keeps the derived header.
    pub fn add_bookmark(
        &mut self,
        row: isize,
        parent: &ModelIndex,
        module: &ModuleInfo,
        key: &str,
        description: &str,
        title: &str,
    ) -> Option<ModelIndex> {
        let parent_id = self.resolve_folder(parent)?;
        let row = if row < 0 {
            self.row_count(parent) as isize + 1 + row
        } else {
            row
        };
        let row = usize::try_from(row).ok()?;
        let node = self
            .store
            .new_bookmark_node(module, key, description, title);
        self.insert_item(parent_id, row, node)
    }

    /// Add a folder to the folder `parent`. An empty name becomes
    /// [`NEW_FOLDER_NAME`].
    pub fn add_folder(&mut self, row: usize, parent: &ModelIndex, name: &str) -> Option<ModelIndex> {
        let parent_id = self.resolve_folder(parent)?;
        let name = if name.is_empty() { NEW_FOLDER_NAME } else { name };
        self.insert_item(parent_id, row, TreeNode::new_folder(name))
    }

    fn insert_item(&mut self, parent: NodeId, row: usize, node: TreeNode) -> Option<ModelIndex> {
        match self.store.tree_mut().insert_child(parent, row, node) {
            Ok(id) => {
                self.store.mark_dirty();
                Some(self.index_of(id))
            }
            Err(e) => {
                warn!("item not added: {}", e);
                None
            }
        }
    }

    // ------------------------------------------------------------
    // Item queries
    // ------------------------------------------------------------

    fn bookmark(&self, index: &ModelIndex) -> Option<&BookmarkData> {
        self.store.tree().get(index.node?)?.bookmark_data()
    }

    pub fn is_folder(&self, index: &ModelIndex) -> bool {
        index
            .node
            .and_then(|id| self.store.tree().get(id))
            .is_some_and(TreeNode::is_folder)
    }

    pub fn is_bookmark(&self, index: &ModelIndex) -> bool {
        self.bookmark(index).is_some()
    }

    /// Installed module of a bookmark.
    pub fn module(&self, index: &ModelIndex) -> Option<ModuleInfo> {
        index.node.and_then(|id| self.store.module_of(id))
    }

    /// Bookmark key in the configured book-name language.
    pub fn key(&self, index: &ModelIndex) -> String {
        self.bookmark(index)
            .map(|data| self.store.localized_key(data))
            .unwrap_or_default()
    }

    pub fn description(&self, index: &ModelIndex) -> String {
        self.bookmark(index)
            .map(|data| data.description.clone())
            .unwrap_or_default()
    }

    pub fn set_description(&mut self, index: &ModelIndex, description: &str) -> bool {
        let Some(data) = index
            .node
            .and_then(|id| self.store.tree_mut().get_mut(id))
            .and_then(TreeNode::bookmark_data_mut)
        else {
            return false;
        };
        data.description = description.to_string();
        self.store.mark_dirty();
        true
    }

    /// True if `test` is the folder `base` or lies below it.
    pub fn has_descendant(&self, base: &ModelIndex, test: &ModelIndex) -> bool {
        match (self.resolve_folder(base), self.resolve(test)) {
            (Some(base), Some(test)) => self.store.tree().has_descendant(base, test),
            _ => false,
        }
    }

    // ------------------------------------------------------------
    // Sorting
    // ------------------------------------------------------------

    /// Sort the children of `parent` by display text.
    ///
    /// Sorting the root sorts every folder in the tree, each one
    /// independently. Returns the row moves per folder.
    #[instrument(level = "debug", skip(self))]
    pub fn sort_items(&mut self, parent: &ModelIndex, order: SortOrder) -> Vec<LayoutChange> {
        let Some(parent_id) = self.resolve_folder(parent) else {
            return Vec::new();
        };
        let folders = if parent_id == self.store.root() {
            self.store.tree().folders_breadth_first(parent_id)
        } else {
            vec![parent_id]
        };

        let mut changes = Vec::with_capacity(folders.len());
        for folder in folders {
            let mut keyed = self
                .store
                .tree()
                .node(folder)
                .map(|node| node.children().to_vec())
                .unwrap_or_default()
                .into_iter()
                .map(|id| (self.store.display_text(id), id))
                .collect_vec();
            let collator = &mut self.collator;
            keyed.sort_by(|(a, _), (b, _)| collator.compare_ordered(a, b, order));

            let sorted = keyed.into_iter().map(|(_, id)| id).collect_vec();
            match self.store.tree_mut().reorder_children(folder, sorted) {
                Ok(moves) => {
                    self.store.mark_dirty();
                    changes.push(LayoutChange {
                        parent: self.index_of(folder),
                        moves,
                    });
                }
                Err(e) => warn!("sort skipped a folder: {}", e),
            }
        }
        debug!("sorted {} folder(s)", changes.len());
        changes
    }

    // ------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------

    /// Append the items of a bookmark document below `parent`.
    pub fn load(&mut self, source: Option<&Path>, parent: &ModelIndex) -> bool {
        match self.resolve_folder(parent) {
            Some(target) => self.store.load(source, Some(target)),
            None => false,
        }
    }

    /// Save the subtree below `subtree` (the whole tree for the invalid index).
    pub fn save(&mut self, destination: Option<&Path>, subtree: &ModelIndex) -> bool {
        let Some(subtree) = self.resolve(subtree) else {
            return false;
        };
        self.store.save(destination, Some(subtree))
    }

    pub fn process_pending_save(&mut self) -> bool {
        self.store.process_pending_save()
    }
}
