//! Arena-backed bookmark tree
//!
//! Nodes live in a generational arena and refer to each other by `NodeId`.
//! A node's `children` own the order of display; `parent` is a non-owning
//! back reference kept in sync by every structural operation here, which is
//! the only place that touches either field.

use std::collections::{HashSet, VecDeque};

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::entities::{BookmarkData, Icon, ItemFlags, NodeKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::fragment::Fragment;

/// Stable handle of a node in a `BookmarkArena`.
///
/// Handles of destroyed nodes never resolve again, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

/// Tree node: shared display attributes plus the variant payload.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// Display text. For bookmarks an empty text means the header is derived.
    pub text: String,
    pub tooltip: String,
    pub icon: Icon,
    pub flags: ItemFlags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreeNode {
    fn detached(kind: NodeKind, text: String, icon: Icon, flags: ItemFlags) -> Self {
        Self {
            kind,
            text,
            tooltip: String::new(),
            icon,
            flags,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn new_placeholder() -> Self {
        Self::detached(
            NodeKind::Placeholder,
            String::new(),
            Icon::None,
            ItemFlags::empty(),
        )
    }

    pub fn new_folder(name: impl Into<String>) -> Self {
        Self::detached(
            NodeKind::Folder,
            name.into(),
            Icon::ClosedFolder,
            ItemFlags::FOLDER,
        )
    }

    pub fn new_bookmark(data: BookmarkData, title: impl Into<String>) -> Self {
        Self::detached(
            NodeKind::Bookmark(data),
            title.into(),
            Icon::Bookmark,
            ItemFlags::BOOKMARK,
        )
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn is_bookmark(&self) -> bool {
        matches!(self.kind, NodeKind::Bookmark(_))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, NodeKind::Placeholder)
    }

    pub fn bookmark_data(&self) -> Option<&BookmarkData> {
        match &self.kind {
            NodeKind::Bookmark(data) => Some(data),
            _ => None,
        }
    }

    pub fn bookmark_data_mut(&mut self) -> Option<&mut BookmarkData> {
        match &mut self.kind {
            NodeKind::Bookmark(data) => Some(data),
            _ => None,
        }
    }
}

/// Ordered tree of folders and bookmarks under a single root folder.
#[derive(Debug)]
pub struct BookmarkArena {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for BookmarkArena {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarkArena {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode::new_folder("Root")));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True when the root folder has no children.
    pub fn is_empty(&self) -> bool {
        self.child_count(self.root) == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id.0)
    }

    pub fn node(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.get(id).ok_or(DomainError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut TreeNode> {
        self.get_mut(id).ok_or(DomainError::NodeNotFound(id))
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.get(id).map_or(0, TreeNode::child_count)
    }

    pub fn child(&self, parent: NodeId, row: usize) -> Option<NodeId> {
        self.get(parent)?.children.get(row).copied()
    }

    fn check_insert_row(&self, parent: NodeId, row: usize) -> DomainResult<()> {
        let count = self.node(parent)?.child_count();
        if row > count {
            return Err(DomainError::RowOutOfRange { row, count });
        }
        Ok(())
    }

    /// Insert a detached node as child `row` of `parent`, shifting later
    /// children right.
    #[instrument(level = "trace", skip(self, node))]
    pub fn insert_child(&mut self, parent: NodeId, row: usize, node: TreeNode) -> DomainResult<NodeId> {
        self.check_insert_row(parent, row)?;
        debug_assert!(node.parent.is_none() && node.children.is_empty());

        let mut node = node;
        node.parent = Some(parent);
        node.children.clear();
        let id = NodeId(self.arena.insert(node));
        self.node_mut(parent)?.children.insert(row, id);
        Ok(id)
    }

    /// Insert a sequence of detached nodes starting at `row`, keeping their order.
    pub fn insert_children(
        &mut self,
        parent: NodeId,
        row: usize,
        nodes: Vec<TreeNode>,
    ) -> DomainResult<Vec<NodeId>> {
        self.check_insert_row(parent, row)?;
        let mut ids = Vec::with_capacity(nodes.len());
        for (offset, node) in nodes.into_iter().enumerate() {
            ids.push(self.insert_child(parent, row + offset, node)?);
        }
        Ok(ids)
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: TreeNode) -> DomainResult<NodeId> {
        let row = self.node(parent)?.child_count();
        self.insert_child(parent, row, node)
    }

    /// Materialize a fragment (and all its descendants) as child `row` of `parent`.
    pub fn graft(&mut self, parent: NodeId, row: usize, fragment: &Fragment) -> DomainResult<NodeId> {
        let id = self.insert_child(parent, row, fragment.to_node())?;
        for (child_row, child) in fragment.children().iter().enumerate() {
            self.graft(id, child_row, child)?;
        }
        Ok(id)
    }

    /// Graft fragments in order starting at `row`. Validates the row first,
    /// so either every fragment is inserted or none is.
    pub fn graft_all(
        &mut self,
        parent: NodeId,
        row: usize,
        fragments: &[Fragment],
    ) -> DomainResult<Vec<NodeId>> {
        self.check_insert_row(parent, row)?;
        if !self.node(parent)?.is_folder() {
            return Err(DomainError::NotAFolder(parent));
        }
        fragments
            .iter()
            .enumerate()
            .map(|(offset, fragment)| self.graft(parent, row + offset, fragment))
            .collect()
    }

    /// Remove child `row` of `parent` and destroy its whole subtree.
    ///
    /// Returns the number of destroyed nodes.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&mut self, parent: NodeId, row: usize) -> DomainResult<usize> {
        let count = self.node(parent)?.child_count();
        if row >= count {
            return Err(DomainError::RowOutOfRange { row, count });
        }
        let child = self.node_mut(parent)?.children.remove(row);
        Ok(self.destroy_subtree(child))
    }

    fn destroy_subtree(&mut self, id: NodeId) -> usize {
        let mut destroyed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                stack.extend(node.children);
                destroyed += 1;
            }
        }
        debug!("destroyed {} node(s)", destroyed);
        destroyed
    }

    /// Unlink a node from its parent without destroying it.
    ///
    /// The node must be re-attached with [`BookmarkArena::attach`].
    pub fn detach(&mut self, id: NodeId) -> DomainResult<()> {
        if id == self.root {
            return Err(DomainError::RootDetached);
        }
        let parent = match self.node(id)?.parent {
            Some(parent) => parent,
            None => return Ok(()),
        };
        self.node_mut(parent)?.children.retain(|&child| child != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Link a detached node as child `row` of `parent`.
    pub fn attach(&mut self, id: NodeId, parent: NodeId, row: usize) -> DomainResult<()> {
        self.check_insert_row(parent, row)?;
        if self.node(id)?.parent.is_some() || id == self.root {
            return Err(DomainError::AlreadyAttached(id));
        }
        if self.has_descendant(id, parent) {
            return Err(DomainError::CycleDetected {
                folder: id,
                target: parent,
            });
        }
        self.node_mut(parent)?.children.insert(row, id);
        self.node_mut(id)?.parent = Some(parent);
        Ok(())
    }

    /// Turn a placeholder into the variant described by `template`, keeping
    /// its position and children.
    pub fn promote(&mut self, id: NodeId, template: TreeNode) -> DomainResult<()> {
        let node = self.node_mut(id)?;
        if !node.is_placeholder() {
            return Err(DomainError::NotAPlaceholder(id));
        }
        node.kind = template.kind;
        node.text = template.text;
        node.icon = template.icon;
        node.flags = template.flags;
        Ok(())
    }

    /// Position of `id` among its siblings; `None` for the root or unknown nodes.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent?;
        self.get(parent)?
            .children
            .iter()
            .position(|&child| child == id)
    }

    /// True if `candidate` is `ancestor` itself or anywhere below it.
    pub fn has_descendant(&self, ancestor: NodeId, candidate: NodeId) -> bool {
        if ancestor == candidate {
            return true;
        }
        let Some(node) = self.get(ancestor) else {
            return false;
        };
        if node.children.contains(&candidate) {
            return true;
        }
        node.children
            .iter()
            .any(|&child| self.has_descendant(child, candidate))
    }

    /// Owned copy of a folder or bookmark subtree. Placeholders have no
    /// persistent form and are left out.
    pub fn snapshot(&self, id: NodeId) -> Option<Fragment> {
        let node = self.get(id)?;
        match &node.kind {
            NodeKind::Placeholder => None,
            NodeKind::Bookmark(data) => Some(Fragment::bookmark(data.clone(), node.text.clone())),
            NodeKind::Folder => Some(Fragment::folder(
                node.text.clone(),
                node.children
                    .iter()
                    .filter_map(|&child| self.snapshot(child))
                    .collect(),
            )),
        }
    }

    /// Deep copy of a folder and everything below it.
    pub fn deep_copy(&self, folder: NodeId) -> DomainResult<Fragment> {
        if !self.node(folder)?.is_folder() {
            return Err(DomainError::NotAFolder(folder));
        }
        self.snapshot(folder).ok_or(DomainError::NotAFolder(folder))
    }

    /// Replace the child order of `parent` with `order`, which must be a
    /// permutation of the current children.
    ///
    /// Returns `(old_row, new_row)` for every child whose row changed.
    pub fn reorder_children(
        &mut self,
        parent: NodeId,
        order: Vec<NodeId>,
    ) -> DomainResult<Vec<(usize, usize)>> {
        let current = self.node(parent)?.children.clone();
        let unique: HashSet<NodeId> = order.iter().copied().collect();
        if order.len() != current.len()
            || unique.len() != order.len()
            || !current.iter().all(|child| unique.contains(child))
        {
            return Err(DomainError::InvalidPermutation(parent));
        }

        let moves = order
            .iter()
            .enumerate()
            .filter_map(|(new_row, id)| {
                let old_row = current.iter().position(|c| c == id)?;
                (old_row != new_row).then_some((old_row, new_row))
            })
            .collect();
        self.node_mut(parent)?.children = order;
        Ok(moves)
    }

    /// Every folder at or below `from`, breadth first, `from` included.
    pub fn folders_breadth_first(&self, from: NodeId) -> Vec<NodeId> {
        let mut folders = Vec::new();
        let mut queue = VecDeque::from([from]);
        while let Some(id) = queue.pop_front() {
            if let Some(node) = self.get(id) {
                if node.is_folder() {
                    folders.push(id);
                }
                queue.extend(node.children.iter().copied());
            }
        }
        folders
    }
}
