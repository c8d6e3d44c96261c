//! Detached subtrees
//!
//! A `Fragment` is an owned, arena-free copy of a folder or bookmark
//! subtree. The XML decoder produces fragments, deep copies produce
//! fragments, and the arena grafts them back in as brand-new nodes, so a
//! copied subtree never shares a node with its original.

use crate::domain::arena::TreeNode;
use crate::domain::entities::BookmarkData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Folder {
        caption: String,
        children: Vec<Fragment>,
    },
    Bookmark {
        data: BookmarkData,
        /// Custom display text; empty means "use the synthesized header"
        title: String,
    },
}

impl Fragment {
    pub fn folder(caption: impl Into<String>, children: Vec<Fragment>) -> Self {
        Fragment::Folder {
            caption: caption.into(),
            children,
        }
    }

    pub fn bookmark(data: BookmarkData, title: impl Into<String>) -> Self {
        Fragment::Bookmark {
            data,
            title: title.into(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Fragment::Folder { .. })
    }

    /// Children of a folder fragment; bookmarks have none.
    pub fn children(&self) -> &[Fragment] {
        match self {
            Fragment::Folder { children, .. } => children,
            Fragment::Bookmark { .. } => &[],
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Fragment::node_count).sum::<usize>()
    }

    /// Build the detached node for this fragment (without its children).
    pub fn to_node(&self) -> TreeNode {
        match self {
            Fragment::Folder { caption, .. } => TreeNode::new_folder(caption.clone()),
            Fragment::Bookmark { data, title } => {
                TreeNode::new_bookmark(data.clone(), title.clone())
            }
        }
    }
}
