//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Manage a bookmark tree of folders and Bible-text bookmarks
///
/// Items are addressed by row paths: `0/2/1` is the second child of the
/// third child of the first top-level item. An empty path is the root.
#[derive(Parser, Debug)]
#[command(name = "btbm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file applied on top of the global one
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Bookmark file to work on (default: the user's bookmarks.xml)
    #[arg(short, long, global = true, env = "BTBM_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show bookmarks as tree
    Tree {
        /// Folder to show (default: everything)
        #[arg(default_value = "")]
        path: String,
    },

    /// Create a folder
    AddFolder {
        /// Folder name (default: "New folder")
        #[arg(default_value = "")]
        name: String,
        /// Parent folder
        #[arg(short, long, default_value = "")]
        parent: String,
        /// Row to insert at (default: append)
        #[arg(short, long)]
        row: Option<usize>,
    },

    /// Bookmark a key of a module
    AddBookmark {
        /// Module name, e.g. KJV
        module: String,
        /// Key, e.g. "John 3:16"
        key: String,
        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
        /// Custom title (default: "<key> (<module>)")
        #[arg(long, default_value = "")]
        title: String,
        /// Parent folder
        #[arg(short, long, default_value = "")]
        parent: String,
        /// Row to insert at; negative counts from the end (default: append)
        #[arg(short, long, default_value_t = -1, allow_hyphen_values = true)]
        row: isize,
    },

    /// Rename a folder or retitle a bookmark
    Rename {
        /// Item to rename
        path: String,
        /// New text
        text: String,
    },

    /// Set the description of a bookmark
    Describe {
        /// Bookmark
        path: String,
        /// New description
        description: String,
    },

    /// Remove items and everything below them
    Remove {
        /// First item to remove
        path: String,
        /// Number of consecutive rows
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Copy items into a folder
    Copy {
        /// Items to copy (a folder must be copied alone)
        #[arg(required = true)]
        items: Vec<String>,
        /// Destination folder
        #[arg(short, long, default_value = "")]
        to: String,
        /// Row in the destination (default: append)
        #[arg(short, long)]
        row: Option<usize>,
    },

    /// Move items into a folder
    Move {
        /// Items to move (a folder must be moved alone)
        #[arg(required = true)]
        items: Vec<String>,
        /// Destination folder
        #[arg(short, long, default_value = "")]
        to: String,
        /// Row in the destination (default: append)
        #[arg(short, long)]
        row: Option<usize>,
    },

    /// Sort a folder by display text (the root sorts every folder)
    Sort {
        /// Folder to sort
        #[arg(default_value = "")]
        path: String,
        /// Sort descending
        #[arg(long)]
        descending: bool,
    },

    /// Append the bookmarks of another file
    Import {
        /// Bookmark file to read
        #[arg(value_hint = ValueHint::FilePath)]
        source: PathBuf,
        /// Folder to import into
        #[arg(long, default_value = "")]
        into: String,
    },

    /// Write bookmarks to another file
    Export {
        /// File to write
        #[arg(value_hint = ValueHint::FilePath)]
        destination: PathBuf,
        /// Folder to export (default: everything)
        #[arg(long, default_value = "")]
        item: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config and bookmark file paths
    Path,
}
