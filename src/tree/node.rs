//! Repository content node types

use serde::{Deserialize, Serialize};

/// Kind of a repository entry as reported by the content API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// File metadata carried on a file node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileMetadata {
    pub sha: String,
    pub size: u64,
    pub kind: Option<EntryKind>,
    pub download_url: Option<String>,
    pub html_url: Option<String>,
}

/// File node representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub path: String,
    pub name: String,
    pub metadata: FileMetadata,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
}

/// Directory node representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub path: String,
    pub children: Vec<ChildEntry>, // in the order the service returned them
}

/// Classification of one fetched path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    File(FileNode),
    Directory(DirectoryNode),
}

impl ContentNode {
    pub fn path(&self) -> &str {
        match self {
            ContentNode::File(file) => &file.path,
            ContentNode::Directory(dir) => &dir.path,
        }
    }
}
