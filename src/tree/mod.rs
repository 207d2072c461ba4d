//! Content tree model: what a single fetch of a repository path classifies into.

pub mod node;

pub use node::{ChildEntry, ContentNode, DirectoryNode, EntryKind, FileMetadata, FileNode};
