//! Shared helpers: specifier parsing, hashing, module trees and entry resolution

pub mod hashing;
pub mod path_resolver;
pub mod specifier;
pub mod tree;

pub use hashing::{content_hash, ContentHasher};
pub use path_resolver::PathResolver;
pub use specifier::{is_external_specifier, split_package_specifier};
pub use tree::{FsTree, MemoryTree, ModuleTree, TreeFile};
