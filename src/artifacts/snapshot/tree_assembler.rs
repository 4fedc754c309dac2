//! Nested directory snapshot built from the entries of every source in a run
//!
//! Entries are inserted by path in any order. Intermediate directories are created on
//! demand; inserting the same path twice keeps the later entry, while a path that
//! would be both a directory and a file is a structural conflict.
//!
//! Finalizing walks the structure post-order: every subdirectory is stored before the
//! directory listing it, so each listing is complete and canonically sorted when it
//! reaches the database. Identical subtrees therefore produce identical tree IDs.

use crate::areas::database::Database;
use crate::artifacts::objects::encoding::TextEncoding;
use crate::artifacts::objects::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use crate::artifacts::snapshot::tree_path::TreePath;
use crate::errors::ImportError;
use derive_new::new;
use std::collections::BTreeMap;

/// A stored file: its mode and the blob holding its content
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Leaf {
    mode: FileMode,
    oid: ObjectId,
}

impl Leaf {
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }
}

#[derive(Debug, Clone)]
enum Node {
    Directory(DirNode),
    Leaf(Leaf),
}

#[derive(Debug, Clone, Default)]
struct DirNode {
    children: BTreeMap<String, Node>,
}

impl DirNode {
    fn store(&self, database: &Database, encoding: TextEncoding) -> anyhow::Result<ObjectId> {
        let entries = self
            .children
            .iter()
            .map(|(name, node)| {
                let (mode, oid) = match node {
                    Node::Directory(dir) => (EntryMode::Directory, dir.store(database, encoding)?),
                    Node::Leaf(leaf) => (leaf.mode.into(), leaf.oid.clone()),
                };
                let name = encoding.encode(&format!("file name {name:?}"), name)?;

                Ok(TreeEntry::new(name, mode, oid))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        database.store(&Tree::new(entries))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreeAssembler {
    root: DirNode,
    leaves: usize,
}

impl TreeAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `leaf` at `path`, replacing any earlier entry at exactly that path
    pub fn insert(&mut self, path: &TreePath, leaf: Leaf) -> Result<(), ImportError> {
        let (parents, name) = path.split_last();
        let mut dir = &mut self.root;

        for (depth, component) in parents.iter().enumerate() {
            let child = dir
                .children
                .entry(component.clone())
                .or_insert_with(|| Node::Directory(DirNode::default()));

            dir = match child {
                Node::Directory(child_dir) => child_dir,
                Node::Leaf(_) => {
                    return Err(ImportError::StructuralConflict {
                        path: path.to_string(),
                        conflicting: path.prefix(depth + 1),
                        existing: "file",
                    });
                }
            };
        }

        if let Some(Node::Directory(_)) = dir.children.get(name) {
            return Err(ImportError::StructuralConflict {
                path: path.to_string(),
                conflicting: path.to_string(),
                existing: "directory",
            });
        }

        if dir.children.insert(name.to_string(), Node::Leaf(leaf)).is_none() {
            self.leaves += 1;
        }

        Ok(())
    }

    /// Number of distinct paths holding a leaf; overwrites do not count
    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Store every directory bottom-up and return the root tree ID
    ///
    /// Finalizing does not consume the assembler; finalizing again without further
    /// inserts yields the same ID and writes nothing new.
    pub fn finalize(&self, database: &Database, encoding: TextEncoding) -> anyhow::Result<ObjectId> {
        self.root.store(database, encoding)
    }
}
