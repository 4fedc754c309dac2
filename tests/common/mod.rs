#![allow(dead_code)]

pub mod command;
pub mod file;

use bitar::areas::database::Database;
use bitar::artifacts::objects::commit::Commit;
use bitar::artifacts::objects::object_id::ObjectId;
use bitar::artifacts::objects::tree::Tree;
use std::path::Path;

pub fn database(repository_dir: &Path) -> Database {
    Database::new(repository_dir.join(".git").join("objects").into_boxed_path())
}

pub fn oid(id: &str) -> ObjectId {
    ObjectId::try_parse(id.trim().to_string()).expect("Invalid object id")
}

pub fn read_commit(repository_dir: &Path, commit_id: &str) -> Commit {
    database(repository_dir)
        .parse_object_as_commit(&oid(commit_id))
        .expect("Failed to read commit")
        .expect("Object is not a commit")
}

pub fn read_tree(repository_dir: &Path, tree_id: &ObjectId) -> Tree {
    database(repository_dir)
        .parse_object_as_tree(tree_id)
        .expect("Failed to read tree")
        .expect("Object is not a tree")
}

pub fn read_blob(repository_dir: &Path, blob_id: &ObjectId) -> Vec<u8> {
    database(repository_dir)
        .parse_object_as_blob(blob_id)
        .expect("Failed to read blob")
        .expect("Object is not a blob")
        .content()
        .to_vec()
}

/// Every path of a tree, `/`-separated, with its octal mode
pub fn list_tree(repository_dir: &Path, tree_id: &ObjectId) -> Vec<(String, String)> {
    let mut listing = Vec::new();

    for entry in read_tree(repository_dir, tree_id).entries() {
        if entry.mode().is_directory() {
            for (path, mode) in list_tree(repository_dir, entry.oid()) {
                listing.push((format!("{}/{}", entry.name_lossy(), path), mode));
            }
        } else {
            listing.push((entry.name_lossy(), entry.mode().as_str().to_string()));
        }
    }

    listing
}

/// Current value of `refs/heads/<branch>`, if the branch exists
pub fn read_branch(repository_dir: &Path, branch: &str) -> Option<String> {
    std::fs::read_to_string(repository_dir.join(".git/refs/heads").join(branch))
        .ok()
        .map(|content| content.trim().to_string())
}
