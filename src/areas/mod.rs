//! Storage areas of a git repository
//!
//! - `config`: Git configuration files (default identity)
//! - `database`: Loose object database for blobs, trees, and commits
//! - `refs`: Branch references and HEAD
//! - `repository`: Discovery of the git directory and coordination of the above

pub mod config;
pub mod database;
pub mod refs;
pub mod repository;
