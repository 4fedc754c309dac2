//! Porcelain commands (user-facing operations)
//!
//! ## Commands
//!
//! - `import`: Snapshot sources into a tree and commit it onto a branch

pub mod import;
