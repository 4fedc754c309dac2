//! Git data structures and import algorithms
//!
//! - `branch`: Branch names and the outcome of a conditional branch update
//! - `filter`: Include/exclude matching of candidate paths
//! - `objects`: Git object types (blob, tree, commit)
//! - `revision`: Identities and construction of the commit recording a snapshot
//! - `snapshot`: In-memory directory structure serialized into trees
//! - `sources`: Filesystem, zip and tar producers of files

pub mod branch;
pub mod filter;
pub mod objects;
pub mod revision;
pub mod snapshot;
pub mod sources;
