//! In-memory directory snapshot and its serialization into tree objects
//!
//! - `tree_path`: normalization of enumerated paths into tree components
//! - `tree_assembler`: nested directory structure fed by every source of a run,
//!   finalized bottom-up into content-addressed trees

pub mod tree_assembler;
pub mod tree_path;
