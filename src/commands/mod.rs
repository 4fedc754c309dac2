//! Command implementations
//!
//! - `porcelain`: User-facing operations composed from the repository areas

pub mod porcelain;
