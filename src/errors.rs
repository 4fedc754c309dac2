//! Typed failures of an import run
//!
//! Everything in the crate propagates `anyhow::Error`; the variants below are the
//! failures a caller may want to tell apart (via `downcast_ref`), most importantly
//! [`ImportError::RefConflict`], after which the whole run can simply be repeated.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid source specification {spec:?}: {reason}")]
    InvalidSourceSpec { spec: String, reason: String },

    #[error("unknown scheme {scheme:?} in {spec:?}, valid schemes are {valid}")]
    UnknownScheme {
        spec: String,
        scheme: String,
        valid: String,
    },

    #[error("invalid path {path:?} in {origin}: {reason}")]
    InvalidPath {
        origin: String,
        path: String,
        reason: String,
    },

    #[error("cannot handle {path} in {origin}: unsupported {kind}")]
    UnsupportedEntry {
        origin: String,
        path: String,
        kind: String,
    },

    #[error("cannot add {path}: {conflicting} already exists as a {existing}")]
    StructuralConflict {
        path: String,
        conflicting: String,
        existing: &'static str,
    },

    #[error("{what} cannot be represented in encoding {encoding}")]
    Unrepresentable { what: String, encoding: String },

    #[error(
        "branch {branch} was modified concurrently (expected {expected}, found {actual}); \
        rerun to build on the new head"
    )]
    RefConflict {
        branch: String,
        expected: String,
        actual: String,
    },
}

impl ImportError {
    pub fn is_ref_conflict(&self) -> bool {
        matches!(self, ImportError::RefConflict { .. })
    }
}
