//! Include/exclude filtering of candidate paths
//!
//! - `path_filter`: shell-glob and raw regular expression matching against the
//!   full relative path an entry will have in the tree

pub mod path_filter;
