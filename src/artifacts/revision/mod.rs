pub mod identity;
pub mod revision_builder;
