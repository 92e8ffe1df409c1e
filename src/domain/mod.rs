//! Domain layer types and invariants.

pub mod archive;
pub mod articles;
pub mod debounce;
pub mod error;
pub mod feed;
pub mod sentiment;
