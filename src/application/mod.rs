//! Application services: loading, filtering, and rendering content for the HTTP layer.

pub mod archive;
pub mod article;
pub mod chrome;
pub mod content;
pub mod error;
pub mod latest;
pub mod pagination;
pub mod render;
pub mod stream;
