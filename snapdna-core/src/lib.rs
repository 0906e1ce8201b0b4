pub mod blocks;
pub mod container;
pub mod document;
pub mod error;
pub mod markup;
pub mod placement;
pub mod seq;

#[cfg(test)]
pub(crate) mod fixtures;

pub use document::Document;
pub use error::{SnapError, SnapResult};
