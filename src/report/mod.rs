//! Report module - summarizing and exporting pipeline runs

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
