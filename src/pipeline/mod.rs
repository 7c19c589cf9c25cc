//! Pipeline module - the preprocessing stages and their orchestration

pub mod balance;
pub mod config;
pub mod dataset;
pub mod discretize;
pub mod error;
pub mod impute;
pub mod loader;
pub mod orchestrator;
pub mod reduce;
pub mod scale;
pub mod select;

pub use balance::*;
pub use config::*;
pub use dataset::*;
pub use discretize::*;
pub use error::*;
pub use impute::*;
pub use loader::*;
pub use orchestrator::*;
pub use reduce::*;
pub use scale::*;
pub use select::*;
