//! tabprep: Tabular Preprocessing Library
//!
//! A batch pipeline that imputes missing values, balances classes,
//! discretizes numeric features, selects features by ANOVA F-test,
//! reduces dimensionality with PCA and rescales the result.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
