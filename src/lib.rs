pub mod error;

pub mod catalog;
pub mod config;
pub mod driver;
pub mod types;
pub mod udf;
pub mod vector;
