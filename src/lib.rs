pub mod ax;
pub mod config;
