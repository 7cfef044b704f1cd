pub mod config;
pub mod transcript;
