pub mod cli;
pub mod config;
pub mod crypto;
pub mod daemon;
pub mod errors;
pub mod keystore;
pub mod manifest;
pub mod ops;
