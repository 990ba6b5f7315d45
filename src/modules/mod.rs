// Declare all modules
pub mod auth;
pub mod config;
pub mod email;
pub mod encryption;
pub mod security;
pub mod social;
pub mod utils;

// No re-exports here as they're handled in lib.rs
