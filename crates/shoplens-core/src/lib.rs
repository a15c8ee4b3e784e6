//! # shoplens-core
//!
//! Configuration, errors, and shared utilities for ShopLens.
//!
//! This crate provides functionality used across all ShopLens crates:
//!
//! - **Configuration**: Loading, environment overrides, and validation
//! - **Secrets**: A zeroizing string type that never prints its contents
//! - **Environment**: Typed access to environment variables and `.env` files

pub mod config;
pub mod env;
pub mod error;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::ConfigError;
pub use secret::SecretString;
