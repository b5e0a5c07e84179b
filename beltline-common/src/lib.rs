//! Shared library for the Beltline services
//!
//! Holds everything the HTTP layer and tooling have in common: the error
//! type, configuration loading, database bootstrap and models, and the
//! token/password primitives used by authentication.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
