//! HTTP API handlers for beltline-api

pub mod auth;
pub mod belts;
pub mod classes;
pub mod error;
pub mod evaluations;
pub mod health;
pub mod levels;
pub mod skill_domains;
pub mod students;
pub mod users;
pub mod waitlist;

pub use error::{ApiError, ApiResult};
