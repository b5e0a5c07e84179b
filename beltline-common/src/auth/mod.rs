//! Authentication primitives shared by the API service
//!
//! Token issuance/validation and password hashing. Authorization decisions
//! (admin checks, ownership checks) live with the HTTP layer.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{decode_token, issue_token, Claims};
