//! Platform - Shared web plumbing
//!
//! Infrastructure utilities that are not tied to any one domain:
//! - Cookie parsing and Set-Cookie construction
//! - Short numeric one-time-code generation

pub mod codes;
pub mod cookie;
