//! Application Layer - Use cases and orchestration
//!
//! One use case per operation, each generic over the repository (and
//! notifier, where the operation pushes messages out).

pub mod begin_login;
pub mod cancel;
pub mod config;
pub mod ensure_user;
pub mod exchange;
pub mod logout;
pub mod mint;
pub mod notify;
pub mod purchase;
pub mod sell;
pub mod verify_login;
