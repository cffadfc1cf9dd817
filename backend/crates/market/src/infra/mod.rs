//! Infrastructure Layer - Repository implementations

pub mod json;
pub mod postgres;
