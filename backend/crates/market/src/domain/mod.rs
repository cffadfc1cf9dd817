//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (User, Token, Listing)
//! - Domain value objects (UserId, Rarity, palettes, generator settings)
//! - Domain services (scoring, token generation, transaction rules)
//! - Repository trait (interface)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
