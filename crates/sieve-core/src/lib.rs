//! Sieve Core - Foundational types for the Sieve edit checker
//!
//! This crate provides the data model that all other Sieve crates depend on:
//! - `EntityId` - Item and property identifiers
//! - `Value` - Tagged statement values (time, quantity, entity, string, ...)
//! - `Snak`, `SnakGroup`, `Statement`, `ItemUpdate`, `EntityDocument`
//! - Error types and Result alias

mod error;
mod id;
mod statement;
mod value;

pub use error::{Result, SieveError};
pub use id::EntityId;
pub use statement::{EntityDocument, ItemUpdate, Snak, SnakGroup, Statement};
pub use value::{QuantityValue, TimeValue, Value, GREGORIAN_CALENDAR, PRECISION_DAY};
