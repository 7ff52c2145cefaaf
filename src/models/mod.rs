//! # Data Models
//!
//! Domain records handled by the service.

pub mod item;

pub use item::{FieldViolation, Item, ItemStatus, ItemValidationError};
