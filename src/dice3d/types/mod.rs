//! Type definitions for the dice engine
//!
//! - `dice` - Dice types, catalog records, and face tables
//! - `roll` - Roll handles, states, tickets, and outcomes
//! - `settings` - Engine settings and persistence
//! - `error` - The shared error type

pub mod dice;
pub mod error;
pub mod roll;
pub mod settings;

pub use dice::*;
pub use error::*;
pub use roll::*;
pub use settings::*;
